//! Reading compact-notation input

use std::io::Read;

use anyhow::Context;
use semgraph_core::SemanticGraph;

/// A graph together with the 1-based input line it came from
pub struct LineGraph {
    pub line: usize,
    pub graph: SemanticGraph,
}

/// Read the whole of `source`; `-` means stdin
pub fn read_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}

/// One graph per non-empty line. Lines that do not parse are skipped with a
/// warning.
pub fn parse_graphs(text: &str) -> Vec<LineGraph> {
    let mut graphs = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match SemanticGraph::from_compact(line) {
            Some(graph) => graphs.push(LineGraph { line: idx + 1, graph }),
            None => tracing::warn!("Skipping malformed graph on line {}", idx + 1),
        }
    }
    tracing::info!("Read {} graphs", graphs.len());
    graphs
}

pub fn read_graphs(source: &str) -> anyhow::Result<Vec<LineGraph>> {
    Ok(parse_graphs(&read_source(source)?))
}
