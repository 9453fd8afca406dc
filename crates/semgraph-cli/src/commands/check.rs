//! Check command: structural report per graph

use clap::Args;
use semgraph_core::{GraphNode, NodeKey, SemanticGraph};

use crate::input::read_graphs;

#[derive(Args)]
pub struct CheckArgs {
    /// Input file with one graph per line, or - for stdin
    pub input: String,
}

fn index_label(sg: &SemanticGraph, key: &NodeKey) -> String {
    sg.node(key)
        .map(GraphNode::to_index_string)
        .unwrap_or_else(|| key.to_string())
}

fn report(sg: &SemanticGraph) -> String {
    let mut lines = vec![format!(
        "{} vertices, {} edges, {} roots",
        sg.size(),
        sg.edge_count(),
        sg.roots().len()
    )];
    lines.push(format!("dag: {}", if sg.is_dag() { "yes" } else { "no" }));
    match sg.topological_sort() {
        Ok(order) => {
            let labels: Vec<String> = order.iter().map(|k| index_label(sg, k)).collect();
            lines.push(format!("order: {}", labels.join(" ")));
        }
        Err(e) => lines.push(format!("order: {}", e)),
    }
    lines.join("\n  ")
}

pub fn run(args: &CheckArgs) -> anyhow::Result<()> {
    for entry in read_graphs(&args.input)? {
        println!("line {}: {}", entry.line, report(&entry.graph));
    }
    Ok(())
}
