//! Path command: shortest path between two nodes

use clap::Args;
use semgraph_core::{Edge, GraphNode, NodeKey, SemanticGraph};

use crate::input::read_graphs;

#[derive(Args)]
pub struct PathArgs {
    /// Input file with one graph per line, or - for stdin
    pub input: String,

    /// Input line holding the graph
    #[arg(short, long, default_value = "1")]
    pub line: usize,

    /// Index of the start node
    #[arg(long)]
    pub from: u32,

    /// Index of the end node
    #[arg(long)]
    pub to: u32,

    /// Follow edges in either direction
    #[arg(short, long)]
    pub undirected: bool,
}

fn index_label(sg: &SemanticGraph, key: &NodeKey) -> String {
    sg.node(key)
        .map(GraphNode::to_index_string)
        .unwrap_or_else(|| key.to_string())
}

/// `a-1 -obj-> b-2 <-nsubj- c-3`, arrows showing each edge's direction
fn render_path(sg: &SemanticGraph, start: NodeKey, edges: &[Edge]) -> String {
    let mut out = index_label(sg, &start);
    let mut current = start;
    for edge in edges {
        let next = if edge.source() == current {
            out.push_str(&format!(" -{}-> ", edge.relation()));
            edge.target()
        } else {
            out.push_str(&format!(" <-{}- ", edge.relation()));
            edge.source()
        };
        out.push_str(&index_label(sg, &next));
        current = next;
    }
    out
}

pub fn run(args: &PathArgs) -> anyhow::Result<()> {
    let graphs = read_graphs(&args.input)?;
    let Some(entry) = graphs.into_iter().find(|g| g.line == args.line) else {
        anyhow::bail!("No graph on line {}", args.line);
    };
    let sg = &entry.graph;

    let Some(from) = sg.get_node_by_index(args.from) else {
        anyhow::bail!("No node with index {} on line {}", args.from, args.line);
    };
    let Some(to) = sg.get_node_by_index(args.to) else {
        anyhow::bail!("No node with index {} on line {}", args.to, args.line);
    };

    let edges = if args.undirected {
        sg.get_shortest_undirected_path_edges(&from, &to)
    } else {
        sg.get_shortest_directed_path_edges(&from, &to)
    };

    match edges {
        Some(edges) => {
            tracing::debug!("Found path of length {}", edges.len());
            println!("{}", render_path(sg, from, &edges));
            Ok(())
        }
        None => anyhow::bail!(
            "No path from {} to {}",
            index_label(sg, &from),
            index_label(sg, &to)
        ),
    }
}
