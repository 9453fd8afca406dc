//! Subgraph extraction and node rewriting helpers

use crate::edge::Edge;
use crate::error::Result;
use crate::graph::SemanticGraph;
use crate::node::{GraphNode, NodeKey};
use std::collections::{BTreeMap, BTreeSet};

/// Graph induced by `nodes` on `src`.
///
/// `None` for no nodes; a single node gives a one-vertex graph. Otherwise the
/// result holds every edge of `src` between two of the nodes (nodes without
/// such an edge are left out) and its roots are recomputed.
pub fn make_graph_from_nodes(nodes: &[NodeKey], src: &SemanticGraph) -> Option<SemanticGraph> {
    match nodes {
        [] => None,
        [only] => {
            let mut sg = SemanticGraph::new();
            sg.add_vertex(src.node(only).cloned().unwrap_or_else(|| GraphNode::new(*only)));
            Some(sg)
        }
        _ => {
            let mut sg = SemanticGraph::new();
            for gov in nodes {
                for dep in nodes {
                    for edge in src.get_all_edges(gov, dep) {
                        for key in [edge.source(), edge.target()] {
                            if let Some(node) = src.node(&key) {
                                sg.add_vertex(node.clone());
                            }
                        }
                        sg.add_edge(
                            edge.source(),
                            edge.target(),
                            edge.relation().clone(),
                            edge.weight(),
                            edge.is_extra(),
                        );
                    }
                }
            }
            sg.reset_roots();
            Some(sg)
        }
    }
}

/// Delete every vertex not reachable from some root
pub fn kill_non_rooted(sg: &mut SemanticGraph) {
    let mut keep: BTreeSet<NodeKey> = BTreeSet::new();
    for root in sg.roots() {
        keep.extend(sg.get_subgraph_vertices(root));
    }
    let doomed: Vec<NodeKey> = sg.vertices().filter(|v| !keep.contains(v)).collect();
    tracing::debug!(removed = doomed.len(), "Removing unrooted vertices");
    for vertex in doomed {
        sg.remove_vertex(&vertex);
    }
}

/// Put `new_node` in the place of `old`: every edge touching `old` is
/// re-attached to the new node, and root membership carries over.
///
/// Returns false (and logs a warning) when `old` is not in the graph.
pub fn replace_node(sg: &mut SemanticGraph, new_node: GraphNode, old: &NodeKey) -> bool {
    let outgoing: Vec<Edge> = sg.outgoing_edges(old).cloned().collect();
    let incoming: Vec<Edge> = sg.incoming_edges(old).cloned().collect();
    let was_root = sg.is_root(old);

    if !sg.remove_vertex(old) {
        tracing::warn!(%old, "replace_node: previous node does not exist");
        return false;
    }

    let new_key = new_node.key();
    let swap = |k: NodeKey| if k == *old { new_key } else { k };
    sg.add_vertex(new_node.clone());
    if was_root {
        sg.add_root(new_node);
    }

    for edge in &outgoing {
        sg.add_edge(new_key, swap(edge.target()), edge.relation().clone(), edge.weight(), edge.is_extra());
    }
    for edge in incoming.iter().filter(|e| e.source() != *old) {
        sg.add_edge(swap(edge.source()), new_key, edge.relation().clone(), edge.weight(), edge.is_extra());
    }
    true
}

/// Copy of `sg` with every node moved to sentence `sent_index`
pub fn with_sent_index(sg: &SemanticGraph, sent_index: u32) -> SemanticGraph {
    sg.copy_with_map(|node| {
        let mut moved = node.clone();
        moved.key = moved.key.in_sentence(sent_index);
        moved
    })
    .0
}

/// Copy of `sg` whose vertices are renumbered 1..=n in natural order
pub fn reset_vertex_ordering(sg: &SemanticGraph) -> SemanticGraph {
    let positions: BTreeMap<NodeKey, u32> = sg.vertices().zip(1..).collect();
    sg.copy_with_map(|node| {
        let mut renumbered = node.clone();
        if let Some(index) = positions.get(&node.key()) {
            renumbered.key.index = *index;
        }
        renumbered
    })
    .0
}

/// Every edge whose relation text starts with `prefix`
pub fn find_all_relns_with_prefix<'g>(sg: &'g SemanticGraph, prefix: &str) -> Vec<&'g Edge> {
    sg.edges()
        .filter(|e| e.relation().to_string().starts_with(prefix))
        .collect()
}

/// Children of `vertex` whose edge relation text starts with `prefix`
pub fn get_children_with_reln_prefix(sg: &SemanticGraph, vertex: &NodeKey, prefix: &str) -> Vec<NodeKey> {
    get_children_with_reln_prefixes(sg, vertex, &[prefix])
}

/// Children of `vertex` whose edge relation text starts with any prefix
pub fn get_children_with_reln_prefixes(sg: &SemanticGraph, vertex: &NodeKey, prefixes: &[&str]) -> Vec<NodeKey> {
    sg.outgoing_edges(vertex)
        .filter(|e| {
            let text = e.relation().to_string();
            prefixes.iter().any(|p| text.starts_with(p))
        })
        .map(Edge::target)
        .collect()
}

/// Smallest vertex (in natural order) among `start` and its descendants
pub fn leftmost_descendant(sg: &SemanticGraph, start: &NodeKey) -> Result<NodeKey> {
    Ok(leftmost_rightmost_descendants(sg, start)?.0)
}

pub fn leftmost_rightmost_descendants(sg: &SemanticGraph, start: &NodeKey) -> Result<(NodeKey, NodeKey)> {
    let descendants = sg.descendants(start)?;
    let first = descendants.first().copied().unwrap_or(*start);
    let last = descendants.last().copied().unwrap_or(*start);
    Ok((first, last))
}

/// Every edge running between two distinct vertices of `nodes`
pub fn get_edges_spanned_by_vertices<'g>(sg: &'g SemanticGraph, nodes: &[NodeKey]) -> Vec<&'g Edge> {
    let mut spanned = Vec::new();
    for n1 in nodes {
        for n2 in nodes.iter().filter(|n2| *n2 != n1) {
            spanned.extend(sg.get_all_edges(n1, n2));
        }
    }
    spanned
}

/// Vertices outside `asserted` that share an edge with one inside it
pub fn get_dependency_blanket(sg: &SemanticGraph, asserted: &BTreeSet<NodeKey>) -> BTreeSet<NodeKey> {
    sg.vertices()
        .filter(|v| !asserted.contains(v))
        .filter(|v| asserted.iter().any(|a| sg.contains_edge(a, v) || sg.contains_edge(v, a)))
        .collect()
}
