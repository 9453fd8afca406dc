//! Property tests over generated graphs.
//!
//! Covers: compact notation round trip on trees, DAG detection against
//! brute-force reachability, topological order, root recomputation and
//! trivial shortest paths.

use proptest::prelude::*;
use semgraph_core::{GraphNode, NodeKey, Relation, SemanticGraph, TypedDependency};
use std::collections::BTreeSet;

const RELATIONS: &[&str] = &["nsubj", "obj", "amod", "det", "nmod:poss", "compound"];

/// Random rooted tree of at least two nodes: node i > 0 hangs under some
/// node before it (a lone leaf prints without brackets and cannot reparse)
fn arb_tree() -> impl Strategy<Value = Vec<(usize, usize)>> {
    (2usize..14).prop_flat_map(|n| {
        let parents: Vec<_> = (1..n).map(|i| (0..i, 0..RELATIONS.len())).collect();
        parents
    })
}

/// Random directed edges (self-loops and parallel edges allowed)
fn arb_edges() -> impl Strategy<Value = (u32, Vec<(u32, u32)>)> {
    (1u32..10).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..20)))
}

fn word(i: usize) -> String {
    format!("w{}", i)
}

fn build_tree(parents: &[(usize, usize)]) -> SemanticGraph {
    let node = |i: usize| GraphNode::indexed(word(i), i as u32 + 1);
    let mut deps = vec![TypedDependency::new(Relation::root(), GraphNode::indexed("ROOT", 0), node(0))];
    for (child, (parent, reln)) in parents.iter().enumerate() {
        deps.push(TypedDependency::new(RELATIONS[*reln], node(*parent), node(child + 1)));
    }
    SemanticGraph::from_dependencies(deps)
}

fn build_graph(n: u32, edges: &[(u32, u32)]) -> SemanticGraph {
    let mut sg = SemanticGraph::new();
    for i in 0..n {
        sg.add_vertex(GraphNode::indexed(format!("v{}", i), i));
    }
    for (gov, dep) in edges {
        sg.add_edge(NodeKey::new(*gov), NodeKey::new(*dep), Relation::new("dep"), 0.0, false);
    }
    sg
}

/// `(governor word, relation, dependent word)` for every edge
fn labelled_edges(sg: &SemanticGraph) -> BTreeSet<(String, String, String)> {
    let word = |k: &NodeKey| sg.node(k).map(|n| n.word().to_string()).unwrap_or_default();
    sg.edges()
        .map(|e| (word(&e.source()), e.relation().to_string(), word(&e.target())))
        .collect()
}

fn root_words(sg: &SemanticGraph) -> Vec<String> {
    sg.roots()
        .iter()
        .filter_map(|r| sg.node(r).map(|n| n.word().to_string()))
        .collect()
}

proptest! {
    #[test]
    fn compact_round_trip_preserves_trees(parents in arb_tree()) {
        let sg = build_tree(&parents);
        let printed = sg.to_compact_string(false);
        let parsed = SemanticGraph::from_compact(&printed);

        prop_assert!(parsed.is_some(), "could not reparse {}", printed);
        let parsed = parsed.unwrap();
        prop_assert_eq!(parsed.size(), sg.size());
        prop_assert_eq!(labelled_edges(&parsed), labelled_edges(&sg));
        prop_assert_eq!(root_words(&parsed), root_words(&sg));
        prop_assert_eq!(parsed.to_compact_string(false), printed);
    }

    #[test]
    fn is_dag_matches_reachability((n, edges) in arb_edges()) {
        let sg = build_graph(n, &edges);
        let has_cycle = edges.iter().any(|(u, v)| {
            u == v
                || sg
                    .get_shortest_directed_path_nodes(&NodeKey::new(*v), &NodeKey::new(*u))
                    .is_some()
        });

        prop_assert_eq!(sg.is_dag(), !has_cycle);
    }

    #[test]
    fn topological_sort_orders_every_edge((n, edges) in arb_edges()) {
        let sg = build_graph(n, &edges);

        match sg.topological_sort() {
            Ok(order) => {
                prop_assert!(sg.is_dag());
                prop_assert_eq!(order.len(), n as usize);
                let position = |k: NodeKey| order.iter().position(|x| *x == k);
                for edge in sg.edges() {
                    prop_assert!(position(edge.source()) < position(edge.target()));
                }
            }
            Err(_) => prop_assert!(!sg.is_dag()),
        }
    }

    #[test]
    fn reset_roots_picks_parentless_vertices((n, edges) in arb_edges()) {
        let mut sg = build_graph(n, &edges);
        let parentless: Vec<NodeKey> = sg.vertices().filter(|v| sg.in_degree(v) == 0).collect();

        sg.reset_roots();
        if parentless.is_empty() {
            prop_assert_eq!(sg.roots().len(), 1);
        } else {
            prop_assert_eq!(sg.roots(), parentless.as_slice());
        }
    }

    #[test]
    fn shortest_paths_are_consistent((n, edges) in arb_edges(), a in 0u32..10, b in 0u32..10) {
        let sg = build_graph(n, &edges);
        let (a, b) = (NodeKey::new(a % n), NodeKey::new(b % n));

        prop_assert_eq!(sg.get_shortest_directed_path_edges(&a, &a), Some(vec![]));

        let nodes = sg.get_shortest_directed_path_nodes(&a, &b);
        let path = sg.get_shortest_directed_path_edges(&a, &b);
        prop_assert_eq!(nodes.is_some(), path.is_some());
        if let (Some(nodes), Some(path)) = (nodes, path) {
            prop_assert_eq!(path.len() + 1, nodes.len());
            for (edge, pair) in path.iter().zip(nodes.windows(2)) {
                prop_assert_eq!(edge.source(), pair[0]);
                prop_assert_eq!(edge.target(), pair[1]);
            }
        }
    }
}
