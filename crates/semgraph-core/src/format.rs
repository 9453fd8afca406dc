//! Human-readable renderings
//!
//! The typed-dependency list and an indented tree. Neither round-trips; the
//! compact notation in [`crate::compact`] is the parseable form.

use crate::edge::Edge;
use crate::graph::SemanticGraph;
use crate::node::{GraphNode, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

impl SemanticGraph {
    /// One typed-dependency line per root and per edge, edges ordered by
    /// target:
    ///
    /// ```text
    /// root(ROOT-0, died-6)
    /// nsubj(died-6, Sam-3)
    /// ```
    pub fn to_list(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            out.push_str(&format!("root(ROOT-0, {})\n", self.index_string(root)));
        }
        for edge in self.edge_list_sorted() {
            out.push_str(&format!(
                "{}({}, {})\n",
                edge.relation(),
                self.index_string(&edge.source()),
                self.index_string(&edge.target())
            ));
        }
        out
    }

    /// Render with the given tree formatter
    pub fn to_formatted_string(&self, formatter: &TreeFormatter) -> String {
        formatter.format(self)
    }

    fn index_string(&self, key: &NodeKey) -> String {
        match self.node(key) {
            Some(node) => node.to_index_string(),
            None => GraphNode::new(*key).to_index_string(),
        }
    }
}

/// Indented tree rendering
///
/// ```text
/// -> ate-2 (root)
///   -> Bill-1 (nsubj)
///   -> muffins-4 (obj)
///     -> blueberry-3 (compound)
/// ```
///
/// A node reached a second time gets its line but its children are not
/// repeated. Vertices unreachable from any root follow, each starting a new
/// unindented block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeFormatter {
    /// Spaces per nesting level
    pub indent: usize,
    pub show_tags: bool,
    pub show_index: bool,
}

impl Default for TreeFormatter {
    fn default() -> Self {
        Self {
            indent: 2,
            show_tags: false,
            show_index: true,
        }
    }
}

impl TreeFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_tags(mut self, show_tags: bool) -> Self {
        self.show_tags = show_tags;
        self
    }

    pub fn with_index(mut self, show_index: bool) -> Self {
        self.show_index = show_index;
        self
    }

    pub fn format(&self, sg: &SemanticGraph) -> String {
        let mut out = String::new();
        let mut used: BTreeSet<NodeKey> = BTreeSet::new();

        for root in sg.roots() {
            out.push_str(&format!("-> {} (root)\n", self.label(sg, root)));
            self.write_children(sg, *root, &mut used, &mut out);
        }

        for vertex in sg.vertices() {
            if used.contains(&vertex) || sg.is_root(&vertex) {
                continue;
            }
            out.push_str(&self.label(sg, &vertex));
            out.push('\n');
            self.write_children(sg, vertex, &mut used, &mut out);
        }

        out
    }

    fn write_children(&self, sg: &SemanticGraph, start: NodeKey, used: &mut BTreeSet<NodeKey>, out: &mut String) {
        used.insert(start);
        let mut stack: Vec<(Vec<&Edge>, usize)> = vec![(sg.outgoing_edges_sorted(&start), 0)];

        while let Some((edges, next)) = stack.last_mut() {
            let Some(edge) = edges.get(*next).copied() else {
                stack.pop();
                continue;
            };
            *next += 1;

            let depth = stack.len();
            let target = edge.target();
            out.push_str(&" ".repeat(self.indent * depth));
            out.push_str(&format!("-> {} ({})\n", self.label(sg, &target), edge.relation()));
            if used.insert(target) {
                stack.push((sg.outgoing_edges_sorted(&target), 0));
            }
        }
    }

    fn label(&self, sg: &SemanticGraph, key: &NodeKey) -> String {
        let fallback;
        let node = match sg.node(key) {
            Some(node) => node,
            None => {
                fallback = GraphNode::new(*key);
                &fallback
            }
        };
        let mut label = if self.show_index {
            node.to_index_string()
        } else {
            node.word().to_string()
        };
        if self.show_tags {
            label.push('/');
            label.push_str(node.tag().unwrap_or(""));
        }
        label
    }
}
