//! The semantic graph aggregate
//!
//! A [`SemanticGraph`] is a [`MultiGraph`] over [`NodeKey`] handles, a table
//! of node records carrying the display attributes, an explicit root list and
//! free-form comment lines.

use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::multigraph::MultiGraph;
use crate::node::{GraphNode, NodeKey};
use crate::relation::{Relation, TypedDependency};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::hash::{Hash, Hasher};

/// Directed multigraph of word nodes with typed relation edges
#[derive(Debug, Clone, Default)]
pub struct SemanticGraph {
    graph: MultiGraph<NodeKey, Edge>,
    nodes: BTreeMap<NodeKey, GraphNode>,
    roots: Vec<NodeKey>,
    comments: Vec<String>,
}

impl SemanticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from typed dependency records, in order.
    ///
    /// A record carrying the root relation marks its dependent as a root
    /// and creates no edge.
    pub fn from_dependencies<I>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = TypedDependency>,
    {
        let mut sg = Self::new();
        for dep in dependencies {
            if dep.reln.is_root() {
                sg.add_root(dep.dep);
                continue;
            }
            let (gov_key, dep_key) = (dep.gov.key(), dep.dep.key());
            sg.add_vertex(dep.gov);
            sg.add_vertex(dep.dep);
            sg.add_edge(gov_key, dep_key, dep.reln, dep.weight, dep.extra);
        }
        tracing::debug!(
            vertices = sg.size(),
            edges = sg.edge_count(),
            roots = sg.roots.len(),
            "Built graph from typed dependencies"
        );
        sg
    }

    /// Deep copy remapping every node through `remap`.
    ///
    /// Returns the copy and the old to new key map. Roots and every edge's
    /// relation, weight and extra flag are carried over through the map.
    pub fn copy_with_map<F>(&self, mut remap: F) -> (Self, BTreeMap<NodeKey, NodeKey>)
    where
        F: FnMut(&GraphNode) -> GraphNode,
    {
        let mut copy = Self::new();
        let mut mapping = BTreeMap::new();
        for node in self.nodes.values() {
            let fresh = remap(node);
            mapping.insert(node.key(), fresh.key());
            copy.add_vertex(fresh);
        }
        for root in &self.roots {
            if let Some(new_root) = mapping.get(root) {
                copy.push_root(*new_root);
            }
        }
        for edge in self.graph.edges() {
            if let (Some(gov), Some(dep)) = (mapping.get(&edge.source()), mapping.get(&edge.target())) {
                copy.add_edge(*gov, *dep, edge.relation().clone(), edge.weight(), edge.is_extra());
            }
        }
        copy.comments = self.comments.clone();
        (copy, mapping)
    }

    /// New graph with the same node records and edges, keeping only the
    /// first root
    pub fn make_soft_copy(&self) -> Self {
        let mut copy = Self::new();
        if let Some(root) = self.roots.first().and_then(|r| self.nodes.get(r)) {
            copy.add_vertex(root.clone());
            copy.push_root(root.key());
        }
        for edge in self.graph.edges() {
            for key in [edge.source(), edge.target()] {
                if let Some(node) = self.nodes.get(&key) {
                    copy.add_vertex(node.clone());
                }
            }
            copy.add_edge(
                edge.source(),
                edge.target(),
                edge.relation().clone(),
                edge.weight(),
                edge.is_extra(),
            );
        }
        copy
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vertices
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a node record. An existing vertex with the same key keeps its
    /// record and `false` is returned.
    pub fn add_vertex(&mut self, node: GraphNode) -> bool {
        let key = node.key();
        if !self.graph.add_vertex(key) {
            return false;
        }
        self.nodes.insert(key, node);
        true
    }

    /// Remove a vertex, every edge touching it, and its root membership
    pub fn remove_vertex(&mut self, vertex: &NodeKey) -> bool {
        if !self.graph.remove_vertex(vertex) {
            return false;
        }
        self.nodes.remove(vertex);
        self.roots.retain(|r| r != vertex);
        true
    }

    pub fn contains_vertex(&self, vertex: &NodeKey) -> bool {
        self.graph.contains_vertex(vertex)
    }

    /// Node record for a vertex
    pub fn node(&self, key: &NodeKey) -> Option<&GraphNode> {
        self.nodes.get(key)
    }

    /// Mutable node record; edits to the display attributes never touch
    /// adjacency
    pub fn node_mut(&mut self, key: &NodeKey) -> Option<&mut GraphNode> {
        self.nodes.get_mut(key)
    }

    /// Node records in natural order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.nodes.values()
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.graph.vertices()
    }

    pub fn vertex_set(&self) -> BTreeSet<NodeKey> {
        self.graph.vertices().collect()
    }

    pub fn vertex_list_sorted(&self) -> Vec<NodeKey> {
        self.graph.vertices().collect()
    }

    /// Number of vertices
    pub fn size(&self) -> usize {
        self.graph.num_vertices()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edges
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an edge, inserting bare node records for missing endpoints
    pub fn add_edge(&mut self, gov: NodeKey, dep: NodeKey, reln: Relation, weight: f64, extra: bool) -> Edge {
        for key in [gov, dep] {
            if !self.contains_vertex(&key) {
                self.add_vertex(GraphNode::new(key));
            }
        }
        let edge = Edge::new(gov, dep, reln, weight, extra);
        self.graph.add(gov, dep, edge.clone());
        edge
    }

    /// Remove the first stored edge equal to `edge`; endpoints stay
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        self.graph.remove_edge(&edge.source(), &edge.target(), edge)
    }

    /// Replace `edge` with a copy carrying `reln`. Returns false, changing
    /// nothing, when `edge` is not in the graph.
    pub fn update_edge(&mut self, edge: &Edge, reln: Relation) -> bool {
        let removed = self.remove_edge(edge);
        if removed {
            let updated = edge.with_relation(reln);
            self.graph.add(updated.source(), updated.target(), updated);
        }
        removed
    }

    pub fn edge_count(&self) -> usize {
        self.graph.num_edges()
    }

    pub fn in_degree(&self, vertex: &NodeKey) -> usize {
        self.graph.in_degree(vertex)
    }

    pub fn out_degree(&self, vertex: &NodeKey) -> usize {
        self.graph.out_degree(vertex)
    }

    /// Is there any edge from `gov` to `dep`?
    pub fn contains_edge(&self, gov: &NodeKey, dep: &NodeKey) -> bool {
        self.graph.is_edge(gov, dep)
    }

    /// Is there an edge equal to `edge` (same relation and endpoints)?
    pub fn contains_edge_value(&self, edge: &Edge) -> bool {
        self.get_all_edges(&edge.source(), &edge.target()).contains(edge)
    }

    pub fn get_all_edges(&self, gov: &NodeKey, dep: &NodeKey) -> &[Edge] {
        self.graph.get_edges(gov, dep)
    }

    /// First edge from `gov` to `dep`
    pub fn get_edge(&self, gov: &NodeKey, dep: &NodeKey) -> Option<&Edge> {
        self.get_all_edges(gov, dep).first()
    }

    pub fn get_edge_with_reln(&self, gov: &NodeKey, dep: &NodeKey, reln: &Relation) -> Option<&Edge> {
        self.get_all_edges(gov, dep).iter().find(|e| e.relation() == reln)
    }

    /// All edges, grouped by source then target
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.graph.edges()
    }

    pub fn outgoing_edges(&self, vertex: &NodeKey) -> impl Iterator<Item = &Edge> + '_ {
        self.graph.outgoing_edges(vertex)
    }

    pub fn incoming_edges(&self, vertex: &NodeKey) -> impl Iterator<Item = &Edge> + '_ {
        self.graph.incoming_edges(vertex)
    }

    pub fn outgoing_edges_sorted(&self, vertex: &NodeKey) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.outgoing_edges(vertex).collect();
        edges.sort();
        edges
    }

    pub fn incoming_edges_sorted(&self, vertex: &NodeKey) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.incoming_edges(vertex).collect();
        edges.sort();
        edges
    }

    /// Every edge ordered by target, then source, then relation
    pub fn edge_list_sorted(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges().collect();
        edges.sort_by(|a, b| a.cmp_by_target(b));
        edges
    }

    /// Collapse parallel edges that compare equal
    pub fn delete_duplicate_edges(&mut self) {
        let before = self.edge_count();
        self.graph.delete_duplicate_edges();
        tracing::debug!(removed = before - self.edge_count(), "Deleted duplicate edges");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roots
    // ─────────────────────────────────────────────────────────────────────────

    /// Roots in insertion order
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn is_root(&self, vertex: &NodeKey) -> bool {
        self.roots.contains(vertex)
    }

    pub fn first_root(&self) -> Result<NodeKey> {
        self.roots
            .first()
            .copied()
            .ok_or_else(|| Error::NoRoots(self.to_compact_string(false)))
    }

    /// Add a root, inserting the node when missing
    pub fn add_root(&mut self, node: GraphNode) {
        let key = node.key();
        self.add_vertex(node);
        self.push_root(key);
    }

    /// Make `vertex` the only root
    pub fn set_root(&mut self, vertex: NodeKey) -> Result<()> {
        self.set_roots([vertex])
    }

    /// Replace the root list. Every vertex must already be in the graph.
    pub fn set_roots<I>(&mut self, vertices: I) -> Result<()>
    where
        I: IntoIterator<Item = NodeKey>,
    {
        let vertices: Vec<NodeKey> = vertices.into_iter().collect();
        if let Some(missing) = vertices.iter().find(|v| !self.contains_vertex(v)) {
            return Err(self.unknown_vertex(*missing));
        }
        self.roots.clear();
        for v in vertices {
            self.push_root(v);
        }
        Ok(())
    }

    fn push_root(&mut self, key: NodeKey) {
        if !self.roots.contains(&key) {
            self.roots.push(key);
        }
    }

    /// Recompute the roots.
    ///
    /// Parentless vertices become the roots when there are any. Otherwise
    /// every vertex sits on or below a cycle and the vertex whose summed
    /// shortest directed path length to all the others is largest wins; ties
    /// go to the first vertex in natural order.
    pub fn reset_roots(&mut self) {
        let parentless: Vec<NodeKey> = self.vertices().filter(|v| self.in_degree(v) == 0).collect();
        if !parentless.is_empty() {
            self.roots = parentless;
            return;
        }
        if self.is_empty() {
            self.roots.clear();
            return;
        }

        let mut best: Option<(NodeKey, usize)> = None;
        for vertex in self.vertices() {
            let score = self.directed_distance_sum(&vertex);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((vertex, score));
            }
        }
        if let Some((winner, score)) = best {
            tracing::debug!(%winner, score, "No parentless vertex, picked dominating root");
            self.roots = vec![winner];
        }
    }

    /// Sum of BFS distances from `source` to every reachable vertex
    fn directed_distance_sum(&self, source: &NodeKey) -> usize {
        let mut dist: BTreeMap<NodeKey, usize> = BTreeMap::from([(*source, 0)]);
        let mut queue = VecDeque::from([*source]);
        while let Some(current) = queue.pop_front() {
            let next_dist = dist.get(&current).copied().unwrap_or(0) + 1;
            for child in self.graph.children(&current) {
                if !dist.contains_key(&child) {
                    dist.insert(child, next_dist);
                    queue.push_back(child);
                }
            }
        }
        dist.values().sum()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Neighbourhood
    // ─────────────────────────────────────────────────────────────────────────

    /// Distinct parents; empty for unknown vertices
    pub fn get_parents(&self, vertex: &NodeKey) -> BTreeSet<NodeKey> {
        self.graph.parents(vertex).collect()
    }

    /// Distinct children; empty for unknown vertices
    pub fn get_children(&self, vertex: &NodeKey) -> BTreeSet<NodeKey> {
        self.graph.children(vertex).collect()
    }

    /// Parents sorted by natural order
    pub fn get_parent_list(&self, vertex: &NodeKey) -> Vec<NodeKey> {
        self.graph.parents(vertex).collect()
    }

    /// Children sorted by natural order
    pub fn get_child_list(&self, vertex: &NodeKey) -> Vec<NodeKey> {
        self.graph.children(vertex).collect()
    }

    pub fn has_children(&self, vertex: &NodeKey) -> bool {
        self.graph.out_degree(vertex) > 0
    }

    /// Other children of the vertex's real parent (see [`Self::get_parent`])
    pub fn get_siblings(&self, vertex: &NodeKey) -> BTreeSet<NodeKey> {
        match self.get_parent(vertex) {
            Some(parent) => {
                let mut siblings = self.get_children(&parent);
                siblings.remove(vertex);
                siblings
            }
            None => BTreeSet::new(),
        }
    }

    /// Vertices with no outgoing edges
    pub fn get_leaf_vertices(&self) -> BTreeSet<NodeKey> {
        self.vertices().filter(|v| self.out_degree(v) == 0).collect()
    }

    /// First step of the path to a root
    pub fn get_parent(&self, vertex: &NodeKey) -> Option<NodeKey> {
        self.get_path_to_root(vertex)
            .and_then(|path| path.first().copied())
    }

    /// Path from `vertex` up to a root, excluding `vertex` and ending at the
    /// root.
    ///
    /// Returns an empty path when `vertex` is itself a root and `None` when
    /// no root can be reached. Parents are tried in natural order and a
    /// vertex already on the current path is never revisited, so cycles are
    /// safe.
    pub fn get_path_to_root(&self, vertex: &NodeKey) -> Option<Vec<NodeKey>> {
        if self.is_root(vertex) {
            return Some(Vec::new());
        }

        let mut on_path: BTreeSet<NodeKey> = BTreeSet::from([*vertex]);
        let mut stack: Vec<(NodeKey, Vec<NodeKey>, usize)> =
            vec![(*vertex, self.unvisited_parents(vertex, &on_path), 0)];

        while let Some((_, candidates, next)) = stack.last_mut() {
            let Some(&parent) = candidates.get(*next) else {
                if let Some((done, _, _)) = stack.pop() {
                    on_path.remove(&done);
                }
                continue;
            };
            *next += 1;

            if self.is_root(&parent) {
                let mut path: Vec<NodeKey> = stack.iter().skip(1).map(|(v, _, _)| *v).collect();
                path.push(parent);
                return Some(path);
            }

            on_path.insert(parent);
            let grandparents = self.unvisited_parents(&parent, &on_path);
            stack.push((parent, grandparents, 0));
        }

        None
    }

    fn unvisited_parents(&self, vertex: &NodeKey, visited: &BTreeSet<NodeKey>) -> Vec<NodeKey> {
        self.graph
            .parents(vertex)
            .filter(|p| !visited.contains(p))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ancestry (parent and grandparent depth only)
    // ─────────────────────────────────────────────────────────────────────────

    /// 1 if `ancestor` is a parent of `child`, 2 if a grandparent, else `None`
    pub fn is_ancestor(&self, child: &NodeKey, ancestor: &NodeKey) -> Option<usize> {
        let parents = self.get_parents(child);
        if parents.contains(ancestor) {
            return Some(1);
        }
        if parents.iter().any(|p| self.get_parents(p).contains(ancestor)) {
            return Some(2);
        }
        None
    }

    /// Distance to the nearest shared parent or grandparent
    pub fn common_ancestor(&self, v1: &NodeKey, v2: &NodeKey) -> Option<usize> {
        if v1 == v2 {
            return Some(0);
        }

        let v1_parents = self.get_parents(v1);
        let v2_parents = self.get_parents(v2);
        if v1_parents.contains(v2) || v2_parents.contains(v1) {
            return Some(1);
        }
        if v1_parents.iter().any(|p| v2_parents.contains(p)) {
            return Some(1);
        }

        let v1_grandparents = self.grandparents(&v1_parents);
        let v2_grandparents = self.grandparents(&v2_parents);
        if v1_grandparents.contains(v2) || v2_grandparents.contains(v1) {
            return Some(2);
        }
        let shared = v2_grandparents.iter().any(|g| v1_parents.contains(g))
            || v1_grandparents.iter().any(|g| v2_parents.contains(g))
            || v2_grandparents.iter().any(|g| v1_grandparents.contains(g));
        shared.then_some(2)
    }

    /// The nearest shared parent or grandparent. Either input is the answer
    /// when it is a parent or grandparent of the other, or when both are the
    /// same vertex.
    pub fn get_common_ancestor(&self, v1: &NodeKey, v2: &NodeKey) -> Option<NodeKey> {
        if v1 == v2 {
            return Some(*v1);
        }
        if self.is_ancestor(v1, v2).is_some() {
            return Some(*v2);
        }
        if self.is_ancestor(v2, v1).is_some() {
            return Some(*v1);
        }

        let v1_parents = self.get_parents(v1);
        let v2_parents = self.get_parents(v2);
        if let Some(shared) = v1_parents.iter().find(|p| v2_parents.contains(p)) {
            return Some(*shared);
        }

        let v1_grandparents = self.grandparents(&v1_parents);
        if let Some(shared) = v1_grandparents.iter().find(|g| v2_parents.contains(g)) {
            return Some(*shared);
        }

        let v2_grandparents = self.grandparents(&v2_parents);
        v2_grandparents
            .iter()
            .find(|g| v1_parents.contains(g) || v1_grandparents.contains(g))
            .copied()
    }

    fn grandparents(&self, parents: &BTreeSet<NodeKey>) -> BTreeSet<NodeKey> {
        parents.iter().flat_map(|p| self.graph.parents(p)).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reachability
    // ─────────────────────────────────────────────────────────────────────────

    /// Every vertex reachable from `root`, including `root` (BFS)
    pub fn get_subgraph_vertices(&self, root: &NodeKey) -> BTreeSet<NodeKey> {
        let mut result = BTreeSet::from([*root]);
        let mut queue = VecDeque::from([*root]);
        while let Some(current) = queue.pop_front() {
            for child in self.graph.children(&current) {
                if result.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        result
    }

    /// `vertex` plus everything it governs, directly or not
    pub fn descendants(&self, vertex: &NodeKey) -> Result<BTreeSet<NodeKey>> {
        if !self.contains_vertex(vertex) {
            return Err(self.unknown_vertex(*vertex));
        }
        let mut seen = BTreeSet::new();
        let mut stack = vec![*vertex];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            stack.extend(self.graph.children(&current).filter(|c| !seen.contains(c)));
        }
        Ok(seen)
    }

    /// Zero-based span `(begin inclusive, end exclusive)` of the subtree under
    /// `vertex`, following only non-extra edges
    pub fn yield_span(&self, vertex: &NodeKey) -> (i64, i64) {
        let nodes = self.yield_nodes(vertex);
        let begin = nodes.iter().map(|k| i64::from(k.index) - 1).min().unwrap_or(i64::MAX);
        let end = nodes.iter().map(|k| i64::from(k.index)).max().unwrap_or(i64::MIN);
        (begin, end)
    }

    /// Sorted vertices of the subtree under `vertex`, following only non-extra
    /// edges
    pub fn yield_nodes(&self, vertex: &NodeKey) -> Vec<NodeKey> {
        let mut seen = BTreeSet::new();
        let mut fringe = vec![*vertex];
        while let Some(current) = fringe.pop() {
            if !seen.insert(current) {
                continue;
            }
            fringe.extend(
                self.outgoing_edges(&current)
                    .filter(|e| !e.is_extra())
                    .map(Edge::dependent),
            );
        }
        seen.into_iter().collect()
    }

    /// True if the graph has no cycle
    pub fn is_dag(&self) -> bool {
        let unused = self.vertex_set();
        !self.has_cycle(unused)
    }

    /// True if the part of the graph reachable from `root` has no cycle
    pub fn is_dag_from(&self, root: &NodeKey) -> bool {
        let unused = self.get_subgraph_vertices(root);
        !self.has_cycle(unused)
    }

    fn has_cycle(&self, mut unused: BTreeSet<NodeKey>) -> bool {
        while let Some(start) = unused.pop_first() {
            let mut trail = BTreeSet::from([start]);
            let mut stack: Vec<(NodeKey, Vec<NodeKey>, usize)> =
                vec![(start, self.get_child_list(&start), 0)];

            while let Some((_, children, next)) = stack.last_mut() {
                let Some(&child) = children.get(*next) else {
                    if let Some((done, _, _)) = stack.pop() {
                        trail.remove(&done);
                    }
                    continue;
                };
                *next += 1;

                if trail.contains(&child) {
                    return true;
                }
                if unused.remove(&child) {
                    trail.insert(child);
                    stack.push((child, self.get_child_list(&child), 0));
                }
            }
        }
        false
    }

    /// Vertices ordered so every edge points forward
    pub fn topological_sort(&self) -> Result<Vec<NodeKey>> {
        self.graph.topological_sort()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shortest paths
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_shortest_undirected_path_nodes(&self, source: &NodeKey, target: &NodeKey) -> Option<Vec<NodeKey>> {
        self.graph.shortest_path(source, target, false)
    }

    pub fn get_shortest_undirected_path_edges(&self, source: &NodeKey, target: &NodeKey) -> Option<Vec<Edge>> {
        self.graph.shortest_path_edges(source, target, false)
    }

    pub fn get_shortest_directed_path_nodes(&self, source: &NodeKey, target: &NodeKey) -> Option<Vec<NodeKey>> {
        self.graph.shortest_path(source, target, true)
    }

    pub fn get_shortest_directed_path_edges(&self, source: &NodeKey, target: &NodeKey) -> Option<Vec<Edge>> {
        self.graph.shortest_path_edges(source, target, true)
    }

    /// Weakly connected components in vertex order
    pub fn connected_components(&self) -> Vec<BTreeSet<NodeKey>> {
        self.graph.connected_components()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// First vertex, in natural order, with the given word index
    pub fn get_node_by_index(&self, index: u32) -> Option<NodeKey> {
        self.vertices().find(|k| k.index == index)
    }

    pub fn get_node_by_index_and_copy_count(&self, index: u32, copy_count: u32) -> Option<NodeKey> {
        self.vertices()
            .find(|k| k.index == index && k.copy_count == copy_count)
    }

    /// First vertex whose whole word matches the regular expression
    pub fn get_node_by_word_pattern(&self, pattern: &str) -> Result<Option<NodeKey>> {
        let re = full_match(pattern)?;
        Ok(self
            .nodes
            .values()
            .find(|n| n.word.as_deref().is_some_and(|w| re.is_match(w)))
            .map(GraphNode::key))
    }

    pub fn get_all_nodes_by_word_pattern(&self, pattern: &str) -> Result<Vec<NodeKey>> {
        let re = full_match(pattern)?;
        Ok(self
            .nodes
            .values()
            .filter(|n| n.word.as_deref().is_some_and(|w| re.is_match(w)))
            .map(GraphNode::key)
            .collect())
    }

    /// Vertices whose whole tag matches the regular expression
    pub fn get_all_nodes_by_tag_pattern(&self, pattern: &str) -> Result<Vec<NodeKey>> {
        let re = full_match(pattern)?;
        Ok(self
            .nodes
            .values()
            .filter(|n| n.tag().is_some_and(|t| re.is_match(t)))
            .map(GraphNode::key)
            .collect())
    }

    /// Check a neighbourhood pattern such as `<ate>muffins` against a vertex.
    ///
    /// Each `<lemma` step needs a parent with that lemma; each `>lemma` step
    /// needs a child whose lemma (or lowercased word, when it has no lemma)
    /// is `lemma`.
    pub fn match_pattern_to_vertex(&self, pattern: &str, vertex: &NodeKey) -> Result<bool> {
        if !self.contains_vertex(vertex) {
            return Err(self.unknown_vertex(*vertex));
        }

        for step in split_pattern_steps(pattern) {
            let mut chars = step.chars();
            let direction = chars.next();
            let wanted = chars.as_str();
            let found = match direction {
                Some('<') => self
                    .graph
                    .parents(vertex)
                    .any(|p| self.nodes.get(&p).and_then(GraphNode::lemma) == Some(wanted)),
                Some('>') => self.graph.children(vertex).any(|c| self.child_lemma(&c) == wanted),
                _ => return Err(Error::InvalidPattern(format!("bad step {:?} in {:?}", step, pattern))),
            };
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn child_lemma(&self, key: &NodeKey) -> String {
        match self.nodes.get(key) {
            Some(node) => match node.lemma() {
                Some(lemma) if !lemma.is_empty() => lemma.to_string(),
                _ => node.word().to_lowercase(),
            },
            None => String::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Records and comments
    // ─────────────────────────────────────────────────────────────────────────

    /// Convert back into typed dependency records.
    ///
    /// One root record per root, governed by a synthetic `ROOT-0` node in
    /// the first root's sentence, followed by one record per edge.
    pub fn typed_dependencies(&self) -> Vec<TypedDependency> {
        let mut records = Vec::with_capacity(self.roots.len() + self.edge_count());

        if let Some(first) = self.roots.first() {
            let root_gov = GraphNode::new(NodeKey::new(0).in_sentence(first.sent_index)).with_word("ROOT");
            for root in &self.roots {
                records.push(TypedDependency::new(Relation::root(), root_gov.clone(), self.record(root)));
            }
        }

        for edge in self.edges() {
            let mut record = TypedDependency::new(
                edge.relation().clone(),
                self.record(&edge.source()),
                self.record(&edge.target()),
            )
            .with_weight(edge.weight());
            if edge.is_extra() {
                record = record.extra();
            }
            records.push(record);
        }

        records
    }

    fn record(&self, key: &NodeKey) -> GraphNode {
        self.nodes.get(key).cloned().unwrap_or_else(|| GraphNode::new(*key))
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub(crate) fn unknown_vertex(&self, vertex: NodeKey) -> Error {
        Error::UnknownVertex {
            vertex,
            graph: self.to_compact_string(false),
        }
    }
}

fn full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| Error::InvalidPattern(e.to_string()))
}

/// Split `<a>b<c` into `["<a", ">b", "<c"]`; leading text without a
/// direction marker becomes its own step
fn split_pattern_steps(pattern: &str) -> Vec<&str> {
    let mut steps = Vec::new();
    let mut start = 0;
    for (i, c) in pattern.char_indices() {
        if (c == '<' || c == '>') && i > start {
            steps.push(&pattern[start..i]);
            start = i;
        }
    }
    if start < pattern.len() {
        steps.push(&pattern[start..]);
    }
    steps
}

/// Same vertices, same edge multiset per vertex pair, same root set
impl PartialEq for SemanticGraph {
    fn eq(&self, other: &Self) -> bool {
        if self.graph != other.graph {
            return false;
        }
        let mut mine = self.roots.clone();
        let mut theirs = other.roots.clone();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}

impl Eq for SemanticGraph {}

/// Hashes the multigraph only; graphs differing just in roots collide
impl Hash for SemanticGraph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph.hash(state);
    }
}

impl std::fmt::Display for SemanticGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_compact_string(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn key(index: u32) -> NodeKey {
        NodeKey::new(index)
    }

    fn reln(name: &str) -> Relation {
        Relation::parse(name)
    }

    /// ate(2) -> Bill(1) [nsubj], ate(2) -> muffins(4) [obj],
    /// muffins(4) -> blueberry(3) [compound]
    fn create_test_graph() -> SemanticGraph {
        let ate = GraphNode::indexed("ate", 2).with_lemma("eat").with_tag("VBD");
        let bill = GraphNode::indexed("Bill", 1).with_tag("NNP");
        let muffins = GraphNode::indexed("muffins", 4).with_lemma("muffin").with_tag("NNS");
        let blueberry = GraphNode::indexed("blueberry", 3).with_tag("NN");

        SemanticGraph::from_dependencies(vec![
            TypedDependency::new(Relation::root(), GraphNode::indexed("ROOT", 0), ate.clone()),
            TypedDependency::new("nsubj", ate.clone(), bill),
            TypedDependency::new("obj", ate, muffins.clone()),
            TypedDependency::new("compound", muffins, blueberry),
        ])
    }

    fn hash_of(sg: &SemanticGraph) -> u64 {
        let mut hasher = DefaultHasher::new();
        sg.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_from_dependencies() {
        let sg = create_test_graph();

        assert_eq!(sg.size(), 4);
        assert_eq!(sg.edge_count(), 3);
        assert_eq!(sg.roots(), &[key(2)]);
        assert!(!sg.contains_vertex(&key(0)));
        assert_eq!(sg.node(&key(4)).and_then(GraphNode::lemma), Some("muffin"));
        assert!(sg.get_edge(&key(2), &key(1)).is_some_and(|e| e.weight() == f64::NEG_INFINITY));
    }

    #[test]
    fn test_remove_sole_edge_keeps_vertices() {
        let mut sg = create_test_graph();
        let edge = sg.get_edge(&key(4), &key(3)).cloned().unwrap();

        assert!(sg.remove_edge(&edge));
        assert!(sg.contains_vertex(&key(4)));
        assert!(sg.contains_vertex(&key(3)));
        assert_eq!(sg.edge_count(), 2);
    }

    #[test]
    fn test_update_edge() {
        let mut sg = create_test_graph();
        let edge = sg.get_edge(&key(2), &key(4)).cloned().unwrap();

        assert!(sg.update_edge(&edge, reln("dobj")));
        assert_eq!(sg.get_edge(&key(2), &key(4)).map(|e| e.relation().to_string()), Some("dobj".into()));
        assert!(!sg.update_edge(&edge, reln("iobj")));
        assert_eq!(sg.edge_count(), 3);
    }

    #[test]
    fn test_remove_vertex_drops_root() {
        let mut sg = create_test_graph();

        assert!(sg.remove_vertex(&key(2)));
        assert!(sg.roots().is_empty());
        assert!(sg.node(&key(2)).is_none());
        assert_eq!(sg.edge_count(), 1);
    }

    #[test]
    fn test_root_operations() {
        let mut sg = create_test_graph();

        assert!(matches!(sg.set_root(key(9)), Err(Error::UnknownVertex { .. })));
        assert_eq!(sg.roots(), &[key(2)]);

        sg.set_roots([key(4), key(1), key(4)]).unwrap();
        assert_eq!(sg.roots(), &[key(4), key(1)]);
        assert_eq!(sg.first_root().unwrap(), key(4));

        sg.add_root(GraphNode::indexed("extra", 9));
        assert!(sg.contains_vertex(&key(9)));
        assert!(sg.is_root(&key(9)));

        assert!(matches!(SemanticGraph::new().first_root(), Err(Error::NoRoots(_))));
    }

    #[test]
    fn test_path_to_root() {
        let sg = create_test_graph();

        assert_eq!(sg.get_path_to_root(&key(3)), Some(vec![key(4), key(2)]));
        assert_eq!(sg.get_path_to_root(&key(2)), Some(vec![]));
        assert_eq!(sg.get_parent(&key(3)), Some(key(4)));
        assert_eq!(sg.get_parent(&key(2)), None);
        assert_eq!(sg.get_siblings(&key(1)), BTreeSet::from([key(4)]));
        assert!(sg.get_siblings(&key(2)).is_empty());
    }

    #[test]
    fn test_path_to_root_through_cycle() {
        // 1 -> 2 -> 3 -> 2, root 1; 3 also has parent 4 which nothing reaches
        let mut sg = SemanticGraph::new();
        sg.add_root(GraphNode::indexed("a", 1));
        sg.add_edge(key(1), key(2), reln("dep"), 0.0, false);
        sg.add_edge(key(2), key(3), reln("dep"), 0.0, false);
        sg.add_edge(key(3), key(2), reln("dep"), 0.0, false);
        sg.add_edge(key(4), key(3), reln("dep"), 0.0, false);

        assert_eq!(sg.get_path_to_root(&key(3)), Some(vec![key(2), key(1)]));
        assert_eq!(sg.get_path_to_root(&key(4)), None);
    }

    #[test]
    fn test_bounded_ancestry() {
        let sg = create_test_graph();

        assert_eq!(sg.is_ancestor(&key(4), &key(2)), Some(1));
        assert_eq!(sg.is_ancestor(&key(3), &key(2)), Some(2));
        assert_eq!(sg.is_ancestor(&key(2), &key(3)), None);

        assert_eq!(sg.common_ancestor(&key(1), &key(1)), Some(0));
        assert_eq!(sg.common_ancestor(&key(1), &key(4)), Some(1));
        assert_eq!(sg.common_ancestor(&key(1), &key(3)), Some(2));

        assert_eq!(sg.get_common_ancestor(&key(1), &key(3)), Some(key(2)));
        assert_eq!(sg.get_common_ancestor(&key(3), &key(2)), Some(key(2)));
    }

    #[test]
    fn test_ancestry_stops_at_grandparents() {
        // chain 1 -> 2 -> 3 -> 4
        let mut sg = SemanticGraph::new();
        for (gov, dep) in [(1, 2), (2, 3), (3, 4)] {
            sg.add_edge(key(gov), key(dep), reln("dep"), 0.0, false);
        }

        assert_eq!(sg.is_ancestor(&key(4), &key(2)), Some(2));
        assert_eq!(sg.is_ancestor(&key(4), &key(1)), None);
        assert_eq!(sg.get_common_ancestor(&key(4), &key(1)), None);
    }

    #[test]
    fn test_descendants_and_subgraph() {
        let sg = create_test_graph();

        assert_eq!(sg.descendants(&key(4)).unwrap(), BTreeSet::from([key(3), key(4)]));
        assert_eq!(sg.get_subgraph_vertices(&key(2)).len(), 4);
        assert!(matches!(sg.descendants(&key(8)), Err(Error::UnknownVertex { .. })));
        assert_eq!(sg.get_leaf_vertices(), BTreeSet::from([key(1), key(3)]));
    }

    #[test]
    fn test_is_dag() {
        let mut sg = create_test_graph();
        assert!(sg.is_dag());

        sg.add_edge(key(3), key(2), reln("dep"), 0.0, false);
        assert!(!sg.is_dag());
        assert!(!sg.is_dag_from(&key(4)));
        assert!(sg.is_dag_from(&key(1)));
        assert!(matches!(sg.topological_sort(), Err(Error::CyclicGraph(_))));
    }

    #[test]
    fn test_reset_roots_prefers_parentless() {
        let mut sg = create_test_graph();
        sg.add_vertex(GraphNode::indexed("lonely", 7));
        sg.set_root(key(4)).unwrap();

        sg.reset_roots();
        assert_eq!(sg.roots(), &[key(2), key(7)]);
    }

    #[test]
    fn test_reset_roots_on_full_cycle() {
        // 1 -> 2 -> 3 -> 1 and 2 -> 4 -> 2. Distance sums: 1 = 5, 2 = 4,
        // 3 = 6, 4 = 6; the tie between 3 and 4 goes to 3
        let mut sg = SemanticGraph::new();
        for (gov, dep) in [(1, 2), (2, 3), (3, 1), (2, 4), (4, 2)] {
            sg.add_edge(key(gov), key(dep), reln("dep"), 0.0, false);
        }

        sg.reset_roots();
        assert_eq!(sg.roots(), &[key(3)]);

        let mut empty = SemanticGraph::new();
        empty.reset_roots();
        assert!(empty.roots().is_empty());
    }

    #[test]
    fn test_shortest_paths() {
        let sg = create_test_graph();

        let edges = sg.get_shortest_directed_path_edges(&key(2), &key(3)).unwrap();
        let relations: Vec<String> = edges.iter().map(|e| e.relation().to_string()).collect();
        assert_eq!(relations, vec!["obj", "compound"]);

        assert_eq!(sg.get_shortest_directed_path_edges(&key(3), &key(3)), Some(vec![]));
        assert_eq!(sg.get_shortest_directed_path_nodes(&key(1), &key(3)), None);
        assert_eq!(
            sg.get_shortest_undirected_path_nodes(&key(1), &key(3)),
            Some(vec![key(1), key(2), key(4), key(3)])
        );
    }

    #[test]
    fn test_pattern_lookups() {
        let sg = create_test_graph();

        assert_eq!(sg.get_node_by_word_pattern("mu.*").unwrap(), Some(key(4)));
        assert_eq!(sg.get_node_by_word_pattern("muff").unwrap(), None);
        assert_eq!(sg.get_all_nodes_by_tag_pattern("NN.*").unwrap(), vec![key(1), key(3), key(4)]);
        assert!(matches!(sg.get_all_nodes_by_word_pattern("("), Err(Error::InvalidPattern(_))));
        assert_eq!(sg.get_node_by_index(3), Some(key(3)));
        assert_eq!(sg.get_node_by_index_and_copy_count(3, 1), None);
    }

    #[test]
    fn test_match_pattern_to_vertex() {
        let sg = create_test_graph();

        assert!(sg.match_pattern_to_vertex("<eat>blueberry", &key(4)).unwrap());
        assert!(sg.match_pattern_to_vertex(">bill>muffin", &key(2)).unwrap());
        assert!(!sg.match_pattern_to_vertex("<ate", &key(4)).unwrap());
        assert!(matches!(sg.match_pattern_to_vertex("eat>bill", &key(2)), Err(Error::InvalidPattern(_))));
        assert!(sg.match_pattern_to_vertex(">x", &key(9)).is_err());
    }

    #[test]
    fn test_yield_skips_extra_edges() {
        let mut sg = create_test_graph();
        sg.add_edge(key(3), key(1), reln("ref"), 0.0, true);

        assert_eq!(sg.yield_nodes(&key(4)), vec![key(3), key(4)]);
        assert_eq!(sg.yield_span(&key(4)), (2, 4));
        assert_eq!(sg.yield_span(&key(2)), (0, 4));
    }

    #[test]
    fn test_typed_dependencies_round_trip() {
        let sg = create_test_graph();
        let records = sg.typed_dependencies();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].to_string(), "root(ROOT-0, ate-2)");
        assert_eq!(SemanticGraph::from_dependencies(records), sg);
    }

    #[test]
    fn test_equality_and_hash() {
        let sg = create_test_graph();
        let mut rerooted = sg.clone();
        rerooted.set_root(key(4)).unwrap();

        assert_ne!(sg, rerooted);
        assert_eq!(hash_of(&sg), hash_of(&rerooted));

        let mut renamed = sg.clone();
        if let Some(node) = renamed.node_mut(&key(1)) {
            node.word = Some("William".into());
        }
        assert_eq!(sg, renamed);
    }

    #[test]
    fn test_copies() {
        let sg = create_test_graph();

        let (moved, mapping) = sg.copy_with_map(|n| {
            let mut fresh = n.clone();
            fresh.key = fresh.key.in_sentence(5);
            fresh
        });
        assert_eq!(mapping.get(&key(2)), Some(&key(2).in_sentence(5)));
        assert_eq!(moved.roots(), &[key(2).in_sentence(5)]);
        assert_eq!(moved.edge_count(), 3);

        let mut multi = sg.clone();
        multi.add_root(GraphNode::indexed("other", 8));
        let soft = multi.make_soft_copy();
        assert_eq!(soft.roots(), &[key(2)]);
        assert_eq!(soft.edge_count(), 3);
        assert!(!soft.contains_vertex(&key(8)));
        assert_eq!(soft.node(&key(1)).map(GraphNode::word), Some("Bill"));
    }

    #[test]
    fn test_delete_duplicate_edges() {
        let mut sg = create_test_graph();
        sg.add_edge(key(2), key(1), reln("nsubj"), 3.0, false);
        sg.add_edge(key(2), key(1), reln("nmod"), 0.0, false);

        sg.delete_duplicate_edges();
        assert_eq!(sg.get_all_edges(&key(2), &key(1)).len(), 2);
    }

    #[test]
    fn test_delete_duplicate_edges_keeps_distinct_relations_with_same_text() {
        let mut sg = create_test_graph();
        let split = Relation::parse("a:b");
        let whole = Relation::new("a:b");
        sg.add_edge(key(2), key(1), split.clone(), 0.0, false);
        sg.add_edge(key(2), key(1), whole.clone(), 0.0, false);
        sg.add_edge(key(2), key(1), split.clone(), 1.0, true);

        let mut other = sg.clone();
        sg.delete_duplicate_edges();
        let kept = sg.get_all_edges(&key(2), &key(1));
        assert_eq!(kept.iter().filter(|e| *e.relation() == split).count(), 1);
        assert_eq!(kept.iter().filter(|e| *e.relation() == whole).count(), 1);

        other.remove_edge(&Edge::new(key(2), key(1), split, 0.0, false));
        assert_eq!(sg, other);
    }
}
