//! Directed multigraph storage
//!
//! Adjacency is kept twice (outgoing and incoming), each as a map from a
//! vertex to its neighbour buckets; a bucket holds every parallel edge
//! between one ordered pair of vertices, in insertion order. Vertices iterate
//! in their natural order, which keeps every traversal deterministic.
//!
//! There is deliberately no way to materialize the full edge set: callers
//! iterate with [`MultiGraph::edges`].

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

type Buckets<V, E> = BTreeMap<V, Vec<E>>;

/// Directed graph allowing parallel edges between the same pair of vertices
#[derive(Debug, Clone)]
pub struct MultiGraph<V, E> {
    outgoing: BTreeMap<V, Buckets<V, E>>,
    incoming: BTreeMap<V, Buckets<V, E>>,
}

impl<V, E> Default for MultiGraph<V, E> {
    fn default() -> Self {
        Self {
            outgoing: BTreeMap::new(),
            incoming: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Temporary,
    Permanent,
}

impl<V, E> MultiGraph<V, E>
where
    V: Copy + Ord + Debug,
    E: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a zero-degree vertex. Returns false if it was already present.
    pub fn add_vertex(&mut self, v: V) -> bool {
        if self.outgoing.contains_key(&v) {
            return false;
        }
        self.outgoing.insert(v, BTreeMap::new());
        self.incoming.insert(v, BTreeMap::new());
        true
    }

    /// Add an edge, inserting missing endpoints
    pub fn add(&mut self, source: V, dest: V, data: E) {
        self.add_vertex(source);
        self.add_vertex(dest);
        self.outgoing
            .entry(source)
            .or_default()
            .entry(dest)
            .or_default()
            .push(data.clone());
        self.incoming
            .entry(dest)
            .or_default()
            .entry(source)
            .or_default()
            .push(data);
    }

    /// Remove every edge from `source` to `dest`
    pub fn remove_edges(&mut self, source: &V, dest: &V) -> bool {
        let removed = self
            .outgoing
            .get_mut(source)
            .and_then(|buckets| buckets.remove(dest))
            .is_some();
        if removed {
            if let Some(buckets) = self.incoming.get_mut(dest) {
                buckets.remove(source);
            }
        }
        removed
    }

    /// Remove the first edge equal to `data` between `source` and `dest`.
    /// The endpoints stay in the graph even when this was their only edge.
    pub fn remove_edge(&mut self, source: &V, dest: &V, data: &E) -> bool {
        let found_out = Self::remove_from_bucket(&mut self.outgoing, source, dest, data);
        let found_in = Self::remove_from_bucket(&mut self.incoming, dest, source, data);
        debug_assert_eq!(found_out, found_in, "outgoing and incoming adjacency disagree");
        found_out
    }

    fn remove_from_bucket(map: &mut BTreeMap<V, Buckets<V, E>>, from: &V, to: &V, data: &E) -> bool {
        let Some(buckets) = map.get_mut(from) else {
            return false;
        };
        let Some(bucket) = buckets.get_mut(to) else {
            return false;
        };
        let found = match bucket.iter().position(|e| e == data) {
            Some(pos) => {
                bucket.remove(pos);
                true
            }
            None => false,
        };
        if bucket.is_empty() {
            buckets.remove(to);
        }
        found
    }

    /// Remove a vertex and every edge touching it
    pub fn remove_vertex(&mut self, vertex: &V) -> bool {
        let Some(children) = self.outgoing.remove(vertex) else {
            return false;
        };
        let parents = self.incoming.remove(vertex).unwrap_or_default();
        for child in children.keys() {
            if let Some(buckets) = self.incoming.get_mut(child) {
                buckets.remove(vertex);
            }
        }
        for parent in parents.keys() {
            if let Some(buckets) = self.outgoing.get_mut(parent) {
                buckets.remove(vertex);
            }
        }
        true
    }

    pub fn remove_vertices<'a, I>(&mut self, vertices: I) -> bool
    where
        I: IntoIterator<Item = &'a V>,
        V: 'a,
    {
        let mut changed = false;
        for v in vertices {
            changed |= self.remove_vertex(v);
        }
        changed
    }

    /// Delete vertices with no incoming and no outgoing edges
    pub fn remove_zero_degree_nodes(&mut self) {
        let isolated: Vec<V> = self
            .outgoing
            .iter()
            .filter(|(v, out)| out.is_empty() && self.incoming.get(*v).map_or(true, |m| m.is_empty()))
            .map(|(v, _)| *v)
            .collect();
        for v in isolated {
            self.outgoing.remove(&v);
            self.incoming.remove(&v);
        }
    }

    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn num_vertices(&self) -> usize {
        self.outgoing.len()
    }

    pub fn num_edges(&self) -> usize {
        self.outgoing
            .values()
            .flat_map(|buckets| buckets.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    pub fn contains_vertex(&self, v: &V) -> bool {
        self.outgoing.contains_key(v)
    }

    /// Is there at least one edge from `source` to `dest`?
    pub fn is_edge(&self, source: &V, dest: &V) -> bool {
        !self.get_edges(source, dest).is_empty()
    }

    /// Edge in either direction
    pub fn is_neighbor(&self, a: &V, b: &V) -> bool {
        self.is_edge(a, b) || self.is_edge(b, a)
    }

    /// All vertices in natural order
    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.outgoing.keys().copied()
    }

    /// Every edge, grouped by source then target
    pub fn edges(&self) -> impl Iterator<Item = &E> + '_ {
        self.outgoing
            .values()
            .flat_map(|buckets| buckets.values())
            .flatten()
    }

    pub fn outgoing_edges(&self, v: &V) -> impl Iterator<Item = &E> + '_ {
        self.outgoing
            .get(v)
            .into_iter()
            .flat_map(|buckets| buckets.values())
            .flatten()
    }

    pub fn incoming_edges(&self, v: &V) -> impl Iterator<Item = &E> + '_ {
        self.incoming
            .get(v)
            .into_iter()
            .flat_map(|buckets| buckets.values())
            .flatten()
    }

    /// Edges from `source` to `dest`, in insertion order
    pub fn get_edges(&self, source: &V, dest: &V) -> &[E] {
        self.outgoing
            .get(source)
            .and_then(|buckets| buckets.get(dest))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct parents in natural order (empty for unknown vertices)
    pub fn parents(&self, v: &V) -> impl Iterator<Item = V> + '_ {
        self.incoming
            .get(v)
            .into_iter()
            .flat_map(|buckets| buckets.keys().copied())
    }

    /// Distinct children in natural order (empty for unknown vertices)
    pub fn children(&self, v: &V) -> impl Iterator<Item = V> + '_ {
        self.outgoing
            .get(v)
            .into_iter()
            .flat_map(|buckets| buckets.keys().copied())
    }

    pub fn neighbors(&self, v: &V) -> BTreeSet<V> {
        self.children(v).chain(self.parents(v)).collect()
    }

    pub fn in_degree(&self, v: &V) -> usize {
        self.incoming
            .get(v)
            .map_or(0, |buckets| buckets.values().map(Vec::len).sum())
    }

    pub fn out_degree(&self, v: &V) -> usize {
        self.outgoing
            .get(v)
            .map_or(0, |buckets| buckets.values().map(Vec::len).sum())
    }

    /// Weakly connected components, each listed once in vertex order
    pub fn connected_components(&self) -> Vec<BTreeSet<V>> {
        let mut seen: BTreeSet<V> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.vertices() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = BTreeSet::from([start]);
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for next in self.children(&current).chain(self.parents(&current)) {
                    if seen.insert(next) {
                        component.insert(next);
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }

        components
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paths
    // ─────────────────────────────────────────────────────────────────────────

    /// BFS shortest path as a node list, `None` when either endpoint is
    /// missing or `target` cannot be reached. When `directed` is false the
    /// search may also walk from a vertex to its parents.
    pub fn shortest_path(&self, source: &V, target: &V, directed: bool) -> Option<Vec<V>> {
        if !self.contains_vertex(source) || !self.contains_vertex(target) {
            return None;
        }
        if source == target {
            return Some(vec![*source]);
        }

        let mut parent: BTreeMap<V, V> = BTreeMap::new();
        let mut visited: BTreeSet<V> = BTreeSet::from([*source]);
        let mut queue: VecDeque<V> = VecDeque::from([*source]);

        while let Some(current) = queue.pop_front() {
            let forward = self.children(&current);
            let backward = self.parents(&current).filter(|_| !directed);
            for next in forward.chain(backward) {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == *target {
                    return Some(Self::reconstruct_path(source, target, &parent));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn reconstruct_path(source: &V, target: &V, parent: &BTreeMap<V, V>) -> Vec<V> {
        let mut nodes = vec![*target];
        let mut current = *target;
        while current != *source {
            match parent.get(&current) {
                Some(prev) => {
                    nodes.push(*prev);
                    current = *prev;
                }
                None => break,
            }
        }
        nodes.reverse();
        nodes
    }

    /// BFS shortest path as an edge list; a single-vertex path has no edges
    pub fn shortest_path_edges(&self, source: &V, target: &V, directed: bool) -> Option<Vec<E>> {
        self.shortest_path(source, target, directed)
            .map(|nodes| self.convert_path(&nodes, directed))
    }

    /// Pick the first edge connecting each consecutive pair of `nodes`
    pub fn convert_path(&self, nodes: &[V], directed: bool) -> Vec<E> {
        let mut path = Vec::with_capacity(nodes.len().saturating_sub(1));
        for pair in nodes.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let mut edges = self.get_edges(from, to);
            if edges.is_empty() && !directed {
                edges = self.get_edges(to, from);
            }
            match edges.first() {
                Some(edge) => path.push(edge.clone()),
                None => {
                    tracing::warn!("Path given with missing edge connection: {:?} -> {:?}", from, to);
                    break;
                }
            }
        }
        path
    }

    /// Order the vertices so every edge points forward.
    ///
    /// Fails with [`Error::CyclicGraph`] if the graph has a cycle
    /// (self-loops included).
    pub fn topological_sort(&self) -> Result<Vec<V>> {
        let mut marks: BTreeMap<V, Mark> = BTreeMap::new();
        let mut result = Vec::with_capacity(self.num_vertices());

        for start in self.vertices() {
            if marks.contains_key(&start) {
                continue;
            }
            marks.insert(start, Mark::Temporary);
            let mut stack: Vec<(V, Vec<V>, usize)> = vec![(start, self.children(&start).collect(), 0)];

            while let Some((vertex, children, next)) = stack.last_mut() {
                if let Some(&child) = children.get(*next) {
                    *next += 1;
                    match marks.get(&child) {
                        Some(Mark::Permanent) => {}
                        Some(Mark::Temporary) => {
                            return Err(Error::CyclicGraph(format!(
                                "topological sort not possible, {:?} is on a cycle",
                                child
                            )));
                        }
                        None => {
                            marks.insert(child, Mark::Temporary);
                            let grandchildren = self.children(&child).collect();
                            stack.push((child, grandchildren, 0));
                        }
                    }
                } else {
                    let done = *vertex;
                    stack.pop();
                    marks.insert(done, Mark::Permanent);
                    result.push(done);
                }
            }
        }

        result.reverse();
        Ok(result)
    }
}

impl<V, E> MultiGraph<V, E>
where
    V: Copy + Ord + Debug,
    E: Clone + Ord,
{
    /// Collapse equal parallel edges; each bucket ends up sorted
    pub fn delete_duplicate_edges(&mut self) {
        for buckets in self.outgoing.values_mut().chain(self.incoming.values_mut()) {
            for bucket in buckets.values_mut() {
                bucket.sort();
                bucket.dedup();
            }
        }
    }
}

fn same_multiset<E: Clone + Ord>(a: &[E], b: &[E]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// Same vertices, and the same multiset of edges between every pair
impl<V, E> PartialEq for MultiGraph<V, E>
where
    V: Ord,
    E: Clone + Ord,
{
    fn eq(&self, other: &Self) -> bool {
        self.outgoing.len() == other.outgoing.len()
            && self
                .outgoing
                .iter()
                .zip(other.outgoing.iter())
                .all(|((v1, b1), (v2, b2))| {
                    v1 == v2
                        && b1.len() == b2.len()
                        && b1
                            .iter()
                            .zip(b2.iter())
                            .all(|((d1, e1), (d2, e2))| d1 == d2 && same_multiset(e1, e2))
                })
    }
}

impl<V, E> Eq for MultiGraph<V, E>
where
    V: Ord,
    E: Clone + Ord,
{
}

impl<V, E> Hash for MultiGraph<V, E>
where
    V: Ord + Hash,
    E: Clone + Ord + Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (v, buckets) in &self.outgoing {
            v.hash(state);
            for (dest, edges) in buckets {
                dest.hash(state);
                let mut sorted = edges.clone();
                sorted.sort();
                sorted.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Graph = MultiGraph<u32, &'static str>;

    fn create_test_graph() -> Graph {
        // 1 -> 2 -> 3 -> 4
        //      |         ^
        //      v         |
        //      5 --------+
        let mut g = Graph::new();
        g.add(1, 2, "a");
        g.add(2, 3, "b");
        g.add(3, 4, "c");
        g.add(2, 5, "d");
        g.add(5, 4, "e");
        g
    }

    #[test]
    fn test_parallel_edges() {
        let mut g = Graph::new();
        g.add(1, 2, "x");
        g.add(1, 2, "y");
        g.add(1, 2, "x");

        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.get_edges(&1, &2), &["x", "y", "x"]);
        assert_eq!(g.out_degree(&1), 3);
        assert_eq!(g.in_degree(&2), 3);
        assert_eq!(g.children(&1).collect::<Vec<_>>(), vec![2]);

        g.delete_duplicate_edges();
        assert_eq!(g.get_edges(&1, &2), &["x", "y"]);
        assert_eq!(g.incoming_edges(&2).count(), 2);
    }

    #[test]
    fn test_remove_edge_keeps_vertices() {
        let mut g = Graph::new();
        g.add(1, 2, "only");

        assert!(g.remove_edge(&1, &2, &"only"));
        assert!(!g.remove_edge(&1, &2, &"only"));
        assert!(g.contains_vertex(&1));
        assert!(g.contains_vertex(&2));
        assert_eq!(g.num_edges(), 0);
        assert!(!g.is_edge(&1, &2));
    }

    #[test]
    fn test_remove_vertex_drops_edges() {
        let mut g = create_test_graph();

        assert!(g.remove_vertex(&2));
        assert!(!g.remove_vertex(&2));
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.out_degree(&1), 0);
        assert_eq!(g.in_degree(&3), 0);
    }

    #[test]
    fn test_remove_zero_degree_nodes() {
        let mut g = create_test_graph();
        g.add_vertex(9);
        g.remove_edges(&3, &4);
        g.remove_edges(&2, &3);

        g.remove_zero_degree_nodes();
        assert!(!g.contains_vertex(&9));
        assert!(!g.contains_vertex(&3));
        assert!(g.contains_vertex(&4));
    }

    #[test]
    fn test_shortest_paths() {
        let g = create_test_graph();

        assert_eq!(g.shortest_path(&1, &4, true), Some(vec![1, 2, 3, 4]));
        assert_eq!(g.shortest_path_edges(&1, &4, true), Some(vec!["a", "b", "c"]));
        assert_eq!(g.shortest_path(&4, &1, true), None);
        assert_eq!(g.shortest_path(&4, &1, false), Some(vec![4, 3, 2, 1]));
        assert_eq!(g.shortest_path_edges(&4, &1, false), Some(vec!["c", "b", "a"]));
        assert_eq!(g.shortest_path(&3, &3, true), Some(vec![3]));
        assert_eq!(g.shortest_path_edges(&3, &3, true), Some(vec![]));
        assert_eq!(g.shortest_path(&1, &42, false), None);
    }

    #[test]
    fn test_topological_sort() {
        let g = create_test_graph();
        let order = g.topological_sort().unwrap();
        let position = |v: u32| order.iter().position(|x| *x == v).unwrap();

        assert_eq!(order.len(), 5);
        assert!(position(1) < position(2));
        assert!(position(2) < position(3));
        assert!(position(3) < position(4));
        assert!(position(5) < position(4));
    }

    #[test]
    fn test_topological_sort_cycle() {
        let mut g = create_test_graph();
        g.add(4, 2, "back");
        assert!(matches!(g.topological_sort(), Err(Error::CyclicGraph(_))));

        let mut looped = Graph::new();
        looped.add(7, 7, "self");
        assert!(matches!(looped.topological_sort(), Err(Error::CyclicGraph(_))));
    }

    #[test]
    fn test_connected_components() {
        let mut g = create_test_graph();
        g.add(10, 11, "z");
        g.add_vertex(20);

        let components = g.connected_components();
        assert_eq!(components.len(), 3);
        assert_eq!(components[0], BTreeSet::from([1, 2, 3, 4, 5]));
        assert_eq!(components[1], BTreeSet::from([10, 11]));
        assert_eq!(components[2], BTreeSet::from([20]));
    }

    #[test]
    fn test_equality_is_order_insensitive_within_buckets() {
        let mut a = Graph::new();
        a.add(1, 2, "x");
        a.add(1, 2, "y");
        let mut b = Graph::new();
        b.add(1, 2, "y");
        b.add(1, 2, "x");

        assert_eq!(a, b);

        b.add_vertex(3);
        assert_ne!(a, b);
    }
}
