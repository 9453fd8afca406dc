//! Relation-indexed queries
//!
//! Every helper here is a linear scan over adjacency; no relation index is
//! kept. Asking about a vertex that is not in the graph is an
//! [`Error::UnknownVertex`](crate::Error::UnknownVertex), never an empty
//! answer.

use crate::edge::Edge;
use crate::error::Result;
use crate::graph::SemanticGraph;
use crate::node::NodeKey;
use crate::relation::Relation;
use std::collections::BTreeSet;

impl SemanticGraph {
    pub fn get_children_with_reln(&self, vertex: &NodeKey, reln: &Relation) -> Result<BTreeSet<NodeKey>> {
        self.require_vertex(vertex)?;
        Ok(self
            .outgoing_edges(vertex)
            .filter(|e| e.relation() == reln)
            .map(Edge::target)
            .collect())
    }

    /// Children reached through any of `relns`
    pub fn get_children_with_relns(&self, vertex: &NodeKey, relns: &[Relation]) -> Result<BTreeSet<NodeKey>> {
        self.require_vertex(vertex)?;
        Ok(self
            .outgoing_edges(vertex)
            .filter(|e| relns.contains(e.relation()))
            .map(Edge::target)
            .collect())
    }

    /// Target of the first outgoing edge carrying `reln`
    pub fn get_child_with_reln(&self, vertex: &NodeKey, reln: &Relation) -> Result<Option<NodeKey>> {
        self.require_vertex(vertex)?;
        Ok(self
            .outgoing_edges(vertex)
            .find(|e| e.relation() == reln)
            .map(Edge::target))
    }

    pub fn get_parents_with_reln(&self, vertex: &NodeKey, reln: &Relation) -> Result<BTreeSet<NodeKey>> {
        self.require_vertex(vertex)?;
        Ok(self
            .incoming_edges(vertex)
            .filter(|e| e.relation() == reln)
            .map(Edge::source)
            .collect())
    }

    /// Parents whose edge relation renders exactly as `name`
    pub fn get_parents_with_reln_name(&self, vertex: &NodeKey, name: &str) -> Result<BTreeSet<NodeKey>> {
        self.require_vertex(vertex)?;
        Ok(self
            .incoming_edges(vertex)
            .filter(|e| e.relation().to_string() == name)
            .map(Edge::source)
            .collect())
    }

    /// Does `vertex` have a `reln` child whose lemma is `lemma`?
    pub fn has_child(&self, vertex: &NodeKey, reln: &Relation, lemma: &str) -> Result<bool> {
        self.require_vertex(vertex)?;
        Ok(self.outgoing_edges(vertex).any(|e| {
            e.relation() == reln
                && self
                    .node(&e.target())
                    .and_then(|n| n.lemma())
                    .is_some_and(|l| l == lemma)
        }))
    }

    pub fn has_child_with_reln(&self, vertex: &NodeKey, reln: &Relation) -> Result<bool> {
        self.require_vertex(vertex)?;
        Ok(self.outgoing_edges(vertex).any(|e| e.relation() == reln))
    }

    pub fn has_parent_with_reln(&self, vertex: &NodeKey, reln: &Relation) -> Result<bool> {
        self.require_vertex(vertex)?;
        Ok(self.incoming_edges(vertex).any(|e| e.relation() == reln))
    }

    /// `(relation, child)` for every outgoing edge
    pub fn child_pairs(&self, vertex: &NodeKey) -> Result<Vec<(Relation, NodeKey)>> {
        self.require_vertex(vertex)?;
        Ok(self
            .outgoing_edges(vertex)
            .map(|e| (e.relation().clone(), e.target()))
            .collect())
    }

    /// `(relation, parent)` for every incoming edge
    pub fn parent_pairs(&self, vertex: &NodeKey) -> Result<Vec<(Relation, NodeKey)>> {
        self.require_vertex(vertex)?;
        Ok(self
            .incoming_edges(vertex)
            .map(|e| (e.relation().clone(), e.source()))
            .collect())
    }

    /// Relations this vertex bears to its parents
    pub fn relns(&self, vertex: &NodeKey) -> Result<BTreeSet<Relation>> {
        Ok(self.parent_pairs(vertex)?.into_iter().map(|(r, _)| r).collect())
    }

    /// Relations this vertex bears to its children
    pub fn child_relns(&self, vertex: &NodeKey) -> Result<BTreeSet<Relation>> {
        Ok(self.child_pairs(vertex)?.into_iter().map(|(r, _)| r).collect())
    }

    /// Relation of the first edge from `a` to `b`, if any. With parallel edges
    /// only one relation is reported.
    pub fn reln(&self, a: &NodeKey, b: &NodeKey) -> Result<Option<Relation>> {
        self.require_vertex(a)?;
        Ok(self
            .outgoing_edges(a)
            .find(|e| e.target() == *b)
            .map(|e| e.relation().clone()))
    }

    /// Every edge carrying exactly `reln`
    pub fn find_all_relns(&self, reln: &Relation) -> Vec<&Edge> {
        self.edges().filter(|e| e.relation() == reln).collect()
    }

    /// Every edge whose relation has the given short name
    pub fn find_all_relns_by_name(&self, short_name: &str) -> Vec<&Edge> {
        self.edges()
            .filter(|e| e.relation().short_name() == short_name)
            .collect()
    }

    fn require_vertex(&self, vertex: &NodeKey) -> Result<()> {
        if self.contains_vertex(vertex) {
            Ok(())
        } else {
            Err(self.unknown_vertex(*vertex))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::node::GraphNode;
    use crate::relation::TypedDependency;
    use crate::*;

    fn key(index: u32) -> NodeKey {
        NodeKey::new(index)
    }

    fn create_test_graph() -> SemanticGraph {
        let saw = GraphNode::indexed("saw", 2).with_lemma("see");
        let i = GraphNode::indexed("I", 1).with_lemma("I");
        let dog = GraphNode::indexed("dog", 4).with_lemma("dog");
        let the = GraphNode::indexed("the", 3).with_lemma("the");
        let park = GraphNode::indexed("park", 6).with_lemma("park");

        SemanticGraph::from_dependencies(vec![
            TypedDependency::new(Relation::root(), GraphNode::indexed("ROOT", 0), saw.clone()),
            TypedDependency::new("nsubj", saw.clone(), i),
            TypedDependency::new("obj", saw.clone(), dog.clone()),
            TypedDependency::new("det", dog, the),
            TypedDependency::new("obl:in", saw, park),
        ])
    }

    #[test]
    fn test_children_and_parents_with_reln() {
        let sg = create_test_graph();
        let obj = Relation::new("obj");

        assert_eq!(
            sg.get_children_with_reln(&key(2), &obj).unwrap().into_iter().collect::<Vec<_>>(),
            vec![key(4)]
        );
        assert_eq!(sg.get_child_with_reln(&key(2), &Relation::parse("obl:in")).unwrap(), Some(key(6)));
        assert_eq!(sg.get_child_with_reln(&key(2), &Relation::new("iobj")).unwrap(), None);
        assert_eq!(
            sg.get_children_with_relns(&key(2), &[obj.clone(), Relation::new("nsubj")])
                .unwrap()
                .len(),
            2
        );
        assert!(sg.get_parents_with_reln(&key(4), &obj).unwrap().contains(&key(2)));
        assert!(sg.get_parents_with_reln_name(&key(6), "obl:in").unwrap().contains(&key(2)));
        assert!(sg.get_parents_with_reln_name(&key(6), "obl").unwrap().is_empty());
        assert!(sg.get_children_with_reln(&key(1), &obj).unwrap().is_empty());
    }

    #[test]
    fn test_has_child() {
        let sg = create_test_graph();

        assert!(sg.has_child(&key(4), &Relation::new("det"), "the").unwrap());
        assert!(!sg.has_child(&key(4), &Relation::new("det"), "a").unwrap());
        assert!(sg.has_child_with_reln(&key(2), &Relation::new("nsubj")).unwrap());
        assert!(sg.has_parent_with_reln(&key(1), &Relation::new("nsubj")).unwrap());
        assert!(!sg.has_parent_with_reln(&key(2), &Relation::new("nsubj")).unwrap());
    }

    #[test]
    fn test_unknown_vertex_is_an_error() {
        let sg = create_test_graph();
        let ghost = key(42);
        let obj = Relation::new("obj");
        let unknown = |r: &Error| matches!(r, Error::UnknownVertex { vertex, .. } if *vertex == ghost);

        assert!(sg.get_children_with_reln(&ghost, &obj).is_err_and(|e| unknown(&e)));
        assert!(sg.get_children_with_relns(&ghost, &[obj.clone()]).is_err_and(|e| unknown(&e)));
        assert!(sg.get_child_with_reln(&ghost, &obj).is_err_and(|e| unknown(&e)));
        assert!(sg.get_parents_with_reln(&ghost, &obj).is_err_and(|e| unknown(&e)));
        assert!(sg.get_parents_with_reln_name(&ghost, "obj").is_err_and(|e| unknown(&e)));
        assert!(sg.has_child(&ghost, &obj, "dog").is_err_and(|e| unknown(&e)));
        assert!(sg.has_child_with_reln(&ghost, &obj).is_err_and(|e| unknown(&e)));
        assert!(sg.has_parent_with_reln(&ghost, &obj).is_err_and(|e| unknown(&e)));
        assert!(sg.child_pairs(&ghost).is_err_and(|e| unknown(&e)));
    }

    #[test]
    fn test_pairs_and_relns() {
        let sg = create_test_graph();

        let pairs = sg.child_pairs(&key(2)).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], (Relation::new("nsubj"), key(1)));

        assert_eq!(sg.parent_pairs(&key(3)).unwrap(), vec![(Relation::new("det"), key(4))]);
        assert_eq!(sg.relns(&key(6)).unwrap().len(), 1);
        assert_eq!(sg.child_relns(&key(2)).unwrap().len(), 3);
        assert_eq!(sg.reln(&key(2), &key(4)).unwrap(), Some(Relation::new("obj")));
        assert_eq!(sg.reln(&key(4), &key(2)).unwrap(), None);
        assert!(matches!(sg.child_pairs(&key(9)), Err(Error::UnknownVertex { .. })));
    }

    #[test]
    fn test_find_all_relns() {
        let mut sg = create_test_graph();
        sg.add_edge(key(6), key(3), Relation::parse("obl:on"), 0.0, true);

        assert_eq!(sg.find_all_relns(&Relation::parse("obl:in")).len(), 1);
        assert_eq!(sg.find_all_relns_by_name("obl").len(), 2);
        assert!(sg.find_all_relns_by_name("xcomp").is_empty());
    }
}
