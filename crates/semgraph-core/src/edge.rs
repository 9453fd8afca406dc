//! Edge types

use crate::node::NodeKey;
use crate::relation::Relation;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A labelled dependency arc from a governor to a dependent.
///
/// Edges are immutable. Equality and hashing use `(relation, source, target)`
/// only: two edges differing just in weight or extra flag compare equal.
#[derive(Debug, Clone)]
pub struct Edge {
    source: NodeKey,
    target: NodeKey,
    relation: Relation,
    weight: f64,
    extra: bool,
}

impl Edge {
    pub fn new(source: NodeKey, target: NodeKey, relation: Relation, weight: f64, extra: bool) -> Self {
        Self {
            source,
            target,
            relation,
            weight,
            extra,
        }
    }

    pub fn source(&self) -> NodeKey {
        self.source
    }

    pub fn target(&self) -> NodeKey {
        self.target
    }

    /// Alias for [`Edge::source`]
    pub fn governor(&self) -> NodeKey {
        self.source
    }

    /// Alias for [`Edge::target`]
    pub fn dependent(&self) -> NodeKey {
        self.target
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// True for supplementary (non-tree) arcs
    pub fn is_extra(&self) -> bool {
        self.extra
    }

    /// Same endpoints, weight and flag with another relation
    pub fn with_relation(&self, relation: Relation) -> Self {
        Self {
            relation,
            ..self.clone()
        }
    }

    /// Order by target, then source, then relation
    pub fn cmp_by_target(&self, other: &Self) -> Ordering {
        self.target
            .cmp(&other.target)
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.relation.cmp(&other.relation))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation && self.source == other.source && self.target == other.target
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.hash(state);
        self.source.hash(state);
        self.target.hash(state);
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Source, then target, then relation. Consistent with equality: edges
/// that compare `Equal` are `==`.
impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.relation.cmp(&other.relation))
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -{}-> {}", self.source, self.relation, self.target)
    }
}
