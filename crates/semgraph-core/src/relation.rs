//! Relation (edge label) types

use crate::node::GraphNode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const ROOT_NAME: &str = "root";

/// A typed grammatical relation labelling an edge.
///
/// The label set itself belongs to an external taxonomy; here a relation is
/// just its short name plus an optional specific part, written
/// `short` or `short:specific` (e.g. `nmod:poss`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    specific: Option<String>,
}

impl Relation {
    pub fn new(short_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            specific: None,
        }
    }

    pub fn with_specific(mut self, specific: impl Into<String>) -> Self {
        self.specific = Some(specific.into());
        self
    }

    /// Parse the string form, splitting the specific part at the first `:`
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((short, specific)) if !short.is_empty() => Self::new(short).with_specific(specific),
            _ => Self::new(s),
        }
    }

    /// The synthetic relation pointing from the sentence root to its head
    pub fn root() -> Self {
        Self::new(ROOT_NAME)
    }

    pub fn is_root(&self) -> bool {
        self.short_name == ROOT_NAME && self.specific.is_none()
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn specific(&self) -> Option<&str> {
        self.specific.as_deref()
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.specific {
            Some(specific) => write!(f, "{}:{}", self.short_name, specific),
            None => write!(f, "{}", self.short_name),
        }
    }
}

impl FromStr for Relation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Relation {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// One `(governor, dependent, relation)` record produced by a relation
/// assignment stage. Records carrying [`Relation::root`] mark their
/// dependent as a graph root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedDependency {
    pub gov: GraphNode,
    pub dep: GraphNode,
    pub reln: Relation,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub extra: bool,
}

fn default_weight() -> f64 {
    f64::NEG_INFINITY
}

impl TypedDependency {
    pub fn new(reln: impl Into<Relation>, gov: GraphNode, dep: GraphNode) -> Self {
        Self {
            gov,
            dep,
            reln: reln.into(),
            weight: default_weight(),
            extra: false,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn extra(mut self) -> Self {
        self.extra = true;
        self
    }
}

impl std::fmt::Display for TypedDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}, {})",
            self.reln,
            self.gov.to_index_string(),
            self.dep.to_index_string()
        )
    }
}
