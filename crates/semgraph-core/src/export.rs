//! Serializable graph model for JSON export and import

use crate::error::Result;
use crate::graph::SemanticGraph;
use crate::node::{GraphNode, NodeKey};
use crate::relation::Relation;
use serde::{Deserialize, Serialize};

/// A whole graph as plain data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeExport>,
    pub roots: Vec<NodeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub source: NodeKey,
    pub target: NodeKey,
    pub relation: String,

    /// Absent when the weight is not finite (JSON has no infinities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(default)]
    pub extra: bool,
}

impl SemanticGraph {
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|e| EdgeExport {
                    source: e.source(),
                    target: e.target(),
                    relation: e.relation().to_string(),
                    weight: Some(e.weight()).filter(|w| w.is_finite()),
                    extra: e.is_extra(),
                })
                .collect(),
            roots: self.roots().to_vec(),
            comments: self.comments().to_vec(),
        }
    }

    /// Rebuild a graph. Edge endpoints missing from `nodes` get bare
    /// records; a root missing from the graph is an error.
    pub fn from_export(export: GraphExport) -> Result<Self> {
        let mut sg = Self::new();
        for node in export.nodes {
            sg.add_vertex(node);
        }
        for edge in export.edges {
            sg.add_edge(
                edge.source,
                edge.target,
                Relation::parse(&edge.relation),
                edge.weight.unwrap_or(f64::NEG_INFINITY),
                edge.extra,
            );
        }
        sg.set_roots(export.roots)?;
        for comment in export.comments {
            sg.add_comment(comment);
        }
        Ok(sg)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_export())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let export: GraphExport = serde_json::from_str(json)?;
        Self::from_export(export)
    }
}
