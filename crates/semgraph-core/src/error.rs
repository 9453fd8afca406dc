//! Error types for Semgraph Core

use crate::node::NodeKey;
use thiserror::Error;

/// Result type alias using Semgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Semgraph error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown vertex {vertex} in graph {graph}")]
    UnknownVertex { vertex: NodeKey, graph: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Cyclic graph: {0}")]
    CyclicGraph(String),

    #[error("No roots in graph {0}")]
    NoRoots(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
