//! Semgraph Core - Dependency graph engine
//!
//! This crate provides an in-memory directed multigraph over word nodes with
//! typed relation edges, the algorithms built on it (ancestry, paths, cycle
//! detection, topological order) and the compact bracket notation used to
//! write graphs down and read them back.

pub mod compact;
pub mod edge;
pub mod error;
pub mod export;
pub mod format;
pub mod graph;
pub mod multigraph;
pub mod node;
pub mod query;
pub mod relation;
pub mod utils;

pub use edge::Edge;
pub use error::{Error, Result};
pub use export::{EdgeExport, GraphExport};
pub use format::TreeFormatter;
pub use graph::SemanticGraph;
pub use multigraph::MultiGraph;
pub use node::{GraphNode, NodeKey, MISSING_WORD};
pub use relation::{Relation, TypedDependency};
