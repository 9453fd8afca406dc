//! CLI command implementations

pub mod check;
pub mod completions;
pub mod config;
pub mod parse;
pub mod path;
pub mod show;
