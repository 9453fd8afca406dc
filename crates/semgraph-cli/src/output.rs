//! Output formatting utilities

use semgraph_core::{SemanticGraph, TreeFormatter};

use crate::config::Config;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Compact,
    List,
    Tree,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "list" => Self::List,
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Render one graph. The result carries no trailing newline.
pub fn format_graph(sg: &SemanticGraph, format: OutputFormat, config: &Config) -> anyhow::Result<String> {
    let text = match format {
        OutputFormat::Compact => sg.to_compact_string(config.show_tags),
        OutputFormat::List => sg.to_list(),
        OutputFormat::Tree => {
            let formatter = TreeFormatter::new()
                .with_indent(config.indent)
                .with_tags(config.show_tags);
            sg.to_formatted_string(&formatter)
        }
        OutputFormat::Json => sg.to_json()?,
    };
    Ok(text.trim_end_matches('\n').to_string())
}
