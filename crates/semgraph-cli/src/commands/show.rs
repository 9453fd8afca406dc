//! Show command: render graphs in the selected format

use clap::Args;
use semgraph_core::GraphExport;

use crate::config::Config;
use crate::input::read_graphs;
use crate::output::{format_graph, OutputFormat};
use crate::Cli;

#[derive(Args)]
pub struct ShowArgs {
    /// Input file with one graph per line, or - for stdin
    pub input: String,
}

pub fn run(args: &ShowArgs, cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let graphs = read_graphs(&args.input)?;
    let format = cli.output_format(config);
    tracing::debug!("Rendering {} graphs as {:?}", graphs.len(), format);

    match format {
        // A single JSON document for the whole input
        OutputFormat::Json => {
            let exports: Vec<GraphExport> = graphs.iter().map(|g| g.graph.to_export()).collect();
            println!("{}", serde_json::to_string_pretty(&exports)?);
        }
        OutputFormat::Compact => {
            for entry in &graphs {
                println!("{}", format_graph(&entry.graph, format, config)?);
            }
        }
        OutputFormat::List | OutputFormat::Tree => {
            let rendered = graphs
                .iter()
                .map(|g| format_graph(&g.graph, format, config))
                .collect::<anyhow::Result<Vec<_>>>()?;
            if !rendered.is_empty() {
                println!("{}", rendered.join("\n\n"));
            }
        }
    }
    Ok(())
}
