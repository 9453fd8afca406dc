//! Semgraph CLI - Command line interface for dependency graphs

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod input;
mod output;

use commands::{check, completions, parse, path, show};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "semgraph")]
#[command(author, version, about = "Inspect and convert dependency graphs in compact notation")]
pub struct Cli {
    /// Output format: compact, list, tree, json
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Output format from the flag, else from the config file
    pub fn output_format(&self, config: &Config) -> OutputFormat {
        OutputFormat::from(self.format.as_deref().unwrap_or(config.default_format.as_str()))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize compact graphs, one per line
    Parse(parse::ParseArgs),
    /// Render every graph in the output format
    Show(show::ShowArgs),
    /// Report counts, DAG status and topological order
    Check(check::CheckArgs),
    /// Shortest path between two nodes of one graph
    Path(path::PathArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting semgraph CLI");

    let config = Config::load();

    match &cli.command {
        Commands::Parse(args) => parse::run(args, &config)?,
        Commands::Show(args) => show::run(args, &cli, &config)?,
        Commands::Check(args) => check::run(args)?,
        Commands::Path(args) => path::run(args)?,
        Commands::Config(args) => commands::config::run(args)?,
        Commands::Completions(args) => completions::run(args)?,
    }

    Ok(())
}
