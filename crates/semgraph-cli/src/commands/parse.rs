//! Parse command: normalize compact graphs

use clap::Args;

use crate::config::Config;
use crate::input::read_graphs;

#[derive(Args)]
pub struct ParseArgs {
    /// Input file with one graph per line, or - for stdin
    pub input: String,

    /// Include part-of-speech tags
    #[arg(long)]
    pub tags: bool,
}

pub fn run(args: &ParseArgs, config: &Config) -> anyhow::Result<()> {
    let show_tags = args.tags || config.show_tags;
    for entry in read_graphs(&args.input)? {
        println!("{}", entry.graph.to_compact_string(show_tags));
    }
    Ok(())
}
