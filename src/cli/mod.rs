mod dump;
mod pstree;
mod stats;

use std::io::Write;

use crate::prelude::*;
use clap::{Parser, Subcommand};
use uproctrace::{DecodeOptions, MalformedPolicy};

#[derive(Parser, Debug)]
#[command(version, about = "Inspect process traces recorded by uproctrace")]
pub struct Cli {
    /// Skip frames whose payload cannot be decoded instead of failing on the first one
    #[arg(long, global = true)]
    pub resync: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            malformed: if self.resync {
                MalformedPolicy::Resync
            } else {
                MalformedPolicy::Abort
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every event of a trace in file order
    Dump(dump::DumpArgs),
    /// Print the process tree reconstructed from a trace
    Pstree(pstree::PstreeArgs),
    /// Print resource usage statistics over one or several traces
    Stats(stats::StatsArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let options = cli.decode_options();
    debug!("Decode options: {options:?}");

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Dump(args) => dump::run(&args, options, &mut out)?,
        Commands::Pstree(args) => pstree::run(&args, options, &mut out)?,
        Commands::Stats(args) => stats::run(&args, options, &mut out)?,
    }
    out.flush()?;

    Ok(())
}
