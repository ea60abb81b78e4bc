//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reproduce Tor client path-selection decisions over simulated time.
#[derive(Debug, Parser)]
#[command(name = "tor-pathsel", version)]
pub struct Cli {
    /// Increase logging verbosity; repeat for more (overrides `RUST_LOG`).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// The subset of the upstream simulator's CLI this crate implements.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the path-selection simulator over a sequence of consensus
    /// periods and a stream workload.
    Simulate {
        /// Directory of JSON consensus-period fixtures, one file per
        /// period, processed in filename order.
        #[arg(long)]
        consensus_dir: PathBuf,

        /// JSON file containing the chronological stream workload.
        #[arg(long)]
        stream_file: PathBuf,

        /// Number of independent client samples to simulate against the
        /// same stream workload.
        #[arg(long, default_value_t = 1)]
        samples: usize,

        /// Seed for the deterministic PRNG driving relay/guard selection.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Preprocess consensus documents and server descriptors into the
    /// fixtures `simulate` consumes.
    ///
    /// Not implemented: consensus/descriptor parsing is outside this
    /// crate's scope. This subcommand exists to document that boundary
    /// rather than to silently no-op.
    Process,
}
