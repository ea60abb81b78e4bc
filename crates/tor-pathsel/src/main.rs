//! Command-line driver for the Tor client path-selection simulator.
//!
//! Loads a chronological sequence of pre-paired consensus/descriptor
//! fixtures and a chronological stream workload, then runs
//! [`tor_pathsel_core::driver::Simulation`] over them, printing each
//! decision as it happens.

mod cli;
mod fixtures;
mod logging;
mod output;

use anyhow::{bail, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use cli::{Cli, Command};
use tor_pathsel_core::driver::Simulation;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup(cli.verbose);

    match cli.command {
        Command::Simulate {
            consensus_dir,
            stream_file,
            samples,
            seed,
        } => simulate(&consensus_dir, &stream_file, samples, seed),
        Command::Process => {
            bail!(
                "`process` is out of scope for this crate: it only runs the simulator over \
                 already-paired consensus/descriptor fixtures, and does not parse Tor consensus \
                 documents or server descriptors itself"
            );
        }
    }
}

fn simulate(consensus_dir: &std::path::Path, stream_file: &std::path::Path, samples: usize, seed: u64) -> Result<()> {
    let periods = fixtures::load_consensus_periods(consensus_dir)?;
    let streams = fixtures::load_streams(stream_file)?;

    tracing::info!(periods = periods.len(), streams = streams.len(), samples, "starting simulation");

    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let mut simulation = Simulation::new(samples, &streams);
    for period in &periods {
        simulation.run_period(period, &mut rng)?;
    }

    output::print_final_guards(&simulation.clients);
    Ok(())
}
