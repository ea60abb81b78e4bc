//! Human-readable reporting of simulation results.
//!
//! Per-decision lines (guard/middle/exit choices, circuit builds and
//! kills, stream assignments) are emitted as they happen via `tracing`,
//! keyed by `client` and `time`/`cur_time` fields — see [`crate::logging`].
//! This module prints the one thing that only makes sense to report once
//! the run is over: each client's final guard list.

use tor_pathsel_core::client::ClientState;

/// Print each client's final guard list to stdout.
pub fn print_final_guards(clients: &[ClientState]) {
    for client in clients {
        let guards: Vec<&str> = client.guards.iter().map(|g| g.fingerprint.as_str()).collect();
        println!("client {}: final guards = {:?}", client.id, guards);
    }
}
