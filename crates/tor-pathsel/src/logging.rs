//! Tracing subscriber setup.
//!
//! A deliberately small subset of the teacher's `arti/src/trace.rs`: no
//! journald or logfile sinks, since this crate has no configuration file to
//! name them in. Just a console layer driven by `RUST_LOG`, the way most of
//! the teacher's own smaller binaries and examples set up logging.

use tracing_subscriber::EnvFilter;

/// Install a global tracing subscriber.
///
/// `verbose` is the number of `-v` flags on the command line; each one
/// raises the default filter by one level. `RUST_LOG`, if set, takes
/// precedence over both the default and `-v`.
pub fn setup(verbose: u8) {
    let default_directive = match verbose {
        0 => "tor_pathsel=info,tor_pathsel_core=info",
        1 => "tor_pathsel=debug,tor_pathsel_core=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
