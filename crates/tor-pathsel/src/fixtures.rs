//! Loading the JSON fixtures `simulate` runs against.
//!
//! Each consensus-period fixture bundles one already-paired
//! [`ConsensusPeriod`] — the `RelayStatus`/`RelayDescriptor` set a real
//! preprocessor would have produced by matching a consensus document
//! against the most recent descriptor for each relay it lists. Parsing
//! actual consensus/descriptor documents is outside this crate.

use std::path::Path;

use anyhow::{Context, Result};
use tor_pathsel_core::consensus::ConsensusPeriod;
use tor_pathsel_core::stream::Stream;

/// Load every `*.json` fixture in `dir`, in filename order, as a sequence
/// of consensus periods. Filename order is assumed to be chronological
/// order, matching the design's requirement that periods be processed in
/// sequence.
pub fn load_consensus_periods(dir: &Path) -> Result<Vec<ConsensusPeriod>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("reading consensus fixture directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("reading consensus fixture {}", path.display()))?;
            serde_json::from_str(&data).with_context(|| format!("parsing consensus fixture {}", path.display()))
        })
        .collect()
}

/// Load a chronological stream workload from a single JSON file.
pub fn load_streams(path: &Path) -> Result<Vec<Stream>> {
    let data =
        std::fs::read_to_string(path).with_context(|| format!("reading stream file {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing stream file {}", path.display()))
}
