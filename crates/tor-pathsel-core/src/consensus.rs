//! Consensus periods: the bandwidth-weighting parameters and validity
//! window that govern one stretch of simulated time.

use serde::{Deserialize, Serialize};

use crate::relay::{ConsRelayStats, Descriptors};
use crate::time::UnixTime;

/// The bandwidth-weighting coefficients a consensus publishes, keyed by
/// (selected position, relay kind). See [`crate::weight::position_weight`]
/// for how they're applied.
///
/// The design's data model enumerates `Wgg, Wgd, Wgm, Wmg, Wmm, Wme, Wmd,
/// Wee, Wed, Weg` as "the 9 keys", but its own position-weighting table (and
/// the original implementation) also consult `Wem` for a plain relay chosen
/// as exit; we carry it too (see DESIGN.md).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct BandwidthWeights {
    /// Weight for a Guard+Exit relay chosen as guard.
    pub wgd: u64,
    /// Weight for a Guard-only relay chosen as guard.
    pub wgg: u64,
    /// Weight for a non-Exit relay chosen as guard.
    pub wgm: u64,
    /// Weight for a Guard-only relay chosen as middle.
    pub wmg: u64,
    /// Weight for a plain relay chosen as middle.
    pub wmm: u64,
    /// Weight for an Exit-only relay chosen as middle.
    pub wme: u64,
    /// Weight for a Guard+Exit relay chosen as middle.
    pub wmd: u64,
    /// Weight for an Exit-only relay chosen as exit.
    pub wee: u64,
    /// Weight for a Guard+Exit relay chosen as exit.
    pub wed: u64,
    /// Weight for a Guard-only relay chosen as exit.
    pub weg: u64,
    /// Weight for a plain relay chosen as exit.
    pub wem: u64,
}

/// One consensus's validity window, bandwidth-weighting parameters, and the
/// relay population observed during it.
///
/// Consecutive periods in a simulation run must satisfy
/// `period[i].fresh_until == period[i + 1].valid_after`; the driver (C8)
/// checks this before advancing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusPeriod {
    /// The start of this consensus's validity window.
    pub valid_after: UnixTime,
    /// The end of this consensus's validity window (exclusive).
    pub fresh_until: UnixTime,
    /// The bandwidth-weighting coefficients.
    pub bandwidth_weights: BandwidthWeights,
    /// The denominator applied to bandwidth weights. Defaults to 10000 if a
    /// consensus doesn't specify `bwweightscale`.
    #[serde(default = "default_bwweightscale")]
    pub bwweightscale: u64,
    /// The relay statuses observed in this consensus.
    pub relays: ConsRelayStats,
    /// The descriptors most recently published before this consensus, for
    /// every relay it lists (or for which one was found).
    pub descriptors: Descriptors,
}

/// The default `bwweightscale`, used by `serde` when a fixture omits it.
fn default_bwweightscale() -> u64 {
    crate::consts::DEFAULT_BWWEIGHTSCALE
}

impl ConsensusPeriod {
    /// Return true if `time` falls within `[valid_after, fresh_until)`.
    pub fn covers(&self, time: UnixTime) -> bool {
        time >= self.valid_after && time < self.fresh_until
    }
}
