//! The fixed constants the source hard-codes into its simulation loop.

use crate::time::DurationSecs;

/// Length of one simulation tick.
pub const TICK: DurationSecs = 60;

/// Max age of a dirty circuit to which new streams may still be assigned.
pub const DIRTY_CIRCUIT_LIFETIME: DurationSecs = 10 * 60;

/// How long an observed port keeps its "need covered" status after the last
/// stream to it.
pub const PORT_NEED_LIFETIME: DurationSecs = 60 * 60;

/// How long a guard may stay `bad_since` before it is removed from the list.
pub const GUARD_DOWN_TIME: DurationSecs = 30 * 24 * 3600;

/// Minimum lifetime assigned to a newly added guard.
pub const GUARD_EXPIRATION_MIN: DurationSecs = 30 * 24 * 3600;

/// Maximum lifetime assigned to a newly added guard.
pub const GUARD_EXPIRATION_MAX: DurationSecs = 60 * 24 * 3600;

/// Target size of a client's guard list.
pub const NUM_GUARDS: usize = 3;

/// Minimum number of usable guards required for a given circuit.
pub const MIN_NUM_GUARDS: usize = 2;

/// Ports that demand a Stable-flagged circuit (taken from path-spec.txt).
pub const LONG_LIVED_PORTS: &[u16] = &[
    21, 22, 706, 1863, 5050, 5190, 5222, 5223, 6667, 6697, 8300,
];

/// Return true if `port` is one of the [`LONG_LIVED_PORTS`].
pub fn is_long_lived_port(port: u16) -> bool {
    LONG_LIVED_PORTS.contains(&port)
}

/// The default `bwweightscale`, used when a consensus doesn't specify one.
pub const DEFAULT_BWWEIGHTSCALE: u64 = 10_000;

/// The port a client seeds its port-need tracker with on startup.
pub const INITIAL_PORT_NEED: u16 = 80;
