//! Simulated time.
//!
//! The engine works entirely in UNIX seconds, as the data model specifies,
//! rather than [`std::time::SystemTime`]: every timestamp here is produced
//! by stepping a simulation clock, not by reading the real clock, so the
//! extra ceremony of `SystemTime` arithmetic (fallible subtraction, platform
//! epoch quirks) buys nothing and a plain integer keeps the arithmetic in
//! §4 direct and testable.

/// A point in simulated time, in UNIX seconds.
pub type UnixTime = u64;

/// A span of simulated time, in seconds.
pub type DurationSecs = u64;
