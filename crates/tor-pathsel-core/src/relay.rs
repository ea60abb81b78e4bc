//! Relay status and descriptor records, as supplied by the external
//! consensus/descriptor parser.
//!
//! Nothing in this module parses a network document: it only models the
//! already-parsed shape that the parser contract (see the crate's top-level
//! docs) promises for each relay, per consensus period.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::policy::ExitPolicy;

/// A relay fingerprint, stable across consensuses.
pub type Fingerprint = String;

/// All relay statuses in one consensus, keyed by fingerprint.
///
/// A [`BTreeMap`] rather than a hash map: every sampling site in this crate
/// must iterate candidates in a stable, documented order (ascending
/// fingerprint) for run-to-run reproducibility, and a sorted map gives that
/// for free instead of requiring every call site to sort a `Vec` itself.
pub type ConsRelayStats = BTreeMap<Fingerprint, RelayStatus>;

/// All relay descriptors in force during one consensus period, keyed by fingerprint.
pub type Descriptors = BTreeMap<Fingerprint, RelayDescriptor>;

bitflags! {
    /// Flags attached to a relay by a consensus.
    ///
    /// Only the flags this crate's path-selection rules actually consult are
    /// modeled; a real consensus carries more (HSDir, V2Dir, Authority, ...).
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RelayFlags: u16 {
        /// The relay was reachable by the directory authorities.
        const RUNNING = 1 << 0;
        /// The relay satisfies the authorities' minimum requirements for use.
        const VALID = 1 << 1;
        /// The relay is suitable for use as a guard.
        const GUARD = 1 << 2;
        /// The relay is suitable for use as an exit.
        const EXIT = 1 << 3;
        /// The relay is a declared-unsuitable exit, despite the Exit flag.
        const BAD_EXIT = 1 << 4;
        /// The relay is fast enough for general use.
        const FAST = 1 << 5;
        /// The relay is stable enough for long-lived circuits.
        const STABLE = 1 << 6;
        /// The relay serves as an HSDir.
        const HSDIR = 1 << 7;
    }
}

/// A relay's status entry within one consensus: its flags and bandwidth.
///
/// Corresponds to the "Relay record" of the data model: bandwidth, flags,
/// nickname, fingerprint, all scoped to one consensus period.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayStatus {
    /// The relay's fingerprint.
    pub fingerprint: Fingerprint,
    /// The relay's self-chosen display name. Not used for any path-selection
    /// decision; carried only for human-readable output.
    pub nickname: String,
    /// The consensus bandwidth weight for this relay (not a raw speed).
    pub bandwidth: u64,
    /// Flags the consensus attached to this relay.
    pub flags: RelayFlags,
}

impl RelayStatus {
    /// Return true if the consensus marked this relay with every flag in `flags`.
    pub fn has_flags(&self, flags: RelayFlags) -> bool {
        self.flags.contains(flags)
    }
}

/// A member of a relay's declared family, as written in its descriptor.
///
/// Family membership is asserted unilaterally; [`crate::predicate::same_family`]
/// requires it to be mutual before treating two relays as related.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FamilyMember {
    /// A `$`-prefixed fingerprint reference.
    Fingerprint(Fingerprint),
    /// A bare nickname reference.
    Nickname(String),
}

/// A relay's descriptor: the per-relay data that a consensus entry doesn't
/// itself carry, as most recently published before the paired consensus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayDescriptor {
    /// The relay's fingerprint (matches the paired [`RelayStatus::fingerprint`]).
    pub fingerprint: Fingerprint,
    /// The relay's declared nickname, used for mutual-family comparisons.
    pub nickname: String,
    /// The relay's IPv4 address.
    pub address: Ipv4Addr,
    /// The relay's declared family members.
    pub family: Vec<FamilyMember>,
    /// The relay's exit policy.
    pub exit_policy: ExitPolicy,
    /// Whether the relay was hibernating when this descriptor was published.
    pub hibernating: bool,
}
