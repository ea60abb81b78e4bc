//! Error types for the path-selection engine.
//!
//! Every error kind named in the design's error-handling table gets its own
//! [`Error`] variant; [`HasKind`] separates the detailed, displayable error
//! from its coarse category, the way `tor-guardmgr`'s `PickGuardError`
//! separates its variants from `tor_error::ErrorKind` — but scoped to just
//! the eight kinds this crate actually raises, rather than pulling in the
//! rest of Tor's error taxonomy.

use crate::relay::Fingerprint;
use crate::time::UnixTime;

/// A coarse classification of an [`Error`], for programmatic handling.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A circuit build was requested outside its consensus's validity window.
    StaleConsensus,
    /// A non-internal circuit build was requested without a destination port.
    MissingPort,
    /// A weighted sample exhausted its candidates before reaching the target weight.
    WeightInvariant,
    /// The unrepresentable `Wge` weight was requested.
    UnrepresentableWeight,
    /// No candidate satisfied the new-guard predicates.
    GuardExhaustion,
    /// A guard was absent from the consensus and descriptors without being marked bad.
    MissingGuard,
    /// A relay chosen by the selection algorithm had no descriptor on record.
    MissingDescriptor,
    /// An input value failed basic format validation.
    InputMalformed,
    /// Two consecutive consensus periods did not abut.
    PeriodGap,
}

/// Types that can report a coarse [`ErrorKind`] for programmatic handling.
pub trait HasKind {
    /// Return the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// An input value that failed a basic format check.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InputMalformed {
    /// A string passed to the /16-subnet test was not a dotted-quad IPv4 address.
    #[error("not a dotted-quad IPv4 address: {address}")]
    NotIpv4 {
        /// The offending string.
        address: String,
    },
    /// A stream carried a `type` this crate doesn't recognize.
    #[error("unrecognized stream type: {type_name}")]
    UnknownStreamType {
        /// The offending type name.
        type_name: String,
    },
}

/// The error type for the path-selection engine.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A circuit build was requested at a time outside `[valid_after, fresh_until)`.
    #[error(
        "circuit build time {time} is outside the consensus's validity window [{valid_after}, {fresh_until})"
    )]
    StaleConsensus {
        /// The requested build time.
        time: UnixTime,
        /// The consensus's `valid_after`.
        valid_after: UnixTime,
        /// The consensus's `fresh_until`.
        fresh_until: UnixTime,
    },

    /// A non-internal circuit build was requested without a destination port.
    #[error("a non-internal circuit requires a destination port")]
    MissingPort,

    /// A weighted sample exhausted its candidates without reaching the target weight.
    #[error("weighted sample exhausted its candidates: weights did not sum to 1")]
    WeightInvariant,

    /// The `Wge` (guard-and-exit, at the guard position) weight was requested.
    ///
    /// `Wge` has no meaning in the bandwidth-weights table: a relay cannot be
    /// asked to serve as its own exit's replacement at the guard hop.
    #[error("Wge has no representable weight")]
    UnrepresentableWeight,

    /// No candidate satisfied the new-guard selection predicates.
    #[error("guard candidate population exhausted: no suitable new guard available")]
    GuardExhaustion,

    /// A guard was absent from both the consensus and descriptor sets, but
    /// had not already been marked bad.
    #[error(
        "guard {fingerprint} is present in neither the consensus nor the descriptor set, but was not marked bad"
    )]
    MissingGuard {
        /// The guard's fingerprint.
        fingerprint: Fingerprint,
    },

    /// A relay chosen by the selection algorithm (an exit, or a just-added
    /// guard) had no descriptor in the consensus period's descriptor set.
    ///
    /// This indicates a caller supplied a `potential_exits`/`potential_middles`
    /// candidate set that didn't actually come from [`crate::filter`] against
    /// the same period, or a consensus period whose `relays` and
    /// `descriptors` maps are mutually inconsistent.
    #[error("relay {fingerprint} has no descriptor in this consensus period")]
    MissingDescriptor {
        /// The relay's fingerprint.
        fingerprint: Fingerprint,
    },

    /// An input value failed a basic format check.
    #[error(transparent)]
    InputMalformed(#[from] InputMalformed),

    /// Two consecutive consensus periods did not abut.
    #[error(
        "consensus period gap: previous period's fresh_until ({previous_fresh_until}) does not equal next period's valid_after ({next_valid_after})"
    )]
    PeriodGap {
        /// The previous period's `fresh_until`.
        previous_fresh_until: UnixTime,
        /// The next period's `valid_after`.
        next_valid_after: UnixTime,
    },
}

impl HasKind for Error {
    fn kind(&self) -> ErrorKind {
        use Error as E;
        match self {
            E::StaleConsensus { .. } => ErrorKind::StaleConsensus,
            E::MissingPort => ErrorKind::MissingPort,
            E::WeightInvariant => ErrorKind::WeightInvariant,
            E::UnrepresentableWeight => ErrorKind::UnrepresentableWeight,
            E::GuardExhaustion => ErrorKind::GuardExhaustion,
            E::MissingGuard { .. } => ErrorKind::MissingGuard,
            E::MissingDescriptor { .. } => ErrorKind::MissingDescriptor,
            E::InputMalformed(_) => ErrorKind::InputMalformed,
            E::PeriodGap { .. } => ErrorKind::PeriodGap,
        }
    }
}

/// A `Result` defaulting to this crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
