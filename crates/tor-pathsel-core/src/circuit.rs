//! Circuit records and the three-hop path-selection algorithm.
//!
//! Grounded on `tor-circmgr/src/path/exitpath.rs`'s exit-then-guard-then-middle
//! selection order and its use of per-position candidate/weight caches, here
//! specialized to the design's three flat filter/weight/sample passes rather
//! than that crate's richer target-relay abstractions.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use rand::Rng;

use crate::consensus::ConsensusPeriod;
use crate::error::Error;
use crate::filter::{filter_exits, filter_middles};
use crate::guardmgr::{guards_for_circuit, GuardEntry};
use crate::policy::ExitPolicy;
use crate::predicate::{same_family, same_subnet16};
use crate::relay::{Fingerprint, RelayFlags};
use crate::sample::{normalize, weighted_sample};
use crate::time::UnixTime;
use crate::weight::{selection_weight, Position};

/// A built three-hop circuit.
#[derive(Clone, Debug)]
pub struct Circuit {
    /// When this circuit was built.
    pub time: UnixTime,
    /// Whether this circuit was built to require a Fast-flagged guard/middle.
    pub fast: bool,
    /// Whether this circuit was built to require a Stable-flagged guard/middle.
    pub stable: bool,
    /// Whether this circuit is internal (no exit-policy constraint, used for
    /// `resolve` streams) rather than bound to an external destination.
    pub internal: bool,
    /// When this circuit was first assigned a stream; absent while clean.
    pub dirty_time: Option<UnixTime>,
    /// The ordered (guard, middle, exit) fingerprints.
    pub path: (Fingerprint, Fingerprint, Fingerprint),
    /// The `valid_after` of the consensus period this circuit was built
    /// against, kept for provenance (the period itself is not retained,
    /// since it is released at the end of its own processing — see the
    /// driver).
    pub built_in_period: UnixTime,
    /// The exit's exit policy as it stood at build time. Stream support is
    /// evaluated against this frozen snapshot, not whatever the exit's
    /// descriptor says under a later consensus: a circuit keeps working
    /// exactly as built until it ages out, even if its exit's descriptor is
    /// later withdrawn or changed.
    pub exit_policy: ExitPolicy,
    /// The TCP ports whose port-need this circuit currently covers.
    pub covering: BTreeSet<u16>,
}

impl Circuit {
    /// The circuit's guard hop.
    pub fn guard(&self) -> &Fingerprint {
        &self.path.0
    }

    /// The circuit's middle hop.
    pub fn middle(&self) -> &Fingerprint {
        &self.path.1
    }

    /// The circuit's exit hop.
    pub fn exit(&self) -> &Fingerprint {
        &self.path.2
    }
}

/// The parameters a circuit build request carries, beyond the consensus
/// period and guard list.
pub struct BuildRequest<'a> {
    /// The time at which the circuit is requested to be built.
    pub time: UnixTime,
    /// Require a Fast-flagged guard and middle.
    pub fast: bool,
    /// Require a Stable-flagged guard and middle.
    pub stable: bool,
    /// Whether this circuit serves only internal (`resolve`) traffic.
    pub internal: bool,
    /// The destination address, if known. Only consulted when `!internal`.
    pub ip: Option<Ipv4Addr>,
    /// The destination port. Required when `!internal`.
    pub port: Option<u16>,
    /// A precomputed exit candidate set for this period, ascending by
    /// fingerprint. Recomputed via [`filter_exits`] if absent.
    pub potential_exits: Option<&'a [Fingerprint]>,
    /// A precomputed middle candidate set for this period, ascending by
    /// fingerprint. Recomputed via [`filter_middles`] if absent.
    pub potential_middles: Option<&'a [Fingerprint]>,
}

/// Build a new circuit satisfying `req` against `period`, growing `guards`
/// as needed, per the design's five-step circuit-building algorithm.
///
/// # Errors
///
/// Returns [`Error::MissingDescriptor`] if the chosen exit has no descriptor
/// in `period` — this can only happen if `req.potential_exits` was not
/// produced by [`filter_exits`] against this same `period`.
pub fn build_circuit<R: Rng + ?Sized>(
    period: &ConsensusPeriod,
    guards: &mut Vec<GuardEntry>,
    req: BuildRequest<'_>,
    rng: &mut R,
) -> Result<Circuit, Error> {
    if req.time < period.valid_after || req.time >= period.fresh_until {
        return Err(Error::StaleConsensus {
            time: req.time,
            valid_after: period.valid_after,
            fresh_until: period.fresh_until,
        });
    }
    if !req.internal && req.port.is_none() {
        return Err(Error::MissingPort);
    }

    let exit = choose_exit(period, &req, rng)?;
    let guard_candidates = guards_for_circuit(guards, period, req.fast, req.stable, &exit, rng)?;
    let guard = guard_candidates[rng.random_range(0..guard_candidates.len())].clone();
    let middle = choose_middle(period, &req, &exit, &guard, rng)?;
    let exit_policy = period
        .descriptors
        .get(&exit)
        .map(|desc| desc.exit_policy.clone())
        .ok_or_else(|| Error::MissingDescriptor {
            fingerprint: exit.clone(),
        })?;

    tracing::debug!(
        time = req.time,
        guard = %guard,
        middle = %middle,
        exit = %exit,
        internal = req.internal,
        "built circuit"
    );

    Ok(Circuit {
        time: req.time,
        fast: req.fast,
        stable: req.stable,
        internal: req.internal,
        dirty_time: None,
        path: (guard, middle, exit),
        built_in_period: period.valid_after,
        exit_policy,
        covering: BTreeSet::new(),
    })
}

fn meets_fast_stable(flags: RelayFlags, fast: bool, stable: bool) -> bool {
    (!fast || flags.contains(RelayFlags::FAST)) && (!stable || flags.contains(RelayFlags::STABLE))
}

fn choose_exit<R: Rng + ?Sized>(
    period: &ConsensusPeriod,
    req: &BuildRequest<'_>,
    rng: &mut R,
) -> Result<Fingerprint, Error> {
    let owned;
    let base: &[Fingerprint] = match req.potential_exits {
        Some(candidates) => candidates,
        None => {
            owned = filter_exits(&period.relays, &period.descriptors);
            &owned
        }
    };

    let position = if req.internal { Position::Middle } else { Position::Exit };
    let mut weighted = Vec::new();
    for fprint in base {
        let Some(status) = period.relays.get(fprint) else {
            continue;
        };
        if !meets_fast_stable(status.flags, req.fast, req.stable) {
            continue;
        }
        if !req.internal {
            let Some(desc) = period.descriptors.get(fprint) else {
                continue;
            };
            let port = req.port.ok_or(Error::MissingPort)?;
            let exit_ok = match req.ip {
                Some(ip) => desc.exit_policy.can_exit_to(ip, port),
                None => desc.exit_policy.can_exit_to_port(port),
            };
            if !exit_ok {
                continue;
            }
        }
        let weight = selection_weight(status.bandwidth, status.flags, position, &period.bandwidth_weights, period.bwweightscale)?;
        weighted.push((fprint.clone(), weight));
    }

    let normalized = normalize(&weighted)?;
    weighted_sample(&normalized, rng)
}

fn choose_middle<R: Rng + ?Sized>(
    period: &ConsensusPeriod,
    req: &BuildRequest<'_>,
    exit: &Fingerprint,
    guard: &Fingerprint,
    rng: &mut R,
) -> Result<Fingerprint, Error> {
    let owned;
    let base: &[Fingerprint] = match req.potential_middles {
        Some(candidates) => candidates,
        None => {
            owned = filter_middles(&period.relays, &period.descriptors);
            &owned
        }
    };

    let mut weighted = Vec::new();
    for fprint in base {
        if fprint == exit || fprint == guard {
            continue;
        }
        let Some(status) = period.relays.get(fprint) else {
            continue;
        };
        if !meets_fast_stable(status.flags, req.fast, req.stable) {
            continue;
        }
        if same_family(&period.descriptors, fprint, exit) || same_family(&period.descriptors, fprint, guard) {
            continue;
        }
        if let (Some(desc), Some(exit_desc)) = (period.descriptors.get(fprint), period.descriptors.get(exit)) {
            if same_subnet16(&desc.address.to_string(), &exit_desc.address.to_string())? {
                continue;
            }
        }
        if let (Some(desc), Some(guard_desc)) = (period.descriptors.get(fprint), period.descriptors.get(guard)) {
            if same_subnet16(&desc.address.to_string(), &guard_desc.address.to_string())? {
                continue;
            }
        }
        let weight = selection_weight(status.bandwidth, status.flags, Position::Middle, &period.bandwidth_weights, period.bwweightscale)?;
        weighted.push((fprint.clone(), weight));
    }

    let normalized = normalize(&weighted)?;
    weighted_sample(&normalized, rng)
}
