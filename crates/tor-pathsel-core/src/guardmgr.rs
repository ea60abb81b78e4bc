//! Per-client entry-guard list lifecycle: add, mark down, bring up, expire,
//! remove, and select guards for a circuit.
//!
//! Modeled on `tor-guardmgr`'s separation between a guard's persistent
//! record (here, [`GuardEntry`]) and the per-consensus update pass that
//! walks every guard and adjusts its `bad_since` mark, the way
//! `tor-guardmgr/src/guard.rs`'s `Guard` tracks reachability state across
//! netdir updates.

use rand::Rng;

use crate::consensus::ConsensusPeriod;
use crate::consts::{GUARD_DOWN_TIME, GUARD_EXPIRATION_MAX, GUARD_EXPIRATION_MIN, MIN_NUM_GUARDS, NUM_GUARDS};
use crate::error::Error;
use crate::predicate::{same_family, same_subnet16};
use crate::relay::{Fingerprint, RelayFlags};
use crate::sample::{normalize, weighted_sample};
use crate::time::UnixTime;
use crate::weight::{position_weight, Position};

/// One persistent entry-guard record.
///
/// Insertion order within a client's guard list is significant —
/// [`guards_for_circuit`] returns guards "preserving insertion order", so
/// callers must store guards in a `Vec`, not a map keyed for lookup speed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuardEntry {
    /// The guard's fingerprint.
    pub fingerprint: Fingerprint,
    /// When this guard was added.
    pub expires: UnixTime,
    /// Set to the `valid_after` of the consensus that first observed this
    /// guard unusable; absent while the guard is considered live.
    pub bad_since: Option<UnixTime>,
}

impl GuardEntry {
    /// Return true if this guard is live: not marked bad, and still listed
    /// in the consensus's descriptor set.
    fn is_live(&self, period: &ConsensusPeriod) -> bool {
        self.bad_since.is_none() && period.descriptors.contains_key(&self.fingerprint)
    }
}

/// Run the per-consensus update pass over one client's guard list, per the
/// design's four-step guard-update algorithm. Must run once at the start of
/// every consensus period, before any circuit is built against it.
pub fn update_guards(guards: &mut Vec<GuardEntry>, period: &ConsensusPeriod) {
    for guard in guards.iter_mut() {
        let status = period.relays.get(&guard.fingerprint);
        let usable = status.is_some_and(|s| s.has_flags(RelayFlags::RUNNING | RelayFlags::GUARD));

        if guard.bad_since.is_none() && !usable {
            tracing::info!(guard = %guard.fingerprint, "putting down guard");
            guard.bad_since = Some(period.valid_after);
        } else if guard.bad_since.is_some() {
            let down = status.is_some_and(|s| {
                !s.has_flags(RelayFlags::RUNNING) && !s.has_flags(RelayFlags::GUARD)
            });
            // Open question (a): the source's bring-up condition really is
            // this conjunction, not the disjunction that would dually
            // mirror the mark-bad rule above. Kept as specified.
            if status.is_some() && down {
                tracing::info!(guard = %guard.fingerprint, "bringing up guard");
                guard.bad_since = None;
            }
        }
    }

    guards.retain(|guard| {
        let too_long_down = guard
            .bad_since
            .is_some_and(|bad_since| period.fresh_until.saturating_sub(bad_since) >= GUARD_DOWN_TIME);
        let expired = guard.expires <= period.valid_after;
        if too_long_down {
            tracing::info!(guard = %guard.fingerprint, "guard down too long, removing");
        } else if expired {
            tracing::info!(guard = %guard.fingerprint, "expiring guard");
        }
        !too_long_down && !expired
    });
}

/// Return true if `candidate` conflicts with any guard already on the list:
/// identical, same family, or same /16 as an existing guard.
fn conflicts_with_existing(
    period: &ConsensusPeriod,
    guards: &[GuardEntry],
    candidate: &Fingerprint,
) -> Result<bool, Error> {
    for guard in guards {
        if &guard.fingerprint == candidate {
            return Ok(true);
        }
        if same_family(&period.descriptors, &guard.fingerprint, candidate) {
            return Ok(true);
        }
        let (Some(existing_desc), Some(candidate_desc)) = (
            period.descriptors.get(&guard.fingerprint),
            period.descriptors.get(candidate),
        ) else {
            continue;
        };
        if same_subnet16(
            &existing_desc.address.to_string(),
            &candidate_desc.address.to_string(),
        )? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Select and append one new guard to `guards`, per the design's new-guard
/// selection rule: Running ∧ Valid ∧ Guard, descriptor present, and no
/// conflict with any guard already on the list. Returns the newly-added
/// entry, so callers never need to search `guards` back for what was just
/// pushed.
fn add_new_guard<R: Rng + ?Sized>(
    guards: &mut Vec<GuardEntry>,
    period: &ConsensusPeriod,
    rng: &mut R,
) -> Result<GuardEntry, Error> {
    let mut candidates = Vec::new();
    for (fingerprint, status) in &period.relays {
        if !status.has_flags(RelayFlags::RUNNING | RelayFlags::VALID | RelayFlags::GUARD) {
            continue;
        }
        if !period.descriptors.contains_key(fingerprint) {
            continue;
        }
        if conflicts_with_existing(period, guards, fingerprint)? {
            continue;
        }
        let weight = position_weight(status.flags, Position::Guard, &period.bandwidth_weights)?;
        let selection_weight = (status.bandwidth as f64) * (weight as f64);
        candidates.push((fingerprint.clone(), selection_weight));
    }

    if candidates.is_empty() {
        return Err(Error::GuardExhaustion);
    }
    let normalized = normalize(&candidates).map_err(|_| Error::GuardExhaustion)?;
    let chosen = weighted_sample(&normalized, rng).map_err(|_| Error::GuardExhaustion)?;

    let lifetime = if GUARD_EXPIRATION_MIN == GUARD_EXPIRATION_MAX {
        GUARD_EXPIRATION_MIN
    } else {
        rng.random_range(GUARD_EXPIRATION_MIN..=GUARD_EXPIRATION_MAX)
    };
    tracing::info!(guard = %chosen, expires = period.valid_after + lifetime, "added new guard");
    let entry = GuardEntry {
        fingerprint: chosen,
        expires: period.valid_after + lifetime,
        bad_since: None,
    };
    guards.push(entry.clone());
    Ok(entry)
}

/// Return true if `guard` may be used on a circuit with these requirements
/// and this exit, per the design's per-circuit usability predicate.
fn usable_for_circuit(
    guard: &GuardEntry,
    period: &ConsensusPeriod,
    fast: bool,
    stable: bool,
    exit: &Fingerprint,
) -> Result<bool, Error> {
    if guard.bad_since.is_some() {
        return Ok(false);
    }
    let status = period
        .relays
        .get(&guard.fingerprint)
        .ok_or_else(|| Error::MissingGuard {
            fingerprint: guard.fingerprint.clone(),
        })?;
    if fast && !status.has_flags(RelayFlags::FAST) {
        return Ok(false);
    }
    if stable && !status.has_flags(RelayFlags::STABLE) {
        return Ok(false);
    }
    if &guard.fingerprint == exit {
        return Ok(false);
    }
    if same_family(&period.descriptors, &guard.fingerprint, exit) {
        return Ok(false);
    }
    if let (Some(guard_desc), Some(exit_desc)) = (
        period.descriptors.get(&guard.fingerprint),
        period.descriptors.get(exit),
    ) {
        if same_subnet16(&guard_desc.address.to_string(), &exit_desc.address.to_string())? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Choose up to [`NUM_GUARDS`] usable guards for a circuit with the given
/// `fast`/`stable` requirements and `exit`, per the design's five-step
/// `guards-for-circuit` algorithm. Grows `guards` in place as needed.
pub fn guards_for_circuit<R: Rng + ?Sized>(
    guards: &mut Vec<GuardEntry>,
    period: &ConsensusPeriod,
    fast: bool,
    stable: bool,
    exit: &Fingerprint,
    rng: &mut R,
) -> Result<Vec<Fingerprint>, Error> {
    while guards.iter().filter(|g| g.is_live(period)).count() < NUM_GUARDS {
        add_new_guard(guards, period, rng)?;
    }

    let mut usable = Vec::new();
    for guard in guards.iter() {
        if usable_for_circuit(guard, period, fast, stable, exit)? {
            usable.push(guard.fingerprint.clone());
        }
    }

    while usable.len() < MIN_NUM_GUARDS {
        let entry = add_new_guard(guards, period, rng)?;
        if usable_for_circuit(&entry, period, fast, stable, exit)? {
            usable.push(entry.fingerprint);
        }
    }

    usable.truncate(NUM_GUARDS);
    Ok(usable)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consensus::BandwidthWeights;
    use crate::policy::ExitPolicy;
    use crate::relay::{RelayDescriptor, RelayStatus};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;

    fn weights() -> BandwidthWeights {
        BandwidthWeights {
            wgd: 0,
            wgg: 10000,
            wgm: 0,
            wmg: 0,
            wmm: 10000,
            wme: 0,
            wmd: 0,
            wee: 0,
            wed: 0,
            weg: 0,
            wem: 0,
        }
    }

    fn guard_relay(fprint: &str, ip: Ipv4Addr, running: bool) -> ConsensusPeriod {
        let mut flags = RelayFlags::VALID | RelayFlags::GUARD | RelayFlags::FAST | RelayFlags::STABLE;
        if running {
            flags |= RelayFlags::RUNNING;
        }
        let mut relays = BTreeMap::new();
        relays.insert(
            fprint.to_string(),
            RelayStatus {
                fingerprint: fprint.to_string(),
                nickname: fprint.to_string(),
                bandwidth: 100,
                flags,
            },
        );
        let mut descriptors = BTreeMap::new();
        descriptors.insert(
            fprint.to_string(),
            RelayDescriptor {
                fingerprint: fprint.to_string(),
                nickname: fprint.to_string(),
                address: ip,
                family: vec![],
                exit_policy: ExitPolicy::new(vec![]),
                hibernating: false,
            },
        );
        ConsensusPeriod {
            valid_after: 1000,
            fresh_until: 2000,
            bandwidth_weights: weights(),
            bwweightscale: 10000,
            relays,
            descriptors,
        }
    }

    #[test]
    fn losing_running_marks_bad_then_removes_after_down_time() {
        let mut guards = vec![GuardEntry {
            fingerprint: "G1".to_string(),
            expires: 1_000_000,
            bad_since: None,
        }];
        let mut period = guard_relay("G1", Ipv4Addr::new(1, 1, 1, 1), false);
        update_guards(&mut guards, &period);
        assert_eq!(guards[0].bad_since, Some(1000));

        period.valid_after = 1000 + GUARD_DOWN_TIME;
        period.fresh_until = period.valid_after + 1000;
        update_guards(&mut guards, &period);
        assert!(guards.is_empty());
    }

    #[test]
    fn expired_guard_is_removed() {
        let mut guards = vec![GuardEntry {
            fingerprint: "G1".to_string(),
            expires: 500,
            bad_since: None,
        }];
        let period = guard_relay("G1", Ipv4Addr::new(1, 1, 1, 1), true);
        update_guards(&mut guards, &period);
        assert!(guards.is_empty());
    }

    #[test]
    fn guards_for_circuit_fills_up_to_num_guards() {
        let mut relays = BTreeMap::new();
        let mut descriptors = BTreeMap::new();
        for i in 0u8..5 {
            let fprint = format!("G{i}");
            relays.insert(
                fprint.clone(),
                RelayStatus {
                    fingerprint: fprint.clone(),
                    nickname: fprint.clone(),
                    bandwidth: 100,
                    flags: RelayFlags::RUNNING
                        | RelayFlags::VALID
                        | RelayFlags::GUARD
                        | RelayFlags::FAST
                        | RelayFlags::STABLE,
                },
            );
            descriptors.insert(
                fprint.clone(),
                RelayDescriptor {
                    fingerprint: fprint.clone(),
                    nickname: fprint.clone(),
                    address: Ipv4Addr::new(10, i, 0, 1),
                    family: vec![],
                    exit_policy: ExitPolicy::new(vec![]),
                    hibernating: false,
                },
            );
        }
        relays.insert(
            "EXIT".to_string(),
            RelayStatus {
                fingerprint: "EXIT".to_string(),
                nickname: "EXIT".to_string(),
                bandwidth: 100,
                flags: RelayFlags::RUNNING | RelayFlags::VALID | RelayFlags::EXIT,
            },
        );
        descriptors.insert(
            "EXIT".to_string(),
            RelayDescriptor {
                fingerprint: "EXIT".to_string(),
                nickname: "EXIT".to_string(),
                address: Ipv4Addr::new(9, 9, 9, 9),
                family: vec![],
                exit_policy: ExitPolicy::new(vec![]),
                hibernating: false,
            },
        );
        let period = ConsensusPeriod {
            valid_after: 1000,
            fresh_until: 100_000,
            bandwidth_weights: weights(),
            bwweightscale: 10000,
            relays,
            descriptors,
        };
        let mut guards = Vec::new();
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let chosen =
            guards_for_circuit(&mut guards, &period, true, true, &"EXIT".to_string(), &mut rng).unwrap();
        assert_eq!(guards.len(), NUM_GUARDS);
        assert_eq!(chosen.len(), NUM_GUARDS);
    }
}
