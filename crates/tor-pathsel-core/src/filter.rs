//! Flag- and hibernation-based candidate pruning for exit and middle
//! positions.

use crate::relay::{ConsRelayStats, Descriptors, Fingerprint, RelayFlags};

/// Keep relays usable as an exit: Running, Valid, not BadExit, not hibernating.
pub fn filter_exits(relays: &ConsRelayStats, descriptors: &Descriptors) -> Vec<Fingerprint> {
    relays
        .iter()
        .filter(|(fprint, status)| {
            status.has_flags(RelayFlags::RUNNING | RelayFlags::VALID)
                && !status.flags.contains(RelayFlags::BAD_EXIT)
                && descriptors
                    .get(*fprint)
                    .is_some_and(|desc| !desc.hibernating)
        })
        .map(|(fprint, _)| fprint.clone())
        .collect()
}

/// Keep relays usable as a middle: Running, not hibernating.
///
/// Valid is intentionally *not* required here, matching Tor's default
/// configuration, which allows non-Valid routers in the middle position.
pub fn filter_middles(relays: &ConsRelayStats, descriptors: &Descriptors) -> Vec<Fingerprint> {
    relays
        .iter()
        .filter(|(fprint, status)| {
            status.has_flags(RelayFlags::RUNNING)
                && descriptors
                    .get(*fprint)
                    .is_some_and(|desc| !desc.hibernating)
        })
        .map(|(fprint, _)| fprint.clone())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::policy::ExitPolicy;
    use crate::relay::{RelayDescriptor, RelayStatus};
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;

    fn status(fprint: &str, flags: RelayFlags) -> (Fingerprint, RelayStatus) {
        (
            fprint.to_string(),
            RelayStatus {
                fingerprint: fprint.to_string(),
                nickname: fprint.to_string(),
                bandwidth: 100,
                flags,
            },
        )
    }

    fn descriptor(fprint: &str, hibernating: bool) -> (Fingerprint, RelayDescriptor) {
        (
            fprint.to_string(),
            RelayDescriptor {
                fingerprint: fprint.to_string(),
                nickname: fprint.to_string(),
                address: Ipv4Addr::new(1, 2, 3, 4),
                family: vec![],
                exit_policy: ExitPolicy::new(vec![]),
                hibernating,
            },
        )
    }

    #[test]
    fn exit_filter_requires_valid_and_not_bad() {
        let relays: ConsRelayStats = BTreeMap::from([
            status("ok", RelayFlags::RUNNING | RelayFlags::VALID | RelayFlags::EXIT),
            status("bad", RelayFlags::RUNNING | RelayFlags::VALID | RelayFlags::BAD_EXIT),
            status("invalid", RelayFlags::RUNNING),
        ]);
        let descriptors: Descriptors = BTreeMap::from([
            descriptor("ok", false),
            descriptor("bad", false),
            descriptor("invalid", false),
        ]);
        let exits = filter_exits(&relays, &descriptors);
        assert_eq!(exits, vec!["ok".to_string()]);
    }

    #[test]
    fn hibernating_relays_are_excluded_from_both_filters() {
        let relays: ConsRelayStats =
            BTreeMap::from([status("h", RelayFlags::RUNNING | RelayFlags::VALID)]);
        let descriptors: Descriptors = BTreeMap::from([descriptor("h", true)]);
        assert!(filter_exits(&relays, &descriptors).is_empty());
        assert!(filter_middles(&relays, &descriptors).is_empty());
    }

    #[test]
    fn middle_filter_does_not_require_valid() {
        let relays: ConsRelayStats = BTreeMap::from([status("m", RelayFlags::RUNNING)]);
        let descriptors: Descriptors = BTreeMap::from([descriptor("m", false)]);
        assert_eq!(filter_middles(&relays, &descriptors), vec!["m".to_string()]);
    }
}
