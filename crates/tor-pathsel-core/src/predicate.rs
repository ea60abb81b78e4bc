//! Relay predicates used to keep a circuit's three hops sufficiently
//! distinct: mutual family declaration and /16 subnet collision.

use crate::error::{Error, InputMalformed};
use crate::relay::{Descriptors, FamilyMember};

/// Return true iff `a` and `b` mutually list each other as family.
///
/// A relay lists another as family if its family set contains either the
/// other's `$`-prefixed fingerprint or its nickname. Both directions must
/// hold: declaring a family is a unilateral claim, but Tor only treats two
/// relays as related if they agree.
pub fn same_family(descriptors: &Descriptors, a: &str, b: &str) -> bool {
    let (Some(desc_a), Some(desc_b)) = (descriptors.get(a), descriptors.get(b)) else {
        return false;
    };
    let a_lists_b = lists_member(&desc_a.family, &desc_b.fingerprint, &desc_b.nickname);
    let b_lists_a = lists_member(&desc_b.family, &desc_a.fingerprint, &desc_a.nickname);
    a_lists_b && b_lists_a
}

/// Return true if `family` contains a reference to `fingerprint` or `nickname`.
fn lists_member(family: &[FamilyMember], fingerprint: &str, nickname: &str) -> bool {
    family.iter().any(|member| match member {
        FamilyMember::Fingerprint(f) => f == fingerprint,
        FamilyMember::Nickname(n) => n == nickname,
    })
}

/// Return true iff both dotted-quad IPv4 strings share their first two octets.
///
/// Malformed input (wrong field count, a non-digit octet) is an
/// [`Error::InputMalformed`], not a silent `false`.
pub fn same_subnet16(address1: &str, address2: &str) -> Result<bool, Error> {
    let octets1 = split_ipv4(address1)?;
    let octets2 = split_ipv4(address2)?;
    Ok(octets1[0] == octets2[0] && octets1[1] == octets2[1])
}

/// Split and validate a dotted-quad IPv4 string into its four octet strings.
fn split_ipv4(address: &str) -> Result<[&str; 4], Error> {
    let parts: Vec<&str> = address.split('.').collect();
    if parts.len() != 4 || parts.iter().any(|part| !part.chars().all(|c| c.is_ascii_digit())) {
        return Err(Error::InputMalformed(InputMalformed::NotIpv4 {
            address: address.to_string(),
        }));
    }
    Ok([parts[0], parts[1], parts[2], parts[3]])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::policy::ExitPolicy;
    use crate::relay::RelayDescriptor;
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;

    fn descriptor(fingerprint: &str, nickname: &str, family: Vec<FamilyMember>) -> RelayDescriptor {
        RelayDescriptor {
            fingerprint: fingerprint.to_string(),
            nickname: nickname.to_string(),
            address: Ipv4Addr::new(1, 2, 3, 4),
            family,
            exit_policy: ExitPolicy::new(vec![]),
            hibernating: false,
        }
    }

    #[test]
    fn family_requires_mutual_listing() {
        let mut descriptors: Descriptors = BTreeMap::new();
        descriptors.insert(
            "A".into(),
            descriptor("A", "alice", vec![FamilyMember::Fingerprint("B".into())]),
        );
        descriptors.insert("B".into(), descriptor("B", "bob", vec![]));
        // A claims B, but B does not reciprocate.
        assert!(!same_family(&descriptors, "A", "B"));

        descriptors.insert(
            "B".into(),
            descriptor("B", "bob", vec![FamilyMember::Nickname("alice".into())]),
        );
        assert!(same_family(&descriptors, "A", "B"));
        assert!(same_family(&descriptors, "B", "A"));
    }

    #[test]
    fn subnet16_matches_first_two_octets() {
        assert!(same_subnet16("192.168.1.2", "192.168.200.200").unwrap());
        assert!(!same_subnet16("192.168.1.2", "192.169.1.2").unwrap());
    }

    #[test]
    fn subnet16_rejects_malformed_address() {
        assert!(same_subnet16("192.168.1", "192.168.1.1").is_err());
        assert!(same_subnet16("192.168.1.x", "192.168.1.1").is_err());
    }
}
