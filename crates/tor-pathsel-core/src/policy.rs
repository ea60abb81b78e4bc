//! Exit policies: the ordered accept/reject rule lists that decide whether a
//! relay will carry traffic to a given destination.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// An address pattern that an exit-policy rule applies to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AddrPattern {
    /// Matches every address ("*" in a written policy).
    Wildcard,
    /// Matches addresses within `network/prefix_len`.
    Net {
        /// The network's base address.
        network: Ipv4Addr,
        /// The network's prefix length, in `0..=32`.
        prefix_len: u8,
    },
}

impl AddrPattern {
    /// Return true if `ip` is covered by this pattern.
    fn matches(&self, ip: Ipv4Addr) -> bool {
        match self {
            AddrPattern::Wildcard => true,
            AddrPattern::Net {
                network,
                prefix_len,
            } => {
                let mask = if *prefix_len == 0 {
                    0u32
                } else {
                    u32::MAX << (32 - prefix_len)
                };
                (u32::from(ip) & mask) == (u32::from(*network) & mask)
            }
        }
    }
}

/// A single rule in an exit policy.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExitPolicyRule {
    /// Whether this rule accepts (true) or rejects (false) matching traffic.
    pub is_accept: bool,
    /// The lowest port this rule covers.
    pub min_port: u16,
    /// The highest port this rule covers (inclusive).
    pub max_port: u16,
    /// The address pattern this rule applies to.
    pub pattern: AddrPattern,
}

impl ExitPolicyRule {
    /// Return true if this rule's address pattern is the wildcard.
    pub fn is_address_wildcard(&self) -> bool {
        matches!(self.pattern, AddrPattern::Wildcard)
    }

    /// Return true if `port` falls within this rule's port range.
    fn covers_port(&self, port: u16) -> bool {
        port >= self.min_port && port <= self.max_port
    }
}

/// A relay's ordered exit policy: the rules a connection is matched against,
/// in order, to decide whether the relay will carry it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExitPolicy {
    /// The ordered rule list.
    pub rules: Vec<ExitPolicyRule>,
}

impl ExitPolicy {
    /// Build a policy from an explicit rule list, in evaluation order.
    pub fn new(rules: Vec<ExitPolicyRule>) -> Self {
        ExitPolicy { rules }
    }

    /// Return whether there is *some* IP this relay will exit to on `port`.
    ///
    /// Walks rules in order; the first rule whose port range covers `port`
    /// decides: accept means yes, reject means yes only if the rule is not
    /// an address wildcard (some other address may still be allowed).
    /// Default is accept, if no rule covers the port.
    pub fn can_exit_to_port(&self, port: u16) -> bool {
        for rule in &self.rules {
            if rule.covers_port(port) {
                return rule.is_accept || !rule.is_address_wildcard();
            }
        }
        true
    }

    /// Return whether this relay will exit to `(ip, port)` specifically.
    ///
    /// Walks rules in order; the first rule whose port range covers `port`
    /// *and* whose address pattern matches `ip` decides accept/reject.
    /// Default is accept, if no rule matches both port and address.
    pub fn can_exit_to(&self, ip: Ipv4Addr, port: u16) -> bool {
        for rule in &self.rules {
            if rule.covers_port(port) && rule.pattern.matches(ip) {
                return rule.is_accept;
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rule(accept: bool, lo: u16, hi: u16, pattern: AddrPattern) -> ExitPolicyRule {
        ExitPolicyRule {
            is_accept: accept,
            min_port: lo,
            max_port: hi,
            pattern,
        }
    }

    #[test]
    fn default_accept_when_no_rule_matches() {
        let policy = ExitPolicy::new(vec![]);
        assert!(policy.can_exit_to_port(80));
        assert!(policy.can_exit_to(Ipv4Addr::new(1, 2, 3, 4), 80));
    }

    #[test]
    fn reject_wildcard_blocks_port() {
        let policy = ExitPolicy::new(vec![rule(false, 1, 65535, AddrPattern::Wildcard)]);
        assert!(!policy.can_exit_to_port(80));
        assert!(!policy.can_exit_to(Ipv4Addr::new(1, 2, 3, 4), 80));
    }

    #[test]
    fn reject_specific_net_still_might_support_port() {
        let policy = ExitPolicy::new(vec![rule(
            false,
            1,
            65535,
            AddrPattern::Net {
                network: Ipv4Addr::new(10, 0, 0, 0),
                prefix_len: 8,
            },
        )]);
        // Some other address might still be allowed on this port.
        assert!(policy.can_exit_to_port(80));
        // But that specific network is rejected.
        assert!(!policy.can_exit_to(Ipv4Addr::new(10, 1, 2, 3), 80));
        // An address outside the rejected net falls through to default accept.
        assert!(policy.can_exit_to(Ipv4Addr::new(11, 1, 2, 3), 80));
    }

    #[test]
    fn first_matching_rule_wins() {
        let policy = ExitPolicy::new(vec![
            rule(true, 80, 80, AddrPattern::Wildcard),
            rule(false, 1, 65535, AddrPattern::Wildcard),
        ]);
        assert!(policy.can_exit_to_port(80));
        assert!(!policy.can_exit_to_port(443));
    }
}
