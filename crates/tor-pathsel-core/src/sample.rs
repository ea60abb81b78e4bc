//! Weighted random selection among a set of candidates.

use rand::Rng;

use crate::error::Error;

/// Draw one node from `weighted_nodes`, a sequence of `(node, weight)` pairs
/// whose weights sum to 1.
///
/// Draws a uniform real `r` in `[0, 1)` and returns the first node whose
/// running cumulative weight is `>= r`. The input order is part of the
/// sampling contract: callers must supply candidates in a stable,
/// documented order (this crate uses ascending fingerprint throughout) so
/// that repeated runs with the same seed choose the same node.
///
/// Returns [`Error::WeightInvariant`] if the loop exhausts the candidates
/// without returning, which can only happen if the weights don't actually
/// sum to 1.
pub fn weighted_sample<T: Clone, R: Rng + ?Sized>(
    weighted_nodes: &[(T, f64)],
    rng: &mut R,
) -> Result<T, Error> {
    let r: f64 = rng.random();
    let mut cum_weight = 0.0;
    for (node, weight) in weighted_nodes {
        if r <= cum_weight + weight {
            return Ok(node.clone());
        }
        cum_weight += weight;
    }
    Err(Error::WeightInvariant)
}

/// Normalize a list of `(node, raw_weight)` pairs into weights summing to 1.
///
/// Returns [`Error::WeightInvariant`] if the candidate list is empty or the
/// total weight is zero, since no normalized distribution exists in that
/// case either.
pub fn normalize<T: Clone>(candidates: &[(T, f64)]) -> Result<Vec<(T, f64)>, Error> {
    let total: f64 = candidates.iter().map(|(_, w)| w).sum();
    if candidates.is_empty() || total <= 0.0 {
        return Err(Error::WeightInvariant);
    }
    Ok(candidates
        .iter()
        .map(|(node, weight)| (node.clone(), weight / total))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn picks_first_node_covering_the_draw() {
        // r = 0 always selects the first node, regardless of its weight.
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let nodes = vec![("a", 0.3), ("b", 0.3), ("c", 0.4)];
        // Run many draws; every result must be one of the supplied nodes.
        for _ in 0..100 {
            let picked = weighted_sample(&nodes, &mut rng).unwrap();
            assert!(["a", "b", "c"].contains(&picked));
        }
    }

    #[test]
    fn errors_when_weights_do_not_sum_to_one() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        // Total weight 0.5: for large r this will fall through every entry.
        let nodes = vec![("a", 0.1), ("b", 0.1)];
        // Not every seed will trigger the failure, but at least one of a
        // large batch must if the invariant is checked at all: force it by
        // using r close to 1 deterministically via a single-candidate case.
        let singleton = vec![("only", 0.0)];
        assert!(weighted_sample(&singleton, &mut rng).is_err());
        let _ = nodes;
    }

    #[test]
    fn normalize_divides_by_total() {
        let candidates = vec![("a", 1.0), ("b", 3.0)];
        let normalized = normalize(&candidates).unwrap();
        assert_eq!(normalized, vec![("a", 0.25), ("b", 0.75)]);
    }

    #[test]
    fn normalize_rejects_empty_or_zero_total() {
        assert!(normalize::<&str>(&[]).is_err());
        assert!(normalize(&[("a", 0.0), ("b", 0.0)]).is_err());
    }
}
