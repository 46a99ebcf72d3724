//! Random id sampling for the `random` scope.

use std::collections::HashSet;

use rand::Rng;

/// Draws up to `n` distinct ids uniformly from `[0, min(n, row_count))`.
///
/// At most `attempt_factor * n` draws are made. Duplicates are dropped and the
/// surviving ids keep their draw order, so the result can hold fewer than `n`
/// ids. Drawing stops once every id in the range has been drawn.
///
/// # Examples
///
/// ```
/// use autoscopes_scopes::sampling::sample_ids;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let ids = sample_ids(3, 100, 2, &mut rng);
/// assert!(ids.len() <= 3);
/// assert!(ids.iter().all(|&id| (0..3).contains(&id)));
/// ```
pub fn sample_ids<R: Rng + ?Sized>(
    n: u64,
    row_count: u64,
    attempt_factor: usize,
    rng: &mut R,
) -> Vec<i64> {
    let upper = n.min(row_count);
    if upper == 0 {
        return Vec::new();
    }
    // Only `upper` distinct ids exist, however large `n` is.
    let target = usize::try_from(upper).unwrap_or(usize::MAX);
    let attempts = attempt_factor.saturating_mul(usize::try_from(n).unwrap_or(usize::MAX));
    let high = i64::try_from(upper).unwrap_or(i64::MAX);

    let mut seen = HashSet::with_capacity(target.min(attempts));
    let mut ids: Vec<i64> = Vec::with_capacity(target.min(attempts));
    for _ in 0..attempts {
        if ids.len() == target {
            break;
        }
        let id = rng.gen_range(0..high);
        if seen.insert(id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bounds_and_distinct() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ids = sample_ids(5, 1_000, 2, &mut rng);
            assert!(ids.len() <= 5);
            assert!(ids.iter().all(|&id| (0..5).contains(&id)));
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), ids.len());
        }
    }

    #[test]
    fn test_row_count_caps_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let ids = sample_ids(10, 2, 2, &mut rng);
        assert!(ids.len() <= 2);
        assert!(ids.iter().all(|&id| id == 0 || id == 1));
    }

    #[test]
    fn test_empty_table() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_ids(4, 0, 2, &mut rng).is_empty());
    }

    #[test]
    fn test_zero_factor_draws_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_ids(4, 10, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_single_row() {
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(sample_ids(1, 50, 2, &mut rng), vec![0]);
    }

    #[test]
    fn test_stops_once_every_row_is_drawn() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut ids = sample_ids(200_000_000, 3, 2, &mut rng);
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_huge_sample_size() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut ids = sample_ids(u64::MAX, 3, 2, &mut rng);
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);

        let ids = sample_ids(i64::MAX.unsigned_abs(), 1, usize::MAX, &mut rng);
        assert_eq!(ids, vec![0]);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let a = sample_ids(8, 100, 2, &mut StdRng::seed_from_u64(42));
        let b = sample_ids(8, 100, 2, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
