use crate::types::Player;
use rand::Rng;

/// Width of the partner offset draw (`0..PAIRING_WINDOW`)
const PAIRING_WINDOW: i64 = 10;
/// Shift applied to the offset draw, so partners land in `i-5..=i+4`
const PAIRING_SHIFT: i64 = 5;

/// Locality-biased random pairing over a rating-ordered population
#[derive(Clone, Copy, Debug, Default)]
pub struct Matchmaker;

impl Matchmaker {
    pub fn new() -> Self {
        Self
    }

    /// Draw one candidate pair. `None` means the partner index fell outside
    /// the population and the attempt is dropped, not retried.
    pub fn pick_pair(&self, population: usize, rng: &mut impl Rng) -> Option<(usize, usize)> {
        if population == 0 {
            return None;
        }

        let i = rng.gen_range(0..population) as i64;
        let mut j = i + rng.gen_range(0..PAIRING_WINDOW) - PAIRING_SHIFT;
        if j == i {
            j += 2 * rng.gen_range(0..2) - 1;
        }

        if j < 0 || j >= population as i64 {
            return None;
        }
        Some((i as usize, j as usize))
    }
}

/// Mutable borrows of two distinct players, in `(i, j)` order
pub fn pair_mut(players: &mut [Player], i: usize, j: usize) -> (&mut Player, &mut Player) {
    assert_ne!(i, j, "a player cannot be paired with itself");
    if i < j {
        let (left, right) = players.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = players.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_never_pairs_with_self() {
        let matchmaker = Matchmaker::new();
        let mut rng = StdRng::seed_from_u64(42);
        let population = 50;

        let mut resolved = 0;
        for _ in 0..20_000 {
            if let Some((i, j)) = matchmaker.pick_pair(population, &mut rng) {
                assert_ne!(i, j);
                assert!(i < population && j < population);
                let offset = j as i64 - i as i64;
                assert!((-5..=4).contains(&offset), "offset {}", offset);
                resolved += 1;
            }
        }
        assert!(resolved > 0);
    }

    #[test]
    fn test_edges_get_skipped() {
        let matchmaker = Matchmaker::new();
        let mut rng = StdRng::seed_from_u64(5);

        // With two players most offsets land outside the population
        let mut skipped = 0;
        let mut resolved = 0;
        for _ in 0..5_000 {
            match matchmaker.pick_pair(2, &mut rng) {
                Some((i, j)) => {
                    assert_eq!(i + j, 1);
                    resolved += 1;
                }
                None => skipped += 1,
            }
        }
        assert!(skipped > resolved);
        assert!(resolved > 0);
    }

    #[test]
    fn test_tiny_populations_never_pair() {
        let matchmaker = Matchmaker::new();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..1_000 {
            assert!(matchmaker.pick_pair(0, &mut rng).is_none());
            assert!(matchmaker.pick_pair(1, &mut rng).is_none());
        }
    }

    #[test]
    fn test_pair_mut_keeps_order() {
        let mut players: Vec<Player> = (0..5).map(|r| Player::new(r, 0.0)).collect();

        let (a, b) = pair_mut(&mut players, 1, 3);
        assert_eq!((a.rating, b.rating), (1, 3));

        let (a, b) = pair_mut(&mut players, 4, 0);
        assert_eq!((a.rating, b.rating), (4, 0));
    }
}
