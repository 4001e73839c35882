//! Genetic operators on purchase schedules.
//!
//! Every operator reads its parents and builds a fresh child candidate; parents
//! are never modified. Operators only touch the *committed* part of a schedule
//! (purchases before the parent's current time) and carry the future part over
//! unchanged. An operator that cannot produce a meaningful child returns
//! `None`.

use std::sync::Arc;

use bastion_engine::{Candidate, GameConfig, Purchase, Schedule, placement};
use rand::{Rng, seq::IteratorRandom as _};
use rand_distr::{Cauchy, Distribution as _};

use crate::population::purchase_delay;

/// Success probability of the delay distribution used by [`addition`].
pub const ADDITION_DELAY_P: f64 = 0.3;
/// Scale of the Cauchy shift used by [`time_translation`].
pub const TIME_SHIFT_SCALE: f64 = 0.5;
/// Minimum delay between a purchase and its replacement in
/// [`replace_tower_with_another`].
pub const REPLACEMENT_MIN_DELAY: u64 = 5;
/// Success probability of the extra replacement delay.
pub const REPLACEMENT_DELAY_P: f64 = 0.2;
/// Block exchanges [`cross`] attempts before giving up.
pub const CROSS_MAX_TRIES: usize = 10;

/// Single-parent operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum UnaryOperator {
    #[display("addition")]
    Addition,
    #[display("deletion")]
    Deletion,
    #[display("permutation")]
    Permutation,
    #[display("time-translation")]
    TimeTranslation,
    #[display("replace-tower")]
    ReplaceTower,
}

impl UnaryOperator {
    pub const ALL: [Self; 5] = [
        Self::Addition,
        Self::Deletion,
        Self::Permutation,
        Self::TimeTranslation,
        Self::ReplaceTower,
    ];

    pub fn apply<R>(self, parent: &Candidate, rng: &mut R) -> Option<Candidate>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Addition => addition(parent, rng),
            Self::Deletion => deletion(parent, rng),
            Self::Permutation => permutation(parent, rng),
            Self::TimeTranslation => time_translation(parent, rng),
            Self::ReplaceTower => replace_tower_with_another(parent, rng),
        }
    }
}

/// Two-parent operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BinaryOperator {
    #[display("cross")]
    Cross,
}

impl BinaryOperator {
    pub const ALL: [Self; 1] = [Self::Cross];

    pub fn apply<R>(self, first: &Candidate, second: &Candidate, rng: &mut R) -> Option<Candidate>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Cross => cross(first, second, rng),
        }
    }
}

/// Splits `schedule` into committed (`time < now`) and future purchases.
///
/// If fewer than `min_committed` purchases are committed, the whole schedule is
/// treated as committed instead.
///
/// # Arguments
///
/// * `min_committed` - Smallest acceptable number of committed purchases
/// * `now` - Current simulation time of the candidate owning `schedule`
/// * `schedule` - The candidate's genotype
///
/// # Returns
///
/// The `(committed, future)` halves, both in schedule order, or `None` if the
/// whole schedule has fewer than `min_committed` purchases
///
/// # Examples
///
/// ```
/// use bastion_engine::{Cell, Purchase, Schedule};
/// use bastion_evolution::operators::split_committed;
///
/// let schedule: Schedule = [1, 4, 9]
///     .into_iter()
///     .map(|time| Purchase::new(time, Cell::new(0, 0), 0))
///     .collect();
///
/// let (committed, future) = split_committed(1, 5, &schedule).unwrap();
/// assert_eq!((committed.len(), future.len()), (2, 1));
///
/// // Too few committed purchases: everything counts as committed.
/// let (committed, future) = split_committed(3, 5, &schedule).unwrap();
/// assert_eq!((committed.len(), future.len()), (3, 0));
///
/// assert!(split_committed(4, 5, &schedule).is_none());
/// ```
#[must_use]
pub fn split_committed(
    min_committed: usize,
    now: u64,
    schedule: &Schedule,
) -> Option<(Vec<Purchase>, Vec<Purchase>)> {
    if schedule.len() < min_committed {
        return None;
    }
    let purchases = schedule.as_slice();
    let split = purchases.partition_point(|p| p.time < now);
    if split < min_committed {
        return Some((purchases.to_vec(), Vec::new()));
    }
    Some((purchases[..split].to_vec(), purchases[split..].to_vec()))
}

/// Two distinct indices in `0..len`, returned in ascending order.
///
/// The pair delimits the half-open block `start..end`, which is never empty and
/// never reaches the last element.
///
/// # Panics
///
/// Panics if `len < 2`.
pub fn split_points<R>(len: usize, rng: &mut R) -> (usize, usize)
where
    R: Rng + ?Sized,
{
    let picked = rand::seq::index::sample(rng, len, 2);
    let (a, b) = (picked.index(0), picked.index(1));
    (a.min(b), a.max(b))
}

fn child_of(config: &Arc<GameConfig>, purchases: Vec<Purchase>) -> Candidate {
    Candidate::new(Arc::clone(config), Schedule::from(purchases))
}

/// Adds one random purchase scheduled shortly after the parent's current time.
pub fn addition<R>(parent: &Candidate, rng: &mut R) -> Option<Candidate>
where
    R: Rng + ?Sized,
{
    let config = parent.config();
    let (id, tower) = config.towers().iter().choose(rng)?;
    let cell =
        placement::sample_position_for(config, tower, parent.genotype().as_slice(), None, rng)?;
    let time = parent.time() + purchase_delay(ADDITION_DELAY_P, rng);

    let mut purchases = parent.genotype().as_slice().to_vec();
    purchases.push(Purchase::new(time, cell, id));
    Some(child_of(config, purchases))
}

/// Removes one random committed purchase.
///
/// # Returns
///
/// A child without the removed purchase, or `None` when fewer than two
/// purchases are committed. A lone committed purchase is never deleted, even
/// if future purchases remain.
pub fn deletion<R>(parent: &Candidate, rng: &mut R) -> Option<Candidate>
where
    R: Rng + ?Sized,
{
    let (mut committed, future) = split_committed(1, parent.time(), parent.genotype())?;
    if committed.len() < 2 {
        return None;
    }
    committed.remove(rng.random_range(0..committed.len()));
    committed.extend(future);
    Some(child_of(parent.config(), committed))
}

/// Swaps position and tower type of two committed purchases, keeping their times.
pub fn permutation<R>(parent: &Candidate, rng: &mut R) -> Option<Candidate>
where
    R: Rng + ?Sized,
{
    let (mut committed, future) = split_committed(2, parent.time(), parent.genotype())?;
    let picked = rand::seq::index::sample(rng, committed.len(), 2);
    let (a, b) = (picked.index(0), picked.index(1));

    let (cell_a, tower_a) = (committed[a].cell, committed[a].tower);
    committed[a].cell = committed[b].cell;
    committed[a].tower = committed[b].tower;
    committed[b].cell = cell_a;
    committed[b].tower = tower_a;

    committed.extend(future);
    Some(child_of(parent.config(), committed))
}

/// Shifts the time of one committed purchase by a heavy-tailed offset.
///
/// The shifted time never drops below 1.
pub fn time_translation<R>(parent: &Candidate, rng: &mut R) -> Option<Candidate>
where
    R: Rng + ?Sized,
{
    let (mut committed, future) = split_committed(1, parent.time(), parent.genotype())?;
    let idx = rng.random_range(0..committed.len());
    let shift = Cauchy::new(0.0, TIME_SHIFT_SCALE).ok()?.sample(rng);

    #[expect(clippy::cast_precision_loss)]
    let shifted = (committed[idx].time as f64 + shift).max(1.0);
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shifted = shifted as u64;
    committed[idx].time = shifted;

    committed.extend(future);
    Some(child_of(parent.config(), committed))
}

/// Buys a tower at least as expensive on top of one committed purchase.
///
/// The original purchase stays in the schedule; the replacement is scheduled a
/// few steps later on the same cell and triggers the rebuy rules when it
/// executes.
pub fn replace_tower_with_another<R>(parent: &Candidate, rng: &mut R) -> Option<Candidate>
where
    R: Rng + ?Sized,
{
    let config = parent.config();
    let (committed, future) = split_committed(1, parent.time(), parent.genotype())?;
    let original = committed[rng.random_range(0..committed.len())];
    let (id, _) = config.towers().upgrades_of(original.tower).choose(rng)?;
    let time = original.time + REPLACEMENT_MIN_DELAY + purchase_delay(REPLACEMENT_DELAY_P, rng);

    let mut purchases = committed;
    purchases.extend(future);
    purchases.push(Purchase::new(time, original.cell, id));
    Some(child_of(config, purchases))
}

/// Replaces a block of the first parent's committed purchases with a block of
/// the second parent's.
///
/// Both parents are split at the first parent's current time. Retries with a
/// fresh block of the second parent up to [`CROSS_MAX_TRIES`] times when the
/// inserted block collides with the remaining purchases or the path.
///
/// # Arguments
///
/// * `first` - Parent whose time, future purchases and surrounding blocks are kept
/// * `second` - Parent donating one block of committed purchases
/// * `rng` - Random source for the block boundaries
///
/// # Returns
///
/// The child, or `None` if either parent schedules fewer than two purchases
/// or every attempt collided
pub fn cross<R>(first: &Candidate, second: &Candidate, rng: &mut R) -> Option<Candidate>
where
    R: Rng + ?Sized,
{
    let config = first.config();
    let now = first.time();
    let (first_committed, first_future) = split_committed(2, now, first.genotype())?;
    let (second_committed, _) = split_committed(2, now, second.genotype())?;

    let (start, end) = split_points(first_committed.len(), rng);
    let base = first_committed[..start]
        .iter()
        .chain(&first_committed[end..])
        .chain(&first_future)
        .copied()
        .collect::<Vec<_>>();

    'tries: for _ in 0..CROSS_MAX_TRIES {
        let (start, end) = split_points(second_committed.len(), rng);
        let mut purchases = base.clone();
        for &purchase in &second_committed[start..end] {
            if !placement::is_valid_position(config, purchase.cell, &purchases) {
                continue 'tries;
            }
            purchases.push(purchase);
        }
        return Some(child_of(config, purchases));
    }
    None
}

#[cfg(test)]
mod tests {
    use bastion_engine::{Cell, SpawnCurve, TowerType};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    fn config() -> Arc<GameConfig> {
        Arc::new(
            GameConfig::builder(9, 5)
                .path((0..9).map(|col| Cell::new(2, col)))
                .tower(0, TowerType::filled(3, 5.0, 200.0))
                .tower(1, TowerType::filled(5, 10.0, 500.0))
                .tower(2, TowerType::ring(5, 5.0, 300.0))
                .spawn(SpawnCurve::Linear { rate: 4.0 })
                .initial_hp(100.0)
                .initial_gold(1000.0)
                .build()
                .unwrap(),
        )
    }

    fn candidate(config: &Arc<GameConfig>, purchases: &[(u64, (usize, usize), u32)]) -> Candidate {
        let schedule = purchases
            .iter()
            .map(|&(time, (row, col), tower)| Purchase::new(time, Cell::new(row, col), tower))
            .collect();
        Candidate::new(Arc::clone(config), schedule)
    }

    /// Steps `candidate` until its time reaches `time`.
    fn advance(candidate: &mut Candidate, time: u64, rng: &mut Pcg64) {
        while candidate.time() < time {
            candidate.step(rng);
        }
    }

    fn assert_legal(child: &Candidate) {
        let genotype = child.genotype();
        assert!(genotype.is_sorted());
        for p in genotype {
            assert!(!child.config().is_on_path(p.cell));
            assert!(child.config().tower(p.tower).is_some());
        }
    }

    #[test]
    fn test_split_committed() {
        let config = config();
        let c = candidate(&config, &[(1, (0, 0), 0), (3, (0, 1), 0), (8, (0, 2), 0)]);
        let (committed, future) = split_committed(1, 4, c.genotype()).unwrap();
        assert_eq!(committed.len(), 2);
        assert_eq!(future.len(), 1);

        // Too few committed: the whole schedule counts as committed.
        let (committed, future) = split_committed(2, 1, c.genotype()).unwrap();
        assert_eq!(committed.len(), 3);
        assert!(future.is_empty());

        assert_eq!(split_committed(4, 10, c.genotype()), None);
    }

    #[test]
    fn test_split_points_are_distinct_and_ordered() {
        let mut rng = Pcg64::seed_from_u64(1);
        for len in 2..8 {
            for _ in 0..50 {
                let (start, end) = split_points(len, &mut rng);
                assert!(start < end && end < len);
            }
        }
    }

    #[test]
    fn test_addition_appends_a_future_purchase() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(2);
        let mut parent = candidate(&config, &[(1, (0, 0), 0)]);
        advance(&mut parent, 3, &mut rng);
        let before = parent.genotype().clone();

        let child = addition(&parent, &mut rng).unwrap();
        assert_eq!(parent.genotype(), &before);
        assert_eq!(child.genotype().len(), 2);
        assert!(child.genotype().iter().any(|p| p.time > 3));
        assert_legal(&child);
    }

    #[test]
    fn test_deletion_of_single_purchase_is_rejected() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(3);
        let mut parent = candidate(&config, &[(1, (0, 0), 0)]);
        advance(&mut parent, 5, &mut rng);
        let before = parent.genotype().clone();

        for _ in 0..20 {
            assert!(deletion(&parent, &mut rng).is_none());
        }
        assert_eq!(parent.genotype(), &before);
    }

    #[test]
    fn test_deletion_of_single_committed_purchase_is_rejected() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(4);
        let mut parent = candidate(&config, &[(1, (0, 0), 0), (50, (4, 4), 1)]);
        advance(&mut parent, 5, &mut rng);
        let before = parent.genotype().clone();

        for _ in 0..20 {
            assert!(deletion(&parent, &mut rng).is_none());
        }
        assert_eq!(parent.genotype(), &before);
    }

    #[test]
    fn test_deletion_keeps_future_purchases() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(4);
        let mut parent = candidate(&config, &[(1, (0, 0), 0), (2, (0, 1), 0), (50, (4, 4), 1)]);
        advance(&mut parent, 5, &mut rng);

        for _ in 0..20 {
            let child = deletion(&parent, &mut rng).unwrap();
            assert_eq!(child.genotype().len(), 2);
            assert!(child.genotype().iter().any(|p| p.time == 50));
        }
    }

    #[test]
    fn test_permutation_swaps_cells_and_towers() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(5);
        let mut parent = candidate(&config, &[(1, (0, 0), 0), (2, (4, 4), 1)]);
        advance(&mut parent, 5, &mut rng);

        let child = permutation(&parent, &mut rng).unwrap();
        let purchases = child.genotype().as_slice();
        assert_eq!(purchases[0], Purchase::new(1, Cell::new(4, 4), 1));
        assert_eq!(purchases[1], Purchase::new(2, Cell::new(0, 0), 0));
    }

    #[test]
    fn test_time_translation_stays_positive() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(6);
        let mut parent = candidate(&config, &[(1, (0, 0), 0), (2, (4, 4), 1)]);
        advance(&mut parent, 3, &mut rng);

        for _ in 0..100 {
            let child = time_translation(&parent, &mut rng).unwrap();
            assert_eq!(child.genotype().len(), 2);
            assert!(child.genotype().iter().all(|p| p.time >= 1));
            assert_legal(&child);
        }
    }

    #[test]
    fn test_replace_tower_schedules_upgrade_on_same_cell() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(7);
        let mut parent = candidate(&config, &[(1, (0, 0), 2)]);
        advance(&mut parent, 2, &mut rng);

        for _ in 0..20 {
            let child = replace_tower_with_another(&parent, &mut rng).unwrap();
            let purchases = child.genotype().as_slice();
            assert_eq!(purchases.len(), 2);
            assert_eq!(purchases[0], Purchase::new(1, Cell::new(0, 0), 2));
            assert_eq!(purchases[1].cell, Cell::new(0, 0));
            // Tower 0 is cheaper than tower 2.
            assert!(matches!(purchases[1].tower, 1 | 2));
            assert!(purchases[1].time > 1 + REPLACEMENT_MIN_DELAY);
        }
    }

    #[test]
    fn test_cross_merges_blocks_without_collisions() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(8);
        let mut first = candidate(&config, &[(1, (0, 0), 0), (2, (0, 2), 0), (3, (0, 4), 0)]);
        let mut second = candidate(&config, &[(1, (4, 0), 1), (2, (4, 2), 1), (3, (4, 4), 1)]);
        advance(&mut first, 5, &mut rng);
        advance(&mut second, 5, &mut rng);

        for _ in 0..20 {
            let child = cross(&first, &second, &mut rng).unwrap();
            assert_legal(&child);
            let purchases = child.genotype().as_slice();
            for (i, p) in purchases.iter().enumerate() {
                assert!(purchases[i + 1..].iter().all(|q| q.cell != p.cell));
            }
            // The last committed purchase of the first parent always survives.
            assert!(purchases.iter().any(|p| p.cell == Cell::new(0, 4)));
            assert!(purchases.iter().any(|p| p.cell.row == 4));
        }
    }

    #[test]
    fn test_cross_gives_up_when_every_block_collides() {
        // With two committed purchases each, the exchanged blocks are always the
        // first parent's first purchase and the second parent's first purchase,
        // which sits on the cell the first parent keeps.
        let config = config();
        let mut rng = Pcg64::seed_from_u64(9);
        let mut first = candidate(&config, &[(1, (1, 1), 0), (2, (1, 3), 0)]);
        let mut second = candidate(&config, &[(1, (1, 3), 1), (2, (1, 5), 1)]);
        advance(&mut first, 5, &mut rng);
        advance(&mut second, 5, &mut rng);
        let (first_before, second_before) = (first.genotype().clone(), second.genotype().clone());

        for _ in 0..20 {
            assert!(cross(&first, &second, &mut rng).is_none());
        }
        assert_eq!(first.genotype(), &first_before);
        assert_eq!(second.genotype(), &second_before);
    }

    #[test]
    fn test_operators_reject_empty_schedules() {
        let config = config();
        let mut rng = Pcg64::seed_from_u64(10);
        let empty = Candidate::new(Arc::clone(&config), Schedule::new());
        assert!(deletion(&empty, &mut rng).is_none());
        assert!(permutation(&empty, &mut rng).is_none());
        assert!(time_translation(&empty, &mut rng).is_none());
        assert!(replace_tower_with_another(&empty, &mut rng).is_none());
        assert!(cross(&empty, &empty, &mut rng).is_none());
        assert!(addition(&empty, &mut rng).is_some());
    }
}
