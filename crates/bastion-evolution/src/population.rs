//! Random schedule sampling: initial population, fallback offspring and
//! reincarnation.

use std::sync::Arc;

use bastion_engine::{Candidate, GameConfig, Purchase, Schedule, placement};
use rand::{
    Rng,
    seq::{IndexedRandom as _, IteratorRandom as _},
};
use rand_distr::{Distribution as _, Geometric};

/// Success probability of the purchase-delay distribution for fresh schedules.
pub const INITIAL_DELAY_P: f64 = 0.3;

/// Upper bound (exclusive) on the purchases appended to a reincarnated schedule.
pub const MAX_REINCARNATION_EXTRAS: usize = 3;

/// Number of steps until a purchase: geometric with success probability `p`,
/// counting the successful trial, so always at least 1.
pub fn purchase_delay<R>(p: f64, rng: &mut R) -> u64
where
    R: Rng + ?Sized,
{
    Geometric::new(p).map_or(1, |geometric| geometric.sample(rng).saturating_add(1))
}

/// A purchase of a random tower at a random legal position, scheduled after `after`.
///
/// Returns `None` if no legal position could be sampled.
pub fn random_purchase<R>(
    config: &GameConfig,
    placed: &[Purchase],
    after: u64,
    rng: &mut R,
) -> Option<Purchase>
where
    R: Rng + ?Sized,
{
    let (id, tower) = config.towers().iter().choose(rng)?;
    let cell = placement::sample_position_for(config, tower, placed, None, rng)?;
    let time = after + purchase_delay(INITIAL_DELAY_P, rng);
    Some(Purchase::new(time, cell, id))
}

/// Greedily samples affordable purchases until the starting gold runs out.
///
/// Each purchase picks a random tower among those still affordable from the
/// remaining budget. Stops early if no legal position is left.
pub fn random_schedule<R>(config: &GameConfig, rng: &mut R) -> Schedule
where
    R: Rng + ?Sized,
{
    let mut gold = config.initial_gold();
    let mut purchases = Vec::new();
    loop {
        let affordable = config.towers().affordable(gold).collect::<Vec<_>>();
        let Some(&(id, tower)) = affordable.choose(rng) else {
            break;
        };
        let time = purchase_delay(INITIAL_DELAY_P, rng);
        let Some(cell) = placement::sample_position_for(config, tower, &purchases, None, rng)
        else {
            break;
        };
        gold -= tower.cost();
        purchases.push(Purchase::new(time, cell, id));
    }
    Schedule::from(purchases)
}

#[must_use]
pub fn random_candidate<R>(config: &Arc<GameConfig>, rng: &mut R) -> Candidate
where
    R: Rng + ?Sized,
{
    Candidate::new(Arc::clone(config), random_schedule(config, rng))
}

#[must_use]
pub fn random_population<R>(config: &Arc<GameConfig>, count: usize, rng: &mut R) -> Vec<Candidate>
where
    R: Rng + ?Sized,
{
    (0..count).map(|_| random_candidate(config, rng)).collect()
}

/// Pending purchases for a candidate reincarnated from `donor`.
///
/// Every purchase the donor has not executed yet is redrawn (tower, position and
/// time after the donor's current time); redraws without a legal position are
/// dropped. Up to two extra random purchases are appended.
pub fn reincarnation_schedule<R>(donor: &Candidate, rng: &mut R) -> Schedule
where
    R: Rng + ?Sized,
{
    let config = donor.config();
    let mut placed = donor.executed().to_vec();
    let mut pending = Vec::new();
    let extras = rng.random_range(0..MAX_REINCARNATION_EXTRAS);
    for _ in 0..donor.pending().len() + extras {
        if let Some(purchase) = random_purchase(config, &placed, donor.time(), rng) {
            placed.push(purchase);
            pending.push(purchase);
        }
    }
    Schedule::from(pending)
}
