//! Sampling legal tower positions near the enemy path.
//!
//! A position is legal when it lies inside the map, is not a path cell, and is
//! not already used by another purchase of the same schedule. Candidates are
//! drawn from a 2-D Gaussian centered on a uniformly chosen path cell, so towers
//! cluster where they can actually hit something.

use rand::{Rng, seq::IndexedRandom as _};
use rand_distr::{Distribution as _, Normal};

use crate::core::{Cell, Purchase, TowerType};

use super::GameConfig;

/// Retry cap used when the caller does not supply one.
#[must_use]
pub fn default_max_tries(config: &GameConfig) -> usize {
    4 * config.width() * config.height()
}

/// Returns `true` if a tower may be placed on `cell` given the already scheduled
/// `placed` purchases.
#[must_use]
pub fn is_valid_position(config: &GameConfig, cell: Cell, placed: &[Purchase]) -> bool {
    config.contains(cell) && !config.is_on_path(cell) && placed.iter().all(|p| p.cell != cell)
}

/// Samples a legal cell around the path.
///
/// `radius` is `(rows, cols)`, used as the diagonal covariance of the Gaussian
/// (floored at 1). Gives up after `max_tries` draws (or
/// [`default_max_tries`] when `None`) and returns `None`.
pub fn sample_position<R>(
    config: &GameConfig,
    radius: (usize, usize),
    placed: &[Purchase],
    max_tries: Option<usize>,
    rng: &mut R,
) -> Option<Cell>
where
    R: Rng + ?Sized,
{
    let max_tries = max_tries.unwrap_or_else(|| default_max_tries(config));
    #[expect(clippy::cast_precision_loss)]
    let (std_row, std_col) = (
        (radius.0.max(1) as f64).sqrt(),
        (radius.1.max(1) as f64).sqrt(),
    );

    for _ in 0..max_tries {
        let center = config.path().choose(rng)?;
        #[expect(clippy::cast_precision_loss)]
        let (mean_row, mean_col) = (center.row as f64, center.col as f64);
        let row = Normal::new(mean_row, std_row).ok()?.sample(rng);
        let col = Normal::new(mean_col, std_col).ok()?.sample(rng);
        #[expect(clippy::cast_possible_truncation)]
        let Some(cell) = Cell::from_signed(
            row.round() as i64,
            col.round() as i64,
            config.height(),
            config.width(),
        ) else {
            continue;
        };
        if is_valid_position(config, cell, placed) {
            return Some(cell);
        }
    }
    None
}

/// Samples a position suited to `tower`'s kernel size.
pub fn sample_position_for<R>(
    config: &GameConfig,
    tower: &TowerType,
    placed: &[Purchase],
    max_tries: Option<usize>,
    rng: &mut R,
) -> Option<Cell>
where
    R: Rng + ?Sized,
{
    sample_position(config, tower.radius(), placed, max_tries, rng)
}
