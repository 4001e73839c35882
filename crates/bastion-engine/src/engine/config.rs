use std::{collections::HashSet, fmt};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::core::{Cell, Purchase, Schedule, TowerCatalog, TowerId, TowerType};

use super::EnemySpawn;

pub const DEFAULT_GOLD_PER_DAMAGE: f64 = 1.0;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("map dimensions must be positive (got {width}x{height})")]
    EmptyMap { width: usize, height: usize },
    #[display("path must contain at least two cells (got {len})")]
    PathTooShort { len: usize },
    #[display("path cell {cell} lies outside the map")]
    PathCellOutOfBounds { cell: Cell },
    #[display("path visits cell {cell} more than once")]
    DuplicatePathCell { cell: Cell },
    #[display("tower catalog is empty")]
    EmptyTowerCatalog,
    #[display("tower {id} must have a positive finite cost (got {cost})")]
    InvalidTowerCost { id: TowerId, cost: f64 },
    #[display("tower {id} has an invalid damage kernel: {reason}")]
    InvalidTowerKernel { id: TowerId, reason: &'static str },
    #[display("initial base hit points must be positive (got {value})")]
    InvalidInitialHp { value: f64 },
    #[display("initial gold must be non-negative (got {value})")]
    InvalidInitialGold { value: f64 },
    #[display("gold per damage must be non-negative (got {value})")]
    InvalidGoldPerDamage { value: f64 },
    #[display("rebuy {name} must lie in [0, 1] (got {value})")]
    InvalidRebuyFraction { name: &'static str, value: f64 },
    #[display("no enemy spawn function configured")]
    MissingSpawn,
}

/// A purchase that cannot be executed under a given [`GameConfig`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ScheduleError {
    #[display("purchase at t={time} targets cell {cell} outside the map")]
    CellOutOfBounds { time: u64, cell: Cell },
    #[display("purchase at t={time} targets path cell {cell}")]
    CellOnPath { time: u64, cell: Cell },
    #[display("purchase at t={time} names unknown tower {tower}")]
    UnknownTower { time: u64, tower: TowerId },
}

/// What happens to the previous occupant when a tower is bought on an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuyPolicy {
    /// Fraction of the replaced tower's damage patch removed from the damage map.
    pub patch_removal: f64,
    /// Fraction of the replaced tower's cost returned as gold.
    pub refund: f64,
}

impl Default for RebuyPolicy {
    fn default() -> Self {
        Self {
            patch_removal: 1.0,
            refund: 0.0,
        }
    }
}

/// Immutable description of one scenario.
///
/// Built and validated once through [`GameConfig::builder`]; afterwards shared
/// read-only (typically behind an `Arc`) by every candidate.
pub struct GameConfig {
    width: usize,
    height: usize,
    path: Vec<Cell>,
    on_path: Vec<bool>,
    moves: Vec<(Cell, Cell)>,
    towers: TowerCatalog,
    spawn: Box<dyn EnemySpawn>,
    initial_hp: f64,
    initial_gold: f64,
    gold_per_damage: f64,
    rebuy: RebuyPolicy,
}

impl fmt::Debug for GameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("path", &self.path)
            .field("towers", &self.towers.len())
            .field("initial_hp", &self.initial_hp)
            .field("initial_gold", &self.initial_gold)
            .field("gold_per_damage", &self.gold_per_damage)
            .field("rebuy", &self.rebuy)
            .finish_non_exhaustive()
    }
}

impl GameConfig {
    #[must_use]
    pub fn builder(width: usize, height: usize) -> GameConfigBuilder {
        GameConfigBuilder {
            width,
            height,
            path: Vec::new(),
            towers: TowerCatalog::new(),
            spawn: None,
            initial_hp: 0.0,
            initial_gold: 0.0,
            gold_per_damage: DEFAULT_GOLD_PER_DAMAGE,
            rebuy: RebuyPolicy::default(),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Path cells from the enemy entry to the defended base.
    #[must_use]
    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    #[must_use]
    pub fn entry_cell(&self) -> Cell {
        self.path[0]
    }

    #[must_use]
    pub fn base_cell(&self) -> Cell {
        self.path[self.path.len() - 1]
    }

    /// `(to, from)` pairs that shift opponents one cell forward, ordered from the
    /// base back toward the entry so each copy reads a not-yet-overwritten cell.
    #[must_use]
    pub fn moves(&self) -> &[(Cell, Cell)] {
        &self.moves
    }

    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    #[must_use]
    pub fn is_on_path(&self, cell: Cell) -> bool {
        self.contains(cell) && self.on_path[self.cell_index(cell)]
    }

    /// Row-major index of `cell`, for per-cell side tables.
    #[must_use]
    pub fn cell_index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    #[must_use]
    pub fn towers(&self) -> &TowerCatalog {
        &self.towers
    }

    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&TowerType> {
        self.towers.get(id)
    }

    /// Hit points of the wave entering at `time`, clamped to be non-negative.
    pub fn spawn_at(&self, time: u64, rng: &mut dyn RngCore) -> f64 {
        self.spawn.spawn(time, rng).max(0.0)
    }

    #[must_use]
    pub fn initial_hp(&self) -> f64 {
        self.initial_hp
    }

    #[must_use]
    pub fn initial_gold(&self) -> f64 {
        self.initial_gold
    }

    #[must_use]
    pub fn gold_per_damage(&self) -> f64 {
        self.gold_per_damage
    }

    #[must_use]
    pub fn rebuy(&self) -> RebuyPolicy {
        self.rebuy
    }

    /// Checks that `purchase` targets a buildable cell with a catalogued tower.
    pub fn check_purchase(&self, purchase: &Purchase) -> Result<(), ScheduleError> {
        let Purchase { time, cell, tower } = *purchase;
        if !self.contains(cell) {
            return Err(ScheduleError::CellOutOfBounds { time, cell });
        }
        if self.is_on_path(cell) {
            return Err(ScheduleError::CellOnPath { time, cell });
        }
        if self.tower(tower).is_none() {
            return Err(ScheduleError::UnknownTower { time, tower });
        }
        Ok(())
    }

    /// Checks every purchase of a schedule loaded from outside the solver.
    ///
    /// Schedules produced by the evolution operators always pass; a schedule
    /// read from disk may have been computed for a different scenario.
    pub fn validate_schedule(&self, schedule: &Schedule) -> Result<(), ScheduleError> {
        schedule.iter().try_for_each(|p| self.check_purchase(p))
    }
}

pub struct GameConfigBuilder {
    width: usize,
    height: usize,
    path: Vec<Cell>,
    towers: TowerCatalog,
    spawn: Option<Box<dyn EnemySpawn>>,
    initial_hp: f64,
    initial_gold: f64,
    gold_per_damage: f64,
    rebuy: RebuyPolicy,
}

impl GameConfigBuilder {
    #[must_use]
    pub fn path<I>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        self.path = path.into_iter().collect();
        self
    }

    #[must_use]
    pub fn tower(mut self, id: TowerId, tower: TowerType) -> Self {
        self.towers.insert(id, tower);
        self
    }

    #[must_use]
    pub fn towers(mut self, towers: TowerCatalog) -> Self {
        self.towers = towers;
        self
    }

    #[must_use]
    pub fn spawn<S>(mut self, spawn: S) -> Self
    where
        S: EnemySpawn + 'static,
    {
        self.spawn = Some(Box::new(spawn));
        self
    }

    #[must_use]
    pub fn initial_hp(mut self, initial_hp: f64) -> Self {
        self.initial_hp = initial_hp;
        self
    }

    #[must_use]
    pub fn initial_gold(mut self, initial_gold: f64) -> Self {
        self.initial_gold = initial_gold;
        self
    }

    #[must_use]
    pub fn gold_per_damage(mut self, gold_per_damage: f64) -> Self {
        self.gold_per_damage = gold_per_damage;
        self
    }

    #[must_use]
    pub fn rebuy_policy(mut self, rebuy: RebuyPolicy) -> Self {
        self.rebuy = rebuy;
        self
    }

    pub fn build(self) -> Result<GameConfig, ConfigError> {
        let Self {
            width,
            height,
            path,
            towers,
            spawn,
            initial_hp,
            initial_gold,
            gold_per_damage,
            rebuy,
        } = self;

        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyMap { width, height });
        }
        if path.len() < 2 {
            return Err(ConfigError::PathTooShort { len: path.len() });
        }
        let mut on_path = vec![false; width * height];
        let mut seen = HashSet::with_capacity(path.len());
        for &cell in &path {
            if cell.row >= height || cell.col >= width {
                return Err(ConfigError::PathCellOutOfBounds { cell });
            }
            if !seen.insert(cell) {
                return Err(ConfigError::DuplicatePathCell { cell });
            }
            on_path[cell.row * width + cell.col] = true;
        }

        if towers.is_empty() {
            return Err(ConfigError::EmptyTowerCatalog);
        }
        for (id, tower) in towers.iter() {
            validate_tower(id, tower)?;
        }

        if !(initial_hp.is_finite() && initial_hp > 0.0) {
            return Err(ConfigError::InvalidInitialHp { value: initial_hp });
        }
        if !(initial_gold.is_finite() && initial_gold >= 0.0) {
            return Err(ConfigError::InvalidInitialGold {
                value: initial_gold,
            });
        }
        if !(gold_per_damage.is_finite() && gold_per_damage >= 0.0) {
            return Err(ConfigError::InvalidGoldPerDamage {
                value: gold_per_damage,
            });
        }
        for (name, value) in [
            ("patch removal", rebuy.patch_removal),
            ("refund", rebuy.refund),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRebuyFraction { name, value });
            }
        }
        let spawn = spawn.ok_or(ConfigError::MissingSpawn)?;

        let moves = path
            .iter()
            .rev()
            .zip(path.iter().rev().skip(1))
            .map(|(to, from)| (*to, *from))
            .collect();

        Ok(GameConfig {
            width,
            height,
            path,
            on_path,
            moves,
            towers,
            spawn,
            initial_hp,
            initial_gold,
            gold_per_damage,
            rebuy,
        })
    }
}

fn validate_tower(id: TowerId, tower: &TowerType) -> Result<(), ConfigError> {
    if !(tower.cost().is_finite() && tower.cost() > 0.0) {
        return Err(ConfigError::InvalidTowerCost {
            id,
            cost: tower.cost(),
        });
    }
    let kernel = tower.kernel();
    if kernel.height() == 0 || kernel.width() == 0 {
        return Err(ConfigError::InvalidTowerKernel {
            id,
            reason: "kernel is empty",
        });
    }
    if kernel.height() % 2 == 0 || kernel.width() % 2 == 0 {
        return Err(ConfigError::InvalidTowerKernel {
            id,
            reason: "kernel dimensions must be odd",
        });
    }
    if kernel.values().any(|v| !v.is_finite() || v < 0.0) {
        return Err(ConfigError::InvalidTowerKernel {
            id,
            reason: "damage values must be finite and non-negative",
        });
    }
    Ok(())
}
