use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Cell, Grid};

pub type TowerId = u32;

/// A purchasable unit: a damage kernel and its price.
///
/// The kernel is centered on the tower's cell; each value is the damage dealt
/// per step to opponents standing on the corresponding cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerType {
    kernel: Grid,
    cost: f64,
}

impl TowerType {
    #[must_use]
    pub fn new(kernel: Grid, cost: f64) -> Self {
        Self { kernel, cost }
    }

    /// A square kernel of side `size` dealing `damage` on every cell.
    #[must_use]
    pub fn filled(size: usize, damage: f64, cost: f64) -> Self {
        Self::new(Grid::filled(size, size, damage), cost)
    }

    /// A square kernel of side `size` dealing `damage` only on its outer ring.
    #[must_use]
    pub fn ring(size: usize, damage: f64, cost: f64) -> Self {
        let last = size.saturating_sub(1);
        let kernel = Grid::from_fn(size, size, |row, col| {
            if row == 0 || col == 0 || row == last || col == last {
                damage
            } else {
                0.0
            }
        });
        Self::new(kernel, cost)
    }

    #[must_use]
    pub fn kernel(&self) -> &Grid {
        &self.kernel
    }

    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Half the kernel size as `(rows, cols)`, rounded down.
    #[must_use]
    pub fn radius(&self) -> (usize, usize) {
        (self.kernel.height() / 2, self.kernel.width() / 2)
    }

    /// Returns a `height` x `width` grid holding this tower's kernel centered on
    /// `cell`, clipped at the map boundary.
    #[must_use]
    pub fn damage_patch(&self, cell: Cell, height: usize, width: usize) -> Grid {
        let mut patch = Grid::zeros(height, width);
        patch.add_kernel(&self.kernel, cell, 1.0);
        patch
    }
}

/// The towers available for purchase, keyed by id.
///
/// Iteration is ordered by id so seeded searches are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerCatalog {
    towers: BTreeMap<TowerId, TowerType>,
}

impl TowerCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TowerId, tower: TowerType) -> Option<TowerType> {
        self.towers.insert(id, tower)
    }

    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerType> {
        self.towers.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.towers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TowerId, &TowerType)> + '_ {
        self.towers.iter().map(|(id, tower)| (*id, tower))
    }

    /// Towers whose cost does not exceed `gold`.
    pub fn affordable(&self, gold: f64) -> impl Iterator<Item = (TowerId, &TowerType)> + '_ {
        self.iter().filter(move |(_, tower)| tower.cost <= gold)
    }

    /// Towers costing at least as much as tower `id` (including itself).
    pub fn upgrades_of(&self, id: TowerId) -> impl Iterator<Item = (TowerId, &TowerType)> + '_ {
        let floor = self.get(id).map_or(f64::INFINITY, TowerType::cost);
        self.iter().filter(move |(_, tower)| tower.cost >= floor)
    }
}

impl FromIterator<(TowerId, TowerType)> for TowerCatalog {
    fn from_iter<T: IntoIterator<Item = (TowerId, TowerType)>>(iter: T) -> Self {
        Self {
            towers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_kernel_has_hollow_center() {
        let tower = TowerType::ring(5, 10.0, 700.0);
        let kernel = tower.kernel();
        assert_eq!(kernel[Cell::new(0, 0)], 10.0);
        assert_eq!(kernel[Cell::new(4, 2)], 10.0);
        assert_eq!(kernel[Cell::new(2, 2)], 0.0);
        assert_eq!(kernel[Cell::new(1, 3)], 0.0);
        assert_eq!(kernel.sum(), 160.0);
        assert_eq!(tower.radius(), (2, 2));
    }

    #[test]
    fn test_damage_patch_clipped() {
        let tower = TowerType::filled(3, 5.0, 200.0);
        let patch = tower.damage_patch(Cell::new(0, 3), 3, 4);
        assert_eq!(patch.height(), 3);
        assert_eq!(patch.width(), 4);
        assert_eq!(patch.sum(), 20.0);
        assert_eq!(patch[Cell::new(1, 2)], 5.0);
        assert_eq!(patch[Cell::new(2, 3)], 0.0);
    }

    #[test]
    fn test_catalog_filters() {
        let catalog: TowerCatalog = [
            (0, TowerType::filled(3, 5.0, 200.0)),
            (1, TowerType::filled(3, 15.0, 700.0)),
            (2, TowerType::filled(5, 10.0, 500.0)),
        ]
        .into_iter()
        .collect();

        let affordable: Vec<_> = catalog.affordable(500.0).map(|(id, _)| id).collect();
        assert_eq!(affordable, vec![0, 2]);

        let upgrades: Vec<_> = catalog.upgrades_of(2).map(|(id, _)| id).collect();
        assert_eq!(upgrades, vec![1, 2]);

        assert_eq!(catalog.upgrades_of(9).count(), 0);
    }
}
