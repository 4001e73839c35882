use anyhow::Context as _;
use bastion_engine::{
    Cell, DEFAULT_GOLD_PER_DAMAGE, GameConfig, RebuyPolicy, SpawnCurve, TowerCatalog, TowerType,
};
use bastion_evolution::reproduction::OperatorProbabilities;
use serde::{Deserialize, Serialize};

/// A scenario as stored on disk: map, towers, enemies and operator tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioFile {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Enemy path from entry to base, as `[row, col]` pairs.
    pub path: Vec<Cell>,
    pub towers: TowerCatalog,
    pub spawn: SpawnCurve,
    pub initial_hp: f64,
    pub initial_gold: f64,
    #[serde(default = "default_gold_per_damage")]
    pub gold_per_damage: f64,
    #[serde(default)]
    pub rebuy: RebuyPolicy,
    #[serde(default)]
    pub operators: OperatorProbabilities,
}

fn default_gold_per_damage() -> f64 {
    DEFAULT_GOLD_PER_DAMAGE
}

impl ScenarioFile {
    /// The 9x8 map with twelve tower types that ships with the binary.
    pub fn reference() -> Self {
        let path = [
            (1, 8),
            (1, 7),
            (1, 6),
            (1, 5),
            (1, 4),
            (2, 4),
            (3, 4),
            (4, 4),
            (4, 3),
            (4, 2),
            (4, 1),
            (4, 0),
        ]
        .into_iter()
        .map(|(row, col)| Cell::new(row, col))
        .collect();

        let towers = [
            TowerType::filled(3, 5.0, 200.0),
            TowerType::filled(3, 15.0, 700.0),
            TowerType::filled(3, 40.0, 2000.0),
            TowerType::filled(5, 10.0, 500.0),
            TowerType::filled(5, 18.0, 1200.0),
            TowerType::filled(5, 25.0, 2000.0),
            TowerType::ring(5, 10.0, 700.0),
            TowerType::ring(5, 20.0, 1900.0),
            TowerType::ring(5, 35.0, 4000.0),
            TowerType::ring(7, 15.0, 2000.0),
            TowerType::ring(7, 25.0, 4200.0),
            TowerType::ring(7, 40.0, 6800.0),
        ]
        .into_iter()
        .zip(0..)
        .map(|(tower, id)| (id, tower))
        .collect();

        Self {
            name: "reference".to_owned(),
            width: 9,
            height: 8,
            path,
            towers,
            spawn: SpawnCurve::Linear { rate: 4.0 },
            initial_hp: 100.0,
            initial_gold: 2000.0,
            gold_per_damage: DEFAULT_GOLD_PER_DAMAGE,
            rebuy: RebuyPolicy::default(),
            operators: OperatorProbabilities {
                binary: 0.4,
                unary_weights: vec![0.75, 0.06, 0.07, 0.07, 0.05],
                binary_weights: vec![1.0],
            },
        }
    }

    pub fn to_game_config(&self) -> anyhow::Result<GameConfig> {
        GameConfig::builder(self.width, self.height)
            .path(self.path.iter().copied())
            .towers(self.towers.clone())
            .spawn(self.spawn.clone())
            .initial_hp(self.initial_hp)
            .initial_gold(self.initial_gold)
            .gold_per_damage(self.gold_per_damage)
            .rebuy_policy(self.rebuy)
            .build()
            .with_context(|| format!("Invalid scenario `{}`", self.name))
    }
}
