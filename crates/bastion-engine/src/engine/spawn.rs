use rand::RngCore;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};

/// Enemy growth: the total hit points of the wave entering the path at `time`.
///
/// Implementations may be stochastic; they must draw randomness only from the
/// provided `rng` so that seeded runs replay identically. Negative values are
/// treated as zero by the simulation.
///
/// Any `Fn(u64) -> f64` closure is an `EnemySpawn`:
///
/// ```
/// use bastion_engine::EnemySpawn;
///
/// let spawn = |time: u64| 4.0 * time as f64;
/// assert_eq!(spawn.spawn(3, &mut rand::rng()), 12.0);
/// ```
pub trait EnemySpawn: Send + Sync {
    fn spawn(&self, time: u64, rng: &mut dyn RngCore) -> f64;
}

impl<F> EnemySpawn for F
where
    F: Fn(u64) -> f64 + Send + Sync,
{
    fn spawn(&self, time: u64, _rng: &mut dyn RngCore) -> f64 {
        self(time)
    }
}

/// Ready-made spawn curves, selectable from scenario files.
///
/// All curves are truncated to whole hit points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnCurve {
    /// `value` at every step.
    Constant { value: f64 },
    /// `rate * t`.
    Linear { rate: f64 },
    /// `|rate * t + amplitude * sin(t)|`.
    Oscillating { rate: f64, amplitude: f64 },
    /// `|N(rate * t, base_std_dev + std_dev_rate * t)|`.
    NoisyLinear {
        rate: f64,
        base_std_dev: f64,
        std_dev_rate: f64,
    },
    /// `sqrt(scale * t)`.
    SquareRoot { scale: f64 },
}

impl EnemySpawn for SpawnCurve {
    #[expect(clippy::cast_precision_loss)]
    fn spawn(&self, time: u64, rng: &mut dyn RngCore) -> f64 {
        let t = time as f64;
        let value = match *self {
            SpawnCurve::Constant { value } => value,
            SpawnCurve::Linear { rate } => rate * t,
            SpawnCurve::Oscillating { rate, amplitude } => (rate * t + amplitude * t.sin()).abs(),
            SpawnCurve::NoisyLinear {
                rate,
                base_std_dev,
                std_dev_rate,
            } => {
                let mean = rate * t;
                Normal::new(mean, base_std_dev + std_dev_rate * t)
                    .map_or(mean, |normal| normal.sample(rng))
                    .abs()
            }
            SpawnCurve::SquareRoot { scale } => (scale * t).max(0.0).sqrt(),
        };
        value.trunc().max(0.0)
    }
}
