//! Refilling a generation from its survivors.

use std::sync::Arc;

use bastion_engine::{Candidate, GameConfig};
use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};

use crate::{
    operators::{BinaryOperator, UnaryOperator},
    population,
    selection::{ParentSampler, SelectionWeighting},
};

/// Operator applications attempted per missing offspring before the remaining
/// slots are filled with random schedules.
pub const MAX_ATTEMPTS_PER_OFFSPRING: usize = 100;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum OperatorConfigError {
    #[display("binary operator probability must lie in [0, 1] (got {value})")]
    BinaryProbability { value: f64 },
    #[display("expected {expected} {class} operator weights (got {len})")]
    WeightCount {
        class: &'static str,
        expected: usize,
        len: usize,
    },
    #[display("{class} operator weights must be finite, non-negative and not all zero")]
    Weights { class: &'static str },
}

/// How often each genetic operator is chosen.
///
/// `binary` is the probability of picking a two-parent operator; the weight
/// vectors are indexed like [`UnaryOperator::ALL`] and [`BinaryOperator::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorProbabilities {
    pub binary: f64,
    pub unary_weights: Vec<f64>,
    pub binary_weights: Vec<f64>,
}

impl Default for OperatorProbabilities {
    fn default() -> Self {
        Self {
            binary: 0.5,
            unary_weights: vec![1.0; UnaryOperator::ALL.len()],
            binary_weights: vec![1.0; BinaryOperator::ALL.len()],
        }
    }
}

impl OperatorProbabilities {
    /// Validates the probabilities and builds the samplers used by [`reproduce`].
    pub fn sampler(&self) -> Result<OperatorSampler, OperatorConfigError> {
        if !(0.0..=1.0).contains(&self.binary) {
            return Err(OperatorConfigError::BinaryProbability { value: self.binary });
        }
        let unary = weighted("unary", &self.unary_weights, UnaryOperator::ALL.len())?;
        let binary = weighted("binary", &self.binary_weights, BinaryOperator::ALL.len())?;
        Ok(OperatorSampler {
            binary_probability: self.binary,
            unary,
            binary,
        })
    }
}

fn weighted(
    class: &'static str,
    weights: &[f64],
    expected: usize,
) -> Result<WeightedIndex<f64>, OperatorConfigError> {
    if weights.len() != expected {
        return Err(OperatorConfigError::WeightCount {
            class,
            expected,
            len: weights.len(),
        });
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(OperatorConfigError::Weights { class });
    }
    WeightedIndex::new(weights).map_err(|_| OperatorConfigError::Weights { class })
}

/// Validated operator distributions.
#[derive(Debug, Clone)]
pub struct OperatorSampler {
    binary_probability: f64,
    unary: WeightedIndex<f64>,
    binary: WeightedIndex<f64>,
}

impl OperatorSampler {
    fn unary<R>(&self, rng: &mut R) -> UnaryOperator
    where
        R: Rng + ?Sized,
    {
        UnaryOperator::ALL[self.unary.sample(rng)]
    }

    fn binary<R>(&self, rng: &mut R) -> BinaryOperator
    where
        R: Rng + ?Sized,
    {
        BinaryOperator::ALL[self.binary.sample(rng)]
    }
}

#[derive(Debug)]
pub struct Offspring {
    pub candidates: Vec<Candidate>,
    /// Slots filled with random schedules after the attempt budget ran out.
    pub fallbacks: usize,
}

/// Produces `count` children from `parents`.
///
/// Parents are weighted by their last measured fitness, or by their current
/// time if they have not been scored yet.
///
/// Each attempt picks a binary operator with the configured probability (when
/// at least two parents exist) and a unary one otherwise; attempts whose
/// operator yields no child are retried. After
/// `count * MAX_ATTEMPTS_PER_OFFSPRING` attempts the missing children are
/// replaced by random schedules.
pub fn reproduce<R>(
    config: &Arc<GameConfig>,
    parents: &[Candidate],
    count: usize,
    weighting: SelectionWeighting,
    operators: &OperatorSampler,
    rng: &mut R,
) -> Offspring
where
    R: Rng + ?Sized,
{
    let times = parents
        .iter()
        .map(|parent| parent.fitness().unwrap_or_else(|| parent.time()))
        .collect::<Vec<_>>();
    let selector = ParentSampler::new(weighting, &times);

    let mut candidates = Vec::with_capacity(count);
    let max_attempts = count.saturating_mul(MAX_ATTEMPTS_PER_OFFSPRING);
    let mut attempts = 0;
    while candidates.len() < count && attempts < max_attempts && !selector.is_empty() {
        attempts += 1;
        let use_binary = parents.len() >= 2 && rng.random_bool(operators.binary_probability);
        let child = if use_binary {
            let Some((first, second)) = selector.sample_pair(rng) else {
                continue;
            };
            operators
                .binary(rng)
                .apply(&parents[first], &parents[second], rng)
        } else {
            let Some(parent) = selector.sample(rng) else {
                continue;
            };
            operators.unary(rng).apply(&parents[parent], rng)
        };
        candidates.extend(child);
    }

    let fallbacks = count - candidates.len();
    if fallbacks > 0 {
        tracing::warn!(
            fallbacks,
            attempts,
            parents = parents.len(),
            "operators failed to fill the generation; adding random schedules"
        );
        candidates.extend(population::random_population(config, fallbacks, rng));
    }
    Offspring {
        candidates,
        fallbacks,
    }
}
