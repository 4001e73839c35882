//! The generational search loop.

use std::sync::Arc;

use bastion_engine::{Candidate, GameConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    population,
    reproduction::{self, OperatorConfigError, OperatorProbabilities, OperatorSampler},
    selection::SelectionWeighting,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SolveError {
    #[display("invalid operator probabilities: {source}")]
    Operators { source: OperatorConfigError },
    #[display("at least one epoch is required")]
    NoEpochs,
    #[display("candidate pool must hold at least 2 candidates (got {pool})")]
    PoolTooSmall { pool: usize },
    #[display("survivors per epoch must be between 1 and the candidate pool size {pool} (got {survivors})")]
    InvalidSurvivors { survivors: usize, pool: usize },
}

/// Run-time parameters of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveParams {
    /// Number of generations.
    pub epochs: usize,
    /// Population size at generation boundaries.
    pub candidate_pool: usize,
    /// Deaths per generation that are reincarnated instead of removed.
    pub reincarnation_budget: usize,
    /// Candidates left alive when the lock-step phase ends.
    pub survivors_per_epoch: usize,
    pub weighting: SelectionWeighting,
    /// Caps both the lock-step phase and every replay.
    ///
    /// Without a limit, a population whose schedules never die keeps the search
    /// running forever.
    pub step_limit: Option<u64>,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            epochs: 100,
            candidate_pool: 100,
            reincarnation_budget: 0,
            survivors_per_epoch: 20,
            weighting: SelectionWeighting::Uniform,
            step_limit: None,
        }
    }
}

impl SolveParams {
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.epochs == 0 {
            return Err(SolveError::NoEpochs);
        }
        if self.candidate_pool < 2 {
            return Err(SolveError::PoolTooSmall {
                pool: self.candidate_pool,
            });
        }
        if self.survivors_per_epoch == 0 || self.survivors_per_epoch > self.candidate_pool {
            return Err(SolveError::InvalidSurvivors {
                survivors: self.survivors_per_epoch,
                pool: self.candidate_pool,
            });
        }
        Ok(())
    }

    /// Deaths the lock-step phase waits for.
    #[must_use]
    pub fn deaths_per_epoch(&self) -> usize {
        self.candidate_pool + self.reincarnation_budget - self.survivors_per_epoch
    }
}

/// Summary of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Time reached when the lock-step phase stopped.
    pub threshold_time: u64,
    pub reincarnations: usize,
    /// Offspring replaced by random schedules because operators kept failing.
    pub fallback_offspring: usize,
    pub population: usize,
    pub min_fitness: u64,
    pub mean_fitness: f64,
    pub max_fitness: u64,
    /// Best fitness seen in this or any earlier generation.
    pub best_fitness: u64,
}

#[derive(Debug, Clone)]
pub struct Solution {
    /// Snapshot of the best candidate, taken right after its scoring replay.
    pub best: Candidate,
    pub history: Vec<GenerationRecord>,
}

/// Result of the lock-step phase.
struct Cull {
    survivors: Vec<Candidate>,
    threshold_time: u64,
    reincarnations: usize,
}

#[derive(Debug)]
pub struct Solver {
    config: Arc<GameConfig>,
    operators: OperatorSampler,
}

impl Solver {
    /// Fails if the operator probabilities cannot be sampled from.
    pub fn new(
        config: Arc<GameConfig>,
        probabilities: &OperatorProbabilities,
    ) -> Result<Self, SolveError> {
        let operators = probabilities
            .sampler()
            .map_err(|source| SolveError::Operators { source })?;
        Ok(Self { config, operators })
    }

    #[must_use]
    pub fn config(&self) -> &Arc<GameConfig> {
        &self.config
    }

    /// Runs `params.epochs` generations and returns the best candidate found.
    ///
    /// # Arguments
    ///
    /// * `params` - Population sizes, epoch count and selection weighting
    /// * `rng` - Random source for the initial population, spawns and operators
    ///
    /// # Returns
    ///
    /// The best candidate, replayed from scratch so its fitness is the full
    /// survival time, together with one [`GenerationRecord`] per epoch.
    /// Fails with [`SolveError`] when `params` is inconsistent.
    pub fn solve<R>(&self, params: &SolveParams, rng: &mut R) -> Result<Solution, SolveError>
    where
        R: Rng,
    {
        params.validate()?;

        let mut population =
            population::random_population(&self.config, params.candidate_pool, rng);
        let mut best: Option<Candidate> = None;
        let mut history = Vec::with_capacity(params.epochs);

        for generation in 0..params.epochs {
            let cull = self.cull(population, params, rng);
            let offspring = reproduction::reproduce(
                &self.config,
                &cull.survivors,
                params.candidate_pool - cull.survivors.len(),
                params.weighting,
                &self.operators,
                rng,
            );
            population = cull.survivors;
            population.extend(offspring.candidates);

            let fitness = Self::replay(&mut population, params.step_limit, &mut best, rng);
            let best_fitness = best.as_ref().and_then(Candidate::fitness).unwrap_or(0);
            let record = GenerationRecord {
                generation,
                threshold_time: cull.threshold_time,
                reincarnations: cull.reincarnations,
                fallback_offspring: offspring.fallbacks,
                population: population.len(),
                min_fitness: fitness.iter().copied().min().unwrap_or(0),
                mean_fitness: mean(&fitness),
                max_fitness: fitness.iter().copied().max().unwrap_or(0),
                best_fitness,
            };
            tracing::info!(
                generation,
                threshold_time = record.threshold_time,
                reincarnations = record.reincarnations,
                mean_fitness = record.mean_fitness,
                best_fitness,
                "generation complete"
            );
            history.push(record);
        }

        let best = best.unwrap_or_else(|| population.swap_remove(0));
        Ok(Solution { best, history })
    }

    /// Steps all candidates in lock-step until enough of them have died.
    fn cull<R>(&self, mut population: Vec<Candidate>, params: &SolveParams, rng: &mut R) -> Cull
    where
        R: Rng,
    {
        let must_die = params.deaths_per_epoch();
        let mut alive = vec![true; population.len()];
        let mut deaths = 0;
        let mut reincarnations = 0;
        let mut rounds = 0;

        'rounds: while deaths < must_die && alive.contains(&true) {
            if params.step_limit.is_some_and(|limit| rounds >= limit) {
                break;
            }
            rounds += 1;
            for idx in 0..population.len() {
                if !alive[idx] {
                    continue;
                }
                population[idx].step(rng);
                if !population[idx].is_dead() {
                    continue;
                }
                deaths += 1;
                let donor = (reincarnations < params.reincarnation_budget)
                    .then(|| random_living_other(&alive, idx, rng))
                    .flatten();
                if let Some(donor) = donor {
                    let donor = population[donor].clone();
                    let pending = population::reincarnation_schedule(&donor, rng);
                    tracing::debug!(
                        candidate = idx,
                        time = donor.time(),
                        pending = pending.len(),
                        "reincarnating"
                    );
                    population[idx].reincarnate_from(&donor, pending);
                    reincarnations += 1;
                } else {
                    alive[idx] = false;
                }
                if deaths >= must_die {
                    break 'rounds;
                }
            }
        }

        let survivors = population
            .into_iter()
            .zip(alive)
            .filter_map(|(candidate, alive)| alive.then_some(candidate))
            .collect::<Vec<_>>();
        let threshold_time = survivors.iter().map(Candidate::time).max().unwrap_or(rounds);
        Cull {
            survivors,
            threshold_time,
            reincarnations,
        }
    }

    /// Scores every candidate from scratch and updates the best-ever snapshot.
    ///
    /// Returns the fitness of each candidate in population order.
    fn replay<R>(
        population: &mut [Candidate],
        step_limit: Option<u64>,
        best: &mut Option<Candidate>,
        rng: &mut R,
    ) -> Vec<u64>
    where
        R: Rng,
    {
        let mut fitness = Vec::with_capacity(population.len());
        for candidate in population {
            candidate.refresh();
            let survived = candidate.run_to_death(step_limit, rng);
            let best_so_far = best.as_ref().and_then(Candidate::fitness);
            if best_so_far.is_none_or(|best| survived > best) {
                *best = Some(candidate.clone());
            }
            candidate.refresh();
            fitness.push(survived);
        }
        fitness
    }
}

fn random_living_other<R>(alive: &[bool], dead: usize, rng: &mut R) -> Option<usize>
where
    R: Rng,
{
    let others = alive
        .iter()
        .enumerate()
        .filter(|&(idx, &alive)| alive && idx != dead)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    if others.is_empty() {
        return None;
    }
    Some(others[rng.random_range(0..others.len())])
}

#[expect(clippy::cast_precision_loss)]
fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}
