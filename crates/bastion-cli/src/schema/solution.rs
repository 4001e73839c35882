use bastion_engine::{Grid, Purchase, Schedule};
use bastion_evolution::solver::{GenerationRecord, SolveParams, Solution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outcome of `bastion solve`, as written to disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolutionRecord {
    pub scenario: String,
    pub solved_at: DateTime<Utc>,
    pub seed: u64,
    pub params: SolveParams,
    pub fitness: u64,
    pub schedule: Schedule,
    /// Purchases postponed at least once for lack of gold during the scoring run.
    pub deferred: Vec<Purchase>,
    pub damage_map: Grid,
    pub history: Vec<GenerationRecord>,
}

impl SolutionRecord {
    pub fn new(scenario: &str, seed: u64, params: SolveParams, solution: Solution) -> Self {
        let Solution { best, history } = solution;
        Self {
            scenario: scenario.to_owned(),
            solved_at: Utc::now(),
            seed,
            params,
            fitness: best.fitness().unwrap_or_else(|| best.time()),
            schedule: best.genotype().clone(),
            deferred: best.deferred().to_vec(),
            damage_map: best.damage_map().clone(),
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bastion_engine::Candidate;
    use bastion_evolution::solver::Solver;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use crate::schema::scenario::ScenarioFile;

    use super::*;

    #[test]
    fn test_saved_schedule_replays_to_saved_fitness() {
        let scenario = ScenarioFile::reference();
        let config = Arc::new(scenario.to_game_config().unwrap());
        let solver = Solver::new(Arc::clone(&config), &scenario.operators).unwrap();
        let params = SolveParams {
            epochs: 2,
            candidate_pool: 8,
            reincarnation_budget: 1,
            survivors_per_epoch: 3,
            step_limit: Some(20_000),
            ..SolveParams::default()
        };
        let solution = solver
            .solve(&params, &mut Pcg64::seed_from_u64(5))
            .unwrap();
        let record = SolutionRecord::new(&scenario.name, 5, params, solution);

        let json = serde_json::to_string(&record).unwrap();
        let loaded: SolutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.schedule, record.schedule);
        assert_eq!(loaded.params, record.params);

        let mut candidate = Candidate::new(config, loaded.schedule);
        let survived = candidate.run_to_death(loaded.params.step_limit, &mut Pcg64::seed_from_u64(0));
        assert_eq!(survived, record.fitness);
    }
}
