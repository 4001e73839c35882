use std::{path::PathBuf, sync::Arc};

use bastion_evolution::{
    selection::SelectionWeighting,
    solver::{SolveParams, Solver},
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64;

use crate::{
    schema::solution::SolutionRecord,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SolveArg {
    /// Scenario file (JSON); the built-in reference scenario when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Number of generations
    #[arg(long, default_value_t = 20)]
    epochs: usize,
    /// Population size
    #[arg(long, default_value_t = 100)]
    pool: usize,
    /// Early deaths per generation that get a second life
    #[arg(long, default_value_t = 3)]
    reincarnation: usize,
    /// Candidates kept alive per generation
    #[arg(long, default_value_t = 20)]
    survivors: usize,
    /// How parents are weighted: time, order or uniform
    #[arg(long, default_value = "time")]
    weighted_by: SelectionWeighting,
    /// Seed for the random number generator; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Stop every simulation after this many steps
    #[arg(long)]
    step_limit: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SolveArg) -> anyhow::Result<()> {
    let SolveArg {
        scenario,
        epochs,
        pool,
        reincarnation,
        survivors,
        weighted_by,
        seed,
        step_limit,
        output,
    } = arg;

    let scenario = util::load_scenario(scenario.as_ref())?;
    let config = Arc::new(scenario.to_game_config()?);
    let solver = Solver::new(Arc::clone(&config), &scenario.operators)?;
    let params = SolveParams {
        epochs: *epochs,
        candidate_pool: *pool,
        reincarnation_budget: *reincarnation,
        survivors_per_epoch: *survivors,
        weighting: *weighted_by,
        step_limit: *step_limit,
    };
    params.validate()?;

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    eprintln!(
        "Solving scenario `{}` ({}x{}, {} tower types) with seed {seed}",
        scenario.name,
        config.width(),
        config.height(),
        config.towers().len(),
    );
    let mut rng = Pcg64::seed_from_u64(seed);
    let solution = solver.solve(&params, &mut rng)?;
    let record = SolutionRecord::new(&scenario.name, seed, params, solution);
    Output::save_json(&record, output.clone())?;

    eprintln!();
    eprintln!("Solution saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Solved at: {}", record.solved_at);
    eprintln!("  Survival time: {}", record.fitness);
    eprintln!("  Purchases: {}", record.schedule.len());
    eprintln!("  Deferred purchases: {}", record.deferred.len());
    if let Some(last) = record.history.last() {
        eprintln!(
            "  Last generation: min {} / mean {:.1} / max {}",
            last.min_fitness, last.mean_fitness, last.max_fitness
        );
    }
    util::print_grid("Damage map", &record.damage_map);

    Ok(())
}
