//! Evolutionary search for tower purchase schedules.
//!
//! This crate evolves populations of [`Candidate`](bastion_engine::Candidate)s,
//! each holding a purchase schedule, to maximize how long the defended base
//! survives. Fitness is the survival time measured by the engine's simulation.
//!
//! # How a Generation Works
//!
//! 1. **Initial population** - The first generation is sampled greedily: random
//!    affordable towers at random positions near the path until the starting gold
//!    runs out ([`population::random_schedule`])
//! 2. **Lock-step culling** - All candidates are stepped together; the first
//!    deaths are *reincarnated* from a random living candidate, later deaths are
//!    removed, until enough candidates have died
//! 3. **Reproduction** - Survivors are refilled back to the pool size using
//!    unary and binary genetic operators ([`operators`]) on parents drawn by the
//!    configured [`SelectionWeighting`](selection::SelectionWeighting)
//! 4. **Replay** - Every candidate is simulated from scratch to death; the best
//!    schedule ever seen is kept as an independent copy
//!
//! ```text
//! Solver::solve
//!     ↓ per generation
//! lock-step simulation ──→ reincarnation / removal
//!     ↓ survivors
//! reproduction (operators + selection)
//!     ↓ full population
//! replay to death ──→ best-ever snapshot, GenerationRecord
//! ```
//!
//! # Termination
//!
//! Every retry loop is bounded. The placement sampler and crossover give up after
//! a fixed number of draws and report "no result"; reproduction gives up after
//! [`reproduction::MAX_ATTEMPTS_PER_OFFSPRING`] attempts per missing offspring and
//! fills the remaining slots with freshly sampled random schedules.
//!
//! The lock-step and replay phases run until candidates die. A population that
//! never dies only terminates if [`SolveParams::step_limit`](solver::SolveParams)
//! is set.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bastion_engine::{Cell, GameConfig, SpawnCurve, TowerType};
//! use bastion_evolution::{
//!     reproduction::OperatorProbabilities,
//!     solver::{SolveParams, Solver},
//! };
//! use rand::SeedableRng as _;
//!
//! let config = GameConfig::builder(9, 4)
//!     .path((0..9).map(|col| Cell::new(1, col)))
//!     .tower(0, TowerType::filled(3, 5.0, 200.0))
//!     .tower(1, TowerType::filled(3, 15.0, 700.0))
//!     .spawn(SpawnCurve::Linear { rate: 4.0 })
//!     .initial_hp(100.0)
//!     .initial_gold(1000.0)
//!     .build()
//!     .unwrap();
//!
//! let solver = Solver::new(Arc::new(config), &OperatorProbabilities::default()).unwrap();
//! let params = SolveParams {
//!     epochs: 3,
//!     candidate_pool: 10,
//!     survivors_per_epoch: 4,
//!     ..SolveParams::default()
//! };
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(1);
//! let solution = solver.solve(&params, &mut rng).unwrap();
//! assert_eq!(solution.history.len(), 3);
//! ```

pub mod operators;
pub mod population;
pub mod reproduction;
pub mod selection;
pub mod solver;
