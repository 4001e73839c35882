//! Discrete-time tower-defence simulation used to score purchase schedules.
//!
//! The crate is split the same way the simulation is layered:
//!
//! - [`core`] - plain data: grid cells, damage grids, tower types and purchase schedules
//! - [`engine`] - validated game configuration, enemy spawn curves, the placement sampler
//!   and the [`Candidate`] simulation itself
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bastion_engine::{Candidate, Cell, GameConfig, Purchase, Schedule, SpawnCurve, TowerType};
//! use rand::SeedableRng as _;
//!
//! let config = GameConfig::builder(7, 2)
//!     .path((0..7).map(|col| Cell::new(0, col)))
//!     .tower(0, TowerType::filled(3, 20.0, 50.0))
//!     .spawn(SpawnCurve::Constant { value: 10.0 })
//!     .initial_hp(100.0)
//!     .initial_gold(100.0)
//!     .build()
//!     .unwrap();
//!
//! let schedule = Schedule::from(vec![Purchase::new(0, Cell::new(1, 3), 0)]);
//! let mut candidate = Candidate::new(Arc::new(config), schedule);
//!
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(0);
//! let survived = candidate.run_to_death(Some(500), &mut rng);
//! assert_eq!(survived, 500);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
