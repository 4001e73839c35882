//! Game rules and the candidate simulation.
//!
//! - [`GameConfig`] - validated, immutable description of one scenario (map,
//!   path, tower catalog, spawn curve, economy)
//! - [`EnemySpawn`] / [`SpawnCurve`] - pluggable enemy growth over time
//! - [`placement`] - sampling legal tower positions near the path
//! - [`Candidate`] - one purchase schedule together with its simulation state
//!
//! # Simulation Step
//!
//! Every call to [`Candidate::step`] runs the same fixed sequence:
//!
//! 1. Opponents take damage from the damage map, gold is earned for damage dealt
//! 2. The base takes damage equal to the hit points standing on the last path cell
//! 3. Purchases due at the current time are executed, or postponed by one step
//!    when unaffordable
//! 4. Opponents advance one cell along the path and a new wave enters
//! 5. Time advances
//!
//! The order matters: changing it changes survival times.

pub use self::{candidate::*, config::*, spawn::*};

mod candidate;
mod config;
pub mod placement;
mod spawn;
