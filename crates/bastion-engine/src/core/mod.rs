//! Plain data types shared by the simulation and the search.
//!
//! - [`Cell`] - a `(row, col)` coordinate on the map
//! - [`Grid`] - a dense row-major matrix of `f64` (hit points, damage, kernels)
//! - [`TowerType`] / [`TowerCatalog`] - purchasable units with their damage kernel and cost
//! - [`Purchase`] / [`Schedule`] - what to buy, where, and when
//!
//! None of these types know about the rules of the game; they are validated and
//! combined by [`crate::engine`].

pub use self::{cell::*, grid::*, schedule::*, tower::*};

mod cell;
mod grid;
mod schedule;
mod tower;
