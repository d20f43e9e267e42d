//! Placement search.
//!
//! [`ReachabilityTable`]s hold every tap path for a `(level, delay, taps)`
//! combination independently of the board and are shared through a
//! [`ReachabilityCache`]. [`search_moves`] checks those paths against a board
//! and extends them with [`Tuck`]s.

pub use self::{cache::*, moves::*, reachability::*, tuck::*};

pub(crate) mod cache;
pub(crate) mod moves;
pub(crate) mod reachability;
pub(crate) mod tuck;
