//! Tap planning toward a single placement.

pub use self::{move_sequence::*, path::*};

pub(crate) mod dijkstra;
pub(crate) mod move_sequence;
pub(crate) mod path;
