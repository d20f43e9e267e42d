//! Per-frame input sequences.
//!
//! Sequences come from three sources: [`synthesize_frames`] schedules a
//! planned [`MoveSequence`](crate::MoveSequence) at a tap rate,
//! [`frame_sequence_start`]/[`frame_sequence_adj`] rebuild the committed
//! taps and tucks the search found, and [`no_rotation_sequence`] shifts and
//! soft-drops a piece without rotating it. [`simulate`] replays any of them.

pub use self::{
    adjustment::*, direct::*, frame_input::*, no_rotation::*, noise::*, simulate::*,
    synthesize::*,
};

pub(crate) mod adjustment;
pub(crate) mod direct;
pub(crate) mod frame_input;
pub(crate) mod no_rotation;
pub(crate) mod noise;
pub(crate) mod simulate;
pub(crate) mod synthesize;
