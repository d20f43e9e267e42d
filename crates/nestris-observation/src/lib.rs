//! Fixed-layout feature tensors describing a NES Tetris decision point.
//!
//! An [`Observation`] packs the board, the placements found by
//! [`nestris_engine::search_moves`] and game progress into flat arrays of
//! fixed shape, ready to be fed to a policy network.

pub use self::{move_map::*, observation::*, progress::*};

mod move_map;
mod observation;
mod progress;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ObservationError {
    /// The current piece has no placement at all.
    #[display("game over: the piece has no placement")]
    GameOver,
    #[display("premove {premove} is not a placement of the piece")]
    PremoveNotFound { premove: nestris_engine::Position },
}
