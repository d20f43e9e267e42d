//! Move search and frame-accurate input synthesis for NES Tetris.
//!
//! The crate is layered bottom-up:
//!
//! - [`core`] - bit-packed [`Board`], [`Piece`] geometry, [`Position`], the
//!   [`Level`] gravity model and [`TapTable`] input timing
//! - [`search`] - tap reachability tables and [`search_moves`], which lists
//!   every placement a piece can reach, with and without adjustment
//! - [`planner`] - Dijkstra planning of the tap/rotation sequence leading to
//!   one placement
//! - [`frames`] - per-frame input sequences: synthesis, simulation,
//!   adjustment scoring and timing noise
//!
//! # Example
//!
//! ```
//! use nestris_engine::{Board, Level, Piece, Position, ReachabilityCache, SearchParams, TapSpeed};
//!
//! let cache = ReachabilityCache::new();
//! let params = SearchParams {
//!     level: Level::Level18,
//!     adj_delay: 0,
//!     taps: TapSpeed::Hz12.table(),
//!     double_tuck: false,
//! };
//! let moves = nestris_engine::search_moves(&cache, &params, &Board::EMPTY, Piece::O);
//! assert!(moves.non_adj.contains(&Position::new(0, 18, 1)));
//! ```

pub use self::{core::*, frames::*, planner::*, search::*};

pub mod core;
pub mod frames;
pub mod planner;
pub mod search;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("board notation must hold a multiple of 10 cells, at most 200 (got {cells})")]
pub struct ParseBoardError {
    pub cells: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("tap frame {index} is less than two frames after the previous tap")]
pub struct TapTableError {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParsePositionError {
    #[display("position must be formatted as 'rot,row,col'")]
    Format,
    #[display("position is outside the board")]
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid frame input '{token}'")]
pub struct ParseFrameSequenceError {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("timing noise deviation must be finite and non-negative (got {stddev_frames})")]
pub struct TimingNoiseError {
    pub stddev_frames: f64,
}
