use std::fmt;

use serde::{Deserialize, Serialize};

/// One tap of a planned path.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    derive_more::Display,
)]
pub enum MoveType {
    /// Rotate clockwise.
    #[display("A")]
    RotateCw,
    /// Rotate counterclockwise.
    #[display("B")]
    RotateCcw,
    #[display("L")]
    Left,
    #[display("R")]
    Right,
}

impl MoveType {
    #[must_use]
    pub const fn is_rotation(self) -> bool {
        matches!(self, Self::RotateCw | Self::RotateCcw)
    }

    #[must_use]
    pub const fn is_shift(self) -> bool {
        !self.is_rotation()
    }
}

/// A tap and the rows it may happen on.
///
/// `row_start` is the highest (earliest) row the tap can happen on,
/// `row_end` the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Move {
    pub kind: MoveType,
    pub row_start: usize,
    pub row_end: usize,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row_start == self.row_end {
            write!(f, "{}@{}", self.kind, self.row_start)
        } else {
            write!(f, "{}@{}-{}", self.kind, self.row_start, self.row_end)
        }
    }
}

/// Ordered taps leading to a target pose.
///
/// An invalid sequence means there is no path; a valid empty one means the
/// start already is the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoveSequence {
    valid: bool,
    pub moves: Vec<Move>,
}

impl MoveSequence {
    #[must_use]
    pub fn new(moves: Vec<Move>) -> Self {
        Self { valid: true, moves }
    }

    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tap kinds in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<MoveType> {
        self.moves.iter().map(|m| m.kind).collect()
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return f.write_str("<no path>");
        }
        for (i, m) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{m}")?;
        }
        Ok(())
    }
}
