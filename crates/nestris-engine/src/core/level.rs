use serde::{Deserialize, Serialize};

use super::board::{BOARD_HEIGHT, BOARD_WIDTH, Board, Column};

/// Bit set over frames; bit `f` refers to frame `f` after the piece spawned.
///
/// Every level drops a piece through the whole board in at most 60 frames,
/// so one word covers the lifetime of a piece.
pub type FrameMask = u64;

/// Returns the mask with frames `start..=end` set (empty when `start > end`).
#[must_use]
pub fn frame_range_mask(start: usize, end: usize) -> FrameMask {
    if start > end || start >= 64 {
        return 0;
    }
    let upper = if end >= 63 {
        FrameMask::MAX
    } else {
        (2 << end) - 1
    };
    upper & !((1 << start) - 1)
}

/// Gravity speed class of NES levels.
///
/// | level     | gravity          |
/// |-----------|------------------|
/// | `Level18` | 1 row / 3 frames |
/// | `Level19` | 1 row / 2 frames |
/// | `Level29` | 1 row / frame    |
/// | `Level39` | 2 rows / frame   |
///
/// All timing functions count frames from spawn (frame 0, row 0).
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
pub enum Level {
    #[display("18")]
    Level18,
    #[display("19")]
    Level19,
    #[display("29")]
    Level29,
    #[display("39")]
    Level39,
}

impl Level {
    pub const ALL: [Self; 4] = [Self::Level18, Self::Level19, Self::Level29, Self::Level39];

    /// Speed class of a game level number; levels below 18 are treated as 18.
    #[must_use]
    pub const fn from_level(level: u32) -> Self {
        match level {
            ..=18 => Self::Level18,
            19..=28 => Self::Level19,
            29..=38 => Self::Level29,
            _ => Self::Level39,
        }
    }

    /// Row the piece occupies during frame `frame`, before that frame's
    /// gravity is applied. May exceed the board height.
    #[must_use]
    pub const fn row_at_frame(self, frame: usize) -> usize {
        match self {
            Self::Level18 => frame / 3,
            Self::Level19 => frame / 2,
            Self::Level29 => frame,
            Self::Level39 => frame * 2,
        }
    }

    /// First frame at which a falling piece is on `row`.
    #[must_use]
    pub const fn first_frame_on_row(self, row: usize) -> usize {
        match self {
            Self::Level18 => row * 3,
            Self::Level19 => row * 2,
            Self::Level29 => row,
            Self::Level39 => row.div_ceil(2),
        }
    }

    /// Last frame at which a falling piece is on `row`.
    ///
    /// At level 39 odd rows are skipped and report the frame the piece falls
    /// through them.
    #[must_use]
    pub const fn last_frame_on_row(self, row: usize) -> usize {
        match self {
            Self::Level18 => row * 3 + 2,
            Self::Level19 => row * 2 + 1,
            Self::Level29 => row,
            Self::Level39 => row / 2,
        }
    }

    /// Rows gravity moves the piece at the end of `frame`.
    #[must_use]
    pub fn drops_at_frame(self, frame: usize) -> usize {
        match self {
            Self::Level18 => usize::from(frame % 3 == 2),
            Self::Level19 => usize::from(frame % 2 == 1),
            Self::Level29 => 1,
            Self::Level39 => 2,
        }
    }

    #[must_use]
    pub fn is_drop_frame(self, frame: usize) -> bool {
        self.drops_at_frame(frame) > 0
    }

    /// Frames a piece spends falling through an empty board.
    #[must_use]
    pub const fn frame_count(self) -> usize {
        self.last_frame_on_row(BOARD_HEIGHT - 1) + 1
    }

    /// Frames at which the piece can be in this column: bit `f` is set when
    /// the frame-`f` row is open.
    #[must_use]
    pub fn normal_frame_mask(self, column: Column) -> FrameMask {
        (0..self.frame_count())
            .filter(|&frame| column.is_open(self.row_at_frame(frame)))
            .fold(0, |mask, frame| mask | (1 << frame))
    }

    /// Frames at which the piece can be in this column and survive that
    /// frame's gravity: every row it passes through, including the one it
    /// ends on, is open.
    #[must_use]
    pub fn drop_frame_mask(self, column: Column) -> FrameMask {
        (0..self.frame_count())
            .filter(|&frame| {
                let row = self.row_at_frame(frame);
                column.is_range_open(row, row + self.drops_at_frame(frame))
            })
            .fold(0, |mask, frame| mask | (1 << frame))
    }

    /// Inverse of [`Level::normal_frame_mask`]: a row is open when every
    /// frame spent on it is set.
    #[must_use]
    pub fn frame_mask_to_column(self, mask: FrameMask) -> Column {
        let bits = (0..BOARD_HEIGHT)
            .filter(|&row| {
                let first = self.first_frame_on_row(row);
                let last = self.last_frame_on_row(row);
                if first > last {
                    // skipped row at level 39; covered by the frame before
                    mask & (1 << last) != 0
                } else {
                    let frames = frame_range_mask(first, last);
                    mask & frames == frames
                }
            })
            .fold(0, |bits, row| bits | (1 << row));
        Column::from_bits(bits)
    }
}

/// Normal and drop frame masks of every column of a piece's maps.
#[derive(Debug, Clone)]
pub struct FrameMasks {
    normal: [[FrameMask; BOARD_WIDTH]; 4],
    drop: [[FrameMask; BOARD_WIDTH]; 4],
}

impl FrameMasks {
    #[must_use]
    pub fn new(level: Level, maps: &[Board]) -> Self {
        let mut masks = Self {
            normal: [[0; BOARD_WIDTH]; 4],
            drop: [[0; BOARD_WIDTH]; 4],
        };
        for (rot, map) in maps.iter().enumerate() {
            for col in 0..BOARD_WIDTH {
                let column = map.column(col);
                masks.normal[rot][col] = level.normal_frame_mask(column);
                masks.drop[rot][col] = level.drop_frame_mask(column);
            }
        }
        masks
    }

    #[must_use]
    pub fn normal(&self, rot: usize, col: usize) -> FrameMask {
        self.normal[rot][col]
    }

    #[must_use]
    pub fn drop(&self, rot: usize, col: usize) -> FrameMask {
        self.drop[rot][col]
    }
}
