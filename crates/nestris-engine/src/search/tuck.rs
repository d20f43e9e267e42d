use serde::{Deserialize, Serialize};

use crate::core::{BOARD_WIDTH, FrameMask, FrameMasks};

/// Input pattern issued after a piece has started falling.
///
/// `L`/`R` shift, `A`/`B` rotate clockwise/counterclockwise. `LA` presses
/// both on one frame, `L-A` presses them on two consecutive frames in either
/// order, `L-L` presses the same direction twice with a blank frame between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::Display)]
pub enum Tuck {
    #[display("L")]
    Left,
    #[display("R")]
    Right,
    #[display("A")]
    RotateA,
    #[display("B")]
    RotateB,
    #[display("LA")]
    LeftA,
    #[display("RA")]
    RightA,
    #[display("LB")]
    LeftB,
    #[display("RB")]
    RightB,
    #[display("L-A")]
    LeftThenA,
    #[display("R-A")]
    RightThenA,
    #[display("L-B")]
    LeftThenB,
    #[display("R-B")]
    RightThenB,
    #[display("L-L")]
    DoubleLeft,
    #[display("R-R")]
    DoubleRight,
}

/// Start frames of a two-frame tuck, split by which input comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TuckFrames {
    pub shift_first: FrameMask,
    pub rotate_first: FrameMask,
}

impl TuckFrames {
    #[must_use]
    pub fn union(self) -> FrameMask {
        self.shift_first | self.rotate_first
    }
}

impl Tuck {
    /// Column change.
    #[must_use]
    pub const fn delta_col(self) -> isize {
        match self {
            Self::Left | Self::LeftA | Self::LeftB | Self::LeftThenA | Self::LeftThenB => -1,
            Self::Right | Self::RightA | Self::RightB | Self::RightThenA | Self::RightThenB => 1,
            Self::RotateA | Self::RotateB => 0,
            Self::DoubleLeft => -2,
            Self::DoubleRight => 2,
        }
    }

    /// Rotation change: 1 for A, -1 for B.
    #[must_use]
    pub const fn delta_rot(self) -> i8 {
        match self {
            Self::RotateA | Self::LeftA | Self::RightA | Self::LeftThenA | Self::RightThenA => 1,
            Self::RotateB | Self::LeftB | Self::RightB | Self::LeftThenB | Self::RightThenB => -1,
            Self::Left | Self::Right | Self::DoubleLeft | Self::DoubleRight => 0,
        }
    }

    /// Frames between the first and the last input of the tuck.
    #[must_use]
    pub const fn delta_frame(self) -> usize {
        match self {
            Self::LeftThenA | Self::RightThenA | Self::LeftThenB | Self::RightThenB => 1,
            Self::DoubleLeft | Self::DoubleRight => 2,
            _ => 0,
        }
    }

    /// Number of button presses.
    #[must_use]
    pub const fn input_count(self) -> usize {
        match self {
            Self::Left | Self::Right | Self::RotateA | Self::RotateB => 1,
            _ => 2,
        }
    }

    #[must_use]
    pub const fn is_two_frame(self) -> bool {
        self.delta_frame() == 1
    }

    /// Tucks tried for a piece, in search order: single inputs, same-frame
    /// combinations, two-frame combinations, then double shifts.
    #[must_use]
    pub fn search_order(rotations: usize, double_tuck: bool) -> &'static [Tuck] {
        use Tuck::{
            DoubleLeft, DoubleRight, Left, LeftA, LeftB, LeftThenA, LeftThenB, Right, RightA,
            RightB, RightThenA, RightThenB, RotateA, RotateB,
        };
        const ONE: &[Tuck] = &[Left, Right, DoubleLeft, DoubleRight];
        const TWO: &[Tuck] = &[
            Left,
            Right,
            RotateA,
            LeftA,
            RightA,
            LeftThenA,
            RightThenA,
            DoubleLeft,
            DoubleRight,
        ];
        const FOUR: &[Tuck] = &[
            Left,
            Right,
            RotateA,
            RotateB,
            LeftA,
            RightA,
            LeftB,
            RightB,
            LeftThenA,
            RightThenA,
            LeftThenB,
            RightThenB,
            DoubleLeft,
            DoubleRight,
        ];
        let all = match rotations {
            1 => ONE,
            2 => TWO,
            4 => FOUR,
            _ => panic!("unsupported rotation count {rotations}"),
        };
        if double_tuck {
            all
        } else {
            &all[..all.len() - 2]
        }
    }

    /// Pose after the tuck, or `None` if it would leave the board.
    #[must_use]
    pub fn apply(self, rotations: usize, rot: usize, col: usize) -> Option<(usize, usize)> {
        let col = col
            .checked_add_signed(self.delta_col())
            .filter(|&c| c < BOARD_WIDTH)?;
        let rot = match self.delta_rot() {
            0 => rot,
            _ if rotations == 1 => return None,
            1 => (rot + 1) % rotations,
            _ => (rot + rotations - 1) % rotations,
        };
        Some((rot, col))
    }

    /// Pose the tuck starts from to end in `(rot, col)`.
    #[must_use]
    pub fn source(self, rotations: usize, rot: usize, col: usize) -> Option<(usize, usize)> {
        let col = col
            .checked_add_signed(-self.delta_col())
            .filter(|&c| c < BOARD_WIDTH)?;
        let rot = match self.delta_rot() {
            0 => rot,
            _ if rotations == 1 => return None,
            1 => (rot + rotations - 1) % rotations,
            _ => (rot + 1) % rotations,
        };
        Some((rot, col))
    }

    /// Frames on which the tuck can start from `(rot, col)`, ignoring
    /// whether the piece is actually there at that time.
    ///
    /// Every pose the piece passes through has to be open on the frame it
    /// is entered, and a pose held over a frame boundary must survive that
    /// frame's gravity.
    #[must_use]
    pub fn start_frames(
        self,
        masks: &FrameMasks,
        rotations: usize,
        rot: usize,
        col: usize,
    ) -> TuckFrames {
        let Some((to_rot, to_col)) = self.apply(rotations, rot, col) else {
            return TuckFrames::default();
        };
        let target = masks.normal(to_rot, to_col);
        let shift_first = match self {
            Self::Left | Self::Right => target,
            Self::RotateA | Self::RotateB => 0,
            Self::LeftA | Self::RightA | Self::LeftB | Self::RightB => {
                masks.normal(rot, to_col) & target
            }
            Self::LeftThenA | Self::RightThenA | Self::LeftThenB | Self::RightThenB => {
                masks.drop(rot, to_col) & (target >> 1)
            }
            Self::DoubleLeft | Self::DoubleRight => {
                let mid = masks.drop(rot, (col + to_col) / 2);
                mid & (mid >> 1) & (target >> 2)
            }
        };
        let rotate_first = match self {
            Self::RotateA | Self::RotateB => target,
            Self::LeftThenA | Self::RightThenA | Self::LeftThenB | Self::RightThenB => {
                masks.drop(to_rot, col) & (target >> 1)
            }
            _ => 0,
        };
        TuckFrames {
            shift_first,
            rotate_first,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Board, Level, Piece};

    use super::*;

    #[test]
    fn test_search_order() {
        assert_eq!(Tuck::search_order(1, false), [Tuck::Left, Tuck::Right]);
        assert_eq!(Tuck::search_order(2, false).len(), 7);
        assert_eq!(Tuck::search_order(4, false).len(), 12);
        let with_double = Tuck::search_order(4, true);
        assert_eq!(with_double.len(), 14);
        assert_eq!(with_double[12..], [Tuck::DoubleLeft, Tuck::DoubleRight]);
        assert!(
            Tuck::search_order(2, true)
                .iter()
                .all(|t| t.delta_rot() >= 0)
        );
    }

    #[test]
    fn test_apply_and_source_are_inverse() {
        for rotations in [1, 2, 4] {
            for &tuck in Tuck::search_order(rotations, true) {
                for rot in 0..rotations {
                    for col in 0..BOARD_WIDTH {
                        if let Some((r, c)) = tuck.apply(rotations, rot, col) {
                            assert_eq!(tuck.source(rotations, r, c), Some((rot, col)), "{tuck}");
                        }
                    }
                }
            }
        }
        assert_eq!(Tuck::DoubleLeft.apply(1, 0, 1), None);
        assert_eq!(Tuck::RotateB.apply(4, 0, 3), Some((3, 3)));
    }

    #[test]
    fn test_tuck_under_overhang() {
        // The filled cell blocks every O footprint covering row 17 of column 6.
        let board = Board::from_ascii(
            "
            ......#...
            ..........
            ..........
            ",
        );
        let maps = board.piece_maps(Piece::O);
        let masks = FrameMasks::new(Level::Level18, &maps);
        let frames = Tuck::Right.start_frames(&masks, 1, 0, 6);
        // O at column 7 covers columns 6-7, blocked on rows 16-17.
        assert_eq!(frames.rotate_first, 0);
        assert_ne!(frames.shift_first & (1 << 54), 0);
        assert_eq!(frames.shift_first & (1 << 48), 0);
        assert_ne!(frames.shift_first & (1 << 3), 0);
    }

    #[test]
    fn test_two_frame_tuck_needs_intermediate_pose() {
        let board = Board::EMPTY;
        let maps = board.piece_maps(Piece::T);
        let masks = FrameMasks::new(Level::Level19, &maps);
        let frames = Tuck::LeftThenA.start_frames(&masks, 4, 0, 5);
        // The last frame on the bottom row cannot be followed by another one.
        assert_eq!(frames.shift_first & (1 << 39), 0);
        assert_eq!(frames.union() & (1 << 35), 1 << 35);
    }
}
