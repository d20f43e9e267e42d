use crate::core::{BOARD_HEIGHT, BOARD_WIDTH, Board, Level, Position};

use super::frame_input::{FrameInput, FrameSequence};

/// Frames a shift button has to be held before it repeats.
pub const DAS_CHARGE_FRAMES: usize = 6;

/// Replays `seq` frame by frame from the spawn pose.
///
/// Each frame applies, in order:
///
/// 1. Shift, left taking precedence when both directions are pressed. A
///    fresh press shifts at once and resets the charge. While the
///    same direction stays held the charge grows by one per frame and shifts
///    again on reaching [`DAS_CHARGE_FRAMES`]; a blocked shift leaves the
///    charge alone.
/// 2. Rotation on a fresh A or B press, skipped when the rotated pose is
///    blocked.
/// 3. Gravity, one row per drop of the frame. The piece locks when it cannot
///    fall.
///
/// Returns the final pose and whether it locked. With `until_lock` the piece
/// keeps falling after the last frame until it locks. A blocked spawn locks
/// immediately.
#[must_use]
pub fn simulate(level: Level, maps: &[Board], seq: &FrameSequence, until_lock: bool) -> (Position, bool) {
    if !maps[Position::START.rot()].is_open(Position::START.row(), Position::START.col()) {
        return (Position::START, true);
    }
    let rotations = maps.len();
    let (mut rot, mut row, mut col) = (Position::START.rot(), 0, Position::START.col());
    let mut charge = 0;
    let mut previous = FrameInput::NONE;

    for (frame, input) in seq.iter().enumerate() {
        let map = &maps[rot];
        // Left wins when both directions are pressed.
        let shift = if input.is_left() {
            Some((previous.is_left(), col.checked_sub(1)))
        } else if input.is_right() {
            Some((previous.is_right(), Some(col + 1).filter(|&c| c < BOARD_WIDTH)))
        } else {
            None
        };
        if let Some((held, target)) = shift {
            let available = target.filter(|&c| map.is_open(row, c));
            if !held {
                charge = 0;
                if let Some(c) = available {
                    col = c;
                }
            } else if let Some(c) = available {
                charge += 1;
                if charge == DAS_CHARGE_FRAMES {
                    charge = 0;
                    col = c;
                }
            }
        }

        let turn = if input.is_a() && !previous.is_a() {
            Some((rot + 1) % rotations)
        } else if input.is_b() && !previous.is_b() {
            Some((rot + rotations - 1) % rotations)
        } else {
            None
        };
        if let Some(next) = turn.filter(|&r| maps[r].is_open(row, col)) {
            rot = next;
        }

        for _ in 0..level.drops_at_frame(frame) {
            if row + 1 == BOARD_HEIGHT || !maps[rot].is_open(row + 1, col) {
                return (Position::new(rot, row, col), true);
            }
            row += 1;
        }
        previous = input;
    }

    if !until_lock {
        return (Position::new(rot, row, col), false);
    }
    let landing = maps[rot].column(col).landing_row(row);
    (Position::new(rot, landing, col), true)
}
