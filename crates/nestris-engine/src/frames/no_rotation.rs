use crate::core::{BOARD_HEIGHT, BOARD_WIDTH, Board, Piece, Position};

use super::frame_input::{FrameInput, FrameSequence};

// Each column takes three bits of a row word: bit 0 marks a cell reached by
// falling, bit 1 one reached by a left shift from the right neighbor, bit 2
// one reached by a right shift from the left neighbor.
const FELL: u32 = 0b001;
const FROM_RIGHT: u32 = 0b010;
const FROM_LEFT: u32 = 0b100;

const fn cell(col: usize) -> u32 {
    1 << (3 * col)
}

/// Widens every open column bit into three bits.
fn spread(open: u16) -> u32 {
    (0..BOARD_WIDTH)
        .filter(|&col| open & (1 << col) != 0)
        .fold(0, |bits, col| bits | (0b111 << (3 * col)))
}

/// Per-row marks of how the piece can first enter each cell in rotation 0.
fn direction_map(map: &Board, inputs_per_row: usize, do_tuck: bool) -> [u32; BOARD_HEIGHT] {
    let rows: [u32; BOARD_HEIGHT] =
        std::array::from_fn(|row| spread(!map.row_mask(row) & 0x3ff));
    let start = cell(Position::START.col());
    let mut marks = [0; BOARD_HEIGHT];

    if do_tuck && inputs_per_row > 0 {
        // Any number of shifts up to `inputs_per_row` on every row.
        let mut state = start;
        for (row, &open) in rows.iter().enumerate() {
            state &= open;
            let (mut left, mut right) = (state, state);
            for i in 0..inputs_per_row {
                left |= (left >> 3) & open;
                right |= (right << 3) & open;
                if row == 0 && i == 0 {
                    left |= open & cell(Position::START.col() - 1);
                    right |= open & cell(Position::START.col() + 1);
                }
            }
            marks[row] = state | ((left & !state) << 1) | ((right & !state & !left) << 2);
            state |= left | right;
            if state == 0 {
                break;
            }
        }
    } else if do_tuck {
        // At most one shift per row, and only after a row without one.
        let (mut settled, mut shifted) = (start, start);
        for (row, &open) in rows.iter().enumerate() {
            if settled | shifted == 0 {
                break;
            }
            settled &= open;
            shifted &= open;
            let reached = settled | shifted;
            let mut left = (settled >> 3) & open;
            let mut right = (settled << 3) & open;
            if row == 0 {
                left |= open & cell(Position::START.col() - 1);
                right |= open & cell(Position::START.col() + 1);
            }
            marks[row] = reached | ((left & !reached) << 1) | ((right & !reached & !left) << 2);
            shifted = left | right;
            settled = reached;
        }
    } else {
        // Shift on a fixed schedule until the path is blocked.
        let mut state = start;
        let (mut left_open, mut right_open) = (true, true);
        for (row, &open) in rows.iter().enumerate() {
            state &= open;
            let (reached, next) = if inputs_per_row > 0 {
                (row * inputs_per_row, (row + 1) * inputs_per_row)
            } else {
                (row.div_ceil(2), (row + 2) / 2)
            };
            if reached <= 5 && open & cell(5 - reached) == 0 {
                left_open = false;
            }
            if reached <= 4 && open & cell(5 + reached) == 0 {
                right_open = false;
            }
            let (mut left, mut right) = (0, 0);
            for i in reached + 1..=next.min(5) {
                if (left_open || i == 1) && open & cell(5 - i) != 0 {
                    left |= cell(5 - i);
                    left_open = true;
                } else {
                    left_open = false;
                }
                if (right_open || i == 1) && i <= 4 && open & cell(5 + i) != 0 {
                    right |= cell(5 + i);
                    right_open = true;
                } else {
                    right_open = false;
                }
            }
            marks[row] = state | (left << 1) | (right << 2);
            state |= left | right;
            if state == 0 {
                break;
            }
        }
    }
    marks
}

/// Shifts needed on each row to reach `target`, traced back through the
/// direction map.
fn trace(marks: &[u32; BOARD_HEIGHT], target: Position) -> Option<Vec<Vec<FrameInput>>> {
    let mut inputs = vec![Vec::new(); target.row() + 1];
    let (mut row, mut col) = (target.row(), target.col());
    // Every step moves up or toward the spawn column without revisiting.
    for _ in 0..BOARD_HEIGHT * BOARD_WIDTH {
        if (row, col) == (Position::START.row(), Position::START.col()) {
            for row_inputs in &mut inputs {
                row_inputs.reverse();
            }
            return Some(inputs);
        }
        let mark = (marks[row] >> (3 * col)) & 0b111;
        if mark & FELL != 0 {
            row = row.checked_sub(1)?;
        } else if mark & FROM_RIGHT != 0 {
            inputs[row].push(FrameInput::LEFT);
            col += 1;
        } else if mark & FROM_LEFT != 0 {
            inputs[row].push(FrameInput::RIGHT);
            col = col.checked_sub(1)?;
        } else {
            return None;
        }
        if col >= BOARD_WIDTH {
            return None;
        }
    }
    None
}

/// Input sequence for a placement without rotation, shifting at most
/// `inputs_per_row` times per row (0: one shift every other row) and using
/// soft drop wherever a row leaves time for it.
///
/// With `do_tuck` the piece may shift on any row it passes; without it the
/// shifts follow a fixed schedule from the spawn row on. Each row lasts
/// `frames_per_drop` frames: its shifts go on every other frame, and when at
/// least three frames remain the piece is soft-dropped through them. Once
/// soft drop is held, rows without input take two frames.
///
/// Returns `None` when `target` is rotated or not reachable this way.
#[must_use]
pub fn no_rotation_sequence(
    board: &Board,
    piece: Piece,
    inputs_per_row: usize,
    do_tuck: bool,
    frames_per_drop: usize,
    target: Position,
) -> Option<FrameSequence> {
    if target.rot() != 0 {
        return None;
    }
    let map = board.piece_map(piece, 0);
    let marks = direction_map(&map, inputs_per_row, do_tuck);
    let inputs = trace(&marks, target)?;

    let mut seq = FrameSequence::new();
    let mut down_held = false;
    for row_inputs in &inputs {
        if down_held && frames_per_drop > 2 && row_inputs.is_empty() {
            seq.push(FrameInput::DOWN);
            seq.push(FrameInput::DOWN);
            continue;
        }
        down_held = false;
        let input_frames = (row_inputs.len() * 2).saturating_sub(1);
        let blank = frames_per_drop.saturating_sub(input_frames);
        let offset = seq.len();
        seq.resize(offset + input_frames + blank.min(3));
        for (i, &input) in row_inputs.iter().enumerate() {
            seq[offset + 2 * i] = input;
        }
        if blank >= 3 {
            for frame in offset + input_frames..offset + input_frames + 3 {
                seq[frame] = FrameInput::DOWN;
            }
            down_held = true;
        }
    }
    Some(seq)
}
