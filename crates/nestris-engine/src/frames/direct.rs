use arrayvec::ArrayVec;

use crate::{
    core::{Board, Column, FrameMasks, Level, MAX_TAPS, Piece, Position, TapTable, frame_range_mask},
    search::{SearchParams, Tuck},
};

use super::frame_input::{FrameInput, FrameSequence};

/// Shifts and rotations needed between two poses, issued together from the
/// first tap on.
#[derive(Debug, Clone, Copy)]
struct TapCounts {
    shifts: usize,
    rotations: usize,
    left: bool,
    clockwise: bool,
}

impl TapCounts {
    fn new(rotations: usize, from: (usize, usize), to: (usize, usize)) -> Self {
        let (from_rot, from_col) = from;
        let (to_rot, to_col) = to;
        let turns = (to_rot + rotations - from_rot) % rotations;
        Self {
            shifts: from_col.abs_diff(to_col),
            rotations: if turns == 3 { 1 } else { turns },
            left: to_col < from_col,
            clockwise: turns != 3,
        }
    }

    /// Tap slots used, a shift and a rotation sharing one slot.
    fn taps(self) -> usize {
        self.shifts.max(self.rotations)
    }

    fn input_count(self) -> usize {
        self.shifts + self.rotations
    }

    fn input(self, tap: usize) -> FrameInput {
        let mut input = FrameInput::NONE;
        if tap < self.shifts {
            input |= if self.left {
                FrameInput::LEFT
            } else {
                FrameInput::RIGHT
            };
        }
        if tap < self.rotations {
            input |= if self.clockwise {
                FrameInput::A
            } else {
                FrameInput::B
            };
        }
        input
    }
}

fn tuck_inputs(tuck: Tuck, shift_first: bool) -> ArrayVec<FrameInput, 3> {
    let shift = match tuck.delta_col() {
        0 => FrameInput::NONE,
        d if d < 0 => FrameInput::LEFT,
        _ => FrameInput::RIGHT,
    };
    let rotate = match tuck.delta_rot() {
        0 => FrameInput::NONE,
        d if d > 0 => FrameInput::A,
        _ => FrameInput::B,
    };
    let mut inputs = ArrayVec::new();
    match tuck {
        Tuck::DoubleLeft | Tuck::DoubleRight => {
            inputs.extend([shift, FrameInput::NONE, shift]);
        }
        _ if tuck.is_two_frame() && shift_first => inputs.extend([shift, rotate]),
        _ if tuck.is_two_frame() => inputs.extend([rotate, shift]),
        _ => inputs.push(shift | rotate),
    }
    inputs
}

/// Frame-level feasibility of committed tap sequences on one board.
struct Frames<'a> {
    level: Level,
    taps: TapTable,
    maps: &'a [Board],
    masks: FrameMasks,
    tucks: &'static [Tuck],
}

impl<'a> Frames<'a> {
    fn new(params: &SearchParams, maps: &'a [Board]) -> Self {
        Self {
            level: params.level,
            taps: params.taps,
            maps,
            masks: FrameMasks::new(params.level, maps),
            tucks: Tuck::search_order(maps.len(), params.double_tuck),
        }
    }

    fn column(&self, rot: usize, col: usize) -> Column {
        self.maps[rot].column(col)
    }

    /// Frames during which the piece sits in the `to` column after tapping
    /// from `from` starting at `initial_frame`: from the last tap (or the
    /// tuck frame, with `tuck`) to the last frame before it locks.
    ///
    /// Returns `None` when a tap is blocked or the taps do not fit the table.
    fn frame_range(
        &self,
        tuck: bool,
        from: (usize, usize),
        initial_frame: usize,
        to: (usize, usize),
    ) -> Option<(usize, usize)> {
        let counts = TapCounts::new(self.maps.len(), from, to);
        let taps = counts.taps();
        if taps >= MAX_TAPS {
            return None;
        }
        let start = initial_frame
            + match (tuck, taps) {
                (true, _) => self.taps.frame(taps),
                (false, 0) => 0,
                (false, _) => self.taps.frame(taps - 1),
            };

        let (mut rot, mut col) = from;
        let mut prev_row = self.level.row_at_frame(initial_frame);
        if !self.column(rot, col).is_open(prev_row) {
            return None;
        }
        for tap in 0..taps {
            let row = self.level.row_at_frame(initial_frame + self.taps.frame(tap));
            if !self.column(rot, col).is_range_open(prev_row, row) {
                return None;
            }
            if tap < counts.shifts {
                col = if counts.left { col - 1 } else { col + 1 };
                if !self.column(rot, col).is_open(row) {
                    return None;
                }
            }
            if tap < counts.rotations {
                let rotations = self.maps.len();
                rot = if counts.clockwise {
                    (rot + 1) % rotations
                } else {
                    (rot + rotations - 1) % rotations
                };
                if !self.column(rot, col).is_open(row) {
                    return None;
                }
            }
            prev_row = row;
        }
        if tuck {
            let row = self.level.row_at_frame(initial_frame + self.taps.frame(taps));
            if !self.column(rot, col).is_range_open(prev_row, row) {
                return None;
            }
            prev_row = row;
        }
        let landing = self.column(rot, col).landing_row(prev_row);
        Some((start, self.level.last_frame_on_row(landing)))
    }

    /// Appends the taps from `from` to `to` starting at `initial_frame`,
    /// then pads to `min_frames`. Expects [`Self::frame_range`] to have
    /// accepted the same poses.
    fn emit(
        &self,
        seq: &mut FrameSequence,
        from: (usize, usize),
        initial_frame: usize,
        to: (usize, usize),
        min_frames: usize,
    ) {
        let counts = TapCounts::new(self.maps.len(), from, to);
        seq.resize(initial_frame);
        for tap in 0..counts.taps() {
            seq.resize(initial_frame + self.taps.frame(tap));
            seq.push(counts.input(tap));
        }
        seq.resize(initial_frame + self.taps.frame(counts.taps()));
        seq.pad_to(min_frames);
    }

    /// Finds a committed sequence from `from` (entered at `initial_frame`)
    /// to `target`: direct taps first, then every tuck in search order.
    ///
    /// Returns the inputs used, writing the frames into `seq` when given.
    fn sequence(
        &self,
        mut seq: Option<&mut FrameSequence>,
        from: (usize, usize),
        initial_frame: usize,
        target: Position,
        min_frames: usize,
    ) -> Option<usize> {
        let rotations = self.maps.len();
        let column = self.column(target.rot(), target.col());
        if !column.is_open(target.row()) {
            return None;
        }
        let first_frame = self.level.first_frame_on_row(column.run_top(target.row()));
        let last_frame = self.level.last_frame_on_row(target.row());
        let to = (target.rot(), target.col());

        let direct = self
            .frame_range(false, from, initial_frame, to)
            .is_some_and(|(start, end)| end >= first_frame && last_frame >= start);
        if direct {
            if let Some(seq) = seq {
                self.emit(seq, from, initial_frame, to, min_frames);
            }
            return Some(TapCounts::new(rotations, from, to).input_count());
        }

        let target_frames = frame_range_mask(first_frame, last_frame);
        for &tuck in self.tucks {
            let Some(source) = tuck.source(rotations, target.rot(), target.col()) else {
                continue;
            };
            let Some((start, end)) = self.frame_range(true, from, initial_frame, source) else {
                continue;
            };
            let window = frame_range_mask(start, end) & (target_frames >> tuck.delta_frame());
            let frames = tuck.start_frames(&self.masks, rotations, source.0, source.1);
            for (mask, shift_first) in [
                (frames.shift_first & window, true),
                (frames.rotate_first & window, false),
            ] {
                if mask == 0 {
                    continue;
                }
                if let Some(seq) = seq.as_deref_mut() {
                    let frame = mask.trailing_zeros() as usize;
                    self.emit(seq, from, initial_frame, source, frame);
                    for input in tuck_inputs(tuck, shift_first) {
                        seq.push(input);
                    }
                    seq.pad_to(min_frames);
                }
                return Some(TapCounts::new(rotations, from, source).input_count() + tuck.input_count());
            }
        }
        None
    }
}

/// Frame inputs that take `piece` from spawn to `target` with committed
/// taps and at most one tuck.
///
/// The sequence is padded to the adjustment delay, so that adjustments can
/// be appended right after it.
#[must_use]
pub fn frame_sequence_start(
    params: &SearchParams,
    board: &Board,
    piece: Piece,
    target: Position,
) -> Option<FrameSequence> {
    let maps = board.piece_maps(piece);
    let mut seq = FrameSequence::new();
    let start = (Position::START.rot(), Position::START.col());
    Frames::new(params, &maps).sequence(Some(&mut seq), start, 0, target, params.adj_delay)?;
    Some(seq)
}

/// Extends `premove_seq`, which leaves the piece heading for `premove`, with
/// the adjustment that moves it to `target` instead.
#[must_use]
pub fn frame_sequence_adj(
    params: &SearchParams,
    board: &Board,
    piece: Piece,
    premove_seq: &FrameSequence,
    premove: Position,
    target: Position,
) -> Option<FrameSequence> {
    let maps = board.piece_maps(piece);
    let mut seq = premove_seq.clone();
    let from = (premove.rot(), premove.col());
    Frames::new(params, &maps).sequence(Some(&mut seq), from, premove_seq.len(), target, 0)?;
    Some(seq)
}

/// Inputs the adjustment from `premove` to `target` costs, see
/// [`frame_sequence_adj`].
#[must_use]
pub fn adjustment_tap_count(
    params: &SearchParams,
    board: &Board,
    piece: Piece,
    premove_seq: &FrameSequence,
    premove: Position,
    target: Position,
) -> Option<usize> {
    let maps = board.piece_maps(piece);
    let from = (premove.rot(), premove.col());
    Frames::new(params, &maps).sequence(None, from, premove_seq.len(), target, 0)
}
