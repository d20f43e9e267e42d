use crate::{
    core::Level,
    planner::{MoveSequence, MoveType},
};

use super::frame_input::{FrameInput, FrameSequence};

impl From<MoveType> for FrameInput {
    fn from(kind: MoveType) -> Self {
        match kind {
            MoveType::RotateCw => Self::A,
            MoveType::RotateCcw => Self::B,
            MoveType::Left => Self::LEFT,
            MoveType::Right => Self::RIGHT,
        }
    }
}

/// Frames between two presses of the same category at `tap_rate_hz`.
#[must_use]
pub fn tap_interval(tap_rate_hz: u32) -> usize {
    assert!(
        (1..=30).contains(&tap_rate_hz),
        "tap rate must be between 1 and 30 Hz, got {tap_rate_hz}"
    );
    60_usize.div_ceil(tap_rate_hz as usize)
}

/// Turns a planned move sequence into per-frame inputs.
///
/// Every move is put on the earliest frame that
///
/// - lies in its row window (from the first frame on `row_start` to the last
///   frame on `row_end`),
/// - is not before the end of `prior` nor before the first frame on
///   `start_row`,
/// - is at least one tap interval after the previous press of the same
///   category (shift or rotation),
/// - follows the previous move by a frame, except that a rotation may share
///   the frame of the shift right before it.
///
/// The result extends `prior`. Returns `None` for an invalid sequence or when
/// a move cannot be placed inside its window.
#[must_use]
pub fn synthesize_frames(
    seq: &MoveSequence,
    tap_rate_hz: u32,
    level: Level,
    start_row: usize,
    prior: &FrameSequence,
) -> Option<FrameSequence> {
    let interval = tap_interval(tap_rate_hz);
    if !seq.is_valid() {
        return None;
    }

    let mut frames = prior.clone();
    let floor = prior.len().max(level.first_frame_on_row(start_row));
    let mut last_shift: Option<usize> = None;
    let mut last_rotation: Option<usize> = None;
    let mut previous: Option<(MoveType, usize)> = None;

    for m in &seq.moves {
        let mut frame = level.first_frame_on_row(m.row_start).max(floor);
        let same_category = if m.kind.is_shift() {
            last_shift
        } else {
            last_rotation
        };
        if let Some(last) = same_category {
            frame = frame.max(last + interval);
        }
        if let Some((kind, last)) = previous {
            let combined = kind.is_shift() && m.kind.is_rotation();
            frame = frame.max(if combined { last } else { last + 1 });
        }
        if frame > level.last_frame_on_row(m.row_end) {
            return None;
        }

        frames.pad_to(frame + 1);
        frames[frame] |= FrameInput::from(m.kind);
        if m.kind.is_shift() {
            last_shift = Some(frame);
        } else {
            last_rotation = Some(frame);
        }
        previous = Some((m.kind, frame));
    }
    Some(frames)
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{Board, Piece, Position},
        frames::simulate,
        planner::{Move, plan_path},
    };

    use super::*;

    fn at(kind: MoveType, row_start: usize, row_end: usize) -> Move {
        Move {
            kind,
            row_start,
            row_end,
        }
    }

    #[test]
    fn test_tap_interval() {
        assert_eq!(tap_interval(30), 2);
        assert_eq!(tap_interval(24), 3);
        assert_eq!(tap_interval(12), 5);
        assert_eq!(tap_interval(7), 9);
        assert_eq!(tap_interval(1), 60);
    }

    #[test]
    #[should_panic(expected = "tap rate")]
    fn test_tap_interval_rejects_fast_rates() {
        let _ = tap_interval(31);
    }

    #[test]
    fn test_same_category_spacing() {
        let seq = MoveSequence::new(vec![at(MoveType::Left, 0, 18); 3]);
        let frames = synthesize_frames(&seq, 30, Level::Level18, 0, &FrameSequence::new()).unwrap();
        assert_eq!(frames.to_string(), "L - L - L");
        let frames = synthesize_frames(&seq, 12, Level::Level18, 0, &FrameSequence::new()).unwrap();
        assert_eq!(frames.to_string(), "L - - - - L - - - - L");
    }

    #[test]
    fn test_rotation_shares_frame_with_shift() {
        let seq = MoveSequence::new(vec![
            at(MoveType::Right, 0, 10),
            at(MoveType::RotateCw, 0, 10),
            at(MoveType::Right, 0, 10),
            at(MoveType::RotateCw, 0, 10),
        ]);
        let frames = synthesize_frames(&seq, 30, Level::Level19, 0, &FrameSequence::new()).unwrap();
        assert_eq!(frames.to_string(), "RA - RA");

        // A shift never joins the rotation before it.
        let seq = MoveSequence::new(vec![at(MoveType::RotateCcw, 0, 10), at(MoveType::Left, 0, 10)]);
        let frames = synthesize_frames(&seq, 30, Level::Level19, 0, &FrameSequence::new()).unwrap();
        assert_eq!(frames.to_string(), "B L");
    }

    #[test]
    fn test_window_start_and_prior() {
        let seq = MoveSequence::new(vec![at(MoveType::Left, 2, 5)]);
        let frames = synthesize_frames(&seq, 30, Level::Level19, 0, &FrameSequence::new()).unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[4], FrameInput::LEFT);

        let prior: FrameSequence = "R - - - - - -".parse().unwrap();
        let frames = synthesize_frames(&seq, 30, Level::Level19, 0, &prior).unwrap();
        assert_eq!(frames.to_string(), "R - - - - - - L");

        let frames = synthesize_frames(&seq, 30, Level::Level19, 5, &FrameSequence::new());
        assert_eq!(frames.map(|f| f.len()), Some(11));
    }

    #[test]
    fn test_missed_window() {
        let seq = MoveSequence::new(vec![at(MoveType::Left, 0, 0); 3]);
        assert!(synthesize_frames(&seq, 10, Level::Level18, 0, &FrameSequence::new()).is_none());
        assert!(
            synthesize_frames(
                &MoveSequence::invalid(),
                30,
                Level::Level18,
                0,
                &FrameSequence::new()
            )
            .is_none()
        );
    }

    #[test]
    fn test_planned_tuck_replays_to_target() {
        let board = Board::from_ascii(
            "
            #.........
            ..........
            ..........
            ",
        );
        let maps = board.piece_maps(Piece::O);
        let target = Position::new(0, 18, 1);
        let seq = plan_path(&maps, Position::START, target);
        let frames = synthesize_frames(&seq, 15, Level::Level18, 0, &FrameSequence::new()).unwrap();
        assert_eq!(simulate(Level::Level18, &maps, &frames, true), (target, true));
    }
}
