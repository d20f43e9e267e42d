use arrayvec::ArrayVec;

use crate::core::{BOARD_HEIGHT, BOARD_WIDTH, Board, Position};

use super::{
    dijkstra::best_first,
    move_sequence::{Move, MoveSequence, MoveType},
};

/// Cost of a path in [`plan_highest`], compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct HighestKey {
    /// Number of taps.
    taps: usize,
    /// 1 per tap repeating the previous tap's kind, 2 per other tap.
    weight: usize,
    /// Sum of the rows the taps happen on; lower keeps the piece up longer.
    row_sum: usize,
}

fn is_open(maps: &[Board], pos: Position) -> bool {
    maps[pos.rot()].is_open(pos.row(), pos.col())
}

fn is_grounded(maps: &[Board], pos: Position) -> bool {
    pos.row() + 1 == BOARD_HEIGHT || !maps[pos.rot()].is_open(pos.row() + 1, pos.col())
}

/// Poses one edge away: falling one row (`None`) or one tap.
fn neighbors(maps: &[Board], pos: Position) -> ArrayVec<(Option<MoveType>, Position), 5> {
    let rotations = maps.len();
    let (rot, row, col) = (pos.rot(), pos.row(), pos.col());
    let mut candidates: ArrayVec<(Option<MoveType>, Position), 5> = ArrayVec::new();
    if row + 1 < BOARD_HEIGHT {
        candidates.push((None, pos.with_row(row + 1)));
    }
    if rotations >= 2 {
        let to = (rot + 1) % rotations;
        candidates.push((Some(MoveType::RotateCw), Position::new(to, row, col)));
    }
    if rotations == 4 {
        let to = (rot + 3) % 4;
        candidates.push((Some(MoveType::RotateCcw), Position::new(to, row, col)));
    }
    if col > 0 {
        candidates.push((Some(MoveType::Left), Position::new(rot, row, col - 1)));
    }
    if col + 1 < BOARD_WIDTH {
        candidates.push((Some(MoveType::Right), Position::new(rot, row, col + 1)));
    }
    candidates.retain(|(_, next)| is_open(maps, *next));
    candidates
}

fn tap_between(rotations: usize, from: Position, to: Position) -> Option<MoveType> {
    if from.row() != to.row() {
        return None;
    }
    if from.rot() != to.rot() {
        return if (from.rot() + 1) % rotations == to.rot() {
            Some(MoveType::RotateCw)
        } else {
            Some(MoveType::RotateCcw)
        };
    }
    if to.col() < from.col() {
        Some(MoveType::Left)
    } else {
        Some(MoveType::Right)
    }
}

fn moves_along(rotations: usize, path: impl IntoIterator<Item = Position>) -> Vec<Move> {
    let path: Vec<Position> = path.into_iter().collect();
    path.windows(2)
        .filter_map(|w| {
            let kind = tap_between(rotations, w[0], w[1])?;
            Some(Move {
                kind,
                row_start: w[0].row(),
                row_end: w[0].row(),
            })
        })
        .collect()
}

fn endpoints_valid(maps: &[Board], start: Position, target: Position) -> bool {
    is_open(maps, start) && is_open(maps, target) && is_grounded(maps, target)
}

/// Plans the path to `target` with the fewest taps, preferring runs of the
/// same tap and taps issued as high as possible.
///
/// Each move's `row_start` and `row_end` both hold the row it happens on.
#[must_use]
pub fn plan_highest(maps: &[Board], start: Position, target: Position) -> MoveSequence {
    if !endpoints_valid(maps, start, target) {
        return MoveSequence::invalid();
    }
    let start_key = HighestKey {
        taps: 0,
        weight: 0,
        row_sum: 0,
    };
    let path = best_first(
        (start, None),
        start_key,
        |(pos, _)| *pos == target,
        |&(pos, last), key, out| {
            for (kind, next) in neighbors(maps, pos) {
                match kind {
                    None => out.push(((next, last), *key)),
                    Some(kind) => {
                        let key = HighestKey {
                            taps: key.taps + 1,
                            weight: key.weight + if last == Some(kind) { 1 } else { 2 },
                            row_sum: key.row_sum + pos.row(),
                        };
                        out.push(((next, Some(kind)), key));
                    }
                }
            }
        },
    );
    match path {
        Some(path) => MoveSequence::new(moves_along(maps.len(), path.into_iter().map(|(p, _)| p))),
        None => MoveSequence::invalid(),
    }
}

/// Plans the path to `target` that uses exactly the taps `kinds`, in order,
/// issuing each one as low as possible.
///
/// Earlier taps take precedence: the first tap is delayed as far as it can
/// be, then the second, and so on.
#[must_use]
pub fn plan_lowest(
    maps: &[Board],
    start: Position,
    target: Position,
    kinds: &[MoveType],
) -> MoveSequence {
    if !endpoints_valid(maps, start, target) {
        return MoveSequence::invalid();
    }
    // One entry per tap issued: rows from the bottom, so smaller is lower.
    let path = best_first(
        (start, 0),
        Vec::<usize>::new(),
        |&(pos, done)| pos == target && done == kinds.len(),
        |&(pos, done), key, out| {
            for (kind, next) in neighbors(maps, pos) {
                match kind {
                    None => out.push(((next, done), key.clone())),
                    Some(kind) if kinds.get(done) == Some(&kind) => {
                        let mut key = key.clone();
                        key.push(BOARD_HEIGHT - 1 - pos.row());
                        out.push(((next, done + 1), key));
                    }
                    Some(_) => {}
                }
            }
        },
    );
    match path {
        Some(path) => MoveSequence::new(moves_along(maps.len(), path.into_iter().map(|(p, _)| p))),
        None => MoveSequence::invalid(),
    }
}

/// Plans the taps from `start` to `target` together with the window of rows
/// each tap may happen on.
///
/// The tap kinds come from [`plan_highest`], which also gives each tap's
/// earliest row; [`plan_lowest`] on the same kinds gives the latest one.
#[must_use]
pub fn plan_path(maps: &[Board], start: Position, target: Position) -> MoveSequence {
    let highest = plan_highest(maps, start, target);
    if !highest.is_valid() {
        return highest;
    }
    let lowest = plan_lowest(maps, start, target, &highest.kinds());
    debug_assert!(lowest.is_valid(), "highest path has no lowest counterpart");
    if !lowest.is_valid() {
        return highest;
    }
    let moves = highest
        .moves
        .iter()
        .zip(&lowest.moves)
        .map(|(high, low)| Move {
            kind: high.kind,
            row_start: high.row_start,
            row_end: low.row_end.max(high.row_start),
        })
        .collect();
    MoveSequence::new(moves)
}
