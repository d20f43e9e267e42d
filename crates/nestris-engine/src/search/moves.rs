use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{Board, FrameMasks, Level, Piece, Position, TapTable, frame_range_mask};

use super::{
    cache::ReachabilityCache,
    reachability::{ReachableSet, TableKey, TapEntry},
    tuck::Tuck,
};

/// Timing parameters of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SearchParams {
    pub level: Level,
    /// Frame from which adjustment inputs may start; 0 disables adjustment.
    pub adj_delay: usize,
    pub taps: TapTable,
    /// Also try two same-direction shifts separated by one blank frame.
    #[serde(default)]
    pub double_tuck: bool,
}

impl SearchParams {
    #[must_use]
    pub fn table_key(&self) -> TableKey {
        TableKey {
            level: self.level,
            adj_delay: self.adj_delay,
            taps: self.taps,
        }
    }

    #[must_use]
    pub fn adjustment_enabled(&self) -> bool {
        self.adj_delay > 0
    }
}

/// Every resting position a piece can reach.
///
/// `non_adj` holds placements reached by committed input sequences. `adj`
/// maps each premove (the placement the piece would reach if no adjustment
/// follows) to the placements reachable by adjusting after the delay. All
/// lists are sorted and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PossibleMoves {
    pub non_adj: Vec<Position>,
    pub adj: Vec<(Position, Vec<Position>)>,
}

impl PossibleMoves {
    /// No placement is possible: the piece tops out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.non_adj.is_empty() && self.adj.is_empty()
    }

    /// Adjustment targets of a premove.
    #[must_use]
    pub fn adjustments(&self, premove: Position) -> Option<&[Position]> {
        self.adj
            .binary_search_by_key(&premove, |(pos, _)| *pos)
            .ok()
            .map(|i| self.adj[i].1.as_slice())
    }
}

/// Lists every resting position of `piece` on `board`.
///
/// Phase 1 checks each precomputed tap path of the cached table against the
/// board's piece maps; phase 2 tries every tuck from each fitting path while
/// the piece is still falling. With adjustment enabled, paths whose taps end
/// before the delay become premoves and their post-delay continuations are
/// searched the same way.
///
/// The result is empty when nothing fits, e.g. when the spawn is blocked.
#[must_use]
pub fn search_moves(
    cache: &ReachabilityCache,
    params: &SearchParams,
    board: &Board,
    piece: Piece,
) -> PossibleMoves {
    let table = cache.get(params.table_key());
    let rotations = piece.rotations();
    let tables = table.for_rotations(rotations);
    let maps = board.piece_maps(piece);
    let search = Search {
        level: params.level,
        maps: &maps,
        masks: FrameMasks::new(params.level, &maps),
        tucks: Tuck::search_order(rotations, params.double_tuck),
        rotations,
    };

    let mut moves = PossibleMoves::default();
    for (index, entry) in tables.initial().entries().iter().enumerate() {
        let Some(landing) = search.landing(entry) else {
            continue;
        };
        let lock_frame = params.level.last_frame_on_row(landing.row());
        let premove = tables
            .continuation(index)
            .filter(|set| lock_frame >= set.start_frame());

        search.tucks(entry, landing, &mut moves.non_adj);
        match premove {
            Some(set) => {
                let mut targets = Vec::new();
                search.collect(set, &mut targets);
                targets.sort_unstable();
                targets.dedup();
                moves.adj.push((landing, targets));
            }
            None => moves.non_adj.push(landing),
        }
    }
    moves.non_adj.sort_unstable();
    moves.non_adj.dedup();
    moves.adj.sort_unstable_by_key(|(pos, _)| *pos);

    trace!(
        "{piece:?}: {} placements, {} premoves",
        moves.non_adj.len(),
        moves.adj.len()
    );
    moves
}

struct Search<'a> {
    level: Level,
    maps: &'a [Board],
    masks: FrameMasks,
    tucks: &'static [Tuck],
    rotations: usize,
}

impl Search<'_> {
    /// Resting position of an entry, if its tap path fits the board.
    fn landing(&self, entry: &TapEntry) -> Option<Position> {
        if !entry.fits(self.maps) {
            return None;
        }
        let column = self.maps[entry.rot()].column(entry.col());
        let row = column.landing_row(entry.row());
        Some(Position::new(entry.rot(), row, entry.col()))
    }

    fn collect(&self, set: &ReachableSet, out: &mut Vec<Position>) {
        for entry in set.entries() {
            if let Some(landing) = self.landing(entry) {
                out.push(landing);
                self.tucks(entry, landing, out);
            }
        }
    }

    /// Resting positions of every tuck issued from `entry` between its next
    /// tap slot and the frame it locks.
    fn tucks(&self, entry: &TapEntry, landing: Position, out: &mut Vec<Position>) {
        let Some(first_frame) = entry.next_tap_frame() else {
            return;
        };
        let lock_frame = self.level.last_frame_on_row(landing.row());
        let window = frame_range_mask(first_frame, lock_frame);
        if window == 0 {
            return;
        }

        for &tuck in self.tucks {
            let Some((rot, col)) = tuck.apply(self.rotations, entry.rot(), entry.col()) else {
                continue;
            };
            let column = self.maps[rot].column(col);
            let mut frames = tuck
                .start_frames(&self.masks, self.rotations, entry.rot(), entry.col())
                .union()
                & window;
            while frames != 0 {
                let frame = frames.trailing_zeros() as usize;
                frames &= frames - 1;
                let row = self.level.row_at_frame(frame + tuck.delta_frame());
                debug_assert!(column.is_open(row), "{tuck} lost its cell at frame {frame}");
                out.push(Position::new(rot, column.landing_row(row), col));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{BOARD_WIDTH, TapSpeed};

    use super::*;

    fn params(level: Level, adj_delay: usize, speed: TapSpeed) -> SearchParams {
        SearchParams {
            level,
            adj_delay,
            taps: speed.table(),
            double_tuck: false,
        }
    }

    fn is_resting(maps: &[Board], pos: Position) -> bool {
        let map = maps[pos.rot()];
        map.is_open(pos.row(), pos.col())
            && (pos.row() + 1 == Board::HEIGHT || !map.is_open(pos.row() + 1, pos.col()))
    }

    #[test]
    fn test_o_piece_on_empty_board() {
        let cache = ReachabilityCache::new();
        let moves = search_moves(
            &cache,
            &params(Level::Level18, 0, TapSpeed::Hz12),
            &Board::EMPTY,
            Piece::O,
        );
        assert!(moves.adj.is_empty());
        let expected: Vec<Position> = (1..BOARD_WIDTH).map(|c| Position::new(0, 18, c)).collect();
        assert_eq!(moves.non_adj, expected);
    }

    #[test]
    fn test_i_piece_reaches_both_walls() {
        let cache = ReachabilityCache::new();
        for level in [Level::Level18, Level::Level19] {
            for speed in TapSpeed::ALL {
                let moves = search_moves(&cache, &params(level, 0, speed), &Board::EMPTY, Piece::I);
                for pos in [
                    Position::new(0, 19, 2),
                    Position::new(0, 19, 8),
                    Position::new(1, 18, 0),
                    Position::new(1, 18, 9),
                ] {
                    assert!(moves.non_adj.contains(&pos), "{level} {speed}: {pos}");
                }
            }
        }
    }

    #[test]
    fn test_spawn_pocket_allows_only_rotations() {
        let mut rows = vec!["####...###", "#####.####"];
        rows.extend(["##########"; 18]);
        let board = Board::from_ascii(&rows.join("\n"));
        let cache = ReachabilityCache::new();
        let moves = search_moves(
            &cache,
            &params(Level::Level18, 0, TapSpeed::Hz30),
            &board,
            Piece::T,
        );
        // Every orientation sticks out above the board at the spawn column.
        let expected: Vec<Position> = (0..4).map(|rot| Position::new(rot, 0, 5)).collect();
        assert_eq!(moves.non_adj, expected);
        assert!(moves.adj.is_empty());
    }

    #[test]
    fn test_blocked_spawn_is_game_over() {
        let mut board = Board::EMPTY;
        board.set_filled(0, 5);
        let cache = ReachabilityCache::new();
        let moves = search_moves(
            &cache,
            &params(Level::Level19, 18, TapSpeed::Hz15),
            &board,
            Piece::J,
        );
        assert!(moves.is_empty());
    }

    #[test]
    fn test_tuck_under_overhang() {
        let board = Board::from_ascii(
            "
            #.........
            ..........
            ..........
            ",
        );
        let maps = board.piece_maps(Piece::O);
        let cache = ReachabilityCache::new();
        let moves = search_moves(
            &cache,
            &params(Level::Level18, 0, TapSpeed::Hz30),
            &board,
            Piece::O,
        );
        // Dropped straight down column 1, O rests on the overhang.
        assert!(moves.non_adj.contains(&Position::new(0, 15, 1)));
        // Falling down column 2 and tapping left on the last row slides it under.
        let tucked = Position::new(0, 18, 1);
        assert!(is_resting(&maps, tucked));
        assert!(moves.non_adj.contains(&tucked));
    }

    #[test]
    fn test_results_are_resting_sorted_and_unique() {
        let board = Board::from_ascii(
            "
            .#........
            ##...#..#.
            ###..##.##
            ####.#####
            ",
        );
        let cache = ReachabilityCache::new();
        for level in Level::ALL {
            for piece in Piece::ALL {
                let maps = board.piece_maps(piece);
                let moves = search_moves(&cache, &params(level, 21, TapSpeed::Hz20), &board, piece);
                assert!(moves.non_adj.windows(2).all(|w| w[0] < w[1]));
                assert!(moves.adj.windows(2).all(|w| w[0].0 < w[1].0));
                for &pos in &moves.non_adj {
                    assert!(is_resting(&maps, pos), "{level} {piece:?} {pos}");
                }
                for (premove, targets) in &moves.adj {
                    assert!(is_resting(&maps, *premove));
                    assert!(targets.contains(premove), "{premove} keeps no-adjustment option");
                    assert!(targets.windows(2).all(|w| w[0] < w[1]));
                    for &pos in targets {
                        assert!(is_resting(&maps, pos), "{level} {piece:?} {pos}");
                    }
                    assert_eq!(moves.adjustments(*premove), Some(targets.as_slice()));
                }
            }
        }
    }

    #[test]
    fn test_adjustment_delay_only_removes_non_adjustment_moves() {
        let board = Board::from_ascii(
            "
            .....#....
            #...###..#
            ",
        );
        let cache = ReachabilityCache::new();
        for piece in Piece::ALL {
            let without = search_moves(&cache, &params(Level::Level18, 0, TapSpeed::Hz15), &board, piece);
            let with = search_moves(&cache, &params(Level::Level18, 18, TapSpeed::Hz15), &board, piece);
            assert!(without.adj.is_empty());
            assert!(!with.adj.is_empty(), "{piece:?}");
            for pos in &with.non_adj {
                assert!(without.non_adj.contains(pos), "{piece:?} {pos}");
            }
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let board = Board::from_ascii(
            "
            ..#.......
            .##....#..
            ####..###.
            ",
        );
        let p = SearchParams {
            double_tuck: true,
            ..params(Level::Level19, 18, TapSpeed::Hz24)
        };
        let first = search_moves(&ReachabilityCache::new(), &p, &board, Piece::L);
        let cache = ReachabilityCache::new();
        let second = search_moves(&cache, &p, &board, Piece::L);
        let third = search_moves(&cache, &p, &board, Piece::L);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_search_params_deserialize_with_defaults() {
        let p: SearchParams = serde_json::from_str(
            r#"{"level":"Level29","adj_delay":21,"taps":[0,2,4,6,8,10,12,14,16,18]}"#,
        )
        .unwrap();
        assert_eq!(p, params(Level::Level29, 21, TapSpeed::Hz30));
        assert!(p.adjustment_enabled());
    }
}
