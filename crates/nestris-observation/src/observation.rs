use nestris_engine::{
    BOARD_HEIGHT, BOARD_WIDTH, Board, ByteGrid, Piece, Position, ReachabilityCache, SearchParams,
    TapSpeed,
};
use serde::{Deserialize, Serialize};

use crate::{
    ObservationError,
    move_map::{MOVE_HAS_ADJ, calculate_move_map},
    progress::{level_by_lines, level_speed_by_lines, lines_to_transition, speed_index},
};

type Plane = [[f32; BOARD_WIDTH]; BOARD_HEIGHT];

const EMPTY_PLANE: Plane = [[0.0; BOARD_WIDTH]; BOARD_HEIGHT];
const ONES_PLANE: Plane = [[1.0; BOARD_WIDTH]; BOARD_HEIGHT];

/// Game state that is not part of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct GameProgress {
    pub lines: u32,
    pub tap_speed: TapSpeed,
    pub adj_delay: usize,
}

/// Feature tensors of one decision point.
///
/// | field       | shape      | contents                                                             |
/// |-------------|------------|----------------------------------------------------------------------|
/// | `board`     | 6 × 20 × 10 | board, ones, premove per rotation                                   |
/// | `meta`      | 32         | filled-cell group (5), piece (7), next piece (7), adjusting, speed and delay flags |
/// | `moves`     | 18 × 20 × 10 | board, ones, placements (4), premoves (4), premove (4), unused (4) |
/// | `move_meta` | 28         | speed class (4), lines-to-transition buckets (20), scalars (4)      |
/// | `meta_int`  | 2          | lines / 2, piece index                                              |
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub board: [Plane; 6],
    pub meta: [f32; 32],
    pub moves: [Plane; 18],
    pub move_meta: [f32; 28],
    pub meta_int: [i32; 2],
}

impl Observation {
    /// Builds the observation for placing `piece`.
    ///
    /// `adjustment` is `None` before the adjustment delay. After it, it holds
    /// the revealed next piece and the premove the current piece is heading
    /// for; the move planes then show that premove's adjustment targets.
    pub fn new(
        cache: &ReachabilityCache,
        grid: &ByteGrid,
        piece: Piece,
        adjustment: Option<(Piece, Position)>,
        progress: &GameProgress,
    ) -> Result<Self, ObservationError> {
        let board = Board::from_bytes(grid);
        let lines = progress.lines;
        let level_speed = level_speed_by_lines(lines);
        let params = SearchParams {
            level: level_speed,
            adj_delay: progress.adj_delay,
            taps: progress.tap_speed.table(),
            double_tuck: false,
        };
        let move_map = calculate_move_map(
            cache,
            &params,
            &board,
            piece,
            adjustment.map(|(_, premove)| premove),
        )?;

        let mut obs = Self {
            board: [EMPTY_PLANE; 6],
            meta: [0.0; 32],
            moves: [EMPTY_PLANE; 18],
            move_meta: [0.0; 28],
            meta_int: [0; 2],
        };

        for (row, cells) in grid.iter().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                obs.board[0][row][col] = f32::from(cell);
                obs.moves[0][row][col] = f32::from(cell);
            }
        }
        obs.board[1] = ONES_PLANE;
        obs.moves[1] = ONES_PLANE;
        for (rot, grid) in move_map.iter().enumerate() {
            for (row, cells) in grid.iter().enumerate() {
                for (col, &code) in cells.iter().enumerate() {
                    obs.moves[2 + rot][row][col] = f32::from(u8::from(code != 0));
                    obs.moves[6 + rot][row][col] = f32::from(u8::from(code == MOVE_HAS_ADJ));
                }
            }
        }

        let filled = board.count_filled();
        obs.meta[filled / 2 % 5] = 1.0;
        obs.meta[5 + piece.index()] = 1.0;
        if let Some((next, premove)) = adjustment {
            obs.board[2 + premove.rot()][premove.row()][premove.col()] = 1.0;
            obs.moves[10 + premove.rot()][premove.row()][premove.col()] = 1.0;
            obs.meta[12 + next.index()] = 1.0;
            obs.meta[19] = 1.0;
        }
        // Speed and delay flags; only one tap-speed/delay class is encoded so
        // far.
        obs.meta[20] = 1.0;
        obs.meta[24] = 1.0;

        obs.meta_int = [
            i32::try_from(lines / 2).unwrap_or(i32::MAX),
            i32::try_from(piece.index()).unwrap_or_default(),
        ];

        obs.fill_move_meta(lines, speed_index(level_speed), filled);
        Ok(obs)
    }

    #[expect(clippy::cast_precision_loss)]
    fn fill_move_meta(&mut self, lines: u32, speed: usize, filled: usize) {
        let level = level_by_lines(lines);
        let to_transition = lines_to_transition(lines);
        let pieces = (lines as usize * 10 + filled) / 4;

        self.move_meta[speed] = 1.0;
        let bucket = match to_transition {
            ..=10 => 4 + (to_transition - 1),
            11..=22 => 14 + (to_transition - 11) / 3,
            23..=40 => 18 + (to_transition - 22) / 6,
            41..=60 => 21 + (to_transition - 40) / 10,
            _ => 23,
        };
        self.move_meta[bucket as usize] = 1.0;
        self.move_meta[24] = to_transition as f32 * 0.01;
        self.move_meta[25] = (level - 18) as f32 * 0.1;
        self.move_meta[26] = lines as f32 * 0.01;
        self.move_meta[27] = pieces as f32 * 0.004;
    }
}

/// Observations after the adjustment delay for each possible next piece, in
/// [`Piece::ALL`] order. They differ only in the next-piece flags.
pub fn observe_all_next_pieces(
    cache: &ReachabilityCache,
    grid: &ByteGrid,
    piece: Piece,
    premove: Position,
    progress: &GameProgress,
) -> Result<Vec<Observation>, ObservationError> {
    let first = Observation::new(cache, grid, piece, Some((Piece::ALL[0], premove)), progress)?;
    let mut observations = Vec::with_capacity(Piece::LEN);
    for next in Piece::ALL {
        let mut obs = first.clone();
        obs.meta[12..12 + Piece::LEN].fill(0.0);
        obs.meta[12 + next.index()] = 1.0;
        observations.push(obs);
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use nestris_engine::search_moves;

    use super::*;

    fn progress(lines: u32, adj_delay: usize) -> GameProgress {
        GameProgress {
            lines,
            tap_speed: TapSpeed::Hz30,
            adj_delay,
        }
    }

    fn ones(values: &[f32]) -> Vec<usize> {
        values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| (v - 1.0).abs() < f32::EPSILON)
            .map(|(i, _)| i)
            .collect()
    }

    fn bottom_row_grid() -> ByteGrid {
        let mut grid = [[0; BOARD_WIDTH]; BOARD_HEIGHT];
        for cell in &mut grid[19][..6] {
            *cell = 1;
        }
        grid
    }

    #[test]
    fn test_before_adjustment() {
        let cache = ReachabilityCache::new();
        let grid = bottom_row_grid();
        let obs = Observation::new(&cache, &grid, Piece::L, None, &progress(125, 0)).unwrap();

        assert!((obs.board[0][19][0] - 1.0).abs() < f32::EPSILON);
        assert!(obs.board[0][18].iter().all(|&v| v == 0.0));
        assert_eq!(obs.board[1], ONES_PLANE);
        assert_eq!(obs.moves[0], obs.board[0]);
        assert!(obs.board[2..].iter().all(|plane| *plane == EMPTY_PLANE));
        assert!(obs.moves[6..].iter().all(|plane| *plane == EMPTY_PLANE));
        assert!(obs.moves[2..6].iter().any(|plane| *plane != EMPTY_PLANE));

        // 6 filled cells: group 3; piece L; speed and delay flags.
        assert_eq!(ones(&obs.meta), [3, 5 + Piece::L.index(), 20, 24]);
        assert_eq!(obs.meta_int, [62, 5]);

        // Level 18, 5 lines to go.
        assert_eq!(ones(&obs.move_meta), [0, 8]);
        assert!((obs.move_meta[24] - 0.05).abs() < 1e-6);
        assert!(obs.move_meta[25].abs() < 1e-6);
        assert!((obs.move_meta[26] - 1.25).abs() < 1e-6);
        assert!((obs.move_meta[27] - 314.0 * 0.004).abs() < 1e-6);
    }

    #[test]
    fn test_after_adjustment() {
        let cache = ReachabilityCache::new();
        let grid = [[0; BOARD_WIDTH]; BOARD_HEIGHT];
        let progress = progress(250, 18);
        let params = SearchParams {
            level: level_speed_by_lines(250),
            adj_delay: 18,
            taps: TapSpeed::Hz30.table(),
            double_tuck: false,
        };
        let moves = search_moves(&cache, &params, &Board::EMPTY, Piece::T);
        let (premove, targets) = moves.adj[0].clone();

        let obs = Observation::new(&cache, &grid, Piece::T, Some((Piece::I, premove)), &progress).unwrap();
        assert!((obs.board[2 + premove.rot()][premove.row()][premove.col()] - 1.0).abs() < f32::EPSILON);
        assert!((obs.moves[10 + premove.rot()][premove.row()][premove.col()] - 1.0).abs() < f32::EPSILON);
        let marked = obs.moves[2..6]
            .iter()
            .flatten()
            .flatten()
            .filter(|&&v| v != 0.0)
            .count();
        assert_eq!(marked, targets.len());
        assert!(ones(&obs.meta).contains(&(12 + Piece::I.index())));
        assert!(ones(&obs.meta).contains(&19));
        // Level 31: speed class 29.
        assert!((obs.move_meta[2] - 1.0).abs() < f32::EPSILON);

        let all = observe_all_next_pieces(&cache, &grid, Piece::T, premove, &progress).unwrap();
        assert_eq!(all.len(), Piece::LEN);
        for (next, obs) in Piece::ALL.into_iter().zip(&all) {
            let flags: Vec<usize> = ones(&obs.meta[12..19]);
            assert_eq!(flags, [next.index()]);
            assert_eq!(obs.moves, all[0].moves);
        }
    }

    #[test]
    fn test_game_over() {
        let grid = [[1; BOARD_WIDTH]; BOARD_HEIGHT];
        let cache = ReachabilityCache::new();
        assert_eq!(
            Observation::new(&cache, &grid, Piece::O, None, &progress(0, 0)),
            Err(ObservationError::GameOver)
        );
    }
}
