use nestris_engine::{
    BOARD_HEIGHT, BOARD_WIDTH, Board, ByteGrid, Piece, Position, ReachabilityCache, SearchParams,
    search_moves,
};
use tracing::debug;

use crate::ObservationError;

/// Placement reachable without adjusting.
pub const MOVE_NO_ADJ: u8 = 1;
/// Premove that can still be adjusted after the delay.
pub const MOVE_HAS_ADJ: u8 = 2;

/// One grid per rotation, indexed `[rot][row][col]`.
pub type MoveMap = [ByteGrid; 4];

/// Marks the placements of `piece` on `board`.
///
/// Without a premove every non-adjustment placement gets [`MOVE_NO_ADJ`] and
/// every premove [`MOVE_HAS_ADJ`]. With a premove only the placements that
/// premove can be adjusted into are marked, all with [`MOVE_NO_ADJ`].
pub fn calculate_move_map(
    cache: &ReachabilityCache,
    params: &SearchParams,
    board: &Board,
    piece: Piece,
    premove: Option<Position>,
) -> Result<MoveMap, ObservationError> {
    let moves = search_moves(cache, params, board, piece);
    if moves.is_empty() {
        return Err(ObservationError::GameOver);
    }

    let mut map = [[[0; BOARD_WIDTH]; BOARD_HEIGHT]; 4];
    let mut mark = |pos: Position, code: u8| map[pos.rot()][pos.row()][pos.col()] = code;
    match premove {
        None => {
            for &pos in &moves.non_adj {
                mark(pos, MOVE_NO_ADJ);
            }
            for (pos, _) in &moves.adj {
                mark(*pos, MOVE_HAS_ADJ);
            }
        }
        Some(premove) => {
            let targets = moves
                .adjustments(premove)
                .ok_or(ObservationError::PremoveNotFound { premove })?;
            for &pos in targets {
                mark(pos, MOVE_NO_ADJ);
            }
        }
    }
    debug!(?piece, ?premove, non_adj = moves.non_adj.len(), adj = moves.adj.len(), "move map");
    Ok(map)
}
