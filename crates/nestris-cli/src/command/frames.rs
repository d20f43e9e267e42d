use std::path::PathBuf;

use anyhow::Context as _;
use nestris_engine::{
    FrameSequence, Position, ReachabilityCache, frame_sequence_adj, frame_sequence_start,
    search_moves, simulate,
};
use serde::Serialize;

use crate::util::Output;

use super::args::{ParamsArg, PieceArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct FramesArg {
    #[clap(flatten)]
    params: ParamsArg,
    #[clap(flatten)]
    piece: PieceArg,
    /// Placement to reach, as "rot,row,col"
    #[arg(long)]
    target: Position,
    /// Premove to head for until the adjustment delay, as "rot,row,col"
    #[arg(long)]
    premove: Option<Position>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FramesResult {
    target: Position,
    premove: Option<Position>,
    sequence: FrameSequence,
    taps: usize,
    lands_at: Position,
}

pub(crate) fn run(arg: &FramesArg) -> anyhow::Result<()> {
    let params = arg.params.load()?;
    let board = arg.piece.board();
    let piece = arg.piece.piece;

    let sequence = match arg.premove {
        None => frame_sequence_start(&params, &board, piece, arg.target)
            .with_context(|| format!("No input sequence reaches {}", arg.target))?,
        Some(premove) => {
            let cache = ReachabilityCache::new();
            let moves = search_moves(&cache, &params, &board, piece);
            let targets = moves
                .adjustments(premove)
                .with_context(|| format!("{premove} is not a premove of this search"))?;
            anyhow::ensure!(
                targets.binary_search(&arg.target).is_ok(),
                "{} cannot be reached by adjusting from {premove}",
                arg.target
            );
            let premove_seq = frame_sequence_start(&params, &board, piece, premove)
                .with_context(|| format!("No input sequence reaches premove {premove}"))?;
            frame_sequence_adj(&params, &board, piece, &premove_seq, premove, arg.target)
                .with_context(|| format!("No adjustment from {premove} to {}", arg.target))?
        }
    };

    let (lands_at, _) = simulate(params.level, &board.piece_maps(piece), &sequence, true);
    if lands_at != arg.target {
        tracing::warn!("inputs land at {lands_at} instead of {}", arg.target);
    }
    tracing::info!("{} inputs over {} frames", sequence.tap_count(), sequence.len());
    let result = FramesResult {
        target: arg.target,
        premove: arg.premove,
        taps: sequence.tap_count(),
        sequence,
        lands_at,
    };
    Output::save_json(&result, arg.output.as_deref())
}
