use std::path::PathBuf;

use nestris_engine::{ReachabilityCache, search_moves};

use crate::util::Output;

use super::args::{ParamsArg, PieceArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SearchArg {
    #[clap(flatten)]
    pub(crate) params: ParamsArg,
    #[clap(flatten)]
    pub(crate) piece: PieceArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SearchArg) -> anyhow::Result<()> {
    let params = arg.params.load()?;
    let board = arg.piece.board();
    let cache = ReachabilityCache::new();
    let moves = search_moves(&cache, &params, &board, arg.piece.piece);
    tracing::info!(
        "{} placements without adjustment, {} premoves",
        moves.non_adj.len(),
        moves.adj.len()
    );
    Output::save_json(&moves, arg.output.as_deref())
}
