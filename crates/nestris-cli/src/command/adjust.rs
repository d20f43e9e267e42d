use std::path::PathBuf;

use anyhow::Context as _;
use nestris_engine::{
    AdjustmentChoice, AdjustmentInfo, BestAdjMode, Piece, Position, ReachabilityCache,
    adjustment_infos, best_adjustment, best_adjustment_modes, search_moves,
};
use serde::Serialize;

use crate::util::Output;

use super::args::{ParamsArg, PieceArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AdjustArg {
    #[clap(flatten)]
    params: ParamsArg,
    #[clap(flatten)]
    piece: PieceArg,
    /// Placement wanted for each next piece, in T J Z O S L I order, each as
    /// "rot,row,col"
    #[arg(long, num_args = Piece::LEN, required = true)]
    wanted: Vec<Position>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ModeBest {
    mode: String,
    premove: Position,
}

#[derive(Debug, Serialize)]
struct AdjustResult {
    best: Vec<ModeBest>,
    choices: Vec<AdjustmentChoice>,
    infos: Vec<AdjustmentInfo>,
}

pub(crate) fn run(arg: &AdjustArg) -> anyhow::Result<()> {
    let params = arg.params.load()?;
    anyhow::ensure!(
        params.adjustment_enabled(),
        "Adjustments need a positive --adj-delay"
    );
    let wanted: [Position; Piece::LEN] = arg
        .wanted
        .as_slice()
        .try_into()
        .with_context(|| format!("--wanted needs {} placements", Piece::LEN))?;
    let board = arg.piece.board();
    let piece = arg.piece.piece;

    let cache = ReachabilityCache::new();
    let moves = search_moves(&cache, &params, &board, piece);
    let infos = adjustment_infos(&params, &board, piece, &moves, &wanted);
    tracing::info!(
        "{} of {} premoves reach every wanted placement",
        infos.len(),
        moves.adj.len()
    );

    let best = BestAdjMode::ALL
        .into_iter()
        .filter_map(|mode| {
            let (index, _) = best_adjustment(&infos, mode)?;
            Some(ModeBest {
                mode: mode.to_string(),
                premove: moves.adj[index].0,
            })
        })
        .collect();
    let result = AdjustResult {
        best,
        choices: best_adjustment_modes(&infos, &moves),
        infos,
    };
    Output::save_json(&result, arg.output.as_deref())
}
