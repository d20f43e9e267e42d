use std::path::PathBuf;

use anyhow::Context as _;
use nestris_engine::{FrameSequence, Level, MoveSequence, Position, plan_path, synthesize_frames};
use serde::Serialize;

use crate::util::Output;

use super::args::{PieceArg, parse_level};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlanArg {
    #[clap(flatten)]
    piece: PieceArg,
    /// Game level; mapped to its gravity class
    #[arg(long, default_value = "18", value_parser = parse_level)]
    level: Level,
    /// Placement to reach, as "rot,row,col"
    #[arg(long)]
    target: Position,
    /// Pose to plan from, as "rot,row,col"
    #[arg(long, default_value = "0,0,5")]
    start: Position,
    /// Presses per second of one button
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=30))]
    tap_rate: u32,
    /// Inputs already committed before the planned ones
    #[arg(long)]
    prior: Option<FrameSequence>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PlanResult {
    path: String,
    moves: MoveSequence,
    sequence: Option<FrameSequence>,
}

pub(crate) fn run(arg: &PlanArg) -> anyhow::Result<()> {
    let maps = arg.piece.board().piece_maps(arg.piece.piece);
    let moves = plan_path(&maps, arg.start, arg.target);
    anyhow::ensure!(
        moves.is_valid(),
        "No path from {} to {}",
        arg.start,
        arg.target
    );
    tracing::info!("path: {moves}");

    let prior = arg.prior.clone().unwrap_or_default();
    let sequence = synthesize_frames(&moves, arg.tap_rate, arg.level, arg.start.row(), &prior);
    if sequence.is_none() {
        tracing::warn!("path cannot be played at {}Hz", arg.tap_rate);
    }
    let result = PlanResult {
        path: moves.to_string(),
        moves,
        sequence,
    };
    Output::save_json(&result, arg.output.as_deref()).context("Failed to save plan")
}
