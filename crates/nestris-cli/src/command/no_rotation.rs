use std::path::PathBuf;

use anyhow::Context as _;
use nestris_engine::{FrameSequence, Position, no_rotation_sequence};
use serde::Serialize;

use crate::util::Output;

use super::args::PieceArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct NoRotationArg {
    #[clap(flatten)]
    piece: PieceArg,
    /// Placement to reach, as "0,row,col"
    #[arg(long)]
    target: Position,
    /// Shifts allowed per row; 0 allows one every other row
    #[arg(long, default_value_t = 1)]
    inputs_per_row: usize,
    /// Allow shifts on any row the piece passes
    #[arg(long)]
    tuck: bool,
    /// Frames the piece spends on each row
    #[arg(long, default_value_t = 3)]
    frames_per_drop: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct NoRotationResult {
    target: Position,
    sequence: FrameSequence,
    taps: usize,
}

pub(crate) fn run(arg: &NoRotationArg) -> anyhow::Result<()> {
    anyhow::ensure!(arg.frames_per_drop > 0, "--frames-per-drop must be positive");
    let sequence = no_rotation_sequence(
        &arg.piece.board(),
        arg.piece.piece,
        arg.inputs_per_row,
        arg.tuck,
        arg.frames_per_drop,
        arg.target,
    )
    .with_context(|| format!("{} is not reachable without rotation", arg.target))?;
    let result = NoRotationResult {
        target: arg.target,
        taps: sequence.tap_count(),
        sequence,
    };
    Output::save_json(&result, arg.output.as_deref())
}
