use std::path::PathBuf;

use nestris_engine::{FrameSequence, Level, Position, TimingNoise, landing_distribution, simulate};
use serde::Serialize;

use crate::util::Output;

use super::args::{PieceArg, parse_level};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    piece: PieceArg,
    /// Game level; mapped to its gravity class
    #[arg(long, default_value = "18", value_parser = parse_level)]
    level: Level,
    /// Frame inputs, e.g. "L - - RA - D"
    #[arg(long)]
    sequence: FrameSequence,
    /// Keep falling after the last input until the piece locks
    #[arg(long)]
    until_lock: bool,
    /// Delay inputs by normally distributed frames with this deviation and
    /// report where the piece lands
    #[arg(long)]
    noise: Option<f64>,
    /// Noisy replays to run
    #[arg(long, default_value_t = 1000)]
    samples: usize,
    /// Seed of the noise generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Replay {
    position: Position,
    locked: bool,
}

#[derive(Debug, Serialize)]
struct Landing {
    position: Position,
    count: usize,
    share: f64,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let maps = arg.piece.board().piece_maps(arg.piece.piece);
    let Some(stddev) = arg.noise else {
        let (position, locked) = simulate(arg.level, &maps, &arg.sequence, arg.until_lock);
        return Output::save_json(&Replay { position, locked }, arg.output.as_deref());
    };

    anyhow::ensure!(arg.samples > 0, "--samples must be positive");
    let noise = TimingNoise::new(stddev)?;
    let distribution =
        landing_distribution(arg.level, &maps, &arg.sequence, noise, arg.samples, arg.seed);
    tracing::info!(
        "{} samples landed on {} placements",
        arg.samples,
        distribution.len()
    );
    #[expect(clippy::cast_precision_loss)]
    let landings: Vec<Landing> = distribution
        .into_iter()
        .map(|(position, count)| Landing {
            position,
            count,
            share: count as f64 / arg.samples as f64,
        })
        .collect();
    Output::save_json(&landings, arg.output.as_deref())
}
