use std::path::PathBuf;

use nestris_engine::{Position, ReachabilityCache, TapSpeed};
use nestris_observation::{GameProgress, Observation, observe_all_next_pieces};

use crate::util::Output;

use super::args::{PieceArg, parse_tap_speed};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ObserveArg {
    #[clap(flatten)]
    piece: PieceArg,
    /// Lines cleared so far; sets the level
    #[arg(long, default_value_t = 0)]
    lines: u32,
    /// Tap-rate preset
    #[arg(long, default_value = "30Hz", value_parser = parse_tap_speed)]
    tap_speed: TapSpeed,
    /// Frames before the next piece is revealed; 0 disables adjustments
    #[arg(long, default_value_t = 0)]
    adj_delay: usize,
    /// Premove the piece heads for; emits one observation per next piece
    #[arg(long)]
    premove: Option<Position>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ObserveArg) -> anyhow::Result<()> {
    let grid = arg.piece.board().to_bytes();
    let progress = GameProgress {
        lines: arg.lines,
        tap_speed: arg.tap_speed,
        adj_delay: arg.adj_delay,
    };
    let cache = ReachabilityCache::new();
    match arg.premove {
        None => {
            let obs = Observation::new(&cache, &grid, arg.piece.piece, None, &progress)?;
            Output::save_json(&obs, arg.output.as_deref())
        }
        Some(premove) => {
            let all = observe_all_next_pieces(&cache, &grid, arg.piece.piece, premove, &progress)?;
            Output::save_json(&all, arg.output.as_deref())
        }
    }
}
