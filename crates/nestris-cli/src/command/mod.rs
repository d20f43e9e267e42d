use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use self::{
    adjust::AdjustArg, frames::FramesArg, no_rotation::NoRotationArg,
    observe::ObserveArg, plan::PlanArg, search::SearchArg, simulate::SimulateArg,
};

mod adjust;
mod args;
mod frames;
mod no_rotation;
mod observe;
mod plan;
mod search;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// List every placement a piece can reach
    Search(#[clap(flatten)] SearchArg),
    /// Frame inputs reaching a placement, optionally through a premove
    Frames(#[clap(flatten)] FramesArg),
    /// Frame inputs for a placement without rotation, with soft drop
    NoRotation(#[clap(flatten)] NoRotationArg),
    /// Plan a move path and synthesize it at a tap rate
    Plan(#[clap(flatten)] PlanArg),
    /// Replay frame inputs, optionally with timing noise
    Simulate(#[clap(flatten)] SimulateArg),
    /// Score premoves against the placement wanted for each next piece
    Adjust(#[clap(flatten)] AdjustArg),
    /// Build the feature tensors of a decision point
    Observe(#[clap(flatten)] ObserveArg),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(level)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.verbose);
    match &args.mode {
        Mode::Search(arg) => search::run(arg)?,
        Mode::Frames(arg) => frames::run(arg)?,
        Mode::NoRotation(arg) => no_rotation::run(arg)?,
        Mode::Plan(arg) => plan::run(arg)?,
        Mode::Simulate(arg) => simulate::run(arg)?,
        Mode::Adjust(arg) => adjust::run(arg)?,
        Mode::Observe(arg) => observe::run(arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let args = CommandArgs::try_parse_from([
            "nestris", "-vv", "search", "--piece", "T", "--level", "19", "--tap-speed", "15Hz",
            "--adj-delay", "18",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let Mode::Search(arg) = args.mode else {
            panic!("expected search");
        };
        let params = arg.params.load().unwrap();
        assert_eq!(params.level, nestris_engine::Level::Level19);
        assert_eq!(params.taps, nestris_engine::TapSpeed::Hz15.table());
        assert_eq!(params.adj_delay, 18);
        assert!(!params.double_tuck);
    }
}
