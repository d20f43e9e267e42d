//! `nestris` command line: move search, input synthesis and replay for NES
//! Tetris, with JSON output.

mod command;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
