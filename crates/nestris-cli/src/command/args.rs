use std::path::PathBuf;

use anyhow::Context as _;
use nestris_engine::{Board, Level, MAX_TAPS, Piece, SearchParams, TapSpeed, TapTable};

use crate::util;

/// Search parameters, from flags or a JSON file.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ParamsArg {
    /// Game level; mapped to its gravity class (18, 19, 29 or 39)
    #[arg(long, default_value = "18", value_parser = parse_level)]
    level: Level,
    /// Tap-rate preset: 10Hz, 12Hz, 15Hz, 20Hz, 24Hz, 30Hz or slow5
    #[arg(long, default_value = "30Hz", value_parser = parse_tap_speed)]
    tap_speed: TapSpeed,
    /// Custom tap frames, 10 comma-separated values (overrides --tap-speed)
    #[arg(long, value_delimiter = ',')]
    taps: Option<Vec<u8>>,
    /// Frames before the next piece is revealed; 0 disables adjustments
    #[arg(long, default_value_t = 0)]
    adj_delay: usize,
    /// Also search tucks of two inputs on consecutive frames
    #[arg(long)]
    double_tuck: bool,
    /// Read all search parameters from a JSON file
    #[arg(long, conflicts_with_all = ["level", "tap_speed", "taps", "adj_delay", "double_tuck"])]
    params: Option<PathBuf>,
}

impl ParamsArg {
    pub(crate) fn load(&self) -> anyhow::Result<SearchParams> {
        if let Some(path) = &self.params {
            return util::read_json_file("search parameters", path);
        }
        let taps = match &self.taps {
            Some(frames) => {
                let frames = <[u8; MAX_TAPS]>::try_from(frames.as_slice())
                    .with_context(|| format!("--taps needs {MAX_TAPS} frames, got {}", frames.len()))?;
                TapTable::try_new(frames)?
            }
            None => self.tap_speed.table(),
        };
        Ok(SearchParams {
            level: self.level,
            adj_delay: self.adj_delay,
            taps,
            double_tuck: self.double_tuck,
        })
    }
}

/// The board and the piece to place on it.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PieceArg {
    /// Board rows of 10 cells, bottom row last ('1' or 'X' is filled);
    /// empty without one
    #[arg(long)]
    board: Option<Board>,
    /// Piece letter: T, J, Z, O, S, L or I
    #[arg(long, value_parser = parse_piece)]
    pub(crate) piece: Piece,
}

impl PieceArg {
    pub(crate) fn board(&self) -> Board {
        self.board.unwrap_or(Board::EMPTY)
    }
}

pub(crate) fn parse_level(s: &str) -> Result<Level, String> {
    let level: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid level '{s}'"))?;
    Ok(Level::from_level(level))
}

pub(crate) fn parse_tap_speed(s: &str) -> Result<TapSpeed, String> {
    let s = s.trim();
    TapSpeed::ALL
        .into_iter()
        .find(|speed| {
            let name = speed.to_string();
            name.eq_ignore_ascii_case(s) || name.trim_end_matches("Hz") == s
        })
        .ok_or_else(|| format!("unknown tap speed '{s}'"))
}

pub(crate) fn parse_piece(s: &str) -> Result<Piece, String> {
    let mut chars = s.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            Piece::from_char(c.to_ascii_uppercase()).ok_or_else(|| format!("unknown piece '{s}'"))
        }
        _ => Err(format!("piece must be a single letter (got '{s}')")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("0"), Ok(Level::Level18));
        assert_eq!(parse_level("19"), Ok(Level::Level19));
        assert_eq!(parse_level("31"), Ok(Level::Level29));
        assert_eq!(parse_level("39"), Ok(Level::Level39));
        assert!(parse_level("fast").is_err());
    }

    #[test]
    fn test_parse_tap_speed() {
        assert_eq!(parse_tap_speed("12Hz"), Ok(TapSpeed::Hz12));
        assert_eq!(parse_tap_speed("12hz"), Ok(TapSpeed::Hz12));
        assert_eq!(parse_tap_speed("24"), Ok(TapSpeed::Hz24));
        assert_eq!(parse_tap_speed("slow5"), Ok(TapSpeed::Slow5));
        assert!(parse_tap_speed("11Hz").is_err());
    }

    #[test]
    fn test_parse_piece() {
        assert_eq!(parse_piece("t"), Ok(Piece::T));
        assert_eq!(parse_piece("I"), Ok(Piece::I));
        assert!(parse_piece("X").is_err());
        assert!(parse_piece("TT").is_err());
    }
}
