use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ParsePositionError;

use super::board::{BOARD_HEIGHT, BOARD_WIDTH};

/// Pose of a piece: rotation index plus the board cell of its reference cell.
///
/// Positions order by rotation, then row, then column, which is the order
/// every result list of the search is sorted in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    rot: u8,
    row: u8,
    col: u8,
}

#[derive(Deserialize)]
struct RawPosition {
    rot: u8,
    row: u8,
    col: u8,
}

impl TryFrom<RawPosition> for Position {
    type Error = ParsePositionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Self::checked(raw.rot, raw.row, raw.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.rot, self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    /// Parses `"rot,row,col"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(',').map(|f| f.trim().parse::<u8>());
        let (Some(Ok(rot)), Some(Ok(row)), Some(Ok(col)), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(ParsePositionError::Format);
        };
        Self::checked(rot, row, col)
    }
}

impl Position {
    /// Spawn pose of every piece.
    pub const START: Self = Self::new(0, 0, 5);
    /// Sentinel for "no position"; never a legal pose.
    pub const INVALID: Self = Self::new(0, 0, 0);

    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub const fn new(rot: usize, row: usize, col: usize) -> Self {
        assert!(rot < 4);
        assert!(row < BOARD_HEIGHT);
        assert!(col < BOARD_WIDTH);
        Self {
            rot: rot as u8,
            row: row as u8,
            col: col as u8,
        }
    }

    fn checked(rot: u8, row: u8, col: u8) -> Result<Self, ParsePositionError> {
        if rot >= 4 || usize::from(row) >= BOARD_HEIGHT || usize::from(col) >= BOARD_WIDTH {
            return Err(ParsePositionError::OutOfRange);
        }
        Ok(Self { rot, row, col })
    }

    #[must_use]
    pub fn rot(self) -> usize {
        usize::from(self.rot)
    }

    #[must_use]
    pub fn row(self) -> usize {
        usize::from(self.row)
    }

    #[must_use]
    pub fn col(self) -> usize {
        usize::from(self.col)
    }

    #[must_use]
    pub fn with_row(self, row: usize) -> Self {
        Self::new(self.rot(), row, self.col())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_order() {
        let mut positions = vec![
            Position::new(1, 0, 0),
            Position::new(0, 5, 2),
            Position::new(0, 5, 1),
            Position::new(0, 4, 9),
        ];
        positions.sort();
        assert_eq!(
            positions,
            [
                Position::new(0, 4, 9),
                Position::new(0, 5, 1),
                Position::new(0, 5, 2),
                Position::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn test_position_parse() {
        assert_eq!("2,18,3".parse::<Position>().unwrap(), Position::new(2, 18, 3));
        assert_eq!(" 0, 0 ,5".parse::<Position>().unwrap(), Position::START);
        assert!("2,18".parse::<Position>().is_err());
        assert!("2,18,3,1".parse::<Position>().is_err());
        assert!("4,0,0".parse::<Position>().is_err());
        assert!("0,20,0".parse::<Position>().is_err());
        assert!("a,b,c".parse::<Position>().is_err());
        assert_eq!(Position::new(3, 7, 1).to_string(), "3,7,1");
    }

    #[test]
    fn test_position_serialization() {
        let pos = Position::new(1, 17, 4);
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(json, r#"{"rot":1,"row":17,"col":4}"#);
        assert_eq!(serde_json::from_str::<Position>(&json).unwrap(), pos);
        assert!(serde_json::from_str::<Position>(r#"{"rot":0,"row":20,"col":4}"#).is_err());
    }
}
