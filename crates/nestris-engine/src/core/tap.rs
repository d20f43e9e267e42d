use serde::{Deserialize, Serialize};

use crate::TapTableError;

/// Maximum number of taps in one input sequence.
pub const MAX_TAPS: usize = 10;

/// Frame offsets of the 0th…9th tap of an input sequence, relative to the
/// frame the sequence starts at.
///
/// Offsets increase strictly and consecutive taps are at least two frames
/// apart, since a held button has to be released before it can be pressed
/// again.
///
/// # Example
///
/// ```
/// use nestris_engine::{TapSpeed, TapTable};
///
/// let taps = TapSpeed::Hz15.table();
/// assert_eq!(taps.frame(3), 12);
/// assert!(TapTable::try_new([0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "[u8; MAX_TAPS]", into = "[u8; MAX_TAPS]")]
pub struct TapTable([u8; MAX_TAPS]);

impl TryFrom<[u8; MAX_TAPS]> for TapTable {
    type Error = TapTableError;

    fn try_from(frames: [u8; MAX_TAPS]) -> Result<Self, Self::Error> {
        Self::try_new(frames)
    }
}

impl From<TapTable> for [u8; MAX_TAPS] {
    fn from(table: TapTable) -> Self {
        table.0
    }
}

impl Default for TapTable {
    fn default() -> Self {
        TapSpeed::default().table()
    }
}

impl TapTable {
    #[must_use]
    pub const fn new(frames: [u8; MAX_TAPS]) -> Self {
        let mut i = 1;
        while i < MAX_TAPS {
            assert!(
                frames[i] as u16 >= frames[i - 1] as u16 + 2,
                "tap frames must be at least two frames apart"
            );
            i += 1;
        }
        Self(frames)
    }

    pub fn try_new(frames: [u8; MAX_TAPS]) -> Result<Self, TapTableError> {
        match frames.windows(2).position(|w| u16::from(w[1]) < u16::from(w[0]) + 2) {
            Some(i) => Err(TapTableError { index: i + 1 }),
            None => Ok(Self(frames)),
        }
    }

    /// Frame offset of the `index`-th tap.
    #[must_use]
    pub fn frame(self, index: usize) -> usize {
        usize::from(self.0[index])
    }

    #[must_use]
    pub fn frames(self) -> [u8; MAX_TAPS] {
        self.0
    }
}

/// Tap-rate presets.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::Display,
)]
pub enum TapSpeed {
    #[display("10Hz")]
    Hz10,
    #[display("12Hz")]
    Hz12,
    #[display("15Hz")]
    Hz15,
    #[display("20Hz")]
    Hz20,
    #[display("24Hz")]
    Hz24,
    #[default]
    #[display("30Hz")]
    Hz30,
    /// Four quick taps, a pause, four more taps.
    #[display("slow5")]
    Slow5,
}

impl TapSpeed {
    pub const ALL: [Self; 7] = [
        Self::Hz10,
        Self::Hz12,
        Self::Hz15,
        Self::Hz20,
        Self::Hz24,
        Self::Hz30,
        Self::Slow5,
    ];

    #[must_use]
    pub const fn table(self) -> TapTable {
        TapTable::new(match self {
            Self::Hz10 => [0, 6, 12, 18, 24, 30, 36, 42, 48, 54],
            Self::Hz12 => [0, 5, 10, 15, 20, 25, 30, 35, 40, 45],
            Self::Hz15 => [0, 4, 8, 12, 16, 20, 24, 28, 32, 36],
            Self::Hz20 => [0, 3, 6, 9, 12, 15, 18, 21, 24, 27],
            Self::Hz24 => [0, 3, 5, 8, 10, 13, 15, 18, 20, 23],
            Self::Hz30 => [0, 2, 4, 6, 8, 10, 12, 14, 16, 18],
            Self::Slow5 => [0, 2, 4, 6, 18, 20, 22, 24, 36, 38],
        })
    }
}
