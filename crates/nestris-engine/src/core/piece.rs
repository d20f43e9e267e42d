use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

/// Cell offset `(row, column)` relative to a piece's reference cell.
pub type CellOffset = (i8, i8);

/// Tetromino type, in the NES piece-id order.
///
/// The order matters: it indexes the next-piece transition table and the
/// observation tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[repr(u8)]
pub enum Piece {
    /// T-piece.
    T = 0,
    /// J-piece.
    J = 1,
    /// Z-piece.
    Z = 2,
    /// O-piece.
    O = 3,
    /// S-piece.
    S = 4,
    /// L-piece.
    L = 5,
    /// I-piece.
    I = 6,
}

impl Distribution<Piece> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Piece {
        Piece::ALL[rng.random_range(0..Piece::LEN)]
    }
}

impl Piece {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::T,
        Self::J,
        Self::Z,
        Self::O,
        Self::S,
        Self::L,
        Self::I,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the piece with the given NES piece id.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::LEN {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Number of distinct orientations: 4 for T/J/L, 2 for Z/S/I, 1 for O.
    #[must_use]
    pub const fn rotations(self) -> usize {
        match self {
            Self::T | Self::J | Self::L => 4,
            Self::Z | Self::S | Self::I => 2,
            Self::O => 1,
        }
    }

    /// Cell offsets of the piece in the given rotation.
    ///
    /// Rotation indices advance clockwise (the A button).
    #[must_use]
    pub fn cells(self, rotation: usize) -> &'static [CellOffset; 4] {
        assert!(
            rotation < self.rotations(),
            "rotation {rotation} out of range for {self:?}"
        );
        &PIECE_CELLS[self.index()][rotation]
    }

    /// Returns the single character representation of this piece.
    ///
    /// # Examples
    ///
    /// ```
    /// use nestris_engine::Piece;
    ///
    /// assert_eq!(Piece::I.as_char(), 'I');
    /// assert_eq!(Piece::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Piece::T => 'T',
            Piece::J => 'J',
            Piece::Z => 'Z',
            Piece::O => 'O',
            Piece::S => 'S',
            Piece::L => 'L',
            Piece::I => 'I',
        }
    }

    /// Parses a piece from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use nestris_engine::Piece;
    ///
    /// assert_eq!(Piece::from_char('I'), Some(Piece::I));
    /// assert_eq!(Piece::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'T' => Some(Piece::T),
            'J' => Some(Piece::J),
            'Z' => Some(Piece::Z),
            'O' => Some(Piece::O),
            'S' => Some(Piece::S),
            'L' => Some(Piece::L),
            'I' => Some(Piece::I),
            _ => None,
        }
    }
}

// Unused rotation slots repeat the last defined orientation and are never read.
const PIECE_CELLS: [[[CellOffset; 4]; 4]; Piece::LEN] = [
    // T
    [
        [(0, -1), (0, 0), (0, 1), (1, 0)],
        [(-1, 0), (0, -1), (0, 0), (1, 0)],
        [(-1, 0), (0, -1), (0, 0), (0, 1)],
        [(-1, 0), (0, 0), (0, 1), (1, 0)],
    ],
    // J
    [
        [(0, -1), (0, 0), (0, 1), (1, 1)],
        [(-1, 0), (0, 0), (1, -1), (1, 0)],
        [(-1, -1), (0, -1), (0, 0), (0, 1)],
        [(-1, 0), (-1, 1), (0, 0), (1, 0)],
    ],
    // Z
    [
        [(0, -1), (0, 0), (1, 0), (1, 1)],
        [(-1, 1), (0, 0), (0, 1), (1, 0)],
        [(-1, 1), (0, 0), (0, 1), (1, 0)],
        [(-1, 1), (0, 0), (0, 1), (1, 0)],
    ],
    // O
    [
        [(0, -1), (0, 0), (1, -1), (1, 0)],
        [(0, -1), (0, 0), (1, -1), (1, 0)],
        [(0, -1), (0, 0), (1, -1), (1, 0)],
        [(0, -1), (0, 0), (1, -1), (1, 0)],
    ],
    // S
    [
        [(0, 0), (0, 1), (1, -1), (1, 0)],
        [(-1, 0), (0, 0), (0, 1), (1, 1)],
        [(-1, 0), (0, 0), (0, 1), (1, 1)],
        [(-1, 0), (0, 0), (0, 1), (1, 1)],
    ],
    // L
    [
        [(0, -1), (0, 0), (0, 1), (1, -1)],
        [(-1, -1), (-1, 0), (0, 0), (1, 0)],
        [(-1, 1), (0, -1), (0, 0), (0, 1)],
        [(-1, 0), (0, 0), (1, 0), (1, 1)],
    ],
    // I
    [
        [(0, -2), (0, -1), (0, 0), (0, 1)],
        [(-2, 0), (-1, 0), (0, 0), (1, 0)],
        [(-2, 0), (-1, 0), (0, 0), (1, 0)],
        [(-2, 0), (-1, 0), (0, 0), (1, 0)],
    ],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_char_conversion() {
        for piece in Piece::ALL {
            assert_eq!(Piece::from_char(piece.as_char()), Some(piece));
        }
        assert_eq!(Piece::from_char('X'), None);
        assert_eq!(Piece::from_char('t'), None);
    }

    #[test]
    fn test_piece_index_order() {
        let chars: String = Piece::ALL.iter().map(|p| p.as_char()).collect();
        assert_eq!(chars, "TJZOSLI");
        for (i, piece) in Piece::ALL.into_iter().enumerate() {
            assert_eq!(piece.index(), i);
            assert_eq!(Piece::from_index(i), Some(piece));
        }
        assert_eq!(Piece::from_index(7), None);
    }

    #[test]
    fn test_cells_are_distinct_and_contain_reference() {
        for piece in Piece::ALL {
            for rot in 0..piece.rotations() {
                let cells = piece.cells(rot);
                assert!(cells.contains(&(0, 0)), "{piece:?} rot {rot}");
                for i in 0..4 {
                    for j in i + 1..4 {
                        assert_ne!(cells[i], cells[j], "{piece:?} rot {rot}");
                    }
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_cells_rejects_unused_rotation() {
        let _ = Piece::O.cells(1);
    }
}
