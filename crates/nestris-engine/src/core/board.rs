use std::{
    fmt::{self, Write as _},
    ops::BitAnd,
    str::FromStr,
};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::ParseBoardError;

use super::{piece::Piece, position::Position};

pub const BOARD_HEIGHT: usize = 20;
pub const BOARD_WIDTH: usize = 10;

const COLUMN_BITS: u64 = (1 << BOARD_HEIGHT) - 1;
const FULL_ROW: u16 = (1 << BOARD_WIDTH) - 1;

// Word index and bit offset of each column. A column spans 20 row bits
// followed by one pad bit that always stays 0 (solid).
const COLUMN_SLOTS: [(usize, u32); BOARD_WIDTH] = [
    (0, 0),
    (0, 21),
    (0, 42),
    (1, 0),
    (1, 21),
    (1, 42),
    (2, 0),
    (2, 21),
    (3, 0),
    (3, 21),
];

const OPEN_WORDS: [u64; 4] = {
    let mut words = [0; 4];
    let mut col = 0;
    while col < BOARD_WIDTH {
        let (word, offset) = COLUMN_SLOTS[col];
        words[word] |= COLUMN_BITS << offset;
        col += 1;
    }
    words
};

const TOP_ROW_WORDS: [u64; 4] = {
    let mut words = [0; 4];
    let mut col = 0;
    while col < BOARD_WIDTH {
        let (word, offset) = COLUMN_SLOTS[col];
        words[word] |= 1 << offset;
        col += 1;
    }
    words
};

/// Byte-per-cell board image; non-zero means filled. Row 0 is the top.
pub type ByteGrid = [[u8; BOARD_WIDTH]; BOARD_HEIGHT];

/// One [`Board`] per rotation of a piece, see [`Board::piece_maps`].
pub type PieceMaps = ArrayVec<Board, 4>;

/// Open cells of a single board column; bit `r` is set when row `r` is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Column(u32);

impl Column {
    #[expect(clippy::cast_possible_truncation)]
    pub const OPEN: Self = Self(COLUMN_BITS as u32);
    pub const SOLID: Self = Self(0);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::OPEN.0)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Rows at or below the board bottom are never open.
    #[must_use]
    pub const fn is_open(self, row: usize) -> bool {
        row < BOARD_HEIGHT && (self.0 >> row) & 1 != 0
    }

    /// Checks that every row in `start..=end` is open.
    #[must_use]
    pub const fn is_range_open(self, start: usize, end: usize) -> bool {
        if end >= BOARD_HEIGHT {
            return false;
        }
        if start > end {
            return true;
        }
        let mask = ((2 << end) - 1) & !((1 << start) - 1);
        self.0 & mask == mask
    }

    /// Last open row of the open run containing `row`, i.e. where a piece
    /// falling from `row` comes to rest.
    #[must_use]
    pub fn landing_row(self, row: usize) -> usize {
        assert!(self.is_open(row), "row {row} is not open");
        let carry = (self.0 + (1 << row)) ^ self.0;
        (30 - carry.leading_zeros()) as usize
    }

    /// First open row of the open run containing `row`.
    #[must_use]
    pub fn run_top(self, row: usize) -> usize {
        assert!(self.is_open(row), "row {row} is not open");
        let starts = !((self.0 << 1) | (u32::MAX << (row + 1)));
        (31 - starts.leading_zeros()) as usize
    }
}

/// 20×10 NES playfield packed into four words.
///
/// Columns 0-2, 3-5, 6-7 and 8-9 share a word; each column is 20 row bits
/// plus a solid pad bit, so shifting a whole word by one row pulls solid
/// cells in from outside the board. Bit value 1 means *open*.
///
/// Boards are plain values: every mutation besides the cell setters returns
/// a new board.
///
/// # Example
///
/// ```
/// use nestris_engine::{Board, Piece, Position};
///
/// let board = Board::EMPTY.place(Piece::I, Position::new(0, 19, 5));
/// assert_eq!(board.count_filled(), 4);
///
/// let maps = board.piece_maps(Piece::O);
/// assert!(maps[0].is_open(17, 4));
/// assert!(!maps[0].is_open(18, 4));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    words: [u64; 4],
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BitAnd for Board {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        let mut words = self.words;
        for (w, r) in words.iter_mut().zip(rhs.words) {
            *w &= r;
        }
        Self { words }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_HEIGHT {
            if row > 0 {
                f.write_char('\n')?;
            }
            for col in 0..BOARD_WIDTH {
                f.write_char(if self.is_open(row, col) { '.' } else { '#' })?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board(")?;
        writeln!(f, "{self}")?;
        write!(f, ")")
    }
}

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_notation(s)
    }
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "000,000,...,3fe" (filled-cell mask of each row, top first)
        let mut hex_string = String::with_capacity(BOARD_HEIGHT * 4);
        for row in 0..BOARD_HEIGHT {
            if row > 0 {
                hex_string.push(',');
            }
            write!(&mut hex_string, "{:03x}", self.row_mask(row))
                .map_err(serde::ser::Error::custom)?;
        }
        serializer.serialize_str(&hex_string)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != BOARD_HEIGHT {
            return Err(serde::de::Error::custom(format!(
                "expected {} comma-separated hex values, got {}",
                BOARD_HEIGHT,
                parts.len()
            )));
        }

        let mut board = Board::EMPTY;
        for (row, hex_str) in parts.iter().enumerate() {
            let bits = u16::from_str_radix(hex_str, 16).map_err(|e| {
                serde::de::Error::custom(format!("invalid hex at row {row}: {hex_str} ({e})"))
            })?;
            if bits > FULL_ROW {
                return Err(serde::de::Error::custom(format!(
                    "row {row} has bits outside the board: {hex_str}"
                )));
            }
            board.set_row_mask(row, bits);
        }
        Ok(board)
    }
}

impl Board {
    pub const HEIGHT: usize = BOARD_HEIGHT;
    pub const WIDTH: usize = BOARD_WIDTH;

    /// Board with every cell open.
    pub const EMPTY: Self = Self { words: OPEN_WORDS };
    /// Board with every cell filled.
    pub const FULL: Self = Self { words: [0; 4] };

    fn slot(col: usize) -> (usize, u32) {
        assert!(col < BOARD_WIDTH, "column {col} out of range");
        COLUMN_SLOTS[col]
    }

    #[expect(clippy::cast_possible_truncation)]
    fn cell_bit(row: usize, col: usize) -> (usize, u64) {
        assert!(row < BOARD_HEIGHT, "row {row} out of range");
        let (word, offset) = Self::slot(col);
        (word, 1 << (offset + row as u32))
    }

    #[must_use]
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        let (word, bit) = Self::cell_bit(row, col);
        self.words[word] & bit != 0
    }

    #[must_use]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        !self.is_open(row, col)
    }

    pub fn set_filled(&mut self, row: usize, col: usize) {
        let (word, bit) = Self::cell_bit(row, col);
        self.words[word] &= !bit;
    }

    pub fn set_empty(&mut self, row: usize, col: usize) {
        let (word, bit) = Self::cell_bit(row, col);
        self.words[word] |= bit;
    }

    #[must_use]
    pub fn count_filled(&self) -> usize {
        let open: u32 = self.words.iter().map(|w| w.count_ones()).sum();
        BOARD_HEIGHT * BOARD_WIDTH - open as usize
    }

    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn column(&self, col: usize) -> Column {
        let (word, offset) = Self::slot(col);
        Column(((self.words[word] >> offset) & COLUMN_BITS) as u32)
    }

    pub fn set_column(&mut self, col: usize, column: Column) {
        let (word, offset) = Self::slot(col);
        self.words[word] &= !(COLUMN_BITS << offset);
        self.words[word] |= u64::from(column.bits()) << offset;
    }

    /// Filled-cell mask of a row; bit `c` is set when column `c` is filled.
    #[must_use]
    pub fn row_mask(&self, row: usize) -> u16 {
        (0..BOARD_WIDTH)
            .filter(|&col| self.is_filled(row, col))
            .fold(0, |mask, col| mask | (1 << col))
    }

    fn set_row_mask(&mut self, row: usize, filled: u16) {
        for col in 0..BOARD_WIDTH {
            if filled & (1 << col) != 0 {
                self.set_filled(row, col);
            } else {
                self.set_empty(row, col);
            }
        }
    }

    /// Returns `true` if every open cell of `required` is open in `self`.
    #[must_use]
    pub fn contains(&self, required: &Board) -> bool {
        self.words
            .iter()
            .zip(&required.words)
            .all(|(have, need)| need & !have == 0)
    }

    #[must_use]
    pub fn from_bytes(grid: &ByteGrid) -> Self {
        let mut board = Self::EMPTY;
        for (row, cells) in grid.iter().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                if cell != 0 {
                    board.set_filled(row, col);
                }
            }
        }
        board
    }

    #[must_use]
    pub fn to_bytes(&self) -> ByteGrid {
        let mut grid = [[0; BOARD_WIDTH]; BOARD_HEIGHT];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = u8::from(self.is_filled(row, col));
            }
        }
        grid
    }

    /// Parses the compact text notation.
    ///
    /// `'1'`, `'X'` and `'O'` mark filled cells, any other character is
    /// empty, line breaks are ignored. Cells are read 10 per row and the last
    /// row read is the bottom row; rows not given are empty.
    pub fn from_notation(s: &str) -> Result<Self, ParseBoardError> {
        let cells: Vec<bool> = s
            .chars()
            .filter(|c| !matches!(c, '\n' | '\r'))
            .map(|c| matches!(c, '1' | 'X' | 'O'))
            .collect();
        if cells.len() % BOARD_WIDTH != 0 || cells.len() > BOARD_WIDTH * BOARD_HEIGHT {
            return Err(ParseBoardError { cells: cells.len() });
        }

        let top = BOARD_HEIGHT - cells.len() / BOARD_WIDTH;
        let mut board = Self::EMPTY;
        for (i, row_cells) in cells.chunks(BOARD_WIDTH).enumerate() {
            for (col, &filled) in row_cells.iter().enumerate() {
                if filled {
                    board.set_filled(top + i, col);
                }
            }
        }
        Ok(board)
    }

    /// Formats the board as 200 `'0'`/`'1'` characters, top row first.
    #[must_use]
    pub fn to_notation(&self) -> String {
        let mut s = String::with_capacity(BOARD_HEIGHT * BOARD_WIDTH);
        for row in 0..BOARD_HEIGHT {
            for col in 0..BOARD_WIDTH {
                s.push(if self.is_filled(row, col) { '1' } else { '0' });
            }
        }
        s
    }

    /// Creates a `Board` from ASCII art for tests and examples.
    ///
    /// `'#'` is a filled cell, `'.'` an empty one. Rows are given top to
    /// bottom and are aligned to the bottom of the board.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let lines: Vec<Vec<char>> = art
            .lines()
            .map(|line| line.chars().filter(|c| *c == '#' || *c == '.').collect())
            .filter(|chars: &Vec<char>| !chars.is_empty())
            .collect();
        assert!(lines.len() <= BOARD_HEIGHT, "too many rows: {}", lines.len());

        let top = BOARD_HEIGHT - lines.len();
        let mut board = Self::EMPTY;
        for (i, chars) in lines.iter().enumerate() {
            assert_eq!(
                chars.len(),
                BOARD_WIDTH,
                "Each row must have exactly {} cells, got {} at row {}",
                BOARD_WIDTH,
                chars.len(),
                i
            );
            for (col, &ch) in chars.iter().enumerate() {
                if ch == '#' {
                    board.set_filled(top + i, col);
                }
            }
        }
        board
    }

    /// Returns the board seen from an offset: cell `(r, c)` of the result is
    /// cell `(r + drow, c + dcol)` of `self`.
    ///
    /// Cells left, right or below the board are solid. Cells above the top
    /// row are open, as pieces may stick out above the playfield.
    #[must_use]
    pub fn shifted(&self, drow: isize, dcol: isize) -> Self {
        let mut words = self.words;
        for _ in 0..drow.unsigned_abs() {
            for ((w, open), top) in words.iter_mut().zip(OPEN_WORDS).zip(TOP_ROW_WORDS) {
                *w = if drow > 0 {
                    (*w >> 1) & open
                } else {
                    ((*w << 1) & open) | top
                };
            }
        }
        let rows_shifted = Self { words };
        if dcol == 0 {
            return rows_shifted;
        }

        let mut board = Self::FULL;
        for col in 0..BOARD_WIDTH {
            if let Some(src) = col.checked_add_signed(dcol).filter(|&c| c < BOARD_WIDTH) {
                board.set_column(col, rows_shifted.column(src));
            }
        }
        board
    }

    /// Positions the piece's reference cell can occupy in one rotation.
    ///
    /// Cell `(r, c)` of the result is open iff all four cells of the piece
    /// are open when its reference cell sits at `(r, c)`. Cells above the
    /// top row count as open, any other off-board cell as filled.
    #[must_use]
    pub fn piece_map(&self, piece: Piece, rotation: usize) -> Self {
        piece
            .cells(rotation)
            .iter()
            .fold(Self::EMPTY, |map, &(dr, dc)| {
                map & self.shifted(isize::from(dr), isize::from(dc))
            })
    }

    #[must_use]
    pub fn piece_maps(&self, piece: Piece) -> PieceMaps {
        (0..piece.rotations())
            .map(|rot| self.piece_map(piece, rot))
            .collect()
    }

    /// Returns a copy of the board with the piece's cells filled.
    ///
    /// Cells above the top row are dropped.
    #[must_use]
    pub fn place(&self, piece: Piece, pos: Position) -> Self {
        let mut board = *self;
        for &(dr, dc) in piece.cells(pos.rot()) {
            let Some(col) = pos.col().checked_add_signed(isize::from(dc)) else {
                panic!("{piece:?} at {pos} leaves the board");
            };
            if let Some(row) = pos.row().checked_add_signed(isize::from(dr)) {
                board.set_filled(row, col);
            }
        }
        board
    }

    /// Removes every completely filled row and returns the number removed
    /// with the compacted board. Vacated rows at the top are empty.
    #[must_use]
    pub fn clear_lines(&self) -> (usize, Self) {
        let mut board = Self::EMPTY;
        let mut cleared = 0;
        for row in (0..BOARD_HEIGHT).rev() {
            let filled = self.row_mask(row);
            if filled == FULL_ROW {
                cleared += 1;
                continue;
            }
            board.set_row_mask(row + cleared, filled);
        }
        (cleared, board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_full_board() {
        for row in 0..BOARD_HEIGHT {
            for col in 0..BOARD_WIDTH {
                assert!(Board::EMPTY.is_open(row, col));
                assert!(Board::FULL.is_filled(row, col));
            }
        }
        assert_eq!(Board::EMPTY.count_filled(), 0);
        assert_eq!(Board::FULL.count_filled(), 200);
    }

    #[test]
    fn test_set_and_check_cell() {
        let mut board = Board::EMPTY;
        board.set_filled(19, 9);
        board.set_filled(0, 0);
        assert!(board.is_filled(19, 9));
        assert!(board.is_filled(0, 0));
        assert!(board.is_open(19, 8));
        assert_eq!(board.count_filled(), 2);

        board.set_empty(19, 9);
        assert!(board.is_open(19, 9));
        assert_eq!(board.count_filled(), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_cell_out_of_range_panics() {
        let _ = Board::EMPTY.is_open(20, 0);
    }

    #[test]
    fn test_column_queries() {
        let mut board = Board::EMPTY;
        board.set_filled(5, 3);
        board.set_filled(12, 3);
        let column = board.column(3);
        assert!(column.is_open(4));
        assert!(!column.is_open(5));
        assert!(!column.is_open(20));
        assert!(column.is_range_open(6, 11));
        assert!(!column.is_range_open(4, 6));
        assert_eq!(column.landing_row(0), 4);
        assert_eq!(column.landing_row(6), 11);
        assert_eq!(column.landing_row(13), 19);
        assert_eq!(column.run_top(4), 0);
        assert_eq!(column.run_top(11), 6);
        assert_eq!(column.run_top(19), 13);
        assert_eq!(board.column(4), Column::OPEN);
    }

    #[test]
    fn test_shifted_edges() {
        let board = Board::FULL;
        let up = board.shifted(-2, 0);
        assert!(up.is_open(0, 9));
        assert!(up.is_open(1, 9));
        assert!(up.is_filled(2, 9));
        assert_eq!(up.count_filled(), 180);

        let board = Board::EMPTY;
        let down = board.shifted(1, 0);
        assert!(down.is_open(18, 0));
        assert!(down.is_filled(19, 0));
        let left = board.shifted(0, -1);
        assert!(left.is_filled(7, 0));
        assert!(left.is_open(7, 1));
        let right = board.shifted(0, 2);
        assert!(right.is_filled(7, 8));
        assert!(right.is_filled(7, 9));
        assert!(right.is_open(7, 7));
    }

    #[test]
    fn test_shifted_moves_cells() {
        let mut board = Board::FULL;
        board.set_empty(10, 4);
        let shifted = board.shifted(1, -1);
        assert!(shifted.is_open(9, 5));
        assert_eq!(shifted.count_filled(), 199);
    }

    #[test]
    fn test_piece_map_on_empty_board() {
        let maps = Board::EMPTY.piece_maps(Piece::I);
        assert_eq!(maps.len(), 2);
        // Horizontal I: reference cell is the third of four.
        assert!(!maps[0].is_open(0, 1));
        assert!(maps[0].is_open(0, 2));
        assert!(maps[0].is_open(19, 8));
        assert!(!maps[0].is_open(19, 9));
        // Vertical I spans two rows above and one below its reference and
        // may stick out above the board.
        assert!(maps[1].is_open(0, 0));
        assert!(maps[1].is_open(2, 0));
        assert!(maps[1].is_open(18, 9));
        assert!(!maps[1].is_open(19, 9));
    }

    #[test]
    fn test_piece_map_respects_filled_cells() {
        let board = Board::from_ascii(
            "
            ....#.....
            ..........
            ",
        );
        let map = board.piece_map(Piece::O, 0);
        assert!(!map.is_open(18, 4));
        assert!(!map.is_open(18, 5));
        assert!(!map.is_open(17, 4));
        assert!(map.is_open(17, 6));
        assert!(map.is_open(16, 5));
    }

    #[test]
    fn test_place_and_clear_lines() {
        let board = Board::from_ascii(
            "
            #########.
            #########.
            ##.######.
            ",
        );
        let placed = board.place(Piece::I, Position::new(1, 18, 9));
        assert_eq!(placed.count_filled(), 30);
        let (cleared, after) = placed.clear_lines();
        assert_eq!(cleared, 2);
        assert_eq!(after.count_filled(), 10);
        assert_eq!(after.row_mask(19), 0b11_1111_1011);
        assert_eq!(after.row_mask(18), 0b10_0000_0000);
        assert_eq!(after.row_mask(17), 0);
    }

    #[test]
    fn test_place_drops_cells_above_board() {
        let board = Board::EMPTY.place(Piece::I, Position::new(1, 0, 3));
        assert_eq!(board.count_filled(), 2);
        assert!(board.is_filled(0, 3));
        assert!(board.is_filled(1, 3));
    }

    #[test]
    fn test_clear_bottom_row_only() {
        let mut board = Board::EMPTY;
        for col in 0..BOARD_WIDTH {
            board.set_filled(19, col);
        }
        assert_eq!(board.clear_lines(), (1, Board::EMPTY));
    }

    #[test]
    fn test_clear_lines_without_full_rows_is_identity() {
        let board = Board::from_ascii(
            "
            .#........
            ##.#######
            ",
        );
        assert_eq!(board.clear_lines(), (0, board));
    }

    #[test]
    fn test_notation() {
        let board = Board::from_notation("1000000000\nX00000000O").unwrap();
        assert!(board.is_filled(18, 0));
        assert!(board.is_filled(19, 0));
        assert!(board.is_filled(19, 9));
        assert_eq!(board.count_filled(), 3);

        let notation = board.to_notation();
        assert_eq!(notation.len(), 200);
        assert_eq!(notation.parse::<Board>().unwrap(), board);

        assert!(Board::from_notation("10101").is_err());
        assert!(Board::from_notation(&"0".repeat(210)).is_err());
        assert_eq!(Board::from_notation("").unwrap(), Board::EMPTY);
    }

    #[test]
    fn test_bytes_round_trip() {
        let board = Board::from_ascii(
            "
            ...##.....
            #.#.#.#.#.
            ",
        );
        let bytes = board.to_bytes();
        assert_eq!(bytes[19], [1, 0, 1, 0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(Board::from_bytes(&bytes), board);
    }

    #[test]
    fn test_board_serialization() {
        let board = Board::from_ascii(
            "
            #.........
            .........#
            ",
        );
        let serialized = serde_json::to_string(&board).unwrap();
        assert!(serialized.ends_with(",001,200\""));
        // 20 rows * 3 chars + 19 commas + 2 quotes
        assert_eq!(serialized.len(), 20 * 3 + 19 + 2);

        let deserialized: Board = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, board);

        assert!(serde_json::from_str::<Board>("\"000,000\"").is_err());
        let too_wide = format!("\"{}\"", ["400"; 20].join(","));
        assert!(serde_json::from_str::<Board>(&too_wide).is_err());
    }
}
