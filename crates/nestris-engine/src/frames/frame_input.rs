use std::{
    fmt::{self, Write as _},
    ops::{BitOr, BitOrAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::ParseFrameSequenceError;

/// Buttons held during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameInput(u8);

impl FrameInput {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const A: Self = Self(4);
    pub const B: Self = Self(8);
    pub const DOWN: Self = Self(16);

    const ALL: [(Self, char); 5] = [
        (Self::LEFT, 'L'),
        (Self::RIGHT, 'R'),
        (Self::A, 'A'),
        (Self::B, 'B'),
        (Self::DOWN, 'D'),
    ];

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_left(self) -> bool {
        self.contains(Self::LEFT)
    }

    #[must_use]
    pub const fn is_right(self) -> bool {
        self.contains(Self::RIGHT)
    }

    #[must_use]
    pub const fn is_a(self) -> bool {
        self.contains(Self::A)
    }

    #[must_use]
    pub const fn is_b(self) -> bool {
        self.contains(Self::B)
    }

    #[must_use]
    pub const fn is_down(self) -> bool {
        self.contains(Self::DOWN)
    }

    /// Shift and rotate presses on this frame, at most one of each.
    #[must_use]
    pub fn tap_count(self) -> usize {
        let shift = self.is_left() || self.is_right();
        let rotate = self.is_a() || self.is_b();
        usize::from(shift) + usize::from(rotate)
    }
}

impl BitOr for FrameInput {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FrameInput {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for FrameInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_char('-');
        }
        for (input, ch) in Self::ALL {
            if self.contains(input) {
                f.write_char(ch)?;
            }
        }
        Ok(())
    }
}

impl FromStr for FrameInput {
    type Err = ParseFrameSequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseFrameSequenceError {
            token: s.to_owned(),
        };
        if s == "-" {
            return Ok(Self::NONE);
        }
        if s.is_empty() {
            return Err(error());
        }
        s.chars().try_fold(Self::NONE, |acc, ch| {
            let (input, _) = Self::ALL.iter().find(|(_, c)| *c == ch).ok_or_else(error)?;
            Ok(acc | *input)
        })
    }
}

/// Per-frame inputs starting at the piece's spawn frame.
///
/// The text form has one token per frame joined by spaces, `-` for a frame
/// without input, e.g. `"L - - A"`.
///
/// # Example
///
/// ```
/// use nestris_engine::{FrameInput, FrameSequence};
///
/// let seq: FrameSequence = "L - RA".parse().unwrap();
/// assert_eq!(seq.len(), 3);
/// assert_eq!(seq[2], FrameInput::RIGHT | FrameInput::A);
/// assert_eq!(seq.tap_count(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct FrameSequence(Vec<FrameInput>);

impl FrameSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, input: FrameInput) {
        self.0.push(input);
    }

    /// Grows (with empty frames) or truncates to `len` frames.
    pub fn resize(&mut self, len: usize) {
        self.0.resize(len, FrameInput::NONE);
    }

    /// Grows to at least `len` frames.
    pub fn pad_to(&mut self, len: usize) {
        if self.0.len() < len {
            self.resize(len);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    #[must_use]
    pub fn get(&self, frame: usize) -> Option<FrameInput> {
        self.0.get(frame).copied()
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, FrameInput>> {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FrameInput] {
        &self.0
    }

    /// Splits at frame boundary `frame`; the second half starts there.
    #[must_use]
    pub fn split_at(&self, frame: usize) -> (Self, Self) {
        let (head, tail) = self.0.split_at(frame.min(self.0.len()));
        (Self(head.to_vec()), Self(tail.to_vec()))
    }

    /// Number of shift and rotate presses.
    #[must_use]
    pub fn tap_count(&self) -> usize {
        self.iter().map(FrameInput::tap_count).sum()
    }
}

impl std::ops::Index<usize> for FrameSequence {
    type Output = FrameInput;

    fn index(&self, frame: usize) -> &FrameInput {
        &self.0[frame]
    }
}

impl std::ops::IndexMut<usize> for FrameSequence {
    fn index_mut(&mut self, frame: usize) -> &mut FrameInput {
        &mut self.0[frame]
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = FrameInput;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, FrameInput>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl From<Vec<FrameInput>> for FrameSequence {
    fn from(inputs: Vec<FrameInput>) -> Self {
        Self(inputs)
    }
}

impl FromIterator<FrameInput> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = FrameInput>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FrameSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, input) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{input}")?;
        }
        Ok(())
    }
}

impl FromStr for FrameSequence {
    type Err = ParseFrameSequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace().map(str::parse::<FrameInput>).collect()
    }
}

impl From<FrameSequence> for String {
    fn from(seq: FrameSequence) -> Self {
        seq.to_string()
    }
}

impl TryFrom<String> for FrameSequence {
    type Error = ParseFrameSequenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
