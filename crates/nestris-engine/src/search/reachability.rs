use arrayvec::ArrayVec;

use crate::core::{BOARD_HEIGHT, BOARD_WIDTH, Board, Level, MAX_TAPS, PieceMaps, TapTable};

/// Cache key of a [`ReachabilityTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableKey {
    pub level: Level,
    /// Frame from which adjustment inputs may start; 0 disables adjustment.
    pub adj_delay: usize,
    pub taps: TapTable,
}

/// A pose reachable by direct taps, together with everything needed to
/// check it against a concrete board.
///
/// A tap shifts and/or rotates the piece. An entry's tap path shifts on its
/// first `shifts` taps in one direction and rotates on its first
/// `rotations` taps in one direction, so the pose alone determines the path.
#[derive(Debug, Clone)]
pub struct TapEntry {
    rot: u8,
    col: u8,
    taps: u8,
    shifts: u8,
    rotations: u8,
    shift_dir: i8,
    rotate_dir: i8,
    row: u8,
    last_tap_frame: u16,
    next_tap_frame: Option<u16>,
    masks: PieceMaps,
    parent: Option<u16>,
}

impl TapEntry {
    #[must_use]
    pub fn rot(&self) -> usize {
        usize::from(self.rot)
    }

    #[must_use]
    pub fn col(&self) -> usize {
        usize::from(self.col)
    }

    /// Number of frames with input.
    #[must_use]
    pub fn tap_count(&self) -> usize {
        usize::from(self.taps)
    }

    /// Number of shift and rotate inputs; a tap can carry both.
    #[must_use]
    pub fn input_count(&self) -> usize {
        usize::from(self.shifts) + usize::from(self.rotations)
    }

    /// Row the piece is on during the frame of its last tap (or the start
    /// frame when there are no taps).
    #[must_use]
    pub fn row(&self) -> usize {
        usize::from(self.row)
    }

    #[must_use]
    pub fn last_tap_frame(&self) -> usize {
        usize::from(self.last_tap_frame)
    }

    /// Frame the next tap of the sequence would happen on; `None` once the
    /// tap table is exhausted.
    #[must_use]
    pub fn next_tap_frame(&self) -> Option<usize> {
        self.next_tap_frame.map(usize::from)
    }

    /// Cells (as open bits, one board per rotation) the piece's reference
    /// cell passes through on the way to this pose.
    #[must_use]
    pub fn masks(&self) -> &[Board] {
        &self.masks
    }

    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent.map(usize::from)
    }

    /// Checks the tap path against the piece maps of a board.
    #[must_use]
    pub fn fits(&self, maps: &[Board]) -> bool {
        self.masks
            .iter()
            .zip(maps)
            .all(|(mask, map)| map.contains(mask))
    }

    fn shift_options(&self) -> ArrayVec<i8, 3> {
        match (self.taps, self.shifts == self.taps) {
            (_, false) => [0].into_iter().collect(),
            (0, true) => [0, -1, 1].into_iter().collect(),
            (_, true) => [0, self.shift_dir].into_iter().collect(),
        }
    }

    // A before B. Two A presses reach the opposite orientation, one B press
    // covers the last one.
    fn rotate_options(&self, rotations: usize) -> ArrayVec<i8, 3> {
        let mut options: ArrayVec<i8, 3> = [0].into_iter().collect();
        if rotations == 1 || self.rotations != self.taps {
            return options;
        }
        let max_a = rotations / 2;
        if self.taps == 0 {
            options.push(1);
            if rotations == 4 {
                options.push(-1);
            }
        } else if self.rotate_dir == 1 && usize::from(self.rotations) < max_a {
            options.push(1);
        }
        options
    }
}

fn step(value: usize, delta: i8, modulo: usize) -> usize {
    match delta {
        0 => value,
        1 => (value + 1) % modulo,
        _ => (value + modulo - 1) % modulo,
    }
}

/// All poses reachable by direct taps from one starting pose and frame.
#[derive(Debug, Clone)]
pub struct ReachableSet {
    start_frame: usize,
    entries: Vec<TapEntry>,
}

impl ReachableSet {
    /// Breadth-first search over tap count.
    ///
    /// The `n`-th tap happens at `start_frame + taps.frame(n)`; a pose whose
    /// tap would happen below the board is unreachable. A pose already
    /// reached with fewer taps is never revisited.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn build(
        level: Level,
        taps: TapTable,
        rotations: usize,
        start_frame: usize,
        start_rot: usize,
        start_col: usize,
    ) -> Self {
        let mut entries = Vec::new();
        let start_row = level.row_at_frame(start_frame);
        if start_row >= BOARD_HEIGHT {
            return Self {
                start_frame,
                entries,
            };
        }

        let mut masks: PieceMaps = (0..rotations).map(|_| Board::FULL).collect();
        masks[start_rot].set_empty(start_row, start_col);
        entries.push(TapEntry {
            rot: start_rot as u8,
            col: start_col as u8,
            taps: 0,
            shifts: 0,
            rotations: 0,
            shift_dir: 0,
            rotate_dir: 0,
            row: start_row as u8,
            last_tap_frame: start_frame as u16,
            next_tap_frame: Some((start_frame + taps.frame(0)) as u16),
            masks,
            parent: None,
        });

        let mut visited = [[false; BOARD_WIDTH]; 4];
        visited[start_rot][start_col] = true;

        let mut next = 0;
        while next < entries.len() {
            let parent_index = next;
            next += 1;
            let parent = entries[parent_index].clone();
            let n = parent.tap_count();
            if n >= MAX_TAPS {
                continue;
            }
            let frame = start_frame + taps.frame(n);
            let row = level.row_at_frame(frame);
            if row >= BOARD_HEIGHT {
                continue;
            }

            for shift in parent.shift_options() {
                for rotate in parent.rotate_options(rotations) {
                    if shift == 0 && rotate == 0 {
                        continue;
                    }
                    let Some(col) = parent
                        .col()
                        .checked_add_signed(isize::from(shift))
                        .filter(|&c| c < BOARD_WIDTH)
                    else {
                        continue;
                    };
                    let rot = step(parent.rot(), rotate, rotations);
                    if visited[rot][col] {
                        continue;
                    }
                    visited[rot][col] = true;

                    // Fall to the tap row, then shift, then rotate.
                    let mut masks = parent.masks.clone();
                    for r in parent.row()..=row {
                        masks[parent.rot()].set_empty(r, parent.col());
                    }
                    if shift != 0 {
                        masks[parent.rot()].set_empty(row, col);
                    }
                    if rotate != 0 {
                        masks[rot].set_empty(row, col);
                    }

                    let first = n == 0;
                    entries.push(TapEntry {
                        rot: rot as u8,
                        col: col as u8,
                        taps: parent.taps + 1,
                        shifts: parent.shifts + u8::from(shift != 0),
                        rotations: parent.rotations + u8::from(rotate != 0),
                        shift_dir: if first { shift } else { parent.shift_dir },
                        rotate_dir: if first { rotate } else { parent.rotate_dir },
                        row: row as u8,
                        last_tap_frame: frame as u16,
                        next_tap_frame: (n + 1 < MAX_TAPS)
                            .then(|| (start_frame + taps.frame(n + 1)) as u16),
                        masks,
                        parent: Some(parent_index as u16),
                    });
                }
            }
        }

        Self {
            start_frame,
            entries,
        }
    }

    /// Frame the set's first tap is measured from.
    #[must_use]
    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    #[must_use]
    pub fn entries(&self) -> &[TapEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reachable sets of one rotation count: the initial set from spawn and,
/// per eligible initial entry, the set reachable after the adjustment delay.
#[derive(Debug, Clone)]
pub struct RotationTable {
    initial: ReachableSet,
    continuations: Vec<Option<ReachableSet>>,
}

impl RotationTable {
    fn build(key: TableKey, rotations: usize) -> Self {
        let initial = ReachableSet::build(key.level, key.taps, rotations, 0, 0, 5);
        let continuations = initial
            .entries()
            .iter()
            .map(|entry| {
                let start = premove_start_frame(key.adj_delay, entry)?;
                Some(ReachableSet::build(
                    key.level,
                    key.taps,
                    rotations,
                    start,
                    entry.rot(),
                    entry.col(),
                ))
            })
            .collect();
        Self {
            initial,
            continuations,
        }
    }

    #[must_use]
    pub fn initial(&self) -> &ReachableSet {
        &self.initial
    }

    /// Post-adjustment set of the `index`-th initial entry, if that entry
    /// can act as a premove.
    #[must_use]
    pub fn continuation(&self, index: usize) -> Option<&ReachableSet> {
        self.continuations.get(index)?.as_ref()
    }
}

/// Frame adjustment inputs start at when `entry` is used as a premove.
///
/// Adjustment needs every tap of the premove to happen before the delay;
/// inputs resume at the delay or at the next tap slot, whichever is later.
fn premove_start_frame(adj_delay: usize, entry: &TapEntry) -> Option<usize> {
    if adj_delay == 0 {
        return None;
    }
    if entry.tap_count() > 0 && entry.last_tap_frame() >= adj_delay {
        return None;
    }
    Some(adj_delay.max(entry.next_tap_frame()?))
}

/// Board-independent reachability data for one `(level, delay, taps)`.
#[derive(Debug, Clone)]
pub struct ReachabilityTable {
    key: TableKey,
    tables: [RotationTable; 3],
}

impl ReachabilityTable {
    #[must_use]
    pub fn build(key: TableKey) -> Self {
        Self {
            key,
            tables: [1, 2, 4].map(|rotations| RotationTable::build(key, rotations)),
        }
    }

    #[must_use]
    pub fn key(&self) -> TableKey {
        self.key
    }

    /// Table for pieces with the given number of orientations (1, 2 or 4).
    #[must_use]
    pub fn for_rotations(&self, rotations: usize) -> &RotationTable {
        match rotations {
            1 => &self.tables[0],
            2 => &self.tables[1],
            4 => &self.tables[2],
            _ => panic!("unsupported rotation count {rotations}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Piece, TapSpeed};

    use super::*;

    fn key(level: Level, adj_delay: usize) -> TableKey {
        TableKey {
            level,
            adj_delay,
            taps: TapSpeed::Hz30.table(),
        }
    }

    fn find(set: &ReachableSet, rot: usize, col: usize) -> Option<&TapEntry> {
        set.entries()
            .iter()
            .find(|e| e.rot() == rot && e.col() == col)
    }

    #[test]
    fn test_initial_set_covers_every_pose_on_slow_level() {
        let table = ReachabilityTable::build(key(Level::Level18, 0));
        for rotations in [1, 2, 4] {
            let set = table.for_rotations(rotations).initial();
            assert_eq!(set.len(), rotations * BOARD_WIDTH, "{rotations} rotations");
        }
    }

    #[test]
    fn test_tap_counts_are_minimal() {
        let set = ReachableSet::build(Level::Level18, TapSpeed::Hz30.table(), 4, 0, 0, 5);
        let root = find(&set, 0, 5).unwrap();
        assert_eq!(root.tap_count(), 0);
        assert_eq!(root.next_tap_frame(), Some(0));

        let far_left = find(&set, 0, 0).unwrap();
        assert_eq!(far_left.tap_count(), 5);
        assert_eq!(far_left.last_tap_frame(), 8);
        assert_eq!(far_left.next_tap_frame(), Some(10));

        // Rotation rides along with the shifts.
        let combined = find(&set, 1, 3).unwrap();
        assert_eq!(combined.tap_count(), 2);
        assert_eq!(combined.input_count(), 3);

        let flipped = find(&set, 2, 5).unwrap();
        assert_eq!(flipped.tap_count(), 2);
        let ccw = find(&set, 3, 9).unwrap();
        assert_eq!(ccw.tap_count(), 4);
        assert_eq!(ccw.input_count(), 5);
    }

    #[test]
    fn test_parent_chain_matches_tap_count() {
        let set = ReachableSet::build(Level::Level19, TapSpeed::Hz15.table(), 2, 0, 0, 5);
        for entry in set.entries() {
            let mut depth = 0;
            let mut cursor = entry.parent();
            while let Some(parent) = cursor {
                depth += 1;
                cursor = set.entries()[parent].parent();
            }
            assert_eq!(depth, entry.tap_count());
        }
    }

    #[test]
    fn test_fast_level_cuts_off_far_columns() {
        // 10Hz taps at level 39: the third tap would land on row 24.
        let set = ReachableSet::build(Level::Level39, TapSpeed::Hz10.table(), 1, 0, 0, 5);
        let cols: Vec<usize> = set.entries().iter().map(TapEntry::col).collect();
        assert_eq!(cols, [5, 4, 6, 3, 7]);
    }

    #[test]
    fn test_masks_follow_the_path() {
        let set = ReachableSet::build(Level::Level18, TapSpeed::Hz15.table(), 4, 0, 0, 5);
        let entry = find(&set, 1, 7).unwrap();
        let masks = entry.masks();
        // Tap 0 on row 0 (shift to 6 then rotate), tap 1 on row 1 (shift to 7).
        assert!(masks[0].is_open(0, 5));
        assert!(masks[0].is_open(0, 6));
        assert!(masks[1].is_open(0, 6));
        assert!(masks[1].is_open(1, 6));
        assert!(masks[1].is_open(1, 7));
        assert!(!masks[0].is_open(1, 7));
        assert_eq!(masks[1].count_filled(), 200 - 3);

        let maps = Board::EMPTY.piece_maps(Piece::T);
        assert!(entry.fits(&maps));
        let mut blocked = Board::EMPTY;
        blocked.set_filled(2, 7);
        assert!(!entry.fits(&blocked.piece_maps(Piece::T)));
    }

    #[test]
    fn test_continuations_only_when_adjustment_enabled() {
        let disabled = ReachabilityTable::build(key(Level::Level18, 0));
        let table = disabled.for_rotations(4);
        assert!((0..table.initial().len()).all(|i| table.continuation(i).is_none()));

        let enabled = ReachabilityTable::build(key(Level::Level18, 18));
        let table = enabled.for_rotations(4);
        let root = table.continuation(0).unwrap();
        assert_eq!(root.start_frame(), 18);
        assert_eq!(root.entries()[0].row(), 6);

        // Entries whose taps run into the delay are not premoves.
        let set = table.initial();
        for (i, entry) in set.entries().iter().enumerate() {
            let eligible = entry.tap_count() == 0 || entry.last_tap_frame() < 18;
            assert_eq!(table.continuation(i).is_some(), eligible);
        }
    }
}
