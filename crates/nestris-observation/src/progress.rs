use nestris_engine::Level;

/// Lines at which the game is considered finished.
pub const LINE_CAP: u32 = 430;

/// Line counts at which each gravity speed class starts, followed by
/// [`LINE_CAP`].
pub const LEVEL_SPEED_LINES: [u32; 5] = [0, 130, 230, 330, LINE_CAP];

/// Game level after clearing `lines` lines, starting from level 18.
#[must_use]
pub fn level_by_lines(lines: u32) -> u32 {
    if lines < LEVEL_SPEED_LINES[1] {
        18
    } else {
        lines / 10 + 6
    }
}

#[must_use]
pub fn level_speed_by_lines(lines: u32) -> Level {
    Level::from_level(level_by_lines(lines))
}

/// Position of `level` in [`Level::ALL`].
#[must_use]
pub fn speed_index(level: Level) -> usize {
    match level {
        Level::Level18 => 0,
        Level::Level19 => 1,
        Level::Level29 => 2,
        Level::Level39 => 3,
    }
}

/// Lines left until the next speed class (or the line cap), at least 1.
#[must_use]
pub fn lines_to_transition(lines: u32) -> u32 {
    let next = LEVEL_SPEED_LINES[speed_index(level_speed_by_lines(lines)) + 1];
    next.saturating_sub(lines).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_by_lines() {
        assert_eq!(level_by_lines(0), 18);
        assert_eq!(level_by_lines(129), 18);
        assert_eq!(level_by_lines(130), 19);
        assert_eq!(level_by_lines(235), 29);
        assert_eq!(level_by_lines(330), 39);
        assert_eq!(level_speed_by_lines(229), Level::Level19);
        assert_eq!(level_speed_by_lines(230), Level::Level29);
    }

    #[test]
    fn test_lines_to_transition() {
        assert_eq!(lines_to_transition(0), 130);
        assert_eq!(lines_to_transition(125), 5);
        assert_eq!(lines_to_transition(130), 100);
        assert_eq!(lines_to_transition(429), 1);
        assert_eq!(lines_to_transition(500), 1);
    }
}
