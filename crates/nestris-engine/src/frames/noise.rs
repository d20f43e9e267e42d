use std::collections::BTreeMap;

use rand::{Rng, SeedableRng as _};
use rand_distr::StandardNormal;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    TimingNoiseError,
    core::{Board, Level, Position},
};

use super::{
    frame_input::{FrameInput, FrameSequence},
    simulate::simulate,
};

/// Human timing error: every input lands `round(|N(0, σ)|)` frames late.
///
/// Inputs keep their order. A delayed input never shares a frame with the
/// one before it, and separate presses of one button stay apart by a blank
/// frame. Held runs stay contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimingNoise")]
pub struct TimingNoise {
    stddev_frames: f64,
}

#[derive(Deserialize)]
struct RawTimingNoise {
    stddev_frames: f64,
}

impl TryFrom<RawTimingNoise> for TimingNoise {
    type Error = TimingNoiseError;

    fn try_from(raw: RawTimingNoise) -> Result<Self, Self::Error> {
        Self::new(raw.stddev_frames)
    }
}

impl TimingNoise {
    pub fn new(stddev_frames: f64) -> Result<Self, TimingNoiseError> {
        if !stddev_frames.is_finite() || stddev_frames < 0.0 {
            return Err(TimingNoiseError { stddev_frames });
        }
        Ok(Self { stddev_frames })
    }

    #[must_use]
    pub fn stddev_frames(&self) -> f64 {
        self.stddev_frames
    }

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let z: f64 = rng.sample(StandardNormal);
        (z * self.stddev_frames).abs().round() as usize
    }

    /// Returns `seq` with every press delayed independently.
    ///
    /// A button held over consecutive frames moves as one: the frames after
    /// the press follow it without a delay of their own.
    pub fn apply<R: Rng + ?Sized>(&self, seq: &FrameSequence, rng: &mut R) -> FrameSequence {
        let mut out = FrameSequence::new();
        let mut last: Option<(usize, usize, FrameInput)> = None;
        for (frame, input) in seq.iter().enumerate() {
            if input.is_empty() {
                continue;
            }
            let at = match last {
                Some((prev_src, prev_at, prev))
                    if frame == prev_src + 1 && prev.bits() & input.bits() != 0 =>
                {
                    prev_at + 1
                }
                Some((_, prev_at, prev)) => {
                    let gap = if prev.bits() & input.bits() == 0 { 1 } else { 2 };
                    (frame + self.delay(rng)).max(prev_at + gap)
                }
                None => frame + self.delay(rng),
            };
            out.pad_to(at + 1);
            out[at] = input;
            last = Some((frame, at, input));
        }
        out.pad_to(seq.len());
        out
    }
}

/// Replays `seq` with `samples` independent draws of `noise` and counts
/// where the piece locks.
#[must_use]
pub fn landing_distribution(
    level: Level,
    maps: &[Board],
    seq: &FrameSequence,
    noise: TimingNoise,
    samples: usize,
    seed: u64,
) -> BTreeMap<Position, usize> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut landings = BTreeMap::new();
    for _ in 0..samples {
        let noisy = noise.apply(seq, &mut rng);
        let (pos, _) = simulate(level, maps, &noisy, true);
        *landings.entry(pos).or_insert(0) += 1;
    }
    landings
}
