use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
    core::{Board, Piece, Position},
    search::{PossibleMoves, SearchParams},
};

use super::{
    direct::{adjustment_tap_count, frame_sequence_start},
    frame_input::FrameSequence,
};

/// Chance (in 32nds) of each next piece given the current one, indexed by
/// [`Piece::index`]: the NES generator rerolls once when it repeats a piece.
const TRANSITION_WEIGHTS: [[u8; Piece::LEN]; Piece::LEN] = [
    [1, 5, 6, 5, 5, 5, 5],
    [6, 1, 5, 5, 5, 5, 5],
    [5, 6, 1, 5, 5, 5, 5],
    [5, 5, 5, 2, 5, 5, 5],
    [5, 5, 5, 5, 2, 5, 5],
    [6, 5, 5, 5, 5, 1, 5],
    [5, 5, 5, 5, 6, 5, 1],
];

/// Probability that `next` follows `current`.
#[must_use]
pub fn transition_probability(current: Piece, next: Piece) -> f32 {
    f32::from(TRANSITION_WEIGHTS[current.index()][next.index()]) / 32.0
}

/// Cost of committing to one premove when the best placement depends on the
/// next piece.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentInfo {
    /// Index of the premove in [`PossibleMoves::adj`].
    pub index: usize,
    /// Inputs spent before the adjustment delay.
    pub pre_taps: usize,
    /// Probability and adjustment input count of each distinct desired
    /// placement.
    pub taps: Vec<(f32, usize)>,
    /// Inputs leading to the premove, padded to the adjustment delay.
    pub sequence: FrameSequence,
}

impl AdjustmentInfo {
    #[expect(clippy::cast_precision_loss)]
    fn score(&self, mode: BestAdjMode) -> [f32; 4] {
        let weighted = self
            .taps
            .iter()
            .map(|&(prob, taps)| prob * (taps * taps) as f32)
            .sum::<f32>();
        let worst = self.taps.iter().map(|&(_, taps)| taps).max().unwrap_or(0) as f32;
        let adjust_prob = self
            .taps
            .iter()
            .filter(|&&(_, taps)| taps > 0)
            .map(|&(prob, _)| prob)
            .sum::<f32>();
        let pre = self.pre_taps as f32;
        match mode {
            BestAdjMode::WeightedTaps => [weighted, worst, pre, adjust_prob],
            BestAdjMode::PreAdjTaps => [pre, worst, weighted, adjust_prob],
            BestAdjMode::WorstTaps => [worst, weighted, pre, adjust_prob],
            BestAdjMode::AdjProb => [adjust_prob, worst, weighted, pre],
        }
    }
}

/// Criterion for picking a premove, each one breaking ties with the others.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::Display,
)]
pub enum BestAdjMode {
    /// Fewest squared adjustment inputs, weighted by probability.
    #[display("LWT")]
    WeightedTaps,
    /// Fewest inputs before the adjustment.
    #[display("LPT")]
    PreAdjTaps,
    /// Fewest adjustment inputs in the worst case.
    #[display("LMT")]
    WorstTaps,
    /// Lowest probability of needing an adjustment at all.
    #[display("LAP")]
    AdjProb,
}

impl BestAdjMode {
    pub const ALL: [Self; 4] = [
        Self::WeightedTaps,
        Self::PreAdjTaps,
        Self::WorstTaps,
        Self::AdjProb,
    ];
}

/// Scores every premove against the placements wanted for each next piece.
///
/// `wanted[i]` is the placement to adjust to when the next piece has index
/// `i`. Premoves that cannot reach every wanted placement, or whose inputs
/// cannot be synthesized, are left out.
#[must_use]
pub fn adjustment_infos(
    params: &SearchParams,
    board: &Board,
    piece: Piece,
    moves: &PossibleMoves,
    wanted: &[Position; Piece::LEN],
) -> Vec<AdjustmentInfo> {
    let mut targets: Vec<(Position, f32)> = Vec::with_capacity(Piece::LEN);
    for (next, &pos) in Piece::ALL.into_iter().zip(wanted) {
        let prob = transition_probability(piece, next);
        match targets.binary_search_by_key(&pos, |&(p, _)| p) {
            Ok(i) => targets[i].1 += prob,
            Err(i) => targets.insert(i, (pos, prob)),
        }
    }

    let mut infos = Vec::new();
    for (index, (premove, reachable)) in moves.adj.iter().enumerate() {
        if !targets
            .iter()
            .all(|(pos, _)| reachable.binary_search(pos).is_ok())
        {
            continue;
        }
        let Some(sequence) = frame_sequence_start(params, board, piece, *premove) else {
            continue;
        };
        let taps = targets
            .iter()
            .map(|&(pos, prob)| {
                adjustment_tap_count(params, board, piece, &sequence, *premove, pos)
                    .map(|taps| (prob, taps))
            })
            .collect::<Option<Vec<_>>>();
        let Some(taps) = taps else {
            continue;
        };
        infos.push(AdjustmentInfo {
            index,
            pre_taps: sequence.tap_count(),
            taps,
            sequence,
        });
    }
    infos
}

fn compare_scores(a: &[f32; 4], b: &[f32; 4]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Picks the premove with the lowest score under `mode`, the earliest one on
/// ties. Returns its index into [`PossibleMoves::adj`] and its inputs.
#[must_use]
pub fn best_adjustment(infos: &[AdjustmentInfo], mode: BestAdjMode) -> Option<(usize, FrameSequence)> {
    let mut best: Option<(&AdjustmentInfo, [f32; 4])> = None;
    for info in infos {
        let score = info.score(mode);
        if best
            .as_ref()
            .is_none_or(|(_, b)| compare_scores(&score, b).is_lt())
        {
            best = Some((info, score));
        }
    }
    best.map(|(info, _)| (info.index, info.sequence.clone()))
}

/// A premove chosen by one or more modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentChoice {
    pub premove: Position,
    pub modes: Vec<BestAdjMode>,
    pub sequence: FrameSequence,
}

/// Best premove under [`BestAdjMode::WeightedTaps`],
/// [`BestAdjMode::WorstTaps`] and [`BestAdjMode::AdjProb`], with premoves
/// picked by several modes merged into one entry.
#[must_use]
pub fn best_adjustment_modes(infos: &[AdjustmentInfo], moves: &PossibleMoves) -> Vec<AdjustmentChoice> {
    let mut choices: Vec<AdjustmentChoice> = Vec::new();
    for mode in [
        BestAdjMode::WeightedTaps,
        BestAdjMode::WorstTaps,
        BestAdjMode::AdjProb,
    ] {
        let Some((index, sequence)) = best_adjustment(infos, mode) else {
            continue;
        };
        let premove = moves.adj[index].0;
        match choices.iter_mut().find(|c| c.premove == premove) {
            Some(choice) => choice.modes.push(mode),
            None => choices.push(AdjustmentChoice {
                premove,
                modes: vec![mode],
                sequence,
            }),
        }
    }
    choices
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{Level, TapSpeed},
        search::{ReachabilityCache, search_moves},
    };

    use super::*;

    fn params() -> SearchParams {
        SearchParams {
            level: Level::Level18,
            adj_delay: 18,
            taps: TapSpeed::Hz30.table(),
            double_tuck: false,
        }
    }

    fn split_wanted() -> [Position; Piece::LEN] {
        // T, J, Z want column 5; O, S, L, I want column 7.
        let left = Position::new(0, 18, 5);
        let right = Position::new(0, 18, 7);
        [left, left, left, right, right, right, right]
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        for current in Piece::ALL {
            let sum: f32 = Piece::ALL
                .into_iter()
                .map(|next| transition_probability(current, next))
                .sum();
            assert!((sum - 1.0).abs() < 1e-6, "{current:?}");
        }
        assert!((transition_probability(Piece::T, Piece::Z) - 6.0 / 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_modes() {
        let cache = ReachabilityCache::new();
        let params = params();
        let moves = search_moves(&cache, &params, &Board::EMPTY, Piece::T);
        let infos = adjustment_infos(&params, &Board::EMPTY, Piece::T, &moves, &split_wanted());
        assert!(!infos.is_empty());
        assert!(infos.iter().all(|info| info.taps.len() == 2));

        let premove = |mode| {
            let (index, _) = best_adjustment(&infos, mode).unwrap();
            moves.adj[index].0
        };
        // One tap either way from between the two targets.
        assert_eq!(premove(BestAdjMode::WeightedTaps), Position::new(0, 18, 6));
        assert_eq!(premove(BestAdjMode::WorstTaps), Position::new(0, 18, 6));
        // Committing to the likelier target adjusts only for T, J and Z.
        assert_eq!(premove(BestAdjMode::AdjProb), Position::new(0, 18, 7));
        // Doing nothing before the delay.
        assert_eq!(premove(BestAdjMode::PreAdjTaps).col(), 5);

        let choices = best_adjustment_modes(&infos, &moves);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].premove, Position::new(0, 18, 6));
        assert_eq!(
            choices[0].modes,
            [BestAdjMode::WeightedTaps, BestAdjMode::WorstTaps]
        );
        assert_eq!(choices[0].sequence.tap_count(), 1);
        assert_eq!(choices[1].modes, [BestAdjMode::AdjProb]);
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(best_adjustment(&[], BestAdjMode::AdjProb), None);
        assert!(best_adjustment_modes(&[], &PossibleMoves::default()).is_empty());
    }

    #[test]
    fn test_mode_codes() {
        let codes: Vec<String> = BestAdjMode::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(codes, ["LWT", "LPT", "LMT", "LAP"]);
    }
}
