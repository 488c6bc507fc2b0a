/*
 * decision.rs
 * Part of the gammon-knight project
 * Created Date: Wednesday, February 12th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::fmt::Display;

use itertools::Itertools;
use thiserror::Error;

use crate::{
    player::{CubeState, Player},
    position::Position,
};

/// Which question the player on roll is answering.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    #[default]
    CheckerPlay,
    CubeAction,
}

impl Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckerPlay => write!(f, "checker play"),
            Self::CubeAction => write!(f, "cube action"),
        }
    }
}

/// Win/gammon/backgammon chances as cumulative percentages in [0, 100].
/// `gammon` includes backgammons and `win` includes both, matching the
/// analyzer's display convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WinChances {
    pub win: f64,
    pub gammon: f64,
    pub backgammon: f64,
}

/// A single candidate action with its evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    /// Display notation, e.g. `13/9 6/5` or `Double/Take`.
    pub notation: String,
    pub equity: f64,
    /// Equity given up relative to the best candidate; 0 for the best.
    pub error: f64,
    /// 1-based rank among all candidates, 1 = best.
    pub rank: u32,
    /// Rank the upstream source assigned, where it declared one.
    pub source_rank: Option<u32>,
    /// Error figure the upstream source displayed, where it declared one.
    pub source_error: Option<f64>,
    /// False for options synthesized downstream of the analyzer.
    pub from_analyzer: bool,
    pub player_chances: Option<WinChances>,
    pub opponent_chances: Option<WinChances>,
    pub resulting_position: Option<Position>,
    pub was_played: bool,
}

impl Move {
    pub fn new(notation: impl Into<String>, equity: f64) -> Self {
        Move {
            notation: notation.into(),
            equity,
            error: 0.0,
            rank: 1,
            source_rank: None,
            source_error: None,
            from_analyzer: true,
            player_chances: None,
            opponent_chances: None,
            resulting_position: None,
            was_played: false,
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.rank == 1 {
            write!(f, "{} (equity {:+.3})", self.notation, self.equity)
        } else {
            write!(
                f,
                "{} (equity {:+.3}, error {:.3})",
                self.notation, self.equity, self.error
            )
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("expected exactly one best candidate, found {found}")]
    BestCandidateCount { found: usize },
    #[error("candidate ranks are not distinct")]
    DuplicateRank,
    #[error("checker-play decisions carry dice, cube decisions do not")]
    DiceMismatch,
}

/// A fully-described decision point: the position, the match context and
/// the ranked candidate actions. Decisions own their candidate moves and
/// each candidate owns its optional resulting position; the whole record
/// moves by value through the pipeline.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Decision {
    pub position: Position,
    pub on_roll: Player,
    pub dice: Option<(u8, u8)>,
    pub score_top: u32,
    pub score_bottom: u32,
    /// 0 for money play.
    pub match_length: u32,
    pub crawford: bool,
    pub cube_value: u32,
    pub cube_owner: CubeState,
    pub kind: DecisionKind,
    pub candidates: Vec<Move>,
    pub player_chances: Option<WinChances>,
    pub opponent_chances: Option<WinChances>,
    pub source_file: Option<String>,
    pub game_index: Option<u32>,
    pub move_index: Option<u32>,
    /// Free-form annotation carried through from the source material.
    pub note: Option<String>,
    /// Canonical XGID for this decision, stable across runs.
    pub xgid: Option<String>,
}

impl Decision {
    /// The best candidate (rank 1), falling back to the first entry.
    pub fn best(&self) -> Option<&Move> {
        self.candidates
            .iter()
            .find(|m| m.rank == 1)
            .or_else(|| self.candidates.first())
    }

    /// The candidate flagged as actually played, if any.
    pub fn played(&self) -> Option<&Move> {
        self.candidates.iter().find(|m| m.was_played)
    }

    pub fn is_money_game(&self) -> bool {
        self.match_length == 0
    }

    /// Checks the record-level invariants: exactly one rank-1 candidate
    /// with all ranks distinct, and dice present exactly for checker
    /// plays.
    pub fn validate(&self) -> Result<(), DecisionError> {
        if !self.candidates.is_empty() {
            let best_count = self.candidates.iter().filter(|m| m.rank == 1).count();
            if best_count != 1 {
                return Err(DecisionError::BestCandidateCount { found: best_count });
            }
            let distinct = self.candidates.iter().map(|m| m.rank).unique().count();
            if distinct != self.candidates.len() {
                return Err(DecisionError::DuplicateRank);
            }
        }
        let dice_expected = self.kind == DecisionKind::CheckerPlay;
        if self.dice.is_some() != dice_expected {
            return Err(DecisionError::DiceMismatch);
        }
        Ok(())
    }

    /// One-line match context used in card fronts and list views.
    pub fn context_label(&self) -> String {
        let score = if self.match_length > 0 {
            let crawford = if self.crawford { " Crawford" } else { "" };
            format!(
                "{}-{} of {}{}",
                self.score_top, self.score_bottom, self.match_length, crawford
            )
        } else {
            "Money".to_string()
        };
        match (self.kind, self.dice) {
            (DecisionKind::CheckerPlay, Some((a, b))) => {
                format!("{} to play {}{} | {}", self.on_roll, a, b, score)
            }
            (DecisionKind::CheckerPlay, None) => format!("{} to play | {}", self.on_roll, score),
            (DecisionKind::CubeAction, _) => format!("{} cube decision | {}", self.on_roll, score),
        }
    }
}

/// Normalizes a move notation for equality checks by ordering its hops,
/// so that `12/8 7/6` and `7/6 12/8` compare equal.
pub fn normalized_notation(notation: &str) -> String {
    if notation.is_empty() || notation.eq_ignore_ascii_case("cannot move") {
        return notation.to_string();
    }
    notation
        .split_whitespace()
        .sorted_by(|a, b| b.cmp(a))
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(notations: &[(&str, f64, u32)]) -> Vec<Move> {
        notations
            .iter()
            .map(|(n, eq, rank)| {
                let mut m = Move::new(*n, *eq);
                m.rank = *rank;
                m
            })
            .collect()
    }

    #[test]
    fn best_finds_rank_one() {
        let decision = Decision {
            dice: Some((3, 1)),
            candidates: ranked(&[("8/5 6/5", 0.2, 1), ("13/10 24/23", 0.1, 2)]),
            ..Default::default()
        };
        assert_eq!(decision.best().unwrap().notation, "8/5 6/5");
    }

    #[test]
    fn validate_requires_single_best() {
        let decision = Decision {
            dice: Some((3, 1)),
            candidates: ranked(&[("8/5 6/5", 0.2, 1), ("13/10 24/23", 0.1, 1)]),
            ..Default::default()
        };
        assert_eq!(
            decision.validate(),
            Err(DecisionError::BestCandidateCount { found: 2 })
        );
    }

    #[test]
    fn validate_requires_distinct_ranks() {
        let decision = Decision {
            dice: Some((3, 1)),
            candidates: ranked(&[("a", 0.3, 1), ("b", 0.2, 2), ("c", 0.1, 2)]),
            ..Default::default()
        };
        assert_eq!(decision.validate(), Err(DecisionError::DuplicateRank));
    }

    #[test]
    fn validate_dice_follow_kind() {
        let cube = Decision {
            kind: DecisionKind::CubeAction,
            dice: Some((6, 6)),
            ..Default::default()
        };
        assert_eq!(cube.validate(), Err(DecisionError::DiceMismatch));

        let checker = Decision {
            kind: DecisionKind::CheckerPlay,
            dice: None,
            ..Default::default()
        };
        assert_eq!(checker.validate(), Err(DecisionError::DiceMismatch));
    }

    #[test]
    fn notation_normalization_orders_hops() {
        assert_eq!(normalized_notation("12/8 7/6"), normalized_notation("7/6 12/8"));
        assert_eq!(normalized_notation("Cannot move"), "Cannot move");
    }

    #[test]
    fn context_label_money_game() {
        let decision = Decision {
            dice: Some((5, 2)),
            ..Default::default()
        };
        assert_eq!(decision.context_label(), "B to play 52 | Money");
    }

    #[test]
    fn context_label_match_game() {
        let decision = Decision {
            kind: DecisionKind::CubeAction,
            match_length: 7,
            score_top: 3,
            score_bottom: 5,
            crawford: true,
            ..Default::default()
        };
        assert_eq!(decision.context_label(), "B cube decision | 3-5 of 7 Crawford");
    }
}
