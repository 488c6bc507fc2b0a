/*
 * output_parser.rs
 * Part of the gammon-knight project
 * Created Date: Monday, February 24th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Parser for GNU Backgammon's `hint` output.
//!
//! Two shapes are recognized. Checker-play hints are repeated blocks of
//!
//! ```text
//!     1. Cubeful 4-ply    21/16 21/15                  Eq.:  -0.411
//!        0.266 0.021 0.001 - 0.734 0.048 0.001
//! ```
//!
//! and cube hints open with the `Cubeful equities:` sentinel followed by
//! one line per action and a `Proper cube action:` verdict.

use std::sync::LazyLock;

use backgammon::decision::{DecisionKind, Move, WinChances};
use regex::Regex;
use thiserror::Error;

use crate::cube::{CubeChances, CubeEquities, synthesize_cube_options};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputParseError {
    #[error("analyzer output contained no parsable {0} analysis")]
    Unparseable(DecisionKind),
}

static MOVE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(\d+)\.\s+(?:Cubeful\s+\d+-ply\s+|Cubeless\s+\d+-ply\s+)?(.*?)\s+Eq\.?:\s*([+-]?\d+\.\d+)(?:\s*\(\s*([+-]?\d+\.\d+)\s*\))?",
    )
    .unwrap()
});

static PROBABILITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(\d\.\d+)\s+(\d\.\d+)\s+(\d\.\d+)\s*-\s*(\d\.\d+)\s+(\d\.\d+)\s+(\d\.\d+)",
    )
    .unwrap()
});

static CUBE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*\d+\.\s*(No\s+(?:re)?double|(?:Re)?double,?\s*(?:take|pass|drop))\s+([+-]?\d+\.\d+)",
    )
    .unwrap()
});

static PROPER_ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*Proper cube action:\s*(.+?)\s*$").unwrap());

/// Parses the move list and the per-decision chances for the given
/// decision kind.
pub fn parse_analysis(output: &str, kind: DecisionKind) -> Result<Vec<Move>, OutputParseError> {
    let moves = match kind {
        DecisionKind::CheckerPlay => parse_checker_play(output),
        DecisionKind::CubeAction => parse_cube_decision(output),
    };
    if moves.is_empty() {
        return Err(OutputParseError::Unparseable(kind));
    }
    Ok(moves)
}

/// Parses repeated checker-play blocks. Candidates are re-sorted by
/// equity, re-ranked from 1 and have their errors recomputed against
/// the best, keeping the analyzer's own rank and delta as source data.
pub fn parse_checker_play(output: &str) -> Vec<Move> {
    let lines: Vec<&str> = output.lines().collect();
    let mut moves = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(captures) = MOVE_LINE.captures(line) else {
            continue;
        };
        let source_rank: u32 = captures[1].parse().unwrap_or(0);
        let notation = captures[2].trim().to_string();
        let equity: f64 = captures[3].parse().unwrap_or(0.0);
        let source_error = captures.get(4).and_then(|m| m.as_str().parse::<f64>().ok());

        let mut candidate = Move::new(notation, equity);
        candidate.source_rank = Some(source_rank);
        candidate.source_error = source_error;
        candidate.error = source_error.map(f64::abs).unwrap_or(0.0);
        candidate.rank = source_rank;

        if let Some(next) = lines.get(index + 1) {
            if let Some((player, opponent)) = parse_probability_line(next) {
                candidate.player_chances = Some(player);
                candidate.opponent_chances = Some(opponent);
            }
        }
        moves.push(candidate);
    }

    rerank_by_equity(&mut moves);
    moves
}

/// Parses a cube-decision section and expands it to the five-option
/// list. Returns an empty vector when the sentinel is absent.
pub fn parse_cube_decision(output: &str) -> Vec<Move> {
    let Some(section) = cube_section(output) else {
        return Vec::new();
    };

    synthesize_cube_options(
        &section.equities,
        section.proper_action.as_deref(),
        section.redouble,
        &section.chances,
    )
}

pub(crate) struct CubeSection {
    pub equities: CubeEquities,
    pub proper_action: Option<String>,
    pub redouble: bool,
    pub chances: CubeChances,
}

pub(crate) fn cube_section(output: &str) -> Option<CubeSection> {
    if !output.to_lowercase().contains("cubeful equities") {
        return None;
    }

    let mut no_double = None;
    let mut double_take = None;
    let mut double_pass = None;
    let mut redouble = false;
    for captures in CUBE_LINE.captures_iter(output) {
        let action = captures[1].to_lowercase();
        let equity: f64 = captures[2].parse().unwrap_or(0.0);
        if action.contains("redouble") {
            redouble = true;
        }
        if action.starts_with("no") {
            no_double = Some(equity);
        } else if action.contains("take") {
            double_take = Some(equity);
        } else if action.contains("pass") || action.contains("drop") {
            double_pass = Some(equity);
        }
    }
    // All three actions are always printed together; anything less is
    // not a cube section we can use.
    let (no_double, double_take, double_pass) = (no_double?, double_take?, double_pass?);

    let proper_action = PROPER_ACTION
        .captures(output)
        .map(|c| c[1].trim().to_string());

    // The cubeless-equity probability line describes the no-double
    // evaluation.
    let chances = CubeChances {
        no_double: parse_decision_chances(output),
        double_take: None,
    };

    Some(CubeSection {
        equities: CubeEquities {
            no_double,
            double_take,
            double_pass,
        },
        proper_action,
        redouble,
        chances,
    })
}

/// The first probability pair in the output, as percentages.
pub fn parse_decision_chances(output: &str) -> Option<(WinChances, WinChances)> {
    output.lines().find_map(parse_probability_line)
}

fn parse_probability_line(line: &str) -> Option<(WinChances, WinChances)> {
    let captures = PROBABILITY_LINE.captures(line)?;
    let values: Vec<f64> = (1..=6)
        .filter_map(|i| captures[i].parse::<f64>().ok())
        .collect();
    if values.len() != 6 {
        return None;
    }
    Some((
        WinChances {
            win: values[0] * 100.0,
            gammon: values[1] * 100.0,
            backgammon: values[2] * 100.0,
        },
        WinChances {
            win: values[3] * 100.0,
            gammon: values[4] * 100.0,
            backgammon: values[5] * 100.0,
        },
    ))
}

fn rerank_by_equity(moves: &mut [Move]) {
    moves.sort_by(|a, b| {
        b.equity
            .partial_cmp(&a.equity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(best_equity) = moves.first().map(|m| m.equity) {
        for (index, candidate) in moves.iter_mut().enumerate() {
            candidate.rank = index as u32 + 1;
            candidate.error = (best_equity - candidate.equity).abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKER_OUTPUT: &str = "\
 GNU Backgammon  Position ID: 4HPwATDgc/ABMA
                 Match ID   : cIkqAAAAAAAA
    1. Cubeful 2-ply    24/18 13/9                   Eq.:  +0.015
       0.505 0.136 0.007 - 0.495 0.138 0.006
        2-ply cubeful prune [world class]
    2. Cubeful 2-ply    24/14                        Eq.:  +0.016
       0.509 0.125 0.005 - 0.491 0.133 0.005
        2-ply cubeful prune [world class]
    3. Cubeful 2-ply    13/9 13/7                    Eq.:  -0.045 ( -0.061)
       0.489 0.139 0.007 - 0.511 0.143 0.008
";

    const CUBE_OUTPUT: &str = "\
Cube analysis
4-ply cubeless equity  +0.172
  0.523 0.142 0.008 - 0.477 0.124 0.006
Cubeful equities:
1. No double           +0.172
2. Double, take        -0.361  ( -0.533)
3. Double, pass        +1.000  ( +0.828)

Proper cube action: No double, take (26.0%)
";

    #[test]
    fn checker_play_candidates_are_reranked_by_equity() {
        let moves = parse_checker_play(CHECKER_OUTPUT);
        assert_eq!(moves.len(), 3);
        // The analyzer listed 24/18 13/9 first but 24/14 has the higher
        // equity; ranks follow the equities.
        assert_eq!(moves[0].notation, "24/14");
        assert_eq!(moves[0].rank, 1);
        assert_eq!(moves[0].error, 0.0);
        assert_eq!(moves[0].source_rank, Some(2));
        assert_eq!(moves[1].notation, "24/18 13/9");
        assert!((moves[1].error - 0.001).abs() < 1e-9);
        assert_eq!(moves[2].source_error, Some(-0.061));
    }

    #[test]
    fn checker_play_probabilities_become_percentages() {
        let moves = parse_checker_play(CHECKER_OUTPUT);
        let best = &moves[0];
        let player = best.player_chances.unwrap();
        assert!((player.win - 50.9).abs() < 1e-9);
        assert!((player.gammon - 12.5).abs() < 1e-9);
        let opponent = best.opponent_chances.unwrap();
        assert!((opponent.win - 49.1).abs() < 1e-9);
    }

    #[test]
    fn cube_decision_parses_equities_and_phrase() {
        let section = cube_section(CUBE_OUTPUT).unwrap();
        assert_eq!(section.equities.no_double, 0.172);
        assert_eq!(section.equities.double_take, -0.361);
        assert_eq!(section.equities.double_pass, 1.0);
        assert_eq!(
            section.proper_action.as_deref(),
            Some("No double, take (26.0%)")
        );
        assert!(!section.redouble);
    }

    #[test]
    fn cube_decision_expands_to_five_options() {
        let moves = parse_cube_decision(CUBE_OUTPUT);
        assert_eq!(moves.len(), 5);
        assert_eq!(moves[0].notation, "No Double/Take");
        assert_eq!(moves[0].rank, 1);
        assert!(moves[0].player_chances.is_some());
    }

    #[test]
    fn redouble_output_is_recognized() {
        let output = CUBE_OUTPUT
            .replace("No double", "No redouble")
            .replace("Double,", "Redouble,");
        let section = cube_section(&output).unwrap();
        assert!(section.redouble);
        let moves = parse_cube_decision(&output);
        assert_eq!(moves[1].notation, "Redouble/Take");
    }

    #[test]
    fn parse_analysis_fails_on_empty_output() {
        assert_eq!(
            parse_analysis("nothing to see here", DecisionKind::CheckerPlay),
            Err(OutputParseError::Unparseable(DecisionKind::CheckerPlay))
        );
        assert_eq!(
            parse_analysis("nothing to see here", DecisionKind::CubeAction),
            Err(OutputParseError::Unparseable(DecisionKind::CubeAction))
        );
    }

    #[test]
    fn decision_chances_use_the_first_probability_pair() {
        let (player, opponent) = parse_decision_chances(CUBE_OUTPUT).unwrap();
        assert!((player.win - 52.3).abs() < 1e-9);
        assert!((opponent.win - 47.7).abs() < 1e-9);
    }
}
