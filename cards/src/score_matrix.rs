/*
 * score_matrix.rs
 * Part of the gammon-knight project
 * Created Date: Friday, March 7th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Score-matrix generation for cube decisions: the same position is
//! re-analyzed at every away-score combination of a match, showing how
//! the proper cube action shifts with the score. Cells hold the best
//! action plus the two losing actions' errors scaled by 1000.

use backgammon::{
    player::Player,
    xgid::{XgidError, decode_xgid, encode_xgid},
};
use log::debug;
use thiserror::Error;

use crate::{
    analyzer::{Analyzer, AnalyzerError},
    cube::synthesize_cube_options,
    output_parser::cube_section,
};

#[derive(Error, Debug)]
pub enum ScoreMatrixError {
    #[error("score matrix needs a match length of at least 2, got {0}")]
    MatchTooShort(u32),
    #[error(transparent)]
    Xgid(#[from] XgidError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// One away-score cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrixCell {
    pub player_away: u32,
    pub opponent_away: u32,
    /// `N/T`, `D/T`, `D/P`, `TG/T` or `TG/P`.
    pub best_action: String,
    pub error_no_double: Option<f64>,
    pub error_double: Option<f64>,
    pub error_pass: Option<f64>,
}

impl ScoreMatrixCell {
    /// Formats the two non-best errors scaled by 1000, always in the
    /// display order no-double, double/take, double/pass with the
    /// cell's own action skipped: e.g. `24/543`.
    pub fn format_errors(&self) -> String {
        let (first, second) = self.displayed_errors();
        format!("{first}/{second}")
    }

    /// True when the smaller displayed error is below the threshold
    /// (scaled by 1000), marking a close decision.
    pub fn has_low_errors(&self, threshold: i64) -> bool {
        let (first, second) = self.displayed_errors();
        first.min(second) < threshold
    }

    fn displayed_errors(&self) -> (i64, i64) {
        let scale = |error: Option<f64>| {
            error.map(|e| (e * 1000.0).round() as i64).unwrap_or(0)
        };
        let no_double = scale(self.error_no_double);
        let double_take = scale(self.error_double);
        let double_pass = scale(self.error_pass);
        match self.best_action.as_str() {
            // Both too-good variants are flavors of not doubling.
            "N/T" | "TG/T" | "TG/P" => (double_take, double_pass),
            "D/T" => (no_double, double_pass),
            "D/P" => (no_double, double_take),
            _ => (no_double, double_take),
        }
    }
}

/// Shortens a cube option label for matrix display.
pub fn simplify_cube_notation(notation: &str) -> String {
    let lower = notation.to_lowercase();
    if lower.contains("too good") {
        if lower.contains("take") {
            return "TG/T".to_string();
        }
        if lower.contains("pass") {
            return "TG/P".to_string();
        }
    } else if lower.contains("no double") || lower.contains("no redouble") {
        return "N/T".to_string();
    } else if lower.contains("double") || lower.contains("redouble") {
        if lower.contains("take") {
            return "D/T".to_string();
        }
        if lower.contains("pass") || lower.contains("drop") {
            return "D/P".to_string();
        }
    }
    notation.to_string()
}

/// Analyzes a cube position at every away-score pair `2..=L x 2..=L`
/// and tabulates the results. Cells whose output cannot be parsed come
/// back as `None`; an analyzer failure fails the whole matrix.
pub fn generate_score_matrix(
    xgid: &str,
    match_length: u32,
    analyzer: &Analyzer,
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<Vec<Vec<Option<ScoreMatrixCell>>>, ScoreMatrixError> {
    if match_length < 2 {
        return Err(ScoreMatrixError::MatchTooShort(match_length));
    }
    let (position, info) = decode_xgid(xgid)?;

    let aways: Vec<(u32, u32)> = (2..=match_length)
        .flat_map(|player| (2..=match_length).map(move |opponent| (player, opponent)))
        .collect();

    let ids: Vec<String> = aways
        .iter()
        .map(|&(player_away, opponent_away)| {
            let mut at_score = info;
            at_score.dice = None;
            at_score.cube_offered = false;
            at_score.match_length = match_length;
            let on_roll_score = match_length - player_away;
            let opponent_score = match_length - opponent_away;
            match info.on_roll {
                Player::Bottom => {
                    at_score.score_bottom = on_roll_score;
                    at_score.score_top = opponent_score;
                }
                Player::Top => {
                    at_score.score_top = on_roll_score;
                    at_score.score_bottom = opponent_score;
                }
            }
            encode_xgid(&position, &at_score)
        })
        .collect();

    debug!("score matrix: {} cells for {xgid}", ids.len());
    let analyses = analyzer.analyze_batch(&ids, progress, None)?;

    let span = (match_length - 1) as usize;
    let mut matrix = vec![vec![None; span]; span];
    for (&(player_away, opponent_away), analysis) in aways.iter().zip(analyses.iter()) {
        let cell = cell_from_output(&analysis.output, player_away, opponent_away);
        matrix[(player_away - 2) as usize][(opponent_away - 2) as usize] = cell;
    }
    Ok(matrix)
}

fn cell_from_output(
    output: &str,
    player_away: u32,
    opponent_away: u32,
) -> Option<ScoreMatrixCell> {
    let section = cube_section(output)?;
    let moves = synthesize_cube_options(
        &section.equities,
        section.proper_action.as_deref(),
        section.redouble,
        &section.chances,
    );
    let best = moves.iter().find(|m| m.rank == 1)?;
    let best_action = simplify_cube_notation(&best.notation);
    let best_equity = best.equity;
    let equities = section.equities;

    let error_against = |action_equity: f64, matches_best: bool| {
        if matches_best {
            Some(0.0)
        } else {
            Some((best_equity - action_equity).abs())
        }
    };

    Some(ScoreMatrixCell {
        player_away,
        opponent_away,
        error_no_double: error_against(equities.no_double, best_action == "N/T"),
        error_double: error_against(
            equities.double_take,
            best_action == "D/T" || best_action == "TG/T",
        ),
        error_pass: error_against(equities.double_pass, best_action == "D/P"),
        best_action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(best: &str, nd: f64, dt: f64, dp: f64) -> ScoreMatrixCell {
        ScoreMatrixCell {
            player_away: 3,
            opponent_away: 4,
            best_action: best.to_string(),
            error_no_double: Some(nd),
            error_double: Some(dt),
            error_pass: Some(dp),
        }
    }

    #[test]
    fn format_skips_the_best_action() {
        assert_eq!(cell("N/T", 0.0, 0.024, 0.543).format_errors(), "24/543");
        assert_eq!(cell("D/T", 0.031, 0.0, 0.2).format_errors(), "31/200");
        assert_eq!(cell("D/P", 0.05, 0.1, 0.0).format_errors(), "50/100");
        assert_eq!(cell("TG/P", 0.0, 0.4, 0.2).format_errors(), "400/200");
    }

    #[test]
    fn low_error_marks_close_decisions() {
        assert!(cell("N/T", 0.0, 0.015, 0.543).has_low_errors(20));
        assert!(!cell("N/T", 0.0, 0.15, 0.543).has_low_errors(20));
    }

    #[test]
    fn simplification_of_labels() {
        assert_eq!(simplify_cube_notation("No Double/Take"), "N/T");
        assert_eq!(simplify_cube_notation("No redouble"), "N/T");
        assert_eq!(simplify_cube_notation("Double/Take"), "D/T");
        assert_eq!(simplify_cube_notation("Redouble/Pass"), "D/P");
        assert_eq!(simplify_cube_notation("Too Good/Take"), "TG/T");
        assert_eq!(simplify_cube_notation("Too Good/Pass"), "TG/P");
    }

    #[test]
    fn cell_from_parsed_output() {
        let output = "\
Cube analysis
2-ply cubeless equity  +0.172
  0.523 0.142 0.008 - 0.477 0.124 0.006
Cubeful equities:
1. No double           +0.172
2. Double, take        -0.361  ( -0.533)
3. Double, pass        +1.000  ( +0.828)
Proper cube action: No double, take
";
        let cell = cell_from_output(output, 2, 2).unwrap();
        assert_eq!(cell.best_action, "N/T");
        assert_eq!(cell.error_no_double, Some(0.0));
        assert!((cell.error_double.unwrap() - 0.533).abs() < 1e-9);
        assert!((cell.error_pass.unwrap() - 0.828).abs() < 1e-9);
        assert_eq!(cell.format_errors(), "533/828");
    }

    #[test]
    fn unparsable_output_yields_no_cell() {
        assert!(cell_from_output("no cube section here", 2, 2).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn matrix_covers_all_away_pairs() {
        use std::os::unix::fs::PermissionsExt;
        // A stub analyzer that always reports the same cube verdict.
        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("fake-gnubg.sh");
        std::fs::write(
            &stub,
            "#!/bin/sh\ncat <<'EOF'\nCubeful equities:\n1. No double           +0.172\n2. Double, take        -0.361\n3. Double, pass        +1.000\nProper cube action: No double, take\nEOF\n",
        )
        .unwrap();
        let mut permissions = std::fs::metadata(&stub).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&stub, permissions).unwrap();

        let analyzer = Analyzer::new(stub, 1).unwrap();
        let xgid = "XGID=-b----E-C---eE---c-e----B-:0:0:1:00:0:0:0:5:0";
        let matrix = generate_score_matrix(xgid, 3, &analyzer, None).unwrap();
        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == 2));
        assert!(matrix.iter().flatten().all(|cell| cell.is_some()));
        let cell = matrix[0][0].as_ref().unwrap();
        assert_eq!(cell.player_away, 2);
        assert_eq!(cell.best_action, "N/T");
    }

    #[test]
    fn short_matches_are_rejected() {
        let result_err = generate_score_matrix(
            "XGID=-b----E-C---eE---c-e----B-:0:0:1:00:0:0:0:1:0",
            1,
            // The analyzer is never reached; any path fails construction
            // first, so reuse a bogus one through the error path.
            &match Analyzer::new("/bin/sh", 1) {
                Ok(analyzer) => analyzer,
                Err(_) => return,
            },
            None,
        );
        assert!(matches!(result_err, Err(ScoreMatrixError::MatchTooShort(1))));
    }
}
