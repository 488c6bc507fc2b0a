/*
 * xg_import.rs
 * Part of the gammon-knight project
 * Created Date: Wednesday, February 26th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Extraction of decisions from the proprietary binary game-file record
//! stream. The low-level struct decoder is a vendor concern; this
//! module consumes its typed records one by one, tracks the session
//! state they imply (match length, running scores, Crawford), and
//! assembles normalized decisions.
//!
//! The vendor format stores boards with the opposite sign convention
//! from ours, so every embedded slot array is negated once at this
//! boundary and validated before anything else touches it.

use backgammon::{
    decision::{Decision, DecisionKind, Move, WinChances, normalized_notation},
    definitions::NumberOf,
    player::{CubeState, Player},
    position::{Position, PositionError},
    xgid::{XgidMatchInfo, encode_xgid},
};
use log::debug;
use thiserror::Error;

use crate::cube::{CubeChances, CubeEquities, synthesize_cube_options};

/// Flag values marking a cube sub-record the vendor never analyzed.
const UNANALYZED_FLAGS: [i32; 2] = [-100, -1000];

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unrecognized record type {tag}")]
    UnrecognizedRecord { tag: u8 },
    #[error("cube record carries no analysis")]
    AnalysisAbsent,
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Match-level header: file format version and match length.
#[derive(Debug, Clone)]
pub struct MatchHeader {
    pub version: i32,
    pub match_length: u32,
    pub player_top: Option<String>,
    pub player_bottom: Option<String>,
}

/// Game-level header: running scores and the Crawford flag.
#[derive(Debug, Clone, Copy)]
pub struct GameHeader {
    pub score_top: u32,
    pub score_bottom: u32,
    pub crawford: bool,
}

/// Up to four (from, to) pairs; `-1` terminates the list, `-1` as a
/// destination bears off, `0`/`25` are the bars.
pub type HopPairs = [i8; 8];

/// One evaluated candidate from a move record. The seven-tuple holds
/// cumulative probabilities `[lose_bg, lose_g, lose_total, win_total,
/// win_g, win_bg]` followed by the equity.
#[derive(Debug, Clone)]
pub struct EvaluatedMove {
    pub hops: HopPairs,
    pub eval: [f64; 7],
}

#[derive(Debug, Clone)]
pub struct MoveRecord {
    /// 1 = bottom player on roll, otherwise top.
    pub active_player: i8,
    /// Board in the vendor's sign convention.
    pub slots: [i8; NumberOf::SLOTS],
    pub dice: (u8, u8),
    /// Signed cube value: positive = top owns, negative = bottom owns,
    /// zero = centered at 1.
    pub cube: i32,
    pub played: HopPairs,
    pub evaluated: Vec<EvaluatedMove>,
}

/// The doubled sub-record of a cube record.
#[derive(Debug, Clone)]
pub struct DoubleAnalysis {
    pub flag: i32,
    pub no_double_equity: f64,
    pub double_take_equity: f64,
    pub double_pass_equity: f64,
    pub no_double_eval: Option<[f64; 7]>,
    pub double_take_eval: Option<[f64; 7]>,
    /// Board embedded in the sub-record, used to recognize all-zero
    /// placeholder analyses.
    pub eval_slots: [i8; NumberOf::SLOTS],
}

#[derive(Debug, Clone)]
pub struct CubeRecord {
    pub active_player: i8,
    pub slots: [i8; NumberOf::SLOTS],
    pub cube: i32,
    /// Whether the player actually doubled.
    pub doubled: bool,
    /// Response when doubled: 0 = pass, 1 = take, 2 = beaver.
    pub take: i32,
    pub analysis: Option<DoubleAnalysis>,
}

/// A typed record from the vendor's segmented game file.
#[derive(Debug, Clone)]
pub enum XgRecord {
    HeaderMatch(MatchHeader),
    HeaderGame(GameHeader),
    Move(MoveRecord),
    Cube(CubeRecord),
    Unknown { tag: u8 },
}

/// Walks a record stream and emits decisions, carrying the session
/// state (scores, match length, Crawford) across records.
#[derive(Debug, Default)]
pub struct XgExtractor {
    version: i32,
    match_length: u32,
    score_top: u32,
    score_bottom: u32,
    crawford: bool,
    game_index: u32,
    move_index: u32,
    source_file: Option<String>,
}

impl XgExtractor {
    pub fn new(source_file: Option<&str>) -> Self {
        XgExtractor {
            source_file: source_file.map(String::from),
            ..Default::default()
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Feeds one record. Headers update session state and yield
    /// nothing; move and cube records yield a decision or an error that
    /// skips just that record.
    pub fn push(&mut self, record: XgRecord) -> Result<Option<Decision>, ExtractError> {
        match record {
            XgRecord::HeaderMatch(header) => {
                self.version = header.version;
                self.match_length = header.match_length;
                debug!(
                    "match header: version {}, length {}",
                    header.version, header.match_length
                );
                Ok(None)
            }
            XgRecord::HeaderGame(header) => {
                self.score_top = header.score_top;
                self.score_bottom = header.score_bottom;
                self.crawford = header.crawford;
                self.game_index += 1;
                self.move_index = 0;
                Ok(None)
            }
            XgRecord::Move(record) => {
                self.move_index += 1;
                self.move_decision(record).map(Some)
            }
            XgRecord::Cube(record) => {
                self.move_index += 1;
                self.cube_decision(record).map(Some)
            }
            XgRecord::Unknown { tag } => Err(ExtractError::UnrecognizedRecord { tag }),
        }
    }

    /// Convenience wrapper: extracts everything, pairing skipped
    /// records with the error that skipped them.
    pub fn extract<I>(records: I, source_file: Option<&str>) -> (Vec<Decision>, Vec<ExtractError>)
    where
        I: IntoIterator<Item = XgRecord>,
    {
        let mut extractor = XgExtractor::new(source_file);
        let mut decisions = Vec::new();
        let mut skipped = Vec::new();
        for record in records {
            match extractor.push(record) {
                Ok(Some(decision)) => decisions.push(decision),
                Ok(None) => {}
                Err(error) => skipped.push(error),
            }
        }
        (decisions, skipped)
    }

    fn move_decision(&self, record: MoveRecord) -> Result<Decision, ExtractError> {
        let on_roll = player_for(record.active_player);
        let position = import_position(&record.slots)?;
        let (cube_value, cube_owner) = cube_state(record.cube);

        let mut candidates: Vec<Move> = record
            .evaluated
            .iter()
            .enumerate()
            .map(|(index, evaluated)| {
                let mut candidate =
                    Move::new(hops_to_notation(&evaluated.hops), evaluated.eval[6]);
                candidate.source_rank = Some(index as u32 + 1);
                let (player, opponent) = chances_from_eval(&evaluated.eval);
                candidate.player_chances = Some(player);
                candidate.opponent_chances = Some(opponent);
                candidate
            })
            .collect();

        let played = normalized_notation(&hops_to_notation(&record.played));
        if !played.is_empty() {
            if let Some(candidate) = candidates
                .iter_mut()
                .find(|c| normalized_notation(&c.notation) == played)
            {
                candidate.was_played = true;
            }
        }

        candidates.sort_by(|a, b| {
            b.equity
                .partial_cmp(&a.equity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(best_equity) = candidates.first().map(|c| c.equity) {
            for (index, candidate) in candidates.iter_mut().enumerate() {
                candidate.rank = index as u32 + 1;
                candidate.error = (best_equity - candidate.equity).abs();
                candidate.source_error = Some(candidate.equity - best_equity);
            }
        }

        let xgid = encode_xgid(
            &position,
            &XgidMatchInfo {
                cube_value,
                cube_owner,
                on_roll,
                dice: Some(record.dice),
                score_top: self.score_top,
                score_bottom: self.score_bottom,
                crawford_jacoby: self.crawford as u32,
                match_length: self.match_length,
                ..Default::default()
            },
        );

        Ok(Decision {
            position,
            on_roll,
            dice: Some(record.dice),
            score_top: self.score_top,
            score_bottom: self.score_bottom,
            match_length: self.match_length,
            crawford: self.crawford,
            cube_value,
            cube_owner,
            kind: DecisionKind::CheckerPlay,
            candidates,
            xgid: Some(xgid),
            source_file: self.source_file.clone(),
            game_index: Some(self.game_index),
            move_index: Some(self.move_index),
            ..Default::default()
        })
    }

    fn cube_decision(&self, record: CubeRecord) -> Result<Decision, ExtractError> {
        let analysis = record.analysis.ok_or(ExtractError::AnalysisAbsent)?;
        if UNANALYZED_FLAGS.contains(&analysis.flag) {
            return Err(ExtractError::AnalysisAbsent);
        }
        // Placeholder sub-records carry zero equities and an empty
        // board.
        if analysis.no_double_equity == 0.0
            && analysis.double_take_equity == 0.0
            && (analysis.double_pass_equity + 1.0).abs() < 1e-3
            && analysis.eval_slots.iter().all(|&c| c == 0)
        {
            return Err(ExtractError::AnalysisAbsent);
        }

        let on_roll = player_for(record.active_player);
        let position = import_position(&record.slots)?;
        let (cube_value, cube_owner) = cube_state(record.cube);

        let equities = CubeEquities {
            no_double: analysis.no_double_equity,
            double_take: analysis.double_take_equity,
            double_pass: analysis.double_pass_equity,
        };
        // The record states no proper action; derive it assuming a
        // perfect responder. When taking is worse for the opponent than
        // passing they will pass, so doubling is compared at the pass
        // equity, otherwise at the take equity.
        let phrase = if equities.double_take > equities.double_pass {
            if equities.no_double >= equities.double_pass {
                "No double, take"
            } else {
                "Double, pass"
            }
        } else if equities.no_double >= equities.double_take {
            "No double, take"
        } else {
            "Double, take"
        };

        let chances = CubeChances {
            no_double: analysis.no_double_eval.as_ref().map(|e| chances_from_eval(e)),
            double_take: analysis.double_take_eval.as_ref().map(|e| chances_from_eval(e)),
        };
        let mut candidates = synthesize_cube_options(&equities, Some(phrase), false, &chances);

        let played_label = if !record.doubled {
            "No Double/Take"
        } else if record.take == 1 || record.take == 2 {
            "Double/Take"
        } else {
            "Double/Pass"
        };
        if let Some(candidate) = candidates.iter_mut().find(|c| c.notation == played_label) {
            candidate.was_played = true;
        }

        let xgid = encode_xgid(
            &position,
            &XgidMatchInfo {
                cube_value,
                cube_owner,
                on_roll,
                dice: None,
                score_top: self.score_top,
                score_bottom: self.score_bottom,
                crawford_jacoby: self.crawford as u32,
                match_length: self.match_length,
                ..Default::default()
            },
        );

        Ok(Decision {
            position,
            on_roll,
            dice: None,
            score_top: self.score_top,
            score_bottom: self.score_bottom,
            match_length: self.match_length,
            crawford: self.crawford,
            cube_value,
            cube_owner,
            kind: DecisionKind::CubeAction,
            candidates,
            xgid: Some(xgid),
            source_file: self.source_file.clone(),
            game_index: Some(self.game_index),
            move_index: Some(self.move_index),
            ..Default::default()
        })
    }
}

fn player_for(active: i8) -> Player {
    if active == 1 { Player::Bottom } else { Player::Top }
}

/// Negates the vendor's sign convention and validates the result.
fn import_position(slots: &[i8; NumberOf::SLOTS]) -> Result<Position, PositionError> {
    let mut negated = [0i8; NumberOf::SLOTS];
    for (slot, &count) in slots.iter().enumerate() {
        negated[slot] = -count;
    }
    Position::from_slots(negated)
}

fn cube_state(cube: i32) -> (u32, CubeState) {
    if cube == 0 {
        (1, CubeState::Centered)
    } else if cube > 0 {
        (cube as u32, CubeState::TopOwns)
    } else {
        ((-cube) as u32, CubeState::BottomOwns)
    }
}

/// The seven-tuple lists cumulative loss probabilities first, then
/// cumulative win probabilities, then the equity.
fn chances_from_eval(eval: &[f64; 7]) -> (WinChances, WinChances) {
    (
        WinChances {
            win: eval[3] * 100.0,
            gammon: eval[4] * 100.0,
            backgammon: eval[5] * 100.0,
        },
        WinChances {
            win: eval[2] * 100.0,
            gammon: eval[1] * 100.0,
            backgammon: eval[0] * 100.0,
        },
    )
}

/// Converts hop pairs to display notation: `0` and `25` are the bars,
/// `-1` as a destination bears off, all-zero means the roll could not
/// be played.
pub fn hops_to_notation(hops: &HopPairs) -> String {
    if hops.iter().all(|&h| h == 0) {
        return "Cannot move".to_string();
    }
    let mut parts = Vec::new();
    for pair in hops.chunks(2) {
        let from = pair[0];
        if from == -1 {
            break;
        }
        let to = pair[1];
        let from_str = match from {
            0 | 25 => "bar".to_string(),
            p => p.to_string(),
        };
        let to_str = match to {
            -1 => "off".to_string(),
            0 | 25 => "bar".to_string(),
            p => p.to_string(),
        };
        parts.push(format!("{from_str}/{to_str}"));
    }
    parts.join(" ")
}
