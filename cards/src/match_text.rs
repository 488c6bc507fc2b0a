/*
 * match_text.rs
 * Part of the gammon-knight project
 * Created Date: Tuesday, March 11th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Importer for GNU Backgammon `export match text` transcripts.
//!
//! Each analyzed move carries a board diagram with its `Position ID` /
//! `Match ID` pair, the played move marked with `*`, a
//! `Rolled NN (err):` marker with the play's error, and the candidate
//! table. Cube decisions appear as `Cube analysis` sections with the
//! three cubeful equities and, when the player got it wrong, an
//! `Alert:` line naming the mistake. Only decisions the analyzer
//! flagged are imported; clean moves make poor flashcards.

use std::sync::LazyLock;

use backgammon::{
    decision::{Decision, DecisionKind, Move, normalized_notation},
    gnuid::{decode_match_id, decode_position_id},
    player::Player,
    xgid::{XgidMatchInfo, encode_xgid},
};
use log::warn;
use regex::Regex;

use crate::{
    cube::{CubeChances, CubeErrorParty, attribute_cube_alert, synthesize_cube_options},
    output_parser::parse_decision_chances,
};

/// A decision recovered from a transcript, with the cube-alert
/// attribution where the analyzer raised one.
#[derive(Debug, Clone)]
pub struct ImportedDecision {
    pub decision: Decision,
    pub alert: Option<CubeAlert>,
}

/// An analyzer complaint about the cube handling of one move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeAlert {
    pub party: CubeErrorParty,
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MatchMetadata {
    /// First name in the score line; plays from the bottom.
    pub bottom_name: Option<String>,
    /// Second name in the score line; plays from the top.
    pub top_name: Option<String>,
    pub match_length: u32,
}

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"The score.*?is:\s*(\w+)\s+\d+,\s*(\w+)\s+\d+\s*\(match to (\d+) point").unwrap()
});

static MOVE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Move number (\d+):\s+(\w+) to play (\d)(\d)").unwrap());

static CUBE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Move number (\d+):\s+(\w+)(?:\s+on roll, cube decision\?|\s+doubles)").unwrap()
});

static POSITION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Position ID:\s+([A-Za-z0-9+/=]+)").unwrap());

static MATCH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Match ID\s*:\s+([A-Za-z0-9+/=]+)").unwrap());

static PLAYED_MOVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s+\w+ moves (.+)").unwrap());

static ROLLED_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rolled \d\d \(([+-]?\d+\.\d+)\):").unwrap());

static CANDIDATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\*?\s*(\d+)\.\s+Cubeful\s+\d+-ply\s+(.+?)\s+Eq\.:\s+([+-]?\d+\.\d+)(?:\s+\(\s*([+-]?\d+\.\d+)\s*\))?",
    )
    .unwrap()
});

static PROBABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(0\.\d+)\s+(0\.\d+)\s+(0\.\d+)\s+-\s+(0\.\d+)\s+(0\.\d+)\s+(0\.\d+)").unwrap()
});

static EQUITY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+(.+?)\s+([+-]?\d+\.\d+)").unwrap());

static PROPER_ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Proper cube action:\s+(.+?)\s*$").unwrap());

static CUBE_ALERT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Alert: (wrong take|bad double|wrong double|missed double|wrong pass)\s+\(\s*([+-]?\d+\.\d+)\s*\)",
    )
    .unwrap()
});

static DOUBLES_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\s+\w+\s+doubles").unwrap());

static RESPONSE_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s+\w+\s+(accepts|passes|rejects)").unwrap());

/// Parses the metadata header of a transcript.
pub fn parse_metadata(text: &str) -> MatchMetadata {
    let mut metadata = MatchMetadata::default();
    if let Some(captures) = SCORE_LINE.captures(text) {
        metadata.bottom_name = Some(captures[1].to_string());
        metadata.top_name = Some(captures[2].to_string());
        metadata.match_length = captures[3].parse().unwrap_or(0);
    }
    metadata
}

/// Parses one exported game transcript into flagged decisions.
pub fn parse_match_text(text: &str) -> Vec<ImportedDecision> {
    let metadata = parse_metadata(text);
    let lines: Vec<&str> = text.lines().collect();
    let mut imported = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if MOVE_HEADER.is_match(line) {
            if let Some(cube) = parse_cube_decision(&lines, index, &metadata) {
                imported.push(cube);
            }
            if let Some(checker) = parse_checker_decision(&lines, index, &metadata) {
                imported.push(ImportedDecision {
                    decision: checker,
                    alert: None,
                });
            }
        } else if CUBE_HEADER.is_match(line) {
            if let Some(cube) = parse_cube_decision(&lines, index, &metadata) {
                imported.push(cube);
            }
        }
    }
    imported
}

fn on_roll_for(name: &str, metadata: &MatchMetadata) -> Player {
    if metadata.bottom_name.as_deref() == Some(name) {
        Player::Bottom
    } else {
        Player::Top
    }
}

fn find_ids(lines: &[&str], start: usize) -> Option<(String, Option<String>)> {
    let mut position_id = None;
    let mut match_id = None;
    for line in lines.iter().skip(start + 1).take(30) {
        if line.starts_with("Move number") {
            break;
        }
        if let Some(captures) = POSITION_ID.captures(line) {
            position_id = Some(captures[1].to_string());
        } else if let Some(captures) = MATCH_ID.captures(line) {
            match_id = Some(captures[1].to_string());
        }
        if position_id.is_some() && match_id.is_some() {
            break;
        }
    }
    position_id.map(|p| (p, match_id))
}

fn parse_checker_decision(
    lines: &[&str],
    start: usize,
    metadata: &MatchMetadata,
) -> Option<Decision> {
    let header = MOVE_HEADER.captures(lines[start])?;
    let move_number: u32 = header[1].parse().ok()?;
    let on_roll = on_roll_for(&header[2], metadata);
    let dice = (header[3].parse::<u8>().ok()?, header[4].parse::<u8>().ok()?);

    let (position_id, match_id) = find_ids(lines, start)?;
    let position = match decode_position_id(&position_id) {
        Ok(position) => position,
        Err(error) => {
            warn!("move {move_number}: {error}");
            return None;
        }
    };
    let match_info = match_id.and_then(|id| decode_match_id(&id).ok());

    // Without the per-roll error marker the move was never analyzed.
    lines
        .iter()
        .skip(start + 1)
        .take(50)
        .take_while(|line| !line.starts_with("Move number"))
        .find_map(|line| ROLLED_ERROR.captures(line))?;

    let played = lines
        .iter()
        .skip(start + 1)
        .take(40)
        .take_while(|line| !line.starts_with("Move number"))
        .find_map(|line| PLAYED_MOVE.captures(line))
        .map(|c| normalized_notation(c[1].trim()));

    let mut candidates = Vec::new();
    for (offset, line) in lines.iter().enumerate().skip(start + 1).take(100) {
        if line.starts_with("Move number") {
            break;
        }
        let Some(captures) = CANDIDATE_LINE.captures(line) else {
            continue;
        };
        let rank: u32 = captures[1].parse().unwrap_or(0);
        let notation = captures[2].trim().to_string();
        let equity: f64 = captures[3].parse().unwrap_or(0.0);
        let delta = captures.get(4).and_then(|m| m.as_str().parse::<f64>().ok());

        let mut candidate = Move::new(notation, equity);
        candidate.rank = rank;
        candidate.source_rank = Some(rank);
        candidate.source_error = delta;
        candidate.error = delta.map(f64::abs).unwrap_or(0.0);
        candidate.was_played =
            played.as_deref() == Some(normalized_notation(&candidate.notation).as_str());
        if let Some(next) = lines.get(offset + 1) {
            if let Some(probs) = PROBABILITY.captures(next) {
                let values: Vec<f64> = (1..=6)
                    .filter_map(|i| probs[i].parse::<f64>().ok())
                    .collect();
                if values.len() == 6 {
                    candidate.player_chances = Some(backgammon::decision::WinChances {
                        win: values[0] * 100.0,
                        gammon: values[1] * 100.0,
                        backgammon: values[2] * 100.0,
                    });
                    candidate.opponent_chances = Some(backgammon::decision::WinChances {
                        win: values[3] * 100.0,
                        gammon: values[4] * 100.0,
                        backgammon: values[5] * 100.0,
                    });
                }
            }
        }
        candidates.push(candidate);
    }
    if candidates.is_empty() {
        return None;
    }

    let (score_top, score_bottom, cube_value, cube_owner, crawford) = match match_info {
        Some(info) => (
            info.score_top,
            info.score_bottom,
            info.cube_value,
            info.cube_owner,
            info.crawford,
        ),
        None => (0, 0, 1, Default::default(), false),
    };

    let xgid = encode_xgid(
        &position,
        &XgidMatchInfo {
            cube_value,
            cube_owner,
            on_roll,
            dice: Some(dice),
            score_top,
            score_bottom,
            crawford_jacoby: crawford as u32,
            match_length: metadata.match_length,
            ..Default::default()
        },
    );

    Some(Decision {
        position,
        on_roll,
        dice: Some(dice),
        score_top,
        score_bottom,
        match_length: metadata.match_length,
        crawford,
        cube_value,
        cube_owner,
        kind: DecisionKind::CheckerPlay,
        candidates,
        move_index: Some(move_number),
        xgid: Some(xgid),
        ..Default::default()
    })
}

fn parse_cube_decision(
    lines: &[&str],
    start: usize,
    metadata: &MatchMetadata,
) -> Option<ImportedDecision> {
    let header = lines[start];
    let (move_number, name) = if let Some(captures) = CUBE_HEADER.captures(header) {
        (captures[1].parse::<u32>().ok()?, captures[2].to_string())
    } else {
        let captures = MOVE_HEADER.captures(header)?;
        (captures[1].parse::<u32>().ok()?, captures[2].to_string())
    };
    let on_roll = on_roll_for(&name, metadata);

    // Locate the cube analysis section; stop early when the move's
    // actual roll content begins.
    let mut section_start = None;
    for (offset, line) in lines.iter().enumerate().skip(start + 1).take(50) {
        if line.trim() == "Cube analysis" {
            section_start = Some(offset);
            break;
        }
        if line.starts_with("Move number") || ROLLED_ERROR.is_match(line) {
            break;
        }
    }
    let section_start = section_start?;

    let (position_id, match_id) = find_ids(lines, start)?;
    let position = decode_position_id(&position_id).ok()?;
    let match_info = match_id.and_then(|id| decode_match_id(&id).ok());

    // Equities and the proper-action verdict live inside the section.
    let mut no_double = None;
    let mut double_take = None;
    let mut double_pass = None;
    let mut redouble = false;
    let mut proper_action = None;
    for line in lines.iter().skip(section_start).take(20) {
        if let Some(captures) = EQUITY_LINE.captures(line) {
            let action = captures[1].trim().to_lowercase();
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
        if let Some(captures) = PROPER_ACTION.captures(line) {
            proper_action = Some(captures[1].trim().to_string());
        }
        if ROLLED_ERROR.is_match(line) {
            break;
        }
    }
    let equities = crate::cube::CubeEquities {
        no_double: no_double?,
        double_take: double_take?,
        double_pass: double_pass?,
    };
    let proper_action = proper_action?;

    // Alerts and the action actually taken precede the section.
    let mut alert = None;
    let mut doubled = false;
    let mut response: Option<&str> = None;
    for line in lines.iter().skip(start).take(section_start - start + 20) {
        if DOUBLES_MARK.is_match(line) {
            doubled = true;
        }
        if let Some(captures) = RESPONSE_MARK.captures(line) {
            // "rejects" is a synonym for passing.
            response = Some(if &captures[1] == "accepts" { "accepts" } else { "passes" });
        }
        if let Some(captures) = CUBE_ALERT.captures(line) {
            if let Some(party) = attribute_cube_alert(&captures[1]) {
                let magnitude = captures[2].parse::<f64>().map(f64::abs).unwrap_or(0.0);
                alert = Some(CubeAlert { party, magnitude });
            }
        }
        if ROLLED_ERROR.is_match(line) {
            break;
        }
    }

    // No alert means the cube handling was fine; nothing to study.
    let alert = match alert {
        Some(alert) if alert.magnitude > 0.0 => alert,
        _ => return None,
    };

    let section_text: String = lines
        .iter()
        .skip(section_start)
        .take(10)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    let chances = CubeChances {
        no_double: parse_decision_chances(&section_text),
        double_take: None,
    };
    let mut candidates =
        synthesize_cube_options(&equities, Some(&proper_action), redouble, &chances);

    let too_good = proper_action.to_lowercase().contains("too good");
    let played_label = if !doubled {
        "No Double/Take".to_string()
    } else if response == Some("passes") {
        if too_good { "Too Good/Pass".to_string() } else { format!("{}/Pass", term(redouble)) }
    } else if too_good {
        "Too Good/Take".to_string()
    } else {
        format!("{}/Take", term(redouble))
    };
    let played_key = played_label.replace("Redouble", "Double");
    if let Some(candidate) = candidates
        .iter_mut()
        .find(|c| c.notation.replace("Redouble", "Double").eq_ignore_ascii_case(&played_key))
    {
        candidate.was_played = true;
    }

    let (score_top, score_bottom, cube_value, cube_owner, crawford) = match match_info {
        Some(info) => (
            info.score_top,
            info.score_bottom,
            info.cube_value,
            info.cube_owner,
            info.crawford,
        ),
        None => (0, 0, 1, Default::default(), false),
    };

    let xgid = encode_xgid(
        &position,
        &XgidMatchInfo {
            cube_value,
            cube_owner,
            on_roll,
            dice: None,
            score_top,
            score_bottom,
            crawford_jacoby: crawford as u32,
            match_length: metadata.match_length,
            ..Default::default()
        },
    );

    let (player_chances, opponent_chances) = match chances.no_double {
        Some((player, opponent)) => (Some(player), Some(opponent)),
        None => (None, None),
    };

    Some(ImportedDecision {
        decision: Decision {
            position,
            on_roll,
            dice: None,
            score_top,
            score_bottom,
            match_length: metadata.match_length,
            crawford,
            cube_value,
            cube_owner,
            kind: DecisionKind::CubeAction,
            candidates,
            player_chances,
            opponent_chances,
            move_index: Some(move_number),
            xgid: Some(xgid),
            ..Default::default()
        },
        alert: Some(alert),
    })
}

fn term(redouble: bool) -> &'static str {
    if redouble { "Redouble" } else { "Double" }
}
