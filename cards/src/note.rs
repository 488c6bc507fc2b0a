/*
 * note.rs
 * Part of the gammon-knight project
 * Created Date: Thursday, March 6th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Flashcard note-record assembly.
//!
//! One decision becomes one note-record (front, back, tags) plus the
//! SVG media artifacts the two sides reference. The host application
//! owns styling and delivery; everything emitted here is stable across
//! runs for the same decision, keyed by the canonical XGID.

use std::fmt::Write;

use backgammon::{
    decision::{Decision, DecisionKind},
    xgid::{XgidMatchInfo, encode_xgid},
};

use crate::render::BoardRenderer;

/// The value handed to the flashcard host for one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub canonical_xgid: String,
    pub front_html: String,
    pub back_html: String,
    pub tags: Vec<String>,
}

/// A named SVG referenced from note HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    pub name: String,
    pub svg: String,
}

/// Number of candidates shown as answer options on the front.
const MAX_FRONT_OPTIONS: usize = 5;
const OPTION_LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Builds the note-record and its media for one decision.
pub fn build_note(decision: &Decision, renderer: &BoardRenderer) -> (NoteRecord, Vec<MediaArtifact>) {
    let canonical_xgid = canonical_xgid(decision);
    let board_name = format!("board-{}.svg", fnv1a_hex(&canonical_xgid));
    let board_svg = renderer.render(
        &decision.position,
        decision.on_roll,
        decision.dice,
        decision.cube_value,
        decision.cube_owner,
    );
    let mut media = vec![MediaArtifact {
        name: board_name.clone(),
        svg: board_svg,
    }];

    // The best move's resulting board goes on the back when the move
    // applier produced one.
    let answer_board = decision
        .best()
        .and_then(|best| best.resulting_position.as_ref())
        .map(|position| {
            let name = format!("board-{}-answer.svg", fnv1a_hex(&canonical_xgid));
            let svg = renderer.render(
                position,
                decision.on_roll.opponent(),
                None,
                decision.cube_value,
                decision.cube_owner,
            );
            media.push(MediaArtifact { name: name.clone(), svg });
            name
        });

    let front_html = front_html(decision, &board_name);
    let back_html = back_html(decision, &board_name, answer_board.as_deref());
    let tags = tags(decision);

    (
        NoteRecord {
            canonical_xgid,
            front_html,
            back_html,
            tags,
        },
        media,
    )
}

/// The stable identity of a decision: its declared XGID, or one
/// re-encoded from the record itself.
pub fn canonical_xgid(decision: &Decision) -> String {
    if let Some(xgid) = &decision.xgid {
        return xgid.clone();
    }
    encode_xgid(
        &decision.position,
        &XgidMatchInfo {
            cube_value: decision.cube_value,
            cube_owner: decision.cube_owner,
            on_roll: decision.on_roll,
            dice: decision.dice,
            score_top: decision.score_top,
            score_bottom: decision.score_bottom,
            crawford_jacoby: decision.crawford as u32,
            match_length: decision.match_length,
            ..Default::default()
        },
    )
}

fn front_html(decision: &Decision, board_name: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"card-front\"><div class=\"metadata\">{}</div><img src=\"{board_name}\">",
        decision.context_label()
    );
    if !decision.candidates.is_empty() {
        html.push_str("<ol class=\"options\">");
        for (index, candidate) in front_candidates(decision).iter().enumerate() {
            let letter = OPTION_LETTERS.get(index).copied().unwrap_or('?');
            let _ = write!(
                html,
                "<li><span class=\"option-letter\">{letter}</span> {}</li>",
                escape(&candidate.notation)
            );
        }
        html.push_str("</ol>");
    }
    html.push_str("</div>");
    html
}

/// Options shown on the front: cube decisions keep their fixed
/// five-option order, checker plays list the strongest candidates by
/// rank.
fn front_candidates(decision: &Decision) -> Vec<&backgammon::decision::Move> {
    match decision.kind {
        DecisionKind::CubeAction => decision.candidates.iter().collect(),
        DecisionKind::CheckerPlay => {
            let mut ranked: Vec<_> = decision.candidates.iter().collect();
            ranked.sort_by_key(|m| m.rank);
            ranked.truncate(MAX_FRONT_OPTIONS);
            ranked
        }
    }
}

fn back_html(decision: &Decision, board_name: &str, answer_board: Option<&str>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"card-back\"><div class=\"metadata\">{}</div><img src=\"{board_name}\">",
        decision.context_label()
    );
    if let Some(answer) = answer_board {
        let _ = write!(html, "<img class=\"answer-board\" src=\"{answer}\">");
    }

    html.push_str(
        "<table class=\"candidates\"><tr><th></th><th>Move</th><th>Equity</th><th>Error</th></tr>",
    );
    let mut ranked: Vec<_> = decision.candidates.iter().collect();
    ranked.sort_by_key(|m| m.rank);
    for candidate in ranked {
        let marker = if candidate.was_played { " class=\"played\"" } else { "" };
        let _ = write!(
            html,
            "<tr{marker}><td>{}</td><td>{}</td><td>{:+.3}</td><td>{:.3}</td></tr>",
            candidate.rank,
            escape(&candidate.notation),
            candidate.equity,
            candidate.error
        );
    }
    html.push_str("</table>");

    if let Some(note) = &decision.note {
        let _ = write!(html, "<div class=\"note\">{}</div>", escape(note));
    }
    html.push_str("</div>");
    html
}

fn tags(decision: &Decision) -> Vec<String> {
    let mut tags = vec!["backgammon".to_string()];
    tags.push(match decision.kind {
        DecisionKind::CheckerPlay => "checker-play".to_string(),
        DecisionKind::CubeAction => "cube-action".to_string(),
    });
    tags.push(if decision.is_money_game() {
        "money".to_string()
    } else {
        format!("match-{}", decision.match_length)
    });
    if let Some(played) = decision.played() {
        if played.error >= 0.08 {
            tags.push("blunder".to_string());
        } else if played.error >= 0.02 {
            tags.push("error".to_string());
        }
    }
    tags
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 64-bit FNV-1a, used to derive stable media names from XGIDs.
fn fnv1a_hex(text: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use backgammon::decision::Move;
    use backgammon::position::Position;
    use crate::colors::CLASSIC;
    use crate::render::Orientation;

    fn renderer() -> BoardRenderer {
        BoardRenderer::new(CLASSIC, Orientation::CounterClockwise)
    }

    fn checker_decision() -> Decision {
        let mut best = Move::new("8/5 6/5", 0.18);
        best.rank = 1;
        best.was_played = true;
        let mut second = Move::new("24/21 13/12", -0.15);
        second.rank = 2;
        second.error = 0.33;
        Decision {
            position: Position::STARTING,
            dice: Some((3, 1)),
            candidates: vec![second, best],
            note: Some("Make the golden point.".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn note_is_stable_across_builds() {
        let decision = checker_decision();
        let (a, media_a) = build_note(&decision, &renderer());
        let (b, media_b) = build_note(&decision, &renderer());
        assert_eq!(a, b);
        assert_eq!(media_a, media_b);
    }

    #[test]
    fn canonical_xgid_is_derived_when_absent() {
        let decision = checker_decision();
        let xgid = canonical_xgid(&decision);
        assert!(xgid.starts_with("XGID="));
        let with_declared = Decision {
            xgid: Some("XGID=declared".to_string()),
            ..decision
        };
        assert_eq!(canonical_xgid(&with_declared), "XGID=declared");
    }

    #[test]
    fn front_lists_options_by_rank() {
        let (note, _) = build_note(&checker_decision(), &renderer());
        let best_at = note.front_html.find("8/5 6/5").unwrap();
        let second_at = note.front_html.find("24/21 13/12").unwrap();
        assert!(best_at < second_at);
        assert!(note.front_html.contains("option-letter"));
    }

    #[test]
    fn back_marks_the_played_move_and_carries_the_note() {
        let (note, _) = build_note(&checker_decision(), &renderer());
        assert!(note.back_html.contains("class=\"played\""));
        assert!(note.back_html.contains("Make the golden point."));
    }

    #[test]
    fn media_is_referenced_from_both_sides() {
        let (note, media) = build_note(&checker_decision(), &renderer());
        assert_eq!(media.len(), 1);
        assert!(note.front_html.contains(&media[0].name));
        assert!(note.back_html.contains(&media[0].name));
        assert!(media[0].svg.starts_with("<svg"));
    }

    #[test]
    fn answer_board_is_emitted_when_present() {
        let mut decision = checker_decision();
        let index = decision
            .candidates
            .iter()
            .position(|c| c.rank == 1)
            .unwrap();
        decision.candidates[index].resulting_position = Some(Position::STARTING);
        let (note, media) = build_note(&decision, &renderer());
        assert_eq!(media.len(), 2);
        assert!(media[1].name.ends_with("-answer.svg"));
        assert!(note.back_html.contains(&media[1].name));
    }

    #[test]
    fn tags_describe_the_decision() {
        let (note, _) = build_note(&checker_decision(), &renderer());
        assert!(note.tags.contains(&"backgammon".to_string()));
        assert!(note.tags.contains(&"checker-play".to_string()));
        assert!(note.tags.contains(&"money".to_string()));
        // The played move is the best move, so no error band tag.
        assert!(!note.tags.contains(&"blunder".to_string()));
    }

    #[test]
    fn html_escapes_user_notes() {
        let mut decision = checker_decision();
        decision.note = Some("<script>".to_string());
        let (note, _) = build_note(&decision, &renderer());
        assert!(note.back_html.contains("&lt;script&gt;"));
    }
}
