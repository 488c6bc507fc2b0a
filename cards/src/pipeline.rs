/*
 * pipeline.rs
 * Part of the gammon-knight project
 * Created Date: Wednesday, March 12th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! The decision pipeline: raw text in, note-records out.
//!
//! A decision moves through parse, optional analyzer enrichment,
//! ranking, rendering and emission. One bad input never sinks a batch;
//! it lands on the skipped list with its reason. Analyzer fan-out
//! failures are the exception: those fail the run with full context.

use backgammon::{
    decision::{Decision, DecisionKind},
    gnuid::decode_gnuid,
    notation::apply_move,
    player::Player,
    xgid::{XgidMatchInfo, encode_xgid, decode_xgid},
};
use log::{debug, info};

use crate::{
    analyzer::{Analyzer, AnalyzerError, CancelToken},
    note::{MediaArtifact, NoteRecord, build_note},
    output_parser::{parse_analysis, parse_decision_chances},
    render::BoardRenderer,
    settings::{PlayerMask, Settings},
};

/// One input that fell out of the pipeline, with the stage that
/// dropped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub index: usize,
    pub stage: &'static str,
    pub reason: String,
}

/// The outcome of a pipeline run: emitted note-records and media,
/// everything skipped with reasons, and the fatal error if the
/// analyzer batch failed.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub notes: Vec<NoteRecord>,
    pub media: Vec<MediaArtifact>,
    pub skipped: Vec<SkippedItem>,
    pub fatal: Option<AnalyzerError>,
}

/// Parses raw pasted text into skeleton decisions: one per line that
/// holds a recognizable position id. Candidates stay empty for the
/// enrichment stage.
pub fn normalize(raw: &str) -> (Vec<Decision>, Vec<SkippedItem>) {
    let mut decisions = Vec::new();
    let mut skipped = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match skeleton_from_line(line) {
            Ok(decision) => decisions.push(decision),
            Err(reason) => skipped.push(SkippedItem {
                index,
                stage: "parse",
                reason,
            }),
        }
    }
    debug!(
        "normalized {} decisions, skipped {}",
        decisions.len(),
        skipped.len()
    );
    (decisions, skipped)
}

fn skeleton_from_line(line: &str) -> Result<Decision, String> {
    if let Ok((position, info)) = decode_xgid(line) {
        let kind = if info.dice.is_some() {
            DecisionKind::CheckerPlay
        } else {
            DecisionKind::CubeAction
        };
        return Ok(Decision {
            position,
            on_roll: info.on_roll,
            dice: info.dice,
            score_top: info.score_top,
            score_bottom: info.score_bottom,
            match_length: info.match_length,
            crawford: info.match_length > 0 && info.crawford_jacoby != 0,
            cube_value: info.cube_value,
            cube_owner: info.cube_owner,
            kind,
            xgid: Some(encode_xgid(&position, &info)),
            ..Default::default()
        });
    }
    if let Ok((position, info)) = decode_gnuid(line) {
        let kind = if info.dice.is_some() {
            DecisionKind::CheckerPlay
        } else {
            DecisionKind::CubeAction
        };
        let xgid = encode_xgid(
            &position,
            &XgidMatchInfo {
                cube_value: info.cube_value,
                cube_owner: info.cube_owner,
                on_roll: info.on_roll,
                dice: info.dice,
                score_top: info.score_top,
                score_bottom: info.score_bottom,
                crawford_jacoby: info.crawford as u32,
                match_length: info.match_length,
                ..Default::default()
            },
        );
        return Ok(Decision {
            position,
            on_roll: info.on_roll,
            dice: info.dice,
            score_top: info.score_top,
            score_bottom: info.score_bottom,
            match_length: info.match_length,
            crawford: info.crawford,
            cube_value: info.cube_value,
            cube_owner: info.cube_owner,
            kind,
            xgid: Some(xgid),
            ..Default::default()
        });
    }
    Err(format!("`{line}` is not a recognizable position id"))
}

/// Fills in analysis for decisions that arrived without candidates,
/// using the analyzer fan-out. Source metadata and user notes on the
/// skeleton survive enrichment. Unparseable analyzer output skips the
/// one decision; a failed batch is fatal and returned as the error.
pub fn enrich(
    decisions: &mut [Decision],
    analyzer: &Analyzer,
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    cancel: Option<&CancelToken>,
) -> Result<Vec<SkippedItem>, AnalyzerError> {
    let pending: Vec<usize> = decisions
        .iter()
        .enumerate()
        .filter(|(_, d)| d.candidates.is_empty() && d.xgid.is_some())
        .map(|(index, _)| index)
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = pending
        .iter()
        .filter_map(|&index| decisions[index].xgid.clone())
        .collect();
    info!("enriching {} decisions through the analyzer", ids.len());
    let analyses = analyzer.analyze_batch(&ids, progress, cancel)?;

    let mut skipped = Vec::new();
    for (&index, analysis) in pending.iter().zip(analyses.iter()) {
        let decision = &mut decisions[index];
        match parse_analysis(&analysis.output, analysis.kind) {
            Ok(candidates) => {
                decision.kind = analysis.kind;
                if decision.kind == DecisionKind::CubeAction {
                    decision.dice = None;
                }
                decision.candidates = candidates;
                if decision.player_chances.is_none() {
                    if let Some((player, opponent)) = parse_decision_chances(&analysis.output) {
                        decision.player_chances = Some(player);
                        decision.opponent_chances = Some(opponent);
                    }
                }
            }
            Err(error) => skipped.push(SkippedItem {
                index,
                stage: "enrich",
                reason: error.to_string(),
            }),
        }
    }
    Ok(skipped)
}

/// Import filter: keep decisions whose player passes the mask and
/// whose played move was a big enough mistake to be worth studying.
pub fn filter_imported(
    decisions: Vec<Decision>,
    mask: &PlayerMask,
    threshold: f64,
) -> (Vec<Decision>, Vec<SkippedItem>) {
    let mut kept = Vec::new();
    let mut skipped = Vec::new();
    for (index, decision) in decisions.into_iter().enumerate() {
        let included = match decision.on_roll {
            Player::Top => mask.include_top,
            Player::Bottom => mask.include_bottom,
        };
        if !included {
            skipped.push(SkippedItem {
                index,
                stage: "filter",
                reason: format!("{} is excluded by the player mask", decision.on_roll),
            });
            continue;
        }
        match decision.played() {
            Some(played) if played.error.abs() >= threshold => kept.push(decision),
            Some(played) => skipped.push(SkippedItem {
                index,
                stage: "filter",
                reason: format!(
                    "played-move error {:.3} is below the threshold {threshold:.3}",
                    played.error
                ),
            }),
            None => skipped.push(SkippedItem {
                index,
                stage: "filter",
                reason: "no candidate is marked as played".to_string(),
            }),
        }
    }
    (kept, skipped)
}

/// Runs the move applier over a checker-play decision's candidates so
/// cards can show the board after each move.
pub fn attach_resulting_positions(decision: &mut Decision) {
    if decision.kind != DecisionKind::CheckerPlay {
        return;
    }
    let position = decision.position;
    let on_roll = decision.on_roll;
    for candidate in &mut decision.candidates {
        if candidate.resulting_position.is_some() {
            continue;
        }
        if let Ok((next, _)) = apply_move(&position, &candidate.notation, on_roll) {
            candidate.resulting_position = Some(next);
        }
    }
}

/// Renders and emits note-records for every decision that carries
/// candidates.
pub fn emit(
    decisions: &[Decision],
    renderer: &BoardRenderer,
) -> (Vec<NoteRecord>, Vec<MediaArtifact>, Vec<SkippedItem>) {
    let mut notes = Vec::new();
    let mut media = Vec::new();
    let mut skipped = Vec::new();
    for (index, decision) in decisions.iter().enumerate() {
        if decision.candidates.is_empty() {
            skipped.push(SkippedItem {
                index,
                stage: "emit",
                reason: "decision has no analysis".to_string(),
            });
            continue;
        }
        let (note, mut artifacts) = build_note(decision, renderer);
        notes.push(note);
        media.append(&mut artifacts);
    }
    (notes, media, skipped)
}

/// The full run: `raw -> parsed -> enriched -> ranked -> rendered ->
/// emitted`, with failures either skipped per item or fatal for the
/// batch.
pub fn run(
    raw: &str,
    settings: &Settings,
    analyzer: Option<&Analyzer>,
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    cancel: Option<&CancelToken>,
) -> PipelineReport {
    let mut report = PipelineReport::default();

    let (mut decisions, skipped) = normalize(raw);
    report.skipped.extend(skipped);

    if let Some(analyzer) = analyzer {
        match enrich(&mut decisions, analyzer, progress, cancel) {
            Ok(skipped) => report.skipped.extend(skipped),
            Err(error) => {
                report.fatal = Some(error);
                return report;
            }
        }
    }

    for decision in &mut decisions {
        attach_resulting_positions(decision);
    }

    let renderer = BoardRenderer::new(settings.palette(), settings.orientation);
    let (notes, media, skipped) = emit(&decisions, &renderer);
    report.notes = notes;
    report.media = media;
    report.skipped.extend(skipped);
    info!(
        "pipeline emitted {} notes, skipped {}",
        report.notes.len(),
        report.skipped.len()
    );
    report
}
