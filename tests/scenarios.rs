/*
 * scenarios.rs
 * Part of the gammon-knight project
 * Created Date: Friday, March 14th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! End-to-end checks across the board crate and the card pipeline.

use backgammon::{
    decision::DecisionKind,
    gnuid::{decode_gnuid, encode_gnuid},
    notation::apply_move,
    ogid::{decode_ogid, encode_ogid, OgidMatchInfo},
    player::{CubeState, Player},
    position::Position,
    xgid::{decode_xgid, encode_xgid},
};
use cards::{
    colors::CLASSIC,
    cube::{CubeChances, CubeEquities, synthesize_cube_options},
    render::{BoardRenderer, Orientation},
};

const OPENING_XGID: &str = "XGID=-b----E-C---eE---c-e----B-:0:0:1:52:0:0:0:0:0";
const STARTING_GNUID: &str = "4HPwATDgc/ABMA:8IhuACAACAAE";

#[test]
fn opening_xgid_decodes_to_the_starting_position() {
    let (position, info) = decode_xgid(OPENING_XGID).unwrap();
    assert_eq!(info.on_roll, Player::Bottom);
    assert_eq!(info.dice, Some((5, 2)));
    assert_eq!(info.cube_owner, CubeState::Centered);
    assert_eq!(info.cube_value, 1);
    assert_eq!(info.match_length, 0);
    assert_eq!(position.pip_count(Player::Top), 167);
    assert_eq!(position.pip_count(Player::Bottom), 167);
}

#[test]
fn gnuid_matches_the_xgid_checker_distribution() {
    let (from_xgid, _) = decode_xgid(OPENING_XGID).unwrap();
    let (from_gnuid, _) = decode_gnuid(STARTING_GNUID).unwrap();
    assert_eq!(from_xgid, from_gnuid);
}

#[test]
fn cross_codec_position_fidelity() {
    // XGID-decode, re-encode through GNUID, and come back.
    let (position, _) = decode_xgid(OPENING_XGID).unwrap();
    let gnuid = encode_gnuid(&position, &Default::default());
    let (recovered, _) = decode_gnuid(&gnuid).unwrap();
    assert_eq!(position, recovered);

    let ogid = encode_ogid(&position, &OgidMatchInfo::default());
    let (via_ogid, _) = decode_ogid(&ogid).unwrap();
    assert_eq!(position, via_ogid);
}

#[test]
fn codec_round_trips_preserve_surfaced_fields() {
    let (position, info) = decode_xgid(OPENING_XGID).unwrap();
    let encoded = encode_xgid(&position, &info);
    assert_eq!(encoded, OPENING_XGID);

    let (gnu_position, gnu_info) = decode_gnuid(STARTING_GNUID).unwrap();
    let re_encoded = encode_gnuid(&gnu_position, &gnu_info);
    let (position_again, info_again) = decode_gnuid(&re_encoded).unwrap();
    assert_eq!(gnu_position, position_again);
    assert_eq!(gnu_info, info_again);
}

#[test]
fn all_codec_outputs_satisfy_the_board_invariants() {
    let (a, _) = decode_xgid(OPENING_XGID).unwrap();
    let (b, _) = decode_gnuid(STARTING_GNUID).unwrap();
    assert!(a.validate().is_ok());
    assert!(b.validate().is_ok());
}

#[test]
fn opening_reply_move_application() {
    let (position, _) = decode_xgid(OPENING_XGID).unwrap();
    let (next, skipped) = apply_move(&position, "13/9 6/5", Player::Bottom).unwrap();
    assert!(skipped.is_empty());
    assert_eq!(next.slot(13), -4);
    assert_eq!(next.slot(9), -1);
    assert_eq!(next.slot(6), -4);
    assert_eq!(next.slot(5), -1);
    assert_eq!(next.pip_count(Player::Top), 167);
    assert_eq!(next.pip_count(Player::Bottom), 162);
    assert!(next.validate().is_ok());
}

#[test]
fn hit_moves_one_checker_to_the_bar() {
    let mut slots = [0i8; 26];
    slots[5] = 1;
    slots[10] = 14;
    slots[1] = -15;
    let position = Position::from_slots(slots).unwrap();
    let (next, _) = apply_move(&position, "1/5*", Player::Bottom).unwrap();
    assert_eq!(next.slot(5), -1);
    assert_eq!(next.slot(0), 1);
    assert_eq!(next.bar_count(Player::Top), 1);
}

#[test]
fn too_good_pass_synthesis() {
    let moves = synthesize_cube_options(
        &CubeEquities {
            no_double: 0.8,
            double_take: 1.2,
            double_pass: 1.0,
        },
        Some("Too good to double, pass"),
        false,
        &CubeChances::default(),
    );
    let labels: Vec<&str> = moves.iter().map(|m| m.notation.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "No Double/Take",
            "Double/Take",
            "Double/Pass",
            "Too Good/Take",
            "Too Good/Pass"
        ]
    );
    assert_eq!(moves[4].rank, 1);
    let expected_errors = [0.0, 0.4, 0.2, 0.2, 0.0];
    for (candidate, want) in moves.iter().zip(expected_errors.iter()) {
        assert!((candidate.error - want).abs() < 1e-9);
    }
}

#[test]
fn renderer_output_is_byte_identical_across_calls() {
    let (position, info) = decode_xgid(OPENING_XGID).unwrap();
    let render = || {
        BoardRenderer::new(CLASSIC, Orientation::CounterClockwise).render(
            &position,
            info.on_roll,
            info.dice,
            info.cube_value,
            info.cube_owner,
        )
    };
    assert_eq!(render(), render());
}

#[test]
fn renderer_draws_a_circle_for_every_occupied_slot() {
    let (position, info) = decode_xgid(OPENING_XGID).unwrap();
    let svg = BoardRenderer::new(CLASSIC, Orientation::CounterClockwise).render(
        &position,
        info.on_roll,
        None,
        1,
        CubeState::Centered,
    );
    let occupied = (1..=24).filter(|&slot| position.slot(slot) != 0).count();
    let circles = svg.matches("<circle class=\"checker ").count();
    assert!(circles >= occupied);
}

#[cfg(unix)]
mod analyzer_scenarios {
    use std::path::PathBuf;
    use std::time::Duration;

    use cards::analyzer::{Analyzer, AnalyzerError};

    fn stub_analyzer(body: &str) -> (tempfile::TempDir, PathBuf) {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake-gnubg.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut permissions = std::fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).unwrap();
        (dir, path)
    }

    #[test]
    fn fan_out_preserves_order_when_the_first_task_finishes_last() {
        let (_dir, stub) =
            stub_analyzer("grep -q ':11:' \"$3\" && sleep 1\ncat \"$3\"\nexit 0");
        let analyzer = Analyzer::new(stub, 1).unwrap();
        let ids: Vec<String> = ["11", "22", "33"]
            .iter()
            .map(|dice| format!("XGID=-b----E-C---eE---c-e----B-:0:0:1:{dice}:0:0:0:0:0"))
            .collect();
        let results = analyzer.analyze_batch(&ids, None, None).unwrap();
        for (id, analysis) in ids.iter().zip(results.iter()) {
            assert!(analysis.output.contains(id));
        }
    }

    #[test]
    fn zero_second_timeout_fails_with_timeout() {
        let (_dir, stub) = stub_analyzer("sleep 5");
        let analyzer = Analyzer::new(stub, 1)
            .unwrap()
            .with_hint_timeout(Duration::ZERO);
        let result =
            analyzer.analyze_position("XGID=-b----E-C---eE---c-e----B-:0:0:1:52:0:0:0:0:0");
        assert!(matches!(result, Err(AnalyzerError::Timeout { .. })));
    }
}

#[test]
fn best_move_errors_follow_the_best_equity() {
    use backgammon::decision::{Decision, Move};

    let mut best = Move::new("8/5 6/5", 0.18);
    best.rank = 1;
    let mut second = Move::new("24/21 13/12", -0.15);
    second.rank = 2;
    second.error = 0.33;
    let decision = Decision {
        dice: Some((3, 1)),
        candidates: vec![best, second],
        ..Default::default()
    };
    decision.validate().unwrap();
    assert_eq!(decision.best().unwrap().error, 0.0);
    let best_equity = decision.best().unwrap().equity;
    for candidate in decision.candidates.iter().filter(|m| m.rank != 1) {
        assert!(((best_equity - candidate.equity).abs() - candidate.error).abs() < 1e-9);
    }
}
