/*
 * cube.rs
 * Part of the gammon-knight project
 * Created Date: Friday, February 21st 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Five-option cube synthesis.
//!
//! The analyzer only ever reports three equities for a cube decision
//! (no double, double/take, double/pass), but study cards present five
//! labeled options, adding the two "too good" variants. All ingest
//! paths funnel through [`synthesize_cube_options`] so they agree on
//! ordering, ranking and error anchoring.

use backgammon::decision::{Move, WinChances};

/// The three equities an analyzer reports for a cube decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeEquities {
    pub no_double: f64,
    pub double_take: f64,
    pub double_pass: f64,
}

/// Player/opponent chance pairs for the evaluations that have them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CubeChances {
    pub no_double: Option<(WinChances, WinChances)>,
    pub double_take: Option<(WinChances, WinChances)>,
}

/// Index into the fixed five-option output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeOption {
    NoDoubleTake = 0,
    DoubleTake = 1,
    DoublePass = 2,
    TooGoodTake = 3,
    TooGoodPass = 4,
}

impl CubeOption {
    pub fn label(self, redouble: bool) -> String {
        let term = if redouble { "Redouble" } else { "Double" };
        match self {
            CubeOption::NoDoubleTake => format!("No {term}/Take"),
            CubeOption::DoubleTake => format!("{term}/Take"),
            CubeOption::DoublePass => format!("{term}/Pass"),
            CubeOption::TooGoodTake => "Too Good/Take".to_string(),
            CubeOption::TooGoodPass => "Too Good/Pass".to_string(),
        }
    }
}

const OPTION_ORDER: [CubeOption; 5] = [
    CubeOption::NoDoubleTake,
    CubeOption::DoubleTake,
    CubeOption::DoublePass,
    CubeOption::TooGoodTake,
    CubeOption::TooGoodPass,
];

/// Picks the best of the five options from the analyzer's proper-action
/// phrase, falling back to the highest-equity real action when no
/// phrase is available.
pub fn best_option(phrase: Option<&str>, equities: &CubeEquities) -> CubeOption {
    if let Some(phrase) = phrase {
        let phrase = phrase.to_lowercase();
        if phrase.contains("too good") {
            return if phrase.contains("take") {
                CubeOption::TooGoodTake
            } else {
                CubeOption::TooGoodPass
            };
        }
        if phrase.contains("no double") || phrase.contains("no redouble") {
            return CubeOption::NoDoubleTake;
        }
        if phrase.contains("double") || phrase.contains("redouble") {
            if phrase.contains("take") || phrase.contains("beaver") {
                return CubeOption::DoubleTake;
            }
            if phrase.contains("pass") || phrase.contains("drop") {
                return CubeOption::DoublePass;
            }
        }
    }
    // No usable phrase: highest equity among the three real actions.
    let real = [
        (CubeOption::NoDoubleTake, equities.no_double),
        (CubeOption::DoubleTake, equities.double_take),
        (CubeOption::DoublePass, equities.double_pass),
    ];
    real.iter()
        .fold(real[0], |best, &c| if c.1 > best.1 { c } else { best })
        .0
}

/// The equity errors are measured against: the best option's own action
/// equity, except that the synthetic "too good" options anchor on the
/// no-double equity (not doubling is what the player actually forgoes).
fn anchor_equity(best: CubeOption, equities: &CubeEquities) -> f64 {
    match best {
        CubeOption::NoDoubleTake | CubeOption::TooGoodTake | CubeOption::TooGoodPass => {
            equities.no_double
        }
        CubeOption::DoubleTake => equities.double_take,
        CubeOption::DoublePass => equities.double_pass,
    }
}

/// Expands three analyzer equities into the fixed five-option list:
/// `[No Double/Take, Double/Take, Double/Pass, Too Good/Take,
/// Too Good/Pass]`. Exactly one option carries rank 1 and error 0; the
/// rest take ranks 2..=5 by descending equity with errors measured
/// against the anchor equity. The two "too good" options display the
/// double/pass equity and are flagged as synthesized.
pub fn synthesize_cube_options(
    equities: &CubeEquities,
    proper_action: Option<&str>,
    redouble: bool,
    chances: &CubeChances,
) -> Vec<Move> {
    let best = best_option(proper_action, equities);
    let anchor = anchor_equity(best, equities);

    let option_equity = |option: CubeOption| match option {
        CubeOption::NoDoubleTake => equities.no_double,
        CubeOption::DoubleTake => equities.double_take,
        CubeOption::DoublePass
        | CubeOption::TooGoodTake
        | CubeOption::TooGoodPass => equities.double_pass,
    };

    let mut moves: Vec<Move> = OPTION_ORDER
        .iter()
        .map(|&option| {
            let mut candidate = Move::new(option.label(redouble), option_equity(option));
            candidate.from_analyzer =
                !matches!(option, CubeOption::TooGoodTake | CubeOption::TooGoodPass);
            candidate.error = if option == best {
                0.0
            } else {
                (anchor - candidate.equity).abs()
            };
            let option_chances = match option {
                CubeOption::NoDoubleTake => chances.no_double,
                CubeOption::DoubleTake => chances.double_take,
                _ => None,
            };
            if let Some((player, opponent)) = option_chances {
                candidate.player_chances = Some(player);
                candidate.opponent_chances = Some(opponent);
            }
            candidate
        })
        .collect();

    // Rank 1 for the proper action, 2..=5 for the rest by equity.
    let mut order: Vec<usize> = (0..moves.len())
        .filter(|&i| OPTION_ORDER[i] != best)
        .collect();
    order.sort_by(|&a, &b| {
        moves[b]
            .equity
            .partial_cmp(&moves[a].equity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (position, &index) in order.iter().enumerate() {
        moves[index].rank = position as u32 + 2;
    }
    let best_index = OPTION_ORDER.iter().position(|&o| o == best).unwrap_or(0);
    moves[best_index].rank = 1;

    moves
}

/// Which side a post-hoc cube alert charges the error to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeErrorParty {
    Doubler,
    Responder,
}

/// Maps an analyzer alert phrase (`bad double`, `missed double`,
/// `wrong take`, `wrong pass`, ...) to the side that made the error.
pub fn attribute_cube_alert(kind: &str) -> Option<CubeErrorParty> {
    let kind = kind.to_lowercase();
    if kind.contains("take") || kind.contains("pass") {
        Some(CubeErrorParty::Responder)
    } else if kind.contains("double") || kind.contains("missed") {
        Some(CubeErrorParty::Doubler)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equities(nd: f64, dt: f64, dp: f64) -> CubeEquities {
        CubeEquities {
            no_double: nd,
            double_take: dt,
            double_pass: dp,
        }
    }

    #[test]
    fn output_is_always_five_options_in_fixed_order() {
        let moves = synthesize_cube_options(
            &equities(0.1, 0.2, 1.0),
            Some("Double, take"),
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
    }

    #[test]
    fn exactly_one_rank_one_with_zero_error() {
        for phrase in [
            Some("No double, take"),
            Some("Double, take"),
            Some("Double, pass"),
            Some("Too good to double, take"),
            Some("Too good to double, pass"),
            None,
        ] {
            let moves = synthesize_cube_options(
                &equities(0.3, 0.5, 1.0),
                phrase,
                false,
                &CubeChances::default(),
            );
            assert_eq!(moves.len(), 5);
            let best: Vec<&Move> = moves.iter().filter(|m| m.rank == 1).collect();
            assert_eq!(best.len(), 1, "phrase {phrase:?}");
            assert_eq!(best[0].error, 0.0);
            assert!(moves.iter().all(|m| m.error >= 0.0));
            let mut ranks: Vec<u32> = moves.iter().map(|m| m.rank).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn too_good_pass_scenario() {
        let moves = synthesize_cube_options(
            &equities(0.8, 1.2, 1.0),
            Some("Too good to double, pass"),
            false,
            &CubeChances::default(),
        );
        assert_eq!(moves[4].rank, 1);
        let errors: Vec<f64> = moves.iter().map(|m| m.error).collect();
        let expected = [0.0, 0.4, 0.2, 0.2, 0.0];
        for (got, want) in errors.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "errors {errors:?}");
        }
    }

    #[test]
    fn too_good_options_show_the_pass_equity() {
        let moves = synthesize_cube_options(
            &equities(0.8, 1.2, 1.0),
            Some("Too good to double, pass"),
            false,
            &CubeChances::default(),
        );
        assert_eq!(moves[3].equity, 1.0);
        assert_eq!(moves[4].equity, 1.0);
        assert!(!moves[3].from_analyzer);
        assert!(!moves[4].from_analyzer);
    }

    #[test]
    fn redouble_phrasing_changes_labels() {
        let moves = synthesize_cube_options(
            &equities(0.1, 0.2, 1.0),
            Some("Redouble, take"),
            true,
            &CubeChances::default(),
        );
        assert_eq!(moves[0].notation, "No Redouble/Take");
        assert_eq!(moves[1].notation, "Redouble/Take");
        assert_eq!(moves[1].rank, 1);
    }

    #[test]
    fn no_phrase_falls_back_to_argmax() {
        let moves = synthesize_cube_options(
            &equities(0.42, 0.17, -0.2),
            None,
            false,
            &CubeChances::default(),
        );
        assert_eq!(moves[0].rank, 1);
        assert_eq!(moves[0].notation, "No Double/Take");
    }

    #[test]
    fn no_double_phrase_beats_higher_pass_equity() {
        // "No double" can be proper even when the pass equity is larger;
        // the phrase wins over raw equities.
        let moves = synthesize_cube_options(
            &equities(0.2, -0.4, 1.0),
            Some("No double, take (26.0%)"),
            false,
            &CubeChances::default(),
        );
        assert_eq!(moves[0].rank, 1);
    }

    #[test]
    fn alert_attribution() {
        assert_eq!(attribute_cube_alert("bad double"), Some(CubeErrorParty::Doubler));
        assert_eq!(attribute_cube_alert("missed double"), Some(CubeErrorParty::Doubler));
        assert_eq!(attribute_cube_alert("wrong take"), Some(CubeErrorParty::Responder));
        assert_eq!(attribute_cube_alert("wrong pass"), Some(CubeErrorParty::Responder));
        assert_eq!(attribute_cube_alert("something else"), None);
    }
}
