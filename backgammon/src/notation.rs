/*
 * notation.rs
 * Part of the gammon-knight project
 * Created Date: Tuesday, February 18th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Move-notation parsing and application.
//!
//! Notation is whitespace-separated hops of the form `FROM/TO[*]` where
//! `FROM` is `bar` or a point number, `TO` is a point number, `bar` or
//! `off`, a trailing `*` marks a hit and a `(N)` suffix repeats the hop
//! N times. Chained hops (`24/18*/13`) expand pairwise. The token
//! `Cannot move` and cube words (`double`, `take`, ...) carry no checker
//! movement.
//!
//! Application is tolerant: hops that cannot be played against the
//! given position are skipped, not fatal, and reported back so callers
//! can decide how strict to be.

use std::fmt::Display;

use crate::{
    player::Player,
    position::{Position, PositionError},
};

/// An endpoint of a single hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HopEnd {
    Bar,
    Point(u8),
    Off,
}

impl Display for HopEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HopEnd::Bar => write!(f, "bar"),
            HopEnd::Point(p) => write!(f, "{p}"),
            HopEnd::Off => write!(f, "off"),
        }
    }
}

/// One checker movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hop {
    pub from: HopEnd,
    pub to: HopEnd,
    /// The notation flagged this hop as a hit. Informational; the
    /// applier detects hits from the board itself.
    pub hit: bool,
}

impl Display for Hop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}{}", self.from, self.to, if self.hit { "*" } else { "" })
    }
}

/// Why a hop could not be played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NoCheckerAtSource,
    DestinationBlocked,
    OutOfRange,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoCheckerAtSource => write!(f, "no checker at source"),
            SkipReason::DestinationBlocked => write!(f, "destination blocked"),
            SkipReason::OutOfRange => write!(f, "endpoint out of range"),
        }
    }
}

/// A hop the applier refused, with the reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedHop {
    pub hop: Hop,
    pub reason: SkipReason,
}

const CUBE_WORDS: [&str; 8] = [
    "double", "redouble", "take", "drop", "pass", "accept", "decline", "beaver",
];

/// Parses move notation into hops. Cube-action words and `Cannot move`
/// yield an empty list; unintelligible tokens are dropped.
pub fn parse_notation(notation: &str) -> Vec<Hop> {
    let trimmed = notation.trim().to_ascii_lowercase();
    if trimmed.is_empty() || trimmed == "cannot move" {
        return Vec::new();
    }
    if trimmed
        .split(&['/', ',', ' '][..])
        .all(|word| word.is_empty() || CUBE_WORDS.contains(&word.trim()))
    {
        return Vec::new();
    }

    let mut hops = Vec::new();
    for raw_token in trimmed.split(|c: char| c.is_whitespace() || c == ',') {
        if raw_token.is_empty() || !raw_token.contains('/') {
            continue;
        }

        let (token, repeat) = split_repetition(raw_token);
        let segments: Vec<&str> = token.split('/').collect();
        if segments.len() < 2 {
            continue;
        }

        let mut token_hops = Vec::new();
        let mut valid = true;
        for window in segments.windows(2) {
            let hit = window[1].ends_with('*');
            let from = parse_end(window[0]);
            let to = parse_end(window[1]);
            match (from, to) {
                (Some(from), Some(to)) => token_hops.push(Hop { from, to, hit }),
                _ => {
                    valid = false;
                    break;
                }
            }
        }
        if !valid {
            continue;
        }
        for _ in 0..repeat {
            hops.extend(token_hops.iter().copied());
        }
    }
    hops
}

fn split_repetition(token: &str) -> (&str, u32) {
    if let Some(open) = token.rfind('(') {
        if let Some(stripped) = token.get(open + 1..) {
            if let Some(count) = stripped.strip_suffix(')').and_then(|n| n.parse::<u32>().ok()) {
                return (&token[..open], count);
            }
        }
    }
    (token, 1)
}

fn parse_end(segment: &str) -> Option<HopEnd> {
    let segment = segment.trim_end_matches('*').trim();
    match segment {
        "bar" => Some(HopEnd::Bar),
        "off" => Some(HopEnd::Off),
        _ => segment.parse::<u8>().ok().map(HopEnd::Point),
    }
}

/// Applies move notation for the given player and returns the resulting
/// position along with any hops that had to be skipped. The result is
/// checked against the board invariants before being returned.
pub fn apply_move(
    position: &Position,
    notation: &str,
    player: Player,
) -> Result<(Position, Vec<SkippedHop>), PositionError> {
    let mut next = *position;
    let mut skipped = Vec::new();
    let sign = player.sign();

    for hop in parse_notation(notation) {
        let from_slot = match hop.from {
            HopEnd::Bar => Position::bar_slot(player),
            HopEnd::Point(p) if (1..=24).contains(&p) => p as usize,
            _ => {
                skipped.push(SkippedHop { hop, reason: SkipReason::OutOfRange });
                continue;
            }
        };

        // A checker of the mover's sign has to be standing on the source.
        if next.slots[from_slot] * sign <= 0 {
            skipped.push(SkippedHop { hop, reason: SkipReason::NoCheckerAtSource });
            continue;
        }

        match hop.to {
            HopEnd::Off => {
                next.slots[from_slot] -= sign;
                match player {
                    Player::Top => next.top_off += 1,
                    Player::Bottom => next.bottom_off += 1,
                }
            }
            HopEnd::Point(p) if (1..=24).contains(&p) => {
                let to_slot = p as usize;
                let occupancy = next.slots[to_slot] * sign;
                if occupancy <= -2 {
                    skipped.push(SkippedHop { hop, reason: SkipReason::DestinationBlocked });
                    continue;
                }
                next.slots[from_slot] -= sign;
                if occupancy == -1 {
                    // Hit: the lone opposing checker goes to its bar.
                    let opponent = player.opponent();
                    next.slots[Position::bar_slot(opponent)] += opponent.sign();
                    next.slots[to_slot] = sign;
                } else {
                    next.slots[to_slot] += sign;
                }
            }
            _ => {
                skipped.push(SkippedHop { hop, reason: SkipReason::OutOfRange });
                continue;
            }
        }
    }

    next.validate()?;
    Ok((next, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_hops() {
        let hops = parse_notation("13/9 6/5");
        assert_eq!(
            hops,
            vec![
                Hop { from: HopEnd::Point(13), to: HopEnd::Point(9), hit: false },
                Hop { from: HopEnd::Point(6), to: HopEnd::Point(5), hit: false },
            ]
        );
    }

    #[test]
    fn parse_bar_off_and_hit() {
        let hops = parse_notation("bar/22 6/off 8/5*");
        assert_eq!(hops[0].from, HopEnd::Bar);
        assert_eq!(hops[1].to, HopEnd::Off);
        assert!(hops[2].hit);
    }

    #[test]
    fn parse_repetition_suffix() {
        let hops = parse_notation("6/4(4)");
        assert_eq!(hops.len(), 4);
        assert!(hops.iter().all(|h| h.from == HopEnd::Point(6)));
    }

    #[test]
    fn parse_chained_hops() {
        let hops = parse_notation("24/18*/13");
        assert_eq!(
            hops,
            vec![
                Hop { from: HopEnd::Point(24), to: HopEnd::Point(18), hit: true },
                Hop { from: HopEnd::Point(18), to: HopEnd::Point(13), hit: false },
            ]
        );
    }

    #[test]
    fn cube_words_have_no_movement() {
        assert!(parse_notation("Double").is_empty());
        assert!(parse_notation("take").is_empty());
        assert!(parse_notation("Cannot move").is_empty());
    }

    #[test]
    fn cannot_move_returns_position_unchanged() {
        let (next, skipped) =
            apply_move(&Position::STARTING, "Cannot move", Player::Bottom).unwrap();
        assert_eq!(next, Position::STARTING);
        assert!(skipped.is_empty());
    }

    #[test]
    fn opening_play_for_bottom() {
        let (next, skipped) =
            apply_move(&Position::STARTING, "13/9 6/5", Player::Bottom).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(next.slot(13), -4);
        assert_eq!(next.slot(9), -1);
        assert_eq!(next.slot(6), -4);
        assert_eq!(next.slot(5), -1);
        assert_eq!(next.pip_count(Player::Top), 167);
        assert_eq!(next.pip_count(Player::Bottom), 162);
    }

    #[test]
    fn pip_count_drops_by_distance_moved() {
        let (next, _) = apply_move(&Position::STARTING, "24/18 13/11", Player::Bottom).unwrap();
        assert_eq!(
            next.pip_count(Player::Bottom),
            Position::STARTING.pip_count(Player::Bottom) - 8
        );
    }

    #[test]
    fn hit_sends_exactly_one_checker_to_the_bar() {
        let mut slots = [0i8; 26];
        slots[5] = 1;
        slots[6] = 14;
        slots[1] = -15;
        let position = Position::from_slots(slots).unwrap();

        let (next, skipped) = apply_move(&position, "1/5*", Player::Bottom).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(next.slot(5), -1);
        assert_eq!(next.slot(0), 1);
        assert_eq!(next.slot(1), -14);
        assert_eq!(next.bar_count(Player::Top), 1);
    }

    #[test]
    fn bar_entry_maps_to_the_players_bar() {
        let mut slots = [0i8; 26];
        slots[25] = -1;
        slots[1] = -14;
        slots[12] = 15;
        let position = Position::from_slots(slots).unwrap();

        let (next, skipped) = apply_move(&position, "bar/22", Player::Bottom).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(next.slot(25), 0);
        assert_eq!(next.slot(22), -1);
    }

    #[test]
    fn bearoff_increments_the_off_counter() {
        let mut slots = [0i8; 26];
        slots[1] = -15;
        slots[24] = 15;
        let position = Position::from_slots(slots).unwrap();

        let (next, _) = apply_move(&position, "1/off 1/off", Player::Bottom).unwrap();
        assert_eq!(next.bottom_off(), 2);
        assert_eq!(next.slot(1), -13);
    }

    #[test]
    fn blocked_destination_is_skipped_and_reported() {
        let mut slots = [0i8; 26];
        slots[5] = 2;
        slots[6] = 13;
        slots[13] = -15;
        let position = Position::from_slots(slots).unwrap();

        let (next, skipped) = apply_move(&position, "13/5", Player::Bottom).unwrap();
        assert_eq!(next, position);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, SkipReason::DestinationBlocked);
    }

    #[test]
    fn missing_source_checker_is_skipped_and_reported() {
        let (next, skipped) = apply_move(&Position::STARTING, "2/1", Player::Bottom).unwrap();
        assert_eq!(next, Position::STARTING);
        assert_eq!(skipped[0].reason, SkipReason::NoCheckerAtSource);
    }

    #[test]
    fn out_of_range_points_are_skipped() {
        let (_, skipped) = apply_move(&Position::STARTING, "30/29", Player::Bottom).unwrap();
        assert_eq!(skipped[0].reason, SkipReason::OutOfRange);
    }

    #[test]
    fn doubles_move_four_checkers() {
        let (next, skipped) =
            apply_move(&Position::STARTING, "6/4(2) 13/11(2)", Player::Bottom).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(next.slot(6), -3);
        assert_eq!(next.slot(4), -2);
        assert_eq!(next.slot(13), -3);
        assert_eq!(next.slot(11), -2);
    }
}
