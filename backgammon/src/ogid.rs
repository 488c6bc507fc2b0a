/*
 * ogid.rs
 * Part of the gammon-knight project
 * Created Date: Monday, February 17th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! The OGID format, e.g.
//! `11ccccchhhjjjjj:ooddddd88866666:N0N::W:IW:0:0:1:0`.
//!
//! The first two fields list the top and bottom player's checkers, one
//! base-26 digit (`0-9a-p`) per checker naming the slot it stands on.
//! Each player's travel is extended past the board: for top, digit 0 is
//! the bar and digit 25 (`p`) is borne off; for bottom, digit 25 is the
//! bar and digit 0 is borne off. A field therefore always holds exactly
//! 15 digits. The remaining fields are cube (`<action><log2><owner>`),
//! dice, turn (`W` top / `B` bottom), game state, top score, bottom
//! score, match length and a free-form match modifier.
//!
//! The format has no published description, so the codec guarantees
//! round trips only for ids it produced itself.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::{
    definitions::NumberOf,
    player::{CubeState, Player},
    position::Position,
};

const FIELD_COUNT: usize = 10;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed OGID: {message} (field {index})")]
pub struct OgidError {
    pub index: usize,
    message: String,
}

impl OgidError {
    fn new(index: usize, message: &str) -> OgidError {
        OgidError {
            index,
            message: message.to_string(),
        }
    }
}

/// Cube/match metadata carried by an OGID string.
#[derive(Clone, Debug, PartialEq)]
pub struct OgidMatchInfo {
    pub cube_value: u32,
    pub cube_owner: CubeState,
    /// `N` none, `D` double offered, `B` beaver, `R` raccoon.
    pub cube_action: char,
    pub dice: Option<(u8, u8)>,
    pub on_roll: Player,
    pub game_state: String,
    pub score_top: u32,
    pub score_bottom: u32,
    pub match_length: u32,
    pub match_modifier: String,
}

impl Default for OgidMatchInfo {
    fn default() -> Self {
        OgidMatchInfo {
            cube_value: 1,
            cube_owner: CubeState::Centered,
            cube_action: 'N',
            dice: None,
            on_roll: Player::Bottom,
            game_state: String::new(),
            score_top: 0,
            score_bottom: 0,
            match_length: 0,
            match_modifier: String::new(),
        }
    }
}

/// One checker's location on a player's extended travel path.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Station {
    Bar,
    Slot(usize),
    Off,
}

pub fn decode_ogid(input: &str) -> Result<(Position, OgidMatchInfo), OgidError> {
    let body = input.trim();
    let body = body.strip_prefix("OGID=").unwrap_or(body);
    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != FIELD_COUNT {
        return Err(OgidError::new(
            0,
            &format!("expected {FIELD_COUNT} fields, found {}", parts.len()),
        ));
    }

    let mut slots = [0i8; NumberOf::SLOTS];
    let mut top_off = 0u8;
    let mut bottom_off = 0u8;

    for station in decode_checker_field(parts[0], 0)? {
        match station_for(Player::Top, station) {
            Station::Bar => slots[0] += 1,
            Station::Off => top_off += 1,
            Station::Slot(slot) => {
                if slots[slot] < 0 {
                    return Err(OgidError::new(0, &format!("slot {slot} held by both players")));
                }
                slots[slot] += 1;
            }
        }
    }
    for station in decode_checker_field(parts[1], 1)? {
        match station_for(Player::Bottom, station) {
            Station::Bar => slots[25] -= 1,
            Station::Off => bottom_off += 1,
            Station::Slot(slot) => {
                if slots[slot] > 0 {
                    return Err(OgidError::new(1, &format!("slot {slot} held by both players")));
                }
                slots[slot] -= 1;
            }
        }
    }

    let position = Position::from_parts(slots, top_off, bottom_off)
        .map_err(|e| OgidError::new(0, &e.to_string()))?;

    let (cube_action, cube_value, cube_owner) = decode_cube_field(parts[2])?;
    let dice = decode_dice_field(parts[3])?;
    let on_roll = match parts[4].trim() {
        "W" => Player::Top,
        "B" => Player::Bottom,
        other => return Err(OgidError::new(4, &format!("unrecognized turn `{other}`"))),
    };
    let game_state = parts[5].trim();
    if !game_state.chars().all(|c| c.is_ascii_uppercase()) || game_state.len() > 2 {
        return Err(OgidError::new(5, &format!("unrecognized game state `{game_state}`")));
    }

    let score_top = decode_number(parts[6], 6)?;
    let score_bottom = decode_number(parts[7], 7)?;
    let match_length = decode_number(parts[8], 8)?;

    let info = OgidMatchInfo {
        cube_value,
        cube_owner,
        cube_action,
        dice,
        on_roll,
        game_state: game_state.to_string(),
        score_top,
        score_bottom,
        match_length,
        match_modifier: parts[9].trim().to_string(),
    };
    Ok((position, info))
}

pub fn encode_ogid(position: &Position, info: &OgidMatchInfo) -> String {
    let owner = match info.cube_owner {
        CubeState::Centered => 'N',
        CubeState::TopOwns => 'W',
        CubeState::BottomOwns => 'B',
    };
    let dice = match info.dice {
        Some((a, b)) => format!("{a}{b}"),
        None => String::new(),
    };
    let turn = if info.on_roll == Player::Top { 'W' } else { 'B' };

    format!(
        "{}:{}:{}{}{}:{}:{}:{}:{}:{}:{}:{}",
        encode_checker_field(position, Player::Top),
        encode_checker_field(position, Player::Bottom),
        info.cube_action,
        digit_for(info.cube_value.max(1).ilog2() as usize),
        owner,
        dice,
        turn,
        info.game_state,
        info.score_top,
        info.score_bottom,
        info.match_length,
        info.match_modifier,
    )
}

fn station_for(player: Player, digit: usize) -> Station {
    match (player, digit) {
        (Player::Top, 0) => Station::Bar,
        (Player::Top, 25) => Station::Off,
        (Player::Bottom, 25) => Station::Bar,
        (Player::Bottom, 0) => Station::Off,
        (_, slot) => Station::Slot(slot),
    }
}

fn decode_checker_field(field: &str, index: usize) -> Result<Vec<usize>, OgidError> {
    let field = field.trim();
    if field.len() != 15 {
        return Err(OgidError::new(
            index,
            &format!("expected 15 checker digits, found {}", field.len()),
        ));
    }
    field
        .chars()
        .map(|c| {
            digit_value(c).ok_or_else(|| {
                OgidError::new(index, &format!("invalid checker digit `{c}`"))
            })
        })
        .collect()
}

/// Emits a player's 15 checker digits, farthest from home first.
fn encode_checker_field(position: &Position, player: Player) -> String {
    let mut digits: Vec<(u32, usize)> = Vec::with_capacity(15);
    let bar_digit = if player == Player::Top { 0 } else { 25 };
    let off_digit = 25 - bar_digit;
    for _ in 0..position.bar_count(player) {
        digits.push((25, bar_digit));
    }
    for slot in 1..=24 {
        let count = position.slot(slot);
        let owned = match player {
            Player::Top => count.max(0),
            Player::Bottom => (-count).max(0),
        };
        let distance = match player {
            Player::Top => 25 - slot as u32,
            Player::Bottom => slot as u32,
        };
        for _ in 0..owned {
            digits.push((distance, slot));
        }
    }
    for _ in 0..position.off_count(player) {
        digits.push((0, off_digit));
    }
    digits.sort_by(|a, b| b.0.cmp(&a.0));
    digits.iter().map(|&(_, d)| digit_for(d)).collect()
}

fn decode_cube_field(field: &str) -> Result<(char, u32, CubeState), OgidError> {
    let chars: Vec<char> = field.trim().chars().collect();
    if chars.len() != 3 {
        return Err(OgidError::new(2, &format!("unrecognized cube field `{field}`")));
    }
    let action = chars[0];
    if !matches!(action, 'N' | 'D' | 'B' | 'R') {
        return Err(OgidError::new(2, &format!("unrecognized cube action `{action}`")));
    }
    let log = digit_value(chars[1])
        .filter(|&v| v <= 15)
        .ok_or_else(|| OgidError::new(2, &format!("unrecognized cube exponent `{}`", chars[1])))?;
    let owner = match chars[2] {
        'N' => CubeState::Centered,
        'W' => CubeState::TopOwns,
        'B' => CubeState::BottomOwns,
        other => {
            return Err(OgidError::new(2, &format!("unrecognized cube owner `{other}`")));
        }
    };
    Ok((action, 1u32 << log, owner))
}

fn decode_dice_field(field: &str) -> Result<Option<(u8, u8)>, OgidError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    let digits: Vec<u32> = field.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 2 || field.len() != 2 {
        return Err(OgidError::new(3, &format!("unrecognized dice `{field}`")));
    }
    if !(1..=6).contains(&digits[0]) || !(1..=6).contains(&digits[1]) {
        return Err(OgidError::new(3, &format!("die values `{field}` outside 1..6")));
    }
    Ok(Some((digits[0] as u8, digits[1] as u8)))
}

fn decode_number(field: &str, index: usize) -> Result<u32, OgidError> {
    field
        .trim()
        .parse::<u32>()
        .map_err(|_| OgidError::new(index, &format!("`{}` is not a number", field.trim())))
}

fn digit_value(c: char) -> Option<usize> {
    match c {
        '0'..='9' => Some(c as usize - '0' as usize),
        'a'..='p' => Some(c as usize - 'a' as usize + 10),
        _ => None,
    }
}

fn digit_for(value: usize) -> char {
    if value < 10 {
        (b'0' + value as u8) as char
    } else {
        (b'a' + (value - 10) as u8) as char
    }
}

impl Display for OgidMatchInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cube {} ({}), {} on roll",
            self.cube_value, self.cube_owner, self.on_roll
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_starting_sample() {
        let (position, info) =
            decode_ogid("11jjjjjhhhccccc:ooddddd88866666:N0N::W:IW:0:0:1:0").unwrap();
        assert_eq!(position, Position::STARTING);
        assert_eq!(info.cube_value, 1);
        assert_eq!(info.cube_owner, CubeState::Centered);
        assert_eq!(info.on_roll, Player::Top);
        assert_eq!(info.match_length, 1);
        assert_eq!(info.dice, None);
    }

    #[test]
    fn self_round_trip() {
        let mut slots = [0i8; 26];
        slots[0] = 1;
        slots[5] = 6;
        slots[20] = -4;
        slots[25] = -2;
        let position = Position::from_slots(slots).unwrap();
        let info = OgidMatchInfo {
            cube_value: 2,
            cube_owner: CubeState::BottomOwns,
            dice: Some((4, 2)),
            on_roll: Player::Bottom,
            game_state: "IW".to_string(),
            score_top: 2,
            score_bottom: 5,
            match_length: 7,
            match_modifier: "0".to_string(),
            ..Default::default()
        };
        let encoded = encode_ogid(&position, &info);
        let (decoded, decoded_info) = decode_ogid(&encoded).unwrap();
        assert_eq!(decoded, position);
        assert_eq!(decoded_info, info);
    }

    #[test]
    fn starting_round_trip() {
        let encoded = encode_ogid(&Position::STARTING, &OgidMatchInfo::default());
        let (decoded, _) = decode_ogid(&encoded).unwrap();
        assert_eq!(decoded, Position::STARTING);
    }

    #[test]
    fn checker_digits_accumulate_in_any_order() {
        let (scrambled, _) =
            decode_ogid("jhjcjhcjccc11jh:odd8dd68d668o66:N0N::W:IW:0:0:1:0").unwrap();
        assert_eq!(scrambled, Position::STARTING);
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = decode_ogid("11jjjjjhhhccccc:ooddddd88866666:N0N").unwrap_err();
        assert_eq!(err.index, 0);
    }

    #[test]
    fn rejects_short_checker_field() {
        let err = decode_ogid("11:ooddddd88866666:N0N::W:IW:0:0:1:0").unwrap_err();
        assert_eq!(err.index, 0);
    }

    #[test]
    fn rejects_invalid_checker_digit() {
        let err = decode_ogid("11jjjjjhhhccccZ:ooddddd88866666:N0N::W:IW:0:0:1:0").unwrap_err();
        assert_eq!(err.index, 0);
    }

    #[test]
    fn rejects_contested_point() {
        // Both players claim slot 12.
        let err = decode_ogid("ccccccccccccccc:ccccccccccccccc:N0N::W:IW:0:0:1:0").unwrap_err();
        assert_eq!(err.index, 1);
    }

    #[test]
    fn rejects_bad_cube_field() {
        let err = decode_ogid("11jjjjjhhhccccc:ooddddd88866666:X0N::W:IW:0:0:1:0").unwrap_err();
        assert_eq!(err.index, 2);
    }

    #[test]
    fn borne_off_checkers_round_trip() {
        let mut slots = [0i8; 26];
        slots[3] = 5;
        slots[22] = -5;
        let position = Position::from_slots(slots).unwrap();
        assert_eq!(position.top_off(), 10);
        let encoded = encode_ogid(&position, &OgidMatchInfo::default());
        let (decoded, _) = decode_ogid(&encoded).unwrap();
        assert_eq!(decoded, position);
        assert_eq!(decoded.top_off(), 10);
        assert_eq!(decoded.bottom_off(), 10);
    }
}
