/*
 * xgid.rs
 * Part of the gammon-knight project
 * Created Date: Thursday, February 13th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! The XGID wire format:
//! `XGID=<position>:<cube_log2>:<cube_owner>:<turn>:<dice>:<score_bottom>:<score_top>:<crawford_jacoby>:<match_length>:<max_cube_log2>`
//!
//! The 26-character position field has two disjoint readings keyed by
//! the turn field. Under `turn == 1` (bottom on roll) char 0 is the top
//! bar, chars 1..=24 the points and char 25 the bottom bar, with
//! lowercase letters counting top checkers and uppercase counting
//! bottom. Under `turn == -1` the whole field is mirrored: slot `i`
//! reads from char `25 - i` and the case meaning swaps. The cube-owner
//! field is absolute (-1 top, 0 centered, 1 bottom) and is not
//! perspective flipped.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::{
    definitions::NumberOf,
    player::{CubeState, Player},
    position::Position,
};

/// The ten colon-separated parts of an XGID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XgidField {
    Position = 0,
    CubeValue = 1,
    CubeOwner = 2,
    Turn = 3,
    Dice = 4,
    ScoreBottom = 5,
    ScoreTop = 6,
    CrawfordJacoby = 7,
    MatchLength = 8,
    MaxCube = 9,
}

impl Display for XgidField {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            XgidField::Position => write!(f, "position"),
            XgidField::CubeValue => write!(f, "cube value"),
            XgidField::CubeOwner => write!(f, "cube owner"),
            XgidField::Turn => write!(f, "turn"),
            XgidField::Dice => write!(f, "dice"),
            XgidField::ScoreBottom => write!(f, "bottom score"),
            XgidField::ScoreTop => write!(f, "top score"),
            XgidField::CrawfordJacoby => write!(f, "crawford/jacoby"),
            XgidField::MatchLength => write!(f, "match length"),
            XgidField::MaxCube => write!(f, "max cube"),
        }
    }
}

/// Error raised for an XGID string that cannot be decoded. Carries the
/// offending field where one can be named.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct XgidError {
    pub field: Option<XgidField>,
    message: String,
}

impl XgidError {
    pub fn new(message: &str) -> XgidError {
        XgidError {
            field: None,
            message: message.to_string(),
        }
    }

    pub fn in_field(field: XgidField, message: &str) -> XgidError {
        XgidError {
            field: Some(field),
            message: message.to_string(),
        }
    }

    /// Index of the offending field, if one was identified.
    pub fn field_index(&self) -> Option<usize> {
        self.field.map(|f| f as usize)
    }
}

impl Display for XgidError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "malformed XGID: {}", self.message)?;
        if let Some(field) = self.field {
            write!(f, " ({} field, index {})", field, field as usize)?;
        }
        Ok(())
    }
}

/// Match metadata carried next to the position in an XGID string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XgidMatchInfo {
    pub cube_value: u32,
    pub cube_owner: CubeState,
    pub on_roll: Player,
    pub dice: Option<(u8, u8)>,
    /// True when the dice field carries a cube marker (`D`, `B` or `R`)
    /// instead of a roll: a double has been offered.
    pub cube_offered: bool,
    pub score_top: u32,
    pub score_bottom: u32,
    pub crawford_jacoby: u32,
    pub match_length: u32,
    /// Cube ceiling, as a value (1, 2, 4, ...).
    pub max_cube: u32,
}

impl Default for XgidMatchInfo {
    fn default() -> Self {
        XgidMatchInfo {
            cube_value: 1,
            cube_owner: CubeState::Centered,
            on_roll: Player::Bottom,
            dice: None,
            cube_offered: false,
            score_top: 0,
            score_bottom: 0,
            crawford_jacoby: 0,
            match_length: 0,
            max_cube: 1,
        }
    }
}

const FIELD_COUNT: usize = 10;
/// Conservative ceiling for the two log2-encoded cube fields.
const MAX_CUBE_LOG2: u32 = 15;

/// Decodes an XGID string (with or without the `XGID=` prefix) into a
/// position and its match metadata.
pub fn decode_xgid(input: &str) -> Result<(Position, XgidMatchInfo), XgidError> {
    let body = input.trim();
    let body = body.strip_prefix("XGID=").unwrap_or(body);

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != FIELD_COUNT {
        return Err(XgidError::new(&format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            parts.len()
        )));
    }

    let turn = parse_turn(parts[XgidField::Turn as usize])?;
    let position = decode_position_field(parts[XgidField::Position as usize], turn)?;

    let cube_log = parse_log2_field(parts[XgidField::CubeValue as usize], XgidField::CubeValue)?;
    let cube_owner = match parts[XgidField::CubeOwner as usize].trim() {
        "-1" => CubeState::TopOwns,
        "0" => CubeState::Centered,
        "1" => CubeState::BottomOwns,
        other => {
            return Err(XgidError::in_field(
                XgidField::CubeOwner,
                &format!("unrecognized cube owner `{other}`"),
            ));
        }
    };

    let (dice, cube_offered) = parse_dice_field(parts[XgidField::Dice as usize])?;
    let score_bottom = parse_number(parts[XgidField::ScoreBottom as usize], XgidField::ScoreBottom)?;
    let score_top = parse_number(parts[XgidField::ScoreTop as usize], XgidField::ScoreTop)?;
    let crawford_jacoby =
        parse_number(parts[XgidField::CrawfordJacoby as usize], XgidField::CrawfordJacoby)?;
    let match_length = parse_number(parts[XgidField::MatchLength as usize], XgidField::MatchLength)?;
    let max_cube_log = parse_log2_field(parts[XgidField::MaxCube as usize], XgidField::MaxCube)?;

    let info = XgidMatchInfo {
        cube_value: 1u32 << cube_log,
        cube_owner,
        on_roll: if turn == 1 { Player::Bottom } else { Player::Top },
        dice,
        cube_offered,
        score_top,
        score_bottom,
        crawford_jacoby,
        match_length,
        max_cube: 1u32 << max_cube_log,
    };
    Ok((position, info))
}

/// Encodes a position and its metadata as an XGID string. The position
/// field is written in the perspective demanded by `info.on_roll`, so
/// decoding the result recovers the inputs exactly.
pub fn encode_xgid(position: &Position, info: &XgidMatchInfo) -> String {
    let mut chars = ['-'; NumberOf::SLOTS];
    match info.on_roll {
        Player::Bottom => {
            for (slot, &count) in position.slots().iter().enumerate() {
                chars[slot] = encode_count(count, false);
            }
        }
        Player::Top => {
            for (slot, &count) in position.slots().iter().enumerate() {
                chars[NumberOf::SLOTS - 1 - slot] = encode_count(count, true);
            }
        }
    }
    let position_field: String = chars.iter().collect();

    let cube_owner = match info.cube_owner {
        CubeState::TopOwns => -1,
        CubeState::Centered => 0,
        CubeState::BottomOwns => 1,
    };
    let turn = if info.on_roll == Player::Bottom { 1 } else { -1 };
    let dice_field = if info.cube_offered {
        "D".to_string()
    } else if let Some((a, b)) = info.dice {
        format!("{a}{b}")
    } else {
        "00".to_string()
    };

    format!(
        "XGID={}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        position_field,
        info.cube_value.max(1).ilog2(),
        cube_owner,
        turn,
        dice_field,
        info.score_bottom,
        info.score_top,
        info.crawford_jacoby,
        info.match_length,
        info.max_cube.max(1).ilog2(),
    )
}

fn parse_turn(part: &str) -> Result<i32, XgidError> {
    match part.trim() {
        "1" => Ok(1),
        "-1" => Ok(-1),
        other => Err(XgidError::in_field(
            XgidField::Turn,
            &format!("unrecognized turn `{other}`"),
        )),
    }
}

fn parse_number(part: &str, field: XgidField) -> Result<u32, XgidError> {
    part.trim()
        .parse::<u32>()
        .map_err(|_| XgidError::in_field(field, &format!("`{}` is not a number", part.trim())))
}

fn parse_log2_field(part: &str, field: XgidField) -> Result<u32, XgidError> {
    let value = part.trim().parse::<i32>().map_err(|_| {
        XgidError::in_field(field, &format!("`{}` is not a number", part.trim()))
    })?;
    if value < 0 {
        return Ok(0);
    }
    if value as u32 > MAX_CUBE_LOG2 {
        return Err(XgidError::in_field(
            field,
            &format!("cube exponent {value} above the supported maximum of {MAX_CUBE_LOG2}"),
        ));
    }
    Ok(value as u32)
}

fn parse_dice_field(part: &str) -> Result<(Option<(u8, u8)>, bool), XgidError> {
    let dice = part.trim().to_ascii_uppercase();
    match dice.as_str() {
        "00" => Ok((None, false)),
        // Double offered / beavered / raccooned: a cube response is
        // pending and no dice have been rolled.
        "D" | "B" | "R" => Ok((None, true)),
        _ => {
            let digits: Vec<u32> = dice.chars().filter_map(|c| c.to_digit(10)).collect();
            if digits.len() != 2 || dice.len() != 2 {
                return Err(XgidError::in_field(
                    XgidField::Dice,
                    &format!("unrecognized dice `{dice}`"),
                ));
            }
            let (a, b) = (digits[0], digits[1]);
            if !(1..=6).contains(&a) || !(1..=6).contains(&b) {
                return Err(XgidError::in_field(
                    XgidField::Dice,
                    &format!("die values `{dice}` outside 1..6"),
                ));
            }
            Ok((Some((a as u8, b as u8)), false))
        }
    }
}

fn decode_position_field(field: &str, turn: i32) -> Result<Position, XgidError> {
    if field.chars().count() != NumberOf::SLOTS {
        return Err(XgidError::in_field(
            XgidField::Position,
            &format!(
                "position field must be {} characters, found {}",
                NumberOf::SLOTS,
                field.chars().count()
            ),
        ));
    }
    let chars: Vec<char> = field.chars().collect();
    let mut slots = [0i8; NumberOf::SLOTS];
    if turn == 1 {
        for (slot, &c) in chars.iter().enumerate() {
            slots[slot] = decode_count(c, false)?;
        }
    } else {
        // Mirrored perspective: slot i reads from char 25 - i and the
        // case meaning swaps.
        for slot in 0..NumberOf::SLOTS {
            slots[slot] = decode_count(chars[NumberOf::SLOTS - 1 - slot], true)?;
        }
    }
    Position::from_slots(slots)
        .map_err(|e| XgidError::in_field(XgidField::Position, &e.to_string()))
}

fn decode_count(c: char, swapped: bool) -> Result<i8, XgidError> {
    let (count, lowercase) = match c {
        '-' => return Ok(0),
        'a'..='p' => (c as i8 - b'a' as i8 + 1, true),
        'A'..='P' => (c as i8 - b'A' as i8 + 1, false),
        _ => {
            return Err(XgidError::in_field(
                XgidField::Position,
                &format!("invalid position character `{c}`"),
            ));
        }
    };
    // Standard perspective: lowercase counts top checkers. Mirrored
    // perspective: the meanings swap.
    let top = lowercase != swapped;
    Ok(if top { count } else { -count })
}

fn encode_count(count: i8, swapped: bool) -> char {
    if count == 0 {
        return '-';
    }
    let magnitude = count.unsigned_abs().min(16);
    let top = count > 0;
    let lowercase = top != swapped;
    if lowercase {
        (b'a' + magnitude - 1) as char
    } else {
        (b'A' + magnitude - 1) as char
    }
}
