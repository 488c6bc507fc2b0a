/*
 * gnuid.rs
 * Part of the gammon-knight project
 * Created Date: Friday, February 14th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! GNU Backgammon's `PositionID:MatchID` format.
//!
//! The position id is 14 Base64 characters covering 10 bytes (80 bits).
//! Bits are consumed little-endian within each byte. The stream holds
//! two 25-point halves, player 0 first: each point is a run of N one
//! bits (N checkers) closed by a zero separator, the 25th entry being
//! the bar. Player 0 maps to internal slots in reverse order (its point
//! 0 is slot 24) with the bar at slot 0; player 1 maps directly (point 0
//! is slot 1) with the bar at slot 25.
//!
//! The match id is 12 Base64 characters covering 9 bytes (72 bits) with
//! the fixed little-endian field layout decoded below.

use base64::Engine;
use base64::engine::general_purpose;
use thiserror::Error;

use crate::{
    definitions::NumberOf,
    player::{CubeState, Player},
    position::Position,
};

pub const POSITION_ID_LEN: usize = 14;
pub const MATCH_ID_LEN: usize = 12;

const POSITION_BYTES: usize = 10;
const MATCH_BYTES: usize = 9;
const POINTS_PER_PLAYER: usize = 25;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GnuidError {
    #[error("malformed GNUID: position id must be {POSITION_ID_LEN} characters, found {0}")]
    PositionIdLength(usize),
    #[error("malformed GNUID: match id must be {MATCH_ID_LEN} characters, found {0}")]
    MatchIdLength(usize),
    #[error("malformed GNUID: illegal Base64 in {part}")]
    Base64 { part: &'static str },
    #[error("malformed GNUID: checker stream overflows 25 points per player")]
    StreamOverflow,
    #[error("malformed GNUID: {0}")]
    Position(String),
    #[error("malformed GNUID: missing match id")]
    MissingMatchId,
}

/// Match metadata carried by the 72-bit match id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GnuidMatchInfo {
    pub cube_value: u32,
    pub cube_owner: CubeState,
    pub crawford: bool,
    pub game_state: u8,
    pub on_roll: Player,
    pub doubled: bool,
    pub resigned: u8,
    pub dice: Option<(u8, u8)>,
    pub match_length: u32,
    pub score_top: u32,
    pub score_bottom: u32,
}

impl Default for GnuidMatchInfo {
    fn default() -> Self {
        GnuidMatchInfo {
            cube_value: 1,
            cube_owner: CubeState::Centered,
            crawford: false,
            game_state: 1,
            on_roll: Player::Top,
            doubled: false,
            resigned: 0,
            dice: None,
            match_length: 0,
            score_top: 0,
            score_bottom: 0,
        }
    }
}

/// Decodes a full `PositionID:MatchID` pair. Recognized prefixes
/// (`GNUID=`, `GNUBGID=`) are stripped first.
pub fn decode_gnuid(input: &str) -> Result<(Position, GnuidMatchInfo), GnuidError> {
    let body = strip_prefix(input.trim());
    let (position_id, match_id) = match body.split_once(':') {
        Some((p, m)) => (p.trim(), m.trim()),
        None => return Err(GnuidError::MissingMatchId),
    };
    let position = decode_position_id(position_id)?;
    let info = decode_match_id(match_id)?;
    Ok((position, info))
}

/// Encodes a `PositionID:MatchID` pair.
pub fn encode_gnuid(position: &Position, info: &GnuidMatchInfo) -> String {
    format!("{}:{}", encode_position_id(position), encode_match_id(info))
}

fn strip_prefix(input: &str) -> &str {
    let upper = input.to_ascii_uppercase();
    for prefix in ["GNUID=", "GNUBGID=", "GNUBGID "] {
        if upper.starts_with(prefix) {
            return &input[prefix.len()..];
        }
    }
    input
}

/// Decodes the 14-character position id alone.
pub fn decode_position_id(position_id: &str) -> Result<Position, GnuidError> {
    if position_id.len() != POSITION_ID_LEN {
        return Err(GnuidError::PositionIdLength(position_id.len()));
    }
    let bytes = general_purpose::STANDARD
        .decode(format!("{position_id}=="))
        .map_err(|_| GnuidError::Base64 { part: "position id" })?;
    if bytes.len() != POSITION_BYTES {
        return Err(GnuidError::Base64 { part: "position id" });
    }

    // Run-length decode both players' half-streams.
    let mut boards = [[0u8; POINTS_PER_PLAYER]; NumberOf::SIDES];
    let mut cursor = 0usize;
    for board in boards.iter_mut() {
        for point in board.iter_mut() {
            let mut count = 0u8;
            while cursor < POSITION_BYTES * 8 && bit(&bytes, cursor) {
                count += 1;
                cursor += 1;
                if count > 15 {
                    return Err(GnuidError::StreamOverflow);
                }
            }
            if cursor >= POSITION_BYTES * 8 && count == 0 {
                // Ran out of stream before the separator; the remainder
                // is zero padding, which decodes as empty points.
                break;
            }
            *point = count;
            cursor += 1; // separator zero
        }
    }

    let mut slots = [0i8; NumberOf::SLOTS];
    // Player 0 (top): reverse numbering, bar at slot 0.
    for (point, &count) in boards[0].iter().enumerate().take(24) {
        slots[24 - point] += count as i8;
    }
    slots[0] = boards[0][24] as i8;
    // Player 1 (bottom): direct numbering, bar at slot 25.
    for (point, &count) in boards[1].iter().enumerate().take(24) {
        slots[point + 1] -= count as i8;
    }
    slots[25] = -(boards[1][24] as i8);

    Position::from_slots(slots).map_err(|e| GnuidError::Position(e.to_string()))
}

/// Encodes the 14-character position id alone.
pub fn encode_position_id(position: &Position) -> String {
    let mut boards = [[0u8; POINTS_PER_PLAYER]; NumberOf::SIDES];
    for slot in 1..=24 {
        let count = position.slot(slot);
        if count > 0 {
            boards[0][24 - slot] = count as u8;
        } else if count < 0 {
            boards[1][slot - 1] = (-count) as u8;
        }
    }
    boards[0][24] = position.bar_count(Player::Top);
    boards[1][24] = position.bar_count(Player::Bottom);

    let mut bytes = [0u8; POSITION_BYTES];
    let mut cursor = 0usize;
    for board in boards.iter() {
        for &count in board.iter() {
            for _ in 0..count {
                set_bit(&mut bytes, cursor);
                cursor += 1;
            }
            cursor += 1; // separator zero
        }
    }

    let encoded = general_purpose::STANDARD.encode(bytes);
    encoded[..POSITION_ID_LEN].to_string()
}

/// Decodes the 12-character match id alone.
pub fn decode_match_id(match_id: &str) -> Result<GnuidMatchInfo, GnuidError> {
    if match_id.len() != MATCH_ID_LEN {
        return Err(GnuidError::MatchIdLength(match_id.len()));
    }
    let bytes = general_purpose::STANDARD
        .decode(match_id)
        .map_err(|_| GnuidError::Base64 { part: "match id" })?;
    if bytes.len() != MATCH_BYTES {
        return Err(GnuidError::Base64 { part: "match id" });
    }

    let cube_log = extract(&bytes, 0, 4);
    let cube_owner = match extract(&bytes, 4, 2) {
        3 => CubeState::Centered,
        0 => CubeState::TopOwns,
        _ => CubeState::BottomOwns,
    };
    let crawford = bit(&bytes, 7);
    let game_state = extract(&bytes, 8, 3) as u8;
    let on_roll = if bit(&bytes, 11) { Player::Bottom } else { Player::Top };
    let doubled = bit(&bytes, 12);
    let resigned = extract(&bytes, 13, 2) as u8;
    let die0 = extract(&bytes, 15, 3) as u8;
    let die1 = extract(&bytes, 18, 3) as u8;
    let dice = if die0 > 0 && die1 > 0 { Some((die0, die1)) } else { None };
    let match_length = extract(&bytes, 21, 15);
    let score_top = extract(&bytes, 36, 15);
    let score_bottom = extract(&bytes, 51, 15);

    Ok(GnuidMatchInfo {
        cube_value: if cube_log < 15 { 1u32 << cube_log } else { 1 },
        cube_owner,
        crawford,
        game_state,
        on_roll,
        doubled,
        resigned,
        dice,
        match_length,
        score_top,
        score_bottom,
    })
}

/// Encodes the 12-character match id alone.
pub fn encode_match_id(info: &GnuidMatchInfo) -> String {
    let mut bytes = [0u8; MATCH_BYTES];

    deposit(&mut bytes, 0, 4, info.cube_value.max(1).ilog2());
    let owner = match info.cube_owner {
        CubeState::Centered => 3,
        CubeState::TopOwns => 0,
        CubeState::BottomOwns => 1,
    };
    deposit(&mut bytes, 4, 2, owner);
    if info.crawford {
        set_bit(&mut bytes, 7);
    }
    deposit(&mut bytes, 8, 3, info.game_state as u32);
    if info.on_roll == Player::Bottom {
        set_bit(&mut bytes, 11);
    }
    if info.doubled {
        set_bit(&mut bytes, 12);
    }
    deposit(&mut bytes, 13, 2, info.resigned as u32);
    if let Some((a, b)) = info.dice {
        deposit(&mut bytes, 15, 3, a as u32);
        deposit(&mut bytes, 18, 3, b as u32);
    }
    deposit(&mut bytes, 21, 15, info.match_length);
    deposit(&mut bytes, 36, 15, info.score_top);
    deposit(&mut bytes, 51, 15, info.score_bottom);

    general_purpose::STANDARD.encode(bytes)
}

fn bit(bytes: &[u8], index: usize) -> bool {
    (bytes[index / 8] >> (index % 8)) & 1 == 1
}

fn set_bit(bytes: &mut [u8], index: usize) {
    bytes[index / 8] |= 1 << (index % 8);
}

fn extract(bytes: &[u8], start: usize, count: usize) -> u32 {
    let mut value = 0u32;
    for offset in 0..count {
        if bit(bytes, start + offset) {
            value |= 1 << offset;
        }
    }
    value
}

fn deposit(bytes: &mut [u8], start: usize, count: usize, value: u32) {
    for offset in 0..count {
        if (value >> offset) & 1 == 1 {
            set_bit(bytes, start + offset);
        }
    }
}
