/*
 * position.rs
 * Part of the gammon-knight project
 * Created Date: Tuesday, February 11th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jul 14 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use thiserror::Error;

use crate::{
    definitions::{BAR_DISTANCE, BOTTOM_BAR, CHECKERS_PER_SIDE, NumberOf, STARTING_SLOTS, TOP_BAR},
    player::Player,
};

/// Violation of a structural board constraint. These indicate corrupt
/// input or a programming error, never a recoverable game state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    #[error("slot {slot} holds {count} checkers, above the per-point limit of 15")]
    PointOverflow { slot: usize, count: u8 },
    #[error("{player} has {total} checkers counting borne off, expected 15")]
    CheckerCount { player: Player, total: u8 },
    #[error("slot {slot} holds checkers of the wrong sign")]
    SignConflict { slot: usize },
}

/// A backgammon position.
///
/// The board is an ordered 26-slot array in signed magnitude: slot 0 is
/// the top player's bar (non-negative), slots 1..=24 are the playing
/// points (positive = top checkers, negative = bottom checkers) and
/// slot 25 is the bottom player's bar (stored negative). Checkers borne
/// off are tracked in two separate counters so that each side always
/// accounts for exactly 15 checkers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub(crate) slots: [i8; NumberOf::SLOTS],
    pub(crate) top_off: u8,
    pub(crate) bottom_off: u8,
}

impl Default for Position {
    fn default() -> Self {
        Position::STARTING
    }
}

impl Position {
    /// The standard starting position.
    pub const STARTING: Position = Position {
        slots: STARTING_SLOTS,
        top_off: 0,
        bottom_off: 0,
    };

    /// An empty board with all 30 checkers borne off.
    pub fn empty() -> Self {
        Position {
            slots: [0; NumberOf::SLOTS],
            top_off: CHECKERS_PER_SIDE,
            bottom_off: CHECKERS_PER_SIDE,
        }
    }

    /// Builds a position from a raw slot array, deriving the borne-off
    /// counters from the 15-checker total. Fails if either side has
    /// more than 15 checkers on the board or a bar slot carries the
    /// wrong sign.
    pub fn from_slots(slots: [i8; NumberOf::SLOTS]) -> Result<Self, PositionError> {
        let on_board_top: i16 = slots.iter().filter(|c| c.is_positive()).map(|c| *c as i16).sum();
        let on_board_bottom: i16 =
            slots.iter().filter(|c| c.is_negative()).map(|c| -*c as i16).sum();

        if on_board_top > CHECKERS_PER_SIDE as i16 {
            return Err(PositionError::CheckerCount {
                player: Player::Top,
                total: on_board_top as u8,
            });
        }
        if on_board_bottom > CHECKERS_PER_SIDE as i16 {
            return Err(PositionError::CheckerCount {
                player: Player::Bottom,
                total: on_board_bottom as u8,
            });
        }

        let position = Position {
            slots,
            top_off: CHECKERS_PER_SIDE - on_board_top as u8,
            bottom_off: CHECKERS_PER_SIDE - on_board_bottom as u8,
        };
        position.validate()?;
        Ok(position)
    }

    /// Builds a position from explicit parts, validating all invariants.
    pub fn from_parts(
        slots: [i8; NumberOf::SLOTS],
        top_off: u8,
        bottom_off: u8,
    ) -> Result<Self, PositionError> {
        let position = Position {
            slots,
            top_off,
            bottom_off,
        };
        position.validate()?;
        Ok(position)
    }

    pub fn slot(&self, index: usize) -> i8 {
        self.slots[index]
    }

    pub fn slots(&self) -> &[i8; NumberOf::SLOTS] {
        &self.slots
    }

    pub fn top_off(&self) -> u8 {
        self.top_off
    }

    pub fn bottom_off(&self) -> u8 {
        self.bottom_off
    }

    pub fn off_count(&self, player: Player) -> u8 {
        match player {
            Player::Top => self.top_off,
            Player::Bottom => self.bottom_off,
        }
    }

    /// Bar slot index for the given player.
    pub fn bar_slot(player: Player) -> usize {
        match player {
            Player::Top => TOP_BAR,
            Player::Bottom => BOTTOM_BAR,
        }
    }

    /// Checkers the given player has on the bar. Non-negative.
    pub fn bar_count(&self, player: Player) -> u8 {
        match player {
            Player::Top => self.slots[TOP_BAR].max(0) as u8,
            Player::Bottom => (-self.slots[BOTTOM_BAR]).max(0) as u8,
        }
    }

    /// Checkers the given player still has on the board, bar included.
    pub fn checkers_on_board(&self, player: Player) -> u8 {
        let sum: i16 = match player {
            Player::Top => self.slots.iter().filter(|c| c.is_positive()).map(|c| *c as i16).sum(),
            Player::Bottom => {
                self.slots.iter().filter(|c| c.is_negative()).map(|c| -*c as i16).sum()
            }
        };
        sum as u8
    }

    /// Checks the structural invariants: bar slots carry the correct
    /// sign, no slot exceeds 15 checkers, and each side accounts for
    /// exactly 15 checkers including those borne off.
    pub fn validate(&self) -> Result<(), PositionError> {
        if self.slots[TOP_BAR] < 0 {
            return Err(PositionError::SignConflict { slot: TOP_BAR });
        }
        if self.slots[BOTTOM_BAR] > 0 {
            return Err(PositionError::SignConflict { slot: BOTTOM_BAR });
        }
        for (slot, &count) in self.slots.iter().enumerate() {
            if count.unsigned_abs() > CHECKERS_PER_SIDE {
                return Err(PositionError::PointOverflow {
                    slot,
                    count: count.unsigned_abs(),
                });
            }
        }

        let top_total = self.checkers_on_board(Player::Top) as u16 + self.top_off as u16;
        if top_total != CHECKERS_PER_SIDE as u16 {
            return Err(PositionError::CheckerCount {
                player: Player::Top,
                total: top_total as u8,
            });
        }
        let bottom_total = self.checkers_on_board(Player::Bottom) as u16 + self.bottom_off as u16;
        if bottom_total != CHECKERS_PER_SIDE as u16 {
            return Err(PositionError::CheckerCount {
                player: Player::Bottom,
                total: bottom_total as u8,
            });
        }
        Ok(())
    }

    /// Pip count for the given player. Top races toward slot 24, so a
    /// top checker on slot `i` is `25 - i` pips from home; bottom races
    /// toward slot 1 and counts the slot number directly. Bar checkers
    /// are a full 25 pips out.
    pub fn pip_count(&self, player: Player) -> u32 {
        let mut pips = 0u32;
        match player {
            Player::Top => {
                for (slot, &count) in self.slots.iter().enumerate().take(BOTTOM_BAR).skip(1) {
                    if count > 0 {
                        pips += count as u32 * (25 - slot as u32);
                    }
                }
                pips += BAR_DISTANCE * self.slots[TOP_BAR].max(0) as u32;
            }
            Player::Bottom => {
                for (slot, &count) in self.slots.iter().enumerate().take(BOTTOM_BAR).skip(1) {
                    if count < 0 {
                        pips += (-count) as u32 * slot as u32;
                    }
                }
                pips += BAR_DISTANCE * (-self.slots[BOTTOM_BAR]).max(0) as u32;
            }
        }
        pips
    }

    /// The same position viewed from the other seat: every slot `i`
    /// swaps with slot `25 - i` with its sign negated, and the borne-off
    /// counters trade places. Applying the mirror twice is the identity.
    pub fn mirrored(&self) -> Position {
        let mut slots = [0i8; NumberOf::SLOTS];
        for (index, &count) in self.slots.iter().enumerate() {
            slots[NumberOf::SLOTS - 1 - index] = -count;
        }
        Position {
            slots,
            top_off: self.bottom_off,
            bottom_off: self.top_off,
        }
    }
}
