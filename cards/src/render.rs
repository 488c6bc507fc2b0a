/*
 * render.rs
 * Part of the gammon-knight project
 * Created Date: Tuesday, March 4th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Deterministic SVG board rendering.
//!
//! The same inputs always produce byte-identical markup: every
//! coordinate goes through one fixed-precision formatter and nothing
//! depends on hashing order, time or randomness. The 900x600 view box
//! is split into a cube lane on the left, the playing area, and a
//! bear-off lane on the right.

use std::fmt::Write;

use backgammon::{
    player::{CubeState, Player},
    position::Position,
};
use serde::Deserialize;

use crate::colors::ColorScheme;

/// Board orientation. Counter-clockwise is the common convention
/// (points 13..18 top left, 1..6 bottom right); clockwise mirrors the
/// point layout horizontally without touching the checker colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Clockwise,
    #[default]
    CounterClockwise,
}

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 600.0;
const MARGIN: f64 = 20.0;
const CUBE_LANE_WIDTH: f64 = 70.0;
const BEAROFF_LANE_WIDTH: f64 = 100.0;
const POINT_HEIGHT_RATIO: f64 = 0.45;
const BAR_RATIO: f64 = 0.08;
const DIE_SIZE: f64 = 50.0;
const DIE_SPACING: f64 = 15.0;
const CUBE_SIZE: f64 = 50.0;
const MAX_STACKED_CHECKERS: usize = 5;
const MAX_BAR_CHECKERS: usize = 3;

pub struct BoardRenderer {
    scheme: ColorScheme,
    orientation: Orientation,
    playing_width: f64,
    board_height: f64,
    bar_width: f64,
    half_width: f64,
    point_width: f64,
    point_height: f64,
    checker_radius: f64,
}

impl BoardRenderer {
    pub fn new(scheme: ColorScheme, orientation: Orientation) -> Self {
        let playing_width = WIDTH - 2.0 * MARGIN - CUBE_LANE_WIDTH - BEAROFF_LANE_WIDTH;
        let board_height = HEIGHT - 2.0 * MARGIN;
        let bar_width = playing_width * BAR_RATIO;
        let half_width = (playing_width - bar_width) / 2.0;
        let point_width = half_width / 6.0;
        BoardRenderer {
            scheme,
            orientation,
            playing_width,
            board_height,
            bar_width,
            half_width,
            point_width,
            point_height: board_height * POINT_HEIGHT_RATIO,
            checker_radius: (point_width * 0.45).min(25.0),
        }
    }

    /// Renders the position as a complete SVG document fragment.
    pub fn render(
        &self,
        position: &Position,
        _on_roll: Player,
        dice: Option<(u8, u8)>,
        cube_value: u32,
        cube_owner: CubeState,
    ) -> String {
        let board_x = MARGIN + CUBE_LANE_WIDTH;
        let board_y = MARGIN;

        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg viewBox=\"0 0 {} {}\" xmlns=\"http://www.w3.org/2000/svg\" class=\"backgammon-board\">",
            fmt(WIDTH),
            fmt(HEIGHT)
        );
        svg.push_str(&self.styles());
        self.draw_background(&mut svg, board_x, board_y);
        self.draw_bar(&mut svg, board_x, board_y);
        self.draw_points(&mut svg, board_x, board_y);
        self.draw_checkers(&mut svg, position, board_x, board_y);
        self.draw_bearoff(&mut svg, position, board_x, board_y);
        if let Some(dice) = dice {
            self.draw_dice(&mut svg, dice, board_x, board_y);
        }
        self.draw_cube(&mut svg, cube_value, cube_owner, board_y);
        self.draw_pip_counts(&mut svg, position, board_x, board_y);
        svg.push_str("</svg>");
        svg
    }

    fn styles(&self) -> String {
        format!(
            "<defs><style>\
.backgammon-board{{max-width:100%;height:auto;}}\
.point{{stroke:{board_dark};stroke-width:1;}}\
.checker{{stroke:{checker_border};stroke-width:2;}}\
.checker-top{{fill:{checker_top};}}\
.checker-bottom{{fill:{checker_bottom};}}\
.checker-text{{font-family:Arial,sans-serif;font-weight:bold;text-anchor:middle;dominant-baseline:middle;}}\
.point-label{{font-family:Arial,sans-serif;font-size:10px;fill:{text};text-anchor:middle;}}\
.pip-count{{font-family:Arial,sans-serif;font-size:12px;fill:{text};}}\
.die{{fill:#FFFFFF;stroke:#000000;stroke-width:2;}}\
.die-pip{{fill:#000000;}}\
.cube{{fill:#FFD700;stroke:#000000;stroke-width:2;}}\
.cube-text{{font-family:Arial,sans-serif;font-size:32px;font-weight:bold;fill:#000000;text-anchor:middle;dominant-baseline:middle;}}\
</style></defs>",
            board_dark = self.scheme.board_dark,
            checker_border = self.scheme.checker_border,
            checker_top = self.scheme.checker_top,
            checker_bottom = self.scheme.checker_bottom,
            text = self.scheme.text,
        )
    }

    fn draw_background(&self, svg: &mut String, board_x: f64, board_y: f64) {
        let _ = write!(
            svg,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            fmt(WIDTH),
            fmt(HEIGHT),
            self.scheme.board_light
        );
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"3\"/>",
            fmt(board_x),
            fmt(board_y),
            fmt(self.playing_width),
            fmt(self.board_height),
            self.scheme.board_light,
            self.scheme.board_dark
        );
    }

    fn draw_bar(&self, svg: &mut String, board_x: f64, board_y: f64) {
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
            fmt(board_x + self.half_width),
            fmt(board_y),
            fmt(self.bar_width),
            fmt(self.board_height),
            self.scheme.bar,
            self.scheme.board_dark
        );
    }

    /// Maps a point number to its visual column 0..=23 under the
    /// configured orientation.
    fn visual_index(&self, point: usize) -> usize {
        match self.orientation {
            Orientation::CounterClockwise => point - 1,
            Orientation::Clockwise => {
                if point <= 12 {
                    12 - point
                } else {
                    36 - point
                }
            }
        }
    }

    /// Geometry of a visual column: x of the left edge, base y and
    /// whether the triangle hangs from the top edge.
    fn column_geometry(&self, visual: usize, board_x: f64, board_y: f64) -> (f64, f64, bool) {
        match visual {
            0..=5 => (
                board_x + self.half_width + self.bar_width + (5 - visual) as f64 * self.point_width,
                board_y + self.board_height,
                false,
            ),
            6..=11 => (
                board_x + (11 - visual) as f64 * self.point_width,
                board_y + self.board_height,
                false,
            ),
            12..=17 => (
                board_x + (visual - 12) as f64 * self.point_width,
                board_y,
                true,
            ),
            _ => (
                board_x + self.half_width + self.bar_width + (visual - 18) as f64 * self.point_width,
                board_y,
                true,
            ),
        }
    }

    fn draw_points(&self, svg: &mut String, board_x: f64, board_y: f64) {
        svg.push_str("<g class=\"points\">");
        for point in 1..=24usize {
            let visual = self.visual_index(point);
            let (x, y_base, is_top) = self.column_geometry(visual, board_x, board_y);
            let y_tip = if is_top {
                y_base + self.point_height
            } else {
                y_base - self.point_height
            };
            let label_y = if is_top { y_base - 5.0 } else { y_base + 13.0 };
            let color = if point % 2 == 1 {
                self.scheme.point_dark
            } else {
                self.scheme.point_light
            };
            let x_mid = x + self.point_width / 2.0;
            let _ = write!(
                svg,
                "<polygon class=\"point\" points=\"{},{} {},{} {},{}\" fill=\"{}\"/>",
                fmt(x),
                fmt(y_base),
                fmt(x + self.point_width),
                fmt(y_base),
                fmt(x_mid),
                fmt(y_tip),
                color
            );
            let _ = write!(
                svg,
                "<text class=\"point-label\" x=\"{}\" y=\"{}\">{}</text>",
                fmt(x_mid),
                fmt(label_y),
                point
            );
        }
        svg.push_str("</g>");
    }

    fn draw_checkers(&self, svg: &mut String, position: &Position, board_x: f64, board_y: f64) {
        svg.push_str("<g class=\"checkers\">");
        for point in 1..=24usize {
            let count = position.slot(point);
            if count == 0 {
                continue;
            }
            let player = if count > 0 { Player::Top } else { Player::Bottom };
            let stack = count.unsigned_abs() as usize;
            let visual = self.visual_index(point);
            let (x, y_base, is_top) = self.column_geometry(visual, board_x, board_y);
            let cx = x + self.point_width / 2.0;

            let drawn = stack.min(MAX_STACKED_CHECKERS);
            for index in 0..drawn {
                let cy = self.stacked_y(y_base, is_top, index);
                if index == drawn - 1 && stack > MAX_STACKED_CHECKERS {
                    self.draw_numbered_checker(svg, cx, cy, player, stack);
                } else {
                    self.draw_checker(svg, cx, cy, player);
                }
            }
        }
        self.draw_bar_checkers(svg, position, board_x, board_y);
        svg.push_str("</g>");
    }

    fn stacked_y(&self, y_base: f64, is_top: bool, index: usize) -> f64 {
        let offset = self.checker_radius + index as f64 * (self.checker_radius * 2.0 + 2.0);
        if is_top { y_base + offset } else { y_base - offset }
    }

    fn draw_checker(&self, svg: &mut String, cx: f64, cy: f64, player: Player) {
        let _ = write!(
            svg,
            "<circle class=\"checker {}\" cx=\"{}\" cy=\"{}\" r=\"{}\"/>",
            checker_class(player),
            fmt(cx),
            fmt(cy),
            fmt(self.checker_radius)
        );
    }

    fn draw_numbered_checker(
        &self,
        svg: &mut String,
        cx: f64,
        cy: f64,
        player: Player,
        total: usize,
    ) {
        self.draw_checker(svg, cx, cy, player);
        let text_color = match player {
            Player::Top => self.scheme.checker_bottom,
            Player::Bottom => self.scheme.checker_top,
        };
        let _ = write!(
            svg,
            "<text class=\"checker-text\" x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            fmt(cx),
            fmt(cy),
            fmt(self.checker_radius * 1.2),
            text_color,
            total
        );
    }

    fn draw_bar_checkers(&self, svg: &mut String, position: &Position, board_x: f64, board_y: f64) {
        let bar_center_x = board_x + self.half_width + self.bar_width / 2.0;
        let board_center_y = board_y + self.board_height / 2.0;
        let separation = self.checker_radius * 2.0 + 10.0;

        for player in [Player::Top, Player::Bottom] {
            let count = position.bar_count(player) as usize;
            if count == 0 {
                continue;
            }
            let visible = count.min(MAX_BAR_CHECKERS);
            for index in 0..visible {
                let step = index as f64 * (self.checker_radius * 2.0 + 2.0);
                // Top's bar checkers stack downward from center, bottom's
                // stack upward.
                let cy = match player {
                    Player::Top => board_center_y + separation + step,
                    Player::Bottom => board_center_y - separation - step,
                };
                if index == visible - 1 && count > visible {
                    self.draw_numbered_checker(svg, bar_center_x, cy, player, count);
                } else {
                    self.draw_checker(svg, bar_center_x, cy, player);
                }
            }
        }
    }

    fn draw_bearoff(&self, svg: &mut String, position: &Position, board_x: f64, board_y: f64) {
        svg.push_str("<g class=\"bearoff\">");
        let bearoff_x = board_x + self.playing_width + 10.0;
        let bearoff_width = BEAROFF_LANE_WIDTH - 20.0;
        let checker_width = 10.0;
        let checker_height = 50.0;
        let spacing_x = 3.0;
        let spacing_y = 4.0;
        let per_row = 5usize;

        for player in [Player::Top, Player::Bottom] {
            let (tray_top, tray_bottom) = match player {
                Player::Top => (board_y + 10.0, board_y + self.board_height / 2.0 - 10.0),
                Player::Bottom => (
                    board_y + self.board_height / 2.0 + 10.0,
                    board_y + self.board_height - 10.0,
                ),
            };
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
                fmt(bearoff_x),
                fmt(tray_top),
                fmt(bearoff_width),
                fmt(tray_bottom - tray_top),
                self.scheme.board_light,
                self.scheme.board_dark
            );

            let off = position.off_count(player) as usize;
            if off == 0 {
                continue;
            }
            let row_width = per_row as f64 * checker_width + (per_row - 1) as f64 * spacing_x;
            let start_x = bearoff_x + (bearoff_width - row_width) / 2.0;
            let start_y = tray_bottom - 10.0 - checker_height;
            let color = match player {
                Player::Top => self.scheme.checker_top,
                Player::Bottom => self.scheme.checker_bottom,
            };
            for index in 0..off {
                let row = index / per_row;
                let column = index % per_row;
                let x = start_x + column as f64 * (checker_width + spacing_x);
                let y = start_y - row as f64 * (checker_height + spacing_y);
                let _ = write!(
                    svg,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
                    fmt(x),
                    fmt(y),
                    fmt(checker_width),
                    fmt(checker_height),
                    color,
                    self.scheme.checker_border
                );
            }
        }
        svg.push_str("</g>");
    }

    fn draw_dice(&self, svg: &mut String, dice: (u8, u8), board_x: f64, board_y: f64) {
        svg.push_str("<g class=\"dice\">");
        let total_width = 2.0 * DIE_SIZE + DIE_SPACING;
        let right_half_start = board_x + self.half_width + self.bar_width;
        let die_x = right_half_start + (self.half_width - total_width) / 2.0;
        let die_y = board_y + (self.board_height - DIE_SIZE) / 2.0;
        self.draw_die(svg, die_x, die_y, dice.0);
        self.draw_die(svg, die_x + DIE_SIZE + DIE_SPACING, die_y, dice.1);
        svg.push_str("</g>");
    }

    fn draw_die(&self, svg: &mut String, x: f64, y: f64, value: u8) {
        let _ = write!(
            svg,
            "<rect class=\"die\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"5\"/>",
            fmt(x),
            fmt(y),
            fmt(DIE_SIZE),
            fmt(DIE_SIZE)
        );
        let quarter = DIE_SIZE / 4.0;
        let center = DIE_SIZE / 2.0;
        let three_quarters = 3.0 * DIE_SIZE / 4.0;
        let pips: &[(f64, f64)] = match value {
            1 => &[(center, center)],
            2 => &[(quarter, quarter), (three_quarters, three_quarters)],
            3 => &[
                (quarter, quarter),
                (center, center),
                (three_quarters, three_quarters),
            ],
            4 => &[
                (quarter, quarter),
                (three_quarters, quarter),
                (quarter, three_quarters),
                (three_quarters, three_quarters),
            ],
            5 => &[
                (quarter, quarter),
                (three_quarters, quarter),
                (center, center),
                (quarter, three_quarters),
                (three_quarters, three_quarters),
            ],
            6 => &[
                (quarter, quarter),
                (three_quarters, quarter),
                (quarter, center),
                (three_quarters, center),
                (quarter, three_quarters),
                (three_quarters, three_quarters),
            ],
            _ => &[],
        };
        for &(px, py) in pips {
            let _ = write!(
                svg,
                "<circle class=\"die-pip\" cx=\"{}\" cy=\"{}\" r=\"{}\"/>",
                fmt(x + px),
                fmt(y + py),
                fmt(DIE_SIZE / 10.0)
            );
        }
    }

    fn draw_cube(&self, svg: &mut String, cube_value: u32, cube_owner: CubeState, board_y: f64) {
        let lane_center = MARGIN + 10.0 + (CUBE_LANE_WIDTH - 20.0) / 2.0;
        let cube_x = lane_center - CUBE_SIZE / 2.0;
        let cube_y = match cube_owner {
            CubeState::Centered => board_y + (self.board_height - CUBE_SIZE) / 2.0,
            CubeState::TopOwns => board_y + 10.0,
            CubeState::BottomOwns => board_y + self.board_height - CUBE_SIZE - 10.0,
        };
        let face = if cube_owner == CubeState::Centered && cube_value <= 1 {
            "64".to_string()
        } else {
            cube_value.to_string()
        };
        let _ = write!(
            svg,
            "<g class=\"cube\"><rect class=\"cube\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"3\"/><text class=\"cube-text\" x=\"{}\" y=\"{}\">{}</text></g>",
            fmt(cube_x),
            fmt(cube_y),
            fmt(CUBE_SIZE),
            fmt(CUBE_SIZE),
            fmt(cube_x + CUBE_SIZE / 2.0),
            fmt(cube_y + CUBE_SIZE / 2.0),
            face
        );
    }

    fn draw_pip_counts(&self, svg: &mut String, position: &Position, board_x: f64, board_y: f64) {
        let text_x = board_x + self.playing_width + 15.0;
        let top_y = board_y + 10.0 + 12.0;
        let bottom_y = board_y + self.board_height / 2.0 + 10.0 + 12.0;
        let _ = write!(
            svg,
            "<g class=\"pip-counts\"><text class=\"pip-count\" x=\"{}\" y=\"{}\">Pip: {}</text><text class=\"pip-count\" x=\"{}\" y=\"{}\">Pip: {}</text></g>",
            fmt(text_x),
            fmt(top_y),
            position.pip_count(Player::Top),
            fmt(text_x),
            fmt(bottom_y),
            position.pip_count(Player::Bottom)
        );
    }
}

fn checker_class(player: Player) -> &'static str {
    match player {
        Player::Top => "checker-top",
        Player::Bottom => "checker-bottom",
    }
}

/// Fixed two-decimal formatting keeps coordinates identical across
/// platforms.
fn fmt(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{CLASSIC, MIDNIGHT};

    fn renderer() -> BoardRenderer {
        BoardRenderer::new(CLASSIC, Orientation::CounterClockwise)
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = renderer().render(
            &Position::STARTING,
            Player::Bottom,
            Some((3, 1)),
            1,
            CubeState::Centered,
        );
        let b = renderer().render(
            &Position::STARTING,
            Player::Bottom,
            Some((3, 1)),
            1,
            CubeState::Centered,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn every_occupied_point_draws_a_circle() {
        let svg = renderer().render(
            &Position::STARTING,
            Player::Bottom,
            None,
            1,
            CubeState::Centered,
        );
        // The starting position has 8 occupied points with five or
        // fewer checkers each except the 5-stacks, all capped at 5
        // drawn: 2+5+3+5 per side = 15 circles per player on points.
        let circles = svg.matches("<circle class=\"checker ").count();
        assert_eq!(circles, 30);
    }

    #[test]
    fn overflow_stack_draws_count_glyph() {
        let mut slots = [0i8; 26];
        slots[6] = 9;
        slots[19] = -9;
        let position = Position::from_slots(slots).unwrap();
        let svg = renderer().render(&position, Player::Bottom, None, 1, CubeState::Centered);
        // One count glyph per overflowing stack.
        assert_eq!(svg.matches("class=\"checker-text\"").count(), 2);
        // Only five circles drawn per stack.
        assert_eq!(svg.matches("<circle class=\"checker ").count(), 10);
    }

    #[test]
    fn dice_render_with_pip_patterns() {
        let svg = renderer().render(
            &Position::STARTING,
            Player::Bottom,
            Some((6, 1)),
            1,
            CubeState::Centered,
        );
        assert_eq!(svg.matches("class=\"die-pip\"").count(), 7);
    }

    #[test]
    fn no_dice_no_die_elements() {
        let svg = renderer().render(&Position::STARTING, Player::Bottom, None, 1, CubeState::Centered);
        assert!(!svg.contains("class=\"die\""));
    }

    #[test]
    fn centered_cube_shows_sixty_four() {
        let svg = renderer().render(&Position::STARTING, Player::Bottom, None, 1, CubeState::Centered);
        assert!(svg.contains(">64</text>"));
        let doubled = renderer().render(
            &Position::STARTING,
            Player::Bottom,
            None,
            2,
            CubeState::TopOwns,
        );
        assert!(doubled.contains(">2</text>"));
        assert!(!doubled.contains(">64</text>"));
    }

    #[test]
    fn cube_position_follows_owner() {
        let top = renderer().render(&Position::STARTING, Player::Bottom, None, 2, CubeState::TopOwns);
        let bottom = renderer().render(
            &Position::STARTING,
            Player::Bottom,
            None,
            2,
            CubeState::BottomOwns,
        );
        assert_ne!(top, bottom);
        // Top-owned cube sits near the top margin.
        assert!(top.contains("<rect class=\"cube\" x=\"30.00\" y=\"30.00\""));
    }

    #[test]
    fn pip_counts_are_labelled() {
        let svg = renderer().render(&Position::STARTING, Player::Bottom, None, 1, CubeState::Centered);
        assert_eq!(svg.matches("Pip: 167").count(), 2);
    }

    #[test]
    fn clockwise_mirrors_point_columns() {
        let ccw = BoardRenderer::new(CLASSIC, Orientation::CounterClockwise);
        let cw = BoardRenderer::new(CLASSIC, Orientation::Clockwise);
        assert_eq!(ccw.visual_index(1), 0);
        assert_eq!(cw.visual_index(1), 11);
        assert_eq!(ccw.visual_index(13), 12);
        assert_eq!(cw.visual_index(13), 23);
        assert_eq!(cw.visual_index(24), 12);
    }

    #[test]
    fn bar_checkers_render_in_the_bar_lane() {
        let mut slots = [0i8; 26];
        slots[0] = 2;
        slots[24] = 13;
        slots[1] = -15;
        let position = Position::from_slots(slots).unwrap();
        let svg = renderer().render(&position, Player::Top, None, 1, CubeState::Centered);
        // 2 bar checkers + 5 visible on slot 24 + 5 visible on slot 1.
        assert_eq!(svg.matches("<circle class=\"checker ").count(), 12);
    }

    #[test]
    fn bearoff_trays_fill_with_rectangles() {
        let mut slots = [0i8; 26];
        slots[24] = 8;
        slots[1] = -15;
        let position = Position::from_slots(slots).unwrap();
        let svg = renderer().render(&position, Player::Bottom, None, 1, CubeState::Centered);
        // 7 top checkers are off; each draws a 10x50 rect.
        assert_eq!(svg.matches("width=\"10.00\" height=\"50.00\"").count(), 7);
    }

    #[test]
    fn scheme_colors_flow_into_styles() {
        let svg = BoardRenderer::new(MIDNIGHT, Orientation::CounterClockwise).render(
            &Position::STARTING,
            Player::Bottom,
            None,
            1,
            CubeState::Centered,
        );
        assert!(svg.contains("#2F4F4F"));
        assert!(svg.contains(".checker-bottom{fill:#DC143C;}"));
    }
}
