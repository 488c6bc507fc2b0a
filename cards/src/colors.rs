/*
 * colors.rs
 * Part of the gammon-knight project
 * Created Date: Monday, March 3rd 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Mar 3 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

/// Nine-field palette the board renderer draws with. The bear-off lane
/// reuses `board_light`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: &'static str,
    pub board_light: &'static str,
    pub board_dark: &'static str,
    pub point_light: &'static str,
    pub point_dark: &'static str,
    pub checker_top: &'static str,
    pub checker_bottom: &'static str,
    pub checker_border: &'static str,
    pub bar: &'static str,
    pub text: &'static str,
}

pub const CLASSIC: ColorScheme = ColorScheme {
    name: "classic",
    board_light: "#DEB887",
    board_dark: "#8B4513",
    point_light: "#F5DEB3",
    point_dark: "#8B4513",
    checker_top: "#FFFFFF",
    checker_bottom: "#000000",
    checker_border: "#333333",
    bar: "#654321",
    text: "#000000",
};

pub const FOREST: ColorScheme = ColorScheme {
    name: "forest",
    board_light: "#A8C5A0",
    board_dark: "#3D5A3D",
    point_light: "#C9D9C4",
    point_dark: "#5F7A5F",
    checker_top: "#F5F5DC",
    checker_bottom: "#6B4423",
    checker_border: "#3D5A3D",
    bar: "#4A6147",
    text: "#000000",
};

pub const OCEAN: ColorScheme = ColorScheme {
    name: "ocean",
    board_light: "#87CEEB",
    board_dark: "#191970",
    point_light: "#B0E0E6",
    point_dark: "#4682B4",
    checker_top: "#FFFACD",
    checker_bottom: "#8B0000",
    checker_border: "#191970",
    bar: "#1E3A5F",
    text: "#000000",
};

pub const DESERT: ColorScheme = ColorScheme {
    name: "desert",
    board_light: "#D4A574",
    board_dark: "#8B6F47",
    point_light: "#E8C9A0",
    point_dark: "#B8956A",
    checker_top: "#FFF8DC",
    checker_bottom: "#6B4E71",
    checker_border: "#6B4E71",
    bar: "#9B7653",
    text: "#000000",
};

pub const SUNSET: ColorScheme = ColorScheme {
    name: "sunset",
    board_light: "#D4825A",
    board_dark: "#5C3317",
    point_light: "#E69B7B",
    point_dark: "#B8552F",
    checker_top: "#FFF5E6",
    checker_bottom: "#4A1E1E",
    checker_border: "#5C3317",
    bar: "#8B4726",
    text: "#000000",
};

pub const MIDNIGHT: ColorScheme = ColorScheme {
    name: "midnight",
    board_light: "#2F4F4F",
    board_dark: "#000000",
    point_light: "#708090",
    point_dark: "#1C1C1C",
    checker_top: "#E6E6FA",
    checker_bottom: "#DC143C",
    checker_border: "#000000",
    bar: "#0F0F0F",
    text: "#FFFFFF",
};

pub const SCHEMES: [&ColorScheme; 6] =
    [&CLASSIC, &FOREST, &OCEAN, &DESERT, &SUNSET, &MIDNIGHT];

/// Looks up a registered scheme by name, case-insensitively.
pub fn scheme(name: &str) -> Option<&'static ColorScheme> {
    SCHEMES
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .copied()
}

pub fn scheme_names() -> Vec<&'static str> {
    SCHEMES.iter().map(|s| s.name).collect()
}
