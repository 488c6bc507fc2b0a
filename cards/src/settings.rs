/*
 * settings.rs
 * Part of the gammon-knight project
 * Created Date: Wednesday, March 5th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

//! Read-only pipeline configuration. Persistence of the settings file
//! belongs to the embedding application; the core only consumes a
//! parsed, validated value.

use serde::Deserialize;
use thiserror::Error;

use crate::render::Orientation;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("analyzer_plies must be between 0 and 4, got {0}")]
    PliesOutOfRange(u8),
    #[error("import_error_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("unknown color scheme `{0}`")]
    UnknownColorScheme(String),
    #[error("settings are not valid JSON: {0}")]
    Json(String),
}

/// Which players' decisions an import keeps.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerMask {
    pub include_top: bool,
    pub include_bottom: bool,
}

impl Default for PlayerMask {
    fn default() -> Self {
        PlayerMask {
            include_top: true,
            include_bottom: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Registry key of the board palette.
    pub color_scheme: String,
    pub orientation: Orientation,
    pub analyzer_executable_path: Option<String>,
    /// Analysis depth in plies, 0..=4.
    pub analyzer_plies: u8,
    pub generate_score_matrix: bool,
    /// Minimum played-move error an import keeps, in equity.
    pub import_error_threshold: f64,
    pub import_player_mask: PlayerMask,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            color_scheme: "classic".to_string(),
            orientation: Orientation::CounterClockwise,
            analyzer_executable_path: None,
            analyzer_plies: 3,
            generate_score_matrix: false,
            import_error_threshold: 0.08,
            import_player_mask: PlayerMask::default(),
        }
    }
}

impl Settings {
    /// Parses and validates a JSON settings document. Unknown keys are
    /// ignored, missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| SettingsError::Json(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.analyzer_plies > 4 {
            return Err(SettingsError::PliesOutOfRange(self.analyzer_plies));
        }
        if !(0.0..=1.0).contains(&self.import_error_threshold) {
            return Err(SettingsError::ThresholdOutOfRange(
                self.import_error_threshold,
            ));
        }
        if crate::colors::scheme(&self.color_scheme).is_none() {
            return Err(SettingsError::UnknownColorScheme(self.color_scheme.clone()));
        }
        Ok(())
    }

    /// The configured palette; only valid after [`Settings::validate`].
    pub fn palette(&self) -> crate::colors::ColorScheme {
        crate::colors::scheme(&self.color_scheme)
            .copied()
            .unwrap_or(crate::colors::CLASSIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.analyzer_plies, 3);
        assert!(settings.import_player_mask.include_top);
    }

    #[test]
    fn parses_partial_json() {
        let settings = Settings::from_json(
            r#"{"color_scheme": "ocean", "analyzer_plies": 2, "orientation": "clockwise"}"#,
        )
        .unwrap();
        assert_eq!(settings.color_scheme, "ocean");
        assert_eq!(settings.analyzer_plies, 2);
        assert_eq!(settings.orientation, Orientation::Clockwise);
        assert_eq!(settings.import_error_threshold, 0.08);
    }

    #[test]
    fn parses_player_mask() {
        let settings = Settings::from_json(
            r#"{"import_player_mask": {"include_top": false, "include_bottom": true}}"#,
        )
        .unwrap();
        assert!(!settings.import_player_mask.include_top);
        assert!(settings.import_player_mask.include_bottom);
    }

    #[test]
    fn rejects_out_of_range_plies() {
        let result = Settings::from_json(r#"{"analyzer_plies": 7}"#);
        assert_eq!(result, Err(SettingsError::PliesOutOfRange(7)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let result = Settings::from_json(r#"{"import_error_threshold": 1.5}"#);
        assert!(matches!(result, Err(SettingsError::ThresholdOutOfRange(_))));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let result = Settings::from_json(r#"{"color_scheme": "neon"}"#);
        assert!(matches!(result, Err(SettingsError::UnknownColorScheme(_))));
    }
}
