//! Persisted presentation preferences.
//!
//! The front end keeps its theme and the angle unit across sessions in a
//! small TOML file under the platform config directory. Loading is lenient:
//! a missing or unreadable file just yields the defaults.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::eval::AngleUnit;

/// Light or dark terminal palette.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("preferences i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences encoding: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub angle_unit: AngleUnit,
}

impl Preferences {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scicalc").join("preferences.toml"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        let Ok(text) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&text) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring malformed preferences");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = Self::path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_widget() {
        let prefs = Preferences::default();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.angle_unit, AngleUnit::Degrees);
    }

    #[test]
    fn toml_round_trip() {
        let prefs = Preferences {
            theme: Theme::Dark,
            angle_unit: AngleUnit::Radians,
        };
        let text = toml::to_string(&prefs).unwrap();
        let back: Preferences = toml::from_str(&text).unwrap();
        assert_eq!(back, prefs);
    }

    #[test]
    fn missing_fields_fall_back() {
        let prefs: Preferences = toml::from_str("theme = \"dark\"").unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.angle_unit, AngleUnit::Degrees);
    }
}
