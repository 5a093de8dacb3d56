//! Startup settings
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Every key is optional:
//!
//! ```toml
//! fps = 15
//! layout = [[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]]
//! panel_width = 28
//! mirrored = true
//! dev = false
//! output = "output/frame.png"
//! word = "BOEKEN"
//! turns_left = 0
//! max_turns = 11
//!
//! [transport]
//! type = "serial"
//! path = "/dev/ttyACM0"
//! baud_rate = 57600
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::display::{Layout, PanelGeometry, PanelWidth};
use crate::scene::{GameState, DEFAULT_MAX_TURNS, DEFAULT_WORD};
use crate::ticker::MAX_FPS;
use crate::transport::TransportConfig;

/// Default frame rate
pub const DEFAULT_FPS: u32 = 15;

/// Default location of the development preview
pub const DEFAULT_OUTPUT: &str = "output/frame.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Ticks per second
    pub fps: u32,
    /// Sub-panel addresses, top row first
    pub layout: Layout,
    /// Columns per sub-panel
    pub panel_width: PanelWidth,
    /// Flip the image horizontally before sending
    pub mirrored: bool,
    /// Write PNG previews instead of driving a display
    pub dev: bool,
    /// Preview path used in development mode
    pub output: PathBuf,
    /// Word drawn on the board
    pub word: String,
    /// Turns left when the program starts
    pub turns_left: u8,
    /// Turns in a full game
    pub max_turns: u8,
    /// Link to the controller or simulator
    pub transport: TransportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            layout: Layout::default(),
            panel_width: PanelWidth::default(),
            mirrored: true,
            dev: false,
            output: PathBuf::from(DEFAULT_OUTPUT),
            word: DEFAULT_WORD.to_string(),
            turns_left: 0,
            max_turns: DEFAULT_MAX_TURNS,
            transport: TransportConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render the settings back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }

    /// Check constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.fps > MAX_FPS {
            bail!("fps must be between 1 and {}, got {}", MAX_FPS, self.fps);
        }
        if self.max_turns == 0 {
            bail!("max_turns must be at least 1");
        }
        if self.word.is_empty() {
            bail!("word must not be empty");
        }
        Ok(())
    }

    pub fn geometry(&self) -> PanelGeometry {
        PanelGeometry::new(self.layout.clone(), self.panel_width, self.mirrored)
    }

    pub fn game_state(&self) -> GameState {
        GameState::new(self.turns_left, self.max_turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.fps, 15);
        assert_eq!(settings.geometry().width(), 84);
        assert_eq!(settings.geometry().height(), 28);
        assert!(settings.mirrored);
        assert_eq!(settings.game_state(), GameState::new(0, 11));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file() {
        let settings = Settings::from_toml_str(
            r#"
fps = 30
layout = [[1], [2]]
mirrored = false

[transport]
type = "network"
host = "127.0.0.1"
port = 3000
"#,
        )
        .unwrap();

        assert_eq!(settings.fps, 30);
        assert_eq!(settings.geometry().width(), 28);
        assert_eq!(settings.geometry().height(), 14);
        assert!(!settings.mirrored);
        assert_eq!(settings.transport, TransportConfig::simulator());
        assert_eq!(settings.word, "BOEKEN");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Settings::from_toml_str("fps = 0").is_err());
        assert!(Settings::from_toml_str("panel_width = 30").is_err());
        assert!(Settings::from_toml_str("layout = [[1, 2], [3]]").is_err());
        assert!(Settings::from_toml_str("layout = [[1, 1]]").is_err());
        assert!(Settings::from_toml_str("brightness = 3").is_err());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flipdot.toml");

        let mut settings = Settings::default();
        settings.panel_width = PanelWidth::W56;
        settings.transport = TransportConfig::simulator();
        fs::write(&path, settings.to_toml_string().unwrap()).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Settings::load(Path::new("/nonexistent/flipdot.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/flipdot.toml"));
    }
}
