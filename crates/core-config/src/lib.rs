//! Configuration loading and parsing.
//!
//! Parses `nvim-screen.toml` (or an override path provided by the binary).
//! Every field has a default so a missing file, a missing section, or an
//! unparsable file all yield a usable [`Config`]. Unknown fields are ignored
//! to allow forward evolution without immediate warnings.
//!
//! ```toml
//! [font]
//! face = "monospace"
//! px = 12
//!
//! [screen]
//! width = 800
//! height = 600
//!
//! [input.alt_literal]
//! enabled = true
//! modes = ["normal"]
//!
//! [mouse]
//! wheel_lines_per_step = 3
//! wheel_cols_per_step = 6
//!
//! [editor]
//! command = "nvim"
//! args = ["--embed"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, io, path::PathBuf};
use tracing::{info, warn};

const FILE_NAME: &str = "nvim-screen.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FontConfig {
    #[serde(default = "FontConfig::default_face")]
    pub face: String,
    #[serde(default = "FontConfig::default_px")]
    pub px: u32,
    /// Cell height as a multiple of the measured cell width.
    #[serde(default = "FontConfig::default_line_height_factor")]
    pub line_height_factor: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            face: Self::default_face(),
            px: Self::default_px(),
            line_height_factor: Self::default_line_height_factor(),
        }
    }
}

impl FontConfig {
    fn default_face() -> String {
        "monospace".to_string()
    }
    const fn default_px() -> u32 {
        12
    }
    const fn default_line_height_factor() -> f32 {
        2.0
    }
}

/// Initial host viewport in device pixels.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConfig {
    #[serde(default = "ScreenConfig::default_width")]
    pub width: u32,
    #[serde(default = "ScreenConfig::default_height")]
    pub height: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

impl ScreenConfig {
    const fn default_width() -> u32 {
        800
    }
    const fn default_height() -> u32 {
        600
    }
}

/// Alt+key sends the literal lowercase character instead of the key
/// identifier while the editor is in one of `modes`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AltLiteralConfig {
    #[serde(default = "AltLiteralConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "AltLiteralConfig::default_modes")]
    pub modes: Vec<String>,
}

impl Default for AltLiteralConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            modes: Self::default_modes(),
        }
    }
}

impl AltLiteralConfig {
    const fn default_enabled() -> bool {
        cfg!(target_os = "macos")
    }
    fn default_modes() -> Vec<String> {
        vec!["normal".to_string()]
    }

    pub fn applies_in(&self, mode: &str) -> bool {
        self.enabled && self.modes.iter().any(|m| m == mode)
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct InputConfig {
    #[serde(default)]
    pub alt_literal: AltLiteralConfig,
}

/// Pixels of accumulated wheel delta per emitted step are
/// `cell_height * wheel_lines_per_step` vertically and
/// `cell_width * wheel_cols_per_step` horizontally.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MouseConfig {
    #[serde(default = "MouseConfig::default_lines_per_step")]
    pub wheel_lines_per_step: u32,
    #[serde(default = "MouseConfig::default_cols_per_step")]
    pub wheel_cols_per_step: u32,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            wheel_lines_per_step: Self::default_lines_per_step(),
            wheel_cols_per_step: Self::default_cols_per_step(),
        }
    }
}

impl MouseConfig {
    const fn default_lines_per_step() -> u32 {
        3
    }
    const fn default_cols_per_step() -> u32 {
        6
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_command")]
    pub command: String,
    #[serde(default = "EditorConfig::default_args")]
    pub args: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            args: Self::default_args(),
        }
    }
}

impl EditorConfig {
    fn default_command() -> String {
        "nvim".to_string()
    }
    fn default_args() -> Vec<String> {
        vec!["--embed".to_string()]
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub mouse: MouseConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub source: Option<PathBuf>,
    pub file: ConfigFile,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("nvim-screen").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

/// Loads the config at `path`, or the discovered location when `None`.
///
/// A missing or unparsable file yields defaults. An explicit path that
/// exists but cannot be read is an error.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound || !explicit => {
            info!(target: "config", path = %path.display(), "config_defaults_used");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                face = %file.font.face,
                px = file.font.px,
                "config_loaded"
            );
            Ok(Config {
                raw: Some(content),
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Font size with a zero value replaced by the default.
    pub fn font_px(&self) -> u32 {
        if self.file.font.px == 0 {
            FontConfig::default_px()
        } else {
            self.file.font.px
        }
    }

    pub fn mouse(&self) -> MouseConfig {
        let mut m = self.file.mouse;
        m.wheel_lines_per_step = m.wheel_lines_per_step.max(1);
        m.wheel_cols_per_step = m.wheel_cols_per_step.max(1);
        m
    }
}
