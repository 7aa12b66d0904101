use serde::{Deserialize, Serialize};
use egui::Color32;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPalette {
    pub info: Color32,
    pub warn: Color32,
    pub error: Color32,
    pub debug: Color32,
    pub trace: Color32,
    pub default: Color32,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            info: Color32::from_rgb(216, 237, 250),
            warn: Color32::from_rgb(255, 240, 213),
            error: Color32::from_rgb(250, 202, 202),
            debug: Color32::from_rgb(222, 251, 199),
            trace: Color32::from_rgb(100, 100, 100),
            default: Color32::from_rgb(220, 220, 220),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub color_palette: ColorPalette,
    pub tail_log: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            color_palette: ColorPalette::default(),
            tail_log: true,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
