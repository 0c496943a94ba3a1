use anyhow::{Context, Result};
use facecam_vision::{CameraFacing, OverlayDimensions};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::overlay::BoxStyle;

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("FACECAM_CONFIG_PATH").unwrap_or("/usr/local/etc/facecam/config.toml"))
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub overlay_width: u32,
    pub overlay_height: u32,
    pub facing: CameraFacing,
    pub box_color: [u8; 3],
    pub stroke_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        let style = BoxStyle::default();
        Self {
            overlay_width: 1080,
            overlay_height: 2280,
            facing: CameraFacing::Front,
            box_color: style.color,
            stroke_width: style.stroke_width,
        }
    }
}

impl Config {
    pub fn overlay(&self) -> OverlayDimensions {
        OverlayDimensions::new(self.overlay_width as f32, self.overlay_height as f32)
    }

    pub fn box_style(&self) -> BoxStyle {
        BoxStyle {
            color: self.box_color,
            stroke_width: self.stroke_width,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Write the default config if none exists yet. Returns whether it wrote one.
pub fn ensure_config(path: Option<&Path>) -> Result<bool> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("writing default config to {}", path.display()))?;
    Ok(true)
}
