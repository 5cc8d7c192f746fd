//! Editor configuration
//!
//! Everything tunable about an editor session: which layout strategy is
//! active, its numeric constants and the drag/snap thresholds. Loaded from
//! TOML; every key is optional.
//!
//! ```toml
//! style = "inline"
//!
//! [snap]
//! snap_radius = 40.0
//! grid_spacing = 20.0
//!
//! [layout.stacked]
//! min_bay_height = 48.0
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::layout::{LayoutConfig, LayoutStyle};

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Drag resolution and bump thresholds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Search radius while nothing is previewed
    pub snap_radius: f64,
    /// Search radius once a candidate is previewed
    pub connecting_radius: f64,
    /// A new candidate must be this much closer to replace the current one
    pub current_connection_preference: f64,
    /// Delay before displaced orphans and dropped stacks settle
    pub bump_delay_ms: u64,
    /// Dropped blocks snap to this grid when set
    pub grid_spacing: Option<f64>,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_radius: 48.0,
            connecting_radius: 68.0,
            current_connection_preference: 20.0,
            bump_delay_ms: 250,
            grid_spacing: None,
        }
    }
}

impl SnapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snap_radius(mut self, radius: f64) -> Self {
        self.snap_radius = radius;
        self
    }

    pub fn with_connecting_radius(mut self, radius: f64) -> Self {
        self.connecting_radius = radius;
        self
    }

    pub fn with_bump_delay(mut self, delay_ms: u64) -> Self {
        self.bump_delay_ms = delay_ms;
        self
    }

    pub fn with_grid_spacing(mut self, spacing: f64) -> Self {
        self.grid_spacing = Some(spacing);
        self
    }
}

/// Configuration of one workspace
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub style: LayoutStyle,
    pub layout: LayoutConfig,
    pub snap: SnapConfig,
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_style(mut self, style: LayoutStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_snap(mut self, snap: SnapConfig) -> Self {
        self.snap = snap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let snap = SnapConfig::default();
        assert_eq!(snap.snap_radius, 48.0);
        assert_eq!(snap.connecting_radius, 68.0);
        assert_eq!(snap.current_connection_preference, 20.0);
        assert_eq!(snap.bump_delay_ms, 250);
        assert_eq!(snap.grid_spacing, None);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = EditorConfig::from_str(
            r#"
style = "inline"

[snap]
grid_spacing = 20.0

[layout.stacked]
min_bay_height = 48.0
"#,
        )
        .unwrap();
        assert_eq!(config.style, LayoutStyle::Inline);
        assert_eq!(config.snap.grid_spacing, Some(20.0));
        assert_eq!(config.snap.snap_radius, 48.0);
        assert_eq!(config.layout.stacked.min_bay_height, 48.0);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(EditorConfig::from_str("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_invalid_style_is_error() {
        let err = EditorConfig::from_str(r#"style = "diagonal""#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
