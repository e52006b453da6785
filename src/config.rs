//! TOML configuration for derived summaries.
//!
//! Every setting has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! # prairie-meta.toml
//! [summary]
//! laser_power_channel = "imaging"
//! pmt_gain_channel = "pmt_2_green"
//! stage_axes = ["x_axis", "y_axis", "z_axis_z_focus"]
//! frame_rate_correction = { per_plane_offset = 0.5 }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure for prairie-meta.toml files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Settings for [`crate::summary`].
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Which grouped-value positions feed the field-of-view summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Position of `laser_power` reported as the imaging laser power.
    pub laser_power_channel: String,

    /// Position of `pmt_gain` reported as the PMT gain.
    pub pmt_gain_channel: String,

    /// Positions of `position_current` used as stage x, y and z.
    pub stage_axes: [String; 3],

    /// Correction applied when deriving the per-plane frame rate.
    pub frame_rate_correction: FrameRateCorrection,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            laser_power_channel: "imaging".to_string(),
            pmt_gain_channel: "pmt_2_green".to_string(),
            stage_axes: [
                "x_axis".to_string(),
                "y_axis".to_string(),
                "z_axis_z_focus".to_string(),
            ],
            frame_rate_correction: FrameRateCorrection::None,
        }
    }
}

/// Instrument-specific correction of the effective (per-volume) frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRateCorrection {
    /// `frame_rate / planes`
    #[default]
    None,
    /// `frame_rate / planes - offset`
    PerPlaneOffset(f64),
}

impl FrameRateCorrection {
    /// Effective frame rate of a volume acquired over `planes` planes.
    pub fn effective_rate(self, frame_rate: f64, planes: usize) -> f64 {
        let per_volume = frame_rate / planes as f64;
        match self {
            FrameRateCorrection::None => per_volume,
            FrameRateCorrection::PerPlaneOffset(offset) => per_volume - offset,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [summary]
            laser_power_channel = "uncaging"
            pmt_gain_channel = "pmt_1_red"
            stage_axes = ["x_axis", "y_axis", "z_axis_bruker_2_p_z"]
            frame_rate_correction = { per_plane_offset = 0.5 }
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.summary.laser_power_channel, "uncaging");
        assert_eq!(config.summary.pmt_gain_channel, "pmt_1_red");
        assert_eq!(config.summary.stage_axes[2], "z_axis_bruker_2_p_z");
        assert_eq!(
            config.summary.frame_rate_correction,
            FrameRateCorrection::PerPlaneOffset(0.5)
        );
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [summary]
            frame_rate_correction = "none"
            pmt_gain_channel = "pmt_1_red"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.summary.pmt_gain_channel, "pmt_1_red");
        assert_eq!(config.summary.laser_power_channel, "imaging");
        assert_eq!(config.summary.frame_rate_correction, FrameRateCorrection::None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.summary, SummaryConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[summary]\nstage_axes = [\"x_axis\"]").is_err());
        assert!(Config::from_file(Path::new("/nonexistent/prairie-meta.toml")).is_err());
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prairie-meta.toml");
        std::fs::write(&path, "[summary]\nlaser_power_channel = \"uncaging\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.summary.laser_power_channel, "uncaging");
    }

    #[test]
    fn test_effective_rate() {
        assert_eq!(FrameRateCorrection::None.effective_rate(30.0, 3), 10.0);
        assert_eq!(
            FrameRateCorrection::PerPlaneOffset(0.5).effective_rate(30.0, 3),
            9.5
        );
    }
}
