//! # Derived Imaging Summaries
//!
//! Values computed from assembled PrairieView records for session logs:
//! a field-of-view summary and the stage offset of an imaging field from a
//! landmark acquisition.
//!
//! Which laser, PMT and stage-axis positions are reported is set by
//! [`SummaryConfig`], since the names depend on how the rig was configured.


use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SummaryConfig;
use crate::prairieview::{GroupedValue, ImagingParameters, PrairieViewMeta};

/// Errors that can occur while deriving summaries
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// The record lacks a section the summary needs
    #[error("Missing {0} section")]
    MissingSection(&'static str),

    /// A configured group position is absent in the file
    #[error("Group '{group}' has no field '{field}'")]
    MissingGroupField {
        /// Group name
        group: String,
        /// Configured position
        field: String,
    },

    /// The sequence reports no planes
    #[error("Invalid plane count: {0}")]
    InvalidPlaneCount(usize),

    /// The frame period cannot be turned into a rate
    #[error("Invalid frame period: {0}")]
    InvalidFramePeriod(f64),
}

/// Field-of-view summary of one acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    /// Objective lens name
    pub objective_lens: String,
    /// Laser power at the configured channel
    pub laser_power: f64,
    /// PMT gain at the configured channel
    pub pmt_gain: f64,
    /// Preamplifier filter
    pub preamp_filter: String,
    /// Optical zoom factor
    pub optical_zoom: f64,
    /// Lines per frame
    pub lines_per_frame: u32,
    /// Pixels per line
    pub pixels_per_line: u32,
    /// First (x axis) microns-per-pixel value
    pub microns_per_pixel: f64,
    /// Planes per volume
    pub planes: usize,
    /// Recorded channels
    pub channels: usize,
    /// Frames per second (`1 / frame_period`)
    pub frame_rate: f64,
    /// Volumes per second, after the configured correction
    pub effective_frame_rate: f64,
    /// Stage x
    pub x: f64,
    /// Stage y
    pub y: f64,
    /// Stage z
    pub z: f64,
}

impl FieldOfView {
    /// Summarize an assembled record
    pub fn from_metadata(
        meta: &PrairieViewMeta,
        config: &SummaryConfig,
    ) -> Result<Self, SummaryError> {
        let imaging = meta
            .imaging
            .as_ref()
            .ok_or(SummaryError::MissingSection("imaging parameters"))?;
        let sequence = meta
            .sequence
            .as_ref()
            .ok_or(SummaryError::MissingSection("sequence timing"))?;

        if sequence.num_planes == 0 {
            return Err(SummaryError::InvalidPlaneCount(sequence.num_planes));
        }
        if !(imaging.frame_period.is_finite() && imaging.frame_period > 0.0) {
            return Err(SummaryError::InvalidFramePeriod(imaging.frame_period));
        }

        let frame_rate = 1.0 / imaging.frame_period;
        let effective_frame_rate = config
            .frame_rate_correction
            .effective_rate(frame_rate, sequence.num_planes);
        let [x, y, z] = stage_position(imaging, config)?;

        let microns_per_pixel = imaging.microns_per_pixel.at(0).ok_or_else(|| {
            SummaryError::MissingGroupField {
                group: imaging.microns_per_pixel.name().to_string(),
                field: "0".to_string(),
            }
        })?;

        debug!(
            "Field of view: {:.3} Hz over {} plane(s) -> {:.3} Hz",
            frame_rate, sequence.num_planes, effective_frame_rate
        );

        Ok(Self {
            objective_lens: imaging.objective_lens.clone(),
            laser_power: group_field(&imaging.laser_power, &config.laser_power_channel)?,
            pmt_gain: group_field(&imaging.pmt_gain, &config.pmt_gain_channel)?,
            preamp_filter: imaging.preamp_filter.clone(),
            optical_zoom: imaging.optical_zoom,
            lines_per_frame: imaging.lines_per_frame,
            pixels_per_line: imaging.pixels_per_line,
            microns_per_pixel,
            planes: sequence.num_planes,
            channels: sequence.num_channels,
            frame_rate,
            effective_frame_rate,
            x,
            y,
            z,
        })
    }
}

/// Stage position at the configured `position_current` axes
pub fn stage_position(
    imaging: &ImagingParameters,
    config: &SummaryConfig,
) -> Result<[f64; 3], SummaryError> {
    let [x, y, z] = &config.stage_axes;
    Ok([
        group_field(&imaging.position_current, x)?,
        group_field(&imaging.position_current, y)?,
        group_field(&imaging.position_current, z)?,
    ])
}

/// Stage offset of an imaging field from a landmark acquisition
pub fn relative_position(
    imaging: &ImagingParameters,
    landmark: &ImagingParameters,
    config: &SummaryConfig,
) -> Result<[f64; 3], SummaryError> {
    let [x, y, z] = stage_position(imaging, config)?;
    let [lx, ly, lz] = stage_position(landmark, config)?;
    Ok([x - lx, y - ly, z - lz])
}

fn group_field(group: &GroupedValue, field: &str) -> Result<f64, SummaryError> {
    group
        .get(field)
        .ok_or_else(|| SummaryError::MissingGroupField {
            group: group.name().to_string(),
            field: field.to_string(),
        })
}
