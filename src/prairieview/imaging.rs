//! Typed imaging parameters and the static field table that maps them to
//! PrairieView `PVStateValue` keys

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::grouped::GroupedValue;
use super::names::canonicalize;
use super::PrairieViewError;

/// Expected shape and type of an imaging field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Whole number
    Integer,
    /// Floating point
    Float,
    /// Boolean flag
    Flag,
    /// Indexed or sub-indexed group of floats
    Grouped,
}

/// One row of the imaging field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical (snake case) field name
    pub name: &'static str,
    /// `key` attribute of the source `PVStateValue`
    pub source_key: &'static str,
    /// Human-readable label for rendered tables
    pub display_name: &'static str,
    /// Expected kind
    pub kind: FieldKind,
}

const fn field(
    name: &'static str,
    source_key: &'static str,
    display_name: &'static str,
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        name,
        source_key,
        display_name,
        kind,
    }
}

/// Every imaging field, its source key, display label and kind.
///
/// Source keys are the lower camel case of the field name, except
/// `objectiveLensNA` whose acronym does not survive the round trip.
#[rustfmt::skip]
pub static IMAGING_FIELDS: [FieldSpec; 32] = [
    field("active_mode", "activeMode", "Active Mode", FieldKind::Text),
    field("bit_depth", "bitDepth", "Bit Depth", FieldKind::Integer),
    field("current_scan_amplitude", "currentScanAmplitude", "Scan Amplitude", FieldKind::Grouped),
    field("current_scan_center", "currentScanCenter", "Scan Center", FieldKind::Grouped),
    field("daq_gain", "daqGain", "DAQ Gain", FieldKind::Grouped),
    field("frame_period", "framePeriod", "Frame Period", FieldKind::Float),
    field("dwell_time", "dwellTime", "Dwell Time", FieldKind::Float),
    field("interlaced_scan_track_count", "interlacedScanTrackCount", "Interlaced Track Count", FieldKind::Integer),
    field("laser_power", "laserPower", "Laser Power", FieldKind::Grouped),
    field("lines_per_frame", "linesPerFrame", "Lines per Frame", FieldKind::Integer),
    field("max_voltage", "maxVoltage", "Max Voltage", FieldKind::Grouped),
    field("microns_per_pixel", "micronsPerPixel", "Microns per Pixel", FieldKind::Grouped),
    field("min_voltage", "minVoltage", "Min Voltage", FieldKind::Grouped),
    field("objective_lens", "objectiveLens", "Objective Lens", FieldKind::Text),
    field("objective_lens_mag", "objectiveLensMag", "Objective Magnification", FieldKind::Integer),
    field("objective_lens_na", "objectiveLensNA", "Objective NA", FieldKind::Float),
    field("optical_zoom", "opticalZoom", "Optical Zoom", FieldKind::Float),
    field("pixels_per_line", "pixelsPerLine", "Pixels per Line", FieldKind::Integer),
    field("pmt_gain", "pmtGain", "PMT Gain", FieldKind::Grouped),
    field("position_current", "positionCurrent", "Stage Position", FieldKind::Grouped),
    field("preamp_filter", "preampFilter", "Preamp Filter", FieldKind::Text),
    field("preamp_gain", "preampGain", "Preamp Gain", FieldKind::Grouped),
    field("preamp_offset", "preampOffset", "Preamp Offset", FieldKind::Grouped),
    field("rotation", "rotation", "Rotation", FieldKind::Integer),
    field("samples_per_pixel", "samplesPerPixel", "Samples per Pixel", FieldKind::Integer),
    field("scan_line_period", "scanLinePeriod", "Scan Line Period", FieldKind::Float),
    field("use_interlaced_scan_pattern", "useInterlacedScanPattern", "Interlaced Scan", FieldKind::Flag),
    field("x_y_stage_grid_index", "xYStageGridIndex", "Stage Grid Index", FieldKind::Integer),
    field("x_y_stage_grid_x_index", "xYStageGridXIndex", "Stage Grid X Index", FieldKind::Integer),
    field("x_y_stage_grid_y_index", "xYStageGridYIndex", "Stage Grid Y Index", FieldKind::Integer),
    field("y_aspect_expansion", "yAspectExpansion", "Y Aspect Expansion", FieldKind::Integer),
    field("z_device", "zDevice", "Z Device", FieldKind::Integer),
];

/// Look up a field by canonical name
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    IMAGING_FIELDS.iter().find(|spec| spec.name == name)
}

/// A raw `PVStateValue` before typing
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    /// Plain `value` attribute
    Scalar(String),
    /// Indexed or sub-indexed group
    Grouped(GroupedValue),
}

impl StateValue {
    fn shape(&self) -> &'static str {
        match self {
            StateValue::Scalar(_) => "scalar",
            StateValue::Grouped(g) if g.is_empty() => "empty group",
            StateValue::Grouped(_) => "grouped value",
        }
    }
}

/// Raw state values keyed by canonicalized source key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateValues {
    slots: HashMap<String, (String, StateValue)>,
}

impl StateValues {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Keys that canonicalize identically share one slot;
    /// the later insertion wins.
    pub fn insert(&mut self, key: &str, value: StateValue) {
        let canonical = canonicalize(key);
        if let Some((previous, _)) = self.slots.get(&canonical) {
            if previous != key {
                warn!("State value '{}' overrides '{}' ({})", key, previous, canonical);
            }
        }
        self.slots.insert(canonical, (key.to_string(), value));
    }

    /// Value for a source key, matched after canonicalization
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.slots.get(&canonicalize(key)).map(|(_, value)| value)
    }

    /// Number of distinct slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no values were collected
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Canonical keys of all slots
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

/// Per-acquisition imaging parameters from the `PVStateShard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingParameters {
    /// Scan mode (e.g. `Galvo`, `ResonantGalvo`)
    pub active_mode: String,
    /// Digitizer bit depth
    pub bit_depth: u32,
    /// Scan amplitude per axis
    pub current_scan_amplitude: GroupedValue,
    /// Scan center per axis
    pub current_scan_center: GroupedValue,
    /// DAQ gain per channel
    pub daq_gain: GroupedValue,
    /// Seconds per frame
    pub frame_period: f64,
    /// Pixel dwell time (µs)
    pub dwell_time: f64,
    /// Interlaced scan track count
    pub interlaced_scan_track_count: u32,
    /// Laser power per Pockels cell
    pub laser_power: GroupedValue,
    /// Lines per frame
    pub lines_per_frame: u32,
    /// Maximum scanner voltage per axis
    pub max_voltage: GroupedValue,
    /// Pixel size per axis
    pub microns_per_pixel: GroupedValue,
    /// Minimum scanner voltage per axis
    pub min_voltage: GroupedValue,
    /// Objective lens name
    pub objective_lens: String,
    /// Objective magnification
    pub objective_lens_mag: u32,
    /// Objective numerical aperture
    pub objective_lens_na: f64,
    /// Optical zoom
    pub optical_zoom: f64,
    /// Pixels per line
    pub pixels_per_line: u32,
    /// PMT gain per channel
    pub pmt_gain: GroupedValue,
    /// Stage position per axis/device
    pub position_current: GroupedValue,
    /// Preamp filter setting
    pub preamp_filter: String,
    /// Preamp gain per channel
    pub preamp_gain: GroupedValue,
    /// Preamp offset per channel
    pub preamp_offset: GroupedValue,
    /// Scan rotation
    pub rotation: i64,
    /// Samples per pixel
    pub samples_per_pixel: u32,
    /// Seconds per scan line
    pub scan_line_period: f64,
    /// Interlaced scanning enabled
    pub use_interlaced_scan_pattern: bool,
    /// Stage grid index
    pub x_y_stage_grid_index: i64,
    /// Stage grid X index
    pub x_y_stage_grid_x_index: i64,
    /// Stage grid Y index
    pub x_y_stage_grid_y_index: i64,
    /// Y aspect expansion
    pub y_aspect_expansion: i64,
    /// Z device index
    pub z_device: i64,
}

impl ImagingParameters {
    /// Build typed parameters from raw state values.
    ///
    /// Every field in [`IMAGING_FIELDS`] is required. Keys outside the table
    /// are ignored.
    pub fn from_state_values(values: &StateValues) -> Result<Self, PrairieViewError> {
        for key in values.keys() {
            if field_spec(key).is_none() {
                debug!("Ignoring unrecognized state value '{}'", key);
            }
        }

        let f = FieldReader { values };
        Ok(Self {
            active_mode: f.text("active_mode")?,
            bit_depth: f.integer("bit_depth")?,
            current_scan_amplitude: f.grouped("current_scan_amplitude")?,
            current_scan_center: f.grouped("current_scan_center")?,
            daq_gain: f.grouped("daq_gain")?,
            frame_period: f.float("frame_period")?,
            dwell_time: f.float("dwell_time")?,
            interlaced_scan_track_count: f.integer("interlaced_scan_track_count")?,
            laser_power: f.grouped("laser_power")?,
            lines_per_frame: f.integer("lines_per_frame")?,
            max_voltage: f.grouped("max_voltage")?,
            microns_per_pixel: f.grouped("microns_per_pixel")?,
            min_voltage: f.grouped("min_voltage")?,
            objective_lens: f.text("objective_lens")?,
            objective_lens_mag: f.integer("objective_lens_mag")?,
            objective_lens_na: f.float("objective_lens_na")?,
            optical_zoom: f.float("optical_zoom")?,
            pixels_per_line: f.integer("pixels_per_line")?,
            pmt_gain: f.grouped("pmt_gain")?,
            position_current: f.grouped("position_current")?,
            preamp_filter: f.text("preamp_filter")?,
            preamp_gain: f.grouped("preamp_gain")?,
            preamp_offset: f.grouped("preamp_offset")?,
            rotation: f.integer("rotation")?,
            samples_per_pixel: f.integer("samples_per_pixel")?,
            scan_line_period: f.float("scan_line_period")?,
            use_interlaced_scan_pattern: f.flag("use_interlaced_scan_pattern")?,
            x_y_stage_grid_index: f.integer("x_y_stage_grid_index")?,
            x_y_stage_grid_x_index: f.integer("x_y_stage_grid_x_index")?,
            x_y_stage_grid_y_index: f.integer("x_y_stage_grid_y_index")?,
            y_aspect_expansion: f.integer("y_aspect_expansion")?,
            z_device: f.integer("z_device")?,
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, PrairieViewError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, PrairieViewError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Typed access to [`StateValues`] through the field table
struct FieldReader<'a> {
    values: &'a StateValues,
}

impl FieldReader<'_> {
    fn raw(&self, name: &str, kind: FieldKind) -> Result<&StateValue, PrairieViewError> {
        let spec = field_spec(name)
            .filter(|spec| spec.kind == kind)
            .ok_or_else(|| PrairieViewError::MissingField(name.to_string()))?;
        self.values
            .get(spec.source_key)
            .ok_or_else(|| PrairieViewError::MissingField(name.to_string()))
    }

    fn scalar(&self, name: &str, kind: FieldKind) -> Result<&str, PrairieViewError> {
        match self.raw(name, kind)? {
            StateValue::Scalar(raw) => Ok(raw.as_str()),
            other => Err(mismatch(name, "scalar", other)),
        }
    }

    fn text(&self, name: &str) -> Result<String, PrairieViewError> {
        Ok(self.scalar(name, FieldKind::Text)?.to_string())
    }

    fn float(&self, name: &str) -> Result<f64, PrairieViewError> {
        let raw = self.scalar(name, FieldKind::Float)?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| malformed(name, raw))
    }

    fn integer<T: TryFrom<i64>>(&self, name: &str) -> Result<T, PrairieViewError> {
        let raw = self.scalar(name, FieldKind::Integer)?;
        parse_integer(raw)
            .and_then(|wide| T::try_from(wide).ok())
            .ok_or_else(|| malformed(name, raw))
    }

    fn flag(&self, name: &str) -> Result<bool, PrairieViewError> {
        let raw = self.scalar(name, FieldKind::Flag)?;
        parse_flag(raw).ok_or_else(|| malformed(name, raw))
    }

    fn grouped(&self, name: &str) -> Result<GroupedValue, PrairieViewError> {
        match self.raw(name, FieldKind::Grouped)? {
            StateValue::Grouped(group) if !group.is_empty() => Ok(group.clone()),
            other => Err(mismatch(name, "grouped value", other)),
        }
    }
}

fn mismatch(field: &str, expected: &'static str, found: &StateValue) -> PrairieViewError {
    PrairieViewError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.shape(),
    }
}

fn malformed(field: &str, raw: &str) -> PrairieViewError {
    PrairieViewError::MalformedValue {
        field: field.to_string(),
        value: raw.to_string(),
    }
}

/// Integers, or floats with no fractional part
fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64)
            .map(|v| v as i64)
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}
