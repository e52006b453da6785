use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::frames::FrameTimeMatrix;
use super::imaging::ImagingParameters;
use super::PrairieViewError;

/// Layout of the `date` attribute written by PrairieView
pub const SESSION_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Acquisition session, from the root element's attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// PrairieView software version
    pub version: String,

    /// Acquisition date as written by the instrument
    pub date: String,

    /// Free-text operator notes
    pub notes: Option<String>,
}

impl Session {
    /// Parse `date` into a timestamp, if it follows the PrairieView layout
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.date.trim(), SESSION_DATE_FORMAT).ok()
    }
}

/// A named identity nested under `SystemIDs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSystemId {
    /// Identifier value
    pub id: String,

    /// Optional `Description` attribute
    pub description: Option<String>,
}

/// Microscope system identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemIdentity {
    /// Resolved serial identifier (the last `SystemID` in document order)
    pub serial_id: String,

    /// Nested identities, in document order
    #[serde(default)]
    pub sub_identities: Vec<SubSystemId>,
}

/// Plane/channel counts and per-frame timing of the acquired sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceTiming {
    /// Plane-level elements under the first frame
    pub num_planes: usize,

    /// `File` references under the first frame
    pub num_channels: usize,

    /// `relativeTime` of every frame (rows = sequences)
    pub relative_frame_times: FrameTimeMatrix,

    /// `absoluteTime` of every frame (rows = sequences)
    pub absolute_frame_times: FrameTimeMatrix,
}

/// Everything extracted from one PrairieView XML export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrairieViewMeta {
    /// Session attributes
    pub session: Session,

    /// System identity
    pub system_id: SystemIdentity,

    /// Imaging parameters; absent in session-only exports
    pub imaging: Option<ImagingParameters>,

    /// Sequence timing; absent when no sequence was acquired
    pub sequence: Option<SequenceTiming>,
}

impl PrairieViewMeta {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, PrairieViewError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, PrairieViewError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, PrairieViewError> {
        Ok(serde_json::from_str(json)?)
    }
}
