use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use super::frames::{collect_frame_times, FrameTimeMatrix, TimingAttribute};
use super::grouped::{extract_indexed, extract_subindexed};
use super::imaging::{ImagingParameters, StateValue, StateValues};
use super::models::{PrairieViewMeta, SequenceTiming, Session, SubSystemId, SystemIdentity};
use super::PrairieViewError;
use crate::xml::XmlElement;

/// Children of a `Frame` that describe the frame itself rather than a plane
const FRAME_BOOKKEEPING_TAGS: [&str; 3] = ["File", "ExtraParameters", "PVStateShard"];

/// Which part of a PrairieView export to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    /// Root attributes only
    Session,
    /// `SystemIDs`
    SystemIdentity,
    /// `PVStateShard`
    ImagingParameters,
    /// `Sequence` elements
    SequenceTiming,
    /// Everything, as a [`PrairieViewMeta`]
    #[default]
    All,
}

impl Section {
    /// Selector name accepted by [`FromStr`]
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Session => "session",
            Section::SystemIdentity => "system_id",
            Section::ImagingParameters => "imaging_meta",
            Section::SequenceTiming => "sequence_meta",
            Section::All => "all",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = PrairieViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Section::Session),
            "system_id" | "systemidentity" | "system_identity" => Ok(Section::SystemIdentity),
            "imaging_meta" | "imagingparameters" | "imaging_parameters" => {
                Ok(Section::ImagingParameters)
            }
            "sequence_meta" | "sequencetiming" | "sequence_timing" => Ok(Section::SequenceTiming),
            "all" | "full" | "" => Ok(Section::All),
            _ => Err(PrairieViewError::UnknownSection(s.to_string())),
        }
    }
}

/// Result of extracting one [`Section`]
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum MetadataSection {
    /// Session attributes
    Session(Session),
    /// System identity
    SystemIdentity(SystemIdentity),
    /// Imaging parameters, `None` for session-only exports
    ImagingParameters(Option<ImagingParameters>),
    /// Sequence timing, `None` when no sequence was acquired
    SequenceTiming(Option<SequenceTiming>),
    /// Fully assembled record
    Full(PrairieViewMeta),
}

impl MetadataSection {
    /// The fully assembled record, if that is what was extracted
    pub fn into_full(self) -> Option<PrairieViewMeta> {
        match self {
            MetadataSection::Full(meta) => Some(meta),
            _ => None,
        }
    }

    /// The session, taken from either a session or a full extraction
    pub fn into_session(self) -> Option<Session> {
        match self {
            MetadataSection::Session(session) => Some(session),
            MetadataSection::Full(meta) => Some(meta.session),
            _ => None,
        }
    }

    /// The system identity, taken from either its section or a full extraction
    pub fn into_system_identity(self) -> Option<SystemIdentity> {
        match self {
            MetadataSection::SystemIdentity(id) => Some(id),
            MetadataSection::Full(meta) => Some(meta.system_id),
            _ => None,
        }
    }

    /// The imaging parameters, taken from either their section or a full extraction
    pub fn into_imaging_parameters(self) -> Option<ImagingParameters> {
        match self {
            MetadataSection::ImagingParameters(imaging) => imaging,
            MetadataSection::Full(meta) => meta.imaging,
            _ => None,
        }
    }

    /// The sequence timing, taken from either its section or a full extraction
    pub fn into_sequence_timing(self) -> Option<SequenceTiming> {
        match self {
            MetadataSection::SequenceTiming(sequence) => sequence,
            MetadataSection::Full(meta) => meta.sequence,
            _ => None,
        }
    }
}

/// Extract the requested section from a parsed document root
pub fn extract_section(
    root: &XmlElement,
    section: Section,
) -> Result<MetadataSection, PrairieViewError> {
    debug!("Extracting {} from <{}>", section, root.name());
    Ok(match section {
        Section::Session => MetadataSection::Session(session_from_root(root)?),
        Section::SystemIdentity => MetadataSection::SystemIdentity(system_identity_from_root(root)?),
        Section::ImagingParameters => {
            MetadataSection::ImagingParameters(imaging_parameters_from_root(root)?)
        }
        Section::SequenceTiming => MetadataSection::SequenceTiming(sequence_timing_from_root(root)?),
        Section::All => MetadataSection::Full(assemble(root)?),
    })
}

/// Assemble every section into one record
pub fn assemble(root: &XmlElement) -> Result<PrairieViewMeta, PrairieViewError> {
    Ok(PrairieViewMeta {
        session: session_from_root(root)?,
        system_id: system_identity_from_root(root)?,
        imaging: imaging_parameters_from_root(root)?,
        sequence: sequence_timing_from_root(root)?,
    })
}

/// Session from the root element's attributes. Unrecognized attributes are
/// ignored.
pub fn session_from_root(root: &XmlElement) -> Result<Session, PrairieViewError> {
    let required = |key: &str| {
        root.attribute(key)
            .map(str::to_string)
            .ok_or_else(|| PrairieViewError::MissingField(key.to_string()))
    };
    Ok(Session {
        version: required("version")?,
        date: required("date")?,
        notes: root.attribute("notes").map(str::to_string),
    })
}

/// System identity from the `SystemIDs` element.
///
/// The element's own `SystemID` and those of its `SystemID` children share
/// one slot; the last one present in document order is the serial id.
pub fn system_identity_from_root(root: &XmlElement) -> Result<SystemIdentity, PrairieViewError> {
    let ids = root
        .find("SystemIDs")
        .ok_or_else(|| PrairieViewError::MissingElement("SystemIDs".to_string()))?;

    let mut serial_id = ids.attribute("SystemID");
    let mut sub_identities = Vec::new();
    for child in ids.find_all("SystemID") {
        match child.attribute("SystemID") {
            Some(id) => {
                serial_id = Some(id);
                sub_identities.push(SubSystemId {
                    id: id.to_string(),
                    description: child.attribute("Description").map(str::to_string),
                });
            }
            None => warn!("<SystemID> without a SystemID attribute ignored"),
        }
    }

    Ok(SystemIdentity {
        serial_id: serial_id
            .map(str::to_string)
            .ok_or_else(|| PrairieViewError::MissingField("SystemID".to_string()))?,
        sub_identities,
    })
}

/// Collect the raw `PVStateValue`s under a `PVStateShard`
pub fn collect_state_values(shard: &XmlElement) -> Result<StateValues, PrairieViewError> {
    let mut values = StateValues::new();
    for element in shard.find_all("PVStateValue") {
        let key = element.attribute("key").unwrap_or(element.name());
        let subindexed: Vec<_> = element.find_all("SubindexedValues").collect();
        let indexed: Vec<_> = element.find_all("IndexedValue").collect();

        if !subindexed.is_empty() {
            values.insert(key, StateValue::Grouped(extract_subindexed(element, subindexed)?));
        } else if !indexed.is_empty() {
            values.insert(key, StateValue::Grouped(extract_indexed(element, indexed)?));
        } else if let Some(value) = element.attribute("value") {
            values.insert(key, StateValue::Scalar(value.to_string()));
        } else {
            debug!("PVStateValue '{}' carries no value", key);
        }
    }
    Ok(values)
}

/// Imaging parameters from the root's `PVStateShard`.
///
/// Returns `None` when the shard is absent or holds no values.
pub fn imaging_parameters_from_root(
    root: &XmlElement,
) -> Result<Option<ImagingParameters>, PrairieViewError> {
    let Some(shard) = root.find("PVStateShard") else {
        debug!("No PVStateShard; imaging parameters unavailable");
        return Ok(None);
    };
    let values = collect_state_values(shard)?;
    if values.is_empty() {
        return Ok(None);
    }
    ImagingParameters::from_state_values(&values).map(Some)
}

/// Plane and channel counts of a frame: `(num_planes, num_channels)`
pub fn frame_plane_channel_counts(frame: &XmlElement) -> (usize, usize) {
    let num_channels = frame.count("File");
    let num_planes = frame
        .children()
        .iter()
        .filter(|child| !FRAME_BOOKKEEPING_TAGS.contains(&child.name()))
        .count();
    (num_planes, num_channels)
}

/// Frames in the first sequence and `File`s in its first frame
pub fn sequence_frame_counts(root: &XmlElement) -> Result<(usize, usize), PrairieViewError> {
    let sequence = root
        .find("Sequence")
        .ok_or_else(|| PrairieViewError::MissingElement("Sequence".to_string()))?;
    let first_frame = sequence
        .find("Frame")
        .ok_or_else(|| PrairieViewError::MissingElement("Frame".to_string()))?;
    Ok((sequence.count("Frame"), first_frame.count("File")))
}

/// Sequence timing from every `Sequence` under the root.
///
/// Plane and channel counts come from the first frame of the first sequence;
/// each sequence contributes one row of frame times. Returns `None` when no
/// sequence was acquired.
pub fn sequence_timing_from_root(
    root: &XmlElement,
) -> Result<Option<SequenceTiming>, PrairieViewError> {
    let sequences: Vec<&XmlElement> = root.find_all("Sequence").collect();
    let Some(first) = sequences.first() else {
        debug!("No Sequence; sequence timing unavailable");
        return Ok(None);
    };
    let first_frame = first
        .find("Frame")
        .ok_or_else(|| PrairieViewError::MissingElement("Frame".to_string()))?;
    let (num_planes, num_channels) = frame_plane_channel_counts(first_frame);

    let rows = |timing: TimingAttribute| -> Result<FrameTimeMatrix, PrairieViewError> {
        let rows = sequences
            .iter()
            .map(|sequence| collect_frame_times(sequence, timing))
            .collect::<Result<Vec<_>, _>>()?;
        FrameTimeMatrix::from_rows(rows)
    };
    let relative_frame_times = rows(TimingAttribute::Relative)?;
    let absolute_frame_times = rows(TimingAttribute::Absolute)?;

    debug!(
        "{} sequence(s), {} plane(s), {} channel(s), {:?} frame times",
        sequences.len(),
        num_planes,
        num_channels,
        relative_frame_times.shape()
    );

    Ok(Some(SequenceTiming {
        num_planes,
        num_channels,
        relative_frame_times,
        absolute_frame_times,
    }))
}
