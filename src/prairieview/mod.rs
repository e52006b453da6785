//! # PrairieView Metadata Module
//!
//! Extraction of typed records from the XML file Bruker PrairieView writes
//! next to every acquisition.
//!
//! ## PrairieView XML Structure
//!
//! ```text
//! PVScan (version, date, notes)
//! ├── SystemIDs (SystemID)
//! │   └── SystemID* (SystemID, Description)
//! ├── PVStateShard
//! │   └── PVStateValue* (key, value)
//! │       ├── IndexedValue* (index, value, description)
//! │       └── SubindexedValues* (index)
//! │           └── SubindexedValue* (subindex, value, description)
//! └── Sequence* (type, cycle)
//!     └── Frame* (relativeTime, absoluteTime, index)
//!         ├── File* (channel, channelName, filename)
//!         ├── ExtraParameters
//!         └── PVStateShard
//! ```
//!
//! ## Sections
//!
//! | Section | Source | Record |
//! |---------|--------|--------|
//! | session | `PVScan` attributes | [`Session`] |
//! | system identity | `SystemIDs` | [`SystemIdentity`] |
//! | imaging parameters | `PVStateShard` | [`ImagingParameters`] (optional) |
//! | sequence timing | `Sequence`/`Frame` | [`SequenceTiming`] (optional) |
//!
//! ## Example
//!
//! ```rust,no_run
//! use prairie_meta::prairieview::{load_metadata, Section};
//!
//! let meta = load_metadata("TSeries-001.xml", Section::All)?
//!     .into_full()
//!     .expect("full extraction");
//! if let Some(imaging) = &meta.imaging {
//!     println!("{} @ {}x", imaging.objective_lens, imaging.optical_zoom);
//! }
//! # Ok::<(), prairie_meta::prairieview::PrairieViewError>(())
//! ```

mod assembler;
mod error;
mod frames;
mod grouped;
mod imaging;
mod models;
mod names;


use std::path::Path;

use log::info;

pub use assembler::{
    assemble, collect_state_values, extract_section, frame_plane_channel_counts,
    imaging_parameters_from_root, sequence_frame_counts, sequence_timing_from_root,
    session_from_root, system_identity_from_root, MetadataSection, Section,
};
pub use error::PrairieViewError;
pub use frames::{collect_frame_times, FrameTimeMatrix, TimingAttribute};
pub use grouped::{extract_indexed, extract_subindexed, GroupedValue, NamedValue, ANONYMOUS_GROUP};
pub use imaging::{
    field_spec, FieldKind, FieldSpec, ImagingParameters, StateValue, StateValues, IMAGING_FIELDS,
};
pub use models::{
    PrairieViewMeta, SequenceTiming, Session, SubSystemId, SystemIdentity, SESSION_DATE_FORMAT,
};
pub use names::{canonicalize, resolve_field_name};

use crate::xml;

/// Load one section, or the full record, from a PrairieView XML file.
///
/// The file is parsed once per call; nothing is cached between calls.
pub fn load_metadata<P: AsRef<Path>>(
    path: P,
    section: Section,
) -> Result<MetadataSection, PrairieViewError> {
    let path = path.as_ref();
    info!("Loading PrairieView {} from {}", section, path.display());
    let root = xml::parse_file(path)?;
    extract_section(&root, section)
}

/// Same as [`load_metadata`] for an in-memory document
pub fn parse_metadata_str(xml: &str, section: Section) -> Result<MetadataSection, PrairieViewError> {
    let root = xml::parse_str(xml)?;
    extract_section(&root, section)
}

/// Load the fully assembled record
pub fn load_full_metadata<P: AsRef<Path>>(path: P) -> Result<PrairieViewMeta, PrairieViewError> {
    let root = xml::parse_file(path)?;
    assemble(&root)
}

/// Load only the session attributes
pub fn load_session<P: AsRef<Path>>(path: P) -> Result<Session, PrairieViewError> {
    session_from_root(&xml::parse_file(path)?)
}

/// Load only the system identity
pub fn load_system_identity<P: AsRef<Path>>(path: P) -> Result<SystemIdentity, PrairieViewError> {
    system_identity_from_root(&xml::parse_file(path)?)
}

/// Load only the imaging parameters
pub fn load_imaging_parameters<P: AsRef<Path>>(
    path: P,
) -> Result<Option<ImagingParameters>, PrairieViewError> {
    imaging_parameters_from_root(&xml::parse_file(path)?)
}

/// Load only the sequence timing
pub fn load_sequence_timing<P: AsRef<Path>>(
    path: P,
) -> Result<Option<SequenceTiming>, PrairieViewError> {
    sequence_timing_from_root(&xml::parse_file(path)?)
}
