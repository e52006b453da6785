//! # prairie-meta - Two-Photon Acquisition Metadata
//!
//! `prairie-meta` turns the metadata files written during a two-photon imaging
//! session into typed, serializable records:
//!
//! - the XML export Bruker PrairieView saves next to every acquisition
//!   (session, system identity, imaging parameters, sequence timing), and
//! - the MAT file a multiplane SLM scan saves its per-plane targeting
//!   parameters in.
//!
//! ## Key Features
//!
//! - **Case-insensitive field resolution**: `micronsPerPixel`,
//!   `MicronsPerPixel` and `microns-per-pixel` all land in `microns_per_pixel`.
//!
//! - **Per-file group arity**: indexed and sub-indexed values keep however many
//!   positions the file has, in document order, under resolved names.
//!
//! - **Strict typing**: a missing required field, a malformed number, or a
//!   scalar where a group belongs is an error naming the field. Nothing is
//!   silently defaulted.
//!
//! - **Self-contained MAT reader**: Level 5 files, both byte orders, zlib
//!   compressed variables, nested cell and struct arrays.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prairie_meta::{load_metadata, load_plane_metadata, Section};
//!
//! let meta = load_metadata("TSeries-06292021-001.xml", Section::All)?
//!     .into_full()
//!     .expect("full extraction");
//! println!("PrairieView {}", meta.session.version);
//!
//! if let Some(sequence) = &meta.sequence {
//!     println!(
//!         "{} plane(s), {} channel(s), {:?} frames",
//!         sequence.num_planes,
//!         sequence.num_channels,
//!         sequence.relative_frame_times.shape()
//!     );
//! }
//!
//! for (position, plane) in load_plane_metadata("slm_scan.mat")? {
//!     println!("plane {}: z = {}", position, plane.z);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`xml`]: owned element tree built with `quick-xml`
//! - [`prairieview`]: name resolution, grouped values, frame times, section
//!   assembly and the file-level facade
//! - [`mat`]: MATLAB Level 5 reader
//! - [`planes`]: plane records from `scan_data.planes`
//! - [`summary`]: field-of-view and roadmap values derived from records
//! - [`config`]: TOML settings for the summaries

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod mat;
pub mod planes;
pub mod prairieview;
pub mod summary;
pub mod xml;

pub use planes::{load_plane_metadata, PlaneRecord};
pub use prairieview::{load_metadata, MetadataSection, PrairieViewMeta, Section};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, FrameRateCorrection, SummaryConfig};
    pub use crate::mat::{MatArray, MatError, MatFile};
    pub use crate::planes::{load_plane_metadata, plane_metadata_from_mat, PlaneRecord};
    pub use crate::prairieview::{
        load_full_metadata, load_metadata, parse_metadata_str, GroupedValue, ImagingParameters,
        MetadataSection, PrairieViewError, PrairieViewMeta, Section, SequenceTiming, Session,
        SystemIdentity,
    };
    pub use crate::summary::{relative_position, FieldOfView, SummaryError};
}
