//! # XML Element Tree
//!
//! Instrument exports such as PrairieView's `.xml` sidecar files are small
//! enough to hold in memory, and their meaning depends on parent/child
//! relationships (a `PVStateValue` owning `IndexedValue`s, a `Frame` owning
//! `File`s). This module pull-parses a document with quick-xml and folds the
//! event stream into an owned tree with simple navigation helpers.

mod element;
mod error;
mod parser;

#[cfg(test)]
mod tests;

pub use element::XmlElement;
pub use error::XmlTreeError;
pub use parser::{parse_file, parse_reader, parse_str, MAX_DEPTH};
