//! # MAT-file Module
//!
//! Reader for MATLAB Level 5 MAT files, the format the SLM control software
//! saves its scan descriptions in.
//!
//! ## Supported Content
//!
//! | Construct | Support |
//! |-----------|---------|
//! | Little- and big-endian files | yes |
//! | `miCOMPRESSED` (zlib) variables | yes |
//! | Numeric and logical arrays | real part, widened to `f64` |
//! | Char arrays | yes |
//! | Cell and struct arrays | yes, nested to any depth |
//! | Sparse, object and function arrays | [`MatError::Unsupported`] |
//! | v7.3 (HDF5) files | [`MatError::Unsupported`] |
//!
//! ## Example
//!
//! ```rust,no_run
//! use prairie_meta::mat::MatFile;
//!
//! let mat = MatFile::open("slm_scan.mat")?;
//! for name in mat.variable_names() {
//!     println!("{}: {:?}", name, mat.get(name).map(|v| v.dims()));
//! }
//! # Ok::<(), prairie_meta::mat::MatError>(())
//! ```

mod array;
mod error;
pub mod reader;


use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;

pub use array::{MatArray, MatClass};
pub use error::MatError;
pub use reader::{Endianness, MatHeader};

/// A decoded MAT file: header plus top-level variables in file order
#[derive(Debug, Clone, PartialEq)]
pub struct MatFile {
    header: MatHeader,
    variables: Vec<(String, MatArray)>,
}

impl MatFile {
    /// Read and decode a MAT file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MatError> {
        let path = path.as_ref();
        info!("Reading MAT file {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Decode a MAT file from any reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, MatError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a MAT file held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MatError> {
        let (header, variables) = reader::read_mat(bytes)?;
        Ok(Self { header, variables })
    }

    /// The decoded header
    pub fn header(&self) -> &MatHeader {
        &self.header
    }

    /// Look up a top-level variable by name
    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.variables
            .iter()
            .find(|(variable, _)| variable == name)
            .map(|(_, array)| array)
    }

    /// Look up a variable that must be present
    pub fn require(&self, name: &str) -> Result<&MatArray, MatError> {
        self.get(name)
            .ok_or_else(|| MatError::MissingVariable(name.to_string()))
    }

    /// Variable names in file order
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(name, _)| name.as_str())
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the file holds no variables
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
