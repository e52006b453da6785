/// Errors that can occur while reading MAT files
#[derive(Debug, thiserror::Error)]
pub enum MatError {
    /// I/O error reading the file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The 128-byte header is missing or not a Level 5 header
    #[error("Invalid MAT header: {0}")]
    InvalidHeader(String),

    /// A valid MAT construct this reader does not handle
    #[error("Unsupported MAT content: {0}")]
    Unsupported(String),

    /// Malformed data element
    #[error("Invalid MAT format: {0}")]
    InvalidFormat(String),

    /// Requested variable is not in the file
    #[error("Variable not found: {0}")]
    MissingVariable(String),

    /// The arrays are well-formed but not nested the way the caller expects
    #[error("Unexpected layout at {path}: {reason}")]
    UnexpectedLayout {
        /// Location within the variable, e.g. `scan_data.planes{2,1}`
        path: String,
        /// What was expected there
        reason: String,
    },

    /// A value has the right shape but an unusable content
    #[error("Invalid value for '{field}': {value}")]
    InvalidValue {
        /// Field being converted
        field: String,
        /// Offending value
        value: f64,
    },
}
