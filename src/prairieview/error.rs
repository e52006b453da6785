use crate::xml::XmlTreeError;

/// Errors that can occur while extracting PrairieView metadata
#[derive(Debug, thiserror::Error)]
pub enum PrairieViewError {
    /// The XML document could not be read or parsed
    #[error("XML error: {0}")]
    XmlError(#[from] XmlTreeError),

    /// An element carries none of `description`, `subindex` or `index`
    #[error("No descriptive attribute (description, subindex or index) on <{tag}>")]
    MissingDescriptor {
        /// Tag of the offending element
        tag: String,
    },

    /// Required XML attribute is missing
    #[error("Missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Tag of the offending element
        element: String,
        /// Name of the absent attribute
        attribute: String,
    },

    /// A value is present but cannot be converted to the field's type
    #[error("Malformed value for '{field}': {value:?}")]
    MalformedValue {
        /// Field (or `group.field`) being converted
        field: String,
        /// Raw source text
        value: String,
    },

    /// A grouped field received a scalar, or a scalar field received a group
    #[error("Type mismatch for '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Canonical field name
        field: String,
        /// Expected shape
        expected: &'static str,
        /// Shape actually found in the source
        found: &'static str,
    },

    /// Frame-time rows are not of uniform length
    #[error("Frame-time row {row} has {found} frames, expected {expected}")]
    ShapeMismatch {
        /// Index of the first non-conforming row
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        found: usize,
    },

    /// A structurally required element is absent
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// A required record field has no source value
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Unrecognized section selector
    #[error("Unknown metadata section: {0}")]
    UnknownSection(String),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
