/// Errors that can occur while building an XML element tree
#[derive(Debug, thiserror::Error)]
pub enum XmlTreeError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// UTF-8 encoding error in an element name
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Invalid document structure (no root, unclosed elements, ...)
    #[error("Invalid XML structure: {0}")]
    InvalidStructure(String),
}
