use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for disc image operations
pub type Result<T> = std::result::Result<T, DiscError>;

/// Errors that can occur while planning or writing a disc image
#[derive(Debug, Error)]
pub enum DiscError {
    /// I/O error occurred while reading a source file or writing the image
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input directory could not be enumerated
    #[error("Cannot enumerate {path}: {reason}")]
    Enumeration {
        /// Input path that was being enumerated
        path: PathBuf,
        /// Why enumeration failed
        reason: String,
    },

    /// A structure does not fit in the sectors reserved for it
    #[error("Structural overflow: {what} needs {needed} sectors (limit: {limit})")]
    StructuralOverflow {
        /// Structure that overflowed
        what: String,
        /// Sectors the structure would need
        needed: u32,
        /// Sectors available for it
        limit: u32,
    },

    /// Name cannot be encoded in a directory record or file identifier
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Volume identifier cannot be written into the ISO9660 descriptor
    #[error("Invalid {field} identifier: {value}")]
    InvalidIdentifier {
        /// Descriptor field
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// File does not fit in the 32-bit data length fields
    #[error("File too large: {name} ({size} bytes)")]
    FileTooLarge {
        /// File name
        name: String,
        /// File size in bytes
        size: u64,
    },

    /// Tree was built incorrectly
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// Source file changed size after enumeration
    #[error("Source file {path} is shorter than the {expected} bytes planned for it")]
    SizeMismatch {
        /// Source file path
        path: PathBuf,
        /// Size recorded at enumeration time
        expected: u64,
    },
}

impl DiscError {
    /// Create an enumeration error with context
    pub fn enumeration<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        DiscError::Enumeration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a structural overflow error
    pub fn overflow<S: Into<String>>(what: S, needed: u32, limit: u32) -> Self {
        DiscError::StructuralOverflow {
            what: what.into(),
            needed,
            limit,
        }
    }

    /// Create an invalid tree error
    pub fn invalid_tree<S: Into<String>>(message: S) -> Self {
        DiscError::InvalidTree(message.into())
    }
}
