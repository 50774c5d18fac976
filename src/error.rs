//! Error types for the PDF serialization engine.
//!
//! Errors fall into four groups, mirroring how they must be handled:
//! structural (caller contract violations, never recoverable), data
//! (recoverable by omission in lenient mode), resource (I/O, always
//! propagated), and incremental-update preconditions (raised before any
//! byte is written).

/// Result type alias for serialization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while writing a PDF file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An indirect object was written (or released) twice
    #[error("Indirect object {0} {1} R has already been written")]
    ObjectAlreadyWritten(u32, u16),

    /// A Begin/End pair was closed out of order, or never opened
    #[error("Unbalanced writer scope: expected {expected}, found {found}")]
    UnbalancedScope {
        /// Scope that had to be on top of the stack
        expected: &'static str,
        /// Scope actually found (or "nothing")
        found: &'static str,
    },

    /// An operation requires an open indirect object and none exists
    #[error("No indirect object is open in the document")]
    NoOpenObject,

    /// A stream was begun on an object that already carries one
    #[error("Indirect object {0} {1} R already has a content stream")]
    StreamExists(u32, u16),

    /// A stream operation targeted an object other than the current one
    #[error("Stream target {target} is not the current object {current}")]
    StreamTargetMismatch {
        /// Reference passed by the caller
        target: String,
        /// Reference of the object actually open
        current: String,
    },

    /// An artefact close did not match the entry on top of its stack
    #[error("Unbalanced artefact registration in collection '{0}'")]
    UnbalancedArtefact(String),

    /// A registered entry kind does not belong in the target collection
    #[error("Entry kind {kind} cannot be registered in collection '{collection}'")]
    InvalidArtefactEntry {
        /// Kind of the rejected entry
        kind: &'static str,
        /// Name of the collection it was offered to
        collection: String,
    },

    /// Two objects were registered under the same document-level name
    #[error("An object named '{0}' is already registered")]
    DuplicateObjectName(String),

    /// The assembly driver was driven out of its Open/Body/XRef/Trailer order
    #[error("Invalid document state: cannot {action} while {state}")]
    InvalidState {
        /// Operation that was attempted
        action: &'static str,
        /// Phase the driver was in
        state: &'static str,
    },

    /// A data value is not representable (fatal in strict mode only)
    #[error("Unsupported color space: {0}")]
    UnsupportedColorSpace(&'static str),

    /// A compression type has no registered filter
    #[error("Unsupported compression type: {0}")]
    UnsupportedCompression(String),

    /// Stream filtering failed
    #[error("Could not apply stream filters to object {0}: {1}")]
    FilterFailed(String, String),

    /// The original file has no document catalog
    #[error("The original file has no document catalog; it cannot be updated")]
    MissingCatalog,

    /// The original file's catalog has no page tree
    #[error("The original file's catalog has no /Pages entry; it cannot be updated")]
    MissingPageTree,

    /// The original file's structure could not be read
    #[error("Failed to parse the original file at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where parsing failed
        offset: usize,
        /// Reason for the failure
        reason: String,
    },

    /// The original file uses a structure this engine cannot append to
    #[error("Unsupported original file structure: {0}")]
    UnsupportedStructure(String),

    /// IO error on the underlying sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for data errors that lenient mode may degrade instead of
    /// aborting generation. Structural and resource errors never qualify.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedColorSpace(_) | Error::UnsupportedCompression(_)
        )
    }
}
