//! Error types for patch application.

use thiserror::Error;

/// Result alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors raised while applying a patch sequence to a JSON tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The pointer was neither empty nor started with `/`.
    #[error("invalid JSON pointer '{pointer}'")]
    InvalidPointer {
        /// Offending pointer text.
        pointer: String,
    },
    /// A path segment did not resolve against the target document.
    #[error("path '{pointer}' does not exist in the target document")]
    MissingPath {
        /// Pointer that failed to resolve.
        pointer: String,
    },
    /// An array index was malformed or out of bounds.
    #[error("invalid array index '{index}' in '{pointer}'")]
    InvalidIndex {
        /// Pointer containing the index.
        pointer: String,
        /// Segment that failed to parse or was out of range.
        index: String,
    },
    /// The parent of the target path is a scalar.
    #[error("cannot address a child of a scalar value at '{pointer}'")]
    ScalarParent {
        /// Pointer whose parent is not a container.
        pointer: String,
    },
}
