//! Error type for species reference resolution.

use thiserror::Error;

/// Raised when a species reference cannot be matched against the model.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The token matched neither an ID nor a Name, even after cleaning.
    #[error("{context}: species reference '{token}' not found as an ID or Name")]
    ReferenceNotFound {
        /// The token as it appeared in the cell.
        token: String,
        /// Where the token was encountered, for the error message.
        context: String,
    },
}
