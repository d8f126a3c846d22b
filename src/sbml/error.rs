//! Error type for the SBML-qual boundary.

use thiserror::Error;

use crate::expression::error::ExpressionError;

/// Fatal failures while building or decomposing SBML-qual transitions.
///
/// Each variant carries the target species so the caller can point at the
/// offending transition; recoverable issues go through the diagnostics
/// channel instead.
#[derive(Debug, Error)]
pub enum SbmlError {
    /// A transition rule failed to parse on the write path.
    #[error("transition for target '{target}': rule '{rule}' failed to parse: {source}")]
    InvalidRule {
        target: String,
        rule: String,
        #[source]
        source: ExpressionError,
    },

    /// A function term's MathML could not be decoded on the read path.
    #[error("transition for target '{target}': invalid MathML: {source}")]
    InvalidMathMl {
        target: String,
        #[source]
        source: ExpressionError,
    },
}
