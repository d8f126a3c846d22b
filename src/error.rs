//! Crate-level error type.

use thiserror::Error;

use crate::expression::error::ExpressionError;
use crate::resolve::error::ResolveError;
use crate::sbml::error::SbmlError;

/// Any fatal error a conversion can raise.
///
/// Fatal means the current conversion stops; recoverable issues travel on the
/// diagnostics channel instead and never surface here.
#[derive(Debug, Error)]
pub enum TabQualError {
    /// A rule failed to tokenize, parse, or survive the MathML codec.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A species reference could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The SBML boundary rejected a transition.
    #[error(transparent)]
    Sbml(#[from] SbmlError),
}
