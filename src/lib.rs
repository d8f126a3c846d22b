//! TabQual Rust Library
//!
//! This library converts between a tabular spreadsheet representation of
//! qualitative (Boolean / multi-valued) regulatory models and SBML-qual,
//! including:
//! - Parsing the transition-rule mini-language into an AST
//! - Translating rules to and from SBML MathML content
//! - Resolving species references by ID or Name with adaptive fallback
//! - Grouping per-level rule rows into multi-level SBML transitions
//! - Rewriting rules between operator and colon notation
//!
//! Cell I/O and the SBML document API are external collaborators: the crate
//! consumes pre-extracted row maps and lightweight qual node structs, and
//! reports every recoverable decision on an ordered diagnostics list.

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::convert::{sbml_to_spreadsheet, spreadsheet_to_sbml, RuleNotation, SheetOptions};
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
    pub use crate::error::TabQualError;
    pub use crate::expression::ast::{CmpOp, Expr};
    pub use crate::expression::parser::parse;
    pub use crate::model::{
        InteractionEvidence, ModelInfo, QualModel, Sign, Species, SpeciesType, Transition,
    };
    pub use crate::rows::{Row, SheetRows};
    pub use crate::sbml::qual::QualDocument;
}

/// Spreadsheet vocabulary: sheet/column names and controlled value sets
pub mod schema;

/// The in-memory model both conversion directions pivot through
pub mod model;

/// Row-map boundary with the external spreadsheet reader
pub mod rows;

/// Ordered warnings-as-data channel returned from every conversion
pub mod diagnostics;

/// End-to-end conversion pipelines
pub mod convert;

/// Crate-level error type
pub mod error;

/// The transition-rule expression language
pub mod expression {
    /// Tagged-union rule AST, evaluation and rendering
    pub mod ast;
    /// Error taxonomy for parsing and the MathML codec
    pub mod error;
    /// AST to MathML content translation and back
    pub mod mathml;
    /// Tokenizer and recursive-descent parser
    pub mod parser;
    /// Operator to colon notation rewrite
    pub mod transcode;
}

/// Species reference resolution (ID / Name vocabularies)
pub mod resolve {
    /// Per-model lookup tables and the canonical display form
    pub mod context;
    /// Error type for unresolvable references
    pub mod error;
    /// Adaptive single-token and rule-level resolution
    pub mod resolver;
}

/// SBML-qual boundary nodes and the multi-level transition grouper
pub mod sbml {
    /// Error type for the SBML boundary
    pub mod error;
    /// Lightweight qual node shapes
    pub mod qual;
    /// Decomposition of transitions into per-level records
    pub mod reader;
    /// Assembly of per-level records into transitions
    pub mod writer;
}
