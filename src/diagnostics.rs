//! Warnings-as-data channel for conversions.
//!
//! Every non-fatal decision made during a conversion (identifier generation,
//! duplicate renaming, resolution-mode switches, reference cleaning, blank-rule
//! substitution) is recorded as a [`Diagnostic`] in the order it happened and
//! returned to the caller alongside the converted output. The crate performs no
//! I/O of its own; callers decide how to present the list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational message, e.g. a reference that was cleaned and found.
    Info,
    /// Recoverable problem the conversion worked around.
    Warning,
}

/// A single non-fatal message produced during a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the message.
    pub severity: Severity,
    /// Human-readable description with enough context to locate the source row.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Ordered collector of diagnostics for one conversion call.
///
/// Passed by mutable reference through the resolver, parser callers, and the
/// transition grouper so that every decision lands in one list, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational message.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            message,
        });
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    /// Appends all entries of `other`, preserving their order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Renders every entry as a plain string, in recording order.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
