//! Lightweight SBML-qual node shapes.
//!
//! The boundary with the external SBML document API: these structs mirror the
//! qual-package nodes one-to-one, carry MathML as opaque text, and hold
//! annotations as `(relation, identifier)` pairs for the external RDF layer.
//! The grouper in [`crate::sbml::writer`] and [`crate::sbml::reader`]
//! translates between them and the flat per-level [`crate::model::Transition`]
//! records.

use derive_builder::Builder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Sign;

/// One `qual:qualitativeSpecies` node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct QualitativeSpecies {
    /// SId of the species.
    #[builder(setter(into))]
    pub id: String,

    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    /// Compartment the species is assigned to.
    #[builder(setter(into))]
    pub compartment: String,

    /// Whether the species level is fixed.
    #[builder(default)]
    pub constant: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub initial_level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub max_level: Option<u32>,

    /// Opaque `(relation, identifier)` annotation pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub annotations: Vec<(String, String)>,

    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

/// One `qual:input` edge of a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct TransitionInput {
    /// Species this edge reads.
    #[builder(setter(into))]
    pub qualitative_species: String,

    /// Sign of the regulation, when evidence provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub sign: Option<Sign>,

    /// Opaque `(relation, identifier)` annotation pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub annotations: Vec<(String, String)>,

    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

/// One `qual:output` edge of a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct TransitionOutput {
    /// Species this transition assigns a level to.
    #[builder(setter(into))]
    pub qualitative_species: String,
}

/// One `qual:functionTerm`: a condition and the level it assigns.
///
/// `math` holds the complete `<math>` element as text; the default term of a
/// transition is represented separately by
/// [`SbmlTransition::default_term_level`], not as a `FunctionTerm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct FunctionTerm {
    /// Level assigned when the condition holds.
    pub result_level: u32,

    /// MathML document text of the condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub math: Option<String>,
}

/// One `qual:transition` node: one output species, a family of function
/// terms, and the inputs their conditions read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct SbmlTransition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_inputs")))]
    pub inputs: Vec<TransitionInput>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_outputs")))]
    pub outputs: Vec<TransitionOutput>,

    /// Result level of the implicit default term.
    #[builder(default)]
    pub default_term_level: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_function_terms")))]
    pub function_terms: Vec<FunctionTerm>,

    /// Opaque `(relation, identifier)` annotation pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub annotations: Vec<(String, String)>,

    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

/// The qual-relevant content of one SBML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct QualDocument {
    /// SId of the model.
    #[builder(setter(into))]
    pub model_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_species")))]
    pub species: Vec<QualitativeSpecies>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_transitions")))]
    pub transitions: Vec<SbmlTransition>,

    /// Free-text notes attached to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

impl SbmlTransition {
    /// The target species of this transition, when it has an output.
    pub fn target(&self) -> Option<&str> {
        self.outputs.first().map(|o| o.qualitative_species.as_str())
    }

    /// A human-readable handle for messages: the id, or `tr_<target>`.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("tr_{}", self.target().unwrap_or("?")),
        }
    }
}
