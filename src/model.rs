//! In-memory representation of a qualitative regulatory model.
//!
//! This is the pivot format both conversion directions meet at: the
//! spreadsheet boundary produces it row by row, the SBML boundary consumes and
//! produces it transition by transition. Annotations are carried as opaque
//! `(relation, identifier)` string pairs; serializing them to RDF is the job
//! of an external layer.

use std::str::FromStr;

use derive_builder::Builder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Model-level identity and free-text metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct ModelInfo {
    /// Identifier of the model, must be a valid SId.
    #[builder(setter(into))]
    pub model_id: String,

    /// Human-readable model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    /// Version strings attached to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub versions: Vec<String>,

    /// Free-text notes attached to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

/// Functional classification of a species within the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SpeciesType {
    Input,
    Internal,
    Output,
}

impl SpeciesType {
    /// Canonical spelling, as written back to spreadsheets.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeciesType::Input => "Input",
            SpeciesType::Internal => "Internal",
            SpeciesType::Output => "Output",
        }
    }
}

impl FromStr for SpeciesType {
    type Err = ();

    /// Case-insensitive parse; unknown values are rejected so that callers can
    /// warn and drop them instead of failing the row.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(SpeciesType::Input),
            "internal" => Ok(SpeciesType::Internal),
            "output" => Ok(SpeciesType::Output),
            _ => Err(()),
        }
    }
}

/// Sign of a regulatory interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Sign {
    Positive,
    Negative,
    Dual,
    Unknown,
}

impl Sign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Positive => "positive",
            Sign::Negative => "negative",
            Sign::Dual => "dual",
            Sign::Unknown => "unknown",
        }
    }
}

impl FromStr for Sign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sign::Positive),
            "negative" => Ok(Sign::Negative),
            "dual" => Ok(Sign::Dual),
            "unknown" => Ok(Sign::Unknown),
            _ => Err(()),
        }
    }
}

/// One qualitative species of the model.
///
/// Created once per spreadsheet row or SBML qualitative-species node; the
/// `species_id` is deduplicated at creation time and immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct Species {
    /// Canonical identifier, guaranteed unique within the model after reading.
    #[builder(setter(into))]
    pub species_id: String,

    /// Human-readable name; may be shared between species.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    /// Compartment the species lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub compartment: Option<String>,

    /// Whether the level of this species is fixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub constant: Option<bool>,

    /// Level the species starts at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub initial_level: Option<u32>,

    /// Highest level the species can reach; 1 for Boolean species.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub max_level: Option<u32>,

    /// Functional classification within the network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub species_type: Option<SpeciesType>,

    /// Opaque `(relation, identifier)` annotation pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub annotations: Vec<(String, String)>,

    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

/// One per-level transition rule.
///
/// Several records sharing the same `target` together describe one
/// multi-valued SBML transition; each record contributes one
/// `(level, rule)` pair and the group inherits its identity from the first
/// record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct Transition {
    /// Transition identifier; optional, generated as `tr_<target>` on write
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub transition_id: Option<String>,

    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    /// Species whose level this rule assigns.
    #[builder(setter(into))]
    pub target: String,

    /// Output level this rule assigns; `None` means level 1 (Boolean).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub level: Option<u32>,

    /// Rule expression in the transition-rule grammar.
    #[builder(setter(into))]
    pub rule: String,

    /// Opaque `(relation, identifier)` annotation pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub annotations: Vec<(String, String)>,

    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into))]
    pub notes: Vec<String>,
}

/// Evidentiary metadata for one regulatory edge.
///
/// Not required for the logic of the model; attaches sign and annotations to
/// the matching transition input when writing SBML.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct InteractionEvidence {
    /// Regulated species.
    #[builder(setter(into))]
    pub target: String,

    /// Regulating species.
    #[builder(setter(into))]
    pub source: String,

    /// Sign of the regulation.
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

/// A complete in-memory model: the pivot between both conversion directions.
///
/// `transitions` holds the flat, per-level representation used by spreadsheet
/// rows; grouping into multi-level SBML transitions happens at the SBML
/// boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Builder)]
pub struct QualModel {
    /// Model-level metadata.
    #[builder(default)]
    pub info: ModelInfo,

    /// All species, in reading order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_species")))]
    pub species: Vec<Species>,

    /// All per-level transition records, in reading order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_transitions")))]
    pub transitions: Vec<Transition>,

    /// Interaction evidence records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_interactions")))]
    pub interactions: Vec<InteractionEvidence>,
}

impl QualModel {
    /// Looks up a species by its canonical identifier.
    pub fn species_by_id(&self, id: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.species_id == id)
    }
}
