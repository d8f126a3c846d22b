//! End-to-end conversion pipelines.
//!
//! Both directions meet at [`crate::model::QualModel`]: spreadsheet rows are
//! read, resolved to ID vocabulary and grouped into SBML-qual nodes; SBML
//! documents are decomposed back into per-level rows and optionally rendered
//! in Name vocabulary and colon notation for display. Each call owns one
//! resolution context and one diagnostics list; nothing outlives the call.

use crate::diagnostics::Diagnostics;
use crate::error::TabQualError;
use crate::expression::transcode::to_colon_notation;
use crate::model::QualModel;
use crate::resolve::context::ResolutionContext;
use crate::resolve::resolver::Resolver;
use crate::rows::{self, SheetRows};
use crate::sbml::qual::QualDocument;
use crate::sbml::{reader, writer};

/// How rules are spelled when written back to a spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleNotation {
    /// Comparator operators: `A >= 2`.
    #[default]
    Operators,
    /// Colon shorthand: `A:2`.
    Colon,
}

/// Output preferences for the SBML to spreadsheet direction.
#[derive(Debug, Clone, Copy)]
pub struct SheetOptions {
    /// Render species references by Name where a Name exists.
    pub use_names: bool,
    pub notation: RuleNotation,
}

impl Default for SheetOptions {
    fn default() -> Self {
        SheetOptions {
            use_names: true,
            notation: RuleNotation::default(),
        }
    }
}

/// Converts spreadsheet rows into an SBML-qual document.
///
/// Species references in targets, sources and rules are resolved to canonical
/// IDs with one adaptive resolver for the whole model, then the per-level
/// records are grouped into transitions. The diagnostics list is returned
/// alongside the document and is ordered as the decisions were made.
pub fn spreadsheet_to_sbml(
    sheets: &SheetRows,
    default_model_id: &str,
) -> Result<(QualDocument, Diagnostics), TabQualError> {
    let mut diags = Diagnostics::new();
    let mut model = rows::read_model(sheets, default_model_id, &mut diags);

    let context = ResolutionContext::build(&model.species);
    let mut resolver = Resolver::new(&context);

    for transition in &mut model.transitions {
        let label = match &transition.transition_id {
            Some(id) => format!("Transition '{id}'"),
            None => format!("Transition for target '{}'", transition.target),
        };
        transition.target = resolver
            .resolve(&transition.target, &label, &mut diags)?
            .species_id;
        transition.rule = resolver
            .resolve_rule(&transition.rule, &label, &mut diags)?
            .id_rule;
    }

    for interaction in &mut model.interactions {
        let label = format!(
            "Interaction '{}\u{2192}{}'",
            interaction.source, interaction.target
        );
        interaction.target = resolver
            .resolve(&interaction.target, &label, &mut diags)?
            .species_id;
        interaction.source = resolver
            .resolve(&interaction.source, &label, &mut diags)?
            .species_id;
    }

    let document = writer::build_document(&model, &mut diags)?;
    Ok((document, diags))
}

/// Converts an SBML-qual document into the flat per-level model the
/// spreadsheet writer consumes.
///
/// With [`SheetOptions::use_names`] set, targets, sources and rule references
/// are rendered in the canonical display form; rules can additionally be
/// rewritten to colon notation.
pub fn sbml_to_spreadsheet(
    document: &QualDocument,
    options: &SheetOptions,
) -> Result<(QualModel, Diagnostics), TabQualError> {
    let mut diags = Diagnostics::new();
    let mut model = reader::read_model(document, &mut diags)?;

    if options.use_names {
        let context = ResolutionContext::build(&model.species);
        for transition in &mut model.transitions {
            transition.target = context.display_name(&transition.target);
            transition.rule = context.rule_ids_to_display(&transition.rule);
        }
        for interaction in &mut model.interactions {
            interaction.target = context.display_name(&interaction.target);
            interaction.source = context.display_name(&interaction.source);
        }
    }

    if options.notation == RuleNotation::Colon {
        for transition in &mut model.transitions {
            transition.rule = to_colon_notation(&transition.rule);
        }
    }

    Ok((model, diags))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn kinase_sheets() -> SheetRows {
        SheetRows {
            model: vec![("Model_ID".to_string(), "M1".to_string())],
            species: vec![
                row(&[("Species_ID", "K1"), ("Name", "Kinase")]),
                row(&[("Species_ID", "K2"), ("Name", "Kinase")]),
                row(&[("Species_ID", "G"), ("Name", "Gene")]),
            ],
            transitions: vec![row(&[("Target", "G"), ("Rule", "Kinase & K2")])],
            interactions: Vec::new(),
        }
    }

    #[test]
    fn test_duplicate_names_resolve_through_whole_pipeline() {
        let (doc, diags) = spreadsheet_to_sbml(&kinase_sheets(), "fallback").unwrap();

        let tr = &doc.transitions[0];
        assert_eq!(tr.target(), Some("G"));
        let inputs: Vec<&str> = tr
            .inputs
            .iter()
            .map(|i| i.qualitative_species.as_str())
            .collect();
        assert_eq!(inputs, vec!["K1", "K2"]);
        // The mode switch to Name is reported exactly once.
        assert_eq!(
            diags
                .messages()
                .iter()
                .filter(|m| m.contains("resolving references by Name"))
                .count(),
            1
        );
    }

    #[test]
    fn test_sbml_direction_renders_names_and_colon_notation() {
        let (doc, _) = spreadsheet_to_sbml(&kinase_sheets(), "fallback").unwrap();
        let options = SheetOptions {
            use_names: true,
            notation: RuleNotation::Colon,
        };
        let (model, _) = sbml_to_spreadsheet(&doc, &options).unwrap();

        assert_eq!(model.transitions[0].target, "Gene");
        assert_eq!(model.transitions[0].rule, "Kinase & Kinase_1");
    }

    #[test]
    fn test_colon_notation_applies_to_thresholds() {
        let sheets = SheetRows {
            model: vec![("Model_ID".to_string(), "M1".to_string())],
            species: vec![
                row(&[("Species_ID", "A")]),
                row(&[("Species_ID", "G")]),
            ],
            transitions: vec![row(&[("Target", "G"), ("Rule", "A >= 2"), ("Level", "2")])],
            interactions: Vec::new(),
        };
        let (doc, _) = spreadsheet_to_sbml(&sheets, "fallback").unwrap();
        let options = SheetOptions {
            use_names: false,
            notation: RuleNotation::Colon,
        };
        let (model, _) = sbml_to_spreadsheet(&doc, &options).unwrap();

        assert_eq!(model.transitions[0].rule, "A:2");
        assert_eq!(model.transitions[0].level, Some(2));
    }

    #[test]
    fn test_unresolvable_target_is_fatal() {
        let mut sheets = kinase_sheets();
        sheets.transitions = vec![row(&[("Target", "Nowhere"), ("Rule", "K1")])];
        let err = spreadsheet_to_sbml(&sheets, "fallback").unwrap_err();
        assert!(err.to_string().contains("'Nowhere'"));
    }
}
