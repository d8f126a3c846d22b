//! Write direction of the multi-level transition grouper.
//!
//! Spreadsheet rows carry one `(level, rule)` pair each; SBML-qual carries
//! one transition per target with a family of function terms. This module
//! partitions the flat records by target and assembles one transition node
//! per group: default term at level 0, one function term per record, inputs
//! collected structurally from the rule ASTs, and interaction evidence
//! attached to the matching input edge.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::expression::mathml::to_mathml_document;
use crate::expression::parser::parse;
use crate::model::{QualModel, Transition};
use crate::sbml::error::SbmlError;
use crate::sbml::qual::{
    FunctionTerm, QualDocument, QualitativeSpecies, SbmlTransition, TransitionInput,
    TransitionOutput,
};
use crate::schema::DEFAULT_COMPARTMENT;

lazy_static! {
    // Level-disambiguation suffix on transition IDs, e.g. tr_Cro_2 -> tr_Cro.
    static ref LEVEL_SUFFIX_RE: Regex = Regex::new(r"^(.+)_(\d+)$").unwrap();
}

/// Assembles the SBML-qual document for a resolved model.
///
/// Rules are expected in ID vocabulary; a rule that fails to parse aborts the
/// call, everything recoverable lands in `diags`.
pub fn build_document(
    model: &QualModel,
    diags: &mut Diagnostics,
) -> Result<QualDocument, SbmlError> {
    let species = model.species.iter().map(qualitative_species).collect();

    let mut transitions = Vec::new();
    for (target, group) in group_by_target(&model.transitions) {
        transitions.push(build_transition(target, &group)?);
    }
    attach_interactions(model, &mut transitions, diags);

    Ok(QualDocument {
        model_id: model.info.model_id.clone(),
        name: model.info.name.clone(),
        species,
        transitions,
        notes: model.info.notes.clone(),
    })
}

fn qualitative_species(species: &crate::model::Species) -> QualitativeSpecies {
    QualitativeSpecies {
        id: species.species_id.clone(),
        name: species.name.clone(),
        compartment: species
            .compartment
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPARTMENT.to_string()),
        constant: species.constant.unwrap_or(false),
        initial_level: species.initial_level,
        max_level: species.max_level,
        annotations: species.annotations.clone(),
        notes: species.notes.clone(),
    }
}

/// Partitions transition records by target, preserving first-appearance order
/// of targets and record order within each group.
fn group_by_target(transitions: &[Transition]) -> Vec<(&str, Vec<&Transition>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Transition>> = HashMap::new();
    for t in transitions {
        let entry = groups.entry(t.target.as_str()).or_default();
        if entry.is_empty() {
            order.push(t.target.as_str());
        }
        entry.push(t);
    }
    order
        .into_iter()
        .map(|target| {
            let group = groups.remove(target).unwrap_or_default();
            (target, group)
        })
        .collect()
}

/// The shared base ID of a transition group: the first record's ID with any
/// `_<digits>` level suffix stripped, or `tr_<target>` when absent. The strip
/// is a heuristic and can fire on a legitimately numeric-suffixed ID.
fn base_transition_id(target: &str, first: &Transition) -> String {
    match &first.transition_id {
        Some(id) => match LEVEL_SUFFIX_RE.captures(id) {
            Some(caps) => caps[1].to_string(),
            None => id.clone(),
        },
        None => format!("tr_{target}"),
    }
}

fn build_transition(target: &str, group: &[&Transition]) -> Result<SbmlTransition, SbmlError> {
    let first = group[0];

    let mut asts = Vec::with_capacity(group.len());
    for t in group {
        let ast = parse(&t.rule).map_err(|source| SbmlError::InvalidRule {
            target: target.to_string(),
            rule: t.rule.clone(),
            source,
        })?;
        asts.push(ast);
    }

    // Inputs: union of the species referenced by any rule in the group,
    // first-appearance order.
    let mut input_ids: Vec<String> = Vec::new();
    for ast in &asts {
        for id in ast.species_ids() {
            if !input_ids.iter().any(|seen| *seen == id) {
                input_ids.push(id);
            }
        }
    }

    let function_terms = group
        .iter()
        .zip(&asts)
        .map(|(t, ast)| FunctionTerm {
            result_level: t.level.unwrap_or(1),
            math: Some(to_mathml_document(ast)),
        })
        .collect();

    // One "Level N: rule" note per record, ahead of the record's own notes,
    // so the per-level rules stay readable in SBML viewers.
    let mut notes: Vec<String> = group
        .iter()
        .map(|t| format!("Level {}: {}", t.level.unwrap_or(1), t.rule))
        .collect();
    notes.extend(first.notes.iter().cloned());

    Ok(SbmlTransition {
        id: Some(base_transition_id(target, first)),
        name: first.name.clone(),
        inputs: input_ids
            .into_iter()
            .map(|id| TransitionInput {
                qualitative_species: id,
                ..TransitionInput::default()
            })
            .collect(),
        outputs: vec![TransitionOutput {
            qualitative_species: target.to_string(),
        }],
        default_term_level: 0,
        function_terms,
        annotations: first.annotations.clone(),
        notes,
    })
}

/// Attaches interaction evidence to the matching input edges.
fn attach_interactions(
    model: &QualModel,
    transitions: &mut [SbmlTransition],
    diags: &mut Diagnostics,
) {
    for inter in &model.interactions {
        let Some(tr) = transitions
            .iter_mut()
            .find(|tr| tr.target() == Some(inter.target.as_str()))
        else {
            diags.warn(format!(
                "Interaction (target='{}', source='{}'): no transition for this target, evidence dropped",
                inter.target, inter.source
            ));
            continue;
        };

        let index = match tr
            .inputs
            .iter()
            .position(|inp| inp.qualitative_species == inter.source)
        {
            Some(index) => index,
            None => {
                diags.warn(format!(
                    "No input found for {} in {}, creating one",
                    inter.source,
                    tr.label()
                ));
                tr.inputs.push(TransitionInput {
                    qualitative_species: inter.source.clone(),
                    ..TransitionInput::default()
                });
                tr.inputs.len() - 1
            }
        };
        let input = &mut tr.inputs[index];

        if inter.sign.is_some() {
            input.sign = inter.sign;
        }
        input.annotations.extend(inter.annotations.iter().cloned());
        input.notes.extend(inter.notes.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{
        InteractionEvidenceBuilder, ModelInfoBuilder, Sign, SpeciesBuilder, TransitionBuilder,
    };

    fn transition(target: &str, level: Option<u32>, rule: &str) -> Transition {
        let mut builder = TransitionBuilder::default();
        builder.target(target).rule(rule);
        if let Some(level) = level {
            builder.level(level);
        }
        builder.build().unwrap()
    }

    fn model_with(transitions: Vec<Transition>) -> QualModel {
        QualModel {
            info: ModelInfoBuilder::default().model_id("M1").build().unwrap(),
            species: ["A", "B", "C", "G"]
                .iter()
                .map(|id| {
                    SpeciesBuilder::default()
                        .species_id(*id)
                        .build()
                        .unwrap()
                })
                .collect(),
            transitions,
            interactions: Vec::new(),
        }
    }

    #[test]
    fn test_multi_level_rows_collapse_to_one_transition() {
        let model = model_with(vec![
            transition("G", Some(1), "A"),
            transition("G", Some(2), "A & B"),
            transition("G", Some(3), "A & B & C"),
        ]);
        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();

        assert_eq!(doc.transitions.len(), 1);
        let tr = &doc.transitions[0];
        assert_eq!(tr.id.as_deref(), Some("tr_G"));
        assert_eq!(tr.target(), Some("G"));
        assert_eq!(tr.default_term_level, 0);

        let inputs: Vec<&str> = tr
            .inputs
            .iter()
            .map(|i| i.qualitative_species.as_str())
            .collect();
        assert_eq!(inputs, vec!["A", "B", "C"]);

        let levels: Vec<u32> = tr.function_terms.iter().map(|ft| ft.result_level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert!(tr.function_terms.iter().all(|ft| ft.math.is_some()));
        assert_eq!(tr.notes[0], "Level 1: A");
        assert_eq!(tr.notes[2], "Level 3: A & B & C");
    }

    #[test]
    fn test_level_suffix_stripped_from_first_record_id() {
        let mut first = transition("G", Some(2), "A");
        first.transition_id = Some("tr_G_2".to_string());
        let model = model_with(vec![first, transition("G", Some(3), "B")]);
        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();

        assert_eq!(doc.transitions[0].id.as_deref(), Some("tr_G"));
    }

    #[test]
    fn test_missing_level_defaults_to_one() {
        let model = model_with(vec![transition("G", None, "A | B")]);
        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();

        assert_eq!(doc.transitions[0].function_terms[0].result_level, 1);
    }

    #[test]
    fn test_numeric_constants_are_not_inputs() {
        let model = model_with(vec![transition("G", Some(1), "A | 1")]);
        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();

        let inputs: Vec<&str> = doc.transitions[0]
            .inputs
            .iter()
            .map(|i| i.qualitative_species.as_str())
            .collect();
        assert_eq!(inputs, vec!["A"]);
    }

    #[test]
    fn test_unparseable_rule_is_fatal_for_the_call() {
        let model = model_with(vec![transition("G", Some(1), "(A & B")]);
        let mut diags = Diagnostics::new();
        let err = build_document(&model, &mut diags).unwrap_err();
        assert!(matches!(err, SbmlError::InvalidRule { .. }));
        assert!(err.to_string().contains("(A & B"));
    }

    #[test]
    fn test_interaction_attaches_to_matching_input() {
        let mut model = model_with(vec![transition("G", Some(1), "A & B")]);
        model.interactions.push(
            InteractionEvidenceBuilder::default()
                .target("G")
                .source("A")
                .sign(Sign::Positive)
                .build()
                .unwrap(),
        );
        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();

        let input = &doc.transitions[0].inputs[0];
        assert_eq!(input.qualitative_species, "A");
        assert_eq!(input.sign, Some(Sign::Positive));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_interaction_with_unreferenced_source_creates_input_with_warning() {
        let mut model = model_with(vec![transition("G", Some(1), "A")]);
        model.interactions.push(
            InteractionEvidenceBuilder::default()
                .target("G")
                .source("C")
                .sign(Sign::Negative)
                .build()
                .unwrap(),
        );
        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();

        let inputs = &doc.transitions[0].inputs;
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].qualitative_species, "C");
        assert_eq!(inputs[1].sign, Some(Sign::Negative));
        assert_eq!(diags.len(), 1);
        assert!(diags.messages()[0].contains("creating one"));
    }
}
