//! Read direction of the multi-level transition grouper.
//!
//! Decomposes each SBML-qual transition back into flat per-level records:
//! every function term with a positive result level becomes one row, the
//! level-0 default term never surfaces, and interaction evidence is recovered
//! from input edges that carry a sign, annotations or notes.

use itertools::Itertools;

use crate::diagnostics::Diagnostics;
use crate::expression::mathml::from_mathml;
use crate::model::{
    InteractionEvidence, ModelInfo, QualModel, Species, SpeciesType, Transition,
};
use crate::sbml::error::SbmlError;
use crate::sbml::qual::{QualDocument, QualitativeSpecies, SbmlTransition, TransitionInput};
use crate::schema;

/// Decomposes an SBML-qual document into the flat per-level model.
pub fn read_model(doc: &QualDocument, diags: &mut Diagnostics) -> Result<QualModel, SbmlError> {
    let info = ModelInfo {
        model_id: doc.model_id.clone(),
        name: doc.name.clone(),
        versions: Vec::new(),
        notes: doc.notes.clone(),
    };

    let species = doc
        .species
        .iter()
        .map(|node| species_from_node(node, diags))
        .collect();

    let mut transitions = Vec::new();
    let mut interactions = Vec::new();
    for tr in &doc.transitions {
        let (mut records, mut evidence) = read_transition(tr, diags)?;
        transitions.append(&mut records);
        interactions.append(&mut evidence);
    }

    Ok(QualModel {
        info,
        species,
        transitions,
        interactions,
    })
}

/// SBML-qual has no species-type attribute; tools record it as a
/// `Type: <value>` notes line instead. Recover it and keep it out of the
/// notes so it does not accumulate as free text.
fn species_from_node(node: &QualitativeSpecies, diags: &mut Diagnostics) -> Species {
    let mut species_type = None;
    let mut notes = Vec::new();
    for line in &node.notes {
        let Some(value) = line.trim().strip_prefix("Type:") else {
            notes.push(line.clone());
            continue;
        };
        match value.trim().parse::<SpeciesType>() {
            Ok(parsed) => species_type = Some(parsed),
            Err(()) => diags.warn(format!(
                "Species '{}': Invalid Type '{}' in notes. Valid values: {}",
                node.id,
                value.trim(),
                schema::TYPES.join(", ")
            )),
        }
    }

    Species {
        species_id: node.id.clone(),
        name: node.name.clone(),
        compartment: Some(node.compartment.clone()),
        constant: Some(node.constant),
        initial_level: node.initial_level,
        max_level: node.max_level,
        species_type,
        annotations: node.annotations.clone(),
        notes,
    }
}

/// Decomposes one transition node into per-level records plus any interaction
/// evidence carried on its inputs. A transition without an output is skipped
/// with a warning.
pub fn read_transition(
    tr: &SbmlTransition,
    diags: &mut Diagnostics,
) -> Result<(Vec<Transition>, Vec<InteractionEvidence>), SbmlError> {
    let Some(target) = tr.target() else {
        diags.warn(format!("Transition '{}' has no output, skipped", tr.label()));
        return Ok((Vec::new(), Vec::new()));
    };

    let interactions = tr
        .inputs
        .iter()
        .filter(|inp| inp.sign.is_some() || !inp.annotations.is_empty() || !inp.notes.is_empty())
        .map(|inp| InteractionEvidence {
            target: target.to_string(),
            source: inp.qualitative_species.clone(),
            sign: inp.sign,
            annotations: inp.annotations.clone(),
            notes: inp.notes.clone(),
        })
        .collect();

    // "Level N: rule" lines were emitted by the write path; filter them back
    // out so they do not accumulate over round trips.
    let notes: Vec<String> = tr
        .notes
        .iter()
        .filter(|line| !is_level_note(line))
        .cloned()
        .collect();

    let mut pairs: Vec<(u32, String)> = Vec::new();
    for ft in &tr.function_terms {
        if ft.result_level == 0 {
            continue;
        }
        let rule = term_rule(ft.math.as_deref(), target, &tr.inputs, diags)?;
        pairs.push((ft.result_level, rule));
    }

    let mut records = Vec::new();
    if pairs.is_empty() {
        // No term assigns a positive level; still emit one record so the
        // transition survives the round trip, using the first term that
        // carries math, else the conjunction fallback.
        let with_math = tr.function_terms.iter().find(|ft| ft.math.is_some());
        let rule = term_rule(
            with_math.and_then(|ft| ft.math.as_deref()),
            target,
            &tr.inputs,
            diags,
        )?;
        records.push(Transition {
            transition_id: tr.id.clone(),
            name: tr.name.clone(),
            target: target.to_string(),
            level: with_math.map(|ft| ft.result_level),
            rule,
            annotations: tr.annotations.clone(),
            notes,
        });
    } else {
        let multi_level = pairs.len() > 1;
        for (level, rule) in pairs {
            // Suffix the ID per level so the sheet rows stay traceable back
            // to one SBML transition.
            let transition_id = if multi_level {
                tr.id.as_ref().map(|id| format!("{id}_{level}"))
            } else {
                tr.id.clone()
            };
            records.push(Transition {
                transition_id,
                name: tr.name.clone(),
                target: target.to_string(),
                level: Some(level),
                rule,
                annotations: tr.annotations.clone(),
                notes: notes.clone(),
            });
        }
    }

    Ok((records, interactions))
}

/// The rule text of one function term: decoded MathML when present, the
/// conjunction of the transition's inputs when not, and the constant `"1"`
/// with a warning when neither yields anything.
fn term_rule(
    math: Option<&str>,
    target: &str,
    inputs: &[TransitionInput],
    diags: &mut Diagnostics,
) -> Result<String, SbmlError> {
    let mut rule = match math {
        Some(text) => from_mathml(text)
            .map_err(|source| SbmlError::InvalidMathMl {
                target: target.to_string(),
                source,
            })?
            .map(|expr| expr.render()),
        None => None,
    };

    if rule.is_none() && !inputs.is_empty() {
        rule = Some(
            inputs
                .iter()
                .map(|inp| inp.qualitative_species.as_str())
                .join(" & "),
        );
    }

    match rule {
        Some(rule) if !rule.trim().is_empty() && rule.trim() != "()" => Ok(rule),
        _ => {
            diags.warn(format!(
                "Transition for target '{target}' has blank or empty rule. Setting to 1 (default level)."
            ));
            Ok("1".to_string())
        }
    }
}

fn is_level_note(line: &str) -> bool {
    line.starts_with("Level ") && line.contains(':')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Sign;
    use crate::sbml::qual::{FunctionTerm, TransitionOutput};
    use crate::sbml::writer::build_document;

    fn node(id: &str, target: &str, terms: Vec<FunctionTerm>) -> SbmlTransition {
        SbmlTransition {
            id: Some(id.to_string()),
            outputs: vec![TransitionOutput {
                qualitative_species: target.to_string(),
            }],
            function_terms: terms,
            ..SbmlTransition::default()
        }
    }

    fn math(fragment: &str) -> String {
        format!(
            "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">{fragment}</math>"
        )
    }

    #[test]
    fn test_single_level_transition_keeps_its_id() {
        let tr = node(
            "tr_G",
            "G",
            vec![FunctionTerm {
                result_level: 1,
                math: Some(math(
                    "<apply><geq/><ci>A</ci><cn type=\"integer\">1</cn></apply>",
                )),
            }],
        );
        let mut diags = Diagnostics::new();
        let (records, _) = read_transition(&tr, &mut diags).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transition_id.as_deref(), Some("tr_G"));
        assert_eq!(records[0].level, Some(1));
        assert_eq!(records[0].rule, "A");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_multi_level_records_get_level_suffixes() {
        let tr = node(
            "tr_G",
            "G",
            vec![
                FunctionTerm {
                    result_level: 1,
                    math: Some(math(
                        "<apply><geq/><ci>A</ci><cn type=\"integer\">1</cn></apply>",
                    )),
                },
                FunctionTerm {
                    result_level: 2,
                    math: Some(math(
                        "<apply><geq/><ci>A</ci><cn type=\"integer\">2</cn></apply>",
                    )),
                },
            ],
        );
        let mut diags = Diagnostics::new();
        let (records, _) = read_transition(&tr, &mut diags).unwrap();

        let ids: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.transition_id.as_deref())
            .collect();
        assert_eq!(ids, vec![Some("tr_G_1"), Some("tr_G_2")]);
        assert_eq!(records[1].rule, "A >= 2");
    }

    #[test]
    fn test_default_term_never_becomes_a_record() {
        let mut tr = node(
            "tr_G",
            "G",
            vec![FunctionTerm {
                result_level: 1,
                math: Some(math("<true/>")),
            }],
        );
        tr.default_term_level = 0;
        let mut diags = Diagnostics::new();
        let (records, _) = read_transition(&tr, &mut diags).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rule, "1");
    }

    #[test]
    fn test_blank_term_yields_constant_rule_and_warning() {
        let tr = node(
            "tr_G",
            "G",
            vec![FunctionTerm {
                result_level: 1,
                math: Some(math("<apply></apply>")),
            }],
        );
        let mut diags = Diagnostics::new();
        let (records, _) = read_transition(&tr, &mut diags).unwrap();

        assert_eq!(records[0].rule, "1");
        assert_eq!(diags.len(), 1);
        assert!(diags.messages()[0].contains("blank or empty rule"));
    }

    #[test]
    fn test_mathless_term_falls_back_to_input_conjunction() {
        let mut tr = node(
            "tr_G",
            "G",
            vec![FunctionTerm {
                result_level: 1,
                math: None,
            }],
        );
        tr.inputs = vec![
            TransitionInput {
                qualitative_species: "A".to_string(),
                ..TransitionInput::default()
            },
            TransitionInput {
                qualitative_species: "B".to_string(),
                ..TransitionInput::default()
            },
        ];
        let mut diags = Diagnostics::new();
        let (records, _) = read_transition(&tr, &mut diags).unwrap();

        assert_eq!(records[0].rule, "A & B");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_level_notes_are_filtered_out() {
        let mut tr = node(
            "tr_G",
            "G",
            vec![FunctionTerm {
                result_level: 1,
                math: Some(math(
                    "<apply><geq/><ci>A</ci><cn type=\"integer\">1</cn></apply>",
                )),
            }],
        );
        tr.notes = vec![
            "Level 1: A".to_string(),
            "curated from figure 2".to_string(),
        ];
        let mut diags = Diagnostics::new();
        let (records, _) = read_transition(&tr, &mut diags).unwrap();

        assert_eq!(records[0].notes, vec!["curated from figure 2".to_string()]);
    }

    fn doc_with_species(notes: Vec<String>) -> QualDocument {
        QualDocument {
            model_id: "M1".to_string(),
            species: vec![QualitativeSpecies {
                id: "G1".to_string(),
                compartment: "default".to_string(),
                notes,
                ..QualitativeSpecies::default()
            }],
            ..QualDocument::default()
        }
    }

    #[test]
    fn test_species_type_recovered_from_notes() {
        let doc = doc_with_species(vec![
            "Type: Input".to_string(),
            "curated from figure 2".to_string(),
        ]);
        let mut diags = Diagnostics::new();
        let model = read_model(&doc, &mut diags).unwrap();

        assert_eq!(model.species[0].species_type, Some(SpeciesType::Input));
        assert_eq!(
            model.species[0].notes,
            vec!["curated from figure 2".to_string()]
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_invalid_type_note_warns_and_is_dropped() {
        let doc = doc_with_species(vec!["Type: inbetween".to_string()]);
        let mut diags = Diagnostics::new();
        let model = read_model(&doc, &mut diags).unwrap();

        assert!(model.species[0].species_type.is_none());
        assert!(model.species[0].notes.is_empty());
        assert!(diags.messages()[0].contains("Invalid Type 'inbetween'"));
    }

    #[test]
    fn test_signed_input_becomes_interaction_evidence() {
        let mut tr = node(
            "tr_G",
            "G",
            vec![FunctionTerm {
                result_level: 1,
                math: Some(math(
                    "<apply><geq/><ci>A</ci><cn type=\"integer\">1</cn></apply>",
                )),
            }],
        );
        tr.inputs = vec![TransitionInput {
            qualitative_species: "A".to_string(),
            sign: Some(Sign::Negative),
            ..TransitionInput::default()
        }];
        let mut diags = Diagnostics::new();
        let (_, interactions) = read_transition(&tr, &mut diags).unwrap();

        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].target, "G");
        assert_eq!(interactions[0].source, "A");
        assert_eq!(interactions[0].sign, Some(Sign::Negative));
    }

    #[test]
    fn test_transition_without_output_is_skipped_with_warning() {
        let mut tr = node("tr_G", "G", Vec::new());
        tr.outputs.clear();
        let mut diags = Diagnostics::new();
        let (records, interactions) = read_transition(&tr, &mut diags).unwrap();

        assert!(records.is_empty());
        assert!(interactions.is_empty());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_grouping_round_trip_preserves_triples() {
        use crate::model::{ModelInfoBuilder, TransitionBuilder};

        let rows = [
            ("G", 1, "A"),
            ("G", 2, "A & B"),
            ("G", 3, "A & B & C"),
            ("H", 1, "!C"),
        ];
        let model = QualModel {
            info: ModelInfoBuilder::default().model_id("M1").build().unwrap(),
            species: Vec::new(),
            transitions: rows
                .iter()
                .map(|(target, level, rule)| {
                    TransitionBuilder::default()
                        .target(*target)
                        .level(*level)
                        .rule(*rule)
                        .build()
                        .unwrap()
                })
                .collect(),
            interactions: Vec::new(),
        };

        let mut diags = Diagnostics::new();
        let doc = build_document(&model, &mut diags).unwrap();
        let back = read_model(&doc, &mut diags).unwrap();

        let triples: Vec<(String, u32, String)> = back
            .transitions
            .iter()
            .map(|t| (t.target.clone(), t.level.unwrap(), t.rule.clone()))
            .collect();
        assert_eq!(
            triples,
            rows.iter()
                .map(|(t, l, r)| (t.to_string(), *l, r.to_string()))
                .collect::<Vec<_>>()
        );
        assert!(diags.is_empty());
    }
}
