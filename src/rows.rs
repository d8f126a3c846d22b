//! Boundary with the external spreadsheet reader.
//!
//! The cell I/O layer hands over string-keyed row maps per sheet; this module
//! turns them into model records. Structural problems follow the sparse-sheet
//! policy: fully blank rows are skipped silently, partially filled rows are
//! skipped with a warning, and invalid enum values are dropped with a warning.
//! Species IDs are deduplicated here, never silently overwritten.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::Diagnostics;
use crate::model::{
    InteractionEvidence, ModelInfo, QualModel, Sign, Species, SpeciesType, Transition,
};
use crate::resolve::context::{is_valid_sid, sanitize_sid};
use crate::schema;

/// One spreadsheet row: column header to trimmed cell text. Empty cells may
/// be present as empty strings or absent entirely.
pub type Row = HashMap<String, String>;

/// The pre-extracted content of the four sheets.
///
/// The Model sheet is a vertical key/value layout, the others are one record
/// per row. Missing optional sheets are simply empty.
#[derive(Debug, Default, Clone)]
pub struct SheetRows {
    pub model: Vec<(String, String)>,
    pub species: Vec<Row>,
    pub transitions: Vec<Row>,
    pub interactions: Vec<Row>,
}

/// Reads sheet rows into a model.
///
/// `default_model_id` stands in when the Model sheet is absent or carries no
/// ID (callers typically pass the file stem). Everything recoverable lands in
/// `diags`; this function itself never fails.
pub fn read_model(rows: &SheetRows, default_model_id: &str, diags: &mut Diagnostics) -> QualModel {
    let info = read_model_info(rows, default_model_id, diags);
    let species = read_species(&rows.species, diags);
    let transitions = read_transitions(&rows.transitions, diags);
    let interactions = read_interactions(&rows.interactions, diags);

    QualModel {
        info,
        species,
        transitions,
        interactions,
    }
}

fn read_model_info(rows: &SheetRows, default_model_id: &str, diags: &mut Diagnostics) -> ModelInfo {
    let mut info = ModelInfo::default();
    for (key, value) in &rows.model {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if key == schema::MODEL_ID {
            info.model_id = value.to_string();
        } else if key == schema::MODEL_NAME {
            info.name = Some(value.to_string());
        } else if key == schema::MODEL_VERSION {
            info.versions.push(value.to_string());
        } else if schema::is_repeated_column(key, schema::MODEL_NOTES_PREFIX) {
            info.notes.push(value.to_string());
        }
    }

    if info.model_id.is_empty() {
        diags.warn(format!(
            "No model ID found, using '{default_model_id}' as model_id"
        ));
        info.model_id = default_model_id.to_string();
    }
    info
}

fn read_species(rows: &[Row], diags: &mut Diagnostics) -> Vec<Species> {
    let mut species: Vec<Species> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        let row_num = index + 2;
        let raw_id = cell(row, schema::SPECIES_ID);
        let name = cell(row, schema::SPECIES_NAME);

        if raw_id.is_none() && name.is_none() {
            // Blank row.
            continue;
        }

        let context = match raw_id {
            Some(id) => format!("Species '{id}' (row {row_num})"),
            None => format!("Species row {row_num}"),
        };

        let candidate = match raw_id {
            Some(id) if is_valid_sid(id) => id.to_string(),
            Some(id) => {
                let cleaned = fallback_sid(&sanitize_sid(id));
                diags.warn(format!(
                    "{context}: ID '{id}' is not a valid identifier, using '{cleaned}'"
                ));
                cleaned
            }
            None => {
                let name = name.unwrap_or_default();
                let generated = fallback_sid(&sanitize_sid(name));
                diags.warn(format!(
                    "{context}: missing ID, generated '{generated}' from Name '{name}'"
                ));
                generated
            }
        };

        // Duplicates are renamed with a numeric suffix, never dropped.
        let unique = if seen.contains(&candidate) {
            let mut n = 1;
            let mut renamed = format!("{candidate}_{n}");
            while seen.contains(&renamed) {
                n += 1;
                renamed = format!("{candidate}_{n}");
            }
            diags.warn(format!(
                "{context}: duplicate ID '{candidate}' renamed to '{renamed}'"
            ));
            renamed
        } else {
            candidate
        };
        seen.insert(unique.clone());

        let species_type = cell(row, schema::SPECIES_TYPE).and_then(|raw| {
            match raw.parse::<SpeciesType>() {
                Ok(t) => Some(t),
                Err(()) => {
                    diags.warn(format!(
                        "{context}: Invalid Type '{raw}'. Valid values: {}",
                        schema::TYPES.join(", ")
                    ));
                    None
                }
            }
        });

        species.push(Species {
            species_id: unique,
            name: name.map(str::to_string),
            compartment: cell(row, schema::SPECIES_COMPARTMENT).map(str::to_string),
            constant: cell(row, schema::SPECIES_CONSTANT).and_then(parse_bool),
            initial_level: cell(row, schema::SPECIES_INITIAL_LEVEL).and_then(parse_level),
            max_level: cell(row, schema::SPECIES_MAX_LEVEL).and_then(parse_level),
            species_type,
            annotations: qualifier_pairs(
                row,
                schema::SPECIES_RELATION_PREFIX,
                schema::SPECIES_IDENTIFIER_PREFIX,
                schema::DEFAULT_SPECIES_RELATION,
                &context,
                diags,
            ),
            notes: repeated_values(row, schema::SPECIES_NOTES_PREFIX),
        });
    }

    diags.info(format!("Found {} species", species.len()));
    species
}

fn read_transitions(rows: &[Row], diags: &mut Diagnostics) -> Vec<Transition> {
    let mut transitions = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_num = index + 2;
        let target = cell(row, schema::TRANSITION_TARGET);
        let rule = cell(row, schema::TRANSITION_RULE);

        let (target, rule) = match (target, rule) {
            (None, None) => continue,
            (None, Some(_)) => {
                diags.warn(format!(
                    "Transition row {row_num}: Missing required Target field"
                ));
                continue;
            }
            (Some(target), None) => {
                diags.warn(format!(
                    "Transition row {row_num} (Target: {target}): Missing required Rule field"
                ));
                continue;
            }
            (Some(target), Some(rule)) => (target, rule),
        };

        let context = format!("Transition '{target}' (row {row_num})");
        transitions.push(Transition {
            transition_id: cell(row, schema::TRANSITION_ID).map(str::to_string),
            name: cell(row, schema::TRANSITION_NAME).map(str::to_string),
            target: target.to_string(),
            level: cell(row, schema::TRANSITION_LEVEL).and_then(parse_level),
            rule: rule.to_string(),
            annotations: qualifier_pairs(
                row,
                schema::TRANSITION_RELATION_PREFIX,
                schema::TRANSITION_IDENTIFIER_PREFIX,
                schema::DEFAULT_EVIDENCE_RELATION,
                &context,
                diags,
            ),
            notes: repeated_values(row, schema::TRANSITION_NOTES_PREFIX),
        });
    }

    diags.info(format!("Found {} transitions", transitions.len()));
    transitions
}

fn read_interactions(rows: &[Row], diags: &mut Diagnostics) -> Vec<InteractionEvidence> {
    let mut interactions = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_num = index + 2;
        let target = cell(row, schema::INTER_TARGET);
        let source = cell(row, schema::INTER_SOURCE);

        let (target, source) = match (target, source) {
            (None, None) => continue,
            (Some(_), None) | (None, Some(_)) => {
                diags.warn(format!(
                    "Interaction row {row_num}: Must have both Target and Source"
                ));
                continue;
            }
            (Some(target), Some(source)) => (target, source),
        };

        let context = format!("Interaction '{source}\u{2192}{target}' (row {row_num})");
        let mut notes = repeated_values(row, schema::INTER_NOTES_PREFIX);
        let sign = cell(row, schema::INTER_SIGN).and_then(|raw| match raw.parse::<Sign>() {
            Ok(sign) => Some(sign),
            Err(()) => {
                diags.warn(format!(
                    "{context}: Invalid Sign '{raw}'. Valid values: {}",
                    schema::SIGNS.join(", ")
                ));
                // An unmappable sign survives as a note instead.
                notes.push(format!("Sign: {raw}"));
                None
            }
        });

        interactions.push(InteractionEvidence {
            target: target.to_string(),
            source: source.to_string(),
            sign,
            annotations: qualifier_pairs(
                row,
                schema::INTER_RELATION_PREFIX,
                schema::INTER_IDENTIFIER_PREFIX,
                schema::DEFAULT_EVIDENCE_RELATION,
                &context,
                diags,
            ),
            notes,
        });
    }

    if !rows.is_empty() {
        diags.info(format!("Found {} interactions", interactions.len()));
    }
    interactions
}

/// A trimmed, non-empty cell value.
fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn fallback_sid(cleaned: &str) -> String {
    if cleaned.is_empty() {
        "species".to_string()
    } else {
        cleaned.to_string()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_level(value: &str) -> Option<u32> {
    value.parse().ok()
}

/// Values of one repeated column group, in suffix order.
fn repeated_values(row: &Row, prefix: &str) -> Vec<String> {
    indexed_values(row, prefix)
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

/// Collects `(relation, identifier)` annotation pairs from a repeated column
/// group, aligning `Relation`/`Identifier` columns by numeric suffix.
///
/// An identifier without a relation gets `default_relation`; an unknown
/// relation is kept verbatim with a warning; comma-separated identifiers
/// expand into one pair each.
fn qualifier_pairs(
    row: &Row,
    relation_prefix: &str,
    identifier_prefix: &str,
    default_relation: &str,
    context: &str,
    diags: &mut Diagnostics,
) -> Vec<(String, String)> {
    let relations = indexed_values(row, relation_prefix);
    let identifiers = indexed_values(row, identifier_prefix);

    let mut pairs = Vec::new();
    for (index, identifier) in &identifiers {
        let relation = relations
            .iter()
            .find(|(i, _)| i == index)
            .map(|(_, r)| r.as_str())
            .unwrap_or(default_relation);

        let relation = match schema::normalize_relation(relation) {
            Some(canonical) => canonical.to_string(),
            None => {
                diags.warn(format!(
                    "{context}: Invalid Relation '{relation}'. Valid values: {}",
                    schema::RELATIONS.join(", ")
                ));
                relation.to_string()
            }
        };

        for part in identifier.split(',') {
            let part = part.trim();
            if !part.is_empty() {
                pairs.push((relation.clone(), part.to_string()));
            }
        }
    }
    pairs
}

fn indexed_values(row: &Row, prefix: &str) -> Vec<(usize, String)> {
    let mut values: Vec<(usize, String)> = row
        .iter()
        .filter(|(column, value)| {
            schema::is_repeated_column(column, prefix) && !value.trim().is_empty()
        })
        .map(|(column, value)| {
            (
                schema::repeated_column_index(column, prefix),
                value.trim().to_string(),
            )
        })
        .collect();
    values.sort_by_key(|(index, _)| *index);
    values
}
