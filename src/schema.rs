//! Spreadsheet vocabulary shared by both conversion directions.
//!
//! Sheet and column names, the controlled vocabularies for annotation
//! relations, species types and interaction signs, and the matching rule for
//! repeated column groups (`Relation`, `Relation2`, ..., `Notes`, `Notes2`,
//! ...). All lookups are case-insensitive and return the canonical spelling.

/// Sheet names.
pub const SHEET_MODEL: &str = "Model";
pub const SHEET_SPECIES: &str = "Species";
pub const SHEET_TRANSITIONS: &str = "Transitions";
pub const SHEET_INTERACTIONS: &str = "Interactions";

/// Model sheet keys (vertical layout: key in first column, value in second).
pub const MODEL_ID: &str = "Model_ID";
pub const MODEL_NAME: &str = "Name";
pub const MODEL_VERSION: &str = "Version";
pub const MODEL_NOTES_PREFIX: &str = "Notes";

/// Species sheet columns.
pub const SPECIES_ID: &str = "Species_ID";
pub const SPECIES_NAME: &str = "Name";
pub const SPECIES_COMPARTMENT: &str = "Compartment";
pub const SPECIES_TYPE: &str = "Type";
pub const SPECIES_CONSTANT: &str = "Constant";
pub const SPECIES_INITIAL_LEVEL: &str = "InitialLevel";
pub const SPECIES_MAX_LEVEL: &str = "MaxLevel";
pub const SPECIES_RELATION_PREFIX: &str = "Relation";
pub const SPECIES_IDENTIFIER_PREFIX: &str = "Identifier";
pub const SPECIES_NOTES_PREFIX: &str = "Notes";

/// Transitions sheet columns.
pub const TRANSITION_ID: &str = "Transitions_ID";
pub const TRANSITION_NAME: &str = "Name";
pub const TRANSITION_TARGET: &str = "Target";
pub const TRANSITION_LEVEL: &str = "Level";
pub const TRANSITION_RULE: &str = "Rule";
pub const TRANSITION_RELATION_PREFIX: &str = "Relation";
pub const TRANSITION_IDENTIFIER_PREFIX: &str = "Identifier";
pub const TRANSITION_NOTES_PREFIX: &str = "Notes";

/// Interactions sheet columns.
pub const INTER_TARGET: &str = "Target";
pub const INTER_SOURCE: &str = "Source";
pub const INTER_SIGN: &str = "Sign";
pub const INTER_RELATION_PREFIX: &str = "Relation";
pub const INTER_IDENTIFIER_PREFIX: &str = "Identifier";
pub const INTER_NOTES_PREFIX: &str = "Notes";

/// Compartment used when a species row leaves the column empty.
pub const DEFAULT_COMPARTMENT: &str = "default";

/// Annotation relations understood for species/transition/interaction rows
/// (biological qualifiers).
pub const RELATIONS: &[&str] = &[
    "is",
    "hasVersion",
    "isVersionOf",
    "isDescribedBy",
    "hasPart",
    "isPartOf",
    "hasProperty",
    "isPropertyOf",
    "encodes",
    "isEncodedBy",
    "isHomologTo",
    "occursIn",
    "hasTaxon",
];

/// Valid species types, canonical spelling.
pub const TYPES: &[&str] = &["Input", "Internal", "Output"];

/// Valid interaction signs, canonical spelling.
pub const SIGNS: &[&str] = &["positive", "negative", "dual", "unknown"];

/// Default relation when a Species row provides an Identifier with no Relation.
pub const DEFAULT_SPECIES_RELATION: &str = "is";
/// Default relation for Transitions/Interactions rows.
pub const DEFAULT_EVIDENCE_RELATION: &str = "isDescribedBy";

/// Normalizes an annotation relation to its canonical spelling.
///
/// Returns `None` for unknown relations; callers keep the original value and
/// record a warning in that case.
pub fn normalize_relation(relation: &str) -> Option<&'static str> {
    let lower = relation.trim().to_ascii_lowercase();
    RELATIONS.iter().find(|r| r.to_ascii_lowercase() == lower).copied()
}

/// Checks whether `column` belongs to the repeated group named by `prefix`.
///
/// Accepts the exact prefix or the prefix followed by a numeric suffix, e.g.
/// `Relation`, `Relation2`, `Identifier10`.
pub fn is_repeated_column(column: &str, prefix: &str) -> bool {
    if !column.starts_with(prefix) {
        return false;
    }
    if column == prefix {
        return true;
    }
    let suffix = &column[prefix.len()..];
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit())
}

/// Numeric suffix of a repeated column, used to align `Relation`/`Identifier`
/// pairs. The bare prefix counts as 0.
pub fn repeated_column_index(column: &str, prefix: &str) -> usize {
    column[prefix.len()..].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_column_matching() {
        assert!(is_repeated_column("Relation", "Relation"));
        assert!(is_repeated_column("Relation2", "Relation"));
        assert!(is_repeated_column("Identifier10", "Identifier"));
        assert!(!is_repeated_column("RelationX", "Relation"));
        assert!(!is_repeated_column("Identifier", "Relation"));
    }

    #[test]
    fn test_relation_normalization_is_case_insensitive() {
        assert_eq!(normalize_relation("isdescribedby"), Some("isDescribedBy"));
        assert_eq!(normalize_relation("HASPART"), Some("hasPart"));
        assert_eq!(normalize_relation("references"), None);
    }

    #[test]
    fn test_repeated_column_index() {
        assert_eq!(repeated_column_index("Relation", "Relation"), 0);
        assert_eq!(repeated_column_index("Relation3", "Relation"), 3);
    }
}
