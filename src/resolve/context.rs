//! Per-model lookup tables for reference resolution.
//!
//! Built once after all species rows are read, consumed by the resolver and
//! the display renderer, discarded after the conversion. Duplicate names are
//! tracked by a 0-indexed occurrence counter in ID sort order so that every
//! occurrence of a shared name stays addressable.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::Species;

lazy_static! {
    static ref SID_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref NAME_SUFFIX_RE: Regex = Regex::new(r"^(.+)_(\d+)$").unwrap();
}

/// Whether `s` is a syntactically valid structural identifier.
pub fn is_valid_sid(s: &str) -> bool {
    SID_RE.is_match(s)
}

/// Strips characters illegal in an identifier, keeping letters, digits and
/// underscores, and prefixing an underscore when the result would start with
/// a digit. Returns an empty string when nothing survives.
pub fn sanitize_sid(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match kept.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{kept}"),
        _ => kept,
    }
}

/// Removes one pair of surrounding double quotes, if present.
pub fn strip_quotes(s: &str) -> &str {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Lookup tables for one model's species pool.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// ID -> display name of the species (trimmed), when it has one.
    id_to_name: HashMap<String, Option<String>>,
    /// First-occurrence Name -> ID (occurrence 0 in ID sort order).
    name_to_id: HashMap<String, String>,
    /// Name -> number of species sharing it.
    name_counts: HashMap<String, usize>,
    /// Name -> IDs sharing it, indexed by occurrence (ID sort order).
    name_occurrences: HashMap<String, Vec<String>>,
}

impl ResolutionContext {
    /// Builds the context from the final, deduplicated species list.
    pub fn build(species: &[Species]) -> Self {
        let mut ctx = ResolutionContext::default();

        for sp in species {
            let name = sp.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
            ctx.id_to_name
                .insert(sp.species_id.clone(), name.map(str::to_string));
            if let Some(name) = name {
                *ctx.name_counts.entry(name.to_string()).or_insert(0) += 1;
            }
        }

        // Occurrence indices are assigned in ID sort order; the first
        // occurrence is the one a bare Name resolves to.
        let mut sorted: Vec<&Species> = species.iter().collect();
        sorted.sort_by(|a, b| a.species_id.cmp(&b.species_id));
        for sp in sorted {
            if let Some(name) = sp.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                let occurrences = ctx.name_occurrences.entry(name.to_string()).or_default();
                if occurrences.is_empty() {
                    ctx.name_to_id.insert(name.to_string(), sp.species_id.clone());
                }
                occurrences.push(sp.species_id.clone());
            }
        }

        ctx
    }

    /// Whether `token` is a known species ID.
    pub fn is_id(&self, token: &str) -> bool {
        self.id_to_name.contains_key(token)
    }

    /// Whether `token` is a known species Name (bare form only).
    pub fn is_name(&self, token: &str) -> bool {
        self.name_to_id.contains_key(token)
    }

    /// Resolves a Name reference to a species ID, inverting the canonical
    /// display form exactly: a bare Name maps to its first occurrence, a
    /// `Name_N` suffix maps to occurrence `N` when that exact suffixed form
    /// is recorded for the base Name.
    pub fn lookup_name(&self, token: &str) -> Option<&str> {
        if let Some(id) = self.name_to_id.get(token) {
            return Some(id.as_str());
        }
        if let Some(caps) = NAME_SUFFIX_RE.captures(token) {
            let base = &caps[1];
            if let Some(occurrences) = self.name_occurrences.get(base) {
                let rank: usize = caps[2].parse().ok()?;
                if rank >= 1 && rank < occurrences.len() {
                    return Some(occurrences[rank].as_str());
                }
            }
        }
        None
    }

    /// Name of a species, when it has one.
    pub fn name_of(&self, species_id: &str) -> Option<&str> {
        self.id_to_name.get(species_id)?.as_deref()
    }

    /// Canonical display form of a species reference in Name mode.
    ///
    /// A unique Name renders bare; a duplicated Name gets a `_N` suffix for
    /// its occurrence rank (the first occurrence stays bare); any result that
    /// is not a valid plain identifier is wrapped in double quotes. A species
    /// without a Name renders as its ID.
    pub fn display_name(&self, species_id: &str) -> String {
        let Some(name) = self.name_of(species_id) else {
            return species_id.to_string();
        };

        let rendered = if self.name_counts.get(name).copied().unwrap_or(0) > 1 {
            let rank = self
                .name_occurrences
                .get(name)
                .and_then(|ids| ids.iter().position(|id| id == species_id))
                .unwrap_or(0);
            if rank == 0 {
                name.to_string()
            } else {
                format!("{name}_{rank}")
            }
        } else {
            name.to_string()
        };

        if is_valid_sid(&rendered) {
            rendered
        } else {
            format!("\"{rendered}\"")
        }
    }

    /// Maps a reference in either vocabulary (ID, bare or suffixed Name,
    /// possibly quoted) to the species ID.
    pub fn canonical_id(&self, token: &str) -> Option<&str> {
        let token = strip_quotes(token);
        if let Some((id, _)) = self.id_to_name.get_key_value(token) {
            return Some(id.as_str());
        }
        self.lookup_name(token)
    }

    /// Rewrites every species ID in `rule` to its canonical display form.
    ///
    /// Used when writing rules back to a spreadsheet in Name mode; IDs are
    /// matched as whole tokens so that substrings of longer identifiers are
    /// left alone.
    pub fn rule_ids_to_display(&self, rule: &str) -> String {
        let mut result = rule.to_string();
        for (sid, name) in &self.id_to_name {
            if name.is_none() {
                continue;
            }
            let replacement = self.display_name(sid);
            // IDs are word characters only, so word boundaries are enough to
            // keep substrings of longer identifiers intact.
            let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(sid))) {
                Ok(pattern) => pattern,
                Err(err) => {
                    log::warn!("display rewrite skipped for ID '{sid}': {err}");
                    continue;
                }
            };
            result = pattern
                .replace_all(&result, regex::NoExpand(&replacement))
                .into_owned();
        }
        result
    }
}
