//! Adaptive species reference resolution.
//!
//! Cells may refer to species by ID or by Name, and authors rarely mix the
//! two. The resolver starts in ID mode and switches per model the first time
//! the evidence contradicts the current mode, warning once per switch. Rules
//! are resolved in two passes: the first pass settles the mode over every
//! reference in the rule, the second substitutes, so a rule like
//! `Kinase & K2` resolves all of its references in the mode the rule as a
//! whole settles on.

use lazy_static::lazy_static;
use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::resolve::context::{sanitize_sid, strip_quotes, ResolutionContext};
use crate::resolve::error::ResolveError;

lazy_static! {
    static ref QUOTED_RE: Regex = Regex::new(r#""[^"]*""#).unwrap();
    static ref COMPOUND_RE: Regex = Regex::new(r"[A-Za-z_]\w*(?:[ \t'+,./-]+\w+)+").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"[A-Za-z_]\w*").unwrap();
}

/// Which vocabulary references are currently resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// References are species IDs.
    #[default]
    Id,
    /// References are species Names in canonical display form.
    Name,
}

/// A single resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The species ID the reference maps to.
    pub species_id: String,
    /// The reference rendered in the resolver's current vocabulary.
    pub rendered: String,
}

/// A rule with every reference substituted, in both vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    /// The rule with every reference replaced by its species ID.
    pub id_rule: String,
    /// The rule with every reference in canonical display form.
    pub display_rule: String,
}

/// Stateful per-model reference resolver.
#[derive(Debug)]
pub struct Resolver<'a> {
    context: &'a ResolutionContext,
    mode: ResolutionMode,
}

impl<'a> Resolver<'a> {
    pub fn new(context: &'a ResolutionContext) -> Self {
        Resolver {
            context,
            mode: ResolutionMode::default(),
        }
    }

    pub fn with_mode(context: &'a ResolutionContext, mode: ResolutionMode) -> Self {
        Resolver { context, mode }
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Resolves a single reference cell (a Target or Source column, say).
    ///
    /// Applies the adaptive mode rules, then retries with illegal characters
    /// stripped before giving up. Resolving the same token twice yields the
    /// same result without repeating warnings, since any mode switch happens
    /// on the first encounter.
    pub fn resolve(
        &mut self,
        token: &str,
        context: &str,
        diags: &mut Diagnostics,
    ) -> Result<Resolved, ResolveError> {
        let stripped = strip_quotes(token);
        if let Some(resolved) = self.try_match(stripped, context, diags) {
            return Ok(resolved);
        }

        let cleaned = sanitize_sid(stripped);
        if !cleaned.is_empty() && cleaned != stripped {
            if let Some(resolved) = self.try_match(&cleaned, context, diags) {
                diags.info(format!(
                    "{context}: reference '{token}' cleaned to '{cleaned}' and found"
                ));
                return Ok(resolved);
            }
        }

        Err(ResolveError::ReferenceNotFound {
            token: token.trim().to_string(),
            context: context.to_string(),
        })
    }

    /// Resolves every species reference inside a rule string.
    ///
    /// Returns the rule in both vocabularies: the ID form feeds the MathML
    /// encoder, the display form is what a spreadsheet cell shows. Operators,
    /// parentheses, thresholds and numeric constants pass through untouched.
    pub fn resolve_rule(
        &mut self,
        rule: &str,
        context: &str,
        diags: &mut Diagnostics,
    ) -> Result<ResolvedRule, ResolveError> {
        let spans = scan_references(rule);

        // First pass settles the mode over the whole rule, so that the
        // substitution pass renders every reference in one vocabulary.
        for span in &spans {
            self.observe(&span.text, context, diags);
        }

        let mut id_rule = rule.to_string();
        let mut display_rule = rule.to_string();
        for span in spans.iter().rev() {
            let resolved = self.resolve_fixed(&span.text, context, diags)?;
            id_rule.replace_range(span.start..span.end, &resolved.species_id);
            display_rule.replace_range(span.start..span.end, &resolved.rendered);
        }

        Ok(ResolvedRule {
            id_rule,
            display_rule,
        })
    }

    fn classify(&self, token: &str) -> (bool, Option<String>) {
        (
            self.context.is_id(token),
            self.context.lookup_name(token).map(str::to_string),
        )
    }

    /// Single-reference mode logic: in ID mode a Name-only token switches to
    /// Name mode; in Name mode an ID-only token switches back, and a token
    /// valid both ways resolves as an ID and switches, since IDs win ties.
    fn try_match(&mut self, token: &str, context: &str, diags: &mut Diagnostics) -> Option<Resolved> {
        let (as_id, as_name) = self.classify(token);
        match self.mode {
            ResolutionMode::Id => {
                if as_id {
                    Some(Resolved {
                        species_id: token.to_string(),
                        rendered: token.to_string(),
                    })
                } else if let Some(id) = as_name {
                    diags.warn(format!(
                        "{context}: reference '{token}' matches a species Name, not an ID; resolving references by Name from here on"
                    ));
                    self.mode = ResolutionMode::Name;
                    let rendered = self.context.display_name(&id);
                    Some(Resolved {
                        species_id: id,
                        rendered,
                    })
                } else {
                    None
                }
            }
            ResolutionMode::Name => {
                if as_id && as_name.is_some() {
                    diags.warn(format!(
                        "{context}: reference '{token}' matches both a species ID and a Name; treating it as an ID and resolving references by ID from here on"
                    ));
                    self.mode = ResolutionMode::Id;
                    Some(Resolved {
                        species_id: token.to_string(),
                        rendered: token.to_string(),
                    })
                } else if let Some(id) = as_name {
                    let rendered = self.context.display_name(&id);
                    Some(Resolved {
                        species_id: id,
                        rendered,
                    })
                } else if as_id {
                    diags.warn(format!(
                        "{context}: reference '{token}' matches a species ID, not a Name; resolving references by ID from here on"
                    ));
                    self.mode = ResolutionMode::Id;
                    Some(Resolved {
                        species_id: token.to_string(),
                        rendered: token.to_string(),
                    })
                } else {
                    None
                }
            }
        }
    }

    /// Mode decision for one reference inside a rule. Unlike the single-cell
    /// path, an ID-only token seen in Name mode does not flip the mode back:
    /// every ID renders fine as a display name, so the rule stays in one
    /// vocabulary. Only a token valid both ways forces ID mode.
    fn observe(&mut self, raw: &str, context: &str, diags: &mut Diagnostics) {
        let token = strip_quotes(raw);
        let (mut as_id, mut as_name) = self.classify(token);
        if !as_id && as_name.is_none() {
            let cleaned = sanitize_sid(token);
            if !cleaned.is_empty() && cleaned != token {
                (as_id, as_name) = self.classify(&cleaned);
            }
        }

        match self.mode {
            ResolutionMode::Id => {
                if !as_id && as_name.is_some() {
                    diags.warn(format!(
                        "{context}: reference '{token}' matches a species Name, not an ID; resolving references by Name from here on"
                    ));
                    self.mode = ResolutionMode::Name;
                }
            }
            ResolutionMode::Name => {
                if as_id && as_name.is_some() {
                    diags.warn(format!(
                        "{context}: reference '{token}' matches both a species ID and a Name; treating it as an ID and resolving references by ID from here on"
                    ));
                    self.mode = ResolutionMode::Id;
                }
            }
        }
    }

    /// Resolves one reference without touching the mode.
    fn resolve_fixed(
        &self,
        raw: &str,
        context: &str,
        diags: &mut Diagnostics,
    ) -> Result<Resolved, ResolveError> {
        let token = strip_quotes(raw);
        if let Some(resolved) = self.match_fixed(token) {
            return Ok(resolved);
        }

        let cleaned = sanitize_sid(token);
        if !cleaned.is_empty() && cleaned != token {
            if let Some(resolved) = self.match_fixed(&cleaned) {
                diags.info(format!(
                    "{context}: reference '{raw}' cleaned to '{cleaned}' and found"
                ));
                return Ok(resolved);
            }
        }

        Err(ResolveError::ReferenceNotFound {
            token: raw.to_string(),
            context: context.to_string(),
        })
    }

    fn match_fixed(&self, token: &str) -> Option<Resolved> {
        let id = if self.context.is_id(token) {
            token.to_string()
        } else {
            self.context.lookup_name(token)?.to_string()
        };
        let rendered = match self.mode {
            ResolutionMode::Id => id.clone(),
            ResolutionMode::Name => self.context.display_name(&id),
        };
        Some(Resolved {
            species_id: id,
            rendered,
        })
    }
}

/// A species reference found inside a rule string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    text: String,
}

const RULE_KEYWORDS: [&str; 3] = ["and", "or", "not"];

fn is_rule_keyword(word: &str) -> bool {
    RULE_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

/// Whether a multi-word match contains a word-form operator, split on the
/// same separator characters the compound pattern accepts.
fn compound_contains_keyword(text: &str) -> bool {
    text.split(|c: char| matches!(c, ' ' | '\t' | '\'' | '+' | ',' | '.' | '/' | '-'))
        .any(is_rule_keyword)
}

/// Finds every candidate reference in a rule, leaving operators, grouping
/// and numeric literals unclaimed. Quoted names are matched first, then
/// unquoted multi-word or punctuated names, then plain identifiers; later
/// patterns never claim text already covered by an earlier one. The word
/// operators `and`/`or`/`not` are never references, whatever their case,
/// and a multi-word match containing one is left for the narrower patterns.
fn scan_references(rule: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut claimed = vec![false; rule.len()];

    for (re, multi_word) in [
        (&*QUOTED_RE, false),
        (&*COMPOUND_RE, true),
        (&*IDENT_RE, false),
    ] {
        for m in re.find_iter(rule) {
            if claimed[m.start()..m.end()].iter().any(|c| *c) {
                continue;
            }
            if is_rule_keyword(strip_quotes(m.as_str()))
                || (multi_word && compound_contains_keyword(m.as_str()))
            {
                continue;
            }
            for c in &mut claimed[m.start()..m.end()] {
                *c = true;
            }
            spans.push(Span {
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
            });
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}
