//! Rule notation transcoding, operator form to colon form.
//!
//! A pure text-to-text rewrite applied just before a rule is written out for
//! display; parsing accepts both notations, so no inverse transcoder exists.
//! Three independent substitution passes, each firing only on its own
//! operator:
//!
//! - `VAR >= N` becomes `VAR` for N = 1, else `VAR:N`
//! - `VAR < N` becomes `!VAR` for N = 1, else `!VAR:N`
//! - `VAR = N` / `VAR == N` becomes `!VAR` for N = 0, `VAR` for N = 1,
//!   else `VAR:N`

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref GEQ_PASS: Regex = Regex::new(r"(\w+)\s*>=\s*(\d+)").unwrap();
    static ref LT_PASS: Regex = Regex::new(r"(\w+)\s*<\s*(\d+)").unwrap();
    static ref EQ_PASS: Regex = Regex::new(r"(\w+)\s*=\s*(\d+)").unwrap();
    static ref EQEQ_PASS: Regex = Regex::new(r"(\w+)\s*==\s*(\d+)").unwrap();
}

/// Rewrites a rule from operator notation to colon notation.
///
/// Idempotent: colon-notation text contains none of the rewritten operators,
/// so a second application is a no-op. Operators without a colon counterpart
/// (`<=`, `>`, `!=`) pass through untouched.
pub fn to_colon_notation(rule: &str) -> String {
    let rule = GEQ_PASS.replace_all(rule, |caps: &Captures| {
        let var = &caps[1];
        match &caps[2] {
            "1" => var.to_string(),
            threshold => format!("{var}:{threshold}"),
        }
    });

    let rule = LT_PASS.replace_all(&rule, |caps: &Captures| {
        let var = &caps[1];
        match &caps[2] {
            "1" => format!("!{var}"),
            threshold => format!("!{var}:{threshold}"),
        }
    });

    let eq_rewrite = |caps: &Captures| {
        let var = &caps[1];
        match &caps[2] {
            "0" => format!("!{var}"),
            "1" => var.to_string(),
            threshold => format!("{var}:{threshold}"),
        }
    };
    let rule = EQ_PASS.replace_all(&rule, eq_rewrite);
    let rule = EQEQ_PASS.replace_all(&rule, eq_rewrite);

    rule.into_owned()
}
