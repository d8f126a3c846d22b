//! Abstract syntax tree for transition rules.
//!
//! The tree is a small closed sum type: flat matches everywhere, no shared
//! ownership. One tree is built per rule string and discarded after codec
//! translation.

use std::collections::HashMap;
use std::fmt;

/// Comparison operator of a threshold expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Le,
    Ge,
    Lt,
    Gt,
}

impl CmpOp {
    /// Operator spelling used when rendering rule text.
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Neq => "!=",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
        }
    }

    /// MathML element name for this operator.
    pub fn mathml_tag(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Neq => "neq",
            CmpOp::Le => "leq",
            CmpOp::Ge => "geq",
            CmpOp::Lt => "lt",
            CmpOp::Gt => "gt",
        }
    }
}

/// A parsed transition rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Bare reference, meaning "level >= 1". A purely numeric name is a
    /// constant: `"0"` is false, any other digit string is true.
    Id(String),
    /// Threshold comparison `species OP threshold`.
    Cmp(CmpOp, String, u32),
    /// `!species` without a threshold, meaning "species = 0".
    NotSpecies(String),
    /// Negation of a compound sub-expression.
    Not(Box<Expr>),
    /// Conjunction; binds tighter than `Or`.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Collects every species identifier referenced by this tree, in first
    /// appearance order, deduplicated. Numeric constants are not species and
    /// are skipped.
    pub fn species_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<String>) {
        let mut push = |name: &str| {
            if !name.chars().all(|c| c.is_ascii_digit()) && !ids.iter().any(|i| i == name) {
                ids.push(name.to_string());
            }
        };
        match self {
            Expr::Id(name) | Expr::NotSpecies(name) => push(name),
            Expr::Cmp(_, name, _) => push(name),
            Expr::Not(inner) => inner.collect_ids(ids),
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_ids(ids);
                right.collect_ids(ids);
            }
        }
    }

    /// Evaluates the rule over an integer level assignment. Species missing
    /// from the map are at level 0.
    pub fn eval(&self, levels: &HashMap<String, u32>) -> bool {
        let level_of = |name: &str| levels.get(name).copied().unwrap_or(0);
        match self {
            Expr::Id(name) => {
                if name.chars().all(|c| c.is_ascii_digit()) {
                    name != "0"
                } else {
                    level_of(name) >= 1
                }
            }
            Expr::Cmp(op, name, threshold) => {
                let level = level_of(name);
                match op {
                    CmpOp::Eq => level == *threshold,
                    CmpOp::Neq => level != *threshold,
                    CmpOp::Le => level <= *threshold,
                    CmpOp::Ge => level >= *threshold,
                    CmpOp::Lt => level < *threshold,
                    CmpOp::Gt => level > *threshold,
                }
            }
            Expr::NotSpecies(name) => level_of(name) == 0,
            Expr::Not(inner) => !inner.eval(levels),
            Expr::And(left, right) => left.eval(levels) && right.eval(levels),
            Expr::Or(left, right) => left.eval(levels) || right.eval(levels),
        }
    }

    /// Renders the tree back to rule text in operator notation.
    ///
    /// Keeps round-tripped text close to canonical form: `X >= 1` and
    /// `X == 1` render as bare `X`, `X == 0` renders as `!X`. Sub-expressions
    /// are parenthesized only when operators of different kinds mix, so the
    /// output re-parses to a structurally equivalent tree.
    pub fn render(&self) -> String {
        match self {
            Expr::Id(name) => name.clone(),
            Expr::Cmp(CmpOp::Ge, name, 1) => name.clone(),
            Expr::Cmp(CmpOp::Eq, name, 1) => name.clone(),
            Expr::Cmp(CmpOp::Eq, name, 0) => format!("!{}", name),
            Expr::Cmp(op, name, threshold) => {
                format!("{} {} {}", name, op.as_str(), threshold)
            }
            Expr::NotSpecies(name) => format!("!{}", name),
            Expr::Not(inner) => {
                let body = inner.render();
                if body.contains(' ') {
                    format!("!({})", body)
                } else {
                    format!("!{}", body)
                }
            }
            Expr::And(left, right) => {
                let wrap = |e: &Expr| {
                    let text = e.render();
                    if matches!(e, Expr::Or(_, _)) {
                        format!("({})", text)
                    } else {
                        text
                    }
                };
                format!("{} & {}", wrap(left), wrap(right))
            }
            Expr::Or(left, right) => {
                let wrap = |e: &Expr| {
                    let text = e.render();
                    if matches!(e, Expr::And(_, _)) {
                        format!("({})", text)
                    } else {
                        text
                    }
                };
                format!("{} | {}", wrap(left), wrap(right))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn levels(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_species_ids_deduplicated_in_order() {
        let expr = Expr::Or(
            Box::new(Expr::And(
                Box::new(Expr::Id("B".into())),
                Box::new(Expr::Cmp(CmpOp::Ge, "A".into(), 2)),
            )),
            Box::new(Expr::NotSpecies("B".into())),
        );
        assert_eq!(expr.species_ids(), vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_species_ids_skip_numeric_constants() {
        let expr = Expr::Or(
            Box::new(Expr::Id("1".into())),
            Box::new(Expr::Id("A".into())),
        );
        assert_eq!(expr.species_ids(), vec!["A".to_string()]);
    }

    #[test]
    fn test_eval_thresholds() {
        let expr = Expr::Cmp(CmpOp::Ge, "A".into(), 2);
        assert!(!expr.eval(&levels(&[("A", 1)])));
        assert!(expr.eval(&levels(&[("A", 2)])));
        assert!(expr.eval(&levels(&[("A", 3)])));
    }

    #[test]
    fn test_eval_constants() {
        assert!(Expr::Id("1".into()).eval(&levels(&[])));
        assert!(Expr::Id("2".into()).eval(&levels(&[])));
        assert!(!Expr::Id("0".into()).eval(&levels(&[])));
    }

    #[test]
    fn test_render_canonicalizes_boolean_forms() {
        assert_eq!(Expr::Cmp(CmpOp::Ge, "A".into(), 1).render(), "A");
        assert_eq!(Expr::Cmp(CmpOp::Eq, "A".into(), 1).render(), "A");
        assert_eq!(Expr::Cmp(CmpOp::Eq, "A".into(), 0).render(), "!A");
        assert_eq!(Expr::Cmp(CmpOp::Ge, "A".into(), 2).render(), "A >= 2");
    }

    #[test]
    fn test_render_parenthesizes_mixed_operators() {
        let expr = Expr::And(
            Box::new(Expr::Or(
                Box::new(Expr::Id("A".into())),
                Box::new(Expr::Id("B".into())),
            )),
            Box::new(Expr::Id("C".into())),
        );
        assert_eq!(expr.render(), "(A | B) & C");

        let chain = Expr::And(
            Box::new(Expr::And(
                Box::new(Expr::Id("A".into())),
                Box::new(Expr::Id("B".into())),
            )),
            Box::new(Expr::Id("C".into())),
        );
        assert_eq!(chain.render(), "A & B & C");
    }
}
