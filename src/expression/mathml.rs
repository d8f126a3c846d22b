//! Translation between rule ASTs and MathML content fragments.
//!
//! The emitted subset is fixed: `<apply>` with one of and/or/not or a
//! relational operator, `<ci>` species references, `<cn type="integer">`
//! thresholds, and the `<true/>`/`<false/>` constants. Reading accepts the
//! same subset plus n-ary and/or (folded left-associatively) and an optional
//! `<math>` wrapper, since SBML files written by other tools use both.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ast::{CmpOp, Expr};
use super::error::ExpressionError;

pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Renders an AST as a MathML content fragment (no `<math>` wrapper).
pub fn to_mathml(expr: &Expr) -> String {
    match expr {
        Expr::Id(name) => {
            if name.chars().all(|c| c.is_ascii_digit()) {
                // Numeric constants encode hard-coded truth values.
                if name == "0" {
                    "<false/>".to_string()
                } else {
                    "<true/>".to_string()
                }
            } else {
                format!(
                    "<apply><geq/><ci>{}</ci><cn type=\"integer\">1</cn></apply>",
                    name
                )
            }
        }
        Expr::Cmp(op, name, threshold) => format!(
            "<apply><{op}/><ci>{name}</ci><cn type=\"integer\">{threshold}</cn></apply>",
            op = op.mathml_tag(),
        ),
        Expr::NotSpecies(name) => format!(
            "<apply><eq/><ci>{}</ci><cn type=\"integer\">0</cn></apply>",
            name
        ),
        Expr::Not(inner) => format!("<apply><not/>{}</apply>", to_mathml(inner)),
        Expr::And(left, right) => format!(
            "<apply><and/>{}{}</apply>",
            to_mathml(left),
            to_mathml(right)
        ),
        Expr::Or(left, right) => format!(
            "<apply><or/>{}{}</apply>",
            to_mathml(left),
            to_mathml(right)
        ),
    }
}

/// Renders an AST as a complete `<math>` element, as stored on a function
/// term.
pub fn to_mathml_document(expr: &Expr) -> String {
    format!("<math xmlns=\"{}\">{}</math>", MATHML_NS, to_mathml(expr))
}

/// Parses a MathML fragment back into an AST.
///
/// Returns `Ok(None)` for a blank fragment (empty input, comments only, or an
/// `<apply>` with no operands); callers substitute the constant rule `"1"`
/// with a warning in that case.
pub fn from_mathml(fragment: &str) -> Result<Option<Expr>, ExpressionError> {
    let nodes = parse_elements(fragment)?;
    let mut exprs = Vec::new();
    for node in &nodes {
        if let Some(expr) = element_to_expr(node, fragment)? {
            exprs.push(expr);
        }
    }
    // A fragment holds at most one top-level expression.
    match exprs.len() {
        0 => Ok(None),
        1 => Ok(Some(exprs.remove(0))),
        _ => Err(ExpressionError::MalformedMathMl(format!(
            "multiple top-level expressions in: {fragment}"
        ))),
    }
}

/// Minimal XML element tree, enough to walk the supported MathML subset.
#[derive(Debug)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

fn parse_elements(fragment: &str) -> Result<Vec<XmlElement>, ExpressionError> {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut roots: Vec<XmlElement> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = local_name(&String::from_utf8_lossy(start.name().as_ref()));
                stack.push(XmlElement {
                    name,
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Event::Empty(empty) => {
                let name = local_name(&String::from_utf8_lossy(empty.name().as_ref()));
                let element = XmlElement {
                    name,
                    text: String::new(),
                    children: Vec::new(),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(
                        text.unescape()
                            .map_err(|e| ExpressionError::MalformedMathMl(e.to_string()))?
                            .trim(),
                    );
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    ExpressionError::MalformedMathMl(format!("unbalanced end tag in: {fragment}"))
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            // Rule comments written alongside the math are skipped.
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::CData(_) => {}
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ExpressionError::MalformedMathMl(format!(
            "unclosed element in: {fragment}"
        )));
    }
    Ok(roots)
}

fn local_name(name: &str) -> String {
    name.rsplit(':').next().unwrap_or(name).to_string()
}

fn element_to_expr(
    element: &XmlElement,
    fragment: &str,
) -> Result<Option<Expr>, ExpressionError> {
    match element.name.as_str() {
        "math" => {
            let mut exprs = Vec::new();
            for child in &element.children {
                if let Some(expr) = element_to_expr(child, fragment)? {
                    exprs.push(expr);
                }
            }
            Ok(exprs.into_iter().next())
        }
        "apply" => apply_to_expr(element, fragment),
        "ci" => Ok(Some(Expr::Id(element.text.trim().to_string()))),
        "cn" => integer_text(&element.text, fragment).map(|n| Some(Expr::Id(n.to_string()))),
        "true" => Ok(Some(Expr::Id("1".to_string()))),
        "false" => Ok(Some(Expr::Id("0".to_string()))),
        other => Err(ExpressionError::UnsupportedMathMl {
            element: other.to_string(),
            fragment: fragment.to_string(),
        }),
    }
}

fn apply_to_expr(element: &XmlElement, fragment: &str) -> Result<Option<Expr>, ExpressionError> {
    let Some((operator, operands)) = element.children.split_first() else {
        // An empty <apply> is a blank rule, reported upstream as a warning.
        return Ok(None);
    };

    match operator.name.as_str() {
        "and" | "or" => {
            let mut parts = Vec::new();
            for operand in operands {
                if let Some(expr) = element_to_expr(operand, fragment)? {
                    parts.push(expr);
                }
            }
            let mut iter = parts.into_iter();
            let Some(first) = iter.next() else {
                return Ok(None);
            };
            let is_and = operator.name == "and";
            Ok(Some(iter.fold(first, |acc, next| {
                if is_and {
                    Expr::And(Box::new(acc), Box::new(next))
                } else {
                    Expr::Or(Box::new(acc), Box::new(next))
                }
            })))
        }
        "not" => {
            let inner = operands
                .first()
                .map(|operand| element_to_expr(operand, fragment))
                .transpose()?
                .flatten();
            Ok(inner.map(|expr| Expr::Not(Box::new(expr))))
        }
        "eq" | "neq" | "leq" | "geq" | "lt" | "gt" => {
            let op = match operator.name.as_str() {
                "eq" => CmpOp::Eq,
                "neq" => CmpOp::Neq,
                "leq" => CmpOp::Le,
                "geq" => CmpOp::Ge,
                "lt" => CmpOp::Lt,
                _ => CmpOp::Gt,
            };
            let [left, right] = operands else {
                return Err(ExpressionError::MalformedMathMl(format!(
                    "relational operator with {} operand(s) in: {}",
                    operands.len(),
                    fragment
                )));
            };
            if left.name != "ci" {
                return Err(ExpressionError::UnsupportedMathMl {
                    element: left.name.clone(),
                    fragment: fragment.to_string(),
                });
            }
            let name = left.text.trim().to_string();
            let threshold = match right.name.as_str() {
                "cn" => integer_text(&right.text, fragment)?,
                "true" => 1,
                "false" => 0,
                other => {
                    return Err(ExpressionError::UnsupportedMathMl {
                        element: other.to_string(),
                        fragment: fragment.to_string(),
                    })
                }
            };
            Ok(Some(Expr::Cmp(op, name, threshold)))
        }
        other => Err(ExpressionError::UnsupportedMathMl {
            element: other.to_string(),
            fragment: fragment.to_string(),
        }),
    }
}

/// Parses a `<cn>` payload; SBML tools emit both `1` and `1.0` spellings.
fn integer_text(text: &str, fragment: &str) -> Result<u32, ExpressionError> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value >= 0.0 => Ok(value as u32),
        _ => Err(ExpressionError::MalformedMathMl(format!(
            "non-integer constant '{trimmed}' in: {fragment}"
        ))),
    }
}
