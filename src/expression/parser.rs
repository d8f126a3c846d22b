//! Tokenizer and recursive-descent parser for the transition-rule grammar.
//!
//! Operator precedence, low to high: `|` then `&` then `!`/comparison, with
//! parentheses for grouping. Both threshold notations are accepted here:
//! operator form (`A >= 2`) and colon shorthand (`A:2`); the tokenizer keeps
//! embedded colons inside identifier tokens and the parser splits them.

use super::ast::{CmpOp, Expr};
use super::error::ExpressionError;

/// One lexical token of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Identifier, possibly with an embedded colon threshold (`A:2`) or a
    /// purely numeric constant.
    Ident(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
    Cmp(CmpOp),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{}'", name),
            Token::And => "'&'".to_string(),
            Token::Or => "'|'".to_string(),
            Token::Not => "'!'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Cmp(op) => format!("'{}'", op.as_str()),
        }
    }
}

/// Splits a rule into tokens. All whitespace is stripped first; multi-character
/// operators are matched greedily (`>=` before `>`, `!=` before `!`).
fn tokenize(rule: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = rule.chars().filter(|c| !c.is_whitespace()).collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            let mut j = i + 1;
            while j < chars.len()
                && (chars[j].is_alphanumeric() || chars[j] == '_' || chars[j] == ':')
            {
                j += 1;
            }
            tokens.push(Token::Ident(chars[i..j].iter().collect()));
            i = j;
            continue;
        }
        match ch {
            '&' => tokens.push(Token::And),
            '|' => tokens.push(Token::Or),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Cmp(CmpOp::Neq));
                    i += 1;
                } else {
                    tokens.push(Token::Not);
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Cmp(CmpOp::Ge));
                    i += 1;
                } else {
                    tokens.push(Token::Cmp(CmpOp::Gt));
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Cmp(CmpOp::Le));
                    i += 1;
                } else {
                    tokens.push(Token::Cmp(CmpOp::Lt));
                }
            }
            '=' => {
                // Accept both `=` and `==`.
                if chars.get(i + 1) == Some(&'=') {
                    i += 1;
                }
                tokens.push(Token::Cmp(CmpOp::Eq));
            }
            other => {
                return Err(ExpressionError::UnexpectedCharacter {
                    character: other,
                    rule: rule.to_string(),
                })
            }
        }
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a> {
    rule: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    paren_depth: usize,
}

/// Parses a rule string into an [`Expr`].
pub fn parse(rule: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(rule)?;
    let mut parser = Parser {
        rule,
        tokens,
        pos: 0,
        paren_depth: 0,
    };
    let expr = parser.parse_expr()?;
    if parser.peek().is_some() {
        return Err(ExpressionError::TrailingTokens {
            rule: rule.to_string(),
        });
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn paren_counts(&self) -> (usize, usize) {
        let open = self.tokens.iter().filter(|t| **t == Token::LParen).count();
        let close = self.tokens.iter().filter(|t| **t == Token::RParen).count();
        (open, close)
    }

    fn expect_rparen(&mut self) -> Result<(), ExpressionError> {
        match self.peek() {
            Some(Token::RParen) => {
                self.pos += 1;
                Ok(())
            }
            Some(other) => {
                let token = other.describe();
                Err(ExpressionError::UnexpectedToken {
                    token,
                    rule: self.rule.to_string(),
                })
            }
            None => {
                if self.paren_depth > 0 {
                    let (open, close) = self.paren_counts();
                    Err(ExpressionError::MissingClosingParen {
                        open,
                        close,
                        rule: self.rule.to_string(),
                    })
                } else {
                    Err(ExpressionError::UnexpectedEnd {
                        rule: self.rule.to_string(),
                    })
                }
            }
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut node = self.parse_term()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.pos += 1;
            let rhs = self.parse_term()?;
            node = Expr::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Expr, ExpressionError> {
        let mut node = self.parse_factor()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.pos += 1;
            let rhs = self.parse_factor()?;
            node = Expr::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<Expr, ExpressionError> {
        match self.advance() {
            Some(Token::Ident(name)) => self.parse_reference(name),
            Some(Token::Not) => {
                if let Some(Token::Ident(name)) = self.peek().cloned() {
                    self.pos += 1;
                    if name.contains(':') {
                        // `!A:2` means A < 2.
                        let (species, threshold) = self.split_colon(&name)?;
                        Ok(Expr::Cmp(CmpOp::Lt, species, threshold))
                    } else {
                        // `!A` means A = 0, distinct from generic negation.
                        Ok(Expr::NotSpecies(name))
                    }
                } else {
                    let inner = self.parse_factor()?;
                    Ok(Expr::Not(Box::new(inner)))
                }
            }
            Some(Token::LParen) => {
                self.paren_depth += 1;
                let node = self.parse_expr()?;
                self.expect_rparen()?;
                self.paren_depth -= 1;
                Ok(node)
            }
            Some(other) => Err(ExpressionError::UnexpectedToken {
                token: other.describe(),
                rule: self.rule.to_string(),
            }),
            None => Err(ExpressionError::UnexpectedEnd {
                rule: self.rule.to_string(),
            }),
        }
    }

    /// Parses what follows an identifier token: an optional comparator with an
    /// integer threshold, or a colon shorthand embedded in the token itself.
    fn parse_reference(&mut self, name: String) -> Result<Expr, ExpressionError> {
        if let Some(Token::Cmp(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            // If what follows the comparator is not an integer, back off and
            // treat the identifier as a bare reference.
            if let Some(Token::Ident(next)) = self.peek() {
                if let Ok(threshold) = next.parse::<u32>() {
                    self.pos += 1;
                    return Ok(Expr::Cmp(op, name, threshold));
                }
            }
            return Ok(Expr::Id(name));
        }
        if name.contains(':') {
            // `A:2` is shorthand for A >= 2.
            let (species, threshold) = self.split_colon(&name)?;
            return Ok(Expr::Cmp(CmpOp::Ge, species, threshold));
        }
        Ok(Expr::Id(name))
    }

    fn split_colon(&self, token: &str) -> Result<(String, u32), ExpressionError> {
        let (species, rest) = token.split_once(':').unwrap_or((token, ""));
        let threshold = if rest.is_empty() {
            1
        } else {
            rest.parse()
                .map_err(|_| ExpressionError::InvalidThreshold {
                    threshold: rest.to_string(),
                    rule: self.rule.to_string(),
                })?
        };
        Ok((species.to_string(), threshold))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        let expr = parse("A & B | !C").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(Expr::And(
                    Box::new(Expr::Id("A".into())),
                    Box::new(Expr::Id("B".into())),
                )),
                Box::new(Expr::NotSpecies("C".into())),
            )
        );
    }

    #[test]
    fn test_left_associativity() {
        let expr = parse("A | B | C").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(Expr::Or(
                    Box::new(Expr::Id("A".into())),
                    Box::new(Expr::Id("B".into())),
                )),
                Box::new(Expr::Id("C".into())),
            )
        );
    }

    #[test]
    fn test_colon_shorthand_means_geq() {
        assert_eq!(parse("A:2").unwrap(), Expr::Cmp(CmpOp::Ge, "A".into(), 2));
        assert_eq!(parse("A:").unwrap(), Expr::Cmp(CmpOp::Ge, "A".into(), 1));
    }

    #[test]
    fn test_negated_colon_means_less_than() {
        assert_eq!(parse("!A:2").unwrap(), Expr::Cmp(CmpOp::Lt, "A".into(), 2));
    }

    #[test]
    fn test_bare_negation_means_equals_zero() {
        assert_eq!(parse("!A").unwrap(), Expr::NotSpecies("A".into()));
    }

    #[test]
    fn test_comparators() {
        assert_eq!(parse("A>=2").unwrap(), Expr::Cmp(CmpOp::Ge, "A".into(), 2));
        assert_eq!(parse("A<=2").unwrap(), Expr::Cmp(CmpOp::Le, "A".into(), 2));
        assert_eq!(parse("A>2").unwrap(), Expr::Cmp(CmpOp::Gt, "A".into(), 2));
        assert_eq!(parse("A<2").unwrap(), Expr::Cmp(CmpOp::Lt, "A".into(), 2));
        assert_eq!(parse("A=2").unwrap(), Expr::Cmp(CmpOp::Eq, "A".into(), 2));
        assert_eq!(parse("A==2").unwrap(), Expr::Cmp(CmpOp::Eq, "A".into(), 2));
        assert_eq!(parse("A!=2").unwrap(), Expr::Cmp(CmpOp::Neq, "A".into(), 2));
    }

    #[test]
    fn test_comparator_without_integer_backs_off() {
        // Comparator at the end of the rule degrades to a bare reference.
        assert_eq!(parse("A>=").unwrap(), Expr::Id("A".into()));
    }

    #[test]
    fn test_numeric_constant_rule() {
        assert_eq!(parse("1").unwrap(), Expr::Id("1".into()));
        assert_eq!(parse("0").unwrap(), Expr::Id("0".into()));
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(parse("  A  &\tB ").unwrap(), parse("A&B").unwrap());
    }

    #[test]
    fn test_parenthesized_grouping() {
        let expr = parse("(A | B) & C").unwrap();
        assert_eq!(
            expr,
            Expr::And(
                Box::new(Expr::Or(
                    Box::new(Expr::Id("A".into())),
                    Box::new(Expr::Id("B".into())),
                )),
                Box::new(Expr::Id("C".into())),
            )
        );
    }

    #[test]
    fn test_negation_of_compound_expression() {
        let expr = parse("!(A & B)").unwrap();
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::And(
                Box::new(Expr::Id("A".into())),
                Box::new(Expr::Id("B".into())),
            )))
        );
    }

    #[test]
    fn test_unbalanced_parenthesis_reports_counts() {
        let err = parse("(A & B").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1 opening '(' but only 0 closing ')'"), "{message}");
    }

    #[test]
    fn test_trailing_tokens_error() {
        // The comparator backs off to a bare `A`, leaving `B` unconsumed.
        let err = parse("A >= B").unwrap_err();
        assert!(matches!(err, ExpressionError::TrailingTokens { .. }));
    }

    #[test]
    fn test_unexpected_character_names_offender() {
        let err = parse("A % B").unwrap_err();
        let message = err.to_string();
        assert!(message.contains('%'));
        assert!(message.contains("A % B"));
    }
}
