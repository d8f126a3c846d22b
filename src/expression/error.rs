use thiserror::Error;

/// Errors raised while parsing a rule string or translating MathML.
///
/// All variants carry the offending rule or fragment verbatim so that callers
/// can show actionable diagnostics. Each error is fatal to the single rule it
/// occurred in, never to the whole conversion.
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// A character outside the rule grammar was encountered.
    #[error("Unexpected character '{character}' in rule: {rule}")]
    UnexpectedCharacter { character: char, rule: String },

    /// The rule ended while a closing parenthesis was still expected.
    #[error(
        "Unexpected end of expression. Missing closing parenthesis ')'. \
         Found {open} opening '(' but only {close} closing ')' in: {rule}"
    )]
    MissingClosingParen {
        open: usize,
        close: usize,
        rule: String,
    },

    /// The rule ended where more tokens were required.
    #[error("Unexpected end of expression. Expected more tokens after: {rule}")]
    UnexpectedEnd { rule: String },

    /// A token was found where another kind of token was required.
    #[error("Unexpected token {token} in rule: {rule}")]
    UnexpectedToken { token: String, rule: String },

    /// A colon threshold shorthand did not carry an integer.
    #[error("Invalid threshold '{threshold}' in rule: {rule}")]
    InvalidThreshold { threshold: String, rule: String },

    /// The whole rule parsed but tokens were left over.
    #[error("Unexpected trailing tokens in rule: {rule}")]
    TrailingTokens { rule: String },

    /// The MathML fragment was not well-formed XML.
    #[error("Malformed MathML: {0}")]
    MalformedMathMl(String),

    /// A MathML element outside the supported subset was encountered.
    #[error("Unsupported MathML element <{element}> in: {fragment}")]
    UnsupportedMathMl { element: String, fragment: String },

    /// The XML reader failed.
    #[error("Failed to read MathML: {0}")]
    XmlError(#[from] quick_xml::Error),
}
