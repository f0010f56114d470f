//! Tokens produced by lexing a dotted/bracketed configuration path.

use std::fmt;

/// One step through the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Descend into a map entry by name.
    Object(String),
    /// Descend into an array slot by index.
    Array(usize),
}

impl Token {
    /// Build an object token.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// Build an array token.
    #[must_use]
    pub fn array(index: usize) -> Self {
        Self::Array(index)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(name) => f.write_str(name),
            Self::Array(index) => write!(f, "[{index}]"),
        }
    }
}

/// Render a token sequence back into its canonical path form.
///
/// Object tokens are joined with `.`; array tokens attach directly to the
/// preceding token: `[Object("a"), Array(0), Object("b")]` renders as
/// `a[0].b`.
#[must_use]
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Object(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Token::Array(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}
