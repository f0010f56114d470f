//! Lexer turning dotted/bracketed path strings into token sequences.

use regex::Regex;

use crate::error::ValidationError;
use crate::token::Token;
use crate::validated::Validated;

/// Default separator between object segments.
pub const DEFAULT_DELIMITER: char = '.';

/// Splits a path on a delimiter and lexes each segment into tokens.
///
/// A segment is a name optionally followed by one or more `[i]` index
/// groups. Empty segments, unmatched brackets, and non-integer or negative
/// indices are rejected with a `FailedToTokenize` error and no partial
/// result.
///
/// # Examples
///
/// ```
/// use gestalt::lexer::PathLexer;
/// use gestalt::token::Token;
///
/// let lexer = PathLexer::new();
/// let tokens = lexer.scan("db.hosts[2].name").into_value().unwrap();
/// assert_eq!(tokens[1], Token::object("hosts"));
/// assert_eq!(tokens[2], Token::array(2));
/// ```
#[derive(Debug, Clone)]
pub struct PathLexer {
    delimiter: char,
    segment: Regex,
    index: Regex,
}

impl PathLexer {
    /// Lexer with the standard `.` delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER)
    }

    /// Lexer splitting on a custom delimiter.
    ///
    /// # Panics
    ///
    /// Panics if the delimiter is one of the bracket characters, which
    /// would make index groups unlexable.
    #[must_use]
    pub fn with_delimiter(delimiter: char) -> Self {
        assert!(
            delimiter != '[' && delimiter != ']',
            "path delimiter must not be a bracket"
        );
        // The segment grammar never changes at runtime, so compilation
        // cannot fail once these literals are right.
        let segment = Regex::new(r"^(?P<name>[^\[\]]+)?(?P<indices>(?:\[\d+\])*)$")
            .expect("segment pattern is valid");
        let index = Regex::new(r"\[(\d+)\]").expect("index pattern is valid");
        Self {
            delimiter,
            segment,
            index,
        }
    }

    /// The configured delimiter.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Lex a full path into tokens.
    ///
    /// An empty path lexes to zero tokens, naming the tree root.
    #[must_use]
    pub fn scan(&self, path: &str) -> Validated<Vec<Token>> {
        if path.is_empty() {
            return Validated::valid(Vec::new());
        }
        let mut tokens = Vec::new();
        for segment in path.split(self.delimiter) {
            match self.scan_segment(segment, path) {
                Ok(segment_tokens) => tokens.extend(segment_tokens),
                Err(error) => return Validated::invalid(error),
            }
        }
        Validated::valid(tokens)
    }

    fn scan_segment(&self, segment: &str, path: &str) -> Result<Vec<Token>, ValidationError> {
        let failed = || ValidationError::FailedToTokenize {
            segment: segment.to_string(),
            path: path.to_string(),
        };
        let captures = self.segment.captures(segment).ok_or_else(|| failed())?;
        let mut tokens = Vec::new();
        if let Some(name) = captures.name("name") {
            tokens.push(Token::object(name.as_str()));
        }
        if let Some(indices) = captures.name("indices") {
            for capture in self.index.captures_iter(indices.as_str()) {
                let index: usize = capture[1].parse().map_err(|_| failed())?;
                tokens.push(Token::array(index));
            }
        }
        if tokens.is_empty() {
            return Err(failed());
        }
        Ok(tokens)
    }
}

impl Default for PathLexer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::PathLexer;
    use crate::error::ValidationError;
    use crate::token::{render, Token};

    #[test]
    fn scans_objects_and_indices() {
        let lexer = PathLexer::new();
        let tokens = lexer.scan("db.hosts[0].name").into_value().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::object("db"),
                Token::object("hosts"),
                Token::array(0),
                Token::object("name"),
            ]
        );
    }

    #[test]
    fn scans_repeated_indices() {
        let lexer = PathLexer::new();
        let tokens = lexer.scan("grid[1][2]").into_value().unwrap();
        assert_eq!(
            tokens,
            vec![Token::object("grid"), Token::array(1), Token::array(2)]
        );
    }

    #[test]
    fn empty_path_is_the_root() {
        let lexer = PathLexer::new();
        let tokens = lexer.scan("").into_value().unwrap();
        assert!(tokens.is_empty());
    }

    #[rstest]
    #[case("a..b")]
    #[case("a[1")]
    #[case("a]1[")]
    #[case("a[-1]")]
    #[case("a[one]")]
    #[case(".a")]
    fn rejects_malformed_segments(#[case] path: &str) {
        let lexer = PathLexer::new();
        let result = lexer.scan(path);
        assert!(!result.has_results(), "{path} should not lex");
        assert!(matches!(
            result.errors()[0],
            ValidationError::FailedToTokenize { .. }
        ));
    }

    #[rstest]
    #[case("db.port")]
    #[case("db.hosts[0].name")]
    #[case("grid[1][2]")]
    #[case("Server.Port")]
    fn render_round_trips(#[case] path: &str) {
        let lexer = PathLexer::new();
        let tokens = lexer.scan(path).into_value().unwrap();
        assert_eq!(render(&tokens), path);
    }

    #[test]
    fn custom_delimiter() {
        let lexer = PathLexer::with_delimiter('/');
        let tokens = lexer.scan("db/port").into_value().unwrap();
        assert_eq!(tokens, vec![Token::object("db"), Token::object("port")]);
    }
}
