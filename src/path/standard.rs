//! The identity mapper: lex the segment exactly as given.

use crate::error::{ValidationError, ValidationLevel};
use crate::lexer::PathLexer;
use crate::token::Token;
use crate::validated::Validated;

use super::PathMapper;

/// Lexes the sentence as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardPathMapper;

impl PathMapper for StandardPathMapper {
    fn name(&self) -> &'static str {
        "StandardPathMapper"
    }

    fn map(&self, path: &str, sentence: &str, lexer: &PathLexer) -> Validated<Vec<Token>> {
        if sentence.is_empty() {
            return Validated::invalid(ValidationError::NoResultsFoundForNode {
                path: path.to_string(),
                missing: sentence.to_string(),
                level: ValidationLevel::MissingValue,
            });
        }
        lexer.scan(sentence)
    }
}
