//! Parser collaborator: turns source text into a [`Module`].
//!
//! Parsing real source is delegated to an external front-end. The crate only ships
//! [`JsonTreeParser`], which accepts the serialized tree exchange format.
use crate::ast::Module;
use murk_utils::errors::ParseError;

pub trait Parser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Module, ParseError>;
}

/// Reads a module serialized as JSON (see [`crate::ast`] for the format).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTreeParser;

impl Parser for JsonTreeParser {
    fn parse(&self, source: &str) -> Result<Module, ParseError> {
        let trimmed = source.trim_start();
        if !trimmed.starts_with('{') {
            return Err(ParseError::Syntax(
                "expected a JSON object holding a module".to_string(),
            ));
        }
        Ok(serde_json::from_str(trimmed)?)
    }
}
