//! Template rendering.
//!
//! - [`lexer`] - Mustache tag scanner
//! - [`mustache`] - logic-less renderer
//!
//! The aggregator only depends on [`TemplateRenderer`]: rendering a data
//! tree, and tokenizing a template so the fields it references can be
//! reconciled with the declared specs.

pub mod lexer;
pub mod mustache;

use serde_json::Value;
use thiserror::Error;

pub use lexer::tokenize;
pub use mustache::Mustache;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unclosed tag at offset {offset}")]
    UnclosedTag { offset: usize },

    #[error("Empty tag at offset {offset}")]
    EmptyTag { offset: usize },

    #[error("Invalid delimiter tag at offset {offset}: '{content}'")]
    InvalidDelimiter { offset: usize, content: String },

    #[error("Unclosed section '{name}'")]
    UnclosedSection { name: String },

    #[error("Unexpected closing tag '{name}' at offset {offset}")]
    UnexpectedClose { name: String, offset: usize },

    #[error("Section '{expected}' closed by '{found}' at offset {offset}")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("Partials nested deeper than {0} levels")]
    RecursionLimit(usize),
}

/// What a tag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text between tags.
    Text,
    /// `{{name}}`
    Variable,
    /// `{{{name}}}` or `{{& name}}`
    Unescaped,
    /// `{{#name}}`
    Section,
    /// `{{^name}}`
    Inverted,
    /// `{{/name}}`
    Close,
    /// `{{! ... }}`
    Comment,
    /// `{{> name}}`
    Partial,
    /// `{{=<% %>=}}`
    Delimiter,
}

/// One scanned piece of a template. For [`TokenKind::Text`] the `name` is
/// the literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateToken {
    pub kind: TokenKind,
    pub name: String,
    /// Byte offset of the token in the template.
    pub offset: usize,
}

impl TemplateToken {
    /// Whether this token reads a value from the data tree.
    pub fn is_data_reference(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Variable | TokenKind::Unescaped | TokenKind::Section | TokenKind::Inverted
        )
    }
}

/// Renders a data tree through a template.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError>;

    fn tokenize(&self, template: &str) -> Result<Vec<TemplateToken>, TemplateError>;
}

impl<T: TemplateRenderer + ?Sized> TemplateRenderer for Box<T> {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        (**self).render(template, data)
    }

    fn tokenize(&self, template: &str) -> Result<Vec<TemplateToken>, TemplateError> {
        (**self).tokenize(template)
    }
}
