use std::fmt;

use thiserror::Error;

use crate::types::CompileError;

/// 1-based line and column of a position in the XML source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Converts a byte offset into `source` to a line/column pair. Columns
    /// count characters, not bytes.
    pub(crate) fn from_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// What went wrong while loading rule XML.
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("malformed XML: {0}")]
    Syntax(String),

    #[error("missing required root element 'rewrite'")]
    MissingRoot,

    #[error("missing required element '{element}' in '{parent}'")]
    MissingElement {
        element: &'static str,
        parent: &'static str,
    },

    #[error("missing required attribute '{attribute}' on '{element}'")]
    MissingAttribute {
        attribute: &'static str,
        element: &'static str,
    },

    #[error("invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: &'static str, value: String },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Errors produced when loading rule XML, with the position of the offending
/// element when one is known.
#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
    location: Option<Location>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, location: Option<Location>) -> Self {
        Self { kind, location }
    }

    pub(crate) fn at(kind: ParseErrorKind, location: Location) -> Self {
        Self::new(kind, Some(location))
    }

    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error")?;
        if let Some(loc) = self.location {
            write!(f, " at {loc}")?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrorKind::Compile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> Self {
        Self::new(kind, None)
    }
}
