use std::fmt;

use chumsky::error::Simple;

use crate::span::{make_span, LineIndex, Span};

/// Malformed rule text. Fatal to the whole load.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.span.file, self.span.line, self.span.col, self.message
        )
    }
}

impl std::error::Error for ParseError {}

pub(crate) fn raw_error(
    message: impl Into<String>,
    file: &str,
    span: std::ops::Range<usize>,
    line_index: &LineIndex,
) -> ParseError {
    ParseError {
        message: message.into(),
        span: make_span(file, span, line_index),
    }
}

pub(crate) fn to_parse_error<T: fmt::Display + std::hash::Hash + std::cmp::Eq>(
    err: Simple<T>,
    file: &str,
    line_index: &LineIndex,
) -> ParseError {
    raw_error(err.to_string(), file, err.span(), line_index)
}
