//! Error types shared by the scanner, parser, and evaluator.
//!
//! Every error enum here derives its `Display` impl through `thiserror`.

use thiserror::Error;

use crate::scanner::Position;

/// Every parse failure code the scanner and parser can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    PrematureEndOfInput,
    UnexpectedValue,
    ExpectedNameChar(Option<char>),
    ExpectedNodeTypeTest,
    ExpectedInteger,
    InvalidNumber,
    EmptyPredicate,
    UnbalancedPredicateDelimiter,
    ExtraJunkAfterPredicate,
    UnsupportedPredicateType,
    SliceStepIsZero,
    NotAJsonPath,
    NullExpression,
    ZeroLengthExpression,
    UnsupportedEscapeSequence,
    UnsupportedUnicodeSequence,
    OutOfMemory,
}

impl ParseErrorCode {
    fn message(self) -> String {
        match self {
            ParseErrorCode::PrematureEndOfInput => "premature end of input".to_string(),
            ParseErrorCode::UnexpectedValue => "unexpected value".to_string(),
            ParseErrorCode::ExpectedNameChar(Some(c)) => {
                format!("expected a name character, got '{c}'")
            }
            ParseErrorCode::ExpectedNameChar(None) => {
                "expected a name character, got end of input".to_string()
            }
            ParseErrorCode::ExpectedNodeTypeTest => "expected a node type test".to_string(),
            ParseErrorCode::ExpectedInteger => "expected an integer".to_string(),
            ParseErrorCode::InvalidNumber => "invalid number".to_string(),
            ParseErrorCode::EmptyPredicate => "empty predicate".to_string(),
            ParseErrorCode::UnbalancedPredicateDelimiter => {
                "unbalanced predicate delimiter".to_string()
            }
            ParseErrorCode::ExtraJunkAfterPredicate => "extra input after predicate".to_string(),
            ParseErrorCode::UnsupportedPredicateType => "unsupported predicate type".to_string(),
            ParseErrorCode::SliceStepIsZero => "slice step must not be zero".to_string(),
            ParseErrorCode::NotAJsonPath => "not a JSONPath expression".to_string(),
            ParseErrorCode::NullExpression => "expression is null".to_string(),
            ParseErrorCode::ZeroLengthExpression => "expression has zero length".to_string(),
            ParseErrorCode::UnsupportedEscapeSequence => "unsupported escape sequence".to_string(),
            ParseErrorCode::UnsupportedUnicodeSequence => {
                "unsupported unicode sequence".to_string()
            }
            ParseErrorCode::OutOfMemory => "out of memory".to_string(),
        }
    }
}

/// Raised by the scanner; the parser wraps it into a [`ParseError`] with
/// whatever context it had at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", self.code.message())]
pub struct ScanError {
    pub position: Position,
    pub code: ParseErrorCode,
}

impl ScanError {
    pub fn new(position: Position, code: ParseErrorCode) -> Self {
        Self { position, code }
    }
}

/// One parser diagnostic, rendered with a 1-based column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at position {}: {}", self.position.column, self.code.message())]
pub struct ParseError {
    pub position: Position,
    pub code: ParseErrorCode,
}

impl ParseError {
    pub fn new(position: Position, code: ParseErrorCode) -> Self {
        Self { position, code }
    }
}

impl From<ScanError> for ParseError {
    fn from(value: ScanError) -> Self {
        ParseError::new(value.position, value.code)
    }
}

/// Fatal evaluation errors. Carries the index of the step that failed,
/// except for the document/path-shape preconditions which fail before any
/// step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("model is null")]
    ModelIsNull,
    #[error("path is null")]
    PathIsNull,
    #[error("no document in model")]
    NoDocumentInModel,
    #[error("no root in document")]
    NoRootInDocument,
    #[error("path is empty")]
    PathIsEmpty,
    #[error("unexpected document node")]
    UnexpectedDocumentNode(usize),
    #[error("unsupported path")]
    UnsupportedPath(usize),
    #[error("out of memory")]
    OutOfMemory(usize),
}

impl EvalError {
    /// The step index at which evaluation aborted, where applicable
    /// (used to render "evaluator aborted at step N").
    pub fn step(&self) -> Option<usize> {
        match self {
            EvalError::UnexpectedDocumentNode(i)
            | EvalError::UnsupportedPath(i)
            | EvalError::OutOfMemory(i) => Some(*i),
            _ => None,
        }
    }
}
