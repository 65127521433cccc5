//! Error types for template parsing and evaluation.

use thiserror::Error;

use crate::lexer::Span;
use crate::operator::ComparisonOperator;

/// What went wrong while assembling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A directive comment was opened but never closed.
    #[error("unterminated directive")]
    UnterminatedDirective,

    /// A comment looks like a directive but matches no directive syntax.
    #[error("malformed directive '{0}'")]
    MalformedDirective(String),

    /// A sample literal following a directive is broken.
    #[error("malformed sample literal: {0}")]
    MalformedLiteral(&'static str),

    /// Two directives claim the same stretch of text.
    #[error("directive '{first}' overlaps directive '{second}'")]
    Overlap {
        /// Text of the earlier directive.
        first: String,
        /// Text of the later directive.
        second: String,
    },

    /// A `for` directive has no matching `end`.
    #[error("missing /*end*/ for loop '{name}'")]
    MissingEnd {
        /// The loop variable name.
        name: String,
    },

    /// An `end` directive has no opening `for`.
    #[error("/*end*/ without a matching /*for*/")]
    UnexpectedEnd,

    /// An option is not of the form `key=value`.
    #[error("malformed option '{0}'")]
    MalformedOption(String),

    /// An option has a value of the wrong shape.
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidOptionValue {
        /// Option key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// A directive names no expression.
    #[error("directive has an empty expression")]
    EmptyExpression,
}

/// A fatal template parse error, located in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    /// The error category.
    pub kind: ParseErrorKind,
    /// The offending source span.
    pub span: Span,
    /// 1-based line of the span start.
    pub line: usize,
    /// 1-based column (in characters) of the span start.
    pub column: usize,
}

impl ParseError {
    /// Creates a parse error, computing line and column from `source`.
    #[must_use]
    pub fn new(kind: ParseErrorKind, span: Span, source: &str) -> Self {
        let (line, column) = span.line_col(source);
        Self {
            kind,
            span,
            line,
            column,
        }
    }
}

/// Direction of a bound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    /// Data read by the statement.
    Input,
    /// Data written by the statement.
    Output,
}

impl std::fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// A fatal error while evaluating a template against a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The context has no value for a directive's expression.
    #[error("no value bound for parameter '{0}'")]
    MissingParameter(String),

    /// The bound value has the wrong shape for the directive.
    #[error("parameter '{name}' must be {expected}")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Description of the expected shape.
        expected: &'static str,
    },

    /// A two-value operator received the wrong number of values.
    #[error("operator {operator} on '{name}' needs {expected} values, got {actual}")]
    OperatorCardinality {
        /// Parameter name.
        name: String,
        /// The operator override.
        operator: ComparisonOperator,
        /// Required value count.
        expected: usize,
        /// Supplied value count.
        actual: usize,
    },

    /// The operator override cannot be applied to this directive.
    #[error("operator {operator} cannot be applied to '{name}'")]
    OperatorNotApplicable {
        /// Parameter name.
        name: String,
        /// The operator override.
        operator: ComparisonOperator,
    },

    /// A replace variable value failed `sqlKeywordCheck`.
    #[error("value '{value}' for '{name}' is not a safe identifier list")]
    KeywordCheckFailed {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: String,
    },

    /// A replace or output variable value contains a `?`.
    #[error("value of '{name}' contains a '?' placeholder")]
    PlaceholderInText {
        /// Parameter name.
        name: String,
    },

    /// A parameter marker default does not fit its declared type.
    #[error("default '{value}' for '{name}' does not match its declared type")]
    InvalidDefault {
        /// Parameter name.
        name: String,
        /// The default text.
        value: String,
    },

    /// More than one stream of the same direction was bound.
    #[error("an {direction} stream is already bound")]
    DuplicateStream {
        /// Stream direction.
        direction: StreamDirection,
    },
}

/// Any error raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Template parse error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Evaluation error.
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
