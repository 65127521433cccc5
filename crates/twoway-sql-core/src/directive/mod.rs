//! Directive matchers.
//!
//! Every directive syntax has its own [`Matcher`]. All matchers run over the
//! same source text; the template assembler merges their results by offset.

mod matchers;
mod options;

pub use matchers::{
    BindVariableArrayMatcher, BindVariableMatcher, ForMatcher, OutputVariableMatcher,
    ParameterMarkerMatcher, ReplaceVariableMatcher, StreamMatcher,
};
pub use options::Options;

use crate::error::ParseError;
use crate::lexer::Span;
use crate::node::NodeKind;

/// What a matcher found.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `/*for variable:collection*/`.
    ForStart {
        /// Loop variable.
        variable: String,
        /// Collection expression.
        collection: String,
    },
    /// `/*end*/`.
    ForEnd,
    /// Any directive that becomes a node on its own.
    Node(NodeKind),
}

/// A directive match and the source span it claims.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveMatch {
    /// The matched text, including any swallowed sample literal.
    pub span: Span,
    /// The directive.
    pub directive: Directive,
}

/// Scans source text for one directive syntax.
pub trait Matcher: Send + Sync {
    /// Returns a human-readable name for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns every match in `source`, in source order.
    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError>;
}

/// All built-in matchers.
pub static MATCHERS: [&dyn Matcher; 7] = [
    &BindVariableMatcher,
    &BindVariableArrayMatcher,
    &ForMatcher,
    &ReplaceVariableMatcher,
    &OutputVariableMatcher,
    &ParameterMarkerMatcher,
    &StreamMatcher,
];
