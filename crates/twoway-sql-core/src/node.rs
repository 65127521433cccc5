//! Template nodes and their evaluation.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};

use crate::collection::{ParameterDeclaration, SqlParameterCollection};
use crate::context::Scope;
use crate::directive::Options;
use crate::error::EvalError;
use crate::lexer::Span;
use crate::operator::{Comparison, ComparisonOperator};
use crate::value::{ParamValue, SqlValue};

/// Identifier lists accepted by `sqlKeywordCheck=true`, e.g. `a.b desc, 2`.
static SAFE_IDENTIFIER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    let item = r"[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*(?:\s+(?:asc|desc))?(?:\s+nulls\s+(?:first|last))?";
    Regex::new(&format!(r"(?i)^\s*{item}(?:\s*,\s*{item})*\s*$"))
        .expect("invalid identifier list regex")
});

/// A node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Byte span of the matched text in the source.
    pub span: Span,
    /// Character offset of the match start in the source.
    pub index: usize,
    /// The source text this node replaces.
    pub text: String,
    /// What the node does.
    pub kind: NodeKind,
}

/// The node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain SQL text copied verbatim.
    Literal,
    /// `/*name*/literal`: one `?` and one bind value.
    BindVariable(BindVariable),
    /// `expr IN /*name*/(...)`: a predicate over a collection.
    BindVariableArray(BindVariableArray),
    /// `/*for x:xs*/ ... /*end*/`.
    For(ForLoop),
    /// `/*$name*/sample`: text substitution.
    ReplaceVariable(ReplaceVariable),
    /// `/*#name*/`: raw text output.
    OutputVariable(OutputVariable),
    /// `/*@name=value;type=T@*/`: parameter metadata.
    ParameterMarker(ParameterMarker),
    /// `/*@in expr*/`.
    InputStream(StreamBinding),
    /// `/*@out expr*/`.
    OutputStream(StreamBinding),
}

/// A scalar bind variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindVariable {
    /// Bound name.
    pub name: String,
    /// Directive options.
    pub options: Options,
    /// The comparison operator written before the directive, if any.
    pub operator: Option<String>,
    /// Whitespace between the operator and the directive.
    pub gap: String,
    /// The swallowed sample literal.
    pub sample: Option<String>,
}

/// A bind variable expanded over a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct BindVariableArray {
    /// Bound name.
    pub name: String,
    /// Directive options.
    pub options: Options,
    /// The left-hand expression (`t.col`): literal text, possibly with replace
    /// variables that supply part of it (`/*$col*/id`).
    pub expression: Vec<Node>,
    /// The operator token as written (`in`, `not in`).
    pub operator: String,
    /// The swallowed literal list, including parentheses.
    pub sample: String,
}

/// A loop over a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    /// Loop variable bound to each element.
    pub variable: String,
    /// Name of the collection to iterate.
    pub collection: String,
    /// Loop body.
    pub body: Vec<Node>,
}

/// A text substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceVariable {
    /// Bound name.
    pub name: String,
    /// Directive options.
    pub options: Options,
    /// The swallowed sample text.
    pub sample: String,
    /// Replace only this many leading characters of the sample.
    pub length: Option<usize>,
    /// Reject values that are not plain identifier lists.
    pub keyword_check: bool,
}

/// Raw text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputVariable {
    /// Bound name.
    pub name: String,
    /// Directive options.
    pub options: Options,
}

/// Parameter metadata declared in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMarker {
    /// Declared name.
    pub name: String,
    /// Default value text.
    pub default: Option<String>,
    /// Remaining options (`type=...`).
    pub options: Options,
}

/// A stream binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBinding {
    /// Name of the stream-valued context entry.
    pub expression: String,
}

impl Node {
    /// Creates a node covering `span` of `source`.
    #[must_use]
    pub fn new(kind: NodeKind, span: Span, source: &str) -> Self {
        Self {
            span,
            index: span.char_index(source),
            text: String::from(span.slice(source)),
            kind,
        }
    }

    /// Returns the bound expression, for directive nodes that have one.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Literal => None,
            NodeKind::BindVariable(n) => Some(&n.name),
            NodeKind::BindVariableArray(n) => Some(&n.name),
            NodeKind::For(n) => Some(&n.collection),
            NodeKind::ReplaceVariable(n) => Some(&n.name),
            NodeKind::OutputVariable(n) => Some(&n.name),
            NodeKind::ParameterMarker(n) => Some(&n.name),
            NodeKind::InputStream(n) | NodeKind::OutputStream(n) => Some(&n.expression),
        }
    }

    /// Returns the directive options, for directive nodes that have them.
    #[must_use]
    pub fn options(&self) -> Option<&Options> {
        match &self.kind {
            NodeKind::BindVariable(n) => Some(&n.options),
            NodeKind::BindVariableArray(n) => Some(&n.options),
            NodeKind::ReplaceVariable(n) => Some(&n.options),
            NodeKind::OutputVariable(n) => Some(&n.options),
            NodeKind::ParameterMarker(n) => Some(&n.options),
            _ => None,
        }
    }

    /// Evaluates this node, appending its output to `out`.
    pub fn evaluate(
        &self,
        scope: &Scope<'_>,
        out: &mut SqlParameterCollection,
    ) -> Result<(), EvalError> {
        if !matches!(self.kind, NodeKind::Literal) {
            trace!(index = self.index, text = %self.text, "Evaluating directive");
        }
        match &self.kind {
            NodeKind::Literal => {
                out.push_sql(&self.text);
                Ok(())
            }
            NodeKind::BindVariable(node) => node.evaluate(scope, out),
            NodeKind::BindVariableArray(node) => node.evaluate(scope, out),
            NodeKind::For(node) => node.evaluate(scope, out),
            NodeKind::ReplaceVariable(node) => node.evaluate(scope, out),
            NodeKind::OutputVariable(node) => node.evaluate(scope, out),
            NodeKind::ParameterMarker(node) => {
                node.evaluate(out);
                Ok(())
            }
            NodeKind::InputStream(node) => match resolve(scope, &node.expression)? {
                ParamValue::InputStream(stream) => out.bind_input_stream(stream.clone()),
                _ => Err(mismatch(&node.expression, "an input stream")),
            },
            NodeKind::OutputStream(node) => match resolve(scope, &node.expression)? {
                ParamValue::OutputStream(stream) => out.bind_output_stream(stream.clone()),
                _ => Err(mismatch(&node.expression, "an output stream")),
            },
        }
    }
}

/// Evaluates a node sequence left to right.
pub fn evaluate_all(
    nodes: &[Node],
    scope: &Scope<'_>,
    out: &mut SqlParameterCollection,
) -> Result<(), EvalError> {
    nodes.iter().try_for_each(|node| node.evaluate(scope, out))
}

fn resolve<'a>(scope: &Scope<'a>, name: &str) -> Result<&'a ParamValue, EvalError> {
    scope
        .resolve(name)
        .ok_or_else(|| EvalError::MissingParameter(String::from(name)))
}

/// Splices substituted text into the statement.
///
/// Text cannot carry a `?`: it would be a placeholder with no bind value.
fn push_text(out: &mut SqlParameterCollection, name: &str, text: &str) -> Result<(), EvalError> {
    if text.contains('?') {
        return Err(EvalError::PlaceholderInText {
            name: String::from(name),
        });
    }
    out.push_sql(text);
    Ok(())
}

fn mismatch(name: &str, expected: &'static str) -> EvalError {
    EvalError::TypeMismatch {
        name: String::from(name),
        expected,
    }
}

/// Resolves a bind name, falling back to a parameter marker default.
///
/// The default is read according to the marker's declared type.
fn resolve_bound(
    scope: &Scope<'_>,
    out: &SqlParameterCollection,
    name: &str,
) -> Result<ParamValue, EvalError> {
    if let Some(value) = scope.resolve(name) {
        return Ok(value.clone());
    }
    let declaration = out
        .declaration(name)
        .ok_or_else(|| EvalError::MissingParameter(String::from(name)))?;
    let default = declaration
        .default
        .as_deref()
        .ok_or_else(|| EvalError::MissingParameter(String::from(name)))?;
    SqlValue::parse_as(default, declaration.sql_type.as_deref())
        .map(ParamValue::Value)
        .ok_or_else(|| EvalError::InvalidDefault {
            name: String::from(name),
            value: String::from(default),
        })
}

impl BindVariable {
    fn evaluate(&self, scope: &Scope<'_>, out: &mut SqlParameterCollection) -> Result<(), EvalError> {
        let value = match resolve_bound(scope, out, &self.name)? {
            ParamValue::Value(value) => value,
            _ => return Err(mismatch(&self.name, "a scalar value")),
        };
        let sql_type = self.options.get("type");

        match scope.context().operator(&self.name) {
            None => {
                if let Some(operator) = &self.operator {
                    out.push_sql(operator);
                }
                out.push_sql(&self.gap);
                out.push_bind(&self.name, value, sql_type);
            }
            Some(comparison) => {
                if self.operator.is_none() {
                    return Err(EvalError::OperatorNotApplicable {
                        name: self.name.clone(),
                        operator: comparison.operator,
                    });
                }
                let token = comparison.scalar_token(&self.name)?;
                if out.sql().ends_with(|c: char| !c.is_whitespace()) {
                    out.push_sql(" ");
                }
                out.push_sql(token);
                out.push_sql(if self.gap.is_empty() { " " } else { self.gap.as_str() });
                out.push_bind(&self.name, comparison.operator.transform(value), sql_type);
            }
        }
        Ok(())
    }
}

impl BindVariableArray {
    /// Returns the source span of the left-hand expression.
    #[must_use]
    pub fn expression_span(&self) -> Span {
        match (self.expression.first(), self.expression.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::default(),
        }
    }

    fn evaluate(&self, scope: &Scope<'_>, out: &mut SqlParameterCollection) -> Result<(), EvalError> {
        let bound = resolve_bound(scope, out, &self.name)?;
        let elements = bound
            .elements()
            .ok_or_else(|| mismatch(&self.name, "a value or collection"))?;
        let values = elements
            .into_iter()
            .map(|element| {
                element
                    .as_scalar()
                    .cloned()
                    .ok_or_else(|| mismatch(&self.name, "a collection of scalar values"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let comparison = scope.context().operator(&self.name).unwrap_or_else(|| {
            let negated = self.operator.to_ascii_lowercase().starts_with("not");
            Comparison::from(if negated {
                ComparisonOperator::Neq
            } else {
                ComparisonOperator::Eq
            })
        });
        let mut lhs = SqlParameterCollection::new();
        evaluate_all(&self.expression, scope, &mut lhs)?;
        comparison.render_list(
            &self.name,
            lhs.sql(),
            values,
            self.options.get("type"),
            out,
        )
    }
}

impl ForLoop {
    fn evaluate(&self, scope: &Scope<'_>, out: &mut SqlParameterCollection) -> Result<(), EvalError> {
        let collection = resolve(scope, &self.collection)?;
        let elements = collection
            .elements()
            .ok_or_else(|| mismatch(&self.collection, "a collection"))?;
        trace!(
            variable = %self.variable,
            iterations = elements.len(),
            "Expanding loop"
        );
        for element in elements {
            let frame = Scope::Frame {
                parent: scope,
                name: &self.variable,
                value: element,
            };
            evaluate_all(&self.body, &frame, out)?;
        }
        Ok(())
    }
}

impl ReplaceVariable {
    fn evaluate(&self, scope: &Scope<'_>, out: &mut SqlParameterCollection) -> Result<(), EvalError> {
        let value = match scope.resolve(&self.name) {
            Some(ParamValue::Value(value)) if !value.is_null() => value.to_raw_text(),
            Some(ParamValue::Value(_)) | None => {
                warn!(name = %self.name, sample = %self.sample, "No value bound, keeping sample text");
                out.push_sql(&self.sample);
                return Ok(());
            }
            Some(_) => return Err(mismatch(&self.name, "a scalar value")),
        };

        if self.keyword_check && !SAFE_IDENTIFIER_LIST.is_match(&value) {
            return Err(EvalError::KeywordCheckFailed {
                name: self.name.clone(),
                value,
            });
        }

        match self.length {
            None => push_text(out, &self.name, &value),
            Some(length) => {
                let replaced = format!("{value:<length$.length$}");
                let suffix: String = self.sample.chars().skip(length).collect();
                push_text(out, &self.name, &replaced)?;
                out.push_sql(&suffix);
                Ok(())
            }
        }
    }
}

impl OutputVariable {
    fn evaluate(&self, scope: &Scope<'_>, out: &mut SqlParameterCollection) -> Result<(), EvalError> {
        match resolve(scope, &self.name)? {
            ParamValue::Value(value) => push_text(out, &self.name, &value.to_raw_text()),
            _ => Err(mismatch(&self.name, "a scalar value")),
        }
    }
}

impl ParameterMarker {
    fn evaluate(&self, out: &mut SqlParameterCollection) {
        out.declare(ParameterDeclaration {
            name: self.name.clone(),
            default: self.default.clone(),
            sql_type: self.options.get("type").map(String::from),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParametersContext;
    use crate::value::list;

    fn replace(sample: &str, length: Option<usize>, keyword_check: bool) -> Node {
        let source = format!("/*$v*/{sample}");
        Node::new(
            NodeKind::ReplaceVariable(ReplaceVariable {
                name: String::from("v"),
                options: Options::default(),
                sample: String::from(sample),
                length,
                keyword_check,
            }),
            Span::new(0, source.len()),
            &source,
        )
    }

    fn eval(node: &Node, context: &ParametersContext) -> Result<SqlParameterCollection, EvalError> {
        let mut out = SqlParameterCollection::new();
        node.evaluate(&Scope::root(context), &mut out)?;
        Ok(out.finish())
    }

    #[test]
    fn test_replace_with_length_keeps_suffix() {
        let node = replace("all_db_links", Some(3), false);
        let out = eval(&node, &ParametersContext::new().with("v", "dba")).unwrap();
        assert_eq!(out.sql(), "dba_db_links");
        assert!(out.binds().is_empty());
    }

    #[test]
    fn test_replace_with_length_truncates_and_pads() {
        let node = replace("all_db_links", Some(3), false);
        let out = eval(&node, &ParametersContext::new().with("v", "user")).unwrap();
        assert_eq!(out.sql(), "use_db_links");
        let out = eval(&node, &ParametersContext::new().with("v", "x")).unwrap();
        assert_eq!(out.sql(), "x  _db_links");
    }

    #[test]
    fn test_replace_whole_sample() {
        let node = replace("all_db_links", None, false);
        let out = eval(&node, &ParametersContext::new().with("v", "dba_users")).unwrap();
        assert_eq!(out.sql(), "dba_users");
    }

    #[test]
    fn test_replace_falls_back_to_sample() {
        let node = replace("all_db_links", None, false);
        let out = eval(&node, &ParametersContext::new()).unwrap();
        assert_eq!(out.sql(), "all_db_links");
    }

    #[test]
    fn test_keyword_check() {
        let node = replace("id", None, true);
        let ok = eval(&node, &ParametersContext::new().with("v", "aa,bb")).unwrap();
        assert_eq!(ok.sql(), "aa,bb");
        let ok = eval(
            &node,
            &ParametersContext::new().with("v", "t.a DESC, b asc nulls last"),
        )
        .unwrap();
        assert_eq!(ok.sql(), "t.a DESC, b asc nulls last");

        for bad in ["id;DROP TABLE users", "a) or (1=1", "a -- x", "drop table x"] {
            let err = eval(&node, &ParametersContext::new().with("v", bad)).unwrap_err();
            assert!(
                matches!(err, EvalError::KeywordCheckFailed { .. }),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_safe_identifier_regex() {
        assert!(SAFE_IDENTIFIER_LIST.is_match("1, 2"));
        assert!(!SAFE_IDENTIFIER_LIST.is_match(""));
        assert!(!SAFE_IDENTIFIER_LIST.is_match("a,"));
    }

    #[test]
    fn test_output_rejects_collections() {
        let node = Node::new(
            NodeKind::OutputVariable(OutputVariable {
                name: String::from("v"),
                options: Options::default(),
            }),
            Span::new(0, 6),
            "/*#v*/",
        );
        let context = ParametersContext::new().with("v", list([1_i64, 2]));
        assert!(matches!(
            eval(&node, &context),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_node_index_is_char_offset() {
        let source = "é /*#v*/";
        let start = source.find("/*").unwrap();
        let node = Node::new(
            NodeKind::OutputVariable(OutputVariable {
                name: String::from("v"),
                options: Options::default(),
            }),
            Span::new(start, source.len()),
            source,
        );
        assert_eq!(node.index, 2);
        assert_eq!(node.text, "/*#v*/");
        assert_eq!(node.expression(), Some("v"));
    }
}
