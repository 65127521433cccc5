//! Template assembly and evaluation.

use tracing::{debug, trace};

use crate::collection::SqlParameterCollection;
use crate::context::{ParametersContext, Scope};
use crate::directive::{Directive, DirectiveMatch, MATCHERS};
use crate::error::{EvalError, ParseError, ParseErrorKind};
use crate::lexer::Span;
use crate::node::{evaluate_all, ForLoop, Node, NodeKind};

/// A parsed template: the source text and its node tree.
///
/// A template is immutable once parsed and can be evaluated any number of
/// times, from any number of threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

/// An open `for` loop while assembling.
struct OpenLoop {
    variable: String,
    collection: String,
    start: Span,
    body: Vec<Node>,
}

impl Template {
    /// Parses a single statement's template text.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut matches = Vec::new();
        for matcher in MATCHERS {
            let found = matcher.scan(source)?;
            trace!(matcher = matcher.name(), count = found.len(), "Scanned directives");
            matches.extend(found);
        }
        matches.sort_by_key(|m| (m.span.start, m.span.end));
        let mut matches = nest_array_expressions(source, matches);
        matches.sort_by_key(|m| (m.span.start, m.span.end));

        check_overlaps(source, &matches)?;
        check_unclaimed_comments(source, &matches)?;

        let directive_count = matches.len();
        let nodes = assemble(source, matches)?;
        debug!(
            nodes = nodes.len(),
            directives = directive_count,
            "Assembled template"
        );
        Ok(Self {
            source: String::from(source),
            nodes,
        })
    }

    /// Returns the template source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the root node sequence.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Evaluates the template against `context`.
    pub fn evaluate(&self, context: &ParametersContext) -> Result<SqlParameterCollection, EvalError> {
        let mut out = SqlParameterCollection::new();
        evaluate_all(&self.nodes, &Scope::root(context), &mut out)?;
        let out = out.finish();
        debug!(binds = out.binds().len(), "Evaluated template");
        Ok(out)
    }

    /// Returns the SQL with every directive comment removed and every sample
    /// literal kept: the statement the raw template runs as.
    ///
    /// Loop bodies appear once.
    #[must_use]
    pub fn to_sample_sql(&self) -> String {
        let mut sql = String::with_capacity(self.source.len());
        write_sample(&self.nodes, &mut sql);
        sql
    }

    /// Returns the context names the template reads, in first-use order.
    ///
    /// Names bound by an enclosing `for` loop are not included.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut loop_vars = Vec::new();
        collect_names(&self.nodes, &mut loop_vars, &mut names);
        names
    }
}

/// Moves replace variables that end inside an array bind's left-hand
/// expression into that expression, so `/*$col*/id in /*ids*/(1)` is one node.
fn nest_array_expressions(source: &str, matches: Vec<DirectiveMatch>) -> Vec<DirectiveMatch> {
    let expressions: Vec<Option<Span>> = matches
        .iter()
        .map(|m| match &m.directive {
            Directive::Node(NodeKind::BindVariableArray(array)) => Some(array.expression_span()),
            _ => None,
        })
        .collect();
    let owners: Vec<Option<usize>> = matches
        .iter()
        .map(|m| {
            if !matches!(m.directive, Directive::Node(NodeKind::ReplaceVariable(_))) {
                return None;
            }
            expressions.iter().position(|expression| {
                expression.is_some_and(|e| m.span.end > e.start && m.span.end <= e.end)
            })
        })
        .collect();

    let mut nested: Vec<Vec<DirectiveMatch>> = matches.iter().map(|_| Vec::new()).collect();
    let mut kept = Vec::with_capacity(matches.len());
    for (i, m) in matches.into_iter().enumerate() {
        match owners[i] {
            Some(owner) => nested[owner].push(m),
            None => kept.push((i, m)),
        }
    }

    kept.into_iter()
        .map(|(i, mut m)| {
            let parts = std::mem::take(&mut nested[i]);
            if let (Some(expression), Directive::Node(NodeKind::BindVariableArray(array))) =
                (expressions[i], &mut m.directive)
            {
                if let Some(first) = parts.first() {
                    trace!(name = %array.name, parts = parts.len(), "Nesting array expression");
                    m.span.start = m.span.start.min(first.span.start);
                    array.expression = expression_nodes(source, expression, parts);
                }
            }
            m
        })
        .collect()
}

/// Splits an array bind's expression into literal text and nested directives.
fn expression_nodes(source: &str, expression: Span, parts: Vec<DirectiveMatch>) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut cursor = expression.start;
    for part in parts {
        if part.span.start > cursor {
            let literal = Span::new(cursor, part.span.start);
            nodes.push(Node::new(NodeKind::Literal, literal, source));
        }
        cursor = part.span.end;
        if let Directive::Node(kind) = part.directive {
            nodes.push(Node::new(kind, part.span, source));
        }
    }
    if cursor < expression.end {
        let literal = Span::new(cursor, expression.end);
        nodes.push(Node::new(NodeKind::Literal, literal, source));
    }
    nodes
}

fn check_overlaps(source: &str, matches: &[DirectiveMatch]) -> Result<(), ParseError> {
    for pair in matches.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if first.span.overlaps(&second.span) {
            return Err(ParseError::new(
                ParseErrorKind::Overlap {
                    first: String::from(first.span.slice(source)),
                    second: String::from(second.span.slice(source)),
                },
                second.span,
                source,
            ));
        }
    }
    Ok(())
}

/// Rejects comments that no matcher claimed but that look like directives.
fn check_unclaimed_comments(source: &str, matches: &[DirectiveMatch]) -> Result<(), ParseError> {
    let mut claimed = matches.iter().map(|m| m.span).peekable();
    for (start, _) in source.match_indices("/*") {
        while claimed.peek().is_some_and(|span| span.end <= start) {
            claimed.next();
        }
        if claimed.peek().is_some_and(|span| span.start <= start) {
            continue;
        }

        let Some(close) = source[start + 2..].find("*/").map(|i| start + 2 + i + 2) else {
            return Err(ParseError::new(
                ParseErrorKind::UnterminatedDirective,
                Span::new(start, source.len()),
                source,
            ));
        };
        let body = &source[start + 2..close - 2];
        let prefixed = body.starts_with(['$', '#', '@'])
            || body
                .strip_prefix("for")
                .is_some_and(|rest| rest.starts_with(char::is_whitespace));
        let dangling_array = !body.is_empty()
            && body.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
            && source[close..].trim_start().starts_with('(');
        if prefixed || dangling_array {
            return Err(ParseError::new(
                ParseErrorKind::MalformedDirective(String::from(&source[start..close])),
                Span::new(start, close),
                source,
            ));
        }
    }
    Ok(())
}

fn current<'a>(open: &'a mut [OpenLoop], root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match open.last_mut() {
        Some(frame) => &mut frame.body,
        None => root,
    }
}

/// Builds the node tree from sorted, non-overlapping matches.
fn assemble(source: &str, matches: Vec<DirectiveMatch>) -> Result<Vec<Node>, ParseError> {
    let mut root = Vec::new();
    let mut open: Vec<OpenLoop> = Vec::new();
    let mut cursor = 0;

    for m in matches {
        if m.span.start > cursor {
            let literal = Span::new(cursor, m.span.start);
            current(&mut open, &mut root).push(Node::new(NodeKind::Literal, literal, source));
        }
        cursor = m.span.end;

        match m.directive {
            Directive::ForStart {
                variable,
                collection,
            } => open.push(OpenLoop {
                variable,
                collection,
                start: m.span,
                body: Vec::new(),
            }),
            Directive::ForEnd => {
                let frame = open.pop().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::UnexpectedEnd, m.span, source)
                })?;
                let node = Node::new(
                    NodeKind::For(ForLoop {
                        variable: frame.variable,
                        collection: frame.collection,
                        body: frame.body,
                    }),
                    frame.start.merge(m.span),
                    source,
                );
                current(&mut open, &mut root).push(node);
            }
            Directive::Node(kind) => {
                current(&mut open, &mut root).push(Node::new(kind, m.span, source));
            }
        }
    }

    if let Some(frame) = open.pop() {
        return Err(ParseError::new(
            ParseErrorKind::MissingEnd {
                name: frame.variable,
            },
            frame.start,
            source,
        ));
    }
    if cursor < source.len() {
        root.push(Node::new(
            NodeKind::Literal,
            Span::new(cursor, source.len()),
            source,
        ));
    }
    Ok(root)
}

/// Removes the first `/* ... */` comment from a directive's matched text.
fn strip_comment(text: &str) -> String {
    let Some(start) = text.find("/*") else {
        return String::from(text);
    };
    match text[start..].find("*/") {
        Some(end) => format!("{}{}", &text[..start], &text[start + end + 2..]),
        None => String::from(text),
    }
}

fn write_sample(nodes: &[Node], sql: &mut String) {
    for node in nodes {
        match &node.kind {
            NodeKind::Literal => sql.push_str(&node.text),
            NodeKind::For(for_loop) => write_sample(&for_loop.body, sql),
            NodeKind::BindVariableArray(array) => {
                write_sample(&array.expression, sql);
                let rest = array.expression_span().end - node.span.start;
                sql.push_str(&strip_comment(&node.text[rest..]));
            }
            _ => sql.push_str(&strip_comment(&node.text)),
        }
    }
}

fn collect_names(nodes: &[Node], loop_vars: &mut Vec<String>, names: &mut Vec<String>) {
    let push = |name: &str, loop_vars: &[String], names: &mut Vec<String>| {
        let head = name.split('.').next().unwrap_or(name);
        if !loop_vars.iter().any(|v| v == head) && !names.iter().any(|n| n == name) {
            names.push(String::from(name));
        }
    };
    for node in nodes {
        match &node.kind {
            NodeKind::Literal | NodeKind::ParameterMarker(_) => {}
            NodeKind::For(for_loop) => {
                push(&for_loop.collection, loop_vars, names);
                loop_vars.push(for_loop.variable.clone());
                collect_names(&for_loop.body, loop_vars, names);
                loop_vars.pop();
            }
            NodeKind::BindVariableArray(array) => {
                collect_names(&array.expression, loop_vars, names);
                push(&array.name, loop_vars, names);
            }
            _ => {
                if let Some(name) = node.expression() {
                    push(name, loop_vars, names);
                }
            }
        }
    }
}
