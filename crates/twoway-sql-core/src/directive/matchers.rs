//! One matcher per directive syntax.
//!
//! Each matcher finds its directive comments with a regex and then hands the
//! text after the comment to the literal scanners in [`crate::lexer::literal`]
//! to find the sample literal it swallows.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Directive, DirectiveMatch, Matcher, Options};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{literal, LiteralError, LiteralKind, Span};
use crate::node::{
    BindVariable, BindVariableArray, Node, NodeKind, OutputVariable, ParameterMarker, ReplaceVariable,
    StreamBinding,
};

macro_rules! directive_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("invalid directive regex"));
    };
}

directive_regex!(
    BIND,
    r"(?i)(?:(\bnot\s+like\b|\blike\b|<>|!=|<=|>=|=|<|>)(\s*))?/\*([A-Za-z_][\w.]*)((?:;[^*]*)?)\*/"
);
directive_regex!(
    BIND_ARRAY,
    r#"(?i)((?:"[^"]*"|[\w.]+)(?:\([^()]*\))?)\s+(not\s+in|in)(\s*)/\*([A-Za-z_][\w.]*)((?:;[^*]*)?)\*/"#
);
// A loop start also claims the line break right after it.
directive_regex!(
    FOR_START,
    r"/\*for\s+([A-Za-z_]\w*)\s*:\s*([A-Za-z_][\w.]*)\s*\*/(?:\r?\n)?"
);
directive_regex!(FOR_END, r"/\*end\*/");
directive_regex!(REPLACE, r"/\*\$([A-Za-z_][\w.]*)((?:;[^*]*)?)\*/");
directive_regex!(OUTPUT, r"/\*#([A-Za-z_][\w.]*)((?:;[^*]*)?)\*/");
directive_regex!(MARKER, r"/\*@([^*]*?)@\*/");
directive_regex!(STREAM, r"(?i)/\*@(in|out)\s+([A-Za-z_][\w.]*)\s*\*/");

fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn whole(caps: &Captures<'_>) -> Span {
    caps.get(0)
        .map_or_else(Span::default, |m| Span::new(m.start(), m.end()))
}

fn options_at(text: &str, span: Span, source: &str) -> Result<Options, ParseError> {
    Options::parse(text).map_err(|kind| ParseError::new(kind, span, source))
}

fn literal_error(err: LiteralError, source: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::MalformedLiteral(err.message),
        Span::new(err.offset, err.offset),
        source,
    )
}

/// Whether the directive comment ending at `end` is followed by a
/// parenthesized list, which makes it an array bind.
fn opens_list(source: &str, end: usize) -> bool {
    source[end..].trim_start().starts_with('(')
}

/// Finds a literal separated from a sample-less bind directive by whitespace.
///
/// Returns the literal's offset. Words are left alone so `/*a*/ and` stays
/// valid.
fn detached_literal(source: &str, end: usize) -> Option<usize> {
    let rest = &source[end..];
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let offset = end + rest.len() - trimmed.len();
    let typed = matches!(
        literal::scan_scalar(source, offset),
        Ok(Some(sample)) if sample.kind == LiteralKind::Typed
    );
    (typed || trimmed.starts_with(|c: char| c == '\'' || c.is_ascii_digit())).then_some(offset)
}

/// `[op] /*name;opts*/literal`.
pub struct BindVariableMatcher;

impl Matcher for BindVariableMatcher {
    fn name(&self) -> &'static str {
        "bind variable"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        let mut matches = Vec::new();
        for caps in BIND.captures_iter(source) {
            let comment = whole(&caps);
            let name = group(&caps, 3);
            if name == "end" || opens_list(source, comment.end) {
                continue;
            }
            let options = options_at(group(&caps, 4), comment, source)?;
            let sample = literal::scan_scalar(source, comment.end)
                .map_err(|e| literal_error(e, source))?;
            if sample.is_none() {
                if let Some(offset) = detached_literal(source, comment.end) {
                    return Err(ParseError::new(
                        ParseErrorKind::MalformedLiteral(
                            "sample literal must follow the directive directly",
                        ),
                        Span::new(offset, offset),
                        source,
                    ));
                }
            }
            let end = sample.map_or(comment.end, |s| s.span.end);

            matches.push(DirectiveMatch {
                span: Span::new(comment.start, end),
                directive: Directive::Node(NodeKind::BindVariable(BindVariable {
                    name: String::from(name),
                    options,
                    operator: caps.get(1).map(|m| String::from(m.as_str())),
                    gap: String::from(group(&caps, 2)),
                    sample: sample.map(|s| String::from(s.span.slice(source))),
                })),
            });
        }
        Ok(matches)
    }
}

/// `expr [not] in /*name;opts*/(literal, ...)`.
pub struct BindVariableArrayMatcher;

impl Matcher for BindVariableArrayMatcher {
    fn name(&self) -> &'static str {
        "bind variable array"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        let mut matches = Vec::new();
        for caps in BIND_ARRAY.captures_iter(source) {
            let head = whole(&caps);
            if !opens_list(source, head.end) {
                continue;
            }
            let options = options_at(group(&caps, 5), head, source)?;
            let expression = caps
                .get(1)
                .map_or(head, |m| Span::new(m.start(), m.end()));
            let sample = literal::scan_list(source, head.end)
                .map_err(|e| literal_error(e, source))?
                .ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::MalformedLiteral("expected a literal list"),
                        head,
                        source,
                    )
                })?;

            matches.push(DirectiveMatch {
                span: Span::new(head.start, sample.span.end),
                directive: Directive::Node(NodeKind::BindVariableArray(BindVariableArray {
                    name: String::from(group(&caps, 4)),
                    options,
                    expression: vec![Node::new(NodeKind::Literal, expression, source)],
                    operator: String::from(group(&caps, 2)),
                    sample: String::from(sample.span.slice(source)),
                })),
            });
        }
        Ok(matches)
    }
}

/// `/*for x:xs*/` and `/*end*/`.
pub struct ForMatcher;

impl Matcher for ForMatcher {
    fn name(&self) -> &'static str {
        "for loop"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        let starts = FOR_START.captures_iter(source).map(|caps| DirectiveMatch {
            span: whole(&caps),
            directive: Directive::ForStart {
                variable: String::from(group(&caps, 1)),
                collection: String::from(group(&caps, 2)),
            },
        });
        let ends = FOR_END.find_iter(source).map(|m| DirectiveMatch {
            span: Span::new(m.start(), m.end()),
            directive: Directive::ForEnd,
        });
        Ok(starts.chain(ends).collect())
    }
}

/// `/*$name;opts*/sample`.
pub struct ReplaceVariableMatcher;

impl Matcher for ReplaceVariableMatcher {
    fn name(&self) -> &'static str {
        "replace variable"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        let mut matches = Vec::new();
        for caps in REPLACE.captures_iter(source) {
            let comment = whole(&caps);
            let options = options_at(group(&caps, 2), comment, source)?;
            let length = options
                .get_usize("length")
                .map_err(|kind| ParseError::new(kind, comment, source))?;
            let keyword_check = options
                .get_bool("sqlKeywordCheck")
                .map_err(|kind| ParseError::new(kind, comment, source))?
                .unwrap_or(false);
            let sample = literal::scan_identifier_run(source, comment.end)
                .map_err(|e| literal_error(e, source))?;

            matches.push(DirectiveMatch {
                span: Span::new(comment.start, sample.span.end),
                directive: Directive::Node(NodeKind::ReplaceVariable(ReplaceVariable {
                    name: String::from(group(&caps, 1)),
                    options,
                    sample: String::from(sample.span.slice(source)),
                    length,
                    keyword_check,
                })),
            });
        }
        Ok(matches)
    }
}

/// `/*#name*/`.
pub struct OutputVariableMatcher;

impl Matcher for OutputVariableMatcher {
    fn name(&self) -> &'static str {
        "output variable"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        OUTPUT
            .captures_iter(source)
            .map(|caps| {
                let span = whole(&caps);
                Ok(DirectiveMatch {
                    span,
                    directive: Directive::Node(NodeKind::OutputVariable(OutputVariable {
                        name: String::from(group(&caps, 1)),
                        options: options_at(group(&caps, 2), span, source)?,
                    })),
                })
            })
            .collect()
    }
}

/// `/*@name=value;type=T@*/`.
pub struct ParameterMarkerMatcher;

impl Matcher for ParameterMarkerMatcher {
    fn name(&self) -> &'static str {
        "parameter marker"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        MARKER
            .captures_iter(source)
            .map(|caps| {
                let span = whole(&caps);
                let body = group(&caps, 1);
                let (head, rest) = body.find(';').map_or((body, ""), |i| body.split_at(i));
                let (name, default) = match head.split_once('=') {
                    Some((name, default)) => (name.trim(), Some(String::from(default.trim()))),
                    None => (head.trim(), None),
                };
                if name.is_empty() {
                    return Err(ParseError::new(
                        ParseErrorKind::EmptyExpression,
                        span,
                        source,
                    ));
                }
                Ok(DirectiveMatch {
                    span,
                    directive: Directive::Node(NodeKind::ParameterMarker(ParameterMarker {
                        name: String::from(name),
                        default,
                        options: options_at(rest, span, source)?,
                    })),
                })
            })
            .collect()
    }
}

/// `/*@in expr*/` and `/*@out expr*/`.
pub struct StreamMatcher;

impl Matcher for StreamMatcher {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn scan(&self, source: &str) -> Result<Vec<DirectiveMatch>, ParseError> {
        Ok(STREAM
            .captures_iter(source)
            .map(|caps| {
                let binding = StreamBinding {
                    expression: String::from(group(&caps, 2)),
                };
                let kind = if group(&caps, 1).eq_ignore_ascii_case("in") {
                    NodeKind::InputStream(binding)
                } else {
                    NodeKind::OutputStream(binding)
                };
                DirectiveMatch {
                    span: whole(&caps),
                    directive: Directive::Node(kind),
                }
            })
            .collect())
    }
}
