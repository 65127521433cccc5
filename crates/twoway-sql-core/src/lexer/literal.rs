//! Sample literal lexers.
//!
//! A directive comment is usually followed by a literal that keeps the raw
//! template runnable. Each literal shape has its own small scanner so the
//! boundary rules stay easy to audit: scanning starts right after the
//! closing `*/` and stops at whitespace, `,`, `)` or end of input.

use super::Span;

/// The shape of a sample literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// A quoted string with a type prefix (`date '2020-01-01'`).
    Typed,
    /// A single-quoted string (`'abc'`).
    Quoted,
    /// A bare numeric or identifier run (`42`, `-1.5`, `null`).
    Bare,
    /// A parenthesized, comma-separated list of literals.
    List,
    /// An identifier-like run swallowed by a replace variable.
    Identifier,
}

/// A sample literal located in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLiteral {
    /// The literal shape.
    pub kind: LiteralKind,
    /// Where the literal sits in the source.
    pub span: Span,
}

/// A failure to scan a literal that was clearly started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    /// Byte offset where the broken literal starts.
    pub offset: usize,
    /// What went wrong.
    pub message: &'static str,
}

/// Type prefixes accepted in front of a quoted sample literal.
const TYPE_PREFIXES: &[&str] = &["datetime", "timestamp", "interval", "date", "time"];

/// Interval qualifiers accepted after an `interval '...'` literal.
const INTERVAL_UNITS: &[&str] = &["year", "month", "day", "hour", "minute", "second"];

/// A character cursor over the template source.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.pos - start
    }

    /// Consumes `[+-]digits[.digits][e[+-]digits]`.
    ///
    /// Returns false if the text is not a complete number; the cursor
    /// position is then meaningless.
    fn number(&mut self) -> bool {
        if matches!(self.peek(), Some('+' | '-')) {
            self.advance();
        }
        let mut digits = self.digits();
        if self.peek() == Some('.') {
            self.advance();
            digits += self.digits();
        }
        if digits == 0 {
            return false;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mantissa_end = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            if self.digits() == 0 {
                self.pos = mantissa_end;
            }
        }
        !self.peek().is_some_and(is_bare_char)
    }

    /// Consumes `[A-Za-z_]+` and returns it, or `None` if nothing matched.
    fn word(&mut self) -> Option<&'a str> {
        let input = self.input;
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            self.advance();
        }
        let end = self.pos;
        (end > start).then(|| &input[start..end])
    }

    /// Consumes a single-quoted string, honouring `''` escapes.
    fn quoted(&mut self) -> Result<(), LiteralError> {
        let start = self.pos;
        self.advance(); // opening quote
        loop {
            match self.advance() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                }
                Some('\'') => return Ok(()),
                Some(_) => {}
                None => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string literal",
                    })
                }
            }
        }
    }
}

const fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Scans the literal that follows a bind variable directive at `pos`.
///
/// Returns `Ok(None)` when no literal starts at `pos`.
pub fn scan_scalar(input: &str, pos: usize) -> Result<Option<SampleLiteral>, LiteralError> {
    let mut cursor = Cursor::new(input, pos);
    if let Some(kind) = scan_typed(&mut cursor)? {
        return Ok(Some(SampleLiteral {
            kind,
            span: Span::new(pos, cursor.pos),
        }));
    }

    let mut number = Cursor::new(input, pos);
    if number.number() {
        return Ok(Some(SampleLiteral {
            kind: LiteralKind::Bare,
            span: Span::new(pos, number.pos),
        }));
    }

    let mut cursor = Cursor::new(input, pos);
    match cursor.peek() {
        Some('\'') => {
            cursor.quoted()?;
            Ok(Some(SampleLiteral {
                kind: LiteralKind::Quoted,
                span: Span::new(pos, cursor.pos),
            }))
        }
        Some(c) if is_bare_char(c) || c == '-' || c == '+' => {
            cursor.advance();
            while cursor.peek().is_some_and(is_bare_char) {
                cursor.advance();
            }
            if cursor.pos == pos + 1 && !is_bare_char(c) {
                // A lone sign is an operator, not a literal.
                return Ok(None);
            }
            Ok(Some(SampleLiteral {
                kind: LiteralKind::Bare,
                span: Span::new(pos, cursor.pos),
            }))
        }
        _ => Ok(None),
    }
}

/// Tries `<type> '<text>'`, leaving the cursor after the literal on success.
fn scan_typed(cursor: &mut Cursor<'_>) -> Result<Option<LiteralKind>, LiteralError> {
    let Some(word) = cursor.word() else {
        return Ok(None);
    };
    let Some(prefix) = TYPE_PREFIXES
        .iter()
        .find(|prefix| prefix.eq_ignore_ascii_case(word))
    else {
        return Ok(None);
    };
    cursor.skip_whitespace();
    if cursor.peek() != Some('\'') {
        return Ok(None);
    }
    cursor.quoted()?;

    if *prefix == "interval" {
        scan_interval_qualifier(cursor);
    }
    Ok(Some(LiteralKind::Typed))
}

/// Consumes `unit [to unit]` after an interval literal, if present.
fn scan_interval_qualifier(cursor: &mut Cursor<'_>) {
    let is_unit = |w: &str| INTERVAL_UNITS.iter().any(|u| u.eq_ignore_ascii_case(w));

    let mut lookahead = Cursor::new(cursor.input, cursor.pos);
    lookahead.skip_whitespace();
    if !lookahead.word().is_some_and(is_unit) {
        return;
    }
    cursor.pos = lookahead.pos;

    lookahead.skip_whitespace();
    if !lookahead.word().is_some_and(|w| w.eq_ignore_ascii_case("to")) {
        return;
    }
    lookahead.skip_whitespace();
    if lookahead.word().is_some_and(is_unit) {
        cursor.pos = lookahead.pos;
    }
}

/// Scans a parenthesized literal list starting at `pos`.
///
/// Leading whitespace before `(` belongs to the list. Returns `Ok(None)` if
/// no `(` follows.
pub fn scan_list(input: &str, pos: usize) -> Result<Option<SampleLiteral>, LiteralError> {
    let mut cursor = Cursor::new(input, pos);
    cursor.skip_whitespace();
    if cursor.peek() != Some('(') {
        return Ok(None);
    }
    let open = cursor.pos;
    cursor.advance();

    let unterminated = LiteralError {
        offset: open,
        message: "unterminated literal list",
    };

    cursor.skip_whitespace();
    if cursor.peek() == Some(')') {
        cursor.advance();
        return Ok(Some(SampleLiteral {
            kind: LiteralKind::List,
            span: Span::new(pos, cursor.pos),
        }));
    }

    loop {
        cursor.skip_whitespace();
        let Some(element) = scan_scalar(input, cursor.pos)? else {
            return Err(if cursor.peek().is_none() {
                unterminated
            } else {
                LiteralError {
                    offset: cursor.pos,
                    message: "expected a literal inside the list",
                }
            });
        };
        cursor.pos = element.span.end;
        cursor.skip_whitespace();
        match cursor.advance() {
            Some(',') => {}
            Some(')') => break,
            Some(_) => {
                return Err(LiteralError {
                    offset: cursor.pos,
                    message: "expected ',' or ')' in literal list",
                })
            }
            None => return Err(unterminated),
        }
    }

    Ok(Some(SampleLiteral {
        kind: LiteralKind::List,
        span: Span::new(pos, cursor.pos),
    }))
}

/// Scans the identifier-like run swallowed by a replace variable.
///
/// Accepts letters, digits, `_`, `.`, `$`, `#`, or a double-quoted
/// identifier. The run may be empty.
pub fn scan_identifier_run(input: &str, pos: usize) -> Result<SampleLiteral, LiteralError> {
    let mut cursor = Cursor::new(input, pos);
    if cursor.peek() == Some('"') {
        cursor.advance();
        loop {
            match cursor.advance() {
                Some('"') if cursor.peek() == Some('"') => {
                    cursor.advance();
                }
                Some('"') => break,
                Some(_) => {}
                None => {
                    return Err(LiteralError {
                        offset: pos,
                        message: "unterminated quoted identifier",
                    })
                }
            }
        }
    } else {
        while cursor
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '#'))
        {
            cursor.advance();
        }
    }
    Ok(SampleLiteral {
        kind: LiteralKind::Identifier,
        span: Span::new(pos, cursor.pos),
    })
}
