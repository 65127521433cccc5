//! Source positions and sample literal scanning.
//!
//! Directive comments are found by the matchers in [`crate::directive`]; this
//! module owns the small hand-written scanners that decide where the literal
//! following a directive ends.

pub mod literal;
mod span;

pub use literal::{LiteralError, LiteralKind, SampleLiteral};
pub use span::Span;
