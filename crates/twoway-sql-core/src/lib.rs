//! # twoway-sql-core
//!
//! A two-way SQL template engine.
//!
//! Templates are plain SQL whose dynamic parts are written as comments.
//! The raw text stays runnable: every directive is a comment and is followed
//! by a sample literal the database sees when the template runs untouched.
//! Evaluating a template against a [`ParametersContext`] replaces each
//! directive and its sample with `?` placeholders, substituted text, or
//! repeated loop bodies.
//!
//! This crate provides:
//! - Bind variables: `/*name*/sample` and `col in /*names*/(samples)`
//! - Text substitution: `/*$name*/sample` and `/*#name*/`
//! - Loops: `/*for row:rows*/ ... /*end*/`
//! - Parameter markers and stream bindings: `/*@name=default;type=T@*/`,
//!   `/*@in expr*/`, `/*@out expr*/`
//!
//! ## Rendering
//!
//! ```rust
//! use twoway_sql_core::{list, ParametersContext, SqlValue, Template};
//!
//! let template = Template::parse(
//!     "SELECT * FROM users WHERE id = /*id*/1 AND role in /*roles*/('admin')",
//! )
//! .unwrap();
//!
//! let context = ParametersContext::new()
//!     .with("id", 42_i64)
//!     .with("roles", list(["admin", "staff"]));
//! let out = template.evaluate(&context).unwrap();
//!
//! assert_eq!(out.sql(), "SELECT * FROM users WHERE id = ? AND role IN (?,?)");
//! assert_eq!(
//!     out.values(),
//!     vec![
//!         &SqlValue::Int(42),
//!         &SqlValue::Text(String::from("admin")),
//!         &SqlValue::Text(String::from("staff")),
//!     ]
//! );
//! ```
//!
//! ## Operator Overrides
//!
//! The comparison written in the template can be swapped per evaluation:
//!
//! ```rust
//! use twoway_sql_core::{ComparisonOperator, ParametersContext, Template};
//!
//! let template = Template::parse("SELECT * FROM users WHERE name = /*name*/'bob'").unwrap();
//! let context = ParametersContext::new()
//!     .with("name", "bo")
//!     .with_operator("name", ComparisonOperator::StartsWith);
//!
//! let (sql, values) = template.evaluate(&context).unwrap().into_parts();
//! assert_eq!(sql, "SELECT * FROM users WHERE name LIKE ?");
//! assert_eq!(values[0].to_raw_text(), "bo%");
//! ```

pub mod cache;
pub mod collection;
pub mod context;
pub mod directive;
pub mod error;
pub mod lexer;
pub mod node;
pub mod operator;
pub mod template;
pub mod value;

pub use cache::TemplateCache;
pub use collection::{BindParameter, ParameterDeclaration, SqlParameterCollection};
pub use context::{ParametersContext, Scope};
pub use error::{Error, EvalError, ParseError, ParseErrorKind, Result, StreamDirection};
pub use lexer::Span;
pub use node::{Node, NodeKind};
pub use operator::{Comparison, ComparisonOperator, UnknownOperator};
pub use template::Template;
pub use value::{list, InputStream, OutputStream, ParamValue, SqlValue, ToSqlValue};

/// Parses and evaluates `source` in one step.
///
/// Use [`Template`] or [`TemplateCache`] when the same text is rendered more
/// than once.
pub fn render(source: &str, context: &ParametersContext) -> Result<SqlParameterCollection> {
    let template = Template::parse(source)?;
    Ok(template.evaluate(context)?)
}
