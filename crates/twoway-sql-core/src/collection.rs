//! The evaluation accumulator.

use serde::Serialize;

use crate::error::{EvalError, StreamDirection};
use crate::value::{InputStream, OutputStream, SqlValue};

/// One positional bind value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindParameter {
    /// The directive expression that produced the value.
    pub name: String,
    /// The value to bind.
    pub value: SqlValue,
    /// Declared SQL type, if a directive or parameter marker named one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
}

/// Metadata recorded by a `/*@name=value;type=T@*/` parameter marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDeclaration {
    /// Declared parameter name.
    pub name: String,
    /// Default value text, used when the context has no binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Declared SQL type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
}

/// Rendered SQL, ordered bind values and stream bindings for one evaluation.
///
/// SQL placeholders can only be written through [`push_bind`](Self::push_bind),
/// which keeps the `?` count equal to the bind list length.
#[derive(Debug, Default, Serialize)]
pub struct SqlParameterCollection {
    sql: String,
    binds: Vec<BindParameter>,
    declarations: Vec<ParameterDeclaration>,
    #[serde(skip)]
    input_stream: Option<InputStream>,
    #[serde(skip)]
    output_stream: Option<OutputStream>,
}

impl SqlParameterCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends literal SQL text.
    pub fn push_sql(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Appends a `?` placeholder and its bind value.
    pub fn push_bind(&mut self, name: &str, value: SqlValue, sql_type: Option<&str>) {
        self.sql.push('?');
        self.binds.push(BindParameter {
            name: String::from(name),
            value,
            sql_type: sql_type.map(String::from),
        });
    }

    /// Records a parameter marker declaration.
    ///
    /// A later declaration of the same name replaces the earlier one.
    pub fn declare(&mut self, declaration: ParameterDeclaration) {
        self.declarations.retain(|d| d.name != declaration.name);
        self.declarations.push(declaration);
    }

    /// Returns the declaration recorded for `name`.
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Binds the statement's input stream.
    pub fn bind_input_stream(&mut self, stream: InputStream) -> Result<(), EvalError> {
        if self.input_stream.is_some() {
            return Err(EvalError::DuplicateStream {
                direction: StreamDirection::Input,
            });
        }
        self.input_stream = Some(stream);
        Ok(())
    }

    /// Binds the statement's output stream.
    pub fn bind_output_stream(&mut self, stream: OutputStream) -> Result<(), EvalError> {
        if self.output_stream.is_some() {
            return Err(EvalError::DuplicateStream {
                direction: StreamDirection::Output,
            });
        }
        self.output_stream = Some(stream);
        Ok(())
    }

    /// Tags every untyped bind whose name has a declared type.
    #[must_use]
    pub fn finish(mut self) -> Self {
        for bind in &mut self.binds {
            if bind.sql_type.is_some() {
                continue;
            }
            if let Some(declared) = self
                .declarations
                .iter()
                .find(|d| d.name == bind.name)
                .and_then(|d| d.sql_type.clone())
            {
                bind.sql_type = Some(declared);
            }
        }
        self
    }

    /// Returns the rendered SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bind parameters in placeholder order.
    #[must_use]
    pub fn binds(&self) -> &[BindParameter] {
        &self.binds
    }

    /// Returns just the bind values in placeholder order.
    #[must_use]
    pub fn values(&self) -> Vec<&SqlValue> {
        self.binds.iter().map(|b| &b.value).collect()
    }

    /// Returns the parameter marker declarations.
    #[must_use]
    pub fn declarations(&self) -> &[ParameterDeclaration] {
        &self.declarations
    }

    /// Returns the bound input stream.
    #[must_use]
    pub const fn input_stream(&self) -> Option<&InputStream> {
        self.input_stream.as_ref()
    }

    /// Returns the bound output stream.
    #[must_use]
    pub const fn output_stream(&self) -> Option<&OutputStream> {
        self.output_stream.as_ref()
    }

    /// Consumes the collection, returning the SQL text and bind values.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.binds.into_iter().map(|b| b.value).collect())
    }
}
