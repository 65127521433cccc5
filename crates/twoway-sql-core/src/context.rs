//! Parameter contexts and evaluation scopes.

use std::collections::HashMap;

use crate::operator::Comparison;
use crate::value::ParamValue;

/// Values and operator overrides a template is evaluated against.
///
/// A context is never modified by evaluation, so one context can drive many
/// evaluations of the same template.
#[derive(Debug, Clone, Default)]
pub struct ParametersContext {
    values: HashMap<String, ParamValue>,
    operators: HashMap<String, Comparison>,
}

impl ParametersContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON object.
    ///
    /// Returns `None` if `json` is not an object.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(map) = json else {
            return None;
        };
        let mut context = Self::new();
        for (name, value) in map {
            context.insert(name, ParamValue::from(value));
        }
        Some(context)
    }

    /// Binds a value to a name, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Overrides the comparison operator used for a bind directive.
    pub fn set_operator(&mut self, name: impl Into<String>, operator: impl Into<Comparison>) {
        self.operators.insert(name.into(), operator.into());
    }

    /// Builder-style variant of [`set_operator`](Self::set_operator).
    #[must_use]
    pub fn with_operator(
        mut self,
        name: impl Into<String>,
        operator: impl Into<Comparison>,
    ) -> Self {
        self.set_operator(name, operator);
        self
    }

    /// Returns the value bound to exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Returns the operator override for `name`.
    #[must_use]
    pub fn operator(&self, name: &str) -> Option<Comparison> {
        self.operators.get(name).copied()
    }

    /// Returns true if no values are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Name resolution during evaluation.
///
/// The root scope reads the context; every `for` iteration pushes a frame
/// binding the loop variable to the current element.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// The caller's context.
    Root(&'a ParametersContext),
    /// A loop variable binding on top of an outer scope.
    Frame {
        /// The enclosing scope.
        parent: &'a Scope<'a>,
        /// Loop variable name.
        name: &'a str,
        /// Current element.
        value: &'a ParamValue,
    },
}

impl<'a> Scope<'a> {
    /// Creates the root scope for a context.
    #[must_use]
    pub const fn root(context: &'a ParametersContext) -> Self {
        Self::Root(context)
    }

    /// Returns the context at the bottom of the scope chain.
    #[must_use]
    pub const fn context(&self) -> &'a ParametersContext {
        match self {
            Self::Root(context) => *context,
            Self::Frame { parent, .. } => parent.context(),
        }
    }

    /// Resolves a possibly dotted name.
    ///
    /// An exact binding wins; otherwise the first segment is looked up and the
    /// remaining segments walk into map members.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&'a ParamValue> {
        if let Some(value) = self.lookup(name) {
            return Some(value);
        }
        let mut segments = name.split('.');
        let head = segments.next()?;
        let mut value = self.lookup(head)?;
        for segment in segments {
            value = value.member(segment)?;
        }
        Some(value)
    }

    fn lookup(&self, name: &str) -> Option<&'a ParamValue> {
        match self {
            Self::Root(context) => (*context).get(name),
            Self::Frame {
                parent,
                name: bound,
                value,
            } => {
                if *bound == name {
                    Some(*value)
                } else {
                    parent.lookup(name)
                }
            }
        }
    }
}
