//! Comparison operators that callers can force onto bind directives.
//!
//! An operator is a rendering strategy chosen at evaluation time. Scalar bind
//! variables swap the operator token they follow and may rewrite the bound
//! value; array bind variables render a whole predicate around the bound
//! collection.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::collection::SqlParameterCollection;
use crate::error::EvalError;
use crate::value::SqlValue;

/// The closed set of comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// `=` / `IN (...)`.
    Eq,
    /// `<>` / `NOT IN (...)`.
    Neq,
    /// `LIKE`.
    Like,
    /// `NOT LIKE`.
    NotLike,
    /// `LIKE 'value%'`.
    StartsWith,
    /// `LIKE '%value'`.
    EndsWith,
    /// `LIKE '%value%'`.
    Contains,
    /// `low < E < high`.
    GtAndLt,
    /// `low <= E < high`.
    GteAndLt,
    /// `low < E <= high`.
    GtAndLte,
    /// `low <= E <= high`.
    GteAndLte,
    /// `E BETWEEN low AND high`.
    Between,
}

impl ComparisonOperator {
    /// Every operator, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::Neq,
        Self::Like,
        Self::NotLike,
        Self::StartsWith,
        Self::EndsWith,
        Self::Contains,
        Self::GtAndLt,
        Self::GteAndLt,
        Self::GtAndLte,
        Self::GteAndLte,
        Self::Between,
    ];

    /// Returns the upper-case name used in messages and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::Like => "LIKE",
            Self::NotLike => "NOT_LIKE",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::Contains => "CONTAINS",
            Self::GtAndLt => "GT_AND_LT",
            Self::GteAndLt => "GTE_AND_LT",
            Self::GtAndLte => "GT_AND_LTE",
            Self::GteAndLte => "GTE_AND_LTE",
            Self::Between => "BETWEEN",
        }
    }

    /// Returns the logical complement of this operator.
    #[must_use]
    pub const fn reverse(self) -> Comparison {
        Comparison {
            operator: self,
            reversed: true,
        }
    }

    /// Returns true for operators that need exactly two values.
    #[must_use]
    pub const fn is_range(self) -> bool {
        matches!(
            self,
            Self::GtAndLt | Self::GteAndLt | Self::GtAndLte | Self::GteAndLte | Self::Between
        )
    }

    /// Returns true for the operators rendered with `LIKE`.
    #[must_use]
    pub const fn is_like(self) -> bool {
        matches!(
            self,
            Self::Like | Self::NotLike | Self::StartsWith | Self::EndsWith | Self::Contains
        )
    }

    /// Rewrites a bound value into the pattern this operator matches with.
    #[must_use]
    pub fn transform(self, value: SqlValue) -> SqlValue {
        if value.is_null() {
            return value;
        }
        let text = match &value {
            SqlValue::Text(s) => s.clone(),
            other => other.to_raw_text(),
        };
        match self {
            Self::StartsWith => SqlValue::Text(format!("{text}%")),
            Self::EndsWith => SqlValue::Text(format!("%{text}")),
            Self::Contains => SqlValue::Text(format!("%{text}%")),
            _ => value,
        }
    }

    /// Returns `(low, high, joiner)` for the range operators.
    const fn range_parts(self, reversed: bool) -> Option<(&'static str, &'static str, &'static str)> {
        let parts = match (self, reversed) {
            (Self::GtAndLt, false) => (">", "<", "AND"),
            (Self::GtAndLt, true) => ("<=", ">=", "OR"),
            (Self::GteAndLt, false) => (">=", "<", "AND"),
            (Self::GteAndLt, true) => ("<", ">=", "OR"),
            (Self::GtAndLte, false) => (">", "<=", "AND"),
            (Self::GtAndLte, true) => ("<=", ">", "OR"),
            (Self::GteAndLte, false) => (">=", "<=", "AND"),
            (Self::GteAndLte, true) => ("<", ">", "OR"),
            _ => return None,
        };
        Some(parts)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operator name that is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown comparison operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for ComparisonOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOperator(String::from(s)))
    }
}

/// An operator override, possibly in its reversed (complement) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Comparison {
    /// The operator.
    pub operator: ComparisonOperator,
    /// Whether the logical complement is rendered.
    pub reversed: bool,
}

impl From<ComparisonOperator> for Comparison {
    fn from(operator: ComparisonOperator) -> Self {
        Self {
            operator,
            reversed: false,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reversed {
            f.write_str("!")?;
        }
        f.write_str(self.operator.name())
    }
}

/// Parses `NAME` or `!NAME` (reversed).
impl FromStr for Comparison {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('!') {
            Some(name) => Ok(name.parse::<ComparisonOperator>()?.reverse()),
            None => Ok(s.parse::<ComparisonOperator>()?.into()),
        }
    }
}

impl Comparison {
    /// Returns the complement of this comparison.
    #[must_use]
    pub const fn reverse(self) -> Self {
        Self {
            operator: self.operator,
            reversed: !self.reversed,
        }
    }

    /// True when the rendered predicate is negated (`NOT IN`, `NOT LIKE`).
    fn negated(self) -> bool {
        let base = matches!(
            self.operator,
            ComparisonOperator::Neq | ComparisonOperator::NotLike
        );
        base != self.reversed
    }

    /// Returns the token that replaces the source operator of a scalar bind.
    pub fn scalar_token(self, name: &str) -> Result<&'static str, EvalError> {
        let negated = self.negated();
        match self.operator {
            ComparisonOperator::Eq | ComparisonOperator::Neq => {
                Ok(if negated { "<>" } else { "=" })
            }
            op if op.is_like() => Ok(if negated { "NOT LIKE" } else { "LIKE" }),
            operator => Err(EvalError::OperatorNotApplicable {
                name: String::from(name),
                operator,
            }),
        }
    }

    /// Renders the predicate for an array bind over `values`.
    ///
    /// `expression` is the left-hand side written in the template. Each value
    /// becomes one `?` placeholder and one bind parameter.
    pub fn render_list(
        self,
        name: &str,
        expression: &str,
        values: Vec<SqlValue>,
        sql_type: Option<&str>,
        out: &mut SqlParameterCollection,
    ) -> Result<(), EvalError> {
        let operator = self.operator;
        if operator.is_range() {
            let [low, high]: [SqlValue; 2] =
                values
                    .try_into()
                    .map_err(|values: Vec<SqlValue>| EvalError::OperatorCardinality {
                        name: String::from(name),
                        operator,
                        expected: 2,
                        actual: values.len(),
                    })?;
            if let Some((low_op, high_op, joiner)) = operator.range_parts(self.reversed) {
                out.push_sql(&format!("( {expression} {low_op} "));
                out.push_bind(name, low, sql_type);
                out.push_sql(&format!(" {joiner} {expression} {high_op} "));
                out.push_bind(name, high, sql_type);
                out.push_sql(" )");
            } else {
                let keyword = if self.reversed {
                    "NOT BETWEEN"
                } else {
                    "BETWEEN"
                };
                out.push_sql(&format!("{expression} {keyword} "));
                out.push_bind(name, low, sql_type);
                out.push_sql(" AND ");
                out.push_bind(name, high, sql_type);
            }
            return Ok(());
        }

        let negated = self.negated();
        if values.is_empty() {
            out.push_sql(if negated { "1=1" } else { "1=0" });
            return Ok(());
        }

        if operator.is_like() {
            if negated {
                out.push_sql("NOT ");
            }
            out.push_sql("(");
            for (i, value) in values.into_iter().enumerate() {
                let joiner = if i == 0 { " " } else { " OR " };
                out.push_sql(&format!("{joiner}{expression} LIKE "));
                out.push_bind(name, operator.transform(value), sql_type);
            }
            out.push_sql(" )");
        } else {
            out.push_sql(expression);
            out.push_sql(if negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.into_iter().enumerate() {
                if i > 0 {
                    out.push_sql(",");
                }
                out.push_bind(name, value, sql_type);
            }
            out.push_sql(")");
        }
        Ok(())
    }
}
