#![allow(dead_code)]

use twoway_sql_core::{
    EvalError, ParametersContext, ParseError, ParseErrorKind, SqlParameterCollection, SqlValue,
    Template,
};

pub fn parse(sql: &str) -> Template {
    Template::parse(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    Template::parse(sql).expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn parse_err_kind(sql: &str) -> ParseErrorKind {
    parse_err(sql).kind
}

pub fn render(sql: &str, context: &ParametersContext) -> SqlParameterCollection {
    let out = parse(sql)
        .evaluate(context)
        .unwrap_or_else(|e| panic!("Failed to evaluate: {sql}\nError: {e:?}"));
    assert_eq!(
        out.sql().matches('?').count(),
        out.binds().len(),
        "placeholder count differs from bind count for: {sql}"
    );
    out
}

pub fn render_err(sql: &str, context: &ParametersContext) -> EvalError {
    parse(sql)
        .evaluate(context)
        .expect_err(&format!("Expected evaluation error for: {sql}"))
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}

pub fn values(out: &SqlParameterCollection) -> Vec<SqlValue> {
    out.values().into_iter().cloned().collect()
}
