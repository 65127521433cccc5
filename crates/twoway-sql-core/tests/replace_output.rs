//! Tests for replace (`/*$name*/sample`) and output (`/*#name*/`) variables.

mod common;
use common::*;

use twoway_sql_core::{list, EvalError, ParametersContext};

fn replace(sql: &str, value: &str) -> String {
    let ctx = ParametersContext::new().with("v", value);
    render(sql, &ctx).sql().to_string()
}

#[test]
fn output_variable_is_raw_text() {
    let ctx = ParametersContext::new().with("aaa", "dba");
    let out = render("/*#aaa*/", &ctx);
    assert_eq!(out.sql(), "dba");
    assert!(out.binds().is_empty());
}

#[test]
fn output_variable_scalars() {
    let ctx = ParametersContext::new()
        .with("n", 10_i64)
        .with("flag", true)
        .with("nothing", Option::<String>::None);
    let out = render("select /*#n*/, /*#flag*/, /*#nothing*/", &ctx);
    assert_eq!(out.sql(), "select 10, TRUE, NULL");
}

#[test]
fn output_variable_missing() {
    let err = render_err("select /*#cols*/ from t", &ParametersContext::new());
    assert_eq!(err, EvalError::MissingParameter(String::from("cols")));
}

#[test]
fn output_variable_rejects_collection() {
    let ctx = ParametersContext::new().with("cols", list(["a", "b"]));
    let err = render_err("select /*#cols*/ from t", &ctx);
    assert!(matches!(err, EvalError::TypeMismatch { .. }));
}

#[test]
fn replace_whole_sample() {
    assert_eq!(
        replace("select * from /*$v*/emp where 1=1", "dept"),
        "select * from dept where 1=1"
    );
    assert_eq!(
        replace("select * from /*$v*/scott.emp e", "hr.staff"),
        "select * from hr.staff e"
    );
}

#[test]
fn replace_with_length_keeps_suffix() {
    let sql = "select * from /*$v;length=3*/all_db_links";
    assert_eq!(replace(sql, "dba"), "select * from dba_db_links");
    assert_eq!(replace(sql, "user"), "select * from use_db_links");
    assert_eq!(replace(sql, "x"), "select * from x  _db_links");
}

#[test]
fn replace_falls_back_to_sample() {
    let out = render("select * from /*$v*/emp", &ParametersContext::new());
    assert_eq!(out.sql(), "select * from emp");
}

#[test]
fn replace_never_binds() {
    let ctx = ParametersContext::new().with("v", "emp");
    let out = render("select * from /*$v*/t", &ctx);
    assert!(out.binds().is_empty());
}

#[test]
fn keyword_check_accepts_identifier_lists() {
    let sql = "select * from emp order by /*$v;sqlKeywordCheck=true*/empno";
    assert_eq!(replace(sql, "aa,bb"), "select * from emp order by aa,bb");
    assert_eq!(
        replace(sql, "e.sal desc, ename asc nulls last"),
        "select * from emp order by e.sal desc, ename asc nulls last"
    );
}

#[test]
fn keyword_check_rejects_injection() {
    let sql = "select * from emp order by /*$v;sqlKeywordCheck=true*/empno";
    for value in ["empno;DROP TABLE emp", "1) or (1=1", "a -- b", "a'b", ""] {
        let ctx = ParametersContext::new().with("v", value);
        let err = render_err(sql, &ctx);
        assert_eq!(
            err,
            EvalError::KeywordCheckFailed {
                name: String::from("v"),
                value: String::from(value),
            },
            "value {value:?}"
        );
    }
}

#[test]
fn keyword_check_off_by_default() {
    assert_eq!(
        replace("order by /*$v*/empno", "empno;DROP TABLE emp"),
        "order by empno;DROP TABLE emp"
    );
}

#[test]
fn replace_variable_supplies_array_expression() {
    let sql = "select * from t where /*$col*/id in /*ids*/(1, 2)";
    let ctx = ParametersContext::new()
        .with("col", "name")
        .with("ids", list(["a", "b"]));
    let out = render(sql, &ctx);
    assert_eq!(out.sql(), "select * from t where name IN (?,?)");
    assert_eq!(values(&out), vec![text("a"), text("b")]);

    let ctx = ParametersContext::new().with("ids", list([1_i64, 2]));
    assert_eq!(render(sql, &ctx).sql(), "select * from t where id IN (?,?)");

    let template = parse(sql);
    assert_eq!(template.to_sample_sql(), "select * from t where id in (1, 2)");
    assert_eq!(template.parameter_names(), vec!["col", "ids"]);
}

#[test]
fn replace_variable_inside_array_function_call() {
    let sql = "where upper(/*$col*/id) not in /*ids*/(1)";
    let ctx = ParametersContext::new()
        .with("col", "t.code")
        .with("ids", list([3_i64]));
    assert_eq!(render(sql, &ctx).sql(), "where upper(t.code) NOT IN (?)");
}

#[test]
fn spliced_text_cannot_add_placeholders() {
    let ctx = ParametersContext::new().with("c", "?");
    assert_eq!(
        render_err("select /*#c*/ from t", &ctx),
        EvalError::PlaceholderInText {
            name: String::from("c"),
        }
    );

    let ctx = ParametersContext::new().with("t", "emp where 1 = ?");
    assert_eq!(
        render_err("select * from /*$t*/emp", &ctx),
        EvalError::PlaceholderInText {
            name: String::from("t"),
        }
    );
}
