//! Tests for comparison operator overrides on scalar and array binds.

mod common;
use common::*;

use twoway_sql_core::{
    list, Comparison, ComparisonOperator as Op, EvalError, ParametersContext, SqlValue,
};

fn scalar(op: impl Into<Comparison>, value: &str) -> (String, Vec<SqlValue>) {
    let ctx = ParametersContext::new()
        .with("name", value)
        .with_operator("name", op);
    let out = render("select * from emp where ename = /*name*/'SCOTT'", &ctx);
    let values = values(&out);
    (out.sql().to_string(), values)
}

fn array(op: Option<Comparison>, items: Vec<i64>) -> Result<String, EvalError> {
    let mut ctx = ParametersContext::new().with("ids", list(items));
    if let Some(op) = op {
        ctx.set_operator("ids", op);
    }
    let out = parse("where e.id in /*ids*/(1, 2)").evaluate(&ctx)?;
    assert_eq!(out.sql().matches('?').count(), out.binds().len());
    Ok(out.sql().to_string())
}

#[test]
fn scalar_eq_and_neq() {
    assert_eq!(
        scalar(Op::Eq, "A").0,
        "select * from emp where ename = ?"
    );
    assert_eq!(
        scalar(Op::Neq, "A").0,
        "select * from emp where ename <> ?"
    );
    assert_eq!(
        scalar(Comparison::from(Op::Eq).reverse(), "A").0,
        "select * from emp where ename <> ?"
    );
}

#[test]
fn scalar_like_family_transforms_value() {
    let cases = [
        (Op::Like, "LIKE", "SC%"),
        (Op::NotLike, "NOT LIKE", "SC%"),
        (Op::StartsWith, "LIKE", "SC%%"),
        (Op::EndsWith, "LIKE", "%SC%"),
        (Op::Contains, "LIKE", "%SC%%"),
    ];
    for (op, token, expected) in cases {
        let (sql, values) = scalar(op, "SC%");
        assert_eq!(sql, format!("select * from emp where ename {token} ?"));
        assert_eq!(values, vec![text(expected)], "operator {op}");
    }
}

#[test]
fn scalar_reversed_starts_with() {
    let (sql, values) = scalar(Comparison::from(Op::StartsWith).reverse(), "A");
    assert_eq!(sql, "select * from emp where ename NOT LIKE ?");
    assert_eq!(values, vec![text("A%")]);
}

#[test]
fn scalar_range_not_applicable() {
    let ctx = ParametersContext::new()
        .with("name", "A")
        .with_operator("name", Op::Between);
    let err = render_err("where ename = /*name*/'SCOTT'", &ctx);
    assert_eq!(
        err,
        EvalError::OperatorNotApplicable {
            name: String::from("name"),
            operator: Op::Between,
        }
    );
}

#[test]
fn scalar_override_needs_source_operator() {
    let ctx = ParametersContext::new()
        .with("a", 1_i64)
        .with_operator("a", Op::Neq);
    let err = render_err("values (/*a*/0)", &ctx);
    assert!(matches!(err, EvalError::OperatorNotApplicable { .. }));
}

#[test]
fn array_default_is_in_list() {
    assert_eq!(array(None, vec![1, 2, 3]).unwrap(), "where e.id IN (?,?,?)");
    assert_eq!(array(None, vec![7]).unwrap(), "where e.id IN (?)");
}

#[test]
fn array_not_in_source_defaults_to_not_in() {
    let ctx = ParametersContext::new().with("ids", list([1_i64, 2]));
    let out = render("where id not in /*ids*/(1)", &ctx);
    assert_eq!(out.sql(), "where id NOT IN (?,?)");
}

#[test]
fn array_scalar_value_is_single_element() {
    let ctx = ParametersContext::new().with("ids", 9_i64);
    let out = render("where id in /*ids*/(1, 2)", &ctx);
    assert_eq!(out.sql(), "where id IN (?)");
    assert_eq!(values(&out), vec![SqlValue::Int(9)]);
}

#[test]
fn array_eq_neq_placeholder_count_matches_input() {
    for n in 1..=5 {
        let items: Vec<i64> = (0..n).collect();
        let placeholders = vec!["?"; usize::try_from(n).unwrap()].join(",");
        assert_eq!(
            array(Some(Op::Eq.into()), items.clone()).unwrap(),
            format!("where e.id IN ({placeholders})")
        );
        assert_eq!(
            array(Some(Op::Neq.into()), items).unwrap(),
            format!("where e.id NOT IN ({placeholders})")
        );
    }
}

#[test]
fn array_empty_collection() {
    assert_eq!(array(None, vec![]).unwrap(), "where 1=0");
    assert_eq!(array(Some(Op::Neq.into()), vec![]).unwrap(), "where 1=1");
}

#[test]
fn array_like_family() {
    let ctx = ParametersContext::new()
        .with("names", list(["a", "b"]))
        .with_operator("names", Op::Contains);
    let out = render("where name in /*names*/('x')", &ctx);
    assert_eq!(out.sql(), "where ( name LIKE ? OR name LIKE ? )");
    assert_eq!(values(&out), vec![text("%a%"), text("%b%")]);

    let ctx = ParametersContext::new()
        .with("names", list(["a", "b"]))
        .with_operator("names", Op::NotLike);
    let out = render("where name in /*names*/('x')", &ctx);
    assert_eq!(out.sql(), "where NOT ( name LIKE ? OR name LIKE ? )");
}

#[test]
fn array_ranges() {
    assert_eq!(
        array(Some(Op::GtAndLt.into()), vec![1, 9]).unwrap(),
        "where ( e.id > ? AND e.id < ? )"
    );
    assert_eq!(
        array(Some(Comparison::from(Op::GtAndLt).reverse()), vec![1, 9]).unwrap(),
        "where ( e.id <= ? OR e.id >= ? )"
    );
    assert_eq!(
        array(Some(Op::GteAndLte.into()), vec![1, 9]).unwrap(),
        "where ( e.id >= ? AND e.id <= ? )"
    );
    assert_eq!(
        array(Some(Op::Between.into()), vec![1, 9]).unwrap(),
        "where e.id BETWEEN ? AND ?"
    );
    assert_eq!(
        array(Some(Comparison::from(Op::Between).reverse()), vec![1, 9]).unwrap(),
        "where e.id NOT BETWEEN ? AND ?"
    );
}

#[test]
fn array_range_needs_two_values() {
    for items in [vec![1], vec![1, 2, 3]] {
        let actual = items.len();
        let err = array(Some(Op::GteAndLt.into()), items).unwrap_err();
        assert_eq!(
            err,
            EvalError::OperatorCardinality {
                name: String::from("ids"),
                operator: Op::GteAndLt,
                expected: 2,
                actual,
            }
        );
    }
}

#[test]
fn operator_names_parse() {
    assert_eq!("starts_with".parse::<Op>().unwrap(), Op::StartsWith);
    assert_eq!(
        "!BETWEEN".parse::<Comparison>().unwrap(),
        Comparison::from(Op::Between).reverse()
    );
    assert!("around".parse::<Op>().is_err());
}

#[test]
fn override_token_is_spaced_from_the_left_operand() {
    let ctx = ParametersContext::new()
        .with("a", "x")
        .with_operator("a", Op::Contains);
    let out = render("where a=/*a*/'x'", &ctx);
    assert_eq!(out.sql(), "where a LIKE ?");
    assert_eq!(values(&out), vec![SqlValue::Text(String::from("%x%"))]);

    let ctx = ParametersContext::new()
        .with("a", 5_i64)
        .with_operator("a", Op::Eq);
    let out = render("where a<>/*a*/1", &ctx);
    assert_eq!(out.sql(), "where a = ?");
    assert_eq!(values(&out), vec![SqlValue::Int(5)]);
}

#[test]
fn array_list_after_whitespace() {
    let sql = "select * from t where id in /*ids*/ (1, 2)";
    let out = render(sql, &ParametersContext::new().with("ids", 5_i64));
    assert_eq!(out.sql(), "select * from t where id IN (?)");
    assert_eq!(values(&out), vec![SqlValue::Int(5)]);

    let out = render(sql, &ParametersContext::new().with("ids", list([5_i64, 6])));
    assert_eq!(out.sql(), "select * from t where id IN (?,?)");
    assert_eq!(values(&out), vec![SqlValue::Int(5), SqlValue::Int(6)]);
}
