//! Tests for stream bindings and parameter markers.

mod common;
use common::*;

use std::io::{Cursor, Read, Write};

use twoway_sql_core::{
    EvalError, InputStream, OutputStream, ParametersContext, SqlValue, StreamDirection,
};

#[test]
fn input_stream_is_bound_not_rendered() {
    let data = InputStream::new(Cursor::new(b"1,a\n2,b\n".to_vec()));
    let ctx = ParametersContext::new().with("data", data.clone());
    let out = render("COPY t FROM STDIN /*@in data*/", &ctx);
    assert_eq!(out.sql(), "COPY t FROM STDIN ");
    assert!(out.binds().is_empty());

    let bound = out.input_stream().unwrap();
    assert!(bound.same_stream(&data));
    let mut contents = String::new();
    bound.0.lock().unwrap().read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "1,a\n2,b\n");
}

#[test]
fn output_stream_is_bound() {
    let log = OutputStream::new(Vec::<u8>::new());
    let ctx = ParametersContext::new().with("log", log.clone());
    let out = render("COPY t TO STDOUT /*@out log*/", &ctx);
    assert!(out.input_stream().is_none());
    let bound = out.output_stream().unwrap();
    assert!(bound.same_stream(&log));
    bound.0.lock().unwrap().write_all(b"ok").unwrap();
}

#[test]
fn input_and_output_together() {
    let ctx = ParametersContext::new()
        .with("src", InputStream::new(std::io::empty()))
        .with("dst", OutputStream::new(std::io::sink()));
    let out = render("/*@in src*//*@out dst*/", &ctx);
    assert!(out.input_stream().is_some());
    assert!(out.output_stream().is_some());
}

#[test]
fn duplicate_input_stream() {
    let ctx = ParametersContext::new()
        .with("a", InputStream::new(std::io::empty()))
        .with("b", InputStream::new(std::io::empty()));
    let err = render_err("/*@in a*/ /*@in b*/", &ctx);
    assert_eq!(
        err,
        EvalError::DuplicateStream {
            direction: StreamDirection::Input
        }
    );
}

#[test]
fn duplicate_output_stream_in_loop() {
    let ctx = ParametersContext::new()
        .with("log", OutputStream::new(std::io::sink()))
        .with("xs", twoway_sql_core::list([1_i64, 2]));
    let err = render_err("/*for x:xs*//*@out log*//*end*/", &ctx);
    assert_eq!(
        err,
        EvalError::DuplicateStream {
            direction: StreamDirection::Output
        }
    );
}

#[test]
fn stream_directive_needs_stream_value() {
    let ctx = ParametersContext::new().with("data", "not a stream");
    let err = render_err("/*@in data*/", &ctx);
    assert!(matches!(err, EvalError::TypeMismatch { .. }));

    let ctx = ParametersContext::new().with("data", InputStream::new(std::io::empty()));
    let err = render_err("/*@out data*/", &ctx);
    assert!(matches!(err, EvalError::TypeMismatch { .. }));
}

#[test]
fn marker_emits_no_text() {
    let out = render("/*@p@*/select 1", &ParametersContext::new());
    assert_eq!(out.sql(), "select 1");
    assert_eq!(out.declarations().len(), 1);
    assert_eq!(out.declarations()[0].name, "p");
}

#[test]
fn marker_default_and_type() {
    let sql = "/*@lim=10;type=INTEGER@*/select * from t limit /*lim*/5";
    let out = render(sql, &ParametersContext::new());
    assert_eq!(out.sql(), "select * from t limit ?");
    assert_eq!(values(&out), vec![SqlValue::Int(10)]);
    assert_eq!(out.binds()[0].sql_type.as_deref(), Some("INTEGER"));

    let ctx = ParametersContext::new().with("lim", 3_i64);
    let out = render(sql, &ctx);
    assert_eq!(values(&out), vec![SqlValue::Int(3)]);
    assert_eq!(out.binds()[0].sql_type.as_deref(), Some("INTEGER"));
}

#[test]
fn marker_type_applies_to_earlier_binds() {
    let sql = "select * from t where id = /*id*/1 /*@id;type=BIGINT@*/";
    let ctx = ParametersContext::new().with("id", 1_i64);
    let out = render(sql, &ctx);
    assert_eq!(out.binds()[0].sql_type.as_deref(), Some("BIGINT"));
}

#[test]
fn marker_default_is_not_visible_before_declaration() {
    let err = render_err(
        "select * from t limit /*lim*/5 /*@lim=10@*/",
        &ParametersContext::new(),
    );
    assert_eq!(err, EvalError::MissingParameter(String::from("lim")));
}

#[test]
fn directive_type_option_wins_over_marker() {
    let sql = "/*@id;type=BIGINT@*/where id = /*id;type=NUMERIC*/1";
    let ctx = ParametersContext::new().with("id", 1_i64);
    let out = render(sql, &ctx);
    assert_eq!(out.binds()[0].sql_type.as_deref(), Some("NUMERIC"));
}

#[test]
fn marker_default_feeds_array() {
    let sql = "/*@ids=7@*/where id in /*ids*/(1, 2)";
    let out = render(sql, &ParametersContext::new());
    assert_eq!(out.sql(), "where id IN (?)");
    assert_eq!(values(&out), vec![text("7")]);
}

#[test]
fn marker_default_follows_declared_type() {
    let out = render(
        "/*@id=42;type=BIGINT@*//*@on=true;type=BOOLEAN@*/where id = /*id*/1 and on = /*on*/false",
        &ParametersContext::new(),
    );
    assert_eq!(values(&out), vec![SqlValue::Int(42), SqlValue::Bool(true)]);

    let out = render(
        "/*@day=2020-01-01;type=DATE@*/where d = /*day*/date '2019-01-01'",
        &ParametersContext::new(),
    );
    assert_eq!(values(&out), vec![text("2020-01-01")]);
}

#[test]
fn marker_default_that_does_not_fit_type() {
    let err = render_err(
        "/*@lim=ten;type=INTEGER@*/select * from t limit /*lim*/5",
        &ParametersContext::new(),
    );
    assert_eq!(
        err,
        EvalError::InvalidDefault {
            name: String::from("lim"),
            value: String::from("ten"),
        }
    );
}
