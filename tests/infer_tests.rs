//! Inference behaviour observed through the public pipeline entry points:
//! reported types, determinism, and the errors that abort a statement.

use smelt::ast::builder::*;
use smelt::error::Error;
use smelt::types::{Infer, TypeError, TypeSystem};
use smelt::{prepare_statement, Environment, Session, TypeSystem as Ts};

fn statement_type(statement: smelt::ast::Statement<()>) -> Result<String, Error> {
    let mut types = Ts::new();
    let env = Environment::initial();
    let session = Session::default();
    let compiled = prepare_statement(&session, &mut types, &env, statement)?;
    Ok(compiled.ty().description())
}

#[test]
fn test_reported_statement_types() {
    assert_eq!(
        statement_type(expr_statement(plus(int(1), int(2)))).unwrap(),
        "int"
    );
    assert_eq!(
        statement_type(decl_statement(val(
            pat_id("xs"),
            list(vec![int(1), int(2)])
        )))
        .unwrap(),
        "int list"
    );
    assert_eq!(
        statement_type(expr_statement(lambda("x", plus(id("x"), int(1))))).unwrap(),
        "int -> int"
    );
    assert_eq!(
        statement_type(expr_statement(tuple(vec![int(1), string("a")]))).unwrap(),
        "int * string"
    );
}

#[test]
fn test_unconstrained_variables_default_to_unit() {
    assert_eq!(
        statement_type(expr_statement(list(vec![]))).unwrap(),
        "unit list"
    );
    assert_eq!(
        statement_type(expr_statement(lambda("x", id("x")))).unwrap(),
        "unit -> unit"
    );
}

#[test]
fn test_inference_is_deterministic() {
    let build = || {
        expr_statement(let_in(
            vec![val(pat_id("id"), lambda("x", id("x")))],
            tuple(vec![apply(id("id"), int(1)), apply(id("id"), string("s"))]),
        ))
    };
    let first = statement_type(build()).unwrap();
    let second = statement_type(build()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "int * string");
}

#[test]
fn test_typed_tree_is_identical_across_runs() {
    let mut types_a = TypeSystem::new();
    let mut types_b = TypeSystem::new();
    let env = Environment::initial().type_env();
    let decl = val(
        pat_id("f"),
        lambda("x", plus(apply(id("abs"), id("x")), int(1))),
    );
    let typed_a = Infer::new(&mut types_a).decl(&env, &decl).unwrap();
    let typed_b = Infer::new(&mut types_b).decl(&env, &decl).unwrap();
    assert_eq!(typed_a, typed_b);
}

#[test]
fn test_unbound_identifier_is_a_type_error() {
    let result = statement_type(expr_statement(id("nowhere")));
    assert!(matches!(
        result,
        Err(Error::Type(TypeError::UnboundVariable { .. }))
    ));
}

#[test]
fn test_unification_failure_is_a_type_error() {
    let result = statement_type(expr_statement(plus(int(1), string("x"))));
    assert!(matches!(result, Err(Error::Type(_))));

    let result = statement_type(expr_statement(if_then_else(
        int(1),
        int(2),
        int(3),
    )));
    assert!(matches!(result, Err(Error::Type(_))));
}

#[test]
fn test_occurs_check_rejects_infinite_type() {
    // fn x => x x
    let result = statement_type(expr_statement(fn_match(vec![(
        pat_id("x"),
        apply(id("x"), id("x")),
    )])));
    assert!(matches!(
        result,
        Err(Error::Type(TypeError::OccursCheck { .. }))
    ));
}

#[test]
fn test_constructor_arity_checked_in_patterns() {
    let mut types = TypeSystem::new();
    let env = Environment::initial();
    let session = Session::default();
    let dt = decl_statement(datatype(
        "option",
        vec!["a"],
        vec![("NONE", None), ("SOME", Some(ty_var("a")))],
    ));
    let mut output = Vec::new();
    let env = smelt::eval_statement(&session, &mut types, &env, dt, &mut output).unwrap();

    // NONE with an argument is an arity error.
    let bad = expr_statement(case(
        apply(id("SOME"), int(1)),
        vec![(pat_con("NONE", Some(pat_id("x"))), id("x"))],
    ));
    let result = prepare_statement(&session, &mut types, &env, bad);
    assert!(matches!(
        result,
        Err(Error::Type(TypeError::ConstructorArity { .. }))
    ));
}

#[test]
fn test_unresolved_partial_record_is_rejected() {
    // val f = fn {a, ...} => a never meets a concrete record.
    let result = statement_type(decl_statement(val(
        pat_id("f"),
        fn_match(vec![(pat_record(vec![("a", pat_id("a"))], true), id("a"))]),
    )));
    assert!(matches!(
        result,
        Err(Error::Type(TypeError::UnresolvedRecord { .. }))
    ));
}

#[test]
fn test_polymorphic_builtins_instantiate_per_use() {
    assert_eq!(
        statement_type(expr_statement(tuple(vec![
            apply(id("List.length"), list(vec![int(1)])),
            apply(id("List.length"), list(vec![string("a")])),
        ])))
        .unwrap(),
        "int * int"
    );
}
