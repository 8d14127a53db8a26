//! End-to-end pipeline tests: surface AST through inference, lowering,
//! compilation and evaluation, checked against the exact REPL output.

use smelt::ast::builder::*;
use smelt::ast::Statement;
use smelt::error::{Error, RuntimeError};
use smelt::{eval_statement, prepare_statement, Environment, Session, TypeSystem};

struct Repl {
    session: Session,
    types: TypeSystem,
    env: Environment,
}

impl Repl {
    fn new() -> Self {
        Repl {
            session: Session::default(),
            types: TypeSystem::new(),
            env: Environment::initial(),
        }
    }

    fn run(&mut self, statement: Statement<()>) -> Result<Vec<String>, Error> {
        let mut output = Vec::new();
        let env = eval_statement(
            &self.session,
            &mut self.types,
            &self.env,
            statement,
            &mut output,
        )?;
        self.env = env;
        Ok(output)
    }

    fn run_ok(&mut self, statement: Statement<()>) -> Vec<String> {
        self.run(statement).expect("statement should evaluate")
    }
}

#[test]
fn test_addition() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(plus(int(1), int(2))));
    assert_eq!(output, vec!["val it = 3 : int"]);
}

#[test]
fn test_list_binding() {
    let mut repl = Repl::new();
    let output = repl.run_ok(decl_statement(val(
        pat_id("xs"),
        list(vec![int(1), int(2), int(3)]),
    )));
    assert_eq!(output, vec!["val xs = [1,2,3] : int list"]);
}

#[test]
fn test_let_with_simultaneous_bindings() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(let_in(
        vec![val_decl(vec![
            val_bind(false, pat_id("x"), int(3)),
            val_bind(false, pat_id("y"), int(4)),
        ])],
        plus(id("x"), id("y")),
    )));
    assert_eq!(output, vec!["val it = 7 : int"]);
}

#[test]
fn test_recursive_factorial() {
    let mut repl = Repl::new();
    let output = repl.run_ok(decl_statement(val_rec(
        pat_id("fact"),
        fn_match(vec![
            (pat_int(0), int(1)),
            (
                pat_id("n"),
                times(id("n"), apply(id("fact"), minus(id("n"), int(1)))),
            ),
        ]),
    )));
    assert_eq!(output, vec!["val fact = fn : int -> int"]);

    let output = repl.run_ok(expr_statement(apply(id("fact"), int(5))));
    assert_eq!(output, vec!["val it = 120 : int"]);

    // The base case goes through the literal clause, not match failure.
    let output = repl.run_ok(expr_statement(apply(id("fact"), int(0))));
    assert_eq!(output, vec!["val it = 1 : int"]);
}

#[test]
fn test_cons_pattern_application() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(apply(
        fn_match(vec![(pat_cons(pat_id("x"), pat_id("xs")), id("x"))]),
        list(vec![int(10), int(20), int(30)]),
    )));
    assert_eq!(output, vec!["val it = 10 : int"]);
}

#[test]
fn test_empty_list_defaults_to_unit_list() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(list(vec![])));
    assert_eq!(output, vec!["val it = [] : unit list"]);
}

#[test]
fn test_mutual_recursion_through_tuple_binding() {
    let mut repl = Repl::new();
    let even = fn_match(vec![
        (pat_int(0), bool_lit(true)),
        (pat_id("n"), apply(id("odd"), minus(id("n"), int(1)))),
    ]);
    let odd = fn_match(vec![
        (pat_int(0), bool_lit(false)),
        (pat_id("n"), apply(id("even"), minus(id("n"), int(1)))),
    ]);
    let output = repl.run_ok(decl_statement(val_rec(
        pat_tuple(vec![pat_id("even"), pat_id("odd")]),
        tuple(vec![even, odd]),
    )));
    assert_eq!(
        output,
        vec![
            "val even = fn : int -> bool",
            "val odd = fn : int -> bool"
        ]
    );

    let output = repl.run_ok(expr_statement(apply(id("even"), int(4))));
    assert_eq!(output, vec!["val it = true : bool"]);
    let output = repl.run_ok(expr_statement(apply(id("odd"), int(3))));
    assert_eq!(output, vec!["val it = true : bool"]);
    let output = repl.run_ok(expr_statement(apply(id("even"), int(7))));
    assert_eq!(output, vec!["val it = false : bool"]);
}

#[test]
fn test_non_exhaustive_match_fails_at_runtime() {
    let mut repl = Repl::new();
    let result = repl.run(expr_statement(apply(
        fn_match(vec![(pat_int(0), int(1))]),
        int(2),
    )));
    assert!(matches!(result, Err(Error::MatchFailure)));
}

#[test]
fn test_record_pattern_with_ellipsis() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(apply(
        fn_match(vec![(pat_record(vec![("a", pat_id("a"))], true), id("a"))]),
        record(vec![("a", int(1)), ("b", int(2)), ("c", int(3))]),
    )));
    assert_eq!(output, vec!["val it = 1 : int"]);
}

#[test]
fn test_if_then_else_and_connectives() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(if_then_else(
        andalso(bool_lit(true), lt(int(1), int(2))),
        string("yes"),
        string("no"),
    )));
    assert_eq!(output, vec!["val it = \"yes\" : string"]);

    // orelse short-circuits: the diverging right operand is never
    // evaluated.
    let output = repl.run_ok(expr_statement(if_then_else(
        orelse(
            bool_lit(true),
            eq(apply(id("List.hd"), list(vec![])), int(1)),
        ),
        int(1),
        int(2),
    )));
    assert_eq!(output, vec!["val it = 1 : int"]);
}

#[test]
fn test_runtime_errors_are_distinct_from_match_failure() {
    let mut repl = Repl::new();
    let result = repl.run(expr_statement(infix(
        smelt::ast::InfixOp::Div,
        int(1),
        int(0),
    )));
    assert!(matches!(
        result,
        Err(Error::Runtime(RuntimeError::DivisionByZero))
    ));

    let result = repl.run(expr_statement(apply(id("List.hd"), list(vec![]))));
    assert!(matches!(
        result,
        Err(Error::Runtime(RuntimeError::EmptyList))
    ));
}

#[test]
fn test_type_error_aborts_without_extending_environment() {
    let mut repl = Repl::new();
    let result = repl.run(decl_statement(val(pat_id("x"), id("missing"))));
    assert!(matches!(result, Err(Error::Type(_))));
    // x was never bound.
    let result = repl.run(expr_statement(id("x")));
    assert!(matches!(result, Err(Error::Type(_))));
}

#[test]
fn test_compiled_statement_evaluates_deterministically() {
    let mut types = TypeSystem::new();
    let env = Environment::initial();
    let session = Session::default();
    let compiled = prepare_statement(
        &session,
        &mut types,
        &env,
        expr_statement(plus(times(int(2), int(3)), int(4))),
    )
    .unwrap();
    let mut first = Vec::new();
    let mut second = Vec::new();
    compiled.eval(&env, &mut first).unwrap();
    compiled.eval(&env, &mut second).unwrap();
    assert_eq!(first, vec!["val it = 10 : int"]);
    assert_eq!(first, second);
}

#[test]
fn test_builtin_list_functions() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(apply(
        apply(id("List.map"), lambda("x", times(id("x"), id("x")))),
        list(vec![int(1), int(2), int(3)]),
    )));
    assert_eq!(output, vec!["val it = [1,4,9] : int list"]);

    let output = repl.run_ok(expr_statement(apply(
        apply(id("List.filter"), lambda("x", lt(int(1), id("x")))),
        list(vec![int(1), int(2), int(3)]),
    )));
    assert_eq!(output, vec!["val it = [2,3] : int list"]);

    let output = repl.run_ok(expr_statement(apply(id("String.size"), string("hello"))));
    assert_eq!(output, vec!["val it = 5 : int"]);
}

#[test]
fn test_datatype_declaration_and_case() {
    let mut repl = Repl::new();
    repl.run_ok(decl_statement(datatype(
        "option",
        vec!["a"],
        vec![("NONE", None), ("SOME", Some(ty_var("a")))],
    )));

    let output = repl.run_ok(decl_statement(val(
        pat_id("x"),
        apply(id("SOME"), int(7)),
    )));
    assert_eq!(output, vec!["val x = SOME 7 : int option"]);

    let output = repl.run_ok(expr_statement(case(
        id("x"),
        vec![
            (pat_con("SOME", Some(pat_id("v"))), id("v")),
            (pat_con("NONE", None), int(0)),
        ],
    )));
    assert_eq!(output, vec!["val it = 7 : int"]);
}

#[test]
fn test_string_and_char_output_forms() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(infix(
        smelt::ast::InfixOp::Caret,
        string("foo"),
        string("bar"),
    )));
    assert_eq!(output, vec!["val it = \"foobar\" : string"]);

    let output = repl.run_ok(expr_statement(char_lit('x')));
    assert_eq!(output, vec!["val it = #\"x\" : char"]);

    let output = repl.run_ok(expr_statement(minus(int(0), int(5))));
    assert_eq!(output, vec!["val it = ~5 : int"]);
}

#[test]
fn test_record_destructuring_binding() {
    let mut repl = Repl::new();
    // val {a = a, ...} = {a=1, b=2}: the ellipsis meets a concrete record.
    let output = repl.run_ok(decl_statement(val(
        pat_record(vec![("a", pat_id("a"))], true),
        record(vec![("a", int(1)), ("b", int(2))]),
    )));
    assert_eq!(output, vec!["val a = 1 : int"]);
}

#[test]
fn test_session_knobs_do_not_change_results() {
    for session in [
        Session {
            inline_pass_count: 1,
            hybrid: false,
        },
        Session {
            inline_pass_count: 8,
            hybrid: true,
        },
    ] {
        let mut types = TypeSystem::new();
        let env = Environment::initial();
        let mut output = Vec::new();
        let statement = expr_statement(let_in(
            vec![val(pat_id("x"), int(3))],
            plus(id("x"), int(4)),
        ));
        eval_statement(&session, &mut types, &env, statement, &mut output).unwrap();
        assert_eq!(output, vec!["val it = 7 : int"]);
    }
}

#[test]
fn test_tuple_and_record_output_forms() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(tuple(vec![int(3), string("a")])));
    assert_eq!(output, vec!["val it = (3,\"a\") : int * string"]);

    // Record fields print in canonical order no matter the source order.
    let output = repl.run_ok(expr_statement(record(vec![
        ("name", string("ed")),
        ("age", int(3)),
    ])));
    assert_eq!(
        output,
        vec!["val it = {age=3,name=\"ed\"} : {age:int, name:string}"]
    );
}
