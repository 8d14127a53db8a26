//! End-to-end tests for `from` expressions: cartesian sources, filtering,
//! grouping with aggregates, ordering and yields.

use smelt::ast::builder::*;
use smelt::ast::expression::Direction;
use smelt::ast::Statement;
use smelt::error::Error;
use smelt::{eval_statement, Environment, Session, TypeSystem};

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

fn emps() -> smelt::ast::Expr<()> {
    list(vec![
        record(vec![("id", int(1)), ("dept", int(10))]),
        record(vec![("id", int(2)), ("dept", int(10))]),
        record(vec![("id", int(3)), ("dept", int(20))]),
    ])
}

#[test]
fn test_group_compute_count() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("e"), emps())],
        vec![group_step(
            vec![("dept", apply(record_selector("dept"), id("e")))],
            vec![aggregate("c", id("count"), None)],
        )],
        Some(record(vec![("dept", id("dept")), ("c", id("c"))])),
    )));
    assert_eq!(
        output,
        vec!["val it = [{c=2,dept=10},{c=1,dept=20}] : {c:int, dept:int} list"]
    );
}

#[test]
fn test_default_yield_single_source() {
    let mut repl = Repl::new();
    // from x in [1,2,3] where x > 1: the default yield is x itself.
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("x"), list(vec![int(1), int(2), int(3)]))],
        vec![where_step(lt(int(1), id("x")))],
        None,
    )));
    assert_eq!(output, vec!["val it = [2,3] : int list"]);
}

#[test]
fn test_default_yield_two_sources_is_a_record() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(from(
        vec![
            (pat_id("x"), list(vec![int(1), int(2)])),
            (pat_id("y"), list(vec![int(10)])),
        ],
        vec![],
        None,
    )));
    assert_eq!(
        output,
        vec!["val it = [{x=1,y=10},{x=2,y=10}] : {x:int, y:int} list"]
    );
}

#[test]
fn test_cartesian_product_with_dependent_filter() {
    let mut repl = Repl::new();
    // from x in [1,2,3], y in [1,2,3] where x < y yield (x, y)
    let output = repl.run_ok(expr_statement(from(
        vec![
            (pat_id("x"), list(vec![int(1), int(2), int(3)])),
            (pat_id("y"), list(vec![int(1), int(2), int(3)])),
        ],
        vec![where_step(lt(id("x"), id("y")))],
        Some(tuple(vec![id("x"), id("y")])),
    )));
    assert_eq!(
        output,
        vec!["val it = [(1,2),(1,3),(2,3)] : (int * int) list"]
    );
}

#[test]
fn test_order_ascending_and_descending() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("x"), list(vec![int(2), int(3), int(1)]))],
        vec![order_step(vec![(id("x"), Direction::Asc)])],
        None,
    )));
    assert_eq!(output, vec!["val it = [1,2,3] : int list"]);

    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("x"), list(vec![int(2), int(3), int(1)]))],
        vec![order_step(vec![(id("x"), Direction::Desc)])],
        None,
    )));
    assert_eq!(output, vec!["val it = [3,2,1] : int list"]);
}

#[test]
fn test_order_by_record_field_after_yield_shape() {
    let mut repl = Repl::new();
    // Order by dept descending, then project ids.
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("e"), emps())],
        vec![order_step(vec![(
            apply(record_selector("dept"), id("e")),
            Direction::Desc,
        )])],
        Some(apply(record_selector("id"), id("e"))),
    )));
    assert_eq!(output, vec!["val it = [3,1,2] : int list"]);
}

#[test]
fn test_group_sum_aggregate_with_argument() {
    let mut repl = Repl::new();
    // from e in emps group dept = #dept e compute s = sum of #id e
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("e"), emps())],
        vec![group_step(
            vec![("dept", apply(record_selector("dept"), id("e")))],
            vec![aggregate(
                "s",
                id("sum"),
                Some(apply(record_selector("id"), id("e"))),
            )],
        )],
        None,
    )));
    assert_eq!(
        output,
        vec!["val it = [{dept=10,s=3},{dept=20,s=3}] : {dept:int, s:int} list"]
    );
}

#[test]
fn test_group_resets_bindings() {
    let mut repl = Repl::new();
    // After group, the source binding e is out of scope.
    let result = repl.run(expr_statement(from(
        vec![(pat_id("e"), emps())],
        vec![group_step(
            vec![("dept", apply(record_selector("dept"), id("e")))],
            vec![],
        )],
        Some(apply(record_selector("id"), id("e"))),
    )));
    assert!(matches!(result, Err(Error::Type(_))));
}

#[test]
fn test_where_after_group_sees_keys_and_aggregates() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("e"), emps())],
        vec![
            group_step(
                vec![("dept", apply(record_selector("dept"), id("e")))],
                vec![aggregate("c", id("count"), None)],
            ),
            where_step(lt(int(1), id("c"))),
        ],
        Some(id("dept")),
    )));
    assert_eq!(output, vec!["val it = [10] : int list"]);
}

#[test]
fn test_pattern_source_filters_non_matching_rows() {
    let mut repl = Repl::new();
    // from (x :: _) in [[1,2],[],[3]] yield x
    let output = repl.run_ok(expr_statement(from(
        vec![(
            pat_cons(pat_id("x"), pat_wild()),
            list(vec![
                list(vec![int(1), int(2)]),
                list(vec![]),
                list(vec![int(3)]),
            ]),
        )],
        vec![],
        None,
    )));
    assert_eq!(output, vec!["val it = [1,3] : int list"]);
}

#[test]
fn test_min_max_aggregates() {
    let mut repl = Repl::new();
    let output = repl.run_ok(expr_statement(from(
        vec![(pat_id("e"), emps())],
        vec![group_step(
            vec![("dept", apply(record_selector("dept"), id("e")))],
            vec![
                aggregate("lo", id("min"), Some(apply(record_selector("id"), id("e")))),
                aggregate("hi", id("max"), Some(apply(record_selector("id"), id("e")))),
            ],
        )],
        None,
    )));
    assert_eq!(
        output,
        vec![
            "val it = [{dept=10,hi=2,lo=1},{dept=20,hi=3,lo=3}] : {dept:int, hi:int, lo:int} list"
        ]
    );
}
