use smelt::ast::builder::*;
use smelt::ast::expression::Direction;
use smelt::{eval_statement, Environment, Session, TypeSystem};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let session = Session::default();
    let mut types = TypeSystem::new();
    let mut env = Environment::initial();

    // A small scripted session exercising the whole pipeline.
    let statements = vec![
        expr_statement(plus(int(1), int(2))),
        decl_statement(val(pat_id("xs"), list(vec![int(1), int(2), int(3)]))),
        decl_statement(val_rec(
            pat_id("fact"),
            fn_match(vec![
                (pat_int(0), int(1)),
                (
                    pat_id("n"),
                    times(id("n"), apply(id("fact"), minus(id("n"), int(1)))),
                ),
            ]),
        )),
        expr_statement(apply(id("fact"), int(5))),
        expr_statement(from(
            vec![(
                pat_id("e"),
                list(vec![
                    record(vec![("id", int(1)), ("dept", int(10))]),
                    record(vec![("id", int(2)), ("dept", int(10))]),
                    record(vec![("id", int(3)), ("dept", int(20))]),
                ]),
            )],
            vec![group_step(
                vec![("dept", apply(record_selector("dept"), id("e")))],
                vec![aggregate("c", id("count"), None)],
            )],
            Some(record(vec![
                ("dept", id("dept")),
                ("c", id("c")),
            ])),
        )),
        expr_statement(from(
            vec![(pat_id("x"), id("xs"))],
            vec![
                where_step(lt(int(1), id("x"))),
                order_step(vec![(id("x"), Direction::Desc)]),
            ],
            None,
        )),
    ];

    for statement in statements {
        let mut output = Vec::new();
        match eval_statement(&session, &mut types, &env, statement, &mut output) {
            Ok(next) => {
                env = next;
                for line in output {
                    println!("{}", line);
                }
            }
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}
