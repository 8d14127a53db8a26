//! smelt - an interpreter for a subset of Standard ML, extended with a
//! SQL-inspired `from ... where ... group ... order ... yield` relational
//! comprehension.
//!
//! The pipeline is strictly staged. A surface AST (built by an external
//! parser, or by [`ast::builder`]) is typed by [`types::Infer`], lowered
//! to the core language by [`resolve::Resolver`], optionally simplified
//! by the inline passes in [`compile::inline`], compiled to a `Code` tree
//! by [`compile::Compiler`], and evaluated against an environment of
//! bindings. Each new binding produces one output line of the form
//! `val name = value : type`.

pub mod ast;
pub mod compile;
pub mod core;
pub mod error;
pub mod fmt;
pub mod interpreter;
pub mod resolve;
pub mod types;

pub use compile::{CompiledStatement, Environment};
pub use error::Error;
pub use types::TypeSystem;

use ast::builder;
use ast::{Pos, Statement};
use log::debug;

/// Host configuration knobs.
#[derive(Debug, Clone)]
pub struct Session {
    /// Number of optimiser fixpoint passes, at least 1.
    pub inline_pass_count: usize,
    /// Route statements through the relational-pushdown compiler where it
    /// supports them, falling back to the base compiler where it does not.
    pub hybrid: bool,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            inline_pass_count: 4,
            hybrid: false,
        }
    }
}

/// Type-check, lower, optimise and compile one statement against an
/// environment. A bare expression is bound to `it` first.
pub fn prepare_statement(
    session: &Session,
    types: &mut TypeSystem,
    env: &Environment,
    statement: Statement<()>,
) -> Result<CompiledStatement, Error> {
    let decl = match statement {
        Statement::Decl(decl) => decl,
        Statement::Expr(exp) => {
            // val it = <exp>
            ast::Decl::Val(ast::ValDecl {
                binds: vec![ast::ValBind {
                    rec: false,
                    pat: builder::pat_id("it"),
                    exp,
                    position: Pos::default(),
                }],
                position: Pos::default(),
                info: (),
            })
        }
    };

    let type_env = env.type_env();
    let mut infer = types::Infer::new(types);
    let typed = infer.decl(&type_env, &decl)?;

    let mut resolver = resolve::Resolver::new();
    let mut core_decl = resolver.decl(&typed)?;

    let passes = session.inline_pass_count.max(1);
    core_decl = compile::inline::optimize(core_decl, passes);
    debug!("core declaration after {} inline passes: {:?}", passes, core_decl);

    if session.hybrid {
        if let Some(compiled) = compile::pushdown::try_compile(types, env, &core_decl) {
            return Ok(compiled);
        }
    }
    compile::Compiler::new(types).compile_statement(env, &core_decl)
}

/// Convenience: prepare and evaluate in one call, appending the REPL
/// lines for every new binding to `output`.
pub fn eval_statement(
    session: &Session,
    types: &mut TypeSystem,
    env: &Environment,
    statement: Statement<()>,
    output: &mut Vec<String>,
) -> Result<Environment, Error> {
    let compiled = prepare_statement(session, types, env, statement)?;
    compiled.eval(env, output)
}
