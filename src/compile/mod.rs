//! Compilation of core declarations to executable code.
//!
//! Each core variant maps to one `Code` combinator. Identifier references
//! whose compile-time binding carries code are inlined in place, which is
//! how recursive bindings work: before the right-hand side of a `val rec`
//! is compiled, every identifier in its pattern gets a forward-reference
//! cell bound into the environment, and the cells are linked to the
//! compiled code afterwards. Linking walks tuple patterns and tuple codes
//! in parallel, so mutual recursion through a tuple binding links too.

pub mod env;
pub mod inline;
pub mod pushdown;

pub use env::{Binding, Bound, Environment};

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::core::{self, Decl, Exp, FromStep, Pat, ValDecl};
use crate::error::{CompileError, Error};
use crate::fmt::binding_line;
use crate::interpreter::builtins::BuiltIn;
use crate::interpreter::{lit_value, Code, FromCode, LinkCode, StepCode, Value};
use crate::types::ty::UNIT;
use crate::types::{Type, TypeSystem};

/// A statement ready to run: evaluating it extends the environment and
/// appends one output line per bound name.
pub struct CompiledStatement {
    ty: Type,
    kind: Compiled,
}

enum Compiled {
    Val { pat: Pat, code: Code },
    Datatype { constructors: Vec<Binding> },
}

impl CompiledStatement {
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn eval(
        &self,
        env: &Environment,
        output: &mut Vec<String>,
    ) -> Result<Environment, Error> {
        match &self.kind {
            Compiled::Val { pat, code } => {
                let value = code.eval(&env.eval_env())?;
                let mut bound = Vec::new();
                if !bind_recurse(pat, &value, &mut bound) {
                    return Err(Error::MatchFailure);
                }
                let mut result = env.clone();
                for (name, ty, value) in bound {
                    output.push(binding_line(&name, &value, &ty));
                    result = result.bind(Binding::of_value(name, ty, value));
                }
                Ok(result)
            }
            Compiled::Datatype { constructors } => {
                let mut result = env.clone();
                for binding in constructors {
                    result = result.bind(binding.clone());
                }
                Ok(result)
            }
        }
    }
}

/// Destructure a value through the declaration pattern, collecting each
/// bound name with its type and value, in pattern order.
fn bind_recurse(pat: &Pat, value: &Value, out: &mut Vec<(String, Type, Value)>) -> bool {
    match pat {
        Pat::Id(id) => {
            out.push((id.name.clone(), id.ty.clone(), value.clone()));
            true
        }
        Pat::Wildcard(_) => true,
        Pat::Literal(_) | Pat::Con0(_) | Pat::Con(_) | Pat::List(_) => {
            // Refutable patterns at declaration level go through the
            // general matcher; names they bind are collected afterwards.
            match crate::interpreter::bind_pat(&crate::interpreter::EvalEnv::empty(), pat, value) {
                Some(env) => {
                    for (name, ty) in pat.bound_names() {
                        match env.lookup(&name) {
                            Some(v) => out.push((name, ty, v.clone())),
                            None => return false,
                        }
                    }
                    true
                }
                None => false,
            }
        }
        Pat::Tuple(tuple) => match value {
            Value::Tuple(values) if values.len() == tuple.args.len() => tuple
                .args
                .iter()
                .zip(values)
                .all(|(p, v)| bind_recurse(p, v, out)),
            _ => false,
        },
        Pat::Record(record) => match value {
            Value::Record { labels, values } => {
                record.fields.iter().all(|(label, p)| {
                    labels
                        .iter()
                        .position(|l| l == label)
                        .map(|slot| bind_recurse(p, &values[slot], out))
                        .unwrap_or(false)
                })
            }
            _ => false,
        },
    }
}

pub struct Compiler<'a> {
    types: &'a TypeSystem,
}

impl<'a> Compiler<'a> {
    pub fn new(types: &'a TypeSystem) -> Self {
        Compiler { types }
    }

    pub fn compile_statement(
        &self,
        env: &Environment,
        decl: &Decl,
    ) -> Result<CompiledStatement, Error> {
        match decl {
            Decl::Val(d) => {
                let code = self.compile_val_bind(env, d)?;
                debug!("compiled val decl binding {:?}", d.bound_names());
                Ok(CompiledStatement {
                    ty: d.pat.ty().clone(),
                    kind: Compiled::Val {
                        pat: d.pat.clone(),
                        code,
                    },
                })
            }
            Decl::Datatype(d) => Ok(CompiledStatement {
                ty: UNIT,
                kind: Compiled::Datatype {
                    constructors: self.constructor_bindings(&d.names)?,
                },
            }),
        }
    }

    fn constructor_bindings(&self, names: &[String]) -> Result<Vec<Binding>, Error> {
        let mut bindings = Vec::new();
        for name in names {
            let def = self.types.datatype(name).ok_or_else(|| {
                Error::Compile(CompileError::Invariant(format!(
                    "undeclared datatype {}",
                    name
                )))
            })?;
            for (con, arg) in &def.constructors {
                let scheme = self
                    .types
                    .constructor_scheme(con)
                    .expect("constructor of a registered datatype");
                let value = match arg {
                    Some(_) => Value::ConFn(con.clone()),
                    None => Value::Con(con.clone(), None),
                };
                bindings.push(Binding::of_scheme(con.clone(), scheme, value));
            }
        }
        Ok(bindings)
    }

    /// Compile the right-hand side of a binding, installing and linking
    /// forward references when it is recursive.
    fn compile_val_bind(&self, env: &Environment, d: &ValDecl) -> Result<Code, Error> {
        if !d.rec {
            return self.compile(env, &d.exp);
        }
        let mut links: HashMap<String, LinkCode> = HashMap::new();
        let mut env2 = env.clone();
        for (name, ty) in d.pat.bound_names() {
            let link = LinkCode::new();
            env2 = env2.bind(Binding::of_code(
                name.clone(),
                ty,
                Code::Link(link.clone()),
            ));
            links.insert(name, link);
        }
        let code = self.compile(&env2, &d.exp)?;
        link(&links, &d.pat, &code)?;
        for (name, cell) in &links {
            if !cell.is_linked() {
                return Err(Error::Compile(CompileError::Invariant(format!(
                    "recursive binding {} cannot be linked; the recursive \
                     name must be bound at identifier position or through a \
                     tuple of such positions",
                    name
                ))));
            }
        }
        Ok(code)
    }

    pub fn compile(&self, env: &Environment, exp: &Exp) -> Result<Code, Error> {
        match exp {
            Exp::Literal(lit) => Ok(Code::Constant(lit_value(&lit.value))),

            Exp::FnLiteral(f) => Ok(Code::Constant(Value::BuiltIn(f.builtin))),

            Exp::Id(id) => match env.lookup(&id.name) {
                // A binding that already carries code, notably a forward
                // reference, is inlined in place.
                Some(Binding {
                    value: Bound::Code(code),
                    ..
                }) => Ok(code.clone()),
                _ => Ok(Code::Get(id.name.clone())),
            },

            Exp::RecordSelector(sel) => Ok(Code::Constant(Value::Selector(sel.slot))),

            Exp::Tuple(tuple) => {
                let codes = tuple
                    .args
                    .iter()
                    .map(|a| self.compile(env, a))
                    .collect::<Result<Vec<_>, _>>()?;
                match &tuple.ty {
                    Type::Record { fields, .. } => Ok(Code::MakeRecord {
                        labels: Rc::new(
                            fields.keys().map(|l| l.as_str().to_string()).collect(),
                        ),
                        codes,
                    }),
                    _ => Ok(Code::MakeTuple(codes)),
                }
            }

            Exp::Apply(apply) => self.compile_apply(env, apply),

            Exp::Fn(f) => Ok(Code::Closure(Rc::new(self.compile_matches(env, &f.matches)?))),

            Exp::Case(case) => {
                let clauses = self.compile_matches(env, &case.matches)?;
                let scrutinee = self.compile(env, &case.exp)?;
                Ok(Code::Apply {
                    func: Box::new(Code::Closure(Rc::new(clauses))),
                    arg: Box::new(scrutinee),
                })
            }

            Exp::Let(let_) => match let_.decl.as_ref() {
                Decl::Val(d) => {
                    let rhs = self.compile_val_bind(env, d)?;
                    let mut env2 = env.clone();
                    for (name, ty) in d.pat.bound_names() {
                        env2 = env2.bind(Binding::parameter(name, ty));
                    }
                    let body = self.compile(&env2, &let_.body)?;
                    Ok(Code::Let {
                        pat: Box::new(d.pat.clone()),
                        rhs: Box::new(rhs),
                        body: Box::new(body),
                    })
                }
                // Datatypes are compile-time; only their constructor
                // values surface at run time.
                Decl::Datatype(d) => {
                    let constructors = self.constructor_bindings(&d.names)?;
                    let mut env2 = env.clone();
                    for binding in &constructors {
                        env2 = env2.bind(binding.clone());
                    }
                    let body = self.compile(&env2, &let_.body)?;
                    Ok(Code::LetCons {
                        cons: constructors
                            .into_iter()
                            .map(|b| {
                                let value = match b.value {
                                    Bound::Val(v) => v,
                                    _ => unreachable!("constructor bindings carry values"),
                                };
                                (b.name, value)
                            })
                            .collect(),
                        body: Box::new(body),
                    })
                }
            },

            Exp::From(from) => self.compile_from(env, from),
        }
    }

    fn compile_apply(&self, env: &Environment, apply: &core::Apply) -> Result<Code, Error> {
        // Lowered syntax that needs special evaluation shapes: the
        // short-circuit connectives and list construction.
        if let Exp::FnLiteral(f) = apply.func.as_ref() {
            if let Exp::Tuple(tuple) = apply.arg.as_ref() {
                match f.builtin {
                    BuiltIn::ZAndalso | BuiltIn::ZOrelse if tuple.args.len() == 2 => {
                        let lhs = Box::new(self.compile(env, &tuple.args[0])?);
                        let rhs = Box::new(self.compile(env, &tuple.args[1])?);
                        return Ok(if f.builtin == BuiltIn::ZAndalso {
                            Code::AndAlso(lhs, rhs)
                        } else {
                            Code::OrElse(lhs, rhs)
                        });
                    }
                    BuiltIn::ZList => {
                        let codes = tuple
                            .args
                            .iter()
                            .map(|a| self.compile(env, a))
                            .collect::<Result<Vec<_>, _>>()?;
                        return Ok(Code::MakeList(codes));
                    }
                    _ => {}
                }
            }
        }
        Ok(Code::Apply {
            func: Box::new(self.compile(env, &apply.func)?),
            arg: Box::new(self.compile(env, &apply.arg)?),
        })
    }

    fn compile_matches(
        &self,
        env: &Environment,
        matches: &[(Pat, Exp)],
    ) -> Result<Vec<(Pat, Code)>, Error> {
        matches
            .iter()
            .map(|(pat, exp)| {
                let mut env2 = env.clone();
                for (name, ty) in pat.bound_names() {
                    env2 = env2.bind(Binding::parameter(name, ty));
                }
                Ok((pat.clone(), self.compile(&env2, exp)?))
            })
            .collect()
    }

    fn compile_from(&self, env: &Environment, from: &core::From) -> Result<Code, Error> {
        let mut env2 = env.clone();
        let mut sources = Vec::new();
        for (pat, exp) in &from.sources {
            // Source expressions see the bindings of earlier sources.
            let code = self.compile(&env2, exp)?;
            for (name, ty) in pat.bound_names() {
                env2 = env2.bind(Binding::parameter(name, ty));
            }
            sources.push((pat.clone(), code));
        }
        let mut steps = Vec::new();
        for step in &from.steps {
            match step {
                FromStep::Where(exp) => steps.push(StepCode::Where(self.compile(&env2, exp)?)),
                FromStep::Group { keys, aggregates } => {
                    let mut keys_c = Vec::new();
                    for (name, exp) in keys {
                        keys_c.push((name.clone(), self.compile(&env2, exp)?));
                    }
                    let mut aggs_c = Vec::new();
                    for agg in aggregates {
                        aggs_c.push((
                            agg.name.clone(),
                            self.compile(&env2, &agg.func)?,
                            self.compile(&env2, &agg.argument)?,
                        ));
                    }
                    // Later steps see only the group's bindings.
                    env2 = env.clone();
                    for (name, exp) in keys {
                        env2 = env2.bind(Binding::parameter(name, exp.ty().clone()));
                    }
                    for agg in aggregates {
                        env2 = env2.bind(Binding::parameter(&agg.name, agg.ty.clone()));
                    }
                    steps.push(StepCode::Group {
                        keys: keys_c,
                        aggregates: aggs_c,
                    });
                }
                FromStep::Order(items) => {
                    let items_c = items
                        .iter()
                        .map(|(exp, dir)| Ok((self.compile(&env2, exp)?, *dir)))
                        .collect::<Result<Vec<_>, Error>>()?;
                    steps.push(StepCode::Order(items_c));
                }
            }
        }
        let yield_code = self.compile(&env2, &from.yield_exp)?;
        Ok(Code::From(Rc::new(FromCode {
            sources,
            steps,
            yield_code,
        })))
    }
}

/// Link forward-reference cells to the compiled right-hand side. An
/// identifier pattern links its own cell; a tuple pattern recurses into a
/// parallel tuple of codes.
fn link(links: &HashMap<String, LinkCode>, pat: &Pat, code: &Code) -> Result<(), Error> {
    match pat {
        Pat::Id(id) => {
            if let Some(cell) = links.get(&id.name) {
                cell.link(code.clone())?;
            }
            Ok(())
        }
        Pat::Tuple(tuple) => {
            if let Code::MakeTuple(codes) = code {
                if codes.len() == tuple.args.len() {
                    for (sub, sub_code) in tuple.args.iter().zip(codes) {
                        link(links, sub, sub_code)?;
                    }
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
