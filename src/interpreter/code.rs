//! The executable representation and its evaluator.
//!
//! The compiler turns core expressions into a tree of `Code` nodes; each
//! node evaluates against an `EvalEnv` and returns a `Value`. Evaluation
//! is synchronous and runs every node to completion before its parent
//! returns.
//!
//! `Link` is the forward reference that makes recursive bindings
//! compilable: the cell is created before the recursive right-hand side is
//! compiled, installed into the compile-time environment, and written
//! exactly once when compilation of the binding finishes.

use std::cell::OnceCell;
use std::rc::Rc;

use log::trace;

use crate::ast::expression::Lit;
use crate::core::{Pat, CONS_NAME};
use crate::error::{CompileError, Error};

use super::env::EvalEnv;
use super::query::{self, FromCode};
use super::value::{Closure, Value};

#[derive(Debug, Clone)]
pub enum Code {
    Constant(Value),
    /// Lexical lookup at evaluation time.
    Get(String),
    MakeTuple(Vec<Code>),
    MakeRecord {
        labels: Rc<Vec<String>>,
        codes: Vec<Code>,
    },
    MakeList(Vec<Code>),
    Apply {
        func: Box<Code>,
        arg: Box<Code>,
    },
    AndAlso(Box<Code>, Box<Code>),
    OrElse(Box<Code>, Box<Code>),
    /// A match closure: captures the environment at evaluation time.
    Closure(Rc<Vec<(Pat, Code)>>),
    Let {
        pat: Box<Pat>,
        rhs: Box<Code>,
        body: Box<Code>,
    },
    /// Local datatype: brings constructor values into scope for the body.
    LetCons {
        cons: Vec<(String, Value)>,
        body: Box<Code>,
    },
    From(Rc<FromCode>),
    Link(LinkCode),
}

/// One-shot forward reference used while compiling `val rec`.
#[derive(Clone, Default)]
pub struct LinkCode {
    cell: Rc<OnceCell<Code>>,
}

// The cell closes a cycle once linked (the definition reaches back to the
// reference), so its Debug stays shallow.
impl std::fmt::Debug for LinkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("LinkCode")
            .field("linked", &self.is_linked())
            .finish()
    }
}

impl LinkCode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_linked(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Install the compiled definition. Written exactly once.
    pub fn link(&self, code: Code) -> Result<(), CompileError> {
        self.cell
            .set(code)
            .map_err(|_| CompileError::Invariant("forward reference linked twice".into()))
    }

    fn eval(&self, env: &EvalEnv) -> Result<Value, Error> {
        match self.cell.get() {
            Some(code) => code.eval(env),
            None => Err(Error::Compile(CompileError::UnlinkedForwardRef)),
        }
    }
}

impl Code {
    pub fn eval(&self, env: &EvalEnv) -> Result<Value, Error> {
        match self {
            Code::Constant(v) => Ok(v.clone()),

            Code::Get(name) => env.lookup(name).cloned().ok_or_else(|| {
                Error::Compile(CompileError::Invariant(format!(
                    "unbound name at evaluation time: {}",
                    name
                )))
            }),

            Code::MakeTuple(codes) => Ok(Value::Tuple(eval_all(codes, env)?)),

            Code::MakeRecord { labels, codes } => Ok(Value::Record {
                labels: Rc::clone(labels),
                values: eval_all(codes, env)?,
            }),

            Code::MakeList(codes) => Ok(Value::List(eval_all(codes, env)?)),

            Code::Apply { func, arg } => {
                let func = func.eval(env)?;
                let arg = arg.eval(env)?;
                apply_value(&func, arg)
            }

            Code::AndAlso(lhs, rhs) => match lhs.eval(env)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                Value::Bool(true) => rhs.eval(env),
                other => Err(bad_value("andalso", &other)),
            },

            Code::OrElse(lhs, rhs) => match lhs.eval(env)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                Value::Bool(false) => rhs.eval(env),
                other => Err(bad_value("orelse", &other)),
            },

            Code::Closure(clauses) => Ok(Value::Closure(Rc::new(Closure {
                env: env.clone(),
                clauses: Rc::clone(clauses),
            }))),

            Code::Let { pat, rhs, body } => {
                let value = rhs.eval(env)?;
                match bind_pat(env, pat, &value) {
                    Some(extended) => body.eval(&extended),
                    None => Err(Error::MatchFailure),
                }
            }

            Code::LetCons { cons, body } => {
                let mut extended = env.clone();
                for (name, value) in cons {
                    extended = extended.bind(name.clone(), value.clone());
                }
                body.eval(&extended)
            }

            Code::From(from) => query::eval_from(from, env),

            Code::Link(link) => link.eval(env),
        }
    }
}

fn eval_all(codes: &[Code], env: &EvalEnv) -> Result<Vec<Value>, Error> {
    codes.iter().map(|c| c.eval(env)).collect()
}

/// Apply a function value to an argument.
pub fn apply_value(func: &Value, arg: Value) -> Result<Value, Error> {
    match func {
        Value::Closure(closure) => {
            trace!("applying closure with {} clauses", closure.clauses.len());
            for (pat, body) in closure.clauses.iter() {
                if let Some(extended) = bind_pat(&closure.env, pat, &arg) {
                    return body.eval(&extended);
                }
            }
            Err(Error::MatchFailure)
        }
        Value::BuiltIn(builtin) => builtin.apply(arg),
        Value::Partial(builtin, first) => builtin.apply2(first, arg),
        Value::ConFn(name) => Ok(Value::Con(name.clone(), Some(Box::new(arg)))),
        Value::Selector(slot) => match arg {
            Value::Tuple(values) | Value::Record { values, .. } => values
                .into_iter()
                .nth(*slot)
                .ok_or_else(|| bad_value("selector", &Value::Unit)),
            other => Err(bad_value("selector", &other)),
        },
        other => Err(bad_value("application of non-function", other)),
    }
}

/// Attempt to bind a pattern against a value, extending the environment.
/// Bindings from earlier sub-patterns are visible to later ones.
pub fn bind_pat(env: &EvalEnv, pat: &Pat, value: &Value) -> Option<EvalEnv> {
    match pat {
        Pat::Wildcard(_) => Some(env.clone()),

        Pat::Id(id) => Some(env.bind(id.name.clone(), value.clone())),

        Pat::Literal(lit) => lit_matches(&lit.value, value).then(|| env.clone()),

        Pat::Con0(con) => match value {
            Value::Con(name, None) if *name == con.name => Some(env.clone()),
            _ => None,
        },

        Pat::Con(con) if con.name == CONS_NAME => match value {
            // Cons is a constructor pattern over a (head, tail) pair.
            Value::List(list) if !list.is_empty() => {
                let (head, tail) = list.split_first().expect("list is non-empty");
                match con.arg.as_ref() {
                    Pat::Tuple(pair) if pair.args.len() == 2 => {
                        let env = bind_pat(env, &pair.args[0], head)?;
                        bind_pat(&env, &pair.args[1], &Value::List(tail.to_vec()))
                    }
                    _ => None,
                }
            }
            _ => None,
        },

        Pat::Con(con) => match value {
            Value::Con(name, Some(arg)) if *name == con.name => bind_pat(env, &con.arg, arg),
            _ => None,
        },

        Pat::Tuple(tuple) => match value {
            Value::Tuple(values) if values.len() == tuple.args.len() => {
                let mut env = env.clone();
                for (sub, v) in tuple.args.iter().zip(values.iter()) {
                    env = bind_pat(&env, sub, v)?;
                }
                Some(env)
            }
            _ => None,
        },

        Pat::Record(record) => match value {
            // Fields are found by label: the value may carry a superset of
            // the pattern's labels.
            Value::Record { labels, values } => {
                let mut env = env.clone();
                for (label, sub) in &record.fields {
                    let slot = labels.iter().position(|l| l == label)?;
                    env = bind_pat(&env, sub, &values[slot])?;
                }
                Some(env)
            }
            Value::Tuple(values) => {
                let mut env = env.clone();
                for (label, sub) in &record.fields {
                    let index: usize = label.parse().ok()?;
                    env = bind_pat(&env, sub, values.get(index.checked_sub(1)?)?)?;
                }
                Some(env)
            }
            _ => None,
        },

        Pat::List(list) => match value {
            Value::List(values) if values.len() == list.args.len() => {
                let mut env = env.clone();
                for (sub, v) in list.args.iter().zip(values.iter()) {
                    env = bind_pat(&env, sub, v)?;
                }
                Some(env)
            }
            _ => None,
        },
    }
}

fn lit_matches(lit: &Lit, value: &Value) -> bool {
    match (lit, value) {
        (Lit::Unit, Value::Unit) => true,
        (Lit::Bool(a), Value::Bool(b)) => a == b,
        (Lit::Char(a), Value::Char(b)) => a == b,
        (Lit::Int(a), Value::Int(b)) => a == b,
        (Lit::Real(a), Value::Real(b)) => a == b,
        (Lit::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

/// The runtime value of a literal.
pub fn lit_value(lit: &Lit) -> Value {
    match lit {
        Lit::Unit => Value::Unit,
        Lit::Bool(b) => Value::Bool(*b),
        Lit::Char(c) => Value::Char(*c),
        Lit::Int(i) => Value::Int(*i),
        Lit::Real(r) => Value::Real(*r),
        Lit::String(s) => Value::String(s.clone()),
    }
}

fn bad_value(context: &str, value: &Value) -> Error {
    Error::Compile(CompileError::Invariant(format!(
        "{}: unexpected value {:?}",
        context, value
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Con0Pat, ConPat, IdPat, ListPat, LitPat, TuplePat, WildcardPat};
    use crate::types::ty::{Type, INT, UNIT};

    fn id_pat(name: &str) -> Pat {
        Pat::Id(IdPat {
            name: name.to_string(),
            ty: INT,
        })
    }

    #[test]
    fn test_constant_eval() {
        let env = EvalEnv::empty();
        assert_eq!(
            Code::Constant(Value::Int(7)).eval(&env).unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn test_get_from_env() {
        let env = EvalEnv::empty().bind("x", Value::Int(3));
        assert_eq!(Code::Get("x".into()).eval(&env).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_let_binds_pattern() {
        let env = EvalEnv::empty();
        let code = Code::Let {
            pat: Box::new(id_pat("x")),
            rhs: Box::new(Code::Constant(Value::Int(5))),
            body: Box::new(Code::Get("x".into())),
        };
        assert_eq!(code.eval(&env).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_closure_application_first_matching_clause() {
        let env = EvalEnv::empty();
        let clauses = Rc::new(vec![
            (
                Pat::Literal(LitPat {
                    value: Lit::Int(0),
                    ty: INT,
                }),
                Code::Constant(Value::Int(100)),
            ),
            (id_pat("n"), Code::Get("n".into())),
        ]);
        let f = Code::Closure(clauses).eval(&env).unwrap();
        assert_eq!(apply_value(&f, Value::Int(0)).unwrap(), Value::Int(100));
        assert_eq!(apply_value(&f, Value::Int(9)).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_match_failure_when_no_clause_accepts() {
        let env = EvalEnv::empty();
        let clauses = Rc::new(vec![(
            Pat::Literal(LitPat {
                value: Lit::Int(0),
                ty: INT,
            }),
            Code::Constant(Value::Int(1)),
        )]);
        let f = Code::Closure(clauses).eval(&env).unwrap();
        assert!(matches!(
            apply_value(&f, Value::Int(2)),
            Err(Error::MatchFailure)
        ));
    }

    #[test]
    fn test_unlinked_forward_reference_errors() {
        let env = EvalEnv::empty();
        let link = LinkCode::new();
        assert!(matches!(
            Code::Link(link.clone()).eval(&env),
            Err(Error::Compile(CompileError::UnlinkedForwardRef))
        ));
        link.link(Code::Constant(Value::Int(1))).unwrap();
        assert_eq!(Code::Link(link).eval(&env).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_link_writes_once() {
        let link = LinkCode::new();
        link.link(Code::Constant(Value::Int(1))).unwrap();
        assert!(link.link(Code::Constant(Value::Int(2))).is_err());
    }

    #[test]
    fn test_cons_pattern_binding() {
        let env = EvalEnv::empty();
        let pat = Pat::Con(ConPat {
            name: CONS_NAME.to_string(),
            arg: Box::new(Pat::Tuple(TuplePat {
                args: vec![id_pat("x"), id_pat("xs")],
                ty: Type::Tuple(vec![INT, Type::list(INT)]),
            })),
            ty: Type::list(INT),
        });
        let value = Value::List(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
        let bound = bind_pat(&env, &pat, &value).unwrap();
        assert_eq!(bound.lookup("x"), Some(&Value::Int(10)));
        assert_eq!(
            bound.lookup("xs"),
            Some(&Value::List(vec![Value::Int(20), Value::Int(30)]))
        );
        // The empty list does not match a cons pattern.
        assert!(bind_pat(&env, &pat, &Value::List(vec![])).is_none());
    }

    #[test]
    fn test_list_pattern_requires_exact_length() {
        let env = EvalEnv::empty();
        let pat = Pat::List(ListPat {
            args: vec![id_pat("a"), id_pat("b")],
            ty: Type::list(INT),
        });
        assert!(bind_pat(&env, &pat, &Value::List(vec![Value::Int(1), Value::Int(2)])).is_some());
        assert!(bind_pat(&env, &pat, &Value::List(vec![Value::Int(1)])).is_none());
    }

    #[test]
    fn test_record_pattern_matches_superset_by_label() {
        let env = EvalEnv::empty();
        let pat = Pat::Record(crate::core::RecordPat {
            fields: vec![("a".to_string(), id_pat("a"))],
            ty: Type::Record {
                partial: true,
                fields: [(crate::types::Label::new("a"), INT)].into_iter().collect(),
            },
        });
        let value = Value::Record {
            labels: Rc::new(vec!["a".into(), "b".into(), "c".into()]),
            values: vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        };
        let bound = bind_pat(&env, &pat, &value).unwrap();
        assert_eq!(bound.lookup("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_constructor_patterns() {
        let env = EvalEnv::empty();
        let ty = Type::Named(vec![INT], "option".to_string());
        let none_pat = Pat::Con0(Con0Pat {
            name: "NONE".to_string(),
            ty: ty.clone(),
        });
        let some_pat = Pat::Con(ConPat {
            name: "SOME".to_string(),
            arg: Box::new(id_pat("v")),
            ty,
        });
        let none = Value::Con("NONE".to_string(), None);
        let some = Value::Con("SOME".to_string(), Some(Box::new(Value::Int(8))));
        assert!(bind_pat(&env, &none_pat, &none).is_some());
        assert!(bind_pat(&env, &none_pat, &some).is_none());
        let bound = bind_pat(&env, &some_pat, &some).unwrap();
        assert_eq!(bound.lookup("v"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_wildcard_binds_nothing() {
        let env = EvalEnv::empty();
        let pat = Pat::Wildcard(WildcardPat { ty: UNIT });
        assert!(bind_pat(&env, &pat, &Value::Int(1)).is_some());
    }
}
