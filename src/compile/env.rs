//! Compile-time bindings and the persistent environment.
//!
//! A binding pairs a name with its type scheme and, when known, its
//! value. During compilation of a recursive declaration the value slot
//! holds the forward-reference code instead; pattern-bound names inside
//! function bodies have no value at all. The environment is a persistent
//! cons list: `bind` prepends, lookup walks newest-first, and iteration
//! follows insertion order with shadowed entries skipped.

use std::rc::Rc;

use crate::interpreter::builtins::BUILT_INS;
use crate::interpreter::{Code, EvalEnv, Value};
use crate::types::{Type, TypeEnv, TypeScheme, TypeVar};

/// What the compiler knows about a binding's value.
#[derive(Debug, Clone)]
pub enum Bound {
    /// Nothing yet: the name is bound by a pattern at run time.
    None,
    Val(Value),
    /// Compiled code standing in for the value; inlined at use sites.
    /// Carries the forward reference of a recursive binding.
    Code(Code),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub scheme: TypeScheme,
    pub value: Bound,
    /// Marks function parameters for the analyzer.
    pub parameter: bool,
}

impl Binding {
    pub fn of_value(name: impl Into<String>, ty: Type, value: Value) -> Self {
        Binding {
            name: name.into(),
            scheme: TypeScheme::monomorphic(ty),
            value: Bound::Val(value),
            parameter: false,
        }
    }

    pub fn of_scheme(name: impl Into<String>, scheme: TypeScheme, value: Value) -> Self {
        Binding {
            name: name.into(),
            scheme,
            value: Bound::Val(value),
            parameter: false,
        }
    }

    /// A name whose value arrives only at run time.
    pub fn parameter(name: impl Into<String>, ty: Type) -> Self {
        Binding {
            name: name.into(),
            scheme: TypeScheme::monomorphic(ty),
            value: Bound::None,
            parameter: true,
        }
    }

    pub fn of_code(name: impl Into<String>, ty: Type, code: Code) -> Self {
        Binding {
            name: name.into(),
            scheme: TypeScheme::monomorphic(ty),
            value: Bound::Code(code),
            parameter: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Environment(Option<Rc<EnvNode>>);

#[derive(Debug)]
struct EnvNode {
    binding: Binding,
    next: Environment,
}

impl Environment {
    pub fn empty() -> Self {
        Environment(None)
    }

    /// The initial environment: `true`, `false`, `nil` and the builtin
    /// registry.
    pub fn initial() -> Self {
        let a = TypeVar::new(0);
        let mut env = Environment::empty()
            .bind(Binding::of_value("true", crate::types::ty::BOOL, Value::Bool(true)))
            .bind(Binding::of_value(
                "false",
                crate::types::ty::BOOL,
                Value::Bool(false),
            ))
            .bind(Binding::of_scheme(
                "nil",
                TypeScheme::polymorphic(vec![a.clone()], Type::list(Type::Var(a))),
                Value::List(Vec::new()),
            ));
        for (name, builtin) in BUILT_INS.iter() {
            env = env.bind(Binding::of_scheme(
                *name,
                builtin.scheme(),
                Value::BuiltIn(*builtin),
            ));
        }
        env
    }

    pub fn bind(&self, binding: Binding) -> Environment {
        Environment(Some(Rc::new(EnvNode {
            binding,
            next: self.clone(),
        })))
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        let mut current = self;
        while let Some(node) = &current.0 {
            if node.binding.name == name {
                return Some(&node.binding);
            }
            current = &node.next;
        }
        None
    }

    /// All visible bindings, oldest first, shadowed entries skipped.
    pub fn bindings(&self) -> Vec<&Binding> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut current = self;
        while let Some(node) = &current.0 {
            if seen.insert(node.binding.name.as_str()) {
                out.push(&node.binding);
            }
            current = &node.next;
        }
        out.reverse();
        out
    }

    /// The view the type inferencer sees.
    pub fn type_env(&self) -> TypeEnv {
        TypeEnv::with_bindings(
            self.bindings()
                .into_iter()
                .map(|b| (b.name.clone(), b.scheme.clone())),
        )
    }

    /// The view the evaluator sees: every binding with a known value.
    pub fn eval_env(&self) -> EvalEnv {
        let mut env = EvalEnv::empty();
        for binding in self.bindings() {
            if let Bound::Val(value) = &binding.value {
                env = env.bind(binding.name.clone(), value.clone());
            }
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ty::INT;

    #[test]
    fn test_bind_shadow_and_iterate() {
        let env = Environment::empty()
            .bind(Binding::of_value("x", INT, Value::Int(1)))
            .bind(Binding::of_value("y", INT, Value::Int(2)))
            .bind(Binding::of_value("x", INT, Value::Int(3)));
        assert!(matches!(
            env.lookup("x"),
            Some(Binding {
                value: Bound::Val(Value::Int(3)),
                ..
            })
        ));
        let names: Vec<&str> = env.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn test_initial_environment_has_builtins() {
        let env = Environment::initial();
        assert!(env.lookup("true").is_some());
        assert!(env.lookup("nil").is_some());
        assert!(env.lookup("List.map").is_some());
        assert!(env.lookup("count").is_some());
    }

    #[test]
    fn test_eval_env_skips_valueless_bindings() {
        let env = Environment::empty()
            .bind(Binding::of_value("x", INT, Value::Int(1)))
            .bind(Binding::parameter("p", INT));
        let eval_env = env.eval_env();
        assert_eq!(eval_env.lookup("x"), Some(&Value::Int(1)));
        assert_eq!(eval_env.lookup("p"), None);
    }
}
