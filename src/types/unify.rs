//! # Structural Unification
//!
//! This module implements unification, the engine that discharges the
//! structural constraints type inference discovers.
//!
//! ## Overview
//!
//! Unifying two types either produces a substitution that makes them
//! equal, or fails:
//!
//! ```text
//! unify(int, int)          = {}                  // Already equal
//! unify('a, int)           = {'a := int}         // Variable learns its type
//! unify('a -> 'b, int -> string)
//!                          = {'a := int, 'b := string}
//! unify(int, string)       = Mismatch            // Cannot be made equal
//! unify('a, 'a list)       = OccursCheck         // Would be infinite
//! ```
//!
//! ## Occurs Check
//!
//! Binding a variable to a type containing that same variable would
//! create an infinite type such as `'a = 'a list`; the occurs check
//! rejects it before the binding is made.
//!
//! ## Records
//!
//! Two full records unify only when their label sets agree exactly. A
//! partial record (from an ellipsis pattern such as `{a = x, ...}`)
//! unifies with any record carrying at least its fields; only the common
//! fields constrain anything:
//!
//! ```text
//! unify({a:'x, ...}, {a:int, b:bool}) = {'x := int}
//! unify({a:int}, {a:int, b:bool})     = Mismatch    // Full vs wider full
//! unify({z:int, ...}, {a:int})        = Mismatch    // Missing field z
//! ```
//!
//! ## Related Modules
//!
//! - [`crate::types::ty`] - The type universe being unified
//! - [`crate::types::subst`] - Substitutions produced here
//! - [`crate::types::infer`] - The inference driver calling `unify`

use std::fmt;

use super::subst::Substitution;
use super::ty::{Type, TypeVar};

/// Unification failure.
///
/// # Variants
///
/// * `Mismatch` - Two types that should be equal cannot be made equal
/// * `OccursCheck` - A variable would have to contain itself
///
/// # Example Error Messages
///
/// ```text
/// type mismatch: expected int, found string
/// occurs check: cannot construct infinite type 't0 = 't0 list
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    Mismatch { expected: Type, found: Type },
    OccursCheck { var: TypeVar, ty: Type },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnifyError::Mismatch { expected, found } => {
                write!(
                    f,
                    "type mismatch: expected {}, found {}",
                    expected.description(),
                    found.description()
                )
            }
            UnifyError::OccursCheck { var, ty } => {
                write!(
                    f,
                    "occurs check: cannot construct infinite type {} = {}",
                    Type::Var(var.clone()).description(),
                    ty.description()
                )
            }
        }
    }
}

/// Whether a variable occurs anywhere inside a type.
///
/// # Examples
///
/// ```text
/// occurs_in('a, 'a)           // true
/// occurs_in('a, 'b)           // false
/// occurs_in('a, int)          // false
/// occurs_in('a, int -> 'a)    // true (nested)
/// occurs_in('a, {x:'a} list)  // true (deeply nested)
/// ```
fn occurs_in(var: &TypeVar, ty: &Type) -> bool {
    match ty {
        Type::Primitive(_) | Type::Temporary(_) => false,
        Type::Var(v) => v == var,
        Type::Fn(t1, t2) => occurs_in(var, t1) || occurs_in(var, t2),
        Type::Tuple(ts) => ts.iter().any(|t| occurs_in(var, t)),
        Type::Record { fields, .. } => fields.values().any(|t| occurs_in(var, t)),
        Type::List(t) => occurs_in(var, t),
        Type::Named(args, _) => args.iter().any(|t| occurs_in(var, t)),
    }
}

/// Unify a sequence of type pairs, threading the substitution through.
///
/// Each pair is unified under whatever the earlier pairs learned, which
/// is what makes `('a -> 'a) ~ (int -> 'b)` bind both `'a` and `'b`.
fn unify_all<'a>(
    pairs: impl Iterator<Item = (&'a Type, &'a Type)>,
) -> Result<Substitution, UnifyError> {
    let mut subst = Substitution::empty();
    for (t1, t2) in pairs {
        let s = unify(&subst.apply(t1), &subst.apply(t2))?;
        subst = s.compose(&subst);
    }
    Ok(subst)
}

/// Unify two types, producing the substitution that makes them equal.
///
/// # Arguments
///
/// * `t1` - The expected type
/// * `t2` - The found type
///
/// # Returns
///
/// The most general substitution under which `t1` and `t2` agree, or a
/// `UnifyError` when no such substitution exists
///
/// # Algorithm
///
/// ```text
/// unify(t1, t2):
///   equal primitives             -> {}
///   same variable twice          -> {}
///   variable v against t         -> {v := t}, unless v occurs in t
///   Fn / List / Tuple / Named    -> unify components pairwise, threading
///   full record vs full record   -> same labels, unify fields pairwise
///   partial record vs record     -> partial's fields must all be present
///   anything else                -> Mismatch
/// ```
pub fn unify(t1: &Type, t2: &Type) -> Result<Substitution, UnifyError> {
    match (t1, t2) {
        (Type::Primitive(p1), Type::Primitive(p2)) if p1 == p2 => Ok(Substitution::empty()),

        (Type::Var(v1), Type::Var(v2)) if v1 == v2 => Ok(Substitution::empty()),
        (Type::Var(v), t) | (t, Type::Var(v)) => {
            if occurs_in(v, t) {
                Err(UnifyError::OccursCheck {
                    var: v.clone(),
                    ty: t.clone(),
                })
            } else {
                Ok(Substitution::singleton(v.clone(), t.clone()))
            }
        }

        (Type::Fn(p1, r1), Type::Fn(p2, r2)) => {
            unify_all([(&**p1, &**p2), (&**r1, &**r2)].into_iter())
        }

        (Type::List(e1), Type::List(e2)) => unify(e1, e2),

        (Type::Tuple(ts1), Type::Tuple(ts2)) if ts1.len() == ts2.len() => {
            unify_all(ts1.iter().zip(ts2.iter()))
        }

        (
            Type::Record {
                partial: false,
                fields: f1,
            },
            Type::Record {
                partial: false,
                fields: f2,
            },
        ) => {
            if f1.len() != f2.len() || f1.keys().zip(f2.keys()).any(|(a, b)| a != b) {
                return Err(mismatch(t1, t2));
            }
            unify_all(f1.values().zip(f2.values()))
        }

        // A partial record unifies with any record that has at least its
        // fields; only the common fields constrain anything.
        (
            Type::Record {
                partial: true,
                fields: partial,
            },
            Type::Record { fields: full, .. },
        )
        | (
            Type::Record {
                partial: false,
                fields: full,
            },
            Type::Record {
                partial: true,
                fields: partial,
            },
        ) => {
            let mut pairs = Vec::new();
            for (label, t) in partial {
                match full.get(label) {
                    Some(u) => pairs.push((t, u)),
                    None => return Err(mismatch(t1, t2)),
                }
            }
            unify_all(pairs.into_iter())
        }

        (Type::Named(a1, n1), Type::Named(a2, n2)) if n1 == n2 && a1.len() == a2.len() => {
            unify_all(a1.iter().zip(a2.iter()))
        }

        (Type::Temporary(n1), Type::Temporary(n2)) if n1 == n2 => Ok(Substitution::empty()),
        // While a datatype is being declared its instances may appear both
        // as the placeholder and as the finished type.
        (Type::Temporary(n1), Type::Named(_, n2)) | (Type::Named(_, n1), Type::Temporary(n2))
            if n1 == n2 =>
        {
            Ok(Substitution::empty())
        }

        _ => Err(mismatch(t1, t2)),
    }
}

fn mismatch(expected: &Type, found: &Type) -> UnifyError {
    UnifyError::Mismatch {
        expected: expected.clone(),
        found: found.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ty::{Label, BOOL, INT, STRING};

    #[test]
    fn test_unify_identical_primitives() {
        assert_eq!(unify(&INT, &INT), Ok(Substitution::empty()));
        assert_eq!(unify(&STRING, &STRING), Ok(Substitution::empty()));
    }

    #[test]
    fn test_unify_var_with_concrete() {
        let v = TypeVar::new(0);
        assert_eq!(
            unify(&Type::Var(v.clone()), &INT),
            Ok(Substitution::singleton(v, INT))
        );
    }

    #[test]
    fn test_unify_occurs_check() {
        let v = TypeVar::new(0);
        let ty = Type::list(Type::Var(v.clone()));
        assert!(matches!(
            unify(&Type::Var(v), &ty),
            Err(UnifyError::OccursCheck { .. })
        ));
    }

    #[test]
    fn test_unify_fn_threads_substitution() {
        let a = TypeVar::new(0);
        let b = TypeVar::new(1);
        let t1 = Type::fn_of(Type::Var(a.clone()), Type::Var(b.clone()));
        let t2 = Type::fn_of(INT, STRING);
        let s = unify(&t1, &t2).unwrap();
        assert_eq!(s.apply(&Type::Var(a)), INT);
        assert_eq!(s.apply(&Type::Var(b)), STRING);
    }

    #[test]
    fn test_unify_tuple_arity_mismatch() {
        let t1 = Type::Tuple(vec![INT, INT]);
        let t2 = Type::Tuple(vec![INT, INT, INT]);
        assert!(unify(&t1, &t2).is_err());
    }

    #[test]
    fn test_unify_records_same_labels() {
        let t1 = Type::record(vec![
            (Label::new("a"), Type::Var(TypeVar::new(0))),
            (Label::new("b"), BOOL),
        ]);
        let t2 = Type::record(vec![(Label::new("a"), INT), (Label::new("b"), BOOL)]);
        let s = unify(&t1, &t2).unwrap();
        assert_eq!(s.apply(&Type::Var(TypeVar::new(0))), INT);
    }

    #[test]
    fn test_unify_records_different_labels() {
        let t1 = Type::record(vec![(Label::new("a"), INT)]);
        let t2 = Type::record(vec![(Label::new("b"), INT)]);
        assert!(unify(&t1, &t2).is_err());
    }

    #[test]
    fn test_unify_partial_record_with_superset() {
        let v = TypeVar::new(0);
        let partial = Type::Record {
            partial: true,
            fields: [(Label::new("a"), Type::Var(v.clone()))].into_iter().collect(),
        };
        let full = Type::record(vec![
            (Label::new("a"), INT),
            (Label::new("b"), BOOL),
            (Label::new("c"), STRING),
        ]);
        let s = unify(&partial, &full).unwrap();
        assert_eq!(s.apply(&Type::Var(v)), INT);
    }

    #[test]
    fn test_unify_partial_record_missing_field() {
        let partial = Type::Record {
            partial: true,
            fields: [(Label::new("z"), INT)].into_iter().collect(),
        };
        let full = Type::record(vec![(Label::new("a"), INT)]);
        assert!(unify(&partial, &full).is_err());
    }

    #[test]
    fn test_unify_named_types() {
        let t1 = Type::Named(vec![Type::Var(TypeVar::new(0))], "option".to_string());
        let t2 = Type::Named(vec![INT], "option".to_string());
        let s = unify(&t1, &t2).unwrap();
        assert_eq!(s.apply(&Type::Var(TypeVar::new(0))), INT);

        let t3 = Type::Named(vec![INT], "tree".to_string());
        assert!(unify(&t1, &t3).is_err());
    }
}
