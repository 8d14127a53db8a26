//! The fixed registry of built-in functions.
//!
//! One table serves every stage: inference reads the type schemes when the
//! initial environment is built, the resolver names operator builtins in
//! lowered function literals, and the evaluator dispatches on the tag.
//! The `Op*` and `Z*` entries back infix operators and lowered syntax and
//! are not addressable by name; the rest are ordinary bindings such as
//! `not`, `count` and `List.map`.

use once_cell::sync::Lazy;

use crate::error::{CompileError, Error, RuntimeError};
use crate::types::ty::{Type, TypeScheme, TypeVar, BOOL, CHAR, INT, REAL, STRING};

use super::code::apply_value;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    OpPlus,
    OpMinus,
    OpTimes,
    OpDivide,
    OpDiv,
    OpMod,
    OpCaret,
    OpCons,
    OpEq,
    OpNe,
    OpLt,
    OpGt,
    OpLe,
    OpGe,
    ZAndalso,
    ZOrelse,
    /// List construction, the target of lowered list literals.
    ZList,
    Not,
    Abs,
    Count,
    Sum,
    Min,
    Max,
    ListMap,
    ListFilter,
    ListLength,
    ListRev,
    ListHd,
    ListTl,
    ListNull,
    StringSize,
    StringSub,
}

/// Name-addressable builtins for the initial environment.
pub static BUILT_INS: Lazy<Vec<(&'static str, BuiltIn)>> = Lazy::new(|| {
    vec![
        ("not", BuiltIn::Not),
        ("abs", BuiltIn::Abs),
        ("count", BuiltIn::Count),
        ("sum", BuiltIn::Sum),
        ("min", BuiltIn::Min),
        ("max", BuiltIn::Max),
        ("List.map", BuiltIn::ListMap),
        ("List.filter", BuiltIn::ListFilter),
        ("List.length", BuiltIn::ListLength),
        ("List.rev", BuiltIn::ListRev),
        ("List.hd", BuiltIn::ListHd),
        ("List.tl", BuiltIn::ListTl),
        ("List.null", BuiltIn::ListNull),
        ("String.size", BuiltIn::StringSize),
        ("String.sub", BuiltIn::StringSub),
    ]
});

impl BuiltIn {
    pub fn ml_name(self) -> &'static str {
        match self {
            BuiltIn::OpPlus => "+",
            BuiltIn::OpMinus => "-",
            BuiltIn::OpTimes => "*",
            BuiltIn::OpDivide => "/",
            BuiltIn::OpDiv => "div",
            BuiltIn::OpMod => "mod",
            BuiltIn::OpCaret => "^",
            BuiltIn::OpCons => "::",
            BuiltIn::OpEq => "=",
            BuiltIn::OpNe => "<>",
            BuiltIn::OpLt => "<",
            BuiltIn::OpGt => ">",
            BuiltIn::OpLe => "<=",
            BuiltIn::OpGe => ">=",
            BuiltIn::ZAndalso => "andalso",
            BuiltIn::ZOrelse => "orelse",
            BuiltIn::ZList => "$list",
            BuiltIn::Not => "not",
            BuiltIn::Abs => "abs",
            BuiltIn::Count => "count",
            BuiltIn::Sum => "sum",
            BuiltIn::Min => "min",
            BuiltIn::Max => "max",
            BuiltIn::ListMap => "List.map",
            BuiltIn::ListFilter => "List.filter",
            BuiltIn::ListLength => "List.length",
            BuiltIn::ListRev => "List.rev",
            BuiltIn::ListHd => "List.hd",
            BuiltIn::ListTl => "List.tl",
            BuiltIn::ListNull => "List.null",
            BuiltIn::StringSize => "String.size",
            BuiltIn::StringSub => "String.sub",
        }
    }

    /// The type scheme the inferencer sees. Overloaded arithmetic is
    /// resolved structurally during inference, so the schemes here cover
    /// only the name-addressable entries and the `int` instances of the
    /// operators.
    pub fn scheme(self) -> TypeScheme {
        let a = TypeVar::new(0);
        let b = TypeVar::new(1);
        let var = |v: &TypeVar| Type::Var(v.clone());
        match self {
            BuiltIn::OpPlus
            | BuiltIn::OpMinus
            | BuiltIn::OpTimes
            | BuiltIn::OpDiv
            | BuiltIn::OpMod => TypeScheme::monomorphic(Type::fn_of(
                Type::Tuple(vec![INT, INT]),
                INT,
            )),
            BuiltIn::OpDivide => TypeScheme::monomorphic(Type::fn_of(
                Type::Tuple(vec![REAL, REAL]),
                REAL,
            )),
            BuiltIn::OpCaret => TypeScheme::monomorphic(Type::fn_of(
                Type::Tuple(vec![STRING, STRING]),
                STRING,
            )),
            BuiltIn::OpCons => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(
                    Type::Tuple(vec![var(&a), Type::list(var(&a))]),
                    Type::list(var(&a)),
                ),
            ),
            BuiltIn::OpEq | BuiltIn::OpNe => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::Tuple(vec![var(&a), var(&a)]), BOOL),
            ),
            BuiltIn::OpLt | BuiltIn::OpGt | BuiltIn::OpLe | BuiltIn::OpGe => {
                TypeScheme::monomorphic(Type::fn_of(Type::Tuple(vec![INT, INT]), BOOL))
            }
            BuiltIn::ZAndalso | BuiltIn::ZOrelse => {
                TypeScheme::monomorphic(Type::fn_of(Type::Tuple(vec![BOOL, BOOL]), BOOL))
            }
            BuiltIn::ZList => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(var(&a), Type::list(var(&a))),
            ),
            BuiltIn::Not => TypeScheme::monomorphic(Type::fn_of(BOOL, BOOL)),
            BuiltIn::Abs => TypeScheme::monomorphic(Type::fn_of(INT, INT)),
            BuiltIn::Count => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::list(var(&a)), INT),
            ),
            BuiltIn::Sum => {
                TypeScheme::monomorphic(Type::fn_of(Type::list(INT), INT))
            }
            BuiltIn::Min | BuiltIn::Max => {
                TypeScheme::monomorphic(Type::fn_of(Type::list(INT), INT))
            }
            BuiltIn::ListMap => TypeScheme::polymorphic(
                vec![a.clone(), b.clone()],
                Type::fn_of(
                    Type::fn_of(var(&a), var(&b)),
                    Type::fn_of(Type::list(var(&a)), Type::list(var(&b))),
                ),
            ),
            BuiltIn::ListFilter => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(
                    Type::fn_of(var(&a), BOOL),
                    Type::fn_of(Type::list(var(&a)), Type::list(var(&a))),
                ),
            ),
            BuiltIn::ListLength => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::list(var(&a)), INT),
            ),
            BuiltIn::ListRev => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::list(var(&a)), Type::list(var(&a))),
            ),
            BuiltIn::ListHd => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::list(var(&a)), var(&a)),
            ),
            BuiltIn::ListTl => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::list(var(&a)), Type::list(var(&a))),
            ),
            BuiltIn::ListNull => TypeScheme::polymorphic(
                vec![a.clone()],
                Type::fn_of(Type::list(var(&a)), BOOL),
            ),
            BuiltIn::StringSize => TypeScheme::monomorphic(Type::fn_of(STRING, INT)),
            BuiltIn::StringSub => TypeScheme::monomorphic(Type::fn_of(
                Type::Tuple(vec![STRING, INT]),
                CHAR,
            )),
        }
    }

    /// Apply to a single argument. Curried builtins return a partial
    /// application; operator builtins expect a pair.
    pub fn apply(self, arg: Value) -> Result<Value, Error> {
        match self {
            BuiltIn::OpPlus => int_or_real(arg, |a, b| a.checked_add(b), |a, b| a + b),
            BuiltIn::OpMinus => int_or_real(arg, |a, b| a.checked_sub(b), |a, b| a - b),
            BuiltIn::OpTimes => int_or_real(arg, |a, b| a.checked_mul(b), |a, b| a * b),
            BuiltIn::OpDivide => match pair(arg)? {
                (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a / b)),
                other => Err(shape("/", &other)),
            },
            BuiltIn::OpDiv => {
                let (a, b) = int_pair(arg)?;
                floor_div(a, b).map(Value::Int)
            }
            BuiltIn::OpMod => {
                let (a, b) = int_pair(arg)?;
                floor_mod(a, b).map(Value::Int)
            }
            BuiltIn::OpCaret => match pair(arg)? {
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                other => Err(shape("^", &other)),
            },
            BuiltIn::OpCons => match pair(arg)? {
                (head, Value::List(tail)) => {
                    let mut list = Vec::with_capacity(tail.len() + 1);
                    list.push(head);
                    list.extend(tail);
                    Ok(Value::List(list))
                }
                other => Err(shape("::", &other)),
            },
            BuiltIn::OpEq => {
                let (a, b) = pair(arg)?;
                Ok(Value::Bool(a == b))
            }
            BuiltIn::OpNe => {
                let (a, b) = pair(arg)?;
                Ok(Value::Bool(a != b))
            }
            BuiltIn::OpLt => compare(arg, |o| o.is_lt()),
            BuiltIn::OpGt => compare(arg, |o| o.is_gt()),
            BuiltIn::OpLe => compare(arg, |o| o.is_le()),
            BuiltIn::OpGe => compare(arg, |o| o.is_ge()),
            // Short-circuiting forms exist as dedicated codes; as values
            // these see both operands already evaluated.
            BuiltIn::ZAndalso => match pair(arg)? {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
                other => Err(shape("andalso", &other)),
            },
            BuiltIn::ZOrelse => match pair(arg)? {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
                other => Err(shape("orelse", &other)),
            },
            BuiltIn::ZList => match arg {
                Value::Tuple(values) => Ok(Value::List(values)),
                single => Ok(Value::List(vec![single])),
            },
            BuiltIn::Not => match arg {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(shape1("not", &other)),
            },
            // The scheme pins abs to int, so only int values reach here.
            BuiltIn::Abs => match arg {
                Value::Int(i) => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or(Error::Runtime(RuntimeError::Overflow)),
                other => Err(shape1("abs", &other)),
            },
            BuiltIn::Count => Ok(Value::Int(list_arg("count", arg)?.len() as i64)),
            BuiltIn::Sum => {
                let mut total: i64 = 0;
                for v in list_arg("sum", arg)? {
                    match v {
                        Value::Int(i) => {
                            total = total
                                .checked_add(i)
                                .ok_or(Error::Runtime(RuntimeError::Overflow))?
                        }
                        other => return Err(shape1("sum", &other)),
                    }
                }
                Ok(Value::Int(total))
            }
            BuiltIn::Min => extremum("min", arg, std::cmp::Ordering::Less),
            BuiltIn::Max => extremum("max", arg, std::cmp::Ordering::Greater),
            BuiltIn::ListMap | BuiltIn::ListFilter => {
                Ok(Value::Partial(self, Box::new(arg)))
            }
            BuiltIn::ListLength => {
                Ok(Value::Int(list_arg("List.length", arg)?.len() as i64))
            }
            BuiltIn::ListRev => {
                let mut list = list_arg("List.rev", arg)?;
                list.reverse();
                Ok(Value::List(list))
            }
            BuiltIn::ListHd => list_arg("List.hd", arg)?
                .into_iter()
                .next()
                .ok_or(Error::Runtime(RuntimeError::EmptyList)),
            BuiltIn::ListTl => {
                let list = list_arg("List.tl", arg)?;
                if list.is_empty() {
                    return Err(Error::Runtime(RuntimeError::EmptyList));
                }
                Ok(Value::List(list.into_iter().skip(1).collect()))
            }
            BuiltIn::ListNull => Ok(Value::Bool(list_arg("List.null", arg)?.is_empty())),
            BuiltIn::StringSize => match arg {
                Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
                other => Err(shape1("String.size", &other)),
            },
            BuiltIn::StringSub => match pair(arg)? {
                (Value::String(s), Value::Int(i)) => {
                    if i < 0 {
                        return Err(Error::Runtime(RuntimeError::Subscript));
                    }
                    s.chars()
                        .nth(i as usize)
                        .map(Value::Char)
                        .ok_or(Error::Runtime(RuntimeError::Subscript))
                }
                other => Err(shape("String.sub", &other)),
            },
        }
    }

    /// Second stage of a curried builtin.
    pub fn apply2(self, first: &Value, arg: Value) -> Result<Value, Error> {
        match self {
            BuiltIn::ListMap => {
                let list = list_arg("List.map", arg)?;
                let mut out = Vec::with_capacity(list.len());
                for v in list {
                    out.push(apply_value(first, v)?);
                }
                Ok(Value::List(out))
            }
            BuiltIn::ListFilter => {
                let list = list_arg("List.filter", arg)?;
                let mut out = Vec::new();
                for v in list {
                    match apply_value(first, v.clone())? {
                        Value::Bool(true) => out.push(v),
                        Value::Bool(false) => {}
                        other => return Err(shape1("List.filter", &other)),
                    }
                }
                Ok(Value::List(out))
            }
            _ => Err(Error::Compile(CompileError::Invariant(format!(
                "builtin {} is not curried",
                self.ml_name()
            )))),
        }
    }
}

fn pair(arg: Value) -> Result<(Value, Value), Error> {
    match arg {
        Value::Tuple(mut values) if values.len() == 2 => {
            let b = values.pop().expect("length checked");
            let a = values.pop().expect("length checked");
            Ok((a, b))
        }
        other => Err(shape1("operator", &other)),
    }
}

fn int_pair(arg: Value) -> Result<(i64, i64), Error> {
    match pair(arg)? {
        (Value::Int(a), Value::Int(b)) => Ok((a, b)),
        other => Err(shape("div", &other)),
    }
}

fn list_arg(name: &str, arg: Value) -> Result<Vec<Value>, Error> {
    match arg {
        Value::List(list) => Ok(list),
        other => Err(shape1(name, &other)),
    }
}

/// Runtime numeric dispatch shared by `+`, `-` and `*`.
fn int_or_real(
    arg: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    match pair(arg)? {
        (Value::Int(a), Value::Int(b)) => int_op(a, b)
            .map(Value::Int)
            .ok_or(Error::Runtime(RuntimeError::Overflow)),
        (Value::Real(a), Value::Real(b)) => Ok(Value::Real(real_op(a, b))),
        other => Err(shape("arithmetic operator", &other)),
    }
}

fn compare(arg: Value, accept: fn(std::cmp::Ordering) -> bool) -> Result<Value, Error> {
    let (a, b) = pair(arg)?;
    Ok(Value::Bool(accept(a.compare(&b))))
}

fn extremum(name: &str, arg: Value, keep: std::cmp::Ordering) -> Result<Value, Error> {
    let list = list_arg(name, arg)?;
    let mut iter = list.into_iter();
    let mut best = iter.next().ok_or(Error::Runtime(RuntimeError::EmptyList))?;
    for v in iter {
        if v.compare(&best) == keep {
            best = v;
        }
    }
    Ok(best)
}

/// SML `div` rounds toward negative infinity.
fn floor_div(a: i64, b: i64) -> Result<i64, Error> {
    if b == 0 {
        return Err(Error::Runtime(RuntimeError::DivisionByZero));
    }
    let q = a
        .checked_div(b)
        .ok_or(Error::Runtime(RuntimeError::Overflow))?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn floor_mod(a: i64, b: i64) -> Result<i64, Error> {
    let q = floor_div(a, b)?;
    Ok(a - q * b)
}

fn shape(name: &str, args: &(Value, Value)) -> Error {
    Error::Compile(CompileError::Invariant(format!(
        "{} applied to unexpected values {:?}",
        name, args
    )))
}

fn shape1(name: &str, arg: &Value) -> Error {
    Error::Compile(CompileError::Invariant(format!(
        "{} applied to unexpected value {:?}",
        name, arg
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_pair_value(a: i64, b: i64) -> Value {
        Value::Tuple(vec![Value::Int(a), Value::Int(b)])
    }

    #[test]
    fn test_plus_and_overflow() {
        assert_eq!(
            BuiltIn::OpPlus.apply(int_pair_value(2, 3)).unwrap(),
            Value::Int(5)
        );
        assert!(matches!(
            BuiltIn::OpPlus.apply(int_pair_value(i64::MAX, 1)),
            Err(Error::Runtime(RuntimeError::Overflow))
        ));
    }

    #[test]
    fn test_div_rounds_toward_negative_infinity() {
        assert_eq!(
            BuiltIn::OpDiv.apply(int_pair_value(7, 2)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            BuiltIn::OpDiv.apply(int_pair_value(-7, 2)).unwrap(),
            Value::Int(-4)
        );
        assert_eq!(
            BuiltIn::OpMod.apply(int_pair_value(-7, 2)).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_div_by_zero() {
        assert!(matches!(
            BuiltIn::OpDiv.apply(int_pair_value(1, 0)),
            Err(Error::Runtime(RuntimeError::DivisionByZero))
        ));
    }

    #[test]
    fn test_cons() {
        let arg = Value::Tuple(vec![
            Value::Int(1),
            Value::List(vec![Value::Int(2), Value::Int(3)]),
        ]);
        assert_eq!(
            BuiltIn::OpCons.apply(arg).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_hd_of_empty_list() {
        assert!(matches!(
            BuiltIn::ListHd.apply(Value::List(vec![])),
            Err(Error::Runtime(RuntimeError::EmptyList))
        ));
    }

    #[test]
    fn test_aggregates() {
        let list = Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(BuiltIn::Count.apply(list.clone()).unwrap(), Value::Int(3));
        assert_eq!(BuiltIn::Sum.apply(list.clone()).unwrap(), Value::Int(6));
        assert_eq!(BuiltIn::Min.apply(list.clone()).unwrap(), Value::Int(1));
        assert_eq!(BuiltIn::Max.apply(list).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_string_sub() {
        let arg = Value::Tuple(vec![Value::String("abc".into()), Value::Int(1)]);
        assert_eq!(BuiltIn::StringSub.apply(arg).unwrap(), Value::Char('b'));
        let out = Value::Tuple(vec![Value::String("abc".into()), Value::Int(9)]);
        assert!(matches!(
            BuiltIn::StringSub.apply(out),
            Err(Error::Runtime(RuntimeError::Subscript))
        ));
    }
}
