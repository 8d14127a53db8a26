//! # Core Type System Definitions
//!
//! This module defines the foundational types used in the Hindley-Milner
//! inference system: the type universe, type variables, record labels and
//! polymorphic type schemes.
//!
//! ## Overview
//!
//! The type universe is a closed set of variants:
//!
//! - **Primitive** - `unit`, `bool`, `char`, `int`, `real`, `string`
//! - **Var** - type variable (e.g. `'a`, `'t3`)
//! - **Fn** - function type `t1 -> t2`
//! - **Tuple** - ordered components, `int * string`
//! - **Record** - labelled fields in canonical order, `{age:int, name:string}`
//! - **List** - `int list`
//! - **Named** - a (possibly parameterised) datatype, `'a option`
//! - **Temporary** - placeholder while a recursive datatype is being defined
//!
//! Every type has a *moniker*, the canonical textual key under which the
//! type system interns it, and a *description* shown to users. Equal
//! monikers imply equal types.
//!
//! ## Type Variables
//!
//! Type variables are placeholders that can be unified with any concrete
//! type during inference. They are identified by a unique id and carry an
//! optional human-readable name:
//!
//! ```text
//! TypeVar { id: 0, name: Some("a") }   // 'a
//! TypeVar { id: 1, name: None }        // 't1
//! ```
//!
//! ## Canonical Label Order
//!
//! Record labels sort numeric-first: labels that are decimal numerals
//! compare by value and precede all other labels, which compare
//! lexicographically. Tuples are records whose labels are `"1"`, `"2"`, ...
//!
//! ```text
//! sorted: "1", "2", "10", "age", "name"
//! ```
//!
//! ## Type Schemes
//!
//! Type schemes represent polymorphic types by quantifying type variables:
//!
//! ```text
//! // Scheme of the polymorphic list length function:
//! TypeScheme {
//!     vars: [TypeVar { id: 0 }],
//!     ty: Fn('a list, int)            // 'a list -> int
//! }
//!
//! // When used, we instantiate with fresh vars:
//! // Instance 1: 't5 list -> int
//! // Instance 2: 't6 list -> int
//! ```
//!
//! ## Related Modules
//!
//! - [`crate::types::infer`] - Type inference over these types
//! - [`crate::types::env`] - Type environment holding type schemes
//! - [`crate::types::subst`] - Substitutions for variable unification
//! - [`crate::types::system`] - Interning and datatype definitions

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Type variable for polymorphism.
///
/// Type variables represent unknown or polymorphic types during type
/// inference. Each type variable is uniquely identified by an integer id.
///
/// # Fields
///
/// * `id` - Unique identifier for this type variable
/// * `name` - Optional human-readable name (e.g. "a") for pretty printing
///
/// # Example
///
/// ```text
/// // Fresh type variable (no name):
/// TypeVar { id: 0, name: None }
/// // Renders as: 't0
///
/// // Named type variable (from source syntax such as 'a):
/// TypeVar { id: 1, name: Some("a") }
/// // Renders as: 'a
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub id: usize,
    pub name: Option<String>,
}

impl TypeVar {
    /// Create a new type variable with the given id.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this type variable
    ///
    /// # Returns
    ///
    /// A new `TypeVar` with no human-readable name
    ///
    /// # Example
    ///
    /// ```text
    /// TypeVar::new(0)   // Creates unnamed variable 't0
    /// TypeVar::new(1)   // Creates unnamed variable 't1
    /// ```
    pub fn new(id: usize) -> Self {
        Self { id, name: None }
    }

    /// Create a new type variable with the given id and name.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this type variable
    /// * `name` - Human-readable name for pretty printing
    ///
    /// # Example
    ///
    /// ```text
    /// TypeVar::with_name(0, "a")   // Creates variable 'a
    /// TypeVar::with_name(1, "b")   // Creates variable 'b
    /// ```
    pub fn with_name(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// The six primitive types.
///
/// # Example
///
/// ```text
/// Prim::Int.name()     // "int"
/// Prim::String.name()  // "string"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    Unit,
    Bool,
    Char,
    Int,
    Real,
    String,
}

impl Prim {
    pub fn name(self) -> &'static str {
        match self {
            Prim::Unit => "unit",
            Prim::Bool => "bool",
            Prim::Char => "char",
            Prim::Int => "int",
            Prim::Real => "real",
            Prim::String => "string",
        }
    }
}

/// A record label with the canonical ordering: numeric labels first,
/// compared by value, then all others lexicographically.
///
/// Tuples are the special case whose labels are `"1"`, `"2"`, ..., which
/// is why numerals must sort by value rather than as text.
///
/// # Examples
///
/// ```text
/// "2"  < "10"      // By value, not "10" < "2" as text
/// "10" < "age"     // Numerals precede words
/// "age" < "name"   // Words compare lexicographically
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label's numeral value, if it is one.
    ///
    /// Leading zeros disqualify a label from being numeric so that
    /// `"01"` and `"1"` remain distinct labels.
    ///
    /// # Example
    ///
    /// ```text
    /// Label::new("7").numeric()    // Some(7)
    /// Label::new("07").numeric()   // None
    /// Label::new("age").numeric()  // None
    /// ```
    fn numeric(&self) -> Option<u64> {
        if self.0.is_empty() || (self.0.len() > 1 && self.0.starts_with('0')) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All possible types.
///
/// `Type` represents both concrete types (`int`, `string`, records,
/// lists, datatypes) and polymorphic types (type variables and anything
/// containing them).
///
/// # Variants
///
/// * `Primitive` - One of the six primitive types
/// * `Var` - Type variable (for polymorphism)
/// * `Fn` - Function type `parameter -> result`
/// * `Tuple` - Ordered components
/// * `Record` - Labelled fields in canonical order
/// * `List` - Homogeneous list
/// * `Named` - Datatype instance, arguments plus datatype name
/// * `Temporary` - Placeholder during a recursive datatype declaration
///
/// A `Record` whose `partial` flag is set came from an ellipsis pattern
/// such as `{a = x, ...}`: its field list is a lower bound, not the whole
/// record. Partial records must meet a concrete record type before the
/// enclosing declaration finishes.
///
/// # Examples
///
/// ```text
/// // Concrete types:
/// Type::Primitive(Prim::Int)            // int
/// Type::list(INT)                       // int list
/// Type::Tuple(vec![INT, STRING])        // int * string
/// Type::record([("age", INT)])          // {age:int}
///
/// // Polymorphic types:
/// Type::Var(TypeVar::new(0))            // 't0
/// Type::fn_of(Type::Var(a), INT)        // 'a -> int
///
/// // Datatype instance:
/// Type::Named(vec![INT], "option")      // int option
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(Prim),
    Var(TypeVar),
    Fn(Box<Type>, Box<Type>),
    Tuple(Vec<Type>),
    Record {
        partial: bool,
        fields: BTreeMap<Label, Type>,
    },
    List(Box<Type>),
    /// A datatype instance: type arguments plus the datatype name. The
    /// definition itself lives in the `TypeSystem`, so recursive datatypes
    /// never form reference cycles.
    Named(Vec<Type>, String),
    /// Placeholder for a datatype that is still being defined. Never
    /// escapes the declaration that created it.
    Temporary(String),
}

pub const UNIT: Type = Type::Primitive(Prim::Unit);
pub const BOOL: Type = Type::Primitive(Prim::Bool);
pub const CHAR: Type = Type::Primitive(Prim::Char);
pub const INT: Type = Type::Primitive(Prim::Int);
pub const REAL: Type = Type::Primitive(Prim::Real);
pub const STRING: Type = Type::Primitive(Prim::String);

impl Type {
    /// Create a function type from parameter and result types.
    ///
    /// # Arguments
    ///
    /// * `param` - Parameter type (type of the function's input)
    /// * `result` - Result type (type of the function's output)
    ///
    /// # Examples
    ///
    /// ```text
    /// Type::fn_of(INT, INT)                  // int -> int
    /// Type::fn_of(INT, STRING)               // int -> string
    /// Type::fn_of(INT, Type::fn_of(INT, INT))  // int -> int -> int
    /// ```
    pub fn fn_of(param: Type, result: Type) -> Self {
        Type::Fn(Box::new(param), Box::new(result))
    }

    /// Create a list type over an element type.
    ///
    /// # Example
    ///
    /// ```text
    /// Type::list(INT)              // int list
    /// Type::list(Type::list(INT))  // int list list
    /// ```
    pub fn list(elem: Type) -> Self {
        Type::List(Box::new(elem))
    }

    /// Create a full (non-partial) record type.
    ///
    /// The fields land in canonical label order regardless of the order
    /// they are supplied in.
    ///
    /// # Example
    ///
    /// ```text
    /// Type::record(vec![(Label::new("name"), STRING), (Label::new("age"), INT)])
    /// // {age:int, name:string}
    /// ```
    pub fn record(fields: impl IntoIterator<Item = (Label, Type)>) -> Self {
        Type::Record {
            partial: false,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn is_fn(&self) -> bool {
        matches!(self, Type::Fn(_, _))
    }

    /// Get the set of free type variables in this type.
    ///
    /// Free type variables are those not bound by a quantifier, i.e. not
    /// listed in an enclosing type scheme. Generalisation and the occurs
    /// check both work on this set.
    ///
    /// # Returns
    ///
    /// A `HashSet` containing all type variables in this type
    ///
    /// # Examples
    ///
    /// ```text
    /// // Concrete types have no free vars:
    /// INT.free_type_vars()                     // {}
    ///
    /// // Type variables are free by default:
    /// Var('a).free_type_vars()                 // {'a}
    ///
    /// // Structured types collect from every component:
    /// ('a -> int).free_type_vars()             // {'a}
    /// ('a * 'b).free_type_vars()               // {'a, 'b}
    /// ('a -> 'a).free_type_vars()              // {'a} (single element)
    /// ({key:'a} list).free_type_vars()         // {'a}
    /// ```
    pub fn free_type_vars(&self) -> HashSet<TypeVar> {
        let mut set = HashSet::new();
        self.collect_free(&mut set);
        set
    }

    fn collect_free(&self, set: &mut HashSet<TypeVar>) {
        match self {
            Type::Primitive(_) | Type::Temporary(_) => {}
            Type::Var(v) => {
                set.insert(v.clone());
            }
            Type::Fn(t1, t2) => {
                t1.collect_free(set);
                t2.collect_free(set);
            }
            Type::Tuple(ts) => ts.iter().for_each(|t| t.collect_free(set)),
            Type::Record { fields, .. } => fields.values().for_each(|t| t.collect_free(set)),
            Type::List(t) => t.collect_free(set),
            Type::Named(args, _) => args.iter().for_each(|t| t.collect_free(set)),
        }
    }

    /// True if a partial record type occurs anywhere inside this type.
    ///
    /// A declaration whose binding type still contains a partial record
    /// after inference is rejected, because its row never met a concrete
    /// record.
    ///
    /// # Examples
    ///
    /// ```text
    /// {a:int, ...}.has_partial_record()            // true
    /// ({a:int, ...} -> int).has_partial_record()   // true (nested)
    /// {a:int}.has_partial_record()                 // false
    /// ```
    pub fn has_partial_record(&self) -> bool {
        match self {
            Type::Primitive(_) | Type::Var(_) | Type::Temporary(_) => false,
            Type::Fn(t1, t2) => t1.has_partial_record() || t2.has_partial_record(),
            Type::Tuple(ts) => ts.iter().any(Type::has_partial_record),
            Type::Record { partial, fields } => {
                *partial || fields.values().any(Type::has_partial_record)
            }
            Type::List(t) => t.has_partial_record(),
            Type::Named(args, _) => args.iter().any(Type::has_partial_record),
        }
    }

    /// The canonical textual key for this type.
    ///
    /// The type system interns by moniker, so equal monikers imply equal
    /// types. Record fields render in canonical label order; function and
    /// tuple components are parenthesised where needed.
    ///
    /// # Examples
    ///
    /// ```text
    /// int.moniker()                        // "int"
    /// 'a.moniker()                         // "'a" (or "'t0" if unnamed)
    ///
    /// (int -> bool).moniker()              // "int -> bool"
    /// ((int -> int) -> string).moniker()   // "(int -> int) -> string"
    ///
    /// (int * string).moniker()             // "int * string"
    /// (int list).moniker()                 // "int list"
    /// ((int * int) list).moniker()         // "(int * int) list"
    ///
    /// {c:int, dept:int}.moniker()          // "{c:int, dept:int}"
    /// {a:int, ...}.moniker()               // "{a:int, ...}"
    ///
    /// (int option).moniker()               // "int option"
    /// ```
    pub fn moniker(&self) -> String {
        match self {
            Type::Primitive(p) => p.name().to_string(),
            Type::Var(v) => match &v.name {
                Some(name) => format!("'{}", name),
                None => format!("'t{}", v.id),
            },
            Type::Fn(t1, t2) => {
                let param = if t1.is_fn() || matches!(**t1, Type::Tuple(_)) {
                    format!("({})", t1.moniker())
                } else {
                    t1.moniker()
                };
                format!("{} -> {}", param, t2.moniker())
            }
            Type::Tuple(ts) => ts
                .iter()
                .map(|t| {
                    if t.is_fn() || matches!(t, Type::Tuple(_)) {
                        format!("({})", t.moniker())
                    } else {
                        t.moniker()
                    }
                })
                .collect::<Vec<_>>()
                .join(" * "),
            Type::Record { partial, fields } => {
                let mut parts: Vec<String> = fields
                    .iter()
                    .map(|(l, t)| format!("{}:{}", l, t.moniker()))
                    .collect();
                if *partial {
                    parts.push("...".to_string());
                }
                format!("{{{}}}", parts.join(", "))
            }
            Type::List(t) => {
                if t.is_fn() || matches!(**t, Type::Tuple(_)) {
                    format!("({}) list", t.moniker())
                } else {
                    format!("{} list", t.moniker())
                }
            }
            Type::Named(args, name) => match args.len() {
                0 => name.clone(),
                1 => format!("{} {}", args[0].moniker(), name),
                _ => format!(
                    "({}) {}",
                    args.iter().map(Type::moniker).collect::<Vec<_>>().join(","),
                    name
                ),
            },
            Type::Temporary(name) => name.clone(),
        }
    }

    /// The user-facing rendering of this type. Coincides with the moniker.
    ///
    /// This is what appears after the colon in REPL output lines such as
    /// `val xs = [1,2,3] : int list`.
    pub fn description(&self) -> String {
        self.moniker()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Polymorphic type scheme.
///
/// Type schemes represent polymorphic types by quantifying (binding)
/// type variables. A scheme like `forall 'a. 'a -> 'a` means "for all
/// types 'a, this is a function from 'a to 'a".
///
/// # Fields
///
/// * `vars` - List of quantified type variables (these are bound)
/// * `ty` - The underlying type, possibly mentioning those variables
///
/// # Semantics
///
/// The `vars` list specifies which type variables are quantified. Bound
/// variables are instantiated with fresh type variables every time the
/// scheme is **used**, but they are not free when the scheme is
/// **defined**.
///
/// # Example
///
/// ```text
/// // Scheme of the identity function:
/// // forall 'a. 'a -> 'a
/// TypeScheme {
///     vars: [TypeVar { id: 0, name: Some("a") }],
///     ty: Fn(Var('a), Var('a)),
/// }
///
/// // Used at int:    instantiate 'a with 't5, unify, giving int -> int
/// // Used at string: instantiate 'a with 't6, unify, giving string -> string
/// ```
///
/// # Monomorphic vs Polymorphic
///
/// ```text
/// // Monomorphic (no quantified variables):
/// TypeScheme { vars: [], ty: int }
///
/// // Polymorphic:
/// TypeScheme { vars: ['a], ty: Fn(Var('a), Var('a)) }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeScheme {
    pub vars: Vec<TypeVar>,
    pub ty: Type,
}

impl TypeScheme {
    /// Create a monomorphic type scheme (no quantified variables).
    ///
    /// # Arguments
    ///
    /// * `ty` - The concrete type
    ///
    /// # Example
    ///
    /// ```text
    /// TypeScheme::monomorphic(INT)
    /// // Equivalent to: TypeScheme { vars: [], ty: int }
    /// ```
    pub fn monomorphic(ty: Type) -> Self {
        TypeScheme {
            vars: Vec::new(),
            ty,
        }
    }

    /// Create a polymorphic type scheme with quantified variables.
    ///
    /// # Arguments
    ///
    /// * `vars` - List of quantified type variables
    /// * `ty` - The type mentioning those variables
    ///
    /// # Example
    ///
    /// ```text
    /// let a = TypeVar::new(0);
    /// TypeScheme::polymorphic(vec![a.clone()], Type::fn_of(Type::Var(a.clone()), Type::Var(a)))
    /// // Equivalent to: forall 'a. 'a -> 'a
    /// ```
    pub fn polymorphic(vars: Vec<TypeVar>, ty: Type) -> Self {
        TypeScheme { vars, ty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_ordering_numeric_first() {
        let mut labels = vec![
            Label::new("name"),
            Label::new("2"),
            Label::new("age"),
            Label::new("10"),
            Label::new("1"),
        ];
        labels.sort();
        let names: Vec<&str> = labels.iter().map(Label::as_str).collect();
        assert_eq!(names, vec!["1", "2", "10", "age", "name"]);
    }

    #[test]
    fn test_moniker_primitives() {
        assert_eq!(INT.moniker(), "int");
        assert_eq!(STRING.moniker(), "string");
        assert_eq!(UNIT.moniker(), "unit");
    }

    #[test]
    fn test_moniker_list_and_fn() {
        assert_eq!(Type::list(INT).moniker(), "int list");
        assert_eq!(Type::fn_of(INT, BOOL).moniker(), "int -> bool");
        assert_eq!(
            Type::fn_of(Type::fn_of(INT, INT), STRING).moniker(),
            "(int -> int) -> string"
        );
        assert_eq!(
            Type::list(Type::Tuple(vec![INT, INT])).moniker(),
            "(int * int) list"
        );
    }

    #[test]
    fn test_moniker_record_canonical_order() {
        let ty = Type::record(vec![(Label::new("dept"), INT), (Label::new("c"), INT)]);
        assert_eq!(ty.moniker(), "{c:int, dept:int}");
    }

    #[test]
    fn test_moniker_tuple() {
        let ty = Type::Tuple(vec![INT, STRING]);
        assert_eq!(ty.moniker(), "int * string");
    }

    #[test]
    fn test_free_type_vars() {
        let a = TypeVar::new(0);
        let b = TypeVar::new(1);
        let ty = Type::fn_of(Type::Var(a.clone()), Type::list(Type::Var(b.clone())));
        let free = ty.free_type_vars();
        assert_eq!(free.len(), 2);
        assert!(free.contains(&a));
        assert!(free.contains(&b));
    }

    #[test]
    fn test_partial_record_detection() {
        let partial = Type::Record {
            partial: true,
            fields: [(Label::new("a"), INT)].into_iter().collect(),
        };
        assert!(partial.has_partial_record());
        assert!(Type::fn_of(partial, INT).has_partial_record());
        assert!(!Type::record(vec![(Label::new("a"), INT)]).has_partial_record());
    }
}
