//! # Type Substitutions for Unification
//!
//! This module implements substitutions used in Hindley-Milner
//! type inference to represent type variable assignments.
//!
//! ## Overview
//!
//! A substitution maps type variables to types, representing
//! assignments discovered during type inference. For example:
//!
//! - After inferring `fn x => x + 1`, we might have substitution: `'a := int`
//! - After inferring `fn x => x`, we might have: `'a := 'b` (different vars unified)
//!
//! ## Substitution Operations
//!
//! The `Substitution` struct supports:
//!
//! - **Creation**: Empty or singleton (single mapping) substitutions
//! - **Application**: Apply substitution to a type (replace all type variables)
//! - **Composition**: Combine two substitutions (compose two mappings)
//!
//! ## Substitution Application
//!
//! When we apply a substitution to a type, we replace every type
//! variable that appears in the substitution with its mapped type:
//!
//! ```text
//! // Substitution: {'a := int}
//!
//! Apply to 'a:
//!   'a -> int
//!
//! Apply to 'a -> 'a:
//!   'a -> 'a becomes int -> int
//!
//! Apply to 'a list:
//!   'a list becomes int list
//!
//! Apply to {key:'a, value:'b}:
//!   becomes {key:int, value:'b}
//! ```
//!
//! ## Substitution Composition
//!
//! When composing substitutions S2 and S1 (S2 after S1):
//!
//! ```text
//! (S2 . S1)(t) = S2(S1(t))
//!
//! // Meaning: first apply S1, then apply S2 to the result
//!
//! // Example:
//! S1 = {'a := 'b}
//! S2 = {'b := int}
//!
//! Compose S2 . S1:
//!   For 'a in S1: apply S2 to 'b, giving int
//!   Result: {'a := int, 'b := int}
//! ```
//!
//! Composition is used in type inference to combine substitutions
//! from different parts of the expression.
//!
//! ## Composition Order
//!
//! Composition is **not** commutative: S1 . S2 differs from S2 . S1.
//!
//! The convention throughout this crate is:
//!
//! ```text
//! result = later.compose(&earlier)  // Means: apply earlier first, then later
//! ```
//!
//! This order matters because later substitutions may refine
//! types substituted by earlier ones.
//!
//! ## Related Modules
//!
//! - [`crate::types::ty`] - Type definitions that substitutions apply to
//! - [`crate::types::unify`] - Unification algorithm that produces substitutions
//! - [`crate::types::env`] - Type environments that substitutions are applied to

use std::collections::HashMap;

use super::ty::{Type, TypeScheme, TypeVar};

/// A substitution mapping type variables to types.
///
/// Substitutions represent assignments of type variables discovered
/// during type inference. Internally stored as a hash map.
///
/// # Fields
///
/// * `0` - The underlying HashMap mapping `TypeVar` to `Type`
///
/// # Example
///
/// ```text
/// // Substitution with one mapping: 'a := int
/// let var_a = TypeVar::new(0);
/// let subst = Substitution::singleton(var_a, INT);
/// // subst.0 = {var_a: int}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution(pub HashMap<TypeVar, Type>);

impl Substitution {
    /// Create an empty substitution (no mappings).
    ///
    /// # Returns
    ///
    /// A new substitution with no variable mappings
    ///
    /// # Example
    ///
    /// ```text
    /// let subst = Substitution::empty();
    /// // Applying the empty substitution to any type returns the same type
    /// assert_eq!(subst.apply(&INT), INT);
    /// ```
    pub fn empty() -> Self {
        Substitution(HashMap::new())
    }

    /// Create a substitution with a single mapping.
    ///
    /// # Arguments
    ///
    /// * `var` - The type variable to map
    /// * `ty` - The type to map the variable to
    ///
    /// # Returns
    ///
    /// A new substitution with one mapping: `var := ty`
    ///
    /// # Example
    ///
    /// ```text
    /// let var_a = TypeVar::new(0);
    /// let subst = Substitution::singleton(var_a.clone(), INT);
    /// // subst = {'a := int}
    ///
    /// // Apply to type variable:
    /// assert_eq!(subst.apply(&Type::Var(var_a)), INT);
    /// ```
    pub fn singleton(var: TypeVar, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(var, ty);
        Substitution(map)
    }

    /// Whether this substitution carries no mappings.
    ///
    /// # Returns
    ///
    /// `true` when applying this substitution is the identity
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply this substitution to a type.
    ///
    /// Recursively replaces all type variables in the type
    /// with their mapped values from this substitution.
    ///
    /// # Arguments
    ///
    /// * `ty` - The type to apply substitution to
    ///
    /// # Returns
    ///
    /// A new type with all substitutions applied
    ///
    /// # Algorithm
    ///
    /// ```text
    /// apply(t):
    ///   match t:
    ///     primitive or temporary:
    ///       return t                   // No variables inside
    ///
    ///     Var(v):
    ///       if v in subst:
    ///         return subst[v]          // Replace with mapped type
    ///       else:
    ///         return Var(v)            // Not in substitution, keep
    ///
    ///     Fn, Tuple, Record, List, Named:
    ///       apply recursively to every component
    /// ```
    ///
    /// # Examples
    ///
    /// ```text
    /// // Substitution: {'a := int, 'b := string}
    ///
    /// // Apply to type variable:
    /// apply('a) = int
    /// apply('b) = string
    /// apply('c) = 'c                   // Not in substitution
    ///
    /// // Apply to structured types:
    /// apply('a -> 'b)      = int -> string
    /// apply('a * 'c)       = int * 'c
    /// apply('a list)       = int list
    /// apply({name:'b})     = {name:string}
    /// apply('a option)     = int option
    /// ```
    pub fn apply(&self, ty: &Type) -> Type {
        if self.0.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::Primitive(_) | Type::Temporary(_) => ty.clone(),
            Type::Var(v) => self.0.get(v).cloned().unwrap_or_else(|| ty.clone()),
            Type::Fn(t1, t2) => Type::fn_of(self.apply(t1), self.apply(t2)),
            Type::Tuple(ts) => Type::Tuple(ts.iter().map(|t| self.apply(t)).collect()),
            Type::Record { partial, fields } => Type::Record {
                partial: *partial,
                fields: fields
                    .iter()
                    .map(|(l, t)| (l.clone(), self.apply(t)))
                    .collect(),
            },
            Type::List(t) => Type::list(self.apply(t)),
            Type::Named(args, name) => Type::Named(
                args.iter().map(|t| self.apply(t)).collect(),
                name.clone(),
            ),
        }
    }

    /// Apply to a type scheme, leaving its quantified variables untouched.
    ///
    /// A scheme's bound variables are placeholders that get fresh names at
    /// instantiation, so a substitution must never replace them; only the
    /// free variables of the scheme's body are rewritten.
    ///
    /// # Arguments
    ///
    /// * `scheme` - The scheme whose free variables are rewritten
    ///
    /// # Returns
    ///
    /// A scheme with the same quantified variables and a substituted body
    ///
    /// # Example
    ///
    /// ```text
    /// // Scheme: forall 'a. 'a -> 'b    (only 'b is free)
    /// // Substitution: {'a := int, 'b := string}
    ///
    /// apply_scheme(scheme) = forall 'a. 'a -> string
    /// // 'a is untouched because the scheme quantifies it
    /// ```
    pub fn apply_scheme(&self, scheme: &TypeScheme) -> TypeScheme {
        let inner = Substitution(
            self.0
                .iter()
                .filter(|(v, _)| !scheme.vars.contains(v))
                .map(|(v, t)| (v.clone(), t.clone()))
                .collect(),
        );
        TypeScheme {
            vars: scheme.vars.clone(),
            ty: inner.apply(&scheme.ty),
        }
    }

    /// Compose with a substitution that logically happened earlier:
    /// `self.compose(&earlier)` applies `earlier` first, then `self`.
    ///
    /// # Arguments
    ///
    /// * `earlier` - The substitution to apply first
    ///
    /// # Returns
    ///
    /// A new substitution equivalent to applying `earlier`, then `self`
    ///
    /// # Algorithm
    ///
    /// ```text
    /// compose(self, earlier):
    ///
    /// 1. For each (var, ty) in earlier:
    ///      result[var] = self.apply(ty)  // Refine the earlier mapping
    ///
    /// 2. For each (var, ty) in self:
    ///      if var not in result:
    ///        result[var] = ty            // Keep mappings not overridden
    ///
    /// 3. Return result
    /// ```
    ///
    /// # Example
    ///
    /// ```text
    /// earlier = {'a := 'b}
    /// later   = {'b := int}
    ///
    /// later.compose(&earlier):
    ///   1. For 'a := 'b in earlier: apply later to 'b, giving int
    ///      result = {'a := int}
    ///   2. For 'b := int in later: 'b not in result, add it
    ///      result = {'a := int, 'b := int}
    ///
    /// // Check: compose('a) = later(earlier('a)) = later('b) = int
    /// ```
    pub fn compose(&self, earlier: &Substitution) -> Substitution {
        let mut map: HashMap<TypeVar, Type> = earlier
            .0
            .iter()
            .map(|(v, t)| (v.clone(), self.apply(t)))
            .collect();
        for (v, t) in &self.0 {
            map.entry(v.clone()).or_insert_with(|| t.clone());
        }
        Substitution(map)
    }
}
