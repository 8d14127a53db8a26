//! # Type Environment for Type Inference
//!
//! This module implements the type environment used in Hindley-Milner
//! inference to store type schemes for named bindings.
//!
//! ## Overview
//!
//! The type environment (`TypeEnv`) maps names to type schemes:
//!
//! - Stores type information for every name in scope
//! - Supports shadowing through persistent extension
//! - Tracks free type variables for generalisation
//! - Supports substitution application during unification
//!
//! ## Design
//!
//! `TypeEnv` is a persistent structure: operations return new
//! environments and never modify one in place. Extending an environment
//! leaves the original valid, so an inner scope can shadow a name while
//! the enclosing scope keeps its own view.
//!
//! ## Type Schemes in the Environment
//!
//! The environment stores `TypeScheme` values, not raw `Type`s:
//!
//! - **Polymorphic bindings**: schemes with quantified variables
//! - **Monomorphic bindings**: schemes with an empty variable list
//!
//! When the inferencer looks a name up, it **instantiates** the scheme
//! with fresh type variables, which is what makes polymorphism work:
//!
//! ```text
//! // Environment contains:
//! // List.length: forall 'a. 'a list -> int
//!
//! // First use:
//! // instantiate with 't4, giving 't4 list -> int
//! // List.length [1,2] : int      ('t4 := int after unification)
//!
//! // Second use:
//! // instantiate with 't5, giving 't5 list -> int
//! // List.length ["a"] : int      ('t5 := string after unification)
//! ```
//!
//! ## Shadowing
//!
//! ```text
//! // Outer environment:
//! // { x: int, y: string }
//!
//! // After extend("x", bool):
//! // { x: bool, y: string }       // New environment shadows x
//!
//! // The outer environment still answers x -> int.
//! ```
//!
//! ## Free Type Variables
//!
//! The environment tracks free type variables to decide what may be
//! generalised at a `let` boundary:
//!
//! - A variable is **free** in the environment if it appears in some
//!   binding's scheme but is not quantified there
//! - Generalisation quantifies only variables that are free in the
//!   candidate type but NOT free in the environment
//!
//! ## Related Modules
//!
//! - [`crate::types::ty`] - Type and TypeScheme definitions
//! - [`crate::types::infer`] - Type inference using type environments
//! - [`crate::types::subst`] - Substitution application to environments

use std::collections::{HashMap, HashSet};

use super::subst::Substitution;
use super::ty::{TypeScheme, TypeVar};

/// Type environment mapping names to type schemes.
///
/// # Design
///
/// - **Persistent**: operations return new environments
/// - **Shadowing**: a later binding for a name hides the earlier one
///
/// # Example
///
/// ```text
/// // Create an empty environment:
/// let env = TypeEnv::empty();
///
/// // Extend with a binding:
/// let env1 = env.extend("x".to_string(), TypeScheme::monomorphic(INT));
///
/// // Shadow x:
/// let env2 = env1.extend("x".to_string(), TypeScheme::monomorphic(STRING));
/// // Lookup x in env2 -> string (shadows env1)
/// // Lookup x in env1 -> int    (unchanged)
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeEnv {
    bindings: HashMap<String, TypeScheme>,
}

impl TypeEnv {
    /// Create an empty environment with no bindings.
    pub fn empty() -> Self {
        TypeEnv {
            bindings: HashMap::new(),
        }
    }

    /// Create an environment from a collection of bindings.
    ///
    /// # Arguments
    ///
    /// * `bindings` - Pairs of name and type scheme
    ///
    /// # Example
    ///
    /// ```text
    /// TypeEnv::with_bindings(vec![("x".to_string(), TypeScheme::monomorphic(INT))])
    /// ```
    pub fn with_bindings(bindings: impl IntoIterator<Item = (String, TypeScheme)>) -> Self {
        TypeEnv {
            bindings: bindings.into_iter().collect(),
        }
    }

    /// Look up the type scheme bound to a name.
    ///
    /// # Returns
    ///
    /// The scheme, or `None` when the name is unbound (which the
    /// inferencer reports as an unbound-variable error)
    pub fn lookup(&self, name: &str) -> Option<&TypeScheme> {
        self.bindings.get(name)
    }

    /// Extend with one binding, returning a new environment.
    ///
    /// The original environment is unchanged; a binding for an existing
    /// name shadows it in the new environment only.
    ///
    /// # Arguments
    ///
    /// * `name` - The name to bind
    /// * `scheme` - Its type scheme
    ///
    /// # Example
    ///
    /// ```text
    /// let env1 = env.extend("x".to_string(), TypeScheme::monomorphic(INT));
    /// // env  : x unbound
    /// // env1 : x -> int
    /// ```
    pub fn extend(&self, name: String, scheme: TypeScheme) -> TypeEnv {
        let mut bindings = self.bindings.clone();
        bindings.insert(name, scheme);
        TypeEnv { bindings }
    }

    /// Variables free in any binding.
    ///
    /// Generalisation quantifies only over variables that are free in the
    /// candidate type but not here, which prevents a `let` from
    /// generalising a variable that an enclosing binding still
    /// constrains.
    ///
    /// # Example
    ///
    /// ```text
    /// // Environment:
    /// // f: forall 'a. 'a -> 'b
    ///
    /// free_type_vars() = {'b}
    /// // 'a is quantified by f's scheme and therefore not free
    /// ```
    pub fn free_type_vars(&self) -> HashSet<TypeVar> {
        let mut set = HashSet::new();
        for scheme in self.bindings.values() {
            let mut free = scheme.ty.free_type_vars();
            for v in &scheme.vars {
                free.remove(v);
            }
            set.extend(free);
        }
        set
    }

    /// Apply a substitution to every binding's scheme.
    ///
    /// Quantified variables are untouched; only free variables of each
    /// scheme are rewritten. Used between inference steps so earlier
    /// bindings see what unification has since learned.
    ///
    /// # Example
    ///
    /// ```text
    /// // Environment: { x: 't0 }
    /// // Substitution: {'t0 := int}
    ///
    /// apply_subst(s) = { x: int }
    /// ```
    pub fn apply_subst(&self, subst: &Substitution) -> TypeEnv {
        if subst.is_empty() {
            return self.clone();
        }
        TypeEnv {
            bindings: self
                .bindings
                .iter()
                .map(|(name, scheme)| (name.clone(), subst.apply_scheme(scheme)))
                .collect(),
        }
    }
}
