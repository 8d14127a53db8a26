//! # Type Error Definitions
//!
//! This module defines the errors the type inference phase can report.
//! Errors occur when:
//!
//! - A variable is used but not defined (`UnboundVariable`)
//! - Two types cannot be unified (`TypeMismatch`)
//! - A type would be infinite (`OccursCheck`)
//! - A pattern binds one name twice (`DuplicateBinding`)
//! - A constructor is used at the wrong arity or does not exist
//!   (`ConstructorArity`, `UnknownConstructor`)
//! - Type syntax names an unknown type (`UnknownType`)
//! - An ellipsis record row never meets a concrete record
//!   (`UnresolvedRecord`)
//!
//! ## Error Reporting
//!
//! Every error carries the source position of the offending node, and the
//! `Display` implementation renders a one-line human-readable message
//! with that position. A type error aborts the current statement without
//! extending the environment.
//!
//! ## Related Modules
//!
//! - [`crate::types::infer`] - Type inference that produces these errors
//! - [`crate::types::unify`] - Unification errors converted to `TypeError`
//! - [`crate::error`] - The pipeline-wide error taxonomy these feed into

use thiserror::Error;

use crate::ast::Pos;
use crate::types::ty::{Type, TypeVar};
use crate::types::unify::UnifyError;

/// Type error encountered during type inference.
///
/// # Variants
///
/// * `UnboundVariable` - Reference to an undefined name
/// * `TypeMismatch` - Two types that should be equal are not
/// * `OccursCheck` - A type variable would need to contain itself
/// * `DuplicateBinding` - One pattern binds the same name twice
/// * `ConstructorArity` - Wrong number of constructor arguments
/// * `UnknownConstructor` - Constructor pattern names nothing declared
/// * `UnknownType` - Type syntax names an unknown type
/// * `UnresolvedRecord` - An ellipsis row stayed partial
/// * `DuplicateDatatype` - A datatype name declared twice
///
/// # Example Error Messages
///
/// ```text
/// 0:0: unbound variable: x
/// 0:0: type mismatch: expected int, found string
/// 0:0: cannot construct infinite type: 't0 = 't0 list
/// 0:0: variable x bound twice in one pattern
/// 0:0: record type with ellipsis never resolved to a concrete record
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    /// Reference to an undefined name.
    ///
    /// Occurs when an identifier is used that is bound neither in the
    /// current scope nor in the initial environment.
    #[error("{pos}: unbound variable: {name}")]
    UnboundVariable { name: String, pos: Pos },

    /// Type mismatch during unification.
    ///
    /// Occurs when two types are required to be equal but cannot be
    /// unified, such as `int` and `string`. The types are carried as
    /// their descriptions.
    #[error("{pos}: type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        pos: Pos,
    },

    /// Occurs check failure (infinite type).
    ///
    /// Occurs when unification would create an infinite type such as
    /// `'t0 = 't0 list`, e.g. from `fn x => x x`.
    #[error("{pos}: cannot construct infinite type: {var} = {ty}")]
    OccursCheck { var: String, ty: String, pos: Pos },

    /// One pattern binds the same name twice.
    ///
    /// Patterns bind linearly, so `(x, x)` is rejected.
    #[error("{pos}: variable {name} bound twice in one pattern")]
    DuplicateBinding { name: String, pos: Pos },

    /// A constructor used with the wrong number of arguments, such as a
    /// nullary constructor given an argument pattern.
    #[error("{pos}: constructor {name} used with the wrong number of arguments")]
    ConstructorArity { name: String, pos: Pos },

    /// A constructor pattern naming no declared constructor.
    #[error("{pos}: unknown constructor: {name}")]
    UnknownConstructor { name: String, pos: Pos },

    /// Type syntax referring to a type that does not exist.
    #[error("{pos}: unknown type: {name}")]
    UnknownType { name: String, pos: Pos },

    /// An ellipsis record row that never met a concrete record, so the
    /// record's full label set is unknown at the end of the declaration.
    #[error("{pos}: record type with ellipsis never resolved to a concrete record")]
    UnresolvedRecord { pos: Pos },

    /// A datatype name declared a second time in one declaration group.
    #[error("{pos}: datatype {name} is already defined")]
    DuplicateDatatype { name: String, pos: Pos },
}

impl TypeError {
    /// Create an unbound-variable error.
    ///
    /// # Arguments
    ///
    /// * `name` - The undefined name
    /// * `pos` - Source location of the reference
    pub fn unbound_variable(name: impl Into<String>, pos: Pos) -> Self {
        TypeError::UnboundVariable {
            name: name.into(),
            pos,
        }
    }

    /// Attach a source position to a unification failure.
    ///
    /// The unifier works on bare types and knows nothing about source
    /// locations; the inferencer converts its errors at the node where
    /// the constraint arose.
    ///
    /// # Arguments
    ///
    /// * `err` - The unification failure
    /// * `pos` - Source location of the constraint
    ///
    /// # Example
    ///
    /// ```text
    /// // unify(int, string) failed while checking `1 + "x"`:
    /// TypeError::from_unify_error(err, pos)
    /// // 0:0: type mismatch: expected int, found string
    /// ```
    pub fn from_unify_error(err: UnifyError, pos: Pos) -> Self {
        match err {
            UnifyError::Mismatch { expected, found } => TypeError::TypeMismatch {
                expected: expected.description(),
                found: found.description(),
                pos,
            },
            UnifyError::OccursCheck { var, ty } => TypeError::OccursCheck {
                var: Type::Var(var).description(),
                ty: ty.description(),
                pos,
            },
        }
    }
}
