//! Hook for the relational-pushdown compiler selected by the `hybrid`
//! session knob.
//!
//! A pushdown compiler would hand whole `from` expressions to an external
//! relational engine. None is wired in, so this hook recognises no
//! declaration shape and every statement falls back to the base compiler;
//! the knob stays honest either way.

use crate::compile::{CompiledStatement, Environment};
use crate::core::Decl;
use crate::types::TypeSystem;

/// Attempt to compile through the pushdown path. `None` means the shape
/// is unsupported and the caller must use the base compiler.
pub fn try_compile(
    _types: &TypeSystem,
    _env: &Environment,
    _decl: &Decl,
) -> Option<CompiledStatement> {
    None
}
