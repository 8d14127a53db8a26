//! Error taxonomy shared by every pipeline stage.
//!
//! Parse errors originate in the external parser and are only propagated.
//! Type errors abort a statement before it is compiled. Compile errors are
//! internal invariant violations and fatal to the session. Match failures
//! and runtime errors abort evaluation of the current statement.

use thiserror::Error;

use crate::types::error::TypeError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// No clause of a function or `case` accepted its argument.
    #[error("match failure")]
    MatchFailure,
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Internal invariant violations. Seeing one of these is a bug in the
/// compiler, not a user error.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("internal: forward reference evaluated before it was linked")]
    UnlinkedForwardRef,
    #[error("internal: {0}")]
    Invariant(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("empty list")]
    EmptyList,
    #[error("subscript out of bounds")]
    Subscript,
}
