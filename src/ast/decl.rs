//! Declarations and top-level statements.
//!
//! A `val` declaration holds one or more simultaneous bindings joined by
//! `and`; lowering merges them into a single tuple-valued binding. A
//! `datatype` declaration introduces a (possibly recursive) datatype and
//! its value constructors.

use super::expression::Expr;
use super::pattern::Pattern;
use super::Pos;

/// A top-level REPL statement: a bare expression (bound to `it`) or a
/// declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement<T> {
    Expr(Expr<T>),
    Decl(Decl<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl<T> {
    Val(ValDecl<T>),
    Datatype(DatatypeDecl<T>),
}

impl<T> Decl<T> {
    pub fn position(&self) -> Pos {
        match self {
            Decl::Val(d) => d.position,
            Decl::Datatype(d) => d.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValDecl<T> {
    pub binds: Vec<ValBind<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValBind<T> {
    pub rec: bool,
    pub pat: Pattern<T>,
    pub exp: Expr<T>,
    pub position: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatatypeDecl<T> {
    pub binds: Vec<DatatypeBind>,
    pub position: Pos,
    pub info: T,
}

/// One datatype within a declaration:
/// `datatype 'a option = NONE | SOME of 'a`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatatypeBind {
    pub name: String,
    pub vars: Vec<String>,
    pub constructors: Vec<(String, Option<TyExpr>)>,
    pub position: Pos,
}

/// Type syntax as written in constructor argument positions.
#[derive(Debug, Clone, PartialEq)]
pub enum TyExpr {
    /// A type variable, `'a`.
    Var(String),
    /// A type constructor applied to arguments: `int`, `'a list`,
    /// `int option`. Primitive names and `list` are recognised specially.
    Con(String, Vec<TyExpr>),
    Tuple(Vec<TyExpr>),
    Record(Vec<(String, TyExpr)>),
    Fn(Box<TyExpr>, Box<TyExpr>),
}
