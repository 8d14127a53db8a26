//! Core AST: the minimal typed language the compiler consumes.
//!
//! Lowering from the surface language has already happened by the time
//! these nodes exist: `if` is a `case` over `bool`, infix operators are
//! applications of built-in function literals, every `fn` takes a single
//! identifier argument, record expressions are tuples over the canonical
//! label order and record patterns are fully expanded. Every node carries
//! its inferred type.

use crate::ast::expression::{Direction, Lit};
use crate::interpreter::builtins::BuiltIn;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    Literal(Literal),
    /// Reference to a built-in operator, e.g. the `+` behind `1 + 2`.
    FnLiteral(FnLiteral),
    Id(Id),
    RecordSelector(RecordSelector),
    Tuple(Tuple),
    Apply(Apply),
    Fn(Fn),
    Case(Case),
    Let(Let),
    From(From),
}

impl Exp {
    pub fn ty(&self) -> &Type {
        match self {
            Exp::Literal(n) => &n.ty,
            Exp::FnLiteral(n) => &n.ty,
            Exp::Id(n) => &n.ty,
            Exp::RecordSelector(n) => &n.ty,
            Exp::Tuple(n) => &n.ty,
            Exp::Apply(n) => &n.ty,
            Exp::Fn(n) => &n.ty,
            Exp::Case(n) => &n.ty,
            Exp::Let(n) => &n.ty,
            Exp::From(n) => &n.ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Lit,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnLiteral {
    pub builtin: BuiltIn,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Id {
    pub name: String,
    pub ty: Type,
}

/// Projection of the `slot`th field of a record or tuple argument. The
/// type is the selector's function type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSelector {
    pub slot: usize,
    pub ty: Type,
}

/// Ordered components; also represents records, whose components sit in
/// the canonical label order of the record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub args: Vec<Exp>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub func: Box<Exp>,
    pub arg: Box<Exp>,
    pub ty: Type,
}

/// Always single-argument; multi-clause surface functions have been
/// rewritten to a fresh-variable `case`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fn {
    pub matches: Vec<(Pat, Exp)>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub exp: Box<Exp>,
    pub matches: Vec<(Pat, Exp)>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub decl: Box<Decl>,
    pub body: Box<Exp>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct From {
    pub sources: Vec<(Pat, Exp)>,
    pub steps: Vec<FromStep>,
    pub yield_exp: Box<Exp>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromStep {
    Where(Exp),
    Group {
        /// Key fields in canonical label order.
        keys: Vec<(String, Exp)>,
        aggregates: Vec<Aggregate>,
    },
    Order(Vec<(Exp, Direction)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub name: String,
    pub func: Exp,
    pub argument: Exp,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Val(ValDecl),
    Datatype(DatatypeDecl),
}

/// A single binding; simultaneous surface bindings have been merged into
/// one tuple-valued binding by lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct ValDecl {
    pub rec: bool,
    pub pat: Pat,
    pub exp: Exp,
}

impl ValDecl {
    /// The names this declaration binds with their types, in pattern
    /// order. Drives the one-line-per-name REPL output.
    pub fn bound_names(&self) -> Vec<(String, Type)> {
        self.pat.bound_names()
    }
}

/// Datatypes named by a declaration; their definitions live in the
/// `TypeSystem` and are purely compile-time.
#[derive(Debug, Clone, PartialEq)]
pub struct DatatypeDecl {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    Id(IdPat),
    Literal(LitPat),
    Wildcard(WildcardPat),
    /// Nullary constructor.
    Con0(Con0Pat),
    /// Unary constructor. Infix cons `p1 :: p2` lowers to the constructor
    /// `::` applied to a tuple pattern.
    Con(ConPat),
    Tuple(TuplePat),
    /// Fully expanded: one sub-pattern per label of the record type, in
    /// canonical order.
    Record(RecordPat),
    List(ListPat),
}

impl Pat {
    /// Names bound by this pattern with their types, left to right.
    pub fn bound_names(&self) -> Vec<(String, Type)> {
        let mut names = Vec::new();
        self.collect_bound(&mut names);
        names
    }

    fn collect_bound(&self, names: &mut Vec<(String, Type)>) {
        match self {
            Pat::Id(p) => names.push((p.name.clone(), p.ty.clone())),
            Pat::Literal(_) | Pat::Wildcard(_) | Pat::Con0(_) => {}
            Pat::Con(p) => p.arg.collect_bound(names),
            Pat::Tuple(p) => p.args.iter().for_each(|a| a.collect_bound(names)),
            Pat::Record(p) => p.fields.iter().for_each(|(_, a)| a.collect_bound(names)),
            Pat::List(p) => p.args.iter().for_each(|a| a.collect_bound(names)),
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            Pat::Id(p) => &p.ty,
            Pat::Literal(p) => &p.ty,
            Pat::Wildcard(p) => &p.ty,
            Pat::Con0(p) => &p.ty,
            Pat::Con(p) => &p.ty,
            Pat::Tuple(p) => &p.ty,
            Pat::Record(p) => &p.ty,
            Pat::List(p) => &p.ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdPat {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LitPat {
    pub value: Lit,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WildcardPat {
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Con0Pat {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConPat {
    pub name: String,
    pub arg: Box<Pat>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuplePat {
    pub args: Vec<Pat>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPat {
    pub fields: Vec<(String, Pat)>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPat {
    pub args: Vec<Pat>,
    pub ty: Type,
}

/// The name the cons constructor carries in constructor patterns.
pub const CONS_NAME: &str = "::";
