//! Surface expression nodes.
//!
//! The grammar is richer than the core language: `if`, infix operators,
//! record expressions, list literals and multi-clause `fn` all exist here
//! and are rewritten away during core lowering.

use super::decl::Decl;
use super::pattern::Pattern;
use super::Pos;

/// A literal value. Shared by expressions, patterns and the core language.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Unit,
    Bool(bool),
    Char(char),
    Int(i64),
    Real(f64),
    String(String),
}

/// All surface expression forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<T> {
    Literal(Literal<T>),
    Id(Id<T>),
    RecordSelector(RecordSelector<T>),
    Tuple(Tuple<T>),
    Record(Record<T>),
    List(ListExpr<T>),
    If(If<T>),
    Case(Case<T>),
    Fn(Fn<T>),
    Let(Let<T>),
    Apply(Apply<T>),
    Infix(Infix<T>),
    From(From<T>),
}

impl<T> Expr<T> {
    pub fn position(&self) -> Pos {
        match self {
            Expr::Literal(n) => n.position,
            Expr::Id(n) => n.position,
            Expr::RecordSelector(n) => n.position,
            Expr::Tuple(n) => n.position,
            Expr::Record(n) => n.position,
            Expr::List(n) => n.position,
            Expr::If(n) => n.position,
            Expr::Case(n) => n.position,
            Expr::Fn(n) => n.position,
            Expr::Let(n) => n.position,
            Expr::Apply(n) => n.position,
            Expr::Infix(n) => n.position,
            Expr::From(n) => n.position,
        }
    }

    pub fn info(&self) -> &T {
        match self {
            Expr::Literal(n) => &n.info,
            Expr::Id(n) => &n.info,
            Expr::RecordSelector(n) => &n.info,
            Expr::Tuple(n) => &n.info,
            Expr::Record(n) => &n.info,
            Expr::List(n) => &n.info,
            Expr::If(n) => &n.info,
            Expr::Case(n) => &n.info,
            Expr::Fn(n) => &n.info,
            Expr::Let(n) => &n.info,
            Expr::Apply(n) => &n.info,
            Expr::Infix(n) => &n.info,
            Expr::From(n) => &n.info,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal<T> {
    pub value: Lit,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Id<T> {
    pub name: String,
    pub position: Pos,
    pub info: T,
}

/// Field projection `#label`, a first-class function on records.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSelector<T> {
    pub label: String,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple<T> {
    pub args: Vec<Expr<T>>,
    pub position: Pos,
    pub info: T,
}

/// Record expression with fields in source order. Lowering reorders them
/// into the canonical label order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub fields: Vec<(String, Expr<T>)>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListExpr<T> {
    pub args: Vec<Expr<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If<T> {
    pub condition: Box<Expr<T>>,
    pub if_true: Box<Expr<T>>,
    pub if_false: Box<Expr<T>>,
    pub position: Pos,
    pub info: T,
}

/// One `pattern => expression` clause of a `fn` or `case`.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T> {
    pub pat: Pattern<T>,
    pub exp: Expr<T>,
    pub position: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case<T> {
    pub exp: Box<Expr<T>>,
    pub matches: Vec<Match<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fn<T> {
    pub matches: Vec<Match<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Let<T> {
    pub decls: Vec<Decl<T>>,
    pub body: Box<Expr<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Apply<T> {
    pub func: Box<Expr<T>>,
    pub arg: Box<Expr<T>>,
    pub position: Pos,
    pub info: T,
}

/// The fixed set of infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Plus,
    Minus,
    Times,
    Divide,
    Div,
    Mod,
    Caret,
    Cons,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Andalso,
    Orelse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Infix<T> {
    pub op: InfixOp,
    pub lhs: Box<Expr<T>>,
    pub rhs: Box<Expr<T>>,
    pub position: Pos,
    pub info: T,
}

/// Relational comprehension:
/// `from p1 in e1, p2 in e2 ... steps ... yield e`.
#[derive(Debug, Clone, PartialEq)]
pub struct From<T> {
    pub sources: Vec<(Pattern<T>, Expr<T>)>,
    pub steps: Vec<FromStep<T>>,
    /// `None` means the default yield: the single bound name, or the
    /// record of all bound names. Inference materialises the default.
    pub yield_exp: Option<Box<Expr<T>>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromStep<T> {
    Where(Expr<T>),
    Group {
        keys: Vec<(String, Expr<T>)>,
        aggregates: Vec<Aggregate<T>>,
    },
    Order(Vec<OrderItem<T>>),
}

/// `compute name = func of argument`; the argument defaults to the
/// current row element.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<T> {
    pub name: String,
    pub func: Expr<T>,
    pub argument: Option<Expr<T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem<T> {
    pub exp: Expr<T>,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}
