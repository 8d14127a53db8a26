//! Builders for untyped surface nodes.
//!
//! The parser normally produces the surface AST; tests and the demo
//! binary construct it through these functions instead. All nodes get a
//! default position; `()` fills the info slot.

use super::decl::{DatatypeBind, DatatypeDecl, Decl, Statement, TyExpr, ValBind, ValDecl};
use super::expression::{
    Aggregate, Apply, Case, Direction, Expr, Fn, From, FromStep, Id, If, Infix, InfixOp, Let,
    ListExpr, Lit, Literal, Match, OrderItem, Record, RecordSelector, Tuple,
};
use super::pattern::{
    ConPat, ConsPat, IdPat, ListPat, LiteralPat, Pattern, RecordPat, TuplePat, WildcardPat,
};
use super::Pos;

pub type UExpr = Expr<()>;
pub type UPattern = Pattern<()>;
pub type UDecl = Decl<()>;

fn pos() -> Pos {
    Pos::default()
}

// Literals.

pub fn lit(value: Lit) -> UExpr {
    Expr::Literal(Literal {
        value,
        position: pos(),
        info: (),
    })
}

pub fn unit() -> UExpr {
    lit(Lit::Unit)
}

pub fn int(value: i64) -> UExpr {
    lit(Lit::Int(value))
}

pub fn real(value: f64) -> UExpr {
    lit(Lit::Real(value))
}

pub fn bool_lit(value: bool) -> UExpr {
    lit(Lit::Bool(value))
}

pub fn char_lit(value: char) -> UExpr {
    lit(Lit::Char(value))
}

pub fn string(value: impl Into<String>) -> UExpr {
    lit(Lit::String(value.into()))
}

// Expressions.

pub fn id(name: impl Into<String>) -> UExpr {
    Expr::Id(Id {
        name: name.into(),
        position: pos(),
        info: (),
    })
}

pub fn record_selector(label: impl Into<String>) -> UExpr {
    Expr::RecordSelector(RecordSelector {
        label: label.into(),
        position: pos(),
        info: (),
    })
}

pub fn tuple(args: Vec<UExpr>) -> UExpr {
    Expr::Tuple(Tuple {
        args,
        position: pos(),
        info: (),
    })
}

pub fn record(fields: Vec<(&str, UExpr)>) -> UExpr {
    Expr::Record(Record {
        fields: fields
            .into_iter()
            .map(|(l, e)| (l.to_string(), e))
            .collect(),
        position: pos(),
        info: (),
    })
}

pub fn list(args: Vec<UExpr>) -> UExpr {
    Expr::List(ListExpr {
        args,
        position: pos(),
        info: (),
    })
}

pub fn if_then_else(condition: UExpr, if_true: UExpr, if_false: UExpr) -> UExpr {
    Expr::If(If {
        condition: Box::new(condition),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
        position: pos(),
        info: (),
    })
}

pub fn case(exp: UExpr, matches: Vec<(UPattern, UExpr)>) -> UExpr {
    Expr::Case(Case {
        exp: Box::new(exp),
        matches: matches.into_iter().map(|(pat, exp)| match_(pat, exp)).collect(),
        position: pos(),
        info: (),
    })
}

pub fn match_(pat: UPattern, exp: UExpr) -> Match<()> {
    Match {
        pat,
        exp,
        position: pos(),
    }
}

/// `fn p1 => e1 | p2 => e2 | ...`
pub fn fn_match(matches: Vec<(UPattern, UExpr)>) -> UExpr {
    Expr::Fn(Fn {
        matches: matches.into_iter().map(|(pat, exp)| match_(pat, exp)).collect(),
        position: pos(),
        info: (),
    })
}

/// Single-clause `fn x => e`.
pub fn lambda(param: impl Into<String>, body: UExpr) -> UExpr {
    fn_match(vec![(pat_id(param), body)])
}

pub fn let_in(decls: Vec<UDecl>, body: UExpr) -> UExpr {
    Expr::Let(Let {
        decls,
        body: Box::new(body),
        position: pos(),
        info: (),
    })
}

pub fn apply(func: UExpr, arg: UExpr) -> UExpr {
    Expr::Apply(Apply {
        func: Box::new(func),
        arg: Box::new(arg),
        position: pos(),
        info: (),
    })
}

pub fn infix(op: InfixOp, lhs: UExpr, rhs: UExpr) -> UExpr {
    Expr::Infix(Infix {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        position: pos(),
        info: (),
    })
}

pub fn plus(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Plus, lhs, rhs)
}

pub fn minus(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Minus, lhs, rhs)
}

pub fn times(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Times, lhs, rhs)
}

pub fn eq(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Eq, lhs, rhs)
}

pub fn lt(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Lt, lhs, rhs)
}

pub fn cons(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Cons, lhs, rhs)
}

pub fn andalso(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Andalso, lhs, rhs)
}

pub fn orelse(lhs: UExpr, rhs: UExpr) -> UExpr {
    infix(InfixOp::Orelse, lhs, rhs)
}

// `from` expressions.

pub fn from(
    sources: Vec<(UPattern, UExpr)>,
    steps: Vec<FromStep<()>>,
    yield_exp: Option<UExpr>,
) -> UExpr {
    Expr::From(From {
        sources,
        steps,
        yield_exp: yield_exp.map(Box::new),
        position: pos(),
        info: (),
    })
}

pub fn where_step(exp: UExpr) -> FromStep<()> {
    FromStep::Where(exp)
}

/// `group k1 = e1, ... compute a1 = f1, ...`; a bare `group name` is
/// written as `(name, id(name))`.
pub fn group_step(keys: Vec<(&str, UExpr)>, aggregates: Vec<Aggregate<()>>) -> FromStep<()> {
    FromStep::Group {
        keys: keys.into_iter().map(|(n, e)| (n.to_string(), e)).collect(),
        aggregates,
    }
}

pub fn aggregate(name: impl Into<String>, func: UExpr, argument: Option<UExpr>) -> Aggregate<()> {
    Aggregate {
        name: name.into(),
        func,
        argument,
    }
}

pub fn order_step(items: Vec<(UExpr, Direction)>) -> FromStep<()> {
    FromStep::Order(
        items
            .into_iter()
            .map(|(exp, direction)| OrderItem { exp, direction })
            .collect(),
    )
}

// Patterns.

pub fn pat_id(name: impl Into<String>) -> UPattern {
    Pattern::Id(IdPat {
        name: name.into(),
        position: pos(),
        info: (),
    })
}

pub fn pat_wild() -> UPattern {
    Pattern::Wildcard(WildcardPat {
        position: pos(),
        info: (),
    })
}

pub fn pat_lit(value: Lit) -> UPattern {
    Pattern::Literal(LiteralPat {
        value,
        position: pos(),
        info: (),
    })
}

pub fn pat_int(value: i64) -> UPattern {
    pat_lit(Lit::Int(value))
}

pub fn pat_con(name: impl Into<String>, arg: Option<UPattern>) -> UPattern {
    Pattern::Con(ConPat {
        name: name.into(),
        arg: arg.map(Box::new),
        position: pos(),
        info: (),
    })
}

pub fn pat_tuple(args: Vec<UPattern>) -> UPattern {
    Pattern::Tuple(TuplePat {
        args,
        position: pos(),
        info: (),
    })
}

pub fn pat_record(fields: Vec<(&str, UPattern)>, ellipsis: bool) -> UPattern {
    Pattern::Record(RecordPat {
        fields: fields
            .into_iter()
            .map(|(l, p)| (l.to_string(), p))
            .collect(),
        ellipsis,
        position: pos(),
        info: (),
    })
}

pub fn pat_list(args: Vec<UPattern>) -> UPattern {
    Pattern::List(ListPat {
        args,
        position: pos(),
        info: (),
    })
}

pub fn pat_cons(head: UPattern, tail: UPattern) -> UPattern {
    Pattern::Cons(ConsPat {
        head: Box::new(head),
        tail: Box::new(tail),
        position: pos(),
        info: (),
    })
}

// Declarations and statements.

pub fn val_bind(rec: bool, pat: UPattern, exp: UExpr) -> ValBind<()> {
    ValBind {
        rec,
        pat,
        exp,
        position: pos(),
    }
}

pub fn val(pat: UPattern, exp: UExpr) -> UDecl {
    val_decl(vec![val_bind(false, pat, exp)])
}

pub fn val_rec(pat: UPattern, exp: UExpr) -> UDecl {
    val_decl(vec![val_bind(true, pat, exp)])
}

/// Simultaneous bindings: `val p1 = e1 and p2 = e2 and ...`.
pub fn val_decl(binds: Vec<ValBind<()>>) -> UDecl {
    Decl::Val(ValDecl {
        binds,
        position: pos(),
        info: (),
    })
}

pub fn datatype(
    name: impl Into<String>,
    vars: Vec<&str>,
    constructors: Vec<(&str, Option<TyExpr>)>,
) -> UDecl {
    Decl::Datatype(DatatypeDecl {
        binds: vec![DatatypeBind {
            name: name.into(),
            vars: vars.into_iter().map(String::from).collect(),
            constructors: constructors
                .into_iter()
                .map(|(n, t)| (n.to_string(), t))
                .collect(),
            position: pos(),
        }],
        position: pos(),
        info: (),
    })
}

pub fn ty_var(name: impl Into<String>) -> TyExpr {
    TyExpr::Var(name.into())
}

pub fn ty_con(name: impl Into<String>, args: Vec<TyExpr>) -> TyExpr {
    TyExpr::Con(name.into(), args)
}

pub fn ty_tuple(args: Vec<TyExpr>) -> TyExpr {
    TyExpr::Tuple(args)
}

pub fn expr_statement(exp: UExpr) -> Statement<()> {
    Statement::Expr(exp)
}

pub fn decl_statement(decl: UDecl) -> Statement<()> {
    Statement::Decl(decl)
}
