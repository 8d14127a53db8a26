//! Surface pattern nodes.
//!
//! Patterns appear in `fn` and `case` clauses, in `val` bindings and in
//! the sources of a `from` expression. A record pattern may omit fields
//! with an ellipsis (`{a = x, ...}`); core lowering expands it to one
//! sub-pattern per label of its record type.

use super::expression::Lit;
use super::Pos;

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern<T> {
    Literal(LiteralPat<T>),
    Id(IdPat<T>),
    Wildcard(WildcardPat<T>),
    /// Constructor pattern, nullary (`NONE`) or unary (`SOME p`). An
    /// identifier that names a constructor is recognised during inference.
    Con(ConPat<T>),
    Tuple(TuplePat<T>),
    Record(RecordPat<T>),
    List(ListPat<T>),
    /// Infix cons `p1 :: p2`.
    Cons(ConsPat<T>),
}

impl<T> Pattern<T> {
    pub fn position(&self) -> Pos {
        match self {
            Pattern::Literal(p) => p.position,
            Pattern::Id(p) => p.position,
            Pattern::Wildcard(p) => p.position,
            Pattern::Con(p) => p.position,
            Pattern::Tuple(p) => p.position,
            Pattern::Record(p) => p.position,
            Pattern::List(p) => p.position,
            Pattern::Cons(p) => p.position,
        }
    }

    pub fn info(&self) -> &T {
        match self {
            Pattern::Literal(p) => &p.info,
            Pattern::Id(p) => &p.info,
            Pattern::Wildcard(p) => &p.info,
            Pattern::Con(p) => &p.info,
            Pattern::Tuple(p) => &p.info,
            Pattern::Record(p) => &p.info,
            Pattern::List(p) => &p.info,
            Pattern::Cons(p) => &p.info,
        }
    }

    /// Names bound by this pattern, in left-to-right order.
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Literal(_) | Pattern::Wildcard(_) => {}
            Pattern::Id(p) => names.push(p.name.clone()),
            Pattern::Con(p) => {
                if let Some(arg) = &p.arg {
                    arg.collect_names(names);
                }
            }
            Pattern::Tuple(p) => p.args.iter().for_each(|a| a.collect_names(names)),
            Pattern::Record(p) => p.fields.iter().for_each(|(_, a)| a.collect_names(names)),
            Pattern::List(p) => p.args.iter().for_each(|a| a.collect_names(names)),
            Pattern::Cons(p) => {
                p.head.collect_names(names);
                p.tail.collect_names(names);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralPat<T> {
    pub value: Lit,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdPat<T> {
    pub name: String,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WildcardPat<T> {
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConPat<T> {
    pub name: String,
    pub arg: Option<Box<Pattern<T>>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuplePat<T> {
    pub args: Vec<Pattern<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPat<T> {
    pub fields: Vec<(String, Pattern<T>)>,
    pub ellipsis: bool,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPat<T> {
    pub args: Vec<Pattern<T>>,
    pub position: Pos,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsPat<T> {
    pub head: Box<Pattern<T>>,
    pub tail: Box<Pattern<T>>,
    pub position: Pos,
    pub info: T,
}
