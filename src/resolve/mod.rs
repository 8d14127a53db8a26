//! Lowering from the typed surface AST to the core language.
//!
//! The rewrites, exhaustively:
//!
//! - infix `e1 (+) e2` becomes `Apply(FnLiteral(+), Tuple(e1, e2))`
//! - `if c then a else b` becomes `case c of true => a | _ => b`
//! - a `fn` with several clauses or a non-identifier pattern becomes
//!   `fn v => case v of ...` over a generated name
//! - `val p1 = e1 and p2 = e2` becomes `val (p1, p2) = (e1, e2)`, with
//!   `rec` the logical or of the clauses
//! - list literals become an application of the list builtin
//! - record expressions become tuples over the canonical label order
//! - record patterns are expanded to one sub-pattern per label, omissions
//!   filled with wildcards
//! - `let d1; ...; dn in e end` becomes a right-associated chain of
//!   single-declaration `let`s
//! - infix cons patterns become constructor patterns over a tuple
//!
//! Generated names are `"v0"`, `"v1"`, ...; source identifiers never
//! begin with `v` followed by a digit, so no capture is possible.

use crate::ast::decl::{Decl, ValDecl};
use crate::ast::expression::{Expr, FromStep, InfixOp, Match};
use crate::ast::pattern::Pattern;
use crate::ast::Pos;
use crate::core;
use crate::error::{CompileError, Error};
use crate::interpreter::builtins::BuiltIn;
use crate::types::{Label, Type, TypeError};

#[derive(Default)]
pub struct Resolver {
    name_counter: usize,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_name(&mut self) -> String {
        let name = format!("v{}", self.name_counter);
        self.name_counter += 1;
        name
    }

    pub fn decl(&mut self, decl: &Decl<Type>) -> Result<core::Decl, Error> {
        match decl {
            Decl::Val(d) => Ok(core::Decl::Val(self.val_decl(d)?)),
            Decl::Datatype(d) => Ok(core::Decl::Datatype(core::DatatypeDecl {
                names: d.binds.iter().map(|b| b.name.clone()).collect(),
            })),
        }
    }

    fn val_decl(&mut self, d: &ValDecl<Type>) -> Result<core::ValDecl, Error> {
        if d.binds.len() == 1 {
            let bind = &d.binds[0];
            return Ok(core::ValDecl {
                rec: bind.rec,
                pat: self.pattern(&bind.pat)?,
                exp: self.expr(&bind.exp)?,
            });
        }
        // Simultaneous bindings become one tuple-valued binding.
        let mut matches: Vec<(&Pattern<Type>, &Expr<Type>)> = Vec::new();
        let mut rec = false;
        for bind in &d.binds {
            flatten(&bind.pat, &bind.exp, &mut matches);
            rec |= bind.rec;
        }
        let mut pats = Vec::new();
        let mut exps = Vec::new();
        let mut types = Vec::new();
        for (pat, exp) in matches {
            types.push(pat.info().clone());
            pats.push(self.pattern(pat)?);
            exps.push(self.expr(exp)?);
        }
        let tuple_ty = Type::Tuple(types);
        Ok(core::ValDecl {
            rec,
            pat: core::Pat::Tuple(core::TuplePat {
                args: pats,
                ty: tuple_ty.clone(),
            }),
            exp: core::Exp::Tuple(core::Tuple {
                args: exps,
                ty: tuple_ty,
            }),
        })
    }

    pub fn expr(&mut self, expr: &Expr<Type>) -> Result<core::Exp, Error> {
        match expr {
            Expr::Literal(lit) => Ok(core::Exp::Literal(core::Literal {
                value: lit.value.clone(),
                ty: lit.info.clone(),
            })),

            Expr::Id(id) => Ok(core::Exp::Id(core::Id {
                name: id.name.clone(),
                ty: id.info.clone(),
            })),

            Expr::RecordSelector(sel) => {
                // A selector used as a first-class value needs its record
                // type pinned down here.
                let record_ty = match &sel.info {
                    Type::Fn(param, _) => param.as_ref().clone(),
                    other => {
                        return Err(internal(format!(
                            "record selector with non-function type {}",
                            other
                        )))
                    }
                };
                let slot = selector_slot(&record_ty, &sel.label, sel.position)?;
                Ok(core::Exp::RecordSelector(core::RecordSelector {
                    slot,
                    ty: sel.info.clone(),
                }))
            }

            Expr::Tuple(tuple) => {
                let args = tuple
                    .args
                    .iter()
                    .map(|a| self.expr(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(core::Exp::Tuple(core::Tuple {
                    args,
                    ty: tuple.info.clone(),
                }))
            }

            Expr::Record(record) => {
                // Reorder the fields into the canonical label order; the
                // record type's key order is authoritative.
                let mut fields: Vec<(&String, &Expr<Type>)> =
                    record.fields.iter().map(|(l, e)| (l, e)).collect();
                fields.sort_by(|(a, _), (b, _)| {
                    Label::new((*a).clone()).cmp(&Label::new((*b).clone()))
                });
                let args = fields
                    .into_iter()
                    .map(|(_, e)| self.expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(core::Exp::Tuple(core::Tuple {
                    args,
                    ty: record.info.clone(),
                }))
            }

            Expr::List(list) => {
                let args = list
                    .args
                    .iter()
                    .map(|a| self.expr(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let arg_ty = Type::Tuple(args.iter().map(|a| a.ty().clone()).collect());
                Ok(core::Exp::Apply(core::Apply {
                    func: Box::new(core::Exp::FnLiteral(core::FnLiteral {
                        builtin: BuiltIn::ZList,
                        ty: Type::fn_of(arg_ty.clone(), list.info.clone()),
                    })),
                    arg: Box::new(core::Exp::Tuple(core::Tuple {
                        args,
                        ty: arg_ty,
                    })),
                    ty: list.info.clone(),
                }))
            }

            Expr::If(if_) => {
                let cond = self.expr(&if_.condition)?;
                let on_true = self.expr(&if_.if_true)?;
                let on_false = self.expr(&if_.if_false)?;
                Ok(core::Exp::Case(core::Case {
                    exp: Box::new(cond),
                    matches: vec![
                        (
                            core::Pat::Literal(core::LitPat {
                                value: crate::ast::Lit::Bool(true),
                                ty: crate::types::ty::BOOL,
                            }),
                            on_true,
                        ),
                        (
                            core::Pat::Wildcard(core::WildcardPat {
                                ty: crate::types::ty::BOOL,
                            }),
                            on_false,
                        ),
                    ],
                    ty: if_.info.clone(),
                }))
            }

            Expr::Case(case) => {
                let exp = self.expr(&case.exp)?;
                let matches = self.matches(&case.matches)?;
                Ok(core::Exp::Case(core::Case {
                    exp: Box::new(exp),
                    matches,
                    ty: case.info.clone(),
                }))
            }

            Expr::Fn(fn_) => {
                let (param_ty, result_ty) = match &fn_.info {
                    Type::Fn(p, r) => (p.as_ref().clone(), r.as_ref().clone()),
                    other => {
                        return Err(internal(format!("fn with non-function type {}", other)))
                    }
                };
                if fn_.matches.len() == 1 {
                    if let Pattern::Id(id) = &fn_.matches[0].pat {
                        let body = self.expr(&fn_.matches[0].exp)?;
                        return Ok(core::Exp::Fn(core::Fn {
                            matches: vec![(
                                core::Pat::Id(core::IdPat {
                                    name: id.name.clone(),
                                    ty: id.info.clone(),
                                }),
                                body,
                            )],
                            ty: fn_.info.clone(),
                        }));
                    }
                }
                // Several clauses, or a destructuring pattern: bind a
                // generated variable and match on it.
                let name = self.new_name();
                let matches = self.matches(&fn_.matches)?;
                Ok(core::Exp::Fn(core::Fn {
                    matches: vec![(
                        core::Pat::Id(core::IdPat {
                            name: name.clone(),
                            ty: param_ty.clone(),
                        }),
                        core::Exp::Case(core::Case {
                            exp: Box::new(core::Exp::Id(core::Id {
                                name,
                                ty: param_ty,
                            })),
                            matches,
                            ty: result_ty,
                        }),
                    )],
                    ty: fn_.info.clone(),
                }))
            }

            Expr::Let(let_) => self.flatten_let(&let_.decls, &let_.body, &let_.info),

            Expr::Apply(apply) => {
                let arg = self.expr(&apply.arg)?;
                // A selector in function position takes its slot from the
                // argument's record type, which is concrete here even when
                // the selector's own type is still a partial row.
                let func = if let Expr::RecordSelector(sel) = apply.func.as_ref() {
                    let slot = selector_slot(arg.ty(), &sel.label, sel.position)?;
                    core::Exp::RecordSelector(core::RecordSelector {
                        slot,
                        ty: Type::fn_of(arg.ty().clone(), apply.info.clone()),
                    })
                } else {
                    self.expr(&apply.func)?
                };
                Ok(core::Exp::Apply(core::Apply {
                    func: Box::new(func),
                    arg: Box::new(arg),
                    ty: apply.info.clone(),
                }))
            }

            Expr::Infix(infix) => {
                let lhs = self.expr(&infix.lhs)?;
                let rhs = self.expr(&infix.rhs)?;
                let builtin = builtin_for(infix.op);
                let arg_ty = Type::Tuple(vec![lhs.ty().clone(), rhs.ty().clone()]);
                Ok(core::Exp::Apply(core::Apply {
                    func: Box::new(core::Exp::FnLiteral(core::FnLiteral {
                        builtin,
                        ty: Type::fn_of(arg_ty.clone(), infix.info.clone()),
                    })),
                    arg: Box::new(core::Exp::Tuple(core::Tuple {
                        args: vec![lhs, rhs],
                        ty: arg_ty,
                    })),
                    ty: infix.info.clone(),
                }))
            }

            Expr::From(from) => {
                let mut sources = Vec::new();
                for (pat, exp) in &from.sources {
                    sources.push((self.pattern(pat)?, self.expr(exp)?));
                }
                let mut steps = Vec::new();
                for step in &from.steps {
                    match step {
                        FromStep::Where(e) => steps.push(core::FromStep::Where(self.expr(e)?)),
                        FromStep::Group { keys, aggregates } => {
                            let mut keys_c: Vec<(String, core::Exp)> = keys
                                .iter()
                                .map(|(n, e)| Ok((n.clone(), self.expr(e)?)))
                                .collect::<Result<_, Error>>()?;
                            keys_c.sort_by(|(a, _), (b, _)| {
                                Label::new(a.clone()).cmp(&Label::new(b.clone()))
                            });
                            let mut aggs_c: Vec<core::Aggregate> = aggregates
                                .iter()
                                .map(|a| {
                                    let argument = a.argument.as_ref().ok_or_else(|| {
                                        internal("aggregate without materialised argument")
                                    })?;
                                    let func = self.expr(&a.func)?;
                                    let ty = match func.ty() {
                                        Type::Fn(_, r) => r.as_ref().clone(),
                                        other => {
                                            return Err(internal(format!(
                                                "aggregate with non-function type {}",
                                                other
                                            )))
                                        }
                                    };
                                    Ok(core::Aggregate {
                                        name: a.name.clone(),
                                        func,
                                        argument: self.expr(argument)?,
                                        ty,
                                    })
                                })
                                .collect::<Result<_, Error>>()?;
                            aggs_c.sort_by(|a, b| {
                                Label::new(a.name.clone()).cmp(&Label::new(b.name.clone()))
                            });
                            steps.push(core::FromStep::Group {
                                keys: keys_c,
                                aggregates: aggs_c,
                            });
                        }
                        FromStep::Order(items) => {
                            let items_c = items
                                .iter()
                                .map(|i| Ok((self.expr(&i.exp)?, i.direction)))
                                .collect::<Result<Vec<_>, Error>>()?;
                            steps.push(core::FromStep::Order(items_c));
                        }
                    }
                }
                let yield_exp = from
                    .yield_exp
                    .as_ref()
                    .ok_or_else(|| internal("from without materialised yield"))?;
                Ok(core::Exp::From(core::From {
                    sources,
                    steps,
                    yield_exp: Box::new(self.expr(yield_exp)?),
                    ty: from.info.clone(),
                }))
            }
        }
    }

    fn matches(&mut self, matches: &[Match<Type>]) -> Result<Vec<(core::Pat, core::Exp)>, Error> {
        matches
            .iter()
            .map(|m| Ok((self.pattern(&m.pat)?, self.expr(&m.exp)?)))
            .collect()
    }

    pub fn pattern(&mut self, pat: &Pattern<Type>) -> Result<core::Pat, Error> {
        match pat {
            Pattern::Id(p) => Ok(core::Pat::Id(core::IdPat {
                name: p.name.clone(),
                ty: p.info.clone(),
            })),
            Pattern::Literal(p) => Ok(core::Pat::Literal(core::LitPat {
                value: p.value.clone(),
                ty: p.info.clone(),
            })),
            Pattern::Wildcard(p) => Ok(core::Pat::Wildcard(core::WildcardPat {
                ty: p.info.clone(),
            })),
            Pattern::Con(p) => match &p.arg {
                None => Ok(core::Pat::Con0(core::Con0Pat {
                    name: p.name.clone(),
                    ty: p.info.clone(),
                })),
                Some(arg) => Ok(core::Pat::Con(core::ConPat {
                    name: p.name.clone(),
                    arg: Box::new(self.pattern(arg)?),
                    ty: p.info.clone(),
                })),
            },
            Pattern::Tuple(p) => Ok(core::Pat::Tuple(core::TuplePat {
                args: p
                    .args
                    .iter()
                    .map(|a| self.pattern(a))
                    .collect::<Result<_, _>>()?,
                ty: p.info.clone(),
            })),
            Pattern::List(p) => Ok(core::Pat::List(core::ListPat {
                args: p
                    .args
                    .iter()
                    .map(|a| self.pattern(a))
                    .collect::<Result<_, _>>()?,
                ty: p.info.clone(),
            })),
            Pattern::Cons(p) => {
                let head = self.pattern(&p.head)?;
                let tail = self.pattern(&p.tail)?;
                let pair_ty = Type::Tuple(vec![head.ty().clone(), tail.ty().clone()]);
                Ok(core::Pat::Con(core::ConPat {
                    name: core::CONS_NAME.to_string(),
                    arg: Box::new(core::Pat::Tuple(core::TuplePat {
                        args: vec![head, tail],
                        ty: pair_ty,
                    })),
                    ty: p.info.clone(),
                }))
            }
            Pattern::Record(p) => {
                // Expand to one sub-pattern per label of the record type,
                // in the type's label order, wildcards for omissions.
                let field_types = match &p.info {
                    Type::Record { fields, .. } => fields,
                    other => {
                        return Err(internal(format!(
                            "record pattern with non-record type {}",
                            other
                        )))
                    }
                };
                let mut fields = Vec::new();
                for (label, field_ty) in field_types {
                    let sub = p
                        .fields
                        .iter()
                        .find(|(l, _)| l == label.as_str())
                        .map(|(_, sub)| self.pattern(sub))
                        .transpose()?
                        .unwrap_or(core::Pat::Wildcard(core::WildcardPat {
                            ty: field_ty.clone(),
                        }));
                    fields.push((label.as_str().to_string(), sub));
                }
                Ok(core::Pat::Record(core::RecordPat {
                    fields,
                    ty: p.info.clone(),
                }))
            }
        }
    }

    /// `let d1; d2; ...; dn in e end` as a right-associated chain of
    /// single-declaration lets.
    fn flatten_let(
        &mut self,
        decls: &[Decl<Type>],
        body: &Expr<Type>,
        ty: &Type,
    ) -> Result<core::Exp, Error> {
        match decls.split_first() {
            None => self.expr(body),
            Some((first, rest)) => {
                let decl = self.decl(first)?;
                let rest_exp = self.flatten_let(rest, body, ty)?;
                Ok(core::Exp::Let(core::Let {
                    decl: Box::new(decl),
                    body: Box::new(rest_exp),
                    ty: ty.clone(),
                }))
            }
        }
    }
}

/// Merge simultaneous bindings, pairing tuple patterns with tuple
/// expressions component by component where possible.
fn flatten<'a>(
    pat: &'a Pattern<Type>,
    exp: &'a Expr<Type>,
    matches: &mut Vec<(&'a Pattern<Type>, &'a Expr<Type>)>,
) {
    if let (Pattern::Tuple(tuple_pat), Expr::Tuple(tuple_exp)) = (pat, exp) {
        if tuple_pat.args.len() == tuple_exp.args.len() {
            for (p, e) in tuple_pat.args.iter().zip(tuple_exp.args.iter()) {
                flatten(p, e, matches);
            }
            return;
        }
    }
    matches.push((pat, exp));
}

/// Zero-based slot of a label within a record or tuple type.
fn selector_slot(record_ty: &Type, label: &str, pos: Pos) -> Result<usize, Error> {
    match record_ty {
        Type::Record {
            partial: false,
            fields,
        } => fields
            .keys()
            .position(|l| l.as_str() == label)
            .ok_or_else(|| internal(format!("no field {} in {}", label, record_ty))),
        Type::Tuple(args) => {
            let index: usize = label
                .parse()
                .map_err(|_| internal(format!("no field {} in {}", label, record_ty)))?;
            if index == 0 || index > args.len() {
                return Err(internal(format!("no field {} in {}", label, record_ty)));
            }
            Ok(index - 1)
        }
        // The record never became concrete, so no slot can be assigned.
        _ => Err(Error::Type(TypeError::UnresolvedRecord { pos })),
    }
}

fn builtin_for(op: InfixOp) -> BuiltIn {
    match op {
        InfixOp::Plus => BuiltIn::OpPlus,
        InfixOp::Minus => BuiltIn::OpMinus,
        InfixOp::Times => BuiltIn::OpTimes,
        InfixOp::Divide => BuiltIn::OpDivide,
        InfixOp::Div => BuiltIn::OpDiv,
        InfixOp::Mod => BuiltIn::OpMod,
        InfixOp::Caret => BuiltIn::OpCaret,
        InfixOp::Cons => BuiltIn::OpCons,
        InfixOp::Eq => BuiltIn::OpEq,
        InfixOp::Ne => BuiltIn::OpNe,
        InfixOp::Lt => BuiltIn::OpLt,
        InfixOp::Gt => BuiltIn::OpGt,
        InfixOp::Le => BuiltIn::OpLe,
        InfixOp::Ge => BuiltIn::OpGe,
        InfixOp::Andalso => BuiltIn::ZAndalso,
        InfixOp::Orelse => BuiltIn::ZOrelse,
    }
}

fn internal(msg: impl Into<String>) -> Error {
    Error::Compile(CompileError::Invariant(msg.into()))
}
