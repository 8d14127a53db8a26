//! The optimiser slot: use-count analysis and inlining of trivial
//! bindings, run as a fixpoint loop.
//!
//! A pass returns `None` when it leaves the declaration untouched, which
//! terminates the loop early; otherwise the loop runs up to the
//! configured number of passes. Only two rewrites are performed, both
//! semantics-preserving: a `let` binding a name to an atom (a literal, a
//! builtin literal or another name) is substituted into its body, and a
//! `let` whose binding is never used and whose right-hand side is a value
//! is dropped.

use crate::core::{
    Aggregate, Apply, Case, Decl, Exp, Fn, From, FromStep, Let, Pat, Tuple, ValDecl,
};

/// Run up to `passes` inline passes, stopping at the first fixpoint.
pub fn optimize(mut decl: Decl, passes: usize) -> Decl {
    for _ in 0..passes.max(1) {
        match pass(&decl) {
            Some(next) => decl = next,
            None => break,
        }
    }
    decl
}

/// One pass. `None` means the declaration came back unchanged.
fn pass(decl: &Decl) -> Option<Decl> {
    match decl {
        Decl::Datatype(_) => None,
        Decl::Val(d) => {
            let exp = exp_pass(&d.exp)?;
            Some(Decl::Val(ValDecl {
                rec: d.rec,
                pat: d.pat.clone(),
                exp,
            }))
        }
    }
}

/// True for expressions that are free to duplicate and reorder.
fn is_atom(exp: &Exp) -> bool {
    matches!(exp, Exp::Literal(_) | Exp::FnLiteral(_) | Exp::Id(_))
}

/// True for expressions whose evaluation has no effects, so an unused
/// binding of one can be dropped.
fn is_value(exp: &Exp) -> bool {
    match exp {
        Exp::Literal(_) | Exp::FnLiteral(_) | Exp::Id(_) | Exp::Fn(_)
        | Exp::RecordSelector(_) => true,
        Exp::Tuple(t) => t.args.iter().all(is_value),
        _ => false,
    }
}

fn exp_pass(exp: &Exp) -> Option<Exp> {
    // Rewrite bottom-up so one pass can collapse a whole chain of
    // aliases; `None` bubbles up only when nothing anywhere changed.
    let rebuilt = rebuild(exp);
    let target = rebuilt.as_ref().unwrap_or(exp);

    if let Exp::Let(let_) = target {
        if let Decl::Val(d) = let_.decl.as_ref() {
            if let Pat::Id(id) = &d.pat {
                if !d.rec && is_atom(&d.exp) {
                    return Some(substitute(&let_.body, &id.name, &d.exp));
                }
                if !d.rec && is_value(&d.exp) && count_uses(&let_.body, &id.name) == 0 {
                    return Some(let_.body.as_ref().clone());
                }
            }
        }
    }
    rebuilt
}

/// Rebuild with children passed through `exp_pass`; `None` if no child
/// changed.
fn rebuild(exp: &Exp) -> Option<Exp> {
    match exp {
        Exp::Literal(_) | Exp::FnLiteral(_) | Exp::Id(_) | Exp::RecordSelector(_) => None,
        Exp::Tuple(t) => {
            let args = pass_all(&t.args)?;
            Some(Exp::Tuple(Tuple {
                args,
                ty: t.ty.clone(),
            }))
        }
        Exp::Apply(a) => {
            let func = exp_pass(&a.func);
            let arg = exp_pass(&a.arg);
            if func.is_none() && arg.is_none() {
                return None;
            }
            Some(Exp::Apply(Apply {
                func: Box::new(func.unwrap_or_else(|| a.func.as_ref().clone())),
                arg: Box::new(arg.unwrap_or_else(|| a.arg.as_ref().clone())),
                ty: a.ty.clone(),
            }))
        }
        Exp::Fn(f) => {
            let matches = pass_matches(&f.matches)?;
            Some(Exp::Fn(Fn {
                matches,
                ty: f.ty.clone(),
            }))
        }
        Exp::Case(c) => {
            let scrutinee = exp_pass(&c.exp);
            let matches = pass_matches(&c.matches);
            if scrutinee.is_none() && matches.is_none() {
                return None;
            }
            Some(Exp::Case(Case {
                exp: Box::new(scrutinee.unwrap_or_else(|| c.exp.as_ref().clone())),
                matches: matches.unwrap_or_else(|| c.matches.clone()),
                ty: c.ty.clone(),
            }))
        }
        Exp::Let(l) => {
            let decl = match l.decl.as_ref() {
                Decl::Val(d) => exp_pass(&d.exp).map(|exp| {
                    Decl::Val(ValDecl {
                        rec: d.rec,
                        pat: d.pat.clone(),
                        exp,
                    })
                }),
                Decl::Datatype(_) => None,
            };
            let body = exp_pass(&l.body);
            if decl.is_none() && body.is_none() {
                return None;
            }
            Some(Exp::Let(Let {
                decl: Box::new(decl.unwrap_or_else(|| l.decl.as_ref().clone())),
                body: Box::new(body.unwrap_or_else(|| l.body.as_ref().clone())),
                ty: l.ty.clone(),
            }))
        }
        Exp::From(f) => {
            let mut changed = false;
            let sources = f
                .sources
                .iter()
                .map(|(p, e)| {
                    let e2 = exp_pass(e);
                    changed |= e2.is_some();
                    (p.clone(), e2.unwrap_or_else(|| e.clone()))
                })
                .collect();
            let steps = f
                .steps
                .iter()
                .map(|step| match step {
                    FromStep::Where(e) => {
                        let e2 = exp_pass(e);
                        changed |= e2.is_some();
                        FromStep::Where(e2.unwrap_or_else(|| e.clone()))
                    }
                    FromStep::Group { keys, aggregates } => FromStep::Group {
                        keys: keys
                            .iter()
                            .map(|(n, e)| {
                                let e2 = exp_pass(e);
                                changed |= e2.is_some();
                                (n.clone(), e2.unwrap_or_else(|| e.clone()))
                            })
                            .collect(),
                        aggregates: aggregates
                            .iter()
                            .map(|a| {
                                let func = exp_pass(&a.func);
                                let argument = exp_pass(&a.argument);
                                changed |= func.is_some() || argument.is_some();
                                Aggregate {
                                    name: a.name.clone(),
                                    func: func.unwrap_or_else(|| a.func.clone()),
                                    argument: argument.unwrap_or_else(|| a.argument.clone()),
                                    ty: a.ty.clone(),
                                }
                            })
                            .collect(),
                    },
                    FromStep::Order(items) => FromStep::Order(
                        items
                            .iter()
                            .map(|(e, d)| {
                                let e2 = exp_pass(e);
                                changed |= e2.is_some();
                                (e2.unwrap_or_else(|| e.clone()), *d)
                            })
                            .collect(),
                    ),
                })
                .collect();
            let yield_exp = exp_pass(&f.yield_exp);
            changed |= yield_exp.is_some();
            if !changed {
                return None;
            }
            Some(Exp::From(From {
                sources,
                steps,
                yield_exp: Box::new(yield_exp.unwrap_or_else(|| f.yield_exp.as_ref().clone())),
                ty: f.ty.clone(),
            }))
        }
    }
}

fn pass_all(exps: &[Exp]) -> Option<Vec<Exp>> {
    let passed: Vec<Option<Exp>> = exps.iter().map(exp_pass).collect();
    if passed.iter().all(Option::is_none) {
        return None;
    }
    Some(
        passed
            .into_iter()
            .zip(exps)
            .map(|(p, orig)| p.unwrap_or_else(|| orig.clone()))
            .collect(),
    )
}

fn pass_matches(matches: &[(Pat, Exp)]) -> Option<Vec<(Pat, Exp)>> {
    let passed: Vec<Option<Exp>> = matches.iter().map(|(_, e)| exp_pass(e)).collect();
    if passed.iter().all(Option::is_none) {
        return None;
    }
    Some(
        passed
            .into_iter()
            .zip(matches)
            .map(|(p, (pat, orig))| (pat.clone(), p.unwrap_or_else(|| orig.clone())))
            .collect(),
    )
}

/// Occurrences of `name` as a free identifier.
fn count_uses(exp: &Exp, name: &str) -> usize {
    match exp {
        Exp::Literal(_) | Exp::FnLiteral(_) | Exp::RecordSelector(_) => 0,
        Exp::Id(id) => usize::from(id.name == name),
        Exp::Tuple(t) => t.args.iter().map(|a| count_uses(a, name)).sum(),
        Exp::Apply(a) => count_uses(&a.func, name) + count_uses(&a.arg, name),
        Exp::Fn(f) => count_matches(&f.matches, name),
        Exp::Case(c) => count_uses(&c.exp, name) + count_matches(&c.matches, name),
        Exp::Let(l) => {
            let (decl_uses, shadowed) = match l.decl.as_ref() {
                Decl::Val(d) => (
                    count_uses(&d.exp, name),
                    d.pat.bound_names().iter().any(|(n, _)| n == name),
                ),
                Decl::Datatype(_) => (0, false),
            };
            if shadowed {
                decl_uses
            } else {
                decl_uses + count_uses(&l.body, name)
            }
        }
        Exp::From(f) => {
            let mut uses = 0;
            let mut shadowed = false;
            for (pat, e) in &f.sources {
                if !shadowed {
                    uses += count_uses(e, name);
                }
                shadowed |= pat.bound_names().iter().any(|(n, _)| n == name);
            }
            if !shadowed {
                for step in &f.steps {
                    match step {
                        FromStep::Where(e) => uses += count_uses(e, name),
                        FromStep::Group { keys, aggregates } => {
                            for (_, e) in keys {
                                uses += count_uses(e, name);
                            }
                            for a in aggregates {
                                uses += count_uses(&a.func, name)
                                    + count_uses(&a.argument, name);
                            }
                            // Group rebinds everything downstream.
                            return uses;
                        }
                        FromStep::Order(items) => {
                            for (e, _) in items {
                                uses += count_uses(e, name);
                            }
                        }
                    }
                }
                uses += count_uses(&f.yield_exp, name);
            }
            uses
        }
    }
}

fn count_matches(matches: &[(Pat, Exp)], name: &str) -> usize {
    matches
        .iter()
        .map(|(pat, e)| {
            if pat.bound_names().iter().any(|(n, _)| n == name) {
                0
            } else {
                count_uses(e, name)
            }
        })
        .sum()
}

/// Capture-avoiding substitution of an atom for a name.
fn substitute(exp: &Exp, name: &str, replacement: &Exp) -> Exp {
    match exp {
        Exp::Id(id) if id.name == name => replacement.clone(),
        Exp::Literal(_) | Exp::FnLiteral(_) | Exp::Id(_) | Exp::RecordSelector(_) => exp.clone(),
        Exp::Tuple(t) => Exp::Tuple(Tuple {
            args: t
                .args
                .iter()
                .map(|a| substitute(a, name, replacement))
                .collect(),
            ty: t.ty.clone(),
        }),
        Exp::Apply(a) => Exp::Apply(Apply {
            func: Box::new(substitute(&a.func, name, replacement)),
            arg: Box::new(substitute(&a.arg, name, replacement)),
            ty: a.ty.clone(),
        }),
        Exp::Fn(f) => Exp::Fn(Fn {
            matches: substitute_matches(&f.matches, name, replacement),
            ty: f.ty.clone(),
        }),
        Exp::Case(c) => Exp::Case(Case {
            exp: Box::new(substitute(&c.exp, name, replacement)),
            matches: substitute_matches(&c.matches, name, replacement),
            ty: c.ty.clone(),
        }),
        Exp::Let(l) => {
            let (decl, shadowed) = match l.decl.as_ref() {
                Decl::Val(d) => (
                    Decl::Val(ValDecl {
                        rec: d.rec,
                        pat: d.pat.clone(),
                        exp: substitute(&d.exp, name, replacement),
                    }),
                    d.pat.bound_names().iter().any(|(n, _)| n == name),
                ),
                Decl::Datatype(d) => (Decl::Datatype(d.clone()), false),
            };
            Exp::Let(Let {
                decl: Box::new(decl),
                body: Box::new(if shadowed {
                    l.body.as_ref().clone()
                } else {
                    substitute(&l.body, name, replacement)
                }),
                ty: l.ty.clone(),
            })
        }
        Exp::From(f) => {
            // Substitution stops at the first source pattern rebinding the
            // name; steps after a shadowing source keep the inner binding.
            let mut shadowed = false;
            let sources = f
                .sources
                .iter()
                .map(|(pat, e)| {
                    let e2 = if shadowed {
                        e.clone()
                    } else {
                        substitute(e, name, replacement)
                    };
                    shadowed |= pat.bound_names().iter().any(|(n, _)| n == name);
                    (pat.clone(), e2)
                })
                .collect();
            if shadowed {
                return Exp::From(From {
                    sources,
                    steps: f.steps.clone(),
                    yield_exp: f.yield_exp.clone(),
                    ty: f.ty.clone(),
                });
            }
            Exp::From(From {
                sources,
                steps: f
                    .steps
                    .iter()
                    .map(|step| match step {
                        FromStep::Where(e) => FromStep::Where(substitute(e, name, replacement)),
                        FromStep::Group { keys, aggregates } => FromStep::Group {
                            keys: keys
                                .iter()
                                .map(|(n, e)| (n.clone(), substitute(e, name, replacement)))
                                .collect(),
                            aggregates: aggregates
                                .iter()
                                .map(|a| Aggregate {
                                    name: a.name.clone(),
                                    func: substitute(&a.func, name, replacement),
                                    argument: substitute(&a.argument, name, replacement),
                                    ty: a.ty.clone(),
                                })
                                .collect(),
                        },
                        FromStep::Order(items) => FromStep::Order(
                            items
                                .iter()
                                .map(|(e, d)| (substitute(e, name, replacement), *d))
                                .collect(),
                        ),
                    })
                    .collect(),
                yield_exp: Box::new(substitute(&f.yield_exp, name, replacement)),
                ty: f.ty.clone(),
            })
        }
    }
}

fn substitute_matches(
    matches: &[(Pat, Exp)],
    name: &str,
    replacement: &Exp,
) -> Vec<(Pat, Exp)> {
    matches
        .iter()
        .map(|(pat, e)| {
            if pat.bound_names().iter().any(|(n, _)| n == name) {
                (pat.clone(), e.clone())
            } else {
                (pat.clone(), substitute(e, name, replacement))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expression::Lit;
    use crate::core::{Id, IdPat, Literal};
    use crate::types::ty::INT;

    fn int_lit(i: i64) -> Exp {
        Exp::Literal(Literal {
            value: Lit::Int(i),
            ty: INT,
        })
    }

    fn id(name: &str) -> Exp {
        Exp::Id(Id {
            name: name.to_string(),
            ty: INT,
        })
    }

    fn let_val(name: &str, rhs: Exp, body: Exp) -> Exp {
        Exp::Let(Let {
            decl: Box::new(Decl::Val(ValDecl {
                rec: false,
                pat: Pat::Id(IdPat {
                    name: name.to_string(),
                    ty: INT,
                }),
                exp: rhs,
            })),
            body: Box::new(body),
            ty: INT,
        })
    }

    #[test]
    fn test_inline_atomic_binding() {
        let decl = Decl::Val(ValDecl {
            rec: false,
            pat: Pat::Id(IdPat {
                name: "it".to_string(),
                ty: INT,
            }),
            exp: let_val("x", int_lit(3), id("x")),
        });
        let optimized = optimize(decl, 4);
        match optimized {
            Decl::Val(d) => assert_eq!(d.exp, int_lit(3)),
            _ => panic!("expected val decl"),
        }
    }

    #[test]
    fn test_fixpoint_returns_same_declaration() {
        let decl = Decl::Val(ValDecl {
            rec: false,
            pat: Pat::Id(IdPat {
                name: "it".to_string(),
                ty: INT,
            }),
            exp: int_lit(1),
        });
        assert!(pass(&decl).is_none());
        assert_eq!(optimize(decl.clone(), 4), decl);
    }

    #[test]
    fn test_alias_chain_collapses() {
        // let x = 1 in let y = x in y end end
        let exp = let_val("x", int_lit(1), let_val("y", id("x"), id("y")));
        let decl = Decl::Val(ValDecl {
            rec: false,
            pat: Pat::Id(IdPat {
                name: "it".to_string(),
                ty: INT,
            }),
            exp,
        });
        match optimize(decl, 4) {
            Decl::Val(d) => assert_eq!(d.exp, int_lit(1)),
            _ => panic!("expected val decl"),
        }
    }

    #[test]
    fn test_shadowing_blocks_substitution() {
        // let x = 1 in fn x => x end: the inner x must stay.
        let lambda = Exp::Fn(Fn {
            matches: vec![(
                Pat::Id(IdPat {
                    name: "x".to_string(),
                    ty: INT,
                }),
                id("x"),
            )],
            ty: crate::types::Type::fn_of(INT, INT),
        });
        let exp = let_val("x", int_lit(1), lambda.clone());
        let decl = Decl::Val(ValDecl {
            rec: false,
            pat: Pat::Id(IdPat {
                name: "it".to_string(),
                ty: crate::types::Type::fn_of(INT, INT),
            }),
            exp,
        });
        match optimize(decl, 4) {
            Decl::Val(d) => assert_eq!(d.exp, lambda),
            _ => panic!("expected val decl"),
        }
    }
}
