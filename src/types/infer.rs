//! Hindley-Milner type inference over the surface AST.
//!
//! Algorithm W in the usual presentation: fresh variables for unknowns,
//! structural constraints discharged through unification, substitutions
//! composed outward. Generalisation happens only at `let` boundaries and
//! only for syntactic values (the value restriction); at top level,
//! leftover type variables default to `unit` so output is stable.
//!
//! The result of inference is the same AST with `T = Type`: every node's
//! `info` slot carries its inferred type, which doubles as the map from
//! nodes to types.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ast::decl::{
    DatatypeDecl, Decl, Statement, TyExpr, ValBind, ValDecl,
};
use crate::ast::expression::{
    Aggregate, Apply, Case, Expr, Fn as FnExpr, From, FromStep, Id, If, Infix, InfixOp, Let,
    ListExpr, Lit,
    Literal, Match, OrderItem, Record, RecordSelector, Tuple,
};
use crate::ast::pattern::{
    ConPat, ConsPat, IdPat, ListPat, LiteralPat, Pattern, RecordPat, TuplePat, WildcardPat,
};
use crate::ast::Pos;

use super::env::TypeEnv;
use super::error::TypeError;
use super::subst::Substitution;
use super::system::{substitute_temporary, DataTypeDef, TypeSystem};
use super::ty::{Label, Type, TypeScheme, TypeVar, BOOL, CHAR, INT, REAL, STRING, UNIT};
use super::unify::unify;

pub struct Infer<'a> {
    next_var: usize,
    types: &'a mut TypeSystem,
}

impl<'a> Infer<'a> {
    pub fn new(types: &'a mut TypeSystem) -> Self {
        Infer { next_var: 0, types }
    }

    fn fresh_var(&mut self) -> TypeVar {
        let id = self.next_var;
        self.next_var += 1;
        TypeVar::new(id)
    }

    fn fresh(&mut self) -> Type {
        Type::Var(self.fresh_var())
    }

    fn instantiate(&mut self, scheme: &TypeScheme) -> Type {
        let subst = Substitution(
            scheme
                .vars
                .iter()
                .map(|v| (v.clone(), self.fresh()))
                .collect(),
        );
        subst.apply(&scheme.ty)
    }

    fn generalize(&self, env: &TypeEnv, ty: &Type) -> TypeScheme {
        let free_in_env = env.free_type_vars();
        let free_in_ty = ty.free_type_vars();
        let mut vars: Vec<_> = free_in_ty.difference(&free_in_env).cloned().collect();
        vars.sort_by_key(|v| v.id);
        TypeScheme::polymorphic(vars, ty.clone())
    }

    fn unify_at(&self, t1: &Type, t2: &Type, pos: Pos) -> Result<Substitution, TypeError> {
        unify(t1, t2).map_err(|e| TypeError::from_unify_error(e, pos))
    }

    /// Infer a top-level statement. Expressions and declarations share the
    /// same path; the caller has already wrapped bare expressions in
    /// `val it = ...`.
    pub fn statement(
        &mut self,
        env: &TypeEnv,
        statement: &Statement<()>,
    ) -> Result<Statement<Type>, TypeError> {
        match statement {
            Statement::Expr(e) => {
                let (s, typed) = self.infer_expr(env, e)?;
                Ok(Statement::Expr(map::expr(typed, &|t| {
                    default_type(&s.apply(t))
                })))
            }
            Statement::Decl(d) => Ok(Statement::Decl(self.decl(env, d)?)),
        }
    }

    /// Infer a top-level declaration, apply the final substitution
    /// throughout, default leftover type variables to `unit`, and reject
    /// bindings whose type still contains a partial record.
    pub fn decl(&mut self, env: &TypeEnv, decl: &Decl<()>) -> Result<Decl<Type>, TypeError> {
        match decl {
            Decl::Val(d) => {
                let (s, typed, _) = self.val_decl(env, d, false)?;
                let typed = map::val_decl(typed, &|t| default_type(&s.apply(t)));
                for bind in &typed.binds {
                    if bind.pat.info().has_partial_record() {
                        return Err(TypeError::UnresolvedRecord {
                            pos: bind.position,
                        });
                    }
                }
                Ok(Decl::Val(typed))
            }
            Decl::Datatype(d) => {
                let (typed, _) = self.datatype_decl(env, d)?;
                Ok(Decl::Datatype(typed))
            }
        }
    }

    /// Value declaration. `generalize` is true only at `let` boundaries.
    /// Returns the substitution, the typed declaration and the environment
    /// extended with the new bindings.
    fn val_decl(
        &mut self,
        env: &TypeEnv,
        d: &ValDecl<()>,
        generalize: bool,
    ) -> Result<(Substitution, ValDecl<Type>, TypeEnv), TypeError> {
        let mut s = Substitution::empty();
        let mut typed_binds = Vec::new();
        let mut bound: Vec<(String, Type, bool)> = Vec::new();

        for bind in &d.binds {
            let (s_b, typed_bind, bindings) = if bind.rec {
                self.rec_bind(&env.apply_subst(&s), bind)?
            } else {
                self.nonrec_bind(&env.apply_subst(&s), bind)?
            };
            s = s_b.compose(&s);
            let value = is_syntactic_value(&bind.exp);
            bound.extend(bindings.into_iter().map(|(n, t)| (n, t, value)));
            typed_binds.push(typed_bind);
        }

        let mut env2 = env.apply_subst(&s);
        for (name, ty, value) in bound {
            let ty = s.apply(&ty);
            let scheme = if generalize && value {
                self.generalize(&env2, &ty)
            } else {
                TypeScheme::monomorphic(ty)
            };
            env2 = env2.extend(name, scheme);
        }

        let typed = ValDecl {
            binds: typed_binds,
            position: d.position,
            info: UNIT,
        };
        Ok((s, typed, env2))
    }

    fn nonrec_bind(
        &mut self,
        env: &TypeEnv,
        bind: &ValBind<()>,
    ) -> Result<(Substitution, ValBind<Type>, Vec<(String, Type)>), TypeError> {
        let (s1, exp_t) = self.infer_expr(env, &bind.exp)?;
        let exp_ty = exp_t.info().clone();
        let (s2, pat_t, bindings) = self.pattern(&bind.pat, &s1.apply(&exp_ty))?;
        let s = s2.compose(&s1);
        Ok((
            s,
            ValBind {
                rec: false,
                pat: pat_t,
                exp: exp_t,
                position: bind.position,
            },
            bindings,
        ))
    }

    /// For `val rec`, the pattern's names are in scope while the right-hand
    /// side is inferred.
    fn rec_bind(
        &mut self,
        env: &TypeEnv,
        bind: &ValBind<()>,
    ) -> Result<(Substitution, ValBind<Type>, Vec<(String, Type)>), TypeError> {
        let rhs_ty = self.fresh();
        let (s1, pat_t, bindings) = self.pattern(&bind.pat, &rhs_ty)?;
        let mut env2 = env.apply_subst(&s1);
        for (name, ty) in &bindings {
            env2 = env2.extend(name.clone(), TypeScheme::monomorphic(s1.apply(ty)));
        }
        let (s2, exp_t) = self.infer_expr(&env2, &bind.exp)?;
        let s = s2.compose(&s1);
        let s3 = self.unify_at(&s.apply(exp_t.info()), &s.apply(&rhs_ty), bind.position)?;
        let s = s3.compose(&s);
        Ok((
            s,
            ValBind {
                rec: true,
                pat: pat_t,
                exp: exp_t,
                position: bind.position,
            },
            bindings,
        ))
    }

    // Datatype declarations.

    fn datatype_decl(
        &mut self,
        env: &TypeEnv,
        d: &DatatypeDecl<()>,
    ) -> Result<(DatatypeDecl<Type>, TypeEnv), TypeError> {
        let group: HashSet<String> = d.binds.iter().map(|b| b.name.clone()).collect();
        let mut defs = Vec::new();

        for bind in &d.binds {
            let vars: Vec<TypeVar> = bind
                .vars
                .iter()
                .map(|name| {
                    let id = self.next_var;
                    self.next_var += 1;
                    TypeVar::with_name(id, name.clone())
                })
                .collect();
            let var_map: HashMap<String, Type> = bind
                .vars
                .iter()
                .cloned()
                .zip(vars.iter().cloned().map(Type::Var))
                .collect();
            let mut constructors = BTreeMap::new();
            for (con, arg) in &bind.constructors {
                let arg_ty = match arg {
                    Some(t) => Some(self.ty_expr(t, &var_map, &group, bind.position)?),
                    None => None,
                };
                constructors.insert(con.clone(), arg_ty);
            }
            defs.push(DataTypeDef {
                name: bind.name.clone(),
                vars,
                constructors,
            });
        }

        // Replace every placeholder with the finished type throughout the
        // constructor argument types, then register.
        let replacements: HashMap<String, Type> = defs
            .iter()
            .map(|def| (def.name.clone(), def.instance()))
            .collect();
        let mut env2 = env.clone();
        for mut def in defs {
            for arg in def.constructors.values_mut() {
                if let Some(t) = arg {
                    *t = substitute_temporary(t, &replacements);
                }
            }
            let names: Vec<String> = def.constructors.keys().cloned().collect();
            self.types.define(def);
            for con in names {
                let scheme = self
                    .types
                    .constructor_scheme(&con)
                    .expect("constructor registered above");
                env2 = env2.extend(con, scheme);
            }
        }

        let typed = DatatypeDecl {
            binds: d.binds.clone(),
            position: d.position,
            info: UNIT,
        };
        Ok((typed, env2))
    }

    fn ty_expr(
        &mut self,
        t: &TyExpr,
        vars: &HashMap<String, Type>,
        group: &HashSet<String>,
        pos: Pos,
    ) -> Result<Type, TypeError> {
        match t {
            TyExpr::Var(name) => vars.get(name).cloned().ok_or_else(|| TypeError::UnknownType {
                name: format!("'{}", name),
                pos,
            }),
            TyExpr::Con(name, args) => {
                let args = args
                    .iter()
                    .map(|a| self.ty_expr(a, vars, group, pos))
                    .collect::<Result<Vec<_>, _>>()?;
                match (name.as_str(), args.len()) {
                    ("unit", 0) => Ok(UNIT),
                    ("bool", 0) => Ok(BOOL),
                    ("char", 0) => Ok(CHAR),
                    ("int", 0) => Ok(INT),
                    ("real", 0) => Ok(REAL),
                    ("string", 0) => Ok(STRING),
                    ("list", 1) => Ok(Type::list(args.into_iter().next().unwrap())),
                    _ if group.contains(name) => Ok(Type::Temporary(name.clone())),
                    _ if self.types.is_datatype(name) => Ok(Type::Named(args, name.clone())),
                    _ => Err(TypeError::UnknownType {
                        name: name.clone(),
                        pos,
                    }),
                }
            }
            TyExpr::Tuple(args) => Ok(Type::Tuple(
                args.iter()
                    .map(|a| self.ty_expr(a, vars, group, pos))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            TyExpr::Record(fields) => Ok(Type::Record {
                partial: false,
                fields: fields
                    .iter()
                    .map(|(l, a)| Ok((Label::new(l.clone()), self.ty_expr(a, vars, group, pos)?)))
                    .collect::<Result<BTreeMap<_, _>, TypeError>>()?,
            }),
            TyExpr::Fn(p, r) => Ok(Type::fn_of(
                self.ty_expr(p, vars, group, pos)?,
                self.ty_expr(r, vars, group, pos)?,
            )),
        }
    }

    // Expressions.

    pub fn infer_expr(
        &mut self,
        env: &TypeEnv,
        expr: &Expr<()>,
    ) -> Result<(Substitution, Expr<Type>), TypeError> {
        match expr {
            Expr::Literal(lit) => Ok((
                Substitution::empty(),
                Expr::Literal(Literal {
                    value: lit.value.clone(),
                    position: lit.position,
                    info: lit_type(&lit.value),
                }),
            )),

            Expr::Id(id) => {
                let scheme = env
                    .lookup(&id.name)
                    .ok_or_else(|| TypeError::unbound_variable(&id.name, id.position))?
                    .clone();
                let ty = self.instantiate(&scheme);
                Ok((
                    Substitution::empty(),
                    Expr::Id(Id {
                        name: id.name.clone(),
                        position: id.position,
                        info: ty,
                    }),
                ))
            }

            Expr::RecordSelector(sel) => {
                let field = self.fresh();
                let record = Type::Record {
                    partial: true,
                    fields: [(Label::new(sel.label.clone()), field.clone())]
                        .into_iter()
                        .collect(),
                };
                Ok((
                    Substitution::empty(),
                    Expr::RecordSelector(RecordSelector {
                        label: sel.label.clone(),
                        position: sel.position,
                        info: Type::fn_of(record, field),
                    }),
                ))
            }

            Expr::Tuple(tuple) => {
                let mut s = Substitution::empty();
                let mut args = Vec::new();
                for arg in &tuple.args {
                    let (s1, arg_t) = self.infer_expr(&env.apply_subst(&s), arg)?;
                    s = s1.compose(&s);
                    args.push(arg_t);
                }
                let ty = Type::Tuple(args.iter().map(|a| s.apply(a.info())).collect());
                Ok((
                    s,
                    Expr::Tuple(Tuple {
                        args,
                        position: tuple.position,
                        info: ty,
                    }),
                ))
            }

            Expr::Record(record) => {
                let mut s = Substitution::empty();
                let mut fields = Vec::new();
                let mut field_types = BTreeMap::new();
                for (label, exp) in &record.fields {
                    let (s1, exp_t) = self.infer_expr(&env.apply_subst(&s), exp)?;
                    s = s1.compose(&s);
                    if field_types
                        .insert(Label::new(label.clone()), s.apply(exp_t.info()))
                        .is_some()
                    {
                        return Err(TypeError::DuplicateBinding {
                            name: label.clone(),
                            pos: record.position,
                        });
                    }
                    fields.push((label.clone(), exp_t));
                }
                Ok((
                    s,
                    Expr::Record(Record {
                        fields,
                        position: record.position,
                        info: Type::Record {
                            partial: false,
                            fields: field_types,
                        },
                    }),
                ))
            }

            Expr::List(list) => {
                let elem = self.fresh();
                let mut s = Substitution::empty();
                let mut args = Vec::new();
                for arg in &list.args {
                    let (s1, arg_t) = self.infer_expr(&env.apply_subst(&s), arg)?;
                    s = s1.compose(&s);
                    let s2 = self.unify_at(&s.apply(arg_t.info()), &s.apply(&elem), arg.position())?;
                    s = s2.compose(&s);
                    args.push(arg_t);
                }
                Ok((
                    s.clone(),
                    Expr::List(ListExpr {
                        args,
                        position: list.position,
                        info: Type::list(s.apply(&elem)),
                    }),
                ))
            }

            Expr::If(if_) => {
                let (s1, cond_t) = self.infer_expr(env, &if_.condition)?;
                let s2 = self.unify_at(&s1.apply(cond_t.info()), &BOOL, if_.condition.position())?;
                let mut s = s2.compose(&s1);
                let (s3, true_t) = self.infer_expr(&env.apply_subst(&s), &if_.if_true)?;
                s = s3.compose(&s);
                let (s4, false_t) = self.infer_expr(&env.apply_subst(&s), &if_.if_false)?;
                s = s4.compose(&s);
                let s5 = self.unify_at(
                    &s.apply(true_t.info()),
                    &s.apply(false_t.info()),
                    if_.position,
                )?;
                s = s5.compose(&s);
                let ty = s.apply(true_t.info());
                Ok((
                    s,
                    Expr::If(If {
                        condition: Box::new(cond_t),
                        if_true: Box::new(true_t),
                        if_false: Box::new(false_t),
                        position: if_.position,
                        info: ty,
                    }),
                ))
            }

            Expr::Case(case) => {
                let (s1, exp_t) = self.infer_expr(env, &case.exp)?;
                let scrut_ty = exp_t.info().clone();
                let result = self.fresh();
                let (s, matches) =
                    self.matches(env, &case.matches, &scrut_ty, &result, s1)?;
                let ty = s.apply(&result);
                Ok((
                    s,
                    Expr::Case(Case {
                        exp: Box::new(exp_t),
                        matches,
                        position: case.position,
                        info: ty,
                    }),
                ))
            }

            Expr::Fn(fn_) => {
                let param = self.fresh();
                let result = self.fresh();
                let (s, matches) = self.matches(
                    env,
                    &fn_.matches,
                    &param,
                    &result,
                    Substitution::empty(),
                )?;
                let ty = Type::fn_of(s.apply(&param), s.apply(&result));
                Ok((
                    s,
                    Expr::Fn(FnExpr {
                        matches,
                        position: fn_.position,
                        info: ty,
                    }),
                ))
            }

            Expr::Let(let_) => {
                let mut s = Substitution::empty();
                let mut env2 = env.clone();
                let mut decls = Vec::new();
                for decl in &let_.decls {
                    match decl {
                        Decl::Val(d) => {
                            let (s1, typed, env3) = self.val_decl(&env2, d, true)?;
                            s = s1.compose(&s);
                            env2 = env3;
                            decls.push(Decl::Val(typed));
                        }
                        Decl::Datatype(d) => {
                            let (typed, env3) = self.datatype_decl(&env2, d)?;
                            env2 = env3;
                            decls.push(Decl::Datatype(typed));
                        }
                    }
                }
                let (s2, body_t) = self.infer_expr(&env2.apply_subst(&s), &let_.body)?;
                s = s2.compose(&s);
                let ty = s.apply(body_t.info());
                Ok((
                    s,
                    Expr::Let(Let {
                        decls,
                        body: Box::new(body_t),
                        position: let_.position,
                        info: ty,
                    }),
                ))
            }

            Expr::Apply(apply) => {
                let (s1, func_t) = self.infer_expr(env, &apply.func)?;
                let (s2, arg_t) = self.infer_expr(&env.apply_subst(&s1), &apply.arg)?;
                let mut s = s2.compose(&s1);
                let result = self.fresh();
                let expected = Type::fn_of(s.apply(arg_t.info()), result.clone());
                let s3 = self.unify_at(&s.apply(func_t.info()), &expected, apply.position)?;
                s = s3.compose(&s);
                let ty = s.apply(&result);
                Ok((
                    s,
                    Expr::Apply(Apply {
                        func: Box::new(func_t),
                        arg: Box::new(arg_t),
                        position: apply.position,
                        info: ty,
                    }),
                ))
            }

            Expr::Infix(infix) => self.infix(env, infix),

            Expr::From(from) => self.from(env, from),
        }
    }

    /// Operator typing. Arithmetic is overloaded over `int` and `real`;
    /// an operand whose type is still unconstrained defaults to `int`.
    fn infix(
        &mut self,
        env: &TypeEnv,
        infix: &Infix<()>,
    ) -> Result<(Substitution, Expr<Type>), TypeError> {
        let (s1, lhs_t) = self.infer_expr(env, &infix.lhs)?;
        let (s2, rhs_t) = self.infer_expr(&env.apply_subst(&s1), &infix.rhs)?;
        let mut s = s2.compose(&s1);
        let pos = infix.position;

        let ty = match infix.op {
            InfixOp::Plus | InfixOp::Minus | InfixOp::Times => {
                let s3 =
                    self.unify_at(&s.apply(lhs_t.info()), &s.apply(rhs_t.info()), pos)?;
                s = s3.compose(&s);
                let operand = s.apply(lhs_t.info());
                match operand {
                    Type::Primitive(p)
                        if p == super::ty::Prim::Int || p == super::ty::Prim::Real =>
                    {
                        operand
                    }
                    Type::Var(_) => {
                        let s4 = self.unify_at(&operand, &INT, pos)?;
                        s = s4.compose(&s);
                        INT
                    }
                    other => {
                        return Err(TypeError::TypeMismatch {
                            expected: "int".to_string(),
                            found: other.description(),
                            pos,
                        })
                    }
                }
            }
            InfixOp::Divide => {
                let s3 = self.unify_at(&s.apply(lhs_t.info()), &REAL, pos)?;
                s = s3.compose(&s);
                let s4 = self.unify_at(&s.apply(rhs_t.info()), &REAL, pos)?;
                s = s4.compose(&s);
                REAL
            }
            InfixOp::Div | InfixOp::Mod => {
                let s3 = self.unify_at(&s.apply(lhs_t.info()), &INT, pos)?;
                s = s3.compose(&s);
                let s4 = self.unify_at(&s.apply(rhs_t.info()), &INT, pos)?;
                s = s4.compose(&s);
                INT
            }
            InfixOp::Caret => {
                let s3 = self.unify_at(&s.apply(lhs_t.info()), &STRING, pos)?;
                s = s3.compose(&s);
                let s4 = self.unify_at(&s.apply(rhs_t.info()), &STRING, pos)?;
                s = s4.compose(&s);
                STRING
            }
            InfixOp::Cons => {
                let elem = self.fresh();
                let s3 = self.unify_at(&s.apply(lhs_t.info()), &s.apply(&elem), pos)?;
                s = s3.compose(&s);
                let s4 = self.unify_at(
                    &s.apply(rhs_t.info()),
                    &Type::list(s.apply(&elem)),
                    pos,
                )?;
                s = s4.compose(&s);
                s.apply(&Type::list(elem))
            }
            InfixOp::Eq | InfixOp::Ne => {
                let s3 =
                    self.unify_at(&s.apply(lhs_t.info()), &s.apply(rhs_t.info()), pos)?;
                s = s3.compose(&s);
                BOOL
            }
            InfixOp::Lt | InfixOp::Gt | InfixOp::Le | InfixOp::Ge => {
                let s3 =
                    self.unify_at(&s.apply(lhs_t.info()), &s.apply(rhs_t.info()), pos)?;
                s = s3.compose(&s);
                let operand = s.apply(lhs_t.info());
                match operand {
                    Type::Primitive(p)
                        if matches!(
                            p,
                            super::ty::Prim::Int
                                | super::ty::Prim::Real
                                | super::ty::Prim::String
                                | super::ty::Prim::Char
                        ) => {}
                    Type::Var(_) => {
                        let s4 = self.unify_at(&operand, &INT, pos)?;
                        s = s4.compose(&s);
                    }
                    other => {
                        return Err(TypeError::TypeMismatch {
                            expected: "int".to_string(),
                            found: other.description(),
                            pos,
                        })
                    }
                }
                BOOL
            }
            InfixOp::Andalso | InfixOp::Orelse => {
                let s3 = self.unify_at(&s.apply(lhs_t.info()), &BOOL, pos)?;
                s = s3.compose(&s);
                let s4 = self.unify_at(&s.apply(rhs_t.info()), &BOOL, pos)?;
                s = s4.compose(&s);
                BOOL
            }
        };

        Ok((
            s,
            Expr::Infix(Infix {
                op: infix.op,
                lhs: Box::new(lhs_t),
                rhs: Box::new(rhs_t),
                position: pos,
                info: ty,
            }),
        ))
    }

    fn matches(
        &mut self,
        env: &TypeEnv,
        matches: &[Match<()>],
        scrut_ty: &Type,
        result_ty: &Type,
        mut s: Substitution,
    ) -> Result<(Substitution, Vec<Match<Type>>), TypeError> {
        let mut typed = Vec::new();
        for m in matches {
            let (s1, pat_t, bindings) = self.pattern(&m.pat, &s.apply(scrut_ty))?;
            s = s1.compose(&s);
            let mut env2 = env.apply_subst(&s);
            for (name, ty) in bindings {
                env2 = env2.extend(name, TypeScheme::monomorphic(s.apply(&ty)));
            }
            let (s2, exp_t) = self.infer_expr(&env2, &m.exp)?;
            s = s2.compose(&s);
            let s3 = self.unify_at(&s.apply(exp_t.info()), &s.apply(result_ty), m.position)?;
            s = s3.compose(&s);
            typed.push(Match {
                pat: pat_t,
                exp: exp_t,
                position: m.position,
            });
        }
        Ok((s, typed))
    }

    // Patterns.

    /// Infer a pattern against an expected type. Returns the typed pattern
    /// and the names it binds, in left-to-right order. A name may not be
    /// bound twice in one pattern.
    fn pattern(
        &mut self,
        pat: &Pattern<()>,
        expected: &Type,
    ) -> Result<(Substitution, Pattern<Type>, Vec<(String, Type)>), TypeError> {
        let mut seen = HashSet::new();
        let mut bindings = Vec::new();
        let (s, typed) = self.pattern_rec(pat, expected, &mut seen, &mut bindings)?;
        let bindings = bindings
            .into_iter()
            .map(|(n, t)| (n, s.apply(&t)))
            .collect();
        Ok((s, typed, bindings))
    }

    fn pattern_rec(
        &mut self,
        pat: &Pattern<()>,
        expected: &Type,
        seen: &mut HashSet<String>,
        bindings: &mut Vec<(String, Type)>,
    ) -> Result<(Substitution, Pattern<Type>), TypeError> {
        match pat {
            Pattern::Wildcard(w) => Ok((
                Substitution::empty(),
                Pattern::Wildcard(WildcardPat {
                    position: w.position,
                    info: expected.clone(),
                }),
            )),

            Pattern::Literal(lit) => {
                let s = self.unify_at(expected, &lit_type(&lit.value), lit.position)?;
                Ok((
                    s,
                    Pattern::Literal(LiteralPat {
                        value: lit.value.clone(),
                        position: lit.position,
                        info: expected.clone(),
                    }),
                ))
            }

            Pattern::Id(id) => {
                // An identifier naming a nullary constructor is a
                // constructor pattern, not a binding.
                if self.types.is_constructor(&id.name) {
                    return self.con_pattern(&id.name, None, id.position, expected, seen, bindings);
                }
                if !seen.insert(id.name.clone()) {
                    return Err(TypeError::DuplicateBinding {
                        name: id.name.clone(),
                        pos: id.position,
                    });
                }
                bindings.push((id.name.clone(), expected.clone()));
                Ok((
                    Substitution::empty(),
                    Pattern::Id(IdPat {
                        name: id.name.clone(),
                        position: id.position,
                        info: expected.clone(),
                    }),
                ))
            }

            Pattern::Con(con) => self.con_pattern(
                &con.name,
                con.arg.as_deref(),
                con.position,
                expected,
                seen,
                bindings,
            ),

            Pattern::Tuple(tuple) => {
                let elems: Vec<Type> = tuple.args.iter().map(|_| self.fresh()).collect();
                let mut s =
                    self.unify_at(expected, &Type::Tuple(elems.clone()), tuple.position)?;
                let mut args = Vec::new();
                for (arg, elem) in tuple.args.iter().zip(&elems) {
                    let (s1, arg_t) = self.pattern_rec(arg, &s.apply(elem), seen, bindings)?;
                    s = s1.compose(&s);
                    args.push(arg_t);
                }
                let ty = s.apply(&Type::Tuple(elems));
                Ok((
                    s,
                    Pattern::Tuple(TuplePat {
                        args,
                        position: tuple.position,
                        info: ty,
                    }),
                ))
            }

            Pattern::Record(record) => {
                let mut field_types = BTreeMap::new();
                let mut fresh_fields = Vec::new();
                for (label, _) in &record.fields {
                    let t = self.fresh();
                    if field_types
                        .insert(Label::new(label.clone()), t.clone())
                        .is_some()
                    {
                        return Err(TypeError::DuplicateBinding {
                            name: label.clone(),
                            pos: record.position,
                        });
                    }
                    fresh_fields.push(t);
                }
                let record_ty = Type::Record {
                    partial: record.ellipsis,
                    fields: field_types,
                };
                let mut s = self.unify_at(expected, &record_ty, record.position)?;
                let mut fields = Vec::new();
                for ((label, sub), fresh) in record.fields.iter().zip(&fresh_fields) {
                    let (s1, sub_t) = self.pattern_rec(sub, &s.apply(fresh), seen, bindings)?;
                    s = s1.compose(&s);
                    fields.push((label.clone(), sub_t));
                }
                // An ellipsis pattern that met a concrete record adopts it;
                // lowering then expands the omitted labels to wildcards.
                let resolved = s.apply(expected);
                let ty = match resolved {
                    Type::Record { partial: false, .. } => resolved,
                    _ => s.apply(&record_ty),
                };
                Ok((
                    s,
                    Pattern::Record(RecordPat {
                        fields,
                        ellipsis: record.ellipsis,
                        position: record.position,
                        info: ty,
                    }),
                ))
            }

            Pattern::List(list) => {
                let elem = self.fresh();
                let mut s =
                    self.unify_at(expected, &Type::list(elem.clone()), list.position)?;
                let mut args = Vec::new();
                for arg in &list.args {
                    let (s1, arg_t) = self.pattern_rec(arg, &s.apply(&elem), seen, bindings)?;
                    s = s1.compose(&s);
                    args.push(arg_t);
                }
                let ty = s.apply(&Type::list(elem));
                Ok((
                    s,
                    Pattern::List(ListPat {
                        args,
                        position: list.position,
                        info: ty,
                    }),
                ))
            }

            Pattern::Cons(cons) => {
                let elem = self.fresh();
                let mut s =
                    self.unify_at(expected, &Type::list(elem.clone()), cons.position)?;
                let (s1, head_t) = self.pattern_rec(&cons.head, &s.apply(&elem), seen, bindings)?;
                s = s1.compose(&s);
                let (s2, tail_t) =
                    self.pattern_rec(&cons.tail, &s.apply(&Type::list(elem.clone())), seen, bindings)?;
                s = s2.compose(&s);
                let ty = s.apply(&Type::list(elem));
                Ok((
                    s,
                    Pattern::Cons(ConsPat {
                        head: Box::new(head_t),
                        tail: Box::new(tail_t),
                        position: cons.position,
                        info: ty,
                    }),
                ))
            }
        }
    }

    fn con_pattern(
        &mut self,
        name: &str,
        arg: Option<&Pattern<()>>,
        pos: Pos,
        expected: &Type,
        seen: &mut HashSet<String>,
        bindings: &mut Vec<(String, Type)>,
    ) -> Result<(Substitution, Pattern<Type>), TypeError> {
        let scheme = self
            .types
            .constructor_scheme(name)
            .ok_or_else(|| TypeError::UnknownConstructor {
                name: name.to_string(),
                pos,
            })?;
        let con_ty = self.instantiate(&scheme);
        match (con_ty, arg) {
            (Type::Fn(arg_ty, result_ty), Some(sub)) => {
                let mut s = self.unify_at(expected, &result_ty, pos)?;
                let (s1, sub_t) = self.pattern_rec(sub, &s.apply(&arg_ty), seen, bindings)?;
                s = s1.compose(&s);
                let ty = s.apply(&result_ty);
                Ok((
                    s,
                    Pattern::Con(ConPat {
                        name: name.to_string(),
                        arg: Some(Box::new(sub_t)),
                        position: pos,
                        info: ty,
                    }),
                ))
            }
            (result_ty @ (Type::Named(_, _) | Type::Temporary(_)), None) => {
                let s = self.unify_at(expected, &result_ty, pos)?;
                let ty = s.apply(&result_ty);
                Ok((
                    s,
                    Pattern::Con(ConPat {
                        name: name.to_string(),
                        arg: None,
                        position: pos,
                        info: ty,
                    }),
                ))
            }
            _ => Err(TypeError::ConstructorArity {
                name: name.to_string(),
                pos,
            }),
        }
    }

    // `from` expressions.

    fn from(
        &mut self,
        env: &TypeEnv,
        from: &From<()>,
    ) -> Result<(Substitution, Expr<Type>), TypeError> {
        let mut s = Substitution::empty();
        let mut env2 = env.clone();
        // Names currently in scope for steps and yield, in order bound.
        let mut fields: Vec<(String, Type)> = Vec::new();
        let mut sources = Vec::new();

        for (pat, exp) in &from.sources {
            let (s1, exp_t) = self.infer_expr(&env2.apply_subst(&s), exp)?;
            s = s1.compose(&s);
            let elem = self.fresh();
            let s2 = self.unify_at(
                &s.apply(exp_t.info()),
                &Type::list(elem.clone()),
                exp.position(),
            )?;
            s = s2.compose(&s);
            let (s3, pat_t, bindings) = self.pattern(pat, &s.apply(&elem))?;
            s = s3.compose(&s);
            for (name, ty) in bindings {
                env2 = env2.extend(name.clone(), TypeScheme::monomorphic(s.apply(&ty)));
                fields.push((name, ty));
            }
            sources.push((pat_t, exp_t));
        }

        let mut steps = Vec::new();
        for step in &from.steps {
            match step {
                FromStep::Where(exp) => {
                    let (s1, exp_t) = self.infer_expr(&env2.apply_subst(&s), exp)?;
                    s = s1.compose(&s);
                    let s2 = self.unify_at(&s.apply(exp_t.info()), &BOOL, exp.position())?;
                    s = s2.compose(&s);
                    steps.push(FromStep::Where(exp_t));
                }
                FromStep::Group { keys, aggregates } => {
                    let mut new_fields = Vec::new();
                    let mut keys_t = Vec::new();
                    for (name, exp) in keys {
                        let (s1, exp_t) = self.infer_expr(&env2.apply_subst(&s), exp)?;
                        s = s1.compose(&s);
                        new_fields.push((name.clone(), s.apply(exp_t.info())));
                        keys_t.push((name.clone(), exp_t));
                    }
                    let mut aggs_t = Vec::new();
                    for agg in aggregates {
                        let arg_t = match &agg.argument {
                            Some(exp) => {
                                let (s1, exp_t) =
                                    self.infer_expr(&env2.apply_subst(&s), exp)?;
                                s = s1.compose(&s);
                                exp_t
                            }
                            // The default argument is the current row
                            // element: the single bound name, or the record
                            // of all bound names.
                            None => map::expr(default_row(&fields, from.position), &|t| {
                                s.apply(t)
                            }),
                        };
                        let (s2, func_t) = self.infer_expr(&env2.apply_subst(&s), &agg.func)?;
                        s = s2.compose(&s);
                        let result = self.fresh();
                        let expected = Type::fn_of(
                            Type::list(s.apply(arg_t.info())),
                            result.clone(),
                        );
                        let s3 =
                            self.unify_at(&s.apply(func_t.info()), &expected, from.position)?;
                        s = s3.compose(&s);
                        new_fields.push((agg.name.clone(), s.apply(&result)));
                        aggs_t.push(Aggregate {
                            name: agg.name.clone(),
                            func: func_t,
                            argument: Some(arg_t),
                        });
                    }
                    // A group step resets the visible bindings.
                    env2 = env.clone();
                    for (name, ty) in &new_fields {
                        env2 = env2.extend(name.clone(), TypeScheme::monomorphic(s.apply(ty)));
                    }
                    fields = new_fields;
                    steps.push(FromStep::Group {
                        keys: keys_t,
                        aggregates: aggs_t,
                    });
                }
                FromStep::Order(items) => {
                    let mut items_t = Vec::new();
                    for item in items {
                        let (s1, exp_t) = self.infer_expr(&env2.apply_subst(&s), &item.exp)?;
                        s = s1.compose(&s);
                        items_t.push(OrderItem {
                            exp: exp_t,
                            direction: item.direction,
                        });
                    }
                    steps.push(FromStep::Order(items_t));
                }
            }
        }

        let yield_t = match &from.yield_exp {
            Some(exp) => {
                let (s1, exp_t) = self.infer_expr(&env2.apply_subst(&s), exp)?;
                s = s1.compose(&s);
                exp_t
            }
            None => map::expr(default_row(&fields, from.position), &|t| s.apply(t)),
        };
        let ty = Type::list(s.apply(yield_t.info()));
        Ok((
            s,
            Expr::From(From {
                sources,
                steps,
                yield_exp: Some(Box::new(yield_t)),
                position: from.position,
                info: ty,
            }),
        ))
    }
}

fn lit_type(value: &Lit) -> Type {
    match value {
        Lit::Unit => UNIT,
        Lit::Bool(_) => BOOL,
        Lit::Char(_) => CHAR,
        Lit::Int(_) => INT,
        Lit::Real(_) => REAL,
        Lit::String(_) => STRING,
    }
}

/// The implicit row value: a lone binding is itself, several bindings form
/// a record over their names.
fn default_row(fields: &[(String, Type)], pos: Pos) -> Expr<Type> {
    if fields.len() == 1 {
        let (name, ty) = &fields[0];
        Expr::Id(Id {
            name: name.clone(),
            position: pos,
            info: ty.clone(),
        })
    } else {
        let field_types: BTreeMap<Label, Type> = fields
            .iter()
            .map(|(n, t)| (Label::new(n.clone()), t.clone()))
            .collect();
        Expr::Record(Record {
            fields: fields
                .iter()
                .map(|(n, t)| {
                    (
                        n.clone(),
                        Expr::Id(Id {
                            name: n.clone(),
                            position: pos,
                            info: t.clone(),
                        }),
                    )
                })
                .collect(),
            position: pos,
            info: Type::Record {
                partial: false,
                fields: field_types,
            },
        })
    }
}

/// Only syntactic values may be generalised.
fn is_syntactic_value(expr: &Expr<()>) -> bool {
    match expr {
        Expr::Literal(_) | Expr::Id(_) | Expr::Fn(_) | Expr::RecordSelector(_) => true,
        Expr::Tuple(t) => t.args.iter().all(is_syntactic_value),
        Expr::Record(r) => r.fields.iter().all(|(_, e)| is_syntactic_value(e)),
        Expr::List(l) => l.args.iter().all(is_syntactic_value),
        _ => false,
    }
}

/// Replace every remaining type variable with `unit`.
fn default_type(ty: &Type) -> Type {
    match ty {
        Type::Var(_) => UNIT,
        Type::Primitive(_) | Type::Temporary(_) => ty.clone(),
        Type::Fn(t1, t2) => Type::fn_of(default_type(t1), default_type(t2)),
        Type::Tuple(ts) => Type::Tuple(ts.iter().map(default_type).collect()),
        Type::Record { partial, fields } => Type::Record {
            partial: *partial,
            fields: fields
                .iter()
                .map(|(l, t)| (l.clone(), default_type(t)))
                .collect(),
        },
        Type::List(t) => Type::list(default_type(t)),
        Type::Named(args, name) => {
            Type::Named(args.iter().map(default_type).collect(), name.clone())
        }
    }
}

/// Walkers that rewrite every `info` type in a typed tree.
mod map {
    use super::*;

    pub fn val_decl(d: ValDecl<Type>, f: &impl Fn(&Type) -> Type) -> ValDecl<Type> {
        ValDecl {
            binds: d
                .binds
                .into_iter()
                .map(|b| ValBind {
                    rec: b.rec,
                    pat: pattern(b.pat, f),
                    exp: expr(b.exp, f),
                    position: b.position,
                })
                .collect(),
            position: d.position,
            info: f(&d.info),
        }
    }

    pub fn decl(d: Decl<Type>, f: &impl Fn(&Type) -> Type) -> Decl<Type> {
        match d {
            Decl::Val(v) => Decl::Val(val_decl(v, f)),
            Decl::Datatype(dt) => Decl::Datatype(dt),
        }
    }

    pub fn expr(e: Expr<Type>, f: &impl Fn(&Type) -> Type) -> Expr<Type> {
        match e {
            Expr::Literal(n) => Expr::Literal(Literal {
                info: f(&n.info),
                ..n
            }),
            Expr::Id(n) => Expr::Id(Id {
                info: f(&n.info),
                ..n
            }),
            Expr::RecordSelector(n) => Expr::RecordSelector(RecordSelector {
                info: f(&n.info),
                ..n
            }),
            Expr::Tuple(n) => Expr::Tuple(Tuple {
                args: n.args.into_iter().map(|a| expr(a, f)).collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::Record(n) => Expr::Record(Record {
                fields: n
                    .fields
                    .into_iter()
                    .map(|(l, a)| (l, expr(a, f)))
                    .collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::List(n) => Expr::List(ListExpr {
                args: n.args.into_iter().map(|a| expr(a, f)).collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::If(n) => Expr::If(If {
                condition: Box::new(expr(*n.condition, f)),
                if_true: Box::new(expr(*n.if_true, f)),
                if_false: Box::new(expr(*n.if_false, f)),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::Case(n) => Expr::Case(Case {
                exp: Box::new(expr(*n.exp, f)),
                matches: n.matches.into_iter().map(|m| match_(m, f)).collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::Fn(n) => Expr::Fn(FnExpr {
                matches: n.matches.into_iter().map(|m| match_(m, f)).collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::Let(n) => Expr::Let(Let {
                decls: n.decls.into_iter().map(|d| decl(d, f)).collect(),
                body: Box::new(expr(*n.body, f)),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::Apply(n) => Expr::Apply(Apply {
                func: Box::new(expr(*n.func, f)),
                arg: Box::new(expr(*n.arg, f)),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::Infix(n) => Expr::Infix(Infix {
                op: n.op,
                lhs: Box::new(expr(*n.lhs, f)),
                rhs: Box::new(expr(*n.rhs, f)),
                position: n.position,
                info: f(&n.info),
            }),
            Expr::From(n) => Expr::From(From {
                sources: n
                    .sources
                    .into_iter()
                    .map(|(p, e)| (pattern(p, f), expr(e, f)))
                    .collect(),
                steps: n
                    .steps
                    .into_iter()
                    .map(|step| match step {
                        FromStep::Where(e) => FromStep::Where(expr(e, f)),
                        FromStep::Group { keys, aggregates } => FromStep::Group {
                            keys: keys.into_iter().map(|(n, e)| (n, expr(e, f))).collect(),
                            aggregates: aggregates
                                .into_iter()
                                .map(|a| Aggregate {
                                    name: a.name,
                                    func: expr(a.func, f),
                                    argument: a.argument.map(|e| expr(e, f)),
                                })
                                .collect(),
                        },
                        FromStep::Order(items) => FromStep::Order(
                            items
                                .into_iter()
                                .map(|i| OrderItem {
                                    exp: expr(i.exp, f),
                                    direction: i.direction,
                                })
                                .collect(),
                        ),
                    })
                    .collect(),
                yield_exp: n.yield_exp.map(|y| Box::new(expr(*y, f))),
                position: n.position,
                info: f(&n.info),
            }),
        }
    }

    fn match_(m: Match<Type>, f: &impl Fn(&Type) -> Type) -> Match<Type> {
        Match {
            pat: pattern(m.pat, f),
            exp: expr(m.exp, f),
            position: m.position,
        }
    }

    pub fn pattern(p: Pattern<Type>, f: &impl Fn(&Type) -> Type) -> Pattern<Type> {
        match p {
            Pattern::Literal(n) => Pattern::Literal(LiteralPat {
                info: f(&n.info),
                ..n
            }),
            Pattern::Id(n) => Pattern::Id(IdPat {
                info: f(&n.info),
                ..n
            }),
            Pattern::Wildcard(n) => Pattern::Wildcard(WildcardPat {
                info: f(&n.info),
                position: n.position,
            }),
            Pattern::Con(n) => Pattern::Con(ConPat {
                name: n.name,
                arg: n.arg.map(|a| Box::new(pattern(*a, f))),
                position: n.position,
                info: f(&n.info),
            }),
            Pattern::Tuple(n) => Pattern::Tuple(TuplePat {
                args: n.args.into_iter().map(|a| pattern(a, f)).collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Pattern::Record(n) => Pattern::Record(RecordPat {
                fields: n
                    .fields
                    .into_iter()
                    .map(|(l, a)| (l, pattern(a, f)))
                    .collect(),
                ellipsis: n.ellipsis,
                position: n.position,
                info: f(&n.info),
            }),
            Pattern::List(n) => Pattern::List(ListPat {
                args: n.args.into_iter().map(|a| pattern(a, f)).collect(),
                position: n.position,
                info: f(&n.info),
            }),
            Pattern::Cons(n) => Pattern::Cons(ConsPat {
                head: Box::new(pattern(*n.head, f)),
                tail: Box::new(pattern(*n.tail, f)),
                position: n.position,
                info: f(&n.info),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;

    fn infer_one(expr: crate::ast::Expr<()>) -> Result<Expr<Type>, TypeError> {
        let mut types = TypeSystem::new();
        let mut infer = Infer::new(&mut types);
        let env = TypeEnv::empty();
        let (s, typed) = infer.infer_expr(&env, &expr)?;
        Ok(map::expr(typed, &|t| s.apply(t)))
    }

    #[test]
    fn test_infer_int_literal() {
        let typed = infer_one(int(42)).unwrap();
        assert_eq!(*typed.info(), INT);
    }

    #[test]
    fn test_infer_unbound_variable() {
        assert!(matches!(
            infer_one(id("x")),
            Err(TypeError::UnboundVariable { .. })
        ));
    }

    #[test]
    fn test_infer_identity_function() {
        let typed = infer_one(lambda("x", id("x"))).unwrap();
        match typed.info() {
            Type::Fn(t1, t2) => assert_eq!(t1, t2),
            other => panic!("expected function type, got {}", other),
        }
    }

    #[test]
    fn test_infer_application() {
        let typed = infer_one(apply(lambda("x", id("x")), int(42))).unwrap();
        assert_eq!(*typed.info(), INT);
    }

    #[test]
    fn test_infer_arithmetic_defaults_to_int() {
        let typed = infer_one(lambda("x", plus(id("x"), id("x")))).unwrap();
        assert_eq!(*typed.info(), Type::fn_of(INT, INT));
    }

    #[test]
    fn test_infer_list_homogeneous() {
        let typed = infer_one(list(vec![int(1), int(2)])).unwrap();
        assert_eq!(*typed.info(), Type::list(INT));
        assert!(infer_one(list(vec![int(1), string("two")])).is_err());
    }

    #[test]
    fn test_infer_if_branches_must_agree() {
        let ok = infer_one(if_then_else(bool_lit(true), int(1), int(2))).unwrap();
        assert_eq!(*ok.info(), INT);
        assert!(infer_one(if_then_else(bool_lit(true), int(1), string("x"))).is_err());
    }

    #[test]
    fn test_infer_record_and_selector() {
        let exp = apply(
            record_selector("a"),
            record(vec![("a", int(1)), ("b", string("x"))]),
        );
        let typed = infer_one(exp).unwrap();
        assert_eq!(*typed.info(), INT);
    }

    #[test]
    fn test_infer_let_polymorphism() {
        // let val id = fn x => x in (id 1, id "s") end
        let exp = let_in(
            vec![val(pat_id("id"), lambda("x", id("x")))],
            tuple(vec![
                apply(id("id"), int(1)),
                apply(id("id"), string("s")),
            ]),
        );
        let typed = infer_one(exp).unwrap();
        assert_eq!(*typed.info(), Type::Tuple(vec![INT, STRING]));
    }

    #[test]
    fn test_infer_cons_pattern() {
        // fn (x :: xs) => x, applied to an int list
        let exp = apply(
            fn_match(vec![(pat_cons(pat_id("x"), pat_id("xs")), id("x"))]),
            list(vec![int(10), int(20)]),
        );
        let typed = infer_one(exp).unwrap();
        assert_eq!(*typed.info(), INT);
    }

    #[test]
    fn test_infer_duplicate_pattern_binding_rejected() {
        let exp = fn_match(vec![(
            pat_tuple(vec![pat_id("x"), pat_id("x")]),
            id("x"),
        )]);
        assert!(matches!(
            infer_one(exp),
            Err(TypeError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn test_top_level_defaulting_to_unit() {
        let mut types = TypeSystem::new();
        let mut infer = Infer::new(&mut types);
        let env = TypeEnv::empty();
        let decl = val(pat_id("xs"), list(vec![]));
        let typed = infer.decl(&env, &decl).unwrap();
        match typed {
            Decl::Val(d) => {
                assert_eq!(*d.binds[0].pat.info(), Type::list(UNIT));
            }
            _ => panic!("expected val decl"),
        }
    }

    #[test]
    fn test_val_rec_factorial_type() {
        let mut types = TypeSystem::new();
        let mut infer = Infer::new(&mut types);
        let env = TypeEnv::empty();
        // val rec fact = fn 0 => 1 | n => n * fact (n - 1)
        let decl = val_rec(
            pat_id("fact"),
            fn_match(vec![
                (pat_int(0), int(1)),
                (
                    pat_id("n"),
                    times(id("n"), apply(id("fact"), minus(id("n"), int(1)))),
                ),
            ]),
        );
        let typed = infer.decl(&env, &decl).unwrap();
        match typed {
            Decl::Val(d) => assert_eq!(*d.binds[0].pat.info(), Type::fn_of(INT, INT)),
            _ => panic!("expected val decl"),
        }
    }

    #[test]
    fn test_datatype_declaration_and_constructors() {
        let mut types = TypeSystem::new();
        let mut infer = Infer::new(&mut types);
        let env = TypeEnv::empty();
        let decl = datatype(
            "option",
            vec!["a"],
            vec![("NONE", None), ("SOME", Some(ty_var("a")))],
        );
        infer.decl(&env, &decl).unwrap();
        assert!(types.is_constructor("SOME"));
        let scheme = types.constructor_scheme("SOME").unwrap();
        assert!(scheme.ty.is_fn());
        // Recursive datatype: the placeholder must not survive.
        let mut infer = Infer::new(&mut types);
        let tree = datatype(
            "tree",
            vec!["a"],
            vec![
                ("LEAF", None),
                (
                    "NODE",
                    Some(ty_tuple(vec![
                        ty_var("a"),
                        ty_con("tree", vec![ty_var("a")]),
                        ty_con("tree", vec![ty_var("a")]),
                    ])),
                ),
            ],
        );
        infer.decl(&env, &tree).unwrap();
        let (_, arg) = types.constructor("NODE").unwrap();
        fn no_temporary(t: &Type) -> bool {
            match t {
                Type::Temporary(_) => false,
                Type::Tuple(ts) => ts.iter().all(no_temporary),
                Type::Named(args, _) => args.iter().all(no_temporary),
                Type::List(t) | Type::Fn(_, t) => no_temporary(t),
                _ => true,
            }
        }
        assert!(no_temporary(&arg.unwrap()));
    }
}
