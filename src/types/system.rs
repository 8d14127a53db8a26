//! The type system: an insert-only interning table keyed by moniker plus
//! the datatype definitions declared so far.
//!
//! Recursive datatypes are built through a placeholder protocol. While a
//! `datatype` declaration is being processed its own name resolves to
//! `Type::Temporary`; once all constructor argument types exist, the
//! placeholder is substituted for the real `Type::Named` throughout via a
//! structural copy and the definition is registered. No placeholder
//! escapes the declaration that created it.
//!
//! A `TypeSystem` belongs to exactly one session; it is never shared
//! across concurrent sessions.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::ty::{Type, TypeScheme, TypeVar};

/// A datatype definition: its name, its type parameters, and the mapping
/// from constructor name to optional argument type. Immutable once the
/// defining declaration completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTypeDef {
    pub name: String,
    pub vars: Vec<TypeVar>,
    pub constructors: BTreeMap<String, Option<Type>>,
}

impl DataTypeDef {
    /// The type this definition denotes when applied to its own
    /// parameters, e.g. `'a option` for `option`.
    pub fn instance(&self) -> Type {
        Type::Named(
            self.vars.iter().cloned().map(Type::Var).collect(),
            self.name.clone(),
        )
    }
}

#[derive(Debug, Default)]
pub struct TypeSystem {
    /// Moniker to type, insert-only.
    interned: HashMap<String, Type>,
    datatypes: HashMap<String, Rc<DataTypeDef>>,
    /// Constructor name to owning datatype name.
    constructor_owners: HashMap<String, String>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type by its moniker. The table is insert-only; the first
    /// type registered under a moniker is the canonical one.
    pub fn intern(&mut self, ty: Type) -> Type {
        self.interned.entry(ty.moniker()).or_insert(ty).clone()
    }

    pub fn lookup(&self, moniker: &str) -> Option<&Type> {
        self.interned.get(moniker)
    }

    pub fn datatype(&self, name: &str) -> Option<&Rc<DataTypeDef>> {
        self.datatypes.get(name)
    }

    pub fn is_datatype(&self, name: &str) -> bool {
        self.datatypes.contains_key(name)
    }

    pub fn is_constructor(&self, name: &str) -> bool {
        self.constructor_owners.contains_key(name)
    }

    /// The datatype owning a constructor, with the constructor's argument
    /// type (in terms of the datatype's own variables).
    pub fn constructor(&self, name: &str) -> Option<(Rc<DataTypeDef>, Option<Type>)> {
        let owner = self.constructor_owners.get(name)?;
        let def = self.datatypes.get(owner)?;
        let arg = def.constructors.get(name)?;
        Some((Rc::clone(def), arg.clone()))
    }

    /// The polymorphic scheme of a constructor: `forall vars. arg -> dt`
    /// for unary constructors, `forall vars. dt` for nullary ones.
    pub fn constructor_scheme(&self, name: &str) -> Option<TypeScheme> {
        let (def, arg) = self.constructor(name)?;
        let result = def.instance();
        let ty = match arg {
            Some(arg_ty) => Type::fn_of(arg_ty, result),
            None => result,
        };
        Some(TypeScheme::polymorphic(def.vars.clone(), ty))
    }

    /// Register a finished datatype definition. The constructor argument
    /// types must no longer contain the declaration's placeholder.
    pub fn define(&mut self, def: DataTypeDef) {
        let def = Rc::new(def);
        for con in def.constructors.keys() {
            self.constructor_owners.insert(con.clone(), def.name.clone());
        }
        self.intern(def.instance());
        self.datatypes.insert(def.name.clone(), def);
    }
}

/// Structural copy replacing every `Temporary` placeholder that has an
/// entry in `replacements` with its finished type.
pub fn substitute_temporary(ty: &Type, replacements: &HashMap<String, Type>) -> Type {
    match ty {
        Type::Primitive(_) | Type::Var(_) => ty.clone(),
        Type::Temporary(name) => replacements
            .get(name)
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        Type::Fn(t1, t2) => Type::fn_of(
            substitute_temporary(t1, replacements),
            substitute_temporary(t2, replacements),
        ),
        Type::Tuple(ts) => Type::Tuple(
            ts.iter()
                .map(|t| substitute_temporary(t, replacements))
                .collect(),
        ),
        Type::Record { partial, fields } => Type::Record {
            partial: *partial,
            fields: fields
                .iter()
                .map(|(l, t)| (l.clone(), substitute_temporary(t, replacements)))
                .collect(),
        },
        Type::List(t) => Type::list(substitute_temporary(t, replacements)),
        Type::Named(args, name) => Type::Named(
            args.iter()
                .map(|t| substitute_temporary(t, replacements))
                .collect(),
            name.clone(),
        ),
    }
}
