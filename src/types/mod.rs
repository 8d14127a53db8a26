//! The type system: type universe, substitutions, unification, the
//! interning `TypeSystem`, the type environment and the inferencer.

pub mod env;
pub mod error;
pub mod infer;
pub mod subst;
pub mod system;
pub mod ty;
pub mod unify;

pub use env::TypeEnv;
pub use error::TypeError;
pub use infer::Infer;
pub use subst::Substitution;
pub use system::{DataTypeDef, TypeSystem};
pub use ty::{Label, Prim, Type, TypeScheme, TypeVar};
