//! The evaluator: runtime values, the evaluation environment, the `Code`
//! tree and its interpreter, the `from` query executor and the builtin
//! registry.

pub mod builtins;
pub mod code;
pub mod env;
pub mod query;
pub mod value;

pub use builtins::BuiltIn;
pub use code::{apply_value, bind_pat, lit_value, Code, LinkCode};
pub use env::EvalEnv;
pub use query::{FromCode, StepCode};
pub use value::{Closure, Value};
