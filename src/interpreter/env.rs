//! The evaluation environment: a persistent cons list of bindings.
//!
//! `bind` prepends one entry and returns a new environment sharing its
//! tail with the old one, so extension is cheap and the original stays
//! valid. Lookup walks from the newest entry outward, which makes
//! shadowing the natural consequence of chaining.

use std::rc::Rc;

use super::value::Value;

#[derive(Debug, Clone, Default)]
pub struct EvalEnv(Option<Rc<Node>>);

#[derive(Debug)]
struct Node {
    name: String,
    value: Value,
    next: EvalEnv,
}

impl EvalEnv {
    pub fn empty() -> Self {
        EvalEnv(None)
    }

    pub fn bind(&self, name: impl Into<String>, value: Value) -> EvalEnv {
        EvalEnv(Some(Rc::new(Node {
            name: name.into(),
            value,
            next: self.clone(),
        })))
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut current = self;
        while let Some(node) = &current.0 {
            if node.name == name {
                return Some(&node.value);
            }
            current = &node.next;
        }
        None
    }
}
