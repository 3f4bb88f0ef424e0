//! Lexical scope environment
//!
//! C keeps ordinary identifiers, typedef names and struct tags in separate
//! namespaces, so each frame carries three independent maps. Lookup walks
//! frames innermost-first; binding always goes to the innermost frame.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::types::Type;
use crate::ast::Var;

#[derive(Debug, Default)]
struct Frame {
    vars: HashMap<String, Rc<Var>>,
    typedefs: HashMap<String, Type>,
    tags: HashMap<String, Type>,
}

/// Stack of scope frames; the root frame is the file scope
#[derive(Debug)]
pub struct Env {
    frames: Vec<Frame>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pop the innermost frame. Popping the file scope is a caller bug.
    pub fn pop(&mut self) {
        assert!(self.frames.len() > 1, "cannot pop the file scope");
        self.frames.pop();
    }

    pub fn bind_var(&mut self, name: impl Into<String>, var: Rc<Var>) {
        self.innermost().vars.insert(name.into(), var);
    }

    pub fn bind_typedef(&mut self, name: impl Into<String>, ty: Type) {
        self.innermost().typedefs.insert(name.into(), ty);
    }

    pub fn bind_tag(&mut self, name: impl Into<String>, ty: Type) {
        self.innermost().tags.insert(name.into(), ty);
    }

    pub fn find_var(&self, name: &str) -> Option<&Rc<Var>> {
        self.frames.iter().rev().find_map(|f| f.vars.get(name))
    }

    pub fn find_typedef(&self, name: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|f| f.typedefs.get(name))
    }

    pub fn find_tag(&self, name: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|f| f.tags.get(name))
    }

    fn innermost(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("scope stack is never empty")
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{char_ty, int_ty};

    #[test]
    fn test_shadowing_and_restore() {
        let mut env = Env::new();
        env.bind_var("x", Var::local("x", Some(int_ty())));
        env.push();
        env.bind_var("x", Var::local("x", Some(char_ty())));
        assert_eq!(env.find_var("x").unwrap().ty, Some(char_ty()));
        env.pop();
        assert_eq!(env.find_var("x").unwrap().ty, Some(int_ty()));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut env = Env::new();
        env.bind_typedef("t", int_ty());
        env.bind_tag("t", char_ty());
        assert!(env.find_var("t").is_none());
        assert_eq!(env.find_typedef("t"), Some(&int_ty()));
        assert_eq!(env.find_tag("t"), Some(&char_ty()));
    }

    #[test]
    fn test_outer_binding_visible_inside() {
        let mut env = Env::new();
        env.bind_typedef("t", int_ty());
        env.push();
        assert_eq!(env.find_typedef("t"), Some(&int_ty()));
        env.pop();
    }

    #[test]
    #[should_panic(expected = "file scope")]
    fn test_pop_root_panics() {
        let mut env = Env::new();
        env.pop();
    }
}
