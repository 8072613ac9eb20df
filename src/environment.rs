use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a frame.  Closures created in the same scope hold the
/// same handle, so a write through one is seen by all of them.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

/// One frame of bindings plus a link to the lexically enclosing frame.  Only
/// the global frame has no enclosing link.
#[derive(Default)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    /// A fresh root frame.
    pub fn global() -> EnvRef<'a> {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A new frame whose enclosing link is `enclosing`.
    pub fn enter_scope(enclosing: &EnvRef<'a>) -> EnvRef<'a> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    pub fn enclosing(&self) -> Option<EnvRef<'a>> {
        self.enclosing.clone()
    }

    /// Registers `name` as `nil` unless this frame already holds it.
    pub fn declare(&mut self, name: &str) {
        self.values
            .entry(name.to_string())
            .or_insert(Value::Nil);
    }

    /// Binds or overwrites `name` in this frame.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up here, then outward.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(undefined(name)),
        }
    }

    /// Overwrites the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }

    /// Reads `name` from the frame exactly `distance` links out.  The
    /// resolver guarantees the binding exists there.
    pub fn get_at(env: &EnvRef<'a>, distance: usize, name: &str) -> Value<'a> {
        let frame = Self::ancestor(env, distance);
        let value = frame.borrow().values.get(name).cloned();

        value.unwrap_or_else(|| {
            debug!("'{}' missing at distance {}", name, distance);
            Value::Nil
        })
    }

    /// Writes `name` into the frame exactly `distance` links out.
    pub fn assign_at(env: &EnvRef<'a>, distance: usize, name: &str, value: Value<'a>) {
        Self::ancestor(env, distance)
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }

    fn ancestor(env: &EnvRef<'a>, distance: usize) -> EnvRef<'a> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let next = frame.borrow().enclosing.clone();
            match next {
                Some(next) => frame = next,
                None => break,
            }
        }

        frame
    }
}

fn undefined(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

impl fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
