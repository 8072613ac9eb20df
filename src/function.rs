use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// A user-defined function or method: a shared declaration paired with the
/// frame that was current where it was defined.
pub struct LoxFunction<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: Rc<FunctionDecl<'a>>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this function whose closure has one more frame, holding
    /// `this = instance`.  `self` is left as it was.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance<'a>>>) -> LoxFunction<'a> {
        let environment = Environment::enter_scope(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// Runs the body in a fresh frame under the closure.  Surplus arguments
    /// are ignored; the caller has already rejected too few.
    pub fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Calling '{}' with {} argument(s)", self.name(), arguments.len());

        let environment = Environment::enter_scope(&self.closure);
        {
            let mut frame = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(param.lexeme, argument);
            }
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}

/// Signature of a host-provided builtin.  A returned `Err` becomes a runtime
/// error at the call site.
pub type NativeFn<'a> = fn(&[Value<'a>]) -> std::result::Result<Value<'a>, String>;

/// A builtin implemented in Rust.  Holds no closure.
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn<'a>,
}

impl<'a> NativeFunction<'a> {
    pub fn new(name: &'static str, arity: usize, func: NativeFn<'a>) -> Self {
        Self { name, arity, func }
    }

    pub fn call(&self, paren: &Token<'_>, arguments: &[Value<'a>]) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(arguments).map_err(|message| LoxError::runtime(paren, message))
    }
}
