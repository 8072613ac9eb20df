use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class::{LoxClass, LoxInstance};
use crate::error::Result;
use crate::function::{LoxFunction, NativeFunction};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Anything that can appear in callee position.
#[derive(Clone)]
pub enum Callable<'a> {
    Function(Rc<LoxFunction<'a>>),
    Native(Rc<NativeFunction<'a>>),
    /// Calling a class constructs an instance.
    Class(Rc<LoxClass<'a>>),
}

impl<'a> Callable<'a> {
    /// Minimum number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Native(native) => native.arity,
            Callable::Class(class) => class.arity(),
        }
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        paren: &Token<'_>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Native(native) => native.call(paren, &arguments),
            Callable::Class(class) => LoxClass::instantiate(class, interpreter, arguments),
        }
    }
}

/// A runtime value.  Heap objects are shared: copying a `Value` that holds a
/// function, class or instance copies the handle, never the object.
#[derive(Clone)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable<'a>),
    Instance(Rc<RefCell<LoxInstance<'a>>>),
}

impl Value<'_> {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value<'_> {
    /// Same-type value equality; objects compare by identity.  No coercion
    /// between types, and `nil` equals only `nil`.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => match (a, b) {
                (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
                (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
                (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(Callable::Function(function)) => write!(f, "<fn {}>", function.name()),

            Value::Callable(Callable::Native(native)) => write!(f, "<native fn {}>", native.name),

            Value::Callable(Callable::Class(class)) => write!(f, "{}", class.name()),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class().name()),
        }
    }
}

impl fmt::Debug for Value<'_> {
    // Objects can sit in reference cycles, so Debug never recurses into them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}
