use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{Callable, Value};

pub const INITIALIZER: &str = "init";

pub struct LoxClass<'a> {
    name: &'a str,
    superclass: Option<Rc<LoxClass<'a>>>,
    methods: HashMap<&'a str, Rc<LoxFunction<'a>>>,
}

impl<'a> LoxClass<'a> {
    pub fn new(
        name: &'a str,
        superclass: Option<Rc<LoxClass<'a>>>,
        methods: HashMap<&'a str, Rc<LoxFunction<'a>>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Own methods first, then up the superclass chain, so a subclass method
    /// shadows an inherited one of the same name.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction<'a>>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// The initializer's parameter count, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |init| init.arity())
    }

    /// Creates an instance, runs the bound initializer for its effect, and
    /// yields the instance whatever the initializer returned.
    pub fn instantiate(
        class: &Rc<LoxClass<'a>>,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct LoxInstance<'a> {
    class: Rc<LoxClass<'a>>,
    fields: HashMap<String, Value<'a>>,
}

impl<'a> LoxInstance<'a> {
    pub fn new(class: Rc<LoxClass<'a>>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass<'a>> {
        &self.class
    }

    /// Fields shadow methods; a method comes back bound to `instance`.
    pub fn get_property(instance: &Rc<RefCell<Self>>, name: &Token<'_>) -> Result<Value<'a>> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(name.lexeme) {
            return Ok(value.clone());
        }

        let method = this.class.find_method(name.lexeme);
        drop(this);

        match method {
            Some(method) => {
                let bound = method.bind(Rc::clone(instance));
                Ok(Value::Callable(Callable::Function(Rc::new(bound))))
            }
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    pub fn set(&mut self, name: &Token<'_>, value: Value<'a>) {
        self.fields.insert(name.lexeme.to_string(), value);
    }
}
