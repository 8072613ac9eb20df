use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::function::{LoxFunction, NativeFunction};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Value};

/// How a statement finished.  `Return` travels up through blocks, loops and
/// conditionals until the enclosing [`LoxFunction::call`] turns it into the
/// call's value.
#[derive(Debug)]
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    globals: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: Locals,
    output: Box<dyn Write>,
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Interpreter<'a> {
    /// An interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` statements go to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::global();

        debug!("Defining native function 'clock'");
        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction::new(
                "clock", 0, clock,
            )))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Runs a resolved program.  The first runtime error aborts the run.
    pub fn interpret(&mut self, statements: &[Stmt<'a>], locals: Locals) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        self.locals = locals;

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Block(statements) => {
                let environment = Environment::enter_scope(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }

            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                self.environment
                    .borrow_mut()
                    .declare(declaration.name.lexeme);

                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().assign(
                    declaration.name,
                    Value::Callable(Callable::Function(Rc::new(function))),
                )?;

                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt<'a>], environment: EnvRef<'a>) -> Result<Flow<'a>> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token<'a>,
        superclass: Option<&Expr<'a>>,
        methods: &[Rc<FunctionDecl<'a>>],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.lexeme);

        self.environment.borrow_mut().declare(name.lexeme);

        let superclass = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => return Err(LoxError::runtime(name, "Superclass must be a class.")),
            },
            None => None,
        };

        let enclosing = superclass.as_ref().map(|superclass| {
            let scope = Environment::enter_scope(&self.environment);
            scope.borrow_mut().define(
                "super",
                Value::Callable(Callable::Class(Rc::clone(superclass))),
            );
            mem::replace(&mut self.environment, scope)
        });

        let methods = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    method.name.lexeme == INITIALIZER,
                );
                (method.name.lexeme, Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme, superclass, methods);

        if let Some(enclosing) = enclosing {
            self.environment = enclosing;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Callable(Callable::Class(Rc::new(class))))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name.lexeme, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(paren, "Can only call functions and classes."));
                };

                if values.len() < callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Not enough arguments. Expected {} but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                callable.call(self, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get_property(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let value = self.evaluate(value)?;

                match self.evaluate(object)? {
                    Value::Instance(instance) => {
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(LoxError::runtime(name, "Only instances have fields.")),
                }
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token<'_>) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_super(&self, id: ExprId, keyword: &Token<'_>, method: &Token<'_>) -> Result<Value<'a>> {
        let undefined = || LoxError::runtime(method, format!("Undefined property '{}'.", method.lexeme));

        let distance = self
            .locals
            .get(&id)
            .copied()
            .ok_or_else(|| LoxError::runtime(keyword, "Cannot use 'super' outside of a class."))?;

        // `this` is bound exactly one frame inside the `super` frame
        let receiver_distance = distance
            .checked_sub(1)
            .ok_or_else(|| LoxError::runtime(keyword, "Cannot use 'super' outside of a class."))?;

        let superclass = Environment::get_at(&self.environment, distance, "super");
        let receiver = Environment::get_at(&self.environment, receiver_distance, "this");

        match (superclass, receiver) {
            (Value::Callable(Callable::Class(superclass)), Value::Instance(receiver)) => {
                let method = superclass.find_method(method.lexeme).ok_or_else(undefined)?;
                Ok(Value::Callable(Callable::Function(Rc::new(method.bind(receiver)))))
            }
            _ => Err(undefined()),
        }
    }
}

fn binary<'a>(operator: &Token<'_>, left: Value<'a>, right: Value<'a>) -> Result<Value<'a>> {
    let numbers = |left: &Value<'a>, right: &Value<'a>| match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    };

    let value = match operator.token_type {
        TokenType::EQUAL_EQUAL => Value::Bool(left == right),
        TokenType::BANG_EQUAL => Value::Bool(left != right),

        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(a), Value::String(b)) => Value::String(a + &b),
            _ => {
                return Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                ))
            }
        },

        TokenType::MINUS => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a - b)
        }
        TokenType::STAR => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a * b)
        }
        TokenType::SLASH => {
            let (a, b) = numbers(&left, &right)?;
            Value::Number(a / b)
        }
        TokenType::GREATER => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a > b)
        }
        TokenType::GREATER_EQUAL => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a >= b)
        }
        TokenType::LESS => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a < b)
        }
        TokenType::LESS_EQUAL => {
            let (a, b) = numbers(&left, &right)?;
            Value::Bool(a <= b)
        }

        _ => {
            return Err(LoxError::runtime(
                operator,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            ))
        }
    };

    Ok(value)
}

/// Seconds since the Unix epoch.
fn clock<'a>(_args: &[Value<'a>]) -> std::result::Result<Value<'a>, String> {
    let millis = Utc::now().timestamp_millis();
    Ok(Value::Number(millis as f64 / 1000.0))
}
