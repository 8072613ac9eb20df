//! Static resolver pass.
//!
//! One walk over the tree that
//! 1. mirrors runtime frames with a stack of `HashMap<&str, bool>` scopes
//!    (`false` = declared, `true` = defined),
//! 2. records, for every scope-sensitive expression, how many frames out its
//!    binding lives, and
//! 3. reports static errors: reading a variable in its own initializer,
//!    redeclaring in one block, misplaced `return`, `this` or `super`.
//!
//! Errors never stop the walk; every one found is returned together.  Names
//! not found in any scope are left out of the map and treated as globals at
//! runtime, which is what lets a function call another one declared later at
//! top level.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::class::INITIALIZER;
use crate::error::{Diagnostics, LoxError};
use crate::token::Token;

/// Hop distance from a reference to the frame that declares it.
pub type Locals = HashMap<ExprId, usize>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>,
    /// Top-level names; `false` while the first initializer is running.
    globals: HashMap<&'a str, bool>,
    locals: Locals,
    current_function: FunctionType,
    current_class: ClassType,
    diagnostics: Diagnostics,
}

impl Default for Resolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            globals: HashMap::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Resolves a whole program, yielding the distance map or every static
    /// error found.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> Result<Locals, Diagnostics> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.diagnostics.has_errors() {
            info!("Resolution found {} error(s)", self.diagnostics.len());
            Err(self.diagnostics)
        } else {
            info!("Resolved {} local reference(s)", self.locals.len());
            Ok(self.locals)
        }
    }

    fn resolve_stmts(&mut self, statements: &[Stmt<'a>]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Function(declaration) => {
                // defined before the body so the function can recurse
                self.declare(declaration.name);
                self.define(declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token<'a>,
        superclass: Option<&Expr<'a>>,
        methods: &[Rc<FunctionDecl<'a>>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class cannot inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.bind_keyword("super");
        }

        self.begin_scope();
        self.bind_keyword("this");

        for method in methods {
            let kind = if method.name.lexeme == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    /// Parameters and body share one fresh scope.
    fn resolve_function(&mut self, declaration: &FunctionDecl<'a>, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&declaration.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        match expr {
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Literal(_) => {}

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => self.error(keyword, "Cannot use 'super' outside of a class."),
                ClassType::Class => {
                    self.error(keyword, "Cannot use 'super' in a class with no superclass.")
                }
                ClassType::Subclass => self.resolve_local(*id, keyword),
            },

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");
                } else {
                    self.resolve_local(*id, keyword);
                }
            }

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Variable { id, name } => {
                let state = match self.scopes.last() {
                    Some(scope) => scope.get(name.lexeme),
                    None => self.globals.get(name.lexeme),
                };

                if state == Some(&false) {
                    self.error(name, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Implicit `this` / `super` binding in the innermost scope.
    fn bind_keyword(&mut self, keyword: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(keyword, true);
        }
    }

    fn declare(&mut self, name: &Token<'a>) {
        let Some(scope) = self.scopes.last_mut() else {
            // redeclaring a global is allowed and keeps it readable
            self.globals.entry(name.lexeme).or_insert(false);
            return;
        };

        if scope.insert(name.lexeme, false).is_some() {
            self.error(
                name,
                "Variable with this name already declared in this scope.",
            );
        }
    }

    fn define(&mut self, name: &Token<'a>) {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.lexeme, true),
            None => self.globals.insert(name.lexeme, true),
        };
    }

    /// Records the hop count to the innermost scope holding `name`; records
    /// nothing for globals.
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error(&mut self, token: &Token<'_>, message: &str) {
        self.diagnostics.report(LoxError::resolve(token, message));
    }
}
