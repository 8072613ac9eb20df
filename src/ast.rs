//! Syntax tree produced by the parser and walked by the resolver and the
//! interpreter.
//!
//! Nodes borrow their tokens from the scanner's output (`'a`).  Expressions
//! whose meaning depends on lexical scope (`Variable`, `Assign`, `This`,
//! `Super`) carry an [`ExprId`]; the resolver keys its distance map by that id
//! rather than by node contents, so two textually identical references in
//! different scopes stay distinct.

use std::rc::Rc;

use crate::token::Token;

/// Identity of a scope-sensitive expression node, unique within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

/// A literal constant that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    True,
    False,
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// `name = value`
    Assign {
        id: ExprId,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// `left op right` for arithmetic, comparison and equality.
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)`, kept for error reporting.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// `object.name`
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    Grouping(Box<Expr<'a>>),

    Literal(LiteralValue),

    /// Short-circuiting `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// `object.name = value`
    Set {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: &'a Token<'a>,
        method: &'a Token<'a>,
    },

    This {
        id: ExprId,
        keyword: &'a Token<'a>,
    },

    Unary {
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    Variable {
        id: ExprId,
        name: &'a Token<'a>,
    },
}

/// A function or method declaration.  Shared behind an `Rc` so every closure
/// created from it points at the same read-only body.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl<'a> {
    pub name: &'a Token<'a>,
    pub params: Vec<&'a Token<'a>>,
    pub body: Vec<Stmt<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Block(Vec<Stmt<'a>>),

    Class {
        name: &'a Token<'a>,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr<'a>>,
        methods: Vec<Rc<FunctionDecl<'a>>>,
    },

    Expression(Expr<'a>),

    Function(Rc<FunctionDecl<'a>>),

    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    Print(Expr<'a>),

    Return {
        keyword: &'a Token<'a>,
        value: Option<Expr<'a>>,
    },

    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },
}
