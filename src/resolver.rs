//! Static resolution: computes, for every variable reference, how many enclosing scopes separate it
//! from the scope that declares it.
//!
//! Grounded on `original_source/src/parser/resolver.py`, adapted to this crate's pointer-identity
//! AST: the side table the teacher's Python original keys by AST node object identity is, here, a
//! `HashMap<usize, usize>` keyed by [crate::ast::expr_id]. Also fixes the classic resolver bug,
//! where the `if` statement's resolution only walked the `then` branch when there was no `else` —
//! see the corresponding entry in the design notes.

use std::collections::HashMap;

use crate::ast::{expr_id, Expr, ExprKind, Stmt, StmtKind};
use crate::diagnostics::Diagnostics;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
}

/// Maps an expression's identity to the number of enclosing scopes between its use and its
/// declaration. Absence means "look it up as a global".
pub type Locals = HashMap<usize, usize>;

/// Walks a parsed program, resolving every variable expression against the stack of lexical
/// scopes active at that point, and recording the result in a [Locals] table.
pub struct Resolver<'a> {
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
    locals: Locals,
    current_function: FunctionKind,
}

impl<'a> Resolver<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics) -> Self {
        Resolver {
            diagnostics,
            scopes: Vec::new(),
            locals: Locals::new(),
            current_function: FunctionKind::None,
        }
    }

    /// Resolves a whole program and returns the side table built while doing so.
    pub fn resolve(mut self, statements: &[Stmt]) -> Locals {
        self.resolve_statements(statements);
        self.locals
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_statement(statement);
        }
    }

    fn resolve_statement(&mut self, stmt: &Stmt) {
        match stmt.as_ref() {
            StmtKind::Expression(expr) => self.resolve_expr(expr),
            StmtKind::Print(expr) => self.resolve_expr(expr),
            StmtKind::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            StmtKind::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_statement(body);
            }
            StmtKind::Function { name, params, body } => {
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body, FunctionKind::Function);
            }
            StmtKind::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.diagnostics.error_at(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr.as_ref() {
            ExprKind::Literal(_) => {}
            ExprKind::Grouping(inner) => self.resolve_expr(inner),
            ExprKind::Unary { right, .. } => self.resolve_expr(right),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Variable { name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.diagnostics
                            .error_at(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(expr, name);
            }
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr, name);
            }
            ExprKind::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
        }
    }

    /// Walks the scope stack outward from the innermost scope, recording the distance at which
    /// `name` is declared. No match means it's a global, left unresolved for runtime lookup.
    fn resolve_local(&mut self, expr: &Expr, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(expr_id(expr), depth);
                return;
            }
        }
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.contains_key(&name.lexeme) {
            self.diagnostics
                .error_at(name, "Already a variable with this name in this scope.");
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }
}
