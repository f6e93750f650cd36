//! The AST produced by the parser and consumed by the resolver and interpreter.
//!
//! Per the Design Notes, this is modeled as closed Rust sum types rather than a visitor hierarchy:
//! pattern matching gives exhaustiveness checking for free and avoids the double-dispatch plumbing
//! a dynamic-dispatch visitor needs.
//!
//! Every [Expr] is an `Rc<ExprKind>`. This is what gives each expression node a stable identity for
//! the lifetime of the program: the resolver's side-table is keyed on `Rc::as_ptr`, so two
//! syntactically identical `Variable` expressions at different source locations are always
//! distinct keys, per the expression-identity invariant.

use std::rc::Rc;

use crate::token::Token;
use crate::value::Value;

/// A reference-counted expression node. Cloning an [Expr] clones the `Rc`, not the tree — the
/// clone and the original refer to the identical node (see [crate::resolver] and
/// [crate::interpreter], which key their side-tables on this fact).
pub type Expr = Rc<ExprKind>;

/// A reference-counted statement node. See [Expr] for why statements are also `Rc`-wrapped: a
/// `Function` declaration is cheap to clone into a [crate::callable::LoxFunction] without deep
/// copying its body.
pub type Stmt = Rc<StmtKind>;

#[derive(Debug)]
pub enum ExprKind {
    Literal(Value),
    Grouping(Expr),
    Unary {
        operator: Token,
        right: Expr,
    },
    Binary {
        left: Expr,
        operator: Token,
        right: Expr,
    },
    /// Distinct from [ExprKind::Binary] because `and`/`or` short-circuit.
    Logical {
        left: Expr,
        operator: Token,
        right: Expr,
    },
    Variable {
        name: Token,
    },
    Assign {
        name: Token,
        value: Expr,
    },
    Call {
        callee: Expr,
        /// Carries the line of the closing `)`, for runtime call errors.
        paren: Token,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug)]
pub enum StmtKind {
    Expression(Expr),
    Print(Expr),
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Stmt,
        else_branch: Option<Stmt>,
    },
    While {
        condition: Expr,
        body: Stmt,
    },
    Function {
        name: Token,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}

/// Convenience constructors, so the parser reads as `expr::literal(...)` rather than
/// `Rc::new(ExprKind::Literal(...))` at every call site.
pub mod expr {
    use super::*;

    pub fn literal(value: Value) -> Expr {
        Rc::new(ExprKind::Literal(value))
    }

    pub fn grouping(inner: Expr) -> Expr {
        Rc::new(ExprKind::Grouping(inner))
    }

    pub fn unary(operator: Token, right: Expr) -> Expr {
        Rc::new(ExprKind::Unary { operator, right })
    }

    pub fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
        Rc::new(ExprKind::Binary { left, operator, right })
    }

    pub fn logical(left: Expr, operator: Token, right: Expr) -> Expr {
        Rc::new(ExprKind::Logical { left, operator, right })
    }

    pub fn variable(name: Token) -> Expr {
        Rc::new(ExprKind::Variable { name })
    }

    pub fn assign(name: Token, value: Expr) -> Expr {
        Rc::new(ExprKind::Assign { name, value })
    }

    pub fn call(callee: Expr, paren: Token, arguments: Vec<Expr>) -> Expr {
        Rc::new(ExprKind::Call { callee, paren, arguments })
    }
}

pub mod stmt {
    use super::*;

    pub fn expression(expr: Expr) -> Stmt {
        Rc::new(StmtKind::Expression(expr))
    }

    pub fn print(expr: Expr) -> Stmt {
        Rc::new(StmtKind::Print(expr))
    }

    pub fn var(name: Token, initializer: Option<Expr>) -> Stmt {
        Rc::new(StmtKind::Var { name, initializer })
    }

    pub fn block(statements: Vec<Stmt>) -> Stmt {
        Rc::new(StmtKind::Block(statements))
    }

    pub fn if_stmt(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        Rc::new(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn while_stmt(condition: Expr, body: Stmt) -> Stmt {
        Rc::new(StmtKind::While { condition, body })
    }

    pub fn function(name: Token, params: Vec<Token>, body: Vec<Stmt>) -> Stmt {
        Rc::new(StmtKind::Function {
            name,
            params,
            body: Rc::new(body),
        })
    }

    pub fn return_stmt(keyword: Token, value: Option<Expr>) -> Stmt {
        Rc::new(StmtKind::Return { keyword, value })
    }
}

/// Returns a stable identity for an expression node, suitable as a `HashMap` key. Two `Rc`s cloned
/// from the same allocation always yield the same identity; two structurally-identical but
/// independently-constructed nodes never do.
pub fn expr_id(expr: &Expr) -> usize {
    Rc::as_ptr(expr) as usize
}
