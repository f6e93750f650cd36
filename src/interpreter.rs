//! The tree-walking evaluator.
//!
//! Grounded on the teacher's `vm.rs` dispatch loop (`run`, `binary_op`, `runtime_error`) for the
//! shape of statement/expression execution and error reporting, and on
//! `original_source/src/parser/interpreter.py` for Lox-specific evaluation semantics: truthiness,
//! arithmetic/comparison type-checking, and `execute_block`'s save-and-restore of the current
//! environment.
//!
//! `return` is modeled as a [Signal] rather than an exception-like unwind, matching the teacher's
//! preference for explicit `Result`/enum control flow over `panic!`-based shortcuts.

use std::io::Write;
use std::rc::Rc;

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::callable::{self, Callable, LoxFunction};
use crate::environment::Environment;
use crate::error::InterpretationError;
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// What a statement's execution produced, besides ordinary fall-through. Used to unwind a `return`
/// through enclosing blocks and loops without using Rust's own panic/unwind machinery.
enum Signal {
    Normal,
    Return(Value),
}

/// Executes a resolved Lox program. Holds the global environment (which persists across statements
/// in REPL mode) and the variable-resolution side table produced by [crate::resolver::Resolver].
///
/// Generic over an output sink so tests can capture `print` output directly instead of spawning a
/// subprocess and scraping stdout.
pub struct Interpreter<W: Write> {
    globals: Environment,
    locals: Locals,
    out: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        let globals = Environment::global();
        globals.define("clock", callable::clock());
        Interpreter {
            globals,
            locals: Locals::new(),
            out,
        }
    }

    /// Merges in a new variable-resolution table, e.g. after resolving a new REPL line against the
    /// interpreter's still-live global environment. Accumulates rather than replaces: a closure
    /// declared on an earlier line keeps its body's nodes (and thus their `expr_id` keys) alive via
    /// its captured `Rc`, and a later line's call into that closure still needs those entries to
    /// resolve correctly. `expr_id` is a pointer identity, so distinct nodes from distinct lines
    /// never collide as keys.
    pub fn set_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Runs a whole program's statements against the current global environment.
    pub fn interpret(&mut self, statements: &[Stmt]) -> crate::Result<()> {
        for statement in statements {
            self.execute(statement, &self.globals.clone())?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, env: &Environment) -> crate::Result<Signal> {
        match stmt.as_ref() {
            StmtKind::Expression(expr) => {
                self.evaluate(expr, env)?;
                Ok(Signal::Normal)
            }
            StmtKind::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                writeln!(self.out, "{value}").expect("writing to the output sink must not fail");
                Ok(Signal::Normal)
            }
            StmtKind::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                env.define(&name.lexeme, value);
                Ok(Signal::Normal)
            }
            StmtKind::Block(statements) => {
                let block_env = Environment::child_of(env);
                self.execute_block(statements, &block_env)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(Signal::Normal)
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        Signal::Normal => {}
                        signal @ Signal::Return(_) => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }
            StmtKind::Function { name, params, body } => {
                let function = LoxFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: env.clone(),
                };
                env.define(&name.lexeme, Value::Callable(Callable::Function(Rc::new(function))));
                Ok(Signal::Normal)
            }
            StmtKind::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(value))
            }
        }
    }

    /// Executes a block's statements in `block_env`, returning the first non-`Normal` signal
    /// (a `return` from inside). The caller supplies `block_env` rather than this method creating
    /// one, so a function call's parameter bindings and its body share a single frame.
    fn execute_block(&mut self, statements: &[Stmt], block_env: &Environment) -> crate::Result<Signal> {
        for statement in statements {
            match self.execute(statement, block_env)? {
                Signal::Normal => {}
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
        Ok(Signal::Normal)
    }

    /// Invokes a user-defined function: binds arguments in a fresh frame enclosed by the
    /// function's closure (not the caller's environment — this is what makes closures lexical),
    /// runs the body, and unwraps a `return` signal into its value (or `nil`, if the body falls
    /// through).
    pub fn call_function(&mut self, function: &Rc<LoxFunction>, arguments: Vec<Value>) -> crate::Result<Value> {
        let call_env = Environment::child_of(&function.closure);
        for (param, argument) in function.params.iter().zip(arguments) {
            call_env.define(&param.lexeme, argument);
        }
        match self.execute_block(&function.body, &call_env)? {
            Signal::Normal => Ok(Value::Nil),
            Signal::Return(value) => Ok(value),
        }
    }

    fn evaluate(&mut self, expr: &Expr, env: &Environment) -> crate::Result<Value> {
        match expr.as_ref() {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Grouping(inner) => self.evaluate(inner, env),
            ExprKind::Unary { operator, right } => self.evaluate_unary(operator, right, env),
            ExprKind::Binary { left, operator, right } => self.evaluate_binary(left, operator, right, env),
            ExprKind::Logical { left, operator, right } => self.evaluate_logical(left, operator, right, env),
            ExprKind::Variable { name } => self.lookup_variable(expr, name, env),
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                match self.locals.get(&crate::ast::expr_id(expr)) {
                    Some(&distance) => env.assign_at(distance, &name.lexeme, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }
                Ok(value)
            }
            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments, env),
        }
    }

    fn lookup_variable(&self, expr: &Expr, name: &Token, env: &Environment) -> crate::Result<Value> {
        match self.locals.get(&crate::ast::expr_id(expr)) {
            Some(&distance) => Ok(env.get_at(distance, &name.lexeme)),
            None => self.globals.get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr, env: &Environment) -> crate::Result<Value> {
        let right = self.evaluate(right, env)?;
        match operator.kind {
            TokenType::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(type_error(operator, "Operand must be a number.")),
            },
            TokenType::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only produces Minus or Bang as unary operators"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr, env: &Environment) -> crate::Result<Value> {
        let left = self.evaluate(left, env)?;
        match operator.kind {
            TokenType::Or if left.is_truthy() => Ok(left),
            TokenType::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right, env),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr, env: &Environment) -> crate::Result<Value> {
        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;

        use TokenType::*;
        match operator.kind {
            Minus => numeric_op(operator, left, right, |a, b| Value::Number(a - b)),
            Slash => match (left, right) {
                (Value::Number(_), Value::Number(0.0)) => {
                    Err(type_error(operator, "Division by zero is undefined."))
                }
                (left, right) => numeric_op(operator, left, right, |a, b| Value::Number(a / b)),
            },
            Star => numeric_op(operator, left, right, |a, b| Value::Number(a * b)),
            Greater => numeric_op(operator, left, right, |a, b| Value::Bool(a > b)),
            GreaterEqual => numeric_op(operator, left, right, |a, b| Value::Bool(a >= b)),
            Less => numeric_op(operator, left, right, |a, b| Value::Bool(a < b)),
            LessEqual => numeric_op(operator, left, right, |a, b| Value::Bool(a <= b)),
            BangEqual => Ok(Value::Bool(!left.lox_equals(&right))),
            EqualEqual => Ok(Value::Bool(left.lox_equals(&right))),
            Plus => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(Rc::from(format!("{a}{b}")))),
                _ => Err(type_error(operator, "Operands must be two numbers or two strings.")),
            },
            _ => unreachable!("parser only produces the above as binary operators"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr], env: &Environment) -> crate::Result<Value> {
        let callee = self.evaluate(callee, env)?;
        let mut evaluated_args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            evaluated_args.push(self.evaluate(argument, env)?);
        }

        let Value::Callable(callable) = callee else {
            return Err(type_error(paren, "Can only call functions and classes."));
        };

        if evaluated_args.len() != callable.arity() {
            return Err(type_error(
                paren,
                &format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    evaluated_args.len()
                ),
            ));
        }

        match callable {
            Callable::Native(native) => Ok((native.implementation)(&evaluated_args)),
            Callable::Function(function) => self.call_function(&function, evaluated_args),
        }
    }
}

fn numeric_op(operator: &Token, left: Value, right: Value, op: impl Fn(f64, f64) -> Value) -> crate::Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(op(a, b)),
        _ => Err(type_error(operator, "Operands must be numbers.")),
    }
}

fn type_error(token: &Token, message: &str) -> InterpretationError {
    InterpretationError::runtime(message, token.line)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::scan_tokens;

    fn run(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        assert!(!diagnostics.had_error(), "unexpected parse error");

        let locals = Resolver::new(&mut diagnostics).resolve(&statements);
        assert!(!diagnostics.had_error(), "unexpected resolution error");

        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);
        interpreter.set_locals(locals);
        interpreter.interpret(&statements).expect("unexpected runtime error");
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn arithmetic_and_print() {
        assert_eq!("7\n", run("print 3 + 4;"));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!("ab\n", run("print \"a\" + \"b\";"));
    }

    #[test]
    fn variables_and_assignment() {
        assert_eq!("2\n", run("var a = 1; a = a + 1; print a;"));
    }

    #[test]
    fn block_scoping_shadows_but_does_not_clobber() {
        assert_eq!("inner\nouter\n", run("var a = \"outer\"; { var a = \"inner\"; print a; } print a;"));
    }

    #[test]
    fn if_else_branches() {
        assert_eq!("yes\n", run("if (1 < 2) print \"yes\"; else print \"no\";"));
    }

    #[test]
    fn while_loop_accumulates() {
        assert_eq!("3\n", run("var i = 0; while (i < 3) i = i + 1; print i;"));
    }

    #[test]
    fn function_call_and_return() {
        assert_eq!("3\n", run("fun add(a, b) { return a + b; } print add(1, 2);"));
    }

    #[test]
    fn closures_capture_their_declaring_environment() {
        let source = "
            fun makeCounter() {
                var count = 0;
                fun counter() {
                    count = count + 1;
                    return count;
                }
                return counter;
            }
            var counter = makeCounter();
            print counter();
            print counter();
        ";
        assert_eq!("1\n2\n", run(source));
    }

    #[test]
    fn division_by_non_number_is_a_runtime_error() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("print 1 + \"a\";", &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        let locals = Resolver::new(&mut diagnostics).resolve(&statements);

        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);
        interpreter.set_locals(locals);
        assert!(interpreter.interpret(&statements).is_err());
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("print 1/0;", &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        let locals = Resolver::new(&mut diagnostics).resolve(&statements);

        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);
        interpreter.set_locals(locals);
        let err = interpreter.interpret(&statements).unwrap_err();
        assert!(err.to_string().starts_with("Division by zero is undefined."));
    }

    /// Simulates two REPL lines: the first declares a closure, the second invokes it. The
    /// interpreter's locals table must accumulate across `set_locals` calls, or the closure body's
    /// variable reference (resolved on line one) goes missing when line two runs it.
    #[test]
    fn locals_accumulate_across_repl_lines() {
        let mut interpreter = Interpreter::new(Vec::new());

        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("fun makeCounter() { var n = 0; fun inc() { n = n + 1; return n; } return inc; } var counter = makeCounter();", &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        let locals = Resolver::new(&mut diagnostics).resolve(&statements);
        assert!(!diagnostics.had_error());
        interpreter.set_locals(locals);
        interpreter.interpret(&statements).expect("line one must run cleanly");

        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("print counter();", &mut diagnostics);
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        let locals = Resolver::new(&mut diagnostics).resolve(&statements);
        assert!(!diagnostics.had_error());
        interpreter.set_locals(locals);
        interpreter
            .interpret(&statements)
            .expect("closure from line one must still resolve correctly on line two");
    }
}
