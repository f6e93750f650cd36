//! Things that can be called with `(...)`: native functions and Lox function declarations.
//!
//! Grounded on the teacher's `vm.rs` dispatch-loop philosophy (call is a method the interpreter
//! drives, not a trait object the AST owns) and on `original_source/src/common/lox_callable.py` /
//! `lox_function.py` for the native-vs-user split and the "closure captured at declaration" rule.

use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::Stmt;
use crate::environment::Environment;
use crate::token::Token;
use crate::value::Value;

/// Something `interpreter.rs` can invoke with a list of evaluated arguments.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.params.len(),
        }
    }
}

/// A function implemented in Rust and exposed to Lox as a global, e.g. `clock`.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub implementation: fn(&[Value]) -> Value,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

/// A user-declared `fun` statement, paired with the environment that was live at the point it was
/// declared. Capturing that environment (rather than re-resolving names against the global scope
/// at call time) is what gives Lox closures their lexical behavior.
pub struct LoxFunction {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Environment,
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction").field("name", &self.name.lexeme).finish()
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "<native fn>"),
            Callable::Function(function) => write!(f, "<fn {}>", function.name.lexeme),
        }
    }
}

/// The one native function the spec names: seconds since the Unix epoch, truncated to a whole
/// number per the resolved open question in the design notes.
pub fn clock() -> Value {
    Value::Callable(Callable::Native(Rc::new(NativeFunction {
        name: "clock",
        arity: 0,
        implementation: |_args| {
            let seconds = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock is after the Unix epoch")
                .as_secs();
            Value::Number(seconds as f64)
        },
    })))
}
