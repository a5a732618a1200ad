// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Bash arithmetic expansion, `$((expr))`, and the `((expr))` command.
//!
//! Grounded on yash-rs's `yash-arith` crate: a token -> Pratt-style
//! precedence-climbing parser -> evaluator pipeline over a caller-supplied
//! variable environment, generalized with the C-like extras Bash's
//! arithmetic grammar adds over POSIX's (`++`, `--`, `,`, ternary
//! associativity already present, compound assignment operators, and
//! base-N integer literals).

mod ast;
mod eval;
mod token;

pub use ast::Ast;
pub use eval::Value;

use thiserror::Error;

/// What the evaluator needs from the surrounding shell: reading and writing
/// variables by name. The executor implements this over its `Session`.
pub trait Variables {
    /// Looks up a variable's value for use as an arithmetic operand. Unset
    /// variables evaluate to `0`, so this returns `None` rather than an
    /// error for a missing name.
    fn get(&self, name: &str) -> Option<String>;

    /// Performs the side-effecting assignment of `=`, `+=`, `++`, etc.
    fn set(&mut self, name: &str, value: &Value);
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ArithError {
    #[error("syntax error in arithmetic expression: {0}")]
    Syntax(String),
    #[error("division by zero")]
    DivideByZero,
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
    #[error("invalid assignment target")]
    NotAssignable,
    #[error("integer literal '{0}' is out of range")]
    Overflow(String),
}

/// Parses and evaluates `expr` against `vars`, returning the resulting
/// integer (Bash arithmetic has no floating point).
pub fn evaluate(expr: &str, vars: &mut impl Variables) -> Result<i64, ArithError> {
    let tokens = token::tokenize(expr)?;
    let ast = ast::parse(&tokens)?;
    eval::eval(&ast, vars)
}

/// Evaluates `expr` and reports whether it is non-zero, the truth value
/// `((expr))` and `[[ expr ]]`-style arithmetic tests use as their exit
/// status.
pub fn evaluate_bool(expr: &str, vars: &mut impl Variables) -> Result<bool, ArithError> {
    Ok(evaluate(expr, vars)? != 0)
}
