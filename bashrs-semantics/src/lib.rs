// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Execution semantics: word expansion, command and pipeline execution,
//! redirection, and conditional-expression evaluation.
//!
//! Grounded on yash-rs's `yash-semantics` crate, whose `Command::execute`
//! trait and `expansion` module split the same way this crate's [`exec`] and
//! [`expand`] modules do; generalized from yash's async, POSIX-only
//! execution model to a synchronous one (scripts run on one logical thread;
//! only background jobs, coprocs and process substitutions are concurrent
//! OS-process peers -- see `DESIGN.md`) covering Bash's fuller word-
//! expansion and compound-command set.

pub mod expand;
pub mod exec;
pub mod redirect;
pub mod test_expr;

use bashrs_syntax::source::Location;
use thiserror::Error;

/// An error raised during expansion or execution that is not itself a
/// nonzero exit status -- a malformed expansion, an I/O failure opening a
/// redirection target, or an arithmetic error surfaced through `set -u`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{name}: unbound variable")]
    UnboundVariable { name: String },
    #[error("{0}")]
    Arith(#[from] bashrs_arith::ArithError),
    #[error("{0}")]
    Glob(#[from] bashrs_fnmatch::Error),
    #[error("{0}")]
    Parse(#[from] bashrs_syntax::ParseError),
    #[error("{target}: {source}")]
    Redirect { target: String, source: std::io::Error },
    #[error("{message}")]
    BadSubstitution { message: String },
    #[error("{command}: command not found")]
    CommandNotFound { command: String },
    #[error("{command}: {source}")]
    Exec { command: String, source: std::io::Error },
    #[error("{name}: readonly variable")]
    ReadonlyVariable { name: String },
}

/// Non-local control transfer raised by `break`, `continue`, `return`,
/// `exit`, and (for completeness) a fatal shell error under `errexit`.
/// Propagated up through [`exec`] the way yash-semantics propagates its own
/// `Break`/`Continue`/`Return` "divergence" values out of nested execution.
#[derive(Debug, Clone, Copy)]
pub enum Divert {
    Break(u32),
    Continue(u32),
    Return(i32),
    Exit(i32),
}

pub type ExecResult<T> = Result<T, ExecError>;

/// Outcome of running one command: its exit status, plus any pending
/// non-local control transfer that should keep propagating outward.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub status: i32,
    pub divert: Option<Divert>,
}

impl Outcome {
    pub fn status(status: i32) -> Self {
        Outcome { status, divert: None }
    }

    pub fn diverting(status: i32, divert: Divert) -> Self {
        Outcome { status, divert: Some(divert) }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// A dummy [`Location`] for values synthesized at run time (e.g. a word
/// built from an expanded here-string) that don't correspond to any span of
/// the original source.
pub fn synthetic_location() -> Location {
    Location::dummy()
}
