// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Source code locations.
//!
//! Every token and AST node carries a [`Location`] pointing back at the byte
//! range of source text it was built from. This is what lets diagnostics
//! point at the offending line and column, and lets the executor report
//! `LINENO` during a script run.

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Where a piece of source code came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// Top-level script text passed to `run`/`parse`.
    Script { name: String },
    /// A command substitution `$(...)` or backquoted ```...```.
    CommandSubst { location: Location },
    /// A process substitution `<(...)` or `>(...)`.
    ProcessSubst { location: Location },
    /// The body of an arithmetic expansion `$((...))`.
    Arith { location: Location },
    /// A here-document body.
    HereDoc { location: Location },
    /// Source with no useful description (used in tests and ad hoc parses).
    Unknown,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Script { name } => write!(f, "{name}"),
            Source::CommandSubst { .. } => write!(f, "command substitution"),
            Source::ProcessSubst { .. } => write!(f, "process substitution"),
            Source::Arith { .. } => write!(f, "arithmetic expansion"),
            Source::HereDoc { .. } => write!(f, "here-document"),
            Source::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// The full text of one source unit, shared (via `Rc`) by every [`Location`]
/// that points into it.
#[derive(Debug, Eq, PartialEq)]
pub struct Code {
    /// The complete source text.
    pub value: String,
    /// Which [`Source`] this text came from.
    pub source: Source,
}

impl Code {
    /// Returns the 1-based line number containing byte offset `index`.
    pub fn line_number(&self, index: usize) -> usize {
        self.value[..index.min(self.value.len())]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1
    }

    /// Returns the 1-based column number of byte offset `index` within its line.
    pub fn column_number(&self, index: usize) -> usize {
        let index = index.min(self.value.len());
        let line_start = self.value[..index].rfind('\n').map_or(0, |i| i + 1);
        self.value[line_start..index].chars().count() + 1
    }

    /// Returns the source text of the line containing byte offset `index`,
    /// without the trailing newline.
    pub fn line_text(&self, index: usize) -> &str {
        let index = index.min(self.value.len());
        let start = self.value[..index].rfind('\n').map_or(0, |i| i + 1);
        let end = self.value[index..]
            .find('\n')
            .map_or(self.value.len(), |i| index + i);
        &self.value[start..end]
    }
}

/// A byte range within a shared [`Code`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    pub code: Rc<Code>,
    pub range: Range<usize>,
}

impl Location {
    /// A location with no real source backing, for ASTs built via `FromStr`.
    pub fn dummy() -> Self {
        Location {
            code: Rc::new(Code {
                value: String::new(),
                source: Source::Unknown,
            }),
            range: 0..0,
        }
    }

    pub fn line(&self) -> usize {
        self.code.line_number(self.range.start)
    }

    pub fn column(&self) -> usize {
        self.code.column_number(self.range.start)
    }
}
