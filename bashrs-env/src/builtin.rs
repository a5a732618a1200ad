// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The builtin-utility registry. Concrete builtins (`cd`, `export`, `eval`,
//! ...) live in the `bashrs-builtin` crate, which depends on this one and
//! on `bashrs-semantics`; storing only a boxed callback here, rather than a
//! concrete `Builtin` type, is what keeps `bashrs-env` from having to depend
//! back on either of those crates.

use crate::Session;
use std::collections::HashMap;
use std::rc::Rc;

/// Whether a builtin is looked up before or after `$PATH` search, mirroring
/// POSIX's special/mandatory/elective/extension taxonomy: special builtins
/// run even when a same-named function or external command exists, and
/// their errors are fatal to a non-interactive shell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Special,
    Regular,
}

pub type BuiltinFn = dyn Fn(&mut Session, &[String]) -> i32;

#[derive(Clone)]
pub struct Builtin {
    pub kind: Kind,
    pub run: Rc<BuiltinFn>,
}

#[derive(Clone, Default)]
pub struct Builtins {
    table: HashMap<String, Builtin>,
}

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, kind: Kind, run: impl Fn(&mut Session, &[String]) -> i32 + 'static) {
        self.table.insert(name.into(), Builtin { kind, run: Rc::new(run) });
    }

    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

impl std::fmt::Debug for Builtins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtins").field("names", &self.table.keys().collect::<Vec<_>>()).finish()
    }
}
