// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Alias table for `alias`/`unalias` and the word-expansion stage that
//! substitutes an alias for a command word.

use std::collections::HashMap;

/// A single `alias name=value` entry. `global` mirrors Bash's distinction
/// between ordinary aliases (substituted only as the first word of a
/// command) and ones whose replacement text itself ends in a blank, which
/// makes the *next* word eligible for alias substitution too; that trailing-
/// blank check is cheap to redo from `replacement` at substitution time, so
/// it isn't cached here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alias {
    pub name: String,
    pub replacement: String,
}

#[derive(Clone, Debug, Default)]
pub struct Aliases {
    table: HashMap<String, Alias>,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, replacement: impl Into<String>) {
        let name = name.into();
        self.table.insert(name.clone(), Alias { name, replacement: replacement.into() });
    }

    pub fn get(&self, name: &str) -> std::option::Option<&Alias> {
        self.table.get(name)
    }

    pub fn remove(&mut self, name: &str) -> std::option::Option<Alias> {
        self.table.remove(name)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let mut aliases = Aliases::new();
        aliases.define("ll", "ls -l");
        assert_eq!(aliases.get("ll").unwrap().replacement, "ls -l");
    }

    #[test]
    fn remove_forgets_it() {
        let mut aliases = Aliases::new();
        aliases.define("ll", "ls -l");
        aliases.remove("ll");
        assert!(aliases.get("ll").is_none());
    }
}
