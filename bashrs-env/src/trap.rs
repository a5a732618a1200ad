// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Signal and pseudo-signal (`EXIT`, `ERR`, `DEBUG`, `RETURN`) trap actions
//! registered by the `trap` builtin.

use std::collections::HashMap;
use std::fmt;

/// A trap condition: a real signal name (`INT`, `TERM`, ...) or one of
/// Bash's pseudo-signals.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Condition {
    Signal(String),
    Exit,
    Err,
    Debug,
    Return,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Signal(name) => write!(f, "{name}"),
            Condition::Exit => write!(f, "EXIT"),
            Condition::Err => write!(f, "ERR"),
            Condition::Debug => write!(f, "DEBUG"),
            Condition::Return => write!(f, "RETURN"),
        }
    }
}

impl Condition {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "EXIT" | "0" => Condition::Exit,
            "ERR" => Condition::Err,
            "DEBUG" => Condition::Debug,
            "RETURN" => Condition::Return,
            other => Condition::Signal(other.trim_start_matches("SIG").to_string()),
        }
    }
}

/// What a trap condition is bound to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// `trap -- command condition`: run `command` when the condition fires.
    Command(String),
    /// `trap '' condition`: ignore the condition entirely.
    Ignore,
    /// `trap - condition`: restore the default disposition.
    Default,
}

#[derive(Clone, Debug, Default)]
pub struct Traps {
    table: HashMap<Condition, Action>,
}

impl Traps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, condition: Condition, action: Action) {
        if action == Action::Default {
            self.table.remove(&condition);
        } else {
            self.table.insert(condition, action);
        }
    }

    pub fn get(&self, condition: &Condition) -> std::option::Option<&Action> {
        self.table.get(condition)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Condition, &Action)> {
        self.table.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pseudo_signals() {
        assert_eq!(Condition::parse("EXIT"), Condition::Exit);
        assert_eq!(Condition::parse("0"), Condition::Exit);
        assert_eq!(Condition::parse("ERR"), Condition::Err);
    }

    #[test]
    fn parse_strips_sig_prefix() {
        assert_eq!(Condition::parse("SIGINT"), Condition::Signal("INT".to_string()));
        assert_eq!(Condition::parse("int"), Condition::Signal("INT".to_string()));
    }

    #[test]
    fn set_default_clears_entry() {
        let mut traps = Traps::new();
        let cond = Condition::parse("INT");
        traps.set(cond.clone(), Action::Command("echo hi".to_string()));
        assert!(traps.get(&cond).is_some());
        traps.set(cond.clone(), Action::Default);
        assert!(traps.get(&cond).is_none());
    }
}
