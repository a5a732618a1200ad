// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `trap`: registers, clears, ignores, or lists signal/pseudo-signal
//! actions in `session.traps`.
//!
//! Grounded on yash-builtin's `trap` module; actually delivering a trapped
//! signal to a running script is `bashrs-semantics`'s job (consulting
//! `session.traps` around each command), this built-in only edits the
//! table.

use crate::common::usage_error;
use bashrs_env::trap::{Action, Condition};
use bashrs_env::Session;

pub fn run(session: &mut Session, argv: &[String]) -> i32 {
    if argv.len() == 1 {
        for (cond, action) in session.traps.entries() {
            print_trap(cond, action);
        }
        return 0;
    }

    let mut i = 1;
    if argv[i] == "-p" {
        let names = &argv[i + 1..];
        if names.is_empty() {
            for (cond, action) in session.traps.entries() {
                print_trap(cond, action);
            }
        } else {
            for name in names {
                let cond = Condition::parse(name);
                if let Some(action) = session.traps.get(&cond) {
                    print_trap(&cond, action);
                }
            }
        }
        return 0;
    }

    let action = match argv[i].as_str() {
        "-" => Action::Default,
        "" => Action::Ignore,
        cmd => Action::Command(cmd.to_string()),
    };
    i += 1;
    if i >= argv.len() {
        return usage_error("trap", "usage: trap [action] condition...");
    }
    for name in &argv[i..] {
        session.traps.set(Condition::parse(name), action.clone());
    }
    0
}

fn print_trap(cond: &Condition, action: &Action) {
    match action {
        Action::Command(cmd) => println!("trap -- '{cmd}' {cond}"),
        Action::Ignore => println!("trap -- '' {cond}"),
        Action::Default => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_a_command_trap() {
        let mut s = Session::new("test", std::env::temp_dir());
        run(&mut s, &["trap".to_string(), "echo bye".to_string(), "EXIT".to_string()]);
        assert_eq!(s.traps.get(&Condition::Exit), Some(&Action::Command("echo bye".to_string())));
    }

    #[test]
    fn dash_clears_trap() {
        let mut s = Session::new("test", std::env::temp_dir());
        s.traps.set(Condition::Exit, Action::Command("echo bye".to_string()));
        run(&mut s, &["trap".to_string(), "-".to_string(), "EXIT".to_string()]);
        assert_eq!(s.traps.get(&Condition::Exit), None);
    }
}
