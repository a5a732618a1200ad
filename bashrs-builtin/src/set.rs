// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `set`: toggles shell options and replaces the current positional
//! parameters.
//!
//! Grounded on yash-builtin's `set` module, which the same way walks a
//! `-o`/short-flag/operand split before handing the remainder to the
//! positional-parameter list.

use crate::common::usage_error;
use bashrs_env::option::Option as ShOption;
use bashrs_env::Session;

fn short_flag(c: char) -> std::option::Option<ShOption> {
    Some(match c {
        'e' => ShOption::Errexit,
        'u' => ShOption::Nounset,
        'x' => ShOption::Xtrace,
        'v' => ShOption::Verbose,
        'C' => ShOption::Noclobber,
        'a' => ShOption::Allexport,
        'f' => ShOption::Noglob,
        'm' => ShOption::Monitor,
        'h' => ShOption::Hashall,
        'B' => ShOption::Braceexpand,
        _ => return None,
    })
}

pub fn run(session: &mut Session, argv: &[String]) -> i32 {
    let mut i = 1;
    while i < argv.len() {
        let arg = &argv[i];
        if arg == "--" {
            i += 1;
            break;
        }
        if arg == "-o" || arg == "+o" {
            let enable = arg == "-o";
            i += 1;
            match argv.get(i) {
                Some(name) => match ShOption::from_name(name) {
                    Some(opt) => session.options.set(opt, enable),
                    None => return usage_error("set", format!("{name}: invalid option name")),
                },
                None => {
                    for opt in ShOption::ALL {
                        println!("{:<15} {}", opt.name(), if session.options.is_set(*opt) { "on" } else { "off" });
                    }
                }
            }
            i += 1;
            continue;
        }
        if (arg.starts_with('-') || arg.starts_with('+')) && arg.len() > 1 {
            let enable = arg.starts_with('-');
            for flag in arg.chars().skip(1) {
                if let Some(opt) = short_flag(flag) {
                    session.options.set(opt, enable);
                }
            }
            i += 1;
            continue;
        }
        break;
    }
    if i < argv.len() {
        if let Some(frame) = session.positional_params.last_mut() {
            *frame = argv[i..].to_vec();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_e_sets_errexit() {
        let mut s = Session::new("test", std::env::temp_dir());
        run(&mut s, &["set".to_string(), "-e".to_string()]);
        assert!(s.options.is_set(ShOption::Errexit));
    }

    #[test]
    fn plus_e_clears_errexit() {
        let mut s = Session::new("test", std::env::temp_dir());
        s.options.set(ShOption::Errexit, true);
        run(&mut s, &["set".to_string(), "+e".to_string()]);
        assert!(!s.options.is_set(ShOption::Errexit));
    }

    #[test]
    fn trailing_operands_become_positional_params() {
        let mut s = Session::new("test", std::env::temp_dir());
        run(&mut s, &["set".to_string(), "--".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(s.positional_params(), ["a", "b"]);
    }
}
