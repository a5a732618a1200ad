// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `export`, `unset`, `declare`/`typeset`, `local`, `readonly`, `shift`.
//!
//! Grounded on yash-builtin's `export`, `unset`, `typeset`, and `shift`
//! modules; generalized to Bash's `declare -aAilrxu` attribute set via
//! `bashrs_env::variable::Attributes` instead of yash's plainer `Export`-
//! only variable model.

use crate::common::usage_error;
use bashrs_env::variable::{Attributes, Value, Variable};
use bashrs_env::Session;

fn split_name_value(arg: &str) -> (&str, Option<&str>) {
    match arg.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (arg, None),
    }
}

pub fn export(session: &mut Session, argv: &[String]) -> i32 {
    let mut print = false;
    let mut names = Vec::new();
    for arg in &argv[1..] {
        match arg.as_str() {
            "-p" => print = true,
            "-n" => continue,
            other => names.push(other),
        }
    }
    if print || names.is_empty() {
        for name in session.variables.names() {
            if let Some(var) = session.variables.get(&name) {
                if var.is_exported() {
                    println!("declare -x {name}=\"{}\"", var.value.as_scalar());
                }
            }
        }
        return 0;
    }
    for arg in names {
        let (name, value) = split_name_value(arg);
        let mut var = session.variables.get(name).cloned().unwrap_or_else(|| Variable::new(""));
        if let Some(value) = value {
            var.value = Value::Scalar(value.to_string());
        }
        var.attributes |= Attributes::EXPORT;
        session.variables.assign(name, var);
    }
    0
}

pub fn unset(session: &mut Session, argv: &[String]) -> i32 {
    let mut as_function = false;
    let mut status = 0;
    for arg in &argv[1..] {
        match arg.as_str() {
            "-f" => as_function = true,
            "-v" => as_function = false,
            name => {
                if as_function {
                    session.functions.remove(name);
                } else if let Some(var) = session.variables.get(name) {
                    if var.is_readonly() {
                        status = usage_error("unset", format!("{name}: cannot unset: readonly variable"));
                        continue;
                    }
                    session.variables.unset(name);
                }
            }
        }
    }
    status
}

/// Shared by `declare`/`typeset`/`local`/`readonly`: consumes the leading
/// `-aAilrux` option cluster(s), returning the combined attribute flags and
/// the index of the first operand.
fn parse_attribute_flags(argv: &[String]) -> (Attributes, bool, usize) {
    let mut attrs = Attributes::empty();
    let mut print = false;
    let mut i = 1;
    while i < argv.len() {
        let arg = &argv[i];
        if arg == "--" {
            i += 1;
            break;
        }
        if !arg.starts_with('-') || arg.len() < 2 {
            break;
        }
        for flag in arg.chars().skip(1) {
            match flag {
                'a' => attrs |= Attributes::ARRAY,
                'A' => attrs |= Attributes::ASSOC,
                'i' => attrs |= Attributes::INTEGER,
                'r' => attrs |= Attributes::READONLY,
                'x' => attrs |= Attributes::EXPORT,
                'l' => attrs |= Attributes::LOWERCASE,
                'u' => attrs |= Attributes::UPPERCASE,
                'p' => print = true,
                'g' => {}
                _ => {}
            }
        }
        i += 1;
    }
    (attrs, print, i)
}

fn print_declaration(name: &str, var: &Variable) {
    match &var.value {
        Value::Scalar(s) => println!("declare -- {name}=\"{s}\""),
        Value::IndexedArray(map) => {
            let body = map.iter().map(|(i, v)| format!("[{i}]=\"{v}\"")).collect::<Vec<_>>().join(" ");
            println!("declare -a {name}=({body})");
        }
        Value::AssociativeArray(map) => {
            let body = map.iter().map(|(k, v)| format!("[{k}]=\"{v}\"")).collect::<Vec<_>>().join(" ");
            println!("declare -A {name}=({body})");
        }
    }
}

pub fn declare(session: &mut Session, argv: &[String]) -> i32 {
    apply_declaration(session, argv, false)
}

pub fn local(session: &mut Session, argv: &[String]) -> i32 {
    apply_declaration(session, argv, true)
}

pub fn readonly(session: &mut Session, argv: &[String]) -> i32 {
    apply_declaration(session, argv, false)
}

fn apply_declaration(session: &mut Session, argv: &[String], local_scope: bool) -> i32 {
    let (mut attrs, print, start) = parse_attribute_flags(argv);
    if argv.first().map(String::as_str) == Some("readonly") {
        attrs |= Attributes::READONLY;
    }
    if print || start >= argv.len() {
        for name in session.variables.names() {
            if let Some(var) = session.variables.get(&name) {
                print_declaration(&name, var);
            }
        }
        return 0;
    }
    for arg in &argv[start..] {
        let (name, value) = split_name_value(arg);
        if local_scope {
            session.variables.declare_local(name);
        }
        let mut var = session.variables.get(name).cloned().unwrap_or_else(|| Variable::new(""));
        if var.is_readonly() && value.is_some() {
            return usage_error("declare", format!("{name}: readonly variable"));
        }
        if let Some(value) = value {
            let coerced = var.coerce(value.to_string());
            var.value = Value::Scalar(coerced);
        }
        var.attributes |= attrs;
        if local_scope {
            session.variables.assign_local(name, var);
        } else {
            session.variables.assign(name, var);
        }
    }
    0
}

pub fn shift(session: &mut Session, argv: &[String]) -> i32 {
    let n: usize = match argv.get(1) {
        Some(s) => match s.parse() {
            Ok(n) => n,
            Err(_) => return usage_error("shift", format!("{s}: numeric argument required")),
        },
        None => 1,
    };
    let frame = session.positional_params.last_mut().expect("positional frame always present");
    if n > frame.len() {
        return 1;
    }
    frame.drain(0..n);
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_marks_variable_exported() {
        let mut s = Session::new("test", std::env::temp_dir());
        export(&mut s, &["export".to_string(), "X=5".to_string()]);
        assert!(s.variables.get("X").unwrap().is_exported());
        assert_eq!(s.variables.get("X").unwrap().value.as_scalar(), "5");
    }

    #[test]
    fn unset_refuses_readonly() {
        let mut s = Session::new("test", std::env::temp_dir());
        readonly(&mut s, &["readonly".to_string(), "X=5".to_string()]);
        let status = unset(&mut s, &["unset".to_string(), "X".to_string()]);
        assert_eq!(status, 2);
        assert!(s.variables.contains("X"));
    }

    #[test]
    fn shift_drops_leading_params() {
        let mut s = Session::new("test", std::env::temp_dir());
        s.push_positional_params(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        shift(&mut s, &["shift".to_string(), "2".to_string()]);
        assert_eq!(s.positional_params(), ["c"]);
    }

    #[test]
    fn local_declares_in_innermost_scope() {
        let mut s = Session::new("test", std::env::temp_dir());
        s.variables.assign("x", Variable::new("outer"));
        s.variables.push_scope();
        local(&mut s, &["local".to_string(), "x=inner".to_string()]);
        assert_eq!(s.variables.get("x").unwrap().value.as_scalar(), "inner");
        s.variables.pop_scope();
        assert_eq!(s.variables.get("x").unwrap().value.as_scalar(), "outer");
    }
}
