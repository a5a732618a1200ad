// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Evaluation of `[ args ]` (POSIX `test`) and `[[ expr ]]` (Bash's own
//! conditional-expression grammar).

use crate::expand::expand_word_scalar;
use crate::{ExecError, ExecResult};
use bashrs_env::Session;
use bashrs_fnmatch::{without_escape, Config, Pattern};
use bashrs_syntax::ast::{TestCommand, TestExpression};
use regex::Regex;

/// Evaluates `[[ expr ]]`, returning whether it is true.
pub fn eval_test_expression(expr: &TestExpression, session: &mut Session) -> ExecResult<bool> {
    Ok(match expr {
        TestExpression::Word(w) => !expand_word_scalar(w, session)?.is_empty(),
        TestExpression::Unary { op, operand } => {
            let value = expand_word_scalar(operand, session)?;
            eval_unary(op, &value, session)
        }
        TestExpression::Binary { op, lhs, rhs } => {
            let l = expand_word_scalar(lhs, session)?;
            let r = expand_word_scalar(rhs, session)?;
            eval_binary(op, &l, &r, session)?
        }
        TestExpression::Regex { lhs, rhs } => {
            let l = expand_word_scalar(lhs, session)?;
            let pattern = expand_word_scalar(&rhs.word, session)?;
            let re = Regex::new(&pattern).map_err(|e| ExecError::BadSubstitution { message: e.to_string() })?;
            let matched = re.is_match(&l);
            if let Some(caps) = re.captures(&l) {
                session.special_vars.rematch =
                    caps.iter().map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default()).collect();
            }
            matched
        }
        TestExpression::Not(e) => !eval_test_expression(e, session)?,
        TestExpression::And(a, b) => eval_test_expression(a, session)? && eval_test_expression(b, session)?,
        TestExpression::Or(a, b) => eval_test_expression(a, session)? || eval_test_expression(b, session)?,
        TestExpression::Group(e) => eval_test_expression(e, session)?,
    })
}

fn eval_unary(op: &str, value: &str, session: &Session) -> bool {
    match op {
        "-z" => value.is_empty(),
        "-n" => !value.is_empty(),
        "-e" | "-a" => session.working_dir.join(value).exists() || std::path::Path::new(value).exists(),
        "-f" => path_for(session, value).is_file(),
        "-d" => path_for(session, value).is_dir(),
        "-r" | "-w" | "-x" => path_for(session, value).exists(),
        "-s" => path_for(session, value).metadata().map(|m| m.len() > 0).unwrap_or(false),
        "-L" | "-h" => path_for(session, value).symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false),
        "-v" => session.variables.contains(value),
        "-o" => bashrs_env::option::Option::from_name(value).is_some_and(|o| session.options.is_set(o)),
        _ => false,
    }
}

fn path_for(session: &Session, value: &str) -> std::path::PathBuf {
    let p = std::path::Path::new(value);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        session.working_dir.join(p)
    }
}

fn eval_binary(op: &str, l: &str, r: &str, session: &Session) -> ExecResult<bool> {
    Ok(match op {
        "=" | "==" => glob_matches(l, r, session)?,
        "!=" => !glob_matches(l, r, session)?,
        "<" => l < r,
        ">" => l > r,
        "-eq" => parse_int(l)? == parse_int(r)?,
        "-ne" => parse_int(l)? != parse_int(r)?,
        "-lt" => parse_int(l)? < parse_int(r)?,
        "-le" => parse_int(l)? <= parse_int(r)?,
        "-gt" => parse_int(l)? > parse_int(r)?,
        "-ge" => parse_int(l)? >= parse_int(r)?,
        "-nt" => path_newer(session, l, r),
        "-ot" => path_newer(session, r, l),
        "-ef" => path_for(session, l).canonicalize().ok() == path_for(session, r).canonicalize().ok(),
        _ => false,
    })
}

fn path_newer(session: &Session, a: &str, b: &str) -> bool {
    let ma = path_for(session, a).metadata().and_then(|m| m.modified());
    let mb = path_for(session, b).metadata().and_then(|m| m.modified());
    matches!((ma, mb), (Ok(ma), Ok(mb)) if ma > mb)
}

fn glob_matches(value: &str, pattern: &str, session: &Session) -> ExecResult<bool> {
    let extglob = session.options.is_set(bashrs_env::option::Option::Extglob);
    let config = Config { anchor_begin: true, anchor_end: true, extglob, ..Config::default() };
    let pat = Pattern::parse(without_escape(pattern), config)?;
    Ok(pat.is_match(value))
}

fn parse_int(s: &str) -> ExecResult<i64> {
    s.trim().parse::<i64>().map_err(|_| ExecError::BadSubstitution { message: format!("{s}: integer expression expected") })
}

/// Evaluates `[ args ]`: POSIX `test`'s much simpler grammar, expressed
/// directly over the already-expanded argument words rather than built out
/// of [`TestExpression`] nodes (Bash parses `[` arguments, not `[[` syntax).
pub fn eval_test_command(cmd: &TestCommand, session: &mut Session) -> ExecResult<bool> {
    let mut args = Vec::with_capacity(cmd.args.len());
    for w in &cmd.args {
        args.push(expand_word_scalar(w, session)?);
    }
    eval_test_args(&args, session)
}

fn eval_test_args(args: &[String], session: &Session) -> ExecResult<bool> {
    match args {
        [] => Ok(false),
        [single] => Ok(!single.is_empty()),
        [op, value] if op.starts_with('-') && op.len() == 2 => Ok(eval_unary(op, value, session)),
        [a, op, b] => eval_binary(op, a, b, session),
        ["!", rest @ ..] => Ok(!eval_test_args(rest, session)?),
        _ => Ok(!args.last().map(String::is_empty).unwrap_or(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashrs_syntax::source::Location;
    use bashrs_syntax::word::{Word, WordUnit};

    fn session() -> Session {
        Session::new("test", std::env::temp_dir())
    }

    fn word(s: &str) -> Word {
        Word::with_units(vec![WordUnit::Literal(s.to_string())], Location::dummy())
    }

    #[test]
    fn string_equality() {
        let mut session = session();
        let expr = TestExpression::Binary { op: "==".to_string(), lhs: word("abc"), rhs: word("a*c") };
        assert!(eval_test_expression(&expr, &mut session).unwrap());
    }

    #[test]
    fn numeric_comparison() {
        let mut session = session();
        let expr = TestExpression::Binary { op: "-lt".to_string(), lhs: word("3"), rhs: word("10") };
        assert!(eval_test_expression(&expr, &mut session).unwrap());
    }

    #[test]
    fn negation() {
        let mut session = session();
        let expr = TestExpression::Not(Box::new(TestExpression::Word(word(""))));
        assert!(eval_test_expression(&expr, &mut session).unwrap());
    }

    #[test]
    fn test_command_single_word() {
        let mut session = session();
        let cmd = TestCommand { args: vec![word("nonempty")] };
        assert!(eval_test_command(&cmd, &mut session).unwrap());
    }

    #[test]
    fn test_command_string_comparison() {
        let mut session = session();
        let cmd = TestCommand { args: vec![word("a"), word("="), word("a")] };
        assert!(eval_test_command(&cmd, &mut session).unwrap());
    }
}
