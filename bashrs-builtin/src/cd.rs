// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `cd` and `pwd`.
//!
//! Grounded on yash-builtin's `cd` and `pwd` modules, simplified to this
//! crate's `Session::working_dir` instead of yash's virtual-filesystem
//! `System` trait.

use crate::common::runtime_error;
use bashrs_env::variable::Variable;
use bashrs_env::Session;

pub fn run(session: &mut Session, argv: &[String]) -> i32 {
    let target = match argv.get(1) {
        Some(arg) if arg == "-" => match session.variables.get("OLDPWD") {
            Some(var) => var.value.as_scalar(),
            None => return runtime_error("cd", "OLDPWD not set"),
        },
        Some(arg) => arg.clone(),
        None => match session.variables.get("HOME") {
            Some(var) => var.value.as_scalar(),
            None => return runtime_error("cd", "HOME not set"),
        },
    };

    let new_dir = if target.starts_with('/') { std::path::PathBuf::from(&target) } else { session.working_dir.join(&target) };
    let canonical = match new_dir.canonicalize() {
        Ok(p) => p,
        Err(e) => return runtime_error("cd", format!("{target}: {e}")),
    };
    if !canonical.is_dir() {
        return runtime_error("cd", format!("{target}: not a directory"));
    }

    let old = session.working_dir.clone();
    session.working_dir = canonical.clone();
    *session.dir_stack.last_mut().expect("dir stack always non-empty") = canonical.clone();
    session.variables.assign("OLDPWD", Variable::new(old.to_string_lossy().into_owned()));
    session.variables.assign("PWD", Variable::new(canonical.to_string_lossy().into_owned()));
    0
}

pub fn pwd(session: &mut Session, _argv: &[String]) -> i32 {
    println!("{}", session.working_dir.display());
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_to_tmp_updates_working_dir_and_oldpwd() {
        let mut s = Session::new("test", std::env::temp_dir());
        let before = s.working_dir.clone();
        let status = run(&mut s, &["cd".to_string(), "/".to_string()]);
        assert_eq!(status, 0);
        assert_eq!(s.working_dir, std::path::Path::new("/"));
        assert_eq!(s.variables.get("OLDPWD").unwrap().value.as_scalar(), before.to_string_lossy());
    }

    #[test]
    fn cd_to_missing_directory_fails() {
        let mut s = Session::new("test", std::env::temp_dir());
        let status = run(&mut s, &["cd".to_string(), "/no/such/dir/bashrs-test".to_string()]);
        assert_eq!(status, 1);
    }
}
