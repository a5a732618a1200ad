// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `eval`, `source`/`.`, and `exec`.
//!
//! Grounded on yash-builtin's `eval`/`source`/`exec` modules, whose `eval`
//! re-parses its joined arguments and `source` re-parses a file's contents,
//! both run through the same `Command::execute` path as ordinary script
//! text; `exec` additionally calls down to the real `execve(2)` the way
//! yash's own `exec` built-in does through its `System` trait, here via
//! `libc` directly since this crate talks to the OS without `nix`.

use crate::common::runtime_error;
use bashrs_env::fd::FdBody;
use bashrs_env::Session;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;

pub fn eval(session: &mut Session, argv: &[String]) -> i32 {
    let code = argv[1..].join(" ");
    run_text(session, &code, "eval")
}

pub fn source(session: &mut Session, argv: &[String]) -> i32 {
    let Some(path) = argv.get(1) else {
        return runtime_error("source", "usage: source file [arguments]");
    };
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return runtime_error("source", format!("{path}: {e}")),
    };
    let pushed = argv.len() > 2;
    if pushed {
        session.push_positional_params(argv[2..].to_vec());
    }
    let status = run_text(session, &content, path);
    if pushed {
        session.pop_positional_params();
    }
    status
}

fn run_text(session: &mut Session, text: &str, name: &str) -> i32 {
    match bashrs_syntax::parse(text, name) {
        Ok(script) => match bashrs_semantics::exec::run_script(session, &script) {
            Ok(outcome) => outcome.status,
            Err(e) => runtime_error(name, e),
        },
        Err(e) => runtime_error(name, e),
    }
}

pub fn exec(session: &mut Session, argv: &[String]) -> i32 {
    if argv.len() < 2 {
        // `exec` with only redirections: those were already applied by the
        // simple-command path before dispatch, so there's nothing more to do.
        return 0;
    }
    let program = &argv[1];
    let Some(path) = resolve_path(session, program) else {
        return runtime_error("exec", format!("{program}: command not found"));
    };

    unsafe {
        for (name, value) in session.variables.exported() {
            if let (Ok(name), Ok(value)) = (CString::new(name), CString::new(value)) {
                libc::setenv(name.as_ptr(), value.as_ptr(), 1);
            }
        }
        for fd in 0..=2 {
            match session.fds.get(fd) {
                Some(FdBody::File(file)) => {
                    libc::dup2(file.as_raw_fd(), fd);
                }
                Some(FdBody::Closed) => {
                    libc::close(fd);
                }
                None => {}
            }
        }
    }
    let cpath = CString::new(path.as_os_str().as_bytes()).unwrap_or_default();
    let cargs: Vec<CString> = argv[1..].iter().map(|a| CString::new(a.as_str()).unwrap_or_default()).collect();
    let mut argv_ptrs: Vec<*const libc::c_char> = cargs.iter().map(|a| a.as_ptr()).collect();
    argv_ptrs.push(std::ptr::null());
    unsafe {
        libc::execv(cpath.as_ptr(), argv_ptrs.as_ptr());
    }
    runtime_error("exec", format!("{program}: {}", std::io::Error::last_os_error()))
}

fn resolve_path(session: &Session, name: &str) -> Option<std::path::PathBuf> {
    if name.contains('/') {
        let candidate = session.working_dir.join(name);
        return candidate.is_file().then_some(candidate);
    }
    let path_var = session.variables.get("PATH").map(|v| v.value.as_scalar()).unwrap_or_default();
    std::env::split_paths(&path_var).map(|dir| dir.join(name)).find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_runs_joined_arguments() {
        let mut s = Session::new("test", std::env::temp_dir());
        let status = eval(&mut s, &["eval".to_string(), "x=1".to_string()]);
        assert_eq!(status, 0);
        assert_eq!(s.variables.get("x").unwrap().value.as_scalar(), "1");
    }

    #[test]
    fn source_reports_missing_file() {
        let mut s = Session::new("test", std::env::temp_dir());
        let status = source(&mut s, &["source".to_string(), "/no/such/bashrs-test-file".to_string()]);
        assert_eq!(status, 1);
    }
}
