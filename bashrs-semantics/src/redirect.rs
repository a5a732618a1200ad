// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Applying a command's [`Redirect`] list to the session's file-descriptor
//! table, and restoring it afterward.
//!
//! `bashrs-env::fd` only models *which* fd points at *what*; this module
//! performs the actual `open(2)`/`dup2(2)`-equivalent work via `std::fs` and
//! records the result, then undoes it through the same
//! [`bashrs_env::fd::RedirectionStack`] Bash itself uses to restore a simple
//! command's descriptors once it finishes.

use crate::expand::expand_word_scalar;
use crate::{ExecError, ExecResult};
use bashrs_env::fd::{FdBody, RedirectionStack};
use bashrs_env::option::Option as ShOption;
use bashrs_env::Session;
use bashrs_syntax::ast::{Redirect, RedirDirection, RedirFd, RedirTarget};
use std::fs::OpenOptions;
use std::rc::Rc;

/// Applies `redirects` in order, pushing undo entries onto `stack`. On
/// failure, any redirections already applied are left in place for the
/// caller to unwind via `stack` (mirroring Bash: a failed redirection in the
/// middle of a list still leaves the earlier ones active until the command
/// finishes "running" and its descriptors are restored).
pub fn apply(redirects: &[Redirect], session: &mut Session, stack: &mut RedirectionStack) -> ExecResult<()> {
    for redirect in redirects {
        apply_one(redirect, session, stack)?;
    }
    Ok(())
}

fn target_fd(redirect: &Redirect) -> i32 {
    match redirect.fd {
        RedirFd::Explicit(n) => n as i32,
        RedirFd::Both => 1,
        RedirFd::Default => match redirect.direction {
            RedirDirection::Input | RedirDirection::DupInput => 0,
            _ => 1,
        },
    }
}

fn apply_one(redirect: &Redirect, session: &mut Session, stack: &mut RedirectionStack) -> ExecResult<()> {
    let fd = target_fd(redirect);
    let previous = session.fds.get(fd).cloned();

    let body = match &redirect.direction {
        RedirDirection::Input => open_file(session, &redirect.target, false, false, false)?,
        RedirDirection::Output => {
            let clobber_guard = session.options.is_set(ShOption::Noclobber);
            open_file(session, &redirect.target, true, false, clobber_guard)?
        }
        RedirDirection::Append => open_file(session, &redirect.target, true, true, false)?,
        RedirDirection::Clobber => open_file(session, &redirect.target, true, false, false)?,
        RedirDirection::InputOutput => open_file_rw(session, &redirect.target)?,
        RedirDirection::DupInput | RedirDirection::DupOutput => dup_target(session, &redirect.target)?,
        RedirDirection::HereDoc | RedirDirection::HereString => heredoc_body(session, &redirect.target)?,
    };

    if redirect.fd == RedirFd::Both {
        let dup = body.clone();
        stack.push(2, session.fds.get(2).cloned());
        session.fds.set(2, dup);
    }

    stack.push(fd, previous);
    session.fds.set(fd, body);
    Ok(())
}

fn open_file(session: &mut Session, target: &RedirTarget, write: bool, append: bool, clobber_guard: bool) -> ExecResult<FdBody> {
    let RedirTarget::File(word) = target else {
        return Err(ExecError::BadSubstitution { message: "redirection target must be a filename".to_string() });
    };
    let path = expand_word_scalar(word, session)?;
    let resolved = session.working_dir.join(&path);
    let mut options = OpenOptions::new();
    if write {
        options.write(true).create(true);
        if append {
            options.append(true);
        } else if clobber_guard {
            options.create_new(true);
        } else {
            options.truncate(true);
        }
    } else {
        options.read(true);
    }
    let file = options.open(&resolved).map_err(|source| ExecError::Redirect { target: path, source })?;
    Ok(FdBody::File(Rc::new(file)))
}

fn open_file_rw(session: &mut Session, target: &RedirTarget) -> ExecResult<FdBody> {
    let RedirTarget::File(word) = target else {
        return Err(ExecError::BadSubstitution { message: "redirection target must be a filename".to_string() });
    };
    let path = expand_word_scalar(word, session)?;
    let resolved = session.working_dir.join(&path);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&resolved)
        .map_err(|source| ExecError::Redirect { target: path, source })?;
    Ok(FdBody::File(Rc::new(file)))
}

fn dup_target(session: &mut Session, target: &RedirTarget) -> ExecResult<FdBody> {
    match target {
        RedirTarget::Close => Ok(FdBody::Closed),
        RedirTarget::Fd(n) => Ok(session.fds.get(*n as i32).cloned().unwrap_or(FdBody::Closed)),
        RedirTarget::File(word) => {
            let text = expand_word_scalar(word, session)?;
            match text.parse::<i32>() {
                Ok(n) => Ok(session.fds.get(n).cloned().unwrap_or(FdBody::Closed)),
                Err(_) => Err(ExecError::BadSubstitution { message: format!("{text}: invalid file descriptor") }),
            }
        }
        RedirTarget::HereDoc { .. } | RedirTarget::HereDocPending { .. } => {
            Err(ExecError::BadSubstitution { message: "here-document used where a descriptor was expected".to_string() })
        }
    }
}

fn heredoc_body(session: &mut Session, target: &RedirTarget) -> ExecResult<FdBody> {
    let content = match target {
        RedirTarget::HereDoc { content, .. } => expand_word_scalar(content, session)?,
        RedirTarget::File(word) => expand_word_scalar(word, session)?,
        RedirTarget::HereDocPending { .. } => {
            return Err(ExecError::BadSubstitution {
                message: "here-document body was not resolved by the parser".to_string(),
            })
        }
        _ => String::new(),
    };
    let mut file = tempfile::tempfile().map_err(|source| ExecError::Redirect { target: "<<".to_string(), source })?;
    use std::io::{Seek, SeekFrom, Write};
    file.write_all(content.as_bytes()).map_err(|source| ExecError::Redirect { target: "<<".to_string(), source })?;
    file.seek(SeekFrom::Start(0)).map_err(|source| ExecError::Redirect { target: "<<".to_string(), source })?;
    Ok(FdBody::File(Rc::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashrs_syntax::source::Location;
    use bashrs_syntax::word::{Word, WordUnit};

    fn session() -> Session {
        Session::new("test", std::env::temp_dir())
    }

    #[test]
    fn heredoc_here_string_opens_readable_fd() {
        let mut session = session();
        let mut stack = RedirectionStack::new();
        let word = Word::with_units(vec![WordUnit::Literal("hi\n".to_string())], Location::dummy());
        let redirect = Redirect {
            fd: RedirFd::Default,
            direction: RedirDirection::HereString,
            target: RedirTarget::File(word),
            location: Location::dummy(),
        };
        apply(std::slice::from_ref(&redirect), &mut session, &mut stack).unwrap();
        assert!(session.fds.is_open(0));
    }

    #[test]
    fn unwind_restores_prior_state() {
        let mut session = session();
        let mut stack = RedirectionStack::new();
        let word = Word::with_units(vec![WordUnit::Literal("hi".to_string())], Location::dummy());
        let redirect = Redirect {
            fd: RedirFd::Default,
            direction: RedirDirection::HereString,
            target: RedirTarget::File(word),
            location: Location::dummy(),
        };
        apply(std::slice::from_ref(&redirect), &mut session, &mut stack).unwrap();
        stack.unwind(&mut session.fds);
        assert!(!session.fds.is_open(0));
    }
}
