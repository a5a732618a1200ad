// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The file descriptor table: open files, pipes, and here-document/coproc
//! endpoints, plus the stack of saved descriptors redirections restore on
//! exit from the command that set them up.

use std::fs::File;
use std::rc::Rc;

/// What a tracked file descriptor is backed by. `Coproc` holds the pipe ends
/// to a `coproc`-spawned background process; everything else, including
/// pipeline stages and ordinary file redirections, is a plain `File` (a pipe
/// read/write end is a `File` on Unix once wrapped via `File::from`).
#[derive(Clone)]
pub enum FdBody {
    File(Rc<File>),
    Closed,
}

impl std::fmt::Debug for FdBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FdBody::File(_) => f.write_str("FdBody::File(..)"),
            FdBody::Closed => f.write_str("FdBody::Closed"),
        }
    }
}

/// The session's view of open file descriptors, indexed by FD number. This
/// is bookkeeping only: `bashrs-semantics` is responsible for performing the
/// actual `dup2`/`open`/`close` system calls and recording the result here
/// through [`FdTable::set`] so `exec >file`, `2>&1`, and subshell FD
/// inheritance can all consult one source of truth.
#[derive(Clone, Debug, Default)]
pub struct FdTable {
    table: std::collections::BTreeMap<i32, FdBody>,
}

impl FdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, fd: i32, body: FdBody) {
        self.table.insert(fd, body);
    }

    pub fn get(&self, fd: i32) -> std::option::Option<&FdBody> {
        self.table.get(&fd)
    }

    pub fn close(&mut self, fd: i32) {
        self.table.insert(fd, FdBody::Closed);
    }

    pub fn is_open(&self, fd: i32) -> bool {
        matches!(self.table.get(&fd), Some(FdBody::File(_)))
    }
}

/// A single saved-FD entry pushed when a redirection temporarily takes over
/// a descriptor, so the prior binding (or absence of one) can be restored
/// once the redirected command finishes. Mirrors Bash's per-command
/// redirection-undo stack.
#[derive(Debug)]
pub struct SavedFd {
    pub fd: i32,
    pub previous: std::option::Option<FdBody>,
}

#[derive(Debug, Default)]
pub struct RedirectionStack {
    saved: Vec<SavedFd>,
}

impl RedirectionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fd: i32, previous: std::option::Option<FdBody>) {
        self.saved.push(SavedFd { fd, previous });
    }

    /// Pops and applies all saves back to `table`, in reverse order, as is
    /// done when a simple command with redirections finishes.
    pub fn unwind(&mut self, table: &mut FdTable) {
        while let Some(saved) = self.saved.pop() {
            match saved.previous {
                Some(body) => table.set(saved.fd, body),
                None => {
                    table.table.remove(&saved.fd);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_marks_closed_not_open() {
        let mut table = FdTable::new();
        table.set(3, FdBody::Closed);
        assert!(!table.is_open(3));
    }

    #[test]
    fn unwind_restores_previous_binding() {
        let mut table = FdTable::new();
        table.set(1, FdBody::Closed);
        let mut stack = RedirectionStack::new();
        stack.push(1, Some(FdBody::Closed));
        stack.unwind(&mut table);
        assert!(matches!(table.get(1), Some(FdBody::Closed)));
    }

    #[test]
    fn unwind_removes_entry_when_previously_absent() {
        let mut table = FdTable::new();
        table.set(5, FdBody::Closed);
        let mut stack = RedirectionStack::new();
        stack.push(5, None);
        stack.unwind(&mut table);
        assert!(table.get(5).is_none());
    }
}
