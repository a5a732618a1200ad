// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The job table: background pipelines, `jobs`/`fg`/`bg`/`wait`/`disown`
//! bookkeeping, and `$!`/`$?`'s job-exit-status source.

use std::fmt;

/// A process ID. Plain `i32` rather than `nix::unistd::Pid` since
/// `bashrs-env` talks to the OS through `libc` directly (see
/// `DESIGN.md` for why this crate doesn't pull in `nix`).
pub type Pid = i32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Running,
    Stopped(i32),
    Exited(i32),
    Signaled(i32),
}

impl Status {
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// The `$?`-style exit status: 128+signal for a signaled process.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Exited(code) => code,
            Status::Signaled(sig) => 128 + sig,
            Status::Stopped(sig) => 128 + sig,
            Status::Running => 0,
        }
    }

    /// Decodes a raw `waitpid(2)` status word into a [`Status`], using the
    /// same bit layout `<sys/wait.h>`'s `WIFEXITED`/`WIFSIGNALED`/
    /// `WIFSTOPPED` macros read (not exposed as functions by the `libc`
    /// crate, so the bit tests are inlined here).
    pub fn from_wait_status(raw: i32) -> Self {
        let low = raw & 0x7f;
        if low == 0 {
            Status::Exited((raw >> 8) & 0xff)
        } else if low == 0x7f {
            Status::Stopped((raw >> 8) & 0xff)
        } else {
            Status::Signaled(low)
        }
    }
}

/// One background pipeline, tracked by its process group leader.
#[derive(Clone, Debug)]
pub struct Job {
    pub pgid: Pid,
    pub job_controlled: bool,
    pub status: Status,
    /// The command line as typed, shown by `jobs`.
    pub name: String,
}

impl Job {
    pub fn new(pgid: Pid, name: impl Into<String>) -> Self {
        Job { pgid, job_controlled: false, status: Status::Running, name: name.into() }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.status {
            Status::Running => "Running",
            Status::Stopped(_) => "Stopped",
            Status::Exited(0) => "Done",
            Status::Exited(code) => return write!(f, "Exit {code}   {}", self.name),
            Status::Signaled(sig) => return write!(f, "Signal {sig}   {}", self.name),
        };
        write!(f, "{state}   {}", self.name)
    }
}

/// A 1-indexed job-number table, mirroring Bash's `jobs`/`%1`/`%+`/`%-`
/// numbering: the `+` job (current) is the most recently backgrounded or
/// stopped job, the `-` job (previous) the one before that.
#[derive(Clone, Debug, Default)]
pub struct Jobs {
    table: std::collections::BTreeMap<u32, Job>,
    next_number: u32,
    current: std::option::Option<u32>,
    previous: std::option::Option<u32>,
}

impl Jobs {
    pub fn new() -> Self {
        Jobs { table: Default::default(), next_number: 1, current: None, previous: None }
    }

    pub fn add(&mut self, job: Job) -> u32 {
        let number = self.next_number;
        self.next_number += 1;
        self.table.insert(number, job);
        self.previous = self.current;
        self.current = Some(number);
        number
    }

    pub fn get(&self, number: u32) -> std::option::Option<&Job> {
        self.table.get(&number)
    }

    pub fn get_mut(&mut self, number: u32) -> std::option::Option<&mut Job> {
        self.table.get_mut(&number)
    }

    pub fn remove(&mut self, number: u32) -> std::option::Option<Job> {
        let job = self.table.remove(&number);
        if self.current == Some(number) {
            self.current = self.previous.take();
        } else if self.previous == Some(number) {
            self.previous = None;
        }
        job
    }

    pub fn current_job(&self) -> std::option::Option<u32> {
        self.current
    }

    pub fn previous_job(&self) -> std::option::Option<u32> {
        self.previous
    }

    pub fn find_by_pgid(&self, pgid: Pid) -> std::option::Option<u32> {
        self.table.iter().find(|(_, j)| j.pgid == pgid).map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Job)> {
        self.table.iter().map(|(n, j)| (*n, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_sequential_numbers() {
        let mut jobs = Jobs::new();
        let a = jobs.add(Job::new(100, "sleep 1"));
        let b = jobs.add(Job::new(101, "sleep 2"));
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(jobs.current_job(), Some(b));
        assert_eq!(jobs.previous_job(), Some(a));
    }

    #[test]
    fn remove_promotes_previous_to_current() {
        let mut jobs = Jobs::new();
        let a = jobs.add(Job::new(100, "sleep 1"));
        let b = jobs.add(Job::new(101, "sleep 2"));
        jobs.remove(b);
        assert_eq!(jobs.current_job(), Some(a));
    }

    #[test]
    fn exit_code_for_signaled_process() {
        assert_eq!(Status::Signaled(9).exit_code(), 137);
    }

    #[test]
    fn from_wait_status_decodes_exit_and_signal() {
        assert_eq!(Status::from_wait_status(0), Status::Exited(0));
        assert_eq!(Status::from_wait_status(1 << 8), Status::Exited(1));
        assert_eq!(Status::from_wait_status(9), Status::Signaled(9));
    }
}
