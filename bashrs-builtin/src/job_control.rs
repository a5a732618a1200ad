// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `jobs`, `wait`, `kill`, `fg`, `bg`, `disown`.
//!
//! Grounded on yash-builtin's modules of the same names; signalling and
//! reaping go through `libc::kill`/`libc::waitpid` directly on the real pids
//! `bashrs-semantics::exec` now records (see its `exec_background`), rather
//! than through `nix`'s wrappers, matching `bashrs-env::job`'s own
//! libc-only convention.

use crate::common::runtime_error;
use bashrs_env::job::{Pid, Status};
use bashrs_env::Session;

pub fn jobs(session: &mut Session, _argv: &[String]) -> i32 {
    for (n, job) in session.jobs.iter() {
        println!("[{n}]  {job}");
    }
    0
}

/// Resolves a `wait`/`kill`/`fg`/`bg`/`disown` operand (`%1`, `%%`, `%-`, or
/// a bare pid) to a job-table number.
fn resolve_job(session: &Session, spec: &str) -> std::option::Option<u32> {
    if let Some(rest) = spec.strip_prefix('%') {
        match rest {
            "" | "%" | "+" => session.jobs.current_job(),
            "-" => session.jobs.previous_job(),
            n => n.parse::<u32>().ok().filter(|n| session.jobs.get(*n).is_some()),
        }
    } else {
        spec.parse::<Pid>().ok().and_then(|pid| session.jobs.find_by_pgid(pid))
    }
}

fn wait_one(session: &mut Session, number: u32) -> i32 {
    let Some(job) = session.jobs.get(number) else { return 127 };
    if !job.status.is_running() {
        return job.status.exit_code();
    }
    let pid = job.pgid;
    let mut raw = 0;
    unsafe {
        libc::waitpid(pid, &mut raw, 0);
    }
    let status = Status::from_wait_status(raw);
    if let Some(job) = session.jobs.get_mut(number) {
        job.status = status;
    }
    status.exit_code()
}

pub fn wait(session: &mut Session, argv: &[String]) -> i32 {
    if argv.len() == 1 {
        let numbers: Vec<u32> = session.jobs.iter().map(|(n, _)| n).collect();
        let mut last = 0;
        for n in numbers {
            last = wait_one(session, n);
        }
        return last;
    }
    let mut last = 0;
    for spec in &argv[1..] {
        match resolve_job(session, spec) {
            Some(n) => last = wait_one(session, n),
            None => {
                last = runtime_error("wait", format!("{spec}: no such job"));
            }
        }
    }
    last
}

fn parse_signal(name: &str) -> std::option::Option<i32> {
    if let Ok(n) = name.parse::<i32>() {
        return Some(n);
    }
    let name = name.strip_prefix("SIG").unwrap_or(name);
    Some(match name.to_ascii_uppercase().as_str() {
        "HUP" => libc::SIGHUP,
        "INT" => libc::SIGINT,
        "QUIT" => libc::SIGQUIT,
        "KILL" => libc::SIGKILL,
        "TERM" => libc::SIGTERM,
        "STOP" => libc::SIGSTOP,
        "CONT" => libc::SIGCONT,
        "USR1" => libc::SIGUSR1,
        "USR2" => libc::SIGUSR2,
        "PIPE" => libc::SIGPIPE,
        _ => return None,
    })
}

pub fn kill(session: &mut Session, argv: &[String]) -> i32 {
    let mut sig = libc::SIGTERM;
    let mut i = 1;
    if let Some(arg) = argv.get(i) {
        if arg == "-s" {
            i += 1;
            match argv.get(i).and_then(|s| parse_signal(s)) {
                Some(s) => sig = s,
                None => return runtime_error("kill", "invalid signal specification"),
            }
            i += 1;
        } else if let Some(name) = arg.strip_prefix('-') {
            if let Some(s) = parse_signal(name) {
                sig = s;
                i += 1;
            }
        }
    }
    if i >= argv.len() {
        return runtime_error("kill", "usage: kill [-signal] pid|%job ...");
    }
    let mut status = 0;
    for target in &argv[i..] {
        let pid = match resolve_job(session, target) {
            Some(n) => session.jobs.get(n).map(|j| j.pgid),
            None => target.parse::<Pid>().ok(),
        };
        match pid {
            Some(pid) => {
                if unsafe { libc::kill(pid, sig) } != 0 {
                    status = runtime_error("kill", format!("{target}: {}", std::io::Error::last_os_error()));
                }
            }
            None => status = runtime_error("kill", format!("{target}: no such job or process")),
        }
    }
    status
}

pub fn fg(session: &mut Session, argv: &[String]) -> i32 {
    let spec = argv.get(1).map(String::as_str).unwrap_or("%+");
    let Some(number) = resolve_job(session, spec) else {
        return runtime_error("fg", format!("{spec}: no such job"));
    };
    let Some(job) = session.jobs.get(number) else { return runtime_error("fg", format!("{spec}: no such job")) };
    println!("{}", job.name);
    let pid = job.pgid;
    unsafe { libc::kill(pid, libc::SIGCONT) };
    wait_one(session, number)
}

pub fn bg(session: &mut Session, argv: &[String]) -> i32 {
    let spec = argv.get(1).map(String::as_str).unwrap_or("%+");
    let Some(number) = resolve_job(session, spec) else {
        return runtime_error("bg", format!("{spec}: no such job"));
    };
    let Some(job) = session.jobs.get(number) else { return runtime_error("bg", format!("{spec}: no such job")) };
    let pid = job.pgid;
    unsafe { libc::kill(pid, libc::SIGCONT) };
    if let Some(job) = session.jobs.get_mut(number) {
        job.status = Status::Running;
    }
    0
}

pub fn disown(session: &mut Session, argv: &[String]) -> i32 {
    if argv.len() == 1 {
        let numbers: Vec<u32> = session.jobs.iter().map(|(n, _)| n).collect();
        for n in numbers {
            session.jobs.remove(n);
        }
        return 0;
    }
    let mut status = 0;
    for spec in &argv[1..] {
        match resolve_job(session, spec) {
            Some(n) => {
                session.jobs.remove(n);
            }
            None => status = runtime_error("disown", format!("{spec}: no such job")),
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashrs_env::job::Job;

    #[test]
    fn resolve_job_accepts_percent_number() {
        let mut s = Session::new("test", std::env::temp_dir());
        s.jobs.add(Job::new(4242, "sleep 100"));
        assert_eq!(resolve_job(&s, "%1"), Some(1));
    }

    #[test]
    fn disown_removes_without_signalling() {
        let mut s = Session::new("test", std::env::temp_dir());
        s.jobs.add(Job::new(4242, "sleep 100"));
        disown(&mut s, &["disown".to_string(), "%1".to_string()]);
        assert_eq!(s.jobs.iter().count(), 0);
    }
}
