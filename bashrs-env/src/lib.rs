// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Shell session state: variables, functions, aliases, options, the job and
//! file-descriptor tables, traps, and the other mutable state a running
//! script accumulates.
//!
//! Grounded on yash-rs's `yash-env` crate, whose `Env` aggregates exactly
//! this kind of state behind one handle threaded through the executor. This
//! crate keeps that shape — one [`Session`] struct owning a table per
//! concern — but trades yash's POSIX-scoped model for Bash's richer one:
//! array/attribute-bearing variables (`variable`), a flat function table
//! (`function`) instead of yash's subshell-cloned closures, and `extglob`/
//! `globstar`/`nullglob` among the recognized [`option::Option`]s.

pub mod alias;
pub mod builtin;
pub mod fd;
pub mod function;
pub mod job;
pub mod option;
pub mod trap;
pub mod variable;

use std::collections::HashMap;
use std::path::PathBuf;

/// One process-substitution or here-document temp resource the session owns
/// and must clean up. Tracked separately from [`fd::FdTable`] because these
/// are session-lifetime, not per-command.
#[derive(Debug)]
pub struct TempResource {
    pub path: PathBuf,
}

/// A host API loaded via `Session::load_api`: an out-of-process capability
/// (for example an embedding application's callback surface) a script can
/// invoke the way it would an external command. `bashrs-semantics` dispatches
/// to it when a simple command's name is `namespace.callable`.
pub trait HostApi {
    fn name(&self) -> &str;

    /// Invokes `callable` (the part of the command name after the `.`) with
    /// the full argument vector (`argv[0]` is still `namespace.callable`),
    /// returning its exit status, or `None` if this API has no such callable.
    fn call(&self, callable: &str, argv: &[String]) -> std::option::Option<i32>;
}

/// The state of one push/pop frame on [`Session::positional_params`] and
/// [`Session::executions`]: a function call, `.`/`source` invocation, or
/// the top-level script.
#[derive(Clone, Debug)]
pub struct Execution {
    pub script_name: String,
    pub positional_params: Vec<String>,
}

/// The special single-letter/punctuation variables Bash exposes outside the
/// ordinary variable table (`$?`, `$$`, `$!`, `$_`, `$0`, `PIPESTATUS`,
/// `BASH_REMATCH`, `RANDOM`, `SECONDS`, `LINENO`, `EPOCHSECONDS`,
/// `EPOCHREALTIME`). Kept distinct from [`variable::VariableSet`] since
/// several of them (`RANDOM`, `SECONDS`, `LINENO`) recompute on each read
/// rather than holding a fixed value.
#[derive(Clone, Debug, Default)]
pub struct SpecialVars {
    pub last_exit_status: i32,
    pub last_background_pid: std::option::Option<job::Pid>,
    pub last_word_of_previous_command: String,
    pub pipestatus: Vec<i32>,
    pub rematch: Vec<String>,
    pub seconds_offset: u64,
    pub line_number: u32,
}

/// A running shell's entire mutable state. `bashrs-semantics` holds one of
/// these per top-level invocation and clones it (state changes discarded,
/// inherited OS-level effects like open FDs preserved) to run a subshell.
pub struct Session {
    pub id: u64,
    pub script_name: String,
    pub variables: variable::VariableSet,
    pub functions: function::Functions,
    pub builtins: builtin::Builtins,
    pub aliases: alias::Aliases,
    pub options: option::Options,
    pub jobs: job::Jobs,
    pub traps: trap::Traps,
    pub fds: fd::FdTable,
    pub working_dir: PathBuf,
    pub dir_stack: Vec<PathBuf>,
    pub positional_params: Vec<Vec<String>>,
    pub special_vars: SpecialVars,
    pub executions: Vec<Execution>,
    pub temp_resources: Vec<TempResource>,
    pub host_apis: HashMap<String, Box<dyn HostApi>>,
    pub call_timeout: std::option::Option<std::time::Duration>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("script_name", &self.script_name)
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field("builtins", &self.builtins)
            .field("aliases", &self.aliases)
            .field("options", &self.options)
            .field("jobs", &self.jobs)
            .field("traps", &self.traps)
            .field("fds", &self.fds)
            .field("working_dir", &self.working_dir)
            .field("dir_stack", &self.dir_stack)
            .field("positional_params", &self.positional_params)
            .field("special_vars", &self.special_vars)
            .field("executions", &self.executions)
            .field("host_apis", &self.host_apis.keys().collect::<Vec<_>>())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(script_name: impl Into<String>, working_dir: PathBuf) -> Self {
        let script_name = script_name.into();
        Session {
            id: 0,
            script_name: script_name.clone(),
            variables: variable::VariableSet::new(),
            functions: function::Functions::new(),
            builtins: builtin::Builtins::new(),
            aliases: alias::Aliases::new(),
            options: option::Options::new(),
            jobs: job::Jobs::new(),
            traps: trap::Traps::new(),
            fds: fd::FdTable::new(),
            working_dir: working_dir.clone(),
            dir_stack: vec![working_dir],
            positional_params: vec![Vec::new()],
            special_vars: SpecialVars::default(),
            executions: vec![Execution { script_name, positional_params: Vec::new() }],
            temp_resources: Vec::new(),
            host_apis: HashMap::new(),
            call_timeout: None,
        }
    }

    /// The currently active positional parameter list (`$1`, `$2`, ... and
    /// `$#`), i.e. the top of [`Session::positional_params`].
    pub fn positional_params(&self) -> &[String] {
        self.positional_params.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push_positional_params(&mut self, params: Vec<String>) {
        self.positional_params.push(params);
    }

    pub fn pop_positional_params(&mut self) {
        if self.positional_params.len() > 1 {
            self.positional_params.pop();
        }
    }

    /// Registers a host API under `name`; later simple commands named
    /// `name` are dispatched to it instead of being looked up on `PATH`.
    pub fn load_api(&mut self, api: Box<dyn HostApi>) {
        self.host_apis.insert(api.name().to_string(), api);
    }

    /// Removes every tracked [`TempResource`] (process-substitution FIFOs
    /// and their holding directories, here-document spill files) from disk.
    /// Called once a script finishes running at its outermost level.
    pub fn cleanup_temp_resources(&mut self) {
        for resource in self.temp_resources.drain(..) {
            let _ = std::fs::remove_dir_all(&resource.path);
        }
    }

    /// Clones session state for a subshell: variables, functions, options,
    /// aliases, and the FD table are copied so the child's changes never
    /// propagate back, while the job table starts empty since a subshell's
    /// background jobs are not the parent's jobs (Bash's actual rule: a
    /// subshell waits for its own children before exiting).
    pub fn fork_subshell(&self) -> Session {
        Session {
            id: self.id,
            script_name: self.script_name.clone(),
            variables: self.variables.clone(),
            functions: self.functions.clone(),
            builtins: self.builtins.clone(),
            aliases: self.aliases.clone(),
            options: self.options.clone(),
            jobs: job::Jobs::new(),
            traps: self.traps.clone(),
            fds: self.fds.clone(),
            working_dir: self.working_dir.clone(),
            dir_stack: self.dir_stack.clone(),
            positional_params: self.positional_params.clone(),
            special_vars: self.special_vars.clone(),
            executions: self.executions.clone(),
            temp_resources: Vec::new(),
            host_apis: HashMap::new(),
            call_timeout: self.call_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_one_positional_frame() {
        let session = Session::new("script.sh", PathBuf::from("/tmp"));
        assert!(session.positional_params().is_empty());
        assert_eq!(session.executions.len(), 1);
    }

    #[test]
    fn push_and_pop_positional_params() {
        let mut session = Session::new("script.sh", PathBuf::from("/tmp"));
        session.push_positional_params(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(session.positional_params(), ["a", "b"]);
        session.pop_positional_params();
        assert!(session.positional_params().is_empty());
    }

    #[test]
    fn fork_subshell_starts_with_empty_jobs() {
        let mut session = Session::new("script.sh", PathBuf::from("/tmp"));
        session.jobs.add(job::Job::new(123, "sleep 1"));
        let child = session.fork_subshell();
        assert_eq!(child.jobs.iter().count(), 0);
        assert_eq!(session.jobs.iter().count(), 1);
    }
}
