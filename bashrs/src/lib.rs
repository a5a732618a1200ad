// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The embedding API: `parse`/`validate`/`format`/`run`/`run_file` over a
//! [`Session`], plus re-exports of the subcrates that implement them.
//!
//! Grounded on yash-rs's `yash` crate, which the same way sits above its
//! subcrates (`yash-arith`, `yash-env`, `yash-semantics`, ...) re-exporting
//! them and wiring a runnable whole together; generalized from its async
//! `bin_main`/`futures_executor::LocalPool` shape to a synchronous call,
//! since nothing below this crate is async (see `DESIGN.md`). Process-level
//! output capture (stdout/stderr sinks, `ExecutionResult`) is this crate's
//! own addition: no subcrate needs it, since builtins write straight to the
//! process's real file descriptors.

pub use bashrs_arith as arith;
pub use bashrs_builtin as builtin;
pub use bashrs_env as env;
pub use bashrs_fnmatch as fnmatch;
pub use bashrs_quote as quote;
pub use bashrs_semantics as semantics;
pub use bashrs_syntax::{ast, parser, source, Diagnostic, Script};

use bashrs_env::option::Option as ShOption;
use bashrs_env::variable::{Attributes, Variable};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// A function a script can invoke as `namespace.name`, registered through
/// [`Session::load_api`].
pub type Callable = Rc<dyn Fn(&[String]) -> i32>;

/// A sink a [`Session`] forwards captured stdout/stderr bytes to once a
/// [`run`]/[`run_file`] call finishes. Unlike `HostApi`'s per-command
/// granularity, the whole run's output is delivered as one chunk, since
/// this crate captures it by redirecting the real file descriptors to a
/// spill file rather than interposing on every write (see `DESIGN.md`).
pub type Sink = Rc<dyn Fn(&[u8])>;

/// Configuration for [`Session::new`], mirroring the embedding API's
/// `Session::new(options)` constructor.
#[derive(Default)]
pub struct SessionOptions {
    pub env: HashMap<String, String>,
    pub working_dir: std::option::Option<PathBuf>,
    pub args: Vec<String>,
    pub script_name: String,
    /// Shell options (`set -o`-style names: `errexit`, `nounset`, ...) to
    /// enable or disable before the first command runs.
    pub options: HashMap<String, bool>,
    pub call_timeout: std::option::Option<Duration>,
    pub stdout_sink: std::option::Option<Sink>,
    pub stderr_sink: std::option::Option<Sink>,
    pub id: u64,
}

struct HostApiTable {
    namespace: String,
    callables: HashMap<String, Callable>,
}

impl bashrs_env::HostApi for HostApiTable {
    fn name(&self) -> &str {
        &self.namespace
    }

    fn call(&self, callable: &str, argv: &[String]) -> std::option::Option<i32> {
        self.callables.get(callable).map(|f| f(argv))
    }
}

/// A running shell, wrapping [`bashrs_env::Session`] with the output-capture
/// and host-API registration the embedding API adds on top.
pub struct Session {
    env: bashrs_env::Session,
    stdout_sink: std::option::Option<Sink>,
    stderr_sink: std::option::Option<Sink>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let working_dir = options.working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")));
        let mut env = bashrs_env::Session::new(options.script_name, working_dir);
        env.id = options.id;
        if !options.args.is_empty() {
            env.positional_params[0] = options.args;
        }
        for (name, value) in options.env {
            let mut var = Variable::new(value);
            var.attributes |= Attributes::EXPORT;
            env.variables.assign(&name, var);
        }
        for (name, enabled) in &options.options {
            if let Some(opt) = ShOption::from_name(name) {
                env.options.set(opt, *enabled);
            }
        }
        env.call_timeout = options.call_timeout;
        bashrs_builtin::register_all(&mut env);
        Session { env, stdout_sink: options.stdout_sink, stderr_sink: options.stderr_sink }
    }

    /// Binds `namespace.*` simple commands to `callable_table` for the rest
    /// of this session's lifetime.
    pub fn load_api(&mut self, namespace: impl Into<String>, callable_table: HashMap<String, Callable>) {
        self.env.load_api(Box::new(HostApiTable { namespace: namespace.into(), callables: callable_table }));
    }

    pub fn working_dir(&self) -> &Path {
        &self.env.working_dir
    }

    pub fn exit_status(&self) -> i32 {
        self.env.special_vars.last_exit_status
    }

    /// The underlying environment state, for callers that need lower-level
    /// access than `parse`/`run`/`run_file` expose.
    pub fn env(&self) -> &bashrs_env::Session {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut bashrs_env::Session {
        &mut self.env
    }
}

/// The result of one [`run`]/[`run_file`] call: captured output and the
/// resulting exit status.
pub struct ExecutionResult {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: i32,
    error: std::option::Option<String>,
}

impl ExecutionResult {
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The expansion/execution error that produced a nonzero status, if any
    /// (already appended to [`ExecutionResult::stderr`] as a diagnostic
    /// line; exposed separately for callers that want it structured).
    pub fn error(&self) -> std::option::Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunFileError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{0}")]
    Parse(Diagnostic),
}

/// Lexes, parses, and validates `source`, producing a [`Script`] or the
/// first diagnostic raised against it.
pub fn parse(source: &str) -> Result<Script, Diagnostic> {
    bashrs_syntax::parse(source, "<script>").map_err(|e| e.0)
}

/// `parse` without keeping the resulting AST around, for callers that only
/// want a yes/no syntax check.
pub fn validate(source: &str) -> Result<(), Diagnostic> {
    parse(source).map(|_| ())
}

/// Re-serializes `source` from its parsed form, normalizing whitespace the
/// way `Script`'s `Display` impl renders it.
pub fn format(source: &str) -> Result<String, Diagnostic> {
    parse(source).map(|script| script.to_string())
}

/// Parses and runs `source` in `session`, capturing everything it writes to
/// stdout/stderr.
pub fn run(source: &str, session: &mut Session) -> Result<ExecutionResult, Diagnostic> {
    let script = parse(source)?;
    Ok(execute(session, &script))
}

/// Reads `path`, sets it as the session's script name, and runs its
/// contents the way [`run`] runs a string.
pub fn run_file(path: impl AsRef<Path>, session: &mut Session) -> Result<ExecutionResult, RunFileError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| RunFileError::Io { path: path.to_path_buf(), source })?;
    session.env.script_name = path.display().to_string();
    run(&source, session).map_err(RunFileError::Parse)
}

fn execute(session: &mut Session, script: &Script) -> ExecutionResult {
    let (result, mut stdout, mut stderr) = capture_stdio(|| bashrs_semantics::exec::run_script(&mut session.env, script));
    session.env.cleanup_temp_resources();

    let (exit_code, error) = match result {
        Ok(outcome) => (exit_status_of(&outcome), None),
        Err(e) => {
            stderr.extend_from_slice(format!("{}: {e}\n", session.env.script_name).as_bytes());
            (1, Some(e.to_string()))
        }
    };
    session.env.special_vars.last_exit_status = exit_code;

    if let Some(sink) = &session.stdout_sink {
        sink(&stdout);
    }
    if let Some(sink) = &session.stderr_sink {
        sink(&stderr);
    }
    ExecutionResult { stdout, stderr, exit_code, error }
}

fn exit_status_of(outcome: &bashrs_semantics::Outcome) -> i32 {
    match outcome.divert {
        Some(bashrs_semantics::Divert::Exit(code)) => code.rem_euclid(256),
        _ => outcome.status,
    }
}

/// Redirects the process's real fd 1/fd 2 to spill files for the duration
/// of `f`, then restores them and returns what each captured. A spill file
/// rather than a pipe: a pipe would block this same single-threaded process
/// once the kernel buffer fills, since nothing is reading the other end
/// concurrently with `f` running.
fn capture_stdio<T>(f: impl FnOnce() -> T) -> (T, Vec<u8>, Vec<u8>) {
    let mut out_file = tempfile::tempfile().expect("tempfile for stdout capture");
    let mut err_file = tempfile::tempfile().expect("tempfile for stderr capture");

    std::io::stdout().flush().ok();
    std::io::stderr().flush().ok();
    let saved_out = unsafe { libc::dup(1) };
    let saved_err = unsafe { libc::dup(2) };
    unsafe {
        libc::dup2(out_file.as_raw_fd(), 1);
        libc::dup2(err_file.as_raw_fd(), 2);
    }

    let result = f();

    std::io::stdout().flush().ok();
    std::io::stderr().flush().ok();
    unsafe {
        libc::dup2(saved_out, 1);
        libc::dup2(saved_err, 2);
        libc::close(saved_out);
        libc::close(saved_err);
    }

    let mut out_bytes = Vec::new();
    let mut err_bytes = Vec::new();
    let _ = out_file.seek(SeekFrom::Start(0));
    let _ = err_file.seek(SeekFrom::Start(0));
    let _ = out_file.read_to_end(&mut out_bytes);
    let _ = err_file.read_to_end(&mut err_bytes);

    (result, out_bytes, err_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unclosed_group() {
        assert!(parse("{ echo hi").is_err());
    }

    #[test]
    fn format_round_trips_a_simple_command() {
        assert_eq!(format("echo hi\n").unwrap(), "echo hi\n");
    }

    #[test]
    fn run_captures_stdout_and_exit_code() {
        let mut session = Session::new(SessionOptions { script_name: "test".to_string(), ..Default::default() });
        let result = run("printf 'hello\\n'\n", &mut session).unwrap();
        assert_eq!(result.stdout(), b"hello\n");
        assert!(result.success());
    }

    #[test]
    fn run_file_reports_missing_file() {
        let mut session = Session::new(SessionOptions { script_name: "test".to_string(), ..Default::default() });
        let err = run_file("/no/such/bashrs-test-script.sh", &mut session).unwrap_err();
        assert!(matches!(err, RunFileError::Io { .. }));
    }

    #[test]
    fn load_api_dispatches_namespaced_commands() {
        let mut session = Session::new(SessionOptions { script_name: "test".to_string(), ..Default::default() });
        let mut table: HashMap<String, Callable> = HashMap::new();
        table.insert("greet".to_string(), Rc::new(|_argv: &[String]| {
            println!("hi from host");
            0
        }));
        session.load_api("host", table);
        let result = run("host.greet\n", &mut session).unwrap();
        assert_eq!(result.stdout(), b"hi from host\n");
        assert!(result.success());
    }
}
