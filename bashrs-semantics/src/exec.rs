// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Command and pipeline execution: the `Command::execute`-equivalent of
//! yash-semantics, made synchronous and extended with Bash's compound
//! commands.
//!
//! Foreground pipelines made up entirely of external commands are wired
//! through real OS pipes via chained `std::process::Command`s, so they run
//! concurrently and stream without this process buffering their data --
//! the same bounded-memory property a pipeline of external Bash builtins
//! has in the real shell. A pipeline with a builtin or function stage falls
//! back to running each stage in turn with the previous stage's output held
//! in a temp file, since a synchronous in-process builtin can't run
//! concurrently with its neighbors without its own thread; see `DESIGN.md`.

use crate::expand::{expand_word_scalar, expand_words};
use crate::redirect;
use crate::test_expr::{eval_test_command, eval_test_expression};
use crate::{Divert, ExecError, ExecResult, Outcome};
use bashrs_env::fd::{FdBody, RedirectionStack};
use bashrs_env::option::Option as ShOption;
use bashrs_env::variable::{Attributes, Value, Variable};
use bashrs_env::Session;
use bashrs_syntax::ast::*;
use bashrs_syntax::token::Token;
use std::ffi::CString;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::process::Stdio;
use std::rc::Rc;

/// Runs a whole script (the top level, a function body, or a `.`/`source`d
/// file) in `session`, returning the exit status of the last command run.
/// Non-local control transfers (`break`/`continue`/`return`) that escape
/// every enclosing loop/function are reported on the returned [`Outcome`]
/// for the caller to handle or propagate further.
pub fn run_script(session: &mut Session, script: &Script) -> ExecResult<Outcome> {
    let mut last = Outcome::status(0);
    for item in &script.items {
        last = exec_item(session, item)?;
        session.special_vars.last_exit_status = last.status;
        if last.divert.is_some() {
            return Ok(last);
        }
        if last.status != 0 && session.options.is_set(ShOption::Errexit) && !item_is_condition_context(item) {
            return Ok(Outcome::diverting(last.status, Divert::Exit(last.status)));
        }
    }
    Ok(last)
}

/// `errexit` does not fire for a command that is itself part of an `&&`/
/// `||` chain, tests a `while`/`until`/`if` condition, or is negated with
/// `!` -- this only inspects the and-or chaining, since loop/if condition
/// handling already runs the condition through a path that doesn't consult
/// `errexit` at all.
fn item_is_condition_context(item: &Item) -> bool {
    !item.and_or.rest.is_empty()
}

fn exec_item(session: &mut Session, item: &Item) -> ExecResult<Outcome> {
    if item.separator == Some(Separator::Background) {
        return exec_background(session, &item.and_or);
    }
    exec_and_or(session, &item.and_or)
}

fn exec_and_or(session: &mut Session, list: &AndOrList) -> ExecResult<Outcome> {
    let mut outcome = exec_pipeline(session, &list.first)?;
    for (op, pipeline) in &list.rest {
        if outcome.divert.is_some() {
            return Ok(outcome);
        }
        let take = match op {
            AndOr::And => outcome.status == 0,
            AndOr::Or => outcome.status != 0,
        };
        if !take {
            continue;
        }
        outcome = exec_pipeline(session, pipeline)?;
    }
    Ok(outcome)
}

/// Backgrounds `list` as a real OS process via `fork(2)`, so `$!` is a real
/// pid that `kill %n` and `wait` can act on. A lone external simple command
/// is `exec`'d directly in the child, the same fork-then-exec shape
/// `exec_external` uses in the foreground, so signalling the job's pid
/// reaches the real command with no shell process left behind to leak.
/// Anything else (a builtin, function, or compound command) runs out its
/// whole `list` in the forked child instead, since those dispatch through
/// in-process closures that can't be `exec`'d into.
fn exec_background(session: &mut Session, list: &AndOrList) -> ExecResult<Outcome> {
    if let Some((path, argv)) = single_external_invocation(session, list)? {
        return spawn_background_external(session, &path, &argv, describe_and_or(list));
    }
    spawn_background_fork(session, list)
}

/// Recognizes the common case of `&` backgrounding a single external
/// command with no pipeline, negation, or prefix assignment, returning the
/// resolved program path and expanded argv.
fn single_external_invocation(session: &mut Session, list: &AndOrList) -> ExecResult<Option<(std::path::PathBuf, Vec<String>)>> {
    if !list.rest.is_empty() || list.first.negate || list.first.commands.len() != 1 {
        return Ok(None);
    }
    let Command::Simple(simple) = &list.first.commands[0] else { return Ok(None) };
    if simple.words.is_empty() || !simple.prefix_assigns.is_empty() {
        return Ok(None);
    }
    let argv = expand_words(&simple.words, session)?;
    let name = &argv[0];
    if session.functions.contains(name) || session.builtins.contains(name) {
        return Ok(None);
    }
    Ok(search_path(session, name).map(|path| (path, argv)))
}

fn spawn_background_external(session: &mut Session, path: &std::path::Path, argv: &[String], desc: String) -> ExecResult<Outcome> {
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(ExecError::Exec { command: argv[0].clone(), source: std::io::Error::last_os_error() });
    }
    if pid == 0 {
        unsafe {
            for (name, value) in session.variables.exported() {
                if let (Ok(name), Ok(value)) = (CString::new(name), CString::new(value)) {
                    libc::setenv(name.as_ptr(), value.as_ptr(), 1);
                }
            }
            if let Ok(cwd) = CString::new(session.working_dir.as_os_str().as_bytes()) {
                libc::chdir(cwd.as_ptr());
            }
            redirect_std_fds(session);
        }
        let cpath = CString::new(path.as_os_str().as_bytes()).unwrap_or_default();
        let cargs: Vec<CString> = argv.iter().map(|a| CString::new(a.as_str()).unwrap_or_default()).collect();
        let mut argv_ptrs: Vec<*const libc::c_char> = cargs.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(std::ptr::null());
        unsafe {
            libc::execv(cpath.as_ptr(), argv_ptrs.as_ptr());
        }
        libc::_exit(127);
    }
    let job = bashrs_env::job::Job::new(pid, desc);
    session.jobs.add(job);
    session.special_vars.last_background_pid = Some(pid);
    Ok(Outcome::status(0))
}

/// Forks and runs all of `list` in the child, exiting with its status; used
/// for anything backgrounded that isn't a single external command.
fn spawn_background_fork(session: &mut Session, list: &AndOrList) -> ExecResult<Outcome> {
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(ExecError::Exec { command: "fork".to_string(), source: std::io::Error::last_os_error() });
    }
    if pid == 0 {
        unsafe { redirect_std_fds(session) };
        let status = match exec_and_or(session, list) {
            Ok(outcome) => outcome.status,
            Err(_) => 127,
        };
        std::process::exit(status);
    }
    let job = bashrs_env::job::Job::new(pid, describe_and_or(list));
    session.jobs.add(job);
    session.special_vars.last_background_pid = Some(pid);
    Ok(Outcome::status(0))
}

/// Duplicates the session's tracked fds 0/1/2 onto the real descriptors of
/// that slot, for a child about to `exec` or run standalone after `fork`.
unsafe fn redirect_std_fds(session: &Session) {
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

fn describe_and_or(list: &AndOrList) -> String {
    list.first.commands.first().map(|c| c.to_string()).unwrap_or_default()
}

fn exec_pipeline(session: &mut Session, pipeline: &Pipeline) -> ExecResult<Outcome> {
    let status = if pipeline.commands.len() == 1 {
        exec_command(session, &pipeline.commands[0])?
    } else if all_external(session, &pipeline.commands) {
        exec_external_pipeline(session, pipeline)?
    } else {
        exec_buffered_pipeline(session, pipeline)?
    };
    let mut status = status;
    if pipeline.negate {
        status.status = if status.status == 0 { 1 } else { 0 };
    }
    Ok(status)
}

fn command_name(session: &mut Session, command: &Command) -> Option<String> {
    match command {
        Command::Simple(s) if s.words.is_empty() => None,
        Command::Simple(s) => expand_word_scalar(&s.words[0], session).ok(),
        _ => None,
    }
}

fn all_external(session: &mut Session, commands: &[Command]) -> bool {
    commands.iter().all(|c| match c {
        Command::Simple(_) => match command_name(session, c) {
            Some(name) => {
                !session.functions.contains(&name) && !session.builtins.contains(&name) && search_path(session, &name).is_some()
            }
            None => false,
        },
        _ => false,
    })
}

/// A pipeline entirely of external commands: a genuine concurrent OS-process
/// chain, the same shape `std::process::Command` examples in the standard
/// library use for `cmd1 | cmd2`.
fn exec_external_pipeline(session: &mut Session, pipeline: &Pipeline) -> ExecResult<Outcome> {
    let n = pipeline.commands.len();
    let mut children = Vec::with_capacity(n);
    let mut next_stdin: Option<Stdio> = None;

    for (i, command) in pipeline.commands.iter().enumerate() {
        let Command::Simple(simple) = command else { unreachable!("checked by all_external") };
        let argv = expand_words(&simple.words, session)?;
        let Some(program) = argv.first() else { continue };
        let path = search_path(session, program).unwrap_or_else(|| program.into());
        let mut cmd = std::process::Command::new(path);
        cmd.args(&argv[1..]);
        cmd.current_dir(&session.working_dir);
        for (name, value) in session.variables.exported() {
            cmd.env(name, value);
        }
        cmd.stdin(next_stdin.take().unwrap_or(Stdio::inherit()));
        cmd.stdout(if i + 1 < n { Stdio::piped() } else { Stdio::inherit() });
        let mut child = cmd.spawn().map_err(|source| ExecError::Exec { command: program.clone(), source })?;
        if i + 1 < n {
            next_stdin = child.stdout.take().map(Stdio::from);
        }
        children.push(child);
    }

    let mut last_status = 0;
    let mut statuses = Vec::with_capacity(children.len());
    for mut child in children {
        let status = child.wait().map(|s| s.code().unwrap_or(1)).unwrap_or(127);
        statuses.push(status);
        last_status = status;
    }
    session.special_vars.pipestatus = statuses.clone();
    if session.options.is_set(ShOption::Pipefail) {
        last_status = statuses.into_iter().rev().find(|s| *s != 0).unwrap_or(0);
    }
    Ok(Outcome::status(last_status))
}

/// Runs each stage in turn, handing the previous stage's captured stdout to
/// the next one's stdin through a temp file. Used whenever a builtin or
/// function participates, since those execute synchronously in this
/// process rather than as an independently-scheduled OS process.
fn exec_buffered_pipeline(session: &mut Session, pipeline: &Pipeline) -> ExecResult<Outcome> {
    let n = pipeline.commands.len();
    let mut input: Option<Vec<u8>> = None;
    let mut last_status = 0;
    let mut statuses = Vec::with_capacity(n);

    for (i, command) in pipeline.commands.iter().enumerate() {
        let mut stack = RedirectionStack::new();
        if let Some(data) = &input {
            let mut file = tempfile::tempfile().map_err(|source| ExecError::Exec { command: "pipe".to_string(), source })?;
            file.write_all(data).map_err(|source| ExecError::Exec { command: "pipe".to_string(), source })?;
            file.seek(SeekFrom::Start(0)).map_err(|source| ExecError::Exec { command: "pipe".to_string(), source })?;
            stack.push(0, session.fds.get(0).cloned());
            session.fds.set(0, FdBody::File(Rc::new(file)));
        }
        let capture = i + 1 < n;
        let mut out_file = None;
        if capture {
            let file = tempfile::tempfile().map_err(|source| ExecError::Exec { command: "pipe".to_string(), source })?;
            stack.push(1, session.fds.get(1).cloned());
            session.fds.set(1, FdBody::File(Rc::new(file.try_clone().map_err(|source| ExecError::Exec {
                command: "pipe".to_string(),
                source,
            })?)));
            out_file = Some(file);
        }

        let outcome = exec_command(session, command)?;
        statuses.push(outcome.status);
        last_status = outcome.status;

        if let Some(mut file) = out_file {
            file.seek(SeekFrom::Start(0)).ok();
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).ok();
            input = Some(buf);
        }
        stack.unwind(&mut session.fds);
        if outcome.divert.is_some() {
            return Ok(outcome);
        }
    }
    session.special_vars.pipestatus = statuses.clone();
    if session.options.is_set(ShOption::Pipefail) {
        last_status = statuses.into_iter().rev().find(|s| *s != 0).unwrap_or(0);
    }
    Ok(Outcome::status(last_status))
}

fn exec_command(session: &mut Session, command: &Command) -> ExecResult<Outcome> {
    match command {
        Command::Simple(simple) => exec_simple(session, simple),
        Command::Compound(compound, redirects) => {
            let mut stack = RedirectionStack::new();
            redirect::apply(redirects, session, &mut stack)?;
            let outcome = exec_compound(session, compound);
            stack.unwind(&mut session.fds);
            outcome
        }
        Command::Function(def) => {
            session.functions.define((**def).clone());
            Ok(Outcome::status(0))
        }
    }
}

fn exec_simple(session: &mut Session, simple: &SimpleCommand) -> ExecResult<Outcome> {
    let mut stack = RedirectionStack::new();
    redirect::apply(&simple.redirects, session, &mut stack)?;

    let outcome = (|| -> ExecResult<Outcome> {
        if simple.words.is_empty() {
            for assign in &simple.prefix_assigns {
                perform_assignment(session, assign, false)?;
            }
            return Ok(Outcome::status(0));
        }

        session.variables.push_scope();
        for assign in &simple.prefix_assigns {
            perform_assignment(session, assign, true)?;
        }
        let argv = expand_words(&simple.words, session);
        let argv = match argv {
            Ok(a) => a,
            Err(e) => {
                session.variables.pop_scope();
                return Err(e);
            }
        };
        let result = dispatch(session, &argv);
        session.variables.pop_scope();
        result
    })();

    stack.unwind(&mut session.fds);
    outcome
}

fn dispatch(session: &mut Session, argv: &[String]) -> ExecResult<Outcome> {
    let Some(name) = argv.first() else { return Ok(Outcome::status(0)) };
    if let Some(def) = session.functions.get(name) {
        return exec_function(session, &def, argv);
    }
    if let Some(builtin) = session.builtins.get(name) {
        let status = (builtin.run)(session, argv);
        return Ok(Outcome::status(status));
    }
    if let Some((namespace, callable)) = name.split_once('.') {
        if let Some(status) = session.host_apis.get(namespace).and_then(|api| api.call(callable, argv)) {
            return Ok(Outcome::status(status));
        }
    }
    exec_external(session, argv)
}

fn exec_function(session: &mut Session, def: &FunctionDefinition, argv: &[String]) -> ExecResult<Outcome> {
    session.push_positional_params(argv[1..].to_vec());
    session.variables.push_scope();
    let result = exec_compound(session, &def.body);
    session.variables.pop_scope();
    session.pop_positional_params();
    match result {
        Ok(outcome) => match outcome.divert {
            Some(Divert::Return(code)) => Ok(Outcome::status(code)),
            _ => Ok(outcome),
        },
        Err(e) => Err(e),
    }
}

fn exec_external(session: &mut Session, argv: &[String]) -> ExecResult<Outcome> {
    let program = &argv[0];
    let path = search_path(session, program).ok_or_else(|| ExecError::CommandNotFound { command: program.clone() })?;
    let mut cmd = std::process::Command::new(path);
    cmd.args(&argv[1..]);
    cmd.current_dir(&session.working_dir);
    cmd.env_clear();
    for (name, value) in session.variables.exported() {
        cmd.env(name, value);
    }
    cmd.stdin(stdio_for(session, 0));
    cmd.stdout(stdio_for(session, 1));
    cmd.stderr(stdio_for(session, 2));
    let mut child = cmd.spawn().map_err(|source| ExecError::Exec { command: program.clone(), source })?;
    let status = child.wait().map_err(|source| ExecError::Exec { command: program.clone(), source })?;
    Ok(Outcome::status(status.code().unwrap_or(128)))
}

fn stdio_for(session: &Session, fd: i32) -> Stdio {
    match session.fds.get(fd) {
        Some(FdBody::File(file)) => file.try_clone().map(Stdio::from).unwrap_or_else(|_| Stdio::inherit()),
        Some(FdBody::Closed) => Stdio::null(),
        None => Stdio::inherit(),
    }
}

fn search_path(session: &Session, name: &str) -> Option<std::path::PathBuf> {
    if name.contains('/') {
        let candidate = session.working_dir.join(name);
        return candidate.is_file().then_some(candidate);
    }
    let path_var = session.variables.get("PATH").map(|v| v.value.as_scalar()).unwrap_or_default();
    std::env::split_paths(&path_var).map(|dir| dir.join(name)).find(|p| p.is_file())
}

fn perform_assignment(session: &mut Session, assignment: &Assignment, local: bool) -> ExecResult<()> {
    if let Some(existing) = session.variables.get(&assignment.name) {
        if existing.is_readonly() {
            return Err(ExecError::ReadonlyVariable { name: assignment.name.clone() });
        }
    }
    let mut var = match &assignment.value {
        AssignmentValue::Scalar(word) => {
            let text = expand_word_scalar(word, session)?;
            if assignment.append {
                if let Some(existing) = session.variables.get(&assignment.name) {
                    let mut combined = existing.value.as_scalar();
                    combined.push_str(&text);
                    Variable::new(combined)
                } else {
                    Variable::new(text)
                }
            } else {
                Variable::new(text)
            }
        }
        AssignmentValue::Array(elements) => {
            let mut map = std::collections::BTreeMap::new();
            let mut next_index = 0i64;
            for elem in elements {
                let value = expand_word_scalar(&elem.value, session)?;
                let index = match &elem.subscript {
                    Some(sub) => {
                        let text = expand_word_scalar(sub, session)?;
                        text.parse::<i64>().unwrap_or(next_index)
                    }
                    None => next_index,
                };
                map.insert(index, value);
                next_index = index + 1;
            }
            Variable { value: Value::IndexedArray(map), attributes: Attributes::ARRAY }
        }
    };
    if let Some(existing) = session.variables.get(&assignment.name) {
        var.attributes |= existing.attributes & !Attributes::ARRAY & !Attributes::ASSOC;
        if let Value::Scalar(s) = &var.value {
            let coerced = existing.attributes.contains(Attributes::LOWERCASE) || existing.attributes.contains(Attributes::UPPERCASE) || existing.attributes.contains(Attributes::INTEGER);
            if coerced {
                let mut tmp = var.clone();
                let new_text = tmp.coerce(s.clone());
                var.value = Value::Scalar(new_text);
            }
        }
    }
    if local {
        session.variables.assign_local(&assignment.name, var);
    } else {
        session.variables.assign(&assignment.name, var);
    }
    Ok(())
}

fn exec_compound(session: &mut Session, compound: &CompoundCommand) -> ExecResult<Outcome> {
    match compound {
        CompoundCommand::Group(script) => run_script(session, script),
        CompoundCommand::Subshell(script) => {
            let mut child = session.fork_subshell();
            let outcome = run_script(&mut child, script)?;
            session.special_vars.last_exit_status = outcome.status;
            Ok(outcome)
        }
        CompoundCommand::If(i) => exec_if(session, i),
        CompoundCommand::While(w) => exec_while(session, w),
        CompoundCommand::For(f) => exec_for(session, f),
        CompoundCommand::CFor(c) => exec_cfor(session, c),
        CompoundCommand::Case(c) => exec_case(session, c),
        CompoundCommand::TestCommand(t) => Ok(Outcome::status(if eval_test_command(t, session)? { 0 } else { 1 })),
        CompoundCommand::TestExpression(t) => Ok(Outcome::status(if eval_test_expression(t, session)? { 0 } else { 1 })),
        CompoundCommand::Arith(a) => exec_arith(session, a),
        CompoundCommand::Coproc(c) => exec_coproc(session, c),
    }
}

fn exec_if(session: &mut Session, i: &If) -> ExecResult<Outcome> {
    let cond = run_script(session, &i.condition)?;
    if cond.divert.is_some() {
        return Ok(cond);
    }
    if cond.status == 0 {
        return run_script(session, &i.body);
    }
    for (cond_script, body) in &i.elifs {
        let c = run_script(session, cond_script)?;
        if c.divert.is_some() {
            return Ok(c);
        }
        if c.status == 0 {
            return run_script(session, body);
        }
    }
    if let Some(else_body) = &i.else_body {
        return run_script(session, else_body);
    }
    Ok(Outcome::status(0))
}

fn exec_while(session: &mut Session, w: &WhileLoop) -> ExecResult<Outcome> {
    let mut last = Outcome::status(0);
    loop {
        let cond = run_script(session, &w.condition)?;
        if cond.divert.is_some() {
            return Ok(cond);
        }
        let continue_loop = if w.until { cond.status != 0 } else { cond.status == 0 };
        if !continue_loop {
            break;
        }
        last = run_script(session, &w.body)?;
        match last.divert {
            Some(Divert::Break(n)) => return Ok(unwind_loop_divert(n, last.status)),
            Some(Divert::Continue(n)) if n > 1 => return Ok(Outcome::diverting(last.status, Divert::Continue(n - 1))),
            Some(Divert::Continue(_)) => continue,
            Some(_) => return Ok(last),
            None => {}
        }
    }
    Ok(last)
}

fn unwind_loop_divert(n: u32, status: i32) -> Outcome {
    if n > 1 {
        Outcome::diverting(status, Divert::Break(n - 1))
    } else {
        Outcome::status(status)
    }
}

fn exec_for(session: &mut Session, f: &ForLoop) -> ExecResult<Outcome> {
    let items = match &f.items {
        Some(words) => expand_words(words, session)?,
        None => session.positional_params().to_vec(),
    };
    let mut last = Outcome::status(0);
    for item in items {
        session.variables.assign(&f.variable, Variable::new(item));
        last = run_script(session, &f.body)?;
        match last.divert {
            Some(Divert::Break(n)) => return Ok(unwind_loop_divert(n, last.status)),
            Some(Divert::Continue(n)) if n > 1 => return Ok(Outcome::diverting(last.status, Divert::Continue(n - 1))),
            Some(Divert::Continue(_)) => continue,
            Some(_) => return Ok(last),
            None => {}
        }
    }
    Ok(last)
}

fn exec_cfor(session: &mut Session, c: &CForLoop) -> ExecResult<Outcome> {
    if let Some(init) = &c.init {
        eval_arith_stmt(init, session)?;
    }
    let mut last = Outcome::status(0);
    loop {
        if let Some(cond) = &c.cond {
            if eval_arith_stmt(cond, session)? == 0 {
                break;
            }
        }
        last = run_script(session, &c.body)?;
        match last.divert {
            Some(Divert::Break(n)) => return Ok(unwind_loop_divert(n, last.status)),
            Some(Divert::Continue(n)) if n > 1 => return Ok(Outcome::diverting(last.status, Divert::Continue(n - 1))),
            Some(Divert::Continue(_)) => {}
            Some(_) => return Ok(last),
            None => {}
        }
        if let Some(post) = &c.post {
            eval_arith_stmt(post, session)?;
        }
    }
    Ok(last)
}

fn eval_arith_stmt(expr: &str, session: &mut Session) -> ExecResult<i64> {
    struct SessionVars<'a>(&'a mut Session);
    impl bashrs_arith::Variables for SessionVars<'_> {
        fn get(&self, name: &str) -> Option<String> {
            self.0.variables.get(name).map(|v| v.value.as_scalar())
        }
        fn set(&mut self, name: &str, value: &bashrs_arith::Value) {
            self.0.variables.assign(name, Variable::new(value.to_string()));
        }
    }
    Ok(bashrs_arith::evaluate(expr, &mut SessionVars(session))?)
}

fn exec_arith(session: &mut Session, a: &ArithCommand) -> ExecResult<Outcome> {
    let value = eval_arith_stmt(&a.expression, session)?;
    Ok(Outcome::status(if value != 0 { 0 } else { 1 }))
}

fn exec_case(session: &mut Session, c: &Case) -> ExecResult<Outcome> {
    let subject = expand_word_scalar(&c.word, session)?;
    let extglob = session.options.is_set(ShOption::Extglob);
    let mut i = 0;
    while i < c.items.len() {
        let item = &c.items[i];
        let mut matched = false;
        for pattern_word in &item.patterns {
            let pattern = expand_word_scalar(pattern_word, session)?;
            let config = bashrs_fnmatch::Config { anchor_begin: true, anchor_end: true, extglob, ..Default::default() };
            if bashrs_fnmatch::Pattern::parse(bashrs_fnmatch::without_escape(&pattern), config)?.is_match(&subject) {
                matched = true;
                break;
            }
        }
        if matched {
            let outcome = run_script(session, &item.body)?;
            if outcome.divert.is_some() {
                return Ok(outcome);
            }
            match item.terminator {
                CaseTerminator::Break => return Ok(outcome),
                CaseTerminator::FallThrough => {
                    if i + 1 < c.items.len() {
                        let next = run_script(session, &c.items[i + 1].body)?;
                        return Ok(next);
                    }
                    return Ok(outcome);
                }
                CaseTerminator::Continue => {
                    i += 1;
                    continue;
                }
            }
        }
        i += 1;
    }
    Ok(Outcome::status(0))
}

/// Runs `c.body` as a real background process with both ends of two pipes
/// wired up, the way Bash's `coproc` binds `NAME[0]` (read from the body's
/// stdout) and `NAME[1]` (write to the body's stdin) plus `NAME_PID`.
fn exec_coproc(session: &mut Session, c: &Coproc) -> ExecResult<Outcome> {
    let mut to_body = [0i32; 2];
    let mut from_body = [0i32; 2];
    unsafe {
        if libc::pipe(to_body.as_mut_ptr()) != 0 || libc::pipe(from_body.as_mut_ptr()) != 0 {
            return Err(ExecError::Exec { command: "coproc".to_string(), source: std::io::Error::last_os_error() });
        }
    }

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(ExecError::Exec { command: "coproc".to_string(), source: std::io::Error::last_os_error() });
    }
    if pid == 0 {
        unsafe {
            libc::dup2(to_body[0], 0);
            libc::dup2(from_body[1], 1);
            libc::close(to_body[0]);
            libc::close(to_body[1]);
            libc::close(from_body[0]);
            libc::close(from_body[1]);
        }
        let status = match exec_command(session, &c.body) {
            Ok(outcome) => outcome.status,
            Err(_) => 127,
        };
        std::process::exit(status);
    }

    unsafe {
        libc::close(to_body[0]);
        libc::close(from_body[1]);
    }
    let name = c.name.clone().unwrap_or_else(|| "COPROC".to_string());
    let read_fd = allocate_fd(session);
    let read_file = unsafe { std::fs::File::from_raw_fd(from_body[0]) };
    session.fds.set(read_fd, FdBody::File(Rc::new(read_file)));
    let write_fd = allocate_fd(session);
    let write_file = unsafe { std::fs::File::from_raw_fd(to_body[1]) };
    session.fds.set(write_fd, FdBody::File(Rc::new(write_file)));

    let mut elements = std::collections::BTreeMap::new();
    elements.insert(0, read_fd.to_string());
    elements.insert(1, write_fd.to_string());
    session.variables.assign(&name, Variable { value: Value::IndexedArray(elements), attributes: Attributes::ARRAY });
    session.variables.assign(&format!("{name}_PID"), Variable::new(pid.to_string()));

    let job = bashrs_env::job::Job::new(pid, name);
    session.jobs.add(job);
    Ok(Outcome::status(0))
}

/// Picks a high, currently-unused fd number for a coprocess pipe end, the
/// way Bash allocates coproc fds away from the range scripts usually use.
fn allocate_fd(session: &Session) -> i32 {
    let mut fd = 63;
    while session.fds.get(fd).is_some() {
        fd -= 1;
    }
    fd
}

/// Parses and runs `tokens` (the interior of a `$(...)`/`` `...` ``) in a
/// cloned session, capturing its stdout and trimming trailing newlines the
/// way command substitution always does.
pub fn run_command_substitution(session: &mut Session, tokens: &[Token]) -> ExecResult<String> {
    let script = bashrs_syntax::parser::Parser::new(tokens.to_vec(), Vec::new())
        .parse_script()
        .map_err(ExecError::from)?;
    let mut child = session.fork_subshell();
    let mut file = tempfile::tempfile().map_err(|source| ExecError::Exec { command: "$(...)".to_string(), source })?;
    child.fds.set(1, FdBody::File(Rc::new(file.try_clone().map_err(|source| ExecError::Exec {
        command: "$(...)".to_string(),
        source,
    })?)));
    run_script(&mut child, &script)?;
    file.seek(SeekFrom::Start(0)).ok();
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok();
    while buf.ends_with('\n') {
        buf.pop();
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("test", std::env::temp_dir())
    }

    #[test]
    fn runs_simple_true_false_builtins() {
        let mut s = session();
        s.builtins.register("true", bashrs_env::builtin::Kind::Regular, |_, _| 0);
        s.builtins.register("false", bashrs_env::builtin::Kind::Regular, |_, _| 1);
        let script = bashrs_syntax::parse("true; false", "test").unwrap();
        let outcome = run_script(&mut s, &script).unwrap();
        assert_eq!(outcome.status, 1);
    }

    #[test]
    fn and_or_short_circuits() {
        let mut s = session();
        s.builtins.register("true", bashrs_env::builtin::Kind::Regular, |_, _| 0);
        s.builtins.register("false", bashrs_env::builtin::Kind::Regular, |_, _| 1);
        let calls = Rc::new(std::cell::RefCell::new(0));
        let calls2 = calls.clone();
        s.builtins.register("count", bashrs_env::builtin::Kind::Regular, move |_, _| {
            *calls2.borrow_mut() += 1;
            0
        });
        let script = bashrs_syntax::parse("false && count", "test").unwrap();
        run_script(&mut s, &script).unwrap();
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn if_else_selects_branch() {
        let mut s = session();
        s.builtins.register("true", bashrs_env::builtin::Kind::Regular, |_, _| 0);
        s.builtins.register("false", bashrs_env::builtin::Kind::Regular, |_, _| 1);
        let script = bashrs_syntax::parse("if false; then true; else false; fi", "test").unwrap();
        let outcome = run_script(&mut s, &script).unwrap();
        assert_eq!(outcome.status, 1);
    }

    #[test]
    fn for_loop_iterates_items() {
        let mut s = session();
        s.builtins.register("true", bashrs_env::builtin::Kind::Regular, |_, _| 0);
        let script = bashrs_syntax::parse("for x in a b c; do true; done", "test").unwrap();
        run_script(&mut s, &script).unwrap();
        assert_eq!(s.variables.get("x").unwrap().value.as_scalar(), "c");
    }

    #[test]
    fn assignment_only_command_persists_variable() {
        let mut s = session();
        let script = bashrs_syntax::parse("x=5", "test").unwrap();
        run_script(&mut s, &script).unwrap();
        assert_eq!(s.variables.get("x").unwrap().value.as_scalar(), "5");
    }

    #[test]
    fn errexit_diverts_on_failing_command() {
        let mut s = session();
        s.options.set(ShOption::Errexit, true);
        s.builtins.register("false", bashrs_env::builtin::Kind::Regular, |_, _| 1);
        let script = bashrs_syntax::parse("false", "test").unwrap();
        let outcome = run_script(&mut s, &script).unwrap();
        assert!(matches!(outcome.divert, Some(Divert::Exit(1))));
    }
}
