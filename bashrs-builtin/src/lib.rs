// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Implementation of the shell built-in utilities.
//!
//! Each built-in is implemented in the submodule named after it (or, for a
//! handful of one-liners, grouped into [`simple`]) and registered onto a
//! [`Session`] by [`register_all`]. Grounded on yash-rs's `yash-builtin`
//! crate, which the same way gives each utility its own module under a
//! crate that depends on the environment and semantics crates below it;
//! generalized from its `main(env, args) -> Result` trait-object shape to
//! plain closures over `bashrs_env::builtin::BuiltinFn`, since this crate's
//! synchronous executor has no async runtime to hand a future back to.

pub mod cd;
pub mod common;
pub mod eval_source;
pub mod job_control;
pub mod printf;
pub mod read;
pub mod set;
pub mod simple;
pub mod trap;
pub mod variable;

use bashrs_env::builtin::Kind;
use bashrs_env::Session;

/// Registers every built-in this crate implements onto `session`. Mirrors
/// `yash::bin_main`'s `env.builtins.extend(builtin::BUILTINS.iter()...)`
/// call, just eagerly rather than through a static table, since this
/// crate's builtins are closures rather than function-pointer structs.
pub fn register_all(session: &mut Session) {
    session.builtins.register("cd", Kind::Regular, cd::run);
    session.builtins.register("pwd", Kind::Regular, cd::pwd);

    session.builtins.register("export", Kind::Special, variable::export);
    session.builtins.register("unset", Kind::Special, variable::unset);
    session.builtins.register("declare", Kind::Regular, variable::declare);
    session.builtins.register("typeset", Kind::Regular, variable::declare);
    session.builtins.register("local", Kind::Special, variable::local);
    session.builtins.register("readonly", Kind::Special, variable::readonly);
    session.builtins.register("shift", Kind::Special, variable::shift);

    session.builtins.register("set", Kind::Special, set::run);

    session.builtins.register("read", Kind::Regular, read::run);
    session.builtins.register("printf", Kind::Regular, printf::run);

    session.builtins.register("eval", Kind::Special, eval_source::eval);
    session.builtins.register("source", Kind::Special, eval_source::source);
    session.builtins.register(".", Kind::Special, eval_source::source);
    session.builtins.register("exec", Kind::Special, eval_source::exec);

    session.builtins.register("trap", Kind::Special, trap::run);

    session.builtins.register("jobs", Kind::Regular, job_control::jobs);
    session.builtins.register("wait", Kind::Regular, job_control::wait);
    session.builtins.register("kill", Kind::Regular, job_control::kill);
    session.builtins.register("fg", Kind::Regular, job_control::fg);
    session.builtins.register("bg", Kind::Regular, job_control::bg);
    session.builtins.register("disown", Kind::Regular, job_control::disown);

    session.builtins.register(":", Kind::Special, simple::colon);
    session.builtins.register("true", Kind::Regular, simple::r#true);
    session.builtins.register("false", Kind::Regular, simple::r#false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_fills_the_table() {
        let mut session = Session::new("test", std::env::temp_dir());
        register_all(&mut session);
        for name in ["cd", "export", "set", "unset", "declare", "read", "eval", "source", ".", "exec", "trap", "wait", "jobs", "kill", "fg", "bg", "disown", "printf", "shift", "local", "readonly", ":", "true", "false"] {
            assert!(session.builtins.contains(name), "{name} should be registered");
        }
    }
}
