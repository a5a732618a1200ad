// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Helpers shared by several built-ins: error reporting and the small bits
//! of `getopt`-style argument splitting most of them need.
//!
//! Grounded on yash-builtin's `common` module, which plays the same role
//! for its own built-ins (`arg::Error`, `syntax::parse`).

/// Prints `name: message` to stderr, the way every built-in below reports
/// a usage or runtime error, and returns 2 (Bash's convention for a
/// built-in's own usage error, distinct from the 1/126/127 a simple command
/// can fail with).
pub fn usage_error(name: &str, message: impl std::fmt::Display) -> i32 {
    eprintln!("{name}: {message}");
    2
}

pub fn runtime_error(name: &str, message: impl std::fmt::Display) -> i32 {
    eprintln!("{name}: {message}");
    1
}
