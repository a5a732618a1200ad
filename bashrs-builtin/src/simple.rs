// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `:`, `true`, `false` -- the built-ins that do nothing but return a
//! fixed status, grounded on yash-builtin's `colon.rs`/`true.rs`/`false.rs`.

use bashrs_env::Session;

pub fn colon(_session: &mut Session, _argv: &[String]) -> i32 {
    0
}

pub fn r#true(_session: &mut Session, _argv: &[String]) -> i32 {
    0
}

pub fn r#false(_session: &mut Session, _argv: &[String]) -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_and_true_succeed_false_fails() {
        let mut s = Session::new("test", std::env::temp_dir());
        assert_eq!(colon(&mut s, &[":".to_string()]), 0);
        assert_eq!(r#true(&mut s, &["true".to_string()]), 0);
        assert_eq!(r#false(&mut s, &["false".to_string()]), 1);
    }
}
