// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Bash-compatible pattern matching: the glob syntax used by pathname
//! expansion, `case`, `[[ == ]]`/`[[ != ]]`, and the `#`/`##`/`%`/`%%`
//! parameter-expansion operators, plus the `extglob` quantifiers Bash adds
//! on top of POSIX globbing.
//!
//! Grounded on yash-rs's `yash-fnmatch` crate: a [`PatternChar`] stream is
//! parsed into an [`Ast`], which converts to a `regex` crate expression for
//! the POSIX subset. Bash's extglob groups (`?(...)`, `*(...)`, `+(...)`,
//! `@(...)`, `!(...)`) add quantified alternation the `regex` crate's
//! lookaround-free engine can't express — most visibly `!(...)` negation —
//! so patterns using them are matched by walking the AST directly instead
//! of compiling a regex (see [`matcher`]).

pub mod ast;
mod char_iter;
mod matcher;

pub use ast::Ast;
pub use char_iter::{with_escape, without_escape, PatternChar};

use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("undefined character class '{0}'")]
    UndefinedCharClass(String),
    #[error("character class '{0}' cannot appear in a range")]
    CharClassInRange(String),
    #[error("empty collating symbol or equivalence class")]
    EmptyCollatingSymbol,
    #[error("empty bracket expression")]
    EmptyBracket,
    #[error("unterminated extglob group")]
    UnterminatedExtglob,
    #[error("extglob pattern cannot be compiled to a regular expression")]
    ExtglobNotRepresentable,
    #[error("invalid regular expression: {0}")]
    Regex(String),
}

/// Options controlling how a [`Pattern`] is parsed and matched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// Anchor the match to the start of the subject (`\A`).
    pub anchor_begin: bool,
    /// Anchor the match to the end of the subject (`\z`).
    pub anchor_end: bool,
    /// Fold case when comparing characters; Bash's `nocasematch` option.
    pub case_insensitive: bool,
    /// Recognize `?(`, `*(`, `+(`, `@(` and `!(` as extglob groups; Bash's
    /// `extglob` option.
    pub extglob: bool,
}

impl Config {
    /// The config pathname expansion and `case`/`[[ ]]` matching use: both
    /// ends anchored, since glob matching is always a whole-string test.
    pub fn anchored() -> Self {
        Config { anchor_begin: true, anchor_end: true, ..Config::default() }
    }
}

/// A parsed, ready-to-match glob pattern.
#[derive(Clone, Debug)]
pub struct Pattern {
    ast: Ast,
    config: Config,
    /// Compiled only when `ast` has no extglob group; those fall back to
    /// `matcher::is_match` since `regex` cannot express them.
    regex: Option<regex::Regex>,
}

impl Pattern {
    /// Parses `pattern` (as produced by [`with_escape`] or [`without_escape`])
    /// under `config`.
    pub fn parse<I>(pattern: I, config: Config) -> Result<Self, Error>
    where
        I: IntoIterator<Item = PatternChar>,
        <I as IntoIterator>::IntoIter: Clone,
    {
        let ast = Ast::new(pattern, config.extglob)?;
        let regex = if ast.has_extglob() {
            None
        } else {
            let pattern_str = ast.to_regex(&config)?;
            let mut builder = regex::RegexBuilder::new(&pattern_str);
            builder.case_insensitive(config.case_insensitive);
            Some(builder.build().map_err(|e| Error::Regex(e.to_string()))?)
        };
        Ok(Pattern { ast, config, regex })
    }

    /// Reports whether `s` matches this pattern in its entirety (subject to
    /// `config.anchor_begin`/`anchor_end`, which callers typically set both
    /// for whole-word matching).
    pub fn is_match(&self, s: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(s),
            // Extglob-bearing patterns: anchoring is implicit in AST
            // matching, which always consumes the whole subject.
            None => matcher::is_match(&self.ast, s, &self.config).unwrap_or(false),
        }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        let p = Pattern::parse(without_escape("abc"), Config::anchored()).unwrap();
        assert!(p.is_match("abc"));
        assert!(!p.is_match("abcd"));
    }

    #[test]
    fn star_and_question() {
        let p = Pattern::parse(without_escape("a*c?"), Config::anchored()).unwrap();
        assert!(p.is_match("abbbcx"));
        assert!(!p.is_match("abbbc"));
    }

    #[test]
    fn bracket_class() {
        let p = Pattern::parse(without_escape("[[:digit:]]+"), Config::anchored()).unwrap();
        // `+` outside extglob has no special glob meaning; it's literal.
        assert!(p.is_match("5+"));
    }

    #[test]
    fn case_insensitive_regex_path() {
        let config = Config { case_insensitive: true, ..Config::anchored() };
        let p = Pattern::parse(without_escape("HELLO"), config).unwrap();
        assert!(p.is_match("hello"));
    }

    #[test]
    fn extglob_negation_uses_ast_matcher() {
        let config = Config { extglob: true, ..Config::anchored() };
        let p = Pattern::parse(without_escape("!(foo)"), config).unwrap();
        assert!(p.is_match("bar"));
        assert!(!p.is_match("foo"));
    }

    #[test]
    fn undefined_char_class_errors() {
        let err = Pattern::parse(without_escape("[[:bogus:]]"), Config::anchored()).unwrap_err();
        assert_eq!(err, Error::UndefinedCharClass("bogus".to_string()));
    }
}
