// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Bash syntax: source locations, tokens, the word model, the AST, and the
//! lexer/parser/validator that build one from the other.
//!
//! Mirrors the crate split of yash-rs's `yash-syntax`, collapsed into a
//! single crate (rather than re-exporting `Location` from a separate
//! `source` crate) since nothing else in this workspace needs source
//! locations independent of syntax.

pub mod ast;
pub mod diagnostics;
pub mod display;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;
pub mod validator;
pub mod word;

pub use ast::Script;
pub use diagnostics::{Diagnostic, LexError, ParseError};
pub use source::{Code, Location, Source};
pub use token::Token;

/// Tokenizes `source` without parsing it.
pub fn tokenize(source: &str, name: impl Into<String>) -> Result<Vec<Token>, LexError> {
    lexer::Lexer::new(source, Source::Script { name: name.into() }).tokenize_owned()
}

/// Tokenizes and parses `source` into a [`Script`], then runs the validator
/// over the result.
pub fn parse(source: &str, name: impl Into<String>) -> Result<Script, ParseError> {
    let name = name.into();
    let mut lexer = lexer::Lexer::new(source, Source::Script { name: name.clone() });
    let tokens = lexer.tokenize().map_err(ParseError::from_lex)?;
    let script = parser::Parser::new(tokens, lexer.heredoc_bodies).parse_script()?;
    validator::validate(&script)?;
    Ok(script)
}
