// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The [`Word`] model: the syntactic unit that expands to zero or more
//! string fields.
//!
//! Grounded on the `Word`/`WordUnit`/`Text`/`TextUnit` split in yash-rs's
//! `syntax.rs`, generalized with the array- and brace-expansion machinery
//! Bash adds on top of POSIX parameter expansion.

use crate::token::Token;
use std::fmt;

/// How the top-level container of a word was quoted. This governs whether
/// word-splitting and pathname expansion apply to the word's expansion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum QuoteContext {
    #[default]
    None,
    Single,
    Double,
}

/// Special (punctuation) parameters: `$?`, `$$`, `$!`, `$#`, `$@`, `$*`, `$0`-`$9`, `$_`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpecialParam {
    At,          // @
    Asterisk,    // *
    Number,      // #
    Question,    // ?
    Hyphen,      // -
    Dollar,      // $
    Exclamation, // !
    Zero,        // 0
    Underscore,  // _
}

/// The name part of a parameter expansion: a plain variable, a special
/// parameter, or a positional parameter index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamName {
    Variable(String),
    Special(SpecialParam),
    Positional(usize),
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::Variable(s) => write!(f, "{s}"),
            ParamName::Special(SpecialParam::At) => write!(f, "@"),
            ParamName::Special(SpecialParam::Asterisk) => write!(f, "*"),
            ParamName::Special(SpecialParam::Number) => write!(f, "#"),
            ParamName::Special(SpecialParam::Question) => write!(f, "?"),
            ParamName::Special(SpecialParam::Hyphen) => write!(f, "-"),
            ParamName::Special(SpecialParam::Dollar) => write!(f, "$"),
            ParamName::Special(SpecialParam::Exclamation) => write!(f, "!"),
            ParamName::Special(SpecialParam::Zero) => write!(f, "0"),
            ParamName::Special(SpecialParam::Underscore) => write!(f, "_"),
            ParamName::Positional(n) => write!(f, "{n}"),
        }
    }
}

/// Array subscript in a braced parameter expansion, `${arr[...]}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Subscript {
    Index(String),
    AllValues, // [@]
    AllKeys,   // [*] used as a subscript is rare; mirrored for `${!arr[*]}` style uses
}

/// Case-conversion operator scope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaseScope {
    First,
    All,
}

/// `${parameter@operator}` transformation letters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransformOp {
    Q, // quoted
    E, // expand backslash escapes
    P, // expand as a prompt string
    A, // assignment statement that recreates the variable
    LowerA, // `a`: attribute flags
    L, // lowercase
    U, // uppercase
    K, // like `${!name[@]}` formatted keys
    LowerK,
}

/// Which occurrences a `${var/pattern/replacement}` substitution rewrites.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubstScope {
    First,
    All,    // //
    Prefix, // /#
    Suffix, // /%
}

/// A single modifier applied to a braced parameter expansion, `${name...}`.
/// Modifiers apply in the order they were parsed, mirroring `ops: Vec<Modifier>`
/// in the data model.
#[derive(Clone, Debug, PartialEq)]
pub enum Modifier {
    /// `:-word`, `-word`, `:=word`, `=word`, `:?word`, `?word`, `:+word`, `+word`
    Default { word: Word, assign: bool, error: bool, alternate: bool, unset_or_empty: bool },
    /// `#name` (outside braces) -- length; represented here as `${#name}`
    Length,
    /// `#pattern` / `##pattern` -- remove prefix
    RemovePrefix { pattern: Word, greedy: bool },
    /// `%pattern` / `%%pattern` -- remove suffix
    RemoveSuffix { pattern: Word, greedy: bool },
    /// `/pattern/replacement`, `//`, `/#`, `/%`
    Substitute { pattern: Word, replacement: Word, scope: SubstScope },
    /// `:offset` / `:offset:length`
    Substring { offset: Word, length: Option<Word> },
    CaseFirstUpper,
    CaseAllUpper,
    CaseFirstLower,
    CaseAllLower,
    Transform(TransformOp),
    /// `!name` indirection
    Indirect,
    Subscript(Subscript),
    /// `!prefix*` / `!prefix@`
    PrefixMatchNames { concat: bool },
}

/// `$name` or `${name[ops...]}`.
#[derive(Clone, Debug, PartialEq)]
pub struct BracedParam {
    pub name: ParamName,
    pub ops: Vec<Modifier>,
}

/// An inclusive, possibly zero-padded, possibly descending numeric or
/// alphabetic range for brace expansion (`{1..5}`, `{a..f}`, `{01..10..2}`).
#[derive(Clone, Debug, PartialEq)]
pub struct BraceRange {
    pub start: String,
    pub end: String,
    pub step: Option<i64>,
    pub zero_pad: Option<usize>,
}

/// `{a,b,c}` or `{start..end[..step]}`.
#[derive(Clone, Debug, PartialEq)]
pub enum BraceExpand {
    List(Vec<Word>),
    Range(BraceRange),
}

/// A single constituent of a [`Word`].
#[derive(Clone, Debug, PartialEq)]
pub enum WordUnit {
    /// Backslash-escaped character or ordinary unquoted text.
    Literal(String),
    /// `'...'`: no expansion at all.
    SingleQuoted(String),
    /// `"..."`: expansions enabled, word-splitting and globbing suppressed.
    DoubleQuoted(Vec<WordUnit>),
    /// `$'...'` ANSI-C quoting with backslash escapes resolved at parse time.
    DollarSingleQuoted(String),
    /// `$name`, `$?`, `$$`, etc.
    Variable(ParamName),
    /// `${name...}`.
    VariableBraced(BracedParam),
    /// `$(...)`, interior pre-tokenized by the lexer.
    CommandSubst(Vec<Token>),
    /// `` `...` `` legacy form; interior is re-lexed the same as `$(...)`.
    BackquotedSubst(Vec<Token>),
    /// `$((...))`, raw expression text evaluated at expansion time.
    ArithExpand(String),
    /// `<(...)`.
    ProcessSubstIn(Vec<Token>),
    /// `>(...)`.
    ProcessSubstOut(Vec<Token>),
    /// `{a,b}` / `{1..5}`.
    Brace(BraceExpand),
    /// A leading `~` or `~user` tilde prefix.
    Tilde(String),
}

/// A word: an ordered, non-empty sequence of [`WordUnit`]s plus the quoting
/// context of its top-level container.
#[derive(Clone, Debug, PartialEq)]
pub struct Word {
    pub units: Vec<WordUnit>,
    pub quote: QuoteContext,
    pub location: crate::source::Location,
}

impl Word {
    pub fn new(location: crate::source::Location) -> Self {
        Word { units: Vec::new(), quote: QuoteContext::None, location }
    }

    pub fn with_units(units: Vec<WordUnit>, location: crate::source::Location) -> Self {
        Word { units, quote: QuoteContext::None, location }
    }

    /// True if this word is a single unquoted literal equal to `s`, used by
    /// the parser to recognize reserved words, `in`, `do`, heredoc operators,
    /// etc. after lexing already classified the bare text.
    pub fn is_bare_literal(&self, s: &str) -> bool {
        matches!(self.units.as_slice(), [WordUnit::Literal(lit)] if lit == s)
    }

    /// The literal string value of a word with no expansions at all (used to
    /// validate assignment-word names and here-doc delimiters).
    pub fn to_literal(&self) -> Option<String> {
        let mut out = String::new();
        for unit in &self.units {
            match unit {
                WordUnit::Literal(s) => out.push_str(s),
                WordUnit::SingleQuoted(s) => out.push_str(s),
                WordUnit::DollarSingleQuoted(s) => out.push_str(s),
                WordUnit::DoubleQuoted(inner) => {
                    let w = Word::with_units(inner.clone(), self.location.clone());
                    out.push_str(&w.to_literal()?);
                }
                _ => return None,
            }
        }
        Some(out)
    }
}
