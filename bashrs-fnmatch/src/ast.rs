// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Abstract syntax tree for globbing patterns.

mod parse;
mod regex;

use crate::Error;
use std::ops::RangeInclusive;

/// The fourteen POSIX character class names recognized inside `[[:name:]]`.
pub const CHAR_CLASS_NAMES: &[&str] = &[
    "alnum", "alpha", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
    "space", "upper", "word", "xdigit",
];

pub fn is_char_class_name(name: &str) -> bool {
    CHAR_CLASS_NAMES.contains(&name)
}

/// Bracket expression component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketAtom {
    Char(char),
    /// `[.x.]`
    CollatingSymbol(String),
    /// `[=x=]`
    EquivalenceClass(String),
    /// `[:digit:]`
    CharClass(String),
}

impl From<char> for BracketAtom {
    fn from(c: char) -> Self {
        BracketAtom::Char(c)
    }
}

/// Bracket expression component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketItem {
    Atom(BracketAtom),
    Range(RangeInclusive<BracketAtom>),
}

impl<T: Into<BracketAtom>> From<T> for BracketItem {
    fn from(value: T) -> Self {
        BracketItem::Atom(value.into())
    }
}

impl From<RangeInclusive<BracketAtom>> for BracketItem {
    fn from(range: RangeInclusive<BracketAtom>) -> Self {
        BracketItem::Range(range)
    }
}

/// `[...]` bracket expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bracket {
    /// Set when the bracket expression opens with `!` or `^`.
    pub complement: bool,
    pub items: Vec<BracketItem>,
}

/// Which Bash extglob quantifier wraps a group of alternatives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExtglobKind {
    /// `?(pattern-list)` — zero or one.
    ZeroOrOne,
    /// `*(pattern-list)` — zero or more.
    ZeroOrMore,
    /// `+(pattern-list)` — one or more.
    OneOrMore,
    /// `@(pattern-list)` — exactly one.
    ExactlyOne,
    /// `!(pattern-list)` — anything that doesn't match any alternative.
    Not,
}

impl ExtglobKind {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '?' => Some(ExtglobKind::ZeroOrOne),
            '*' => Some(ExtglobKind::ZeroOrMore),
            '+' => Some(ExtglobKind::OneOrMore),
            '@' => Some(ExtglobKind::ExactlyOne),
            '!' => Some(ExtglobKind::Not),
            _ => None,
        }
    }
}

/// Pattern component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Atom {
    Char(char),
    /// `?`
    AnyChar,
    /// `*`
    AnyString,
    Bracket(Bracket),
    /// A Bash extglob group, e.g. `+(foo|bar)`. Only produced when the
    /// parser is given `extglob: true`.
    Extglob(ExtglobKind, Vec<Ast>),
}

/// Abstract syntax tree for a whole pattern.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ast {
    pub atoms: Vec<Atom>,
}

impl Ast {
    /// Parses `pattern` into an AST. `extglob` controls whether `?(`, `*(`,
    /// `+(`, `@(` and `!(` are recognized as quantified alternations rather
    /// than a literal character followed by a group (which POSIX `fnmatch`
    /// has no such group for in the first place, so plain parens are never
    /// otherwise special).
    pub fn new<I>(pattern: I, extglob: bool) -> Result<Self, Error>
    where
        I: IntoIterator<Item = crate::PatternChar>,
        <I as IntoIterator>::IntoIter: Clone,
    {
        let mut atoms = Vec::new();
        let mut i = pattern.into_iter();
        while let Some((atom, j)) = Atom::parse(i, extglob)? {
            atoms.push(atom);
            i = j;
        }
        Ok(Ast { atoms })
    }

    /// True if this pattern (at any nesting depth) uses an extglob group.
    /// Such patterns can't be compiled to a single `regex` crate
    /// expression (no negative-group support without lookaround), so the
    /// matcher falls back to direct AST walking for them.
    pub fn has_extglob(&self) -> bool {
        self.atoms.iter().any(|a| matches!(a, Atom::Extglob(..)))
    }
}
