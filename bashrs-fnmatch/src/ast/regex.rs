// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Conversion of an extglob-free [`Ast`] to a regular expression string.
//!
//! Extglob groups (and especially `!(...)` negation) have no direct
//! translation into the `regex` crate's RE2-style engine, which has no
//! lookaround; patterns containing them are matched by walking the AST
//! directly instead (see `crate::matcher`), so this module only needs to
//! handle the POSIX subset.

use super::*;
use crate::Config;
use crate::Error;
use std::fmt::Write;

type Result = std::result::Result<(), Error>;

const SPECIAL_CHARS: &str = r"\.+*?()|[]{}^$";
const BRACKET_SPECIAL_CHARS: &str = "-&~";

impl BracketAtom {
    fn fmt_regex_char(c: char, regex: &mut dyn Write) -> Result {
        if BRACKET_SPECIAL_CHARS.contains(c) || SPECIAL_CHARS.contains(c) {
            regex.write_char('\\').unwrap();
        }
        regex.write_char(c).unwrap();
        Ok(())
    }

    fn matches_multi_character(&self) -> bool {
        match self {
            BracketAtom::CollatingSymbol(value) | BracketAtom::EquivalenceClass(value) => value.len() > 1,
            _ => false,
        }
    }

    fn fmt_regex(&self, regex: &mut dyn Write) -> Result {
        match self {
            BracketAtom::Char(c) => return BracketAtom::fmt_regex_char(*c, regex),
            BracketAtom::CollatingSymbol(value) | BracketAtom::EquivalenceClass(value) => {
                if !value.is_empty() {
                    regex.write_str(value)
                } else {
                    return Err(Error::EmptyCollatingSymbol);
                }
            }
            BracketAtom::CharClass(class) => {
                if is_char_class_name(class) {
                    regex.write_fmt(format_args!("[:{class}:]"))
                } else {
                    return Err(Error::UndefinedCharClass(class.clone()));
                }
            }
        }
        .unwrap();
        Ok(())
    }

    fn fmt_regex_single(&self, regex: &mut dyn Write) -> Result {
        match self {
            BracketAtom::Char(c) => BracketAtom::fmt_regex_char(*c, regex),
            BracketAtom::CollatingSymbol(value) | BracketAtom::EquivalenceClass(value) => {
                let c = value.chars().next().ok_or(Error::EmptyCollatingSymbol)?;
                BracketAtom::fmt_regex_char(c, regex)
            }
            BracketAtom::CharClass(class) => Err(Error::CharClassInRange(class.clone())),
        }
    }
}

impl BracketItem {
    fn matches_multi_character(&self) -> bool {
        match self {
            BracketItem::Atom(a) => a.matches_multi_character(),
            BracketItem::Range(_) => false,
        }
    }

    fn fmt_regex(&self, regex: &mut dyn Write) -> Result {
        match self {
            BracketItem::Atom(a) => a.fmt_regex(regex),
            BracketItem::Range(range) => {
                range.start().fmt_regex_single(regex)?;
                regex.write_char('-').unwrap();
                range.end().fmt_regex_single(regex)
            }
        }
    }
}

impl Bracket {
    fn matches_multi_character(&self) -> bool {
        self.items.iter().any(BracketItem::matches_multi_character)
    }

    fn fmt_regex(&self, regex: &mut dyn Write) -> Result {
        if self.items.is_empty() {
            return Err(Error::EmptyBracket);
        }
        if !self.matches_multi_character() {
            regex.write_char('[').unwrap();
            if self.complement {
                regex.write_char('^').unwrap();
            }
            for item in &self.items {
                item.fmt_regex(regex)?;
            }
            regex.write_char(']').unwrap();
        } else if !self.complement {
            regex.write_str("(?:").unwrap();
            let mut first = true;
            for item in &self.items {
                if first {
                    first = false;
                } else {
                    regex.write_char('|').unwrap();
                }
                if !item.matches_multi_character() {
                    regex.write_char('[').unwrap();
                    item.fmt_regex(regex)?;
                    regex.write_char(']').unwrap();
                } else {
                    item.fmt_regex(regex)?;
                }
            }
            regex.write_char(')').unwrap();
        } else {
            regex.write_str("[^").unwrap();
            for item in &self.items {
                if !item.matches_multi_character() {
                    item.fmt_regex(regex)?;
                }
            }
            regex.write_char(']').unwrap();
        }
        Ok(())
    }
}

impl Atom {
    fn fmt_regex(&self, _config: &Config, regex: &mut dyn Write) -> Result {
        match self {
            Atom::Char(c) => {
                if SPECIAL_CHARS.contains(*c) {
                    regex.write_char('\\').unwrap();
                }
                regex.write_char(*c).unwrap();
            }
            Atom::AnyChar => regex.write_char('.').unwrap(),
            Atom::AnyString => regex.write_str(".*").unwrap(),
            Atom::Bracket(bracket) => bracket.fmt_regex(regex)?,
            Atom::Extglob(..) => return Err(Error::ExtglobNotRepresentable),
        }
        Ok(())
    }
}

impl Ast {
    /// Writes the AST as a regular expression. Only `config.anchor_begin`
    /// and `config.anchor_end` affect the result.
    pub fn fmt_regex(&self, config: &Config, regex: &mut dyn Write) -> Result {
        if config.anchor_begin {
            regex.write_str(r"\A").unwrap();
        }
        self.atoms.iter().try_for_each(|atom| atom.fmt_regex(config, regex))?;
        if config.anchor_end {
            regex.write_str(r"\z").unwrap();
        }
        Ok(())
    }

    pub fn to_regex(&self, config: &Config) -> std::result::Result<String, Error> {
        let mut regex = String::new();
        self.fmt_regex(config, &mut regex)?;
        Ok(regex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_pattern() {
        let ast = Ast { atoms: vec![Atom::Char('a'), Atom::Char('9')] };
        assert_eq!(ast.to_regex(&Config::default()).unwrap(), "a9");
    }

    #[test]
    fn escaping() {
        let atoms = SPECIAL_CHARS.chars().map(Atom::Char).collect();
        let ast = Ast { atoms };
        assert_eq!(ast.to_regex(&Config::default()).unwrap(), r"\\\.\+\*\?\(\)\|\[\]\{\}\^\$");
    }

    #[test]
    fn any_patterns() {
        let ast = Ast { atoms: vec![Atom::AnyChar, Atom::AnyString] };
        assert_eq!(ast.to_regex(&Config::default()).unwrap(), "..*");
    }

    #[test]
    fn bracket_with_chars() {
        let bracket = Bracket {
            complement: false,
            items: vec![BracketItem::Atom(BracketAtom::Char('a')), BracketItem::Atom(BracketAtom::Char('n'))],
        };
        let ast = Ast { atoms: vec![Atom::Bracket(bracket)] };
        assert_eq!(ast.to_regex(&Config::default()).unwrap(), "[an]");
    }

    #[test]
    fn bracket_complement() {
        let bracket = Bracket { complement: true, items: vec![BracketItem::Atom(BracketAtom::Char('a'))] };
        let ast = Ast { atoms: vec![Atom::Bracket(bracket)] };
        assert_eq!(ast.to_regex(&Config::default()).unwrap(), "[^a]");
    }

    #[test]
    fn character_class() {
        let bracket = Bracket { complement: false, items: vec![BracketItem::Atom(BracketAtom::CharClass("digit".to_string()))] };
        let ast = Ast { atoms: vec![Atom::Bracket(bracket)] };
        assert_eq!(ast.to_regex(&Config::default()).unwrap(), "[[:digit:]]");
    }

    #[test]
    fn anchors() {
        let ast = Ast { atoms: vec![Atom::Char('a')] };
        let config = Config { anchor_begin: true, anchor_end: true, ..Config::default() };
        assert_eq!(ast.to_regex(&config).unwrap(), r"\Aa\z");
    }

    #[test]
    fn extglob_is_not_representable() {
        let ast = Ast { atoms: vec![Atom::Extglob(ExtglobKind::Not, vec![])] };
        assert_eq!(ast.to_regex(&Config::default()), Err(Error::ExtglobNotRepresentable));
    }
}
