// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Direct backtracking matcher over an [`Ast`], used for patterns that
//! contain an extglob group. The `regex` crate has no lookaround, so
//! `!(pattern-list)` negation (and, for simplicity, its sibling quantifiers)
//! can't be compiled down to a single `regex::Regex`; walking the AST
//! recursively handles all five forms uniformly instead.

use crate::ast::{Atom, Bracket, BracketAtom, BracketItem, ExtglobKind};
use crate::{Ast, Config, Error};

pub fn is_match(ast: &Ast, s: &str, config: &Config) -> Result<bool, Error> {
    let chars: Vec<char> = s.chars().collect();
    match_seq(&ast.atoms, &chars, config)
}

fn chars_equal(pattern_char: char, c: char, config: &Config) -> bool {
    if config.case_insensitive {
        pattern_char.to_lowercase().eq(c.to_lowercase())
    } else {
        pattern_char == c
    }
}

fn match_seq(atoms: &[Atom], s: &[char], config: &Config) -> Result<bool, Error> {
    match atoms.split_first() {
        None => Ok(s.is_empty()),
        Some((Atom::Char(pc), rest)) => match s.split_first() {
            Some((c, srest)) if chars_equal(*pc, *c, config) => match_seq(rest, srest, config),
            _ => Ok(false),
        },
        Some((Atom::AnyChar, rest)) => match s.split_first() {
            Some((_, srest)) => match_seq(rest, srest, config),
            None => Ok(false),
        },
        Some((Atom::AnyString, rest)) => {
            for k in 0..=s.len() {
                if match_seq(rest, &s[k..], config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Some((Atom::Bracket(b), rest)) => match s.split_first() {
            Some((c, srest)) => {
                if bracket_matches(b, *c, config)? {
                    match_seq(rest, srest, config)
                } else {
                    Ok(false)
                }
            }
            None => Ok(false),
        },
        Some((Atom::Extglob(kind, alts), rest)) => match_extglob(*kind, alts, rest, s, config),
    }
}

fn match_extglob(kind: ExtglobKind, alts: &[Ast], rest: &[Atom], s: &[char], config: &Config) -> Result<bool, Error> {
    match kind {
        ExtglobKind::ZeroOrOne => {
            if match_seq(rest, s, config)? {
                return Ok(true);
            }
            for alt in alts {
                if match_seq(&join(&alt.atoms, rest), s, config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ExtglobKind::ExactlyOne => {
            for alt in alts {
                if match_seq(&join(&alt.atoms, rest), s, config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ExtglobKind::OneOrMore => {
            for alt in alts {
                if alt.atoms.is_empty() {
                    continue;
                }
                let repeat = Atom::Extglob(ExtglobKind::ZeroOrMore, alts.to_vec());
                let combined = join(&alt.atoms, &join(std::slice::from_ref(&repeat), rest));
                if match_seq(&combined, s, config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ExtglobKind::ZeroOrMore => {
            if match_seq(rest, s, config)? {
                return Ok(true);
            }
            for alt in alts {
                if alt.atoms.is_empty() {
                    continue;
                }
                let repeat = Atom::Extglob(ExtglobKind::ZeroOrMore, alts.to_vec());
                let combined = join(&alt.atoms, &join(std::slice::from_ref(&repeat), rest));
                if match_seq(&combined, s, config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ExtglobKind::Not => {
            for k in 0..=s.len() {
                let consumed = &s[..k];
                let mut matched_any = false;
                for alt in alts {
                    if match_seq(&alt.atoms, consumed, config)? {
                        matched_any = true;
                        break;
                    }
                }
                if !matched_any && match_seq(rest, &s[k..], config)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn join(a: &[Atom], b: &[Atom]) -> Vec<Atom> {
    let mut v = Vec::with_capacity(a.len() + b.len());
    v.extend_from_slice(a);
    v.extend_from_slice(b);
    v
}

fn bracket_matches(b: &Bracket, c: char, config: &Config) -> Result<bool, Error> {
    let mut matched = false;
    for item in &b.items {
        if bracket_item_matches(item, c, config)? {
            matched = true;
            break;
        }
    }
    Ok(matched != b.complement)
}

fn bracket_item_matches(item: &BracketItem, c: char, config: &Config) -> Result<bool, Error> {
    match item {
        BracketItem::Atom(a) => bracket_atom_matches(a, c, config),
        BracketItem::Range(range) => {
            let lo = bracket_atom_char(range.start())?;
            let hi = bracket_atom_char(range.end())?;
            Ok(c >= lo && c <= hi || (config.case_insensitive && case_folded_in_range(c, lo, hi)))
        }
    }
}

fn case_folded_in_range(c: char, lo: char, hi: char) -> bool {
    c.to_lowercase().chain(c.to_uppercase()).any(|c| c >= lo && c <= hi)
}

fn bracket_atom_char(a: &BracketAtom) -> Result<char, Error> {
    match a {
        BracketAtom::Char(c) => Ok(*c),
        BracketAtom::CollatingSymbol(v) | BracketAtom::EquivalenceClass(v) => v.chars().next().ok_or(Error::EmptyCollatingSymbol),
        BracketAtom::CharClass(name) => Err(Error::CharClassInRange(name.clone())),
    }
}

fn bracket_atom_matches(a: &BracketAtom, c: char, config: &Config) -> Result<bool, Error> {
    match a {
        BracketAtom::Char(pc) => Ok(chars_equal(*pc, c, config)),
        BracketAtom::CollatingSymbol(v) | BracketAtom::EquivalenceClass(v) => {
            let first = v.chars().next().ok_or(Error::EmptyCollatingSymbol)?;
            Ok(chars_equal(first, c, config))
        }
        BracketAtom::CharClass(name) => Ok(char_in_class(name, c)),
    }
}

fn char_in_class(name: &str, c: char) -> bool {
    match name {
        "alnum" => c.is_alphanumeric(),
        "alpha" => c.is_alphabetic(),
        "ascii" => c.is_ascii(),
        "blank" => c == ' ' || c == '\t',
        "cntrl" => c.is_control(),
        "digit" => c.is_ascii_digit(),
        "graph" => c.is_ascii_graphic(),
        "lower" => c.is_lowercase(),
        "print" => !c.is_control(),
        "punct" => c.is_ascii_punctuation(),
        "space" => c.is_whitespace(),
        "upper" => c.is_uppercase(),
        "word" => c.is_alphanumeric() || c == '_',
        "xdigit" => c.is_ascii_hexdigit(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{without_escape, Ast};

    fn parse(pattern: &str, extglob: bool) -> Ast {
        Ast::new(without_escape(pattern), extglob).unwrap()
    }

    #[test]
    fn plain_glob() {
        let ast = parse("a?c", false);
        assert!(is_match(&ast, "abc", &Config::default()).unwrap());
        assert!(!is_match(&ast, "ac", &Config::default()).unwrap());
    }

    #[test]
    fn one_or_more() {
        let ast = parse("+(ab)c", true);
        assert!(is_match(&ast, "abababc", &Config::default()).unwrap());
        assert!(!is_match(&ast, "c", &Config::default()).unwrap());
    }

    #[test]
    fn zero_or_one() {
        let ast = parse("ab?(c)d", true);
        assert!(is_match(&ast, "abd", &Config::default()).unwrap());
        assert!(is_match(&ast, "abcd", &Config::default()).unwrap());
        assert!(!is_match(&ast, "abccd", &Config::default()).unwrap());
    }

    #[test]
    fn exactly_one() {
        let ast = parse("@(foo|bar)", true);
        assert!(is_match(&ast, "foo", &Config::default()).unwrap());
        assert!(is_match(&ast, "bar", &Config::default()).unwrap());
        assert!(!is_match(&ast, "foobar", &Config::default()).unwrap());
    }

    #[test]
    fn negation() {
        let ast = parse("!(foo)", true);
        assert!(is_match(&ast, "bar", &Config::default()).unwrap());
        assert!(!is_match(&ast, "foo", &Config::default()).unwrap());
    }

    #[test]
    fn case_insensitive() {
        let ast = parse("ABC", false);
        let config = Config { case_insensitive: true, ..Config::default() };
        assert!(is_match(&ast, "abc", &config).unwrap());
    }
}
