// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Pattern parser: turns a [`PatternChar`] stream into an [`Ast`].

use super::*;
use crate::Error;
use crate::PatternChar;

impl BracketAtom {
    /// Parses a collating symbol, equivalence class, or character class
    /// (the inner bracket expression forms, minus the initial `[`).
    /// Returns `Ok(None)` if none of those three forms is present, leaving
    /// the caller to fall back to treating `[` as a literal.
    fn parse_inner<I>(mut i: I) -> Result<Option<(Self, I)>, Error>
    where
        I: Iterator<Item = PatternChar>,
    {
        match i.next() {
            Some(PatternChar::Normal('.')) => {
                let mut value = Vec::new();
                for pc in i.by_ref() {
                    value.push(pc);
                    if value.ends_with(&[PatternChar::Normal('.'), PatternChar::Normal(']')]) {
                        value.truncate(value.len() - 2);
                        let value = value.into_iter().map(PatternChar::char_value).collect();
                        return Ok(Some((BracketAtom::CollatingSymbol(value), i)));
                    }
                }
                Ok(None)
            }
            Some(PatternChar::Normal('=')) => {
                let mut value = Vec::new();
                for pc in i.by_ref() {
                    value.push(pc);
                    if value.ends_with(&[PatternChar::Normal('='), PatternChar::Normal(']')]) {
                        value.truncate(value.len() - 2);
                        let value = value.into_iter().map(PatternChar::char_value).collect();
                        return Ok(Some((BracketAtom::EquivalenceClass(value), i)));
                    }
                }
                Ok(None)
            }
            Some(PatternChar::Normal(':')) => {
                let mut value = Vec::new();
                for pc in i.by_ref() {
                    value.push(pc);
                    if value.ends_with(&[PatternChar::Normal(':'), PatternChar::Normal(']')]) {
                        value.truncate(value.len() - 2);
                        let name: String = value.into_iter().map(PatternChar::char_value).collect();
                        return if is_char_class_name(&name) {
                            Ok(Some((BracketAtom::CharClass(name), i)))
                        } else {
                            Err(Error::UndefinedCharClass(name))
                        };
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

/// Folds the last three items into a range if they spell `atom - atom`.
fn make_range(items: &mut Vec<BracketItem>) {
    use BracketAtom::*;
    use BracketItem::*;

    if let Some(i1) = items.pop() {
        if let Atom(end) = i1 {
            if let Some(i2) = items.pop() {
                if let Atom(Char('-')) = i2 {
                    if let Some(i3) = items.pop() {
                        if let Atom(start) = i3 {
                            items.push(Range(start..=end));
                            return;
                        }
                        items.push(i3);
                    }
                }
                items.push(i2);
            }
            items.push(Atom(end));
        } else {
            items.push(i1);
        }
    }
}

impl Bracket {
    /// Parses a bracket expression, minus the initial `[`. Returns
    /// `Ok(None)` if no closing `]` is ever found, in which case the `[`
    /// should be treated as a literal character.
    fn parse<I>(mut i: I) -> Result<Option<(Self, I)>, Error>
    where
        I: Iterator<Item = PatternChar> + Clone,
    {
        use BracketAtom::*;
        use BracketItem::*;

        let mut bracket = Bracket { complement: false, items: Vec::new() };
        while let Some(pc) = i.next() {
            match pc {
                PatternChar::Normal(']') if !bracket.items.is_empty() => return Ok(Some((bracket, i))),
                PatternChar::Normal('!' | '^') if !bracket.complement && bracket.items.is_empty() => {
                    bracket.complement = true;
                }
                PatternChar::Normal('[') => {
                    if let Some((atom, j)) = BracketAtom::parse_inner(i.clone())? {
                        bracket.items.push(atom.into());
                        i = j;
                    } else {
                        bracket.items.push(Atom(Char('[')));
                    }
                }
                c => bracket.items.push(Atom(Char(c.char_value()))),
            }
            make_range(&mut bracket.items);
        }
        Ok(None)
    }
}

/// Parses the alternatives of an extglob group (the part between the `(`
/// that follows a quantifier prefix and its matching `)`), returning the
/// parsed alternatives and the iterator positioned just after `)`.
fn parse_extglob_alternatives<I>(mut i: I, extglob: bool) -> Result<(Vec<Ast>, I), Error>
where
    I: Iterator<Item = PatternChar> + Clone,
{
    let mut alternatives = Vec::new();
    loop {
        let mut atoms = Vec::new();
        loop {
            let mut probe = i.clone();
            match probe.next() {
                None => return Err(Error::UnterminatedExtglob),
                Some(PatternChar::Normal('|')) => {
                    i = probe;
                    break;
                }
                Some(PatternChar::Normal(')')) => {
                    i = probe;
                    alternatives.push(Ast { atoms });
                    return Ok((alternatives, i));
                }
                _ => {
                    let (atom, j) = Atom::parse(i, extglob)?.expect("peeked a character above");
                    atoms.push(atom);
                    i = j;
                }
            }
        }
        alternatives.push(Ast { atoms });
    }
}

impl Atom {
    pub fn parse<I>(mut i: I, extglob: bool) -> Result<Option<(Self, I)>, Error>
    where
        I: Iterator<Item = PatternChar> + Clone,
    {
        if let Some(pc) = i.next() {
            if extglob {
                if let PatternChar::Normal(c) = pc {
                    if let Some(kind) = ExtglobKind::from_prefix(c) {
                        let mut probe = i.clone();
                        if let Some(PatternChar::Normal('(')) = probe.next() {
                            let (alternatives, j) = parse_extglob_alternatives(probe, extglob)?;
                            return Ok(Some((Atom::Extglob(kind, alternatives), j)));
                        }
                    }
                }
            }
            let atom = match pc {
                PatternChar::Normal('?') => Atom::AnyChar,
                PatternChar::Normal('*') => Atom::AnyString,
                PatternChar::Normal('[') => {
                    if let Some((bracket, j)) = Bracket::parse(i.clone())? {
                        i = j;
                        Atom::Bracket(bracket)
                    } else {
                        Atom::Char('[')
                    }
                }
                c => Atom::Char(c.char_value()),
            };
            Ok(Some((atom, i)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::without_escape;

    #[test]
    fn empty_pattern() {
        let ast = Ast::new(without_escape(""), false).unwrap();
        assert_eq!(ast.atoms, []);
    }

    #[test]
    fn literal_and_wildcards() {
        let ast = Ast::new(without_escape("a?*b"), false).unwrap();
        assert_eq!(ast.atoms, [Atom::Char('a'), Atom::AnyChar, Atom::AnyString, Atom::Char('b')]);
    }

    #[test]
    fn bracket_expression() {
        let ast = Ast::new(without_escape("[a-z]"), false).unwrap();
        assert_eq!(
            ast.atoms,
            [Atom::Bracket(Bracket {
                complement: false,
                items: vec![BracketItem::Range(BracketAtom::Char('a')..=BracketAtom::Char('z'))],
            })]
        );
    }

    #[test]
    fn extglob_disabled_parens_are_literal() {
        let ast = Ast::new(without_escape("+(a|b)"), false).unwrap();
        assert_eq!(
            ast.atoms,
            [
                Atom::Char('+'),
                Atom::Char('('),
                Atom::Char('a'),
                Atom::Char('|'),
                Atom::Char('b'),
                Atom::Char(')'),
            ]
        );
    }

    #[test]
    fn extglob_one_or_more() {
        let ast = Ast::new(without_escape("+(ab|cd)"), true).unwrap();
        assert_eq!(
            ast.atoms,
            [Atom::Extglob(
                ExtglobKind::OneOrMore,
                vec![
                    Ast { atoms: vec![Atom::Char('a'), Atom::Char('b')] },
                    Ast { atoms: vec![Atom::Char('c'), Atom::Char('d')] },
                ]
            )]
        );
    }

    #[test]
    fn extglob_negation() {
        let ast = Ast::new(without_escape("!(foo)"), true).unwrap();
        assert_eq!(
            ast.atoms,
            [Atom::Extglob(ExtglobKind::Not, vec![Ast { atoms: vec![Atom::Char('f'), Atom::Char('o'), Atom::Char('o')] }])]
        );
    }

    #[test]
    fn nested_extglob() {
        let ast = Ast::new(without_escape("@(a*(b)c)"), true).unwrap();
        assert_eq!(
            ast.atoms,
            [Atom::Extglob(
                ExtglobKind::ExactlyOne,
                vec![Ast {
                    atoms: vec![
                        Atom::Char('a'),
                        Atom::Extglob(ExtglobKind::ZeroOrMore, vec![Ast { atoms: vec![Atom::Char('b')] }]),
                        Atom::Char('c'),
                    ]
                }]
            )]
        );
    }

    #[test]
    fn unterminated_extglob_is_an_error() {
        let e = Ast::new(without_escape("+(ab"), true).unwrap_err();
        assert_eq!(e, Error::UnterminatedExtglob);
    }
}
