// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Serialization of [`Word`]s back to source text.

use crate::word::{BraceExpand, Modifier, Word, WordUnit};
use std::fmt::Write as _;

pub fn word_to_string(word: &Word) -> String {
    let mut out = String::new();
    for unit in &word.units {
        write_unit(&mut out, unit);
    }
    out
}

fn write_unit(out: &mut String, unit: &WordUnit) {
    match unit {
        WordUnit::Literal(s) => out.push_str(s),
        WordUnit::SingleQuoted(s) => {
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        WordUnit::DollarSingleQuoted(s) => {
            out.push_str("$'");
            out.push_str(s);
            out.push('\'');
        }
        WordUnit::DoubleQuoted(inner) => {
            out.push('"');
            for u in inner {
                write_unit(out, u);
            }
            out.push('"');
        }
        WordUnit::Variable(name) => {
            write!(out, "${name}").unwrap();
        }
        WordUnit::VariableBraced(bp) => {
            out.push_str("${");
            write!(out, "{}", bp.name).unwrap();
            for op in &bp.ops {
                write_modifier(out, op);
            }
            out.push('}');
        }
        WordUnit::CommandSubst(_) => out.push_str("$(...)"),
        WordUnit::BackquotedSubst(_) => out.push_str("`...`"),
        WordUnit::ArithExpand(expr) => {
            write!(out, "$(({expr}))").unwrap();
        }
        WordUnit::ProcessSubstIn(_) => out.push_str("<(...)"),
        WordUnit::ProcessSubstOut(_) => out.push_str(">(...)"),
        WordUnit::Brace(b) => write_brace(out, b),
        WordUnit::Tilde(s) => {
            out.push('~');
            out.push_str(s);
        }
    }
}

fn write_brace(out: &mut String, b: &BraceExpand) {
    out.push('{');
    match b {
        BraceExpand::List(words) => {
            for (i, w) in words.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&word_to_string(w));
            }
        }
        BraceExpand::Range(r) => {
            out.push_str(&r.start);
            out.push_str("..");
            out.push_str(&r.end);
            if let Some(step) = r.step {
                write!(out, "..{step}").unwrap();
            }
        }
    }
    out.push('}');
}

fn write_modifier(out: &mut String, m: &Modifier) {
    match m {
        Modifier::Default { word, assign, error, alternate, unset_or_empty } => {
            if *unset_or_empty {
                out.push(':');
            }
            let c = if *alternate {
                '+'
            } else if *assign {
                '='
            } else if *error {
                '?'
            } else {
                '-'
            };
            out.push(c);
            out.push_str(&word_to_string(word));
        }
        Modifier::Length => out.push('#'),
        Modifier::RemovePrefix { pattern, greedy } => {
            out.push_str(if *greedy { "##" } else { "#" });
            out.push_str(&word_to_string(pattern));
        }
        Modifier::RemoveSuffix { pattern, greedy } => {
            out.push_str(if *greedy { "%%" } else { "%" });
            out.push_str(&word_to_string(pattern));
        }
        Modifier::Substitute { pattern, replacement, scope } => {
            use crate::word::SubstScope::*;
            let prefix = match scope {
                First => "/",
                All => "//",
                Prefix => "/#",
                Suffix => "/%",
            };
            out.push_str(prefix);
            out.push_str(&word_to_string(pattern));
            out.push('/');
            out.push_str(&word_to_string(replacement));
        }
        Modifier::Substring { offset, length } => {
            out.push(':');
            out.push_str(&word_to_string(offset));
            if let Some(len) = length {
                out.push(':');
                out.push_str(&word_to_string(len));
            }
        }
        Modifier::CaseFirstUpper => out.push('^'),
        Modifier::CaseAllUpper => out.push_str("^^"),
        Modifier::CaseFirstLower => out.push(','),
        Modifier::CaseAllLower => out.push_str(",,"),
        Modifier::Transform(op) => {
            use crate::word::TransformOp::*;
            let c = match op {
                Q => 'Q',
                E => 'E',
                P => 'P',
                A => 'A',
                LowerA => 'a',
                L => 'L',
                U => 'U',
                K => 'K',
                LowerK => 'k',
            };
            write!(out, "@{c}").unwrap();
        }
        Modifier::Indirect => out.push('!'),
        Modifier::Subscript(sub) => {
            use crate::word::Subscript::*;
            match sub {
                Index(e) => write!(out, "[{e}]").unwrap(),
                AllValues => out.push_str("[@]"),
                AllKeys => out.push_str("[*]"),
            }
        }
        Modifier::PrefixMatchNames { concat } => {
            out.push('!');
            out.push_str(if *concat { "@" } else { "*" });
        }
    }
}
