// This file is part of bashrs, a Bash-compatible shell interpreter.

//! `printf`: a `%s`/`%d`/`%i`/`%c`/`%%` conversion subset plus the common
//! `\n`/`\t`/`\\` escapes, repeating the format string over any leftover
//! arguments the way POSIX `printf` does.
//!
//! Grounded on yash-builtin's absence of a `printf` (yash-rs relies on the
//! external utility); this implementation follows the escape/conversion
//! table POSIX specifies. Field width/precision modifiers (`%5d`, `%.2f`)
//! are not supported -- see `DESIGN.md`.

use crate::common::usage_error;
use bashrs_env::Session;

pub fn run(_session: &mut Session, argv: &[String]) -> i32 {
    let Some(format) = argv.get(1) else {
        return usage_error("printf", "usage: printf format [arguments]");
    };
    let args = &argv[2..];
    let mut idx = 0;
    loop {
        let before = idx;
        print!("{}", format_once(format, args, &mut idx));
        if idx >= args.len() || idx == before {
            break;
        }
    }
    0
}

fn format_once(format: &str, args: &[String], idx: &mut usize) -> String {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '%' => match chars.next() {
                Some('%') => out.push('%'),
                Some('s') => {
                    out.push_str(args.get(*idx).map(String::as_str).unwrap_or(""));
                    *idx += 1;
                }
                Some('d') | Some('i') => {
                    let value: i64 = args.get(*idx).and_then(|s| s.trim().parse().ok()).unwrap_or(0);
                    out.push_str(&value.to_string());
                    *idx += 1;
                }
                Some('c') => {
                    if let Some(ch) = args.get(*idx).and_then(|s| s.chars().next()) {
                        out.push(ch);
                    }
                    *idx += 1;
                }
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            },
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_s_and_d_conversions() {
        let mut idx = 0;
        let out = format_once("%s has %d items\n", &["cart".to_string(), "3".to_string()], &mut idx);
        assert_eq!(out, "cart has 3 items\n");
        assert_eq!(idx, 2);
    }

    #[test]
    fn percent_percent_is_literal() {
        let mut idx = 0;
        assert_eq!(format_once("100%%", &[], &mut idx), "100%");
    }
}
