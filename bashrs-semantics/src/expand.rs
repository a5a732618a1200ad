// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Word expansion: brace expansion, tilde expansion, parameter/command/
//! arithmetic expansion, field splitting, pathname expansion, and quote
//! removal, applied in that fixed order.
//!
//! Grounded on yash-semantics's `expansion` module, whose `Expand`/
//! `Fragment` split into "build up text, remember which parts came from
//! quotes" is mirrored here by [`Chunk`]; generalized with Bash's brace
//! expansion (which yash-rs's POSIX grammar has no equivalent of) and its
//! richer parameter-expansion modifier set.

use crate::{ExecError, ExecResult};
use bashrs_env::{Session, TempResource};
use bashrs_fnmatch::{without_escape, Config, Pattern};
use bashrs_syntax::token::Token;
use bashrs_syntax::word::{
    BraceExpand, BracedParam, CaseScope, Modifier, ParamName, QuoteContext, SpecialParam, SubstScope, Subscript, Word,
    WordUnit,
};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::FromRawFd;

/// One piece of a word's expansion: its literal text, and whether that text
/// came from a quoted context (and so must not be split or globbed).
#[derive(Clone, Debug)]
struct Chunk {
    text: String,
    quoted: bool,
}

/// Expands `words` as command-position words: full pipeline (brace, tilde,
/// parameter/command/arithmetic, splitting, pathname, quote removal).
pub fn expand_words(words: &[Word], session: &mut Session) -> ExecResult<Vec<String>> {
    let mut fields = Vec::new();
    for word in words {
        for braced in brace_expand(word) {
            let chunks = expand_units(&braced.units, braced.quote, session)?;
            let split = split_fields(&chunks, session);
            for field in split {
                fields.extend(pathname_expand(field, session));
            }
        }
    }
    Ok(fields)
}

/// Expands a single word with no splitting or globbing: the rule for
/// assignment right-hand sides, redirection targets, `case` words/patterns,
/// and here-document delimiters.
pub fn expand_word_scalar(word: &Word, session: &mut Session) -> ExecResult<String> {
    let chunks = expand_units(&word.units, word.quote, session)?;
    Ok(chunks.into_iter().map(|c| c.text).collect())
}

// ---------------------------------------------------------------------
// Brace expansion
// ---------------------------------------------------------------------

/// Expands `{a,b,c}` / `{1..5}` groups into the cross product of words they
/// denote. A word with no [`WordUnit::Brace`] unit expands to itself.
fn brace_expand(word: &Word) -> Vec<Word> {
    match word.units.iter().position(|u| matches!(u, WordUnit::Brace(_))) {
        None => vec![word.clone()],
        Some(i) => {
            let WordUnit::Brace(brace) = &word.units[i] else { unreachable!() };
            let alternatives = brace_alternatives(brace);
            let mut out = Vec::new();
            for alt in alternatives {
                let mut units = Vec::with_capacity(word.units.len() - 1 + alt.len());
                units.extend_from_slice(&word.units[..i]);
                units.extend(alt);
                units.extend_from_slice(&word.units[i + 1..]);
                let mut expanded = Word::with_units(units, word.location.clone());
                expanded.quote = word.quote;
                out.extend(brace_expand(&expanded));
            }
            out
        }
    }
}

fn brace_alternatives(brace: &BraceExpand) -> Vec<Vec<WordUnit>> {
    match brace {
        BraceExpand::List(words) => words.iter().map(|w| w.units.clone()).collect(),
        BraceExpand::Range(range) => brace_range_values(range)
            .into_iter()
            .map(|s| vec![WordUnit::Literal(s)])
            .collect(),
    }
}

fn brace_range_values(range: &bashrs_syntax::word::BraceRange) -> Vec<String> {
    if let (Ok(start), Ok(end)) = (range.start.parse::<i64>(), range.end.parse::<i64>()) {
        let step = range.step.unwrap_or(1).unsigned_abs().max(1) as i64;
        let width = range.zero_pad.unwrap_or(0).max(range.start.trim_start_matches('-').len());
        let mut values = Vec::new();
        if start <= end {
            let mut n = start;
            while n <= end {
                values.push(format_padded(n, width, range.zero_pad.is_some()));
                n += step;
            }
        } else {
            let mut n = start;
            while n >= end {
                values.push(format_padded(n, width, range.zero_pad.is_some()));
                n -= step;
            }
        }
        values
    } else if range.start.chars().count() == 1 && range.end.chars().count() == 1 {
        let start = range.start.chars().next().unwrap() as u32;
        let end = range.end.chars().next().unwrap() as u32;
        let mut values = Vec::new();
        if start <= end {
            for c in start..=end {
                if let Some(ch) = char::from_u32(c) {
                    values.push(ch.to_string());
                }
            }
        } else {
            for c in (end..=start).rev() {
                if let Some(ch) = char::from_u32(c) {
                    values.push(ch.to_string());
                }
            }
        }
        values
    } else {
        vec![range.start.clone(), range.end.clone()]
    }
}

fn format_padded(n: i64, width: usize, zero_pad: bool) -> String {
    if zero_pad {
        let negative = n < 0;
        let digits = n.unsigned_abs().to_string();
        let padded = format!("{:0>width$}", digits, width = width.saturating_sub(negative as usize));
        if negative {
            format!("-{padded}")
        } else {
            padded
        }
    } else {
        n.to_string()
    }
}

// ---------------------------------------------------------------------
// Tilde / parameter / command / arithmetic expansion
// ---------------------------------------------------------------------

fn expand_units(units: &[WordUnit], outer_quote: QuoteContext, session: &mut Session) -> ExecResult<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for (i, unit) in units.iter().enumerate() {
        match unit {
            WordUnit::Literal(s) => chunks.push(Chunk { text: s.clone(), quoted: outer_quote != QuoteContext::None }),
            WordUnit::SingleQuoted(s) | WordUnit::DollarSingleQuoted(s) => {
                chunks.push(Chunk { text: s.clone(), quoted: true })
            }
            WordUnit::DoubleQuoted(inner) => {
                chunks.extend(expand_units(inner, QuoteContext::Double, session)?);
            }
            WordUnit::Tilde(prefix) if i == 0 => {
                chunks.push(Chunk { text: expand_tilde(prefix, session), quoted: true })
            }
            WordUnit::Tilde(prefix) => chunks.push(Chunk { text: format!("~{prefix}"), quoted: outer_quote != QuoteContext::None }),
            WordUnit::Variable(name) => {
                let quoted = outer_quote != QuoteContext::None;
                chunks.push(Chunk { text: expand_param_name(name, session)?, quoted });
            }
            WordUnit::VariableBraced(braced) => {
                let quoted = outer_quote != QuoteContext::None;
                chunks.push(Chunk { text: expand_braced_param(braced, session)?, quoted });
            }
            WordUnit::ArithExpand(expr) => {
                let value = eval_arith(expr, session)?;
                chunks.push(Chunk { text: value.to_string(), quoted: outer_quote != QuoteContext::None });
            }
            WordUnit::CommandSubst(tokens) | WordUnit::BackquotedSubst(tokens) => {
                let output = crate::exec::run_command_substitution(session, tokens)?;
                chunks.push(Chunk { text: output, quoted: outer_quote != QuoteContext::None });
            }
            WordUnit::ProcessSubstIn(tokens) => {
                let path = spawn_process_subst(session, tokens, ProcessSubstDirection::In)?;
                chunks.push(Chunk { text: path, quoted: true });
            }
            WordUnit::ProcessSubstOut(tokens) => {
                let path = spawn_process_subst(session, tokens, ProcessSubstDirection::Out)?;
                chunks.push(Chunk { text: path, quoted: true });
            }
            WordUnit::Brace(_) => unreachable!("brace units are resolved before expand_units runs"),
        }
    }
    Ok(chunks)
}

enum ProcessSubstDirection {
    In,
    Out,
}

/// Creates a FIFO, forks a child to run `tokens` with it attached as the
/// child's stdin (`>(cmd)`) or stdout (`<(cmd)`), and returns the FIFO's
/// path for substitution into the word. The FIFO is opened read-write by
/// this process first so neither side blocks waiting for a peer to show up;
/// that holding fd is dropped right after the fork, and the eventual reader
/// or writer (whichever command the substituted path is handed to) opens it
/// again normally. Data then flows through the kernel's pipe buffer rather
/// than through any buffer of ours, which is what keeps a large stream
/// through `<(...)` from growing this process's memory.
fn spawn_process_subst(session: &mut Session, tokens: &[Token], direction: ProcessSubstDirection) -> ExecResult<String> {
    let script = bashrs_syntax::parser::Parser::new(tokens.to_vec(), Vec::new())
        .parse_script()
        .map_err(ExecError::from)?;

    let dir = tempfile::Builder::new()
        .prefix("bashrs-procsubst")
        .tempdir()
        .map_err(|source| ExecError::Exec { command: "<(...)".to_string(), source })?;
    let fifo_path = dir.path().join("fifo");
    let cpath = CString::new(fifo_path.as_os_str().as_bytes()).unwrap_or_default();

    if unsafe { libc::mkfifo(cpath.as_ptr(), 0o600) } != 0 {
        return Err(ExecError::Exec { command: "<(...)".to_string(), source: std::io::Error::last_os_error() });
    }
    let holder_fd = unsafe { libc::open(cpath.as_ptr(), libc::O_RDWR) };
    if holder_fd < 0 {
        return Err(ExecError::Exec { command: "<(...)".to_string(), source: std::io::Error::last_os_error() });
    }

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        unsafe { libc::close(holder_fd) };
        return Err(ExecError::Exec { command: "<(...)".to_string(), source: std::io::Error::last_os_error() });
    }
    if pid == 0 {
        let target_fd = match direction {
            ProcessSubstDirection::In => 1,
            ProcessSubstDirection::Out => 0,
        };
        unsafe {
            libc::dup2(holder_fd, target_fd);
            libc::close(holder_fd);
        }
        let status = match crate::exec::run_script(session, &script) {
            Ok(outcome) => outcome.status,
            Err(_) => 127,
        };
        std::process::exit(status);
    }
    unsafe { libc::close(holder_fd) };

    let path = dir.into_path();
    let fifo = path.join("fifo");
    session.temp_resources.push(TempResource { path });
    Ok(fifo.to_string_lossy().into_owned())
}

fn expand_tilde(prefix: &str, session: &Session) -> String {
    if prefix.is_empty() {
        if let Some(home) = session.variables.get("HOME") {
            return home.value.as_scalar();
        }
        return "~".to_string();
    }
    format!("~{prefix}")
}

fn expand_param_name(name: &ParamName, session: &mut Session) -> ExecResult<String> {
    Ok(match name {
        ParamName::Variable(n) => lookup_scalar(n, session)?,
        ParamName::Special(SpecialParam::Question) => session.special_vars.last_exit_status.to_string(),
        ParamName::Special(SpecialParam::Dollar) => std::process::id().to_string(),
        ParamName::Special(SpecialParam::Exclamation) => {
            session.special_vars.last_background_pid.map(|p| p.to_string()).unwrap_or_default()
        }
        ParamName::Special(SpecialParam::Zero) => session.script_name.clone(),
        ParamName::Special(SpecialParam::Underscore) => session.special_vars.last_word_of_previous_command.clone(),
        ParamName::Special(SpecialParam::Number) => session.positional_params().len().to_string(),
        ParamName::Special(SpecialParam::At) | ParamName::Special(SpecialParam::Asterisk) => {
            session.positional_params().join(" ")
        }
        ParamName::Special(SpecialParam::Hyphen) => String::new(),
        ParamName::Positional(n) => session.positional_params().get(n.wrapping_sub(1)).cloned().unwrap_or_default(),
    })
}

fn lookup_scalar(name: &str, session: &mut Session) -> ExecResult<String> {
    match session.variables.get(name) {
        Some(var) => Ok(var.value.as_scalar()),
        None => {
            if session.options.is_set(bashrs_env::option::Option::Nounset) {
                Err(ExecError::UnboundVariable { name: name.to_string() })
            } else {
                Ok(String::new())
            }
        }
    }
}

fn expand_braced_param(braced: &BracedParam, session: &mut Session) -> ExecResult<String> {
    let mut is_set = match &braced.name {
        ParamName::Variable(n) => session.variables.contains(n),
        ParamName::Positional(n) => *n >= 1 && *n <= session.positional_params().len(),
        _ => true,
    };
    let mut value = expand_param_name(&braced.name, session).unwrap_or_default();
    if !is_set {
        value.clear();
    }

    for op in &braced.ops {
        value = apply_modifier(op, &braced.name, value, &mut is_set, session)?;
    }
    Ok(value)
}

fn apply_modifier(
    op: &Modifier,
    name: &ParamName,
    value: String,
    is_set: &mut bool,
    session: &mut Session,
) -> ExecResult<String> {
    Ok(match op {
        Modifier::Default { word, assign, error, alternate, unset_or_empty } => {
            let triggers = if *unset_or_empty { !*is_set || value.is_empty() } else { !*is_set };
            if triggers {
                let default = expand_word_scalar(word, session)?;
                if *assign {
                    if let ParamName::Variable(n) = name {
                        session.variables.assign(n, bashrs_env::variable::Variable::new(default.clone()));
                        *is_set = true;
                    }
                }
                if *error {
                    return Err(ExecError::BadSubstitution {
                        message: if default.is_empty() { format!("{name}: parameter null or unset") } else { default },
                    });
                }
                default
            } else if *alternate {
                expand_word_scalar(word, session)?
            } else {
                value
            }
        }
        Modifier::Length => value.chars().count().to_string(),
        Modifier::RemovePrefix { pattern, greedy } => {
            let pat = expand_word_scalar(pattern, session)?;
            remove_prefix(&value, &pat, *greedy)
        }
        Modifier::RemoveSuffix { pattern, greedy } => {
            let pat = expand_word_scalar(pattern, session)?;
            remove_suffix(&value, &pat, *greedy)
        }
        Modifier::Substitute { pattern, replacement, scope } => {
            let pat = expand_word_scalar(pattern, session)?;
            let repl = expand_word_scalar(replacement, session)?;
            substitute(&value, &pat, &repl, *scope)?
        }
        Modifier::Substring { offset, length } => {
            let offset_val = eval_arith(&expand_word_scalar(offset, session)?, session)?;
            let length_val = match length {
                Some(w) => Some(eval_arith(&expand_word_scalar(w, session)?, session)?),
                None => None,
            };
            substring(&value, offset_val, length_val)
        }
        Modifier::CaseFirstUpper => case_convert(&value, CaseScope::First, true),
        Modifier::CaseAllUpper => case_convert(&value, CaseScope::All, true),
        Modifier::CaseFirstLower => case_convert(&value, CaseScope::First, false),
        Modifier::CaseAllLower => case_convert(&value, CaseScope::All, false),
        Modifier::Transform(op) => apply_transform(*op, &value),
        Modifier::Indirect => match session.variables.get(&value) {
            Some(v) => v.value.as_scalar(),
            None => String::new(),
        },
        Modifier::Subscript(sub) => match sub {
            Subscript::Index(idx) => {
                if let ParamName::Variable(n) = name {
                    let idx_val = eval_arith(idx, session)?;
                    if let Some(var) = session.variables.get(n) {
                        if let bashrs_env::variable::Value::IndexedArray(map) = &var.value {
                            map.get(&idx_val).cloned().unwrap_or_default()
                        } else if let bashrs_env::variable::Value::AssociativeArray(map) = &var.value {
                            map.get(idx).cloned().unwrap_or_default()
                        } else {
                            value
                        }
                    } else {
                        String::new()
                    }
                } else {
                    value
                }
            }
            Subscript::AllValues | Subscript::AllKeys => {
                if let ParamName::Variable(n) = name {
                    session.variables.get(n).map(|v| v.value.elements().join(" ")).unwrap_or_default()
                } else {
                    value
                }
            }
        },
        Modifier::PrefixMatchNames { .. } => {
            if let ParamName::Variable(prefix) = name {
                session.variables.names().into_iter().filter(|n| n.starts_with(prefix.as_str())).collect::<Vec<_>>().join(" ")
            } else {
                value
            }
        }
    })
}

fn remove_prefix(value: &str, pattern: &str, greedy: bool) -> String {
    let config = Config { anchor_begin: true, ..Config::default() };
    let Ok(pat) = Pattern::parse(without_escape(pattern), config) else { return value.to_string() };
    let chars: Vec<char> = value.chars().collect();
    let mut best: Option<usize> = None;
    for end in 0..=chars.len() {
        let prefix: String = chars[..end].iter().collect();
        if pat.is_match(&prefix) {
            best = Some(end);
            if !greedy {
                break;
            }
        }
    }
    match best {
        Some(end) => chars[end..].iter().collect(),
        None => value.to_string(),
    }
}

fn remove_suffix(value: &str, pattern: &str, greedy: bool) -> String {
    let config = Config { anchor_end: true, ..Config::default() };
    let Ok(pat) = Pattern::parse(without_escape(pattern), config) else { return value.to_string() };
    let chars: Vec<char> = value.chars().collect();
    let mut best: Option<usize> = None;
    for start in (0..=chars.len()).rev() {
        let suffix: String = chars[start..].iter().collect();
        if pat.is_match(&suffix) {
            best = Some(start);
            if !greedy {
                break;
            }
        }
    }
    match best {
        Some(start) => chars[..start].iter().collect(),
        None => value.to_string(),
    }
}

fn substitute(value: &str, pattern: &str, replacement: &str, scope: SubstScope) -> ExecResult<String> {
    let config = Config {
        anchor_begin: matches!(scope, SubstScope::Prefix),
        anchor_end: matches!(scope, SubstScope::Suffix),
        ..Config::default()
    };
    let pat = Pattern::parse(without_escape(pattern), config)?;
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    let mut replaced_once = false;
    while i < chars.len() {
        let mut matched_len = None;
        if !replaced_once || matches!(scope, SubstScope::All) {
            for end in (i..=chars.len()).rev() {
                let candidate: String = chars[i..end].iter().collect();
                if pat.is_match(&candidate) {
                    matched_len = Some(end - i);
                    break;
                }
            }
        }
        match matched_len {
            Some(len) if len > 0 || matches!(scope, SubstScope::Prefix | SubstScope::Suffix) => {
                out.push_str(replacement);
                i += len.max(1).min(chars.len() - i);
                replaced_once = true;
                if matches!(scope, SubstScope::Prefix | SubstScope::Suffix) {
                    out.extend(&chars[i..]);
                    break;
                }
            }
            _ => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    Ok(out)
}

fn substring(value: &str, offset: i64, length: Option<i64>) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;
    let start = if offset < 0 { (len + offset).max(0) } else { offset.min(len) };
    let end = match length {
        None => len,
        Some(l) if l < 0 => (len + l).max(start),
        Some(l) => (start + l).min(len),
    };
    chars[start as usize..end as usize].iter().collect()
}

fn case_convert(value: &str, scope: CaseScope, upper: bool) -> String {
    match scope {
        CaseScope::All => {
            if upper {
                value.to_uppercase()
            } else {
                value.to_lowercase()
            }
        }
        CaseScope::First => {
            let mut chars = value.chars();
            match chars.next() {
                Some(c) => {
                    let c = if upper { c.to_uppercase().next().unwrap_or(c) } else { c.to_lowercase().next().unwrap_or(c) };
                    std::iter::once(c).chain(chars).collect()
                }
                None => String::new(),
            }
        }
    }
}

fn apply_transform(op: bashrs_syntax::word::TransformOp, value: &str) -> String {
    use bashrs_syntax::word::TransformOp;
    match op {
        TransformOp::Q => bashrs_quote::quote(value).into_owned(),
        TransformOp::L => value.to_lowercase(),
        TransformOp::U => value.to_uppercase(),
        _ => value.to_string(),
    }
}

fn eval_arith(expr: &str, session: &mut Session) -> ExecResult<i64> {
    struct SessionVars<'a>(&'a mut Session);
    impl bashrs_arith::Variables for SessionVars<'_> {
        fn get(&self, name: &str) -> Option<String> {
            self.0.variables.get(name).map(|v| v.value.as_scalar())
        }
        fn set(&mut self, name: &str, value: &bashrs_arith::Value) {
            self.0.variables.assign(name, bashrs_env::variable::Variable::new(value.to_string()));
        }
    }
    Ok(bashrs_arith::evaluate(expr, &mut SessionVars(session))?)
}

// ---------------------------------------------------------------------
// Field splitting
// ---------------------------------------------------------------------

fn ifs_chars(session: &Session) -> String {
    match session.variables.get("IFS") {
        Some(var) => var.value.as_scalar(),
        None => " \t\n".to_string(),
    }
}

/// Splits a chunk sequence into fields on `$IFS`: runs of whitespace IFS
/// characters collapse to one delimiter, a non-whitespace IFS character
/// delimits on its own (so `a::b` with `IFS=:` yields three fields, the
/// middle one empty). Quoted chunks are glued onto the current field
/// verbatim, IFS characters and all, and never start or end a split.
fn split_fields(chunks: &[Chunk], session: &Session) -> Vec<String> {
    let ifs = ifs_chars(session);
    if ifs.is_empty() {
        return vec![chunks.iter().map(|c| c.text.as_str()).collect()];
    }
    let whitespace: Vec<char> = ifs.chars().filter(|c| c.is_whitespace()).collect();

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut current_started = false;

    for chunk in chunks {
        if chunk.quoted {
            current.push_str(&chunk.text);
            current_started = true;
            continue;
        }
        for c in chunk.text.chars() {
            if whitespace.contains(&c) {
                if current_started {
                    fields.push(std::mem::take(&mut current));
                    current_started = false;
                }
            } else if ifs.contains(c) {
                fields.push(std::mem::take(&mut current));
                current_started = false;
            } else {
                current.push(c);
                current_started = true;
            }
        }
    }
    if current_started || !current.is_empty() {
        fields.push(current);
    }
    if fields.is_empty() {
        fields.push(String::new());
    }
    fields
}

// ---------------------------------------------------------------------
// Pathname expansion
// ---------------------------------------------------------------------

fn has_glob_metachars(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '*' | '?' | '['))
}

fn pathname_expand(field: String, session: &Session) -> Vec<String> {
    if session.options.is_set(bashrs_env::option::Option::Noglob) || !has_glob_metachars(&field) {
        return vec![field];
    }
    let extglob = session.options.is_set(bashrs_env::option::Option::Extglob);
    let config = Config { anchor_begin: true, anchor_end: true, extglob, ..Config::default() };
    let Ok(pattern) = Pattern::parse(without_escape(&field), config) else { return vec![field] };

    let dir = if field.starts_with('/') { std::path::PathBuf::from("/") } else { session.working_dir.clone() };
    let Ok(entries) = std::fs::read_dir(&dir) else { return vec![field] };

    let dotglob = session.options.is_set(bashrs_env::option::Option::Dotglob);
    let mut matches: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| (dotglob || !name.starts_with('.')) && pattern.is_match(name))
        .collect();
    matches.sort();

    if matches.is_empty() {
        if session.options.is_set(bashrs_env::option::Option::Nullglob) {
            Vec::new()
        } else {
            vec![field]
        }
    } else {
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashrs_syntax::source::Location;

    fn session() -> Session {
        Session::new("test", std::env::temp_dir())
    }

    fn literal_word(s: &str) -> Word {
        Word::with_units(vec![WordUnit::Literal(s.to_string())], Location::dummy())
    }

    #[test]
    fn plain_words_pass_through() {
        let mut session = session();
        let fields = expand_words(&[literal_word("hello")], &mut session).unwrap();
        assert_eq!(fields, vec!["hello".to_string()]);
    }

    #[test]
    fn splits_on_default_ifs() {
        let mut session = session();
        let word = literal_word("a b  c");
        let fields = expand_words(&[word], &mut session).unwrap();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn double_quoted_text_is_not_split() {
        let mut session = session();
        let word = Word::with_units(vec![WordUnit::DoubleQuoted(vec![WordUnit::Literal("a b".to_string())])], Location::dummy());
        let fields = expand_words(&[word], &mut session).unwrap();
        assert_eq!(fields, vec!["a b".to_string()]);
    }

    #[test]
    fn unset_variable_is_empty_by_default() {
        let mut session = session();
        let word = Word::with_units(vec![WordUnit::Variable(ParamName::Variable("UNSET".to_string()))], Location::dummy());
        let result = expand_word_scalar(&word, &mut session).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn nounset_errors_on_unset_variable() {
        let mut session = session();
        session.options.set(bashrs_env::option::Option::Nounset, true);
        let word = Word::with_units(vec![WordUnit::Variable(ParamName::Variable("UNSET".to_string()))], Location::dummy());
        assert!(expand_word_scalar(&word, &mut session).is_err());
    }

    #[test]
    fn brace_expansion_cross_product() {
        let word = Word::with_units(
            vec![
                WordUnit::Brace(BraceExpand::List(vec![literal_word("a"), literal_word("b")])),
                WordUnit::Brace(BraceExpand::List(vec![literal_word("1"), literal_word("2")])),
            ],
            Location::dummy(),
        );
        let expanded = brace_expand(&word);
        assert_eq!(expanded.len(), 4);
    }

    #[test]
    fn default_modifier_supplies_fallback() {
        let mut session = session();
        let braced = BracedParam {
            name: ParamName::Variable("UNSET".to_string()),
            ops: vec![Modifier::Default { word: literal_word("fallback"), assign: false, error: false, alternate: false, unset_or_empty: true }],
        };
        let result = expand_braced_param(&braced, &mut session).unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn substring_handles_negative_offset() {
        assert_eq!(substring("hello", -3, None), "llo");
        assert_eq!(substring("hello", 1, Some(2)), "el");
    }
}
