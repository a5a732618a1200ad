// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Single-pass, context-sensitive tokenizer.
//!
//! Grounded on the cursor-driven recognition strategy of yash-rs's
//! `parser::lex` module family, made synchronous (the teacher's lexer reads
//! input incrementally through an async `Input` trait to support an
//! interactive REPL; this project's contract is `tokenize(source) ->
//! Result<Vec<Token>, LexError>` over a string already fully in memory, so
//! there is nothing to suspend on).

use crate::diagnostics::{sc, Diagnostic, LexError};
use crate::source::{Code, Location, Source};
use crate::token::{Keyword, Operator, Token, TokenKind};
use crate::word::{
    BraceExpand, BraceRange, BracedParam, CaseScope as _unused_case_scope, Modifier, ParamName,
    SpecialParam, SubstScope, Subscript, TransformOp, Word, WordUnit,
};
use std::rc::Rc;

/// A pending `<<`/`<<-` redirect: its delimiter and flags are known at lex
/// time, but its body is only captured once the current line ends.
struct PendingHereDoc {
    delimiter: String,
    strip_tabs: bool,
    expand: bool,
    /// Index into `Lexer::heredoc_bodies` this heredoc will fill in.
    slot: usize,
}

pub struct Lexer {
    code: Rc<Code>,
    chars: Vec<char>,
    /// Byte offset of each char in `chars`, plus one trailing entry for the
    /// end of the string, so `byte_at(i)` gives the range endpoints needed
    /// for `Location`.
    byte_offsets: Vec<usize>,
    pos: usize,
    /// True when the next word would be recognized as a reserved word
    /// (start of script, after a separator, after a keyword expecting a
    /// command).
    command_position: bool,
    pending_heredocs: Vec<PendingHereDoc>,
    /// Bodies resolved so far, in the order their `<<` operators appeared.
    pub heredoc_bodies: Vec<Word>,
    /// Set right after a `<<`/`<<-` operator token, cleared once the next
    /// word (the delimiter) has been queued as a pending here-document.
    awaiting_heredoc_delim: Option<bool>,
}

type LResult<T> = Result<T, LexError>;

impl Lexer {
    pub fn new(source: &str, source_kind: Source) -> Self {
        let code = Rc::new(Code { value: source.to_string(), source: source_kind });
        let mut chars = Vec::with_capacity(source.len());
        let mut byte_offsets = Vec::with_capacity(source.len() + 1);
        let mut byte = 0;
        for c in source.chars() {
            chars.push(c);
            byte_offsets.push(byte);
            byte += c.len_utf8();
        }
        byte_offsets.push(byte);
        Lexer {
            code,
            chars,
            byte_offsets,
            pos: 0,
            command_position: true,
            pending_heredocs: Vec::new(),
            heredoc_bodies: Vec::new(),
            awaiting_heredoc_delim: None,
        }
    }

    fn loc(&self, start: usize, end: usize) -> Location {
        Location { code: Rc::clone(&self.code), range: self.byte_offsets[start]..self.byte_offsets[end] }
    }

    fn err(&self, code: &'static str, message: impl Into<String>, at: usize, hint: &'static str) -> LexError {
        let end = (at + 1).min(self.chars.len());
        LexError(Diagnostic::new(code, message, self.loc(at, end), hint))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Entry point: tokenizes the whole source.
    pub fn tokenize(&mut self) -> LResult<Vec<Token>> {
        let mut tokens = Vec::new();
        self.lex_shebang(&mut tokens)?;
        loop {
            self.skip_inline_whitespace();
            if self.eof() {
                self.close_unterminated_heredocs()?;
                let eof_loc = self.loc(self.pos, self.pos);
                tokens.push(Token::new(TokenKind::Eof, eof_loc));
                break;
            }
            let c = self.peek().unwrap();
            if c == '\n' {
                let start = self.pos;
                self.advance();
                tokens.push(Token::new(TokenKind::Newline, self.loc(start, self.pos)));
                self.resolve_pending_heredocs()?;
                self.command_position = true;
                continue;
            }
            if c == '#' {
                self.lex_comment(&mut tokens);
                continue;
            }
            if let Some(tok) = self.try_lex_operator()? {
                let was_command_position = self.command_position;
                self.command_position = matches!(
                    tok.kind,
                    TokenKind::Operator(
                        Operator::Pipe
                            | Operator::PipeAmp
                            | Operator::OrIf
                            | Operator::AndIf
                            | Operator::Amp
                            | Operator::Semicolon
                            | Operator::DSemi
                            | Operator::SemiAmp
                            | Operator::DSemiAmp
                            | Operator::OpenParen
                            | Operator::DOpenBracket,
                        _
                    )
                );
                if matches!(tok.kind, TokenKind::Operator(Operator::Pipe, _)) && was_command_position {
                    return Err(self.err(
                        sc::SC1133_PIPE_AT_LINE_START,
                        "a pipe (|) cannot start a line",
                        tok.location.range.start,
                        "move the previous command onto this line, or remove the pipe",
                    ));
                }
                if let TokenKind::Operator(Operator::DLess | Operator::DLessDash, _) = tok.kind {
                    self.awaiting_heredoc_delim = Some(matches!(tok.kind, TokenKind::Operator(Operator::DLessDash, _)));
                }
                tokens.push(tok);
                continue;
            }
            // A word (possibly a reserved word, assignment word, or a
            // pending here-document delimiter).
            let word_start = self.pos;
            let word = self.lex_word()?;
            if let Some(strip_tabs) = self.awaiting_heredoc_delim.take() {
                let expand = Self::word_is_unquoted(&word);
                let delimiter = word.to_literal().unwrap_or_default();
                if delimiter.is_empty() {
                    return Err(self.err(
                        sc::SC1041_HEREDOC_DELIM_ALONE,
                        "here-document delimiter is empty",
                        word_start,
                        "give the here-document a delimiter word, e.g. <<EOF",
                    ));
                }
                self.queue_heredoc(delimiter, strip_tabs, expand);
                let loc = self.loc(word_start, self.pos);
                tokens.push(Token::new(TokenKind::Word(word), loc));
                self.command_position = false;
                continue;
            }
            let tok = self.classify_word(word, word_start)?;
            self.command_position = matches!(tok.kind, TokenKind::Keyword(_));
            tokens.push(tok);
        }
        Ok(tokens)
    }

    /// Like [`Self::tokenize`] but takes the lexer by value, for the common
    /// case (nested command/process substitutions) where nothing after
    /// tokenizing needs the lexer's remaining state.
    pub fn tokenize_owned(mut self) -> LResult<Vec<Token>> {
        self.tokenize()
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }
        // backslash-newline line continuation
        if self.peek() == Some('\\') && self.peek_at(1) == Some('\n') {
            self.advance();
            self.advance();
            self.skip_inline_whitespace();
        }
    }

    fn lex_comment(&mut self, tokens: &mut Vec<Token>) {
        let start = self.pos;
        self.advance(); // '#'
        let text_start = self.pos;
        while !matches!(self.peek(), Some('\n') | None) {
            self.advance();
        }
        let text: String = self.chars[text_start..self.pos].iter().collect();
        tokens.push(Token::new(TokenKind::Comment(text), self.loc(start, self.pos)));
    }

    fn lex_shebang(&mut self, tokens: &mut Vec<Token>) -> LResult<()> {
        // UTF-8 BOM
        if self.peek() == Some('\u{FEFF}') {
            return Err(self.err(sc::SC1082_BOM, "file has a UTF-8 byte order mark", 0, "remove the BOM from the start of the file"));
        }
        if self.peek() == Some(' ') || self.peek() == Some('\t') {
            // leading whitespace before a shebang is only an error if a shebang follows
            let save = self.pos;
            let mut p = self.pos;
            while matches!(self.chars.get(p), Some(' ') | Some('\t')) {
                p += 1;
            }
            if self.chars.get(p) == Some(&'#') && self.chars.get(p + 1) == Some(&'!') {
                return Err(self.err(
                    sc::SC1114_LEADING_SPACE_SHEBANG,
                    "leading space before shebang",
                    save,
                    "the shebang line must start at byte 0",
                ));
            }
        }
        if self.peek() == Some('!') && self.peek_at(1) == Some('#') {
            return Err(self.err(sc::SC1084_BANG_HASH_SHEBANG, "shebang is reversed", 0, "use #! not !#"));
        }
        if self.peek() == Some('#') && self.peek_at(1) == Some(' ') && self.peek_at(2) == Some('!') {
            return Err(self.err(sc::SC1115_HASH_SPACE_BANG, "space between # and !", 0, "remove the space: #!"));
        }
        if self.peek() == Some('#') && self.peek_at(1) == Some('!') {
            let start = self.pos;
            self.advance();
            self.advance();
            let text_start = self.pos;
            while !matches!(self.peek(), Some('\n') | None) {
                self.advance();
            }
            let text: String = self.chars[text_start..self.pos].iter().collect();
            tokens.push(Token::new(TokenKind::Shebang(text.trim().to_string()), self.loc(start, self.pos)));
        }
        Ok(())
    }

    fn close_unterminated_heredocs(&self) -> LResult<()> {
        if let Some(p) = self.pending_heredocs.first() {
            return Err(self.err(
                sc::SC1044_UNTERMINATED_HEREDOC,
                format!("here-document delimited by '{}' was not terminated before end of file", p.delimiter),
                self.pos.saturating_sub(1),
                "add a line containing only the delimiter before the end of the file",
            ));
        }
        Ok(())
    }

    // -- operators --------------------------------------------------------

    fn try_lex_operator(&mut self) -> LResult<Option<Token>> {
        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        // explicit redirection fd: an unquoted run of digits immediately
        // followed by a redirection operator.
        if c.is_ascii_digit() {
            let mut p = self.pos;
            while matches!(self.chars.get(p), Some(d) if d.is_ascii_digit()) {
                p += 1;
            }
            if matches!(self.chars.get(p), Some('<') | Some('>')) {
                let fd_str: String = self.chars[self.pos..p].iter().collect();
                if let Ok(fd) = fd_str.parse::<u32>() {
                    let save = self.pos;
                    self.pos = p;
                    if let Some(mut tok) = self.try_lex_plain_operator()? {
                        if let TokenKind::Operator(op, _) = tok.kind {
                            if op.is_redirection() {
                                tok.kind = TokenKind::Operator(op, Some(fd));
                                tok.location = self.loc(start, self.pos);
                                return Ok(Some(tok));
                            }
                        }
                    }
                    self.pos = save;
                }
            }
        }

        self.try_lex_plain_operator()
    }

    fn try_lex_plain_operator(&mut self) -> LResult<Option<Token>> {
        let start = self.pos;
        macro_rules! op2 {
            ($a:expr, $b:expr, $op:expr) => {
                if self.peek() == Some($a) && self.peek_at(1) == Some($b) {
                    self.pos += 2;
                    return Ok(Some(Token::new(TokenKind::Operator($op, None), self.loc(start, self.pos))));
                }
            };
        }
        macro_rules! op3 {
            ($a:expr, $b:expr, $c:expr, $op:expr) => {
                if self.peek() == Some($a) && self.peek_at(1) == Some($b) && self.peek_at(2) == Some($c) {
                    self.pos += 3;
                    return Ok(Some(Token::new(TokenKind::Operator($op, None), self.loc(start, self.pos))));
                }
            };
        }
        op3!(';', ';', '&', Operator::DSemiAmp);
        op3!('<', '<', '-', Operator::DLessDash);
        op3!('<', '<', '<', Operator::TLess);
        op3!('&', '>', '>', Operator::AmpDGreat);
        op2!(';', ';', Operator::DSemi);
        op2!(';', '&', Operator::SemiAmp);
        op2!('&', '&', Operator::AndIf);
        op2!('|', '|', Operator::OrIf);
        op2!('|', '&', Operator::PipeAmp);
        op2!('<', '<', Operator::DLess);
        op2!('<', '&', Operator::LessAmp);
        op2!('<', '>', Operator::LessGreat);
        op2!('>', '>', Operator::DGreat);
        op2!('>', '&', Operator::GreatAmp);
        op2!('>', '|', Operator::GreatPipe);
        op2!('&', '>', Operator::AmpGreat);
        op2!('[', '[', Operator::DOpenBracket);
        op2!(']', ']', Operator::DCloseBracket);

        match self.peek() {
            Some('(') if self.peek_at(1) == Some('(') => {
                // arithmetic command `((...))`; only recognized as such when
                // it stands where a command is expected (checked by caller
                // via command_position is NOT required here: `((expr))`
                // is unambiguous as a command form, while `$((expr))` is
                // handled in word-scanning).
                self.pos += 2;
                let expr = self.capture_balanced_parens(2)?;
                self.expect_str("))")?;
                return Ok(Some(Token::new(TokenKind::ArithCommand(expr), self.loc(start, self.pos))));
            }
            Some('|') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::Pipe, None), self.loc(start, self.pos))));
            }
            Some('&') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::Amp, None), self.loc(start, self.pos))));
            }
            Some(';') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::Semicolon, None), self.loc(start, self.pos))));
            }
            Some('(') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::OpenParen, None), self.loc(start, self.pos))));
            }
            Some(')') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::CloseParen, None), self.loc(start, self.pos))));
            }
            Some('<') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::Less, None), self.loc(start, self.pos))));
            }
            Some('>') => {
                self.pos += 1;
                return Ok(Some(Token::new(TokenKind::Operator(Operator::Great, None), self.loc(start, self.pos))));
            }
            _ => Ok(None),
        }
    }

    fn expect_str(&mut self, s: &str) -> LResult<()> {
        for ch in s.chars() {
            if self.peek() != Some(ch) {
                return Err(self.err(sc::SC1000_UNKNOWN, format!("expected '{s}'"), self.pos, "check for a missing closing delimiter"));
            }
            self.advance();
        }
        Ok(())
    }

    /// Reads raw text up to (not including) a balanced closing `))`, given
    /// `depth` open parens already consumed (used for `((...))` and
    /// `$((...))`).
    fn capture_balanced_parens(&mut self, mut depth: i32) -> LResult<String> {
        let start = self.pos;
        while depth > 0 {
            match self.peek() {
                None => {
                    return Err(self.err(
                        sc::SC1000_UNKNOWN,
                        "unterminated arithmetic expression",
                        start,
                        "add the missing '))'",
                    ))
                }
                Some('(') => {
                    depth += 1;
                    self.advance();
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    // -- words --------------------------------------------------------------

    /// True if `c` can start or continue a literal run (not whitespace, not
    /// an operator-starting character, not quote/escape/dollar/backtick).
    fn is_word_char(c: char) -> bool {
        !matches!(
            c,
            ' ' | '\t' | '\n' | '|' | '&' | ';' | '<' | '>' | '(' | ')' | '\'' | '"' | '\\' | '$' | '`'
        )
    }

    fn check_unicode_lookalike(&self, c: char, at: usize) -> LResult<()> {
        let (code, msg, hint) = match c {
            '\u{201C}' | '\u{201D}' => (sc::SC1015_CURLY_DQUOTE, "this is a curly quote, not a straight one", "use a plain \" character"),
            '\u{2018}' | '\u{2019}' => (sc::SC1016_CURLY_SQUOTE, "this is a curly quote, not a straight one", "use a plain ' character"),
            '\u{00A0}' => (sc::SC1018_NBSP, "this is a non-breaking space, not a regular space", "replace it with a regular space"),
            '\u{2013}' | '\u{2014}' => (sc::SC1100_DASH_LOOKALIKE, "this is a unicode dash, not a hyphen-minus", "use a plain - character"),
            '\u{FF40}' | '\u{02CB}' => (sc::SC1077_BACKTICK_LOOKALIKE, "this looks like a backtick but isn't", "use a plain ` character"),
            _ => return Ok(()),
        };
        Err(self.err(code, msg, at, hint))
    }

    /// Decide whether the current position starts a brace-expansion group:
    /// a `{` followed eventually by a matching unescaped `}`, with either a
    /// top-level comma or a valid `..` range inside. Returns the consumed
    /// text length (chars) if so, without mutating `self.pos`.
    fn brace_expand_extent(&self) -> Option<usize> {
        if self.peek() != Some('{') {
            return None;
        }
        let mut depth = 0i32;
        let mut i = self.pos;
        let mut has_comma = false;
        let mut has_range = false;
        let mut in_single = false;
        let mut in_double = false;
        loop {
            let c = *self.chars.get(i)?;
            match c {
                '\\' if !in_single => {
                    i += 2;
                    continue;
                }
                '\'' if !in_double => in_single = !in_single,
                '"' if !in_single => in_double = !in_double,
                '{' if !in_single && !in_double => depth += 1,
                '}' if !in_single && !in_double => {
                    depth -= 1;
                    if depth == 0 {
                        if has_comma || has_range {
                            return Some(i + 1 - self.pos);
                        }
                        return None;
                    }
                }
                ',' if !in_single && !in_double && depth == 1 => has_comma = true,
                '.' if !in_single
                    && !in_double
                    && depth == 1
                    && self.chars.get(i + 1) == Some(&'.') =>
                {
                    has_range = true;
                }
                ' ' | '\t' | '\n' if !in_single && !in_double => return None,
                _ => {}
            }
            i += 1;
        }
    }

    fn lex_word(&mut self) -> LResult<Word> {
        let start = self.pos;
        let mut units: Vec<WordUnit> = Vec::new();
        let mut literal = String::new();
        let is_word_start = |units: &[WordUnit], literal: &str| units.is_empty() && literal.is_empty();
        loop {
            let Some(c) = self.peek() else { break };
            if !Self::is_word_char(c) {
                if c == '\'' {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_single_quoted()?);
                    continue;
                }
                if c == '"' {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_double_quoted()?);
                    continue;
                }
                if c == '\\' {
                    if self.peek_at(1) == Some('\n') {
                        self.advance();
                        self.advance();
                        continue;
                    }
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        literal.push(escaped);
                    }
                    continue;
                }
                if c == '$' {
                    if self.peek_at(1) == Some('\'') {
                        self.advance();
                        if !literal.is_empty() {
                            units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                        }
                        units.push(self.lex_dollar_single_quoted()?);
                        continue;
                    }
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_dollar()?);
                    continue;
                }
                if c == '`' {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_backquoted()?);
                    continue;
                }
                break;
            }
            if c == '~' && is_word_start(&units, &literal) {
                units.push(self.lex_tilde());
                continue;
            }
            if (c == '<' || c == '>') && self.peek_at(1) == Some('(') {
                if !literal.is_empty() {
                    units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                }
                units.push(self.lex_process_subst(c == '<')?);
                continue;
            }
            if c == '{' {
                if let Some(len) = self.brace_expand_extent() {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_brace_expand(len)?);
                    continue;
                }
            }
            self.check_unicode_lookalike(c, self.pos)?;
            literal.push(c);
            self.advance();
            if literal.is_empty() {
                break;
            }
        }
        if !literal.is_empty() {
            units.push(WordUnit::Literal(literal));
        }
        if units.is_empty() {
            // A word must have >=1 parts; caller only invokes lex_word when
            // it already peeked a word-starting character, so this should
            // not happen in practice, but guard anyway.
            units.push(WordUnit::Literal(String::new()));
        }
        Ok(Word::with_units(units, self.loc(start, self.pos)))
    }

    fn lex_single_quoted(&mut self) -> LResult<WordUnit> {
        let start = self.pos;
        self.advance(); // opening '
        let content_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(self.err(
                        sc::SC1003_UNTERMINATED_SINGLE,
                        "unterminated single-quoted string",
                        start,
                        "add the missing closing '",
                    ))
                }
                Some('\'') => break,
                _ => {
                    self.advance();
                }
            }
        }
        let content: String = self.chars[content_start..self.pos].iter().collect();
        self.advance(); // closing '
        Ok(WordUnit::SingleQuoted(content))
    }

    fn lex_dollar_single_quoted(&mut self) -> LResult<WordUnit> {
        let start = self.pos;
        self.advance(); // opening '
        let mut out = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(self.err(
                        sc::SC1003_UNTERMINATED_SINGLE,
                        "unterminated $'...' string",
                        start,
                        "add the missing closing '",
                    ))
                }
                Some('\'') => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('a') => out.push('\u{7}'),
                    Some('b') => out.push('\u{8}'),
                    Some('e') | Some('E') => out.push('\u{1b}'),
                    Some('f') => out.push('\u{c}'),
                    Some('v') => out.push('\u{b}'),
                    Some('0') => out.push('\0'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => {}
                },
                Some(c) => out.push(c),
            }
        }
        Ok(WordUnit::DollarSingleQuoted(out))
    }

    fn lex_double_quoted(&mut self) -> LResult<WordUnit> {
        let start = self.pos;
        self.advance(); // opening "
        let mut units = Vec::new();
        let mut literal = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.err(
                        sc::SC1009_UNTERMINATED_DOUBLE,
                        "unterminated double-quoted string",
                        start,
                        "add the missing closing \"",
                    ))
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some(c @ ('$' | '`' | '"' | '\\')) => {
                            literal.push(c);
                            self.advance();
                        }
                        Some('\n') => {
                            self.advance();
                        }
                        Some(other) => {
                            literal.push('\\');
                            literal.push(other);
                            self.advance();
                        }
                        None => literal.push('\\'),
                    }
                }
                Some('$') => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_dollar()?);
                }
                Some('`') => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_backquoted()?);
                }
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }
        if !literal.is_empty() {
            units.push(WordUnit::Literal(literal));
        }
        Ok(WordUnit::DoubleQuoted(units))
    }

    fn lex_tilde(&mut self) -> WordUnit {
        let start = self.pos;
        self.advance(); // ~
        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-' || c == '/' ) {
            // tilde prefix ends at the first '/', ':' or whitespace/operator
            if self.peek() == Some('/') {
                break;
            }
            self.advance();
        }
        let _ = start;
        let name: String = self.chars[name_start..self.pos].iter().collect();
        WordUnit::Tilde(name)
    }

    fn lex_process_subst(&mut self, is_input: bool) -> LResult<WordUnit> {
        let start = self.pos;
        self.advance(); // < or >
        self.advance(); // (
        let inner_start = self.pos;
        let mut depth = 1i32;
        while depth > 0 {
            match self.peek() {
                None => {
                    return Err(self.err(
                        sc::SC1000_UNKNOWN,
                        "unterminated process substitution",
                        start,
                        "add the missing closing )",
                    ))
                }
                Some('(') => {
                    depth += 1;
                    self.advance();
                }
                Some(')') => {
                    depth -= 1;
                    if depth > 0 {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        let inner: String = self.chars[inner_start..self.pos].iter().collect();
        self.advance(); // )
        let inner_source = Source::ProcessSubst { location: self.loc(start, self.pos) };
        let tokens = Lexer::new(&inner, inner_source).tokenize_owned()?;
        if is_input {
            Ok(WordUnit::ProcessSubstIn(tokens))
        } else {
            Ok(WordUnit::ProcessSubstOut(tokens))
        }
    }

    fn lex_backquoted(&mut self) -> LResult<WordUnit> {
        let start = self.pos;
        self.advance(); // `
        let mut inner = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(self.err(
                        sc::SC1000_UNKNOWN,
                        "unterminated backquoted command substitution",
                        start,
                        "add the missing closing `",
                    ))
                }
                Some('`') => break,
                Some('\\') => match self.advance() {
                    Some(c @ ('`' | '\\' | '$')) => inner.push(c),
                    Some(c) => {
                        inner.push('\\');
                        inner.push(c);
                    }
                    None => inner.push('\\'),
                },
                Some(c) => inner.push(c),
            }
        }
        let inner_source = Source::CommandSubst { location: self.loc(start, self.pos) };
        let tokens = Lexer::new(&inner, inner_source).tokenize_owned()?;
        Ok(WordUnit::BackquotedSubst(tokens))
    }

    fn lex_dollar(&mut self) -> LResult<WordUnit> {
        let start = self.pos;
        self.advance(); // $
        match self.peek() {
            Some('(') if self.peek_at(1) == Some('(') => {
                self.advance();
                self.advance();
                let expr = self.capture_balanced_parens(2)?;
                self.expect_str("))")?;
                Ok(WordUnit::ArithExpand(expr))
            }
            Some('(') => {
                self.advance();
                let inner_start = self.pos;
                let mut depth = 1i32;
                let mut in_single = false;
                let mut in_double = false;
                while depth > 0 {
                    match self.peek() {
                        None => {
                            return Err(self.err(
                                sc::SC1000_UNKNOWN,
                                "unterminated command substitution",
                                start,
                                "add the missing closing )",
                            ))
                        }
                        Some('\'') if !in_double => {
                            in_single = !in_single;
                            self.advance();
                        }
                        Some('"') if !in_single => {
                            in_double = !in_double;
                            self.advance();
                        }
                        Some('\\') if !in_single => {
                            self.advance();
                            self.advance();
                        }
                        Some('(') if !in_single && !in_double => {
                            depth += 1;
                            self.advance();
                        }
                        Some(')') if !in_single && !in_double => {
                            depth -= 1;
                            if depth > 0 {
                                self.advance();
                            }
                        }
                        _ => {
                            self.advance();
                        }
                    }
                }
                let inner: String = self.chars[inner_start..self.pos].iter().collect();
                self.advance(); // )
                let inner_source = Source::CommandSubst { location: self.loc(start, self.pos) };
                let tokens = Lexer::new(&inner, inner_source).tokenize_owned()?;
                Ok(WordUnit::CommandSubst(tokens))
            }
            Some('{') => {
                self.advance();
                self.lex_braced_param(start)
            }
            Some(c) if Self::is_special_param_char(c) => {
                self.advance();
                Ok(WordUnit::Variable(Self::special_param(c)))
            }
            Some(c) if c.is_ascii_digit() => {
                self.advance();
                if matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    return Err(self.err(
                        sc::SC1037_POSITIONAL_NEEDS_BRACES,
                        "multi-digit positional parameters need braces",
                        start,
                        "use \"${10}\" instead of \"$10\"",
                    ));
                }
                Ok(WordUnit::Variable(ParamName::Positional(c.to_digit(10).unwrap() as usize)))
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name_start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.advance();
                }
                let name: String = self.chars[name_start..self.pos].iter().collect();
                if self.peek() == Some('=') {
                    return Err(self.err(
                        sc::SC1066_DOLLAR_ASSIGNMENT,
                        "don't use $ on the left side of an assignment",
                        start,
                        "write `name=value`, not `$name=value`",
                    ));
                }
                Ok(WordUnit::Variable(ParamName::Variable(name)))
            }
            _ => Ok(WordUnit::Literal("$".to_string())),
        }
    }

    /// A here-document delimiter enables expansion in its body only if it
    /// was written with no quoting or backslash-escaping at all.
    fn word_is_unquoted(word: &Word) -> bool {
        fn unit_is_unquoted(u: &WordUnit) -> bool {
            !matches!(
                u,
                WordUnit::SingleQuoted(_) | WordUnit::DoubleQuoted(_) | WordUnit::DollarSingleQuoted(_)
            )
        }
        word.units.iter().all(unit_is_unquoted)
    }

    fn is_special_param_char(c: char) -> bool {
        matches!(c, '@' | '*' | '#' | '?' | '-' | '$' | '!' | '_')
    }

    fn special_param(c: char) -> ParamName {
        ParamName::Special(match c {
            '@' => SpecialParam::At,
            '*' => SpecialParam::Asterisk,
            '#' => SpecialParam::Number,
            '?' => SpecialParam::Question,
            '-' => SpecialParam::Hyphen,
            '$' => SpecialParam::Dollar,
            '!' => SpecialParam::Exclamation,
            '_' => SpecialParam::Underscore,
            _ => unreachable!(),
        })
    }

    /// Parses `${...}` starting just after the opening brace.
    fn lex_braced_param(&mut self, dollar_start: usize) -> LResult<WordUnit> {
        let mut ops = Vec::new();
        // `#name` length prefix, or `!name` indirect/prefix-match, checked
        // before the ordinary name so they aren't mistaken for modifiers.
        let mut is_length = false;
        if self.peek() == Some('#') && !matches!(self.peek_at(1), Some('}') | None) {
            // `${#}` is the "length of $#", handled as ordinary name below;
            // `${#name}` is length-of-name.
            if self.peek_at(1) != Some('#') || self.peek_at(2) == Some('}') {
                is_length = true;
                self.advance();
            }
        }
        let mut is_indirect_prefix = false;
        if self.peek() == Some('!') {
            is_indirect_prefix = true;
            self.advance();
        }
        let name = self.lex_param_name()?;
        let mut subscript = None;
        if self.peek() == Some('[') {
            self.advance();
            let sub_start = self.pos;
            let mut depth = 1i32;
            while depth > 0 {
                match self.peek() {
                    None => {
                        return Err(self.err(sc::SC1000_UNKNOWN, "unterminated array subscript", dollar_start, "add the missing ]"))
                    }
                    Some('[') => {
                        depth += 1;
                        self.advance();
                    }
                    Some(']') => {
                        depth -= 1;
                        if depth > 0 {
                            self.advance();
                        }
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
            let sub: String = self.chars[sub_start..self.pos].iter().collect();
            self.advance(); // ]
            subscript = Some(match sub.as_str() {
                "@" => Subscript::AllValues,
                "*" => Subscript::AllKeys,
                _ => Subscript::Index(sub),
            });
        }

        if is_indirect_prefix {
            if self.peek() == Some('*') {
                self.advance();
                ops.push(Modifier::PrefixMatchNames { concat: false });
            } else if self.peek() == Some('@') {
                self.advance();
                ops.push(Modifier::PrefixMatchNames { concat: true });
            } else {
                ops.push(Modifier::Indirect);
            }
        }
        if let Some(sub) = subscript {
            ops.push(Modifier::Subscript(sub));
        }
        if is_length {
            ops.push(Modifier::Length);
            self.expect_close_brace(dollar_start)?;
            return Ok(WordUnit::VariableBraced(BracedParam { name, ops }));
        }

        loop {
            match self.peek() {
                Some('}') => {
                    self.advance();
                    break;
                }
                None => {
                    return Err(self.err(sc::SC1000_UNKNOWN, "unterminated parameter expansion", dollar_start, "add the missing }"))
                }
                Some(':') => {
                    self.advance();
                    match self.peek() {
                        Some('-') => {
                            self.advance();
                            let word = self.lex_brace_operand()?;
                            ops.push(Modifier::Default { word, assign: false, error: false, alternate: false, unset_or_empty: true });
                        }
                        Some('=') => {
                            self.advance();
                            let word = self.lex_brace_operand()?;
                            ops.push(Modifier::Default { word, assign: true, error: false, alternate: false, unset_or_empty: true });
                        }
                        Some('?') => {
                            self.advance();
                            let word = self.lex_brace_operand()?;
                            ops.push(Modifier::Default { word, assign: false, error: true, alternate: false, unset_or_empty: true });
                        }
                        Some('+') => {
                            self.advance();
                            let word = self.lex_brace_operand()?;
                            ops.push(Modifier::Default { word, assign: false, error: false, alternate: true, unset_or_empty: true });
                        }
                        _ => {
                            let offset = self.lex_arith_operand_until(&[':', '}'])?;
                            let mut length = None;
                            if self.peek() == Some(':') {
                                self.advance();
                                length = Some(self.lex_arith_operand_until(&['}'])?);
                            }
                            ops.push(Modifier::Substring { offset, length });
                        }
                    }
                }
                Some('-') => {
                    self.advance();
                    let word = self.lex_brace_operand()?;
                    ops.push(Modifier::Default { word, assign: false, error: false, alternate: false, unset_or_empty: false });
                }
                Some('=') => {
                    self.advance();
                    let word = self.lex_brace_operand()?;
                    ops.push(Modifier::Default { word, assign: true, error: false, alternate: false, unset_or_empty: false });
                }
                Some('?') => {
                    self.advance();
                    let word = self.lex_brace_operand()?;
                    ops.push(Modifier::Default { word, assign: false, error: true, alternate: false, unset_or_empty: false });
                }
                Some('+') => {
                    self.advance();
                    let word = self.lex_brace_operand()?;
                    ops.push(Modifier::Default { word, assign: false, error: false, alternate: true, unset_or_empty: false });
                }
                Some('#') => {
                    self.advance();
                    let greedy = if self.peek() == Some('#') {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    let pattern = self.lex_brace_operand()?;
                    ops.push(Modifier::RemovePrefix { pattern, greedy });
                }
                Some('%') => {
                    self.advance();
                    let greedy = if self.peek() == Some('%') {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    let pattern = self.lex_brace_operand_until_slash_or_close()?;
                    ops.push(Modifier::RemoveSuffix { pattern, greedy });
                }
                Some('/') => {
                    self.advance();
                    let scope = match self.peek() {
                        Some('/') => {
                            self.advance();
                            SubstScope::All
                        }
                        Some('#') => {
                            self.advance();
                            SubstScope::Prefix
                        }
                        Some('%') => {
                            self.advance();
                            SubstScope::Suffix
                        }
                        _ => SubstScope::First,
                    };
                    let pattern = self.lex_brace_operand_until_slash_or_close()?;
                    let replacement = if self.peek() == Some('/') {
                        self.advance();
                        self.lex_brace_operand()?
                    } else {
                        Word::with_units(vec![], self.loc(self.pos, self.pos))
                    };
                    ops.push(Modifier::Substitute { pattern, replacement, scope });
                }
                Some('^') => {
                    self.advance();
                    if self.peek() == Some('^') {
                        self.advance();
                        ops.push(Modifier::CaseAllUpper);
                    } else {
                        ops.push(Modifier::CaseFirstUpper);
                    }
                }
                Some(',') => {
                    self.advance();
                    if self.peek() == Some(',') {
                        self.advance();
                        ops.push(Modifier::CaseAllLower);
                    } else {
                        ops.push(Modifier::CaseFirstLower);
                    }
                }
                Some('@') => {
                    self.advance();
                    let op = match self.advance() {
                        Some('Q') => TransformOp::Q,
                        Some('E') => TransformOp::E,
                        Some('P') => TransformOp::P,
                        Some('A') => TransformOp::A,
                        Some('a') => TransformOp::LowerA,
                        Some('L') => TransformOp::L,
                        Some('U') => TransformOp::U,
                        Some('K') => TransformOp::K,
                        Some('k') => TransformOp::LowerK,
                        _ => TransformOp::Q,
                    };
                    ops.push(Modifier::Transform(op));
                }
                _ => {
                    // Unknown char inside braces: consume to avoid looping
                    // forever; surfaced as SC1000 on exit if never closed.
                    self.advance();
                }
            }
        }
        Ok(WordUnit::VariableBraced(BracedParam { name, ops }))
    }

    fn expect_close_brace(&mut self, dollar_start: usize) -> LResult<()> {
        if self.peek() == Some('}') {
            self.advance();
            Ok(())
        } else {
            Err(self.err(sc::SC1000_UNKNOWN, "unterminated parameter expansion", dollar_start, "add the missing }"))
        }
    }

    fn lex_param_name(&mut self) -> LResult<ParamName> {
        match self.peek() {
            Some(c) if Self::is_special_param_char(c) && c != '_' => {
                self.advance();
                Ok(Self::special_param(c))
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    self.advance();
                }
                let s: String = self.chars[start..self.pos].iter().collect();
                Ok(ParamName::Positional(s.parse().unwrap_or(usize::MAX)))
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.advance();
                }
                let s: String = self.chars[start..self.pos].iter().collect();
                Ok(ParamName::Variable(s))
            }
        }
    }

    /// Reads a braced-parameter operand word up to the matching `}` (honoring
    /// nested braces and quoting).
    fn lex_brace_operand(&mut self) -> LResult<Word> {
        self.lex_brace_operand_stop_at(&['}'])
    }

    fn lex_brace_operand_until_slash_or_close(&mut self) -> LResult<Word> {
        self.lex_brace_operand_stop_at(&['/', '}'])
    }

    fn lex_brace_operand_stop_at(&mut self, stop: &[char]) -> LResult<Word> {
        let start = self.pos;
        let mut units = Vec::new();
        let mut literal = String::new();
        let mut depth = 0i32;
        loop {
            match self.peek() {
                None => break,
                Some(c) if stop.contains(&c) && depth == 0 => break,
                Some('{') => {
                    depth += 1;
                    literal.push('{');
                    self.advance();
                }
                Some('}') => {
                    depth -= 1;
                    literal.push('}');
                    self.advance();
                }
                Some('\'') => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_single_quoted()?);
                }
                Some('"') => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_double_quoted()?);
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.advance() {
                        literal.push(c);
                    }
                }
                Some('$') => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    units.push(self.lex_dollar()?);
                }
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }
        if !literal.is_empty() {
            units.push(WordUnit::Literal(literal));
        }
        Ok(Word::with_units(units, self.loc(start, self.pos)))
    }

    /// Reads a raw string up to one of `stop` (no word-unit structure; used
    /// for `:offset` and `:offset:length` which are arithmetic expressions).
    fn lex_arith_operand_until(&mut self, stop: &[char]) -> LResult<Word> {
        self.lex_brace_operand_stop_at(stop)
    }

    fn lex_brace_expand(&mut self, len: usize) -> LResult<WordUnit> {
        let end = self.pos + len;
        self.advance(); // {
        let content_start = self.pos;
        // Find the matching close brace position (already validated by
        // brace_expand_extent).
        let content_end = end - 1;
        let content: String = self.chars[content_start..content_end].iter().collect();
        // advance cursor to content_end, then consume closing '}'
        self.pos = content_end;
        self.advance();

        // Range form: `start..end` or `start..end..step`, no top-level comma.
        if let Some(range) = Self::try_parse_range(&content) {
            return Ok(WordUnit::Brace(BraceExpand::Range(range)));
        }

        // List form: split on top-level commas (depth tracked over nested
        // braces and quotes) and lex each piece as its own word.
        let pieces = Self::split_top_level_commas(&content);
        let mut words = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let source = Source::Unknown;
            let mut sub = Lexer::new(&piece, source);
            let w = sub.lex_word()?;
            words.push(w);
        }
        Ok(WordUnit::Brace(BraceExpand::List(words)))
    }

    fn try_parse_range(content: &str) -> Option<BraceRange> {
        if content.contains(',') {
            return None;
        }
        let parts: Vec<&str> = content.split("..").collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }
        let start = parts[0];
        let end = parts[1];
        let step = match parts.get(2) {
            Some(s) => Some(s.parse::<i64>().ok()?),
            None => None,
        };
        let both_numeric = start.trim_start_matches('-').chars().all(|c| c.is_ascii_digit())
            && end.trim_start_matches('-').chars().all(|c| c.is_ascii_digit())
            && !start.is_empty()
            && !end.is_empty();
        let both_alpha = start.chars().count() == 1
            && end.chars().count() == 1
            && start.chars().next().unwrap().is_ascii_alphabetic()
            && end.chars().next().unwrap().is_ascii_alphabetic();
        if !both_numeric && !both_alpha {
            return None;
        }
        let zero_pad = if both_numeric {
            let width = |s: &str| {
                let digits = s.trim_start_matches('-');
                if digits.len() > 1 && digits.starts_with('0') {
                    Some(digits.len())
                } else {
                    None
                }
            };
            width(start).or_else(|| width(end))
        } else {
            None
        };
        Some(BraceRange { start: start.to_string(), end: end.to_string(), step, zero_pad })
    }

    fn split_top_level_commas(content: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut depth = 0i32;
        let mut in_single = false;
        let mut in_double = false;
        let mut current = String::new();
        let mut chars = content.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if !in_single => {
                    current.push(c);
                    if let Some(n) = chars.next() {
                        current.push(n);
                    }
                }
                '\'' if !in_double => {
                    in_single = !in_single;
                    current.push(c);
                }
                '"' if !in_single => {
                    in_double = !in_double;
                    current.push(c);
                }
                '{' if !in_single && !in_double => {
                    depth += 1;
                    current.push(c);
                }
                '}' if !in_single && !in_double => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if !in_single && !in_double && depth == 0 => {
                    out.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }
        out.push(current);
        out
    }

    // -- keyword/assignment classification ----------------------------------

    fn classify_word(&mut self, word: Word, word_start: usize) -> LResult<Token> {
        if self.command_position {
            if let Some(lit) = word.to_literal() {
                if let Some(kw) = Keyword::parse(&lit) {
                    return Ok(Token::new(TokenKind::Keyword(kw), word.location.clone()));
                }
            }
        }
        // Assignment word: NAME=... or NAME+=... where NAME is a valid
        // identifier, recognized only from a single leading literal unit.
        if let Some(WordUnit::Literal(lit)) = word.units.first() {
            if let Some((name, append, rest_offset)) = Self::split_assignment_prefix(lit) {
                let _ = rest_offset;
                let _ = name;
                let _ = append;
                return Ok(Token::new(TokenKind::AssignmentWord(word), self.loc(word_start, self.pos)));
            }
        }
        Ok(Token::new(TokenKind::Word(word), self.loc(word_start, self.pos)))
    }

    /// Returns `(name, append, offset_of_value_in_literal)` if `lit` starts
    /// with a valid `NAME=` or `NAME+=` assignment prefix.
    fn split_assignment_prefix(lit: &str) -> Option<(String, bool, usize)> {
        let mut chars = lit.char_indices();
        let (_, first) = chars.next()?;
        if !(first.is_alphabetic() || first == '_') {
            return None;
        }
        let mut last_name_end = first.len_utf8();
        for (i, c) in chars {
            if c.is_alphanumeric() || c == '_' {
                last_name_end = i + c.len_utf8();
                continue;
            }
            if c == '[' {
                // array subscript assignment, e.g. arr[0]=v; accept any
                // content up to matching ] without validating here.
                if let Some(close) = lit[i..].find(']') {
                    let after = i + close + 1;
                    if lit[after..].starts_with('=') {
                        return Some((lit[..i].to_string(), false, after + 1));
                    }
                    if lit[after..].starts_with("+=") {
                        return Some((lit[..i].to_string(), true, after + 2));
                    }
                }
                return None;
            }
            if c == '+' && lit[i..].starts_with("+=") {
                return Some((lit[..i].to_string(), true, i + 2));
            }
            if c == '=' {
                return Some((lit[..i].to_string(), false, i + 1));
            }
            return None;
        }
        let _ = last_name_end;
        None
    }

    // -- heredoc capture ------------------------------------------------------

    /// Called right after the `<<`/`<<-` operator token and its delimiter
    /// word have both been produced, so the caller (parser, via
    /// `Lexer::queue_heredoc`) can register the pending body.
    pub fn queue_heredoc(&mut self, delimiter: String, strip_tabs: bool, expand: bool) -> usize {
        let slot = self.heredoc_bodies.len();
        self.heredoc_bodies.push(Word::with_units(vec![], self.loc(self.pos, self.pos)));
        self.pending_heredocs.push(PendingHereDoc { delimiter, strip_tabs, expand, slot });
        slot
    }

    fn resolve_pending_heredocs(&mut self) -> LResult<()> {
        let pending = std::mem::take(&mut self.pending_heredocs);
        for p in pending {
            let body = self.read_heredoc_body(&p)?;
            self.heredoc_bodies[p.slot] = body;
        }
        Ok(())
    }

    fn read_heredoc_body(&mut self, p: &PendingHereDoc) -> LResult<Word> {
        let mut raw = String::new();
        loop {
            let line_start = self.pos;
            while !matches!(self.peek(), Some('\n') | None) {
                self.advance();
            }
            let mut line: String = self.chars[line_start..self.pos].iter().collect();
            let had_newline = self.peek() == Some('\n');
            if had_newline {
                self.advance();
            }
            let check_line = if p.strip_tabs { line.trim_start_matches('\t') } else { &line };
            if check_line == p.delimiter {
                break;
            }
            if !had_newline {
                return Err(self.err(
                    sc::SC1044_UNTERMINATED_HEREDOC,
                    format!("here-document delimited by '{}' was not terminated before end of file", p.delimiter),
                    self.pos,
                    "add a line containing only the delimiter before the end of the file",
                ));
            }
            if p.strip_tabs {
                line = line.trim_start_matches('\t').to_string();
            }
            raw.push_str(&line);
            raw.push('\n');
        }
        if p.expand {
            let mut sub = Lexer::new(&raw, Source::HereDoc { location: self.loc(self.pos, self.pos) });
            let unit = sub.lex_double_quoted_like(&raw)?;
            Ok(Word::with_units(vec![unit], self.loc(self.pos, self.pos)))
        } else {
            Ok(Word::with_units(vec![WordUnit::SingleQuoted(raw)], self.loc(self.pos, self.pos)))
        }
    }

    /// Lexes `raw` as if it were the interior of a double-quoted string
    /// (expansions enabled, no terminating quote required). Used for
    /// unquoted here-document bodies.
    fn lex_double_quoted_like(&mut self, raw: &str) -> LResult<WordUnit> {
        let mut units = Vec::new();
        let mut literal = String::new();
        let chars: Vec<char> = raw.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '\\' if i + 1 < chars.len() && matches!(chars[i + 1], '$' | '`' | '\\') => {
                    literal.push(chars[i + 1]);
                    i += 2;
                }
                '$' => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    let rest: String = chars[i..].iter().collect();
                    let mut sub = Lexer::new(&rest, Source::Unknown);
                    let unit = sub.lex_dollar()?;
                    units.push(unit);
                    i += sub.pos;
                }
                '`' => {
                    if !literal.is_empty() {
                        units.push(WordUnit::Literal(std::mem::take(&mut literal)));
                    }
                    let rest: String = chars[i..].iter().collect();
                    let mut sub = Lexer::new(&rest, Source::Unknown);
                    let unit = sub.lex_backquoted()?;
                    units.push(unit);
                    i += sub.pos;
                }
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            units.push(WordUnit::Literal(literal));
        }
        Ok(WordUnit::DoubleQuoted(units))
    }

    /// Allows the parser to force command-position classification before
    /// lexing continues isn't needed here because we tokenize eagerly up
    /// front; exposed for symmetry with the heredoc queue API.
    pub fn current_pos(&self) -> usize {
        self.pos
    }
}

/// Convenience entry point matching the embedding API's `tokenize` contract.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, Source::Unknown).tokenize_owned()
}
