// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Recursive-descent parser building an [`ast::Script`] from a token stream.
//!
//! Grounded on the grammar shape of yash-rs's `parser::fill` family (one
//! method per grammar production, explicit lookahead via `peek`/`peek2`),
//! made synchronous over an already-complete `Vec<Token>` rather than an
//! async token stream, and extended with Bash's compound-command set.

use crate::ast::*;
use crate::diagnostics::{sc, Diagnostic, ParseError};
use crate::source::Location;
use crate::token::{Keyword, Operator, Token, TokenKind};
use crate::word::{Word, WordUnit};

type PResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    heredocs: Vec<Word>,
    heredoc_idx: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, heredocs: Vec<Word>) -> Self {
        // Comments and the shebang carry no grammatical weight.
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Comment(_) | TokenKind::Shebang(_)))
            .collect();
        Parser { tokens, pos: 0, heredocs, heredoc_idx: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn err(&self, code: &'static str, message: impl Into<String>, loc: Location, hint: &'static str) -> ParseError {
        ParseError(Diagnostic::new(code, message, loc, hint))
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let tok = self.peek();
        self.err(
            sc::SC1000_UNKNOWN,
            format!("expected {expected}, found {}", describe(tok)),
            tok.location.clone(),
            "check the surrounding syntax",
        )
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Operator(Operator::Semicolon, _) => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn is_keyword(&self, kw: Keyword) -> bool {
        self.peek().as_keyword() == Some(kw)
    }

    fn is_operator(&self, op: Operator) -> bool {
        self.peek().as_operator() == Some(op)
    }

    fn expect_keyword(&mut self, kw: Keyword) -> PResult<()> {
        if self.is_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword_name(kw)))
        }
    }

    fn expect_operator(&mut self, op: Operator) -> PResult<()> {
        if self.is_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(operator_name(op)))
        }
    }

    fn next_heredoc(&mut self) -> Word {
        let w = self.heredocs.get(self.heredoc_idx).cloned().unwrap_or_else(|| Word::new(Location::dummy()));
        self.heredoc_idx += 1;
        w
    }

    // -- top level -----------------------------------------------------------

    pub fn parse_script(mut self) -> PResult<Script> {
        let script = self.parse_compound_list(&[])?;
        if !self.at_eof() {
            return Err(self.unexpected("end of script"));
        }
        Ok(script)
    }

    /// Parses items until EOF or one of `terminators` (a following keyword)
    /// is seen in command position.
    fn parse_compound_list(&mut self, terminators: &[Keyword]) -> PResult<Script> {
        let mut items = Vec::new();
        self.skip_separators();
        loop {
            if self.at_eof() {
                break;
            }
            if terminators.iter().any(|k| self.is_keyword(*k)) {
                break;
            }
            let and_or = self.parse_and_or()?;
            let separator = match self.peek().kind {
                TokenKind::Operator(Operator::Amp, _) => {
                    self.advance();
                    Some(Separator::Background)
                }
                TokenKind::Operator(Operator::Semicolon, _) => {
                    self.advance();
                    Some(Separator::Sequential)
                }
                TokenKind::Newline => {
                    self.advance();
                    Some(Separator::Sequential)
                }
                _ => None,
            };
            items.push(Item { and_or, separator });
            self.skip_separators();
            if terminators.iter().any(|k| self.is_keyword(*k)) || self.at_eof() {
                break;
            }
            if separator.is_none() {
                // No separator consumed and we're not at a terminator/EOF:
                // the grammar requires one between items.
                break;
            }
        }
        Ok(Script { items })
    }

    fn parse_and_or(&mut self) -> PResult<AndOrList> {
        let first = self.parse_pipeline()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(Operator::AndIf, _) => AndOr::And,
                TokenKind::Operator(Operator::OrIf, _) => AndOr::Or,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            rest.push((op, self.parse_pipeline()?));
        }
        Ok(AndOrList { first, rest })
    }

    fn parse_pipeline(&mut self) -> PResult<Pipeline> {
        let negate = if self.is_keyword(Keyword::Bang) {
            self.advance();
            true
        } else {
            false
        };
        let mut commands = vec![self.parse_command()?];
        let mut pipe_stderr = Vec::new();
        loop {
            let stderr_too = match self.peek().kind {
                TokenKind::Operator(Operator::Pipe, _) => false,
                TokenKind::Operator(Operator::PipeAmp, _) => true,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            pipe_stderr.push(stderr_too);
            commands.push(self.parse_command()?);
        }
        Ok(Pipeline { commands, negate, pipe_stderr })
    }

    // -- commands -------------------------------------------------------------

    fn parse_command(&mut self) -> PResult<Command> {
        if self.is_keyword(Keyword::Function) {
            return self.parse_function_definition_with_keyword();
        }
        if let TokenKind::Word(w) = &self.peek().kind {
            if let Some(lit) = w.to_literal() {
                if is_valid_name(&lit) {
                    if let Some(next) = self.peek2() {
                        if next.as_operator() == Some(Operator::OpenParen) {
                            return self.parse_function_definition_shorthand();
                        }
                    }
                }
            }
        }
        if let Some(kw) = self.peek().as_keyword() {
            match kw {
                Keyword::If => return self.parse_if(),
                Keyword::While => return self.parse_while_until(false),
                Keyword::Until => return self.parse_while_until(true),
                Keyword::For => return self.parse_for(),
                Keyword::Case => return self.parse_case(),
                Keyword::OpenBrace => return self.parse_group(),
                Keyword::Coproc => return self.parse_coproc(),
                Keyword::Time => {
                    self.advance();
                    return self.parse_command();
                }
                _ => {}
            }
        }
        match self.peek().as_operator() {
            Some(Operator::OpenParen) => return self.parse_subshell(),
            Some(Operator::DOpenBracket) => return self.parse_test_expression(),
            _ => {}
        }
        if let TokenKind::ArithCommand(expr) = &self.peek().kind {
            let expr = expr.clone();
            let location = self.peek().location.clone();
            self.advance();
            let redirects = self.parse_redirects()?;
            return Ok(Command::Compound(Box::new(CompoundCommand::Arith(ArithCommand { expression: expr, location })), redirects));
        }
        self.parse_simple_command()
    }

    fn parse_group(&mut self) -> PResult<Command> {
        self.expect_keyword(Keyword::OpenBrace)?;
        let body = self.parse_compound_list(&[Keyword::CloseBrace])?;
        self.expect_keyword(Keyword::CloseBrace)?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::Group(body)), redirects))
    }

    fn parse_subshell(&mut self) -> PResult<Command> {
        self.expect_operator(Operator::OpenParen)?;
        let body = self.parse_compound_list(&[])?;
        self.expect_close_paren()?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::Subshell(body)), redirects))
    }

    fn expect_close_paren(&mut self) -> PResult<()> {
        if self.is_operator(Operator::CloseParen) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(
                sc::SC1056_UNCLOSED_GROUP,
                "expected a closing )",
                self.peek().location.clone(),
                "add the missing ')'",
            ))
        }
    }

    fn parse_if(&mut self) -> PResult<Command> {
        self.expect_keyword(Keyword::If)?;
        let condition = self.parse_compound_list(&[Keyword::Then])?;
        self.require_keyword_or(Keyword::Then, sc::SC1047_ORPHAN_THEN, "expected 'then'", "add 'then' after the if condition")?;
        let body = self.parse_compound_list(&[Keyword::Elif, Keyword::Else, Keyword::Fi])?;
        let mut elifs = Vec::new();
        while self.is_keyword(Keyword::Elif) {
            self.advance();
            let cond = self.parse_compound_list(&[Keyword::Then])?;
            self.require_keyword_or(Keyword::Then, sc::SC1047_ORPHAN_THEN, "expected 'then'", "add 'then' after the elif condition")?;
            let b = self.parse_compound_list(&[Keyword::Elif, Keyword::Else, Keyword::Fi])?;
            elifs.push((cond, b));
        }
        let else_body = if self.is_keyword(Keyword::Else) {
            self.advance();
            Some(self.parse_compound_list(&[Keyword::Fi])?)
        } else {
            None
        };
        self.require_keyword_or(Keyword::Fi, sc::SC1046_UNCLOSED_IF, "expected 'fi'", "close the 'if' statement with 'fi'")?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::If(If { condition, body, elifs, else_body })), redirects))
    }

    fn require_keyword_or(&mut self, kw: Keyword, code: &'static str, message: &'static str, hint: &'static str) -> PResult<()> {
        if self.is_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(code, message, self.peek().location.clone(), hint))
        }
    }

    fn parse_while_until(&mut self, until: bool) -> PResult<Command> {
        self.advance(); // while/until
        let condition = self.parse_compound_list(&[Keyword::Do])?;
        self.require_keyword_or(Keyword::Do, sc::SC1061_ORPHAN_DO, "expected 'do'", "add 'do' after the loop condition")?;
        let body = self.parse_compound_list(&[Keyword::Done])?;
        self.require_keyword_or(Keyword::Done, sc::SC1062_ORPHAN_DONE, "expected 'done'", "close the loop with 'done'")?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::While(WhileLoop { condition, body, until })), redirects))
    }

    fn parse_for(&mut self) -> PResult<Command> {
        self.expect_keyword(Keyword::For)?;
        if let TokenKind::ArithCommand(expr) = self.peek().kind.clone() {
            self.advance();
            let parts: Vec<&str> = expr.splitn(3, ';').collect();
            let init = parts.first().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            let cond = parts.get(1).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            let post = parts.get(2).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            self.skip_separators();
            self.require_keyword_or(Keyword::Do, sc::SC1137_CFOR_MISSING_PAREN, "expected 'do'", "add 'do' after the for-loop header")?;
            let body = self.parse_compound_list(&[Keyword::Done])?;
            self.require_keyword_or(Keyword::Done, sc::SC1062_ORPHAN_DONE, "expected 'done'", "close the loop with 'done'")?;
            let redirects = self.parse_redirects()?;
            return Ok(Command::Compound(Box::new(CompoundCommand::CFor(CForLoop { init, cond, post, body })), redirects));
        }
        let name_tok = self.advance();
        let variable = match &name_tok.kind {
            TokenKind::Word(w) => w.to_literal().ok_or_else(|| self.unexpected("a loop variable name"))?,
            _ => return Err(self.unexpected("a loop variable name")),
        };
        self.skip_newlines();
        let items = if self.is_keyword(Keyword::In) {
            self.advance();
            let mut words = Vec::new();
            loop {
                match &self.peek().kind {
                    TokenKind::Word(w) | TokenKind::AssignmentWord(w) => {
                        words.push(w.clone());
                        self.advance();
                    }
                    _ => break,
                }
            }
            Some(words)
        } else {
            None
        };
        self.skip_separators();
        self.require_keyword_or(Keyword::Do, sc::SC1061_ORPHAN_DO, "expected 'do'", "add 'do' after the for-loop header")?;
        let body = self.parse_compound_list(&[Keyword::Done])?;
        self.require_keyword_or(Keyword::Done, sc::SC1062_ORPHAN_DONE, "expected 'done'", "close the loop with 'done'")?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::For(ForLoop { variable, items, body })), redirects))
    }

    fn parse_case(&mut self) -> PResult<Command> {
        self.expect_keyword(Keyword::Case)?;
        let word = self.parse_single_word("a case word")?;
        self.skip_newlines();
        self.require_keyword_or(Keyword::In, sc::SC1058_MISSING_IN, "expected 'in'", "add 'in' after the case word")?;
        self.skip_separators();
        let mut items = Vec::new();
        while !self.is_keyword(Keyword::Esac) && !self.at_eof() {
            if self.is_operator(Operator::OpenParen) {
                self.advance();
            }
            let mut patterns = vec![self.parse_single_word("a case pattern")?];
            while self.is_operator(Operator::Pipe) {
                self.advance();
                patterns.push(self.parse_single_word("a case pattern")?);
            }
            self.expect_close_paren()?;
            self.skip_separators();
            let body = self.parse_compound_list(&[Keyword::Esac])?;
            let terminator = match self.peek().kind {
                TokenKind::Operator(Operator::DSemi, _) => {
                    self.advance();
                    CaseTerminator::Break
                }
                TokenKind::Operator(Operator::SemiAmp, _) => {
                    self.advance();
                    CaseTerminator::FallThrough
                }
                TokenKind::Operator(Operator::DSemiAmp, _) => {
                    self.advance();
                    CaseTerminator::Continue
                }
                _ => CaseTerminator::Break,
            };
            self.skip_separators();
            items.push(CaseItem { patterns, body, terminator });
        }
        self.require_keyword_or(Keyword::Esac, sc::SC1074_MISSING_ESAC, "expected 'esac'", "close the case statement with 'esac'")?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::Case(Case { word, items })), redirects))
    }

    fn parse_coproc(&mut self) -> PResult<Command> {
        self.expect_keyword(Keyword::Coproc)?;
        let name = if let TokenKind::Word(w) = &self.peek().kind {
            let lit = w.to_literal();
            if let Some(lit) = &lit {
                if is_valid_name(lit) && !matches!(self.peek2().and_then(|t| t.as_operator()), Some(Operator::OpenParen)) {
                    self.advance();
                    Some(lit.clone())
                } else {
                    None
                }
            } else {
                None
            }
        } else {
            None
        };
        let body = Box::new(self.parse_command()?);
        Ok(Command::Compound(Box::new(CompoundCommand::Coproc(Coproc { name, body })), Vec::new()))
    }

    fn parse_function_definition_with_keyword(&mut self) -> PResult<Command> {
        let start = self.peek().location.clone();
        self.expect_keyword(Keyword::Function)?;
        let name_tok = self.advance();
        let name = match &name_tok.kind {
            TokenKind::Word(w) => w.to_literal().ok_or_else(|| self.unexpected("a function name"))?,
            _ => return Err(self.unexpected("a function name")),
        };
        if self.is_operator(Operator::OpenParen) {
            self.advance();
            if !self.is_operator(Operator::CloseParen) {
                return Err(self.err(
                    sc::SC1065_PARAMS_IN_FUNCTION_NAME,
                    "functions can't take parameters in their definition",
                    self.peek().location.clone(),
                    "remove the arguments between the parentheses",
                ));
            }
            self.advance();
        }
        self.skip_newlines();
        let body = self.parse_function_body()?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Function(Box::new(FunctionDefinition { name, body, redirects, location: start })))
    }

    fn parse_function_definition_shorthand(&mut self) -> PResult<Command> {
        let name_tok = self.advance();
        let location = name_tok.location.clone();
        let name = match &name_tok.kind {
            TokenKind::Word(w) => w.to_literal().unwrap(),
            _ => unreachable!(),
        };
        self.expect_operator(Operator::OpenParen)?;
        self.expect_close_paren()?;
        self.skip_newlines();
        let body = self.parse_function_body()?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Function(Box::new(FunctionDefinition { name, body, redirects, location })))
    }

    fn parse_function_body(&mut self) -> PResult<CompoundCommand> {
        let cmd = self.parse_command()?;
        match cmd {
            Command::Compound(c, _) => Ok(*c),
            _ => Err(self.err(
                sc::SC1064_FUNCTION_BODY_NOT_COMPOUND,
                "a function body must be a compound command",
                self.peek().location.clone(),
                "wrap the function body in { ...; } or ( ... )",
            )),
        }
    }

    // -- [[ ... ]] test expressions --------------------------------------------

    fn parse_test_expression(&mut self) -> PResult<Command> {
        self.expect_operator(Operator::DOpenBracket)?;
        let expr = self.parse_test_or()?;
        self.expect_operator(Operator::DCloseBracket)?;
        let redirects = self.parse_redirects()?;
        Ok(Command::Compound(Box::new(CompoundCommand::TestExpression(expr)), redirects))
    }

    fn parse_test_or(&mut self) -> PResult<TestExpression> {
        let mut lhs = self.parse_test_and()?;
        while self.is_operator(Operator::OrIf) {
            self.advance();
            let rhs = self.parse_test_and()?;
            lhs = TestExpression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_test_and(&mut self) -> PResult<TestExpression> {
        let mut lhs = self.parse_test_unary()?;
        while self.is_operator(Operator::AndIf) {
            self.advance();
            let rhs = self.parse_test_unary()?;
            lhs = TestExpression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_test_unary(&mut self) -> PResult<TestExpression> {
        if self.is_keyword(Keyword::Bang) {
            self.advance();
            return Ok(TestExpression::Not(Box::new(self.parse_test_unary()?)));
        }
        if self.is_operator(Operator::OpenParen) {
            self.advance();
            let inner = self.parse_test_or()?;
            self.expect_close_paren()?;
            return Ok(TestExpression::Group(Box::new(inner)));
        }
        if let TokenKind::Word(w) = &self.peek().kind {
            if let Some(lit) = w.to_literal() {
                if is_unary_test_op(&lit) {
                    self.advance();
                    let operand = self.parse_single_word("a test operand")?;
                    return Ok(TestExpression::Unary { op: lit, operand });
                }
            }
        }
        let lhs = self.parse_single_word("a test operand")?;
        if let TokenKind::Word(w) = &self.peek().kind {
            if let Some(lit) = w.to_literal() {
                if lit == "=~" {
                    self.advance();
                    let rhs = self.parse_single_word("a regular expression")?;
                    return Ok(TestExpression::Regex { lhs, rhs: RegexPattern { word: rhs } });
                }
                if is_binary_test_op(&lit) {
                    self.advance();
                    let rhs = self.parse_single_word("a test operand")?;
                    return Ok(TestExpression::Binary { op: lit, lhs, rhs });
                }
            }
        }
        Ok(TestExpression::Word(lhs))
    }

    // -- simple commands / assignments / words / redirects ----------------------

    fn parse_simple_command(&mut self) -> PResult<Command> {
        if let TokenKind::Word(w) = &self.peek().kind {
            if w.is_bare_literal("[") {
                return self.parse_test_command();
            }
        }
        let location = self.peek().location.clone();
        let mut prefix_assigns = Vec::new();
        let mut words = Vec::new();
        let mut redirects = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::AssignmentWord(w) if words.is_empty() => {
                    let w = w.clone();
                    self.advance();
                    prefix_assigns.push(self.finish_assignment(w)?);
                }
                TokenKind::Word(w) => {
                    words.push(w.clone());
                    self.advance();
                }
                TokenKind::AssignmentWord(w) => {
                    words.push(w.clone());
                    self.advance();
                }
                TokenKind::Operator(op, fd) if op.is_redirection() => {
                    redirects.push(self.parse_one_redirect(*op, *fd)?);
                }
                _ => break,
            }
        }
        if prefix_assigns.is_empty() && words.is_empty() && redirects.is_empty() {
            return Err(self.unexpected("a command"));
        }
        Ok(Command::Simple(SimpleCommand { prefix_assigns, words, redirects, location }))
    }

    fn parse_test_command(&mut self) -> PResult<Command> {
        let location = self.peek().location.clone();
        self.advance(); // '['
        let mut args = Vec::new();
        loop {
            match &self.peek().kind {
                TokenKind::Word(w) if w.is_bare_literal("]") => {
                    self.advance();
                    break;
                }
                TokenKind::Word(w) | TokenKind::AssignmentWord(w) => {
                    args.push(w.clone());
                    self.advance();
                }
                _ => {
                    return Err(self.err(
                        sc::SC1020_SPACE_BEFORE_BRACKET,
                        "expected a closing ]",
                        self.peek().location.clone(),
                        "make sure ] is a separate, space-delimited word",
                    ))
                }
            }
        }
        let redirects = self.parse_redirects()?;
        let _ = location;
        Ok(Command::Compound(Box::new(CompoundCommand::TestCommand(TestCommand { args })), redirects))
    }

    fn finish_assignment(&mut self, word: Word) -> PResult<Assignment> {
        let location = word.location.clone();
        let (name, append, value_word) = split_assignment(word);
        if self.is_operator(Operator::OpenParen) && matches!(value_word.units.as_slice(), []) {
            self.advance();
            let mut elements = Vec::new();
            loop {
                self.skip_newlines();
                if self.is_operator(Operator::CloseParen) {
                    self.advance();
                    break;
                }
                match &self.peek().kind {
                    TokenKind::Word(w) | TokenKind::AssignmentWord(w) => {
                        // `[sub]=value` is lexed as an ordinary word, since
                        // '[' does not start a valid bare identifier.
                        if let Some(element) = Self::try_parse_indexed_element(w) {
                            elements.push(element);
                        } else {
                            elements.push(ArrayElement { subscript: None, value: w.clone() });
                        }
                        self.advance();
                    }
                    _ => break,
                }
            }
            return Ok(Assignment { name, value: AssignmentValue::Array(elements), append, location });
        }
        Ok(Assignment { name, value: AssignmentValue::Scalar(value_word), append, location })
    }

    /// Recognizes `[sub]=value` written as a single lexed word (its first
    /// unit must be a literal starting with `[`, containing a matching `]`).
    fn try_parse_indexed_element(w: &Word) -> Option<ArrayElement> {
        let WordUnit::Literal(lit) = w.units.first()? else { return None };
        let rest = lit.strip_prefix('[')?;
        let end = rest.find(']')?;
        let sub = &rest[..end];
        let after = &rest[end + 1..];
        let val = after.strip_prefix('=')?;
        let mut value_units = Vec::new();
        if !val.is_empty() {
            value_units.push(WordUnit::Literal(val.to_string()));
        }
        value_units.extend(w.units.iter().skip(1).cloned());
        Some(ArrayElement {
            subscript: Some(Word::with_units(vec![WordUnit::Literal(sub.to_string())], w.location.clone())),
            value: Word::with_units(value_units, w.location.clone()),
        })
    }

    fn parse_single_word(&mut self, expected: &'static str) -> PResult<Word> {
        match &self.peek().kind {
            TokenKind::Word(w) | TokenKind::AssignmentWord(w) => {
                let w = w.clone();
                self.advance();
                Ok(w)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn parse_redirects(&mut self) -> PResult<Vec<Redirect>> {
        let mut redirects = Vec::new();
        while let Some(op) = self.peek().as_operator() {
            let fd = match self.peek().kind {
                TokenKind::Operator(_, fd) => fd,
                _ => None,
            };
            if op.is_redirection() {
                redirects.push(self.parse_one_redirect(op, fd)?);
            } else {
                break;
            }
        }
        Ok(redirects)
    }

    fn parse_one_redirect(&mut self, op: Operator, fd: Option<u32>) -> PResult<Redirect> {
        let location = self.peek().location.clone();
        self.advance();
        let redir_fd = match (op, fd) {
            (Operator::AmpGreat | Operator::AmpDGreat, _) => RedirFd::Both,
            (_, Some(n)) => RedirFd::Explicit(n),
            (_, None) => RedirFd::Default,
        };
        let direction = match op {
            Operator::Less => RedirDirection::Input,
            Operator::Great | Operator::AmpGreat => RedirDirection::Output,
            Operator::DGreat | Operator::AmpDGreat => RedirDirection::Append,
            Operator::LessGreat => RedirDirection::InputOutput,
            Operator::GreatPipe => RedirDirection::Clobber,
            Operator::LessAmp => RedirDirection::DupInput,
            Operator::GreatAmp => RedirDirection::DupOutput,
            Operator::DLess | Operator::DLessDash => RedirDirection::HereDoc,
            Operator::TLess => RedirDirection::HereString,
            _ => return Err(self.unexpected("a redirection operator")),
        };
        let target = match direction {
            RedirDirection::HereDoc => {
                let delimiter_word = self.parse_single_word("a here-document delimiter")?;
                let delimiter = delimiter_word.to_literal().unwrap_or_default();
                let strip_tabs = op == Operator::DLessDash;
                let content = self.next_heredoc();
                RedirTarget::HereDoc { content, delimiter, strip_tabs }
            }
            RedirDirection::DupInput | RedirDirection::DupOutput => {
                if let TokenKind::Word(w) = &self.peek().kind {
                    if w.is_bare_literal("-") {
                        self.advance();
                        RedirTarget::Close
                    } else if let Some(lit) = w.to_literal() {
                        if let Ok(n) = lit.parse::<u32>() {
                            self.advance();
                            RedirTarget::Fd(n)
                        } else {
                            RedirTarget::File(self.parse_single_word("a file descriptor or file name")?)
                        }
                    } else {
                        RedirTarget::File(self.parse_single_word("a file descriptor or file name")?)
                    }
                } else {
                    RedirTarget::File(self.parse_single_word("a file descriptor or file name")?)
                }
            }
            _ => RedirTarget::File(self.parse_single_word("a redirection target")?),
        };
        Ok(Redirect { fd: redir_fd, direction, target, location })
    }
}

fn split_assignment(word: Word) -> (String, bool, Word) {
    let mut units = word.units.into_iter();
    let first = units.next();
    let rest: Vec<WordUnit> = units.collect();
    match first {
        Some(WordUnit::Literal(lit)) => {
            if let Some(pos) = lit.find('=') {
                let (name_part, value_part) = if pos > 0 && lit.as_bytes()[pos - 1] == b'+' {
                    (&lit[..pos - 1], &lit[pos + 1..])
                } else {
                    (&lit[..pos], &lit[pos + 1..])
                };
                let append = pos > 0 && lit.as_bytes()[pos - 1] == b'+';
                let mut value_units = Vec::new();
                if !value_part.is_empty() {
                    value_units.push(WordUnit::Literal(value_part.to_string()));
                }
                value_units.extend(rest);
                let value = Word::with_units(value_units, word.location.clone());
                return (name_part.to_string(), append, value);
            }
            let mut value_units = vec![WordUnit::Literal(lit)];
            value_units.extend(rest);
            (String::new(), false, Word::with_units(value_units, word.location))
        }
        Some(other) => {
            let mut value_units = vec![other];
            value_units.extend(rest);
            (String::new(), false, Word::with_units(value_units, word.location))
        }
        None => (String::new(), false, Word::with_units(Vec::new(), word.location)),
    }
}

fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_unary_test_op(s: &str) -> bool {
    matches!(
        s,
        "-e" | "-f"
            | "-d"
            | "-r"
            | "-w"
            | "-x"
            | "-s"
            | "-z"
            | "-n"
            | "-L"
            | "-h"
            | "-p"
            | "-S"
            | "-b"
            | "-c"
            | "-g"
            | "-u"
            | "-k"
            | "-O"
            | "-G"
            | "-N"
            | "-t"
            | "-v"
            | "-o"
            | "-R"
    )
}

fn is_binary_test_op(s: &str) -> bool {
    matches!(
        s,
        "=" | "==" | "!=" | "<" | ">" | "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge" | "-ef" | "-nt" | "-ot"
    )
}

fn describe(tok: &Token) -> String {
    match &tok.kind {
        TokenKind::Word(w) => format!("word '{}'", w.to_literal().unwrap_or_else(|| "<expansion>".into())),
        TokenKind::AssignmentWord(_) => "an assignment".to_string(),
        TokenKind::Keyword(k) => format!("keyword '{k}'"),
        TokenKind::Operator(op, _) => format!("operator '{op}'"),
        TokenKind::ArithCommand(_) => "an arithmetic command".to_string(),
        TokenKind::Shebang(_) => "a shebang line".to_string(),
        TokenKind::Comment(_) => "a comment".to_string(),
        TokenKind::Newline => "a newline".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

fn keyword_name(kw: Keyword) -> &'static str {
    match kw {
        Keyword::If => "'if'",
        Keyword::Then => "'then'",
        Keyword::Else => "'else'",
        Keyword::Elif => "'elif'",
        Keyword::Fi => "'fi'",
        Keyword::For => "'for'",
        Keyword::While => "'while'",
        Keyword::Until => "'until'",
        Keyword::Do => "'do'",
        Keyword::Done => "'done'",
        Keyword::Case => "'case'",
        Keyword::In => "'in'",
        Keyword::Esac => "'esac'",
        Keyword::Function => "'function'",
        Keyword::Select => "'select'",
        Keyword::Time => "'time'",
        Keyword::Bang => "'!'",
        Keyword::OpenBrace => "'{'",
        Keyword::CloseBrace => "'}'",
        Keyword::Coproc => "'coproc'",
    }
}

fn operator_name(op: Operator) -> &'static str {
    match op {
        Operator::Pipe => "'|'",
        Operator::PipeAmp => "'|&'",
        Operator::OrIf => "'||'",
        Operator::AndIf => "'&&'",
        Operator::Amp => "'&'",
        Operator::Semicolon => "';'",
        Operator::DSemi => "';;'",
        Operator::SemiAmp => "';&'",
        Operator::DSemiAmp => "';;&'",
        Operator::OpenParen => "'('",
        Operator::CloseParen => "')'",
        Operator::DOpenBracket => "'[['",
        Operator::DCloseBracket => "']]'",
        Operator::Less => "'<'",
        Operator::Great => "'>'",
        Operator::DGreat => "'>>'",
        Operator::DLess => "'<<'",
        Operator::DLessDash => "'<<-'",
        Operator::TLess => "'<<<'",
        Operator::LessAmp => "'<&'",
        Operator::GreatAmp => "'>&'",
        Operator::AmpGreat => "'&>'",
        Operator::AmpDGreat => "'&>>'",
        Operator::GreatPipe => "'>|'",
        Operator::LessGreat => "'<>'",
        Operator::ProcSubstIn => "'<('",
        Operator::ProcSubstOut => "'>('",
    }
}
