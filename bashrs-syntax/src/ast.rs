// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Abstract syntax tree produced by the [parser](crate::parser).
//!
//! The shape follows yash-rs's `List` / `Item` / `AndOrList` / `Pipeline` /
//! `Command` hierarchy (see `syntax.rs` in the teacher crate), generalized
//! with Bash's compound-command set (`[[ ]]`, arrays, `coproc`) and given
//! the node names used throughout this project's design notes.

use crate::source::Location;
use crate::word::Word;
use std::fmt;

/// A parsed script: a flat list of items separated by `;`, `&` or newlines.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub items: Vec<Item>,
}

/// How an [`Item`] is joined to the one after it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Separator {
    /// `;` or newline: run sequentially, waiting for completion.
    Sequential,
    /// `&`: run in the background.
    Background,
}

/// One top-level and-or list plus the separator that follows it (absent for
/// the script's last item).
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub and_or: AndOrList,
    pub separator: Option<Separator>,
}

/// Boolean operator chaining consecutive pipelines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AndOr {
    And, // &&
    Or,  // ||
}

/// A sequence of [`Pipeline`]s short-circuited by `&&`/`||`.
#[derive(Clone, Debug, PartialEq)]
pub struct AndOrList {
    pub first: Pipeline,
    pub rest: Vec<(AndOr, Pipeline)>,
}

/// `cmd1 | cmd2 | ...`, optionally negated with a leading `!`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub negate: bool,
    /// Whether `|&` (pipe stderr too) was used before the *next* command for
    /// each pipe; `pipe_stderr[i]` applies to the pipe after `commands[i]`.
    pub pipe_stderr: Vec<bool>,
}

/// One command, in the most general sense the grammar allows.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Simple(SimpleCommand),
    Compound(Box<CompoundCommand>, Vec<Redirect>),
    Function(Box<FunctionDefinition>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimpleCommand {
    pub prefix_assigns: Vec<Assignment>,
    pub words: Vec<Word>,
    pub redirects: Vec<Redirect>,
    pub location: Location,
}

/// `name=value` or `name+=value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: AssignmentValue,
    pub append: bool,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssignmentValue {
    Scalar(Word),
    Array(Vec<ArrayElement>),
}

/// One element of an array-assignment list, `arr=([idx]=value ...)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayElement {
    pub subscript: Option<Word>,
    pub value: Word,
}

/// Kind of grouping compound command.
#[derive(Clone, Debug, PartialEq)]
pub enum CompoundCommand {
    /// `{ list; }` -- runs in the current shell.
    Group(Script),
    /// `( list )` -- runs in a subshell.
    Subshell(Script),
    If(If),
    While(WhileLoop),
    For(ForLoop),
    CFor(CForLoop),
    Case(Case),
    /// `[ args ]`.
    TestCommand(TestCommand),
    /// `[[ expr ]]`.
    TestExpression(TestExpression),
    /// `((expr))`.
    Arith(ArithCommand),
    Coproc(Coproc),
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    pub condition: Script,
    pub body: Script,
    pub elifs: Vec<(Script, Script)>,
    pub else_body: Option<Script>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileLoop {
    pub condition: Script,
    pub body: Script,
    pub until: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForLoop {
    pub variable: String,
    /// `None` means "in \"$@\"" was omitted (the default iterates over the
    /// positional parameters).
    pub items: Option<Vec<Word>>,
    pub body: Script,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CForLoop {
    pub init: Option<String>,
    pub cond: Option<String>,
    pub post: Option<String>,
    pub body: Script,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaseTerminator {
    Break,       // ;;
    FallThrough, // ;&
    Continue,    // ;;& (re-test subsequent patterns)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseItem {
    pub patterns: Vec<Word>,
    pub body: Script,
    pub terminator: CaseTerminator,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub word: Word,
    pub items: Vec<CaseItem>,
}

/// Flat operand/operator token sequence inside `[ ... ]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TestCommand {
    pub args: Vec<Word>,
}

/// `[[ ... ]]` operand/operator sequence, parsed into a small expression
/// tree so precedence (`!`, `&&`, `||`, grouping) is explicit.
#[derive(Clone, Debug, PartialEq)]
pub enum TestExpression {
    Unary { op: String, operand: Word },
    Binary { op: String, lhs: Word, rhs: Word },
    /// `lhs =~ rhs`: the right-hand side is an extended regular expression,
    /// not word-split or globbed.
    Regex { lhs: Word, rhs: RegexPattern },
    /// A bare word: true iff it expands to a non-empty string.
    Word(Word),
    Not(Box<TestExpression>),
    And(Box<TestExpression>, Box<TestExpression>),
    Or(Box<TestExpression>, Box<TestExpression>),
    Group(Box<TestExpression>),
}

/// Right-hand side of `=~`: word-expanded like a double-quoted word but
/// never globbed, and exempt from word-splitting.
#[derive(Clone, Debug, PartialEq)]
pub struct RegexPattern {
    pub word: Word,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArithCommand {
    pub expression: String,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Coproc {
    pub name: Option<String>,
    pub body: Box<Command>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub body: CompoundCommand,
    pub redirects: Vec<Redirect>,
    pub location: Location,
}

/// Direction of a [`Redirect`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirDirection {
    Input,      // <
    Output,     // >
    Append,     // >>
    InputOutput, // <>
    Clobber,    // >|
    DupInput,   // <&
    DupOutput,  // >&
    HereDoc,
    HereString, // <<<
}

/// The target of a [`Redirect`], before and after here-document resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum RedirTarget {
    File(Word),
    Fd(u32),
    /// `&-`: close the descriptor.
    Close,
    /// Just after the `<<`/`<<-` marker is lexed: the body hasn't been
    /// pulled from the lexer's here-doc queue yet. The executor rejects
    /// this variant -- the parser must resolve it first.
    HereDocPending { delimiter: String, strip_tabs: bool, expand: bool },
    /// Resolved here-document body.
    HereDoc { content: Word, delimiter: String, strip_tabs: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Redirect {
    /// `both` redirections (`&>`, `&>>`) target fd 1 and dup fd 2 to it; the
    /// executor expands this into two `Redirect`s when applying, but it is
    /// convenient to keep the syntax as written for serialization.
    pub fd: RedirFd,
    pub direction: RedirDirection,
    pub target: RedirTarget,
    pub location: Location,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirFd {
    Explicit(u32),
    Default,
    /// `&>` / `&>>`: both stdout and stderr.
    Both,
}

impl Script {
    pub fn empty() -> Self {
        Script { items: Vec::new() }
    }
}

// ---------------------------------------------------------------------
// Display: canonical AST -> text serialization.
//
// The serialization is not byte-identical to arbitrary input (whitespace
// and comments are normalized) but re-parsing the output always yields an
// equal AST, which is the round-trip property the formatter and the
// roundtrip tests rely on.
// ---------------------------------------------------------------------

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.and_or)?;
        match self.separator {
            Some(Separator::Background) => write!(f, " &"),
            Some(Separator::Sequential) | None => write!(f, ";"),
        }
    }
}

impl fmt::Display for AndOrList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, pipeline) in &self.rest {
            let op = match op {
                AndOr::And => "&&",
                AndOr::Or => "||",
            };
            write!(f, " {op} {pipeline}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "! ")?;
        }
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                if self.pipe_stderr.get(i - 1).copied().unwrap_or(false) {
                    write!(f, " |& ")?;
                } else {
                    write!(f, " | ")?;
                }
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Simple(s) => write!(f, "{s}"),
            Command::Compound(c, redirs) => {
                write!(f, "{c}")?;
                for r in redirs {
                    write!(f, " {r}")?;
                }
                Ok(())
            }
            Command::Function(fun) => write!(f, "{fun}"),
        }
    }
}

impl fmt::Display for SimpleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for a in &self.prefix_assigns {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{a}")?;
            first = false;
        }
        for w in &self.words {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", word_to_string(w))?;
            first = false;
        }
        for r in &self.redirects {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{r}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.append { "+=" } else { "=" };
        match &self.value {
            AssignmentValue::Scalar(w) => write!(f, "{}{op}{}", self.name, word_to_string(w)),
            AssignmentValue::Array(elems) => {
                write!(f, "{}{op}(", self.name)?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    if let Some(sub) = &e.subscript {
                        write!(f, "[{}]=", word_to_string(sub))?;
                    }
                    write!(f, "{}", word_to_string(&e.value))?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for CompoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompoundCommand::Group(s) => write!(f, "{{ {s} }}"),
            CompoundCommand::Subshell(s) => write!(f, "({s})"),
            CompoundCommand::If(i) => write!(f, "{i}"),
            CompoundCommand::While(w) => write!(f, "{w}"),
            CompoundCommand::For(fl) => write!(f, "{fl}"),
            CompoundCommand::CFor(cf) => write!(f, "{cf}"),
            CompoundCommand::Case(c) => write!(f, "{c}"),
            CompoundCommand::TestCommand(t) => write!(f, "{t}"),
            CompoundCommand::TestExpression(t) => write!(f, "[[ {t} ]]"),
            CompoundCommand::Arith(a) => write!(f, "(({}))", a.expression),
            CompoundCommand::Coproc(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for If {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if {}; then {}; ", self.condition, self.body)?;
        for (cond, body) in &self.elifs {
            write!(f, "elif {cond}; then {body}; ")?;
        }
        if let Some(e) = &self.else_body {
            write!(f, "else {e}; ")?;
        }
        write!(f, "fi")
    }
}

impl fmt::Display for WhileLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kw = if self.until { "until" } else { "while" };
        write!(f, "{kw} {}; do {}; done", self.condition, self.body)
    }
}

impl fmt::Display for ForLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "for {} in", self.variable)?;
        if let Some(items) = &self.items {
            for w in items {
                write!(f, " {}", word_to_string(w))?;
            }
        } else {
            write!(f, " \"$@\"")?;
        }
        write!(f, "; do {}; done", self.body)
    }
}

impl fmt::Display for CForLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "for (({};{};{})); do {}; done",
            self.init.as_deref().unwrap_or(""),
            self.cond.as_deref().unwrap_or(""),
            self.post.as_deref().unwrap_or(""),
            self.body
        )
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {} in ", word_to_string(&self.word))?;
        for item in &self.items {
            for (i, p) in item.patterns.iter().enumerate() {
                if i > 0 {
                    write!(f, "|")?;
                }
                write!(f, "{}", word_to_string(p))?;
            }
            let term = match item.terminator {
                CaseTerminator::Break => ";;",
                CaseTerminator::FallThrough => ";&",
                CaseTerminator::Continue => ";;&",
            };
            write!(f, ") {} {term} ", item.body)?;
        }
        write!(f, "esac")
    }
}

impl fmt::Display for TestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for w in &self.args {
            write!(f, " {}", word_to_string(w))?;
        }
        write!(f, " ]")
    }
}

impl fmt::Display for TestExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestExpression::Unary { op, operand } => write!(f, "{op} {}", word_to_string(operand)),
            TestExpression::Binary { op, lhs, rhs } => {
                write!(f, "{} {op} {}", word_to_string(lhs), word_to_string(rhs))
            }
            TestExpression::Regex { lhs, rhs } => {
                write!(f, "{} =~ {}", word_to_string(lhs), word_to_string(&rhs.word))
            }
            TestExpression::Word(w) => write!(f, "{}", word_to_string(w)),
            TestExpression::Not(e) => write!(f, "! {e}"),
            TestExpression::And(a, b) => write!(f, "{a} && {b}"),
            TestExpression::Or(a, b) => write!(f, "{a} || {b}"),
            TestExpression::Group(e) => write!(f, "( {e} )"),
        }
    }
}

impl fmt::Display for Coproc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coproc ")?;
        if let Some(n) = &self.name {
            write!(f, "{n} ")?;
        }
        write!(f, "{}", self.body)
    }
}

impl fmt::Display for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} () {}", self.name, self.body)?;
        for r in &self.redirects {
            write!(f, " {r}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let RedirFd::Explicit(n) = self.fd {
            write!(f, "{n}")?;
        }
        let op = match (self.direction, self.fd) {
            (_, RedirFd::Both) if self.direction == RedirDirection::Append => "&>>",
            (_, RedirFd::Both) => "&>",
            (RedirDirection::Input, _) => "<",
            (RedirDirection::Output, _) => ">",
            (RedirDirection::Append, _) => ">>",
            (RedirDirection::InputOutput, _) => "<>",
            (RedirDirection::Clobber, _) => ">|",
            (RedirDirection::DupInput, _) => "<&",
            (RedirDirection::DupOutput, _) => ">&",
            (RedirDirection::HereDoc, _) => "<<",
            (RedirDirection::HereString, _) => "<<<",
        };
        write!(f, "{op}")?;
        match &self.target {
            RedirTarget::File(w) => write!(f, "{}", word_to_string(w)),
            RedirTarget::Fd(n) => write!(f, "{n}"),
            RedirTarget::Close => write!(f, "-"),
            RedirTarget::HereDocPending { delimiter, .. } => write!(f, "{delimiter}"),
            RedirTarget::HereDoc { delimiter, .. } => write!(f, "{delimiter}"),
        }
    }
}

/// Renders a word back to source text. Lives here (rather than on `Word`
/// itself, in `word.rs`) because it is purely a serialization concern.
pub fn word_to_string(word: &Word) -> String {
    crate::display::word_to_string(word)
}
