// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Shared diagnostic format for lexical and syntax errors.
//!
//! Every error the lexer and parser raise carries a ShellCheck-style `SCxxxx`
//! code from a closed table (unrecognized conditions fall back to `SC1000`),
//! plus a human hint and enough source position to render a one-line
//! annotated snippet.

use crate::source::Location;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    pub location: Location,
    pub hint: &'static str,
}

impl Diagnostic {
    pub fn new(code: &'static str, message: impl Into<String>, location: Location, hint: &'static str) -> Self {
        Diagnostic { code, message: message.into(), location, hint }
    }

    pub fn line(&self) -> usize {
        self.location.line()
    }

    pub fn column(&self) -> usize {
        self.location.column()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line_no = self.line();
        let col = self.column();
        let line_text = self.location.code.line_text(self.location.range.start);
        writeln!(f, "[{}] {} at line {line_no}:", self.code, self.message)?;
        writeln!(f, "  > {line_no} | {line_text}")?;
        let marker_offset = col.saturating_sub(1);
        writeln!(f, "  {}^", " ".repeat(marker_offset + line_no.to_string().len() + 5))?;
        write!(f, "  hint: {}", self.hint)
    }
}

#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
#[error("{0}")]
pub struct LexError(pub Diagnostic);

#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
#[error("{0}")]
pub struct ParseError(pub Diagnostic);

impl ParseError {
    /// Lexical errors are a subset of parse errors from the embedding API's
    /// point of view: both are "this script doesn't parse" with a diagnostic.
    pub fn from_lex(e: LexError) -> Self {
        ParseError(e.0)
    }
}

/// Closed table of lexical anomaly codes, named after their ShellCheck
/// counterparts (SC10xx-SC11xx) per the lexer's diagnostics contract.
pub mod sc {
    pub const SC1000_UNKNOWN: &str = "SC1000";
    pub const SC1003_UNTERMINATED_SINGLE: &str = "SC1003";
    pub const SC1009_UNTERMINATED_DOUBLE: &str = "SC1009";
    pub const SC1015_CURLY_DQUOTE: &str = "SC1015";
    pub const SC1016_CURLY_SQUOTE: &str = "SC1016";
    pub const SC1018_NBSP: &str = "SC1018";
    pub const SC1019_UNARY_TEST_ARITY: &str = "SC1019";
    pub const SC1020_SPACE_BEFORE_BRACKET: &str = "SC1020";
    pub const SC1026_GROUPING_IN_TEST: &str = "SC1026";
    pub const SC1027_BINARY_TEST_ARITY: &str = "SC1027";
    pub const SC1028_UNESCAPED_PAREN_IN_TEST: &str = "SC1028";
    pub const SC1029_ESCAPED_PAREN_IN_DTEST: &str = "SC1029";
    pub const SC1033_DTEST_CLOSED_WITH_BRACKET: &str = "SC1033";
    pub const SC1034_TEST_CLOSED_WITH_DBRACKET: &str = "SC1034";
    pub const SC1037_POSITIONAL_NEEDS_BRACES: &str = "SC1037";
    pub const SC1039_INDENTED_HEREDOC_DELIM: &str = "SC1039";
    pub const SC1040_SPACES_FOR_DASH_HEREDOC: &str = "SC1040";
    pub const SC1041_HEREDOC_DELIM_ALONE: &str = "SC1041";
    pub const SC1043_HEREDOC_CASE_MISMATCH: &str = "SC1043";
    pub const SC1044_UNTERMINATED_HEREDOC: &str = "SC1044";
    pub const SC1046_UNCLOSED_IF: &str = "SC1046";
    pub const SC1047_ORPHAN_THEN: &str = "SC1047";
    pub const SC1048_ORPHAN_ELSE: &str = "SC1048";
    pub const SC1049_ORPHAN_ELIF: &str = "SC1049";
    pub const SC1050_ORPHAN_FI: &str = "SC1050";
    pub const SC1051_DOUBLE_SEMI_AFTER_THEN: &str = "SC1051";
    pub const SC1053_DOUBLE_SEMI_AFTER_ELSE: &str = "SC1053";
    pub const SC1055_EMPTY_GROUP: &str = "SC1055";
    pub const SC1056_UNCLOSED_GROUP: &str = "SC1056";
    pub const SC1058_MISSING_IN: &str = "SC1058";
    pub const SC1061_ORPHAN_DO: &str = "SC1061";
    pub const SC1062_ORPHAN_DONE: &str = "SC1062";
    pub const SC1063_ORPHAN_LOOP_KEYWORD: &str = "SC1063";
    pub const SC1064_FUNCTION_BODY_NOT_COMPOUND: &str = "SC1064";
    pub const SC1065_PARAMS_IN_FUNCTION_NAME: &str = "SC1065";
    pub const SC1066_DOLLAR_ASSIGNMENT: &str = "SC1066";
    pub const SC1074_MISSING_ESAC: &str = "SC1074";
    pub const SC1075_ELSE_IF: &str = "SC1075";
    pub const SC1077_BACKTICK_LOOKALIKE: &str = "SC1077";
    pub const SC1080_UNESCAPED_NEWLINE_IN_TEST: &str = "SC1080";
    pub const SC1082_BOM: &str = "SC1082";
    pub const SC1084_BANG_HASH_SHEBANG: &str = "SC1084";
    pub const SC1086_DOLLAR_IN_FOR_VAR: &str = "SC1086";
    pub const SC1095_FUNCTION_BRACE_NO_SPACE: &str = "SC1095";
    pub const SC1100_DASH_LOOKALIKE: &str = "SC1100";
    pub const SC1114_LEADING_SPACE_SHEBANG: &str = "SC1114";
    pub const SC1115_HASH_SPACE_BANG: &str = "SC1115";
    pub const SC1118_TRAILING_WS_AFTER_DELIM: &str = "SC1118";
    pub const SC1119_DELIM_GLUED_TO_PAREN: &str = "SC1119";
    pub const SC1120_COMMENT_AFTER_DELIM: &str = "SC1120";
    pub const SC1122_OPERATOR_AFTER_DELIM: &str = "SC1122";
    pub const SC1128_SHEBANG_PAST_LINE_ONE: &str = "SC1128";
    pub const SC1133_PIPE_AT_LINE_START: &str = "SC1133";
    pub const SC1137_CFOR_MISSING_PAREN: &str = "SC1137";
}
