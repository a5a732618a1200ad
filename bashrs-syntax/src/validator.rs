// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Post-parse structural checks that don't fit naturally into the grammar
//! itself: identifier well-formedness, and the is-a-compound-command
//! requirement already enforced for function bodies by the parser is
//! re-checked here defensively since `validate` may also run over an AST
//! built (and possibly mutated) by something other than this crate's parser.

use crate::ast::*;
use crate::diagnostics::{sc, Diagnostic, ParseError};

pub fn validate(script: &Script) -> Result<(), ParseError> {
    for item in &script.items {
        validate_and_or(&item.and_or)?;
    }
    Ok(())
}

fn validate_and_or(list: &AndOrList) -> Result<(), ParseError> {
    validate_pipeline(&list.first)?;
    for (_, p) in &list.rest {
        validate_pipeline(p)?;
    }
    Ok(())
}

fn validate_pipeline(pipeline: &Pipeline) -> Result<(), ParseError> {
    for cmd in &pipeline.commands {
        validate_command(cmd)?;
    }
    Ok(())
}

fn validate_command(cmd: &Command) -> Result<(), ParseError> {
    match cmd {
        Command::Simple(s) => {
            for a in &s.prefix_assigns {
                validate_identifier(&a.name, &a.location)?;
            }
        }
        Command::Compound(c, _) => validate_compound(c)?,
        Command::Function(f) => {
            validate_identifier(&f.name, &f.location)?;
            validate_compound(&f.body)?;
        }
    }
    Ok(())
}

fn validate_compound(c: &CompoundCommand) -> Result<(), ParseError> {
    match c {
        CompoundCommand::Group(s) | CompoundCommand::Subshell(s) => validate_script(s),
        CompoundCommand::If(i) => {
            validate_script(&i.condition)?;
            validate_script(&i.body)?;
            for (cond, body) in &i.elifs {
                validate_script(cond)?;
                validate_script(body)?;
            }
            if let Some(e) = &i.else_body {
                validate_script(e)?;
            }
            Ok(())
        }
        CompoundCommand::While(w) => {
            validate_script(&w.condition)?;
            validate_script(&w.body)
        }
        CompoundCommand::For(f) => {
            validate_identifier(&f.variable, &dummy_location())?;
            validate_script(&f.body)
        }
        CompoundCommand::CFor(f) => validate_script(&f.body),
        CompoundCommand::Case(c) => {
            for item in &c.items {
                validate_script(&item.body)?;
            }
            Ok(())
        }
        CompoundCommand::TestCommand(_) | CompoundCommand::TestExpression(_) | CompoundCommand::Arith(_) => Ok(()),
        CompoundCommand::Coproc(c) => validate_command(&c.body),
    }
}

fn validate_script(s: &Script) -> Result<(), ParseError> {
    for item in &s.items {
        validate_and_or(&item.and_or)?;
    }
    Ok(())
}

/// `for` loop variables carry no [`Location`] of their own in the AST (only
/// the surrounding `ForLoop` does); validated against a dummy location so a
/// diagnostic can still be rendered rather than threading one through.
fn dummy_location() -> crate::source::Location {
    crate::source::Location::dummy()
}

fn validate_identifier(name: &str, location: &crate::source::Location) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError(Diagnostic::new(
            sc::SC1000_UNKNOWN,
            "expected a name here",
            location.clone(),
            "identifiers must start with a letter or underscore",
        )));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_alphabetic() || first == '_') {
        return Err(ParseError(Diagnostic::new(
            sc::SC1000_UNKNOWN,
            format!("'{name}' is not a valid identifier"),
            location.clone(),
            "identifiers must start with a letter or underscore",
        )));
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ParseError(Diagnostic::new(
            sc::SC1000_UNKNOWN,
            format!("'{name}' is not a valid identifier"),
            location.clone(),
            "identifiers may only contain letters, digits and underscores",
        )));
    }
    Ok(())
}
