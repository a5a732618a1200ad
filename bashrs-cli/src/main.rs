// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The `bashrs` binary: `bashrs -c <command>`, `bashrs <file> [args...]`, or
//! a script read from stdin, mirroring `bash`'s own invocation surface and
//! exit-code conventions.
//!
//! Grounded on yash-cli's `startup::args` module for the shape of the
//! argument parser, here built on `clap` (already in the workspace's
//! dependency table) rather than yash-cli's hand-rolled parser.

use clap::Parser;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bashrs", about = "Bash-compatible shell interpreter", version)]
struct Cli {
    /// Read the script from COMMAND instead of a file or stdin.
    #[arg(short = 'c', value_name = "COMMAND")]
    command: Option<String>,

    /// Script file to run; omit (with no -c) to read the script from stdin.
    script: Option<PathBuf>,

    /// Positional parameters ($1, $2, ...) passed to the script.
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let script_name = match (&cli.command, &cli.script) {
        (Some(_), _) => "bashrs".to_string(),
        (None, Some(path)) => path.display().to_string(),
        (None, None) => "-".to_string(),
    };

    let options = bashrs::SessionOptions {
        env: std::env::vars().collect::<HashMap<_, _>>(),
        args: cli.args.clone(),
        script_name,
        ..Default::default()
    };
    let mut session = bashrs::Session::new(options);

    let result = if let Some(command) = &cli.command {
        bashrs::run(command, &mut session).map_err(Failure::Diagnostic)
    } else if let Some(path) = &cli.script {
        bashrs::run_file(path, &mut session).map_err(Failure::RunFile)
    } else {
        let mut source = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut source) {
            eprintln!("bashrs: stdin: {e}");
            return ExitCode::from(1);
        }
        bashrs::run(&source, &mut session).map_err(Failure::Diagnostic)
    };

    match result {
        Ok(outcome) => {
            let _ = std::io::stdout().write_all(outcome.stdout());
            let _ = std::io::stderr().write_all(outcome.stderr());
            ExitCode::from(outcome.exit_code().rem_euclid(256) as u8)
        }
        Err(Failure::Diagnostic(d)) => {
            eprintln!("{d}");
            ExitCode::from(2)
        }
        Err(Failure::RunFile(bashrs::RunFileError::Io { path, source })) => {
            eprintln!("bashrs: {}: {source}", path.display());
            ExitCode::from(127)
        }
        Err(Failure::RunFile(bashrs::RunFileError::Parse(d))) => {
            eprintln!("{d}");
            ExitCode::from(2)
        }
    }
}

enum Failure {
    Diagnostic(bashrs::Diagnostic),
    RunFile(bashrs::RunFileError),
}
