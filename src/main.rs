//! The `lox` CLI: runs a script file, or drops into a REPL when given no arguments.
//!
//! Exit codes and the REPL's per-line error reset follow `original_source/src/lox.py`: 64 for a
//! usage error, 65 for a lex/parse/resolve error, 70 for a runtime error, 0 otherwise. The REPL
//! resets its [Diagnostics] after every line but keeps one long-lived [Interpreter] (and so one
//! long-lived global environment) across the whole session.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use lox::diagnostics::Diagnostics;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::scan_tokens;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            println!("Usage: pylox [script]");
            ExitCode::from(64)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: couldn't read {path}: {err}");
            return ExitCode::from(64);
        }
    };

    let mut interpreter = Interpreter::new(io::stdout());
    match run(&source, &mut interpreter) {
        RunOutcome::Clean => ExitCode::SUCCESS,
        RunOutcome::StaticError => ExitCode::from(65),
        RunOutcome::RuntimeError => ExitCode::from(70),
    }
}

fn run_prompt() -> ExitCode {
    let mut interpreter = Interpreter::new(io::stdout());
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush().expect("stdout must be writable");

        let mut line = String::new();
        let bytes_read = stdin
            .lock()
            .read_line(&mut line)
            .expect("reading a line from stdin must not fail");

        if bytes_read == 0 {
            println!("\nThe only way to learn a new programming language is by writing programs in it.");
            return ExitCode::SUCCESS;
        }

        run(&line, &mut interpreter);
    }
}

enum RunOutcome {
    Clean,
    StaticError,
    RuntimeError,
}

/// Runs one compilation unit (a whole file, or one REPL line) through the full pipeline against
/// `interpreter`'s still-live global environment.
fn run(source: &str, interpreter: &mut Interpreter<impl Write>) -> RunOutcome {
    let mut diagnostics = Diagnostics::new();

    let tokens = scan_tokens(source, &mut diagnostics);
    let statements = Parser::new(tokens, &mut diagnostics).parse();
    if diagnostics.had_error() {
        return RunOutcome::StaticError;
    }

    let locals = Resolver::new(&mut diagnostics).resolve(&statements);
    if diagnostics.had_error() {
        return RunOutcome::StaticError;
    }

    interpreter.set_locals(locals);
    match interpreter.interpret(&statements) {
        Ok(()) => RunOutcome::Clean,
        Err(err) => {
            eprintln!("{err}");
            RunOutcome::RuntimeError
        }
    }
}
