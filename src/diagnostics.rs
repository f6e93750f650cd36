//! The pipeline's diagnostic sink.
//!
//! The distilled specification for this interpreter describes `had_error`/`had_runtime_error` as
//! sticky process-scoped globals. Per the Design Notes (and the corresponding REDESIGN FLAG), this
//! implementation makes that state an explicit value the driver owns and threads through each
//! pipeline stage instead: [Diagnostics]. A REPL line gets a fresh [Diagnostics] to reset
//! `had_error` without touching any shared global; `had_runtime_error` is still inspected once, by
//! the driver, after an `interpret` call returns.

use crate::token::{Token, TokenType};

/// Accumulates lexical, syntactic, and resolution errors for one compilation unit (one file, or
/// one REPL line), and reports them to stderr in the format the spec requires.
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Returns true if any error has been reported to this sink.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Report a lexical error at the given line. Format: `[line L] Error : <message>` (note the
    /// space before the colon; lexical errors have no "at ..." clause).
    pub fn lexical_error(&mut self, line: usize, message: &str) {
        self.had_error = true;
        eprintln!("[line {line}] Error : {message}");
    }

    /// Report a parse- or resolution-time error located at a [Token]. Format:
    /// `[line L] Error  at end: <message>` at EOF, `[line L] Error  at '<lexeme>': <message>`
    /// otherwise.
    pub fn error_at(&mut self, token: &Token, message: &str) {
        self.had_error = true;
        if token.kind == TokenType::Eof {
            eprintln!("[line {}] Error  at end: {message}", token.line);
        } else {
            eprintln!("[line {}] Error  at '{}': {message}", token.line, token.lexeme);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_clean() {
        let d = Diagnostics::new();
        assert!(!d.had_error());
    }

    #[test]
    fn lexical_error_sets_flag() {
        let mut d = Diagnostics::new();
        d.lexical_error(1, "Unexpected character $.");
        assert!(d.had_error());
    }

    #[test]
    fn error_at_eof_sets_flag() {
        let mut d = Diagnostics::new();
        let eof = Token::new(TokenType::Eof, "", 4);
        d.error_at(&eof, "Expect expression.");
        assert!(d.had_error());
    }
}
