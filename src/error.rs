//! Provides [InterpretationError], the error that most things return.
use thiserror::Error;

/// Any error that can occur during interpretation.
#[derive(Debug, Error)]
pub enum InterpretationError {
    /// A compile-time error: lexical, syntactic, or a static resolution failure. Already reported
    /// to the diagnostic sink by the stage that found it; this variant just signals the driver
    /// that the pipeline must stop before interpreting.
    #[error("compile-time error")]
    CompileError,
    /// A runtime error, such as a type error or an undefined variable. Carries the already-rendered
    /// message (the `<message>\n[line L]` form from the spec) so callers don't need to re-derive it
    /// from the offending token.
    #[error("{0}")]
    RuntimeError(String),
}

impl InterpretationError {
    /// Build a [InterpretationError::RuntimeError] formatted per the spec: the message, then the
    /// offending line on its own line.
    pub fn runtime(message: impl Into<String>, line: usize) -> Self {
        InterpretationError::RuntimeError(format!("{}\n[line {}]", message.into(), line))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn runtime_error_formats_message_then_line() {
        let err = InterpretationError::runtime("Operands must be numbers.", 3);
        assert_eq!("Operands must be numbers.\n[line 3]", err.to_string());
    }
}
