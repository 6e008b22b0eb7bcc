use thiserror::Error;

/// An error raised while running script code.
///
/// `Display` gives the message alone; [`RuntimeError::name`] gives the
/// error class (`TypeError`, ...) shown in front of it in diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("{0} is not defined")]
    UndefinedVariable(String),
    #[error("{0}")]
    Type(String),
    #[error("{0}")]
    Range(String),
    #[error("{0}")]
    Syntax(String),
    /// Raised by `throw`.
    #[error("{message}")]
    Thrown { name: String, message: String },
}

impl RuntimeError {
    pub fn name(&self) -> &str {
        match self {
            RuntimeError::UndefinedVariable(_) => "ReferenceError",
            RuntimeError::Type(_) => "TypeError",
            RuntimeError::Range(_) => "RangeError",
            RuntimeError::Syntax(_) => "SyntaxError",
            RuntimeError::Thrown { name, .. } => name,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type(message.into())
    }

    /// A plain `Error` with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        RuntimeError::Thrown {
            name: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn stack_overflow() -> Self {
        RuntimeError::Range("maximum call stack size exceeded".to_string())
    }
}
