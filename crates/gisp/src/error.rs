use std::fmt;

use thiserror::Error;

use crate::stack::Stack;
use crate::value::TypeError;

/// What went wrong during an evaluation.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{0:?} is undefined")]
    UndefinedName(String),

    /// A computed head did not evaluate to a function. Holds the JSON
    /// rendering of the head expression.
    #[error("{0} is undefined")]
    UndefinedComputedHead(String),

    #[error("{call}: missing argument {index}")]
    MissingArgument { call: String, index: usize },

    #[error("{call}: argument {index}: {error}")]
    ArgumentType {
        call: String,
        index: usize,
        error: TypeError,
    },

    /// Failure reported by a native callable.
    #[error("{0}")]
    Native(String),

    /// A native callable panicked and the context lifted the panic.
    #[error("panic: {0}")]
    Panic(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An evaluation failure together with the call stack at the point it
/// was detected.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub stack: Stack,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            stack: Stack::new(),
        }
    }

    /// Create a failure from inside a native callable.
    ///
    /// The stack is filled in by the evaluator when the error leaves the
    /// callable's frame.
    pub fn native(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Native(message.to_string()))
    }

    pub fn with_stack(mut self, stack: Stack) -> Self {
        self.stack = stack;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The message without the stack.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_undefined(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UndefinedName(_) | ErrorKind::UndefinedComputedHead(_)
        )
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.kind, ErrorKind::Panic(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Json(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
