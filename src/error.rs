use crate::lang::source_buffer::SourceLocation;
use std::fmt::{self, Display, Formatter};

pub type Result<T> = std::result::Result<T, CompileError>;

/// The distinct ways a compile can fail.  Every variant is fatal; the compiler makes no attempt
/// at recovery and the first error found terminates compilation.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// A token was neither a number nor found in the dictionary.
    UnknownWord(String),

    /// End of the source was hit in the middle of a token, a comment, a quoted span, or a word
    /// body.
    UnexpectedEndOfStream,

    /// An `[include]` target could not be opened.
    NoSuchFile(String),

    /// The compile-time stack, or the do-loop leave stack, was popped while empty.
    StackUnderflow(String),

    /// The compile-time stack was not empty at the end of compilation.
    StackNotEmpty,

    /// Catch-all for malformed constructs that don't fit one of the other kinds.
    ParseError(String),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ErrorKind::UnknownWord(text) => write!(f, "Unknown word '{}'.", text),
            ErrorKind::UnexpectedEndOfStream => write!(f, "Unexpected end of stream."),
            ErrorKind::NoSuchFile(name) => write!(f, "No such file '{}'.", name),
            ErrorKind::StackUnderflow(text) => {
                write!(f, "Stack underflow while processing '{}'.", text)
            }
            ErrorKind::StackNotEmpty => {
                write!(f, "Compile time stack is not empty at end of compilation.")
            }
            ErrorKind::ParseError(message) => write!(f, "{}", message),
        }
    }
}

/// Any error that occurs while tokenizing or compiling a source file.  Carries the location in
/// the original source where the error was found, if one is available.
#[derive(Clone, Debug)]
pub struct CompileError {
    location: Option<SourceLocation>,
    kind: ErrorKind,
}

impl CompileError {
    pub fn new(location: Option<SourceLocation>, kind: ErrorKind) -> CompileError {
        CompileError { location, kind }
    }

    pub fn new_as_result<T>(location: Option<SourceLocation>, kind: ErrorKind) -> Result<T> {
        Err(CompileError::new(location, kind))
    }

    pub fn location(&self) -> &Option<SourceLocation> {
        &self.location
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// Pretty print the error for the `"error: <message>"` line the tool writes to stderr.
impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(error: std::io::Error) -> CompileError {
        CompileError::new(None, ErrorKind::ParseError(format!("I/O error: {}", error)))
    }
}

/// Convenience constructor for a `ParseError` at a given location.
pub fn parse_error<T>(location: &SourceLocation, message: impl Into<String>) -> Result<T> {
    CompileError::new_as_result(
        Some(location.clone()),
        ErrorKind::ParseError(message.into()),
    )
}
