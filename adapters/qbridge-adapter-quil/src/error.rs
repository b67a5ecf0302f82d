//! Error types for the Quil text codec.

use thiserror::Error;

use qbridge_convert::{ConvertError, ProgramFormat};

/// Errors that can occur while parsing Quil source.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum QuilParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at line {line}: {message}")]
    LexerError { line: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Wrong number of qubits for a standard gate.
    #[error("Line {line}: {message}")]
    InvalidApplication { line: usize, message: String },

    /// Wrong number of parameters.
    #[error("Line {line}: gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        line: usize,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// `DEFGATE` body is not a unitary matrix.
    #[error("Line {line}: invalid DEFGATE matrix: {message}")]
    InvalidMatrix { line: usize, message: String },

    /// Valid Quil that this codec does not model.
    #[error("Line {line}: unsupported Quil construct '{construct}'")]
    Unsupported { line: usize, construct: String },
}

impl QuilParseError {
    /// Line the error was detected on (1-based), if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            QuilParseError::LexerError { line, .. }
            | QuilParseError::UnexpectedToken { line, .. }
            | QuilParseError::InvalidApplication { line, .. }
            | QuilParseError::WrongParameterCount { line, .. }
            | QuilParseError::InvalidMatrix { line, .. }
            | QuilParseError::Unsupported { line, .. } => Some(*line),
            QuilParseError::UnexpectedEof(_) => None,
        }
    }
}

impl From<QuilParseError> for ConvertError {
    fn from(err: QuilParseError) -> Self {
        match err {
            QuilParseError::Unsupported { construct, .. } => ConvertError::unsupported(
                ProgramFormat::Quil,
                construct,
                "not representable in the Quil model",
            ),
            other => ConvertError::Parse {
                format: ProgramFormat::Quil,
                line: other.line().unwrap_or(0),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for parsing operations.
pub type QuilParseResult<T> = Result<T, QuilParseError>;
