//! Error types shared by importers and exporters.

use qbridge_ir::{GateKind, IrError};
use qbridge_unitary::UnitaryError;
use thiserror::Error;

use crate::format::ProgramFormat;

/// Errors that can occur while importing or exporting a program.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// No importer or exporter is registered for the format tag.
    #[error("Unsupported program format '{0}'")]
    UnsupportedFormat(String),

    /// A source construct has no canonical mapping and no matrix fallback.
    #[error("{format} program contains unsupported construct '{construct}': {reason}")]
    UnsupportedConstruct {
        /// Source format.
        format: ProgramFormat,
        /// The offending gate or instruction.
        construct: String,
        /// Why it cannot be converted.
        reason: String,
    },

    /// A canonical kind is missing from a mapping table.
    #[error("{format} mapping table has no entry for canonical gate '{kind}'")]
    MappingGap {
        /// Target format.
        format: ProgramFormat,
        /// The missing kind.
        kind: GateKind,
    },

    /// The native program is structurally malformed.
    #[error("Invalid {format} program: {message}")]
    InvalidProgram {
        /// Source format.
        format: ProgramFormat,
        /// What is wrong.
        message: String,
    },

    /// Textual program could not be parsed.
    #[error("{format} parse error at line {line}: {message}")]
    Parse {
        /// Source format.
        format: ProgramFormat,
        /// Line number (1-based).
        line: usize,
        /// Parser message.
        message: String,
    },

    /// Structural error in the canonical model.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Numeric error while extracting or composing matrices.
    #[error(transparent)]
    Unitary(#[from] UnitaryError),
}

impl ConvertError {
    /// Create an unsupported-construct error.
    pub fn unsupported(
        format: ProgramFormat,
        construct: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConvertError::UnsupportedConstruct {
            format,
            construct: construct.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-program error.
    pub fn invalid(format: ProgramFormat, message: impl Into<String>) -> Self {
        ConvertError::InvalidProgram {
            format,
            message: message.into(),
        }
    }

    /// Whether the error means "this format or construct has no support",
    /// as opposed to a failure on one specific program instance.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedFormat(_) | ConvertError::UnsupportedConstruct { .. }
        )
    }
}

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
