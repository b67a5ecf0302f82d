//! Caller-facing errors.

use std::fmt;
use thiserror::Error;

use qbridge_convert::{ConvertError, ProgramFormat};

use crate::config::ConfigError;

/// Which half of a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Native program → canonical circuit.
    Import,
    /// Canonical circuit → native program.
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Import => write!(f, "import"),
            Stage::Export => write!(f, "export"),
        }
    }
}

/// Errors returned by [`crate::convert`] and [`crate::ProgramWrapper`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranspileError {
    /// A format, gate or instruction has no importer or exporter support.
    #[error("Unsupported program: {0}")]
    UnsupportedProgram(#[source] ConvertError),

    /// Import or export failed for this program instance.
    #[error("{stage} failed for {format} program: {source}")]
    CircuitConversion {
        /// The failing half.
        stage: Stage,
        /// Source format on import, target format on export.
        format: ProgramFormat,
        /// The underlying cause.
        #[source]
        source: ConvertError,
    },

    /// The converted program's unitary differs from the original's.
    #[error("Converted {target} program does not match its {source_format} source within atol {atol}")]
    VerificationFailed {
        /// Format of the original program.
        source_format: ProgramFormat,
        /// Format of the converted program.
        target: ProgramFormat,
        /// Tolerance the comparison used.
        atol: f64,
    },

    /// Invalid conversion configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TranspileError {
    /// Classify a conversion error raised at `stage` while handling a
    /// `format` program.
    pub fn at(stage: Stage, format: ProgramFormat, source: ConvertError) -> Self {
        if source.is_unsupported() {
            TranspileError::UnsupportedProgram(source)
        } else {
            TranspileError::CircuitConversion {
                stage,
                format,
                source,
            }
        }
    }

    /// Whether this is an unsupported-program error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TranspileError::UnsupportedProgram(_))
    }
}

/// Result type for façade operations.
pub type TranspileResult<T> = Result<T, TranspileError>;
