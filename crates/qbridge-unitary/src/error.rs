//! Error types for unitary construction.

use qbridge_ir::{GateKind, IrError};
use thiserror::Error;

/// Errors that can occur while building or comparing unitaries.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum UnitaryError {
    /// A gate argument still references a free parameter.
    #[error("Cannot compute the unitary of '{gate}': parameter '{parameter}' is unbound")]
    UnboundParameter {
        /// Name of the gate.
        gate: String,
        /// Name of the unbound parameter.
        parameter: String,
    },

    /// Gate matrix does not fit the qubits it is applied to.
    #[error("Matrix of dimension {dim} cannot act on {num_qubits} qubits")]
    DimensionMismatch {
        /// Dimension of the matrix.
        dim: usize,
        /// Number of target qubits.
        num_qubits: usize,
    },

    /// Target qubit outside the register.
    #[error("Qubit {qubit} out of range for a {num_qubits}-qubit unitary")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: usize,
        /// Register width.
        num_qubits: usize,
    },

    /// The same qubit appears twice in one operation.
    #[error("Qubit {0} appears twice in one operation")]
    DuplicateQubit(usize),

    /// Register too wide for a dense unitary.
    #[error("{num_qubits} qubits exceeds the dense unitary limit of {max}")]
    TooManyQubits {
        /// Requested width.
        num_qubits: usize,
        /// Ceiling.
        max: usize,
    },

    /// A matrix gate without a matrix.
    #[error("Gate '{0}' carries no matrix")]
    MissingMatrix(GateKind),

    /// Structural error from the IR.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for unitary operations.
pub type UnitaryResult<T> = Result<T, UnitaryError>;
