//! Cross-framework quantum circuit conversion.
//!
//! qbridge translates a program written for one framework into an
//! equivalent program for another, pivoting through a canonical circuit:
//!
//! ```text
//! cirq ───┐                                   ┌──→ cirq
//! braket ─┤                                   ├──→ braket
//! qiskit ─┼──→ Importer ──→ CanonicalCircuit ──→ Exporter ──┼──→ qiskit
//! pyquil ─┘                                   └──→ pyquil
//! ```
//!
//! Each gate is exported either directly, as a fixed decomposition, or as
//! a raw matrix. The result computes the same unitary up to global phase
//! and keeps the qubit count and the free parameters.
//!
//! # Example
//!
//! ```rust
//! use qbridge::{Program, ProgramFormat, circuits_allclose, convert};
//! use qbridge_adapter_braket::Circuit;
//!
//! let mut bell = Circuit::new();
//! bell.h(0)?.cnot(0, 1)?;
//! let source = Program::from(bell);
//!
//! let qiskit = convert(&source, ProgramFormat::Qiskit)?;
//! assert_eq!(qiskit.format(), ProgramFormat::Qiskit);
//! assert!(circuits_allclose(&source, &qiskit, false)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod oracle;
pub mod program;
pub mod wrapper;

pub use config::{ConfigError, ConversionConfig, VerifyConfig};
pub use convert::{convert, convert_with, export, import, missing, strategy};
pub use error::{Stage, TranspileError, TranspileResult};
pub use oracle::{circuits_allclose, circuits_allclose_within, unitaries_allclose, unitary_of};
pub use program::Program;
pub use wrapper::ProgramWrapper;

pub use qbridge_convert::{ExportOptions, Exported, ProgramFormat, ProgramMetadata, Strategy};
pub use qbridge_ir::{CanonicalCircuit, GateKind, ParamId, QubitId};
pub use qbridge_unitary::{DEFAULT_ATOL, Matrix, equivalent, equivalent_strict};
