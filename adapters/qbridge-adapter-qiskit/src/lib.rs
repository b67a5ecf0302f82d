//! Qiskit adapter for qbridge.
//!
//! A serde model of Qiskit's `QuantumCircuit`: named quantum and classical
//! registers, `CircuitInstruction`s over register bits, uuid-identified
//! `Parameter`s and a global phase.
//!
//! Every canonical kind maps directly onto a Qiskit standard gate, so
//! export never decomposes. Import rewrites `u1`, `u2` and `r` into
//! canonical kinds and falls back to the numeric matrix for gates like
//! `ch`, `ecr` or `rzx`.
//!
//! `UnitaryGate` matrices are little-endian in Qiskit and big-endian
//! everywhere else in qbridge; the adapter reverses them at the boundary.
//!
//! # Example
//!
//! ```rust
//! use qbridge_adapter_qiskit::{QiskitImporter, QuantumCircuit};
//! use qbridge_convert::Importer;
//!
//! let mut circuit = QuantumCircuit::new(2, 2);
//! circuit.h(0)?.cx(0, 1)?.measure(0, 0)?.measure(1, 1)?;
//! let imported = QiskitImporter.import(&circuit)?;
//! assert_eq!(imported.circuit.measurements().len(), 2);
//! # Ok::<(), qbridge_convert::ConvertError>(())
//! ```

pub mod export;
pub mod import;
pub mod model;
pub mod unitary;

pub use export::{GateOp, QiskitExporter, mapping_table};
pub use import::QiskitImporter;
pub use model::{
    CircuitInstruction, ClassicalRegister, Clbit, Condition, Operation, Parameter,
    ParameterValue, QiskitGate, QuantumCircuit, QuantumRegister, Qubit,
};
pub use unitary::gate_unitary;
