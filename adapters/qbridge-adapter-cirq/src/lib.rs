//! Cirq adapter for qbridge.
//!
//! A serde model of Cirq circuits (`Circuit` of `Moment`s of
//! `Operation`s over `LineQubit`/`GridQubit`/`NamedQubit`), with:
//!
//! - [`CirqImporter`]: Cirq → canonical, via a `(gate class, arity)`
//!   dispatch table with a matrix fallback for fractional powers
//! - [`CirqExporter`]: canonical → Cirq, fully direct except `U3`
//! - native unitary and metadata computed from Cirq's own gate semantics
//!
//! # Example
//!
//! ```rust
//! use qbridge_adapter_cirq::{Circuit, CirqGate, CirqImporter, Qid};
//! use qbridge_convert::Importer;
//!
//! let q = Qid::line_range(2);
//! let mut circuit = Circuit::new();
//! circuit
//!     .push(CirqGate::h(), [q[0].clone()])?
//!     .push(CirqGate::cnot(), [q[0].clone(), q[1].clone()])?;
//!
//! let imported = CirqImporter.import(&circuit)?;
//! assert_eq!(imported.circuit.num_gates(), 2);
//! # Ok::<(), qbridge_convert::ConvertError>(())
//! ```

pub mod export;
pub mod import;
pub mod model;
pub mod unitary;

pub use export::{CirqExporter, mapping_table};
pub use import::CirqImporter;
pub use model::{Circuit, CirqGate, EigenPow, GateClass, Moment, Operation, Qid, Symbol, Value};
pub use unitary::gate_unitary;
