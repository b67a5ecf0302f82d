//! Amazon Braket adapter for qbridge.
//!
//! Braket circuits are instruction lists over integer targets. Every
//! canonical kind except `U3` has a direct Braket gate, and `Unitary`
//! carries raw matrices. Braket gates with no canonical kind (`ECR`,
//! `PSwap`, `XY`, `CV`, `CPhaseShift00/01/10`) import through their
//! numeric matrix.
//!
//! # Example
//!
//! ```rust
//! use qbridge_adapter_braket::{BraketImporter, Circuit};
//! use qbridge_convert::Importer;
//!
//! let mut circuit = Circuit::new();
//! circuit.h(0)?.cnot(0, 1)?;
//! let imported = BraketImporter.import(&circuit)?;
//! assert_eq!(imported.circuit.depth(), 2);
//! # Ok::<(), qbridge_convert::ConvertError>(())
//! ```

pub mod export;
pub mod import;
pub mod model;
pub mod unitary;

pub use export::{BraketExporter, mapping_table};
pub use import::BraketImporter;
pub use model::{BraketGate, Circuit, FreeParameter, Instruction, Noise, Operator, Value};
pub use unitary::gate_unitary;
