//! Quil adapter for qbridge.
//!
//! Quil programs are text. This crate carries a program model, a parser
//! and emitter for the gate-level subset of Quil, and the importer and
//! exporter between that model and the canonical circuit.
//!
//! Gate modifiers import structurally where a canonical kind exists
//! (`DAGGER S` is `Sdg`, `CONTROLLED X` is `CX`) and through their
//! numeric matrix otherwise. On export, canonical kinds without a Quil
//! gate are decomposed (`SX`, `U3`, `Rxx`, `Ryy`, `Rzz`) and raw
//! unitaries become `DEFGATE`s.
//!
//! # Example
//!
//! ```rust
//! use qbridge_adapter_quil::{Program, QuilImporter};
//! use qbridge_convert::Importer;
//!
//! let program: Program = "DECLARE ro BIT[2]\nH 0\nCNOT 0 1\nMEASURE 0 ro[0]\n".parse()?;
//! let imported = QuilImporter.import(&program)?;
//! assert_eq!(imported.circuit.num_qubits(), 2);
//! assert_eq!(imported.circuit.num_clbits(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod emitter;
pub mod error;
pub mod export;
pub mod import;
mod lexer;
pub mod model;
pub mod parser;
pub mod unitary;

use std::str::FromStr;

pub use error::{QuilParseError, QuilParseResult};
pub use export::{QuilExporter, QuilOp, mapping_table};
pub use import::QuilImporter;
pub use model::{
    Declaration, GateApplication, GateDefinition, Instruction, MemoryRef, MemoryType, Modifier,
    Program, QuilGate, Value,
};
pub use parser::parse;
pub use unitary::{application_unitary, gate_unitary};

impl FromStr for Program {
    type Err = QuilParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse(source)
    }
}
