//! qbridge Conversion Contract
//!
//! The pieces every format adapter shares: the [`Importer`] and
//! [`Exporter`] traits, the per-target [`MappingTable`], the export
//! context that allocates native symbols, and the error taxonomy.
//!
//! # Overview
//!
//! | Piece | Module |
//! |-------|--------|
//! | Format tags | [`format`] |
//! | Importer / exporter / native-program traits | [`traits`] |
//! | `kind → strategy` tables | [`mapping`] |
//! | Export options, symbol allocation, import/export results | [`context`] |
//! | Well-known angle tie-break | [`angles`] |
//! | Errors | [`error`] |
//!
//! # Example
//!
//! ```rust
//! use qbridge_convert::ProgramFormat;
//!
//! let format: ProgramFormat = "quil".parse().unwrap();
//! assert_eq!(format, ProgramFormat::Quil);
//! assert_eq!(format.tag(), "pyquil");
//! assert!("pennylane".parse::<ProgramFormat>().is_err());
//! ```

pub mod angles;
pub mod context;
pub mod error;
pub mod format;
pub mod mapping;
pub mod traits;

pub use angles::{ANGLE_TOLERANCE, WellKnownAngle};
pub use context::{
    ExportContext, ExportOptions, Exported, GateEmission, ImportState, ImportedCircuit,
    MetadataScan, NativeSymbol, ProgramMetadata,
};
pub use error::{ConvertError, ConvertResult};
pub use format::ProgramFormat;
pub use mapping::{DecomposeFn, DirectFn, GateMapping, MappingTable, MatrixFn, Strategy};
pub use traits::{Exporter, Importer, NativeProgram};
