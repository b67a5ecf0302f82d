//! Program format tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConvertError;

/// A supported native program format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramFormat {
    /// Cirq moment-based circuits.
    Cirq,
    /// Amazon Braket instruction lists.
    Braket,
    /// Qiskit `QuantumCircuit`.
    Qiskit,
    /// pyQuil / Quil programs.
    #[serde(rename = "pyquil")]
    Quil,
}

impl ProgramFormat {
    /// Every registered format.
    pub const ALL: [ProgramFormat; 4] = [
        ProgramFormat::Cirq,
        ProgramFormat::Braket,
        ProgramFormat::Qiskit,
        ProgramFormat::Quil,
    ];

    /// The tag callers use to name the format.
    pub fn tag(&self) -> &'static str {
        match self {
            ProgramFormat::Cirq => "cirq",
            ProgramFormat::Braket => "braket",
            ProgramFormat::Qiskit => "qiskit",
            ProgramFormat::Quil => "pyquil",
        }
    }

    /// Whether the format has a native symbolic parameter construct.
    ///
    /// Quil parameters are memory references; every other format has a
    /// first-class symbol type.
    pub fn has_symbolic_parameters(&self) -> bool {
        !matches!(self, ProgramFormat::Quil)
    }
}

impl fmt::Display for ProgramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ProgramFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cirq" => Ok(ProgramFormat::Cirq),
            "braket" => Ok(ProgramFormat::Braket),
            "qiskit" => Ok(ProgramFormat::Qiskit),
            "pyquil" | "quil" => Ok(ProgramFormat::Quil),
            _ => Err(ConvertError::UnsupportedFormat(s.to_string())),
        }
    }
}
