//! A native program in any supported format.

use serde::{Deserialize, Serialize};

use qbridge_adapter_braket as braket;
use qbridge_adapter_cirq as cirq;
use qbridge_adapter_qiskit as qiskit;
use qbridge_adapter_quil as quil;
use qbridge_convert::{ConvertResult, NativeProgram, ProgramFormat, ProgramMetadata};
use qbridge_unitary::Matrix;

/// A program in one of the supported native formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "program", rename_all = "lowercase")]
pub enum Program {
    /// A Cirq circuit.
    Cirq(cirq::Circuit),
    /// A Braket circuit.
    Braket(braket::Circuit),
    /// A Qiskit `QuantumCircuit`.
    Qiskit(qiskit::QuantumCircuit),
    /// A Quil program.
    #[serde(rename = "pyquil")]
    Quil(quil::Program),
}

/// Apply `$body` to the native model inside `$program`.
macro_rules! dispatch {
    ($program:expr, $inner:ident => $body:expr) => {
        match $program {
            Program::Cirq($inner) => $body,
            Program::Braket($inner) => $body,
            Program::Qiskit($inner) => $body,
            Program::Quil($inner) => $body,
        }
    };
}

impl Program {
    /// Format tag of the program.
    pub fn format(&self) -> ProgramFormat {
        match self {
            Program::Cirq(_) => ProgramFormat::Cirq,
            Program::Braket(_) => ProgramFormat::Braket,
            Program::Qiskit(_) => ProgramFormat::Qiskit,
            Program::Quil(_) => ProgramFormat::Quil,
        }
    }

    /// Metadata read from the native structure.
    pub fn metadata(&self) -> ConvertResult<ProgramMetadata> {
        dispatch!(self, p => p.metadata())
    }

    /// Unitary under the format's own gate semantics.
    pub fn unitary(&self) -> ConvertResult<Matrix> {
        dispatch!(self, p => p.unitary())
    }

    /// Substitute values for free parameters, looked up by display name.
    #[must_use]
    pub fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        dispatch!(self, p => p.bind_parameters(lookup).into())
    }

    /// Native qubit labels in the format's canonical order.
    pub fn qubit_labels(&self) -> Vec<String> {
        fn labels<T: ToString>(qubits: Vec<T>) -> Vec<String> {
            qubits.iter().map(ToString::to_string).collect()
        }
        match self {
            Program::Cirq(c) => labels(c.all_qubits()),
            Program::Braket(c) => labels(c.qubits()),
            Program::Qiskit(c) => labels(c.qubits()),
            Program::Quil(p) => labels(p.qubits()),
        }
    }

    pub fn as_cirq(&self) -> Option<&cirq::Circuit> {
        match self {
            Program::Cirq(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_braket(&self) -> Option<&braket::Circuit> {
        match self {
            Program::Braket(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_qiskit(&self) -> Option<&qiskit::QuantumCircuit> {
        match self {
            Program::Qiskit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_quil(&self) -> Option<&quil::Program> {
        match self {
            Program::Quil(p) => Some(p),
            _ => None,
        }
    }
}

impl From<cirq::Circuit> for Program {
    fn from(circuit: cirq::Circuit) -> Self {
        Program::Cirq(circuit)
    }
}

impl From<braket::Circuit> for Program {
    fn from(circuit: braket::Circuit) -> Self {
        Program::Braket(circuit)
    }
}

impl From<qiskit::QuantumCircuit> for Program {
    fn from(circuit: qiskit::QuantumCircuit) -> Self {
        Program::Qiskit(circuit)
    }
}

impl From<quil::Program> for Program {
    fn from(program: quil::Program) -> Self {
        Program::Quil(program)
    }
}
