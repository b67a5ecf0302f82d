//! Qiskit `QuantumCircuit` model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use qbridge_convert::{ConvertError, ConvertResult, NativeSymbol, ProgramFormat};
use qbridge_ir::{NamedSymbol, ParameterExpression, UnitaryMatrix};

/// `qiskit.circuit.Parameter`. Identity is the uuid, not the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Display name.
    pub name: String,
    /// Identity.
    pub uuid: Uuid,
}

impl Parameter {
    /// Create a parameter with a fresh uuid.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl From<&str> for Parameter {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl NamedSymbol for Parameter {
    fn symbol_name(&self) -> String {
        self.name.clone()
    }
}

impl NativeSymbol for Parameter {
    fn from_name(name: &str) -> Self {
        Self::new(name)
    }
}

/// A numeric or symbolic gate parameter.
pub type ParameterValue = ParameterExpression<Parameter>;

/// `QuantumRegister(size, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumRegister {
    pub name: String,
    pub size: u32,
}

/// `ClassicalRegister(size, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    pub name: String,
    pub size: u32,
}

/// One bit of a quantum register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qubit {
    pub register: String,
    pub index: u32,
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// One bit of a classical register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clbit {
    pub register: String,
    pub index: u32,
}

impl fmt::Display for Clbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// Qiskit standard-library gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QiskitGate {
    // Single-qubit fixed gates
    /// `IGate`.
    I,
    X,
    Y,
    Z,
    H,
    S,
    Sdg,
    T,
    Tdg,
    SX,
    SXdg,

    // Single-qubit parametric gates
    RX(ParameterValue),
    RY(ParameterValue),
    RZ(ParameterValue),
    /// `PhaseGate(λ)`.
    P(ParameterValue),
    /// `U1Gate(λ)`, equal to `PhaseGate(λ)`.
    U1(ParameterValue),
    /// `U2Gate(φ, λ) = U(π/2, φ, λ)`.
    U2(ParameterValue, ParameterValue),
    /// `UGate(θ, φ, λ)`.
    U(ParameterValue, ParameterValue, ParameterValue),
    /// `RGate(θ, φ)`: rotation by θ about `cos φ·X + sin φ·Y`.
    R(ParameterValue, ParameterValue),

    // Two-qubit gates
    CX,
    CY,
    CZ,
    CH,
    CP(ParameterValue),
    CRX(ParameterValue),
    CRY(ParameterValue),
    CRZ(ParameterValue),
    Swap,
    ISwap,
    /// Double CNOT: `CX(0, 1)` then `CX(1, 0)`.
    DCX,
    ECR,
    RXX(ParameterValue),
    RYY(ParameterValue),
    RZZ(ParameterValue),
    /// `exp(-iθ/2 · Z⊗X)` with Z on the first qubit.
    RZX(ParameterValue),

    // Three-qubit gates
    CCX,
    CCZ,
    CSwap,

    /// `UnitaryGate`. Qiskit matrices are little-endian: the first qubit
    /// is the least significant bit.
    Unitary(UnitaryMatrix),
}

impl QiskitGate {
    /// Qiskit instruction name.
    pub fn name(&self) -> &'static str {
        match self {
            QiskitGate::I => "id",
            QiskitGate::X => "x",
            QiskitGate::Y => "y",
            QiskitGate::Z => "z",
            QiskitGate::H => "h",
            QiskitGate::S => "s",
            QiskitGate::Sdg => "sdg",
            QiskitGate::T => "t",
            QiskitGate::Tdg => "tdg",
            QiskitGate::SX => "sx",
            QiskitGate::SXdg => "sxdg",
            QiskitGate::RX(_) => "rx",
            QiskitGate::RY(_) => "ry",
            QiskitGate::RZ(_) => "rz",
            QiskitGate::P(_) => "p",
            QiskitGate::U1(_) => "u1",
            QiskitGate::U2(_, _) => "u2",
            QiskitGate::U(_, _, _) => "u",
            QiskitGate::R(_, _) => "r",
            QiskitGate::CX => "cx",
            QiskitGate::CY => "cy",
            QiskitGate::CZ => "cz",
            QiskitGate::CH => "ch",
            QiskitGate::CP(_) => "cp",
            QiskitGate::CRX(_) => "crx",
            QiskitGate::CRY(_) => "cry",
            QiskitGate::CRZ(_) => "crz",
            QiskitGate::Swap => "swap",
            QiskitGate::ISwap => "iswap",
            QiskitGate::DCX => "dcx",
            QiskitGate::ECR => "ecr",
            QiskitGate::RXX(_) => "rxx",
            QiskitGate::RYY(_) => "ryy",
            QiskitGate::RZZ(_) => "rzz",
            QiskitGate::RZX(_) => "rzx",
            QiskitGate::CCX => "ccx",
            QiskitGate::CCZ => "ccz",
            QiskitGate::CSwap => "cswap",
            QiskitGate::Unitary(_) => "unitary",
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        match self {
            QiskitGate::I
            | QiskitGate::X
            | QiskitGate::Y
            | QiskitGate::Z
            | QiskitGate::H
            | QiskitGate::S
            | QiskitGate::Sdg
            | QiskitGate::T
            | QiskitGate::Tdg
            | QiskitGate::SX
            | QiskitGate::SXdg
            | QiskitGate::RX(_)
            | QiskitGate::RY(_)
            | QiskitGate::RZ(_)
            | QiskitGate::P(_)
            | QiskitGate::U1(_)
            | QiskitGate::U2(_, _)
            | QiskitGate::U(_, _, _)
            | QiskitGate::R(_, _) => 1,
            QiskitGate::CCX | QiskitGate::CCZ | QiskitGate::CSwap => 3,
            QiskitGate::Unitary(m) => m.num_qubits(),
            _ => 2,
        }
    }

    /// Gate parameters in Qiskit's order.
    pub fn params(&self) -> Vec<&ParameterValue> {
        match self {
            QiskitGate::RX(a)
            | QiskitGate::RY(a)
            | QiskitGate::RZ(a)
            | QiskitGate::P(a)
            | QiskitGate::U1(a)
            | QiskitGate::CP(a)
            | QiskitGate::CRX(a)
            | QiskitGate::CRY(a)
            | QiskitGate::CRZ(a)
            | QiskitGate::RXX(a)
            | QiskitGate::RYY(a)
            | QiskitGate::RZZ(a)
            | QiskitGate::RZX(a) => vec![a],
            QiskitGate::U2(a, b) | QiskitGate::R(a, b) => vec![a, b],
            QiskitGate::U(a, b, c) => vec![a, b, c],
            _ => vec![],
        }
    }

    /// Check if any parameter is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.params().iter().any(|p| p.is_symbolic())
    }

    /// `gate.assign_parameters(...)` with values looked up by name.
    #[must_use]
    pub fn assign(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        let b = |v: &ParameterValue| v.bind_named(&|name: &str| lookup(name)).simplify();
        match self {
            QiskitGate::RX(a) => QiskitGate::RX(b(a)),
            QiskitGate::RY(a) => QiskitGate::RY(b(a)),
            QiskitGate::RZ(a) => QiskitGate::RZ(b(a)),
            QiskitGate::P(a) => QiskitGate::P(b(a)),
            QiskitGate::U1(a) => QiskitGate::U1(b(a)),
            QiskitGate::U2(x, y) => QiskitGate::U2(b(x), b(y)),
            QiskitGate::U(x, y, z) => QiskitGate::U(b(x), b(y), b(z)),
            QiskitGate::R(x, y) => QiskitGate::R(b(x), b(y)),
            QiskitGate::CP(a) => QiskitGate::CP(b(a)),
            QiskitGate::CRX(a) => QiskitGate::CRX(b(a)),
            QiskitGate::CRY(a) => QiskitGate::CRY(b(a)),
            QiskitGate::CRZ(a) => QiskitGate::CRZ(b(a)),
            QiskitGate::RXX(a) => QiskitGate::RXX(b(a)),
            QiskitGate::RYY(a) => QiskitGate::RYY(b(a)),
            QiskitGate::RZZ(a) => QiskitGate::RZZ(b(a)),
            QiskitGate::RZX(a) => QiskitGate::RZX(b(a)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for QiskitGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params();
        if params.is_empty() {
            return f.write_str(self.name());
        }
        let params: Vec<String> = params.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name(), params.join(", "))
    }
}

/// What a circuit instruction applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Gate(QiskitGate),
    Measure,
    Reset,
    Barrier,
    /// `Delay(duration)` in `dt`.
    Delay(f64),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate(g) => g.fmt(f),
            Operation::Measure => f.write_str("measure"),
            Operation::Reset => f.write_str("reset"),
            Operation::Barrier => f.write_str("barrier"),
            Operation::Delay(d) => write!(f, "delay({d})"),
        }
    }
}

/// `c_if(register, value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub register: String,
    pub value: u64,
}

/// An operation on specific bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitInstruction {
    pub operation: Operation,
    pub qubits: Vec<Qubit>,
    pub clbits: Vec<Clbit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl fmt::Display for CircuitInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, "{} {}", self.operation, qubits.join(", "))?;
        if !self.clbits.is_empty() {
            let clbits: Vec<String> = self.clbits.iter().map(ToString::to_string).collect();
            write!(f, " -> {}", clbits.join(", "))?;
        }
        if let Some(c) = &self.condition {
            write!(f, ".c_if({}, {})", c.register, c.value)?;
        }
        Ok(())
    }
}

/// A Qiskit `QuantumCircuit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumCircuit {
    pub name: String,
    pub qregs: Vec<QuantumRegister>,
    pub cregs: Vec<ClassicalRegister>,
    pub data: Vec<CircuitInstruction>,
    /// Global phase in radians.
    #[serde(default)]
    pub global_phase: f64,
}

impl QuantumCircuit {
    /// `QuantumCircuit(num_qubits, num_clbits)`: registers `q` and `c`.
    pub fn new(num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::empty();
        if num_qubits > 0 {
            circuit.qregs.push(QuantumRegister {
                name: "q".to_string(),
                size: num_qubits,
            });
        }
        if num_clbits > 0 {
            circuit.cregs.push(ClassicalRegister {
                name: "c".to_string(),
                size: num_clbits,
            });
        }
        circuit
    }

    /// A circuit with no registers.
    pub fn empty() -> Self {
        Self {
            name: "circuit".to_string(),
            qregs: Vec::new(),
            cregs: Vec::new(),
            data: Vec::new(),
            global_phase: 0.0,
        }
    }

    /// `add_register(QuantumRegister(size, name))`.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> ConvertResult<&mut Self> {
        let name = name.into();
        if self.qregs.iter().any(|r| r.name == name) {
            return Err(ConvertError::invalid(
                ProgramFormat::Qiskit,
                format!("register name '{name}' already exists"),
            ));
        }
        self.qregs.push(QuantumRegister { name, size });
        Ok(self)
    }

    /// `add_register(ClassicalRegister(size, name))`.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> ConvertResult<&mut Self> {
        let name = name.into();
        if self.cregs.iter().any(|r| r.name == name) {
            return Err(ConvertError::invalid(
                ProgramFormat::Qiskit,
                format!("register name '{name}' already exists"),
            ));
        }
        self.cregs.push(ClassicalRegister { name, size });
        Ok(self)
    }

    /// Every qubit, in register-declaration order.
    pub fn qubits(&self) -> Vec<Qubit> {
        self.qregs
            .iter()
            .flat_map(|r| {
                (0..r.size).map(|index| Qubit {
                    register: r.name.clone(),
                    index,
                })
            })
            .collect()
    }

    /// Every classical bit, in register-declaration order.
    pub fn clbits(&self) -> Vec<Clbit> {
        self.cregs
            .iter()
            .flat_map(|r| {
                (0..r.size).map(|index| Clbit {
                    register: r.name.clone(),
                    index,
                })
            })
            .collect()
    }

    /// Total number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.qregs.iter().map(|r| r.size).sum()
    }

    /// Total number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.cregs.iter().map(|r| r.size).sum()
    }

    /// Flat position of a qubit.
    pub fn find_qubit(&self, qubit: &Qubit) -> Option<usize> {
        let mut offset = 0;
        for r in &self.qregs {
            if r.name == qubit.register {
                return (qubit.index < r.size).then_some(offset + qubit.index as usize);
            }
            offset += r.size as usize;
        }
        None
    }

    /// Flat position of a classical bit.
    pub fn find_clbit(&self, clbit: &Clbit) -> Option<usize> {
        let mut offset = 0;
        for r in &self.cregs {
            if r.name == clbit.register {
                return (clbit.index < r.size).then_some(offset + clbit.index as usize);
            }
            offset += r.size as usize;
        }
        None
    }

    fn qubit_at(&self, index: u32) -> ConvertResult<Qubit> {
        self.qubits().into_iter().nth(index as usize).ok_or_else(|| {
            ConvertError::invalid(
                ProgramFormat::Qiskit,
                format!("qubit index {index} out of range for {} qubits", self.num_qubits()),
            )
        })
    }

    fn clbit_at(&self, index: u32) -> ConvertResult<Clbit> {
        self.clbits().into_iter().nth(index as usize).ok_or_else(|| {
            ConvertError::invalid(
                ProgramFormat::Qiskit,
                format!("clbit index {index} out of range for {} clbits", self.num_clbits()),
            )
        })
    }

    /// `circuit.append(operation, qubits, clbits)`.
    pub fn append(
        &mut self,
        operation: Operation,
        qubits: Vec<Qubit>,
        clbits: Vec<Clbit>,
    ) -> ConvertResult<&mut Self> {
        if let Operation::Gate(g) = &operation {
            if qubits.len() != g.num_qubits() as usize {
                return Err(ConvertError::invalid(
                    ProgramFormat::Qiskit,
                    format!("{g} acts on {} qubits but was given {}", g.num_qubits(), qubits.len()),
                ));
            }
        }
        for (i, q) in qubits.iter().enumerate() {
            if self.find_qubit(q).is_none() {
                return Err(ConvertError::invalid(
                    ProgramFormat::Qiskit,
                    format!("{q} is not in the circuit"),
                ));
            }
            if qubits[..i].contains(q) {
                return Err(ConvertError::invalid(
                    ProgramFormat::Qiskit,
                    format!("duplicate qubit {q} in {operation}"),
                ));
            }
        }
        if let Some(c) = clbits.iter().find(|c| self.find_clbit(c).is_none()) {
            return Err(ConvertError::invalid(
                ProgramFormat::Qiskit,
                format!("{c} is not in the circuit"),
            ));
        }
        self.data.push(CircuitInstruction {
            operation,
            qubits,
            clbits,
            condition: None,
        });
        Ok(self)
    }

    /// Append a gate on flat qubit indices.
    pub fn gate(&mut self, gate: QiskitGate, qubits: &[u32]) -> ConvertResult<&mut Self> {
        let qubits = qubits
            .iter()
            .map(|&q| self.qubit_at(q))
            .collect::<ConvertResult<Vec<_>>>()?;
        self.append(Operation::Gate(gate), qubits, Vec::new())
    }

    pub fn h(&mut self, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QiskitGate::H, &[q])
    }

    pub fn x(&mut self, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QiskitGate::X, &[q])
    }

    pub fn cx(&mut self, control: u32, target: u32) -> ConvertResult<&mut Self> {
        self.gate(QiskitGate::CX, &[control, target])
    }

    pub fn rx(&mut self, theta: impl Into<ParameterValue>, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QiskitGate::RX(theta.into()), &[q])
    }

    pub fn rz(&mut self, phi: impl Into<ParameterValue>, q: u32) -> ConvertResult<&mut Self> {
        self.gate(QiskitGate::RZ(phi.into()), &[q])
    }

    /// `circuit.measure(qubit, clbit)` on flat indices.
    pub fn measure(&mut self, qubit: u32, clbit: u32) -> ConvertResult<&mut Self> {
        let q = self.qubit_at(qubit)?;
        let c = self.clbit_at(clbit)?;
        self.append(Operation::Measure, vec![q], vec![c])
    }

    /// `circuit.reset(qubit)`.
    pub fn reset(&mut self, qubit: u32) -> ConvertResult<&mut Self> {
        let q = self.qubit_at(qubit)?;
        self.append(Operation::Reset, vec![q], Vec::new())
    }

    /// `circuit.barrier()` across every qubit.
    pub fn barrier(&mut self) -> ConvertResult<&mut Self> {
        let qubits = self.qubits();
        self.append(Operation::Barrier, qubits, Vec::new())
    }

    /// Attach `c_if(register, value)` to the last instruction.
    pub fn c_if(&mut self, register: impl Into<String>, value: u64) -> ConvertResult<&mut Self> {
        let register = register.into();
        if !self.cregs.iter().any(|r| r.name == register) {
            return Err(ConvertError::invalid(
                ProgramFormat::Qiskit,
                format!("unknown classical register '{register}'"),
            ));
        }
        let last = self.data.last_mut().ok_or_else(|| {
            ConvertError::invalid(ProgramFormat::Qiskit, "c_if on an empty circuit")
        })?;
        last.condition = Some(Condition { register, value });
        Ok(self)
    }

    /// Free parameters in first-seen order.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut out: Vec<Parameter> = Vec::new();
        for inst in &self.data {
            if let Operation::Gate(g) = &inst.operation {
                for p in g.params().into_iter().flat_map(|v| v.symbols()) {
                    if !out.contains(p) {
                        out.push(p.clone());
                    }
                }
            }
        }
        out
    }

    /// `circuit.assign_parameters(...)` with values looked up by name.
    #[must_use]
    pub fn assign_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        let data = self
            .data
            .iter()
            .map(|inst| match &inst.operation {
                Operation::Gate(g) => CircuitInstruction {
                    operation: Operation::Gate(g.assign(lookup)),
                    ..inst.clone()
                },
                _ => inst.clone(),
            })
            .collect();
        Self {
            data,
            ..self.clone()
        }
    }
}

impl Default for QuantumCircuit {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for QuantumCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.data {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_flatten_in_order() {
        let mut circuit = QuantumCircuit::empty();
        circuit.add_qreg("a", 2).unwrap().add_qreg("b", 1).unwrap();
        let b0 = Qubit {
            register: "b".into(),
            index: 0,
        };
        assert_eq!(circuit.find_qubit(&b0), Some(2));
        assert_eq!(circuit.num_qubits(), 3);
        assert!(circuit.add_qreg("a", 1).is_err());
    }

    #[test]
    fn test_append_validates_bits() {
        let mut circuit = QuantumCircuit::new(2, 0);
        assert!(circuit.cx(0, 0).is_err());
        assert!(circuit.h(2).is_err());
        assert!(circuit.measure(0, 0).is_err());
        assert!(circuit.cx(0, 1).is_ok());
    }

    #[test]
    fn test_parameters_compare_by_uuid() {
        let a = Parameter::new("theta");
        let b = Parameter::new("theta");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut circuit = QuantumCircuit::new(1, 0);
        circuit
            .rx(ParameterValue::symbol(a.clone()), 0)
            .unwrap()
            .rz(ParameterValue::symbol(b), 0)
            .unwrap()
            .rx(ParameterValue::symbol(a), 0)
            .unwrap();
        assert_eq!(circuit.parameters().len(), 2);
    }

    #[test]
    fn test_assign_parameters() {
        let theta = Parameter::new("theta");
        let mut circuit = QuantumCircuit::new(1, 0);
        circuit.rx(ParameterValue::symbol(theta), 0).unwrap();
        let bound = circuit.assign_parameters(&|name| (name == "theta").then_some(1.5));
        assert!(bound.parameters().is_empty());
        assert_eq!(circuit.parameters().len(), 1);
    }

    #[test]
    fn test_json_circuit_keeps_parameter_identity() {
        let theta = Parameter::new("theta");
        let mut circuit = QuantumCircuit::new(1, 0);
        circuit.rx(ParameterValue::symbol(theta.clone()), 0).unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: QuantumCircuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back.parameters(), vec![theta]);
        assert_eq!(back.global_phase, 0.0);
    }

    #[test]
    fn test_c_if_marks_last_instruction() {
        let mut circuit = QuantumCircuit::new(1, 1);
        circuit.x(0).unwrap().c_if("c", 1).unwrap();
        assert!(circuit.data[0].condition.is_some());
        assert!(circuit.c_if("nope", 0).is_err());
    }
}
