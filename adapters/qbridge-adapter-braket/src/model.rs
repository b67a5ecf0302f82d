//! Braket circuit model.
//!
//! A circuit is a flat list of instructions, each an operator on integer
//! target qubits. Angles are floats or expressions over `FreeParameter`s.

use serde::{Deserialize, Serialize};
use std::fmt;

use qbridge_convert::{ConvertError, ConvertResult, NativeSymbol, ProgramFormat};
use qbridge_ir::{NamedSymbol, ParameterExpression, UnitaryMatrix};

/// `braket.circuits.FreeParameter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreeParameter {
    /// Parameter name.
    pub name: String,
}

impl FreeParameter {
    /// Create a free parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for FreeParameter {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for FreeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl NamedSymbol for FreeParameter {
    fn symbol_name(&self) -> String {
        self.name.clone()
    }
}

impl NativeSymbol for FreeParameter {
    fn from_name(name: &str) -> Self {
        Self::new(name)
    }

    /// Braket names must be identifiers.
    fn sanitize(name: &str) -> String {
        let mut out: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if out.starts_with(|c: char| c.is_ascii_digit()) {
            out.insert(0, '_');
        }
        out
    }
}

/// A numeric or symbolic Braket angle.
pub type Value = ParameterExpression<FreeParameter>;

/// A Braket gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BraketGate {
    I,
    X,
    Y,
    Z,
    H,
    S,
    /// S†.
    Si,
    T,
    /// T†.
    Ti,
    /// √X.
    V,
    /// √X†.
    Vi,
    Rx(Value),
    Ry(Value),
    Rz(Value),
    PhaseShift(Value),
    CNot,
    CY,
    CZ,
    /// Controlled √X.
    CV,
    Swap,
    ISwap,
    PSwap(Value),
    XY(Value),
    CPhaseShift(Value),
    CPhaseShift00(Value),
    CPhaseShift01(Value),
    CPhaseShift10(Value),
    XX(Value),
    YY(Value),
    ZZ(Value),
    ECR,
    CCNot,
    CSwap,
    /// `Unitary(matrix)`, big-endian over its targets.
    Unitary {
        /// The matrix.
        matrix: UnitaryMatrix,
        /// Display label.
        display_name: String,
    },
}

impl BraketGate {
    /// Braket class name.
    pub fn name(&self) -> &'static str {
        match self {
            BraketGate::I => "I",
            BraketGate::X => "X",
            BraketGate::Y => "Y",
            BraketGate::Z => "Z",
            BraketGate::H => "H",
            BraketGate::S => "S",
            BraketGate::Si => "Si",
            BraketGate::T => "T",
            BraketGate::Ti => "Ti",
            BraketGate::V => "V",
            BraketGate::Vi => "Vi",
            BraketGate::Rx(_) => "Rx",
            BraketGate::Ry(_) => "Ry",
            BraketGate::Rz(_) => "Rz",
            BraketGate::PhaseShift(_) => "PhaseShift",
            BraketGate::CNot => "CNot",
            BraketGate::CY => "CY",
            BraketGate::CZ => "CZ",
            BraketGate::CV => "CV",
            BraketGate::Swap => "Swap",
            BraketGate::ISwap => "ISwap",
            BraketGate::PSwap(_) => "PSwap",
            BraketGate::XY(_) => "XY",
            BraketGate::CPhaseShift(_) => "CPhaseShift",
            BraketGate::CPhaseShift00(_) => "CPhaseShift00",
            BraketGate::CPhaseShift01(_) => "CPhaseShift01",
            BraketGate::CPhaseShift10(_) => "CPhaseShift10",
            BraketGate::XX(_) => "XX",
            BraketGate::YY(_) => "YY",
            BraketGate::ZZ(_) => "ZZ",
            BraketGate::ECR => "ECR",
            BraketGate::CCNot => "CCNot",
            BraketGate::CSwap => "CSwap",
            BraketGate::Unitary { .. } => "Unitary",
        }
    }

    /// Number of target qubits.
    pub fn qubit_count(&self) -> u32 {
        match self {
            BraketGate::I
            | BraketGate::X
            | BraketGate::Y
            | BraketGate::Z
            | BraketGate::H
            | BraketGate::S
            | BraketGate::Si
            | BraketGate::T
            | BraketGate::Ti
            | BraketGate::V
            | BraketGate::Vi
            | BraketGate::Rx(_)
            | BraketGate::Ry(_)
            | BraketGate::Rz(_)
            | BraketGate::PhaseShift(_) => 1,
            BraketGate::CCNot | BraketGate::CSwap => 3,
            BraketGate::Unitary { matrix, .. } => matrix.num_qubits(),
            _ => 2,
        }
    }

    /// The gate's angle, if it has one.
    pub fn angle(&self) -> Option<&Value> {
        match self {
            BraketGate::Rx(v)
            | BraketGate::Ry(v)
            | BraketGate::Rz(v)
            | BraketGate::PhaseShift(v)
            | BraketGate::PSwap(v)
            | BraketGate::XY(v)
            | BraketGate::CPhaseShift(v)
            | BraketGate::CPhaseShift00(v)
            | BraketGate::CPhaseShift01(v)
            | BraketGate::CPhaseShift10(v)
            | BraketGate::XX(v)
            | BraketGate::YY(v)
            | BraketGate::ZZ(v) => Some(v),
            _ => None,
        }
    }

    /// Same gate with a new angle. Gates without one are returned as is.
    #[must_use]
    pub fn with_angle(&self, value: Value) -> Self {
        match self {
            BraketGate::Rx(_) => BraketGate::Rx(value),
            BraketGate::Ry(_) => BraketGate::Ry(value),
            BraketGate::Rz(_) => BraketGate::Rz(value),
            BraketGate::PhaseShift(_) => BraketGate::PhaseShift(value),
            BraketGate::PSwap(_) => BraketGate::PSwap(value),
            BraketGate::XY(_) => BraketGate::XY(value),
            BraketGate::CPhaseShift(_) => BraketGate::CPhaseShift(value),
            BraketGate::CPhaseShift00(_) => BraketGate::CPhaseShift00(value),
            BraketGate::CPhaseShift01(_) => BraketGate::CPhaseShift01(value),
            BraketGate::CPhaseShift10(_) => BraketGate::CPhaseShift10(value),
            BraketGate::XX(_) => BraketGate::XX(value),
            BraketGate::YY(_) => BraketGate::YY(value),
            BraketGate::ZZ(_) => BraketGate::ZZ(value),
            other => other.clone(),
        }
    }

    /// Check if the angle is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.angle().is_some_and(Value::is_symbolic)
    }
}

impl fmt::Display for BraketGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BraketGate::Unitary { display_name, .. } => write!(f, "Unitary('{display_name}')"),
            other => match other.angle() {
                Some(angle) => write!(f, "{}('angle': {angle})", other.name()),
                None => f.write_str(other.name()),
            },
        }
    }
}

/// Noise channels. None of them are unitary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Noise {
    BitFlip(f64),
    PhaseFlip(f64),
    Depolarizing(f64),
    AmplitudeDamping(f64),
}

impl fmt::Display for Noise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Noise::BitFlip(p) => write!(f, "BitFlip('probability': {p})"),
            Noise::PhaseFlip(p) => write!(f, "PhaseFlip('probability': {p})"),
            Noise::Depolarizing(p) => write!(f, "Depolarizing('probability': {p})"),
            Noise::AmplitudeDamping(g) => write!(f, "AmplitudeDamping('gamma': {g})"),
        }
    }
}

/// What an instruction applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    Gate(BraketGate),
    Noise(Noise),
    /// Computational-basis measurement of every target.
    Measure,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Gate(g) => g.fmt(f),
            Operator::Noise(n) => n.fmt(f),
            Operator::Measure => f.write_str("Measure"),
        }
    }
}

/// An operator on target qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operator.
    pub operator: Operator,
    /// Target qubits in operand order.
    pub target: Vec<u32>,
}

impl Instruction {
    /// Create an instruction, checking the target count of gates.
    pub fn new(operator: Operator, target: impl Into<Vec<u32>>) -> ConvertResult<Self> {
        let target = target.into();
        let expected = match &operator {
            Operator::Gate(g) => Some(g.qubit_count() as usize),
            Operator::Noise(_) => Some(1),
            Operator::Measure => None,
        };
        if let Some(n) = expected {
            if target.len() != n {
                return Err(ConvertError::invalid(
                    ProgramFormat::Braket,
                    format!("{operator} expects {n} targets but got {}", target.len()),
                ));
            }
        }
        for (i, q) in target.iter().enumerate() {
            if target[..i].contains(q) {
                return Err(ConvertError::invalid(
                    ProgramFormat::Braket,
                    format!("{operator} targets qubit {q} twice"),
                ));
            }
        }
        Ok(Self { operator, target })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<String> = self.target.iter().map(ToString::to_string).collect();
        write!(f, "{} on [{}]", self.operator, targets.join(", "))
    }
}

/// A Braket `Circuit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Instructions in program order.
    pub instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate.
    pub fn add(&mut self, gate: BraketGate, target: impl Into<Vec<u32>>) -> ConvertResult<&mut Self> {
        self.instructions
            .push(Instruction::new(Operator::Gate(gate), target)?);
        Ok(self)
    }

    /// Append a noise channel.
    pub fn noise(&mut self, noise: Noise, target: u32) -> ConvertResult<&mut Self> {
        self.instructions
            .push(Instruction::new(Operator::Noise(noise), [target])?);
        Ok(self)
    }

    /// Measure `target`.
    pub fn measure(&mut self, target: impl Into<Vec<u32>>) -> ConvertResult<&mut Self> {
        self.instructions
            .push(Instruction::new(Operator::Measure, target)?);
        Ok(self)
    }

    /// `Circuit().h(q)`.
    pub fn h(&mut self, q: u32) -> ConvertResult<&mut Self> {
        self.add(BraketGate::H, [q])
    }

    /// `Circuit().cnot(control, target)`.
    pub fn cnot(&mut self, control: u32, target: u32) -> ConvertResult<&mut Self> {
        self.add(BraketGate::CNot, [control, target])
    }

    /// `Circuit().rx(q, angle)`.
    pub fn rx(&mut self, q: u32, angle: impl Into<Value>) -> ConvertResult<&mut Self> {
        self.add(BraketGate::Rx(angle.into()), [q])
    }

    /// `Circuit().rz(q, angle)`.
    pub fn rz(&mut self, q: u32, angle: impl Into<Value>) -> ConvertResult<&mut Self> {
        self.add(BraketGate::Rz(angle.into()), [q])
    }

    /// Distinct target qubits in ascending order.
    pub fn qubits(&self) -> Vec<u32> {
        let mut qubits: Vec<u32> = self
            .instructions
            .iter()
            .flat_map(|i| i.target.iter().copied())
            .collect();
        qubits.sort_unstable();
        qubits.dedup();
        qubits
    }

    /// Number of distinct qubits.
    pub fn qubit_count(&self) -> usize {
        self.qubits().len()
    }

    /// Free parameters in first-seen order.
    pub fn parameters(&self) -> Vec<FreeParameter> {
        let mut out: Vec<FreeParameter> = Vec::new();
        for gate in self.gates() {
            for p in gate.angle().map(Value::symbols).unwrap_or_default() {
                if !out.contains(p) {
                    out.push(p.clone());
                }
            }
        }
        out
    }

    /// Gate operators in program order.
    pub fn gates(&self) -> impl Iterator<Item = &BraketGate> {
        self.instructions.iter().filter_map(|i| match &i.operator {
            Operator::Gate(g) => Some(g),
            _ => None,
        })
    }

    /// `circuit.make_bound_circuit(values)`, with values looked up by name.
    #[must_use]
    pub fn make_bound_circuit(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        let instructions = self
            .instructions
            .iter()
            .map(|inst| match &inst.operator {
                Operator::Gate(g) => match g.angle() {
                    Some(angle) => Instruction {
                        operator: Operator::Gate(
                            g.with_angle(angle.bind_named(&|name: &str| lookup(name)).simplify()),
                        ),
                        target: inst.target.clone(),
                    },
                    None => inst.clone(),
                },
                _ => inst.clone(),
            })
            .collect();
        Self { instructions }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubits_are_sorted() {
        let mut circuit = Circuit::new();
        circuit.h(6).unwrap().cnot(6, 1).unwrap();
        assert_eq!(circuit.qubits(), vec![1, 6]);
        assert_eq!(circuit.qubit_count(), 2);
    }

    #[test]
    fn test_target_count_is_checked() {
        assert!(Instruction::new(Operator::Gate(BraketGate::CNot), [0]).is_err());
        assert!(Instruction::new(Operator::Gate(BraketGate::CNot), [0, 0]).is_err());
        assert!(Instruction::new(Operator::Measure, [0, 1, 2]).is_ok());
    }

    #[test]
    fn test_parameters_first_seen() {
        let mut circuit = Circuit::new();
        circuit
            .rx(0, Value::symbol("beta"))
            .unwrap()
            .rz(1, Value::symbol("alpha"))
            .unwrap()
            .rx(1, Value::symbol("beta"))
            .unwrap();
        let names: Vec<String> = circuit.parameters().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["beta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn test_make_bound_circuit() {
        let mut circuit = Circuit::new();
        circuit.rx(0, Value::symbol("theta") * Value::constant(2.0)).unwrap();
        let bound = circuit.make_bound_circuit(&|name| (name == "theta").then_some(0.25));
        let angle = bound.gates().next().unwrap().angle().unwrap().as_f64().unwrap();
        assert!((angle - 0.5).abs() < 1e-12);
        assert!(circuit.parameters().len() == 1 && bound.parameters().is_empty());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(FreeParameter::sanitize("θ-1"), "__1");
        assert_eq!(FreeParameter::sanitize("2x"), "_2x");
        assert_eq!(FreeParameter::sanitize("gamma_0"), "gamma_0");
    }
}
