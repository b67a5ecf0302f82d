//! Cirq circuit model.
//!
//! Gates follow Cirq's `EigenGate` parameterization: a gate raised to an
//! `exponent` with an optional `global_shift` of its eigenvalues. Named
//! gates (`rx`, `S`, `CNOT`, ...) are constructors over that form.

use serde::{Deserialize, Serialize};
use std::fmt;

use qbridge_convert::{ConvertError, ConvertResult, NativeSymbol, ProgramFormat};
use qbridge_ir::{NamedSymbol, ParameterExpression, UnitaryMatrix};

/// A Cirq qubit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Qid {
    /// `LineQubit(x)`.
    Line(i64),
    /// `GridQubit(row, col)`.
    Grid {
        /// Row.
        row: i64,
        /// Column.
        col: i64,
    },
    /// `NamedQubit(name)`.
    Named(String),
}

impl Qid {
    /// `LineQubit.range(n)`.
    pub fn line_range(n: i64) -> Vec<Qid> {
        (0..n).map(Qid::Line).collect()
    }

    /// `GridQubit(row, col)`.
    pub fn grid(row: i64, col: i64) -> Self {
        Qid::Grid { row, col }
    }

    /// `NamedQubit(name)`.
    pub fn named(name: impl Into<String>) -> Self {
        Qid::Named(name.into())
    }
}

impl fmt::Display for Qid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qid::Line(x) => write!(f, "q({x})"),
            Qid::Grid { row, col } => write!(f, "q({row}, {col})"),
            Qid::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A sympy-style free symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The symbol's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl NamedSymbol for Symbol {
    fn symbol_name(&self) -> String {
        self.0.clone()
    }
}

impl NativeSymbol for Symbol {
    fn from_name(name: &str) -> Self {
        Self::new(name)
    }
}

/// A numeric or symbolic Cirq value.
pub type Value = ParameterExpression<Symbol>;

/// Exponent and eigenvalue shift of an `EigenGate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenPow {
    /// Power the base gate is raised to.
    pub exponent: Value,
    /// Shift of every eigenvalue's half-turn angle.
    pub global_shift: f64,
}

impl EigenPow {
    /// Unshifted power.
    pub fn new(exponent: impl Into<Value>) -> Self {
        Self {
            exponent: exponent.into(),
            global_shift: 0.0,
        }
    }

    /// Power with an explicit global shift.
    pub fn shifted(exponent: impl Into<Value>, global_shift: f64) -> Self {
        Self {
            exponent: exponent.into(),
            global_shift,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            exponent: self.exponent.scale(factor),
            global_shift: self.global_shift,
        }
    }
}

/// Gate class, used to key the import dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateClass {
    Identity,
    XPow,
    YPow,
    ZPow,
    HPow,
    CZPow,
    CXPow,
    SwapPow,
    ISwapPow,
    XXPow,
    YYPow,
    ZZPow,
    CCXPow,
    CCZPow,
    CSwap,
    PhasedXPow,
    Matrix,
    Controlled,
    Measurement,
    Reset,
    Depolarizing,
}

impl GateClass {
    /// Cirq class name.
    pub fn name(&self) -> &'static str {
        match self {
            GateClass::Identity => "IdentityGate",
            GateClass::XPow => "XPowGate",
            GateClass::YPow => "YPowGate",
            GateClass::ZPow => "ZPowGate",
            GateClass::HPow => "HPowGate",
            GateClass::CZPow => "CZPowGate",
            GateClass::CXPow => "CXPowGate",
            GateClass::SwapPow => "SwapPowGate",
            GateClass::ISwapPow => "ISwapPowGate",
            GateClass::XXPow => "XXPowGate",
            GateClass::YYPow => "YYPowGate",
            GateClass::ZZPow => "ZZPowGate",
            GateClass::CCXPow => "CCXPowGate",
            GateClass::CCZPow => "CCZPowGate",
            GateClass::CSwap => "CSwapGate",
            GateClass::PhasedXPow => "PhasedXPowGate",
            GateClass::Matrix => "MatrixGate",
            GateClass::Controlled => "ControlledGate",
            GateClass::Measurement => "MeasurementGate",
            GateClass::Reset => "ResetChannel",
            GateClass::Depolarizing => "DepolarizingChannel",
        }
    }
}

/// A Cirq gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CirqGate {
    /// `IdentityGate(num_qubits)`.
    Identity(u32),
    /// `XPowGate`.
    XPow(EigenPow),
    /// `YPowGate`.
    YPow(EigenPow),
    /// `ZPowGate`.
    ZPow(EigenPow),
    /// `HPowGate`.
    HPow(EigenPow),
    /// `CZPowGate`.
    CZPow(EigenPow),
    /// `CXPowGate` (`CNOT`).
    CXPow(EigenPow),
    /// `SwapPowGate`.
    SwapPow(EigenPow),
    /// `ISwapPowGate`.
    ISwapPow(EigenPow),
    /// `XXPowGate`.
    XXPow(EigenPow),
    /// `YYPowGate`.
    YYPow(EigenPow),
    /// `ZZPowGate`.
    ZZPow(EigenPow),
    /// `CCXPowGate` (`TOFFOLI`).
    CCXPow(EigenPow),
    /// `CCZPowGate`.
    CCZPow(EigenPow),
    /// `CSwapGate` (`FREDKIN`).
    CSwap,
    /// `PhasedXPowGate`: `Z^p · X^t · Z^-p`.
    PhasedXPow {
        /// Phase exponent `p`.
        phase_exponent: Value,
        /// The X power.
        pow: EigenPow,
    },
    /// `MatrixGate`, big-endian over its qubits.
    Matrix(UnitaryMatrix),
    /// `ControlledGate(sub_gate, num_controls)`; controls come first.
    Controlled {
        /// Gate applied when every control is one.
        sub_gate: Box<CirqGate>,
        /// Number of control qubits.
        num_controls: u32,
    },
    /// `MeasurementGate`.
    Measurement {
        /// Measurement key.
        key: String,
        /// Number of measured qubits.
        num_qubits: u32,
    },
    /// `ResetChannel`.
    Reset,
    /// `DepolarizingChannel(p)`.
    Depolarizing(f64),
}

impl CirqGate {
    /// `cirq.I`.
    pub fn i() -> Self {
        CirqGate::Identity(1)
    }

    /// `cirq.X`.
    pub fn x() -> Self {
        CirqGate::XPow(EigenPow::new(1.0))
    }

    /// `cirq.Y`.
    pub fn y() -> Self {
        CirqGate::YPow(EigenPow::new(1.0))
    }

    /// `cirq.Z`.
    pub fn z() -> Self {
        CirqGate::ZPow(EigenPow::new(1.0))
    }

    /// `cirq.H`.
    pub fn h() -> Self {
        CirqGate::HPow(EigenPow::new(1.0))
    }

    /// `cirq.S`.
    pub fn s() -> Self {
        CirqGate::ZPow(EigenPow::new(0.5))
    }

    /// `cirq.T`.
    pub fn t() -> Self {
        CirqGate::ZPow(EigenPow::new(0.25))
    }

    /// `cirq.rx(rads)`.
    pub fn rx(rads: impl Into<Value>) -> Self {
        CirqGate::XPow(EigenPow::shifted(rads.into().to_half_turns(), -0.5))
    }

    /// `cirq.ry(rads)`.
    pub fn ry(rads: impl Into<Value>) -> Self {
        CirqGate::YPow(EigenPow::shifted(rads.into().to_half_turns(), -0.5))
    }

    /// `cirq.rz(rads)`.
    pub fn rz(rads: impl Into<Value>) -> Self {
        CirqGate::ZPow(EigenPow::shifted(rads.into().to_half_turns(), -0.5))
    }

    /// `cirq.CNOT`.
    pub fn cnot() -> Self {
        CirqGate::CXPow(EigenPow::new(1.0))
    }

    /// `cirq.CZ`.
    pub fn cz() -> Self {
        CirqGate::CZPow(EigenPow::new(1.0))
    }

    /// `cirq.SWAP`.
    pub fn swap() -> Self {
        CirqGate::SwapPow(EigenPow::new(1.0))
    }

    /// `cirq.ISWAP`.
    pub fn iswap() -> Self {
        CirqGate::ISwapPow(EigenPow::new(1.0))
    }

    /// `cirq.TOFFOLI`.
    pub fn toffoli() -> Self {
        CirqGate::CCXPow(EigenPow::new(1.0))
    }

    /// `cirq.CCZ`.
    pub fn ccz() -> Self {
        CirqGate::CCZPow(EigenPow::new(1.0))
    }

    /// `cirq.FREDKIN`.
    pub fn fredkin() -> Self {
        CirqGate::CSwap
    }

    /// `ControlledGate(sub_gate)` with one control.
    pub fn controlled(sub_gate: CirqGate) -> Self {
        CirqGate::Controlled {
            sub_gate: Box::new(sub_gate),
            num_controls: 1,
        }
    }

    /// `cirq.measure(..., key)` on `num_qubits` qubits.
    pub fn measure(key: impl Into<String>, num_qubits: u32) -> Self {
        CirqGate::Measurement {
            key: key.into(),
            num_qubits,
        }
    }

    /// The gate's class.
    pub fn class(&self) -> GateClass {
        match self {
            CirqGate::Identity(_) => GateClass::Identity,
            CirqGate::XPow(_) => GateClass::XPow,
            CirqGate::YPow(_) => GateClass::YPow,
            CirqGate::ZPow(_) => GateClass::ZPow,
            CirqGate::HPow(_) => GateClass::HPow,
            CirqGate::CZPow(_) => GateClass::CZPow,
            CirqGate::CXPow(_) => GateClass::CXPow,
            CirqGate::SwapPow(_) => GateClass::SwapPow,
            CirqGate::ISwapPow(_) => GateClass::ISwapPow,
            CirqGate::XXPow(_) => GateClass::XXPow,
            CirqGate::YYPow(_) => GateClass::YYPow,
            CirqGate::ZZPow(_) => GateClass::ZZPow,
            CirqGate::CCXPow(_) => GateClass::CCXPow,
            CirqGate::CCZPow(_) => GateClass::CCZPow,
            CirqGate::CSwap => GateClass::CSwap,
            CirqGate::PhasedXPow { .. } => GateClass::PhasedXPow,
            CirqGate::Matrix(_) => GateClass::Matrix,
            CirqGate::Controlled { .. } => GateClass::Controlled,
            CirqGate::Measurement { .. } => GateClass::Measurement,
            CirqGate::Reset => GateClass::Reset,
            CirqGate::Depolarizing(_) => GateClass::Depolarizing,
        }
    }

    /// The `EigenPow` of a power gate.
    pub fn eigen(&self) -> Option<&EigenPow> {
        match self {
            CirqGate::XPow(p)
            | CirqGate::YPow(p)
            | CirqGate::ZPow(p)
            | CirqGate::HPow(p)
            | CirqGate::CZPow(p)
            | CirqGate::CXPow(p)
            | CirqGate::SwapPow(p)
            | CirqGate::ISwapPow(p)
            | CirqGate::XXPow(p)
            | CirqGate::YYPow(p)
            | CirqGate::ZZPow(p)
            | CirqGate::CCXPow(p)
            | CirqGate::CCZPow(p) => Some(p),
            CirqGate::PhasedXPow { pow, .. } => Some(pow),
            _ => None,
        }
    }

    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> u32 {
        match self {
            CirqGate::Identity(n) => *n,
            CirqGate::XPow(_)
            | CirqGate::YPow(_)
            | CirqGate::ZPow(_)
            | CirqGate::HPow(_)
            | CirqGate::PhasedXPow { .. }
            | CirqGate::Reset
            | CirqGate::Depolarizing(_) => 1,
            CirqGate::CZPow(_)
            | CirqGate::CXPow(_)
            | CirqGate::SwapPow(_)
            | CirqGate::ISwapPow(_)
            | CirqGate::XXPow(_)
            | CirqGate::YYPow(_)
            | CirqGate::ZZPow(_) => 2,
            CirqGate::CCXPow(_) | CirqGate::CCZPow(_) | CirqGate::CSwap => 3,
            CirqGate::Matrix(m) => m.num_qubits(),
            CirqGate::Controlled {
                sub_gate,
                num_controls,
            } => sub_gate.num_qubits() + num_controls,
            CirqGate::Measurement { num_qubits, .. } => *num_qubits,
        }
    }

    /// Whether the gate has a unitary.
    pub fn is_unitary(&self) -> bool {
        match self {
            CirqGate::Measurement { .. } | CirqGate::Reset | CirqGate::Depolarizing(_) => false,
            CirqGate::Controlled { sub_gate, .. } => sub_gate.is_unitary(),
            _ => true,
        }
    }

    /// Symbolic and numeric values the gate carries.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            CirqGate::PhasedXPow {
                phase_exponent,
                pow,
            } => vec![phase_exponent, &pow.exponent],
            CirqGate::Controlled { sub_gate, .. } => sub_gate.values(),
            other => other.eigen().map(|p| vec![&p.exponent]).unwrap_or_default(),
        }
    }

    /// Check if any value is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.values().iter().any(|v| v.is_symbolic())
    }

    /// `gate ** factor` for power gates.
    pub fn pow(&self, factor: f64) -> Option<CirqGate> {
        Some(match self {
            CirqGate::XPow(p) => CirqGate::XPow(p.scaled(factor)),
            CirqGate::YPow(p) => CirqGate::YPow(p.scaled(factor)),
            CirqGate::ZPow(p) => CirqGate::ZPow(p.scaled(factor)),
            CirqGate::HPow(p) => CirqGate::HPow(p.scaled(factor)),
            CirqGate::CZPow(p) => CirqGate::CZPow(p.scaled(factor)),
            CirqGate::CXPow(p) => CirqGate::CXPow(p.scaled(factor)),
            CirqGate::SwapPow(p) => CirqGate::SwapPow(p.scaled(factor)),
            CirqGate::ISwapPow(p) => CirqGate::ISwapPow(p.scaled(factor)),
            CirqGate::XXPow(p) => CirqGate::XXPow(p.scaled(factor)),
            CirqGate::YYPow(p) => CirqGate::YYPow(p.scaled(factor)),
            CirqGate::ZZPow(p) => CirqGate::ZZPow(p.scaled(factor)),
            CirqGate::CCXPow(p) => CirqGate::CCXPow(p.scaled(factor)),
            CirqGate::CCZPow(p) => CirqGate::CCZPow(p.scaled(factor)),
            CirqGate::PhasedXPow {
                phase_exponent,
                pow,
            } => CirqGate::PhasedXPow {
                phase_exponent: phase_exponent.clone(),
                pow: pow.scaled(factor),
            },
            _ => return None,
        })
    }

    /// Substitute symbol values by name.
    #[must_use]
    pub fn bind(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        let bind = |v: &Value| v.bind_named(&|name: &str| lookup(name)).simplify();
        let bind_pow = |p: &EigenPow| EigenPow {
            exponent: bind(&p.exponent),
            global_shift: p.global_shift,
        };
        match self {
            CirqGate::XPow(p) => CirqGate::XPow(bind_pow(p)),
            CirqGate::YPow(p) => CirqGate::YPow(bind_pow(p)),
            CirqGate::ZPow(p) => CirqGate::ZPow(bind_pow(p)),
            CirqGate::HPow(p) => CirqGate::HPow(bind_pow(p)),
            CirqGate::CZPow(p) => CirqGate::CZPow(bind_pow(p)),
            CirqGate::CXPow(p) => CirqGate::CXPow(bind_pow(p)),
            CirqGate::SwapPow(p) => CirqGate::SwapPow(bind_pow(p)),
            CirqGate::ISwapPow(p) => CirqGate::ISwapPow(bind_pow(p)),
            CirqGate::XXPow(p) => CirqGate::XXPow(bind_pow(p)),
            CirqGate::YYPow(p) => CirqGate::YYPow(bind_pow(p)),
            CirqGate::ZZPow(p) => CirqGate::ZZPow(bind_pow(p)),
            CirqGate::CCXPow(p) => CirqGate::CCXPow(bind_pow(p)),
            CirqGate::CCZPow(p) => CirqGate::CCZPow(bind_pow(p)),
            CirqGate::PhasedXPow {
                phase_exponent,
                pow,
            } => CirqGate::PhasedXPow {
                phase_exponent: bind(phase_exponent),
                pow: bind_pow(pow),
            },
            CirqGate::Controlled {
                sub_gate,
                num_controls,
            } => CirqGate::Controlled {
                sub_gate: Box::new(sub_gate.bind(lookup)),
                num_controls: *num_controls,
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for CirqGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CirqGate::Controlled { sub_gate, .. } => write!(f, "ControlledGate({sub_gate})"),
            CirqGate::Measurement { key, .. } => write!(f, "MeasurementGate('{key}')"),
            CirqGate::Depolarizing(p) => write!(f, "DepolarizingChannel(p={p})"),
            other => match other.eigen() {
                Some(pow) if pow.global_shift != 0.0 => write!(
                    f,
                    "{}(exponent={}, global_shift={})",
                    other.class().name(),
                    pow.exponent,
                    pow.global_shift
                ),
                Some(pow) => write!(f, "{}(exponent={})", other.class().name(), pow.exponent),
                None => f.write_str(other.class().name()),
            },
        }
    }
}

/// A gate applied to qubits, optionally conditioned on a measurement key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The gate.
    pub gate: CirqGate,
    /// Target qubits in operand order.
    pub qubits: Vec<Qid>,
    /// Measurement key the operation is classically controlled by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Operation {
    /// `gate.on(*qubits)`.
    pub fn new(gate: CirqGate, qubits: impl Into<Vec<Qid>>) -> ConvertResult<Self> {
        let qubits = qubits.into();
        if qubits.len() != gate.num_qubits() as usize {
            return Err(ConvertError::invalid(
                ProgramFormat::Cirq,
                format!(
                    "{gate} acts on {} qubits but was given {}",
                    gate.num_qubits(),
                    qubits.len()
                ),
            ));
        }
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(ConvertError::invalid(
                    ProgramFormat::Cirq,
                    format!("{gate} is applied to {q} twice"),
                ));
            }
        }
        Ok(Self {
            gate,
            qubits,
            condition: None,
        })
    }

    /// `op.with_classical_controls(key)`.
    #[must_use]
    pub fn with_condition(mut self, key: impl Into<String>) -> Self {
        self.condition = Some(key.into());
        self
    }

    fn measurement_key(&self) -> Option<&str> {
        match &self.gate {
            CirqGate::Measurement { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.gate, qubits.join(", "))?;
        if let Some(key) = &self.condition {
            write!(f, ".with_classical_controls('{key}')")?;
        }
        Ok(())
    }
}

/// Operations on disjoint qubits that happen at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    /// The moment's operations.
    pub operations: Vec<Operation>,
}

impl Moment {
    fn conflicts_with(&self, op: &Operation) -> bool {
        self.operations.iter().any(|other| {
            other.qubits.iter().any(|q| op.qubits.contains(q))
                || matches!(
                    (&op.condition, other.measurement_key()),
                    (Some(cond), Some(key)) if cond == key
                )
        })
    }
}

/// A Cirq `Circuit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Moments in time order.
    pub moments: Vec<Moment>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a circuit by appending each operation.
    pub fn from_ops(ops: impl IntoIterator<Item = Operation>) -> Self {
        let mut circuit = Self::new();
        for op in ops {
            circuit.append(op);
        }
        circuit
    }

    /// Append with Cirq's `EARLIEST` insertion strategy: the operation goes
    /// into the moment right after the last one it conflicts with.
    pub fn append(&mut self, op: Operation) {
        let slot = self
            .moments
            .iter()
            .rposition(|m| m.conflicts_with(&op))
            .map_or(0, |i| i + 1);
        if slot == self.moments.len() {
            self.moments.push(Moment::default());
        }
        self.moments[slot].operations.push(op);
    }

    /// Build and append `gate.on(*qubits)`.
    pub fn push(&mut self, gate: CirqGate, qubits: impl Into<Vec<Qid>>) -> ConvertResult<&mut Self> {
        self.append(Operation::new(gate, qubits)?);
        Ok(self)
    }

    /// All operations in moment order.
    pub fn all_operations(&self) -> impl Iterator<Item = &Operation> {
        self.moments.iter().flat_map(|m| m.operations.iter())
    }

    /// Every qubit the circuit touches, in Cirq's default (sorted) order.
    pub fn all_qubits(&self) -> Vec<Qid> {
        let mut qubits: Vec<Qid> = self
            .all_operations()
            .flat_map(|op| op.qubits.iter().cloned())
            .collect();
        qubits.sort();
        qubits.dedup();
        qubits
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.all_qubits().len()
    }

    /// Check if any operation carries a symbol.
    pub fn is_parameterized(&self) -> bool {
        self.all_operations().any(|op| op.gate.is_parameterized())
    }

    /// Substitute symbol values by name.
    #[must_use]
    pub fn bind(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        Self {
            moments: self
                .moments
                .iter()
                .map(|m| Moment {
                    operations: m
                        .operations
                        .iter()
                        .map(|op| Operation {
                            gate: op.gate.bind(lookup),
                            ..op.clone()
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, moment) in self.moments.iter().enumerate() {
            let ops: Vec<String> = moment.operations.iter().map(ToString::to_string).collect();
            writeln!(f, "moment {i}: {}", ops.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earliest_insertion() {
        let q = Qid::line_range(3);
        let mut circuit = Circuit::new();
        circuit
            .push(CirqGate::h(), [q[0].clone()])
            .unwrap()
            .push(CirqGate::x(), [q[2].clone()])
            .unwrap()
            .push(CirqGate::cnot(), [q[0].clone(), q[1].clone()])
            .unwrap()
            .push(CirqGate::z(), [q[2].clone()])
            .unwrap();
        assert_eq!(circuit.moments.len(), 2);
        assert_eq!(circuit.moments[0].operations.len(), 2);
        assert_eq!(circuit.moments[1].operations.len(), 2);
    }

    #[test]
    fn test_conditioned_op_follows_measurement() {
        let q = Qid::line_range(2);
        let mut circuit = Circuit::new();
        circuit.push(CirqGate::measure("m", 1), [q[0].clone()]).unwrap();
        circuit.append(
            Operation::new(CirqGate::x(), [q[1].clone()])
                .unwrap()
                .with_condition("m"),
        );
        assert_eq!(circuit.moments.len(), 2);
    }

    #[test]
    fn test_all_qubits_sorted() {
        let mut circuit = Circuit::new();
        circuit
            .push(CirqGate::cnot(), [Qid::Line(6), Qid::Line(1)])
            .unwrap();
        assert_eq!(circuit.all_qubits(), vec![Qid::Line(1), Qid::Line(6)]);
    }

    #[test]
    fn test_arity_is_checked() {
        assert!(Operation::new(CirqGate::cnot(), [Qid::Line(0)]).is_err());
        assert!(Operation::new(CirqGate::cnot(), [Qid::Line(0), Qid::Line(0)]).is_err());
    }

    #[test]
    fn test_pow_and_rx() {
        let s_dag = CirqGate::s().pow(-1.0).unwrap();
        assert_eq!(s_dag, CirqGate::ZPow(EigenPow::new(-0.5)));
        let rx = CirqGate::rx(std::f64::consts::FRAC_PI_2);
        let pow = rx.eigen().unwrap();
        assert!((pow.exponent.as_f64().unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(pow.global_shift, -0.5);
        assert!(CirqGate::CSwap.pow(2.0).is_none());
    }

    #[test]
    fn test_bind_symbolic_exponent() {
        let gate = CirqGate::rx(Value::symbol("theta"));
        assert!(gate.is_parameterized());
        let bound = gate.bind(&|name| (name == "theta").then_some(std::f64::consts::PI));
        assert!(!bound.is_parameterized());
        let exponent = bound.eigen().unwrap().exponent.as_f64().unwrap();
        assert!((exponent - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut circuit = Circuit::new();
        circuit
            .push(CirqGate::rz(Value::symbol("phi")), [Qid::grid(0, 1)])
            .unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
    }
}
