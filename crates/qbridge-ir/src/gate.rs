//! Canonical gate vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::matrix::UnitaryMatrix;
use crate::parameter::{Angle, ParamId};
use crate::qubit::QubitId;

/// Kind of a canonical gate.
///
/// The vocabulary is flat on purpose: importers map native gate classes onto
/// it and exporters map it back out through their mapping tables, so no
/// native class hierarchy leaks into the conversion core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateKind {
    // Single-qubit, fixed
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
    // Single-qubit, parametric
    Rx,
    Ry,
    Rz,
    /// `diag(1, e^{iλ})`
    Phase,
    /// OpenQASM `U(θ, φ, λ)`
    U3,
    // Two-qubit
    CX,
    CY,
    CZ,
    /// `diag(1, 1, 1, e^{iλ})`
    CPhase,
    Swap,
    ISwap,
    Rxx,
    Ryy,
    Rzz,
    // Three-qubit
    CCX,
    CSwap,
    /// Arbitrary unitary carried as a dense matrix.
    RawUnitary,
}

impl GateKind {
    /// Every kind, in declaration order.
    pub const ALL: [GateKind; 28] = [
        GateKind::I,
        GateKind::X,
        GateKind::Y,
        GateKind::Z,
        GateKind::H,
        GateKind::S,
        GateKind::Sdg,
        GateKind::T,
        GateKind::Tdg,
        GateKind::SX,
        GateKind::SXdg,
        GateKind::Rx,
        GateKind::Ry,
        GateKind::Rz,
        GateKind::Phase,
        GateKind::U3,
        GateKind::CX,
        GateKind::CY,
        GateKind::CZ,
        GateKind::CPhase,
        GateKind::Swap,
        GateKind::ISwap,
        GateKind::Rxx,
        GateKind::Ryy,
        GateKind::Rzz,
        GateKind::CCX,
        GateKind::CSwap,
        GateKind::RawUnitary,
    ];

    /// Get the gate name.
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::I => "id",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::H => "h",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::SX => "sx",
            GateKind::SXdg => "sxdg",
            GateKind::Rx => "rx",
            GateKind::Ry => "ry",
            GateKind::Rz => "rz",
            GateKind::Phase => "p",
            GateKind::U3 => "u3",
            GateKind::CX => "cx",
            GateKind::CY => "cy",
            GateKind::CZ => "cz",
            GateKind::CPhase => "cp",
            GateKind::Swap => "swap",
            GateKind::ISwap => "iswap",
            GateKind::Rxx => "rxx",
            GateKind::Ryy => "ryy",
            GateKind::Rzz => "rzz",
            GateKind::CCX => "ccx",
            GateKind::CSwap => "cswap",
            GateKind::RawUnitary => "unitary",
        }
    }

    /// Fixed arity of the kind. `None` for [`GateKind::RawUnitary`], whose
    /// arity follows from its matrix.
    pub fn arity(&self) -> Option<u32> {
        match self {
            GateKind::I
            | GateKind::X
            | GateKind::Y
            | GateKind::Z
            | GateKind::H
            | GateKind::S
            | GateKind::Sdg
            | GateKind::T
            | GateKind::Tdg
            | GateKind::SX
            | GateKind::SXdg
            | GateKind::Rx
            | GateKind::Ry
            | GateKind::Rz
            | GateKind::Phase
            | GateKind::U3 => Some(1),
            GateKind::CX
            | GateKind::CY
            | GateKind::CZ
            | GateKind::CPhase
            | GateKind::Swap
            | GateKind::ISwap
            | GateKind::Rxx
            | GateKind::Ryy
            | GateKind::Rzz => Some(2),
            GateKind::CCX | GateKind::CSwap => Some(3),
            GateKind::RawUnitary => None,
        }
    }

    /// Number of angle arguments the kind takes.
    pub fn num_params(&self) -> usize {
        match self {
            GateKind::Rx
            | GateKind::Ry
            | GateKind::Rz
            | GateKind::Phase
            | GateKind::CPhase
            | GateKind::Rxx
            | GateKind::Ryy
            | GateKind::Rzz => 1,
            GateKind::U3 => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One operation of a canonical circuit.
///
/// Constructed only through [`CanonicalGate::new`] and
/// [`CanonicalGate::raw_unitary`], which check arity, argument count and
/// qubit distinctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCanonicalGate")]
pub struct CanonicalGate {
    kind: GateKind,
    qubits: Vec<QubitId>,
    args: Vec<Angle>,
    matrix: Option<UnitaryMatrix>,
}

/// Unchecked wire form, routed through the validating constructors.
#[derive(Deserialize)]
struct RawCanonicalGate {
    kind: GateKind,
    qubits: Vec<QubitId>,
    args: Vec<Angle>,
    matrix: Option<UnitaryMatrix>,
}

impl TryFrom<RawCanonicalGate> for CanonicalGate {
    type Error = IrError;

    fn try_from(raw: RawCanonicalGate) -> IrResult<Self> {
        match (raw.kind, raw.matrix) {
            (GateKind::RawUnitary, Some(matrix)) => {
                if !raw.args.is_empty() {
                    return Err(IrError::ParameterCountMismatch {
                        gate_name: GateKind::RawUnitary.name().to_string(),
                        expected: 0,
                        got: raw.args.len(),
                    });
                }
                Self::raw_unitary(matrix, raw.qubits)
            }
            (GateKind::RawUnitary, None) => Err(IrError::MissingMatrix),
            (kind, Some(_)) => Err(IrError::InvalidMatrix(format!(
                "'{kind}' does not carry a matrix"
            ))),
            (kind, None) => Self::new(kind, raw.qubits, raw.args),
        }
    }
}

impl CanonicalGate {
    /// Create a gate of a fixed-vocabulary kind.
    pub fn new(kind: GateKind, qubits: impl Into<Vec<QubitId>>, args: Vec<Angle>) -> IrResult<Self> {
        let qubits = qubits.into();
        let arity = kind.arity().ok_or(IrError::MissingMatrix)?;
        check_qubits(kind.name(), arity, &qubits)?;
        if args.len() != kind.num_params() {
            return Err(IrError::ParameterCountMismatch {
                gate_name: kind.name().to_string(),
                expected: kind.num_params(),
                got: args.len(),
            });
        }
        Ok(Self {
            kind,
            qubits,
            args,
            matrix: None,
        })
    }

    /// Create a gate from a dense matrix.
    pub fn raw_unitary(matrix: UnitaryMatrix, qubits: impl Into<Vec<QubitId>>) -> IrResult<Self> {
        let qubits = qubits.into();
        check_qubits(GateKind::RawUnitary.name(), matrix.num_qubits(), &qubits)?;
        Ok(Self {
            kind: GateKind::RawUnitary,
            qubits,
            args: vec![],
            matrix: Some(matrix),
        })
    }

    /// Get the gate kind.
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Qubits the gate acts on, in operand order.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Angle arguments.
    pub fn args(&self) -> &[Angle] {
        &self.args
    }

    /// The matrix of a `RawUnitary` gate.
    pub fn matrix(&self) -> Option<&UnitaryMatrix> {
        self.matrix.as_ref()
    }

    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> u32 {
        self.qubits.len() as u32
    }

    /// Distinct free parameters referenced by the arguments, first-seen.
    pub fn params(&self) -> Vec<&ParamId> {
        let mut out: Vec<&ParamId> = Vec::new();
        for arg in &self.args {
            for p in arg.symbols() {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Check if any argument is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.args.iter().any(Angle::is_symbolic)
    }

    /// Bind parameters, leaving unknown ones symbolic.
    #[must_use]
    pub fn bind(&self, lookup: &impl Fn(&ParamId) -> Option<f64>) -> Self {
        Self {
            kind: self.kind,
            qubits: self.qubits.clone(),
            args: self
                .args
                .iter()
                .map(|a| a.bind_with(lookup).simplify())
                .collect(),
            matrix: self.matrix.clone(),
        }
    }
}

impl fmt::Display for CanonicalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "({})", args.join(", "))?;
        }
        for q in &self.qubits {
            write!(f, " {q}")?;
        }
        Ok(())
    }
}

fn check_qubits(gate_name: &str, arity: u32, qubits: &[QubitId]) -> IrResult<()> {
    if qubits.len() != arity as usize {
        return Err(IrError::QubitCountMismatch {
            gate_name: gate_name.to_string(),
            expected: arity,
            got: qubits.len() as u32,
        });
    }
    for (i, q) in qubits.iter().enumerate() {
        if qubits[..i].contains(q) {
            return Err(IrError::DuplicateQubit {
                qubit: *q,
                gate_name: Some(gate_name.to_string()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterExpression;

    #[test]
    fn test_every_kind_listed_once() {
        let mut kinds = GateKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), GateKind::ALL.len());
    }

    #[test]
    fn test_arity_mismatch() {
        let err = CanonicalGate::new(GateKind::CX, vec![QubitId(0)], vec![]).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_qubit() {
        let err =
            CanonicalGate::new(GateKind::Swap, vec![QubitId(1), QubitId(1)], vec![]).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_param_count() {
        let err = CanonicalGate::new(GateKind::Rx, vec![QubitId(0)], vec![]).unwrap_err();
        assert!(matches!(err, IrError::ParameterCountMismatch { expected: 1, .. }));
    }

    #[test]
    fn test_raw_unitary_requires_matrix_constructor() {
        let err = CanonicalGate::new(GateKind::RawUnitary, vec![QubitId(0)], vec![]).unwrap_err();
        assert_eq!(err, IrError::MissingMatrix);
    }

    #[test]
    fn test_params_first_seen() {
        let a = ParamId::new(0, "a");
        let b = ParamId::new(1, "b");
        let gate = CanonicalGate::new(
            GateKind::U3,
            vec![QubitId(0)],
            vec![
                ParameterExpression::symbol(b.clone()),
                ParameterExpression::symbol(a.clone()),
                ParameterExpression::symbol(b.clone()),
            ],
        )
        .unwrap();
        assert_eq!(gate.params(), vec![&b, &a]);
        assert!(gate.is_parameterized());

        let bound = gate.bind(&|p| Some(f64::from(p.index)));
        assert!(!bound.is_parameterized());
        assert_eq!(bound.args()[0].as_f64(), Some(1.0));
    }

    #[test]
    fn test_display() {
        let gate = CanonicalGate::new(GateKind::CX, vec![QubitId(0), QubitId(2)], vec![]).unwrap();
        assert_eq!(gate.to_string(), "cx q0 q2");
    }

    #[test]
    fn test_deserialize_runs_constructor_checks() {
        let cx = CanonicalGate::new(GateKind::CX, vec![QubitId(0), QubitId(1)], vec![]).unwrap();
        let json = serde_json::to_string(&cx).unwrap();
        assert_eq!(serde_json::from_str::<CanonicalGate>(&json).unwrap(), cx);

        let missing_arg = r#"{"kind":"Rx","qubits":[0],"args":[],"matrix":null}"#;
        assert!(serde_json::from_str::<CanonicalGate>(missing_arg).is_err());
        let duplicate = r#"{"kind":"CX","qubits":[1,1],"args":[],"matrix":null}"#;
        assert!(serde_json::from_str::<CanonicalGate>(duplicate).is_err());
        let no_matrix = r#"{"kind":"RawUnitary","qubits":[0],"args":[],"matrix":null}"#;
        assert!(serde_json::from_str::<CanonicalGate>(no_matrix).is_err());

        let one = num_complex::Complex64::new(1.0, 0.0);
        let zero = num_complex::Complex64::new(0.0, 0.0);
        let id = UnitaryMatrix::new(2, vec![one, zero, zero, one]).unwrap();
        let raw = CanonicalGate::raw_unitary(id, vec![QubitId(0)]).unwrap();
        let json = serde_json::to_string(&raw).unwrap();
        assert_eq!(serde_json::from_str::<CanonicalGate>(&json).unwrap(), raw);
        let wide = json.replace("\"qubits\":[0]", "\"qubits\":[0,1]");
        assert!(serde_json::from_str::<CanonicalGate>(&wide).is_err());
        let relabelled = json.replace("RawUnitary", "H");
        assert!(serde_json::from_str::<CanonicalGate>(&relabelled).is_err());
    }
}
