//! Qiskit → target gate sweep.
//!
//! Every Qiskit gate is placed alone in a circuit, converted, and the
//! converted program's unitary is compared with the source's. Each case
//! reports its own outcome; nothing is swallowed.

use std::f64::consts::PI;

use anyhow::Context;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use qbridge::{Program, ProgramFormat, circuits_allclose, convert};
use qbridge_adapter_qiskit::{ParameterValue, QiskitGate, QuantumCircuit};
use qbridge_unitary::{gates, matrix::to_unitary};

/// One source circuit of the sweep.
#[derive(Debug, Clone)]
pub struct GateCase {
    pub name: String,
    pub circuit: QuantumCircuit,
}

/// How one case went.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Converted and equivalent up to global phase.
    Passed,
    /// Converted, but the unitaries differ.
    Mismatch,
    /// Conversion or the unitary oracle returned an error.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CaseReport {
    pub name: String,
    pub outcome: Outcome,
}

/// Results of a sweep against one target.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub target: ProgramFormat,
    pub cases: Vec<CaseReport>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn passed(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.outcome == Outcome::Passed)
            .count()
    }

    /// Fraction of cases that passed, in `[0, 1]`.
    pub fn pass_rate(&self) -> f64 {
        if self.cases.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| c.outcome != Outcome::Passed)
    }
}

/// Every Qiskit gate, with angles drawn from `angle`.
pub fn catalog(angle: &mut dyn FnMut() -> f64) -> anyhow::Result<Vec<QiskitGate>> {
    let mut a = || ParameterValue::constant(angle());
    let unitary = to_unitary(&gates::iswap().dot(&gates::rxx(PI / 5.0)))
        .context("building the sweep's unitary gate")?;
    Ok(vec![
        QiskitGate::I,
        QiskitGate::X,
        QiskitGate::Y,
        QiskitGate::Z,
        QiskitGate::H,
        QiskitGate::S,
        QiskitGate::Sdg,
        QiskitGate::T,
        QiskitGate::Tdg,
        QiskitGate::SX,
        QiskitGate::SXdg,
        QiskitGate::RX(a()),
        QiskitGate::RY(a()),
        QiskitGate::RZ(a()),
        QiskitGate::P(a()),
        QiskitGate::U1(a()),
        QiskitGate::U2(a(), a()),
        QiskitGate::U(a(), a(), a()),
        QiskitGate::R(a(), a()),
        QiskitGate::CX,
        QiskitGate::CY,
        QiskitGate::CZ,
        QiskitGate::CH,
        QiskitGate::CP(a()),
        QiskitGate::CRX(a()),
        QiskitGate::CRY(a()),
        QiskitGate::CRZ(a()),
        QiskitGate::Swap,
        QiskitGate::ISwap,
        QiskitGate::DCX,
        QiskitGate::ECR,
        QiskitGate::RXX(a()),
        QiskitGate::RYY(a()),
        QiskitGate::RZZ(a()),
        QiskitGate::RZX(a()),
        QiskitGate::CCX,
        QiskitGate::CCZ,
        QiskitGate::CSwap,
        QiskitGate::Unitary(unitary),
    ])
}

/// One single-gate circuit per catalog entry.
pub fn gate_cases(angle: &mut dyn FnMut() -> f64) -> anyhow::Result<Vec<GateCase>> {
    catalog(angle)?
        .into_iter()
        .map(|gate| {
            let n = gate.num_qubits();
            let name = gate.name().to_string();
            let qubits: Vec<u32> = (0..n).collect();
            let mut circuit = QuantumCircuit::new(n, 0);
            circuit
                .gate(gate, &qubits)
                .with_context(|| format!("building the {name} case"))?;
            Ok(GateCase { name, circuit })
        })
        .collect()
}

/// `count` random three-qubit circuits of up to `max_gates` catalog gates
/// with random bound angles.
pub fn random_cases(
    rng: &mut impl Rng,
    count: usize,
    max_gates: usize,
) -> anyhow::Result<Vec<GateCase>> {
    const WIDTH: u32 = 3;
    let mut cases = Vec::with_capacity(count);
    for i in 0..count {
        let mut circuit = QuantumCircuit::new(WIDTH, 0);
        let mut names = Vec::new();
        for _ in 0..rng.gen_range(1..=max_gates.max(1)) {
            let mut draw = || rng.gen_range(-PI..PI);
            let pool = catalog(&mut draw)?;
            let Some(gate) = pool.choose(rng).cloned() else {
                continue;
            };
            let mut wires: Vec<u32> = (0..WIDTH).collect();
            wires.shuffle(rng);
            wires.truncate(gate.num_qubits() as usize);
            names.push(gate.name());
            circuit.gate(gate, &wires)?;
        }
        cases.push(GateCase {
            name: format!("random#{i} [{}]", names.join(" ")),
            circuit,
        });
    }
    Ok(cases)
}

/// Convert one case and compare unitaries.
pub fn run_case(case: &GateCase, target: ProgramFormat) -> Outcome {
    let source = Program::from(case.circuit.clone());
    let converted = match convert(&source, target) {
        Ok(p) => p,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    match circuits_allclose(&source, &converted, false) {
        Ok(true) => Outcome::Passed,
        Ok(false) => Outcome::Mismatch,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

/// Run every case against `target`.
pub fn sweep(cases: &[GateCase], target: ProgramFormat) -> SweepReport {
    let cases = cases
        .iter()
        .map(|case| {
            let outcome = run_case(case, target);
            debug!("{} -> {}: {:?}", case.name, target, outcome);
            CaseReport {
                name: case.name.clone(),
                outcome,
            }
        })
        .collect();
    SweepReport { target, cases }
}
