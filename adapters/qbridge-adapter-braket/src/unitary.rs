//! Native Braket semantics.

use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

use qbridge_convert::{
    ConvertError, ConvertResult, MetadataScan, NativeProgram, ProgramFormat, ProgramMetadata,
};
use qbridge_unitary::matrix::{c, controlled, diagonal, from_unitary, identity};
use qbridge_unitary::{Matrix, UnitaryBuilder, UnitaryError, gates};

use crate::model::{BraketGate, Circuit, Operator, Value};

fn eval(gate: &BraketGate, value: &Value) -> ConvertResult<f64> {
    value.as_f64().ok_or_else(|| {
        UnitaryError::UnboundParameter {
            gate: gate.to_string(),
            parameter: value
                .symbols()
                .first()
                .map_or_else(|| value.to_string(), |p| p.name.clone()),
        }
        .into()
    })
}

fn phase_on(index: usize, theta: f64) -> Matrix {
    let mut entries = vec![c(1.0, 0.0); 4];
    entries[index] = Complex64::from_polar(1.0, theta);
    diagonal(&entries)
}

fn pswap(theta: f64) -> Matrix {
    let e = Complex64::from_polar(1.0, theta);
    let mut m = Matrix::zeros((4, 4));
    m[[0, 0]] = c(1.0, 0.0);
    m[[1, 2]] = e;
    m[[2, 1]] = e;
    m[[3, 3]] = c(1.0, 0.0);
    m
}

fn xy(theta: f64) -> Matrix {
    let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    let mut m = identity(4);
    m[[1, 1]] = c(cos, 0.0);
    m[[1, 2]] = c(0.0, sin);
    m[[2, 1]] = c(0.0, sin);
    m[[2, 2]] = c(cos, 0.0);
    m
}

fn ecr() -> Matrix {
    let s = FRAC_1_SQRT_2;
    let rows = [
        [c(0.0, 0.0), c(0.0, 0.0), c(s, 0.0), c(0.0, s)],
        [c(0.0, 0.0), c(0.0, 0.0), c(0.0, s), c(s, 0.0)],
        [c(s, 0.0), c(0.0, -s), c(0.0, 0.0), c(0.0, 0.0)],
        [c(0.0, -s), c(s, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
    ];
    Matrix::from_shape_fn((4, 4), |(i, j)| rows[i][j])
}

/// Unitary of one Braket gate, big-endian over its targets.
pub fn gate_unitary(gate: &BraketGate) -> ConvertResult<Matrix> {
    let angle = |v: &Value| eval(gate, v);
    Ok(match gate {
        BraketGate::I => gates::id(),
        BraketGate::X => gates::x(),
        BraketGate::Y => gates::y(),
        BraketGate::Z => gates::z(),
        BraketGate::H => gates::h(),
        BraketGate::S => gates::s(),
        BraketGate::Si => gates::sdg(),
        BraketGate::T => gates::t(),
        BraketGate::Ti => gates::tdg(),
        BraketGate::V => gates::sx(),
        BraketGate::Vi => gates::sxdg(),
        BraketGate::Rx(v) => gates::rx(angle(v)?),
        BraketGate::Ry(v) => gates::ry(angle(v)?),
        BraketGate::Rz(v) => gates::rz(angle(v)?),
        BraketGate::PhaseShift(v) => gates::p(angle(v)?),
        BraketGate::CNot => gates::cx(),
        BraketGate::CY => gates::cy(),
        BraketGate::CZ => gates::cz(),
        BraketGate::CV => controlled(&gates::sx()),
        BraketGate::Swap => gates::swap(),
        BraketGate::ISwap => gates::iswap(),
        BraketGate::PSwap(v) => pswap(angle(v)?),
        BraketGate::XY(v) => xy(angle(v)?),
        BraketGate::CPhaseShift(v) => gates::cp(angle(v)?),
        BraketGate::CPhaseShift00(v) => phase_on(0, angle(v)?),
        BraketGate::CPhaseShift01(v) => phase_on(1, angle(v)?),
        BraketGate::CPhaseShift10(v) => phase_on(2, angle(v)?),
        BraketGate::XX(v) => gates::rxx(angle(v)?),
        BraketGate::YY(v) => gates::ryy(angle(v)?),
        BraketGate::ZZ(v) => gates::rzz(angle(v)?),
        BraketGate::ECR => ecr(),
        BraketGate::CCNot => gates::ccx(),
        BraketGate::CSwap => gates::cswap(),
        BraketGate::Unitary { matrix, .. } => from_unitary(matrix),
    })
}

/// Position of each qubit label in the ascending qubit order.
fn wires(qubits: &[u32], target: &[u32]) -> Vec<usize> {
    target
        .iter()
        .filter_map(|q| qubits.binary_search(q).ok())
        .collect()
}

impl NativeProgram for Circuit {
    const FORMAT: ProgramFormat = ProgramFormat::Braket;

    fn metadata(&self) -> ConvertResult<ProgramMetadata> {
        let qubits = self.qubits();
        let mut scan = MetadataScan::new(qubits.len());
        let mut measured = 0;
        for inst in &self.instructions {
            match &inst.operator {
                Operator::Gate(g) => scan.gate(&wires(&qubits, &inst.target), g.angle()),
                Operator::Measure => measured += inst.target.len(),
                Operator::Noise(_) => {}
            }
        }
        scan.clbits(measured);
        Ok(scan.finish())
    }

    fn unitary(&self) -> ConvertResult<Matrix> {
        let qubits = self.qubits();
        let mut builder = UnitaryBuilder::new(qubits.len())?;
        for inst in &self.instructions {
            match &inst.operator {
                Operator::Gate(g) => builder.apply(&gate_unitary(g)?, &wires(&qubits, &inst.target))?,
                Operator::Measure => {}
                Operator::Noise(n) => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Braket,
                        n.to_string(),
                        "noise channel has no unitary",
                    ));
                }
            }
        }
        Ok(builder.finish())
    }

    fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        self.make_bound_circuit(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Noise;
    use qbridge_unitary::matrix::kron;
    use qbridge_unitary::{DEFAULT_ATOL, allclose, equivalent};

    #[test]
    fn test_all_gates_are_unitary() {
        let gates = [
            BraketGate::V,
            BraketGate::CV,
            BraketGate::ECR,
            BraketGate::PSwap(0.7.into()),
            BraketGate::XY((-1.2).into()),
            BraketGate::CPhaseShift01(0.4.into()),
        ];
        for gate in gates {
            let m = gate_unitary(&gate).unwrap();
            assert!(qbridge_unitary::matrix::is_unitary(&m, 1e-10), "{gate}");
        }
    }

    #[test]
    fn test_xy_at_pi_is_iswap() {
        let m = gate_unitary(&BraketGate::XY(std::f64::consts::PI.into())).unwrap();
        assert!(allclose(&m, &gates::iswap(), DEFAULT_ATOL));
    }

    #[test]
    fn test_bell_unitary() {
        let mut circuit = Circuit::new();
        circuit.h(1).unwrap().cnot(1, 6).unwrap().measure([1, 6]).unwrap();
        let expected = gates::cx().dot(&kron(&gates::h(), &gates::id()));
        assert!(equivalent(&circuit.unitary().unwrap(), &expected, DEFAULT_ATOL));
    }

    #[test]
    fn test_noise_has_no_unitary() {
        let mut circuit = Circuit::new();
        circuit.h(0).unwrap().noise(Noise::BitFlip(0.1), 0).unwrap();
        assert!(circuit.unitary().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_metadata() {
        let mut circuit = Circuit::new();
        circuit
            .h(0)
            .unwrap()
            .rx(2, Value::symbol("theta"))
            .unwrap()
            .cnot(0, 2)
            .unwrap()
            .measure([0, 2])
            .unwrap();
        let meta = circuit.metadata().unwrap();
        assert_eq!(meta.num_qubits, 2);
        assert_eq!(meta.depth, 2);
        assert_eq!(meta.num_clbits, 2);
        assert_eq!(meta.param_names(), vec!["theta"]);
    }
}
