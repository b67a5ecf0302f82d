//! Native Cirq semantics: gate unitaries and program metadata computed
//! directly from the Cirq model.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use std::f64::consts::PI;

use qbridge_convert::{
    ConvertError, ConvertResult, MetadataScan, NativeProgram, ProgramFormat, ProgramMetadata,
};
use qbridge_unitary::matrix::{
    c, controlled, diagonal, from_unitary, identity, involution_power, kron,
};
use qbridge_unitary::{Matrix, UnitaryBuilder, UnitaryError, gates};

use crate::model::{CirqGate, EigenPow, Qid, Value};

fn eval(gate: &CirqGate, value: &Value) -> ConvertResult<f64> {
    value.as_f64().ok_or_else(|| {
        UnitaryError::UnboundParameter {
            gate: gate.to_string(),
            parameter: value
                .symbols()
                .first()
                .map_or_else(|| value.to_string(), |s| s.name().to_string()),
        }
        .into()
    })
}

fn pow_of(gate: &CirqGate, base: &Matrix, pow: &EigenPow) -> ConvertResult<Matrix> {
    let t = eval(gate, &pow.exponent)?;
    Ok(involution_power(base, t, pow.global_shift))
}

/// `ISWAP**t`, which is not an involution power.
fn iswap_pow(t: f64, global_shift: f64) -> Matrix {
    let angle = PI * t / 2.0;
    let (cos, sin) = (angle.cos(), angle.sin());
    let phase = Complex64::from_polar(1.0, PI * t * global_shift);
    let mut m = identity(4);
    m[[1, 1]] = c(cos, 0.0);
    m[[1, 2]] = c(0.0, sin);
    m[[2, 1]] = c(0.0, sin);
    m[[2, 2]] = c(cos, 0.0);
    m.mapv_inplace(|v| v * phase);
    m
}

fn ccz() -> Matrix {
    let mut entries = vec![c(1.0, 0.0); 8];
    entries[7] = c(-1.0, 0.0);
    diagonal(&entries)
}

/// Unitary of one Cirq gate, big-endian over its qubits.
pub fn gate_unitary(gate: &CirqGate) -> ConvertResult<Matrix> {
    Ok(match gate {
        CirqGate::Identity(n) => identity(1 << n),
        CirqGate::XPow(p) => pow_of(gate, &gates::x(), p)?,
        CirqGate::YPow(p) => pow_of(gate, &gates::y(), p)?,
        CirqGate::ZPow(p) => pow_of(gate, &gates::z(), p)?,
        CirqGate::HPow(p) => pow_of(gate, &gates::h(), p)?,
        CirqGate::CZPow(p) => pow_of(gate, &gates::cz(), p)?,
        CirqGate::CXPow(p) => pow_of(gate, &gates::cx(), p)?,
        CirqGate::SwapPow(p) => pow_of(gate, &gates::swap(), p)?,
        CirqGate::ISwapPow(p) => iswap_pow(eval(gate, &p.exponent)?, p.global_shift),
        CirqGate::XXPow(p) => pow_of(gate, &kron(&gates::x(), &gates::x()), p)?,
        CirqGate::YYPow(p) => pow_of(gate, &kron(&gates::y(), &gates::y()), p)?,
        CirqGate::ZZPow(p) => pow_of(gate, &kron(&gates::z(), &gates::z()), p)?,
        CirqGate::CCXPow(p) => pow_of(gate, &gates::ccx(), p)?,
        CirqGate::CCZPow(p) => pow_of(gate, &ccz(), p)?,
        CirqGate::CSwap => gates::cswap(),
        CirqGate::PhasedXPow {
            phase_exponent,
            pow,
        } => {
            let p = eval(gate, phase_exponent)?;
            let z = gates::z();
            let x = pow_of(gate, &gates::x(), pow)?;
            involution_power(&z, p, 0.0)
                .dot(&x)
                .dot(&involution_power(&z, -p, 0.0))
        }
        CirqGate::Matrix(m) => from_unitary(m),
        CirqGate::Controlled {
            sub_gate,
            num_controls,
        } => {
            let mut m = gate_unitary(sub_gate)?;
            for _ in 0..*num_controls {
                m = controlled(&m);
            }
            m
        }
        CirqGate::Measurement { .. } | CirqGate::Reset | CirqGate::Depolarizing(_) => {
            return Err(ConvertError::unsupported(
                ProgramFormat::Cirq,
                gate.to_string(),
                "non-unitary operation has no matrix",
            ));
        }
    })
}

fn positions(qubits: &[Qid]) -> FxHashMap<Qid, usize> {
    qubits
        .iter()
        .enumerate()
        .map(|(i, q)| (q.clone(), i))
        .collect()
}

impl NativeProgram for crate::model::Circuit {
    const FORMAT: ProgramFormat = ProgramFormat::Cirq;

    fn metadata(&self) -> ConvertResult<ProgramMetadata> {
        let qubits = self.all_qubits();
        let index = positions(&qubits);
        let mut scan = MetadataScan::new(qubits.len());
        let mut clbits = 0;
        for op in self.all_operations() {
            if let CirqGate::Measurement { num_qubits, .. } = op.gate {
                clbits += num_qubits as usize;
                continue;
            }
            let wires: Vec<usize> = op.qubits.iter().filter_map(|q| index.get(q).copied()).collect();
            scan.gate(&wires, op.gate.values());
        }
        scan.clbits(clbits);
        Ok(scan.finish())
    }

    fn unitary(&self) -> ConvertResult<Matrix> {
        let qubits = self.all_qubits();
        let index = positions(&qubits);
        let mut builder = UnitaryBuilder::new(qubits.len())?;
        for op in self.all_operations() {
            if matches!(op.gate, CirqGate::Measurement { .. }) {
                continue;
            }
            if op.condition.is_some() {
                return Err(ConvertError::unsupported(
                    ProgramFormat::Cirq,
                    op.to_string(),
                    "classically controlled operation has no fixed unitary",
                ));
            }
            let wires: Vec<usize> = op.qubits.iter().filter_map(|q| index.get(q).copied()).collect();
            builder.apply(&gate_unitary(&op.gate)?, &wires)?;
        }
        Ok(builder.finish())
    }

    fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        self.bind(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Circuit;
    use qbridge_unitary::{DEFAULT_ATOL, allclose, equivalent};

    fn u(gate: CirqGate) -> Matrix {
        gate_unitary(&gate).unwrap()
    }

    #[test]
    fn test_named_gates() {
        assert!(allclose(&u(CirqGate::x()), &gates::x(), DEFAULT_ATOL));
        assert!(allclose(&u(CirqGate::h()), &gates::h(), DEFAULT_ATOL));
        assert!(allclose(&u(CirqGate::s()), &gates::s(), DEFAULT_ATOL));
        assert!(allclose(&u(CirqGate::t()), &gates::t(), DEFAULT_ATOL));
        assert!(allclose(&u(CirqGate::cnot()), &gates::cx(), DEFAULT_ATOL));
        assert!(allclose(&u(CirqGate::iswap()), &gates::iswap(), DEFAULT_ATOL));
        assert!(allclose(&u(CirqGate::toffoli()), &gates::ccx(), DEFAULT_ATOL));
        assert!(allclose(
            &u(CirqGate::x().pow(0.5).unwrap()),
            &gates::sx(),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_rotations_are_exact() {
        for theta in [0.2, -0.8, 2.5] {
            assert!(allclose(&u(CirqGate::rx(theta)), &gates::rx(theta), DEFAULT_ATOL));
            assert!(allclose(&u(CirqGate::ry(theta)), &gates::ry(theta), DEFAULT_ATOL));
            assert!(allclose(&u(CirqGate::rz(theta)), &gates::rz(theta), DEFAULT_ATOL));
        }
    }

    #[test]
    fn test_two_qubit_powers() {
        let t = -0.2;
        let xx = u(CirqGate::XXPow(EigenPow::new(t)));
        assert!(equivalent(&xx, &gates::rxx(PI * t), DEFAULT_ATOL));
        let cz = u(CirqGate::CZPow(EigenPow::new(2.0 / 7.0)));
        assert!(allclose(&cz, &gates::cp(2.0 * PI / 7.0), DEFAULT_ATOL));
    }

    #[test]
    fn test_controlled_y() {
        let cy = u(CirqGate::controlled(CirqGate::y()));
        assert!(allclose(&cy, &gates::cy(), DEFAULT_ATOL));
    }

    #[test]
    fn test_phased_x_reduces_to_x() {
        let gate = CirqGate::PhasedXPow {
            phase_exponent: Value::constant(0.0),
            pow: EigenPow::new(1.0),
        };
        assert!(allclose(&u(gate), &gates::x(), DEFAULT_ATOL));
    }

    #[test]
    fn test_unbound_symbol_is_rejected() {
        let err = gate_unitary(&CirqGate::rx(Value::symbol("theta"))).unwrap_err();
        assert!(err.to_string().contains("theta"));
    }

    #[test]
    fn test_circuit_unitary_uses_sorted_qubits() {
        let mut circuit = Circuit::new();
        circuit
            .push(CirqGate::h(), [Qid::Line(6)])
            .unwrap()
            .push(CirqGate::cnot(), [Qid::Line(6), Qid::Line(1)])
            .unwrap();
        // Line(1) is the most significant qubit, so the CNOT is reversed.
        let reversed_cx = gates::swap().dot(&gates::cx()).dot(&gates::swap());
        let expected = reversed_cx.dot(&kron(&gates::id(), &gates::h()));
        assert!(allclose(&circuit.unitary().unwrap(), &expected, DEFAULT_ATOL));
    }

    #[test]
    fn test_metadata_skips_measurements() {
        let q = Qid::line_range(2);
        let mut circuit = Circuit::new();
        circuit
            .push(CirqGate::h(), [q[0].clone()])
            .unwrap()
            .push(CirqGate::cnot(), [q[0].clone(), q[1].clone()])
            .unwrap()
            .push(CirqGate::rz(Value::symbol("phi")), [q[1].clone()])
            .unwrap()
            .push(CirqGate::measure("m", 2), q.clone())
            .unwrap();
        let meta = circuit.metadata().unwrap();
        assert_eq!(meta.num_qubits, 2);
        assert_eq!(meta.num_clbits, 2);
        assert_eq!(meta.depth, 3);
        assert_eq!(meta.param_names(), vec!["phi"]);
    }
}
