//! Native Qiskit semantics.
//!
//! Matrices here are big-endian over operand order, like every other
//! adapter. The conversion from Qiskit's little-endian `UnitaryGate`
//! happens in [`gate_unitary`].

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

use qbridge_convert::{
    ConvertError, ConvertResult, MetadataScan, NativeProgram, ProgramFormat, ProgramMetadata,
};
use qbridge_unitary::matrix::{c, controlled, diagonal, from_unitary, involution_rotation, kron};
use qbridge_unitary::{Matrix, UnitaryBuilder, UnitaryError, gates};

use crate::model::{Operation, ParameterValue, QiskitGate, QuantumCircuit};

fn eval(gate: &QiskitGate, value: &ParameterValue) -> ConvertResult<f64> {
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

fn ecr() -> Matrix {
    let s = FRAC_1_SQRT_2;
    let z = c(0.0, 0.0);
    let rows = [
        [z, z, c(s, 0.0), c(0.0, s)],
        [z, z, c(0.0, s), c(s, 0.0)],
        [c(s, 0.0), c(0.0, -s), z, z],
        [c(0.0, -s), c(s, 0.0), z, z],
    ];
    Matrix::from_shape_fn((4, 4), |(i, j)| rows[i][j])
}

/// Unitary of one Qiskit gate, big-endian over its operands.
pub fn gate_unitary(gate: &QiskitGate) -> ConvertResult<Matrix> {
    let v = |p: &ParameterValue| eval(gate, p);
    Ok(match gate {
        QiskitGate::I => gates::id(),
        QiskitGate::X => gates::x(),
        QiskitGate::Y => gates::y(),
        QiskitGate::Z => gates::z(),
        QiskitGate::H => gates::h(),
        QiskitGate::S => gates::s(),
        QiskitGate::Sdg => gates::sdg(),
        QiskitGate::T => gates::t(),
        QiskitGate::Tdg => gates::tdg(),
        QiskitGate::SX => gates::sx(),
        QiskitGate::SXdg => gates::sxdg(),
        QiskitGate::RX(a) => gates::rx(v(a)?),
        QiskitGate::RY(a) => gates::ry(v(a)?),
        QiskitGate::RZ(a) => gates::rz(v(a)?),
        QiskitGate::P(a) | QiskitGate::U1(a) => gates::p(v(a)?),
        QiskitGate::U2(phi, lambda) => gates::u3(FRAC_PI_2, v(phi)?, v(lambda)?),
        QiskitGate::U(theta, phi, lambda) => gates::u3(v(theta)?, v(phi)?, v(lambda)?),
        QiskitGate::R(theta, phi) => {
            let phi = v(phi)?;
            gates::u3(v(theta)?, phi - FRAC_PI_2, FRAC_PI_2 - phi)
        }
        QiskitGate::CX => gates::cx(),
        QiskitGate::CY => gates::cy(),
        QiskitGate::CZ => gates::cz(),
        QiskitGate::CH => controlled(&gates::h()),
        QiskitGate::CP(a) => gates::cp(v(a)?),
        QiskitGate::CRX(a) => controlled(&gates::rx(v(a)?)),
        QiskitGate::CRY(a) => controlled(&gates::ry(v(a)?)),
        QiskitGate::CRZ(a) => controlled(&gates::rz(v(a)?)),
        QiskitGate::Swap => gates::swap(),
        QiskitGate::ISwap => gates::iswap(),
        QiskitGate::DCX => {
            let cx01 = gates::cx();
            let cx10 = gates::swap().dot(&cx01).dot(&gates::swap());
            cx10.dot(&cx01)
        }
        QiskitGate::ECR => ecr(),
        QiskitGate::RXX(a) => gates::rxx(v(a)?),
        QiskitGate::RYY(a) => gates::ryy(v(a)?),
        QiskitGate::RZZ(a) => gates::rzz(v(a)?),
        QiskitGate::RZX(a) => involution_rotation(&kron(&gates::z(), &gates::x()), v(a)?),
        QiskitGate::CCX => gates::ccx(),
        QiskitGate::CCZ => {
            let mut entries = vec![c(1.0, 0.0); 8];
            entries[7] = c(-1.0, 0.0);
            diagonal(&entries)
        }
        QiskitGate::CSwap => gates::cswap(),
        QiskitGate::Unitary(m) => from_unitary(&m.reverse_qubit_order()),
    })
}

impl NativeProgram for QuantumCircuit {
    const FORMAT: ProgramFormat = ProgramFormat::Qiskit;

    fn metadata(&self) -> ConvertResult<ProgramMetadata> {
        let mut scan = MetadataScan::new(self.num_qubits() as usize);
        for inst in &self.data {
            if let Operation::Gate(g) = &inst.operation {
                let wires: Vec<usize> = inst.qubits.iter().filter_map(|q| self.find_qubit(q)).collect();
                scan.gate(&wires, g.params());
            }
        }
        scan.clbits(self.num_clbits() as usize);
        Ok(scan.finish())
    }

    fn unitary(&self) -> ConvertResult<Matrix> {
        let mut builder = UnitaryBuilder::new(self.num_qubits() as usize)?;
        for inst in &self.data {
            let Operation::Gate(g) = &inst.operation else {
                match &inst.operation {
                    Operation::Reset => {
                        return Err(ConvertError::unsupported(
                            ProgramFormat::Qiskit,
                            inst.to_string(),
                            "reset has no unitary",
                        ));
                    }
                    _ => continue,
                }
            };
            if inst.condition.is_some() {
                return Err(ConvertError::unsupported(
                    ProgramFormat::Qiskit,
                    inst.to_string(),
                    "classically controlled gate has no fixed unitary",
                ));
            }
            let wires: Vec<usize> = inst.qubits.iter().filter_map(|q| self.find_qubit(q)).collect();
            builder.apply(&gate_unitary(g)?, &wires)?;
        }
        let mut u = builder.finish();
        if self.global_phase != 0.0 {
            let phase = Complex64::from_polar(1.0, self.global_phase);
            u.mapv_inplace(|z| z * phase);
        }
        Ok(u)
    }

    fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        self.assign_parameters(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Parameter;
    use qbridge_ir::UnitaryMatrix;
    use qbridge_unitary::matrix::to_unitary;
    use qbridge_unitary::{DEFAULT_ATOL, allclose, equivalent};

    fn u(gate: QiskitGate) -> Matrix {
        gate_unitary(&gate).unwrap()
    }

    #[test]
    fn test_reparameterized_gates() {
        let (theta, phi, lambda) = (0.3, -0.7, 1.9);
        assert!(allclose(&u(QiskitGate::U1(lambda.into())), &gates::p(lambda), DEFAULT_ATOL));
        assert!(allclose(
            &u(QiskitGate::U2(phi.into(), lambda.into())),
            &gates::u3(FRAC_PI_2, phi, lambda),
            DEFAULT_ATOL
        ));
        // R(θ, 0) is Rx(θ), R(θ, π/2) is Ry(θ).
        assert!(equivalent(&u(QiskitGate::R(theta.into(), 0.0.into())), &gates::rx(theta), DEFAULT_ATOL));
        assert!(equivalent(
            &u(QiskitGate::R(theta.into(), FRAC_PI_2.into())),
            &gates::ry(theta),
            DEFAULT_ATOL
        ));
    }

    #[test]
    fn test_unitary_gate_is_little_endian() {
        // CX with control on the second listed qubit, in Qiskit's ordering.
        let little = UnitaryMatrix::from_rows(vec![
            vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
        ])
        .unwrap();
        let big = u(QiskitGate::Unitary(little));
        let cx10 = gates::swap().dot(&gates::cx()).dot(&gates::swap());
        assert!(allclose(&big, &cx10, DEFAULT_ATOL));
        assert!(to_unitary(&big).is_ok());
    }

    #[test]
    fn test_rzx_and_dcx() {
        let rzx = u(QiskitGate::RZX(0.6.into()));
        assert!(qbridge_unitary::matrix::is_unitary(&rzx, 1e-10));
        let dcx = u(QiskitGate::DCX);
        assert!(allclose(&dcx.dot(&dcx).dot(&dcx), &qbridge_unitary::matrix::identity(4), DEFAULT_ATOL));
    }

    #[test]
    fn test_reset_has_no_unitary() {
        let mut circuit = QuantumCircuit::new(1, 0);
        circuit.h(0).unwrap().reset(0).unwrap();
        let err = circuit.unitary().unwrap_err();
        assert!(err.to_string().contains("reset"));
    }

    #[test]
    fn test_metadata_counts_declared_qubits() {
        let theta = Parameter::new("theta");
        let mut circuit = QuantumCircuit::new(3, 2);
        circuit
            .h(0)
            .unwrap()
            .barrier()
            .unwrap()
            .rx(ParameterValue::symbol(theta), 0)
            .unwrap()
            .measure(0, 0)
            .unwrap();
        let meta = circuit.metadata().unwrap();
        assert_eq!(meta.num_qubits, 3);
        assert_eq!(meta.num_clbits, 2);
        assert_eq!(meta.depth, 2);
        assert_eq!(meta.param_names(), vec!["theta"]);
    }

    #[test]
    fn test_global_phase_is_applied() {
        let mut circuit = QuantumCircuit::new(1, 0);
        circuit.x(0).unwrap();
        circuit.global_phase = std::f64::consts::PI;
        let phased = circuit.unitary().unwrap();
        assert!(equivalent(&phased, &gates::x(), DEFAULT_ATOL));
        assert!(!qbridge_unitary::equivalent_strict(&phased, &gates::x(), DEFAULT_ATOL));
    }
}
