//! Native Quil semantics.

use num_complex::Complex64;

use qbridge_convert::{
    ConvertError, ConvertResult, MetadataScan, NativeProgram, ProgramFormat, ProgramMetadata,
};
use qbridge_unitary::matrix::{c, controlled, dagger, diagonal, from_unitary, identity};
use qbridge_unitary::{Matrix, UnitaryBuilder, UnitaryError, gates};

use crate::model::{GateApplication, Instruction, Program, QuilGate, Value};

fn eval(gate: &QuilGate, value: &Value) -> ConvertResult<f64> {
    value.as_f64().ok_or_else(|| {
        UnitaryError::UnboundParameter {
            gate: gate.name().to_string(),
            parameter: value
                .symbols()
                .first()
                .map_or_else(|| value.to_string(), ToString::to_string),
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

/// Unitary of one standard Quil gate.
///
/// Defined gates need their program; see [`application_unitary`].
pub fn gate_unitary(gate: &QuilGate) -> ConvertResult<Matrix> {
    let angle = |v: &Value| eval(gate, v);
    Ok(match gate {
        QuilGate::I => gates::id(),
        QuilGate::X => gates::x(),
        QuilGate::Y => gates::y(),
        QuilGate::Z => gates::z(),
        QuilGate::H => gates::h(),
        QuilGate::S => gates::s(),
        QuilGate::T => gates::t(),
        QuilGate::RX(v) => gates::rx(angle(v)?),
        QuilGate::RY(v) => gates::ry(angle(v)?),
        QuilGate::RZ(v) => gates::rz(angle(v)?),
        QuilGate::PHASE(v) => gates::p(angle(v)?),
        QuilGate::CNOT => gates::cx(),
        QuilGate::CZ => gates::cz(),
        QuilGate::SWAP => gates::swap(),
        QuilGate::ISWAP => gates::iswap(),
        QuilGate::CPHASE(v) => gates::cp(angle(v)?),
        QuilGate::CPHASE00(v) => phase_on(0, angle(v)?),
        QuilGate::CPHASE01(v) => phase_on(1, angle(v)?),
        QuilGate::CPHASE10(v) => phase_on(2, angle(v)?),
        QuilGate::PSWAP(v) => pswap(angle(v)?),
        QuilGate::XY(v) => xy(angle(v)?),
        QuilGate::CCNOT => gates::ccx(),
        QuilGate::CSWAP => gates::cswap(),
        QuilGate::Defined(name) => {
            return Err(ConvertError::invalid(
                ProgramFormat::Quil,
                format!("gate '{name}' needs its DEFGATE to be evaluated"),
            ));
        }
    })
}

/// Unitary of a gate application with its modifiers, big-endian over its
/// qubits.
pub fn application_unitary(app: &GateApplication, program: &Program) -> ConvertResult<Matrix> {
    let mut m = match &app.gate {
        QuilGate::Defined(name) => {
            let def = program.definition(name).ok_or_else(|| {
                ConvertError::invalid(ProgramFormat::Quil, format!("undefined gate '{name}'"))
            })?;
            let expected = def.matrix.num_qubits() as usize + app.num_controls();
            if app.qubits.len() != expected {
                return Err(ConvertError::invalid(
                    ProgramFormat::Quil,
                    format!("{app} needs {expected} qubits"),
                ));
            }
            from_unitary(&def.matrix)
        }
        gate => gate_unitary(gate)?,
    };
    if app.is_inverted() {
        m = dagger(&m);
    }
    for _ in 0..app.num_controls() {
        m = controlled(&m);
    }
    Ok(m)
}

/// Position of each qubit label in the ascending qubit order.
fn wires(qubits: &[u32], target: &[u32]) -> Vec<usize> {
    target
        .iter()
        .filter_map(|q| qubits.binary_search(q).ok())
        .collect()
}

impl NativeProgram for Program {
    const FORMAT: ProgramFormat = ProgramFormat::Quil;

    fn metadata(&self) -> ConvertResult<ProgramMetadata> {
        let qubits = self.qubits();
        let mut scan = MetadataScan::new(qubits.len());
        for app in self.gates() {
            scan.gate(&wires(&qubits, &app.qubits), app.gate.param());
        }
        scan.clbits(self.num_bits() as usize);
        Ok(scan.finish())
    }

    fn unitary(&self) -> ConvertResult<Matrix> {
        let qubits = self.qubits();
        let mut builder = UnitaryBuilder::new(qubits.len())?;
        for inst in &self.instructions {
            match inst {
                Instruction::Gate(app) => {
                    builder.apply(&application_unitary(app, self)?, &wires(&qubits, &app.qubits))?;
                }
                Instruction::Reset(_) => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Quil,
                        inst.to_string(),
                        "reset has no unitary",
                    ));
                }
                other if other.is_control_flow() => {
                    return Err(ConvertError::unsupported(
                        ProgramFormat::Quil,
                        other.to_string(),
                        "control flow has no fixed unitary",
                    ));
                }
                _ => {}
            }
        }
        Ok(builder.finish())
    }

    fn bind_parameters(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Self {
        self.bind(lookup)
    }
}
