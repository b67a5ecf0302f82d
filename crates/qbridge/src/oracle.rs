//! Equivalence checks over native programs.

use qbridge_convert::ConvertResult;
use qbridge_unitary::{DEFAULT_ATOL, Matrix, equivalent, equivalent_strict};

use crate::program::Program;

/// Unitary of `program` under its own format's semantics, big-endian over
/// the format's qubit order.
///
/// Unbound parameters are an error; bind them first.
pub fn unitary_of(program: &Program) -> ConvertResult<Matrix> {
    program.unitary()
}

/// Compare two unitaries up to global phase, or exactly when
/// `strict_global_phase` is set. Different dimensions compare unequal.
pub fn unitaries_allclose(u1: &Matrix, u2: &Matrix, atol: f64, strict_global_phase: bool) -> bool {
    if u1.dim() != u2.dim() {
        return false;
    }
    if strict_global_phase {
        equivalent_strict(u1, u2, atol)
    } else {
        equivalent(u1, u2, atol)
    }
}

/// Whether two programs in any formats compute the same unitary within
/// [`DEFAULT_ATOL`].
pub fn circuits_allclose(a: &Program, b: &Program, strict_global_phase: bool) -> ConvertResult<bool> {
    circuits_allclose_within(a, b, DEFAULT_ATOL, strict_global_phase)
}

/// [`circuits_allclose`] with an explicit tolerance.
pub fn circuits_allclose_within(
    a: &Program,
    b: &Program,
    atol: f64,
    strict_global_phase: bool,
) -> ConvertResult<bool> {
    Ok(unitaries_allclose(
        &unitary_of(a)?,
        &unitary_of(b)?,
        atol,
        strict_global_phase,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_adapter_braket as braket;
    use qbridge_adapter_cirq::{Circuit, CirqGate, Qid};

    #[test]
    fn test_phase_freedom() {
        let mut z_pow = Circuit::new();
        z_pow.push(CirqGate::z(), [Qid::Line(0)]).unwrap();
        let mut rz = braket::Circuit::new();
        rz.rz(0, std::f64::consts::PI).unwrap();
        let (a, b) = (Program::from(z_pow), Program::from(rz));
        assert!(circuits_allclose(&a, &b, false).unwrap());
        assert!(!circuits_allclose(&a, &b, true).unwrap());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut one = braket::Circuit::new();
        one.h(0).unwrap();
        let mut two = braket::Circuit::new();
        two.h(0).unwrap().add(braket::BraketGate::I, [1]).unwrap();
        assert!(!circuits_allclose(&one.into(), &two.into(), false).unwrap());
    }
}
