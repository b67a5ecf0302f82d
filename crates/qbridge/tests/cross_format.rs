//! Every source format × every target format over a gate corpus.
//!
//! Corpus circuits are written once in the canonical model, exported into
//! each source format, then converted into each target format. Every native
//! program must compute the corpus circuit's unitary up to global phase.

use std::f64::consts::PI;

use qbridge::{
    CanonicalCircuit, ExportOptions, Program, ProgramFormat, QubitId, circuits_allclose,
    convert, equivalent, export, unitary_of,
};
use qbridge_adapter_cirq::{Circuit, CirqGate, EigenPow, Qid};
use qbridge_unitary::circuit_unitary;

const ATOL: f64 = 1e-7;

fn q(i: u32) -> QubitId {
    QubitId(i)
}

fn corpus() -> Vec<(&'static str, CanonicalCircuit)> {
    let mut out = vec![("bell", CanonicalCircuit::bell().unwrap())];

    let mut fixed = CanonicalCircuit::new(1, 0);
    fixed
        .id(q(0))
        .unwrap()
        .x(q(0))
        .unwrap()
        .y(q(0))
        .unwrap()
        .z(q(0))
        .unwrap()
        .h(q(0))
        .unwrap()
        .s(q(0))
        .unwrap()
        .sdg(q(0))
        .unwrap()
        .t(q(0))
        .unwrap()
        .tdg(q(0))
        .unwrap()
        .sx(q(0))
        .unwrap()
        .sxdg(q(0))
        .unwrap();
    out.push(("single_qubit_fixed", fixed));

    let mut rotations = CanonicalCircuit::new(2, 0);
    rotations
        .rx(0.3, q(0))
        .unwrap()
        .ry(-1.1, q(1))
        .unwrap()
        .rz(2.5, q(0))
        .unwrap()
        .p(0.7, q(1))
        .unwrap()
        .u3(0.4, -0.9, 1.3, q(0))
        .unwrap();
    out.push(("rotations", rotations));

    let mut well_known = CanonicalCircuit::new(2, 0);
    well_known
        .rz(PI / 2.0, q(0))
        .unwrap()
        .p(PI / 4.0, q(1))
        .unwrap()
        .p(-PI / 2.0, q(0))
        .unwrap()
        .cp(PI, q(0), q(1))
        .unwrap()
        .rx(PI, q(1))
        .unwrap();
    out.push(("well_known_angles", well_known));

    let mut two = CanonicalCircuit::new(2, 0);
    two.cx(q(1), q(0))
        .unwrap()
        .cy(q(0), q(1))
        .unwrap()
        .cz(q(0), q(1))
        .unwrap()
        .cp(0.6, q(1), q(0))
        .unwrap()
        .swap(q(0), q(1))
        .unwrap()
        .iswap(q(0), q(1))
        .unwrap()
        .rxx(0.2, q(0), q(1))
        .unwrap()
        .ryy(-0.8, q(1), q(0))
        .unwrap()
        .rzz(1.9, q(0), q(1))
        .unwrap();
    out.push(("two_qubit", two));

    let mut three = CanonicalCircuit::new(3, 0);
    three
        .h(q(2))
        .unwrap()
        .ccx(q(2), q(0), q(1))
        .unwrap()
        .cswap(q(1), q(2), q(0))
        .unwrap();
    out.push(("three_qubit", three));

    let mut idle = CanonicalCircuit::new(3, 0);
    idle.h(q(0)).unwrap().cx(q(0), q(2)).unwrap();
    out.push(("idle_middle_qubit", idle));

    out
}

/// Native cirq programs whose fractional powers have no canonical kind.
fn fractional_powers() -> Vec<Program> {
    let powers = [
        (CirqGate::HPow(EigenPow::new(-1.0 / 14.0)), 1),
        (CirqGate::XPow(EigenPow::new(0.37)), 1),
        (CirqGate::YPow(EigenPow::shifted(-0.25, -0.5)), 1),
        (CirqGate::CXPow(EigenPow::new(-1.0 / 17.0)), 2),
        (CirqGate::SwapPow(EigenPow::new(0.5)), 2),
        (CirqGate::ISwapPow(EigenPow::new(-0.5)), 2),
        (CirqGate::CCZPow(EigenPow::new(0.3)), 3),
    ];
    powers
        .into_iter()
        .map(|(gate, n)| {
            let mut circuit = Circuit::new();
            circuit.push(gate, Qid::line_range(n)).unwrap();
            Program::from(circuit)
        })
        .collect()
}

#[test]
fn test_corpus_exports_match_canonical_unitary() {
    for (name, circuit) in corpus() {
        let reference = circuit_unitary(&circuit).unwrap();
        for format in ProgramFormat::ALL {
            let program = export(&circuit, format, &ExportOptions::default())
                .unwrap()
                .program;
            let u = unitary_of(&program).unwrap();
            assert!(equivalent(&u, &reference, ATOL), "{name} as {format}");
        }
    }
}

#[test]
fn test_every_source_to_every_target() {
    for (name, circuit) in corpus() {
        for source_format in ProgramFormat::ALL {
            let source = export(&circuit, source_format, &ExportOptions::default())
                .unwrap()
                .program;
            for target in ProgramFormat::ALL {
                let converted = convert(&source, target)
                    .unwrap_or_else(|e| panic!("{name}: {source_format} -> {target}: {e}"));
                assert_eq!(converted.format(), target);
                assert!(
                    circuits_allclose(&source, &converted, false).unwrap(),
                    "{name}: {source_format} -> {target}"
                );
                assert_eq!(
                    source.metadata().unwrap().num_qubits,
                    converted.metadata().unwrap().num_qubits,
                    "{name}: {source_format} -> {target}"
                );
            }
        }
    }
}

#[test]
fn test_fractional_powers_to_every_target() {
    for source in fractional_powers() {
        for target in ProgramFormat::ALL {
            let converted = convert(&source, target).unwrap();
            assert!(
                circuits_allclose(&source, &converted, false).unwrap(),
                "{source:?} -> {target}"
            );
        }
    }
}

#[test]
fn test_chained_conversions_preserve_unitary() {
    let chain = [
        ProgramFormat::Qiskit,
        ProgramFormat::Quil,
        ProgramFormat::Cirq,
        ProgramFormat::Braket,
        ProgramFormat::Qiskit,
    ];
    for (name, circuit) in corpus() {
        let reference = circuit_unitary(&circuit).unwrap();
        let mut program = export(&circuit, chain[0], &ExportOptions::default())
            .unwrap()
            .program;
        for target in &chain[1..] {
            program = convert(&program, *target).unwrap();
        }
        assert!(equivalent(&unitary_of(&program).unwrap(), &reference, ATOL), "{name}");
    }
}

#[test]
fn test_measurements_survive_conversion() {
    let mut circuit = CanonicalCircuit::new(2, 2);
    circuit.h(q(0)).unwrap().cx(q(0), q(1)).unwrap();
    circuit.measure(q(0), 0.into()).unwrap();
    circuit.measure(q(1), 1.into()).unwrap();
    for source_format in ProgramFormat::ALL {
        let source = export(&circuit, source_format, &ExportOptions::default())
            .unwrap()
            .program;
        for target in ProgramFormat::ALL {
            let back = qbridge::import(&convert(&source, target).unwrap()).unwrap();
            assert_eq!(back.measurements().len(), 2, "{source_format} -> {target}");
        }
    }
}
