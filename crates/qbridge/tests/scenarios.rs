//! End-to-end conversion scenarios.
//!
//! Each test drives the public façade only: build a native program, convert
//! it, and compare unitaries under each format's own semantics.

use std::f64::consts::PI;

use qbridge::{
    ExportOptions, GateKind, Program, ProgramFormat, ProgramWrapper, Strategy, TranspileError,
    circuits_allclose, convert, convert_with, equivalent, unitary_of,
};
use qbridge_adapter_braket as braket;
use qbridge_adapter_cirq::{Circuit, CirqGate, EigenPow, Qid};
use qbridge_adapter_qiskit::{Parameter, ParameterValue, QiskitGate, QuantumCircuit};
use qbridge_unitary::{
    gates,
    matrix::{kron, to_unitary},
};

const TARGETS: [ProgramFormat; 4] = ProgramFormat::ALL;

fn others(source: ProgramFormat) -> impl Iterator<Item = ProgramFormat> {
    TARGETS.into_iter().filter(move |t| *t != source)
}

// ============================================================================
// Scenario 1: Bell circuit
// ============================================================================

#[test]
fn test_bell_matches_reference_unitary() {
    let mut bell = braket::Circuit::new();
    bell.h(0).unwrap().cnot(0, 1).unwrap();
    let source = Program::from(bell);
    let reference = gates::cx().dot(&kron(&gates::h(), &gates::id()));

    assert!(equivalent(&unitary_of(&source).unwrap(), &reference, 1e-7));
    for target in others(ProgramFormat::Braket) {
        let converted = convert(&source, target).unwrap();
        assert_eq!(converted.format(), target);
        let u = unitary_of(&converted).unwrap();
        assert!(equivalent(&u, &reference, 1e-7), "{target}");
    }
}

// ============================================================================
// Scenario 2: fractional power with no direct equivalent
// ============================================================================

#[test]
fn test_fractional_power_is_never_dropped() {
    let mut circuit = Circuit::new();
    circuit
        .push(CirqGate::HPow(EigenPow::new(-1.0 / 14.0)), [Qid::Line(0)])
        .unwrap();
    let source = Program::from(circuit);

    for target in others(ProgramFormat::Cirq) {
        let exported = convert_with(&source, target, &ExportOptions::default()).unwrap();
        assert!(exported.native_gate_count() >= 1, "{target}");
        assert!(!exported.all_direct(), "{target}");
        assert!(circuits_allclose(&source, &exported.program, false).unwrap(), "{target}");
    }
}

// ============================================================================
// Scenario 3: Toffoli maps directly
// ============================================================================

#[test]
fn test_toffoli_is_direct() {
    let mut circuit = Circuit::new();
    circuit
        .push(CirqGate::toffoli(), [Qid::Line(0), Qid::Line(1), Qid::Line(2)])
        .unwrap();
    let source = Program::from(circuit);

    for target in others(ProgramFormat::Cirq) {
        let exported = convert_with(&source, target, &ExportOptions::default()).unwrap();
        assert_eq!(exported.emissions.len(), 1);
        let emission = exported.emissions[0];
        assert_eq!(emission.kind, GateKind::CCX);
        assert_eq!(emission.strategy, Strategy::Direct, "{target}");
        assert_eq!(emission.native_ops, 1, "{target}");
        assert!(circuits_allclose(&source, &exported.program, false).unwrap());
    }
}

// ============================================================================
// Scenario 4: a free parameter survives and binds
// ============================================================================

#[test]
fn test_free_parameter_round_trip() {
    let mut circuit = QuantumCircuit::new(1, 0);
    circuit
        .rx(ParameterValue::symbol(Parameter::new("theta")), 0)
        .unwrap();
    let source = Program::from(circuit);
    let bind = |name: &str| (name == "theta").then_some(PI / 3.0);

    for target in others(ProgramFormat::Qiskit) {
        let exported = convert_with(&source, target, &ExportOptions::default()).unwrap();
        assert_eq!(exported.param_map.len(), 1, "{target}");
        let (id, symbol) = &exported.param_map[0];
        assert_eq!(id.index, 0);
        assert_eq!(symbol, "theta");

        let wrapper = ProgramWrapper::new(exported.program.clone()).unwrap();
        assert_eq!(wrapper.parameters().len(), 1, "{target}");

        let converted = exported.program.bind_parameters(&bind);
        let original = source.bind_parameters(&bind);
        assert!(circuits_allclose(&original, &converted, false).unwrap(), "{target}");
    }
}

#[test]
fn test_colliding_parameter_names_stay_distinct() {
    let mut circuit = QuantumCircuit::new(3, 0);
    circuit
        .rx(ParameterValue::symbol(Parameter::new("a_2")), 0)
        .unwrap()
        .rx(ParameterValue::symbol(Parameter::new("a")), 1)
        .unwrap()
        .rx(ParameterValue::symbol(Parameter::new("a")), 2)
        .unwrap();
    let source = Program::from(circuit);

    let mut reference = QuantumCircuit::new(3, 0);
    reference.rx(0.3, 0).unwrap().rx(0.7, 1).unwrap().rx(1.1, 2).unwrap();
    let reference = Program::from(reference);
    let bind = |name: &str| match name {
        "a_2" => Some(0.3),
        "a" => Some(0.7),
        "a_3" => Some(1.1),
        _ => None,
    };

    for target in others(ProgramFormat::Qiskit) {
        let exported = convert_with(&source, target, &ExportOptions::default()).unwrap();
        let names: Vec<&str> = exported.param_map.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["a_2", "a", "a_3"], "{target}");

        let wrapper = ProgramWrapper::new(exported.program.clone()).unwrap();
        let back: Vec<&str> = wrapper.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(back, vec!["a_2", "a", "a_3"], "{target}");

        let bound = exported.program.bind_parameters(&bind);
        assert!(circuits_allclose(&reference, &bound, false).unwrap(), "{target}");

        let round_trip = convert(&exported.program, ProgramFormat::Qiskit).unwrap();
        assert_eq!(ProgramWrapper::new(round_trip).unwrap().parameters().len(), 3, "{target}");
    }
}

#[test]
fn test_unbound_parameter_has_no_unitary() {
    let mut circuit = braket::Circuit::new();
    circuit
        .rx(0, braket::Value::symbol(braket::FreeParameter::new("alpha")))
        .unwrap();
    assert!(unitary_of(&circuit.into()).is_err());
}

// ============================================================================
// Scenario 5: mid-circuit reset is rejected
// ============================================================================

#[test]
fn test_reset_is_rejected_by_every_importer() {
    let mut qiskit = QuantumCircuit::new(1, 0);
    qiskit.h(0).unwrap().reset(0).unwrap().x(0).unwrap();

    let mut cirq = Circuit::new();
    cirq.push(CirqGate::h(), [Qid::Line(0)])
        .unwrap()
        .push(CirqGate::Reset, [Qid::Line(0)])
        .unwrap();

    let quil: qbridge_adapter_quil::Program = "H 0\nRESET 0\nX 0\n".parse().unwrap();

    let sources: [Program; 3] = [qiskit.into(), cirq.into(), quil.into()];
    for source in &sources {
        let target = others(source.format()).next().unwrap();
        let err = convert(source, target).unwrap_err();
        assert!(
            matches!(err, TranspileError::UnsupportedProgram(_)),
            "{}: {err}",
            source.format()
        );
        assert!(err.to_string().to_lowercase().contains("reset"), "{err}");
    }
}

#[test]
fn test_noise_channel_is_rejected() {
    let mut circuit = braket::Circuit::new();
    circuit
        .h(0)
        .unwrap()
        .noise(braket::Noise::BitFlip(0.1), 0)
        .unwrap();
    let err = convert(&circuit.into(), ProgramFormat::Qiskit).unwrap_err();
    assert!(err.is_unsupported());
}

// ============================================================================
// Identity shortcut
// ============================================================================

#[test]
fn test_identity_shortcut_for_every_format() {
    let mut bell = QuantumCircuit::new(2, 2);
    bell.h(0).unwrap().cx(0, 1).unwrap();
    let qiskit = Program::from(bell);
    for target in TARGETS {
        let program = convert(&qiskit, target).unwrap();
        assert_eq!(convert(&program, target).unwrap(), program, "{target}");
    }
}

// ============================================================================
// Serialized programs
// ============================================================================

#[test]
fn test_malformed_serialized_matrix_is_rejected() {
    let mut circuit = QuantumCircuit::new(1, 0);
    circuit
        .gate(QiskitGate::Unitary(to_unitary(&gates::x()).unwrap()), &[0])
        .unwrap();
    let json = serde_json::to_string(&Program::from(circuit)).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    assert!(circuits_allclose(&back, &convert(&back, ProgramFormat::Braket).unwrap(), false).unwrap());

    assert!(json.contains("\"dim\":2"));
    let resized = json.replace("\"dim\":2", "\"dim\":4");
    assert!(serde_json::from_str::<Program>(&resized).is_err());
    let not_unitary = json.replacen("[0.0,0.0]", "[1.0,0.0]", 1);
    assert_ne!(not_unitary, json);
    assert!(serde_json::from_str::<Program>(&not_unitary).is_err());
}
