//! Static audit of the per-target mapping tables.

use qbridge::{GateKind, ProgramFormat, Strategy, missing, strategy};

#[test]
fn test_every_kind_has_an_entry_for_every_target() {
    for target in ProgramFormat::ALL {
        assert!(missing(target).is_empty(), "{target} is missing {:?}", missing(target));
        for kind in GateKind::ALL {
            assert!(strategy(target, kind).is_some(), "{target}: {kind}");
        }
    }
}

#[test]
fn test_raw_unitary_is_always_matrix() {
    for target in ProgramFormat::ALL {
        assert_eq!(strategy(target, GateKind::RawUnitary), Some(Strategy::Matrix), "{target}");
    }
}

#[test]
fn test_only_raw_unitary_uses_matrix() {
    for target in ProgramFormat::ALL {
        let matrix: Vec<_> = GateKind::ALL
            .into_iter()
            .filter(|k| strategy(target, *k) == Some(Strategy::Matrix))
            .collect();
        assert_eq!(matrix, vec![GateKind::RawUnitary], "{target}");
    }
}

#[test]
fn test_primitives_common_to_every_target_are_direct() {
    let shared = [
        GateKind::X,
        GateKind::Y,
        GateKind::Z,
        GateKind::H,
        GateKind::Rx,
        GateKind::Ry,
        GateKind::Rz,
        GateKind::CX,
        GateKind::CZ,
        GateKind::Swap,
        GateKind::ISwap,
        GateKind::CCX,
        GateKind::CSwap,
    ];
    for target in ProgramFormat::ALL {
        for kind in shared {
            assert_eq!(strategy(target, kind), Some(Strategy::Direct), "{target}: {kind}");
        }
    }
}

#[test]
fn test_qiskit_has_no_decompositions() {
    for kind in GateKind::ALL {
        assert_ne!(
            strategy(ProgramFormat::Qiskit, kind),
            Some(Strategy::Decompose),
            "{kind}"
        );
    }
}

#[test]
fn test_quil_decomposes_what_it_lacks() {
    for kind in [
        GateKind::SX,
        GateKind::SXdg,
        GateKind::U3,
        GateKind::Rxx,
        GateKind::Ryy,
        GateKind::Rzz,
    ] {
        assert_eq!(strategy(ProgramFormat::Quil, kind), Some(Strategy::Decompose), "{kind}");
    }
}
