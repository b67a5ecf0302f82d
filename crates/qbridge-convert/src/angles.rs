//! Well-known angles for the named-gate tie-break.
//!
//! When a target offers both a parametric gate and a fixed-angle named gate
//! with the same unitary, exporters emit the named gate if the argument is
//! one of these angles.

use qbridge_ir::{Angle, GateKind};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Tolerance for recognizing a well-known angle.
pub const ANGLE_TOLERANCE: f64 = 1e-10;

/// A recognized angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownAngle {
    /// π/4
    EighthTurn,
    /// -π/4
    NegEighthTurn,
    /// π/2
    QuarterTurn,
    /// -π/2
    NegQuarterTurn,
    /// π
    HalfTurn,
    /// -π
    NegHalfTurn,
    /// 2π
    FullTurn,
    /// -2π
    NegFullTurn,
}

impl WellKnownAngle {
    const TABLE: [(WellKnownAngle, f64); 8] = [
        (WellKnownAngle::EighthTurn, FRAC_PI_4),
        (WellKnownAngle::NegEighthTurn, -FRAC_PI_4),
        (WellKnownAngle::QuarterTurn, FRAC_PI_2),
        (WellKnownAngle::NegQuarterTurn, -FRAC_PI_2),
        (WellKnownAngle::HalfTurn, PI),
        (WellKnownAngle::NegHalfTurn, -PI),
        (WellKnownAngle::FullTurn, 2.0 * PI),
        (WellKnownAngle::NegFullTurn, -2.0 * PI),
    ];

    /// Recognize a bound angle in radians.
    pub fn from_radians(value: f64) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, v)| (value - v).abs() < ANGLE_TOLERANCE)
            .map(|(w, _)| *w)
    }

    /// Recognize a canonical argument. Symbolic arguments never match.
    pub fn from_angle(angle: &Angle) -> Option<Self> {
        angle.as_f64().and_then(Self::from_radians)
    }

    /// The angle in radians.
    pub fn radians(&self) -> f64 {
        Self::TABLE
            .iter()
            .find(|(w, _)| w == self)
            .map_or(0.0, |(_, v)| *v)
    }

    /// Named single-qubit gate equal to `Phase(self)`.
    pub fn phase_alias(&self) -> GateKind {
        match self {
            WellKnownAngle::EighthTurn => GateKind::T,
            WellKnownAngle::NegEighthTurn => GateKind::Tdg,
            WellKnownAngle::QuarterTurn => GateKind::S,
            WellKnownAngle::NegQuarterTurn => GateKind::Sdg,
            WellKnownAngle::HalfTurn | WellKnownAngle::NegHalfTurn => GateKind::Z,
            WellKnownAngle::FullTurn | WellKnownAngle::NegFullTurn => GateKind::I,
        }
    }

    /// Named two-qubit gate equal to `CPhase(self)`, if there is one.
    pub fn cphase_alias(&self) -> Option<GateKind> {
        match self {
            WellKnownAngle::HalfTurn | WellKnownAngle::NegHalfTurn => Some(GateKind::CZ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_angles() {
        assert_eq!(
            WellKnownAngle::from_radians(PI / 2.0),
            Some(WellKnownAngle::QuarterTurn)
        );
        assert_eq!(
            WellKnownAngle::from_radians(-PI + 1e-12),
            Some(WellKnownAngle::NegHalfTurn)
        );
        assert_eq!(WellKnownAngle::from_radians(0.3), None);
        assert_eq!(WellKnownAngle::from_radians(PI / 2.0 + 1e-6), None);
    }

    #[test]
    fn test_symbolic_never_matches() {
        let angle = Angle::symbol(qbridge_ir::ParamId::new(0, "theta"));
        assert_eq!(WellKnownAngle::from_angle(&angle), None);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(WellKnownAngle::EighthTurn.phase_alias(), GateKind::T);
        assert_eq!(WellKnownAngle::NegQuarterTurn.phase_alias(), GateKind::Sdg);
        assert_eq!(WellKnownAngle::NegHalfTurn.cphase_alias(), Some(GateKind::CZ));
        assert_eq!(WellKnownAngle::QuarterTurn.cphase_alias(), None);
        assert!((WellKnownAngle::FullTurn.radians() - 2.0 * PI).abs() < 1e-15);
    }
}
