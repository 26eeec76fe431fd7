use super::param_geom_int::GeomKind;

/// Failures that abort an intersection computation.
///
/// Numerical trouble inside a branch is never reported here; it is absorbed
/// by the driver and surfaces as [`ComputeStatus::Incomplete`](super::ComputeStatus).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntersectionError {
    #[error("geometric tolerance must be finite and > 0, got {0}")]
    InvalidTolerance(f64),
    #[error("operand roles do not match: expected {expected}, found {found}")]
    OperandRoles { expected: String, found: String },
    #[error("{kind} operand has an invalid parameter domain [{start}, {end}]")]
    InvalidDomain { kind: GeomKind, start: f64, end: f64 },
    #[error("a {first} x {second} pair cannot eliminate parameter {parameter}")]
    UnsupportedPair {
        first: GeomKind,
        second: GeomKind,
        parameter: usize,
    },
}

impl IntersectionError {
    pub(crate) fn roles(expected: [GeomKind; 2], found: [GeomKind; 2]) -> Self {
        Self::OperandRoles {
            expected: format!("{} x {}", expected[0], expected[1]),
            found: format!("{} x {}", found[0], found[1]),
        }
    }
}
