//! Curve constructors that produce intersector-ready NURBS.
//!
//! Besides the primitives, this module builds curves out of other curves:
//! products with and blends of scalar spline functions, and curves carried
//! between a surface's parameter plane and space.

mod primitives;
mod products;
mod surface_curves;

pub use primitives::{create_circle, offset_curve};
pub use products::{blend, insert_param_domain, mult_curve_with_function};
pub use surface_curves::{ProjectedCurve, lift_parameter_curve, project_curve};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreatorError {
    #[error("{0}")]
    InvalidGeometry(String),
    #[error("tolerance must be finite and > 0, got {0}")]
    InvalidTolerance(f64),
    #[error("parameter domains differ: {first:?} vs {second:?}")]
    DomainMismatch { first: (f64, f64), second: (f64, f64) },
    #[error("blending rational curves is not supported")]
    RationalBlend,
    #[error("interpolation system is singular")]
    SingularSystem,
    #[error("approximation error {error} still above {tolerance} with {segments} segments")]
    NotConverged { error: f64, tolerance: f64, segments: usize },
}

impl From<String> for CreatorError {
    fn from(message: String) -> Self {
        Self::InvalidGeometry(message)
    }
}

impl From<&str> for CreatorError {
    fn from(message: &str) -> Self {
        Self::InvalidGeometry(message.to_string())
    }
}
