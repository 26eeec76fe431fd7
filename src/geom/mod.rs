//! Geometry services consumed by the intersectors: vectors, tolerances,
//! curve and surface evaluation, and the convex-bound queries the
//! subdivision algorithms rely on.

pub(crate) mod bspline;
mod core;
mod curve;
mod function;
mod surface;

pub use core::{BBox, Point3, Tolerance, Vec3};
pub use curve::{CubicBezier3, Curve3, Line3, NurbsCurve3, ParamCurve};
pub use function::BsplineFunction;
pub use surface::{NurbsSurface, ParamDirection, ParamSurface, PlaneSurface, Surface};

#[cfg(test)]
mod tests;
