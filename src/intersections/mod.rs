//! Recursive subdivision intersection of points, curves and surfaces.
//!
//! [`intersect`] builds the intersector matching a pair of operands; each
//! [`Intersector`] then runs the shared state machine described in
//! [`intersector`]. Results are [`IntersectionResult`] values in the
//! combined parameter space of the two operands, first operand first.
//!
//! ```
//! use nurbs_intersect::geom::{Line3, Point3};
//! use nurbs_intersect::intersections::{GeoTol, IntersectOptions, ParamGeomInt, intersect};
//!
//! let line = ParamGeomInt::curve_copy(&Line3::new(Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)))?;
//! let point = ParamGeomInt::point(Point3::new(5.0, 0.0005, 0.0));
//! let mut node = intersect(line, point, GeoTol::new(1e-3)?, IntersectOptions::default())?;
//! node.compute()?;
//! assert_eq!(node.results().len(), 1);
//! # Ok::<(), nurbs_intersect::intersections::IntersectionError>(())
//! ```

mod cv_cv;
mod cv_pt;
mod cv_sf;
mod diagnostics;
mod error;
mod factory;
mod geo_tol;
mod hull;
pub mod intersector;
mod intersector_2obj;
mod options;
mod param_geom_int;
mod pt_pt;
mod result;
mod sf_pt;
mod sf_sf;
pub(crate) mod solve;

pub use cv_cv::CvCvIntersector;
pub use cv_pt::CvPtIntersector;
pub use cv_sf::CvSfIntersector;
pub use diagnostics::{ComputeStatus, IntersectionDiagnostics};
pub use error::IntersectionError;
pub use factory::{intersect, intersector_for};
pub use geo_tol::GeoTol;
pub use intersector::{
    Elimination, Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification,
};
pub use intersector_2obj::{Intersector2Obj, sort_parameter_directions};
pub use options::IntersectOptions;
pub use param_geom_int::{GeomKind, ParamCurveInt, ParamGeomInt, ParamPointInt, ParamSurfaceInt};
pub use pt_pt::PtPtIntersector;
pub use result::{
    CoincidenceInterval, IntersectionCurve, IntersectionPoint, IntersectionPool, IntersectionResult, PointKind,
    SameIntersection,
};
pub use sf_pt::SfPtIntersector;
pub use sf_sf::SfSfIntersector;

#[cfg(test)]
mod tests;
