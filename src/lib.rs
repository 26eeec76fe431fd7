#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Intersection of parametric points, curves and surfaces by recursive
//! subdivision.

pub mod creators;
pub mod geom;
pub mod intersections;

pub use intersections::{
    ComputeStatus, GeoTol, IntersectOptions, IntersectionDiagnostics, IntersectionError, IntersectionResult,
    Intersector, ParamGeomInt, intersect,
};
