use crate::geom::{CubicBezier3, Line3, NurbsCurve3, Point3};
use crate::intersections::{CvCvIntersector, GeoTol, IntersectionResult, Intersector, ParamGeomInt, PointKind};

/// Parabola y = x^2 - 1 on [-2, 2] as a quadratic Bezier; x = 4t - 2.
fn parabola() -> ParamGeomInt {
    let curve = NurbsCurve3::clamped_uniform(
        2,
        vec![
            Point3::new(-2.0, 3.0, 0.0),
            Point3::new(0.0, -5.0, 0.0),
            Point3::new(2.0, 3.0, 0.0),
        ],
    )
    .unwrap();
    ParamGeomInt::curve_copy(&curve).unwrap()
}

fn points(results: &[IntersectionResult]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = results
        .iter()
        .filter_map(IntersectionResult::as_point)
        .map(|p| p.params.clone())
        .collect();
    out.sort_by(|a, b| a[0].total_cmp(&b[0]));
    out
}

#[test]
fn parabola_crosses_axis_twice() {
    let axis = ParamGeomInt::curve_copy(&Line3::new(Point3::new(-3.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0))).unwrap();
    let mut node = CvCvIntersector::new(parabola(), axis, GeoTol::new(1e-6).unwrap()).unwrap();
    let diag = node.compute_with_diagnostics().unwrap();
    assert!(diag.is_complete(), "{diag}");

    let hits = points(node.results());
    assert_eq!(hits.len(), 2);
    assert!((hits[0][0] - 0.25).abs() < 1e-8);
    assert!((hits[0][1] - 1.0 / 3.0).abs() < 1e-8);
    assert!((hits[1][0] - 0.75).abs() < 1e-8);
    assert!((hits[1][1] - 2.0 / 3.0).abs() < 1e-8);
}

#[test]
fn grazing_crossing_is_tangential() {
    // Crossing angle 0.005 rad, below the default reference angle.
    let flat = ParamGeomInt::curve_copy(&Line3::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0))).unwrap();
    let tilted =
        ParamGeomInt::curve_copy(&Line3::new(Point3::new(-1.0, -0.005, 0.0), Point3::new(1.0, 0.005, 0.0))).unwrap();
    let mut node = CvCvIntersector::new(flat, tilted, GeoTol::new(1e-6).unwrap()).unwrap();
    node.compute().unwrap();
    let hits: Vec<_> = node.pool().points().collect();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].params[0] - 0.5).abs() < 1e-9);
    assert_eq!(hits[0].kind, PointKind::Tangential);
}

#[test]
fn bezier_against_separate_bezier_is_empty() {
    let a = CubicBezier3::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        Point3::new(2.0, 2.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
    );
    let b = CubicBezier3::new(
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(1.0, 5.0, 0.0),
        Point3::new(2.0, 5.0, 0.0),
        Point3::new(3.0, 3.0, 0.0),
    );
    let mut node = CvCvIntersector::new(
        ParamGeomInt::curve_copy(&a).unwrap(),
        ParamGeomInt::curve_copy(&b).unwrap(),
        GeoTol::new(1e-4).unwrap(),
    )
    .unwrap();
    node.compute().unwrap();
    assert!(node.results().is_empty());
}
