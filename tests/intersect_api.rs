use nurbs_intersect::creators::{create_circle, offset_curve};
use nurbs_intersect::geom::{Line3, PlaneSurface, Point3, Vec3};
use nurbs_intersect::intersections::{
    CvCvIntersector, GeomKind, GeoTol, IntersectOptions, IntersectionError, Intersector, ParamGeomInt, PointKind,
    SfPtIntersector, intersect,
};

#[test]
fn tolerance_must_be_positive() {
    assert!(matches!(GeoTol::new(0.0), Err(IntersectionError::InvalidTolerance(_))));
    assert!(matches!(GeoTol::new(f64::NAN), Err(IntersectionError::InvalidTolerance(_))));
    assert!(GeoTol::new(1e-6).unwrap().with_bend(0.0).is_err());
}

#[test]
fn wrong_roles_are_rejected() {
    let tol = GeoTol::new(1e-3).unwrap();
    let line = ParamGeomInt::curve_copy(&Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0))).unwrap();
    let err = SfPtIntersector::new(line, ParamGeomInt::point(Point3::ORIGIN), tol).unwrap_err();
    match err {
        IntersectionError::OperandRoles { expected, .. } => {
            assert_eq!(expected, format!("{} x {}", GeomKind::Surface, GeomKind::Point));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn factory_picks_parameter_count_from_operands() {
    let tol = GeoTol::new(1e-3).unwrap();
    let plane = ParamGeomInt::surface_copy(&PlaneSurface::new(Point3::ORIGIN, Vec3::X, Vec3::Y)).unwrap();
    let circle = ParamGeomInt::curve_copy(&create_circle(Point3::new(0.5, 0.5, 0.0), Vec3::X, Vec3::Y, 0.25).unwrap())
        .unwrap();
    let node = intersect(plane.clone(), circle, tol, IntersectOptions::default()).unwrap();
    assert_eq!(node.num_params(), 3);
    let node = intersect(plane.clone(), plane, tol, IntersectOptions::default()).unwrap();
    assert_eq!(node.num_params(), 4);
}

#[test]
fn offset_circles_cross_twice() {
    let circle = create_circle(Point3::ORIGIN, Vec3::X, Vec3::Z, 1.0).unwrap();
    let shifted = offset_curve(&circle, Vec3::new(1.0, 0.0, 0.0));
    let mut node = CvCvIntersector::new(
        ParamGeomInt::curve_copy(&circle).unwrap(),
        ParamGeomInt::curve_copy(&shifted).unwrap(),
        GeoTol::new(1e-6).unwrap(),
    )
    .unwrap();
    let diag = node.compute_with_diagnostics().unwrap();
    assert!(diag.is_complete(), "{diag}");

    let hits: Vec<_> = node.pool().points().collect();
    assert_eq!(hits.len(), 2);
    for hit in hits {
        assert!(hit.distance <= 1e-6);
        assert_eq!(hit.kind, PointKind::Isolated);
        let (p, q) = (
            nurbs_intersect::geom::Curve3::point_at(&circle, hit.params[0]),
            nurbs_intersect::geom::Curve3::point_at(&shifted, hit.params[1]),
        );
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!(p.distance_to(q) < 1e-6);
    }
}
