use nurbs_intersect::creators::create_circle;
use nurbs_intersect::geom::{Curve3, Line3, NurbsCurve3, Point3, Vec3};
use nurbs_intersect::intersections::{
    CvPtIntersector, GeoTol, IntersectOptions, IntersectionResult, Intersector, ParamGeomInt, intersect,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-3;

fn tol() -> GeoTol {
    GeoTol::new(EPS).unwrap()
}

fn straight() -> ParamGeomInt {
    ParamGeomInt::curve_copy(&Line3::new(Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0))).unwrap()
}

fn point_params(results: &[IntersectionResult]) -> Vec<f64> {
    let mut params: Vec<f64> = results
        .iter()
        .filter_map(IntersectionResult::as_point)
        .map(|p| p.params[0])
        .collect();
    params.sort_by(f64::total_cmp);
    params
}

#[test]
fn point_near_line_gives_one_result() {
    let mut node = CvPtIntersector::new(straight(), ParamGeomInt::point(Point3::new(5.0, 0.0005, 0.0)), tol()).unwrap();
    assert!(node.compute().unwrap().is_complete());
    assert_eq!(node.results().len(), 1);
    let hit = node.results()[0].as_point().unwrap();
    assert!((hit.params[0] - 0.5).abs() < 1e-6);
    assert!((hit.distance - 0.0005).abs() < 1e-9);
}

#[test]
fn point_away_from_line_gives_nothing() {
    let mut node = CvPtIntersector::new(straight(), ParamGeomInt::point(Point3::new(5.0, 1.0, 0.0)), tol()).unwrap();
    assert!(node.compute().unwrap().is_complete());
    assert!(node.results().is_empty());
}

#[test]
fn closed_circle_meets_its_seam_at_both_ends() {
    let circle = create_circle(Point3::ORIGIN, Vec3::X, Vec3::Z, 2.0).unwrap();
    let seam = circle.point_at(0.0);
    let mut node =
        CvPtIntersector::new(ParamGeomInt::curve_copy(&circle).unwrap(), ParamGeomInt::point(seam), tol()).unwrap();
    node.compute().unwrap();

    let params = point_params(node.results());
    assert_eq!(params.len(), 2);
    assert!(params[0].abs() < 1e-6);
    assert!((params[1] - 4.0).abs() < 1e-6);
}

#[test]
fn circle_through_point_off_seam() {
    let circle = create_circle(Point3::new(1.0, 1.0, 1.0), Vec3::Y, Vec3::X, 1.5).unwrap();
    let target = circle.point_at(2.5);
    let mut node = intersect(
        ParamGeomInt::curve_copy(&circle).unwrap(),
        ParamGeomInt::point(target),
        tol(),
        IntersectOptions::default(),
    )
    .unwrap();
    node.compute().unwrap();
    let params = point_params(node.results());
    assert_eq!(params.len(), 1);
    assert!((params[0] - 2.5).abs() < 1e-6);
}

#[test]
fn random_lines_with_offset_points_give_one_result() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let a = Point3::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
        let b = Point3::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
        if a.distance_to(b) < 1.0 {
            continue;
        }
        let line = Line3::new(a, b);
        let t = rng.random_range(0.1..0.9);
        let dir = b - a;
        let side = dir.cross(Vec3::Z).normalized().unwrap_or(Vec3::X);
        let target = line.point_at(t) + side * 0.0005;

        let mut node =
            CvPtIntersector::new(ParamGeomInt::curve_copy(&line).unwrap(), ParamGeomInt::point(target), tol()).unwrap();
        node.compute().unwrap();
        assert_eq!(node.results().len(), 1, "line {a:?} -> {b:?}, t = {t}");
        let hit = node.results()[0].as_point().unwrap();
        assert!(hit.distance <= EPS);
        assert!((hit.params[0] - t).abs() < 1e-6);
    }
}

#[test]
fn random_splines_respect_depth_budget() {
    let mut rng = StdRng::seed_from_u64(2024);
    let options = IntersectOptions::default().with_max_depth(48);
    for _ in 0..40 {
        let points: Vec<Point3> = (0..6)
            .map(|_| Point3::new(rng.random_range(0.0..10.0), rng.random_range(0.0..10.0), rng.random_range(-1.0..1.0)))
            .collect();
        let curve = NurbsCurve3::clamped_uniform(3, points).unwrap();
        let target = Point3::new(rng.random_range(0.0..10.0), rng.random_range(0.0..10.0), 0.0);

        let mut node = CvPtIntersector::with_options(
            ParamGeomInt::curve_copy(&curve).unwrap(),
            ParamGeomInt::point(target),
            tol(),
            options,
        )
        .unwrap();
        let diag = node.compute_with_diagnostics().unwrap();
        assert!(diag.max_depth_reached <= options.max_depth, "{diag}");

        let params = point_params(node.results());
        for hit in node.results().iter().filter_map(IntersectionResult::as_point) {
            assert!(hit.distance <= EPS);
        }
        let min_gap = tol().min_param_width(1.0);
        assert!(params.windows(2).all(|w| w[1] - w[0] > min_gap));
    }
}

#[test]
fn recompute_gives_same_results() {
    let curve = create_circle(Point3::ORIGIN, Vec3::X, Vec3::Z, 2.0).unwrap();
    let mut node = CvPtIntersector::new(
        ParamGeomInt::curve_copy(&curve).unwrap(),
        ParamGeomInt::point(Point3::new(2.0, 0.0, 0.0)),
        tol(),
    )
    .unwrap();
    node.compute().unwrap();
    let first = node.results().to_vec();
    node.compute().unwrap();
    assert_eq!(node.results(), first.as_slice());
}

#[test]
fn results_serialize_to_json() {
    let mut node = CvPtIntersector::new(straight(), ParamGeomInt::point(Point3::new(5.0, 0.0005, 0.0)), tol()).unwrap();
    let diag = node.compute_with_diagnostics().unwrap();
    let json = serde_json::to_value(node.results()).unwrap();
    assert_eq!(json[0]["Point"]["kind"], "Isolated");
    assert!((json[0]["Point"]["params"][0].as_f64().unwrap() - 0.5).abs() < 1e-6);

    let report = serde_json::to_string(&diag).unwrap();
    assert!(report.contains("node_count"));
}
