use crate::geom::{Curve3, NurbsSurface, ParamDirection, ParamSurface, PlaneSurface, Point3, Surface, Vec3};

#[test]
fn nurbs_surface_bilinear_patch_matches_expected_point() {
    let surface = NurbsSurface::new(
        1,
        1,
        2,
        2,
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ],
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
        None,
    )
    .unwrap();

    let p = surface.point_at(0.5, 0.5);
    assert!(p.distance_to(Point3::new(0.5, 0.5, 0.25)) < 1e-9);
}

#[test]
fn plane_iso_curves_follow_axes() {
    let plane = PlaneSurface::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
    let iso_u = plane.iso_curve(ParamDirection::U, 0.5);
    assert_eq!(iso_u.point_at(0.0), Point3::new(1.0, 0.0, 1.0));
    assert_eq!(iso_u.point_at(1.0), Point3::new(1.0, 3.0, 1.0));

    let iso_v = plane.iso_curve(ParamDirection::V, 0.5);
    assert_eq!(iso_v.point_at(1.0), Point3::new(2.0, 1.5, 1.0));
    assert_eq!(plane.normal_at(0.3, 0.3), Some(Vec3::Z));
}

#[test]
fn nurbs_surface_rejects_bad_net() {
    let result = NurbsSurface::new(
        1,
        1,
        2,
        2,
        vec![Point3::ORIGIN; 3],
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
        None,
    );
    assert!(result.is_err());
}

#[test]
fn tangent_directions_cover_patch_derivatives() {
    let mut pts = Vec::new();
    for j in 0..4 {
        for i in 0..4 {
            let z = (f64::from(i) * 0.7).sin() * (f64::from(j) * 0.5).cos();
            pts.push(Point3::new(f64::from(i), f64::from(j), z));
        }
    }
    let surface = NurbsSurface::clamped_uniform(3, 3, 4, 4, pts).unwrap();
    let dirs = surface.tangent_directions(ParamDirection::U, 0.2, 0.4, 0.2, 0.4, 1e-10);
    assert_eq!(dirs.len(), 12);
    // Every u-leg of this net moves forward in x, so the cone excludes -X.
    assert!(dirs.iter().all(|d| d.x > 0.0));
    let (du, _) = surface.partial_derivatives_at(0.3, 0.3);
    assert!(du.x > 0.0);
}
