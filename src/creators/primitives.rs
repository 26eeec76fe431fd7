use super::CreatorError;
use crate::geom::{NurbsCurve3, Point3, Vec3};

/// Exact circle as a rational quadratic NURBS with nine control points.
///
/// The circle starts at `center + radius * axis` and runs counter-clockwise
/// around `normal`. The parameter domain is `[0, 4]`, one unit per quarter.
/// `axis` does not need to be orthogonal to `normal`; only its component in
/// the circle plane is used.
pub fn create_circle(center: Point3, axis: Vec3, normal: Vec3, radius: f64) -> Result<NurbsCurve3, CreatorError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(format!("circle radius must be finite and > 0, got {radius}").into());
    }
    let normal = normal.normalized().ok_or("circle normal must be non-zero")?;
    let x = axis
        .reject_from(normal)
        .normalized()
        .ok_or("circle axis must not be parallel to the normal")?
        * radius;
    let y = normal.cross(x);

    let corner = std::f64::consts::FRAC_1_SQRT_2;
    let offsets = [x, x + y, y, y - x, -x, -x - y, -y, x - y, x];
    let control_points = offsets.iter().map(|&d| center + d).collect();
    let weights = (0..9).map(|i| if i % 2 == 0 { 1.0 } else { corner }).collect();
    let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 4.0];
    Ok(NurbsCurve3::new(2, control_points, knots, Some(weights))?)
}

/// Copy of `curve` translated by `offset`.
#[must_use]
pub fn offset_curve(curve: &NurbsCurve3, offset: Vec3) -> NurbsCurve3 {
    NurbsCurve3 {
        control_points: curve.control_points.iter().map(|&p| p + offset).collect(),
        ..curve.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Curve3;

    #[test]
    fn circle_points_lie_on_radius() {
        let center = Point3::new(1.0, -2.0, 0.5);
        let circle = create_circle(center, Vec3::X, Vec3::Z, 3.0).unwrap();
        assert_eq!(circle.domain(), (0.0, 4.0));
        for k in 0..=16 {
            let t = f64::from(k) * 0.25;
            let r = circle.point_at(t).distance_to(center);
            assert!((r - 3.0).abs() < 1e-12, "t = {t}: r = {r}");
        }
        assert!(circle.point_at(1.0).distance_to(Point3::new(1.0, 1.0, 0.5)) < 1e-12);
        assert!(circle.point_at(4.0).distance_to(circle.point_at(0.0)) < 1e-12);
    }

    #[test]
    fn circle_axis_is_projected_into_plane() {
        let circle = create_circle(Point3::ORIGIN, Vec3::new(1.0, 0.0, 5.0), Vec3::Z, 1.0).unwrap();
        let start = circle.point_at(0.0);
        assert!(start.distance_to(Point3::new(1.0, 0.0, 0.0)) < 1e-12);
    }

    #[test]
    fn circle_rejects_degenerate_input() {
        assert!(matches!(
            create_circle(Point3::ORIGIN, Vec3::X, Vec3::Z, 0.0),
            Err(CreatorError::InvalidGeometry(_))
        ));
        assert!(create_circle(Point3::ORIGIN, Vec3::Z, Vec3::Z, 1.0).is_err());
        assert!(create_circle(Point3::ORIGIN, Vec3::X, Vec3::ZERO, 1.0).is_err());
    }

    #[test]
    fn offset_moves_every_point() {
        let circle = create_circle(Point3::ORIGIN, Vec3::X, Vec3::Z, 1.0).unwrap();
        let moved = offset_curve(&circle, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(moved.weights, circle.weights);
        let p = moved.point_at(0.7);
        let q = circle.point_at(0.7);
        assert!((p.z - q.z - 2.0).abs() < 1e-12);
        assert!((p.x - q.x).abs() < 1e-12);
    }
}
