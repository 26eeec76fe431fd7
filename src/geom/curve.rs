use std::fmt;

use super::bspline::{
    self, HPoint4, eval_homogeneous, eval_homogeneous_with_derivative, is_non_decreasing,
    polygon_tangent_directions, rational_derivative,
};
use super::core::{Point3, Tolerance, Vec3};

/// Evaluation interface of a parametric space curve.
pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = Tolerance::DERIVATIVE.relative_to(span);
        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }
        self.point_at(t1).sub_point(self.point_at(t0)).div_scalar(t1 - t0)
    }
}

/// Curve capability consumed by the intersectors.
///
/// Beyond evaluation, a curve must answer convex-bound queries over any
/// subdomain: a point set whose convex hull contains the curve piece, and a
/// set of vectors whose positive span contains every tangent of the piece.
///
/// `knot_tol` is the parameter distance below which a subdomain end is
/// treated as lying on a knot.
pub trait ParamCurve: Curve3 + fmt::Debug {
    /// Points whose convex hull contains the curve restricted to `[t0, t1]`.
    fn hull_points(&self, t0: f64, t1: f64, knot_tol: f64) -> Vec<Point3>;

    /// Vectors whose positive span contains `C'(t)` for every `t` in `[t0, t1]`.
    fn tangent_directions(&self, t0: f64, t1: f64, knot_tol: f64) -> Vec<Vec3>;

    /// Distinct knots inside `(t0, t1)` farther than `knot_tol` from both ends.
    fn interior_knots(&self, _t0: f64, _t1: f64, _knot_tol: f64) -> Vec<f64> {
        Vec::new()
    }

    /// Owned copy behind a fresh box.
    fn clone_box(&self) -> Box<dyn ParamCurve>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Line3
// ─────────────────────────────────────────────────────────────────────────────

/// Straight segment parameterised over `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn direction(self) -> Vec3 {
        self.end.sub_point(self.start)
    }
}

impl Curve3 for Line3 {
    fn point_at(&self, t: f64) -> Point3 {
        self.start.add_vec(self.direction().mul_scalar(t))
    }

    fn derivative_at(&self, _t: f64) -> Vec3 {
        self.direction()
    }
}

impl ParamCurve for Line3 {
    fn hull_points(&self, t0: f64, t1: f64, _knot_tol: f64) -> Vec<Point3> {
        vec![self.point_at(t0), self.point_at(t1)]
    }

    fn tangent_directions(&self, _t0: f64, _t1: f64, _knot_tol: f64) -> Vec<Vec3> {
        vec![self.direction()]
    }

    fn clone_box(&self) -> Box<dyn ParamCurve> {
        Box::new(*self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CubicBezier3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Control polygon of the piece over `[t0, t1]`, by two de Casteljau splits.
    #[must_use]
    pub fn segment(&self, t0: f64, t1: f64) -> [Point3; 4] {
        let (_, right) = split_cubic([self.p0, self.p1, self.p2, self.p3], t0);
        if t0 >= 1.0 {
            return right;
        }
        let local = (t1 - t0) / (1.0 - t0);
        split_cubic(right, local).0
    }
}

fn split_cubic(p: [Point3; 4], t: f64) -> ([Point3; 4], [Point3; 4]) {
    let a = p[0].lerp(p[1], t);
    let b = p[1].lerp(p[2], t);
    let c = p[2].lerp(p[3], t);
    let ab = a.lerp(b, t);
    let bc = b.lerp(c, t);
    let mid = ab.lerp(bc, t);
    ([p[0], a, ab, mid], [mid, bc, c, p[3]])
}

impl Curve3 for CubicBezier3 {
    fn point_at(&self, t: f64) -> Point3 {
        split_cubic([self.p0, self.p1, self.p2, self.p3], t).0[3]
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let u = 1.0 - t;
        let d0 = self.p1.sub_point(self.p0);
        let d1 = self.p2.sub_point(self.p1);
        let d2 = self.p3.sub_point(self.p2);
        d0.mul_scalar(3.0 * u * u)
            .add(d1.mul_scalar(6.0 * u * t))
            .add(d2.mul_scalar(3.0 * t * t))
    }
}

impl ParamCurve for CubicBezier3 {
    fn hull_points(&self, t0: f64, t1: f64, _knot_tol: f64) -> Vec<Point3> {
        self.segment(t0, t1).to_vec()
    }

    fn tangent_directions(&self, t0: f64, t1: f64, _knot_tol: f64) -> Vec<Vec3> {
        polygon_tangent_directions(&self.segment(t0, t1), false)
    }

    fn clone_box(&self) -> Box<dyn ParamCurve> {
        Box::new(*self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NurbsCurve3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve3 {
    pub degree: usize,
    pub control_points: Vec<Point3>,
    pub knots: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

impl NurbsCurve3 {
    pub fn new(
        degree: usize,
        control_points: Vec<Point3>,
        knots: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, String> {
        if control_points.len() < 2 {
            return Err("nurbs curve requires at least 2 control points".to_string());
        }
        if degree == 0 {
            return Err("nurbs curve degree must be >= 1".to_string());
        }
        if degree >= control_points.len() {
            return Err("nurbs curve degree must be < control point count".to_string());
        }

        let expected_knot_len = control_points.len() + degree + 1;
        if knots.len() != expected_knot_len {
            return Err(format!(
                "nurbs curve knot length must be {}, got {}",
                expected_knot_len,
                knots.len()
            ));
        }

        if let Some(ref weights) = weights {
            if weights.len() != control_points.len() {
                return Err("nurbs curve weights length must match control point count".to_string());
            }
            if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
                return Err("nurbs curve weights must be finite and > 0".to_string());
            }
        }

        if !is_non_decreasing(&knots) {
            return Err("nurbs curve knots must be non-decreasing".to_string());
        }
        if knots[degree] >= knots[control_points.len()] {
            return Err("nurbs curve parameter domain is empty".to_string());
        }

        Ok(Self {
            degree,
            control_points,
            knots,
            weights,
        })
    }

    /// Clamped uniform B-spline through `control_points` on `[0, 1]`.
    pub fn clamped_uniform(degree: usize, control_points: Vec<Point3>) -> Result<Self, String> {
        let n = control_points.len();
        if n <= degree {
            return Err("nurbs curve degree must be < control point count".to_string());
        }
        let spans = n - degree;
        let mut knots = vec![0.0; degree + 1];
        knots.extend((1..spans).map(|i| i as f64 / spans as f64));
        knots.extend(std::iter::repeat_n(1.0, degree + 1));
        Self::new(degree, control_points, knots, None)
    }

    #[must_use]
    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    pub(crate) fn hpoints(&self) -> Vec<HPoint4> {
        self.control_points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let w = self.weights.as_ref().map_or(1.0, |w| w[i]);
                HPoint4::weighted(p, w)
            })
            .collect()
    }

    pub(crate) fn from_hpoints(degree: usize, knots: Vec<f64>, hpoints: &[HPoint4]) -> Result<Self, String> {
        let rational = hpoints.iter().any(|h| (h.w - 1.0).abs() > 1e-14);
        let control_points = hpoints
            .iter()
            .map(|h| h.to_point3().ok_or_else(|| "degenerate homogeneous weight".to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = rational.then(|| hpoints.iter().map(|h| h.w).collect());
        Self::new(degree, control_points, knots, weights)
    }

    /// The exact sub-curve over `[t0, t1]` as a clamped spline. Ends within
    /// `knot_tol` of a knot are moved onto it.
    pub fn segment(&self, t0: f64, t1: f64, knot_tol: f64) -> Result<Self, String> {
        let (a, b) = self.domain();
        let t0 = t0.clamp(a, b);
        let t1 = t1.clamp(a, b);
        if t1 <= t0 {
            return Err(format!("empty curve segment [{t0}, {t1}]"));
        }
        let (knots, cps) = bspline::extract_segment(
            self.degree,
            &self.knots,
            &self.hpoints(),
            t0,
            t1,
            knot_tol,
        );
        Self::from_hpoints(self.degree, knots, &cps)
    }
}

impl Curve3 for NurbsCurve3 {
    fn point_at(&self, t: f64) -> Point3 {
        let (a, b) = self.domain();
        let u = t.clamp(a, b);
        eval_homogeneous(self.degree, &self.knots, &self.hpoints(), u)
            .to_point3()
            .unwrap_or(self.control_points[0])
    }

    fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.control_points.len()])
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let u = t.clamp(a, b);
        let (value, deriv) = eval_homogeneous_with_derivative(self.degree, &self.knots, &self.hpoints(), u);
        if self.is_rational() {
            rational_derivative(value, deriv)
        } else {
            deriv.xyz()
        }
    }
}

impl ParamCurve for NurbsCurve3 {
    fn hull_points(&self, t0: f64, t1: f64, knot_tol: f64) -> Vec<Point3> {
        match self.segment(t0, t1, knot_tol) {
            Ok(seg) => seg.control_points,
            Err(_) => vec![self.point_at(t0)],
        }
    }

    fn tangent_directions(&self, t0: f64, t1: f64, knot_tol: f64) -> Vec<Vec3> {
        match self.segment(t0, t1, knot_tol) {
            Ok(seg) => polygon_tangent_directions(&seg.control_points, seg.is_rational()),
            Err(_) => vec![self.derivative_at(t0)],
        }
    }

    fn interior_knots(&self, t0: f64, t1: f64, knot_tol: f64) -> Vec<f64> {
        bspline::interior_knots(&self.knots, t0, t1, knot_tol)
    }

    fn clone_box(&self) -> Box<dyn ParamCurve> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bezier_segment_matches_original() {
        let bez = CubicBezier3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
            Point3::new(3.0, -2.0, 1.0),
            Point3::new(4.0, 1.0, 0.0),
        );
        let seg = bez.segment(0.25, 0.75);
        assert!(seg[0].distance_to(bez.point_at(0.25)) < 1e-12);
        assert!(seg[3].distance_to(bez.point_at(0.75)) < 1e-12);
        let piece = CubicBezier3::new(seg[0], seg[1], seg[2], seg[3]);
        assert!(piece.point_at(0.5).distance_to(bez.point_at(0.5)) < 1e-12);
    }

    #[test]
    fn nurbs_derivative_matches_finite_difference() {
        let curve = NurbsCurve3::clamped_uniform(
            3,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(2.0, -1.0, 0.0),
                Point3::new(3.0, 2.0, 1.0),
                Point3::new(4.0, 0.0, 0.0),
            ],
        )
        .unwrap();
        let t = 0.37;
        let h = 1e-6;
        let fd = curve.point_at(t + h).sub_point(curve.point_at(t - h)).div_scalar(2.0 * h);
        assert!(fd.sub(curve.derivative_at(t)).length() < 1e-5);
    }

    #[test]
    fn nurbs_rejects_empty_domain() {
        let err = NurbsCurve3::new(
            1,
            vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)],
            vec![0.0, 1.0, 1.0, 1.0],
            None,
        );
        assert!(err.is_err());
    }

    #[test]
    fn segment_end_snaps_onto_nearby_knot() {
        let curve = NurbsCurve3::clamped_uniform(
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(3.0, 2.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
            ],
        )
        .unwrap();
        let loose = curve.segment(0.0, 0.5005, 1e-3).unwrap();
        assert_eq!(loose.knots.last().copied(), Some(0.5));
        assert_eq!(loose.control_points.len(), 3);
        assert!(loose.control_points[2].distance_to(curve.point_at(0.5)) < 1e-12);

        let tight = curve.segment(0.0, 0.5005, 1e-10).unwrap();
        assert_eq!(tight.knots.last().copied(), Some(0.5005));
        assert!(tight.control_points.last().unwrap().distance_to(curve.point_at(0.5005)) < 1e-12);
    }
}
