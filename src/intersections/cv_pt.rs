//! Curve against point.
//!
//! The workhorse of the family: every higher-order pair eventually hands
//! collapsed geometry down to this intersector.

use super::error::IntersectionError;
use super::factory;
use super::geo_tol::GeoTol;
use super::hull::{self, ConeBound};
use super::intersector::{Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification};
use super::intersector_2obj::{Intersector2Obj, sort_parameter_directions};
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamCurveInt, ParamGeomInt};
use super::result::{CoincidenceInterval, IntersectionPoint, IntersectionPool, PointKind};
use crate::geom::{BBox, Point3, Vec3};

/// Samples used to look for a local maximum of the distance.
const SIGN_SAMPLES: usize = 8;

#[derive(Debug, Clone)]
pub struct CvPtIntersector {
    base: Intersector2Obj,
    cv_idx: usize,
    pt_idx: usize,
    curve: ParamCurveInt,
    point: Point3,
}

impl CvPtIntersector {
    /// Either operand order is accepted; exactly one operand must be a
    /// curve and the other a point.
    pub fn new(obj1: ParamGeomInt, obj2: ParamGeomInt, tol: GeoTol) -> Result<Self, IntersectionError> {
        Self::with_options(obj1, obj2, tol, IntersectOptions::default())
    }

    pub fn with_options(
        obj1: ParamGeomInt,
        obj2: ParamGeomInt,
        tol: GeoTol,
        options: IntersectOptions,
    ) -> Result<Self, IntersectionError> {
        Self::from_context(obj1, obj2, NodeContext::root(tol, options))
    }

    pub(crate) fn from_context(
        obj1: ParamGeomInt,
        obj2: ParamGeomInt,
        ctx: NodeContext,
    ) -> Result<Self, IntersectionError> {
        const ROLES: [GeomKind; 2] = [GeomKind::Curve, GeomKind::Point];

        let base = Intersector2Obj::new(obj1, obj2, ctx);
        let [cv_idx, pt_idx] = sort_parameter_directions(base.objects(), ROLES)?;
        let (Some(curve), Some(point)) = (base.object(cv_idx).as_curve().cloned(), base.object(pt_idx).as_point())
        else {
            return Err(IntersectionError::roles(ROLES, [base.object(0).kind(), base.object(1).kind()]));
        };
        Ok(Self {
            base,
            cv_idx,
            pt_idx,
            curve,
            point,
        })
    }

    /// Index of the curve operand.
    #[must_use]
    pub const fn cv_idx(&self) -> usize {
        self.cv_idx
    }

    /// Index of the point operand.
    #[must_use]
    pub const fn pt_idx(&self) -> usize {
        self.pt_idx
    }

    fn curve_extent(&self) -> f64 {
        BBox::from_points(&self.curve.hull_points()).map_or(0.0, BBox::diagonal)
    }

    /// `(C(t) - P) · C'(t)`, half the derivative of the squared distance.
    fn distance_slope(&self, t: f64) -> f64 {
        self.curve
            .point_at(t)
            .sub_point(self.point)
            .dot(self.curve.derivative_at(t))
    }

    fn min_width(&self) -> f64 {
        let (a, b) = self.curve.full_range();
        self.base.tol().min_param_width(b - a)
    }

    /// Root of the increasing function `h` on `[a, b]`, given `h(a) < 0 < h(b)`.
    fn bisect(&self, h: impl Fn(f64) -> f64, mut a: f64, mut b: f64) -> f64 {
        let min_width = self.min_width();
        for _ in 0..100 {
            if b - a <= min_width {
                break;
            }
            let mid = 0.5 * (a + b);
            if h(mid) < 0.0 {
                a = mid;
            } else {
                b = mid;
            }
        }
        0.5 * (a + b)
    }

    /// A local maximum of the distance strictly inside the subdomain, where
    /// the slope changes sign from + to -.
    fn distance_maximum(&self) -> Option<f64> {
        let (t0, t1) = self.curve.range();
        let ts: Vec<f64> = (0..=SIGN_SAMPLES)
            .map(|k| t0 + (t1 - t0) * k as f64 / SIGN_SAMPLES as f64)
            .collect();
        let slopes: Vec<f64> = ts.iter().map(|&t| self.distance_slope(t)).collect();
        (0..SIGN_SAMPLES)
            .find(|&k| slopes[k] > 0.0 && slopes[k + 1] <= 0.0)
            .map(|k| self.bisect(|t| -self.distance_slope(t), ts[k], ts[k + 1]))
    }
}

impl Intersector for CvPtIntersector {
    fn context(&self) -> &NodeContext {
        self.base.context()
    }

    fn num_params(&self) -> usize {
        self.base.num_params()
    }

    fn pool(&self) -> &IntersectionPool {
        self.base.pool()
    }

    fn pool_mut(&mut self) -> &mut IntersectionPool {
        self.base.pool_mut()
    }

    fn same_intersection(&self, a: &[f64], b: &[f64]) -> bool {
        self.base.same_intersection(a, b)
    }

    fn interception(&self) -> Interception {
        self.base.interception(&self.base.curve_axes(), &[])
    }

    /// The whole curve piece stays inside the ε-ball around the point.
    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        let reach = hull::max_distance_to(&self.curve.hull_points(), self.point);
        (reach <= self.base.epsge()).then(|| {
            let (t0, t1) = self.curve.range();
            CoincidenceInterval {
                start: vec![t0],
                end: vec![t1],
            }
        })
    }

    fn is_micro(&self) -> bool {
        self.base.is_micro()
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        self.base.micro_point(|_| PointKind::Isolated)
    }

    /// A curve piece smaller than ε is replaced by its point closest to the
    /// target, leaving a point/point test.
    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        if self.curve_extent() >= self.base.epsge() {
            return Ok(None);
        }
        let closest = self.base.closest_from(&[self.curve.mid()]);
        factory::lower_order_intersector(&self.base, 0, closest.params[0]).map(Some)
    }

    /// With every tangent inside a cone of half-angle below `bend`, the
    /// projection `h(t) = (C(t) - P) · a` onto the cone axis is increasing,
    /// so all points within ε of `P` sit around the single root of `h`.
    ///
    /// A polygon leg shorter than ε may belong to a run where the curve
    /// stalls, and `h` is then flat over a whole parameter interval. Such
    /// pieces are left to subdivision and the coincidence test.
    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        let eps = self.base.epsge();
        let legs = self.curve.tangent_directions();
        if legs.iter().any(|leg| leg.length() < eps) {
            return Ok(LinearCase::NotLinear);
        }
        let Some(cone) = ConeBound::from_directions(&legs, 1e-300) else {
            return Ok(LinearCase::NotLinear);
        };
        if !cone.is_narrow(self.base.tol().bend()) {
            return Ok(LinearCase::NotLinear);
        }

        let axis: Vec3 = cone.axis;
        let h = |t: f64| self.curve.point_at(t).sub_point(self.point).dot(axis);
        let (t0, t1) = self.curve.range();
        let (h0, h1) = (h(t0), h(t1));
        if h0 > eps || h1 < -eps {
            return Ok(LinearCase::Solved(Vec::new()));
        }

        let start = if h0 >= 0.0 {
            t0
        } else if h1 <= 0.0 {
            t1
        } else {
            self.bisect(h, t0, t1)
        };
        let min = self.base.closest_from(&[start]);
        if min.distance <= eps {
            let point = self.base.point_result(min.params, PointKind::Isolated);
            Ok(LinearCase::Solved(vec![point]))
        } else if min.converged {
            Ok(LinearCase::Solved(Vec::new()))
        } else {
            Ok(LinearCase::NotLinear)
        }
    }

    /// Prefers a local maximum of the distance, which separates two
    /// candidate minima; then an interior knot; then the midpoint.
    fn subdivision_parameter(&self) -> SubdivisionClassification {
        if self.interception() == Interception::Excluded {
            return SubdivisionClassification::NoSolution;
        }
        let (t0, t1) = self.curve.range();
        let width = t1 - t0;
        if width <= self.min_width() {
            return SubdivisionClassification::CannotDivide;
        }
        match self.distance_maximum() {
            Some(t) => {
                let value = t.clamp(t0 + 0.1 * width, t1 - 0.1 * width);
                SubdivisionClassification::DivideOk(Split { param: 0, value })
            }
            None => self.base.split_of(0),
        }
    }

    fn subdivide(&self, split: Split) -> Result<Vec<Box<dyn Intersector>>, IntersectionError> {
        factory::subdivided(&self.base, split, Self::from_context)
    }

    fn repair_intersections(&mut self) -> usize {
        self.base.repair_with(Intersector2Obj::collapse_pass_through)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Line3, NurbsCurve3};
    use crate::intersections::result::IntersectionResult;

    fn tol() -> GeoTol {
        GeoTol::new(1e-3).unwrap()
    }

    fn line() -> ParamGeomInt {
        ParamGeomInt::curve_copy(&Line3::new(Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0))).unwrap()
    }

    #[test]
    fn roles_are_sorted_at_construction() {
        let node = CvPtIntersector::new(ParamGeomInt::point(Point3::ORIGIN), line(), tol()).unwrap();
        assert_eq!((node.cv_idx(), node.pt_idx()), (1, 0));
        assert_eq!(node.num_params(), 1);

        let err = CvPtIntersector::new(line(), line(), tol()).unwrap_err();
        assert!(matches!(err, IntersectionError::OperandRoles { .. }));
    }

    #[test]
    fn straight_line_resolves_in_linear_case() {
        let mut node = CvPtIntersector::new(line(), ParamGeomInt::point(Point3::new(5.0, 0.0005, 0.0)), tol()).unwrap();
        let diag = node.compute_with_diagnostics().unwrap();
        assert_eq!(diag.node_count, 1);
        assert_eq!(diag.linear_count, 1);
        let hit = node.results()[0].as_point().unwrap();
        assert!((hit.params[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn splits_at_distance_maximum() {
        // Arch over the point: two feet near the point, the apex far away.
        let arch = NurbsCurve3::clamped_uniform(
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 4.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
        )
        .unwrap();
        let node = CvPtIntersector::new(
            ParamGeomInt::curve_copy(&arch).unwrap(),
            ParamGeomInt::point(Point3::new(1.0, 0.0, 0.0)),
            tol(),
        )
        .unwrap();
        match node.subdivision_parameter() {
            SubdivisionClassification::DivideOk(split) => assert!((split.value - 0.5).abs() < 1e-6),
            other => panic!("unexpected classification {other:?}"),
        }
    }

    #[test]
    fn stalled_curve_reports_the_stall_as_an_interval() {
        // Three equal control points pin the curve to P over [1/3, 2/3].
        let p = Point3::new(2.0, 1.0, 0.0);
        let stall = NurbsCurve3::clamped_uniform(
            2,
            vec![Point3::new(0.0, 0.0, 0.0), p, p, p, Point3::new(4.0, 0.0, 0.0)],
        )
        .unwrap();
        let curve = ParamGeomInt::curve_copy(&stall).unwrap();

        let root = CvPtIntersector::new(curve.clone(), ParamGeomInt::point(p), tol()).unwrap();
        assert!(matches!(root.linear_case(), Ok(LinearCase::NotLinear)));

        let mut node = CvPtIntersector::new(curve, ParamGeomInt::point(p), tol()).unwrap();
        let diag = node.compute_with_diagnostics().unwrap();
        assert!(diag.is_complete());
        assert_eq!(node.results().len(), 1, "{:?}", node.results());
        let IntersectionResult::Coincidence(interval) = &node.results()[0] else {
            panic!("expected a coincidence interval, got {:?}", node.results());
        };
        let (a, b) = (interval.start[0].min(interval.end[0]), interval.start[0].max(interval.end[0]));
        assert!(a <= 1.0 / 3.0 + 1e-9 && a > 0.3, "interval starts at {a}");
        assert!(b >= 2.0 / 3.0 - 1e-9 && b < 0.7, "interval ends at {b}");
    }
}
