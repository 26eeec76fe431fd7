//! Curve against surface.

use super::error::IntersectionError;
use super::factory;
use super::geo_tol::GeoTol;
use super::intersector::{Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification};
use super::intersector_2obj::{Intersector2Obj, sort_parameter_directions};
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamCurveInt, ParamGeomInt, ParamSurfaceInt};
use super::result::{CoincidenceInterval, IntersectionPoint, IntersectionPool, PointKind};

#[derive(Debug, Clone)]
pub struct CvSfIntersector {
    base: Intersector2Obj,
    cv_idx: usize,
    sf_idx: usize,
    curve: ParamCurveInt,
    surface: ParamSurfaceInt,
}

impl CvSfIntersector {
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
        const ROLES: [GeomKind; 2] = [GeomKind::Curve, GeomKind::Surface];

        let base = Intersector2Obj::new(obj1, obj2, ctx);
        let [cv_idx, sf_idx] = sort_parameter_directions(base.objects(), ROLES)?;
        let (Some(curve), Some(surface)) = (
            base.object(cv_idx).as_curve().cloned(),
            base.object(sf_idx).as_surface().cloned(),
        ) else {
            return Err(IntersectionError::roles(ROLES, [base.object(0).kind(), base.object(1).kind()]));
        };
        Ok(Self {
            base,
            cv_idx,
            sf_idx,
            curve,
            surface,
        })
    }

    #[must_use]
    pub const fn cv_idx(&self) -> usize {
        self.cv_idx
    }

    #[must_use]
    pub const fn sf_idx(&self) -> usize {
        self.sf_idx
    }

    /// Node parameters from curve and surface local parameters.
    fn node_params(&self, t: &[f64], uv: &[f64]) -> Vec<f64> {
        if self.cv_idx == 0 {
            self.base.join_params(t, uv)
        } else {
            self.base.join_params(uv, t)
        }
    }
}

impl Intersector for CvSfIntersector {
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
        self.base.interception(&self.base.curve_axes(), &self.base.surface_normals())
    }

    /// Every curve sample projects onto the patch within ε.
    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        let n = self.base.context().options.coincidence_samples.max(2);
        let samples = self.base.sample_params(self.cv_idx, n);
        let projected = self.base.samples_on_other(self.cv_idx, &samples)?;
        let (first, last) = (projected.first()?, projected.last()?);
        let (t0, t1) = self.curve.range();
        Some(CoincidenceInterval {
            start: self.node_params(&[t0], first),
            end: self.node_params(&[t1], last),
        })
    }

    fn is_micro(&self) -> bool {
        self.base.is_micro()
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        self.base.micro_point(|p| classify(&self.base, self.cv_idx, p))
    }

    /// A collapsed curve piece becomes a point against the surface; a
    /// collapsed surface direction becomes an iso-curve against the curve.
    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        let Some(param) = self.base.collapsed_parameter() else {
            return Ok(None);
        };
        let (a, b) = self.base.range(param);
        factory::lower_order_intersector(&self.base, param, 0.5 * (a + b)).map(Some)
    }

    /// A curve piece whose tangent cone stays clear of a nearly planar
    /// patch crosses it at most once.
    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        let bend = self.base.tol().bend();
        let Some(cone) = self.curve.tangent_cone().filter(|c| c.is_narrow(bend)) else {
            return Ok(LinearCase::NotLinear);
        };
        let Some((normal, cu, cv)) = self.surface.normal_axis(bend) else {
            return Ok(LinearCase::NotLinear);
        };
        let crossing = cone.axis.dot(normal).abs().clamp(0.0, 1.0).asin();
        if crossing <= cone.half_angle() + cu.half_angle().max(cv.half_angle()) {
            return Ok(LinearCase::NotLinear);
        }

        let min = self.base.closest_from(&self.base.mid_params());
        if min.distance <= self.base.epsge() {
            let kind = classify(&self.base, self.cv_idx, &min.params);
            Ok(LinearCase::Solved(vec![self.base.point_result(min.params, kind)]))
        } else if min.converged && self.base.is_interior(&min.params) {
            Ok(LinearCase::Solved(Vec::new()))
        } else {
            Ok(LinearCase::NotLinear)
        }
    }

    fn subdivision_parameter(&self) -> SubdivisionClassification {
        if self.interception() == Interception::Excluded {
            return SubdivisionClassification::NoSolution;
        }
        self.base.widest_split()
    }

    fn subdivide(&self, split: Split) -> Result<Vec<Box<dyn Intersector>>, IntersectionError> {
        factory::subdivided(&self.base, split, Self::from_context)
    }

    fn repair_intersections(&mut self) -> usize {
        let cv_idx = self.cv_idx;
        self.base
            .repair_with(|base, result| base.collapse_if_small(result, |p| classify(base, cv_idx, p)))
    }
}

/// Tangential when the curve runs within `ref_ang` of the tangent plane.
fn classify(base: &Intersector2Obj, cv_idx: usize, params: &[f64]) -> PointKind {
    let (p1, p2) = base.split_params(params);
    let (t, uv) = if cv_idx == 0 { (p1, p2) } else { (p2, p1) };
    let tangent = base.object(cv_idx).derivatives_at(t)[0].normalized();
    let partials = base.object(1 - cv_idx).derivatives_at(uv);
    let normal = partials[0].cross(partials[1]).normalized();
    match (tangent, normal) {
        (Some(tangent), Some(normal)) if tangent.dot(normal).abs() >= base.tol().ref_ang().sin() => PointKind::Isolated,
        _ => PointKind::Tangential,
    }
}
