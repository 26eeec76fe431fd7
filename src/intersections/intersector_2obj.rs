//! State and pairwise numerics common to every two-operand intersector.
//!
//! Parameters of a node are laid out operand by operand: the first
//! operand's local parameters, then the second's. A curve/surface pair
//! therefore works in `[t, u, v]`, a surface/surface pair in
//! `[u1, v1, u2, v2]`.

use super::error::IntersectionError;
use super::geo_tol::GeoTol;
use super::hull::{self, ConeBound};
use super::intersector::{Interception, NodeContext, Split, SubdivisionClassification};
use super::param_geom_int::{GeomKind, ParamGeomInt};
use super::result::{IntersectionPoint, IntersectionPool, IntersectionResult, PointKind};
use super::solve::{Minimum, minimize_distance};
use crate::geom::{BBox, Point3, Vec3};

/// Resolves which operand plays which role.
///
/// Returns the operand indices in the order of `expected`. Fails when the
/// operands match neither ordering.
pub fn sort_parameter_directions(
    objects: &[ParamGeomInt; 2],
    expected: [GeomKind; 2],
) -> Result<[usize; 2], IntersectionError> {
    let found = [objects[0].kind(), objects[1].kind()];
    if found == expected {
        Ok([0, 1])
    } else if found == [expected[1], expected[0]] {
        Ok([1, 0])
    } else {
        Err(IntersectionError::roles(expected, found))
    }
}

#[derive(Debug, Clone)]
pub struct Intersector2Obj {
    objects: [ParamGeomInt; 2],
    ctx: NodeContext,
    pool: IntersectionPool,
}

impl Intersector2Obj {
    #[must_use]
    /// Both operands take the knot tolerance of `ctx`.
    pub fn new(obj1: ParamGeomInt, obj2: ParamGeomInt, ctx: NodeContext) -> Self {
        let knot_tol = ctx.tol.knot_tol();
        Self {
            objects: [obj1.with_knot_tol(knot_tol), obj2.with_knot_tol(knot_tol)],
            ctx,
            pool: IntersectionPool::new(),
        }
    }

    #[must_use]
    pub const fn objects(&self) -> &[ParamGeomInt; 2] {
        &self.objects
    }

    #[must_use]
    pub const fn object(&self, i: usize) -> &ParamGeomInt {
        &self.objects[i]
    }

    #[must_use]
    pub const fn context(&self) -> &NodeContext {
        &self.ctx
    }

    #[must_use]
    pub const fn pool(&self) -> &IntersectionPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut IntersectionPool {
        &mut self.pool
    }

    #[must_use]
    pub const fn tol(&self) -> GeoTol {
        self.ctx.tol
    }

    #[must_use]
    pub const fn epsge(&self) -> f64 {
        self.ctx.tol.epsge()
    }

    /// Sum of the operands' free parameters.
    #[must_use]
    pub const fn num_params(&self) -> usize {
        self.objects[0].num_params() + self.objects[1].num_params()
    }

    /// Position of operand `i`'s first parameter in the node's vector.
    #[must_use]
    pub const fn offset(&self, i: usize) -> usize {
        if i == 0 { 0 } else { self.objects[0].num_params() }
    }

    /// `(operand, local index)` owning node parameter `param`.
    #[must_use]
    pub const fn locate(&self, param: usize) -> (usize, usize) {
        let first = self.objects[0].num_params();
        if param < first { (0, param) } else { (1, param - first) }
    }

    #[must_use]
    pub fn split_params<'a>(&self, params: &'a [f64]) -> (&'a [f64], &'a [f64]) {
        params.split_at(self.objects[0].num_params())
    }

    #[must_use]
    pub fn positions(&self, params: &[f64]) -> (Point3, Point3) {
        let (p1, p2) = self.split_params(params);
        (self.objects[0].point_at(p1), self.objects[1].point_at(p2))
    }

    #[must_use]
    pub fn distance_at(&self, params: &[f64]) -> f64 {
        let (a, b) = self.positions(params);
        a.distance_to(b)
    }

    #[must_use]
    pub fn range(&self, param: usize) -> (f64, f64) {
        let (i, local) = self.locate(param);
        self.objects[i].range(local)
    }

    #[must_use]
    pub fn full_range(&self, param: usize) -> (f64, f64) {
        let (i, local) = self.locate(param);
        self.objects[i].full_range(local)
    }

    #[must_use]
    pub fn start_params(&self) -> Vec<f64> {
        let mut out = self.objects[0].start_params();
        out.extend(self.objects[1].start_params());
        out
    }

    #[must_use]
    pub fn end_params(&self) -> Vec<f64> {
        let mut out = self.objects[0].end_params();
        out.extend(self.objects[1].end_params());
        out
    }

    #[must_use]
    pub fn mid_params(&self) -> Vec<f64> {
        let mut out = self.objects[0].mid_params();
        out.extend(self.objects[1].mid_params());
        out
    }

    fn min_width(&self, param: usize) -> f64 {
        let (a, b) = self.full_range(param);
        self.ctx.tol.min_param_width(b - a)
    }

    /// Every parameter is away from the subdomain boundary by more than
    /// the parameter resolution.
    #[must_use]
    pub fn is_interior(&self, params: &[f64]) -> bool {
        params.iter().enumerate().all(|(i, &x)| {
            let (a, b) = self.range(i);
            let slack = self.min_width(i);
            x - a > slack && b - x > slack
        })
    }

    /// Residual `P1 - P2` and its Jacobian columns.
    #[must_use]
    pub fn residual(&self, params: &[f64]) -> (Vec3, Vec<Vec3>) {
        let (p1, p2) = self.split_params(params);
        let r = self.objects[0].point_at(p1).sub_point(self.objects[1].point_at(p2));
        let mut columns = self.objects[0].derivatives_at(p1);
        columns.extend(self.objects[1].derivatives_at(p2).into_iter().map(|d| -d));
        (r, columns)
    }

    /// Local minimum of the operand distance inside the current subdomain.
    #[must_use]
    pub(crate) fn closest_from(&self, start: &[f64]) -> Minimum {
        minimize_distance(
            start,
            &self.start_params(),
            &self.end_params(),
            self.ctx.options.newton_iterations,
            self.ctx.tol.numerical_tol(),
            |p| self.residual(p),
        )
    }

    /// Closest point of operand `target` to `point`, starting from local
    /// parameters `start`.
    #[must_use]
    pub(crate) fn project_onto(&self, target: usize, point: Point3, start: &[f64]) -> Minimum {
        let obj = &self.objects[target];
        minimize_distance(
            start,
            &obj.start_params(),
            &obj.end_params(),
            self.ctx.options.newton_iterations,
            self.ctx.tol.numerical_tol(),
            |p| (obj.point_at(p).sub_point(point), obj.derivatives_at(p)),
        )
    }

    #[must_use]
    pub fn point_result(&self, params: Vec<f64>, kind: PointKind) -> IntersectionPoint {
        let distance = self.distance_at(&params);
        IntersectionPoint { params, distance, kind }
    }

    /// Two parameter vectors are the same intersection when their images
    /// lie within ε of each other and the operands still meet halfway
    /// between them.
    #[must_use]
    pub fn same_intersection(&self, a: &[f64], b: &[f64]) -> bool {
        if a == b {
            return true;
        }
        let eps = self.epsge();
        let (a1, a2) = self.positions(a);
        let (b1, b2) = self.positions(b);
        if a1.lerp(a2, 0.5).distance_to(b1.lerp(b2, 0.5)) > eps {
            return false;
        }
        let mid: Vec<f64> = a.iter().zip(b).map(|(x, y)| 0.5 * (x + y)).collect();
        self.distance_at(&mid) <= 2.0 * eps
    }

    /// Hull separation test. `axes` are tangent cone axes to project out of
    /// the centroid direction; `normals` are tried as they are.
    #[must_use]
    pub fn interception(&self, axes: &[Vec3], normals: &[Vec3]) -> Interception {
        let gap = hull::separation(&self.objects[0].hull_points(), &self.objects[1].hull_points(), axes, normals);
        if gap > self.epsge() {
            Interception::Excluded
        } else {
            Interception::Possible
        }
    }

    /// Tangent cone axes of the curve operands, for [`Self::interception`].
    #[must_use]
    pub fn curve_axes(&self) -> Vec<Vec3> {
        self.objects
            .iter()
            .filter_map(ParamGeomInt::as_curve)
            .filter_map(|c| c.tangent_cone())
            .map(|cone| cone.axis)
            .collect()
    }

    /// Approximate normals of near-planar surface operands.
    #[must_use]
    pub fn surface_normals(&self) -> Vec<Vec3> {
        let bend = self.ctx.tol.bend();
        self.objects
            .iter()
            .filter_map(ParamGeomInt::as_surface)
            .filter_map(|s| s.normal_axis(bend))
            .map(|(normal, _, _)| normal)
            .collect()
    }

    /// Every parameter is at resolution, or both operands are smaller
    /// than ε.
    #[must_use]
    pub fn is_micro(&self) -> bool {
        let at_resolution = (0..self.num_params()).all(|i| {
            let (a, b) = self.range(i);
            b - a <= self.min_width(i)
        });
        at_resolution || self.objects.iter().all(|o| o.extent() < self.epsge())
    }

    /// Refines from the middle of the subdomain; a point when the operands
    /// meet there.
    #[must_use]
    pub fn micro_point(&self, kind: impl Fn(&[f64]) -> PointKind) -> Option<IntersectionPoint> {
        let min = self.closest_from(&self.mid_params());
        (min.distance <= self.epsge()).then(|| {
            let k = kind(&min.params);
            self.point_result(min.params, k)
        })
    }

    /// The most collapsed parameter: the one whose variation moves its
    /// operand by less than ε over the subdomain.
    #[must_use]
    pub fn collapsed_parameter(&self) -> Option<usize> {
        let eps = self.epsge();
        (0..self.num_params())
            .map(|param| {
                let (i, local) = self.locate(param);
                (param, self.objects[i].extent_along(local))
            })
            .filter(|&(_, extent)| extent < eps)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(param, _)| param)
    }

    /// Operands with parameter `param` fixed at `value`, in node order.
    #[must_use]
    pub fn eliminate(&self, param: usize, value: f64) -> Option<(ParamGeomInt, ParamGeomInt)> {
        let (i, local) = self.locate(param);
        let reduced = self.objects[i].reduced(local, value)?;
        Some(if i == 0 {
            (reduced, self.objects[1].clone())
        } else {
            (self.objects[0].clone(), reduced)
        })
    }

    /// Operand pairs of the two halves produced by `split`.
    #[must_use]
    pub fn split_operands(&self, split: Split) -> Option<[(ParamGeomInt, ParamGeomInt); 2]> {
        let (i, local) = self.locate(split.param);
        let (left, right) = self.objects[i].split(local, split.value)?;
        let other = &self.objects[1 - i];
        Some(if i == 0 {
            [(left, other.clone()), (right, other.clone())]
        } else {
            [(other.clone(), left), (other.clone(), right)]
        })
    }

    /// Split choice for `param`: an interior knot near the middle when
    /// there is one, otherwise the midpoint.
    #[must_use]
    pub fn split_of(&self, param: usize) -> SubdivisionClassification {
        let (a, b) = self.range(param);
        let width = b - a;
        if width <= self.min_width(param) {
            return SubdivisionClassification::CannotDivide;
        }
        let mid = 0.5 * (a + b);
        let (i, local) = self.locate(param);
        let knot = self.objects[i]
            .interior_knots(local)
            .into_iter()
            .filter(|k| k - a >= 0.1 * width && b - k >= 0.1 * width)
            .min_by(|x, y| (x - mid).abs().total_cmp(&(y - mid).abs()));
        match knot {
            Some(value) => SubdivisionClassification::DivideKnot(Split { param, value }),
            None if mid > a && mid < b => SubdivisionClassification::DivideOk(Split { param, value: mid }),
            None => SubdivisionClassification::CannotDivide,
        }
    }

    /// Splits the operand with the largest extent along its longest
    /// direction, skipping parameters already at resolution.
    #[must_use]
    pub fn widest_split(&self) -> SubdivisionClassification {
        let mut candidates: Vec<(usize, f64)> = (0..self.num_params())
            .map(|param| {
                let (i, local) = self.locate(param);
                (param, self.objects[i].extent_along(local))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates
            .into_iter()
            .map(|(param, _)| self.split_of(param))
            .find(|c| !matches!(c, SubdivisionClassification::CannotDivide))
            .unwrap_or(SubdivisionClassification::CannotDivide)
    }

    /// Grid of local parameters of operand `i`, `n` per direction.
    #[must_use]
    pub fn sample_params(&self, i: usize, n: usize) -> Vec<Vec<f64>> {
        let obj = &self.objects[i];
        let steps = |local: usize| -> Vec<f64> {
            let (a, b) = obj.range(local);
            (0..n).map(|k| a + (b - a) * k as f64 / n.saturating_sub(1).max(1) as f64).collect()
        };
        match obj.num_params() {
            0 => vec![Vec::new()],
            1 => steps(0).into_iter().map(|t| vec![t]).collect(),
            _ => {
                let us = steps(0);
                let vs = steps(1);
                vs.iter().flat_map(|&v| us.iter().map(move |&u| vec![u, v])).collect()
            }
        }
    }

    /// Projects samples of operand `from` onto the other operand. `None`
    /// as soon as one sample is farther than ε; otherwise the projected
    /// local parameters, one per sample.
    #[must_use]
    pub fn samples_on_other(&self, from: usize, samples: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
        let target = 1 - from;
        let mut start = self.objects[target].mid_params();
        let mut out = Vec::with_capacity(samples.len());
        for sample in samples {
            let p = self.objects[from].point_at(sample);
            let mut min = self.project_onto(target, p, &start);
            if min.distance > self.epsge() {
                // Warm starts can get stuck at a boundary; retry from the middle.
                min = self.project_onto(target, p, &self.objects[target].mid_params());
                if min.distance > self.epsge() {
                    return None;
                }
            }
            start.clone_from(&min.params);
            out.push(min.params);
        }
        Some(out)
    }

    /// Rewrites every stored result through `repair` and deduplicates the
    /// outcome. Returns how many results changed or disappeared.
    pub fn repair_with(&mut self, repair: impl Fn(&Self, IntersectionResult) -> (IntersectionResult, bool)) -> usize {
        let results = self.pool.take();
        let mut changed = 0;
        let repaired: Vec<IntersectionResult> = results
            .into_iter()
            .map(|r| {
                let (r, touched) = repair(self, r);
                changed += usize::from(touched);
                r
            })
            .collect();
        let before = repaired.len();
        let mut pool = IntersectionPool::new();
        pool.rebuild(repaired, &|a, b| self.same_intersection(a, b));
        changed += before - pool.len();
        self.pool = pool;
        changed
    }

    /// Curve and surface pairs: an interval whose image is smaller than ε
    /// is a crossing seen through the tolerance, not an overlap.
    #[must_use]
    pub fn collapse_if_small(
        &self,
        result: IntersectionResult,
        kind: impl Fn(&[f64]) -> PointKind,
    ) -> (IntersectionResult, bool) {
        let IntersectionResult::Coincidence(interval) = result else {
            return (result, false);
        };
        let (s1, s2) = self.positions(&interval.start);
        let (e1, e2) = self.positions(&interval.end);
        if s1.lerp(s2, 0.5).distance_to(e1.lerp(e2, 0.5)) >= self.epsge() {
            return (IntersectionResult::Coincidence(interval), false);
        }
        let min = self.closest_from(&interval.mid());
        let k = kind(&min.params);
        (IntersectionResult::Point(self.point_result(min.params, k)), true)
    }

    /// Point pairs: an interval whose image spreads over more than ε is a
    /// pass-through of the ε-ball and collapses to its closest point.
    #[must_use]
    pub fn collapse_pass_through(&self, result: IntersectionResult) -> (IntersectionResult, bool) {
        let IntersectionResult::Coincidence(interval) = result else {
            return (result, false);
        };
        let lo: Vec<f64> = interval.start.iter().zip(&interval.end).map(|(a, b)| a.min(*b)).collect();
        let hi: Vec<f64> = interval.start.iter().zip(&interval.end).map(|(a, b)| a.max(*b)).collect();

        let n = self.ctx.options.coincidence_samples.max(2);
        let mut grid: Vec<Vec<f64>> = vec![Vec::new()];
        for (a, b) in lo.iter().zip(&hi) {
            grid = grid
                .into_iter()
                .flat_map(|prefix| {
                    (0..n).map(move |k| {
                        let mut p = prefix.clone();
                        p.push(a + (b - a) * k as f64 / (n - 1) as f64);
                        p
                    })
                })
                .collect();
        }
        let images: Vec<Point3> = grid
            .iter()
            .map(|p| {
                let (a, b) = self.positions(p);
                a.lerp(b, 0.5)
            })
            .collect();
        let spread = BBox::from_points(&images).map_or(0.0, BBox::diagonal);
        if spread <= self.epsge() {
            return (IntersectionResult::Coincidence(interval), false);
        }

        let min = minimize_distance(
            &interval.mid(),
            &lo,
            &hi,
            self.ctx.options.newton_iterations,
            self.ctx.tol.numerical_tol(),
            |p| self.residual(p),
        );
        (IntersectionResult::Point(self.point_result(min.params, PointKind::Isolated)), true)
    }

    /// Node parameter vector from per-operand local parameters.
    #[must_use]
    pub fn join_params(&self, first: &[f64], second: &[f64]) -> Vec<f64> {
        let mut out = first.to_vec();
        out.extend_from_slice(second);
        out
    }
}

/// Angle between two directions taken as lines, in `[0, π/2]`.
pub(crate) fn line_angle(a: Vec3, b: Vec3) -> Option<f64> {
    let a = a.normalized()?;
    let b = b.normalized()?;
    Some(a.dot(b).abs().clamp(0.0, 1.0).acos())
}

/// Cone of a curve operand, if the operand is a curve with a defined cone.
pub(crate) fn curve_cone(obj: &ParamGeomInt) -> Option<ConeBound> {
    obj.as_curve().and_then(|c| c.tangent_cone())
}
