//! Surface against surface.
//!
//! Intersections of two surfaces are curves. The search subdivides until
//! both patches are nearly planar and cross transversally, then samples the
//! intersection curve by handing iso-curves of the first patch down to the
//! curve/surface intersector. [`SfSfIntersector::intersection_curves`]
//! chains the sampled points back into polylines.

use super::error::IntersectionError;
use super::factory;
use super::geo_tol::GeoTol;
use super::intersector::{Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification};
use super::intersector_2obj::{Intersector2Obj, line_angle, sort_parameter_directions};
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamGeomInt};
use super::result::{CoincidenceInterval, IntersectionCurve, IntersectionPoint, IntersectionPool, PointKind};
use crate::geom::{Point3, Vec3};

#[derive(Debug, Clone)]
pub struct SfSfIntersector {
    base: Intersector2Obj,
}

impl SfSfIntersector {
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
        let base = Intersector2Obj::new(obj1, obj2, ctx);
        sort_parameter_directions(base.objects(), [GeomKind::Surface, GeomKind::Surface])?;
        Ok(Self { base })
    }

    /// Chains the point results into polylines.
    ///
    /// Greedy nearest neighbour: a chain grows at either end by the closest
    /// unused point no farther than `max_gap` in model space. Coincidence
    /// results are not part of any curve.
    #[must_use]
    pub fn intersection_curves(&self, max_gap: f64) -> Vec<IntersectionCurve> {
        let mut remaining: Vec<(Point3, IntersectionPoint)> = self
            .base
            .pool()
            .points()
            .map(|p| {
                let (a, b) = self.base.positions(&p.params);
                (a.lerp(b, 0.5), p.clone())
            })
            .collect();

        let mut curves = Vec::new();
        while !remaining.is_empty() {
            let mut chain = vec![remaining.swap_remove(0)];
            for at_tail in [true, false] {
                loop {
                    let end = if at_tail { chain[chain.len() - 1].0 } else { chain[0].0 };
                    let nearest = remaining
                        .iter()
                        .enumerate()
                        .map(|(i, (p, _))| (i, p.distance_to(end)))
                        .filter(|&(_, d)| d <= max_gap)
                        .min_by(|a, b| a.1.total_cmp(&b.1));
                    let Some((i, _)) = nearest else {
                        break;
                    };
                    let next = remaining.swap_remove(i);
                    if at_tail {
                        chain.push(next);
                    } else {
                        chain.insert(0, next);
                    }
                }
            }
            curves.push(IntersectionCurve {
                points: chain.into_iter().map(|(_, p)| p).collect(),
            });
        }
        curves
    }
}

fn unit_normal(base: &Intersector2Obj, i: usize, uv: &[f64]) -> Option<Vec3> {
    let partials = base.object(i).derivatives_at(uv);
    partials[0].cross(partials[1]).normalized()
}

/// Tangential when the normals are within `ref_ang` of parallel.
fn classify(base: &Intersector2Obj, params: &[f64]) -> PointKind {
    let (p1, p2) = base.split_params(params);
    match (unit_normal(base, 0, p1), unit_normal(base, 1, p2)) {
        (Some(n1), Some(n2)) if line_angle(n1, n2).is_some_and(|a| a >= base.tol().ref_ang()) => PointKind::Isolated,
        _ => PointKind::Tangential,
    }
}

impl Intersector for SfSfIntersector {
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
        self.base.interception(&[], &self.base.surface_normals())
    }

    /// Sample grids of each patch project onto the other within ε.
    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        let n = self.base.context().options.coincidence_samples.max(2);
        let first = self.base.sample_params(0, n);
        let projected = self.base.samples_on_other(0, &first)?;
        self.base.samples_on_other(1, &self.base.sample_params(1, n))?;
        Some(CoincidenceInterval {
            start: self.base.join_params(first.first()?, projected.first()?),
            end: self.base.join_params(first.last()?, projected.last()?),
        })
    }

    fn is_micro(&self) -> bool {
        self.base.is_micro()
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        self.base.micro_point(|p| classify(&self.base, p))
    }

    /// A collapsed direction of either patch becomes an iso-curve against
    /// the other patch.
    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        let Some(param) = self.base.collapsed_parameter() else {
            return Ok(None);
        };
        let (a, b) = self.base.range(param);
        factory::lower_order_intersector(&self.base, param, 0.5 * (a + b)).map(Some)
    }

    /// Two nearly planar patches whose normal cones are clearly apart meet
    /// along a single transversal curve branch. It is sampled by iso-curves
    /// of the first patch in both directions.
    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        let bend = self.base.tol().bend();
        let axes: Option<Vec<(Vec3, f64)>> = (0..2)
            .map(|i| {
                let (normal, cu, cv) = self.base.object(i).as_surface()?.normal_axis(bend)?;
                Some((normal, cu.half_angle().max(cv.half_angle())))
            })
            .collect();
        let Some(axes) = axes else {
            return Ok(LinearCase::NotLinear);
        };
        let Some(angle) = line_angle(axes[0].0, axes[1].0) else {
            return Ok(LinearCase::NotLinear);
        };
        if angle <= axes[0].1 + axes[1].1 {
            return Ok(LinearCase::NotLinear);
        }

        let n = self.base.context().options.sfsf_iso_samples.max(2);
        let mut children = Vec::with_capacity(2 * n);
        for param in 0..2 {
            let (a, b) = self.base.range(param);
            for k in 0..n {
                let value = a + (b - a) * k as f64 / (n - 1) as f64;
                children.push(factory::lower_order_intersector(&self.base, param, value)?);
            }
        }
        Ok(LinearCase::Reduced(children))
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
        self.base
            .repair_with(|base, result| base.collapse_if_small(result, |p| classify(base, p)))
    }
}
