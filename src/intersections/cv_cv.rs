//! Curve against curve.

use super::error::IntersectionError;
use super::factory;
use super::geo_tol::GeoTol;
use super::intersector::{Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification};
use super::intersector_2obj::{Intersector2Obj, curve_cone, line_angle, sort_parameter_directions};
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamGeomInt};
use super::result::{CoincidenceInterval, IntersectionPoint, IntersectionPool, PointKind};

#[derive(Debug, Clone)]
pub struct CvCvIntersector {
    base: Intersector2Obj,
}

impl CvCvIntersector {
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
        sort_parameter_directions(base.objects(), [GeomKind::Curve, GeomKind::Curve])?;
        Ok(Self { base })
    }

    /// Pairs `(t1, t2)` where an end of one piece lies within ε of the other.
    fn end_correspondences(&self) -> Vec<[f64; 2]> {
        let eps = self.base.epsge();
        let mut pairs: Vec<[f64; 2]> = Vec::new();
        for from in 0..2 {
            let obj = self.base.object(from);
            let target = 1 - from;
            for t in [obj.range(0).0, obj.range(0).1] {
                let p = obj.point_at(&[t]);
                let min = self.base.project_onto(target, p, &self.base.object(target).mid_params());
                if min.distance <= eps {
                    pairs.push(if from == 0 { [t, min.params[0]] } else { [min.params[0], t] });
                }
            }
        }
        pairs
    }
}

fn classify_curves(base: &Intersector2Obj, params: &[f64]) -> PointKind {
    let d1 = base.object(0).derivatives_at(&params[..1]);
    let d2 = base.object(1).derivatives_at(&params[1..]);
    match line_angle(d1[0], d2[0]) {
        Some(angle) if angle >= base.tol().ref_ang() => PointKind::Isolated,
        _ => PointKind::Tangential,
    }
}

impl Intersector for CvCvIntersector {
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

    /// The pieces overlap between two end correspondences (in either
    /// orientation) and sampled points in between project within ε both ways.
    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        let pairs = self.end_correspondences();
        let first = pairs.iter().copied().min_by(|a, b| a[0].total_cmp(&b[0]))?;
        let last = pairs.iter().copied().max_by(|a, b| a[0].total_cmp(&b[0]))?;
        if last[0] <= first[0] || last[1] == first[1] {
            return None;
        }

        let n = self.base.context().options.coincidence_samples.max(2);
        let lerp = |a: f64, b: f64, k: usize| a + (b - a) * k as f64 / (n - 1) as f64;
        let along_first: Vec<Vec<f64>> = (1..n - 1).map(|k| vec![lerp(first[0], last[0], k)]).collect();
        let along_second: Vec<Vec<f64>> = (1..n - 1).map(|k| vec![lerp(first[1], last[1], k)]).collect();
        self.base.samples_on_other(0, &along_first)?;
        self.base.samples_on_other(1, &along_second)?;

        Some(CoincidenceInterval {
            start: first.to_vec(),
            end: last.to_vec(),
        })
    }

    fn is_micro(&self) -> bool {
        self.base.is_micro()
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        self.base.micro_point(|p| classify_curves(&self.base, p))
    }

    /// A piece shorter than ε is fixed at its midpoint: curve against point.
    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        let Some(param) = self.base.collapsed_parameter() else {
            return Ok(None);
        };
        let (a, b) = self.base.range(param);
        factory::lower_order_intersector(&self.base, param, 0.5 * (a + b)).map(Some)
    }

    /// Narrow tangent cones that share no direction: the pieces cross at
    /// most once, and a local minimisation from the middle finds it.
    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        let bend = self.base.tol().bend();
        let (Some(c1), Some(c2)) = (curve_cone(self.base.object(0)), curve_cone(self.base.object(1))) else {
            return Ok(LinearCase::NotLinear);
        };
        if !c1.is_narrow(bend) || !c2.is_narrow(bend) || !c1.separated_from(c2) {
            return Ok(LinearCase::NotLinear);
        }

        let min = self.base.closest_from(&self.base.mid_params());
        if min.distance <= self.base.epsge() {
            let kind = classify_curves(&self.base, &min.params);
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
        self.base
            .repair_with(|base, result| base.collapse_if_small(result, |p| classify_curves(base, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Line3;

    fn curve(a: [f64; 3], b: [f64; 3]) -> ParamGeomInt {
        ParamGeomInt::curve_copy(&Line3::new(a.into(), b.into())).unwrap()
    }

    #[test]
    fn crossing_lines_meet_once() {
        let mut node = CvCvIntersector::new(
            curve([0.0, 0.0, 0.0], [4.0, 4.0, 0.0]),
            curve([0.0, 4.0, 0.0], [4.0, 0.0, 0.0]),
            GeoTol::new(1e-6).unwrap(),
        )
        .unwrap();
        assert!(node.compute().unwrap().is_complete());
        assert_eq!(node.results().len(), 1);
        let hit = node.results()[0].as_point().unwrap();
        assert!((hit.params[0] - 0.5).abs() < 1e-9 && (hit.params[1] - 0.5).abs() < 1e-9);
        assert_eq!(hit.kind, PointKind::Isolated);
    }

    #[test]
    fn skew_lines_miss() {
        let mut node = CvCvIntersector::new(
            curve([0.0, 0.0, 0.0], [4.0, 0.0, 0.0]),
            curve([2.0, -2.0, 1.0], [2.0, 2.0, 1.0]),
            GeoTol::new(1e-3).unwrap(),
        )
        .unwrap();
        node.compute().unwrap();
        assert!(node.results().is_empty());
    }

    #[test]
    fn overlapping_lines_give_one_interval() {
        let mut node = CvCvIntersector::new(
            curve([0.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
            curve([15.0, 0.0, 0.0], [5.0, 0.0, 0.0]),
            GeoTol::new(1e-6).unwrap(),
        )
        .unwrap();
        node.compute().unwrap();
        assert_eq!(node.results().len(), 1);
        let interval = node.results()[0].as_coincidence().unwrap();
        assert!((interval.start[0] - 0.5).abs() < 1e-9);
        assert!((interval.start[1] - 1.0).abs() < 1e-9);
        assert!((interval.end[0] - 1.0).abs() < 1e-9);
        assert!((interval.end[1] - 0.5).abs() < 1e-9);
    }
}
