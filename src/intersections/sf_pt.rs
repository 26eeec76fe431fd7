//! Surface against point.

use super::error::IntersectionError;
use super::factory;
use super::geo_tol::GeoTol;
use super::hull;
use super::intersector::{Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification};
use super::intersector_2obj::{Intersector2Obj, sort_parameter_directions};
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamGeomInt, ParamSurfaceInt};
use super::result::{CoincidenceInterval, IntersectionPoint, IntersectionPool, PointKind};
use crate::geom::{ParamDirection, Point3};

#[derive(Debug, Clone)]
pub struct SfPtIntersector {
    base: Intersector2Obj,
    sf_idx: usize,
    pt_idx: usize,
    surface: ParamSurfaceInt,
    point: Point3,
}

impl SfPtIntersector {
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
        const ROLES: [GeomKind; 2] = [GeomKind::Surface, GeomKind::Point];

        let base = Intersector2Obj::new(obj1, obj2, ctx);
        let [sf_idx, pt_idx] = sort_parameter_directions(base.objects(), ROLES)?;
        let (Some(surface), Some(point)) = (base.object(sf_idx).as_surface().cloned(), base.object(pt_idx).as_point())
        else {
            return Err(IntersectionError::roles(ROLES, [base.object(0).kind(), base.object(1).kind()]));
        };
        Ok(Self {
            base,
            sf_idx,
            pt_idx,
            surface,
            point,
        })
    }

    #[must_use]
    pub const fn sf_idx(&self) -> usize {
        self.sf_idx
    }

    #[must_use]
    pub const fn pt_idx(&self) -> usize {
        self.pt_idx
    }
}

impl Intersector for SfPtIntersector {
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

    /// The whole patch lies inside the ε-ball around the point.
    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        let reach = hull::max_distance_to(&self.surface.hull_points(), self.point);
        (reach <= self.base.epsge()).then(|| {
            let (u0, u1) = self.surface.range(ParamDirection::U);
            let (v0, v1) = self.surface.range(ParamDirection::V);
            CoincidenceInterval {
                start: vec![u0, v0],
                end: vec![u1, v1],
            }
        })
    }

    fn is_micro(&self) -> bool {
        self.base.is_micro()
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        self.base.micro_point(|_| PointKind::Isolated)
    }

    /// A direction that no longer moves the patch is fixed at its middle,
    /// leaving an iso-curve against the point.
    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        let Some(param) = self.base.collapsed_parameter() else {
            return Ok(None);
        };
        let (a, b) = self.base.range(param);
        factory::lower_order_intersector(&self.base, param, 0.5 * (a + b)).map(Some)
    }

    /// A patch with narrow tangent cones in both directions is a graph over
    /// its tangent plane: the distance to the point has a single minimum.
    /// A minimum pinned to the patch boundary settles nothing.
    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        if self.surface.normal_axis(self.base.tol().bend()).is_none() {
            return Ok(LinearCase::NotLinear);
        }
        let min = self.base.closest_from(&self.base.mid_params());
        if min.distance <= self.base.epsge() {
            let point = self.base.point_result(min.params, PointKind::Isolated);
            Ok(LinearCase::Solved(vec![point]))
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
        self.base.repair_with(Intersector2Obj::collapse_pass_through)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{PlaneSurface, Vec3};

    fn plane() -> ParamGeomInt {
        ParamGeomInt::surface_copy(&PlaneSurface::new(
            Point3::ORIGIN,
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
        ))
        .unwrap()
    }

    #[test]
    fn point_on_plane_is_found() {
        let mut node = SfPtIntersector::new(
            ParamGeomInt::point(Point3::new(1.0, 3.0, 0.0002)),
            plane(),
            GeoTol::new(1e-3).unwrap(),
        )
        .unwrap();
        assert_eq!((node.sf_idx(), node.pt_idx()), (1, 0));
        node.compute().unwrap();
        assert_eq!(node.results().len(), 1);
        let hit = node.results()[0].as_point().unwrap();
        assert!((hit.params[0] - 0.25).abs() < 1e-9);
        assert!((hit.params[1] - 0.75).abs() < 1e-9);
        assert!((hit.distance - 0.0002).abs() < 1e-9);
    }

    #[test]
    fn point_above_plane_is_excluded() {
        let mut node =
            SfPtIntersector::new(plane(), ParamGeomInt::point(Point3::new(1.0, 1.0, 0.5)), GeoTol::new(1e-3).unwrap())
                .unwrap();
        let diag = node.compute_with_diagnostics().unwrap();
        assert!(node.results().is_empty());
        assert_eq!(diag.excluded_count, 1);
    }

    #[test]
    fn minimum_on_patch_boundary_is_not_linear() {
        let beside = Point3::new(6.0, 2.0, 0.0);
        let node = SfPtIntersector::new(plane(), ParamGeomInt::point(beside), GeoTol::new(1e-3).unwrap()).unwrap();
        assert!(matches!(node.linear_case(), Ok(LinearCase::NotLinear)));

        let mut node = SfPtIntersector::new(plane(), ParamGeomInt::point(beside), GeoTol::new(1e-3).unwrap()).unwrap();
        let diag = node.compute_with_diagnostics().unwrap();
        assert!(node.results().is_empty());
        assert!(diag.is_complete());
        assert_eq!(diag.linear_count, 0);
    }
}
