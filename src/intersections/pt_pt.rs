use super::error::IntersectionError;
use super::geo_tol::GeoTol;
use super::intersector::{Interception, Intersector, LinearCase, NodeContext, Split, SubdivisionClassification};
use super::intersector_2obj::{Intersector2Obj, sort_parameter_directions};
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamGeomInt};
use super::result::{CoincidenceInterval, IntersectionPoint, IntersectionPool, PointKind};

/// Point against point: the leaf of every elimination chain.
///
/// There is nothing to subdivide; the node is always a micro case and
/// reports an empty parameter vector when the points are within ε.
#[derive(Debug, Clone)]
pub struct PtPtIntersector {
    base: Intersector2Obj,
}

impl PtPtIntersector {
    pub fn new(obj1: ParamGeomInt, obj2: ParamGeomInt, tol: GeoTol) -> Result<Self, IntersectionError> {
        Self::from_context(obj1, obj2, NodeContext::root(tol, IntersectOptions::default()))
    }

    pub(crate) fn from_context(
        obj1: ParamGeomInt,
        obj2: ParamGeomInt,
        ctx: NodeContext,
    ) -> Result<Self, IntersectionError> {
        let base = Intersector2Obj::new(obj1, obj2, ctx);
        sort_parameter_directions(base.objects(), [GeomKind::Point, GeomKind::Point])?;
        Ok(Self { base })
    }

    fn distance(&self) -> f64 {
        self.base.distance_at(&[])
    }
}

impl Intersector for PtPtIntersector {
    fn context(&self) -> &NodeContext {
        self.base.context()
    }

    fn num_params(&self) -> usize {
        0
    }

    fn pool(&self) -> &IntersectionPool {
        self.base.pool()
    }

    fn pool_mut(&mut self) -> &mut IntersectionPool {
        self.base.pool_mut()
    }

    fn same_intersection(&self, _a: &[f64], _b: &[f64]) -> bool {
        true
    }

    fn interception(&self) -> Interception {
        if self.distance() > self.base.epsge() {
            Interception::Excluded
        } else {
            Interception::Possible
        }
    }

    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        None
    }

    fn is_micro(&self) -> bool {
        true
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        (self.distance() <= self.base.epsge()).then(|| self.base.point_result(Vec::new(), PointKind::Isolated))
    }

    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        Ok(None)
    }

    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        Ok(LinearCase::NotLinear)
    }

    fn subdivision_parameter(&self) -> SubdivisionClassification {
        SubdivisionClassification::CannotDivide
    }

    fn subdivide(&self, _split: Split) -> Result<Vec<Box<dyn Intersector>>, IntersectionError> {
        Ok(Vec::new())
    }
}
