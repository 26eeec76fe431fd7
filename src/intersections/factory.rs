//! Construction of the concrete intersector for a pair of operands.

use super::cv_cv::CvCvIntersector;
use super::cv_pt::CvPtIntersector;
use super::cv_sf::CvSfIntersector;
use super::error::IntersectionError;
use super::geo_tol::GeoTol;
use super::intersector::{Intersector, NodeContext, Split};
use super::intersector_2obj::Intersector2Obj;
use super::options::IntersectOptions;
use super::param_geom_int::{GeomKind, ParamGeomInt};
use super::pt_pt::PtPtIntersector;
use super::sf_pt::SfPtIntersector;
use super::sf_sf::SfSfIntersector;

/// Root intersector for `obj1` against `obj2`, whatever their kinds.
pub fn intersect(
    obj1: ParamGeomInt,
    obj2: ParamGeomInt,
    tol: GeoTol,
    options: IntersectOptions,
) -> Result<Box<dyn Intersector>, IntersectionError> {
    intersector_for(obj1, obj2, NodeContext::root(tol, options))
}

/// Intersector matching the operand kinds, placed at `ctx` in a tree.
pub fn intersector_for(
    obj1: ParamGeomInt,
    obj2: ParamGeomInt,
    ctx: NodeContext,
) -> Result<Box<dyn Intersector>, IntersectionError> {
    use GeomKind::{Curve, Point, Surface};

    Ok(match (obj1.kind(), obj2.kind()) {
        (Point, Point) => Box::new(PtPtIntersector::from_context(obj1, obj2, ctx)?),
        (Curve, Point) | (Point, Curve) => Box::new(CvPtIntersector::from_context(obj1, obj2, ctx)?),
        (Curve, Curve) => Box::new(CvCvIntersector::from_context(obj1, obj2, ctx)?),
        (Surface, Point) | (Point, Surface) => Box::new(SfPtIntersector::from_context(obj1, obj2, ctx)?),
        (Curve, Surface) | (Surface, Curve) => Box::new(CvSfIntersector::from_context(obj1, obj2, ctx)?),
        (Surface, Surface) => Box::new(SfSfIntersector::from_context(obj1, obj2, ctx)?),
    })
}

/// Child of `base` with node parameter `eliminated_parameter` fixed at
/// `eliminated_value`. Operand order is kept, so the child's results lift
/// back by reinserting the fixed value.
pub(crate) fn lower_order_intersector(
    base: &Intersector2Obj,
    eliminated_parameter: usize,
    eliminated_value: f64,
) -> Result<Box<dyn Intersector>, IntersectionError> {
    let Some((obj1, obj2)) = base.eliminate(eliminated_parameter, eliminated_value) else {
        return Err(IntersectionError::UnsupportedPair {
            first: base.object(0).kind(),
            second: base.object(1).kind(),
            parameter: eliminated_parameter,
        });
    };
    let ctx = base
        .context()
        .eliminated(base.num_params(), eliminated_parameter, eliminated_value);
    intersector_for(obj1, obj2, ctx)
}

/// Children over both halves of `split`, built by `make`.
pub(crate) fn subdivided<T, F>(
    base: &Intersector2Obj,
    split: Split,
    make: F,
) -> Result<Vec<Box<dyn Intersector>>, IntersectionError>
where
    T: Intersector + 'static,
    F: Fn(ParamGeomInt, ParamGeomInt, NodeContext) -> Result<T, IntersectionError>,
{
    let Some(halves) = base.split_operands(split) else {
        return Ok(Vec::new());
    };
    let ctx = base.context().subdivided(base.num_params());
    halves
        .into_iter()
        .map(|(a, b)| make(a, b, ctx).map(|child| Box::new(child) as Box<dyn Intersector>))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Line3, PlaneSurface, Point3, Vec3};

    #[test]
    fn dispatches_on_operand_kinds() {
        let tol = GeoTol::new(1e-3).unwrap();
        let line = ParamGeomInt::curve_copy(&Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0))).unwrap();
        let plane = ParamGeomInt::surface_copy(&PlaneSurface::new(Point3::ORIGIN, Vec3::X, Vec3::Y)).unwrap();
        let point = ParamGeomInt::point(Point3::ORIGIN);

        let cases = [
            (point.clone(), point.clone(), 0),
            (point.clone(), line.clone(), 1),
            (line.clone(), line.clone(), 2),
            (plane.clone(), point, 2),
            (plane.clone(), line, 3),
            (plane.clone(), plane, 4),
        ];
        for (a, b, params) in cases {
            let node = intersect(a, b, tol, IntersectOptions::default()).unwrap();
            assert_eq!(node.num_params(), params);
        }
    }
}
