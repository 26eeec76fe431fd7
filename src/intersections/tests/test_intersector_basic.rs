use crate::geom::{NurbsCurve3, Point3};
use crate::intersections::{
    CoincidenceInterval, ComputeStatus, CvPtIntersector, GeoTol, IntersectOptions, IntersectionError,
    IntersectionPoint, IntersectionPool, IntersectionResult, Interception, Intersector, LinearCase, NodeContext,
    ParamGeomInt, PointKind, Split, SubdivisionClassification,
};

/// One-parameter node with a fixed script: the root `[0, 1]` splits at 0.5,
/// `[0, 0.5]` resolves a point at 0.25 in the linear case, and any other
/// subdomain refuses to split.
struct Scripted {
    ctx: NodeContext,
    pool: IntersectionPool,
    range: (f64, f64),
}

impl Scripted {
    fn root(options: IntersectOptions) -> Self {
        Self {
            ctx: NodeContext::root(GeoTol::new(1e-3).unwrap(), options),
            pool: IntersectionPool::new(),
            range: (0.0, 1.0),
        }
    }
}

impl Intersector for Scripted {
    fn context(&self) -> &NodeContext {
        &self.ctx
    }

    fn num_params(&self) -> usize {
        1
    }

    fn pool(&self) -> &IntersectionPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut IntersectionPool {
        &mut self.pool
    }

    fn same_intersection(&self, a: &[f64], b: &[f64]) -> bool {
        (a[0] - b[0]).abs() < 1e-9
    }

    fn interception(&self) -> Interception {
        Interception::Possible
    }

    fn check_coincidence(&self) -> Option<CoincidenceInterval> {
        None
    }

    fn is_micro(&self) -> bool {
        false
    }

    fn micro_case(&self) -> Option<IntersectionPoint> {
        None
    }

    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError> {
        Ok(None)
    }

    fn linear_case(&self) -> Result<LinearCase, IntersectionError> {
        if self.range == (0.0, 0.5) {
            let point = IntersectionPoint {
                params: vec![0.25],
                distance: 0.0,
                kind: PointKind::Isolated,
            };
            return Ok(LinearCase::Solved(vec![point]));
        }
        Ok(LinearCase::NotLinear)
    }

    fn subdivision_parameter(&self) -> SubdivisionClassification {
        if self.range == (0.0, 1.0) {
            SubdivisionClassification::DivideOk(Split { param: 0, value: 0.5 })
        } else {
            SubdivisionClassification::CannotDivide
        }
    }

    fn subdivide(&self, split: Split) -> Result<Vec<Box<dyn Intersector>>, IntersectionError> {
        let child = |range| -> Box<dyn Intersector> {
            Box::new(Self {
                ctx: self.ctx.subdivided(1),
                pool: IntersectionPool::new(),
                range,
            })
        };
        Ok(vec![child((self.range.0, split.value)), child((split.value, self.range.1))])
    }
}

fn found(node: &Scripted) -> Vec<f64> {
    node.results()
        .iter()
        .filter_map(IntersectionResult::as_point)
        .map(|p| p.params[0])
        .collect()
}

#[test]
fn undividable_branch_is_reported_and_siblings_are_kept() {
    let mut node = Scripted::root(IntersectOptions::default());
    let diag = node.compute_with_diagnostics().unwrap();
    assert_eq!(diag.status(), ComputeStatus::Incomplete { failed_branches: 1 });
    assert_eq!(diag.node_count, 3);
    assert_eq!(diag.linear_count, 1);
    assert!(diag.warnings[0].contains("cannot be divided"), "{:?}", diag.warnings);
    assert_eq!(found(&node), vec![0.25]);
}

#[test]
fn node_budget_stops_the_search_but_keeps_earlier_points() {
    let mut node = Scripted::root(IntersectOptions::default().with_max_nodes(2));
    let status = node.compute().unwrap();
    assert_eq!(status, ComputeStatus::Incomplete { failed_branches: 1 });
    assert_eq!(found(&node), vec![0.25]);

    let mut node = Scripted::root(IntersectOptions::default().with_max_nodes(2));
    let diag = node.compute_with_diagnostics().unwrap();
    assert!(diag.warnings.iter().any(|w| w.contains("node budget")), "{:?}", diag.warnings);
    assert_eq!(diag.linear_count, 1);
}

#[test]
fn node_budget_applies_to_real_geometry() {
    let zigzag = NurbsCurve3::clamped_uniform(
        1,
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 2.0, 0.0),
            Point3::new(2.0, -2.0, 0.0),
        ],
    )
    .unwrap();
    let mut node = CvPtIntersector::with_options(
        ParamGeomInt::curve_copy(&zigzag).unwrap(),
        ParamGeomInt::point(Point3::new(3.0, 0.0, 0.0)),
        GeoTol::new(1e-3).unwrap(),
        IntersectOptions::default().with_max_nodes(1),
    )
    .unwrap();
    let diag = node.compute_with_diagnostics().unwrap();
    assert!(!diag.is_complete());
    assert!(diag.failed_branches >= 1);
    assert!(matches!(diag.status(), ComputeStatus::Incomplete { .. }));
    assert_eq!(diag.subdivision_count, 1);
}
