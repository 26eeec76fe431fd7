//! The recursive subdivision state machine shared by every intersector.
//!
//! Each node runs the same sequence:
//!
//! 1. interception: drop the node when its operands are provably apart;
//! 2. coincidence over the whole subdomain;
//! 3. micro case: the subdomain is too small to split further;
//! 4. reduction to a lower-order intersector when one parameter no longer
//!    moves the geometry;
//! 5. linear case: a direct solve where at most one solution can exist;
//! 6. subdivision into children, whose results are merged back.
//!
//! Pair-specific numerics live behind the [`Intersector`] trait; the driver
//! in [`Intersector::compute`] owns the order of the steps, the budgets and
//! the bookkeeping.

use super::diagnostics::{ComputeStatus, IntersectionDiagnostics};
use super::error::IntersectionError;
use super::geo_tol::GeoTol;
use super::options::IntersectOptions;
use super::result::{CoincidenceInterval, IntersectionPoint, IntersectionPool, IntersectionResult};

/// A parameter fixed on the way from a parent to a lower-order child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elimination {
    /// Index in the parent's parameter vector.
    pub parameter: usize,
    pub value: f64,
}

/// What a node inherits from its parent.
///
/// Children never hold a reference to the parent node itself; everything
/// they need to lift their results is copied in here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeContext {
    pub tol: GeoTol,
    pub options: IntersectOptions,
    pub depth: usize,
    pub elimination: Option<Elimination>,
    /// `num_params()` of the parent, `None` at the root.
    pub parent_params: Option<usize>,
}

impl NodeContext {
    #[must_use]
    pub const fn root(tol: GeoTol, options: IntersectOptions) -> Self {
        Self {
            tol,
            options,
            depth: 0,
            elimination: None,
            parent_params: None,
        }
    }

    /// Context of a child covering part of this node's subdomain.
    #[must_use]
    pub const fn subdivided(&self, parent_params: usize) -> Self {
        Self {
            tol: self.tol,
            options: self.options,
            depth: self.depth + 1,
            elimination: None,
            parent_params: Some(parent_params),
        }
    }

    /// Context of a child with one parameter fixed.
    #[must_use]
    pub const fn eliminated(&self, parent_params: usize, parameter: usize, value: f64) -> Self {
        Self {
            tol: self.tol,
            options: self.options,
            depth: self.depth + 1,
            elimination: Some(Elimination { parameter, value }),
            parent_params: Some(parent_params),
        }
    }
}

/// Outcome of the interception test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// No intersection can exist in the current subdomain.
    Excluded,
    Possible,
}

/// A split of parameter `param` (index into the node's parameter vector)
/// at `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub param: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubdivisionClassification {
    /// Split anywhere sensible, typically the middle.
    DivideOk(Split),
    /// Split at a knot so each child sees smoother geometry.
    DivideKnot(Split),
    /// The subdomain cannot be made strictly smaller.
    CannotDivide,
    /// No solution can exist; nothing to split.
    NoSolution,
}

/// Outcome of the linear case.
pub enum LinearCase {
    /// The shortcut does not apply; subdivide instead.
    NotLinear,
    /// Solved directly; possibly with no intersection at all.
    Solved(Vec<IntersectionPoint>),
    /// Handed to lower-order children (one parameter fixed in each).
    Reduced(Vec<Box<dyn Intersector>>),
}

/// Pair-specific numerics plugged into the shared driver.
pub trait Intersector {
    fn context(&self) -> &NodeContext;

    /// Free parameter directions of this node.
    fn num_params(&self) -> usize;

    fn pool(&self) -> &IntersectionPool;

    fn pool_mut(&mut self) -> &mut IntersectionPool;

    /// Whether `a` and `b` (both in this node's parameter space) describe the
    /// same intersection.
    fn same_intersection(&self, a: &[f64], b: &[f64]) -> bool;

    fn interception(&self) -> Interception;

    /// An interval over which the operands coincide across the entire
    /// current subdomain.
    fn check_coincidence(&self) -> Option<CoincidenceInterval>;

    fn is_micro(&self) -> bool;

    fn micro_case(&self) -> Option<IntersectionPoint>;

    /// A child with one parameter fixed, when that parameter no longer moves
    /// the geometry.
    fn lower_order_intersector(&self) -> Result<Option<Box<dyn Intersector>>, IntersectionError>;

    fn linear_case(&self) -> Result<LinearCase, IntersectionError>;

    fn subdivision_parameter(&self) -> SubdivisionClassification;

    /// Children covering the two halves of the subdomain.
    fn subdivide(&self, split: Split) -> Result<Vec<Box<dyn Intersector>>, IntersectionError>;

    /// Reconciles results harvested from neighbouring children. Returns the
    /// number of results that were changed or removed.
    fn repair_intersections(&mut self) -> usize {
        0
    }

    #[must_use]
    fn results(&self) -> &[IntersectionResult] {
        self.pool().results()
    }

    /// Adds one result, deduplicated against what the node already holds.
    fn add_result(&mut self, result: IntersectionResult) -> bool {
        let mut pool = std::mem::take(self.pool_mut());
        let changed = pool.insert(result, &|a, b| self.same_intersection(a, b));
        *self.pool_mut() = pool;
        changed
    }

    /// Harvests a finished child, lifting its results through the parameter
    /// it eliminated.
    fn update_intersections(&mut self, child: &dyn Intersector) {
        let elimination = child.context().elimination;
        for result in child.results() {
            let result = match elimination {
                Some(e) => result.clone().lifted(e.parameter, e.value),
                None => result.clone(),
            };
            self.add_result(result);
        }
    }

    /// Runs the search over the current subdomain, replacing any results of
    /// an earlier run.
    fn compute(&mut self) -> Result<ComputeStatus, IntersectionError> {
        self.compute_with_diagnostics().map(|diagnostics| diagnostics.status())
    }

    fn compute_with_diagnostics(&mut self) -> Result<IntersectionDiagnostics, IntersectionError> {
        let mut diagnostics = IntersectionDiagnostics::new();
        self.run(&mut diagnostics)?;
        log::debug!(
            "intersection finished with {} results ({})",
            self.results().len(),
            diagnostics.summary()
        );
        Ok(diagnostics)
    }

    /// One node of the recursion.
    fn run(&mut self, diagnostics: &mut IntersectionDiagnostics) -> Result<(), IntersectionError> {
        self.pool_mut().clear();
        let ctx = *self.context();
        if let Some(parent) = ctx.parent_params {
            debug_assert_eq!(
                self.num_params() + usize::from(ctx.elimination.is_some()),
                parent,
                "child parameter count must match its parent"
            );
        }

        if ctx.depth > ctx.options.max_depth {
            diagnostics.record_failure(ctx.depth, "depth budget exhausted");
            return Ok(());
        }
        diagnostics.enter_node(ctx.depth);
        if diagnostics.node_count > ctx.options.max_nodes {
            diagnostics.record_failure(ctx.depth, "node budget exhausted");
            return Ok(());
        }

        if self.interception() == Interception::Excluded {
            log::trace!("depth {}: operands apart", ctx.depth);
            diagnostics.excluded_count += 1;
            return Ok(());
        }

        if let Some(interval) = self.check_coincidence() {
            log::trace!("depth {}: coincidence", ctx.depth);
            diagnostics.coincidence_count += 1;
            self.add_result(IntersectionResult::Coincidence(interval));
            return Ok(());
        }

        if self.is_micro() {
            log::trace!("depth {}: micro case", ctx.depth);
            diagnostics.micro_count += 1;
            if let Some(point) = self.micro_case() {
                self.add_result(IntersectionResult::Point(point));
            }
            return Ok(());
        }

        if let Some(mut child) = self.lower_order_intersector()? {
            log::trace!("depth {}: reduced to {} parameters", ctx.depth, child.num_params());
            diagnostics.reduction_count += 1;
            child.run(diagnostics)?;
            self.update_intersections(child.as_ref());
            self.repair_intersections();
            return Ok(());
        }

        match self.linear_case()? {
            LinearCase::Solved(points) => {
                log::trace!("depth {}: linear case, {} points", ctx.depth, points.len());
                diagnostics.linear_count += 1;
                for point in points {
                    self.add_result(IntersectionResult::Point(point));
                }
                return Ok(());
            }
            LinearCase::Reduced(children) => {
                log::trace!("depth {}: linear case over {} iso-curves", ctx.depth, children.len());
                diagnostics.linear_count += 1;
                self.run_children(children, diagnostics)?;
                return Ok(());
            }
            LinearCase::NotLinear => {}
        }

        match self.subdivision_parameter() {
            SubdivisionClassification::NoSolution => {
                diagnostics.excluded_count += 1;
            }
            SubdivisionClassification::CannotDivide => {
                diagnostics.record_failure(ctx.depth, "subdomain cannot be divided further");
            }
            SubdivisionClassification::DivideOk(split) | SubdivisionClassification::DivideKnot(split) => {
                let children = self.subdivide(split)?;
                if children.is_empty() {
                    diagnostics.record_failure(
                        ctx.depth,
                        format!("split of parameter {} at {} produced no children", split.param, split.value),
                    );
                    return Ok(());
                }
                log::trace!("depth {}: split parameter {} at {}", ctx.depth, split.param, split.value);
                diagnostics.subdivision_count += 1;
                self.run_children(children, diagnostics)?;
            }
        }
        Ok(())
    }

    /// Runs and harvests `children`, then repairs the merged result list.
    fn run_children(
        &mut self,
        children: Vec<Box<dyn Intersector>>,
        diagnostics: &mut IntersectionDiagnostics,
    ) -> Result<(), IntersectionError> {
        for mut child in children {
            child.run(diagnostics)?;
            self.update_intersections(child.as_ref());
        }
        let repaired = self.repair_intersections();
        if repaired > 0 {
            log::trace!("depth {}: repaired {repaired} results", self.context().depth);
        }
        Ok(())
    }
}
