//! Bookkeeping for one root intersection computation.
//!
//! Every node of the recursion tree reports how it was resolved. Branches
//! that had to be abandoned (depth or node budget, a domain that cannot be
//! split any further) are counted and described in `warnings`; the results
//! harvested from the remaining branches are still returned.

use std::fmt;

use serde::Serialize;

/// Outcome of [`Intersector::compute`](super::Intersector::compute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComputeStatus {
    /// Every branch resolved.
    Complete,
    /// Some branches were abandoned; the result list may be missing points.
    Incomplete { failed_branches: usize },
}

impl ComputeStatus {
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IntersectionDiagnostics {
    /// Nodes visited, root included.
    pub node_count: usize,

    /// Deepest recursion level reached (root is 0).
    pub max_depth_reached: usize,

    /// Nodes discarded because their operands were proven apart.
    pub excluded_count: usize,

    pub coincidence_count: usize,
    pub micro_count: usize,
    pub linear_count: usize,

    /// Nodes handed to a lower-order intersector after fixing a parameter.
    pub reduction_count: usize,

    pub subdivision_count: usize,

    /// Branches abandoned without a resolution.
    ///
    /// Non-zero means the result list may be incomplete; see `warnings`.
    pub failed_branches: usize,

    /// Human-readable descriptions of abandoned branches and repairs.
    pub warnings: Vec<String>,
}

impl IntersectionDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_branches == 0
    }

    #[must_use]
    pub fn status(&self) -> ComputeStatus {
        if self.is_complete() {
            ComputeStatus::Complete
        } else {
            ComputeStatus::Incomplete {
                failed_branches: self.failed_branches,
            }
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub(crate) fn enter_node(&mut self, depth: usize) {
        self.node_count += 1;
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    pub(crate) fn record_failure(&mut self, depth: usize, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("intersection branch abandoned at depth {depth}: {reason}");
        self.failed_branches += 1;
        self.add_warning(format!("depth {depth}: {reason}"));
    }

    /// Short summary suitable for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("nodes:{} depth:{}", self.node_count, self.max_depth_reached)];
        if self.excluded_count > 0 {
            parts.push(format!("excluded:{}", self.excluded_count));
        }
        if self.coincidence_count > 0 {
            parts.push(format!("coincident:{}", self.coincidence_count));
        }
        if self.micro_count > 0 {
            parts.push(format!("micro:{}", self.micro_count));
        }
        if self.linear_count > 0 {
            parts.push(format!("linear:{}", self.linear_count));
        }
        if self.reduction_count > 0 {
            parts.push(format!("reduced:{}", self.reduction_count));
        }
        if self.subdivision_count > 0 {
            parts.push(format!("subdivided:{}", self.subdivision_count));
        }
        if self.failed_branches > 0 {
            parts.push(format!("failed:{}", self.failed_branches));
        }
        parts.join(" ")
    }
}

impl fmt::Display for IntersectionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Intersection Diagnostics:")?;
        writeln!(f, "  Nodes: {}", self.node_count)?;
        writeln!(f, "  Max depth: {}", self.max_depth_reached)?;
        writeln!(f, "  Resolutions:")?;
        writeln!(f, "    - Excluded: {}", self.excluded_count)?;
        writeln!(f, "    - Coincidence: {}", self.coincidence_count)?;
        writeln!(f, "    - Micro: {}", self.micro_count)?;
        writeln!(f, "    - Linear: {}", self.linear_count)?;
        writeln!(f, "    - Reduced: {}", self.reduction_count)?;
        writeln!(f, "    - Subdivided: {}", self.subdivision_count)?;

        if self.failed_branches > 0 {
            writeln!(f, "  Failed branches: {}", self.failed_branches)?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}
