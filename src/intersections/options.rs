use serde::Serialize;

/// Budgets and sampling densities for an intersection computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntersectOptions {
    /// Deepest recursion level a branch may reach before it is abandoned.
    pub max_depth: usize,
    /// Total node budget for one root computation.
    pub max_nodes: usize,
    /// Samples per parameter direction for coincidence checks.
    pub coincidence_samples: usize,
    /// Iteration cap of the local distance minimiser.
    pub newton_iterations: usize,
    /// Iso-curves per direction swept in the surface/surface linear case.
    pub sfsf_iso_samples: usize,
}

impl IntersectOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 100_000,
            coincidence_samples: 9,
            newton_iterations: 30,
            sfsf_iso_samples: 5,
        }
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Clamped to at least 2 so both subdomain ends are always sampled.
    #[must_use]
    pub const fn with_coincidence_samples(mut self, samples: usize) -> Self {
        self.coincidence_samples = if samples < 2 { 2 } else { samples };
        self
    }

    #[must_use]
    pub const fn with_newton_iterations(mut self, iterations: usize) -> Self {
        self.newton_iterations = iterations;
        self
    }

    /// Clamped to at least 2 so both patch boundaries are swept.
    #[must_use]
    pub const fn with_sfsf_iso_samples(mut self, samples: usize) -> Self {
        self.sfsf_iso_samples = if samples < 2 { 2 } else { samples };
        self
    }
}

impl Default for IntersectOptions {
    fn default() -> Self {
        Self::new()
    }
}
