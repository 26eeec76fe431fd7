//! Harvested intersection results and the per-node pool that keeps them
//! free of duplicates.

use serde::Serialize;

/// Local character of an isolated intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointKind {
    /// The operands cross.
    Isolated,
    /// The operands touch with (almost) parallel tangents or normals.
    Tangential,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionPoint {
    /// Coordinates in the combined parameter space of both operands.
    pub params: Vec<f64>,
    /// Distance between the operands at `params`.
    pub distance: f64,
    pub kind: PointKind,
}

/// A stretch of parameter space over which the operands coincide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoincidenceInterval {
    pub start: Vec<f64>,
    pub end: Vec<f64>,
}

impl CoincidenceInterval {
    /// Whether `params` lies in the parameter box spanned by the interval,
    /// widened by `slack` in every coordinate.
    #[must_use]
    pub fn contains(&self, params: &[f64], slack: f64) -> bool {
        params.iter().enumerate().all(|(i, &x)| {
            let lo = self.start[i].min(self.end[i]);
            let hi = self.start[i].max(self.end[i]);
            x >= lo - slack && x <= hi + slack
        })
    }

    #[must_use]
    pub fn mid(&self) -> Vec<f64> {
        self.start.iter().zip(&self.end).map(|(a, b)| 0.5 * (a + b)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IntersectionResult {
    Point(IntersectionPoint),
    Coincidence(CoincidenceInterval),
}

impl IntersectionResult {
    #[must_use]
    pub fn as_point(&self) -> Option<&IntersectionPoint> {
        match self {
            Self::Point(p) => Some(p),
            Self::Coincidence(_) => None,
        }
    }

    #[must_use]
    pub fn as_coincidence(&self) -> Option<&CoincidenceInterval> {
        match self {
            Self::Point(_) => None,
            Self::Coincidence(c) => Some(c),
        }
    }

    /// Inserts `value` at position `index` of every parameter vector.
    #[must_use]
    pub fn lifted(mut self, index: usize, value: f64) -> Self {
        match &mut self {
            Self::Point(p) => p.params.insert(index, value),
            Self::Coincidence(c) => {
                c.start.insert(index, value);
                c.end.insert(index, value);
            }
        }
        self
    }
}

/// Ordered polyline of intersection points along a surface/surface
/// intersection curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntersectionCurve {
    pub points: Vec<IntersectionPoint>,
}

/// Predicate deciding whether two parameter vectors describe the same
/// intersection.
pub type SameIntersection<'a> = dyn Fn(&[f64], &[f64]) -> bool + 'a;

/// Results owned by one intersector node.
///
/// Invariants after every insertion: no two points are the same
/// intersection, no point lies inside a coincidence interval, and no two
/// intervals share an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntersectionPool {
    results: Vec<IntersectionResult>,
}

impl IntersectionPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn results(&self) -> &[IntersectionResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn points(&self) -> impl Iterator<Item = &IntersectionPoint> {
        self.results.iter().filter_map(IntersectionResult::as_point)
    }

    pub fn coincidences(&self) -> impl Iterator<Item = &CoincidenceInterval> {
        self.results.iter().filter_map(IntersectionResult::as_coincidence)
    }

    /// Removes every result, handing ownership to the caller.
    pub fn take(&mut self) -> Vec<IntersectionResult> {
        std::mem::take(&mut self.results)
    }

    /// Adds `result` unless it duplicates what is already stored.
    ///
    /// Returns `true` when the pool changed.
    pub fn insert(&mut self, result: IntersectionResult, same: &SameIntersection<'_>) -> bool {
        match result {
            IntersectionResult::Point(point) => self.insert_point(point, same),
            IntersectionResult::Coincidence(interval) => {
                self.insert_interval(interval, same);
                true
            }
        }
    }

    fn insert_point(&mut self, point: IntersectionPoint, same: &SameIntersection<'_>) -> bool {
        for existing in &mut self.results {
            match existing {
                IntersectionResult::Point(p) if same(&p.params, &point.params) => {
                    // Keep the better converged representative.
                    if point.distance < p.distance {
                        *p = point;
                    }
                    return false;
                }
                IntersectionResult::Coincidence(c) if absorbs(c, &point.params, same) => {
                    return false;
                }
                _ => {}
            }
        }
        self.results.push(IntersectionResult::Point(point));
        true
    }

    fn insert_interval(&mut self, mut interval: CoincidenceInterval, same: &SameIntersection<'_>) {
        // Grow the new interval by every stored interval it touches.
        let mut i = 0;
        while i < self.results.len() {
            let merged = match &self.results[i] {
                IntersectionResult::Coincidence(c) => join(c, &interval, same),
                IntersectionResult::Point(_) => None,
            };
            if let Some(joined) = merged {
                self.results.remove(i);
                interval = joined;
                i = 0;
            } else {
                i += 1;
            }
        }
        self.results.retain(|r| match r {
            IntersectionResult::Point(p) => !absorbs(&interval, &p.params, same),
            IntersectionResult::Coincidence(_) => true,
        });
        self.results.push(IntersectionResult::Coincidence(interval));
    }

    /// Replaces the stored results wholesale, re-running deduplication.
    pub fn rebuild(&mut self, results: Vec<IntersectionResult>, same: &SameIntersection<'_>) {
        self.results.clear();
        for result in results {
            self.insert(result, same);
        }
    }
}

fn absorbs(interval: &CoincidenceInterval, params: &[f64], same: &SameIntersection<'_>) -> bool {
    interval.contains(params, 0.0) || same(&interval.start, params) || same(&interval.end, params)
}

/// Union of two intervals that share an endpoint, oriented from `a.start`.
fn join(a: &CoincidenceInterval, b: &CoincidenceInterval, same: &SameIntersection<'_>) -> Option<CoincidenceInterval> {
    let pairs = [
        (&a.end, &b.start, &a.start, &b.end),
        (&a.end, &b.end, &a.start, &b.start),
        (&a.start, &b.end, &b.start, &a.end),
        (&a.start, &b.start, &b.end, &a.end),
    ];
    pairs.into_iter().find_map(|(x, y, from, to)| {
        same(x, y).then(|| CoincidenceInterval {
            start: from.clone(),
            end: to.clone(),
        })
    })
}
