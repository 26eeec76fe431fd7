//! Knot-vector kernels shared by `NurbsCurve3` and `NurbsSurface`.
//!
//! All routines work on homogeneous control points (`HPoint4`) so rational
//! and polynomial splines go through the same code path.

use super::core::{Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HPoint4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl HPoint4 {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn weighted(p: Point3, w: f64) -> Self {
        Self::new(p.x * w, p.y * w, p.z * w, w)
    }

    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        let s = 1.0 - t;
        Self::new(
            self.x * s + rhs.x * t,
            self.y * s + rhs.y * t,
            self.z * s + rhs.z * t,
            self.w * s + rhs.w * t,
        )
    }

    pub fn to_point3(self) -> Option<Point3> {
        if self.w.is_finite() && self.w != 0.0 {
            Some(Point3::new(self.x / self.w, self.y / self.w, self.z / self.w))
        } else {
            None
        }
    }

    pub const fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

pub(crate) fn is_non_decreasing(knots: &[f64]) -> bool {
    knots.windows(2).all(|w| w[0] <= w[1])
}

/// Span index `k` with `knots[k] <= u < knots[k + 1]`, clamped to the
/// valid range `[p, n]`.
pub(crate) fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// In-place de Boor recursion; `d` holds the `p + 1` points of `span` and
/// ends with the curve value in `d[p]`.
pub(crate) fn de_boor(d: &mut [HPoint4], span: usize, p: usize, u: f64, knots: &[f64]) {
    for r in 1..=p {
        for j in (r..=p).rev() {
            let i = span - p + j;
            let denom = knots[i + p + 1 - r] - knots[i];
            let alpha = if denom == 0.0 { 0.0 } else { (u - knots[i]) / denom };
            d[j] = d[j - 1].lerp(d[j], alpha);
        }
    }
}

/// Evaluates the homogeneous spline at `u` (which must lie in the domain).
pub(crate) fn eval_homogeneous(p: usize, knots: &[f64], cps: &[HPoint4], u: f64) -> HPoint4 {
    let n = cps.len() - 1;
    let span = find_span(n, p, u, knots);
    let mut d: Vec<HPoint4> = cps[span - p..=span].to_vec();
    de_boor(&mut d, span, p, u, knots);
    d[p]
}

/// Evaluates the homogeneous spline and its first derivative at `u`.
pub(crate) fn eval_homogeneous_with_derivative(
    p: usize,
    knots: &[f64],
    cps: &[HPoint4],
    u: f64,
) -> (HPoint4, HPoint4) {
    let n = cps.len() - 1;
    let span = find_span(n, p, u, knots);
    let mut d: Vec<HPoint4> = cps[span - p..=span].to_vec();

    // Hodograph control points of the active span.
    let mut d_prime = Vec::with_capacity(p);
    for j in 0..p {
        let i = span - p + j;
        let denom = knots[i + p + 1] - knots[i + 1];
        let factor = if denom.abs() > 1e-14 { p as f64 / denom } else { 0.0 };
        let a = d[j];
        let b = d[j + 1];
        d_prime.push(HPoint4::new(
            (b.x - a.x) * factor,
            (b.y - a.y) * factor,
            (b.z - a.z) * factor,
            (b.w - a.w) * factor,
        ));
    }

    de_boor(&mut d, span, p, u, knots);
    let value = d[p];
    if p == 0 || d_prime.is_empty() {
        return (value, HPoint4::new(0.0, 0.0, 0.0, 0.0));
    }
    de_boor(&mut d_prime, span, p - 1, u, knots);
    (value, d_prime[p - 1])
}

/// Converts a homogeneous value/derivative pair to a Cartesian derivative
/// with the quotient rule.
pub(crate) fn rational_derivative(value: HPoint4, deriv: HPoint4) -> Vec3 {
    let w = value.w;
    if w.abs() <= 1e-14 {
        return Vec3::ZERO;
    }
    let w_sq = w * w;
    Vec3::new(
        (deriv.x * w - value.x * deriv.w) / w_sq,
        (deriv.y * w - value.y * deriv.w) / w_sq,
        (deriv.z * w - value.z * deriv.w) / w_sq,
    )
}

/// Snaps `u` onto an existing knot closer than `tol`, so repeated
/// extraction at almost-knot values never creates sliver spans.
pub(crate) fn snap_to_knot(u: f64, knots: &[f64], tol: f64) -> f64 {
    knots
        .iter()
        .copied()
        .find(|k| (k - u).abs() <= tol)
        .unwrap_or(u)
}

fn multiplicity(u: f64, knots: &[f64]) -> usize {
    knots.iter().filter(|&&k| k == u).count()
}

/// Boehm knot insertion: inserts `u` `times` times (capped so the final
/// multiplicity never exceeds `p`).
pub(crate) fn insert_knot(
    p: usize,
    knots: &[f64],
    cps: &[HPoint4],
    u: f64,
    times: usize,
) -> (Vec<f64>, Vec<HPoint4>) {
    let s = multiplicity(u, knots);
    let r = times.min(p.saturating_sub(s));
    if r == 0 {
        return (knots.to_vec(), cps.to_vec());
    }

    let n = cps.len() - 1;
    let k = find_span(n, p, u, knots);

    let mut new_knots = Vec::with_capacity(knots.len() + r);
    new_knots.extend_from_slice(&knots[..=k]);
    new_knots.extend(std::iter::repeat_n(u, r));
    new_knots.extend_from_slice(&knots[k + 1..]);

    let mut new_cps = vec![HPoint4::new(0.0, 0.0, 0.0, 0.0); cps.len() + r];
    new_cps[..=(k - p)].copy_from_slice(&cps[..=(k - p)]);
    for i in (k - s)..=n {
        new_cps[i + r] = cps[i];
    }

    let mut tmp: Vec<HPoint4> = (0..=(p - s)).map(|i| cps[k - p + i]).collect();
    let mut l = k - p;
    for j in 1..=r {
        l = k - p + j;
        for i in 0..=(p - j - s) {
            let alpha = (u - knots[l + i]) / (knots[i + k + 1] - knots[l + i]);
            tmp[i] = tmp[i].lerp(tmp[i + 1], alpha);
        }
        new_cps[l] = tmp[0];
        new_cps[k + r - j - s] = tmp[p - j - s];
    }
    for i in (l + 1)..(k - s) {
        new_cps[i] = tmp[i - l];
    }

    (new_knots, new_cps)
}

/// Extracts the clamped spline that reproduces `[a, b]` exactly.
///
/// The returned control polygon's convex hull contains the segment, which is
/// what the intersection hull tests rely on.
pub(crate) fn extract_segment(
    p: usize,
    knots: &[f64],
    cps: &[HPoint4],
    a: f64,
    b: f64,
    knot_tol: f64,
) -> (Vec<f64>, Vec<HPoint4>) {
    let a = snap_to_knot(a, knots, knot_tol);
    let b = snap_to_knot(b, knots, knot_tol);

    let (knots, cps) = insert_knot(p, knots, cps, a, p);
    let (knots, cps) = insert_knot(p, &knots, &cps, b, p);

    let last_a = knots.iter().rposition(|&k| k == a).unwrap_or(p);
    let first_b = knots
        .iter()
        .position(|&k| k == b)
        .unwrap_or(cps.len());
    if first_b <= last_a || last_a < p {
        return (knots, cps);
    }

    let seg_cps = cps[(last_a - p)..first_b].to_vec();
    let mut seg_knots = Vec::with_capacity(seg_cps.len() + p + 1);
    seg_knots.extend(std::iter::repeat_n(a, p + 1));
    seg_knots.extend_from_slice(&knots[(last_a + 1)..first_b]);
    seg_knots.extend(std::iter::repeat_n(b, p + 1));
    (seg_knots, seg_cps)
}

/// Distinct knot values inside `(t0, t1)` that are more than `tol` away
/// from both ends.
pub(crate) fn interior_knots(knots: &[f64], t0: f64, t1: f64, tol: f64) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for &k in knots {
        if k > t0 + tol && k < t1 - tol && out.last().is_none_or(|&last| last != k) {
            out.push(k);
        }
    }
    out
}

/// Values at `u` of the `p + 1` basis functions that are non-zero on `span`
/// (Cox-de Boor triangle).
pub(crate) fn basis_functions(span: usize, u: f64, p: usize, knots: &[f64]) -> Vec<f64> {
    let mut n = vec![0.0; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];
    n[0] = 1.0;
    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom == 0.0 { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Greville abscissae of the `count` basis functions of a degree-`p` space.
pub(crate) fn greville(p: usize, knots: &[f64], count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| knots[i + 1..=i + p].iter().sum::<f64>() / p as f64)
        .collect()
}

/// Knot vector of the same spline raised by `extra` degrees: every distinct
/// value gains `extra` in multiplicity.
pub(crate) fn raise_multiplicities(knots: &[f64], extra: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(knots.len() * (extra + 1));
    for (i, &k) in knots.iter().enumerate() {
        out.push(k);
        if knots.get(i + 1).is_none_or(|&next| next > k) {
            out.extend(std::iter::repeat_n(k, extra));
        }
    }
    out
}

/// Union of two sorted knot vectors keeping the larger multiplicity of each
/// value. Knots closer than `tol` count as equal.
pub(crate) fn merge_knots(a: &[f64], b: &[f64], tol: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if (a[i] - b[j]).abs() <= tol {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Direction vectors spanning the tangent cone of a control polygon.
///
/// Polynomial splines only need the polygon legs. Rational ones need every
/// forward difference `P_j - P_i, j > i`.
pub(crate) fn polygon_tangent_directions(points: &[Point3], rational: bool) -> Vec<Vec3> {
    let mut dirs = Vec::new();
    if rational {
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                dirs.push(points[j].sub_point(points[i]));
            }
        }
    } else {
        dirs.extend(points.windows(2).map(|w| w[1].sub_point(w[0])));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic() -> (Vec<f64>, Vec<HPoint4>) {
        let knots = vec![0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];
        let cps = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
            Point3::new(3.0, 2.0, 1.0),
            Point3::new(4.0, 0.0, 0.0),
        ]
        .iter()
        .map(|&p| HPoint4::weighted(p, 1.0))
        .collect();
        (knots, cps)
    }

    #[test]
    fn knot_insertion_preserves_shape() {
        let (knots, cps) = cubic();
        let (new_knots, new_cps) = insert_knot(3, &knots, &cps, 0.3, 2);
        assert_eq!(new_knots.len(), knots.len() + 2);
        assert_eq!(new_cps.len(), cps.len() + 2);
        for i in 0..=20 {
            let u = f64::from(i) / 20.0;
            let a = eval_homogeneous(3, &knots, &cps, u).to_point3().unwrap();
            let b = eval_homogeneous(3, &new_knots, &new_cps, u).to_point3().unwrap();
            assert!(a.distance_to(b) < 1e-12, "mismatch at u = {u}");
        }
    }

    #[test]
    fn segment_extraction_reproduces_interval() {
        let (knots, cps) = cubic();
        let (seg_knots, seg_cps) = extract_segment(3, &knots, &cps, 0.2, 0.7, 1e-12);
        assert_eq!(seg_knots.first().copied(), Some(0.2));
        assert_eq!(seg_knots.last().copied(), Some(0.7));
        assert_eq!(seg_knots.len(), seg_cps.len() + 4);
        for i in 0..=10 {
            let u = 0.2 + 0.5 * f64::from(i) / 10.0;
            let a = eval_homogeneous(3, &knots, &cps, u).to_point3().unwrap();
            let b = eval_homogeneous(3, &seg_knots, &seg_cps, u).to_point3().unwrap();
            assert!(a.distance_to(b) < 1e-12);
        }
        let start = seg_cps[0].to_point3().unwrap();
        let expected = eval_homogeneous(3, &knots, &cps, 0.2).to_point3().unwrap();
        assert!(start.distance_to(expected) < 1e-12);
    }

    #[test]
    fn interior_knots_are_distinct_and_open() {
        let knots = [0.0, 0.0, 0.25, 0.25, 0.5, 0.75, 1.0, 1.0];
        assert_eq!(interior_knots(&knots, 0.0, 1.0, 0.0), vec![0.25, 0.5, 0.75]);
        assert_eq!(interior_knots(&knots, 0.25, 0.75, 0.0), vec![0.5]);
        assert_eq!(interior_knots(&knots, 0.0, 0.5001, 1e-3), vec![0.25]);
        assert_eq!(interior_knots(&knots, 0.0, 0.5001, 1e-6), vec![0.25, 0.5]);
    }

    #[test]
    fn basis_is_a_partition_of_unity() {
        let (knots, _) = cubic();
        for i in 0..=20 {
            let u = f64::from(i) / 20.0;
            let span = find_span(4, 3, u, &knots);
            let sum: f64 = basis_functions(span, u, 3, &knots).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "sum {sum} at u = {u}");
        }
    }

    #[test]
    fn greville_points_reproduce_the_parameter() {
        let (knots, _) = cubic();
        let taus = greville(3, &knots, 5);
        assert_eq!(taus[0], 0.0);
        assert_eq!(taus[4], 1.0);
        let cps: Vec<HPoint4> = taus.iter().map(|&t| HPoint4::new(t, 0.0, 0.0, 1.0)).collect();
        let value = eval_homogeneous(3, &knots, &cps, 0.37);
        assert!((value.x - 0.37).abs() < 1e-12);
    }

    #[test]
    fn knot_vectors_raise_and_merge() {
        let raised = raise_multiplicities(&[0.0, 0.0, 0.5, 1.0, 1.0], 1);
        assert_eq!(raised, vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0]);
        let merged = merge_knots(&[0.0, 0.0, 0.25, 1.0, 1.0], &[0.0, 0.5, 0.5, 1.0 + 1e-14], 1e-12);
        assert_eq!(merged, vec![0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0]);
    }
}
