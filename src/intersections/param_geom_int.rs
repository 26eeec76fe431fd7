//! Operands of an intersection: a shared handle to the geometry plus the
//! parameter subdomain the current node works on.
//!
//! The geometry itself is never mutated. Subdividing an operand only narrows
//! the cached domain; every node of a recursion tree points at the same
//! underlying curve or surface.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::error::IntersectionError;
use super::geo_tol::GeoTol;
use super::hull::ConeBound;
use crate::geom::{BBox, ParamCurve, ParamDirection, ParamSurface, Point3, Vec3};

/// Geometric role of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GeomKind {
    Point,
    Curve,
    Surface,
}

impl GeomKind {
    #[must_use]
    pub const fn num_params(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Curve => 1,
            Self::Surface => 2,
        }
    }
}

impl fmt::Display for GeomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Point => "point",
            Self::Curve => "curve",
            Self::Surface => "surface",
        })
    }
}

fn check_domain(kind: GeomKind, (start, end): (f64, f64)) -> Result<(), IntersectionError> {
    if start.is_finite() && end.is_finite() && start < end {
        Ok(())
    } else {
        Err(IntersectionError::InvalidDomain { kind, start, end })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamPointInt {
    pub point: Point3,
}

// ─────────────────────────────────────────────────────────────────────────────
// Curve
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ParamCurveInt {
    curve: Rc<dyn ParamCurve>,
    start: f64,
    end: f64,
    full: (f64, f64),
    knot_tol: f64,
}

impl ParamCurveInt {
    pub fn new(curve: Rc<dyn ParamCurve>) -> Result<Self, IntersectionError> {
        let full = curve.domain();
        check_domain(GeomKind::Curve, full)?;
        Ok(Self {
            curve,
            start: full.0,
            end: full.1,
            full,
            knot_tol: GeoTol::DEFAULT_KNOT_TOL,
        })
    }

    #[must_use]
    pub fn curve(&self) -> &dyn ParamCurve {
        self.curve.as_ref()
    }

    /// Current subdomain.
    #[must_use]
    pub const fn range(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    #[must_use]
    pub const fn full_range(&self) -> (f64, f64) {
        self.full
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn mid(&self) -> f64 {
        0.5 * (self.start + self.end)
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.curve.point_at(t)
    }

    #[must_use]
    pub fn derivative_at(&self, t: f64) -> Vec3 {
        self.curve.derivative_at(t)
    }

    #[must_use]
    pub const fn knot_tol(&self) -> f64 {
        self.knot_tol
    }

    #[must_use]
    pub fn hull_points(&self) -> Vec<Point3> {
        self.curve.hull_points(self.start, self.end, self.knot_tol)
    }

    /// Control polygon legs of the current piece (all forward differences
    /// for a rational curve).
    #[must_use]
    pub fn tangent_directions(&self) -> Vec<Vec3> {
        self.curve.tangent_directions(self.start, self.end, self.knot_tol)
    }

    pub(crate) fn tangent_cone(&self) -> Option<ConeBound> {
        ConeBound::from_directions(&self.tangent_directions(), 1e-300)
    }

    #[must_use]
    pub fn interior_knots(&self) -> Vec<f64> {
        self.curve.interior_knots(self.start, self.end, self.knot_tol)
    }

    /// The same curve restricted to `[start, end]`.
    #[must_use]
    pub fn restricted(&self, start: f64, end: f64) -> Self {
        Self {
            curve: Rc::clone(&self.curve),
            start,
            end,
            full: self.full,
            knot_tol: self.knot_tol,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surface
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ParamSurfaceInt {
    surface: Rc<dyn ParamSurface>,
    u: (f64, f64),
    v: (f64, f64),
    full_u: (f64, f64),
    full_v: (f64, f64),
    knot_tol: f64,
}

impl ParamSurfaceInt {
    pub fn new(surface: Rc<dyn ParamSurface>) -> Result<Self, IntersectionError> {
        let full_u = surface.domain_u();
        let full_v = surface.domain_v();
        check_domain(GeomKind::Surface, full_u)?;
        check_domain(GeomKind::Surface, full_v)?;
        Ok(Self {
            surface,
            u: full_u,
            v: full_v,
            full_u,
            full_v,
            knot_tol: GeoTol::DEFAULT_KNOT_TOL,
        })
    }

    #[must_use]
    pub fn surface(&self) -> &dyn ParamSurface {
        self.surface.as_ref()
    }

    #[must_use]
    pub const fn range(&self, dir: ParamDirection) -> (f64, f64) {
        match dir {
            ParamDirection::U => self.u,
            ParamDirection::V => self.v,
        }
    }

    #[must_use]
    pub const fn full_range(&self, dir: ParamDirection) -> (f64, f64) {
        match dir {
            ParamDirection::U => self.full_u,
            ParamDirection::V => self.full_v,
        }
    }

    #[must_use]
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.surface.point_at(u, v)
    }

    #[must_use]
    pub fn hull_points(&self) -> Vec<Point3> {
        self.surface.hull_points(self.u.0, self.u.1, self.v.0, self.v.1, self.knot_tol)
    }

    pub(crate) fn tangent_cone(&self, dir: ParamDirection) -> Option<ConeBound> {
        let dirs = self
            .surface
            .tangent_directions(dir, self.u.0, self.u.1, self.v.0, self.v.1, self.knot_tol);
        ConeBound::from_directions(&dirs, 1e-300)
    }

    /// Unit normal of a patch whose tangent cones are narrow enough to
    /// define a plane.
    pub(crate) fn normal_axis(&self, bend: f64) -> Option<(Vec3, ConeBound, ConeBound)> {
        let cu = self.tangent_cone(ParamDirection::U)?;
        let cv = self.tangent_cone(ParamDirection::V)?;
        if !cu.is_narrow(bend) || !cv.is_narrow(bend) {
            return None;
        }
        let normal = cu.axis.cross(cv.axis).normalized()?;
        Some((normal, cu, cv))
    }

    /// The curve obtained by fixing `dir` at `value`, over the current
    /// subdomain of the other direction.
    #[must_use]
    pub fn iso_curve(&self, dir: ParamDirection, value: f64) -> ParamCurveInt {
        let curve: Rc<dyn ParamCurve> = Rc::from(self.surface.iso_curve(dir, value));
        let (start, end) = self.range(dir.other());
        ParamCurveInt {
            curve,
            start,
            end,
            full: self.full_range(dir.other()),
            knot_tol: self.knot_tol,
        }
    }

    /// Upper estimate of how far the patch moves when only `dir` varies:
    /// the largest iso-curve hull among three fixed values of the other
    /// direction.
    #[must_use]
    pub fn extent_along(&self, dir: ParamDirection) -> f64 {
        let (a, b) = self.range(dir.other());
        [a, 0.5 * (a + b), b]
            .into_iter()
            .map(|fixed| {
                let iso = self.iso_curve(dir.other(), fixed);
                BBox::from_points(&iso.hull_points()).map_or(0.0, BBox::diagonal)
            })
            .fold(0.0, f64::max)
    }

    #[must_use]
    pub fn restricted(&self, dir: ParamDirection, start: f64, end: f64) -> Self {
        let mut out = self.clone();
        match dir {
            ParamDirection::U => out.u = (start, end),
            ParamDirection::V => out.v = (start, end),
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParamGeomInt
// ─────────────────────────────────────────────────────────────────────────────

/// One operand of an intersector.
///
/// Parameters are laid out in a flat slice: none for a point, `[t]` for a
/// curve, `[u, v]` for a surface.
#[derive(Debug, Clone)]
pub enum ParamGeomInt {
    Point(ParamPointInt),
    Curve(ParamCurveInt),
    Surface(ParamSurfaceInt),
}

impl ParamGeomInt {
    #[must_use]
    pub const fn point(point: Point3) -> Self {
        Self::Point(ParamPointInt { point })
    }

    /// Shares `curve` with the caller.
    pub fn curve(curve: Rc<dyn ParamCurve>) -> Result<Self, IntersectionError> {
        ParamCurveInt::new(curve).map(Self::Curve)
    }

    /// Takes a private copy of `curve`.
    pub fn curve_copy(curve: &dyn ParamCurve) -> Result<Self, IntersectionError> {
        Self::curve(Rc::from(curve.clone_box()))
    }

    pub fn surface(surface: Rc<dyn ParamSurface>) -> Result<Self, IntersectionError> {
        ParamSurfaceInt::new(surface).map(Self::Surface)
    }

    pub fn surface_copy(surface: &dyn ParamSurface) -> Result<Self, IntersectionError> {
        Self::surface(Rc::from(surface.clone_box()))
    }

    /// The same operand with knot snapping at `knot_tol`. Points have no
    /// knots and are returned unchanged.
    #[must_use]
    pub fn with_knot_tol(mut self, knot_tol: f64) -> Self {
        match &mut self {
            Self::Point(_) => {}
            Self::Curve(c) => c.knot_tol = knot_tol,
            Self::Surface(s) => s.knot_tol = knot_tol,
        }
        self
    }

    #[must_use]
    pub const fn knot_tol(&self) -> f64 {
        match self {
            Self::Point(_) => GeoTol::DEFAULT_KNOT_TOL,
            Self::Curve(c) => c.knot_tol,
            Self::Surface(s) => s.knot_tol,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> GeomKind {
        match self {
            Self::Point(_) => GeomKind::Point,
            Self::Curve(_) => GeomKind::Curve,
            Self::Surface(_) => GeomKind::Surface,
        }
    }

    #[must_use]
    pub const fn num_params(&self) -> usize {
        self.kind().num_params()
    }

    /// Current subdomain of local parameter `i`.
    #[must_use]
    pub fn range(&self, i: usize) -> (f64, f64) {
        match self {
            Self::Point(_) => (0.0, 0.0),
            Self::Curve(c) => c.range(),
            Self::Surface(s) => s.range(direction(i)),
        }
    }

    #[must_use]
    pub fn full_range(&self, i: usize) -> (f64, f64) {
        match self {
            Self::Point(_) => (0.0, 0.0),
            Self::Curve(c) => c.full_range(),
            Self::Surface(s) => s.full_range(direction(i)),
        }
    }

    #[must_use]
    pub fn start_params(&self) -> Vec<f64> {
        (0..self.num_params()).map(|i| self.range(i).0).collect()
    }

    #[must_use]
    pub fn end_params(&self) -> Vec<f64> {
        (0..self.num_params()).map(|i| self.range(i).1).collect()
    }

    #[must_use]
    pub fn mid_params(&self) -> Vec<f64> {
        (0..self.num_params())
            .map(|i| {
                let (a, b) = self.range(i);
                0.5 * (a + b)
            })
            .collect()
    }

    /// Evaluates at local parameters `params` (length `num_params()`).
    #[must_use]
    pub fn point_at(&self, params: &[f64]) -> Point3 {
        match self {
            Self::Point(p) => p.point,
            Self::Curve(c) => c.point_at(params[0]),
            Self::Surface(s) => s.point_at(params[0], params[1]),
        }
    }

    /// Partial derivatives, one per local parameter.
    #[must_use]
    pub fn derivatives_at(&self, params: &[f64]) -> Vec<Vec3> {
        match self {
            Self::Point(_) => Vec::new(),
            Self::Curve(c) => vec![c.derivative_at(params[0])],
            Self::Surface(s) => {
                let (du, dv) = s.surface().partial_derivatives_at(params[0], params[1]);
                vec![du, dv]
            }
        }
    }

    #[must_use]
    pub fn hull_points(&self) -> Vec<Point3> {
        match self {
            Self::Point(p) => vec![p.point],
            Self::Curve(c) => c.hull_points(),
            Self::Surface(s) => s.hull_points(),
        }
    }

    /// Diagonal of the control hull's bounding box.
    #[must_use]
    pub fn extent(&self) -> f64 {
        BBox::from_points(&self.hull_points()).map_or(0.0, BBox::diagonal)
    }

    /// Geometric extent when only local parameter `i` varies.
    #[must_use]
    pub fn extent_along(&self, i: usize) -> f64 {
        match self {
            Self::Point(_) => 0.0,
            Self::Curve(_) => self.extent(),
            Self::Surface(s) => s.extent_along(direction(i)),
        }
    }

    #[must_use]
    pub fn interior_knots(&self, i: usize) -> Vec<f64> {
        match self {
            Self::Point(_) => Vec::new(),
            Self::Curve(c) => c.interior_knots(),
            Self::Surface(s) => {
                let (a, b) = s.range(direction(i));
                s.surface().interior_knots(direction(i), a, b, s.knot_tol)
            }
        }
    }

    /// Splits local parameter `i` at `value`. `None` when `value` is not
    /// strictly inside the current subdomain.
    #[must_use]
    pub fn split(&self, i: usize, value: f64) -> Option<(Self, Self)> {
        let (a, b) = self.range(i);
        if !(value > a && value < b) {
            return None;
        }
        match self {
            Self::Point(_) => None,
            Self::Curve(c) => Some((Self::Curve(c.restricted(a, value)), Self::Curve(c.restricted(value, b)))),
            Self::Surface(s) => {
                let dir = direction(i);
                Some((
                    Self::Surface(s.restricted(dir, a, value)),
                    Self::Surface(s.restricted(dir, value, b)),
                ))
            }
        }
    }

    /// The operand with local parameter `i` fixed at `value`: a curve becomes
    /// a point, a surface becomes an iso-curve.
    #[must_use]
    pub fn reduced(&self, i: usize, value: f64) -> Option<Self> {
        match self {
            Self::Point(_) => None,
            Self::Curve(c) => Some(Self::point(c.point_at(value))),
            Self::Surface(s) => Some(Self::Curve(s.iso_curve(direction(i), value))),
        }
    }

    #[must_use]
    pub fn as_curve(&self) -> Option<&ParamCurveInt> {
        match self {
            Self::Curve(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_surface(&self) -> Option<&ParamSurfaceInt> {
        match self {
            Self::Surface(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_point(&self) -> Option<Point3> {
        match self {
            Self::Point(p) => Some(p.point),
            _ => None,
        }
    }
}

/// Local parameter index of a surface to its direction.
pub(crate) const fn direction(i: usize) -> ParamDirection {
    if i == 0 { ParamDirection::U } else { ParamDirection::V }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Curve3, Line3, NurbsCurve3, NurbsSurface, PlaneSurface};

    fn arch() -> NurbsCurve3 {
        NurbsCurve3::clamped_uniform(
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(3.0, 2.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn curve_split_narrows_domain_only() {
        let line = Line3::new(Point3::ORIGIN, Point3::new(4.0, 0.0, 0.0));
        let op = ParamGeomInt::curve_copy(&line).unwrap();
        let (left, right) = op.split(0, 0.25).unwrap();
        assert_eq!(left.range(0), (0.0, 0.25));
        assert_eq!(right.range(0), (0.25, 1.0));
        assert_eq!(right.full_range(0), (0.0, 1.0));
        assert_eq!(left.point_at(&[0.25]), Point3::new(1.0, 0.0, 0.0));
        assert!(op.split(0, 1.0).is_none());
    }

    #[test]
    fn surface_reduces_to_iso_curve() {
        let plane = PlaneSurface::new(Point3::ORIGIN, Vec3::X, Vec3::Y);
        let op = ParamGeomInt::surface_copy(&plane).unwrap();
        let (_, upper) = op.split(0, 0.5).unwrap();
        let iso = upper.reduced(1, 0.25).unwrap();
        assert_eq!(iso.kind(), GeomKind::Curve);
        assert_eq!(iso.range(0), (0.5, 1.0));
        assert_eq!(iso.point_at(&[0.75]), Point3::new(0.75, 0.25, 0.0));
        assert!((upper.extent_along(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn point_has_no_parameters() {
        let op = ParamGeomInt::point(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(op.num_params(), 0);
        assert!(op.start_params().is_empty());
        assert_eq!(op.extent(), 0.0);
        assert!(op.reduced(0, 0.0).is_none());
    }

    #[test]
    fn knot_tolerance_governs_knots_and_hull_of_a_piece() {
        let curve = arch();
        let op = ParamGeomInt::curve_copy(&curve).unwrap();
        assert_eq!(op.knot_tol(), GeoTol::DEFAULT_KNOT_TOL);
        let (piece, _) = op.split(0, 0.5005).unwrap();
        assert_eq!(piece.interior_knots(0), vec![0.5]);
        let tight_end = *piece.hull_points().last().unwrap();
        assert!(tight_end.distance_to(curve.point_at(0.5005)) < 1e-12);

        let loose = piece.with_knot_tol(1e-3);
        assert_eq!(loose.knot_tol(), 1e-3);
        assert!(loose.interior_knots(0).is_empty());
        let loose_end = *loose.hull_points().last().unwrap();
        assert!(loose_end.distance_to(curve.point_at(0.5)) < 1e-12);

        let (left, right) = loose.split(0, 0.25).unwrap();
        assert_eq!(left.knot_tol(), 1e-3);
        assert_eq!(right.knot_tol(), 1e-3);
    }

    #[test]
    fn iso_curves_inherit_surface_knot_tolerance() {
        let mut pts = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                pts.push(Point3::new(f64::from(i), f64::from(j), f64::from((i * j) % 3)));
            }
        }
        let surface = NurbsSurface::clamped_uniform(2, 2, 4, 4, pts).unwrap();
        let op = ParamGeomInt::surface_copy(&surface).unwrap().with_knot_tol(1e-3);
        let (lower, _) = op.split(1, 0.5004).unwrap();
        assert!(lower.interior_knots(1).is_empty());
        assert_eq!(lower.interior_knots(0), vec![0.5]);
        let iso = lower.reduced(0, 0.3).unwrap();
        assert_eq!(iso.knot_tol(), 1e-3);
        assert!(iso.interior_knots(0).is_empty());
    }
}
