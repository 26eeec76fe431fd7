use std::fmt;

use super::bspline::{self, HPoint4, eval_homogeneous, is_non_decreasing, polygon_tangent_directions};
use super::core::{Point3, Tolerance, Vec3};
use super::curve::{Curve3, Line3, NurbsCurve3, ParamCurve};

/// Parameter direction of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamDirection {
    U,
    V,
}

impl ParamDirection {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::U => Self::V,
            Self::V => Self::U,
        }
    }
}

/// Evaluation interface of a parametric surface.
pub trait Surface {
    fn point_at(&self, u: f64, v: f64) -> Point3;

    #[must_use]
    fn domain_u(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn domain_v(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    /// `(∂S/∂u, ∂S/∂v)`; central differences unless a type knows better.
    #[must_use]
    fn partial_derivatives_at(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        let diff = |a: f64, b: f64, span: f64, eval: &dyn Fn(f64) -> Point3, x: f64| {
            let h = Tolerance::DERIVATIVE.relative_to(span);
            let lo = (x - h).max(a);
            let hi = (x + h).min(b);
            if hi <= lo {
                return Vec3::ZERO;
            }
            eval(hi).sub_point(eval(lo)).div_scalar(hi - lo)
        };
        let du = diff(u0, u1, u1 - u0, &|s| self.point_at(s, v), u);
        let dv = diff(v0, v1, v1 - v0, &|s| self.point_at(u, s), v);
        (du, dv)
    }

    #[must_use]
    fn normal_at(&self, u: f64, v: f64) -> Option<Vec3> {
        let (du, dv) = self.partial_derivatives_at(u, v);
        du.cross(dv).normalized()
    }
}

/// Surface capability consumed by the intersectors; the two-parameter
/// counterpart of [`ParamCurve`]. `knot_tol` has the same meaning there.
pub trait ParamSurface: Surface + fmt::Debug {
    /// Points whose convex hull contains the patch `[u0, u1] x [v0, v1]`.
    fn hull_points(&self, u0: f64, u1: f64, v0: f64, v1: f64, knot_tol: f64) -> Vec<Point3>;

    /// Vectors whose positive span contains the partial derivative in `dir`
    /// everywhere on the patch.
    #[allow(clippy::too_many_arguments)]
    fn tangent_directions(
        &self,
        dir: ParamDirection,
        u0: f64,
        u1: f64,
        v0: f64,
        v1: f64,
        knot_tol: f64,
    ) -> Vec<Vec3>;

    /// The curve obtained by fixing the `dir` parameter at `value`.
    /// Its parameter runs along the other direction.
    fn iso_curve(&self, dir: ParamDirection, value: f64) -> Box<dyn ParamCurve>;

    fn interior_knots(&self, _dir: ParamDirection, _t0: f64, _t1: f64, _knot_tol: f64) -> Vec<f64> {
        Vec::new()
    }

    fn clone_box(&self) -> Box<dyn ParamSurface>;
}

// ─────────────────────────────────────────────────────────────────────────────
// PlaneSurface
// ─────────────────────────────────────────────────────────────────────────────

/// Parallelogram `origin + u * u_axis + v * v_axis` over the unit square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    pub origin: Point3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl PlaneSurface {
    #[must_use]
    pub const fn new(origin: Point3, u_axis: Vec3, v_axis: Vec3) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
        }
    }
}

impl Surface for PlaneSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.origin
            .add_vec(self.u_axis.mul_scalar(u))
            .add_vec(self.v_axis.mul_scalar(v))
    }

    fn partial_derivatives_at(&self, _u: f64, _v: f64) -> (Vec3, Vec3) {
        (self.u_axis, self.v_axis)
    }
}

impl ParamSurface for PlaneSurface {
    fn hull_points(&self, u0: f64, u1: f64, v0: f64, v1: f64, _knot_tol: f64) -> Vec<Point3> {
        vec![
            self.point_at(u0, v0),
            self.point_at(u1, v0),
            self.point_at(u0, v1),
            self.point_at(u1, v1),
        ]
    }

    fn tangent_directions(
        &self,
        dir: ParamDirection,
        _u0: f64,
        _u1: f64,
        _v0: f64,
        _v1: f64,
        _knot_tol: f64,
    ) -> Vec<Vec3> {
        match dir {
            ParamDirection::U => vec![self.u_axis],
            ParamDirection::V => vec![self.v_axis],
        }
    }

    fn iso_curve(&self, dir: ParamDirection, value: f64) -> Box<dyn ParamCurve> {
        let line = match dir {
            ParamDirection::U => Line3::new(self.point_at(value, 0.0), self.point_at(value, 1.0)),
            ParamDirection::V => Line3::new(self.point_at(0.0, value), self.point_at(1.0, value)),
        };
        Box::new(line)
    }

    fn clone_box(&self) -> Box<dyn ParamSurface> {
        Box::new(*self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NurbsSurface
// ─────────────────────────────────────────────────────────────────────────────

/// Tensor-product NURBS surface. Control points are stored row by row with
/// `u` running fastest: index `v_index * u_count + u_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub u_count: usize,
    pub v_count: usize,
    pub control_points: Vec<Point3>,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

impl NurbsSurface {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: Vec<Point3>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, String> {
        if u_count < 2 || v_count < 2 {
            return Err("nurbs surface requires at least a 2x2 control net".to_string());
        }
        if degree_u == 0 || degree_v == 0 {
            return Err("nurbs surface degrees must be >= 1".to_string());
        }
        if degree_u >= u_count || degree_v >= v_count {
            return Err("nurbs surface degrees must be < control point counts".to_string());
        }
        if control_points.len() != u_count * v_count {
            return Err("nurbs surface control point count must match u_count*v_count".to_string());
        }
        if knots_u.len() != u_count + degree_u + 1 {
            return Err(format!(
                "nurbs surface u knot length must be {}, got {}",
                u_count + degree_u + 1,
                knots_u.len()
            ));
        }
        if knots_v.len() != v_count + degree_v + 1 {
            return Err(format!(
                "nurbs surface v knot length must be {}, got {}",
                v_count + degree_v + 1,
                knots_v.len()
            ));
        }
        if !is_non_decreasing(&knots_u) || !is_non_decreasing(&knots_v) {
            return Err("nurbs surface knots must be non-decreasing".to_string());
        }
        if knots_u[degree_u] >= knots_u[u_count] || knots_v[degree_v] >= knots_v[v_count] {
            return Err("nurbs surface parameter domain is empty".to_string());
        }
        if let Some(ref weights) = weights {
            if weights.len() != control_points.len() {
                return Err("nurbs surface weights length must match control point count".to_string());
            }
            if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
                return Err("nurbs surface weights must be finite and > 0".to_string());
            }
        }

        Ok(Self {
            degree_u,
            degree_v,
            u_count,
            v_count,
            control_points,
            knots_u,
            knots_v,
            weights,
        })
    }

    /// Clamped uniform, non-rational surface on the unit square.
    pub fn clamped_uniform(
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: Vec<Point3>,
    ) -> Result<Self, String> {
        let knots = |degree: usize, count: usize| {
            let spans = count.saturating_sub(degree).max(1);
            let mut k = vec![0.0; degree + 1];
            k.extend((1..spans).map(|i| i as f64 / spans as f64));
            k.extend(std::iter::repeat_n(1.0, degree + 1));
            k
        };
        Self::new(
            degree_u,
            degree_v,
            u_count,
            v_count,
            control_points,
            knots(degree_u, u_count),
            knots(degree_v, v_count),
            None,
        )
    }

    fn control_hpoint(&self, u_index: usize, v_index: usize) -> HPoint4 {
        let idx = v_index * self.u_count + u_index;
        let w = self.weights.as_ref().map_or(1.0, |weights| weights[idx]);
        HPoint4::weighted(self.control_points[idx], w)
    }

    fn row(&self, v_index: usize) -> Vec<HPoint4> {
        (0..self.u_count).map(|i| self.control_hpoint(i, v_index)).collect()
    }

    fn column(&self, u_index: usize) -> Vec<HPoint4> {
        (0..self.v_count).map(|j| self.control_hpoint(u_index, j)).collect()
    }

    /// Homogeneous control polygon of the iso-curve with `dir` fixed at `value`.
    fn iso_hpoints(&self, dir: ParamDirection, value: f64) -> Vec<HPoint4> {
        match dir {
            ParamDirection::U => {
                let (a, b) = self.domain_u();
                let u = value.clamp(a, b);
                (0..self.v_count)
                    .map(|j| eval_homogeneous(self.degree_u, &self.knots_u, &self.row(j), u))
                    .collect()
            }
            ParamDirection::V => {
                let (a, b) = self.domain_v();
                let v = value.clamp(a, b);
                (0..self.u_count)
                    .map(|i| eval_homogeneous(self.degree_v, &self.knots_v, &self.column(i), v))
                    .collect()
            }
        }
    }

    fn iso_nurbs(&self, dir: ParamDirection, value: f64) -> Result<NurbsCurve3, String> {
        let hpoints = self.iso_hpoints(dir, value);
        match dir {
            ParamDirection::U => NurbsCurve3::from_hpoints(self.degree_v, self.knots_v.clone(), &hpoints),
            ParamDirection::V => NurbsCurve3::from_hpoints(self.degree_u, self.knots_u.clone(), &hpoints),
        }
    }

    /// Exact sub-patch control net over `[u0, u1] x [v0, v1]`, as
    /// `(u_count, v_count, hpoints)` in the same row-major layout.
    fn sub_patch(&self, u0: f64, u1: f64, v0: f64, v1: f64, tol: f64) -> (usize, usize, Vec<HPoint4>) {
        let rows: Vec<Vec<HPoint4>> = (0..self.v_count)
            .map(|j| bspline::extract_segment(self.degree_u, &self.knots_u, &self.row(j), u0, u1, tol).1)
            .collect();
        let nu = rows.first().map_or(0, Vec::len);

        let columns: Vec<Vec<HPoint4>> = (0..nu)
            .map(|i| {
                let column: Vec<HPoint4> = rows.iter().map(|row| row[i]).collect();
                bspline::extract_segment(self.degree_v, &self.knots_v, &column, v0, v1, tol).1
            })
            .collect();
        let nv = columns.first().map_or(0, Vec::len);

        let mut net = Vec::with_capacity(nu * nv);
        for j in 0..nv {
            for column in &columns {
                net.push(column[j]);
            }
        }
        (nu, nv, net)
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let (v0, v1) = self.domain_v();
        let column = self.iso_hpoints(ParamDirection::U, u);
        eval_homogeneous(self.degree_v, &self.knots_v, &column, v.clamp(v0, v1))
            .to_point3()
            .unwrap_or(self.control_points[0])
    }

    fn domain_u(&self) -> (f64, f64) {
        (self.knots_u[self.degree_u], self.knots_u[self.u_count])
    }

    fn domain_v(&self) -> (f64, f64) {
        (self.knots_v[self.degree_v], self.knots_v[self.v_count])
    }

    fn partial_derivatives_at(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let du = self
            .iso_nurbs(ParamDirection::V, v)
            .map_or(Vec3::ZERO, |curve| curve.derivative_at(u));
        let dv = self
            .iso_nurbs(ParamDirection::U, u)
            .map_or(Vec3::ZERO, |curve| curve.derivative_at(v));
        (du, dv)
    }
}

impl ParamSurface for NurbsSurface {
    fn hull_points(&self, u0: f64, u1: f64, v0: f64, v1: f64, knot_tol: f64) -> Vec<Point3> {
        let (_, _, net) = self.sub_patch(u0, u1, v0, v1, knot_tol);
        net.iter().filter_map(|h| h.to_point3()).collect()
    }

    fn tangent_directions(
        &self,
        dir: ParamDirection,
        u0: f64,
        u1: f64,
        v0: f64,
        v1: f64,
        knot_tol: f64,
    ) -> Vec<Vec3> {
        let (nu, nv, net) = self.sub_patch(u0, u1, v0, v1, knot_tol);
        let points: Vec<Point3> = net.iter().filter_map(|h| h.to_point3()).collect();
        if points.len() != nu * nv {
            return Vec::new();
        }
        let rational = self.weights.is_some();
        let mut dirs = Vec::new();
        match dir {
            ParamDirection::U => {
                for j in 0..nv {
                    dirs.extend(polygon_tangent_directions(&points[j * nu..(j + 1) * nu], rational));
                }
            }
            ParamDirection::V => {
                for i in 0..nu {
                    let column: Vec<Point3> = (0..nv).map(|j| points[j * nu + i]).collect();
                    dirs.extend(polygon_tangent_directions(&column, rational));
                }
            }
        }
        dirs
    }

    fn iso_curve(&self, dir: ParamDirection, value: f64) -> Box<dyn ParamCurve> {
        match self.iso_nurbs(dir, value) {
            Ok(curve) => Box::new(curve),
            Err(_) => {
                let p = match dir {
                    ParamDirection::U => self.point_at(value, self.domain_v().0),
                    ParamDirection::V => self.point_at(self.domain_u().0, value),
                };
                Box::new(Line3::new(p, p))
            }
        }
    }

    fn interior_knots(&self, dir: ParamDirection, t0: f64, t1: f64, knot_tol: f64) -> Vec<f64> {
        match dir {
            ParamDirection::U => bspline::interior_knots(&self.knots_u, t0, t1, knot_tol),
            ParamDirection::V => bspline::interior_knots(&self.knots_v, t0, t1, knot_tol),
        }
    }

    fn clone_box(&self) -> Box<dyn ParamSurface> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dome() -> NurbsSurface {
        let mut pts = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                let z = if i == 1 && j == 1 { 2.0 } else { 0.0 };
                pts.push(Point3::new(f64::from(i), f64::from(j), z));
            }
        }
        NurbsSurface::clamped_uniform(2, 2, 3, 3, pts).unwrap()
    }

    #[test]
    fn iso_curve_agrees_with_surface() {
        let s = dome();
        let iso = s.iso_curve(ParamDirection::U, 0.3);
        for k in 0..=10 {
            let v = f64::from(k) / 10.0;
            assert!(iso.point_at(v).distance_to(s.point_at(0.3, v)) < 1e-12);
        }
    }

    #[test]
    fn sub_patch_hull_contains_patch_corners() {
        let s = dome();
        let hull = s.hull_points(0.25, 0.75, 0.1, 0.6, 1e-10);
        assert_eq!(hull.len(), 9);
        assert!(hull[0].distance_to(s.point_at(0.25, 0.1)) < 1e-12);
        assert!(hull[8].distance_to(s.point_at(0.75, 0.6)) < 1e-12);
    }

    #[test]
    fn analytic_partials_match_finite_differences() {
        let s = dome();
        let (du, dv) = s.partial_derivatives_at(0.4, 0.55);
        let h = 1e-6;
        let fd_u = s.point_at(0.4 + h, 0.55).sub_point(s.point_at(0.4 - h, 0.55)).div_scalar(2.0 * h);
        let fd_v = s.point_at(0.4, 0.55 + h).sub_point(s.point_at(0.4, 0.55 - h)).div_scalar(2.0 * h);
        assert!(du.sub(fd_u).length() < 1e-5);
        assert!(dv.sub(fd_v).length() < 1e-5);
    }
}
