//! Curves built by multiplying curves with scalar spline functions.
//!
//! Every result lies in a spline space that contains the exact product, so
//! interpolating at that space's Greville abscissae recovers it without
//! approximation error.

use super::CreatorError;
use crate::geom::bspline::{self, HPoint4};
use crate::geom::{BsplineFunction, Curve3, NurbsCurve3, Point3, Tolerance};
use crate::intersections::solve::solve_linear;

fn check_domains(first: (f64, f64), second: (f64, f64)) -> Result<(), CreatorError> {
    let tol = Tolerance::ZERO_LENGTH;
    if tol.approx_eq_f64(first.0, second.0) && tol.approx_eq_f64(first.1, second.1) {
        Ok(())
    } else {
        Err(CreatorError::DomainMismatch { first, second })
    }
}

/// Degree and knots of the space holding the product of two splines: each
/// factor's knots gain the other factor's degree in multiplicity.
fn product_space(p1: usize, knots1: &[f64], p2: usize, knots2: &[f64]) -> (usize, Vec<f64>) {
    let knots = bspline::merge_knots(
        &bspline::raise_multiplicities(knots1, p2),
        &bspline::raise_multiplicities(knots2, p1),
        Tolerance::ZERO_LENGTH.eps,
    );
    (p1 + p2, knots)
}

/// Homogeneous control points of the spline in `(degree, knots)` that
/// agrees with `target` at the Greville abscissae.
fn interpolate_at_greville(
    degree: usize,
    knots: &[f64],
    target: impl Fn(f64) -> HPoint4,
) -> Result<Vec<HPoint4>, CreatorError> {
    let count = knots.len() - degree - 1;
    let mut rows = Vec::with_capacity(count);
    let mut values = Vec::with_capacity(count);
    for tau in bspline::greville(degree, knots, count) {
        let span = bspline::find_span(count - 1, degree, tau, knots);
        let mut row = vec![0.0; count];
        for (j, b) in bspline::basis_functions(span, tau, degree, knots).into_iter().enumerate() {
            row[span - degree + j] = b;
        }
        rows.push(row);
        values.push(target(tau));
    }

    let solve = |coord: fn(&HPoint4) -> f64| {
        solve_linear(rows.clone(), values.iter().map(coord).collect()).ok_or(CreatorError::SingularSystem)
    };
    let x = solve(|h| h.x)?;
    let y = solve(|h| h.y)?;
    let z = solve(|h| h.z)?;
    let w = solve(|h| h.w)?;
    Ok((0..count).map(|i| HPoint4::new(x[i], y[i], z[i], w[i])).collect())
}

fn to_curve(
    degree: usize,
    knots: Vec<f64>,
    mut hpoints: Vec<HPoint4>,
    rational: bool,
) -> Result<NurbsCurve3, CreatorError> {
    if !rational {
        for h in &mut hpoints {
            h.w = 1.0;
        }
    }
    Ok(NurbsCurve3::from_hpoints(degree, knots, &hpoints)?)
}

/// The curve `t -> alpha(t) * C(t)`.
///
/// The degree is the sum of both degrees. A rational `curve` keeps its
/// weight function, so the product stays exact.
pub fn mult_curve_with_function(alpha: &BsplineFunction, curve: &NurbsCurve3) -> Result<NurbsCurve3, CreatorError> {
    check_domains(alpha.domain(), curve.domain())?;
    let (degree, knots) = product_space(alpha.degree, &alpha.knots, curve.degree, &curve.knots);
    let hpoints = curve.hpoints();
    let product = interpolate_at_greville(degree, &knots, |t| {
        let h = bspline::eval_homogeneous(curve.degree, &curve.knots, &hpoints, t);
        let a = alpha.value_at(t);
        HPoint4::new(h.x * a, h.y * a, h.z * a, h.w)
    })?;
    to_curve(degree, knots, product, curve.is_rational())
}

/// The curve `t -> alpha1(t) * C1(t) + alpha2(t) * C2(t)`.
///
/// All four inputs must share one parameter domain. The lower-degree product
/// is raised to the degree of the other before the spaces are joined.
pub fn blend(
    alpha1: &BsplineFunction,
    curve1: &NurbsCurve3,
    alpha2: &BsplineFunction,
    curve2: &NurbsCurve3,
) -> Result<NurbsCurve3, CreatorError> {
    if curve1.is_rational() || curve2.is_rational() {
        return Err(CreatorError::RationalBlend);
    }
    check_domains(alpha1.domain(), curve1.domain())?;
    check_domains(alpha2.domain(), curve2.domain())?;
    check_domains(curve1.domain(), curve2.domain())?;

    let (d1, k1) = product_space(alpha1.degree, &alpha1.knots, curve1.degree, &curve1.knots);
    let (d2, k2) = product_space(alpha2.degree, &alpha2.knots, curve2.degree, &curve2.knots);
    let degree = d1.max(d2);
    let knots = bspline::merge_knots(
        &bspline::raise_multiplicities(&k1, degree - d1),
        &bspline::raise_multiplicities(&k2, degree - d2),
        Tolerance::ZERO_LENGTH.eps,
    );

    let blended = interpolate_at_greville(degree, &knots, |t| {
        let p = curve1.point_at(t).to_vec3() * alpha1.value_at(t) + curve2.point_at(t).to_vec3() * alpha2.value_at(t);
        HPoint4::new(p.x, p.y, p.z, 1.0)
    })?;
    to_curve(degree, knots, blended, false)
}

/// The planar graph `t -> (t, f(t), 0)` of a spline function, with the same
/// degree and knots as `function`.
pub fn insert_param_domain(function: &BsplineFunction) -> Result<NurbsCurve3, CreatorError> {
    let count = function.coefficients.len();
    let abscissae = bspline::greville(function.degree, &function.knots, count);
    let control_points = abscissae
        .iter()
        .zip(&function.coefficients)
        .map(|(&t, &c)| Point3::new(t, c, 0.0))
        .collect();
    Ok(NurbsCurve3::new(function.degree, control_points, function.knots.clone(), None)?)
}
