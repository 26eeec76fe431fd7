//! Curves carried between a surface's parameter plane and space.
//!
//! Both directions produce cubic Hermite approximations: piecewise Bézier
//! cubics that match position and first derivative at every breakpoint,
//! bisected until each piece is within `epsge` of the exact curve.

use super::CreatorError;
use crate::geom::{CubicBezier3, Curve3, NurbsCurve3, ParamCurve, ParamSurface, Point3, Tolerance, Vec3};
use crate::intersections::solve::{minimize_distance, solve_linear};

/// Upper bound on the pieces of one approximation.
const MAX_SEGMENTS: usize = 4096;

/// Interior fractions of a piece where the approximation error is sampled.
const CHECK_FRACTIONS: [f64; 5] = [0.125, 0.25, 0.5, 0.75, 0.875];

/// Cells per direction of the start search for a point projection.
const SEED_GRID: usize = 8;

const PROJECTION_ITERATIONS: usize = 50;

/// A space curve projected onto a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCurve {
    /// The projection in space.
    pub space: NurbsCurve3,
    /// The projection in the surface's parameter plane, as `(u, v, 0)`.
    pub parameter: NurbsCurve3,
    /// Largest distance between an end of the input curve and its projection.
    pub end_distance: f64,
}

type Sample = (Point3, Vec3);

fn check_tolerance(epsge: f64) -> Result<(), CreatorError> {
    if epsge.is_finite() && epsge > 0.0 {
        Ok(())
    } else {
        Err(CreatorError::InvalidTolerance(epsge))
    }
}

/// Domain ends and the interior knots, where the input may lose smoothness.
fn breakpoints(curve: &dyn ParamCurve) -> Vec<f64> {
    let (a, b) = curve.domain();
    let mut out = vec![a];
    out.extend(curve.interior_knots(a, b, Tolerance::ZERO_LENGTH.eps));
    out.push(b);
    out
}

fn hermite_piece(start: Sample, end: Sample, h: f64) -> CubicBezier3 {
    CubicBezier3::new(start.0, start.0 + start.1 * (h / 3.0), end.0 + end.1 * (-h / 3.0), end.0)
}

fn approximate_hermite(breaks: &[f64], epsge: f64, eval: impl Fn(f64) -> Sample) -> Result<NurbsCurve3, CreatorError> {
    let mut params = breaks.to_vec();
    let mut samples: Vec<Sample> = params.iter().map(|&t| eval(t)).collect();
    let mut settled = vec![false; params.len() - 1];

    loop {
        let mut worst = 0.0_f64;
        let mut next_params = vec![params[0]];
        let mut next_samples = vec![samples[0]];
        let mut next_settled = Vec::with_capacity(2 * settled.len());

        for k in 0..settled.len() {
            let (t0, t1) = (params[k], params[k + 1]);
            if !settled[k] {
                let piece = hermite_piece(samples[k], samples[k + 1], t1 - t0);
                let error = CHECK_FRACTIONS
                    .iter()
                    .map(|&s| piece.point_at(s).distance_to(eval(t0 + s * (t1 - t0)).0))
                    .fold(0.0, f64::max);
                if error > epsge {
                    worst = worst.max(error);
                    let mid = 0.5 * (t0 + t1);
                    if mid <= t0 || mid >= t1 {
                        return Err(CreatorError::NotConverged {
                            error,
                            tolerance: epsge,
                            segments: settled.len(),
                        });
                    }
                    next_params.push(mid);
                    next_samples.push(eval(mid));
                    next_settled.extend([false, false]);
                    next_params.push(t1);
                    next_samples.push(samples[k + 1]);
                    continue;
                }
            }
            next_settled.push(true);
            next_params.push(t1);
            next_samples.push(samples[k + 1]);
        }

        let split = next_settled.len() > settled.len();
        params = next_params;
        samples = next_samples;
        settled = next_settled;
        if !split {
            break;
        }
        if settled.len() > MAX_SEGMENTS {
            return Err(CreatorError::NotConverged {
                error: worst,
                tolerance: epsge,
                segments: settled.len(),
            });
        }
    }
    log::debug!("hermite approximation settled with {} pieces", settled.len());

    let mut control_points = vec![samples[0].0];
    let mut knots = vec![params[0]; 4];
    for k in 0..settled.len() {
        let piece = hermite_piece(samples[k], samples[k + 1], params[k + 1] - params[k]);
        control_points.extend([piece.p1, piece.p2, piece.p3]);
        let multiplicity = if k + 1 == settled.len() { 4 } else { 3 };
        knots.extend(std::iter::repeat_n(params[k + 1], multiplicity));
    }
    Ok(NurbsCurve3::new(3, control_points, knots, None)?)
}

/// The space curve `S(u(t), v(t))` traced by a curve in the parameter plane
/// of `surface`. The parameter curve's `x` and `y` are read as `u` and `v`.
pub fn lift_parameter_curve(
    parameter_curve: &dyn ParamCurve,
    surface: &dyn ParamSurface,
    epsge: f64,
) -> Result<NurbsCurve3, CreatorError> {
    check_tolerance(epsge)?;
    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();
    approximate_hermite(&breakpoints(parameter_curve), epsge, |t| {
        let p = parameter_curve.point_at(t);
        let d = parameter_curve.derivative_at(t);
        let (u, v) = (p.x.clamp(u0, u1), p.y.clamp(v0, v1));
        let (su, sv) = surface.partial_derivatives_at(u, v);
        (surface.point_at(u, v), su * d.x + sv * d.y)
    })
}

/// Parameters of the point of `surface` closest to `target`.
fn project_point(surface: &dyn ParamSurface, target: Point3) -> (f64, f64) {
    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();
    let mut seed = (u0, v0);
    let mut nearest = f64::INFINITY;
    for i in 0..=SEED_GRID {
        for j in 0..=SEED_GRID {
            let u = u0 + (u1 - u0) * i as f64 / SEED_GRID as f64;
            let v = v0 + (v1 - v0) * j as f64 / SEED_GRID as f64;
            let d = surface.point_at(u, v).distance_to(target);
            if d < nearest {
                nearest = d;
                seed = (u, v);
            }
        }
    }
    let min = minimize_distance(&[seed.0, seed.1], &[u0, v0], &[u1, v1], PROJECTION_ITERATIONS, 1e-15, |p| {
        let (su, sv) = surface.partial_derivatives_at(p[0], p[1]);
        (surface.point_at(p[0], p[1]).sub_point(target), vec![su, sv])
    });
    (min.params[0], min.params[1])
}

/// Parameter velocity `(u', v')` whose image `Su u' + Sv v'` is the
/// tangent-plane component of `velocity`.
fn parameter_velocity(su: Vec3, sv: Vec3, velocity: Vec3) -> (f64, f64) {
    let normal = vec![vec![su.dot(su), su.dot(sv)], vec![sv.dot(su), sv.dot(sv)]];
    solve_linear(normal, vec![su.dot(velocity), sv.dot(velocity)]).map_or((0.0, 0.0), |x| (x[0], x[1]))
}

/// Projects `curve` onto `surface`, returning the projection both in space
/// and in the parameter plane.
///
/// Curve ends farther than `epsge` from the surface are reported in the log
/// and through [`ProjectedCurve::end_distance`]; the projection still runs.
pub fn project_curve(
    curve: &dyn ParamCurve,
    surface: &dyn ParamSurface,
    epsge: f64,
) -> Result<ProjectedCurve, CreatorError> {
    check_tolerance(epsge)?;
    let (a, b) = curve.domain();
    let end_distance = [a, b]
        .into_iter()
        .map(|t| {
            let p = curve.point_at(t);
            let (u, v) = project_point(surface, p);
            surface.point_at(u, v).distance_to(p)
        })
        .fold(0.0, f64::max);
    if end_distance > epsge {
        log::warn!("curve ends lie up to {end_distance} from the surface (epsge {epsge}), projecting anyway");
    }

    let foot = |t: f64| {
        let (u, v) = project_point(surface, curve.point_at(t));
        let (su, sv) = surface.partial_derivatives_at(u, v);
        let (du, dv) = parameter_velocity(su, sv, curve.derivative_at(t));
        (u, v, du, dv, su, sv)
    };
    let breaks = breakpoints(curve);
    let parameter = approximate_hermite(&breaks, epsge, |t| {
        let (u, v, du, dv, _, _) = foot(t);
        (Point3::new(u, v, 0.0), Vec3::new(du, dv, 0.0))
    })?;
    let space = approximate_hermite(&breaks, epsge, |t| {
        let (u, v, du, dv, su, sv) = foot(t);
        (surface.point_at(u, v), su * du + sv * dv)
    })?;
    Ok(ProjectedCurve {
        space,
        parameter,
        end_distance,
    })
}
