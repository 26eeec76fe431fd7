//! Small dense solves and the bounded distance minimiser shared by every
//! pair intersector.

use crate::geom::Vec3;

/// Solves `a x = b` by Gaussian elimination with partial pivoting.
pub(crate) fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Result of [`minimize_distance`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Minimum {
    pub params: Vec<f64>,
    pub distance: f64,
    /// The iteration stopped at a stationary point of the bounded problem
    /// rather than running out of iterations.
    pub converged: bool,
}

/// Bounded Levenberg-Marquardt on `|r(p)|²`.
///
/// `eval` returns the residual `r` and its Jacobian columns `∂r/∂p_i`.
/// Every iterate is clamped into `[lo, hi]`.
pub(crate) fn minimize_distance<F>(
    start: &[f64],
    lo: &[f64],
    hi: &[f64],
    iterations: usize,
    numerical_tol: f64,
    eval: F,
) -> Minimum
where
    F: Fn(&[f64]) -> (Vec3, Vec<Vec3>),
{
    let n = start.len();
    let clamp = |p: &mut Vec<f64>| {
        for (i, v) in p.iter_mut().enumerate() {
            *v = v.clamp(lo[i], hi[i]);
        }
    };

    let mut p = start.to_vec();
    clamp(&mut p);
    let (mut r, mut jac) = eval(&p);
    let mut f = r.length_squared();
    if n == 0 {
        return Minimum {
            params: p,
            distance: f.sqrt(),
            converged: true,
        };
    }

    let mut lambda = 1e-3;
    let mut converged = false;
    for _ in 0..iterations {
        if f.sqrt() <= numerical_tol {
            converged = true;
            break;
        }

        let mut h = vec![vec![0.0; n]; n];
        let mut g = vec![0.0; n];
        for i in 0..n {
            g[i] = -jac[i].dot(r);
            for j in 0..n {
                h[i][j] = jac[i].dot(jac[j]);
            }
        }
        let scale = (0..n).map(|i| h[i][i]).fold(0.0, f64::max).max(f64::MIN_POSITIVE);
        for (i, row) in h.iter_mut().enumerate() {
            row[i] += lambda * row[i].max(1e-12 * scale);
        }

        let Some(delta) = solve_linear(h, g) else {
            lambda *= 8.0;
            continue;
        };
        let mut trial: Vec<f64> = p.iter().zip(&delta).map(|(a, d)| a + d).collect();
        clamp(&mut trial);
        let step = (0..n)
            .map(|i| (trial[i] - p[i]).abs() / (hi[i] - lo[i]).max(f64::MIN_POSITIVE))
            .fold(0.0, f64::max);

        let (tr, tj) = eval(&trial);
        let tf = tr.length_squared();
        if tf <= f {
            p = trial;
            r = tr;
            jac = tj;
            f = tf;
            lambda = (lambda * 0.25).max(1e-12);
            if step <= 1e-13 {
                converged = true;
                break;
            }
        } else {
            lambda *= 8.0;
            if lambda > 1e12 || step <= 1e-13 {
                converged = true;
                break;
            }
        }
    }

    Minimum {
        params: p,
        distance: f.sqrt(),
        converged,
    }
}
