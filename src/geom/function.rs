//! Scalar B-spline functions, the factors the curve creators multiply and
//! blend curves with.

use super::bspline::{self, is_non_decreasing};

/// Non-rational spline function `f(t) = Σ c_i N_i,p(t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BsplineFunction {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub coefficients: Vec<f64>,
}

impl BsplineFunction {
    pub fn new(degree: usize, knots: Vec<f64>, coefficients: Vec<f64>) -> Result<Self, String> {
        if degree == 0 {
            return Err("spline function degree must be >= 1".to_string());
        }
        if coefficients.len() <= degree {
            return Err("spline function degree must be < coefficient count".to_string());
        }
        if knots.len() != coefficients.len() + degree + 1 {
            return Err(format!(
                "spline function knot length must be {}, got {}",
                coefficients.len() + degree + 1,
                knots.len()
            ));
        }
        if !is_non_decreasing(&knots) || knots.iter().any(|k| !k.is_finite()) {
            return Err("spline function knots must be finite and non-decreasing".to_string());
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err("spline function coefficients must be finite".to_string());
        }
        if knots[degree] >= knots[coefficients.len()] {
            return Err("spline function parameter domain is empty".to_string());
        }
        Ok(Self {
            degree,
            knots,
            coefficients,
        })
    }

    /// The straight ramp from `start_value` at `t0` to `end_value` at `t1`.
    pub fn linear(t0: f64, t1: f64, start_value: f64, end_value: f64) -> Result<Self, String> {
        Self::new(1, vec![t0, t0, t1, t1], vec![start_value, end_value])
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.coefficients.len()])
    }

    /// Value at `t`, clamped into the domain.
    #[must_use]
    pub fn value_at(&self, t: f64) -> f64 {
        let (a, b) = self.domain();
        let u = t.clamp(a, b);
        let n = self.coefficients.len() - 1;
        let span = bspline::find_span(n, self.degree, u, &self.knots);
        bspline::basis_functions(span, u, self.degree, &self.knots)
            .iter()
            .zip(&self.coefficients[span - self.degree..=span])
            .map(|(b, c)| b * c)
            .sum()
    }
}
