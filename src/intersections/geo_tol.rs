use serde::Serialize;

use super::error::IntersectionError;

/// Tolerance bundle shared read-only by every node of an intersection tree.
///
/// `epsge` is the only value callers normally pick; the derived tolerances
/// default to values that suit double precision geometry in the unit-to-
/// thousands range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoTol {
    epsge: f64,
    rel_par_res: f64,
    numerical_tol: f64,
    knot_tol: f64,
    ref_ang: f64,
    bend: f64,
}

impl GeoTol {
    pub const DEFAULT_REL_PAR_RES: f64 = 1e-12;
    pub const DEFAULT_NUMERICAL_TOL: f64 = 1e-15;
    pub const DEFAULT_KNOT_TOL: f64 = 1e-10;
    pub const DEFAULT_REF_ANG: f64 = 0.01;
    pub const DEFAULT_BEND: f64 = std::f64::consts::FRAC_PI_6;

    pub fn new(epsge: f64) -> Result<Self, IntersectionError> {
        if !epsge.is_finite() || epsge <= 0.0 {
            return Err(IntersectionError::InvalidTolerance(epsge));
        }
        Ok(Self {
            epsge,
            rel_par_res: Self::DEFAULT_REL_PAR_RES,
            numerical_tol: Self::DEFAULT_NUMERICAL_TOL,
            knot_tol: Self::DEFAULT_KNOT_TOL,
            ref_ang: Self::DEFAULT_REF_ANG,
            bend: Self::DEFAULT_BEND,
        })
    }

    /// Relative parameter resolution: a subdomain narrower than this
    /// fraction of the full domain is a micro case.
    pub fn with_rel_par_res(mut self, rel_par_res: f64) -> Result<Self, IntersectionError> {
        if !rel_par_res.is_finite() || rel_par_res <= 0.0 || rel_par_res >= 1.0 {
            return Err(IntersectionError::InvalidTolerance(rel_par_res));
        }
        self.rel_par_res = rel_par_res;
        Ok(self)
    }

    /// Maximum half-angle of a tangent cone that still counts as linear.
    pub fn with_bend(mut self, bend: f64) -> Result<Self, IntersectionError> {
        if !bend.is_finite() || bend <= 0.0 || bend >= std::f64::consts::FRAC_PI_2 {
            return Err(IntersectionError::InvalidTolerance(bend));
        }
        self.bend = bend;
        Ok(self)
    }

    /// Parameter distance within which a subdomain end snaps onto a knot
    /// when hulls are extracted, and within which knots are not offered as
    /// split values.
    pub fn with_knot_tol(mut self, knot_tol: f64) -> Result<Self, IntersectionError> {
        if !knot_tol.is_finite() || knot_tol < 0.0 || knot_tol >= 1.0 {
            return Err(IntersectionError::InvalidTolerance(knot_tol));
        }
        self.knot_tol = knot_tol;
        Ok(self)
    }

    /// Angle below which crossing directions are classified as tangential.
    pub fn with_ref_ang(mut self, ref_ang: f64) -> Result<Self, IntersectionError> {
        if !ref_ang.is_finite() || ref_ang <= 0.0 || ref_ang >= std::f64::consts::FRAC_PI_2 {
            return Err(IntersectionError::InvalidTolerance(ref_ang));
        }
        self.ref_ang = ref_ang;
        Ok(self)
    }

    #[must_use]
    pub const fn epsge(&self) -> f64 {
        self.epsge
    }

    #[must_use]
    pub const fn rel_par_res(&self) -> f64 {
        self.rel_par_res
    }

    #[must_use]
    pub const fn numerical_tol(&self) -> f64 {
        self.numerical_tol
    }

    #[must_use]
    pub const fn knot_tol(&self) -> f64 {
        self.knot_tol
    }

    #[must_use]
    pub const fn ref_ang(&self) -> f64 {
        self.ref_ang
    }

    #[must_use]
    pub const fn bend(&self) -> f64 {
        self.bend
    }

    /// Smallest subdomain width worth subdividing, for a parameter whose full
    /// domain has width `full_width`.
    #[must_use]
    pub fn min_param_width(&self, full_width: f64) -> f64 {
        (self.rel_par_res * full_width.abs()).max(f64::MIN_POSITIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_epsilon() {
        assert_eq!(GeoTol::new(0.0), Err(IntersectionError::InvalidTolerance(0.0)));
        assert!(GeoTol::new(-1e-3).is_err());
        assert!(GeoTol::new(f64::NAN).is_err());
        assert!(GeoTol::new(f64::INFINITY).is_err());
    }

    #[test]
    fn derived_defaults() {
        let tol = GeoTol::new(1e-3).unwrap();
        assert_eq!(tol.epsge(), 1e-3);
        assert_eq!(tol.rel_par_res(), 1e-12);
        assert_eq!(tol.knot_tol(), 1e-10);
        assert!((tol.min_param_width(4.0) - 4e-12).abs() < 1e-24);
    }

    #[test]
    fn builders_validate() {
        let tol = GeoTol::new(1e-3).unwrap();
        assert!(tol.with_bend(0.2).is_ok());
        assert!(tol.with_bend(2.0).is_err());
        assert!(tol.with_rel_par_res(0.0).is_err());
        assert_eq!(tol.with_ref_ang(0.05).unwrap().ref_ang(), 0.05);
        assert_eq!(tol.with_knot_tol(1e-6).unwrap().knot_tol(), 1e-6);
        assert!(tol.with_knot_tol(-1e-6).is_err());
    }
}
