//! Convex-bound tests on control hulls: separating planes and tangent cones.

use crate::geom::{BBox, Point3, Vec3};

/// Smallest cone around `axis` containing a set of directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ConeBound {
    pub axis: Vec3,
    pub cos_half_angle: f64,
}

impl ConeBound {
    /// `None` when every direction is shorter than `zero_length` or the
    /// directions cancel out.
    pub fn from_directions(dirs: &[Vec3], zero_length: f64) -> Option<Self> {
        let units: Vec<Vec3> = dirs
            .iter()
            .filter(|d| d.length() > zero_length)
            .filter_map(|d| d.normalized())
            .collect();
        if units.is_empty() {
            return None;
        }
        let axis = units.iter().fold(Vec3::ZERO, |acc, u| acc.add(*u)).normalized()?;
        let cos_half_angle = units
            .iter()
            .map(|u| u.dot(axis))
            .fold(1.0_f64, f64::min)
            .clamp(-1.0, 1.0);
        Some(Self { axis, cos_half_angle })
    }

    pub fn half_angle(self) -> f64 {
        self.cos_half_angle.acos()
    }

    /// All directions lie within `bend` of the axis, and the cone is convex.
    pub fn is_narrow(self, bend: f64) -> bool {
        self.cos_half_angle > 0.0 && self.cos_half_angle >= bend.cos()
    }

    /// The cones share no line direction (either orientation).
    pub fn separated_from(self, other: Self) -> bool {
        let between = self.axis.dot(other.axis).abs().clamp(0.0, 1.0).acos();
        between > self.half_angle() + other.half_angle()
    }
}

/// Lower bound of the distance between the convex hulls of `a` and `b`.
///
/// Tries the bounding boxes, the centroid direction, the centroid direction
/// with each of `axes` (unit vectors) projected out, and each of `normals`.
/// Zero when no candidate separates the hulls.
pub(crate) fn separation(a: &[Point3], b: &[Point3], axes: &[Vec3], normals: &[Vec3]) -> f64 {
    let mut best = match (BBox::from_points(a), BBox::from_points(b)) {
        (Some(box_a), Some(box_b)) => box_a.gap_to(box_b),
        _ => return 0.0,
    };

    let (Some(ca), Some(cb)) = (Point3::centroid(a), Point3::centroid(b)) else {
        return best;
    };
    let towards = cb.sub_point(ca);
    let mut candidates = vec![towards];
    candidates.extend(axes.iter().map(|axis| towards.reject_from(*axis)));
    candidates.extend_from_slice(normals);

    let extremes = |points: &[Point3], dir: Vec3| {
        points.iter().map(|p| p.to_vec3().dot(dir)).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        })
    };
    for dir in candidates.into_iter().filter_map(Vec3::normalized) {
        let (min_a, max_a) = extremes(a, dir);
        let (min_b, max_b) = extremes(b, dir);
        best = best.max(min_b - max_a).max(min_a - max_b);
    }
    best
}

/// Largest distance from `p` to any hull point; every point of the hull
/// lies within it.
pub(crate) fn max_distance_to(points: &[Point3], p: Point3) -> f64 {
    points.iter().map(|q| q.distance_to(p)).fold(0.0, f64::max)
}
