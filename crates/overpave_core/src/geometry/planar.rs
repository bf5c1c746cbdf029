//! # Planar Geometry
//!
//! Stateless helpers operating on the horizontal projection of 3D points.
//! The vertical coordinate never decides a collision, but every returned
//! point carries a `y` interpolated along the segment it lies on.

use std::f64::consts::PI;

use super::vec3::Vec3;

/// Distance below which two segments are considered to truly cross.
pub const EPSILON: f64 = 1e-6;

/// Horizontal axis selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// The x axis (lines of constant x run north/south)
    X,
    /// The z axis (lines of constant z run east/west)
    Z,
}

impl Axis {
    /// Component of `v` along this axis.
    #[inline]
    #[must_use]
    pub const fn component(self, v: Vec3) -> f64 {
        match self {
            Self::X => v.x,
            Self::Z => v.z,
        }
    }

    /// The other horizontal axis.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::Z,
            Self::Z => Self::X,
        }
    }
}

/// Result of a segment/segment proximity test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHit {
    /// Smallest planar distance between the two segments.
    pub distance: f64,
    /// Closest point on the first segment.
    pub on_first: Vec3,
    /// Closest point on the second segment.
    pub on_second: Vec3,
    /// Parameter of `on_first` along the first segment (0 = start).
    pub t_first: f64,
    /// Parameter of `on_second` along the second segment (0 = start).
    pub t_second: f64,
    /// True only for an actual crossing or touch, not mere proximity.
    pub intersects: bool,
}

/// Unsigned planar angle between two directions, in radians (0 to PI).
///
/// Returns 0 when either direction has no horizontal extent.
#[must_use]
pub fn angle_between(a: Vec3, b: Vec3) -> f64 {
    if a.flat_length() <= EPSILON || b.flat_length() <= EPSILON {
        return 0.0;
    }
    a.flat_cross(b).abs().atan2(a.flat_dot(b))
}

/// Returns true if the two directions lie on parallel lines within
/// `tolerance` radians. Opposite directions count as parallel.
#[must_use]
pub fn is_parallel(a: Vec3, b: Vec3, tolerance: f64) -> bool {
    if a.flat_length() <= EPSILON || b.flat_length() <= EPSILON {
        return false;
    }
    let angle = angle_between(a, b);
    angle.min(PI - angle) <= tolerance
}

/// How far the path turns at `at`, in radians. 0 means straight on.
#[must_use]
pub fn turn_angle(prev: Vec3, at: Vec3, next: Vec3) -> f64 {
    angle_between(at - prev, next - at)
}

/// Planar distance from `p` to segment `a`-`b`.
///
/// Returns `(distance, closest point, parameter along the segment)`.
/// A zero-length segment degrades to a point distance.
#[must_use]
pub fn point_segment_distance(p: Vec3, a: Vec3, b: Vec3) -> (f64, Vec3, f64) {
    let ab = (b - a).flat();
    let len_sq = ab.flat_dot(ab);
    if len_sq <= EPSILON * EPSILON {
        return (p.flat_distance(a), a, 0.0);
    }
    let t = ((p - a).flat_dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a.lerp(b, t);
    (p.flat_distance(closest), closest, t)
}

/// Planar proximity test between segment `a`-`b` and segment `c`-`d`.
///
/// Returns a hit when the segments come within `margin` of each other.
/// The reported distance is identical regardless of argument order.
#[must_use]
pub fn segment_intersects(a: Vec3, b: Vec3, c: Vec3, d: Vec3, margin: f64) -> Option<SegmentHit> {
    let u = (b - a).flat();
    let v = (d - c).flat();
    let denom = u.flat_cross(v);

    // Proper crossing, only meaningful when the segments are not parallel
    // and neither is degenerate.
    if denom.abs() > EPSILON && u.flat_length() > EPSILON && v.flat_length() > EPSILON {
        let w = (c - a).flat();
        let s = w.flat_cross(v) / denom;
        let t = w.flat_cross(u) / denom;
        if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
            return Some(SegmentHit {
                distance: 0.0,
                on_first: a.lerp(b, s),
                on_second: c.lerp(d, t),
                t_first: s,
                t_second: t,
                intersects: true,
            });
        }
    }

    // Otherwise the minimum is reached at one of the four endpoints.
    let (d_a, q_a, t_a) = point_segment_distance(a, c, d);
    let (d_b, q_b, t_b) = point_segment_distance(b, c, d);
    let (d_c, q_c, t_c) = point_segment_distance(c, a, b);
    let (d_d, q_d, t_d) = point_segment_distance(d, a, b);

    let candidates = [
        (d_a, a, q_a, 0.0, t_a),
        (d_b, b, q_b, 1.0, t_b),
        (d_c, q_c, c, t_c, 0.0),
        (d_d, q_d, d, t_d, 1.0),
    ];
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.0 < best.0 {
            best = *candidate;
        }
    }

    let (distance, on_first, on_second, t_first, t_second) = best;
    if distance > margin {
        return None;
    }
    Some(SegmentHit {
        distance,
        on_first,
        on_second,
        t_first,
        t_second,
        intersects: distance < EPSILON,
    })
}

/// Where segment `a`-`b` crosses the line `axis == coordinate`.
///
/// A segment lying on the line, or touching it only at `a`, has no crossing.
#[must_use]
pub fn grid_line_crossing(a: Vec3, b: Vec3, axis: Axis, coordinate: f64) -> Option<Vec3> {
    let from = axis.component(a);
    let to = axis.component(b);
    if (to - from).abs() <= EPSILON {
        return None;
    }
    let t = (coordinate - from) / (to - from);
    if t <= 0.0 || t > 1.0 {
        return None;
    }
    let mut hit = a.lerp(b, t);
    // Snap exactly onto the line to avoid drift at region borders
    match axis {
        Axis::X => hit.x = coordinate,
        Axis::Z => hit.z = coordinate,
    }
    Some(hit)
}

/// All crossings of segment `a`-`b` with the grid lines `k * step` of both
/// horizontal axes, ordered from `a` towards `b`.
#[must_use]
pub fn grid_line_crossings(a: Vec3, b: Vec3, step: f64) -> Vec<(Axis, Vec3)> {
    let mut hits: Vec<(f64, Axis, Vec3)> = Vec::new();
    if step <= EPSILON {
        return Vec::new();
    }
    for axis in [Axis::X, Axis::Z] {
        let from = axis.component(a);
        let to = axis.component(b);
        let (lo, hi) = if from < to { (from, to) } else { (to, from) };
        let first = (lo / step).floor() as i64;
        let last = (hi / step).floor() as i64;
        for k in first..=last {
            if let Some(hit) = grid_line_crossing(a, b, axis, k as f64 * step) {
                hits.push((a.flat_distance(hit), axis, hit));
            }
        }
    }
    hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
    hits.into_iter().map(|(_, axis, hit)| (axis, hit)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, z: f64) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let hit = segment_intersects(p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(10.0, 0.0), 0.5)
            .expect("crossing segments must hit");
        assert!(hit.intersects);
        assert!(hit.on_first.flat_eq(p(5.0, 5.0), 1e-9));
        assert!((hit.t_first - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_segments_are_not_true_crossings() {
        let hit = segment_intersects(p(0.0, 0.0), p(10.0, 0.0), p(5.0, 1.0), p(5.0, 8.0), 2.0)
            .expect("within margin");
        assert!(!hit.intersects);
        assert!((hit.distance - 1.0).abs() < 1e-9);
        assert!(segment_intersects(p(0.0, 0.0), p(10.0, 0.0), p(5.0, 3.0), p(5.0, 8.0), 2.0).is_none());
    }

    #[test]
    fn test_segment_distance_is_symmetric() {
        let cases = [
            (p(0.0, 0.0), p(10.0, 0.0), p(3.0, 2.0), p(12.0, 7.0)),
            (p(0.0, 0.0), p(10.0, 0.0), p(0.0, 3.0), p(10.0, 3.0)),
            (p(1.0, 1.0), p(1.0, 1.0), p(4.0, 0.0), p(4.0, 9.0)),
            (p(-3.0, 2.5), p(7.0, -1.0), p(2.0, 2.0), p(2.0, -6.0)),
        ];
        for (a, b, c, d) in cases {
            let first = segment_intersects(a, b, c, d, 100.0).expect("hit");
            let second = segment_intersects(c, d, a, b, 100.0).expect("hit");
            assert_eq!(first.distance, second.distance);
        }
    }

    #[test]
    fn test_parallel_and_degenerate_segments() {
        let hit = segment_intersects(p(0.0, 0.0), p(10.0, 0.0), p(2.0, 2.0), p(8.0, 2.0), 3.0).expect("parallel");
        assert!((hit.distance - 2.0).abs() < 1e-9);

        let overlap = segment_intersects(p(0.0, 0.0), p(10.0, 0.0), p(5.0, 0.0), p(15.0, 0.0), 0.1).expect("collinear");
        assert!(overlap.intersects);

        let point = segment_intersects(p(4.0, 4.0), p(4.0, 4.0), p(0.0, 4.0), p(10.0, 4.0), 0.1).expect("degenerate");
        assert!(point.intersects);
    }

    #[test]
    fn test_height_is_interpolated() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 10.0, 0.0);
        let hit = segment_intersects(a, b, p(5.0, -5.0), p(5.0, 5.0), 0.1).expect("crossing");
        assert!((hit.on_first.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_segment_distance() {
        let (d, closest, t) = point_segment_distance(p(5.0, 3.0), p(0.0, 0.0), p(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-9);
        assert!(closest.flat_eq(p(5.0, 0.0), 1e-9));
        assert!((t - 0.5).abs() < 1e-9);

        let (d, _, t) = point_segment_distance(p(-4.0, 3.0), p(0.0, 0.0), p(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_angles_and_parallelism() {
        assert!((angle_between(Vec3::X, Vec3::Z) - PI / 2.0).abs() < 1e-9);
        assert!(is_parallel(Vec3::X, -Vec3::X, 1e-6));
        assert!(!is_parallel(Vec3::X, Vec3::Z, 0.1));
        assert!(turn_angle(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_grid_line_crossings() {
        let hit = grid_line_crossing(p(70.0, 5.0), p(90.0, 15.0), Axis::X, 80.0).expect("crosses");
        assert_eq!(hit.x, 80.0);
        assert!((hit.z - 10.0).abs() < 1e-9);
        assert!(grid_line_crossing(p(0.0, 0.0), p(0.0, 50.0), Axis::X, 0.0).is_none());

        let all = grid_line_crossings(p(5.0, 5.0), p(25.0, 15.0), 10.0);
        let xs: Vec<f64> = all.iter().filter(|(a, _)| *a == Axis::X).map(|(_, h)| h.x).collect();
        assert_eq!(xs, vec![10.0, 20.0]);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_grid_lines_do_not_drift_on_long_segments() {
        let step = 0.1;
        let all = grid_line_crossings(p(0.05, 0.0), p(2000.05, 1.0), step);
        let xs: Vec<f64> = all.iter().filter(|(a, _)| *a == Axis::X).map(|(_, h)| h.x).collect();
        assert_eq!(xs.len(), 20_000);
        for (i, x) in xs.iter().enumerate() {
            assert_eq!(*x, (i as f64 + 1.0) * step, "crossing {i}");
        }
    }
}
