//! 2D geometry kernel: vector helpers, angles, circle fitting, and splines.
//!
//! Everything in here operates on pixel-space coordinates and is shared by the
//! measurement builders and the overlay layout engine.

use std::f32::consts::PI;

use nalgebra::{Point2, Vector2};

/// Tolerance used for enclosure tests and collinearity checks.
///
/// Chosen large enough to absorb the floating-point error accumulated by the
/// incremental circle fit on typical pixel-space coordinates.
const EPSILON: f32 = 1e-3;

/// Returns `v` scaled to unit length, or the zero vector if `v` has zero length.
pub fn normalize(v: Vector2<f32>) -> Vector2<f32> {
    let len = v.norm();
    if len > 0.0 && len.is_finite() {
        v / len
    } else {
        Vector2::zeros()
    }
}

/// Rotates `v` by 90° counterclockwise.
#[inline]
pub fn perp(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(-v.y, v.x)
}

/// Moves `point` by `dist` along `dir`.
///
/// Returns [`None`] when any input coordinate is non-finite, so degenerate
/// geometry never propagates into the draw layer.
pub fn translate(point: Point2<f32>, dir: Vector2<f32>, dist: f32) -> Option<Point2<f32>> {
    let out = point + dir * dist;
    if out.x.is_finite() && out.y.is_finite() {
        Some(out)
    } else {
        None
    }
}

/// Returns the angle of `p` as seen from `origin`, in radians.
#[inline]
pub fn angle_of(p: Point2<f32>, origin: Point2<f32>) -> f32 {
    (p.y - origin.y).atan2(p.x - origin.x)
}

/// Returns the smallest signed difference between two angles, in `[-π, π]`.
pub fn angle_delta(a: f32, b: f32) -> f32 {
    (b - a + PI).rem_euclid(2.0 * PI) - PI
}

/// Returns the point at `dist` from `origin` in the direction `angle`.
#[inline]
pub fn point_on_ray(origin: Point2<f32>, angle: f32, dist: f32) -> Point2<f32> {
    origin + Vector2::new(angle.cos(), angle.sin()) * dist
}

/// Maps `theta` into `[-π/2, π/2]` by adding a half turn if needed.
///
/// Text drawn at the returned angle reads left to right no matter which way
/// the underlying rail or arm points.
pub fn upright_angle(theta: f32) -> f32 {
    let t = theta.rem_euclid(PI);
    if t > PI / 2.0 {
        t - PI
    } else {
        t
    }
}

/// Returns the unsigned angle between two vectors, in radians.
///
/// Returns [`None`] when either vector has zero length.
pub fn angle_between(a: Vector2<f32>, b: Vector2<f32>) -> Option<f32> {
    let len = a.norm() * b.norm();
    if len <= 0.0 || !len.is_finite() {
        return None;
    }
    let cos = (a.dot(&b) / len).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// A circle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point2<f32>,
    pub radius: f32,
}

impl Circle {
    /// Returns whether `p` lies inside the circle, with a small epsilon of slack.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        nalgebra::distance(&self.center, &p) <= self.radius + EPSILON
    }

    #[inline]
    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }
}

/// Computes the smallest circle enclosing all of `points`.
///
/// Incremental construction: points already inside the running circle are
/// skipped; every point found outside becomes a boundary point of a refit
/// circle built from two-point (diameter) and three-point (circumcircle)
/// fits. Worst case O(n³), which is fine for the small point sets this crate
/// fits (4 iris ring points).
///
/// Returns [`None`] for an empty input.
pub fn min_enclosing_circle(points: &[Point2<f32>]) -> Option<Circle> {
    let (&first, rest) = points.split_first()?;
    let mut circle = Circle {
        center: first,
        radius: 0.0,
    };

    for (i, &p) in rest.iter().enumerate() {
        if !circle.contains(p) {
            circle = circle_with_boundary_point(&points[..=i], p);
        }
    }
    Some(circle)
}

/// Smallest circle enclosing `inside` with `q` on its boundary.
fn circle_with_boundary_point(inside: &[Point2<f32>], q: Point2<f32>) -> Circle {
    let mut circle = Circle {
        center: q,
        radius: 0.0,
    };
    for (i, &p) in inside.iter().enumerate() {
        if !circle.contains(p) {
            circle = circle_with_boundary_pair(&inside[..i], q, p);
        }
    }
    circle
}

/// Smallest circle enclosing `inside` with `q1` and `q2` on its boundary.
fn circle_with_boundary_pair(inside: &[Point2<f32>], q1: Point2<f32>, q2: Point2<f32>) -> Circle {
    let mut circle = diameter_circle(q1, q2);
    for &p in inside {
        if !circle.contains(p) {
            // Collinear triples have no circumcircle; the previous fit
            // already encloses such points to within the epsilon.
            if let Some(c) = circumcircle(q1, q2, p) {
                circle = c;
            }
        }
    }
    circle
}

/// The circle with segment `a`–`b` as its diameter.
fn diameter_circle(a: Point2<f32>, b: Point2<f32>) -> Circle {
    let center = nalgebra::center(&a, &b);
    Circle {
        center,
        radius: nalgebra::distance(&center, &a),
    }
}

/// The circle passing through three points, or [`None`] if they are collinear.
pub fn circumcircle(a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> Option<Circle> {
    // Twice the signed area of the triangle; near zero means collinear.
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < EPSILON {
        return None;
    }

    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point2::new(ux, uy);
    Some(Circle {
        center,
        radius: nalgebra::distance(&center, &a),
    })
}

/// Samples a uniform Catmull-Rom spline through `points`.
///
/// The curve passes through every control point. Endpoints are clamped by
/// reusing the first and last points as phantom controls. Returns the input
/// unchanged when there are fewer than 3 points or `samples_per_segment` is 0.
pub fn catmull_rom(points: &[Point2<f32>], samples_per_segment: usize) -> Vec<Point2<f32>> {
    if points.len() < 3 || samples_per_segment == 0 {
        return points.to_vec();
    }

    let at = |i: isize| points[i.clamp(0, points.len() as isize - 1) as usize];
    let mut out = Vec::with_capacity(points.len() * samples_per_segment + 1);
    out.push(points[0]);

    for seg in 0..points.len() - 1 {
        let (p0, p1, p2, p3) = (
            at(seg as isize - 1),
            at(seg as isize),
            at(seg as isize + 1),
            at(seg as isize + 2),
        );
        for step in 1..=samples_per_segment {
            let t = step as f32 / samples_per_segment as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let x = 0.5
                * ((2.0 * p1.x)
                    + (-p0.x + p2.x) * t
                    + (2.0 * p0.x - 5.0 * p1.x + 4.0 * p2.x - p3.x) * t2
                    + (-p0.x + 3.0 * p1.x - 3.0 * p2.x + p3.x) * t3);
            let y = 0.5
                * ((2.0 * p1.y)
                    + (-p0.y + p2.y) * t
                    + (2.0 * p0.y - 5.0 * p1.y + 4.0 * p2.y - p3.y) * t2
                    + (-p0.y + 3.0 * p1.y - 3.0 * p2.y + p3.y) * t3);
            out.push(Point2::new(x, y));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn normalize_zero_vector() {
        assert_eq!(normalize(Vector2::zeros()), Vector2::zeros());
        let unit = normalize(Vector2::new(3.0, 4.0));
        assert_relative_eq!(unit.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn perp_is_ccw() {
        assert_eq!(perp(Vector2::x()), Vector2::y());
    }

    #[test]
    fn angle_between_perpendicular_and_identical() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 1.0);
        assert_relative_eq!(
            angle_between(a, b).unwrap().to_degrees(),
            90.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(angle_between(a, a).unwrap(), 0.0, epsilon = 1e-6);
        assert_eq!(angle_between(a, Vector2::zeros()), None);
    }

    #[test]
    fn angle_delta_wraps() {
        assert_relative_eq!(angle_delta(0.1, -0.1), -0.2, epsilon = 1e-6);
        // Crossing the ±π seam takes the short way around.
        assert_relative_eq!(angle_delta(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-5);
    }

    #[test]
    fn upright_angle_keeps_text_readable() {
        assert_relative_eq!(upright_angle(0.3), 0.3, epsilon = 1e-6);
        assert_relative_eq!(upright_angle(PI - 0.3), -0.3, epsilon = 1e-6);
        assert_relative_eq!(upright_angle(-PI + 0.3), 0.3, epsilon = 1e-6);
        let t = upright_angle(2.5);
        assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&t));
    }

    #[test]
    fn enclosing_circle_of_unit_square() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let circle = min_enclosing_circle(&square).unwrap();
        assert_relative_eq!(circle.center.x, 0.5, epsilon = 1e-4);
        assert_relative_eq!(circle.center.y, 0.5, epsilon = 1e-4);
        assert_relative_eq!(circle.radius, 2.0_f32.sqrt() / 2.0, epsilon = 1e-4);
    }

    #[test]
    fn enclosing_circle_contains_random_points() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..100 {
            let points: Vec<_> = (0..8)
                .map(|_| Point2::new(rng.f32() * 640.0, rng.f32() * 480.0))
                .collect();
            let circle = min_enclosing_circle(&points).unwrap();
            for &p in &points {
                assert!(
                    circle.contains(p),
                    "{p} outside fitted circle {circle:?}",
                );
            }
        }
    }

    #[test]
    fn circumcircle_of_collinear_points_is_degenerate() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 1.0);
        let c = Point2::new(2.0, 2.0);
        assert_eq!(circumcircle(a, b, c), None);
    }

    #[test]
    fn enclosing_circle_survives_collinear_input() {
        let collinear = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        let circle = min_enclosing_circle(&collinear).unwrap();
        for &p in &collinear {
            assert!(circle.contains(p));
        }
    }

    #[test]
    fn catmull_rom_passes_through_controls() {
        let controls = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 5.0),
            Point2::new(20.0, 0.0),
        ];
        let curve = catmull_rom(&controls, 4);
        assert_eq!(curve.len(), 1 + 2 * 4);
        assert_relative_eq!(curve[0].x, 0.0);
        assert_relative_eq!(curve[4].x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(curve[4].y, 5.0, epsilon = 1e-4);
        assert_relative_eq!(curve[8].x, 20.0, epsilon = 1e-4);
    }
}
