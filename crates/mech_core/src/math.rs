//! Geometry helpers for the simulation.
//!
//! Angles are radians. Headings are measured counter-clockwise from the +x
//! axis and kept in (-π, π]. Pitch is positive upward.

use std::f64::consts::{PI, TAU};

use glam::{DVec2, DVec3};
use rand::Rng;

/// Wrap an angle into (-π, π].
#[must_use]
pub fn clamp_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Wrap an angle into [0, 2π).
#[must_use]
pub fn clamp_angle_positive(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation that turns `from` onto `to`, in (-π, π].
#[must_use]
pub fn angle_distance(from: f64, to: f64) -> f64 {
    clamp_angle(to - from)
}

/// True when `a` and `b` are within `distance` of each other.
#[must_use]
pub fn in_proximity(a: DVec2, b: DVec2, distance: f64) -> bool {
    a.distance_squared(b) <= distance * distance
}

/// Uniform sample in `[min, max]`. Returns `min` for an empty range.
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Heading from one point toward another.
#[must_use]
pub fn heading_to(from: DVec2, to: DVec2) -> f64 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Unit vector along a heading.
#[must_use]
pub fn direction(heading: f64) -> DVec2 {
    DVec2::new(heading.cos(), heading.sin())
}

/// Endpoint of a ray of `length` from the origin at the given heading and pitch.
#[must_use]
pub fn ray_endpoint(length: f64, heading: f64, pitch: f64) -> DVec3 {
    let horizontal = length * pitch.cos();
    DVec3::new(
        horizontal * heading.cos(),
        horizontal * heading.sin(),
        length * pitch.sin(),
    )
}

/// Shortest distance from `point` to the segment `a`-`b`.
#[must_use]
pub fn segment_distance(point: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Move `current` toward `target` by at most `step`, never overshooting.
#[must_use]
pub fn approach(current: f64, target: f64, step: f64) -> f64 {
    if current < target {
        (current + step).min(target)
    } else if current > target {
        (current - step).max(target)
    } else {
        current
    }
}
