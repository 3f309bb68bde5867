use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::io::PointCloud;

/// Radial and angular noise applied to generated rings.
const JITTER: f64 = 0.02;

/// Generates ellipse points in the plane `z = center.z` for testing
pub fn generate_ellipse_ring(
    major: f64,
    minor: f64,
    num_points: usize,
    rotation: f64,
    center: Point3<f64>,
    rng: &mut StdRng,
) -> Vec<Point3<f64>> {
    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let theta = 2.0 * PI * (i as f64) / (num_points as f64) + rng.random_range(-JITTER..JITTER);
        let scale = 1.0 + rng.random_range(-JITTER..JITTER);
        let x = major * scale * theta.cos();
        let y = minor * scale * theta.sin();
        let (x_rot, y_rot) = rotate_point((x, y), rotation);
        points.push(Point3::new(x_rot + center.x, y_rot + center.y, center.z));
    }
    points
}

/// Rotates a point around origin
pub fn rotate_point(point: (f64, f64), angle: f64) -> (f64, f64) {
    let (x, y) = point;
    let cos = angle.cos();
    let sin = angle.sin();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Circular tube along z from 0 to `length`, one ring every `ring_spacing`.
fn tube_along<F>(
    radius: f64,
    length: f64,
    ring_spacing: f64,
    points_per_ring: usize,
    seed: u64,
    center_at: F,
) -> Vec<Point3<f64>>
where
    F: Fn(f64) -> (f64, f64),
{
    let mut rng = StdRng::seed_from_u64(seed);
    let rings = (length / ring_spacing).round() as usize;
    (0..=rings)
        .flat_map(|k| {
            let z = k as f64 * ring_spacing;
            let (cx, cy) = center_at(z);
            generate_ellipse_ring(
                radius,
                radius,
                points_per_ring,
                0.0,
                Point3::new(cx, cy, z),
                &mut rng,
            )
        })
        .collect()
}

/// Straight vessel on the z axis.
pub fn straight_tube(
    radius: f64,
    length: f64,
    ring_spacing: f64,
    points_per_ring: usize,
    seed: u64,
) -> PointCloud {
    PointCloud::new(tube_along(
        radius,
        length,
        ring_spacing,
        points_per_ring,
        seed,
        |_| (0.0, 0.0),
    ))
}

/// Vessel whose axis bends as `x = 3 sin(z / 10)`.
pub fn bent_tube(
    radius: f64,
    length: f64,
    ring_spacing: f64,
    points_per_ring: usize,
    seed: u64,
) -> PointCloud {
    PointCloud::new(tube_along(
        radius,
        length,
        ring_spacing,
        points_per_ring,
        seed,
        |z| (3.0 * (z / 10.0).sin(), 0.0),
    ))
}

/// Axis of [`bent_tube`] sampled every `step`.
pub fn bent_axis(length: f64, step: f64) -> Vec<Point3<f64>> {
    let n = (length / step).round() as usize;
    (0..=n)
        .map(|k| {
            let z = k as f64 * step;
            Point3::new(3.0 * (z / 10.0).sin(), 0.0, z)
        })
        .collect()
}

/// A thin vessel on the z axis plus a wider one at x = 8 that starts at
/// z = 5, so it is the larger cluster in every slab it shares.
pub fn two_tubes(seed: u64) -> PointCloud {
    let mut points = tube_along(1.5, 20.0, 0.25, 40, seed, |_| (0.0, 0.0));
    let wide = tube_along(3.0, 15.0, 0.25, 80, seed + 1, |_| (8.0, 0.0));
    points.extend(wide.into_iter().map(|p| Point3::new(p.x, p.y, p.z + 5.0)));
    PointCloud::new(points)
}
