use nalgebra::Point3;

use crate::error::{CenterlineError, CenterlineResult};

/// Polyline reparameterized to evenly spaced arc-length samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResampledCurve {
    points: Vec<Point3<f64>>,
}

impl ResampledCurve {
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }
}

impl AsRef<[Point3<f64>]> for ResampledCurve {
    fn as_ref(&self) -> &[Point3<f64>] {
        &self.points
    }
}

/// `s_0 = 0`, `s_i = s_{i-1} + |p_i - p_{i-1}|`.
pub fn cumulative_arc_length(curve: &[Point3<f64>]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(curve.len());
    if curve.is_empty() {
        return cum;
    }
    let mut total = 0.0;
    cum.push(total);
    for w in curve.windows(2) {
        total += (w[1] - w[0]).norm();
        cum.push(total);
    }
    cum
}

/// Resamples `curve` to `num_points` points evenly spaced in cumulative arc
/// length, interpolating linearly between the bracketing input points.
///
/// Curves with fewer than two points are returned unchanged. When the input
/// has at least two points the first and last output points are the input
/// endpoints exactly. A curve of zero length maps every sample to its first
/// point.
pub fn resample(curve: &[Point3<f64>], num_points: usize) -> CenterlineResult<ResampledCurve> {
    if num_points < 1 {
        return Err(CenterlineError::invalid_argument(
            "num_points",
            "must be at least 1",
        ));
    }
    if curve.len() < 2 {
        return Ok(ResampledCurve {
            points: curve.to_vec(),
        });
    }

    let cum = cumulative_arc_length(curve);
    let total = cum[cum.len() - 1];
    let first = curve[0];
    let last = curve[curve.len() - 1];

    if num_points == 1 {
        return Ok(ResampledCurve {
            points: vec![first],
        });
    }
    if total <= 0.0 {
        return Ok(ResampledCurve {
            points: vec![first; num_points],
        });
    }

    let step = total / (num_points - 1) as f64;
    let mut points = Vec::with_capacity(num_points);
    points.push(first);
    for k in 1..num_points - 1 {
        points.push(interpolate_at(curve, &cum, k as f64 * step));
    }
    points.push(last);

    Ok(ResampledCurve { points })
}

fn interpolate_at(curve: &[Point3<f64>], cum: &[f64], s: f64) -> Point3<f64> {
    // First knot at or beyond `s`, kept inside [1, n-1] so a segment always exists.
    let hi = cum.partition_point(|&c| c < s).clamp(1, cum.len() - 1);
    let lo = hi - 1;
    let span = cum[hi] - cum[lo];
    if span <= 0.0 {
        return curve[hi];
    }
    let t = (s - cum[lo]) / span;
    curve[lo] + (curve[hi] - curve[lo]) * t
}

#[cfg(test)]
mod resample_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_segment_into_five_points() {
        let line = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        let resampled = resample(&line, 5).unwrap();
        let xs: Vec<f64> = resampled.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert!(resampled.points().iter().all(|p| p.y == 0.0 && p.z == 0.0));
        assert_eq!(resampled.points()[0], line[0]);
        assert_eq!(resampled.points()[4], line[1]);
    }

    #[test]
    fn test_short_curves_are_returned_unchanged() {
        let single = vec![Point3::new(1.0, 2.0, 3.0)];
        assert_eq!(resample(&single, 10).unwrap().points(), &single[..]);
        assert!(resample(&[], 10).unwrap().is_empty());
    }

    #[test]
    fn test_zero_points_is_invalid() {
        let line = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert!(matches!(
            resample(&line, 0),
            Err(CenterlineError::InvalidArgument { name: "num_points", .. })
        ));
    }

    #[test]
    fn test_samples_are_evenly_spaced_along_a_bend() {
        // L-shaped path of length 6: 4 along x, then 2 along y.
        let path = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 2.0, 0.0),
        ];
        let resampled = resample(&path, 7).unwrap();
        assert_eq!(resampled.len(), 7);
        for w in resampled.points().windows(2) {
            assert_relative_eq!((w[1] - w[0]).norm(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(resampled.points()[5].y, 1.0, epsilon = 1e-12);
        assert_eq!(*resampled.points().last().unwrap(), path[3]);
    }

    #[test]
    fn test_repeated_points_do_not_produce_nan() {
        let path = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let resampled = resample(&path, 5).unwrap();
        assert!(resampled.points().iter().all(|p| p.x.is_finite()));
        assert_relative_eq!(resampled.points()[2].x, 1.0, epsilon = 1e-12);

        let degenerate = vec![Point3::new(1.0, 1.0, 1.0); 3];
        let resampled = resample(&degenerate, 4).unwrap();
        assert_eq!(resampled.points(), &[Point3::new(1.0, 1.0, 1.0); 4][..]);
    }

    #[test]
    fn test_cumulative_arc_length() {
        let path = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 4.0, 0.0),
            Point3::new(3.0, 4.0, 2.0),
        ];
        assert_eq!(cumulative_arc_length(&path), vec![0.0, 5.0, 7.0]);
    }
}
