//! Endpoint selection for a vessel point cloud.
//!
//! The automatic picker takes the farthest-apart pair of points, an
//! exhaustive O(n²) search split across rows with rayon. The result is
//! deterministic: among pairs at the maximal distance the one found first
//! in row-major index order wins.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::SliceAxis;
use crate::error::{CenterlineError, CenterlineResult};
use crate::io::PointCloud;

/// Farthest pair `(i, j)` with `i < j`.
pub fn select_endpoints(points: &[Point3<f64>]) -> CenterlineResult<(usize, usize)> {
    if points.len() < 2 {
        return Err(CenterlineError::InsufficientData {
            operation: "endpoint selection",
            required: 2,
            actual: points.len(),
        });
    }

    let (distance, i, j) = (0..points.len() - 1)
        .into_par_iter()
        .map(|i| {
            let mut best_j = i + 1;
            let mut best = (points[best_j] - points[i]).norm();
            for j in i + 2..points.len() {
                let d = (points[j] - points[i]).norm();
                if d > best {
                    best = d;
                    best_j = j;
                }
            }
            (best, i, best_j)
        })
        .reduce_with(|a, b| {
            if b.0 > a.0 || (b.0 == a.0 && b.1 < a.1) {
                b
            } else {
                a
            }
        })
        .ok_or(CenterlineError::InsufficientData {
            operation: "endpoint selection",
            required: 2,
            actual: points.len(),
        })?;

    debug!("Farthest pair ({}, {}) at distance {:.3}", i, j, distance);
    Ok((i, j))
}

/// Strategy for choosing the two endpoints of a vessel.
pub trait EndpointPicker {
    fn pick_two_points(&self, cloud: &PointCloud) -> CenterlineResult<(usize, usize)>;
}

/// Farthest-apart pair of the whole cloud.
#[derive(Debug, Clone, Copy, Default)]
pub struct FarthestPairPicker;

impl EndpointPicker for FarthestPairPicker {
    fn pick_two_points(&self, cloud: &PointCloud) -> CenterlineResult<(usize, usize)> {
        select_endpoints(cloud.points())
    }
}

/// Endpoints chosen ahead of time, e.g. by a user clicking on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedEndpoints {
    pub start: usize,
    pub end: usize,
}

impl EndpointPicker for FixedEndpoints {
    fn pick_two_points(&self, cloud: &PointCloud) -> CenterlineResult<(usize, usize)> {
        for index in [self.start, self.end] {
            if index >= cloud.len() {
                return Err(CenterlineError::invalid_argument(
                    "endpoints",
                    format!("index {} out of range for {} points", index, cloud.len()),
                ));
            }
        }
        Ok((self.start, self.end))
    }
}

/// Keeps the points between the two endpoints along `axis`, bounds included.
pub fn crop_between_endpoints(
    cloud: &PointCloud,
    endpoints: (usize, usize),
    axis: SliceAxis,
) -> CenterlineResult<PointCloud> {
    let (a, b) = endpoints;
    let (Some(start), Some(end)) = (cloud.points().get(a), cloud.points().get(b)) else {
        return Err(CenterlineError::invalid_argument(
            "endpoints",
            format!("({}, {}) out of range for {} points", a, b, cloud.len()),
        ));
    };
    let i = axis.index();
    let (lo, hi) = if start[i] <= end[i] {
        (start[i], end[i])
    } else {
        (end[i], start[i])
    };
    let cropped = cloud.crop_axis(axis, lo, hi);
    info!(
        "Cropped to [{:.3}, {:.3}] along {:?}: {} of {} points kept",
        lo,
        hi,
        axis,
        cropped.len(),
        cloud.len()
    );
    Ok(cropped)
}

#[cfg(test)]
mod endpoints_tests {
    use super::*;

    #[test]
    fn test_farthest_pair_on_a_line() {
        let points = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert_eq!(select_endpoints(&points).unwrap(), (1, 2));
    }

    #[test]
    fn test_three_point_cloud_picks_the_outer_pair() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
        ];
        assert_eq!(select_endpoints(&points).unwrap(), (0, 2));
    }

    #[test]
    fn test_two_points() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        assert_eq!(select_endpoints(&points).unwrap(), (0, 1));
    }

    #[test]
    fn test_ties_keep_the_first_pair_in_index_order() {
        // Square: both diagonals have the same length.
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(select_endpoints(&points).unwrap(), (0, 2));

        let same = vec![Point3::new(2.0, 2.0, 2.0); 5];
        assert_eq!(select_endpoints(&same).unwrap(), (0, 1));
    }

    #[test]
    fn test_fewer_than_two_points_is_insufficient() {
        let err = select_endpoints(&[Point3::new(0.0, 0.0, 0.0)]).unwrap_err();
        assert!(matches!(
            err,
            CenterlineError::InsufficientData {
                required: 2,
                actual: 1,
                ..
            }
        ));
        assert!(select_endpoints(&[]).is_err());
    }

    #[test]
    fn test_large_cloud_is_deterministic() {
        let points: Vec<Point3<f64>> = (0..500)
            .map(|i| {
                let t = i as f64 * 0.37;
                Point3::new(t.sin() * 3.0, t.cos() * 3.0, (i % 50) as f64)
            })
            .collect();
        let first = select_endpoints(&points).unwrap();
        for _ in 0..5 {
            assert_eq!(select_endpoints(&points).unwrap(), first);
        }
    }

    #[test]
    fn test_fixed_endpoints_are_range_checked() {
        let cloud = PointCloud::from_tuples(&[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0)]);
        assert_eq!(
            FixedEndpoints { start: 1, end: 0 }.pick_two_points(&cloud).unwrap(),
            (1, 0)
        );
        assert!(FixedEndpoints { start: 0, end: 2 }
            .pick_two_points(&cloud)
            .is_err());
    }

    #[test]
    fn test_crop_between_endpoints_is_inclusive_in_either_order() {
        let cloud = PointCloud::from_tuples(&[
            (0.0, 0.0, 10.0),
            (0.0, 0.0, 2.0),
            (0.0, 0.0, 5.0),
            (0.0, 0.0, -1.0),
            (0.0, 0.0, 8.0),
        ]);
        let cropped = crop_between_endpoints(&cloud, (4, 1), SliceAxis::Z).unwrap();
        let zs: Vec<f64> = cropped.points().iter().map(|p| p.z).collect();
        assert_eq!(zs, vec![2.0, 5.0, 8.0]);
        assert!(crop_between_endpoints(&cloud, (0, 9), SliceAxis::Z).is_err());
    }
}
