//! Continuity tracking across slabs.
//!
//! The tracker walks the slabs in axis order and accepts one cluster
//! centroid per slab. The first slab with clusters contributes its largest
//! cluster. Every later slab contributes the centroid closest to the last
//! accepted point, preferring centroids within `max_jump`; when none is
//! within reach the nearest centroid is accepted anyway and the fallback is
//! counted.

use nalgebra::Point3;
use tracing::debug;

use crate::io::{Centerline, CenterlinePoint};
use crate::processing::slices::{SlabClusters, SliceCluster};

/// How a slab's centroid was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// First accepted slab: the cluster with most members.
    Largest,
    /// Closest centroid strictly within `max_jump` of the previous point.
    WithinJump,
    /// No centroid within `max_jump`; the closest one overall.
    NearestFallback,
}

/// Chooses one cluster of a slab. Returns `None` when the slab has no clusters.
///
/// Ties keep the earliest cluster label.
pub fn select_cluster(
    clusters: &[SliceCluster],
    previous: Option<&Point3<f64>>,
    max_jump: f64,
) -> Option<(usize, Selection)> {
    if clusters.is_empty() {
        return None;
    }

    let Some(previous) = previous else {
        let mut best = 0;
        for (i, c) in clusters.iter().enumerate().skip(1) {
            if c.size > clusters[best].size {
                best = i;
            }
        }
        return Some((best, Selection::Largest));
    };

    let distances: Vec<f64> = clusters
        .iter()
        .map(|c| (c.centroid - *previous).norm())
        .collect();
    let closest = |within: Option<f64>| {
        distances
            .iter()
            .enumerate()
            .filter(|&(_, &d)| within.is_none_or(|limit| d < limit))
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    };

    match closest(Some(max_jump)) {
        Some(i) => Some((i, Selection::WithinJump)),
        None => closest(None).map(|i| (i, Selection::NearestFallback)),
    }
}

/// Tracker state threaded through the slab sequence.
#[derive(Debug, Clone, Default)]
pub struct TrackState {
    pub centerline: Centerline,
    pub fallbacks: usize,
    pub skipped_slabs: usize,
}

impl TrackState {
    /// Last accepted point.
    pub fn previous(&self) -> Option<&Point3<f64>> {
        self.centerline.points.last().map(|p| &p.position)
    }

    /// Consumes one slab and returns the updated state.
    pub fn advance(mut self, slab: &SlabClusters, max_jump: f64) -> Self {
        match select_cluster(&slab.clusters, self.previous(), max_jump) {
            Some((i, selection)) => {
                let centroid = slab.clusters[i].centroid;
                if selection == Selection::NearestFallback {
                    debug!(
                        "Slab {}: no centroid within {} of the previous point, taking the nearest",
                        slab.slab.index, max_jump
                    );
                    self.fallbacks += 1;
                }
                self.centerline.points.push(CenterlinePoint {
                    slab_index: slab.slab.index,
                    position: centroid,
                });
            }
            None => self.skipped_slabs += 1,
        }
        self
    }
}

/// Folds the slab sequence into a raw, unsmoothed centerline.
pub fn track(slabs: &[SlabClusters], max_jump: f64) -> TrackState {
    slabs
        .iter()
        .fold(TrackState::default(), |state, slab| state.advance(slab, max_jump))
}

#[cfg(test)]
mod tracking_tests {
    use super::*;
    use crate::processing::slices::Slab;

    fn cluster(label: usize, size: usize, x: f64, y: f64, z: f64) -> SliceCluster {
        SliceCluster {
            label,
            size,
            centroid: Point3::new(x, y, z),
        }
    }

    fn slab(index: usize, clusters: Vec<SliceCluster>) -> SlabClusters {
        SlabClusters {
            slab: Slab {
                index,
                lo: index as f64,
                hi: index as f64 + 1.0,
            },
            point_count: clusters.iter().map(|c| c.size).sum(),
            clusters,
        }
    }

    #[test]
    fn test_first_slab_takes_the_largest_cluster() {
        let clusters = vec![cluster(0, 4, 0.0, 0.0, 0.0), cluster(1, 9, 5.0, 0.0, 0.0)];
        assert_eq!(
            select_cluster(&clusters, None, 10.0),
            Some((1, Selection::Largest))
        );
    }

    #[test]
    fn test_largest_cluster_tie_keeps_first_label() {
        let clusters = vec![cluster(0, 6, 0.0, 0.0, 0.0), cluster(1, 6, 5.0, 0.0, 0.0)];
        assert_eq!(select_cluster(&clusters, None, 10.0).map(|s| s.0), Some(0));
    }

    #[test]
    fn test_within_jump_prefers_the_closest_centroid() {
        let previous = Point3::new(0.0, 0.0, 0.0);
        let clusters = vec![
            cluster(0, 50, 8.0, 0.0, 1.0),
            cluster(1, 5, 1.0, 0.0, 1.0),
        ];
        assert_eq!(
            select_cluster(&clusters, Some(&previous), 10.0),
            Some((1, Selection::WithinJump))
        );
    }

    #[test]
    fn test_fallback_takes_the_nearest_centroid() {
        let previous = Point3::new(0.0, 0.0, 0.0);
        let clusters = vec![
            cluster(0, 50, 30.0, 0.0, 1.0),
            cluster(1, 5, 15.0, 0.0, 1.0),
        ];
        assert_eq!(
            select_cluster(&clusters, Some(&previous), 10.0),
            Some((1, Selection::NearestFallback))
        );
    }

    #[test]
    fn test_jump_limit_is_strict() {
        let previous = Point3::new(0.0, 0.0, 0.0);
        let clusters = vec![cluster(0, 5, 10.0, 0.0, 0.0)];
        assert_eq!(
            select_cluster(&clusters, Some(&previous), 10.0),
            Some((0, Selection::NearestFallback))
        );
    }

    #[test]
    fn test_no_clusters_yields_nothing() {
        assert_eq!(select_cluster(&[], None, 10.0), None);
    }

    #[test]
    fn test_tracking_follows_the_vessel_instead_of_a_larger_neighbour() {
        // A second, larger tube appears at x = 20 from slab 2 on.
        let slabs = vec![
            slab(0, vec![cluster(0, 10, 0.0, 0.0, 0.5)]),
            slab(1, vec![cluster(0, 10, 0.5, 0.0, 1.5)]),
            slab(
                2,
                vec![cluster(0, 40, 20.0, 0.0, 2.5), cluster(1, 10, 1.0, 0.0, 2.5)],
            ),
            slab(
                3,
                vec![cluster(0, 40, 20.0, 0.0, 3.5), cluster(1, 10, 1.5, 0.0, 3.5)],
            ),
        ];
        let state = track(&slabs, 10.0);
        let xs: Vec<f64> = state.centerline.points.iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(state.fallbacks, 0);
    }

    #[test]
    fn test_slabs_without_clusters_are_skipped() {
        let slabs = vec![
            slab(0, vec![cluster(0, 10, 0.0, 0.0, 0.5)]),
            slab(1, vec![]),
            slab(2, vec![cluster(0, 10, 25.0, 0.0, 2.5)]),
        ];
        let state = track(&slabs, 10.0);
        let indices: Vec<usize> = state.centerline.points.iter().map(|p| p.slab_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(state.skipped_slabs, 1);
        assert_eq!(state.fallbacks, 1);
    }

    #[test]
    fn test_empty_sequence_gives_empty_centerline() {
        let state = track(&[], 10.0);
        assert!(state.centerline.is_empty());
    }
}
