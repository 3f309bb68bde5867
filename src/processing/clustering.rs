//! Density-based grouping of slab cross-sections.
//!
//! Both groupers implement the same DBSCAN semantics: the neighborhood of a
//! point holds every point (itself included) within Euclidean distance
//! `<= eps`, and a point is core when its neighborhood has at least
//! `min_samples` members. Clusters are labelled `0, 1, ...` in the order
//! their first core point appears in the input, and a border point reachable
//! from several clusters joins the first one that expands to it.

use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashMap;

/// Cluster id per input point. `None` marks noise.
pub type Labels = Vec<Option<usize>>;

/// Groups 2-D points by density.
pub trait SpatialGrouping: Sync {
    fn group(&self, points: &[[f64; 2]], eps: f64, min_samples: usize) -> Labels;
}

/// DBSCAN over a uniform hash grid with cell size `eps`.
///
/// Default grouper; neighborhood queries only visit the 3x3 block of cells
/// around a point.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridDbscan;

impl SpatialGrouping for GridDbscan {
    fn group(&self, points: &[[f64; 2]], eps: f64, min_samples: usize) -> Labels {
        if points.is_empty() {
            return Vec::new();
        }
        let cell_of = |p: &[f64; 2]| ((p[0] / eps).floor() as i64, (p[1] / eps).floor() as i64);

        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            grid.entry(cell_of(p)).or_default().push(i);
        }

        let eps_sq = eps * eps;
        let neighborhoods: Vec<Vec<usize>> = points
            .iter()
            .map(|p| {
                let (cx, cy) = cell_of(p);
                let mut found = Vec::new();
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        if let Some(members) = grid.get(&(cx + dx, cy + dy)) {
                            found.extend(
                                members
                                    .iter()
                                    .copied()
                                    .filter(|&j| squared_distance(p, &points[j]) <= eps_sq),
                            );
                        }
                    }
                }
                found.sort_unstable();
                found
            })
            .collect();

        expand_clusters(&neighborhoods, min_samples)
    }
}

/// DBSCAN with neighborhoods answered by an R*-tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct RTreeDbscan;

impl SpatialGrouping for RTreeDbscan {
    fn group(&self, points: &[[f64; 2]], eps: f64, min_samples: usize) -> Labels {
        if points.is_empty() {
            return Vec::new();
        }
        let tree = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| GeomWithData::new(*p, i))
                .collect(),
        );

        let eps_sq = eps * eps;
        let neighborhoods: Vec<Vec<usize>> = points
            .iter()
            .map(|p| {
                let mut found: Vec<usize> = tree
                    .locate_within_distance(*p, eps_sq)
                    .map(|entry| entry.data)
                    .collect();
                found.sort_unstable();
                found
            })
            .collect();

        expand_clusters(&neighborhoods, min_samples)
    }
}

/// Labels points from precomputed, index-sorted neighborhoods.
fn expand_clusters(neighborhoods: &[Vec<usize>], min_samples: usize) -> Labels {
    let n = neighborhoods.len();
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|nb| nb.len() >= min_samples)
        .collect();

    let mut labels: Labels = vec![None; n];
    let mut next_label = 0;
    let mut stack = Vec::new();

    for seed in 0..n {
        if labels[seed].is_some() || !is_core[seed] {
            continue;
        }
        stack.push(seed);
        while let Some(i) = stack.pop() {
            if labels[i].is_some() {
                continue;
            }
            labels[i] = Some(next_label);
            if is_core[i] {
                stack.extend(neighborhoods[i].iter().copied().filter(|&j| labels[j].is_none()));
            }
        }
        next_label += 1;
    }
    labels
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Number of distinct clusters in `labels`.
pub fn cluster_count(labels: &[Option<usize>]) -> usize {
    labels.iter().flatten().max().map_or(0, |&max| max + 1)
}
