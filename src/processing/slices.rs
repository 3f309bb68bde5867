use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::CenterlineParams;
use crate::processing::clustering::{cluster_count, SpatialGrouping};

/// Half-open interval `[lo, hi)` along the slicing axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slab {
    pub index: usize,
    pub lo: f64,
    pub hi: f64,
}

/// Clusters from one slab, as 3-D centroids of their member points.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceCluster {
    pub label: usize,
    pub size: usize,
    pub centroid: Point3<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlabClusters {
    pub slab: Slab,
    pub point_count: usize,
    pub clusters: Vec<SliceCluster>,
}

/// Slab lower bounds `min + i * dz` for every `i` with `min + i * dz < max`.
///
/// When `max - min` is an exact multiple of `dz` no slab starts at `max`, so
/// points lying exactly on `max` fall outside every slab.
pub fn slab_bounds(min: f64, max: f64, dz: f64) -> Vec<Slab> {
    let mut slabs = Vec::new();
    let mut index = 0;
    loop {
        let lo = min + index as f64 * dz;
        if lo >= max {
            break;
        }
        slabs.push(Slab {
            index,
            lo,
            hi: lo + dz,
        });
        index += 1;
    }
    slabs
}

/// Slices `points` along `params.axis` and clusters each slab's
/// cross-section. Slabs are processed in parallel and returned in axis
/// order; slabs without points are left out.
///
/// Within a slab, member points keep their input order so cluster labels do
/// not depend on how the cloud was sliced.
pub fn cluster_slabs<G: SpatialGrouping>(
    points: &[Point3<f64>],
    params: &CenterlineParams,
    grouping: &G,
) -> Vec<SlabClusters> {
    let axis = params.axis.index();
    let [u, v] = params.axis.cross_section();

    let finite: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].iter().all(|c| c.is_finite()))
        .collect();
    if finite.len() < points.len() {
        warn!(
            "Ignoring {} point(s) with non-finite coordinates",
            points.len() - finite.len()
        );
    }
    if finite.is_empty() {
        return Vec::new();
    }

    // Indices sorted along the axis, so each slab is a contiguous run.
    let mut order = finite;
    order.sort_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]));
    let coords: Vec<f64> = order.iter().map(|&i| points[i][axis]).collect();

    let min = coords[0];
    let max = coords[coords.len() - 1];
    let slabs = slab_bounds(min, max, params.dz);
    debug!(
        "Slicing {} points over [{}, {}] into {} slab(s)",
        coords.len(),
        min,
        max,
        slabs.len()
    );

    slabs
        .into_par_iter()
        .filter_map(|slab| {
            let start = coords.partition_point(|&c| c < slab.lo);
            let end = coords.partition_point(|&c| c < slab.hi);
            if start == end {
                return None;
            }
            let mut members: Vec<usize> = order[start..end].to_vec();
            members.sort_unstable();

            let section: Vec<[f64; 2]> = members
                .iter()
                .map(|&i| [points[i][u], points[i][v]])
                .collect();
            let labels = grouping.group(&section, params.eps, params.min_samples);

            let mut sums = vec![(Vector3::<f64>::zeros(), 0usize); cluster_count(&labels)];
            for (&i, label) in members.iter().zip(&labels) {
                if let Some(label) = *label {
                    sums[label].0 += points[i].coords;
                    sums[label].1 += 1;
                }
            }
            let clusters = sums
                .into_iter()
                .enumerate()
                .map(|(label, (sum, size))| SliceCluster {
                    label,
                    size,
                    centroid: Point3::from(sum / size as f64),
                })
                .collect();

            Some(SlabClusters {
                slab,
                point_count: members.len(),
                clusters,
            })
        })
        .collect()
}
