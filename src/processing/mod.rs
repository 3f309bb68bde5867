pub mod clustering;
pub mod containment;
pub mod endpoints;
pub mod slices;
pub mod smoothing;
pub mod tracking;

use tracing::{debug, info};

use crate::config::CenterlineParams;
use crate::error::{CenterlineError, CenterlineResult};
use crate::io::{Centerline, PointCloud};
use crate::processing::clustering::{GridDbscan, SpatialGrouping};
use crate::processing::containment::{filter_inside, ContainmentOracle};
use crate::processing::slices::cluster_slabs;
use crate::processing::smoothing::smooth_centerline;
use crate::processing::tracking::track;

/// Extracts the smoothed centerline of a tubular point cloud with the
/// default grid-backed DBSCAN.
///
/// The result is ordered by slab along `params.axis` and may be empty when
/// no slab yields a cluster.
pub fn extract_centerline(
    cloud: &PointCloud,
    params: &CenterlineParams,
) -> CenterlineResult<Centerline> {
    extract_centerline_with(cloud, params, &GridDbscan)
}

/// Same as [`extract_centerline`] with a caller-supplied grouping backend.
pub fn extract_centerline_with<G: SpatialGrouping>(
    cloud: &PointCloud,
    params: &CenterlineParams,
    grouping: &G,
) -> CenterlineResult<Centerline> {
    params.validate()?;
    if cloud.is_empty() {
        return Err(CenterlineError::InsufficientData {
            operation: "centerline extraction",
            required: 1,
            actual: 0,
        });
    }

    let slabs = cluster_slabs(cloud.points(), params, grouping);
    let state = track(&slabs, params.max_jump);
    debug!(
        "Tracked {} of {} slab(s): {} fallback(s), {} without clusters",
        state.centerline.len(),
        slabs.len(),
        state.fallbacks,
        state.skipped_slabs
    );

    let centerline = smooth_centerline(&state.centerline, params.sigma);
    info!(
        "Extracted centerline with {} points from {} input points",
        centerline.len(),
        cloud.len()
    );
    Ok(centerline)
}

/// Extracts the centerline and drops the points `oracle` places outside the
/// vessel.
pub fn extract_contained_centerline<G, O>(
    cloud: &PointCloud,
    params: &CenterlineParams,
    grouping: &G,
    oracle: &O,
) -> CenterlineResult<Centerline>
where
    G: SpatialGrouping,
    O: ContainmentOracle + ?Sized,
{
    let centerline = extract_centerline_with(cloud, params, grouping)?;
    Ok(filter_inside(centerline, oracle))
}
