use nalgebra::Point3;
use tracing::debug;

use crate::error::{CenterlineError, CenterlineResult};
use crate::io::{Bounds, Centerline};

/// Answers whether a point lies inside the vessel surface.
pub trait ContainmentOracle {
    fn is_inside(&self, point: &Point3<f64>) -> bool;
}

impl<F> ContainmentOracle for F
where
    F: Fn(&Point3<f64>) -> bool,
{
    fn is_inside(&self, point: &Point3<f64>) -> bool {
        self(point)
    }
}

/// Axis-aligned box test. Coarse, but needs no surface topology.
impl ContainmentOracle for Bounds {
    fn is_inside(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

/// Drops the points the oracle places outside, keeping order.
pub fn filter_inside<O: ContainmentOracle + ?Sized>(
    centerline: Centerline,
    oracle: &O,
) -> Centerline {
    let before = centerline.len();
    let points: Vec<_> = centerline
        .points
        .into_iter()
        .filter(|p| oracle.is_inside(&p.position))
        .collect();
    if points.len() < before {
        debug!("Containment filter removed {} point(s)", before - points.len());
    }
    Centerline { points }
}

/// Applies a precomputed inside/outside mask, one flag per centerline point.
pub fn filter_with_mask(centerline: Centerline, mask: &[bool]) -> CenterlineResult<Centerline> {
    if mask.len() != centerline.len() {
        return Err(CenterlineError::invalid_argument(
            "mask",
            format!(
                "has {} entries for {} centerline points",
                mask.len(),
                centerline.len()
            ),
        ));
    }
    let points = centerline
        .points
        .into_iter()
        .zip(mask)
        .filter_map(|(p, &inside)| inside.then_some(p))
        .collect();
    Ok(Centerline { points })
}
