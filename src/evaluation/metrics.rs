use nalgebra::Point3;
use rayon::prelude::*;
use rstar::RTree;
use serde::Serialize;

use crate::config::validate_tolerances;
use crate::error::{CenterlineError, CenterlineResult};

/// Nearest-neighbour index over one curve, built once and queried many times.
pub struct NearestIndex {
    tree: RTree<[f64; 3]>,
}

impl NearestIndex {
    /// Fails on a non-finite coordinate, which the tree cannot place.
    pub fn build(curve: &[Point3<f64>]) -> CenterlineResult<Self> {
        require_finite(curve, "curve")?;
        let coords: Vec<[f64; 3]> = curve.iter().map(|p| [p.x, p.y, p.z]).collect();
        Ok(Self {
            tree: RTree::bulk_load(coords),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Distance from `query` to the closest indexed point, `None` for an empty index.
    pub fn nearest_distance(&self, query: &Point3<f64>) -> Option<f64> {
        self.tree
            .nearest_neighbor(&[query.x, query.y, query.z])
            .map(|n| {
                let dx = n[0] - query.x;
                let dy = n[1] - query.y;
                let dz = n[2] - query.z;
                (dx * dx + dy * dy + dz * dz).sqrt()
            })
    }

    /// Nearest distance for every query, in query order.
    pub fn nearest_distances(&self, queries: &[Point3<f64>]) -> Vec<f64> {
        queries
            .par_iter()
            .map(|q| self.nearest_distance(q).unwrap_or(f64::INFINITY))
            .collect()
    }
}

/// Nearest distances in both directions between a predicted and a ground-truth curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedDistances {
    pub pred_to_gt: Vec<f64>,
    pub gt_to_pred: Vec<f64>,
}

impl DirectedDistances {
    pub fn compute(pred: &[Point3<f64>], gt: &[Point3<f64>]) -> CenterlineResult<Self> {
        require_scorable(pred, gt)?;
        let gt_index = NearestIndex::build(gt)?;
        let pred_index = NearestIndex::build(pred)?;
        Ok(Self {
            pred_to_gt: gt_index.nearest_distances(pred),
            gt_to_pred: pred_index.nearest_distances(gt),
        })
    }

    fn pred_only(pred: &[Point3<f64>], gt: &[Point3<f64>]) -> CenterlineResult<Vec<f64>> {
        require_scorable(pred, gt)?;
        Ok(NearestIndex::build(gt)?.nearest_distances(pred))
    }

    pub fn mean_closest(&self) -> f64 {
        mean(&self.pred_to_gt)
    }

    pub fn hausdorff(&self) -> f64 {
        max(&self.pred_to_gt).max(max(&self.gt_to_pred))
    }

    pub fn hausdorff95(&self) -> f64 {
        percentile(&self.pred_to_gt, 95.0).max(percentile(&self.gt_to_pred, 95.0))
    }

    pub fn average_symmetric(&self) -> f64 {
        (mean(&self.pred_to_gt) + mean(&self.gt_to_pred)) / 2.0
    }

    pub fn accuracy_over_tolerance(&self, tolerances: &[f64]) -> CenterlineResult<AccuracyCurve> {
        accuracy_from_distances(&self.pred_to_gt, tolerances)
    }
}

/// Fraction of predicted points within each tolerance of the ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyCurve {
    pub tolerances: Vec<f64>,
    pub fractions: Vec<f64>,
}

/// Mean pred→gt nearest distance. Directional.
pub fn mean_closest_distance(pred: &[Point3<f64>], gt: &[Point3<f64>]) -> CenterlineResult<f64> {
    Ok(mean(&DirectedDistances::pred_only(pred, gt)?))
}

pub fn hausdorff_distance(pred: &[Point3<f64>], gt: &[Point3<f64>]) -> CenterlineResult<f64> {
    Ok(DirectedDistances::compute(pred, gt)?.hausdorff())
}

/// Symmetric max of the 95th-percentile nearest distance in each direction.
pub fn hausdorff95_distance(pred: &[Point3<f64>], gt: &[Point3<f64>]) -> CenterlineResult<f64> {
    Ok(DirectedDistances::compute(pred, gt)?.hausdorff95())
}

/// Mean of the two directed mean nearest distances, each weighted equally.
pub fn average_symmetric_distance(
    pred: &[Point3<f64>],
    gt: &[Point3<f64>],
) -> CenterlineResult<f64> {
    Ok(DirectedDistances::compute(pred, gt)?.average_symmetric())
}

pub fn accuracy_over_tolerance(
    pred: &[Point3<f64>],
    gt: &[Point3<f64>],
    tolerances: &[f64],
) -> CenterlineResult<AccuracyCurve> {
    let distances = DirectedDistances::pred_only(pred, gt)?;
    accuracy_from_distances(&distances, tolerances)
}

/// All scalar metrics of one predicted/ground-truth pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSet {
    pub mean_closest: f64,
    pub hausdorff: f64,
    pub hausdorff95: f64,
    pub avg_symmetric: f64,
    pub accuracy: AccuracyCurve,
}

impl ScoreSet {
    /// Builds each curve's index once and derives every metric from the same distances.
    pub fn compute(
        pred: &[Point3<f64>],
        gt: &[Point3<f64>],
        tolerances: &[f64],
    ) -> CenterlineResult<Self> {
        let distances = DirectedDistances::compute(pred, gt)?;
        Ok(Self {
            mean_closest: distances.mean_closest(),
            hausdorff: distances.hausdorff(),
            hausdorff95: distances.hausdorff95(),
            avg_symmetric: distances.average_symmetric(),
            accuracy: distances.accuracy_over_tolerance(tolerances)?,
        })
    }
}

fn accuracy_from_distances(distances: &[f64], tolerances: &[f64]) -> CenterlineResult<AccuracyCurve> {
    validate_tolerances(tolerances)?;
    let n = distances.len() as f64;
    let fractions = tolerances
        .iter()
        .map(|&tol| distances.iter().filter(|&&d| d <= tol).count() as f64 / n)
        .collect();
    Ok(AccuracyCurve {
        tolerances: tolerances.to_vec(),
        fractions,
    })
}

fn require_scorable(pred: &[Point3<f64>], gt: &[Point3<f64>]) -> CenterlineResult<()> {
    if pred.is_empty() {
        return Err(CenterlineError::EmptyCurve { which: "predicted" });
    }
    if gt.is_empty() {
        return Err(CenterlineError::EmptyCurve {
            which: "ground-truth",
        });
    }
    require_finite(pred, "predicted")?;
    require_finite(gt, "ground_truth")
}

pub(crate) fn require_finite(curve: &[Point3<f64>], name: &'static str) -> CenterlineResult<()> {
    match curve
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        Some(i) => Err(CenterlineError::invalid_argument(
            name,
            format!("point {} has a non-finite coordinate", i),
        )),
        None => Ok(()),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
