pub mod classes;

use classes::{to_points, to_tuples, PyCenterline, PyScoreSet};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::Path;

use crate::config::{CenterlineParams, EvaluationParams, PipelineConfig, SliceAxis};
use crate::error::CenterlineError;
use crate::entry;
use crate::evaluation;
use crate::io::PointCloud;
use crate::processing;
use crate::processing::endpoints;

fn to_py_err(e: CenterlineError) -> PyErr {
    match e {
        CenterlineError::InvalidArgument { .. }
        | CenterlineError::InsufficientData { .. }
        | CenterlineError::EmptyCurve { .. } => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

/// Extracts the centerline of a tubular point cloud.
///
/// The cloud is cut into slabs of thickness ``dz`` along ``axis``; each
/// slab's cross-section is clustered with DBSCAN (``eps``,
/// ``min_samples``), one centroid per slab is tracked for continuity
/// (``max_jump``) and the result is Gaussian-smoothed with ``sigma``.
///
/// Arguments:
///
/// - ``points`` – List of ``(x, y, z)`` tuples
/// - ``axis`` (default: 2) – Slicing axis index (0, 1 or 2)
/// - ``dz`` (default: 1.0) – Slab thickness
/// - ``eps`` (default: 0.5) – DBSCAN neighborhood radius
/// - ``min_samples`` (default: 5) – DBSCAN core-point threshold
/// - ``max_jump`` (default: 10.0) – Preferred maximum step between slabs
/// - ``sigma`` (default: 1.0) – Gaussian smoothing width, 0 disables smoothing
///
/// Returns:
///
/// A ``PyCenterline``, possibly empty.
///
/// Example:
///
/// .. code-block:: python
///
///    import aortaline as al
///    cl = al.extract_centerline(points, dz=0.5)
#[pyfunction]
#[pyo3(
    signature = (
        points,
        axis = 2usize,
        dz = 1.0f64,
        eps = 0.5f64,
        min_samples = 5usize,
        max_jump = 10.0f64,
        sigma = 1.0f64,
    )
)]
#[allow(clippy::too_many_arguments)]
pub fn extract_centerline(
    points: Vec<(f64, f64, f64)>,
    axis: usize,
    dz: f64,
    eps: f64,
    min_samples: usize,
    max_jump: f64,
    sigma: f64,
) -> PyResult<PyCenterline> {
    let params = CenterlineParams {
        axis: SliceAxis::try_from(axis).map_err(to_py_err)?,
        dz,
        eps,
        min_samples,
        max_jump,
        sigma,
    };
    let cloud = PointCloud::from_tuples(&points);
    let centerline = processing::extract_centerline(&cloud, &params).map_err(to_py_err)?;
    Ok(PyCenterline::from(&centerline))
}

/// Extracts the centerline of a mesh file (``.obj``, ``.stl`` or ``.csv``).
///
/// ``config`` optionally points to a TOML pipeline configuration.
#[pyfunction]
#[pyo3(signature = (path, config = None))]
pub fn extract_centerline_from_file(path: &str, config: Option<&str>) -> PyResult<PyCenterline> {
    let config = match config {
        Some(c) => PipelineConfig::from_toml_file(c).map_err(to_py_err)?,
        None => PipelineConfig::default(),
    };
    let centerline = entry::extract_from_file(Path::new(path), &config)
        .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))?;
    Ok(PyCenterline::from(&centerline))
}

/// Resamples a polyline to ``num_points`` points evenly spaced in arc length.
///
/// Curves with fewer than two points are returned unchanged.
#[pyfunction]
#[pyo3(signature = (points, num_points = 100usize))]
pub fn resample(points: Vec<(f64, f64, f64)>, num_points: usize) -> PyResult<Vec<(f64, f64, f64)>> {
    let curve = evaluation::resample::resample(&to_points(&points), num_points).map_err(to_py_err)?;
    Ok(to_tuples(curve.points()))
}

/// Indices ``(i, j)`` of the farthest-apart pair of points.
#[pyfunction]
pub fn select_endpoints(points: Vec<(f64, f64, f64)>) -> PyResult<(usize, usize)> {
    endpoints::select_endpoints(&to_points(&points)).map_err(to_py_err)
}

/// Resamples both curves and computes the accuracy metrics.
///
/// Arguments:
///
/// - ``predicted`` – Predicted centerline as ``(x, y, z)`` tuples
/// - ``ground_truth`` – Reference path as ``(x, y, z)`` tuples
/// - ``num_points`` (default: 100) – Resampling resolution for both curves
/// - ``tolerances`` (default: [0.5, 1, 2, 3, 5, 10]) – Accuracy-curve tolerances
///
/// Returns:
///
/// A ``PyScoreSet``.
#[pyfunction]
#[pyo3(signature = (predicted, ground_truth, num_points = 100usize, tolerances = None))]
pub fn score_curves(
    predicted: Vec<(f64, f64, f64)>,
    ground_truth: Vec<(f64, f64, f64)>,
    num_points: usize,
    tolerances: Option<Vec<f64>>,
) -> PyResult<PyScoreSet> {
    let mut params = EvaluationParams {
        num_points,
        ..EvaluationParams::default()
    };
    if let Some(t) = tolerances {
        params.tolerances = t;
    }
    let scores = evaluation::score_curves(&to_points(&predicted), &to_points(&ground_truth), &params)
        .map_err(to_py_err)?;
    Ok(scores.into())
}

/// Runs the whole pipeline over a directory of meshes and writes
/// centerlines, ``scores.csv`` and ``summary.json`` to ``output_dir``.
///
/// Returns the number of models that could be scored.
#[pyfunction]
#[pyo3(signature = (input_dir, gt_dir, output_dir, config = None))]
pub fn run_batch(
    input_dir: &str,
    gt_dir: &str,
    output_dir: &str,
    config: Option<&str>,
) -> PyResult<usize> {
    let config = match config {
        Some(c) => PipelineConfig::from_toml_file(c).map_err(to_py_err)?,
        None => PipelineConfig::default(),
    };
    let reports = entry::run_batch(
        Path::new(input_dir),
        Path::new(gt_dir),
        Path::new(output_dir),
        &config,
    )
    .map_err(|e| PyRuntimeError::new_err(format!("{:#}", e)))?;
    Ok(reports.iter().filter(|r| r.scores.is_some()).count())
}
