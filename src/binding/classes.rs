use crate::evaluation::metrics::ScoreSet;
use crate::io::{Centerline, CenterlinePoint};
use nalgebra::Point3;
use pyo3::prelude::*;

/// Python representation of one centerline point
///
/// Attributes:
///     slab_index (int): Index of the slab the point was taken from
///     x (float): X-coordinate in mm
///     y (float): Y-coordinate in mm
///     z (float): Z-coordinate in mm
///
/// Example:
///     >>> point = PyCenterlinePoint(slab_index=3, x=1.0, y=2.0, z=3.5)
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyCenterlinePoint {
    #[pyo3(get, set)]
    pub slab_index: usize,
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl PyCenterlinePoint {
    #[new]
    fn new(slab_index: usize, x: f64, y: f64, z: f64) -> Self {
        Self { slab_index, x, y, z }
    }

    fn __repr__(&self) -> String {
        format!(
            "CenterlinePoint(slab={}, x={:.2}, y={:.2}, z={:.2})",
            self.slab_index, self.x, self.y, self.z
        )
    }

    /// Coordinates as an ``(x, y, z)`` tuple.
    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<&CenterlinePoint> for PyCenterlinePoint {
    fn from(p: &CenterlinePoint) -> Self {
        Self {
            slab_index: p.slab_index,
            x: p.position.x,
            y: p.position.y,
            z: p.position.z,
        }
    }
}

/// Python representation of an extracted centerline
///
/// Attributes:
///     points (List[PyCenterlinePoint]): Points ordered along the slicing axis
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyCenterline {
    #[pyo3(get, set)]
    pub points: Vec<PyCenterlinePoint>,
}

#[pymethods]
impl PyCenterline {
    fn __repr__(&self) -> String {
        format!("Centerline({} points)", self.points.len())
    }

    fn __len__(&self) -> usize {
        self.points.len()
    }

    /// Coordinates as a list of ``(x, y, z)`` tuples.
    fn to_tuples(&self) -> Vec<(f64, f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y, p.z)).collect()
    }
}

impl From<&Centerline> for PyCenterline {
    fn from(c: &Centerline) -> Self {
        Self {
            points: c.points.iter().map(PyCenterlinePoint::from).collect(),
        }
    }
}

/// Accuracy scores of a predicted centerline against a ground-truth path
///
/// Attributes:
///     mean_closest (float): Mean predicted-to-ground-truth closest distance
///     hausdorff (float): Symmetric Hausdorff distance
///     hausdorff95 (float): Symmetric 95th-percentile Hausdorff distance
///     avg_symmetric (float): Average symmetric surface distance
///     tolerances (List[float]): Tolerances of the accuracy curve
///     accuracy (List[float]): Fraction of predicted points within each tolerance
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyScoreSet {
    #[pyo3(get)]
    pub mean_closest: f64,
    #[pyo3(get)]
    pub hausdorff: f64,
    #[pyo3(get)]
    pub hausdorff95: f64,
    #[pyo3(get)]
    pub avg_symmetric: f64,
    #[pyo3(get)]
    pub tolerances: Vec<f64>,
    #[pyo3(get)]
    pub accuracy: Vec<f64>,
}

#[pymethods]
impl PyScoreSet {
    fn __repr__(&self) -> String {
        format!(
            "ScoreSet(mean_closest={:.3}, hausdorff={:.3}, hausdorff95={:.3}, avg_symmetric={:.3})",
            self.mean_closest, self.hausdorff, self.hausdorff95, self.avg_symmetric
        )
    }
}

impl From<ScoreSet> for PyScoreSet {
    fn from(s: ScoreSet) -> Self {
        Self {
            mean_closest: s.mean_closest,
            hausdorff: s.hausdorff,
            hausdorff95: s.hausdorff95,
            avg_symmetric: s.avg_symmetric,
            tolerances: s.accuracy.tolerances,
            accuracy: s.accuracy.fractions,
        }
    }
}

pub fn to_points(points: &[(f64, f64, f64)]) -> Vec<Point3<f64>> {
    points.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect()
}

pub fn to_tuples(points: &[Point3<f64>]) -> Vec<(f64, f64, f64)> {
    points.iter().map(|p| (p.x, p.y, p.z)).collect()
}
