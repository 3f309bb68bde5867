pub mod ground_truth;
pub mod input;
pub mod output;

use nalgebra::Point3;

use crate::config::SliceAxis;

/// Axis-aligned bounds of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    /// `(xmin, xmax, ymin, ymax, zmin, zmax)`
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
        ]
    }

    pub fn range(&self, axis: SliceAxis) -> (f64, f64) {
        let i = axis.index();
        (self.min[i], self.max[i])
    }
}

/// Supplies the vertices of a surface mesh.
pub trait MeshPointSource {
    fn get_points(&self) -> &[Point3<f64>];

    fn get_bounds(&self) -> Option<[f64; 6]> {
        bounds_of(self.get_points()).map(|b| b.as_array())
    }
}

/// Unordered 3-D sample of a surface, index-addressable and immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn from_tuples(points: &[(f64, f64, f64)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(x, y, z)| Point3::new(x, y, z))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        bounds_of(&self.points)
    }

    /// Keeps the points whose coordinate along `axis` lies in `[lo, hi]`,
    /// preserving order.
    pub fn crop_axis(&self, axis: SliceAxis, lo: f64, hi: f64) -> PointCloud {
        let i = axis.index();
        PointCloud::new(
            self.points
                .iter()
                .filter(|p| p[i] >= lo && p[i] <= hi)
                .copied()
                .collect(),
        )
    }
}

impl MeshPointSource for PointCloud {
    fn get_points(&self) -> &[Point3<f64>] {
        &self.points
    }
}

fn bounds_of(points: &[Point3<f64>]) -> Option<Bounds> {
    let first = points.first()?;
    let (min, max) = points.iter().skip(1).fold((*first, *first), |(mut lo, mut hi), p| {
        for i in 0..3 {
            lo[i] = lo[i].min(p[i]);
            hi[i] = hi[i].max(p[i]);
        }
        (lo, hi)
    });
    Some(Bounds { min, max })
}

/// One accepted slab of the extracted centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterlinePoint {
    /// Index of the slab the point was taken from, in traversal order.
    pub slab_index: usize,
    pub position: Point3<f64>,
}

/// Ordered medial path, one point per accepted slab. May be empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Centerline {
    pub points: Vec<CenterlinePoint>,
}

impl Centerline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].position - w[0].position).norm())
            .sum()
    }
}
