use csv::ReaderBuilder;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CenterlineError, CenterlineResult};
use crate::io::PointCloud;

/// Point-cloud file formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFormat {
    Obj,
    Stl,
    Csv,
}

impl PointFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "obj" => Some(PointFormat::Obj),
                "stl" => Some(PointFormat::Stl),
                "csv" | "txt" => Some(PointFormat::Csv),
                _ => None,
            })
    }
}

/// Loads the vertices of a mesh file, picking the reader from the extension.
pub fn load_point_cloud<P: AsRef<Path>>(path: P) -> CenterlineResult<PointCloud> {
    let path = path.as_ref();
    let format = PointFormat::from_path(path).ok_or_else(|| CenterlineError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })?;

    let points = match format {
        PointFormat::Obj => read_obj_points(path)?,
        PointFormat::Stl => read_stl_points(path)?,
        PointFormat::Csv => read_csv_points(path)?,
    };
    info!("Loaded {} points from {:?} ({:?})", points.len(), path, format);
    Ok(PointCloud::new(points))
}

/// Reads `v x y z` vertex lines; faces, normals and texture coordinates are ignored.
pub fn read_obj_points<P: AsRef<Path>>(path: P) -> CenterlineResult<Vec<Point3<f64>>> {
    let path = path.as_ref();
    let file = open(path)?;
    let reader = BufReader::new(file);

    let mut points = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CenterlineError::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("v") {
            continue;
        }
        let coords: Vec<f64> = tokens
            .take(3)
            .map(|t| t.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| {
                CenterlineError::parse(path, format!("line {}: {}", line_no + 1, e))
            })?;
        if coords.len() != 3 {
            return Err(CenterlineError::parse(
                path,
                format!("line {}: vertex needs three coordinates", line_no + 1),
            ));
        }
        points.push(Point3::new(coords[0], coords[1], coords[2]));
    }
    debug!("OBJ {:?}: {} vertices", path, points.len());
    Ok(points)
}

/// Reads the indexed (deduplicated) vertices of a binary or ASCII STL file.
pub fn read_stl_points<P: AsRef<Path>>(path: P) -> CenterlineResult<Vec<Point3<f64>>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(open(path)?);
    let stl = stl_io::read_stl(&mut reader)
        .map_err(|e| CenterlineError::parse(path, e.to_string()))?;

    debug!(
        "STL {:?}: {} vertices, {} triangles",
        path,
        stl.vertices.len(),
        stl.faces.len()
    );

    Ok(stl
        .vertices
        .iter()
        .map(|v| Point3::new(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64))
        .collect())
}

/// Reads `x,y,z` rows. A first row that does not parse as numbers is treated
/// as a header; any later malformed row is an error.
pub fn read_csv_points<P: AsRef<Path>>(path: P) -> CenterlineResult<Vec<Point3<f64>>> {
    let path = path.as_ref();
    let delim = detect_delimiter(path)?;
    let file = open(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delim)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut points = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CenterlineError::parse(path, e.to_string()))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        match parse_xyz(&record) {
            Some(p) => points.push(p),
            None if row == 0 => debug!("Skipping header row in {:?}", path),
            None => {
                return Err(CenterlineError::parse(
                    path,
                    format!("row {}: expected three numeric columns", row + 1),
                ))
            }
        }
    }
    Ok(points)
}

/// Reads a centerline written by [`crate::io::output::write_centerline_csv`].
///
/// A non-finite coordinate is a parse error; mesh clouds drop such points
/// at slicing instead.
pub fn read_centerline_csv<P: AsRef<Path>>(path: P) -> CenterlineResult<Vec<Point3<f64>>> {
    let path = path.as_ref();
    let points = read_csv_points(path)?;
    if let Some(row) = points
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(CenterlineError::parse(
            path,
            format!("point {}: non-finite coordinate", row + 1),
        ));
    }
    Ok(points)
}

fn parse_xyz(record: &csv::StringRecord) -> Option<Point3<f64>> {
    if record.len() < 3 {
        return None;
    }
    let x = record.get(0)?.parse::<f64>().ok()?;
    let y = record.get(1)?.parse::<f64>().ok()?;
    let z = record.get(2)?.parse::<f64>().ok()?;
    Some(Point3::new(x, y, z))
}

/// Utility: detect whether the file uses comma or tab as delimiter.
fn detect_delimiter(path: &Path) -> CenterlineResult<u8> {
    let mut reader = BufReader::new(open(path)?);
    let mut first_line = String::new();
    reader
        .read_line(&mut first_line)
        .map_err(|e| CenterlineError::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();
    Ok(if tabs > commas { b'\t' } else { b',' })
}

fn open(path: &Path) -> CenterlineResult<File> {
    File::open(path).map_err(|e| CenterlineError::IoRead {
        path: path.to_path_buf(),
        source: e,
    })
}
