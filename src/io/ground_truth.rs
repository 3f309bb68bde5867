//! Ground-truth path loading.
//!
//! Annotated paths come as `.pth` files, one file per named segment. A file
//! holds a `<path>` element whose `path_points/path_point/pos` children carry
//! the `x`, `y` and `z` attributes of each sample. A model's full ground truth
//! is the concatenation of its segment files in file-name order; segments are
//! appended as-is, without reordering or alignment.

use nalgebra::Point3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CenterlineError, CenterlineResult};

/// Supplies ordered ground-truth paths.
pub trait GroundTruthSource {
    fn load_path(&self, source: &Path) -> CenterlineResult<Vec<Point3<f64>>>;

    fn concatenate(&self, paths: Vec<Vec<Point3<f64>>>) -> Vec<Point3<f64>> {
        concatenate(paths)
    }
}

/// Reader for `.pth` path files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PthSource;

impl GroundTruthSource for PthSource {
    fn load_path(&self, source: &Path) -> CenterlineResult<Vec<Point3<f64>>> {
        load_pth_path(source)
    }
}

/// Simple append, segment after segment.
pub fn concatenate(paths: Vec<Vec<Point3<f64>>>) -> Vec<Point3<f64>> {
    let total = paths.iter().map(Vec::len).sum();
    paths.into_iter().fold(Vec::with_capacity(total), |mut acc, p| {
        acc.extend(p);
        acc
    })
}

pub fn load_pth_path<P: AsRef<Path>>(path: P) -> CenterlineResult<Vec<Point3<f64>>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| CenterlineError::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_pth(&content, path)
}

/// Parses the `<path>` block of a path file. Anything outside the block is ignored.
pub fn parse_pth(content: &str, path: &Path) -> CenterlineResult<Vec<Point3<f64>>> {
    let start = content.find("<path");
    let end = content.rfind("</path>");
    let block = match (start, end) {
        (Some(s), Some(e)) if e > s => &content[s..e + "</path>".len()],
        _ => {
            return Err(CenterlineError::parse(
                path,
                "could not find a <path> block",
            ))
        }
    };

    let mut reader = Reader::from_str(block);
    reader.config_mut().trim_text(true);

    let mut points = Vec::new();
    let mut in_path_points = false;
    let mut in_path_point = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"path_points" => in_path_points = true,
                b"path_point" if in_path_points => in_path_point = true,
                b"pos" if in_path_point => points.push(read_pos(e, path)?),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"pos" && in_path_point {
                    points.push(read_pos(e, path)?);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"path_points" => in_path_points = false,
                b"path_point" => in_path_point = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CenterlineError::parse(
                    path,
                    format!("XML parse error: {}", e),
                ))
            }
            _ => {}
        }
    }

    debug!("{:?}: {} path points", path, points.len());
    Ok(points)
}

fn read_pos(e: &BytesStart<'_>, path: &Path) -> CenterlineResult<Point3<f64>> {
    let mut coords = [None; 3];
    for attr in e.attributes().flatten() {
        let slot = match attr.key.local_name().as_ref() {
            b"x" => 0,
            b"y" => 1,
            b"z" => 2,
            _ => continue,
        };
        let value = String::from_utf8_lossy(&attr.value);
        let parsed = value.trim().parse::<f64>().map_err(|err| {
            CenterlineError::parse(path, format!("bad pos coordinate {:?}: {}", value, err))
        })?;
        if !parsed.is_finite() {
            return Err(CenterlineError::parse(
                path,
                format!("non-finite pos coordinate {:?}", value),
            ));
        }
        coords[slot] = Some(parsed);
    }
    match coords {
        [Some(x), Some(y), Some(z)] => Ok(Point3::new(x, y, z)),
        _ => Err(CenterlineError::parse(
            path,
            "pos element is missing an x, y or z attribute",
        )),
    }
}

/// Loads and concatenates every `*.pth` segment in `dir`, in file-name order.
///
/// Segments that fail to parse are skipped with a warning. A missing
/// directory, or one without any loadable segment, is reported as
/// [`CenterlineError::MissingGroundTruth`].
pub fn load_all_segments<S: GroundTruthSource>(
    source: &S,
    dir: &Path,
    model: &str,
) -> CenterlineResult<Vec<Point3<f64>>> {
    let missing = || CenterlineError::MissingGroundTruth {
        model: model.to_string(),
        path: dir.to_path_buf(),
    };

    let entries = fs::read_dir(dir).map_err(|_| missing())?;
    let mut segment_files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pth"))
        })
        .collect();
    segment_files.sort();

    if segment_files.is_empty() {
        return Err(missing());
    }

    let mut segments = Vec::with_capacity(segment_files.len());
    for file in &segment_files {
        match source.load_path(file) {
            Ok(points) => segments.push(points),
            Err(e) => warn!("Failed to load segment {:?}: {}", file, e),
        }
    }
    if segments.is_empty() {
        return Err(missing());
    }

    let path = source.concatenate(segments);
    info!(
        "Ground truth for {}: {} points from {} segment file(s)",
        model,
        path.len(),
        segment_files.len()
    );
    Ok(path)
}

/// Ground truth of `model` under the `<root>/<model>/paths` layout.
pub fn load_model_ground_truth(root: &Path, model: &str) -> CenterlineResult<Vec<Point3<f64>>> {
    let dir = root.join(model).join("paths");
    load_all_segments(&PthSource, &dir, model)
}
