use csv::Writer;
use nalgebra::Point3;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{CenterlineError, CenterlineResult};
use crate::evaluation::metrics::ScoreSet;

/// Outcome of processing one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: String,
    pub centerline_points: usize,
    /// `None` when the model could not be scored.
    pub scores: Option<ScoreSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelReport {
    pub fn failed(model: impl Into<String>, error: impl ToString) -> Self {
        Self {
            model: model.into(),
            centerline_points: 0,
            scores: None,
            error: Some(error.to_string()),
        }
    }
}

/// Means of the scalar metrics over the scored models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageScores {
    pub models: usize,
    pub mean_closest: f64,
    pub hausdorff: f64,
    pub hausdorff95: f64,
    pub avg_symmetric: f64,
}

impl AverageScores {
    /// `None` when no model was scored.
    pub fn from_reports(reports: &[ModelReport]) -> Option<Self> {
        let scored: Vec<&ScoreSet> = reports.iter().filter_map(|r| r.scores.as_ref()).collect();
        if scored.is_empty() {
            return None;
        }
        let n = scored.len() as f64;
        let avg = |f: fn(&ScoreSet) -> f64| scored.iter().map(|s| f(s)).sum::<f64>() / n;
        Some(Self {
            models: scored.len(),
            mean_closest: avg(|s| s.mean_closest),
            hausdorff: avg(|s| s.hausdorff),
            hausdorff95: avg(|s| s.hausdorff95),
            avg_symmetric: avg(|s| s.avg_symmetric),
        })
    }
}

#[derive(Serialize)]
struct BatchSummary<'a> {
    models: &'a [ModelReport],
    scored: usize,
    failed: usize,
    average: Option<AverageScores>,
}

fn create(path: &Path) -> CenterlineResult<File> {
    let write_err = |e| CenterlineError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    File::create(path).map_err(write_err)
}

fn csv_err(path: &Path, e: csv::Error) -> CenterlineError {
    CenterlineError::IoWrite {
        path: path.to_path_buf(),
        source: e.into(),
    }
}

/// Writes an `x,y,z` CSV with a header row.
pub fn write_centerline_csv<P: AsRef<Path>>(path: P, points: &[Point3<f64>]) -> CenterlineResult<()> {
    let path = path.as_ref();
    let mut wtr = Writer::from_writer(BufWriter::new(create(path)?));
    wtr.write_record(["x", "y", "z"]).map_err(|e| csv_err(path, e))?;
    for p in points {
        wtr.write_record([p.x.to_string(), p.y.to_string(), p.z.to_string()])
            .map_err(|e| csv_err(path, e))?;
    }
    wtr.flush().map_err(|e| CenterlineError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Wrote {} centerline points to {:?}", points.len(), path);
    Ok(())
}

/// One row per model, in the given order, followed by an `AVERAGE` row over
/// the scored models. Models without scores get empty metric cells.
pub fn write_scores_csv<P: AsRef<Path>>(path: P, reports: &[ModelReport]) -> CenterlineResult<()> {
    let path = path.as_ref();
    let mut wtr = Writer::from_writer(BufWriter::new(create(path)?));
    wtr.write_record([
        "filename",
        "mean_closest",
        "hausdorff",
        "hausdorff95",
        "avg_symmetric",
    ])
    .map_err(|e| csv_err(path, e))?;

    for report in reports {
        let cells = match &report.scores {
            Some(s) => [
                s.mean_closest.to_string(),
                s.hausdorff.to_string(),
                s.hausdorff95.to_string(),
                s.avg_symmetric.to_string(),
            ],
            None => Default::default(),
        };
        let mut row = vec![report.model.clone()];
        row.extend(cells);
        wtr.write_record(&row).map_err(|e| csv_err(path, e))?;
    }

    if let Some(avg) = AverageScores::from_reports(reports) {
        wtr.write_record([
            "AVERAGE".to_string(),
            avg.mean_closest.to_string(),
            avg.hausdorff.to_string(),
            avg.hausdorff95.to_string(),
            avg.avg_symmetric.to_string(),
        ])
        .map_err(|e| csv_err(path, e))?;
    }

    wtr.flush().map_err(|e| CenterlineError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Wrote scores for {} model(s) to {:?}", reports.len(), path);
    Ok(())
}

/// Pretty-printed JSON with per-model reports, accuracy curves and averages.
pub fn write_summary_json<P: AsRef<Path>>(path: P, reports: &[ModelReport]) -> CenterlineResult<()> {
    let path = path.as_ref();
    let scored = reports.iter().filter(|r| r.scores.is_some()).count();
    let summary = BatchSummary {
        models: reports,
        scored,
        failed: reports.len() - scored,
        average: AverageScores::from_reports(reports),
    };
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, &summary).map_err(|e| CenterlineError::IoWrite {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    writer.flush().map_err(|e| CenterlineError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
