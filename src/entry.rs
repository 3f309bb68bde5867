use anyhow::{Context, Result};
use nalgebra::Point3;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{EndpointMode, PipelineConfig};
use crate::evaluation::metrics::ScoreSet;
use crate::evaluation::score_curves;
use crate::io::ground_truth::{load_all_segments, load_model_ground_truth, load_pth_path, PthSource};
use crate::io::input::{load_point_cloud, read_centerline_csv, PointFormat};
use crate::io::output::{write_centerline_csv, write_scores_csv, write_summary_json, ModelReport};
use crate::io::{Centerline, PointCloud};
use crate::processing::endpoints::{
    crop_between_endpoints, EndpointPicker, FarthestPairPicker, FixedEndpoints,
};
use crate::processing::extract_centerline;

pub const SCORES_FILE: &str = "scores.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Applies the configured endpoint mode, then extracts the centerline.
pub fn extract_from_cloud(cloud: &PointCloud, config: &PipelineConfig) -> Result<Centerline> {
    let picked = match config.endpoints {
        EndpointMode::None => None,
        EndpointMode::Auto => Some(FarthestPairPicker.pick_two_points(cloud)?),
        EndpointMode::Fixed { start, end } => {
            Some(FixedEndpoints { start, end }.pick_two_points(cloud)?)
        }
    };

    let centerline = match picked {
        Some(endpoints) => {
            let cropped = crop_between_endpoints(cloud, endpoints, config.centerline.axis)?;
            extract_centerline(&cropped, &config.centerline)
        }
        None => extract_centerline(cloud, &config.centerline),
    }
    .context("centerline extraction failed")?;

    Ok(centerline)
}

pub fn extract_from_file(path: &Path, config: &PipelineConfig) -> Result<Centerline> {
    let cloud = load_point_cloud(path)
        .with_context(|| format!("Failed to load point cloud from {:?}", path))?;
    extract_from_cloud(&cloud, config)
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extracts, writes and scores one model.
///
/// Extraction and ground-truth loading run side by side on the rayon pool.
/// A missing ground truth or a failed scoring yields a report without scores;
/// only an extraction or write failure is returned as an error.
pub fn run_model(
    mesh_path: &Path,
    gt_root: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<ModelReport> {
    let model = model_name(mesh_path);

    // Extraction fans out over slabs, so both halves stay on the rayon pool.
    let (centerline, ground_truth) = rayon::join(
        || extract_from_file(mesh_path, config),
        || load_model_ground_truth(gt_root, &model),
    );
    let centerline = centerline?;

    let predicted = centerline.positions();
    let centerline_path = output_dir.join(format!("{}_centerline.csv", model));
    write_centerline_csv(&centerline_path, &predicted)
        .with_context(|| format!("Failed to write centerline for {}", model))?;

    let mut report = ModelReport {
        model: model.clone(),
        centerline_points: predicted.len(),
        scores: None,
        error: None,
    };

    let ground_truth = match ground_truth {
        Ok(points) => points,
        Err(e) => {
            warn!("{}: {}", model, e);
            report.error = Some(e.to_string());
            return Ok(report);
        }
    };
    let gt_path = output_dir.join(format!("{}_centerline_gt.csv", model));
    write_centerline_csv(&gt_path, &ground_truth)
        .with_context(|| format!("Failed to write ground truth for {}", model))?;

    match score_curves(&predicted, &ground_truth, &config.evaluation) {
        Ok(scores) => {
            info!(
                "{}: mean closest {:.3}, HD {:.3}, HD95 {:.3}, ASD {:.3}",
                model, scores.mean_closest, scores.hausdorff, scores.hausdorff95, scores.avg_symmetric
            );
            report.scores = Some(scores);
        }
        Err(e) => {
            warn!("{}: scoring failed: {}", model, e);
            report.error = Some(e.to_string());
        }
    }
    Ok(report)
}

/// Mesh files of `input_dir`, sorted, skipping centerlines written by earlier runs.
pub fn find_models(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read model directory {:?}", input_dir))?;
    let mut models: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && PointFormat::from_path(p).is_some())
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            !name.ends_with("_centerline.csv") && !name.ends_with("_centerline_gt.csv")
        })
        .collect();
    models.sort();
    Ok(models)
}

/// Runs every model of `input_dir` in parallel and writes the score CSV and
/// JSON summary to `output_dir`. A failing model is recorded with empty
/// scores and never aborts the batch.
pub fn run_batch(
    input_dir: &Path,
    gt_root: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<Vec<ModelReport>> {
    config.validate().context("invalid pipeline configuration")?;
    let models = find_models(input_dir)?;
    info!("Found {} model(s) in {:?}", models.len(), input_dir);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let mut reports: Vec<ModelReport> = models
        .par_iter()
        .map(|path| {
            run_model(path, gt_root, output_dir, config).unwrap_or_else(|e| {
                warn!("{:?} failed: {:#}", path, e);
                ModelReport::failed(model_name(path), format!("{:#}", e))
            })
        })
        .collect();
    reports.sort_by(|a, b| a.model.cmp(&b.model));

    write_scores_csv(output_dir.join(SCORES_FILE), &reports)?;
    write_summary_json(output_dir.join(SUMMARY_FILE), &reports)?;

    let scored = reports.iter().filter(|r| r.scores.is_some()).count();
    info!("Batch done: {} of {} model(s) scored", scored, reports.len());
    Ok(reports)
}

/// Scores a centerline CSV against a `.pth` file or a directory of them.
pub fn score_files(
    predicted_csv: &Path,
    ground_truth: &Path,
    config: &PipelineConfig,
) -> Result<ScoreSet> {
    let predicted: Vec<Point3<f64>> = read_centerline_csv(predicted_csv)
        .with_context(|| format!("Failed to read centerline {:?}", predicted_csv))?;
    let gt = if ground_truth.is_dir() {
        load_all_segments(&PthSource, ground_truth, &model_name(predicted_csv))?
    } else {
        load_pth_path(ground_truth)?
    };
    let scores = score_curves(&predicted, &gt, &config.evaluation)?;
    Ok(scores)
}
