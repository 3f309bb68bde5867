use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{CenterlineError, CenterlineResult};

/// Coordinate axis the point cloud is sliced along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceAxis {
    X,
    Y,
    #[default]
    Z,
}

impl SliceAxis {
    pub fn index(self) -> usize {
        match self {
            SliceAxis::X => 0,
            SliceAxis::Y => 1,
            SliceAxis::Z => 2,
        }
    }

    /// The two coordinates that remain after removing the slicing axis,
    /// in ascending order.
    pub fn cross_section(self) -> [usize; 2] {
        match self {
            SliceAxis::X => [1, 2],
            SliceAxis::Y => [0, 2],
            SliceAxis::Z => [0, 1],
        }
    }
}

impl TryFrom<usize> for SliceAxis {
    type Error = CenterlineError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SliceAxis::X),
            1 => Ok(SliceAxis::Y),
            2 => Ok(SliceAxis::Z),
            other => Err(CenterlineError::invalid_argument(
                "axis",
                format!("must be 0, 1 or 2, got {}", other),
            )),
        }
    }
}

/// Parameters of the slice-wise clustering extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterlineParams {
    pub axis: SliceAxis,
    /// Slab thickness along `axis`.
    pub dz: f64,
    /// Neighborhood radius for the density clustering.
    pub eps: f64,
    pub min_samples: usize,
    /// Largest centroid displacement still treated as continuous.
    pub max_jump: f64,
    /// Gaussian smoothing width in slabs, 0 disables smoothing.
    pub sigma: f64,
}

impl Default for CenterlineParams {
    fn default() -> Self {
        Self {
            axis: SliceAxis::Z,
            dz: 1.0,
            eps: 0.5,
            min_samples: 5,
            max_jump: 10.0,
            sigma: 1.0,
        }
    }
}

impl CenterlineParams {
    pub fn validate(&self) -> CenterlineResult<()> {
        require_positive("dz", self.dz)?;
        require_positive("eps", self.eps)?;
        require_positive("max_jump", self.max_jump)?;
        if self.min_samples == 0 {
            return Err(CenterlineError::invalid_argument(
                "min_samples",
                "must be at least 1",
            ));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(CenterlineError::invalid_argument(
                "sigma",
                format!("must be finite and >= 0, got {}", self.sigma),
            ));
        }
        Ok(())
    }
}

/// Parameters of the resample-and-score step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    pub num_points: usize,
    pub tolerances: Vec<f64>,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            num_points: 100,
            tolerances: vec![0.5, 1.0, 2.0, 3.0, 5.0, 10.0],
        }
    }
}

impl EvaluationParams {
    pub fn validate(&self) -> CenterlineResult<()> {
        if self.num_points < 1 {
            return Err(CenterlineError::invalid_argument(
                "num_points",
                "must be at least 1",
            ));
        }
        validate_tolerances(&self.tolerances)
    }
}

pub(crate) fn validate_tolerances(tolerances: &[f64]) -> CenterlineResult<()> {
    if tolerances.is_empty() {
        return Err(CenterlineError::invalid_argument(
            "tolerances",
            "at least one tolerance is required",
        ));
    }
    if let Some(bad) = tolerances.iter().find(|t| !t.is_finite() || **t <= 0.0) {
        return Err(CenterlineError::invalid_argument(
            "tolerances",
            format!("tolerances must be positive, got {}", bad),
        ));
    }
    Ok(())
}

/// How the endpoints of the structure are chosen before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EndpointMode {
    /// Use the whole point cloud.
    #[default]
    None,
    /// Farthest pair of points, then crop between them.
    Auto,
    /// Externally picked point indices, then crop between them.
    Fixed { start: usize, end: usize },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub centerline: CenterlineParams,
    pub evaluation: EvaluationParams,
    pub endpoints: EndpointMode,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> CenterlineResult<Self> {
        let config: PipelineConfig = toml::from_str(text)
            .map_err(|e| CenterlineError::parse("<inline config>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> CenterlineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CenterlineError::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: PipelineConfig =
            toml::from_str(&text).map_err(|e| CenterlineError::parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CenterlineResult<()> {
        self.centerline.validate()?;
        self.evaluation.validate()
    }
}

fn require_positive(name: &'static str, value: f64) -> CenterlineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CenterlineError::invalid_argument(
            name,
            format!("must be finite and > 0, got {}", value),
        ))
    }
}
