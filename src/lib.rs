pub mod config;
pub mod entry;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod processing;

mod utils;

#[cfg(feature = "python")]
mod binding;

pub use config::{CenterlineParams, EndpointMode, EvaluationParams, PipelineConfig, SliceAxis};
pub use error::{CenterlineError, CenterlineResult};
pub use evaluation::metrics::ScoreSet;
pub use io::{Centerline, CenterlinePoint, PointCloud};
pub use processing::extract_centerline;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Centerline extraction and scoring for tubular surface meshes.
#[cfg(feature = "python")]
#[pymodule]
fn aortaline(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(binding::extract_centerline, m)?)?;
    m.add_function(wrap_pyfunction!(binding::extract_centerline_from_file, m)?)?;
    m.add_function(wrap_pyfunction!(binding::resample, m)?)?;
    m.add_function(wrap_pyfunction!(binding::select_endpoints, m)?)?;
    m.add_function(wrap_pyfunction!(binding::score_curves, m)?)?;
    m.add_function(wrap_pyfunction!(binding::run_batch, m)?)?;
    m.add_class::<binding::classes::PyCenterlinePoint>()?;
    m.add_class::<binding::classes::PyCenterline>()?;
    m.add_class::<binding::classes::PyScoreSet>()?;
    Ok(())
}
