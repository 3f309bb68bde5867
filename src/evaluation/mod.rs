pub mod metrics;
pub mod resample;

use nalgebra::Point3;
use tracing::debug;

use crate::config::EvaluationParams;
use crate::error::CenterlineResult;
use crate::evaluation::metrics::{require_finite, ScoreSet};
use crate::evaluation::resample::resample;

/// Resamples both curves to `params.num_points` and scores the prediction
/// against the ground truth.
pub fn score_curves(
    predicted: &[Point3<f64>],
    ground_truth: &[Point3<f64>],
    params: &EvaluationParams,
) -> CenterlineResult<ScoreSet> {
    params.validate()?;
    require_finite(predicted, "predicted")?;
    require_finite(ground_truth, "ground_truth")?;
    let pred = resample(predicted, params.num_points)?;
    let gt = resample(ground_truth, params.num_points)?;
    let scores = ScoreSet::compute(pred.points(), gt.points(), &params.tolerances)?;
    debug!(
        "Scored {} vs {} resampled points: mean closest {:.3}, HD {:.3}",
        pred.len(),
        gt.len(),
        scores.mean_closest,
        scores.hausdorff
    );
    Ok(scores)
}

#[cfg(test)]
mod evaluation_tests {
    use super::*;
    use crate::error::CenterlineError;
    use approx::assert_relative_eq;

    fn line(n: usize, offset: f64) -> Vec<Point3<f64>> {
        (0..n)
            .map(|i| Point3::new(offset, 0.0, i as f64))
            .collect()
    }

    #[test]
    fn test_sampling_density_does_not_bias_scores() {
        // Same segment, one sampled 5 times and the other 200 times.
        let sparse = line(5, 0.75);
        let dense: Vec<Point3<f64>> = (0..200)
            .map(|i| Point3::new(0.0, 0.0, i as f64 * 4.0 / 199.0))
            .collect();
        let scores = score_curves(&sparse, &dense, &EvaluationParams::default()).unwrap();
        assert_relative_eq!(scores.mean_closest, 0.75, epsilon = 1e-9);
        assert_relative_eq!(scores.hausdorff, 0.75, epsilon = 1e-9);
        assert_relative_eq!(scores.avg_symmetric, 0.75, epsilon = 1e-9);
        assert_eq!(scores.accuracy.fractions, vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_prediction_is_an_error() {
        let err = score_curves(&[], &line(4, 0.0), &EvaluationParams::default()).unwrap_err();
        assert!(matches!(err, CenterlineError::EmptyCurve { which: "predicted" }));
    }

    #[test]
    fn test_nan_in_ground_truth_is_an_error() {
        let mut gt = line(6, 0.0);
        gt[3].y = f64::NAN;
        let err = score_curves(&line(6, 0.5), &gt, &EvaluationParams::default()).unwrap_err();
        assert!(matches!(
            err,
            CenterlineError::InvalidArgument { name: "ground_truth", .. }
        ));
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let params = EvaluationParams {
            num_points: 0,
            ..EvaluationParams::default()
        };
        assert!(score_curves(&line(3, 0.0), &line(3, 0.0), &params).is_err());
    }
}
