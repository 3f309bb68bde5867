use crate::io::{Centerline, CenterlinePoint};
use nalgebra::Point3;

/// Kernel support in standard deviations.
pub const TRUNCATE: f64 = 4.0;

/// Normalized Gaussian weights over `[-r, r]` with `r = floor(TRUNCATE * sigma + 0.5)`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as usize;
    if sigma <= 0.0 || radius == 0 {
        return vec![1.0];
    }
    let r = radius as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-r..=r)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Index into `0..n` after mirroring about the half-sample edges
/// (`d c b a | a b c d | d c b a`).
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

/// Sigma, in reflection periods, beyond which the folded kernel is flat up to
/// its truncated tails and the filter reduces to the mean.
const FLAT_PERIODS: f64 = 2.0;

/// 1-D Gaussian filter with reflecting boundaries. The output has the same
/// length as the input; `sigma == 0` returns the input unchanged.
///
/// Reflection repeats with period `2n`, so kernel taps wider than that are
/// folded onto one period and the work stays bounded for any `sigma`.
pub fn gaussian_filter1d(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let period = 2 * n;
    if sigma >= FLAT_PERIODS * period as f64 {
        let mean = values.iter().sum::<f64>() / n as f64;
        return vec![mean; n];
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let taps: Vec<(isize, f64)> = if kernel.len() <= period {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| (k as isize - radius, w))
            .collect()
    } else {
        let mut folded = vec![0.0; period];
        for (k, w) in kernel.iter().enumerate() {
            folded[(k as isize - radius).rem_euclid(period as isize) as usize] += w;
        }
        folded
            .into_iter()
            .enumerate()
            .map(|(d, w)| (d as isize, w))
            .collect()
    };

    (0..n as isize)
        .map(|i| {
            taps.iter()
                .map(|&(offset, w)| w * values[reflect_index(i + offset, n)])
                .sum::<f64>()
        })
        .collect()
}

/// Smooths each coordinate of the centerline independently. Point count and
/// slab indices are preserved.
pub fn smooth_centerline(centerline: &Centerline, sigma: f64) -> Centerline {
    if centerline.is_empty() {
        return Centerline::default();
    }
    let axes: Vec<Vec<f64>> = (0..3)
        .map(|axis| {
            let column: Vec<f64> = centerline.points.iter().map(|p| p.position[axis]).collect();
            gaussian_filter1d(&column, sigma)
        })
        .collect();

    let points = centerline
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| CenterlinePoint {
            slab_index: p.slab_index,
            position: Point3::new(axes[0][i], axes[1][i], axes[2][i]),
        })
        .collect();
    Centerline { points }
}

#[cfg(test)]
mod smoothing_tests {
    use super::*;
    use approx::assert_relative_eq;

    fn centerline_from(xs: &[f64]) -> Centerline {
        Centerline {
            points: xs
                .iter()
                .enumerate()
                .map(|(i, &x)| CenterlinePoint {
                    slab_index: i,
                    position: Point3::new(x, 2.0 * x, i as f64),
                })
                .collect(),
        }
    }

    #[test]
    fn test_kernel_radius_and_normalization() {
        assert_eq!(gaussian_kernel(1.0).len(), 9);
        assert_eq!(gaussian_kernel(0.1).len(), 1);
        assert_eq!(gaussian_kernel(2.5).len(), 21);
        assert_relative_eq!(gaussian_kernel(1.0).iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        let k = gaussian_kernel(1.0);
        assert_relative_eq!(k[4] / k[5], (0.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_reflect_index_mirrors_at_both_ends() {
        let mapped: Vec<usize> = (-3..7).map(|i| reflect_index(i, 4)).collect();
        assert_eq!(mapped, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);
        assert_eq!(reflect_index(-1, 1), 0);
        assert_eq!(reflect_index(5, 1), 0);
    }

    #[test]
    fn test_constant_signal_is_unchanged() {
        let values = vec![3.0; 7];
        for v in gaussian_filter1d(&values, 2.0) {
            assert_relative_eq!(v, 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_signal_is_preserved_away_from_edges() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let smoothed = gaussian_filter1d(&values, 1.0);
        for i in 4..26 {
            assert_relative_eq!(smoothed[i], values[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_spike_is_spread_and_mass_conserved() {
        let mut values = vec![0.0; 21];
        values[10] = 1.0;
        let smoothed = gaussian_filter1d(&values, 1.0);
        assert!(smoothed[10] < 1.0);
        assert!(smoothed[9] > 0.0 && smoothed[11] > 0.0);
        assert_relative_eq!(smoothed.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(smoothed[9], smoothed[11], epsilon = 1e-15);
    }

    /// Direct convolution over the full kernel, no folding.
    fn filter_unfolded(values: &[f64], sigma: f64) -> Vec<f64> {
        let kernel = gaussian_kernel(sigma);
        let radius = (kernel.len() / 2) as isize;
        (0..values.len() as isize)
            .map(|i| {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * values[reflect_index(i + k as isize - radius, values.len())])
                    .sum::<f64>()
            })
            .collect()
    }

    #[test]
    fn test_kernel_wider_than_signal_is_folded() {
        let values = vec![1.0, 4.0, -2.0, 0.5];
        for sigma in [1.5, 3.0, 7.0] {
            let folded = gaussian_filter1d(&values, sigma);
            let direct = filter_unfolded(&values, sigma);
            for (a, b) in folded.iter().zip(&direct) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_huge_sigma_gives_the_mean() {
        let values = vec![1.0, 4.0, -2.0, 0.5, 3.5];
        for v in gaussian_filter1d(&values, 1e12) {
            assert_relative_eq!(v, 1.4, epsilon = 1e-12);
        }
        // At the cutover the full kernel already averages the signal.
        let direct = filter_unfolded(&values, 20.0);
        for v in direct {
            assert_relative_eq!(v, 1.4, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let values = vec![1.0, 5.0, -2.0];
        assert_eq!(gaussian_filter1d(&values, 0.0), values);
    }

    #[test]
    fn test_smoothing_preserves_length_and_slab_indices() {
        let raw = centerline_from(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let smoothed = smooth_centerline(&raw, 1.0);
        assert_eq!(smoothed.len(), raw.len());
        for (s, r) in smoothed.points.iter().zip(&raw.points) {
            assert_eq!(s.slab_index, r.slab_index);
            assert!(s.position.x > 0.0 && s.position.x < 1.0);
            assert_relative_eq!(s.position.y, 2.0 * s.position.x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_point_centerline() {
        let raw = centerline_from(&[4.0]);
        let smoothed = smooth_centerline(&raw, 1.0);
        assert_relative_eq!(smoothed.points[0].position.x, 4.0, epsilon = 1e-12);
    }
}
