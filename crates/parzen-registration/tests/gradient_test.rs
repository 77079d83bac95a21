use burn_ndarray::NdArray;
use parzen_core::histogram::HistogramLayout;
use parzen_core::image::{forward_difference, sobel, ImageShape};
use parzen_core::matrix::to_vec;
use parzen_core::transform::parameter_gradient;
use parzen_registration::metric::gather_per_pixel;
use parzen_registration::{
    apply_transform_jacobian, compute_mi_gradient, GradientMode, GradientStrategy, MetricConfig,
    ParzenMutualInformation,
};
use proptest::prelude::*;

type B = NdArray<f64>;

fn pair(max_len: usize, bins: u8) -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (1..max_len).prop_flat_map(move |len| {
        (
            prop::collection::vec(0..bins, len),
            prop::collection::vec(0..bins, len),
        )
    })
}

/// Cubic B-spline, the continuous window sampled by `{1/6, 2/3, 1/6}`.
fn bspline3(x: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 {
        2.0 / 3.0 - x * x + x * x * x / 2.0
    } else if x < 2.0 {
        (2.0 - x).powi(3) / 6.0
    } else {
        0.0
    }
}

/// `-sum(P * ln(P / (Pj * Pk)))` with continuous moving intensities.
fn continuous_loss(moving: &[f64], fixed: &[u8], bins: usize, padding: usize) -> f64 {
    let dim = bins + 2 * padding;
    let n = moving.len() as f64;
    let mut p = vec![0.0; dim * dim];

    for (&m, &f) in moving.iter().zip(fixed) {
        let m = m + padding as f64;
        let f = f as f64 + padding as f64;
        for j in 0..dim {
            let wj = bspline3(j as f64 - m);
            if wj == 0.0 {
                continue;
            }
            for k in 0..dim {
                let wk = bspline3(k as f64 - f);
                if wk != 0.0 {
                    p[j * dim + k] += wj * wk / n;
                }
            }
        }
    }

    let pj: Vec<f64> = (0..dim).map(|j| p[j * dim..(j + 1) * dim].iter().sum()).collect();
    let pk: Vec<f64> = (0..dim).map(|k| (0..dim).map(|j| p[j * dim + k]).sum()).collect();

    let mut loss = 0.0;
    for j in 0..dim {
        for k in 0..dim {
            let pjk = p[j * dim + k];
            if pjk > 0.0 {
                loss -= pjk * (pjk / (pj[j] * pk[k])).ln();
            }
        }
    }
    loss
}

fn synthetic_pair(len: usize) -> (Vec<u8>, Vec<u8>) {
    let moving = (0..len).map(|i| ((i * 7 + 3) % 11 + 2) as u8).collect();
    let fixed = (0..len).map(|i| ((i * 5 + i / 3) % 9 + 3) as u8).collect();
    (moving, fixed)
}

#[test]
fn test_continuous_harness_reproduces_value() {
    let (moving, fixed) = synthetic_pair(60);
    let metric = ParzenMutualInformation::<B>::with_bins(16).unwrap();
    let value = metric.compute_mi(&moving, &fixed).unwrap();

    let continuous: Vec<f64> = moving.iter().map(|&m| m as f64).collect();
    let harness = continuous_loss(&continuous, &fixed, 16, 1);
    assert!((value - harness).abs() < 1e-12, "{value} vs {harness}");
}

#[test]
fn test_data_term_matches_finite_difference() {
    let (moving, fixed) = synthetic_pair(60);
    let n = moving.len() as f64;
    let metric = ParzenMutualInformation::<B>::with_bins(16).unwrap();
    let terms = metric.gradient_terms(&moving, &fixed).unwrap();
    let alpha_matrix = to_vec(terms.alpha).unwrap();
    let layout = HistogramLayout::new(16, 1).unwrap();
    let h = 1e-4;

    for i in [0usize, 7, 13, 22, 41, 59] {
        let mut plus: Vec<f64> = moving.iter().map(|&m| m as f64).collect();
        let mut minus = plus.clone();
        plus[i] += h;
        minus[i] -= h;

        let slope = (continuous_loss(&plus, &fixed, 16, 1) - continuous_loss(&minus, &fixed, 16, 1)) / (2.0 * h);
        let alpha = alpha_matrix[layout.index(moving[i]) * layout.dim() + layout.index(fixed[i])];

        assert!(
            (n * slope + alpha).abs() < 1e-6 * alpha.abs().max(1.0),
            "pixel {i}: N*dV/dm = {}, alpha = {alpha}",
            n * slope
        );
    }
}

#[test]
fn test_per_pixel_is_gradient_terms_gathered() {
    let (moving, fixed) = synthetic_pair(60);
    let metric = ParzenMutualInformation::<B>::with_bins(16).unwrap();
    let terms = metric.gradient_terms(&moving, &fixed).unwrap();
    let per_pixel = metric
        .compute_mi_gradient(&moving, &fixed, GradientMode::PerPixel)
        .unwrap();

    let layout = HistogramLayout::new(16, 1).unwrap();
    let expected = gather_per_pixel(&terms.gradient_matrix(), &moving, &fixed, layout);
    assert_eq!(per_pixel.to_vec().unwrap(), to_vec(expected).unwrap());
}

#[test]
fn test_public_gradient_follows_finite_difference() {
    // The public gradient carries beta on top of the exact -alpha data term,
    // so it is only checked coarsely against N * dV/dm.
    let (moving, fixed) = synthetic_pair(60);
    let n = moving.len() as f64;
    let gradient = compute_mi_gradient(&moving, &fixed, 16, GradientMode::PerPixel)
        .unwrap()
        .to_vec()
        .unwrap();
    let h = 1e-4;

    let mut err_sq = 0.0;
    let mut norm_sq = 0.0;
    for (i, &g) in gradient.iter().enumerate() {
        let mut plus: Vec<f64> = moving.iter().map(|&m| m as f64).collect();
        let mut minus = plus.clone();
        plus[i] += h;
        minus[i] -= h;
        let scaled = n * (continuous_loss(&plus, &fixed, 16, 1) - continuous_loss(&minus, &fixed, 16, 1)) / (2.0 * h);

        assert!(
            (g - scaled).abs() <= 0.2 * scaled.abs() + 0.01,
            "pixel {i}: gradient {g}, N*dV/dm {scaled}"
        );
        err_sq += (g - scaled).powi(2);
        norm_sq += scaled.powi(2);
    }
    assert!((err_sq / norm_sq).sqrt() < 0.2);
}

proptest! {
    #[test]
    fn test_per_pixel_matches_matrix_gather((moving, fixed) in pair(300, 32)) {
        let metric = ParzenMutualInformation::<B>::with_bins(32).unwrap();
        let per_pixel = metric.compute_mi_gradient(&moving, &fixed, GradientMode::PerPixel).unwrap();
        let matrix = metric.compute_mi_gradient(&moving, &fixed, GradientMode::Matrix).unwrap();

        prop_assert_eq!(matrix.as_matrix().unwrap().dims(), [32, 32]);
        let matrix = matrix.to_vec().unwrap();
        for (i, g) in per_pixel.to_vec().unwrap().iter().enumerate() {
            prop_assert_eq!(*g, matrix[moving[i] as usize * 32 + fixed[i] as usize]);
        }
    }

    #[test]
    fn test_windowed_strategy_agrees((moving, fixed) in pair(300, 24), padded in any::<bool>()) {
        let base = MetricConfig::new().with_bins(24).with_padding(padded);
        let precomputed = ParzenMutualInformation::<B>::new(base.clone()).unwrap();
        let windowed = ParzenMutualInformation::<B>::new(base.with_strategy(GradientStrategy::Windowed)).unwrap();

        let a = precomputed.compute_mi_gradient(&moving, &fixed, GradientMode::PerPixel).unwrap();
        let b = windowed.compute_mi_gradient(&moving, &fixed, GradientMode::PerPixel).unwrap();
        for (x, y) in a.to_vec().unwrap().iter().zip(b.to_vec().unwrap()) {
            prop_assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0), "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_jacobian_at_identity(gx in prop::collection::vec(-10.0f64..10.0, 12), gy in prop::collection::vec(-10.0f64..10.0, 12)) {
        let shape = ImageShape::new(4, 3);
        let rows = apply_transform_jacobian(&gx, &gy, 0.0, 1.0, shape).unwrap();
        for (i, row) in rows.iter().enumerate() {
            let (x, y) = shape.coordinates(i);
            prop_assert!((row[0] - (-gx[i] * y as f64 + gy[i] * x as f64)).abs() < 1e-12);
            prop_assert_eq!(row[1], gy[i]);
            prop_assert_eq!(row[2], gx[i]);
        }
    }
}

#[test]
fn test_gradient_chains_onto_transform_parameters() {
    let shape = ImageShape::new(8, 8);
    let moving: Vec<u8> = (0..64).map(|i| ((i % 8) * 4 + (i / 8) * 2) as u8).collect();
    let fixed: Vec<u8> = (0..64).map(|i| ((i % 8) * 3 + (i / 8) * 3 + 1) as u8).collect();

    let metric = ParzenMutualInformation::<B>::with_bins(64).unwrap();
    let gradient = metric
        .compute_mi_gradient(&moving, &fixed, GradientMode::PerPixel)
        .unwrap()
        .to_vec()
        .unwrap();

    for image_gradient in [forward_difference(&moving, shape).unwrap(), sobel(&moving, shape).unwrap()] {
        let jacobian = apply_transform_jacobian(&image_gradient.x, &image_gradient.y, 0.1, 0.5, shape).unwrap();
        let total = parameter_gradient(&gradient, &jacobian).unwrap();
        let mut expected = [0.0; 3];
        for (g, row) in gradient.iter().zip(&jacobian) {
            for p in 0..3 {
                expected[p] += g * row[p];
            }
        }
        for p in 0..3 {
            assert!((total[p] - expected[p]).abs() < 1e-9);
        }
        assert!(total.iter().all(|v| v.is_finite()));
    }
}
