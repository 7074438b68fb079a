/// Extends `series` by `horizon` points along its recent straight-line trend.
///
/// A least-squares line is fitted over the last `window` values against their
/// position in the full series, then evaluated at positions `n, n + 1, …`.
/// A single trailing value, or a window whose values are all equal, yields a
/// flat continuation.
pub fn extrapolate(series: &[f64], window: usize, horizon: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return vec![0.0; horizon];
    }

    let start = n.saturating_sub(window.max(1));
    let tail = &series[start..];
    let count = tail.len() as f64;

    let x_mean = (start..n).map(|i| i as f64).sum::<f64>() / count;
    let y_mean = tail.iter().sum::<f64>() / count;

    let mut covariance = 0.0;
    let mut spread = 0.0;
    for (offset, y) in tail.iter().enumerate() {
        let dx = (start + offset) as f64 - x_mean;
        covariance += dx * (y - y_mean);
        spread += dx * dx;
    }
    let slope = if spread > 0.0 { covariance / spread } else { 0.0 };

    (0..horizon)
        .map(|step| y_mean + slope * ((n + step) as f64 - x_mean))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continues_a_linear_series() {
        let series = [10.0, 20.0, 30.0, 40.0, 50.0];
        let projected = extrapolate(&series, 5, 3);
        for (p, expected) in projected.iter().zip([60.0, 70.0, 80.0]) {
            assert!((p - expected).abs() < 1e-9, "{p} vs {expected}");
        }
    }

    #[test]
    fn only_the_window_drives_the_trend() {
        // Flat history followed by a rising tail.
        let series = [100.0, 100.0, 100.0, 1.0, 2.0, 3.0];
        let projected = extrapolate(&series, 3, 2);
        assert!((projected[0] - 4.0).abs() < 1e-9);
        assert!((projected[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn constant_series_stays_constant() {
        let projected = extrapolate(&[7.5; 5], 5, 4);
        assert_eq!(projected, vec![7.5; 4]);
    }

    #[test]
    fn single_value_is_carried_forward() {
        assert_eq!(extrapolate(&[3.0], 5, 2), vec![3.0, 3.0]);
    }

    #[test]
    fn horizon_controls_length() {
        assert_eq!(extrapolate(&[1.0, 2.0], 5, 0).len(), 0);
        assert_eq!(extrapolate(&[1.0, 2.0], 5, 12).len(), 12);
    }
}
