use serde::{Deserialize, Serialize};

const ZERO_TOLERANCE: f64 = 1e-12;

/// Accuracy of one model on its evaluation rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean squared error; never negative.
    pub mse: f64,
    /// Coefficient of determination, `None` when it is undefined (constant
    /// target with non-zero residuals).
    pub r2: Option<f64>,
}

impl ModelMetrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            mse: mean_squared_error(actual, predicted),
            r2: r2_score(actual, predicted),
        }
    }
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    sum_squared_residuals(actual, predicted) / actual.len() as f64
}

/// `1 - SS_res / SS_tot`, capped at 1.0.
///
/// When the target is constant, the score is 1.0 for an exact fit and
/// undefined otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() {
        return None;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean) * (y - mean)).sum();
    let ss_res = sum_squared_residuals(actual, predicted);
    let scale = actual.iter().map(|y| y * y).sum::<f64>().max(1.0);

    if ss_tot <= ZERO_TOLERANCE * scale {
        return if ss_res <= ZERO_TOLERANCE * scale { Some(1.0) } else { None };
    }
    Some((1.0 - ss_res / ss_tot).min(1.0))
}

fn sum_squared_residuals(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let m = ModelMetrics::evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, Some(1.0));
    }

    #[test]
    fn mean_predictor_scores_zero() {
        let m = ModelMetrics::evaluate(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]);
        assert!((m.mse - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.r2, Some(0.0));
    }

    #[test]
    fn worse_than_mean_goes_negative() {
        let r2 = r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!(r2 < 0.0);
    }

    #[test]
    fn constant_target_exact_fit_is_one() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), Some(1.0));
    }

    #[test]
    fn constant_target_with_residuals_is_undefined() {
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 6.0]), None);
        assert_eq!(mean_squared_error(&[5.0, 5.0], &[4.0, 6.0]), 1.0);
    }

    #[test]
    fn empty_input() {
        let m = ModelMetrics::evaluate(&[], &[]);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, None);
    }
}
