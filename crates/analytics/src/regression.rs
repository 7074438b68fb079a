use crate::error::PredictionError;
use nalgebra::{DMatrix, DVector};

/// Singular values below this fraction of the largest one are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// An ordinary-least-squares model with intercept.
///
/// Columns marked inactive at fit time carry a zero coefficient, so they
/// contribute nothing to predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// Fits `y ≈ intercept + x · coefficients` over the active columns of `x`.
    ///
    /// With no active column the model degrades to the mean of `y`. The solve
    /// goes through an SVD, so collinear columns yield the minimum-norm solution
    /// instead of an error.
    pub fn fit(
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        active: &[bool],
    ) -> Result<Self, PredictionError> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(PredictionError::Solver(format!(
                "design has {} rows but target has {}",
                x.nrows(),
                y.len()
            )));
        }

        let active_columns: Vec<usize> = (0..x.ncols()).filter(|j| active[*j]).collect();
        let mut coefficients = vec![0.0; x.ncols()];

        if active_columns.is_empty() {
            return Ok(Self { intercept: y.mean(), coefficients });
        }

        let design = DMatrix::from_fn(x.nrows(), active_columns.len() + 1, |i, j| {
            if j == 0 { 1.0 } else { x[(i, active_columns[j - 1])] }
        });

        let svd = design.svd(true, true);
        let largest = svd.singular_values.max();
        let beta = svd
            .solve(y, largest * RANK_TOLERANCE)
            .map_err(|e| PredictionError::Solver(e.to_string()))?;

        for (slot, column) in active_columns.iter().enumerate() {
            coefficients[*column] = beta[slot + 1];
        }

        Ok(Self { intercept: beta[0], coefficients })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        x.row_iter()
            .map(|row| {
                let values: Vec<f64> = row.iter().copied().collect();
                self.predict_row(&values)
            })
            .collect()
    }
}
