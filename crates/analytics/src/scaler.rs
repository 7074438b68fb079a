use nalgebra::DMatrix;

/// Relative tolerance under which a column's standard deviation counts as zero.
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Per-column standardisation using the population standard deviation.
///
/// A column whose spread is (numerically) zero is degenerate: it maps to 0 for
/// every row instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Computes column means and standard deviations. `data` must have at least one row.
    pub fn fit(data: &DMatrix<f64>) -> Self {
        let n = data.nrows() as f64;
        let mut means = Vec::with_capacity(data.ncols());
        let mut stds = Vec::with_capacity(data.ncols());

        for column in data.column_iter() {
            let mean = column.iter().sum::<f64>() / n;
            let variance = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            means.push(mean);
            stds.push(variance.sqrt());
        }

        Self { means, stds }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    pub fn is_degenerate(&self, column: usize) -> bool {
        is_negligible_spread(self.stds[column], self.means[column])
    }

    /// Scales a single raw row.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, value)| self.scale(j, *value))
            .collect()
    }

    pub fn transform(&self, data: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| self.scale(j, data[(i, j)]))
    }

    fn scale(&self, column: usize, value: f64) -> f64 {
        if self.is_degenerate(column) {
            0.0
        } else {
            (value - self.means[column]) / self.stds[column]
        }
    }
}

/// True when `std` is zero relative to the magnitude of the values it describes.
pub(crate) fn is_negligible_spread(std: f64, mean: f64) -> bool {
    std <= DEGENERATE_TOLERANCE * mean.abs().max(1.0)
}
