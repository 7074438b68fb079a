use crate::error::PredictionError;
use crate::metrics::ModelMetrics;
use crate::regression::LinearModel;
use crate::report::{FitMethod, PredictionReport};
use crate::scaler::{StandardScaler, is_negligible_spread};
use crate::split::{Partition, partition};
use crate::trend::extrapolate;
use configuration::PredictionParams;
use core_types::MarketDataRecord;
use nalgebra::{DMatrix, DVector};

/// No line can be fitted through fewer points than this, whatever the configuration says.
pub const MIN_RECORDS: usize = 2;

/// A numeric column of `MarketDataRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    MarketPrice,
    HarvestAmount,
    TotalCost,
    TotalRevenue,
    NetProfit,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::MarketPrice,
        Field::HarvestAmount,
        Field::TotalCost,
        Field::TotalRevenue,
        Field::NetProfit,
    ];

    fn of(&self, record: &MarketDataRecord) -> f64 {
        match self {
            Field::MarketPrice => record.market_price,
            Field::HarvestAmount => record.harvest_amount,
            Field::TotalCost => record.total_cost,
            Field::TotalRevenue => record.total_revenue,
            Field::NetProfit => record.net_profit,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Field::MarketPrice => "market_price",
            Field::HarvestAmount => "harvest_amount",
            Field::TotalCost => "total_cost",
            Field::TotalRevenue => "total_revenue",
            Field::NetProfit => "net_profit",
        }
    }
}

/// Which columns predict which target.
struct ModelSpec {
    name: &'static str,
    features: &'static [Field],
    target: Field,
    non_negative: bool,
}

const PRICE_MODEL: ModelSpec = ModelSpec {
    name: "price",
    features: &[Field::HarvestAmount, Field::TotalCost],
    target: Field::MarketPrice,
    non_negative: true,
};

const PROFIT_MODEL: ModelSpec = ModelSpec {
    name: "profit",
    features: &[Field::MarketPrice, Field::HarvestAmount, Field::TotalCost],
    target: Field::NetProfit,
    non_negative: false,
};

/// Projections and held-out accuracy for one target.
struct ModelOutcome {
    predictions: Vec<f64>,
    metrics: ModelMetrics,
}

/// A stateless price/profit forecaster.
///
/// Every call standardises the snapshot, splits it, fits two independent OLS
/// models and projects them forward. Nothing survives between calls.
#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    params: PredictionParams,
}

impl PredictionEngine {
    pub fn new(params: PredictionParams) -> Result<Self, PredictionError> {
        params
            .validate()
            .map_err(|e| PredictionError::InvalidParameters(e.to_string()))?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PredictionParams {
        &self.params
    }

    /// Fits the price and profit models over `records` and projects `horizon` steps.
    ///
    /// The slice order is the time axis used for trend projection. Fewer than
    /// [`MIN_RECORDS`] rows is an error; fewer than `min_fit_records` rows yields a
    /// mean baseline rather than a regression.
    pub fn fit_and_predict(
        &self,
        records: &[MarketDataRecord],
        horizon: usize,
    ) -> Result<PredictionReport, PredictionError> {
        if horizon == 0 {
            return Err(PredictionError::InvalidHorizon);
        }
        if records.len() < MIN_RECORDS {
            return Err(PredictionError::InsufficientData {
                required: MIN_RECORDS,
                actual: records.len(),
            });
        }

        let records = match self.params.max_records {
            Some(cap) if records.len() > cap => &records[records.len() - cap..],
            _ => records,
        };
        check_finite(records)?;

        if records.len() < self.params.min_fit_records {
            tracing::debug!(
                records = records.len(),
                min_fit_records = self.params.min_fit_records,
                "Too few records for a regression; using the mean baseline."
            );
            return Ok(self.baseline(records, horizon));
        }

        let split = partition(
            records.len(),
            self.params.test_fraction,
            self.params.split,
            self.params.seed,
        );
        let price = self.fit_model(&PRICE_MODEL, records, &split, horizon)?;
        let profit = self.fit_model(&PROFIT_MODEL, records, &split, horizon)?;

        Ok(PredictionReport {
            price_predictions: price.predictions,
            profit_predictions: profit.predictions,
            price_metrics: price.metrics,
            profit_metrics: profit.metrics,
            method: FitMethod::Regression,
            records_used: records.len(),
            train_size: split.train.len(),
            test_size: split.test.len(),
        })
    }

    fn fit_model(
        &self,
        spec: &ModelSpec,
        records: &[MarketDataRecord],
        split: &Partition,
        horizon: usize,
    ) -> Result<ModelOutcome, PredictionError> {
        let raw = DMatrix::from_fn(records.len(), spec.features.len(), |i, j| {
            spec.features[j].of(&records[i])
        });
        let target: Vec<f64> = records.iter().map(|r| spec.target.of(r)).collect();

        let scaler = StandardScaler::fit(&raw);
        let scaled = scaler.transform(&raw);

        let x_train = select_rows(&scaled, &split.train);
        let y_train = DVector::from_iterator(split.train.len(), split.train.iter().map(|i| target[*i]));

        // A column constant over the whole snapshot or just over the training
        // rows cannot carry a slope.
        let active: Vec<bool> = (0..spec.features.len())
            .map(|j| !scaler.is_degenerate(j) && !is_constant(&x_train, j))
            .collect();

        let inactive: Vec<&str> = spec
            .features
            .iter()
            .zip(&active)
            .filter(|(_, a)| !**a)
            .map(|(f, _)| f.name())
            .collect();
        if !inactive.is_empty() {
            tracing::warn!(
                model = spec.name,
                columns = ?inactive,
                "Zero-variance feature columns contribute nothing to the fit."
            );
        }
        if active.iter().all(|a| !a) && !self.params.degenerate_fallback {
            return Err(PredictionError::DegenerateFeatures(spec.name.to_string()));
        }

        let model = LinearModel::fit(&x_train, &y_train, &active)?;

        // With nothing held out the metrics are in-sample.
        let eval_rows = if split.test.is_empty() { &split.train } else { &split.test };
        let actual: Vec<f64> = eval_rows.iter().map(|i| target[*i]).collect();
        let predicted = model.predict(&select_rows(&scaled, eval_rows));
        let metrics = ModelMetrics::evaluate(&actual, &predicted);

        let trends: Vec<Vec<f64>> = spec
            .features
            .iter()
            .map(|field| {
                let column: Vec<f64> = records.iter().map(|r| field.of(r)).collect();
                extrapolate(&column, self.params.trend_window, horizon)
            })
            .collect();

        let predictions = (0..horizon)
            .map(|step| {
                let row: Vec<f64> = trends.iter().map(|t| t[step]).collect();
                let value = model.predict_row(&scaler.transform_row(&row));
                clamp(spec, value)
            })
            .collect();

        tracing::debug!(
            model = spec.name,
            mse = metrics.mse,
            r2 = ?metrics.r2,
            train = split.train.len(),
            test = split.test.len(),
            "Model fitted."
        );

        Ok(ModelOutcome { predictions, metrics })
    }

    fn baseline(&self, records: &[MarketDataRecord], horizon: usize) -> PredictionReport {
        let outcome = |spec: &ModelSpec| {
            let target: Vec<f64> = records.iter().map(|r| spec.target.of(r)).collect();
            let mean = target.iter().sum::<f64>() / target.len() as f64;
            ModelOutcome {
                predictions: vec![clamp(spec, mean); horizon],
                metrics: ModelMetrics::evaluate(&target, &vec![mean; target.len()]),
            }
        };
        let price = outcome(&PRICE_MODEL);
        let profit = outcome(&PROFIT_MODEL);

        PredictionReport {
            price_predictions: price.predictions,
            profit_predictions: profit.predictions,
            price_metrics: price.metrics,
            profit_metrics: profit.metrics,
            method: FitMethod::Baseline,
            records_used: records.len(),
            train_size: records.len(),
            test_size: 0,
        }
    }
}

/// Fits and projects with default parameters.
pub fn fit_and_predict(
    records: &[MarketDataRecord],
    horizon: usize,
) -> Result<PredictionReport, PredictionError> {
    PredictionEngine::default().fit_and_predict(records, horizon)
}

fn check_finite(records: &[MarketDataRecord]) -> Result<(), PredictionError> {
    for (index, record) in records.iter().enumerate() {
        if let Some(field) = Field::ALL.iter().find(|f| !f.of(record).is_finite()) {
            return Err(PredictionError::NonFiniteInput { index, field: field.name() });
        }
    }
    Ok(())
}

fn select_rows(data: &DMatrix<f64>, rows: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), data.ncols(), |i, j| data[(rows[i], j)])
}

fn is_constant(data: &DMatrix<f64>, column: usize) -> bool {
    let values = data.column(column);
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    is_negligible_spread(variance.sqrt(), mean)
}

fn clamp(spec: &ModelSpec, value: f64) -> f64 {
    if spec.non_negative { value.max(0.0) } else { value }
}
