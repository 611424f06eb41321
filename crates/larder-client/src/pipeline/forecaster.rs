use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::pipeline::date::{add_months, months_between};
use crate::pipeline::trend::{FitError, TrendModel, TrendSettings};
use crate::pipeline::types::{ForecastPoint, IngredientUsagePoint};

const SMOOTHING_WINDOW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub horizon: usize,
    pub clip_factor: f64,
    pub trend: TrendSettings,
}

impl ForecastSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            horizon: config.forecast_horizon,
            clip_factor: config.clip_factor,
            trend: TrendSettings {
                flexibility: config.trend_flexibility,
                max_iterations: config.max_fit_iterations,
            },
        }
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFailure {
    pub ingredient: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastRun {
    /// Grouped by ingredient in name order, each series in date order.
    pub points: Vec<ForecastPoint>,
    pub failures: Vec<ForecastFailure>,
    /// Latest month present in any ingredient's history.
    pub last_history_month: Option<NaiveDate>,
    pub ingredients_forecast: usize,
}

/// Mean of each value and up to one predecessor.
pub fn trailing_average(values: &[f64]) -> Vec<f64> {
    (0..values.len())
        .map(|index| {
            let start = (index + 1).saturating_sub(SMOOTHING_WINDOW);
            let window = &values[start..=index];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Fits one ingredient and returns fitted history plus `horizon` future months.
///
/// Every returned value lies in `[0, max raw usage * clip_factor]`.
pub fn forecast_ingredient(
    ingredient: &str,
    history: &[(NaiveDate, f64)],
    settings: &ForecastSettings,
) -> Result<Vec<ForecastPoint>, FitError> {
    if history.is_empty() {
        return Err(FitError::EmptySeries);
    }
    if history.iter().any(|(_, value)| !value.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let mut ordered = history.to_vec();
    ordered.sort_by_key(|(month, _)| *month);

    let first_month = ordered[0].0;
    let last_month = ordered[ordered.len() - 1].0;
    let raw = ordered.iter().map(|(_, value)| *value).collect::<Vec<f64>>();
    let max_raw = raw.iter().copied().fold(0.0_f64, f64::max);
    let upper_bound = max_raw * settings.clip_factor;

    let transformed = trailing_average(&raw)
        .into_iter()
        .map(|value| value.max(1.0).ln())
        .collect::<Vec<f64>>();
    let times = ordered
        .iter()
        .map(|(month, _)| f64::from(months_between(first_month, *month)))
        .collect::<Vec<f64>>();

    let model = TrendModel::fit(&times, &transformed, settings.trend)?;

    let future = (1..=settings.horizon)
        .map(|step| add_months(last_month, i32::try_from(step).unwrap_or(i32::MAX)));
    let points = ordered
        .iter()
        .map(|(month, _)| *month)
        .chain(future)
        .map(|date| {
            let fitted = model
                .predict(f64::from(months_between(first_month, date)))
                .exp();
            ForecastPoint {
                date,
                ingredient: ingredient.to_string(),
                forecasted_usage: fitted.min(upper_bound).max(0.0),
            }
        })
        .collect::<Vec<ForecastPoint>>();

    tracing::debug!(
        ingredient,
        history = ordered.len(),
        changepoints = model.active_changepoints(),
        "fitted ingredient trend"
    );
    Ok(points)
}

/// Forecasts every ingredient independently on the rayon pool.
///
/// A failed fit is recorded and skipped; the other ingredients still run.
pub fn forecast_all(usage: &[IngredientUsagePoint], settings: &ForecastSettings) -> ForecastRun {
    let mut grouped: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for point in usage {
        grouped
            .entry(point.ingredient.as_str())
            .or_default()
            .push((point.month, point.total_qty_used));
    }
    let series = grouped.into_iter().collect::<Vec<(&str, Vec<(NaiveDate, f64)>)>>();

    let outcomes = series
        .par_iter()
        .map(|(ingredient, history)| {
            (
                *ingredient,
                forecast_ingredient(ingredient, history, settings),
            )
        })
        .collect::<Vec<(&str, Result<Vec<ForecastPoint>, FitError>)>>();

    let mut run = ForecastRun {
        last_history_month: usage.iter().map(|point| point.month).max(),
        ..ForecastRun::default()
    };
    for (ingredient, outcome) in outcomes {
        match outcome {
            Ok(points) => {
                run.ingredients_forecast += 1;
                run.points.extend(points);
            }
            Err(error) => {
                tracing::warn!(ingredient, %error, "ingredient forecast failed");
                run.failures.push(ForecastFailure {
                    ingredient: ingredient.to_string(),
                    reason: error.to_string(),
                });
            }
        }
    }

    tracing::info!(
        ingredients = run.ingredients_forecast,
        failures = run.failures.len(),
        points = run.points.len(),
        "forecast stage finished"
    );
    run
}
