use std::path::{Path, PathBuf};

use ulid::Ulid;

use crate::commands::common::{
    forecast_rows, load_recipes, load_shipments, reconciliation_summary, resolve_config,
    usage_summary,
};
use crate::config::FORECAST_POLICY_VERSION;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ForecastData, ForecastFailureRow, ForecastSettingsData};
use crate::import::input::load_sales;
use crate::pipeline::PipelineContext;
use crate::pipeline::date::format_iso_date;
use crate::report::write_forecast_csv;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct ForecastRunOptions<'a> {
    pub sales: Vec<PathBuf>,
    pub recipes: PathBuf,
    /// Without shipments the reconciliation stage is skipped.
    pub shipments: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    /// CSV report destination.
    pub output: Option<PathBuf>,
    pub home_override: Option<&'a Path>,
}

pub fn run(
    sales: &[PathBuf],
    recipes: &Path,
    shipments: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(ForecastRunOptions {
        sales: sales.to_vec(),
        recipes: recipes.to_path_buf(),
        shipments: shipments.map(Path::to_path_buf),
        ..ForecastRunOptions::default()
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ForecastRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    if options.sales.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pass at least one sales CSV with --sales.",
            Some("forecast"),
        ));
    }

    let config = resolve_config(options.config_path.as_deref(), options.home_override)?;
    let recipes = load_recipes(&options.recipes)?;
    let shipments = options
        .shipments
        .as_deref()
        .map(load_shipments)
        .transpose()?;
    let sales = load_sales(&options.sales, config.default_year)?;

    let settings = ForecastSettingsData {
        forecast_horizon: config.forecast_horizon,
        clip_factor: config.clip_factor,
        trend_flexibility: config.trend_flexibility,
        fuzzy_threshold: config.fuzzy_threshold,
        grams_per_pound: config.grams_per_pound,
    };
    let mut context = PipelineContext::new(config, recipes);
    if let Some(records) = shipments {
        context = context.with_shipments(records);
    }

    let output = context.run(&sales.records);
    let rows = forecast_rows(&output.reconciliation.rows);

    if let Some(path) = options.output.as_deref() {
        write_forecast_csv(path, &rows)?;
    }

    let data = ForecastData {
        run_id: format!("run_{}", Ulid::new()),
        policy_version: FORECAST_POLICY_VERSION.to_string(),
        settings,
        last_history_month: output.forecast.last_history_month.as_ref().map(format_iso_date),
        shipment_stage: if output.supply.is_some() {
            "applied".to_string()
        } else {
            "skipped".to_string()
        },
        usage_summary: usage_summary(&sales, &output.usage),
        ingredients_forecast: output.forecast.ingredients_forecast,
        failures: output
            .forecast
            .failures
            .iter()
            .map(|failure| ForecastFailureRow {
                ingredient: failure.ingredient.clone(),
                reason: failure.reason.clone(),
            })
            .collect(),
        reconciliation: reconciliation_summary(&output.reconciliation.summary),
        rows,
        output_path: options
            .output
            .as_ref()
            .map(|path| path.display().to_string()),
    };

    success("forecast", data)
}
