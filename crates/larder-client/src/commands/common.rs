use std::path::Path;

use crate::ClientResult;
use crate::config::{PipelineConfig, load_config};
use crate::contracts::types::{
    ForecastRow, NameResolutionRow, ReconciliationSummaryData, SupplyRow, UsageRow,
    UsageSummaryData,
};
use crate::import::input::read_table;
use crate::import::parse::{SalesTable, parse_recipe_csv, parse_shipment_csv};
use crate::pipeline::aggregate::UsageSeries;
use crate::pipeline::date::{format_iso_date, month_label};
use crate::pipeline::reconcile::ReconciliationSummary;
use crate::pipeline::supply::SupplyTable;
use crate::pipeline::types::{RecipeTable, ReconciledForecast, ShipmentRecord};

/// Rendered in place of an action flag for rows that could not be classified.
pub(crate) const UNCLASSIFIED_FLAG: &str = "unclassified";

pub(crate) fn resolve_config(
    config_path: Option<&Path>,
    home_override: Option<&Path>,
) -> ClientResult<PipelineConfig> {
    let config = load_config(config_path, home_override)?;
    tracing::debug!(?config, "resolved pipeline configuration");
    Ok(config)
}

pub(crate) fn load_recipes(path: &Path) -> ClientResult<RecipeTable> {
    let recipes = parse_recipe_csv(&read_table(path)?)?;
    tracing::info!(
        items = recipes.rows.len(),
        ingredients = recipes.ingredients.len(),
        "loaded recipe table"
    );
    Ok(recipes)
}

pub(crate) fn load_shipments(path: &Path) -> ClientResult<Vec<ShipmentRecord>> {
    parse_shipment_csv(&read_table(path)?)
}

pub(crate) fn usage_summary(sales: &SalesTable, usage: &UsageSeries) -> UsageSummaryData {
    UsageSummaryData {
        rows_read: sales.rows_read,
        rows_invalid: sales.rows_invalid,
        items_matched: usage.summary.items_matched,
        dropped_item_count: usage.summary.dropped_item_count,
        dropped_items: usage.summary.dropped_items.clone(),
        dropped_units: usage.summary.dropped_units,
        ingredients: usage.summary.ingredients,
        months: usage.summary.months,
    }
}

pub(crate) fn usage_rows(usage: &UsageSeries) -> Vec<UsageRow> {
    usage
        .points
        .iter()
        .map(|point| UsageRow {
            month_label: month_label(&point.month),
            month: format_iso_date(&point.month),
            ingredient: point.ingredient.clone(),
            total_qty_used: point.total_qty_used,
        })
        .collect()
}

pub(crate) fn resolution_rows(usage: &UsageSeries) -> Vec<NameResolutionRow> {
    usage
        .resolutions
        .iter()
        .map(|resolution| NameResolutionRow {
            input: resolution.input.clone(),
            resolved: resolution.resolved.clone(),
            kind: resolution.kind.as_str().to_string(),
            score: resolution.score,
        })
        .collect()
}

pub(crate) fn supply_rows(supply: &SupplyTable) -> Vec<SupplyRow> {
    supply
        .rows
        .iter()
        .map(|row| SupplyRow {
            ingredient: row.ingredient.clone(),
            ingredient_key: row.ingredient_key.clone(),
            monthly_supply_qty: row.monthly_supply_qty,
            unit: row.unit.clone(),
            frequency_recognized: row.frequency_recognized,
        })
        .collect()
}

pub(crate) fn forecast_rows(rows: &[ReconciledForecast]) -> Vec<ForecastRow> {
    rows.iter()
        .map(|row| ForecastRow {
            month_label: month_label(&row.date),
            date: format_iso_date(&row.date),
            ingredient: row.ingredient.clone(),
            forecasted_usage_native: row.forecasted_usage_native_unit,
            shipment_unit: row.shipment_unit.clone(),
            forecasted_usage_in_shipment_unit: row.forecasted_usage_in_shipment_unit,
            monthly_supply_qty: row.monthly_supply_qty,
            shortfall_or_surplus: row.shortfall_or_surplus,
            action_flag: row
                .action_flag
                .map(|flag| flag.as_str())
                .unwrap_or(UNCLASSIFIED_FLAG)
                .to_string(),
            match_status: row.match_status.as_str().to_string(),
            supply_suspect: row.supply_suspect,
        })
        .collect()
}

pub(crate) fn reconciliation_summary(summary: &ReconciliationSummary) -> ReconciliationSummaryData {
    ReconciliationSummaryData {
        rows: summary.rows,
        matched_rows: summary.matched_rows,
        unmatched_rows: summary.unmatched_rows,
        unmatched_ingredients: summary.unmatched_ingredients.clone(),
        suspect_supply_rows: summary.suspect_supply_rows,
        shortfall_rows: summary.shortfall_rows,
    }
}
