use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UsageData {
    pub summary: UsageSummaryData,
    pub resolutions: Vec<NameResolutionRow>,
    pub rows: Vec<UsageRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummaryData {
    pub rows_read: usize,
    pub rows_invalid: usize,
    pub items_matched: usize,
    pub dropped_item_count: usize,
    pub dropped_items: Vec<String>,
    pub dropped_units: f64,
    pub ingredients: usize,
    pub months: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameResolutionRow {
    pub input: String,
    pub resolved: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageRow {
    pub month_label: String,
    pub month: String,
    pub ingredient: String,
    pub total_qty_used: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplyData {
    pub rows: Vec<SupplyRow>,
    pub unrecognized_frequencies: Vec<String>,
    pub suspect_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplyRow {
    pub ingredient: String,
    pub ingredient_key: String,
    pub monthly_supply_qty: f64,
    pub unit: String,
    pub frequency_recognized: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastData {
    pub run_id: String,
    pub policy_version: String,
    pub settings: ForecastSettingsData,
    pub last_history_month: Option<String>,
    /// `applied` or `skipped`.
    pub shipment_stage: String,
    pub usage_summary: UsageSummaryData,
    pub ingredients_forecast: usize,
    pub failures: Vec<ForecastFailureRow>,
    pub reconciliation: ReconciliationSummaryData,
    pub rows: Vec<ForecastRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastSettingsData {
    pub forecast_horizon: usize,
    pub clip_factor: f64,
    pub trend_flexibility: f64,
    pub fuzzy_threshold: f64,
    pub grams_per_pound: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastFailureRow {
    pub ingredient: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationSummaryData {
    pub rows: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    pub unmatched_ingredients: Vec<String>,
    pub suspect_supply_rows: usize,
    pub shortfall_rows: usize,
}

/// One report line; also the CSV record, so field order is the column order.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastRow {
    pub month_label: String,
    pub date: String,
    pub ingredient: String,
    pub forecasted_usage_native: f64,
    pub shipment_unit: Option<String>,
    pub forecasted_usage_in_shipment_unit: f64,
    pub monthly_supply_qty: Option<f64>,
    pub shortfall_or_surplus: Option<f64>,
    pub action_flag: String,
    pub match_status: String,
    pub supply_suspect: bool,
}
