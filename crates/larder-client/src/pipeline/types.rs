use std::collections::BTreeMap;

use chrono::NaiveDate;

/// One consolidated sales row. `month` is always the first day of the month.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub month: NaiveDate,
    pub item_name: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRow {
    pub item_name: String,
    pub ingredient_qty: BTreeMap<String, f64>,
}

/// Recipe rows keep table order; fuzzy matching breaks ties by it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeTable {
    pub ingredients: Vec<String>,
    pub rows: Vec<RecipeRow>,
}

impl RecipeTable {
    pub fn item_names(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.item_name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientUsagePoint {
    pub month: NaiveDate,
    pub ingredient: String,
    pub total_qty_used: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub ingredient: String,
    pub forecasted_usage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    pub ingredient: String,
    pub quantity_per_shipment: f64,
    pub shipments_per_period: f64,
    pub frequency: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySupply {
    pub ingredient_key: String,
    pub ingredient: String,
    pub monthly_supply_qty: f64,
    pub unit: String,
    pub frequency_recognized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFlag {
    Historical,
    Sufficient,
    Shortfall,
}

impl ActionFlag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Sufficient => "sufficient",
            Self::Shortfall => "shortfall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Matched,
    Unmatched,
    /// The shipment stage did not run.
    Skipped,
}

impl MatchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledForecast {
    pub date: NaiveDate,
    pub ingredient: String,
    pub ingredient_key: Option<String>,
    pub forecasted_usage_native_unit: f64,
    pub forecasted_usage_in_shipment_unit: f64,
    pub monthly_supply_qty: Option<f64>,
    pub shipment_unit: Option<String>,
    pub shortfall_or_surplus: Option<f64>,
    pub action_flag: Option<ActionFlag>,
    pub match_status: MatchStatus,
    pub supply_suspect: bool,
}
