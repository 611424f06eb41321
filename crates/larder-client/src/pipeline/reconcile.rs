use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::pipeline::forecaster::ForecastRun;
use crate::pipeline::supply::{SupplyTable, shipment_key};
use crate::pipeline::types::{ActionFlag, ForecastPoint, MatchStatus, ReconciledForecast};

/// Maps a forecast label to a shipment key when any pattern occurs in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRule {
    pub patterns: &'static [&'static str],
    pub key: &'static str,
}

impl KeyRule {
    pub const fn new(patterns: &'static [&'static str], key: &'static str) -> Self {
        Self { patterns, key }
    }

    fn matches(&self, lowered_label: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| lowered_label.contains(pattern))
    }
}

/// Checked in order; specific cuts come before the generic words they contain.
pub const INGREDIENT_KEY_RULES: [KeyRule; 15] = [
    KeyRule::new(&["braised beef"], "beef"),
    KeyRule::new(&["braised chicken"], "chicken"),
    KeyRule::new(&["braised pork"], "pork"),
    KeyRule::new(&["ramen (count)"], "ramen"),
    KeyRule::new(&["rice noodles"], "rice noodles"),
    KeyRule::new(&["flour"], "flour"),
    KeyRule::new(&["tapioca starch"], "tapioca starch"),
    KeyRule::new(&["rice(g)"], "rice"),
    KeyRule::new(&["green onion"], "green onion"),
    KeyRule::new(&["white onion"], "white onion"),
    KeyRule::new(&["cilantro"], "cilantro"),
    KeyRule::new(&["egg(count)"], "egg"),
    KeyRule::new(&["peas(g)", "carrot(g)"], "peasandcarrot"),
    KeyRule::new(&["boychoy(g)"], "bokchoy"),
    KeyRule::new(&["chicken wings"], "chicken wings"),
];

const POUND_UNITS: [&str; 3] = ["lbs", "lb", "pounds"];
const COUNTING_UNITS: [&str; 4] = ["eggs", "rolls", "pieces", "whole onion"];

/// Shipment-side key for a forecast ingredient label.
pub fn ingredient_key(label: &str) -> String {
    let lowered = label.to_lowercase();
    match INGREDIENT_KEY_RULES.iter().find(|rule| rule.matches(&lowered)) {
        Some(rule) => shipment_key(rule.key),
        None => shipment_key(lowered.split('(').next().unwrap_or_default()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeUnit {
    Grams,
    Count,
    Unknown,
}

impl NativeUnit {
    /// Reads the unit annotation of a recipe column such as `Flour (g)`.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("g)") {
            Self::Grams
        } else if lowered.contains("count)") {
            Self::Count
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentUnit {
    Pounds,
    Counting,
    Other,
}

impl ShipmentUnit {
    pub fn parse(unit: &str) -> Self {
        let lowered = unit.trim().to_lowercase();
        if POUND_UNITS.contains(&lowered.as_str()) {
            Self::Pounds
        } else if COUNTING_UNITS.contains(&lowered.as_str()) {
            Self::Counting
        } else {
            Self::Other
        }
    }
}

pub fn grams_to_pounds(grams: f64, grams_per_pound: f64) -> f64 {
    grams / grams_per_pound
}

pub fn pounds_to_grams(pounds: f64, grams_per_pound: f64) -> f64 {
    pounds * grams_per_pound
}

/// Expresses native-unit usage in the shipment's unit where a conversion is known.
pub fn convert_usage(
    quantity: f64,
    native: NativeUnit,
    shipment_unit: ShipmentUnit,
    grams_per_pound: f64,
) -> f64 {
    match (native, shipment_unit) {
        (NativeUnit::Grams, ShipmentUnit::Pounds) => grams_to_pounds(quantity, grams_per_pound),
        (NativeUnit::Count, ShipmentUnit::Counting) => quantity,
        _ => quantity,
    }
}

/// Only months strictly after the last history month get a supply verdict.
pub fn classify(
    date: NaiveDate,
    shortfall_or_surplus: f64,
    last_history_month: Option<NaiveDate>,
) -> ActionFlag {
    match last_history_month {
        Some(last) if date > last => {
            if shortfall_or_surplus < 0.0 {
                ActionFlag::Shortfall
            } else {
                ActionFlag::Sufficient
            }
        }
        _ => ActionFlag::Historical,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationSummary {
    pub rows: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    /// Distinct forecast ingredients with no shipment row, sorted.
    pub unmatched_ingredients: Vec<String>,
    pub suspect_supply_rows: usize,
    pub shortfall_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub rows: Vec<ReconciledForecast>,
    pub summary: ReconciliationSummary,
}

/// Left-joins every forecast point onto monthly supply and flags shortfalls.
pub fn reconcile(
    forecast: &ForecastRun,
    supply: &SupplyTable,
    grams_per_pound: f64,
) -> Reconciliation {
    let index = supply.by_key();
    let mut unmatched_ingredients: BTreeSet<String> = BTreeSet::new();

    let rows = forecast
        .points
        .iter()
        .map(|point| {
            let key = ingredient_key(&point.ingredient);
            let Some(row) = index.get(key.as_str()) else {
                unmatched_ingredients.insert(point.ingredient.clone());
                return ReconciledForecast {
                    ingredient_key: Some(key),
                    match_status: MatchStatus::Unmatched,
                    ..unreconciled(point)
                };
            };

            let in_shipment_unit = convert_usage(
                point.forecasted_usage,
                NativeUnit::from_label(&point.ingredient),
                ShipmentUnit::parse(&row.unit),
                grams_per_pound,
            );
            let balance = row.monthly_supply_qty - in_shipment_unit;
            ReconciledForecast {
                date: point.date,
                ingredient: point.ingredient.clone(),
                ingredient_key: Some(key),
                forecasted_usage_native_unit: point.forecasted_usage,
                forecasted_usage_in_shipment_unit: in_shipment_unit,
                monthly_supply_qty: Some(row.monthly_supply_qty),
                shipment_unit: Some(row.unit.clone()),
                shortfall_or_surplus: Some(balance),
                action_flag: Some(classify(point.date, balance, forecast.last_history_month)),
                match_status: MatchStatus::Matched,
                supply_suspect: !row.frequency_recognized,
            }
        })
        .collect::<Vec<ReconciledForecast>>();

    for ingredient in &unmatched_ingredients {
        tracing::warn!(ingredient = %ingredient, "no shipment row matches forecast ingredient");
    }

    let summary = ReconciliationSummary {
        rows: rows.len(),
        matched_rows: count_rows(&rows, |row| row.match_status == MatchStatus::Matched),
        unmatched_rows: count_rows(&rows, |row| row.match_status == MatchStatus::Unmatched),
        unmatched_ingredients: unmatched_ingredients.into_iter().collect(),
        suspect_supply_rows: count_rows(&rows, |row| row.supply_suspect),
        shortfall_rows: count_rows(&rows, |row| row.action_flag == Some(ActionFlag::Shortfall)),
    };
    tracing::info!(
        rows = summary.rows,
        unmatched = summary.unmatched_rows,
        shortfalls = summary.shortfall_rows,
        "reconciled forecast against shipments"
    );

    Reconciliation { rows, summary }
}

/// Report rows for a run without shipment data.
pub fn forecast_only_rows(forecast: &ForecastRun) -> Reconciliation {
    let rows = forecast
        .points
        .iter()
        .map(unreconciled)
        .collect::<Vec<ReconciledForecast>>();
    Reconciliation {
        summary: ReconciliationSummary {
            rows: rows.len(),
            ..ReconciliationSummary::default()
        },
        rows,
    }
}

fn unreconciled(point: &ForecastPoint) -> ReconciledForecast {
    ReconciledForecast {
        date: point.date,
        ingredient: point.ingredient.clone(),
        ingredient_key: None,
        forecasted_usage_native_unit: point.forecasted_usage,
        forecasted_usage_in_shipment_unit: point.forecasted_usage,
        monthly_supply_qty: None,
        shipment_unit: None,
        shortfall_or_surplus: None,
        action_flag: None,
        match_status: MatchStatus::Skipped,
        supply_suspect: false,
    }
}

fn count_rows(
    rows: &[ReconciledForecast],
    predicate: impl Fn(&ReconciledForecast) -> bool,
) -> usize {
    rows.iter().filter(|row| predicate(*row)).count()
}
