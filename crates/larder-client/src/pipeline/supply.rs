use std::collections::{BTreeSet, HashMap};

use crate::config::FrequencyFactors;
use crate::pipeline::types::{MonthlySupply, ShipmentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Unrecognized,
}

impl Frequency {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "weekly" => Self::Weekly,
            "biweekly" | "bi-weekly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            _ => Self::Unrecognized,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Shipments per period to shipments per month.
    pub fn factor(self, factors: &FrequencyFactors) -> f64 {
        match self {
            Self::Weekly => factors.weekly,
            Self::Biweekly => factors.biweekly,
            Self::Monthly => factors.monthly,
            Self::Unrecognized => 0.0,
        }
    }
}

/// Join key on the shipment side: lowercase, no spaces, `+` spelled `and`.
pub fn shipment_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|character| !character.is_whitespace())
        .collect::<String>()
        .replace('+', "and")
}

pub fn monthly_supply(record: &ShipmentRecord, factors: &FrequencyFactors) -> f64 {
    record.quantity_per_shipment
        * record.shipments_per_period
        * Frequency::parse(&record.frequency).factor(factors)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplyTable {
    /// In shipment-table order.
    pub rows: Vec<MonthlySupply>,
    /// Distinct raw frequency strings that matched no cadence.
    pub unrecognized_frequencies: Vec<String>,
}

impl SupplyTable {
    /// First row per key; later duplicates are ignored for joins.
    pub fn by_key(&self) -> HashMap<&str, &MonthlySupply> {
        let mut index = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            index.entry(row.ingredient_key.as_str()).or_insert(row);
        }
        index
    }

    pub fn suspect_rows(&self) -> usize {
        self.rows.iter().filter(|row| !row.frequency_recognized).count()
    }
}

pub fn normalize_shipments(records: &[ShipmentRecord], factors: &FrequencyFactors) -> SupplyTable {
    let mut seen_keys: BTreeSet<String> = BTreeSet::new();
    let mut unrecognized: BTreeSet<String> = BTreeSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let key = shipment_key(&record.ingredient);
        let frequency = Frequency::parse(&record.frequency);
        if frequency == Frequency::Unrecognized {
            tracing::warn!(
                ingredient = %record.ingredient,
                frequency = %record.frequency,
                "unrecognized shipment frequency; monthly supply is zero"
            );
            unrecognized.insert(record.frequency.trim().to_string());
        }
        if !seen_keys.insert(key.clone()) {
            tracing::warn!(
                key = %key,
                "duplicate shipment key; the first row is used for matching"
            );
        }

        rows.push(MonthlySupply {
            ingredient_key: key,
            ingredient: record.ingredient.trim().to_string(),
            monthly_supply_qty: monthly_supply(record, factors),
            unit: record.unit.trim().to_string(),
            frequency_recognized: frequency != Frequency::Unrecognized,
        });
    }

    tracing::info!(
        rows = rows.len(),
        unrecognized = unrecognized.len(),
        "normalized shipment capacity"
    );
    SupplyTable {
        rows,
        unrecognized_frequencies: unrecognized.into_iter().collect(),
    }
}
