use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::pipeline::normalize::{NameNormalizer, NameResolution, canonical_name};
use crate::pipeline::types::{IngredientUsagePoint, RecipeRow, RecipeTable, SalesRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSummary {
    pub sales_rows: usize,
    pub items_matched: usize,
    pub dropped_items: Vec<String>,
    pub dropped_item_count: usize,
    pub dropped_units: f64,
    pub ingredients: usize,
    pub months: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UsageSeries {
    /// Sorted by ingredient, then month.
    pub points: Vec<IngredientUsagePoint>,
    pub resolutions: Vec<NameResolution>,
    pub summary: UsageSummary,
}

/// Joins sales against recipes and sums ingredient usage per month.
///
/// Sales items with no recipe row, even after name resolution, are left out
/// and reported in the summary.
pub fn aggregate_usage(
    sales: &[SalesRecord],
    recipes: &RecipeTable,
    normalizer: &NameNormalizer,
) -> UsageSeries {
    let mut resolutions: BTreeMap<String, NameResolution> = BTreeMap::new();
    let mut item_counts: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();

    for record in sales {
        let key = canonical_name(&record.item_name);
        let resolution = resolutions
            .entry(key)
            .or_insert_with_key(|name| normalizer.resolve(name));
        *item_counts
            .entry((record.month, resolution.resolved.clone()))
            .or_insert(0.0) += record.count;
    }

    let recipe_by_item = recipes
        .rows
        .iter()
        .map(|row| (row.item_name.as_str(), row))
        .collect::<HashMap<&str, &RecipeRow>>();

    let mut usage: BTreeMap<(String, NaiveDate), f64> = BTreeMap::new();
    let mut matched_items: BTreeSet<String> = BTreeSet::new();
    let mut dropped_items: BTreeSet<String> = BTreeSet::new();
    let mut dropped_units = 0.0;

    for ((month, item), count) in &item_counts {
        let Some(recipe) = recipe_by_item.get(item.as_str()) else {
            dropped_items.insert(item.clone());
            dropped_units += count;
            continue;
        };
        matched_items.insert(item.clone());

        for (ingredient, qty_per_unit) in &recipe.ingredient_qty {
            let qty = if qty_per_unit.is_finite() {
                *qty_per_unit
            } else {
                0.0
            };
            *usage.entry((ingredient.clone(), *month)).or_insert(0.0) += count * qty;
        }
    }

    if !dropped_items.is_empty() {
        tracing::warn!(
            dropped = dropped_items.len(),
            units = dropped_units,
            "sales items without a recipe row were left out of ingredient usage"
        );
    }

    let points = usage
        .into_iter()
        .map(|((ingredient, month), total)| IngredientUsagePoint {
            month,
            ingredient,
            total_qty_used: total.max(0.0),
        })
        .collect::<Vec<IngredientUsagePoint>>();

    let summary = UsageSummary {
        sales_rows: sales.len(),
        items_matched: matched_items.len(),
        dropped_item_count: dropped_items.len(),
        dropped_items: dropped_items.into_iter().collect(),
        dropped_units,
        ingredients: points
            .iter()
            .map(|point| point.ingredient.as_str())
            .collect::<BTreeSet<&str>>()
            .len(),
        months: points
            .iter()
            .map(|point| point.month)
            .collect::<BTreeSet<NaiveDate>>()
            .len(),
    };
    tracing::info!(
        points = points.len(),
        ingredients = summary.ingredients,
        months = summary.months,
        "aggregated ingredient usage"
    );

    UsageSeries {
        points,
        resolutions: resolutions.into_values().collect(),
        summary,
    }
}
