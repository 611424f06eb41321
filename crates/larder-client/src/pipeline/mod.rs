//! Sales to ingredient usage to forecast to shipment reconciliation.
//!
//! Stages are plain functions over owned rows. [`PipelineContext`] carries the
//! reference tables and configuration for one run; nothing here reads global
//! state.

pub mod aggregate;
pub mod date;
pub mod forecaster;
pub mod normalize;
pub mod reconcile;
pub mod supply;
pub mod trend;
pub mod types;

use crate::config::PipelineConfig;
use crate::pipeline::aggregate::{UsageSeries, aggregate_usage};
use crate::pipeline::forecaster::{ForecastRun, ForecastSettings, forecast_all};
use crate::pipeline::normalize::{NameNormalizer, alias_rules_with};
use crate::pipeline::reconcile::{Reconciliation, forecast_only_rows, reconcile};
use crate::pipeline::supply::{SupplyTable, normalize_shipments};
use crate::pipeline::types::{RecipeTable, SalesRecord, ShipmentRecord};

#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub recipes: RecipeTable,
    /// `None` skips the shipment stage.
    pub shipments: Option<Vec<ShipmentRecord>>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub usage: UsageSeries,
    pub forecast: ForecastRun,
    pub supply: Option<SupplyTable>,
    pub reconciliation: Reconciliation,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, recipes: RecipeTable) -> Self {
        Self {
            config,
            recipes,
            shipments: None,
        }
    }

    pub fn with_shipments(mut self, shipments: Vec<ShipmentRecord>) -> Self {
        self.shipments = Some(shipments);
        self
    }

    pub fn normalizer(&self) -> NameNormalizer {
        NameNormalizer::new(
            self.recipes.item_names(),
            alias_rules_with(&self.config.aliases),
            self.config.fuzzy_threshold,
        )
    }

    pub fn usage(&self, sales: &[SalesRecord]) -> UsageSeries {
        aggregate_usage(sales, &self.recipes, &self.normalizer())
    }

    pub fn run(&self, sales: &[SalesRecord]) -> PipelineOutput {
        let usage = self.usage(sales);
        let forecast = forecast_all(&usage.points, &ForecastSettings::from_config(&self.config));

        let supply = self
            .shipments
            .as_deref()
            .map(|records| normalize_shipments(records, &self.config.frequency_factors));
        let reconciliation = match &supply {
            Some(table) => reconcile(&forecast, table, self.config.grams_per_pound),
            None => forecast_only_rows(&forecast),
        };

        PipelineOutput {
            usage,
            forecast,
            supply,
            reconciliation,
        }
    }
}
