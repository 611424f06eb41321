use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extended help shown after `larder forecast --help`.
pub const FORECAST_AFTER_HELP: &str = "\
Input Tables:
  Sales (--sales, repeatable):
    Either one consolidated CSV with `month`, `item_name` and `count` columns,
    or one export per month named `<Month>_<anything>.csv`, e.g.
    `May_Data_Matrix.csv`. Exports may call the item column `group`.
    Rows with a non-positive or non-numeric count are dropped.

  Recipes (--recipes):
    One row per menu item. `item_name` plus one column per ingredient,
    headed with its unit, e.g. `Flour (g)` or `Egg(count)`.
    Empty or non-numeric cells count as zero.

  Shipments (--shipments, optional):
    `ingredient`, `quantity_per_shipment`, `shipments_per_period`
    (or `number_of_shipments`), `frequency` (weekly, biweekly, monthly)
    and `unit` (or `unit_of_shipment`). Header case and spacing are ignored.
    Without shipments the report lists forecasts only.

Configuration (--config, or $LARDER_HOME/config.toml):
  forecast_horizon = 3        clip_factor = 5.0
  trend_flexibility = 0.01    fuzzy_threshold = 70.0
  grams_per_pound = 453.592   default_year = 2025
  [frequency_factors]
  weekly = 4.33  biweekly = 2.16  monthly = 1.0

Logging:
  Diagnostics go to stderr. Set RUST_LOG (e.g. RUST_LOG=larder_client=info)
  to see per-stage summaries.
";

/// Extended help shown after `larder supply --help`.
pub const SUPPLY_AFTER_HELP: &str = "\
Shipment Columns:
  ingredient              Name as it appears on the supplier sheet
  quantity_per_shipment   Units delivered per shipment
  shipments_per_period    Deliveries per period (alias: number_of_shipments)
  frequency               weekly, biweekly or monthly
  unit                    lbs, eggs, rolls, pieces, ... (alias: unit_of_shipment)

  Header case and spacing are ignored. Monthly supply is
  quantity x shipments x frequency factor (weekly 4.33, biweekly 2.16,
  monthly 1.0). Any other frequency counts as zero and is reported.
";

#[derive(Debug, Parser)]
#[command(
    name = "larder",
    version,
    about = "ingredient demand forecasting from point-of-sale exports",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Turn sales exports into monthly ingredient usage
    Usage {
        /// Sales CSV(s): one consolidated table or one export per month
        #[arg(long, required = true, num_args = 1..)]
        sales: Vec<PathBuf>,
        /// Recipe matrix CSV
        #[arg(long)]
        recipes: PathBuf,
        /// Pipeline settings TOML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },
    /// Convert shipment schedules into monthly supply capacity
    #[command(after_help = SUPPLY_AFTER_HELP)]
    Supply {
        /// Shipment schedule CSV
        #[arg(long)]
        shipments: PathBuf,
        /// Pipeline settings TOML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },
    /// Forecast ingredient usage and flag shipment shortfalls
    #[command(after_help = FORECAST_AFTER_HELP)]
    Forecast {
        /// Sales CSV(s): one consolidated table or one export per month
        #[arg(long, required = true, num_args = 1..)]
        sales: Vec<PathBuf>,
        /// Recipe matrix CSV
        #[arg(long)]
        recipes: PathBuf,
        /// Shipment schedule CSV; omit to skip reconciliation
        #[arg(long)]
        shipments: Option<PathBuf>,
        /// Pipeline settings TOML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write the report as CSV to this path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit JSON output
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Usage { .. } => "usage",
            Self::Supply { .. } => "supply",
            Self::Forecast { .. } => "forecast",
        }
    }

    pub fn wants_json(&self) -> bool {
        match self {
            Self::Usage { json, .. } | Self::Supply { json, .. } | Self::Forecast { json, .. } => {
                *json
            }
        }
    }
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
