use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::commands::common::{load_shipments, resolve_config, supply_rows};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::SupplyData;
use crate::pipeline::supply::normalize_shipments;

#[derive(Debug, Default)]
pub struct SupplyRunOptions<'a> {
    pub shipments: PathBuf,
    pub config_path: Option<PathBuf>,
    pub home_override: Option<&'a Path>,
}

pub fn run(shipments: &Path) -> ClientResult<SuccessEnvelope> {
    run_with_options(SupplyRunOptions {
        shipments: shipments.to_path_buf(),
        config_path: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: SupplyRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let config = resolve_config(options.config_path.as_deref(), options.home_override)?;
    let records = load_shipments(&options.shipments)?;
    let supply = normalize_shipments(&records, &config.frequency_factors);

    let data = SupplyData {
        rows: supply_rows(&supply),
        suspect_rows: supply.suspect_rows(),
        unrecognized_frequencies: supply.unrecognized_frequencies,
    };

    success("supply", data)
}
