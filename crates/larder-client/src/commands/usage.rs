use std::path::{Path, PathBuf};

use crate::commands::common::{
    load_recipes, resolution_rows, resolve_config, usage_rows, usage_summary,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::UsageData;
use crate::import::input::load_sales;
use crate::pipeline::PipelineContext;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct UsageRunOptions<'a> {
    pub sales: Vec<PathBuf>,
    pub recipes: PathBuf,
    pub config_path: Option<PathBuf>,
    pub home_override: Option<&'a Path>,
}

pub fn run(sales: &[PathBuf], recipes: &Path) -> ClientResult<SuccessEnvelope> {
    run_with_options(UsageRunOptions {
        sales: sales.to_vec(),
        recipes: recipes.to_path_buf(),
        config_path: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: UsageRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    if options.sales.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pass at least one sales CSV with --sales.",
            Some("usage"),
        ));
    }

    let config = resolve_config(options.config_path.as_deref(), options.home_override)?;
    let recipes = load_recipes(&options.recipes)?;
    let sales = load_sales(&options.sales, config.default_year)?;

    let context = PipelineContext::new(config, recipes);
    let usage = context.usage(&sales.records);

    let data = UsageData {
        summary: usage_summary(&sales, &usage),
        resolutions: resolution_rows(&usage),
        rows: usage_rows(&usage),
    };

    success("usage", data)
}
