use larder_client::commands::forecast::{self, ForecastRunOptions};
use larder_client::commands::supply::{self, SupplyRunOptions};
use larder_client::commands::usage::{self, UsageRunOptions};
use larder_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Usage {
            sales,
            recipes,
            config,
            ..
        } => usage::run_with_options(UsageRunOptions {
            sales: sales.clone(),
            recipes: recipes.clone(),
            config_path: config.clone(),
            home_override: None,
        }),
        Commands::Supply {
            shipments, config, ..
        } => supply::run_with_options(SupplyRunOptions {
            shipments: shipments.clone(),
            config_path: config.clone(),
            home_override: None,
        }),
        Commands::Forecast {
            sales,
            recipes,
            shipments,
            config,
            output,
            ..
        } => forecast::run_with_options(ForecastRunOptions {
            sales: sales.clone(),
            recipes: recipes.clone(),
            shipments: shipments.clone(),
            config_path: config.clone(),
            output: output.clone(),
            home_override: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::dispatch;

    #[test]
    fn missing_input_files_surface_as_client_errors() {
        let cases: [&[&str]; 3] = [
            &[
                "larder",
                "usage",
                "--sales",
                "/nonexistent/larder/May_sales.csv",
                "--recipes",
                "/nonexistent/larder/recipes.csv",
                "--config",
                "/nonexistent/larder/config.toml",
            ],
            &[
                "larder",
                "supply",
                "--shipments",
                "/nonexistent/larder/shipments.csv",
                "--config",
                "/nonexistent/larder/config.toml",
            ],
            &[
                "larder",
                "forecast",
                "--sales",
                "/nonexistent/larder/May_sales.csv",
                "--recipes",
                "/nonexistent/larder/recipes.csv",
                "--config",
                "/nonexistent/larder/config.toml",
            ],
        ];

        for args in cases {
            let parsed = parse_from(args);
            assert!(parsed.is_ok());
            if let Ok(cli) = parsed {
                let response = dispatch(&cli);
                assert!(response.is_err());
                if let Err(error) = response {
                    assert_eq!(error.code, "config_invalid");
                }
            }
        }
    }
}
