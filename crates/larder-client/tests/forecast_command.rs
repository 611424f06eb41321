mod support;

use std::fs;

use larder_client::commands::forecast::{self, ForecastRunOptions};
use support::table_testkit::{payload, rows, temp_workspace, write_fixture, write_table};

#[test]
fn forecast_reconciles_every_ingredient_against_shipments() {
    let temp = temp_workspace("larder-forecast");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let fixture = write_fixture(dir.path());
        assert!(fixture.is_ok());
        if let Ok(fixture) = fixture {
            let value = payload(forecast::run_with_options(ForecastRunOptions {
                sales: fixture.sales,
                recipes: fixture.recipes,
                shipments: Some(fixture.shipments),
                home_override: Some(&home),
                ..ForecastRunOptions::default()
            }));

            let data = &value["data"];
            assert_eq!(data["shipment_stage"], "applied");
            assert_eq!(data["policy_version"], "forecast/v1");
            assert_eq!(data["last_history_month"], "2025-06-01");
            assert_eq!(data["ingredients_forecast"], 4);
            assert_eq!(data["failures"].as_array().map(Vec::len), Some(0));
            assert_eq!(data["reconciliation"]["unmatched_rows"], 0);
            assert!(data["run_id"].as_str().unwrap_or_default().starts_with("run_"));

            let rows = rows(&value);
            assert_eq!(rows.len(), 4 * 5);
            for row in &rows {
                let future = row["date"].as_str().unwrap_or_default() > "2025-06-01";
                let flag = row["action_flag"].as_str().unwrap_or_default();
                if future {
                    assert!(flag == "shortfall" || flag == "sufficient", "row {row}");
                } else {
                    assert_eq!(flag, "historical");
                }
                assert!(row["forecasted_usage_native"].as_f64().unwrap_or(-1.0) >= 0.0);
                assert_eq!(row["match_status"], "matched");
            }

            let green_onion = rows
                .iter()
                .filter(|row| row["ingredient"] == "Green Onion (g)")
                .collect::<Vec<_>>();
            assert_eq!(green_onion.len(), 5);
            assert!(green_onion.iter().all(|row| row["supply_suspect"] == true));
            assert_eq!(green_onion[4]["action_flag"], "shortfall");
        }
    }
}

#[test]
fn forecast_converts_grams_to_pounds_for_pound_shipments() {
    let temp = temp_workspace("larder-forecast-units");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let fixture = write_fixture(dir.path());
        assert!(fixture.is_ok());
        if let Ok(fixture) = fixture {
            let value = payload(forecast::run_with_options(ForecastRunOptions {
                sales: fixture.sales,
                recipes: fixture.recipes,
                shipments: Some(fixture.shipments),
                home_override: Some(&home),
                ..ForecastRunOptions::default()
            }));

            for row in rows(&value) {
                let native = row["forecasted_usage_native"].as_f64().unwrap_or_default();
                let converted = row["forecasted_usage_in_shipment_unit"]
                    .as_f64()
                    .unwrap_or_default();
                if row["ingredient"] == "Egg(count)" {
                    assert!((native - converted).abs() < 1e-9);
                } else {
                    assert!((native / 453.592 - converted).abs() < 1e-9);
                }
            }
        }
    }
}

#[test]
fn forecast_without_shipments_skips_reconciliation_and_writes_csv() {
    let temp = temp_workspace("larder-forecast-csv");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let fixture = write_fixture(dir.path());
        assert!(fixture.is_ok());
        if let Ok(fixture) = fixture {
            let output = dir.path().join("report.csv");
            let value = payload(forecast::run_with_options(ForecastRunOptions {
                sales: fixture.sales,
                recipes: fixture.recipes,
                output: Some(output.clone()),
                home_override: Some(&home),
                ..ForecastRunOptions::default()
            }));

            assert_eq!(value["data"]["shipment_stage"], "skipped");
            assert!(rows(&value).iter().all(|row| {
                row["match_status"] == "skipped" && row["action_flag"] == "unclassified"
            }));

            let written = fs::read_to_string(&output).unwrap_or_default();
            let lines = written.lines().collect::<Vec<&str>>();
            assert_eq!(lines.len(), 1 + 4 * 5);
            assert!(lines[0].starts_with("month_label,date,ingredient,forecasted_usage_native"));
        }
    }
}

#[test]
fn forecast_horizon_follows_config_file() {
    let temp = temp_workspace("larder-forecast-config");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let fixture = write_fixture(dir.path());
        let config = write_table(&home, "config.toml", "forecast_horizon = 1\n");
        assert!(fixture.is_ok() && config.is_ok());
        if let Ok(fixture) = fixture {
            let value = payload(forecast::run_with_options(ForecastRunOptions {
                sales: fixture.sales,
                recipes: fixture.recipes,
                home_override: Some(&home),
                ..ForecastRunOptions::default()
            }));
            assert_eq!(value["data"]["settings"]["forecast_horizon"], 1);
            assert_eq!(rows(&value).len(), 4 * 3);
        }
    }
}

#[test]
fn forecast_with_no_joinable_sales_is_empty_not_an_error() {
    let temp = temp_workspace("larder-forecast-empty");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let sales = write_table(
            dir.path(),
            "sales.csv",
            "month,item_name,count\nmay,gift card,2\n",
        );
        let recipes = write_table(
            dir.path(),
            "recipes.csv",
            "item_name,Flour (g)\nbeef bowl,100\n",
        );
        assert!(sales.is_ok() && recipes.is_ok());
        if let (Ok(sales), Ok(recipes)) = (sales, recipes) {
            let value = payload(forecast::run_with_options(ForecastRunOptions {
                sales: vec![sales],
                recipes,
                home_override: Some(&home),
                ..ForecastRunOptions::default()
            }));
            assert!(rows(&value).is_empty());
            assert_eq!(value["data"]["usage_summary"]["dropped_item_count"], 1);
            assert_eq!(value["data"]["last_history_month"], serde_json::Value::Null);
        }
    }
}

#[test]
fn forecast_reports_unreadable_inputs() {
    let temp = temp_workspace("larder-forecast-missing");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let result = forecast::run_with_options(ForecastRunOptions {
            sales: vec![dir.path().join("May_sales.csv")],
            recipes: dir.path().join("missing-recipes.csv"),
            home_override: Some(&home),
            ..ForecastRunOptions::default()
        });
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "input_unreadable");
            assert!(error.message.contains("missing-recipes.csv"));
        }
    }
}
