mod support;

use larder_client::commands::supply::{self, SupplyRunOptions};
use support::table_testkit::{SHIPMENTS_CSV, payload, rows, temp_workspace, write_table};

#[test]
fn supply_converts_cadence_to_monthly_capacity() {
    let temp = temp_workspace("larder-supply");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let shipments = write_table(dir.path(), "shipments.csv", SHIPMENTS_CSV);
        assert!(shipments.is_ok());
        if let Ok(shipments) = shipments {
            let value = payload(supply::run_with_options(SupplyRunOptions {
                shipments,
                config_path: None,
                home_override: Some(&home),
            }));

            let rows = rows(&value);
            assert_eq!(rows.len(), 4);
            assert_eq!(rows[0]["ingredient_key"], "beef");
            let beef = rows[0]["monthly_supply_qty"].as_f64().unwrap_or_default();
            assert!((beef - 40.0 * 4.33).abs() < 1e-9);
            let flour = rows[1]["monthly_supply_qty"].as_f64().unwrap_or_default();
            assert!((flour - 50.0 * 2.0 * 2.16).abs() < 1e-9);

            assert_eq!(rows[3]["ingredient_key"], "greenonion");
            assert_eq!(rows[3]["monthly_supply_qty"], 0.0);
            assert_eq!(rows[3]["frequency_recognized"], false);
            assert_eq!(value["data"]["suspect_rows"], 1);
            assert_eq!(value["data"]["unrecognized_frequencies"][0], "every other day");
        }
    }
}

#[test]
fn supply_honours_configured_frequency_factors() {
    let temp = temp_workspace("larder-supply-config");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let shipments = write_table(dir.path(), "shipments.csv", SHIPMENTS_CSV);
        let config = write_table(dir.path(), "larder.toml", "[frequency_factors]\nweekly = 4.0\n");
        assert!(shipments.is_ok() && config.is_ok());
        if let (Ok(shipments), Ok(config)) = (shipments, config) {
            let value = payload(supply::run_with_options(SupplyRunOptions {
                shipments,
                config_path: Some(config),
                home_override: Some(&home),
            }));
            assert_eq!(rows(&value)[0]["monthly_supply_qty"], 160.0);
        }
    }
}

#[test]
fn supply_rejects_tables_missing_required_columns() {
    let temp = temp_workspace("larder-supply-schema");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let shipments = write_table(dir.path(), "shipments.csv", "ingredient,unit\nBeef,lbs\n");
        assert!(shipments.is_ok());
        if let Ok(shipments) = shipments {
            let result = supply::run_with_options(SupplyRunOptions {
                shipments,
                config_path: None,
                home_override: Some(&home),
            });
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(error.code, "shipment_schema_mismatch");
                let data = error.data.unwrap_or_default();
                assert_eq!(data["actual_headers"][0], "ingredient");
            }
        }
    }
}
