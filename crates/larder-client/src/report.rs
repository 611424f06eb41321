use std::path::Path;

use crate::contracts::types::ForecastRow;
use crate::{ClientError, ClientResult};

/// Writes the reconciled forecast table as CSV, header row included.
pub(crate) fn write_forecast_csv(path: &Path, rows: &[ForecastRow]) -> ClientResult<()> {
    let map_error = |error: csv::Error| ClientError::output_write_failed(path, &error.to_string());

    let mut writer = csv::Writer::from_path(path).map_err(map_error)?;
    for row in rows {
        writer.serialize(row).map_err(map_error)?;
    }
    writer
        .flush()
        .map_err(|error| ClientError::output_write_failed(path, &error.to_string()))?;

    tracing::info!(rows = rows.len(), path = %path.display(), "wrote forecast report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::write_forecast_csv;
    use crate::contracts::types::ForecastRow;

    fn row(action_flag: &str, supply: Option<f64>) -> ForecastRow {
        ForecastRow {
            month_label: "Jul".to_string(),
            date: "2025-07-01".to_string(),
            ingredient: "Flour (g)".to_string(),
            forecasted_usage_native: 4535.92,
            shipment_unit: supply.map(|_| "lbs".to_string()),
            forecasted_usage_in_shipment_unit: 10.0,
            monthly_supply_qty: supply,
            shortfall_or_surplus: supply.map(|value| value - 10.0),
            action_flag: action_flag.to_string(),
            match_status: "matched".to_string(),
            supply_suspect: false,
        }
    }

    #[test]
    fn writes_header_and_blank_cells_for_missing_supply() {
        let dir = tempfile::Builder::new().prefix("larder-report").tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let path = dir.path().join("forecast.csv");
            let written = write_forecast_csv(
                &path,
                &[row("shortfall", Some(8.0)), row("unclassified", None)],
            );
            assert!(written.is_ok());

            let content = fs::read_to_string(&path).unwrap_or_default();
            let lines = content.lines().collect::<Vec<&str>>();
            assert_eq!(
                lines[0],
                "month_label,date,ingredient,forecasted_usage_native,shipment_unit,\
forecasted_usage_in_shipment_unit,monthly_supply_qty,shortfall_or_surplus,action_flag,\
match_status,supply_suspect"
            );
            assert_eq!(lines.len(), 3);
            assert!(lines[1].contains(",lbs,10.0,8.0,-2.0,shortfall,"));
            assert!(lines[2].contains(",,10.0,,,unclassified,"));
        }
    }

    #[test]
    fn unwritable_path_maps_to_output_error() {
        let written = write_forecast_csv(
            std::path::Path::new("/nonexistent/larder/forecast.csv"),
            &[row("historical", None)],
        );
        assert!(written.is_err());
        if let Err(error) = written {
            assert_eq!(error.code, "output_write_failed");
        }
    }
}
