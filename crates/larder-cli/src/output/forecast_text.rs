use std::io;

use serde_json::Value;

use super::format::{
    Column, array_field, count_field, key_value_rows, optional_quantity, quantity, render_table,
    text_field,
};

pub fn render_forecast(data: &Value) -> io::Result<String> {
    let summary = data.get("usage_summary").unwrap_or(&Value::Null);
    let reconciliation = data.get("reconciliation").unwrap_or(&Value::Null);
    let settings = data.get("settings").unwrap_or(&Value::Null);
    let shipments_applied = text_field(data, "shipment_stage") == "applied";

    let mut lines = vec![
        format!(
            "Forecast {} for {} ingredients.",
            text_field(data, "run_id"),
            count_field(data, "ingredients_forecast")
        ),
        String::new(),
    ];

    let last_month = data
        .get("last_history_month")
        .and_then(Value::as_str)
        .unwrap_or("none");
    let mut entries = vec![
        ("Last sales month", last_month.to_string()),
        (
            "Horizon",
            format!("{} months", count_field(settings, "forecast_horizon")),
        ),
        ("Sales rows read", count_field(summary, "rows_read").to_string()),
        (
            "Sales dropped",
            count_field(summary, "dropped_item_count").to_string(),
        ),
    ];
    if shipments_applied {
        entries.push((
            "Shortfall rows",
            count_field(reconciliation, "shortfall_rows").to_string(),
        ));
        entries.push((
            "Unmatched rows",
            count_field(reconciliation, "unmatched_rows").to_string(),
        ));
    } else {
        entries.push(("Shipments", "not provided".to_string()));
    }
    lines.extend(key_value_rows(&entries, 2));

    let failures = array_field(data, "failures");
    if !failures.is_empty() {
        lines.push(String::new());
        lines.push("Ingredients that could not be forecast:".to_string());
        for failure in failures {
            lines.push(format!(
                "  {}: {}",
                text_field(failure, "ingredient"),
                text_field(failure, "reason")
            ));
        }
    }

    let unmatched = array_field(reconciliation, "unmatched_ingredients")
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<&str>>();
    if shipments_applied && !unmatched.is_empty() {
        lines.push(String::new());
        lines.push(format!("No shipment row for: {}", unmatched.join(", ")));
    }

    let rows = array_field(data, "rows");
    lines.push(String::new());
    if rows.is_empty() {
        lines.push(
            "No usage history joined the recipe table, so nothing was forecast.".to_string(),
        );
    } else {
        let table_rows = rows.iter().map(table_row).collect::<Vec<Vec<String>>>();
        lines.extend(render_table(
            &[
                Column::left("Month"),
                Column::left("Ingredient"),
                Column::right("Forecast"),
                Column::left("Unit"),
                Column::right("Supply"),
                Column::right("Balance"),
                Column::left("Flag"),
            ],
            &table_rows,
        ));
    }

    if let Some(path) = data.get("output_path").and_then(Value::as_str) {
        lines.push(String::new());
        lines.push(format!("Report written to {path}"));
    }

    Ok(lines.join("\n"))
}

fn table_row(row: &Value) -> Vec<String> {
    let converted = row
        .get("forecasted_usage_in_shipment_unit")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let mut flag = text_field(row, "action_flag").to_string();
    if row
        .get("supply_suspect")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        flag.push_str(" (suspect supply)");
    }

    vec![
        text_field(row, "date").to_string(),
        text_field(row, "ingredient").to_string(),
        quantity(converted),
        row.get("shipment_unit")
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string(),
        optional_quantity(row.get("monthly_supply_qty").and_then(Value::as_f64)),
        optional_quantity(row.get("shortfall_or_surplus").and_then(Value::as_f64)),
        flag,
    ]
}
