use std::io;

use serde_json::Value;

use super::format::{Column, array_field, count_field, quantity, render_table, text_field};

pub fn render_supply(data: &Value) -> io::Result<String> {
    let rows = array_field(data, "rows");
    let heading = format!("Monthly supply for {} shipment rows.", rows.len());
    let mut lines = vec![heading];

    if !rows.is_empty() {
        lines.push(String::new());
        let table_rows = rows
            .iter()
            .map(|row| {
                let recognized = row
                    .get("frequency_recognized")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                vec![
                    text_field(row, "ingredient").to_string(),
                    quantity(
                        row.get("monthly_supply_qty")
                            .and_then(Value::as_f64)
                            .unwrap_or(0.0),
                    ),
                    text_field(row, "unit").to_string(),
                    if recognized { String::new() } else { "suspect".to_string() },
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(render_table(
            &[
                Column::left("Ingredient"),
                Column::right("Per month"),
                Column::left("Unit"),
                Column::left("Note"),
            ],
            &table_rows,
        ));
    }

    let unrecognized = array_field(data, "unrecognized_frequencies")
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<&str>>();
    if !unrecognized.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{} rows use an unrecognized frequency ({}) and count as zero supply.",
            count_field(data, "suspect_rows"),
            unrecognized.join(", ")
        ));
        lines.push("Use weekly, biweekly or monthly.".to_string());
    }

    Ok(lines.join("\n"))
}
