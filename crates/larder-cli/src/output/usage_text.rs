use std::io;

use serde_json::Value;

use super::format::{
    Column, array_field, count_field, key_value_rows, number_field, plural, quantity,
    render_table, text_field,
};

pub fn render_usage(data: &Value) -> io::Result<String> {
    let summary = data.get("summary").unwrap_or(&Value::Null);
    let rows = array_field(data, "rows");

    let mut lines = vec![
        format!(
            "Ingredient usage: {} across {}.",
            plural(count_field(summary, "ingredients"), "ingredient", "ingredients"),
            plural(count_field(summary, "months"), "month", "months"),
        ),
        String::new(),
    ];
    lines.extend(key_value_rows(
        &[
            ("Sales rows read", count_field(summary, "rows_read").to_string()),
            ("Rows skipped", count_field(summary, "rows_invalid").to_string()),
            ("Sales matched", count_field(summary, "items_matched").to_string()),
            (
                "Sales dropped",
                count_field(summary, "dropped_item_count").to_string(),
            ),
            (
                "Units dropped",
                quantity(number_field(summary, "dropped_units").unwrap_or(0.0)),
            ),
        ],
        2,
    ));

    let corrections = array_field(data, "resolutions")
        .iter()
        .filter(|row| matches!(text_field(row, "kind"), "alias" | "fuzzy"))
        .map(|row| {
            vec![
                text_field(row, "input").to_string(),
                text_field(row, "resolved").to_string(),
                text_field(row, "kind").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    if !corrections.is_empty() {
        lines.push(String::new());
        lines.push("Renamed sales items:".to_string());
        lines.extend(render_table(
            &[
                Column::left("Sold as"),
                Column::left("Recipe item"),
                Column::left("Rule"),
            ],
            &corrections,
        ));
    }

    let dropped = array_field(summary, "dropped_items")
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<&str>>();
    if !dropped.is_empty() {
        lines.push(String::new());
        lines.push(format!("Items with no recipe: {}", dropped.join(", ")));
    }

    lines.push(String::new());
    if rows.is_empty() {
        lines.push("No sales joined the recipe table, so there is no usage to report.".to_string());
    } else {
        let table_rows = rows
            .iter()
            .map(|row| {
                vec![
                    text_field(row, "month").to_string(),
                    text_field(row, "ingredient").to_string(),
                    quantity(number_field(row, "total_qty_used").unwrap_or(0.0)),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(render_table(
            &[
                Column::left("Month"),
                Column::left("Ingredient"),
                Column::right("Used"),
            ],
            &table_rows,
        ));
    }

    Ok(lines.join("\n"))
}
