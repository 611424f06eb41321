use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const TABLE_HELP_COMMAND: &str = "larder forecast --help";
pub(crate) const TABLE_HELP_SECTION_TITLE: &str = "Input Tables";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_table_help_data(self, data: Value) -> Self {
        self.with_data(merge_table_help_data(data))
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `larder {cmd} --help` for usage."),
            None => "Run `larder --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn input_unreadable(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "input_unreadable",
            &format!("Could not read input table `{location}`: {detail}"),
            vec![
                "Verify the path exists and is readable.".to_string(),
                "Pass CSV exports with a header row.".to_string(),
            ],
        )
        .with_table_help_data(json!({
            "path": location,
        }))
    }

    pub fn empty_table(table: &str) -> Self {
        Self::new(
            "empty_table",
            &format!("The {table} table is empty."),
            vec![format!(
                "Provide a {table} CSV with a header row and at least one data row."
            )],
        )
        .with_table_help_data(json!({
            "table": table,
        }))
    }

    pub fn malformed_table(table: &str, detail: &str) -> Self {
        Self::new(
            "malformed_table",
            &format!("The {table} table could not be parsed: {detail}"),
            vec![
                "Check that every row has the same number of columns as the header.".to_string(),
                "Save the export as UTF-8 CSV.".to_string(),
            ],
        )
        .with_table_help_data(json!({
            "table": table,
        }))
    }

    pub fn sales_schema_mismatch(actual_headers: Vec<String>) -> Self {
        Self::new(
            "sales_schema_mismatch",
            "Sales CSV headers do not include an item name and a count column.",
            vec![
                "Include an `item_name` (or `group`) column and a `count` column.".to_string(),
                "Include a `month` column, or pass one export per month named `<Month>_*.csv`."
                    .to_string(),
            ],
        )
        .with_table_help_data(json!({
            "required_headers": ["item_name|group", "count"],
            "optional_headers": ["month"],
            "actual_headers": actual_headers,
        }))
    }

    pub fn recipe_schema_mismatch(actual_headers: Vec<String>) -> Self {
        Self::new(
            "recipe_schema_mismatch",
            "Recipe CSV must have an `item_name` column and at least one ingredient column.",
            vec![
                "Use one row per menu item and one column per ingredient.".to_string(),
                "Name ingredient columns with their unit, e.g. `Flour (g)` or `Egg(count)`."
                    .to_string(),
            ],
        )
        .with_table_help_data(json!({
            "required_headers": ["item_name"],
            "actual_headers": actual_headers,
        }))
    }

    pub fn shipment_schema_mismatch(
        required_headers: Vec<String>,
        actual_headers: Vec<String>,
    ) -> Self {
        Self::new(
            "shipment_schema_mismatch",
            "Shipment CSV headers do not satisfy the shipment schema.",
            vec![
                "Include every required header; header case and spacing are ignored.".to_string(),
                "Run `larder supply --help` to review the shipment columns.".to_string(),
            ],
        )
        .with_table_help_data(json!({
            "required_headers": required_headers,
            "actual_headers": actual_headers,
        }))
    }

    pub fn config_invalid(path: Option<&Path>, detail: &str) -> Self {
        let location = path
            .map(|value| value.display().to_string())
            .unwrap_or_else(|| "<defaults>".to_string());
        Self::new(
            "config_invalid",
            &format!("Pipeline configuration `{location}` is invalid: {detail}"),
            vec![
                "Fix the listed setting or remove it to use the default.".to_string(),
                "Settings use TOML, e.g. `clip_factor = 5.0`.".to_string(),
            ],
        )
        .with_data(json!({
            "config_path": location,
        }))
    }

    pub fn output_write_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "output_write_failed",
            &format!("Could not write report to `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or choose another --output path."
            )],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }
}

fn merge_table_help_data(mut data: Value) -> Value {
    if !data.is_object() {
        data = json!({});
    }

    if let Some(object) = data.as_object_mut() {
        object.insert(
            "help_command".to_string(),
            Value::String(TABLE_HELP_COMMAND.to_string()),
        );
        object.insert(
            "help_section_title".to_string(),
            Value::String(TABLE_HELP_SECTION_TITLE.to_string()),
        );
    }

    data
}

pub type ClientResult<T> = Result<T, ClientError>;
