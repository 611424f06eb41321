use std::collections::HashMap;

use chrono::NaiveDate;

use crate::pipeline::date::parse_month_label;
use crate::pipeline::normalize::canonical_name;
use crate::pipeline::types::{RecipeRow, RecipeTable, SalesRecord, ShipmentRecord};
use crate::{ClientError, ClientResult};

pub(crate) const SALES_TABLE: &str = "sales";
pub(crate) const RECIPE_TABLE: &str = "recipe";
pub(crate) const SHIPMENT_TABLE: &str = "shipment";

const ITEM_COLUMNS: [&str; 2] = ["item_name", "group"];
const QUANTITY_COLUMNS: [&str; 1] = ["quantity_per_shipment"];
const SHIPMENT_COUNT_COLUMNS: [&str; 2] = ["shipments_per_period", "number_of_shipments"];
const UNIT_COLUMNS: [&str; 2] = ["unit", "unit_of_shipment"];

/// Sales rows kept from one or more exports, plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
    pub rows_read: usize,
    pub rows_invalid: usize,
}

impl SalesTable {
    fn absorb(&mut self, other: SalesTable) {
        self.records.extend(other.records);
        self.rows_read += other.rows_read;
        self.rows_invalid += other.rows_invalid;
    }
}

#[derive(Debug, Clone, Copy)]
enum MonthSource {
    Column(usize),
    Fixed(NaiveDate),
}

struct CsvTable {
    raw_headers: Vec<String>,
    index_by_name: HashMap<String, usize>,
    rows: Vec<csv::StringRecord>,
}

impl CsvTable {
    fn read(table: &str, content: &str) -> ClientResult<Self> {
        if content.trim().is_empty() {
            return Err(ClientError::empty_table(table));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let raw_headers = reader
            .headers()
            .map_err(|error| ClientError::malformed_table(table, &error.to_string()))?
            .iter()
            .map(|value| value.trim().to_string())
            .collect::<Vec<String>>();

        // First occurrence wins for repeated headers.
        let mut index_by_name = HashMap::new();
        for (index, header) in raw_headers.iter().enumerate() {
            index_by_name
                .entry(canonical_header(header))
                .or_insert(index);
        }

        let mut rows = Vec::new();
        for (row_index, result_row) in reader.records().enumerate() {
            let record = result_row.map_err(|error| {
                ClientError::malformed_table(table, &format!("row {}: {error}", row_index + 1))
            })?;
            if record.iter().all(|value| value.is_empty()) {
                continue;
            }
            rows.push(record);
        }

        Ok(Self {
            raw_headers,
            index_by_name,
            rows,
        })
    }

    fn column(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.index_by_name.get(*name).copied())
    }

    fn canonical_headers(&self) -> Vec<String> {
        self.raw_headers
            .iter()
            .map(|header| canonical_header(header))
            .collect()
    }
}

/// `Item name ` and `item_name` both become `item_name`.
pub(crate) fn canonical_header(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}

/// Reads a consolidated sales table that carries its own `month` column.
pub(crate) fn parse_sales_csv(content: &str, default_year: i32) -> ClientResult<SalesTable> {
    let table = CsvTable::read(SALES_TABLE, content)?;
    let Some(month_column) = table.column(&["month"]) else {
        return Err(ClientError::sales_schema_mismatch(table.canonical_headers()));
    };
    sales_rows(&table, MonthSource::Column(month_column), default_year)
}

/// Reads one monthly export; every row belongs to the month named by `month_label`.
pub(crate) fn parse_export_csv(
    month_label: &str,
    content: &str,
    default_year: i32,
) -> ClientResult<SalesTable> {
    let Some(month) = parse_month_label(month_label, default_year) else {
        return Err(ClientError::invalid_argument_with_recovery(
            &format!("Could not read a month from export label `{month_label}`."),
            vec![
                "Name monthly exports `<Month>_<anything>.csv`, e.g. `May_Data_Matrix.csv`."
                    .to_string(),
                "Or pass one consolidated sales CSV with a `month` column.".to_string(),
            ],
        ));
    };
    let table = CsvTable::read(SALES_TABLE, content)?;
    sales_rows(&table, MonthSource::Fixed(month), default_year)
}

/// Concatenates per-month exports into one sales table.
pub(crate) fn consolidate_exports(
    exports: &[(String, String)],
    default_year: i32,
) -> ClientResult<SalesTable> {
    let mut consolidated = SalesTable::default();
    for (month_label, content) in exports {
        consolidated.absorb(parse_export_csv(month_label, content, default_year)?);
    }
    Ok(consolidated)
}

/// True when the CSV header row names a `month` column.
pub(crate) fn has_month_column(content: &str) -> bool {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());
    reader
        .headers()
        .map(|headers| headers.iter().any(|header| canonical_header(header) == "month"))
        .unwrap_or(false)
}

fn sales_rows(
    table: &CsvTable,
    month_source: MonthSource,
    default_year: i32,
) -> ClientResult<SalesTable> {
    let (Some(item_column), Some(count_column)) =
        (table.column(&ITEM_COLUMNS), table.column(&["count"]))
    else {
        return Err(ClientError::sales_schema_mismatch(table.canonical_headers()));
    };

    let mut parsed = SalesTable {
        rows_read: table.rows.len(),
        ..SalesTable::default()
    };
    for record in &table.rows {
        let month = match month_source {
            MonthSource::Fixed(date) => Some(date),
            MonthSource::Column(index) => record
                .get(index)
                .and_then(|value| parse_month_label(value, default_year)),
        };
        let item_name = record.get(item_column).unwrap_or_default();
        let count = record.get(count_column).and_then(parse_number);

        match (month, count) {
            (Some(month), Some(count)) if count > 0.0 && !item_name.is_empty() => {
                parsed.records.push(SalesRecord {
                    month,
                    item_name: item_name.to_string(),
                    count,
                });
            }
            _ => parsed.rows_invalid += 1,
        }
    }

    if parsed.rows_invalid > 0 {
        tracing::warn!(
            invalid = parsed.rows_invalid,
            read = parsed.rows_read,
            "dropped sales rows with a missing month, item, or positive count"
        );
    }
    Ok(parsed)
}

/// Reads the recipe matrix: one row per menu item, one column per ingredient.
pub(crate) fn parse_recipe_csv(content: &str) -> ClientResult<RecipeTable> {
    let table = CsvTable::read(RECIPE_TABLE, content)?;
    let Some(item_column) = table.column(&["item_name"]) else {
        return Err(ClientError::recipe_schema_mismatch(table.canonical_headers()));
    };

    let ingredient_columns = table
        .raw_headers
        .iter()
        .enumerate()
        .filter(|(index, header)| *index != item_column && !header.is_empty())
        .map(|(index, header)| (index, header.clone()))
        .collect::<Vec<(usize, String)>>();
    if ingredient_columns.is_empty() {
        return Err(ClientError::recipe_schema_mismatch(table.canonical_headers()));
    }

    let mut rows: Vec<RecipeRow> = Vec::new();
    let mut position_by_item: HashMap<String, usize> = HashMap::new();
    for record in &table.rows {
        let item_name = canonical_name(record.get(item_column).unwrap_or_default());
        if item_name.is_empty() {
            continue;
        }

        let ingredient_qty = ingredient_columns
            .iter()
            .map(|(index, label)| {
                let qty = record.get(*index).and_then(parse_number).unwrap_or(0.0);
                (label.clone(), qty)
            })
            .collect();
        let row = RecipeRow {
            item_name: item_name.clone(),
            ingredient_qty,
        };

        match position_by_item.get(&item_name) {
            Some(position) => {
                tracing::warn!(item = %item_name, "duplicate recipe row; the later row is used");
                rows[*position] = row;
            }
            None => {
                position_by_item.insert(item_name, rows.len());
                rows.push(row);
            }
        }
    }

    Ok(RecipeTable {
        ingredients: ingredient_columns
            .into_iter()
            .map(|(_, label)| label)
            .collect(),
        rows,
    })
}

/// Required shipment headers in canonical form.
pub(crate) fn required_shipment_headers() -> Vec<String> {
    [
        "ingredient",
        "quantity_per_shipment",
        "shipments_per_period|number_of_shipments",
        "frequency",
        "unit|unit_of_shipment",
    ]
    .iter()
    .map(|value| (*value).to_string())
    .collect()
}

pub(crate) fn parse_shipment_csv(content: &str) -> ClientResult<Vec<ShipmentRecord>> {
    let table = CsvTable::read(SHIPMENT_TABLE, content)?;
    let columns = (
        table.column(&["ingredient"]),
        table.column(&QUANTITY_COLUMNS),
        table.column(&SHIPMENT_COUNT_COLUMNS),
        table.column(&["frequency"]),
        table.column(&UNIT_COLUMNS),
    );
    let (Some(ingredient), Some(quantity), Some(shipments), Some(frequency), Some(unit)) = columns
    else {
        return Err(ClientError::shipment_schema_mismatch(
            required_shipment_headers(),
            table.canonical_headers(),
        ));
    };

    let records = table
        .rows
        .iter()
        .filter_map(|record| {
            let name = record.get(ingredient).unwrap_or_default();
            if name.is_empty() {
                return None;
            }
            Some(ShipmentRecord {
                ingredient: name.to_string(),
                quantity_per_shipment: record.get(quantity).and_then(parse_number).unwrap_or(0.0),
                shipments_per_period: record.get(shipments).and_then(parse_number).unwrap_or(0.0),
                frequency: record.get(frequency).unwrap_or_default().to_string(),
                unit: record.get(unit).unwrap_or_default().to_string(),
            })
        })
        .collect::<Vec<ShipmentRecord>>();
    Ok(records)
}

/// Finite number, tolerating thousands separators such as `1,250`.
fn parse_number(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|number| number.is_finite())
}
