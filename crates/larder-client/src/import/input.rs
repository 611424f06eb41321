use std::fs;
use std::path::Path;

use crate::import::parse::{SalesTable, consolidate_exports, has_month_column, parse_sales_csv};
use crate::{ClientError, ClientResult};

pub(crate) fn read_table(path: &Path) -> ClientResult<String> {
    fs::read_to_string(path)
        .map_err(|error| ClientError::input_unreadable(path, &error.to_string()))
}

/// Month label carried by an export file name: `May_Data_Matrix.csv` -> `May`.
pub(crate) fn month_label_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let label = stem.split('_').next()?.trim();
    if label.is_empty() {
        return None;
    }
    Some(label.to_string())
}

/// Loads sales from either one consolidated table or one export per month.
///
/// A single file with a `month` column is read as consolidated. Otherwise every
/// file is an export whose month comes from its name.
pub(crate) fn load_sales<P: AsRef<Path>>(
    paths: &[P],
    default_year: i32,
) -> ClientResult<SalesTable> {
    if paths.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pass at least one sales CSV with --sales.",
            Some("forecast"),
        ));
    }

    if let [single] = paths {
        let content = read_table(single.as_ref())?;
        if has_month_column(&content) {
            return parse_sales_csv(&content, default_year);
        }
    }

    let mut exports = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let Some(label) = month_label_from_path(path) else {
            return Err(ClientError::invalid_argument_with_recovery(
                &format!(
                    "Could not read a month from sales export `{}`.",
                    path.display()
                ),
                vec![
                    "Name monthly exports `<Month>_<anything>.csv`, e.g. `May_Data_Matrix.csv`."
                        .to_string(),
                ],
            ));
        };
        exports.push((label, read_table(path)?));
    }

    let sales = consolidate_exports(&exports, default_year)?;
    tracing::info!(
        files = paths.len(),
        rows = sales.rows_read,
        invalid = sales.rows_invalid,
        "loaded sales exports"
    );
    Ok(sales)
}
