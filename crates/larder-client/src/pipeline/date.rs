use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parses a sales month label into the first day of that month.
///
/// Accepts `may`, `May 2024`, `sept`, `2025-07` and `2025-07-19`. Month-name
/// labels without a year take `default_year`.
pub fn parse_month_label(value: &str, default_year: i32) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = parse_numeric_month(trimmed) {
        return Some(date);
    }

    let lowered = trimmed.to_ascii_lowercase();
    let mut tokens = lowered.split_whitespace();
    let name = tokens.next()?;
    let year = match tokens.next() {
        Some(token) => parse_year(token)?,
        None => default_year,
    };
    if tokens.next().is_some() {
        return None;
    }

    let month = month_number_from_name(name)?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Short month label used in reports, e.g. `Jul`.
pub fn month_label(date: &NaiveDate) -> String {
    date.format("%b").to_string()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shifts a first-of-month date by whole months.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let index = month_index(date) + months;
    let year = index.div_euclid(12);
    let month = u32::try_from(index.rem_euclid(12) + 1).unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Whole months from `start` to `end`, ignoring days.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    month_index(end) - month_index(start)
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + i32::try_from(date.month0()).unwrap_or(0)
}

fn month_number_from_name(name: &str) -> Option<u32> {
    if name.len() < 3 || !name.chars().all(|character| character.is_ascii_alphabetic()) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|full| full.starts_with(name))
        .and_then(|index| u32::try_from(index + 1).ok())
}

fn parse_numeric_month(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() < 7 || bytes[4] != b'-' {
        return None;
    }
    let year = parse_year(value.get(0..4)?)?;
    let month = value.get(5..7)?.parse::<u32>().ok()?;

    match bytes.len() {
        7 => NaiveDate::from_ymd_opt(year, month, 1),
        10 => {
            let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
            Some(first_of_month(parsed))
        }
        _ => None,
    }
}

fn parse_year(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    token.parse::<i32>().ok()
}
