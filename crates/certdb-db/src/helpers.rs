//! Row-to-entity parsing helpers.
//!
//! libSQL rows are column-indexed and loosely typed. These helpers convert
//! TEXT timestamps, snake_case enum columns, 0/1 flags and non-negative
//! counters into the typed fields of `certdb-core` entities.

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Accepts RFC 3339 (written by this crate) and `SQLite`'s
/// `datetime('now')` format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string matches neither format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a `certdb-core` enum (`rename_all = "snake_case"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column that holds a count or index.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative or overflows `u32`.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let raw = row.get::<i64>(idx)?;
    u32::try_from(raw)
        .map_err(|_| DatabaseError::Query(format!("column {idx}: {raw} is not a valid count")))
}

/// Read a 0/1 INTEGER flag.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_flag(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a REAL column that may come back as INTEGER (`COALESCE(AVG(..), 0)`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` for non-numeric values.
pub fn get_f64(row: &libsql::Row, idx: i32) -> Result<f64, DatabaseError> {
    match row.get_value(idx)? {
        libsql::Value::Real(v) => Ok(v),
        #[allow(clippy::cast_precision_loss)]
        libsql::Value::Integer(v) => Ok(v as f64),
        libsql::Value::Null => Ok(0.0),
        other => Err(DatabaseError::Query(format!(
            "column {idx}: expected a number, got {other:?}"
        ))),
    }
}

/// Build a `LIKE` pattern matching `needle` anywhere, escaping `%`, `_` and `\`.
///
/// Pair with `ESCAPE '\'` in the SQL.
#[must_use]
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use certdb_core::enums::ValidationStatus;

    #[test]
    fn parses_both_datetime_formats() {
        let a = parse_datetime("2026-02-09T14:30:00+00:00").unwrap();
        let b = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn optional_datetime_treats_empty_as_none() {
        assert_eq!(parse_optional_datetime(Some("")).unwrap(), None);
        assert_eq!(parse_optional_datetime(None).unwrap(), None);
    }

    #[test]
    fn enum_parsing() {
        let status: ValidationStatus = parse_enum("flagged").unwrap();
        assert_eq!(status, ValidationStatus::Flagged);
        assert!(parse_enum::<ValidationStatus>("bogus").is_err());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("math"), "%math%");
        assert_eq!(contains_pattern("100%_"), "%100\\%\\_%");
    }
}
