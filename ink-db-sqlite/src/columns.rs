//! Typed column readers for SQLite rows.
//!
//! SQLite stores whatever it is given, so these check the storage class of
//! each value before decoding it and report mismatches as
//! [`RepositoryError::Database`].

use std::str::FromStr;

use ink_core::{Price, RepositoryError};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

fn storage_class(
    row: &SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;
    if value_ref.is_null() {
        return Ok("NULL".to_string());
    }
    Ok(value_ref.type_info().name().to_string())
}

pub fn get_text(
    row: &SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e)))
}

pub fn get_optional_text(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<String>, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e)))
}

/// Parse a TEXT column with `FromStr` (ids, codes).
pub fn get_parsed<T>(
    row: &SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_text(row, column)?;
    raw.parse().map_err(|e| {
        RepositoryError::Database(format!("Invalid value '{}' in '{}': {}", raw, column, e))
    })
}

pub fn get_optional_parsed<T>(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<T>, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_text(row, column)? {
        Some(raw) => raw.parse().map(Some).map_err(|e| {
            RepositoryError::Database(format!("Invalid value '{}' in '{}': {}", raw, column, e))
        }),
        None => Ok(None),
    }
}

/// Read a price. Prices are written as TEXT, but numeric cells from older or
/// hand-edited databases are accepted too.
pub fn get_price(
    row: &SqliteRow,
    column: &str,
) -> Result<Price, RepositoryError> {
    let class = storage_class(row, column)?;
    match class.as_str() {
        "TEXT" => get_text(row, column).map(Price::from_raw),
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Price::from_decimal(Decimal::from(val)))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val)
                .map(Price::from_decimal)
                .map_err(|e| {
                    RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
                })
        }
        "NULL" => Ok(Price::default()),
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}

pub fn get_optional_f64(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<f64>, RepositoryError> {
    match storage_class(row, column)?.as_str() {
        "NULL" => Ok(None),
        "REAL" => row
            .try_get::<f64, _>(column)
            .map(Some)
            .map_err(|e| RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))),
        "INTEGER" => row
            .try_get::<i64, _>(column)
            .map(|val| Some(val as f64))
            .map_err(|e| {
                RepositoryError::Database(format!("Failed to get INTEGER from '{}': {}", column, e))
            }),
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}
