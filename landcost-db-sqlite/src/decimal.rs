use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{Row, TypeInfo, ValueRef};
use landcost_core::RepositoryError;

/// Get a decimal value from a row, handling both INTEGER and REAL SQLite types.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{column}' not found: {e}")))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get INTEGER from '{column}': {e}"))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{column}': {e}"))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {val} to Decimal: {e}"))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{type_name}' for column '{column}'"
        ))),
    }
}

/// Convert a Decimal to f64 for SQLite storage.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}
