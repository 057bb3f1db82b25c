//! Shared row-mapping helpers.

use sqlx::postgres::PgRow;
use sqlx::Row;
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// Reads a text column and parses it into one of the model's closed enums.
/// A value outside the enum set means the table and the code disagree, which
/// is a decode error, not a caller error.
pub(crate) fn parse_enum<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| StoreError::Decode(format!("column {column}: {e}")))
}

/// Escapes LIKE/ILIKE metacharacters so user queries match literally.
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_handles_metacharacters() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
