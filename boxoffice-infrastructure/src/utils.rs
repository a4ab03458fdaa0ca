use anyhow::{anyhow, Result};

/// Converts a non-negative database integer into a domain count.
pub fn db_count(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{} out of range: {}", column, value))
}

/// Converts a domain count into an `INTEGER` column value.
pub fn to_db_count(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| anyhow!("{} does not fit an INTEGER column: {}", column, value))
}
