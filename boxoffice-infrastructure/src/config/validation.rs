use anyhow::{anyhow, Result};

pub fn validate_database_url(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("database_url is empty"));
    }
    if !trimmed.starts_with("postgres://") && !trimmed.starts_with("postgresql://") {
        return Err(anyhow!("database_url must start with postgres:// or postgresql://"));
    }
    Ok(())
}
