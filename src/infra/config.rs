//! Centralized configuration (environment variables + defaults).

use crate::domain::catalog::PatternCatalog;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BUILD_CONCURRENCY: usize = 16;

/// Loads `.env` if present. Safe to call more than once.
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow!("{} must be a positive integer, got '{}'", name, raw)),
    }
}

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> Result<String> {
    var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))
}

pub fn bind_addr() -> String {
    var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}

pub fn db_max_connections() -> Result<u32> {
    Ok(parsed_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?.max(1))
}

/// Upper bound on concurrent store writes within one build level.
pub fn build_concurrency() -> Result<usize> {
    Ok(parsed_or("BUILD_CONCURRENCY", DEFAULT_BUILD_CONCURRENCY)?.max(1))
}

pub fn pattern_catalog_path() -> Option<PathBuf> {
    var("PATTERN_CATALOG_PATH").map(PathBuf::from)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

pub fn store_backend() -> Result<StoreBackend> {
    match var("STORE_BACKEND") {
        None => Ok(StoreBackend::Postgres),
        Some(raw) => raw.parse(),
    }
}

/// The catalog file named by `PATTERN_CATALOG_PATH`, or the built-in one.
/// A file catalog must pass validation before it is used.
pub fn pattern_catalog() -> Result<PatternCatalog> {
    let catalog = match pattern_catalog_path() {
        None => PatternCatalog::builtin(),
        Some(path) => PatternCatalog::load(&path)
            .with_context(|| format!("loading pattern catalog from {}", path.display()))?,
    };
    catalog.validate()?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_names() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}
