//! Database connection pool management.
//!
//! This module opens the connection pool behind a `Database`:
//! - picks the backend from the connection string scheme
//! - disables implicit prepared statement caching on PostgreSQL
//! - turns off the driver's own statement logging (the query tracer reports instead)

use std::str::FromStr;

use log::{debug, error, info};
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions};
use url::Url;

use crate::config::StoreConfig;
use crate::error_handling::StoreError;

/// Query parameter the PostgreSQL driver reads its statement cache size from.
const PG_STATEMENT_CACHE_PARAM: &str = "statement-cache-capacity";

/// Open mode that lets SQLite create the database file.
const SQLITE_CREATE_MODE: &str = "mode=rwc";

/// Database backend selected by the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `postgres://` or `postgresql://`
    Postgres,
    /// `sqlite:`
    Sqlite,
}

impl Backend {
    /// Determines the backend from the connection string scheme.
    pub fn from_url(database_url: &str) -> Result<Self, StoreError> {
        let scheme = database_url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| {
                StoreError::InvalidConfig(format!(
                    "connection string has no scheme: {}",
                    redact_url(database_url)
                ))
            })?;
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(StoreError::InvalidConfig(format!(
                "unsupported database scheme `{other}`"
            ))),
        }
    }

    /// Directory under `migrations/` holding this backend's schema.
    pub fn migrations_dir(self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Most bind parameters one statement may carry.
    pub fn max_bind_parameters(self) -> usize {
        match self {
            Backend::Postgres => 65_535,
            // SQLITE_MAX_VARIABLE_NUMBER of the bundled library
            Backend::Sqlite => 32_766,
        }
    }

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Postgres => "PostgreSQL",
            Backend::Sqlite => "SQLite",
        }
    }
}

/// Rewrites the connection string for the selected backend.
///
/// PostgreSQL URLs get an explicit statement cache capacity unless the caller
/// already set one. SQLite file URLs without an explicit `mode` get
/// `mode=rwc` so a missing database file is created.
pub(crate) fn prepare_url(
    database_url: &str,
    backend: Backend,
    statement_cache_capacity: usize,
) -> Result<String, StoreError> {
    if backend == Backend::Sqlite {
        return Ok(sqlite_create_if_missing(database_url));
    }

    let mut url = Url::parse(database_url).map_err(|e| {
        StoreError::InvalidConfig(format!(
            "invalid PostgreSQL URL {}: {e}",
            redact_url(database_url)
        ))
    })?;

    let already_set = url
        .query_pairs()
        .any(|(key, _)| key == PG_STATEMENT_CACHE_PARAM);
    if !already_set {
        url.query_pairs_mut().append_pair(
            PG_STATEMENT_CACHE_PARAM,
            &statement_cache_capacity.to_string(),
        );
    }

    Ok(url.into())
}

fn sqlite_create_if_missing(database_url: &str) -> String {
    if is_private_memory(database_url) {
        return database_url.to_string();
    }
    match database_url.split_once('?') {
        None => format!("{database_url}?{SQLITE_CREATE_MODE}"),
        Some((_, params)) if params.split('&').any(|p| p.starts_with("mode=")) => {
            database_url.to_string()
        }
        Some((_, "")) => format!("{database_url}{SQLITE_CREATE_MODE}"),
        Some(_) => format!("{database_url}&{SQLITE_CREATE_MODE}"),
    }
}

/// True for `sqlite::memory:` style URLs, whose database lives and dies with a
/// single connection.
fn is_private_memory(database_url: &str) -> bool {
    let rest = database_url
        .split_once(':')
        .map(|(_, rest)| rest.trim_start_matches('/'))
        .unwrap_or_default();
    rest == ":memory:" || rest.starts_with(":memory:?")
}

/// Masks the password of a connection string for logging.
pub(crate) fn redact_url(database_url: &str) -> String {
    match Url::parse(database_url) {
        Ok(mut url) if url.password().is_some() => {
            // Fails only for cannot-be-a-base URLs, which have no password.
            let _ = url.set_password(Some("***"));
            url.into()
        }
        _ => database_url.to_string(),
    }
}

/// Opens a connection pool for `config.database_url`.
///
/// Fails with `StoreError::Connection` when the database cannot be reached.
pub(crate) async fn open_pool(config: &StoreConfig) -> Result<(Backend, AnyPool), StoreError> {
    sqlx::any::install_default_drivers();

    let backend = Backend::from_url(&config.database_url)?;
    let url = prepare_url(
        &config.database_url,
        backend,
        config.statement_cache_capacity,
    )?;

    let options = AnyConnectOptions::from_str(&url)
        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?
        .disable_statement_logging();

    debug!(
        "Opening {} pool for {} (max_connections={})",
        backend.as_str(),
        redact_url(&config.database_url),
        config.max_connections
    );

    let mut pool_options = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);
    if backend == Backend::Sqlite && is_private_memory(&config.database_url) {
        // Every new connection would open its own empty database.
        debug!("Private in-memory SQLite database: pooling a single connection");
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            StoreError::Connection(e)
        })?;

    info!(
        "Connected to {} database {}",
        backend.as_str(),
        redact_url(&config.database_url)
    );

    Ok((backend, pool))
}
