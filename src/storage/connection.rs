//! Connection lifecycle.
//!
//! A [`Database`] is one open pool plus the settings every write needs. A
//! [`ConnectionManager`] creates it exactly once, however many callers race on
//! the first `connect`, and hands out shared `Arc<Database>` handles.
//!
//! The free functions [`connect`], [`store_bucket`] and [`disconnect`] operate
//! on a process-wide default manager. Code that wants explicit wiring can build
//! its own manager or `Database` and pass it around instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use sqlx::AnyPool;
use tokio::sync::Mutex;

use super::insert::{StoreOutcome, OBJECT_COLUMNS};
use super::migrations::run_migrations;
use super::pool::{open_pool, Backend};
use super::query_log::{LogQueryLogger, QueryLogger, QueryTracer};
use crate::bucket::Bucket;
use crate::config::{RetryPolicy, StoreConfig};
use crate::error_handling::StoreError;

/// An open database plus the write settings it was configured with.
pub struct Database {
    pub(crate) pool: AnyPool,
    pub(crate) backend: Backend,
    pub(crate) tracer: QueryTracer,
    pub(crate) batch_size: usize,
    pub(crate) retry: RetryPolicy,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend)
            .field("batch_size", &self.batch_size)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Opens a pool for `config.database_url`.
    ///
    /// Does not run migrations; see [`Database::run_migrations`].
    pub async fn open(
        config: &StoreConfig,
        logger: Arc<dyn QueryLogger>,
    ) -> Result<Self, StoreError> {
        validate(config)?;
        let (backend, pool) = open_pool(config).await?;
        Ok(Self::from_pool(pool, backend, config, logger))
    }

    /// Wraps an already open pool.
    pub fn from_pool(
        pool: AnyPool,
        backend: Backend,
        config: &StoreConfig,
        logger: Arc<dyn QueryLogger>,
    ) -> Self {
        Database {
            pool,
            backend,
            tracer: QueryTracer::new(logger, config.slow_query_threshold),
            batch_size: config.batch_size,
            retry: config.retry.clone(),
        }
    }

    /// Applies the bundled schema migrations for this backend.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        run_migrations(&self.pool, self.backend).await.map_err(|e| {
            log::error!("{} migrations failed: {e}", self.backend.as_str());
            e
        })?;
        self.tracer
            .info(&format!("{} schema is up to date", self.backend.as_str()));
        Ok(())
    }

    /// Backend this database talks to.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Closes every pooled connection. Later operations fail with `PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// True once [`Database::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn validate(config: &StoreConfig) -> Result<(), StoreError> {
    if config.database_url.trim().is_empty() {
        return Err(StoreError::InvalidConfig(
            "database URL is empty".to_string(),
        ));
    }
    if config.batch_size == 0 {
        return Err(StoreError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }
    let backend = Backend::from_url(&config.database_url)?;
    let max_batch_size = backend.max_bind_parameters() / OBJECT_COLUMNS.len();
    if config.batch_size > max_batch_size {
        return Err(StoreError::InvalidConfig(format!(
            "batch size {} exceeds the {} limit of {} object rows per statement",
            config.batch_size,
            backend.as_str(),
            max_batch_size
        )));
    }
    if config.max_connections == 0 {
        return Err(StoreError::InvalidConfig(
            "max_connections must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Owns the shared database handle and guarantees it is created only once.
pub struct ConnectionManager {
    state: Mutex<Option<Arc<Database>>>,
    logger: Arc<dyn QueryLogger>,
    connections_opened: AtomicUsize,
    migrations_run: AtomicUsize,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Manager that logs through the `log` facade.
    pub fn new() -> Self {
        Self::with_logger(Arc::new(LogQueryLogger))
    }

    /// Manager that reports queries to `logger`.
    pub fn with_logger(logger: Arc<dyn QueryLogger>) -> Self {
        ConnectionManager {
            state: Mutex::new(None),
            logger,
            connections_opened: AtomicUsize::new(0),
            migrations_run: AtomicUsize::new(0),
        }
    }

    /// Connects with default settings; see [`ConnectionManager::connect_with`].
    pub async fn connect(
        &self,
        database_url: &str,
        run_migrations: bool,
    ) -> Result<Arc<Database>, StoreError> {
        self.connect_with(StoreConfig::new(database_url, run_migrations))
            .await
    }

    /// Returns the shared handle, opening it on the first call.
    ///
    /// Concurrent first callers serialize on the internal lock, so exactly one
    /// pool is opened and migrations run at most once. When a handle already
    /// exists `config` is ignored. If migrations fail the new pool is closed
    /// and the manager stays disconnected.
    pub async fn connect_with(&self, config: StoreConfig) -> Result<Arc<Database>, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(db) = state.as_ref() {
            return Ok(Arc::clone(db));
        }

        let db = Database::open(&config, Arc::clone(&self.logger)).await?;
        self.connections_opened.fetch_add(1, Ordering::SeqCst);

        if config.run_migrations {
            if let Err(e) = db.run_migrations().await {
                db.close().await;
                return Err(e);
            }
            self.migrations_run.fetch_add(1, Ordering::SeqCst);
        }

        let db = Arc::new(db);
        *state = Some(Arc::clone(&db));
        Ok(db)
    }

    /// The current handle, or `StoreError::NotConnected`.
    pub async fn handle(&self) -> Result<Arc<Database>, StoreError> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(StoreError::NotConnected)
    }

    /// Whether a handle is currently held.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Closes and forgets the current handle. Returns false if there was none.
    ///
    /// Clones of the handle held elsewhere see a closed pool afterwards.
    pub async fn disconnect(&self) -> bool {
        let db = self.state.lock().await.take();
        match db {
            Some(db) => {
                db.close().await;
                self.logger.info("Database connection closed");
                true
            }
            None => false,
        }
    }

    /// Number of pools this manager has opened.
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    /// Number of times this manager has applied migrations.
    pub fn migrations_run(&self) -> usize {
        self.migrations_run.load(Ordering::SeqCst)
    }
}

/// The process-wide manager behind the free functions.
pub fn default_manager() -> &'static ConnectionManager {
    static MANAGER: OnceLock<ConnectionManager> = OnceLock::new();
    MANAGER.get_or_init(ConnectionManager::new)
}

/// Connects the process-wide database, optionally running migrations.
///
/// Returns immediately when already connected.
pub async fn connect(
    database_url: &str,
    run_migrations: bool,
) -> Result<Arc<Database>, StoreError> {
    default_manager().connect(database_url, run_migrations).await
}

/// [`connect`] with a full configuration.
pub async fn connect_with(config: StoreConfig) -> Result<Arc<Database>, StoreError> {
    default_manager().connect_with(config).await
}

/// Stores `bucket` through the process-wide database.
pub async fn store_bucket(bucket: &Bucket) -> Result<StoreOutcome, StoreError> {
    default_manager().handle().await?.store_bucket(bucket).await
}

/// Closes the process-wide database. Returns false if it was not connected.
pub async fn disconnect() -> bool {
    default_manager().disconnect().await
}
