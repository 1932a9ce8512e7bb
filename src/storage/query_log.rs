//! Statement timing and query logging.
//!
//! Every statement the storage layer issues goes through a [`QueryTracer`],
//! which applies the logging policy:
//! - "row not found" is an expected absence and is never reported as an error
//! - any other failure is logged at error level with the SQL and elapsed time
//! - statements slower than the slow-query threshold are logged as warnings
//!
//! Output goes to an injectable [`QueryLogger`] backend so the policy does not
//! depend on a concrete logging implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::MAX_LOGGED_SQL_LENGTH;
use crate::error_handling::is_record_not_found;

/// Destination for storage log events.
pub trait QueryLogger: Send + Sync {
    /// Informational event (connection established, migrations applied).
    fn info(&self, message: &str);
    /// Slow statement or other degraded condition.
    fn warn(&self, message: &str);
    /// Failed statement.
    fn error(&self, message: &str);
}

/// Default backend: forwards to the `log` facade under the `bucket_store::sql` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogQueryLogger;

impl QueryLogger for LogQueryLogger {
    fn info(&self, message: &str) {
        log::info!(target: "bucket_store::sql", "{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "bucket_store::sql", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "bucket_store::sql", "{message}");
    }
}

/// Applies the query logging policy on top of a [`QueryLogger`].
#[derive(Clone)]
pub struct QueryTracer {
    logger: Arc<dyn QueryLogger>,
    slow_threshold: Duration,
}

impl std::fmt::Debug for QueryTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTracer")
            .field("slow_threshold", &self.slow_threshold)
            .finish_non_exhaustive()
    }
}

impl QueryTracer {
    /// Creates a tracer writing to `logger`.
    pub fn new(logger: Arc<dyn QueryLogger>, slow_threshold: Duration) -> Self {
        QueryTracer {
            logger,
            slow_threshold,
        }
    }

    /// Passes an informational message straight to the backend.
    pub fn info(&self, message: &str) {
        self.logger.info(message);
    }

    /// Reports one finished statement.
    pub fn trace(&self, sql: &str, elapsed: Duration, error: Option<&sqlx::Error>) {
        let sql = abbreviate_sql(sql);

        if let Some(err) = error.filter(|e| !is_record_not_found(e)) {
            self.logger
                .error(&format!("{sql} [{elapsed:?}] error: {err}"));
        }

        if elapsed > self.slow_threshold {
            match error.filter(|e| !is_record_not_found(e)) {
                Some(err) => self
                    .logger
                    .warn(&format!("slow query: {sql} [{elapsed:?}] error: {err}")),
                None => self.logger.warn(&format!("slow query: {sql} [{elapsed:?}]")),
            }
        }
    }

    /// Awaits `fut`, timing it and reporting the outcome for `sql`.
    pub(crate) async fn observe<T, F>(&self, sql: &str, fut: F) -> Result<T, sqlx::Error>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let begin = Instant::now();
        let result = fut.await;
        self.trace(sql, begin.elapsed(), result.as_ref().err());
        result
    }
}

/// Collapses whitespace and truncates long statements for logging.
fn abbreviate_sql(sql: &str) -> String {
    let collapsed = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    let total = collapsed.chars().count();
    if total <= MAX_LOGGED_SQL_LENGTH {
        return collapsed;
    }
    let head: String = collapsed.chars().take(MAX_LOGGED_SQL_LENGTH).collect();
    format!("{head}... ({total} chars)")
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::{Arc, Mutex};

    use super::QueryLogger;

    /// Captures log events for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingLogger {
        messages: Arc<Mutex<Vec<(log::Level, String)>>>,
    }

    impl RecordingLogger {
        pub fn logs(&self) -> Vec<(log::Level, String)> {
            self.messages.lock().unwrap().clone()
        }

        pub fn count(&self, level: log::Level) -> usize {
            self.logs().iter().filter(|(l, _)| *l == level).count()
        }

        fn push(&self, level: log::Level, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    impl QueryLogger for RecordingLogger {
        fn info(&self, message: &str) {
            self.push(log::Level::Info, message);
        }

        fn warn(&self, message: &str) {
            self.push(log::Level::Warn, message);
        }

        fn error(&self, message: &str) {
            self.push(log::Level::Error, message);
        }
    }
}
