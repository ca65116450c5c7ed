//! Persistence Gateway - Pool di connessioni e transazioni con scope
//!
//! [`Gateway::run_in_transaction`] is the only way multi-statement invariants get written:
//! the unit of work receives the connection bound to one transaction, the gateway commits
//! on `Ok`, rolls back on `Err`, and a dropped transaction (panic, cancelled future) rolls
//! back on its own. Transactions open with `BEGIN IMMEDIATE`, so concurrent writers wait on
//! `busy_timeout` instead of failing when a read lock is upgraded. Lock conflicts that still
//! surface come back as transient errors and the whole unit of work is replayed a bounded
//! number of times.

use crate::core::{AppError, Config};
use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const RETRY_BACKOFF: Duration = Duration::from_millis(25);

#[derive(Clone, Debug)]
pub struct Gateway {
    pool: SqlitePool,
    max_attempts: u32,
}

impl Gateway {
    pub fn new(pool: SqlitePool, max_attempts: u32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Opens the pool described by `config` and applies the embedded migrations.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::connect(
            &config.database_url,
            config.max_connections,
            config.tx_max_attempts,
        )
        .await
    }

    #[instrument(skip(database_url))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        max_attempts: u32,
    ) -> Result<Self, AppError> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // an in-memory database lives exactly as long as its single connection
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready (in_memory = {})", in_memory);

        Ok(Self::new(pool, max_attempts))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Pooled connection for standalone reads and single-statement writes.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, AppError> {
        Ok(self.pool.acquire().await?)
    }

    /// Runs `unit_of_work` inside one transaction, retrying on serialization conflicts.
    ///
    /// The closure may be invoked more than once, so it must rebuild everything it
    /// moves into the returned future (clone captured values inside the closure body).
    pub async fn run_in_transaction<T, F>(&self, unit_of_work: F) -> Result<T, AppError>
    where
        F: for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, AppError>>
            + Send
            + Sync,
        T: Send,
    {
        let mut attempt = 1;
        loop {
            match self.execute_once(&unit_of_work).await {
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        "Transaction conflict on attempt {}/{}: {}",
                        attempt, self.max_attempts, err
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn execute_once<T, F>(&self, unit_of_work: &F) -> Result<T, AppError>
    where
        F: for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, AppError>>
            + Send
            + Sync,
        T: Send,
    {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        match unit_of_work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed after '{}': {}", err, rollback_err);
                } else {
                    debug!("Transaction rolled back: {}", err);
                }
                Err(err)
            }
        }
    }
}
