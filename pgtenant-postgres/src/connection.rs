use std::sync::Arc;

use async_trait::async_trait;
use pgtenant_core::{ProvisionError, ProvisionResult};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgQueryResult};
use sqlx::{ConnectOptions, Executor, Row};
use tracing::{debug, info};

use crate::executor::SqlExecutor;
use crate::settings::ProvisionerSettings;
use crate::source::ConnectionSource;
use crate::statements::Statement;

const APPLICATION_NAME: &str = "pgtenant";

/// The administrative handle: a small sqlx pool logged in with the source
/// credentials. Opened once and shared by every lifecycle operation.
pub struct AdminConnection {
    source: ConnectionSource,
    settings: ProvisionerSettings,
    pool: PgPool,
    current_database: String,
    current_role: String,
}

impl std::fmt::Debug for AdminConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConnection")
            .field("source", &self.source)
            .field("current_database", &self.current_database)
            .field("current_role", &self.current_role)
            .finish()
    }
}

impl AdminConnection {
    /// Validate `source`, connect, and run a liveness probe.
    ///
    /// An unreachable engine is returned as `Connectivity` and not retried.
    pub async fn open(source: &str, settings: &ProvisionerSettings) -> ProvisionResult<Self> {
        let source = ConnectionSource::parse(source)?;
        Self::connect(source, None, settings.clone()).await
    }

    /// Same login, attached to `database`. Holds a single connection.
    pub async fn open_scoped_to(&self, database: &str) -> ProvisionResult<Self> {
        let settings = self.settings.clone().with_max_connections(1);
        Self::connect(self.source.clone(), Some(database), settings).await
    }

    async fn connect(
        source: ConnectionSource,
        database: Option<&str>,
        settings: ProvisionerSettings,
    ) -> ProvisionResult<Self> {
        let mut options = PgConnectOptions::from_url(source.url())
            .map_err(|e| ProvisionError::InvalidSource(e.to_string()))?
            .application_name(APPLICATION_NAME)
            // CREATE USER carries a password literal
            .disable_statement_logging();
        if let Some(database) = database {
            options = options.database(database);
        }

        debug!(address = %source.address(), database = ?database, "connecting to database engine");

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout())
            .connect_with(options)
            .await
            .map_err(|e| connect_error(&source, database, e))?;

        let row = sqlx::query(
            "SELECT current_database()::text AS current_database, \
             current_user::text AS current_role",
        )
        .fetch_one(&pool)
        .await
        .map_err(|e| ProvisionError::connectivity("liveness probe failed", e))?;

        let current_database: String = row
            .try_get("current_database")
            .map_err(|e| ProvisionError::connectivity("liveness probe returned no database", e))?;
        let current_role: String = row
            .try_get("current_role")
            .map_err(|e| ProvisionError::connectivity("liveness probe returned no role", e))?;

        info!(
            address = %source.address(),
            database = %current_database,
            role = %current_role,
            "database engine reachable"
        );

        Ok(Self {
            source,
            settings,
            pool,
            current_database,
            current_role,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for AdminConnection {
    fn source(&self) -> &ConnectionSource {
        &self.source
    }

    fn current_database(&self) -> &str {
        &self.current_database
    }

    fn current_role(&self) -> &str {
        &self.current_role
    }

    async fn execute(&self, statement: &Statement) -> ProvisionResult<u64> {
        let result: Result<PgQueryResult, sqlx::Error> = if statement.params().is_empty() {
            // simple query protocol; CREATE/DROP DATABASE refuse to run
            // inside the implicit block of an extended-protocol batch
            self.pool.execute(statement.sql()).await
        } else {
            let mut query = sqlx::query(statement.sql());
            for param in statement.params() {
                query = query.bind(param.as_str());
            }
            query.execute(&self.pool).await
        };

        let done = result.map_err(|e| statement_error(statement, e))?;
        debug!(statement = %statement, rows = done.rows_affected(), "statement executed");
        Ok(done.rows_affected())
    }

    async fn exists(&self, statement: &Statement) -> ProvisionResult<bool> {
        let mut query = sqlx::query(statement.sql());
        for param in statement.params() {
            query = query.bind(param.as_str());
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| statement_error(statement, e))?;
        Ok(row.is_some())
    }

    async fn scoped_to(&self, database: &str) -> ProvisionResult<Arc<dyn SqlExecutor>> {
        let scoped = self.open_scoped_to(database).await?;
        Ok(Arc::new(scoped))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Unreachable servers and rejected logins (SQLSTATE class 28) are
/// connectivity failures. Any other refusal, such as an unknown database,
/// comes from a reachable engine and keeps its SQLSTATE.
fn connect_error(
    source: &ConnectionSource,
    database: Option<&str>,
    err: sqlx::Error,
) -> ProvisionError {
    let target = database.map_or_else(|| source.address(), str::to_string);
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());

    match code {
        Some(code) if !code.starts_with("28") => {
            ProvisionError::engine(format!("connect to {target}"), Some(code), err)
        }
        _ => ProvisionError::connectivity(format!("failed to connect to {target}"), err),
    }
}

/// Lost connections and pool exhaustion are connectivity failures; anything
/// the engine rejected is an engine failure carrying its SQLSTATE.
fn statement_error(statement: &Statement, err: sqlx::Error) -> ProvisionError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => ProvisionError::connectivity(
            format!("{} could not reach the engine", statement.kind()),
            err,
        ),
        other => {
            let code = other
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned());
            ProvisionError::engine(statement.describe(), code, other)
        }
    }
}
