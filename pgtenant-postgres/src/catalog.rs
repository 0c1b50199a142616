//! Existence probes against the system catalogs.

use pgtenant_core::ProvisionResult;
use tracing::debug;

use crate::executor::SqlExecutor;
use crate::ident::Ident;
use crate::statements::{Statement, StatementKind};

pub fn database_exists_probe(db: &Ident) -> Statement {
    Statement::new(
        StatementKind::DatabaseExists,
        "SELECT 1 FROM pg_database WHERE datname = $1 LIMIT 1",
    )
    .bind(db.as_str())
    .touching(db)
}

pub fn role_exists_probe(role: &Ident) -> Statement {
    Statement::new(
        StatementKind::RoleExists,
        "SELECT 1 FROM pg_roles WHERE rolname = $1 LIMIT 1",
    )
    .bind(role.as_str())
    .touching(role)
}

/// Whether a database named exactly `db` exists. A failed probe is an
/// error, never `false`.
pub async fn database_exists(exec: &dyn SqlExecutor, db: &Ident) -> ProvisionResult<bool> {
    let found = exec.exists(&database_exists_probe(db)).await?;
    debug!(database = %db, found, "database probe");
    Ok(found)
}

/// Whether a role named exactly `role` exists, login or not.
pub async fn role_exists(exec: &dyn SqlExecutor, role: &Ident) -> ProvisionResult<bool> {
    let found = exec.exists(&role_exists_probe(role)).await?;
    debug!(role = %role, found, "role probe");
    Ok(found)
}
