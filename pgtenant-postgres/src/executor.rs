use std::sync::Arc;

use async_trait::async_trait;
use pgtenant_core::ProvisionResult;

use crate::source::ConnectionSource;
use crate::statements::Statement;

/// Handle the lifecycle operations issue their statements through.
///
/// [`AdminConnection`](crate::AdminConnection) is the sqlx-backed
/// implementation. Statements run one at a time, in the order given.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Source this handle was opened from.
    fn source(&self) -> &ConnectionSource;

    /// Database the handle is attached to, as reported by the engine.
    fn current_database(&self) -> &str;

    /// Role the handle is logged in as, as reported by the engine.
    fn current_role(&self) -> &str;

    /// Run a statement, returning the number of rows it affected.
    async fn execute(&self, statement: &Statement) -> ProvisionResult<u64>;

    /// Run a probe and report whether it returned at least one row.
    async fn exists(&self, statement: &Statement) -> ProvisionResult<bool>;

    /// Open a second handle with the same login, attached to `database`.
    async fn scoped_to(&self, database: &str) -> ProvisionResult<Arc<dyn SqlExecutor>>;

    /// Release the underlying connections.
    async fn close(&self);
}
