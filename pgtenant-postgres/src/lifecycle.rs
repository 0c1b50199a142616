//! The four provisioning operations over an [`SqlExecutor`].

use std::sync::Arc;

use async_trait::async_trait;
use pgtenant_core::{
    generate_password, BindingId, ConfigSnapshot, Credentials, ProvisionError, ProvisionResult,
    ProvisioningService, TenantId,
};
use tracing::{debug, info, instrument, warn};

use crate::catalog;
use crate::connection::AdminConnection;
use crate::executor::SqlExecutor;
use crate::ident::{Ident, IdentifierPolicy};
use crate::settings::{ProvisionerSettings, KEY_SOURCE};
use crate::statements;

/// SQLSTATE for connecting to a database that does not exist.
const UNDEFINED_DATABASE: &str = "3D000";

/// Provisions tenant databases and binding roles on one PostgreSQL server.
pub struct TenantLifecycle {
    executor: Arc<dyn SqlExecutor>,
    names: IdentifierPolicy,
    password_bytes: usize,
}

impl std::fmt::Debug for TenantLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantLifecycle")
            .field("source", self.executor.source())
            .field("prefix", &self.names.prefix())
            .field("password_bytes", &self.password_bytes)
            .finish()
    }
}

impl TenantLifecycle {
    pub fn new(
        executor: Arc<dyn SqlExecutor>,
        settings: &ProvisionerSettings,
    ) -> ProvisionResult<Self> {
        settings.validate()?;
        Ok(Self {
            executor,
            names: settings.identifier_policy()?,
            password_bytes: settings.password_bytes,
        })
    }

    /// Open the administrative connection and build the engine on it.
    pub async fn connect(source: &str, settings: &ProvisionerSettings) -> ProvisionResult<Self> {
        settings.validate()?;
        let admin = AdminConnection::open(source, settings).await?;
        Self::new(Arc::new(admin), settings)
    }

    /// Like [`connect`](Self::connect), with everything read from config.
    /// `postgres.source` is required.
    pub async fn from_config(config: &ConfigSnapshot) -> ProvisionResult<Self> {
        let settings = ProvisionerSettings::from_snapshot(config)?;
        let source = settings
            .source
            .clone()
            .ok_or_else(|| ProvisionError::InvalidConfig(format!("{KEY_SOURCE} is not set")))?;
        Self::connect(&source, &settings).await
    }

    pub fn names(&self) -> &IdentifierPolicy {
        &self.names
    }

    pub fn executor(&self) -> &Arc<dyn SqlExecutor> {
        &self.executor
    }

    pub async fn tenant_exists(&self, tenant: &TenantId) -> ProvisionResult<bool> {
        let db = self.names.tenant_name(tenant)?;
        catalog::database_exists(self.executor.as_ref(), &db).await
    }

    pub async fn binding_exists(&self, binding: &BindingId) -> ProvisionResult<bool> {
        let role = self.names.role_name(binding)?;
        catalog::role_exists(self.executor.as_ref(), &role).await
    }

    /// Close the administrative connection.
    pub async fn shutdown(&self) {
        self.executor.close().await;
    }
}

#[async_trait]
impl ProvisioningService for TenantLifecycle {
    #[instrument(skip_all, fields(tenant = %tenant))]
    async fn create_tenant(&self, tenant: &TenantId) -> ProvisionResult<String> {
        let db = self.names.tenant_name(tenant)?;

        self.executor.execute(&statements::create_database(&db)).await?;

        info!(database = %db, "tenant database created");
        Ok(db.into_string())
    }

    #[instrument(skip_all, fields(tenant = %tenant))]
    async fn drop_tenant(&self, tenant: &TenantId) -> ProvisionResult<()> {
        let db = self.names.tenant_name(tenant)?;

        // The two preparatory steps only make the drop more likely to
        // succeed. DROP DATABASE reports the real outcome.
        if let Err(e) = self
            .executor
            .execute(&statements::disallow_connections(&db))
            .await
        {
            warn!(database = %db, error = %e, "could not disallow new connections, continuing");
        }

        match self
            .executor
            .execute(&statements::terminate_backends(&db))
            .await
        {
            Ok(terminated) => debug!(database = %db, terminated, "backends terminated"),
            Err(e) => {
                warn!(database = %db, error = %e, "could not terminate backends, continuing")
            }
        }

        self.executor.execute(&statements::drop_database(&db)).await?;

        info!(database = %db, "tenant database dropped");
        Ok(())
    }

    #[instrument(skip_all, fields(tenant = %tenant, binding = %binding))]
    async fn create_binding(
        &self,
        tenant: &TenantId,
        binding: &BindingId,
    ) -> ProvisionResult<Credentials> {
        let db = self.names.tenant_name(tenant)?;
        let role = self.names.role_name(binding)?;

        if !catalog::database_exists(self.executor.as_ref(), &db).await? {
            return Err(ProvisionError::TenantNotFound(db.into_string()));
        }

        let password = generate_password(self.password_bytes)?;

        if catalog::role_exists(self.executor.as_ref(), &role).await? {
            info!(role = %role, "role already exists, keeping its password");
        } else {
            self.executor
                .execute(&statements::create_user(&role, &password))
                .await?;
            info!(role = %role, "binding role created");
        }

        self.executor
            .execute(&statements::grant_all_on_database(&db, &role))
            .await?;
        info!(database = %db, role = %role, "privileges granted");

        let source = self.executor.source();
        let url = source.credentials_url(role.as_str(), &password, db.as_str())?;

        Ok(Credentials {
            db_name: db.into_string(),
            username: role.into_string(),
            password,
            host: source.host().to_string(),
            port: source.port(),
            url,
        })
    }

    #[instrument(skip_all, fields(tenant = %tenant, binding = %binding))]
    async fn drop_binding(&self, tenant: &TenantId, binding: &BindingId) -> ProvisionResult<()> {
        let db = self.names.tenant_name(tenant)?;
        let role = self.names.role_name(binding)?;

        // REASSIGN OWNED only reaches objects in the current database.
        if self.executor.current_database() == db.as_str() {
            release_role(self.executor.as_ref(), &db, &role).await?;
        } else {
            debug!(database = %db, "opening a connection scoped to the tenant database");
            let scoped = match self.executor.scoped_to(db.as_str()).await {
                Ok(scoped) => scoped,
                Err(e) if e.sqlstate() == Some(UNDEFINED_DATABASE) => {
                    return Err(ProvisionError::TenantNotFound(db.into_string()));
                }
                Err(e) => return Err(e),
            };
            let outcome = release_role(scoped.as_ref(), &db, &role).await;
            scoped.close().await;
            outcome?;
        }

        info!(role = %role, "binding role dropped");
        Ok(())
    }
}

async fn release_role(exec: &dyn SqlExecutor, db: &Ident, role: &Ident) -> ProvisionResult<()> {
    let owner = Ident::new(exec.current_role())?;

    exec.execute(&statements::reassign_owned(role, &owner)).await?;
    exec.execute(&statements::revoke_all_on_database(db, role)).await?;
    exec.execute(&statements::drop_user(role)).await?;
    Ok(())
}
