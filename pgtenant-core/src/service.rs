use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::errors::{ProvisionError, ProvisionResult};
use crate::tenant::{BindingId, TenantId};

/// Provisioning operations a backend may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionOp {
    CreateTenant,
    DropTenant,
    CreateBinding,
    DropBinding,
    UpdateTenant,
    LastOperation,
}

/// Describes what a backend supports, so the REST layer can answer
/// catalog questions (bindable, async, plan updates) without probing.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_ops: Vec<ProvisionOp>,
}

impl ServiceCapabilities {
    /// The four synchronous lifecycle operations. No plan updates and no
    /// asynchronous polling.
    pub fn synchronous() -> Self {
        use ProvisionOp::*;
        Self {
            allowed_ops: vec![CreateTenant, DropTenant, CreateBinding, DropBinding],
        }
    }

    pub fn from_ops(ops: Vec<ProvisionOp>) -> Self {
        Self { allowed_ops: ops }
    }

    pub fn supports(&self, op: ProvisionOp) -> bool {
        self.allowed_ops.contains(&op)
    }

    pub fn bindable(&self) -> bool {
        self.supports(ProvisionOp::CreateBinding) && self.supports(ProvisionOp::DropBinding)
    }
}

/// Contract between the service-catalog layer and a provisioning backend.
///
/// - `create_tenant`  → dedicated database, returns its name
/// - `drop_tenant`    → best-effort teardown of that database
/// - `create_binding` → login role scoped to the tenant, returns credentials
/// - `drop_binding`   → reassign, revoke and drop that role
///
/// Plan updates and asynchronous polling have default implementations
/// returning [`ProvisionError::Unsupported`].
#[async_trait]
pub trait ProvisioningService: Send + Sync {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::synchronous()
    }

    async fn create_tenant(&self, tenant: &TenantId) -> ProvisionResult<String>;

    async fn drop_tenant(&self, tenant: &TenantId) -> ProvisionResult<()>;

    async fn create_binding(
        &self,
        tenant: &TenantId,
        binding: &BindingId,
    ) -> ProvisionResult<Credentials>;

    async fn drop_binding(&self, tenant: &TenantId, binding: &BindingId) -> ProvisionResult<()>;

    async fn update_tenant(&self, _tenant: &TenantId, _plan_id: &str) -> ProvisionResult<()> {
        Err(ProvisionError::Unsupported("plan update"))
    }

    async fn last_operation(&self, _tenant: &TenantId) -> ProvisionResult<()> {
        Err(ProvisionError::Unsupported("asynchronous operations"))
    }
}
