//! pgtenant-core: engine-agnostic core for pgtenant.
//!
//! Holds the vocabulary shared by every provisioning backend: tenant and
//! binding ids, the credentials record handed back to callers, the error
//! taxonomy, password generation, configuration and the
//! [`ProvisioningService`] contract that a REST layer drives.

pub mod config;
pub mod credentials;
pub mod errors;
pub mod password;
pub mod service;
pub mod tenant;

pub use config::{ConfigSnapshot, ConfigStore};
pub use credentials::Credentials;
pub use errors::{ErrorCategory, ErrorKind, ProvisionError, ProvisionResult};
pub use password::{generate_password, DEFAULT_PASSWORD_BYTES, MIN_PASSWORD_BYTES};
pub use service::{ProvisionOp, ProvisioningService, ServiceCapabilities};
pub use tenant::{BindingId, TenantId};
