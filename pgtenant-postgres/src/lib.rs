//! pgtenant-postgres: PostgreSQL backend for pgtenant.
//!
//! Each tenant gets a dedicated database named from its id, each binding a
//! login role with a generated password and full privileges on that
//! database. [`TenantLifecycle`] implements
//! [`ProvisioningService`](pgtenant_core::ProvisioningService) over an
//! [`SqlExecutor`], normally an [`AdminConnection`].
//!
//! ```no_run
//! use pgtenant_postgres::{ProvisionerSettings, ProvisioningService, TenantLifecycle};
//! use pgtenant_core::{BindingId, TenantId};
//!
//! # async fn run() -> pgtenant_core::ProvisionResult<()> {
//! let settings = ProvisionerSettings::default();
//! let source = "postgresql://admin:pw@localhost/postgres";
//! let engine = TenantLifecycle::connect(source, &settings).await?;
//!
//! let tenant = TenantId::new("t1");
//! engine.create_tenant(&tenant).await?;
//! let creds = engine.create_binding(&tenant, &BindingId::new("b1")).await?;
//! println!("{}", creds.url);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod connection;
pub mod executor;
pub mod ident;
pub mod lifecycle;
pub mod settings;
pub mod source;
pub mod statements;

pub use connection::AdminConnection;
pub use executor::SqlExecutor;
pub use ident::{quote_ident, quote_literal, Ident, IdentifierPolicy, DEFAULT_PREFIX};
pub use lifecycle::TenantLifecycle;
pub use settings::ProvisionerSettings;
pub use source::ConnectionSource;
pub use statements::{Statement, StatementKind};

pub use pgtenant_core::ProvisioningService;
