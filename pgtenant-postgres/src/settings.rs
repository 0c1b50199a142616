use std::time::Duration;

use pgtenant_core::{
    ConfigSnapshot, ProvisionError, ProvisionResult, DEFAULT_PASSWORD_BYTES, MIN_PASSWORD_BYTES,
};

use crate::ident::{IdentifierPolicy, DEFAULT_PREFIX};
use crate::source::ConnectionSource;

pub const KEY_SOURCE: &str = "postgres.source";
pub const KEY_PREFIX: &str = "tenant.prefix";
pub const KEY_PASSWORD_BYTES: &str = "password.bytes";
pub const KEY_MAX_CONNECTIONS: &str = "pool.max_connections";
pub const KEY_CONNECT_TIMEOUT: &str = "pool.connect_timeout_secs";

/// Settings for the PostgreSQL provisioner
#[derive(Clone)]
pub struct ProvisionerSettings {
    /// Namespace prefix for database and role names
    pub prefix: String,

    /// Random bytes per generated password
    pub password_bytes: usize,

    /// Upper bound on administrative connections
    pub max_connections: u32,

    /// How long to wait for a connection before giving up
    pub connect_timeout_secs: u64,

    /// Administrative source URL, when supplied through configuration
    pub source: Option<String>,
}

impl std::fmt::Debug for ProvisionerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = self.source.as_deref().map(|raw| {
            ConnectionSource::parse(raw)
                .map(|s| s.redacted())
                .unwrap_or_else(|_| "<unparsable>".to_string())
        });
        f.debug_struct("ProvisionerSettings")
            .field("prefix", &self.prefix)
            .field("password_bytes", &self.password_bytes)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("source", &source)
            .finish()
    }
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            password_bytes: DEFAULT_PASSWORD_BYTES,
            max_connections: 4,
            connect_timeout_secs: 10,
            source: None,
        }
    }
}

impl ProvisionerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a config snapshot, falling back to defaults for
    /// missing keys. Present but unparsable values are an error.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> ProvisionResult<Self> {
        let defaults = Self::default();

        let settings = Self {
            prefix: snapshot.get_string(KEY_PREFIX).unwrap_or(defaults.prefix),
            password_bytes: parsed(snapshot, KEY_PASSWORD_BYTES, defaults.password_bytes)?,
            max_connections: parsed(snapshot, KEY_MAX_CONNECTIONS, defaults.max_connections)?,
            connect_timeout_secs: parsed(
                snapshot,
                KEY_CONNECT_TIMEOUT,
                defaults.connect_timeout_secs,
            )?,
            source: snapshot.get_string(KEY_SOURCE),
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ProvisionResult<()> {
        IdentifierPolicy::new(self.prefix.as_str())?;

        if self.password_bytes < MIN_PASSWORD_BYTES {
            return Err(ProvisionError::InvalidConfig(format!(
                "{KEY_PASSWORD_BYTES} must be at least {MIN_PASSWORD_BYTES}"
            )));
        }
        if self.max_connections == 0 {
            return Err(ProvisionError::InvalidConfig(format!(
                "{KEY_MAX_CONNECTIONS} must be at least 1"
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ProvisionError::InvalidConfig(format!(
                "{KEY_CONNECT_TIMEOUT} must be at least 1"
            )));
        }
        Ok(())
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_password_bytes(mut self, bytes: usize) -> Self {
        self.password_bytes = bytes;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn identifier_policy(&self) -> ProvisionResult<IdentifierPolicy> {
        IdentifierPolicy::new(self.prefix.as_str())
    }
}

fn parsed<T: std::str::FromStr>(
    snapshot: &ConfigSnapshot,
    key: &str,
    default: T,
) -> ProvisionResult<T> {
    match snapshot.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ProvisionError::InvalidConfig(format!("{key} has an invalid value {raw:?}"))
        }),
    }
}
