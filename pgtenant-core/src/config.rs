//! # Configuration
//!
//! pgtenant uses a minimal string key/value store, the same shape the
//! rest of the stack uses: set values, take an immutable snapshot, read it
//! through typed getters. Backends build their typed settings from a
//! snapshot and validate there.
//!
//! ```rust
//! use pgtenant_core::ConfigStore;
//!
//! let mut config = ConfigStore::new();
//! config.set("tenant.prefix", "sb_");
//! config.set("pool.max_connections", "2");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get("tenant.prefix"), Some("sb_"));
//! assert_eq!(snapshot.get_usize("pool.max_connections"), Some(2));
//! ```
//!
//! ## Environment overrides
//! Variables are mapped by stripping a prefix, lowercasing and turning
//! `__` into `.`:
//!
//! ```bash
//! export PGTENANT__POOL__MAX_CONNECTIONS=8   # -> pool.max_connections
//! ```

use std::collections::HashMap;

use tracing::debug;

/// Default environment prefix for [`ConfigStore::load_env`].
pub const ENV_PREFIX: &str = "PGTENANT__";

#[derive(Debug, Default)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Layer `(name, value)` pairs whose name starts with `prefix` on top of
    /// the current values. Returns how many keys were applied.
    pub fn load_vars<I, K, V>(&mut self, vars: I, prefix: &str) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut applied = 0;
        for (name, value) in vars {
            if let Some(stripped) = name.as_ref().strip_prefix(prefix) {
                let key = stripped.to_lowercase().replace("__", ".");
                if key.is_empty() {
                    continue;
                }
                debug!(key = %key, "config override from environment");
                self.values.insert(key, value.into());
                applied += 1;
            }
        }
        applied
    }

    /// Layer the process environment (`PGTENANT__*`) on top of the current values.
    pub fn load_env(&mut self) -> usize {
        self.load_vars(std::env::vars(), ENV_PREFIX)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}
