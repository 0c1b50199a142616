//! Naming and quoting of tenant databases and binding roles.
//!
//! Every name pgtenant puts into SQL goes through this module:
//! [`IdentifierPolicy`] derives prefixed names from caller ids, [`Ident`]
//! holds a validated name, and [`quote_ident`] / [`quote_literal`] are the
//! only places that wrap values for interpolation.

use std::fmt;

use pgtenant_core::{BindingId, ProvisionError, ProvisionResult, TenantId};

/// Namespace prefix applied to every tenant database and binding role.
pub const DEFAULT_PREFIX: &str = "sb_";

/// PostgreSQL truncates identifiers to `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_BYTES: usize = 63;

/// Upper bound for a prefix, leaving room for the id.
pub const MAX_PREFIX_BYTES: usize = 32;

/// A validated PostgreSQL identifier (database or role name), stored raw.
///
/// Names are rejected rather than truncated: the engine would cut a long
/// name down silently and two distinct ids could then land on one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> ProvisionResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProvisionError::InvalidIdentifier(
                "identifier is empty".to_string(),
            ));
        }
        if name.contains('\0') {
            return Err(ProvisionError::InvalidIdentifier(format!(
                "identifier {name:?} contains a NUL byte"
            )));
        }
        if name.len() > MAX_IDENTIFIER_BYTES {
            return Err(ProvisionError::InvalidIdentifier(format!(
                "identifier {name:?} is {} bytes, the limit is {MAX_IDENTIFIER_BYTES}",
                name.len()
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier wrapped for use in SQL text.
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives database and role names from caller-supplied ids.
///
/// Pure and deterministic; distinct ids give distinct names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPolicy {
    prefix: String,
}

impl IdentifierPolicy {
    pub fn new(prefix: impl Into<String>) -> ProvisionResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(ProvisionError::InvalidConfig(
                "name prefix must not be empty".to_string(),
            ));
        }
        if prefix.len() > MAX_PREFIX_BYTES {
            return Err(ProvisionError::InvalidConfig(format!(
                "name prefix is {} bytes, the limit is {MAX_PREFIX_BYTES}",
                prefix.len()
            )));
        }
        if prefix.contains('\0') {
            return Err(ProvisionError::InvalidConfig(
                "name prefix contains a NUL byte".to_string(),
            ));
        }
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Database name for a tenant: `<prefix><tenant id>`.
    pub fn tenant_name(&self, tenant: &TenantId) -> ProvisionResult<Ident> {
        self.prefixed("tenant", tenant.as_str())
    }

    /// Role name for a binding: `<prefix><binding id>`.
    pub fn role_name(&self, binding: &BindingId) -> ProvisionResult<Ident> {
        self.prefixed("binding", binding.as_str())
    }

    fn prefixed(&self, what: &str, id: &str) -> ProvisionResult<Ident> {
        if id.is_empty() {
            return Err(ProvisionError::InvalidIdentifier(format!("{what} id is empty")));
        }
        Ident::new(format!("{}{}", self.prefix, id))
    }
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Quote a name for use as an SQL identifier: wrap in `"` and double any
/// embedded `"`, so the value can never close the quoted context.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote a value as an SQL string literal: wrap in `'` and double any
/// embedded `'`. A value containing `\` is written in escape-string form
/// (`E'...'`) with the backslash doubled, which reads the same whatever
/// `standard_conforming_strings` is set to.
///
/// Only for grammar positions that take no bind parameter, such as
/// `CREATE USER ... WITH PASSWORD`.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    if value.contains('\\') {
        out.push('E');
    }
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push(c);
        }
        out.push(c);
    }
    out.push('\'');
    out
}
