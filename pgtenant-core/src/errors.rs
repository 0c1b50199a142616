//! # Errors
//!
//! pgtenant reports every failure through [`ProvisionError`]. Core goals:
//! - callers can tell "tenant not found" apart from an engine fault
//! - each error maps to a Feathers-style status/name/className triple so the
//!   REST layer does not need its own table
//! - the driver error stays reachable through `source()`
//!
//! [`ProvisionError::to_json`] renders the client-safe payload; it never
//! includes the source chain.

use std::fmt;

use anyhow::Error as AnyError;
use thiserror::Error;

/// Boxed driver error carried by engine and connectivity failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for provisioning operations.
pub type ProvisionResult<T> = std::result::Result<T, ProvisionError>;

/// SQLSTATE codes the engine reports for "object already exists".
const DUPLICATE_DATABASE: &str = "42P04";
const DUPLICATE_OBJECT: &str = "42710";

/// Feathers-ish error class names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,     // 400
    NotFound,       // 404
    Conflict,       // 409
    GeneralError,   // 500
    NotImplemented, // 501
    Unavailable,    // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Feathers error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    /// Feathers error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Coarse failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or unsupported setup input; fatal at setup.
    Configuration,
    /// Engine unreachable or refused authentication; fatal at setup.
    Connectivity,
    /// Expected, clean failure (tenant missing).
    NotFound,
    /// A statement failed; the operation stopped at that step.
    Engine,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Connectivity => "connectivity",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::Engine => "engine",
        };
        f.write_str(s)
    }
}

/// Errors raised while provisioning tenants and bindings.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("invalid connection source: {0}")]
    InvalidSource(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("cannot reach database engine: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("tenant database {0:?} does not exist")]
    TenantNotFound(String),

    #[error("{statement} failed: {source}")]
    Engine {
        /// Redacted description of the statement that failed.
        statement: String,
        /// SQLSTATE reported by the engine, when there was one.
        code: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("random source failure: {0}")]
    Random(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl ProvisionError {
    pub fn connectivity<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connectivity {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn engine<E>(statement: impl Into<String>, code: Option<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Engine {
            statement: statement.into(),
            code,
            source: Box::new(source),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSource(_)
            | Self::InvalidConfig(_)
            | Self::InvalidIdentifier(_)
            | Self::Unsupported(_) => ErrorCategory::Configuration,
            Self::Connectivity { .. } => ErrorCategory::Connectivity,
            Self::TenantNotFound(_) => ErrorCategory::NotFound,
            Self::Engine { .. } | Self::Random(_) => ErrorCategory::Engine,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) => ErrorKind::BadRequest,
            Self::TenantNotFound(_) => ErrorKind::NotFound,
            Self::Connectivity { .. } => ErrorKind::Unavailable,
            Self::Unsupported(_) => ErrorKind::NotImplemented,
            Self::Engine { code: Some(code), .. }
                if code == DUPLICATE_DATABASE || code == DUPLICATE_OBJECT =>
            {
                ErrorKind::Conflict
            }
            Self::InvalidSource(_)
            | Self::InvalidConfig(_)
            | Self::Engine { .. }
            | Self::Random(_) => ErrorKind::GeneralError,
        }
    }

    pub fn code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TenantNotFound(_))
    }

    /// SQLSTATE of an engine failure.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Engine { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Feathers-ish JSON payload, safe to hand to clients.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let kind = self.kind();
        let mut base = json!({
            "name": kind.name(),
            "message": self.to_string(),
            "code": kind.status_code(),
            "className": kind.class_name(),
        });

        if let Some(code) = self.sqlstate() {
            base["data"] = json!({ "sqlstate": code });
        }
        base
    }

    /// Find a `ProvisionError` anywhere in an `anyhow` chain.
    pub fn find_in(err: &AnyError) -> Option<&ProvisionError> {
        err.chain().find_map(|e| e.downcast_ref::<ProvisionError>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[derive(Debug, Error)]
    #[error("duplicate")]
    struct FakeDriverError;

    #[test]
    fn not_found_is_distinct_from_engine_failure() {
        let missing = ProvisionError::TenantNotFound("sb_t1".into());
        let engine = ProvisionError::engine("CREATE USER", None, FakeDriverError);

        assert_eq!(missing.category(), ErrorCategory::NotFound);
        assert_eq!(missing.code(), 404);
        assert!(missing.is_not_found());

        assert_eq!(engine.category(), ErrorCategory::Engine);
        assert_eq!(engine.code(), 500);
        assert!(!engine.is_not_found());
    }

    #[test]
    fn duplicate_object_maps_to_conflict() {
        let err = ProvisionError::engine(
            "CREATE DATABASE \"sb_t1\"",
            Some("42P04".into()),
            FakeDriverError,
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.sqlstate(), Some("42P04"));
    }

    #[test]
    fn connectivity_is_unavailable() {
        let err = ProvisionError::connectivity("no route", FakeDriverError);
        assert_eq!(err.category(), ErrorCategory::Connectivity);
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn json_payload_has_feathers_fields() {
        let err = ProvisionError::TenantNotFound("sb_t1".into());
        let body = err.to_json();

        assert_eq!(body["name"], "NotFound");
        assert_eq!(body["code"], 404);
        assert_eq!(body["className"], "not-found");
        assert!(body["message"].as_str().unwrap().contains("sb_t1"));
        assert!(body.get("data").is_none());
    }

    #[test]
    fn json_payload_omits_driver_details() {
        let err =
            ProvisionError::engine("DROP USER \"sb_b1\"", Some("2BP01".into()), FakeDriverError);
        let body = err.to_json();

        assert_eq!(body["data"]["sqlstate"], "2BP01");
        assert!(body.get("source").is_none());
    }

    #[test]
    fn found_through_anyhow_context() {
        let err: AnyError = Err::<(), _>(ProvisionError::Unsupported("plan update"))
            .context("update handler")
            .unwrap_err();

        let found = ProvisionError::find_in(&err).expect("provision error in chain");
        assert_eq!(found.kind(), ErrorKind::NotImplemented);
    }
}
