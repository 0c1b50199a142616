//! SQL issued by the lifecycle operations.
//!
//! Identifiers are always interpolated through [`Ident::quoted`]; values
//! travel as bind parameters, except the role password, which the
//! `CREATE USER` grammar only accepts as a literal.

use std::fmt;

use crate::ident::{quote_literal, Ident};

/// What a statement does. Used for logging and by test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    DatabaseExists,
    RoleExists,
    CreateDatabase,
    DisallowConnections,
    TerminateBackends,
    DropDatabase,
    CreateUser,
    GrantAllOnDatabase,
    ReassignOwned,
    RevokeAllOnDatabase,
    DropUser,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::DatabaseExists => "database existence probe",
            StatementKind::RoleExists => "role existence probe",
            StatementKind::CreateDatabase => "CREATE DATABASE",
            StatementKind::DisallowConnections => "ALTER DATABASE ... ALLOW_CONNECTIONS false",
            StatementKind::TerminateBackends => "pg_terminate_backend",
            StatementKind::DropDatabase => "DROP DATABASE",
            StatementKind::CreateUser => "CREATE USER",
            StatementKind::GrantAllOnDatabase => "GRANT ALL PRIVILEGES ON DATABASE",
            StatementKind::ReassignOwned => "REASSIGN OWNED BY",
            StatementKind::RevokeAllOnDatabase => "REVOKE ALL PRIVILEGES ON DATABASE",
            StatementKind::DropUser => "DROP USER",
        }
    }

    /// Catalog probes read state; everything else changes it.
    pub fn is_probe(&self) -> bool {
        matches!(self, StatementKind::DatabaseExists | StatementKind::RoleExists)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SQL statement plus its bind parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    sql: String,
    params: Vec<String>,
    /// Raw names of the databases/roles the statement touches.
    objects: Vec<String>,
    /// Set when `sql` embeds a secret; logs and errors then use this text.
    redacted: Option<String>,
}

impl Statement {
    pub fn new(kind: StatementKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: Vec::new(),
            objects: Vec::new(),
            redacted: None,
        }
    }

    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn touching(mut self, object: &Ident) -> Self {
        self.objects.push(object.as_str().to_string());
        self
    }

    fn redacted_as(mut self, text: String) -> Self {
        self.redacted = Some(text);
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn is_sensitive(&self) -> bool {
        self.redacted.is_some()
    }

    /// Text safe for logs and error messages.
    pub fn describe(&self) -> &str {
        self.redacted.as_deref().unwrap_or(&self.sql)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("kind", &self.kind)
            .field("sql", &self.describe())
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

pub fn create_database(db: &Ident) -> Statement {
    Statement::new(
        StatementKind::CreateDatabase,
        format!("CREATE DATABASE {}", db.quoted()),
    )
    .touching(db)
}

pub fn disallow_connections(db: &Ident) -> Statement {
    Statement::new(
        StatementKind::DisallowConnections,
        format!("ALTER DATABASE {} WITH ALLOW_CONNECTIONS false", db.quoted()),
    )
    .touching(db)
}

/// Terminates every other backend attached to `db`. Terminating zero
/// backends is a no-op.
pub fn terminate_backends(db: &Ident) -> Statement {
    Statement::new(
        StatementKind::TerminateBackends,
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(db.as_str())
    .touching(db)
}

pub fn drop_database(db: &Ident) -> Statement {
    Statement::new(
        StatementKind::DropDatabase,
        format!("DROP DATABASE {}", db.quoted()),
    )
    .touching(db)
}

pub fn create_user(role: &Ident, password: &str) -> Statement {
    let prefix = format!("CREATE USER {} WITH PASSWORD", role.quoted());
    Statement::new(
        StatementKind::CreateUser,
        format!("{prefix} {}", quote_literal(password)),
    )
    .touching(role)
    .redacted_as(format!("{prefix} '********'"))
}

pub fn grant_all_on_database(db: &Ident, role: &Ident) -> Statement {
    Statement::new(
        StatementKind::GrantAllOnDatabase,
        format!(
            "GRANT ALL PRIVILEGES ON DATABASE {} TO {}",
            db.quoted(),
            role.quoted()
        ),
    )
    .touching(db)
    .touching(role)
}

pub fn reassign_owned(role: &Ident, new_owner: &Ident) -> Statement {
    Statement::new(
        StatementKind::ReassignOwned,
        format!(
            "REASSIGN OWNED BY {} TO {}",
            role.quoted(),
            new_owner.quoted()
        ),
    )
    .touching(role)
    .touching(new_owner)
}

pub fn revoke_all_on_database(db: &Ident, role: &Ident) -> Statement {
    Statement::new(
        StatementKind::RevokeAllOnDatabase,
        format!(
            "REVOKE ALL PRIVILEGES ON DATABASE {} FROM {}",
            db.quoted(),
            role.quoted()
        ),
    )
    .touching(db)
    .touching(role)
}

pub fn drop_user(role: &Ident) -> Statement {
    Statement::new(StatementKind::DropUser, format!("DROP USER {}", role.quoted())).touching(role)
}
