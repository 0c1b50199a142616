//! Parsing and validation of the administrative connection source.

use std::fmt;

use pgtenant_core::{ProvisionError, ProvisionResult};
use url::Url;

/// The only accepted scheme.
pub const SCHEME: &str = "postgresql";

/// Port used when the source does not name one.
pub const DEFAULT_PORT: u16 = 5432;

/// A validated `postgresql://[user[:password]@]host[:port]/[database]` URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSource {
    url: Url,
}

impl ConnectionSource {
    pub fn parse(source: &str) -> ProvisionResult<Self> {
        let mut url = Url::parse(source)
            .map_err(|e| ProvisionError::InvalidSource(format!("malformed url: {e}")))?;

        if url.scheme() != SCHEME {
            return Err(ProvisionError::InvalidSource(format!(
                "unsupported scheme {:?}, expected {SCHEME:?}",
                url.scheme()
            )));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ProvisionError::InvalidSource(
                "source has no host".to_string(),
            ));
        }

        if url.port().is_none() {
            url.set_port(Some(DEFAULT_PORT)).map_err(|_| {
                ProvisionError::InvalidSource("cannot set default port".to_string())
            })?;
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.url.port().unwrap_or(DEFAULT_PORT)
    }

    /// `host:port`, for log lines and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }

    /// Database named in the path, if any.
    pub fn database(&self) -> Option<String> {
        let path = self.url.path().trim_start_matches('/');
        if path.is_empty() {
            return None;
        }
        let decoded = urlencoding::decode(path).map(|d| d.into_owned());
        Some(decoded.unwrap_or_else(|_| path.to_string()))
    }

    /// Same server and login, different database.
    pub fn with_database(&self, database: &str) -> Self {
        let mut url = self.url.clone();
        url.set_path(&format!("/{}", urlencoding::encode(database)));
        Self { url }
    }

    /// Connection URL for a binding role.
    ///
    /// User info and path are percent-encoded. Of the source's query
    /// parameters only `sslmode` is carried over; the rest belong to the
    /// administrative login.
    pub fn credentials_url(
        &self,
        username: &str,
        password: &str,
        database: &str,
    ) -> ProvisionResult<String> {
        let mut url = self.url.clone();
        let sslmode = url
            .query_pairs()
            .find(|(key, _)| key == "sslmode")
            .map(|(_, value)| value.into_owned());

        url.set_query(None);
        url.set_fragment(None);
        url.set_path(&format!("/{}", urlencoding::encode(database)));
        url.set_username(username).map_err(|_| {
            ProvisionError::InvalidSource("cannot set username on source url".to_string())
        })?;
        url.set_password(Some(password)).map_err(|_| {
            ProvisionError::InvalidSource("cannot set password on source url".to_string())
        })?;

        if let Some(mode) = sslmode {
            url.query_pairs_mut().append_pair("sslmode", &mode);
        }

        Ok(url.into())
    }

    /// The source with its password masked.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("********"));
        }
        url.into()
    }
}

impl fmt::Debug for ConnectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionSource")
            .field(&self.redacted())
            .finish()
    }
}

impl fmt::Display for ConnectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
