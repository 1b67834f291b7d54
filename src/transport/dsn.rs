use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::ConfigError;
use crate::protocol::Sdk;

/// Protocol version sent in the auth header.
pub const SENTRY_VERSION: u8 = 7;

/// A parsed ingestion DSN.
///
/// Format: `{scheme}://{public_key}[:{secret_key}]@{host}[:{port}][/{path}]/{project_id}`.
#[derive(Clone, PartialEq, Eq)]
pub struct Dsn {
    raw: String,
    scheme: String,
    public_key: String,
    secret_key: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    project_id: String,
}

impl Dsn {
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The DSN as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The DSN without its secret key: `{scheme}://{public_key}@{host}[:port]{path}/{project_id}`.
    pub fn public_dsn(&self) -> String {
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!(
            "{}://{}@{}{}{}/{}",
            self.scheme, self.public_key, self.host, port, self.path, self.project_id
        )
    }

    /// `{scheme}://{host}[:port]{path}/api/{project_id}/envelope/`.
    pub fn envelope_url(&self) -> String {
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!(
            "{}://{}{}{}/api/{}/envelope/",
            self.scheme, self.host, port, self.path, self.project_id
        )
    }

    /// Value of the `X-Sentry-Auth` header for a request sent at `now`.
    pub fn auth_header(&self, sdk: &Sdk, now: DateTime<Utc>) -> String {
        let mut header = format!(
            "Sentry sentry_version={SENTRY_VERSION}, sentry_client={}, sentry_timestamp={}, sentry_key={}",
            sdk.client_string(),
            now.timestamp(),
            self.public_key,
        );
        if let Some(secret) = &self.secret_key {
            header.push_str(", sentry_secret=");
            header.push_str(secret);
        }
        header
    }
}

impl FromStr for Dsn {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| ConfigError::InvalidDsn(format!("{why}: {raw}"));
        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.username().is_empty() {
            return Err(invalid("missing public key"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let project_id = segments.pop().ok_or_else(|| invalid("missing project id"))?;
        let path = segments.iter().map(|s| format!("/{s}")).collect::<String>();

        Ok(Self {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
            public_key: url.username().to_string(),
            secret_key: url.password().map(str::to_owned),
            host: host.to_string(),
            port: url.port(),
            path,
            project_id: project_id.to_string(),
        })
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("project_id", &self.project_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}
