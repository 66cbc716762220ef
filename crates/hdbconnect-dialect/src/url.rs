//! Connection URL parsing.
//!
//! `scheme://[user:password@]host[:port][/tenant][?key=value...]`
//!
//! A host of the form `userkey=<NAME>` selects a secure user store entry;
//! nothing but the key name is forwarded in that case. Otherwise the port
//! defaults to 30015, or 30013 when a tenant database is named, and query
//! options pass through unchanged.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

use crate::constants::{DEFAULT_PORT, DEFAULT_TENANT_PORT, USERKEY_PREFIX};
use crate::{DialectError, Result};

/// Connection arguments derived from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConnectArgs {
    /// Credentials come from the secure user store.
    UserKey { key: String },
    Direct(DirectConnect),
}

/// Host, port and credentials for a direct connection.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DirectConnect {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Tenant database name.
    pub database: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl std::fmt::Debug for DirectConnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectConnect")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("options", &self.options)
            .finish()
    }
}

impl ConnectArgs {
    /// Parse a connection URL.
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DialectError::url("missing host"))?;

        if host
            .get(..USERKEY_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(USERKEY_PREFIX))
        {
            let key = percent_decode(&host[USERKEY_PREFIX.len()..])?;
            if key.is_empty() {
                return Err(DialectError::url("empty user store key"));
            }
            return Ok(Self::UserKey { key });
        }

        let database = url
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .map(percent_decode)
            .transpose()?;
        let port = url.port().unwrap_or(if database.is_some() {
            DEFAULT_TENANT_PORT
        } else {
            DEFAULT_PORT
        });
        let user = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(percent_decode)
            .transpose()?;
        let password = url.password().map(percent_decode).transpose()?;
        let options = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self::Direct(DirectConnect {
            host: host.to_string(),
            port,
            user,
            password,
            database,
            options,
        }))
    }

    #[must_use]
    pub const fn is_user_key(&self) -> bool {
        matches!(self, Self::UserKey { .. })
    }

    /// Render as an `hdbsql://` URL the `hdbconnect` driver accepts.
    ///
    /// The tenant database travels as the `db` option.
    ///
    /// # Errors
    ///
    /// User store keys are resolved by the HANA client library only and
    /// cannot be expressed for `hdbconnect`.
    pub fn to_hdbsql_url(&self) -> Result<String> {
        let direct = match self {
            Self::UserKey { key } => {
                return Err(DialectError::unsupported_feature(format!(
                    "user store key '{key}' cannot be resolved by hdbconnect"
                )));
            }
            Self::Direct(direct) => direct,
        };

        let mut url = Url::parse(&format!("hdbsql://{}:{}", direct.host, direct.port))?;
        if let Some(user) = &direct.user {
            url.set_username(user)
                .map_err(|()| DialectError::url("Failed to set username in URL"))?;
        }
        if let Some(password) = &direct.password {
            url.set_password(Some(password))
                .map_err(|()| DialectError::url("Failed to set password in URL"))?;
        }
        if direct.database.is_some() || !direct.options.is_empty() {
            let mut query = url.query_pairs_mut();
            if let Some(db) = &direct.database {
                query.append_pair("db", db);
            }
            for (key, value) in &direct.options {
                query.append_pair(key, value);
            }
        }
        Ok(url.into())
    }
}

impl FromStr for ConnectArgs {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn percent_decode(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            // two hex digits, no sign
            let mut byte = [0u8; 1];
            bytes
                .get(i + 1..i + 3)
                .and_then(|h| hex::decode_to_slice(h, &mut byte).ok())
                .ok_or_else(|| DialectError::url(format!("bad percent escape in '{s}'")))?;
            out.push(byte[0]);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| DialectError::url(format!("'{s}' is not valid UTF-8")))
}
