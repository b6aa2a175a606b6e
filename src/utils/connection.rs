// mongodumptool/src/utils/connection.rs
use std::fmt;

use crate::config::JobConfig;
use crate::errors::{BackupError, Result};

pub const SCHEME: &str = "mongodb://";
const REDACTED: &str = "****";

/// A connection URI together with a copy that is safe to log.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionUri {
    uri: String,
    redacted: String,
}

impl ConnectionUri {
    /// Full URI, credentials included. Hand this to the driver, never to a logger.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// URI with the password replaced by `****`.
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl fmt::Display for ConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for ConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionUri").field(&self.redacted).finish()
    }
}

/// Builds `mongodb://[user[:password]@]host` from the job config.
///
/// Credentials are percent-encoded so that `:`, `/`, `@` and `%` inside a
/// username or password cannot change how the URI is split. The host is
/// appended verbatim. When the auth source policy is `apply`, the
/// authentication database is added as the `authSource` option.
pub fn build_connection_uri(config: &JobConfig) -> Result<ConnectionUri> {
    if config.host.trim().is_empty() {
        return Err(BackupError::Config(
            "host is required to build a connection URI".to_string(),
        ));
    }

    let mut uri = String::from(SCHEME);
    let mut redacted = String::from(SCHEME);

    if let Some(username) = &config.username {
        let username = urlencoding::encode(username);
        uri.push_str(&username);
        redacted.push_str(&username);
        if let Some(password) = &config.password {
            uri.push(':');
            uri.push_str(&urlencoding::encode(password));
            redacted.push(':');
            redacted.push_str(REDACTED);
        }
        uri.push('@');
        redacted.push('@');
    }

    uri.push_str(&config.host);
    redacted.push_str(&config.host);

    if let Some(auth_source) = config.applied_auth_source() {
        let option = format!("authSource={}", urlencoding::encode(auth_source));
        let separator = options_separator(&config.host);
        uri.push_str(separator);
        uri.push_str(&option);
        redacted.push_str(separator);
        redacted.push_str(&option);
    }

    Ok(ConnectionUri { uri, redacted })
}

fn options_separator(host: &str) -> &'static str {
    if host.contains('?') {
        "&"
    } else if host.contains('/') {
        "?"
    } else {
        "/?"
    }
}
