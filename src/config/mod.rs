// mongodumptool/src/config/mod.rs
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::backup::observer::JobObserver;
use crate::errors::{BackupError, Result};

/// Name of the config section this tool reads.
pub const SECTION: &str = "mongodump";
pub const DEFAULT_BINARY: &str = "mongodump";
pub const DEFAULT_ESTIMATE_RATIO: f64 = 0.5;

/// The parsed config document. Only the `mongodump` section belongs to us; other
/// top-level keys are left alone for whoever else reads the same file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub mongodump: Option<serde_json::Value>,
}

/// Shape of the `mongodump` section. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMongodumpSection {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "authenticationDatabase")]
    pub authentication_database: Option<String>,
    pub auth_source: Option<AuthSourcePolicy>,
    pub timeout_secs: Option<u64>,
    pub binary: Option<String>,
    pub estimate_ratio: Option<f64>,
}

/// What to do with `authenticationDatabase`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSourcePolicy {
    /// Accept the key but leave both the URI and the dump command untouched.
    #[default]
    Ignore,
    /// Send it as `authSource` in the URI and `--authenticationDatabase` to the dump binary.
    Apply,
}

/// Validated settings for one backup job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub authentication_database: Option<String>,
    pub auth_source: AuthSourcePolicy,
    pub timeout: Option<Duration>,
    pub binary: String,
    pub estimate_ratio: f64,
}

impl RawJsonConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            BackupError::Config(format!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            ))
        })?;
        Self::from_json_str(&config_content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| BackupError::Config(format!("Failed to parse JSON config: {}", e)))
    }
}

impl JobConfig {
    /// Config with only a host set and every option at its default.
    pub fn new(host: impl Into<String>) -> Self {
        JobConfig {
            host: host.into(),
            username: None,
            password: None,
            authentication_database: None,
            auth_source: AuthSourcePolicy::Ignore,
            timeout: None,
            binary: DEFAULT_BINARY.to_string(),
            estimate_ratio: DEFAULT_ESTIMATE_RATIO,
        }
    }

    pub fn with_credentials(mut self, username: &str, password: Option<&str>) -> Self {
        self.username = Some(username.to_string());
        self.password = password.map(str::to_string);
        self
    }

    /// Validates the `mongodump` section of `raw` and builds the job settings from it.
    pub fn from_raw(raw: &RawJsonConfig, observer: &dyn JobObserver) -> Result<Self> {
        let section_value = raw.mongodump.as_ref().ok_or_else(|| {
            BackupError::Config(format!("[{}] section is missing", SECTION))
        })?;
        let section: RawMongodumpSection = serde_json::from_value(section_value.clone())
            .map_err(|e| BackupError::Config(format!("[{}] section is invalid: {}", SECTION, e)))?;
        Self::from_section(section, observer)
    }

    pub fn from_section(section: RawMongodumpSection, observer: &dyn JobObserver) -> Result<Self> {
        let host = non_empty(section.host)
            .ok_or_else(|| BackupError::Config(format!("host must be set in [{}]", SECTION)))?;

        let username = non_empty(section.username);
        let mut password = non_empty(section.password);
        if username.is_none() && password.take().is_some() {
            observer.config_warning("password is set without username and will be ignored");
        }

        let authentication_database = non_empty(section.authentication_database);
        let auth_source = section.auth_source.unwrap_or_default();
        if auth_source == AuthSourcePolicy::Apply && authentication_database.is_none() {
            return Err(BackupError::Config(
                "auth_source is \"apply\" but authenticationDatabase is not set".to_string(),
            ));
        }
        if auth_source == AuthSourcePolicy::Ignore && authentication_database.is_some() {
            observer.config_warning(
                "authenticationDatabase is set but auth_source is \"ignore\"; it will not be used",
            );
        }

        let timeout = match section.timeout_secs {
            Some(0) => {
                return Err(BackupError::Config(
                    "timeout_secs must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let binary = match section.binary {
            Some(binary) if binary.trim().is_empty() => {
                return Err(BackupError::Config("binary cannot be empty".to_string()));
            }
            Some(binary) => binary,
            None => DEFAULT_BINARY.to_string(),
        };

        let estimate_ratio = section.estimate_ratio.unwrap_or(DEFAULT_ESTIMATE_RATIO);
        if !(estimate_ratio > 0.0 && estimate_ratio <= 1.0) {
            return Err(BackupError::Config(format!(
                "estimate_ratio must be in (0, 1], got {}",
                estimate_ratio
            )));
        }

        Ok(JobConfig {
            host,
            username,
            password,
            authentication_database,
            auth_source,
            timeout,
            binary,
            estimate_ratio,
        })
    }

    /// The authentication database, if it is configured to be used.
    pub fn applied_auth_source(&self) -> Option<&str> {
        match self.auth_source {
            AuthSourcePolicy::Apply => self.authentication_database.as_deref(),
            AuthSourcePolicy::Ignore => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::observer::TracingObserver;
    use crate::backup::process::ProcessResult;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct WarningLog {
        warnings: Mutex<Vec<String>>,
    }

    impl JobObserver for WarningLog {
        fn validating_config(&self) {}
        fn config_warning(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
        fn connecting(&self, _redacted_uri: &str) {}
        fn database_stats(&self, _database: &str, _storage_size: u64) {}
        fn estimate_ready(&self, _total_storage_size: u64, _estimate: u64) {}
        fn dry_run(&self, _command_line: &str) {}
        fn executing(&self, _redacted_command_line: &str) {}
        fn dump_finished(&self, _result: &ProcessResult) {}
    }

    fn parse(value: serde_json::Value) -> Result<JobConfig> {
        let raw = RawJsonConfig {
            mongodump: Some(value),
        };
        JobConfig::from_raw(&raw, &TracingObserver::new("test"))
    }

    #[test]
    fn host_only_uses_defaults() {
        let config = parse(json!({ "host": "db1:27017" })).unwrap();
        assert_eq!(config, JobConfig::new("db1:27017"));
        assert_eq!(config.applied_auth_source(), None);
    }

    #[test]
    fn missing_host_is_a_config_error() {
        assert!(matches!(parse(json!({ "username": "bob" })), Err(BackupError::Config(_))));
        assert!(matches!(parse(json!({ "host": "  " })), Err(BackupError::Config(_))));
    }

    #[test]
    fn missing_section_is_a_config_error() {
        let raw = RawJsonConfig::from_json_str(r#"{ "mysqldump": { "host": "x" } }"#).unwrap();
        let err = JobConfig::from_raw(&raw, &TracingObserver::new("test")).unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse(json!({ "host": "db1", "hostname": "db2" })).unwrap_err();
        match err {
            BackupError::Config(message) => assert!(message.contains("hostname")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn password_without_username_is_dropped_with_a_warning() {
        let log = WarningLog::default();
        let raw = RawJsonConfig {
            mongodump: Some(json!({ "host": "db1", "password": "secret" })),
        };
        let config = JobConfig::from_raw(&raw, &log).unwrap();

        assert_eq!(config.username, None);
        assert_eq!(config.password, None);
        let warnings = log.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("password is set without username"));
        assert!(!warnings[0].contains("secret"));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = RawJsonConfig::from_json_str("{ \"mongodump\": ").unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let config = parse(json!({ "host": "db1", "username": "", "password": "" })).unwrap();
        assert_eq!(config.username, None);
        assert_eq!(config.password, None);
    }

    #[test]
    fn auth_source_apply_requires_database() {
        let err = parse(json!({ "host": "db1", "auth_source": "apply" })).unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));

        let config = parse(json!({
            "host": "db1",
            "authenticationDatabase": "admin",
            "auth_source": "apply"
        }))
        .unwrap();
        assert_eq!(config.applied_auth_source(), Some("admin"));
    }

    #[test]
    fn authentication_database_is_ignored_by_default() {
        let config = parse(json!({ "host": "db1", "authenticationDatabase": "admin" })).unwrap();
        assert_eq!(config.authentication_database.as_deref(), Some("admin"));
        assert_eq!(config.applied_auth_source(), None);
    }

    #[test]
    fn timeout_and_ratio_are_validated() {
        assert!(parse(json!({ "host": "db1", "timeout_secs": 0 })).is_err());
        assert!(parse(json!({ "host": "db1", "estimate_ratio": 0.0 })).is_err());
        assert!(parse(json!({ "host": "db1", "estimate_ratio": 1.5 })).is_err());
        assert!(parse(json!({ "host": "db1", "binary": "" })).is_err());

        let config = parse(json!({
            "host": "db1",
            "timeout_secs": 90,
            "estimate_ratio": 0.25,
            "binary": "/opt/mongo/bin/mongodump"
        }))
        .unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.estimate_ratio, 0.25);
        assert_eq!(config.binary, "/opt/mongo/bin/mongodump");
    }

    #[test]
    fn load_from_json_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "mongodump": { "host": "db1" }, "other": 1 }"#).unwrap();

        let raw = RawJsonConfig::load_from_json(&path).unwrap();
        assert!(raw.mongodump.is_some());

        let missing = RawJsonConfig::load_from_json(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(BackupError::Config(_))));
    }
}
