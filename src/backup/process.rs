// mongodumptool/src/backup/process.rs
use async_trait::async_trait;
use std::ffi::OsString;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::errors::{BackupError, Result};
use crate::utils::{find_executable, quote_command_line};

/// An external command: program name plus arguments, with the positions of
/// arguments that carry secrets. Arguments are kept as OS strings so paths reach
/// the process byte for byte; only the logged command lines are lossy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    sensitive: Vec<usize>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            sensitive: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Adds an argument that must not show up in redacted output.
    pub fn secret_arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.sensitive.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// The literal, shell-quoted command line.
    pub fn command_line(&self) -> String {
        quote_command_line(&self.argv(false))
    }

    /// The shell-quoted command line with secret arguments replaced by `****`.
    pub fn redacted_command_line(&self) -> String {
        quote_command_line(&self.argv(true))
    }

    fn argv(&self, redact: bool) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().enumerate().map(|(i, arg)| {
                if redact && self.sensitive.contains(&i) {
                    "****".to_string()
                } else {
                    arg.to_string_lossy().into_owned()
                }
            }))
            .collect()
    }
}

/// Outcome of running a command to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Redacted command line, for diagnostics.
    pub command_line: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands. Swapped for a fake in tests.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Runs `command` to completion and reports its exit status.
    ///
    /// With a `limit`, a command still running when it expires is killed and
    /// `BackupError::Timeout` is returned.
    async fn run(&self, command: &CommandSpec, limit: Option<Duration>) -> Result<ProcessResult>;
}

/// Spawns real processes with tokio. stdout/stderr are inherited.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessExecutor;

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn run(&self, command: &CommandSpec, limit: Option<Duration>) -> Result<ProcessResult> {
        let program = find_executable(&command.program)?;
        let mut child = Command::new(&program)
            .args(&command.args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackupError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = match limit {
            None => child.wait().await?,
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill {}: {}", program.display(), e);
                    }
                    return Err(BackupError::Timeout {
                        command: command.program.clone(),
                        seconds: limit.as_secs(),
                    });
                }
            },
        };

        Ok(ProcessResult {
            command_line: command.redacted_command_line(),
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str]) -> CommandSpec {
        let mut spec = CommandSpec::new(program);
        for arg in args {
            spec.arg(*arg);
        }
        spec
    }

    #[test]
    fn redaction_hides_secret_arguments_only() {
        let mut spec = CommandSpec::new("mongodump");
        spec.arg("-u").arg("admin").arg("-p").secret_arg("s3cret");
        assert_eq!(spec.command_line(), "mongodump -u admin -p s3cret");
        assert_eq!(spec.redacted_command_line(), "mongodump -u admin -p '****'");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reports_exit_codes() {
        let executor = TokioProcessExecutor;
        let ok = executor.run(&spec("true", &[]), None).await.unwrap();
        assert!(ok.success());

        let failed = executor
            .run(&spec("sh", &["-c", "exit 3"]), None)
            .await
            .unwrap();
        assert_eq!(failed.exit_code, Some(3));
        assert!(!failed.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kills_process_after_timeout() {
        let executor = TokioProcessExecutor;
        let err = executor
            .run(&spec("sleep", &["10"]), Some(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let err = TokioProcessExecutor
            .run(&spec("no-such-mongodump-binary", &[]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Spawn { .. }));
    }
}
