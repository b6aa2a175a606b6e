// mongodumptool/src/backup/db_dump.rs
use std::path::Path;
use std::sync::Arc;

use crate::backup::observer::JobObserver;
use crate::backup::process::{CommandSpec, ProcessExecutor};
use crate::config::JobConfig;
use crate::errors::{BackupError, Result};

/// Builds the mongodump command line and runs it (or only echoes it on a dry run).
pub struct DumpRunner {
    executor: Arc<dyn ProcessExecutor>,
    observer: Arc<dyn JobObserver>,
}

impl DumpRunner {
    pub fn new(executor: Arc<dyn ProcessExecutor>, observer: Arc<dyn JobObserver>) -> Self {
        DumpRunner { executor, observer }
    }

    /// `mongodump [-u USER [-p PASSWORD]] --host HOST --out DIR`, plus
    /// `--authenticationDatabase DB` when the auth source is applied.
    pub fn build_command(config: &JobConfig, target_directory: &Path) -> CommandSpec {
        let mut command = CommandSpec::new(config.binary.as_str());
        if let Some(username) = &config.username {
            command.arg("-u").arg(username.as_str());
            if let Some(password) = &config.password {
                command.arg("-p").secret_arg(password.as_str());
            }
        }
        if let Some(auth_source) = config.applied_auth_source() {
            command.arg("--authenticationDatabase").arg(auth_source);
        }
        command.arg("--host").arg(config.host.as_str());
        command.arg("--out").arg(target_directory);
        command
    }

    /// Runs the dump into `target_directory`.
    ///
    /// On a dry run the literal command line is handed to the observer and
    /// nothing is executed. Otherwise a non-zero exit status becomes
    /// `BackupError::Execution` carrying the exit code.
    pub async fn run(&self, config: &JobConfig, target_directory: &Path, dry_run: bool) -> Result<()> {
        if config.host.trim().is_empty() {
            return Err(BackupError::Config("host must be set to run mongodump".to_string()));
        }
        let command = Self::build_command(config, target_directory);

        if dry_run {
            self.observer.dry_run(&command.command_line());
            return Ok(());
        }

        self.observer.executing(&command.redacted_command_line());
        let result = self.executor.run(&command, config.timeout).await?;
        self.observer.dump_finished(&result);

        if !result.success() {
            return Err(BackupError::Execution {
                command: command.program.clone(),
                code: result.exit_code,
            });
        }
        Ok(())
    }
}
