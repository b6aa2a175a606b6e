// mongodumptool/src/backup/observer.rs
//! Logging collaborator handed to every component of a job.

use tracing::{debug, error, info, warn};

use crate::backup::process::ProcessResult;

/// Receives the observable events of one backup job.
///
/// Implementations must not log credentials from anything other than the
/// `dry_run` command line, which is echoed literally.
pub trait JobObserver: Send + Sync {
    fn validating_config(&self);
    fn config_warning(&self, message: &str);
    fn connecting(&self, redacted_uri: &str);
    fn database_stats(&self, database: &str, storage_size: u64);
    fn estimate_ready(&self, total_storage_size: u64, estimate: u64);
    fn dry_run(&self, command_line: &str);
    fn executing(&self, redacted_command_line: &str);
    fn dump_finished(&self, result: &ProcessResult);
}

/// Default observer: forwards every event to `tracing`, tagged with the job name.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    job: String,
}

impl TracingObserver {
    pub fn new(job: impl Into<String>) -> Self {
        TracingObserver { job: job.into() }
    }
}

impl JobObserver for TracingObserver {
    fn validating_config(&self) {
        info!(job = %self.job, "Validating config");
    }

    fn config_warning(&self, message: &str) {
        warn!(job = %self.job, "{}", message);
    }

    fn connecting(&self, redacted_uri: &str) {
        info!(job = %self.job, uri = %redacted_uri, "Estimating backup size");
    }

    fn database_stats(&self, database: &str, storage_size: u64) {
        debug!(job = %self.job, database, storage_size, "Read dbStats");
    }

    fn estimate_ready(&self, total_storage_size: u64, estimate: u64) {
        info!(
            job = %self.job,
            total_storage_size,
            estimate,
            "Estimated backup size: {} bytes",
            estimate
        );
    }

    fn dry_run(&self, command_line: &str) {
        info!(job = %self.job, "[Dry run] mongodump - test backup run");
        info!("mongodump command: {}", command_line);
    }

    fn executing(&self, redacted_command_line: &str) {
        info!(job = %self.job, command = %redacted_command_line, "mongodump - real backup run");
    }

    fn dump_finished(&self, result: &ProcessResult) {
        match result.exit_code {
            Some(0) => info!(job = %self.job, "mongodump completed successfully"),
            Some(code) => error!(job = %self.job, code, "mongodump returned {}", code),
            None => error!(job = %self.job, "mongodump was terminated by a signal"),
        }
    }
}
