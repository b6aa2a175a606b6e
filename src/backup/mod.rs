pub mod database;
pub mod db_dump;
pub mod estimate;
pub mod observer;
pub mod process;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{JobConfig, RawJsonConfig};
use crate::errors::Result;
use database::{DatabaseConnector, MongoConnector};
use db_dump::DumpRunner;
use estimate::{EstimationStrategy, FixedRatio, SizeEstimator};
use observer::{JobObserver, TracingObserver};
use process::{ProcessExecutor, TokioProcessExecutor};

pub const INFO: &str = "MongoDB using mongodump plugin";

/// External capabilities a job talks to.
pub struct Collaborators {
    pub connector: Arc<dyn DatabaseConnector>,
    pub executor: Arc<dyn ProcessExecutor>,
    pub observer: Arc<dyn JobObserver>,
    /// Overrides the fixed-ratio strategy built from `estimate_ratio`.
    pub strategy: Option<Arc<dyn EstimationStrategy>>,
}

impl Collaborators {
    /// MongoDB driver, real processes and `tracing` output.
    pub fn system(job_name: &str) -> Self {
        Collaborators {
            connector: Arc::new(MongoConnector),
            executor: Arc::new(TokioProcessExecutor),
            observer: Arc::new(TracingObserver::new(job_name)),
            strategy: None,
        }
    }
}

/// One backup invocation: estimate its size, run it, or describe it.
///
/// The config is validated on construction; a job that exists is always
/// runnable. No state is carried between calls.
pub struct BackupJob {
    name: String,
    config: JobConfig,
    target_directory: PathBuf,
    dry_run: bool,
    estimator: SizeEstimator,
    runner: DumpRunner,
}

impl BackupJob {
    pub fn new(
        name: &str,
        raw_config: &RawJsonConfig,
        target_directory: impl Into<PathBuf>,
        dry_run: bool,
    ) -> Result<Self> {
        Self::with_collaborators(
            name,
            raw_config,
            target_directory,
            dry_run,
            Collaborators::system(name),
        )
    }

    pub fn with_collaborators(
        name: &str,
        raw_config: &RawJsonConfig,
        target_directory: impl Into<PathBuf>,
        dry_run: bool,
        collaborators: Collaborators,
    ) -> Result<Self> {
        collaborators.observer.validating_config();
        let config = JobConfig::from_raw(raw_config, collaborators.observer.as_ref())?;

        let strategy = collaborators
            .strategy
            .unwrap_or_else(|| Arc::new(FixedRatio::new(config.estimate_ratio)));
        let estimator = SizeEstimator::new(
            collaborators.connector,
            strategy,
            collaborators.observer.clone(),
        );
        let runner = DumpRunner::new(collaborators.executor, collaborators.observer);

        Ok(BackupJob {
            name: name.to_string(),
            config,
            target_directory: target_directory.into(),
            dry_run,
            estimator,
            runner,
        })
    }

    /// Estimated size in bytes of the backup this job would produce.
    pub async fn estimate_backup_size(&self) -> Result<u64> {
        self.estimator.estimate(&self.config).await
    }

    /// Runs mongodump into the target directory, or only logs the command on a dry run.
    pub async fn backup(&self) -> Result<()> {
        self.runner
            .run(&self.config, &self.target_directory, self.dry_run)
            .await
    }

    pub fn info(&self) -> &'static str {
        INFO
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_directory(&self) -> &Path {
        &self.target_directory
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl fmt::Debug for BackupJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupJob")
            .field("name", &self.name)
            .field("host", &self.config.host)
            .field("target_directory", &self.target_directory)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
