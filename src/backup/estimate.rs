// mongodumptool/src/backup/estimate.rs
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::backup::database::{DatabaseClient, DatabaseConnector};
use crate::backup::observer::JobObserver;
use crate::config::JobConfig;
use crate::errors::Result;
use crate::utils::connection::build_connection_uri;

/// Raw `storageSize` per database, as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSizeReport {
    sizes: BTreeMap<String, u64>,
}

impl DatabaseSizeReport {
    pub fn insert(&mut self, database: impl Into<String>, storage_size: u64) {
        self.sizes.insert(database.into(), storage_size);
    }

    pub fn total(&self) -> u64 {
        self.sizes.values().fold(0u64, |acc, size| acc.saturating_add(*size))
    }
}

/// Turns a size report into the number handed back to the orchestrator.
pub trait EstimationStrategy: Send + Sync + fmt::Debug {
    fn estimate(&self, report: &DatabaseSizeReport) -> u64;
}

/// Scales the summed storage size by a fixed ratio.
///
/// This is a rough heuristic, not a measured compression ratio. Storage size
/// includes preallocated space, so with the default of one half the result is
/// meant to err low rather than be exact.
///
/// The ratio is held in millionths so the scaling is integer arithmetic and
/// rounds down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRatio {
    millionths: u64,
}

const ONE: u64 = 1_000_000;

impl FixedRatio {
    pub fn new(ratio: f64) -> Self {
        FixedRatio {
            millionths: (ratio * ONE as f64).round() as u64,
        }
    }
}

impl Default for FixedRatio {
    fn default() -> Self {
        FixedRatio::new(crate::config::DEFAULT_ESTIMATE_RATIO)
    }
}

impl EstimationStrategy for FixedRatio {
    fn estimate(&self, report: &DatabaseSizeReport) -> u64 {
        let scaled = u128::from(report.total()) * u128::from(self.millionths) / u128::from(ONE);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

/// Asks the server for per-database storage statistics and estimates the dump size.
pub struct SizeEstimator {
    connector: Arc<dyn DatabaseConnector>,
    strategy: Arc<dyn EstimationStrategy>,
    observer: Arc<dyn JobObserver>,
}

impl SizeEstimator {
    pub fn new(
        connector: Arc<dyn DatabaseConnector>,
        strategy: Arc<dyn EstimationStrategy>,
        observer: Arc<dyn JobObserver>,
    ) -> Self {
        SizeEstimator {
            connector,
            strategy,
            observer,
        }
    }

    /// Estimated backup size in bytes.
    ///
    /// The client connection is closed before returning, whether or not every
    /// statistics query succeeded. Failures are reported, never retried.
    pub async fn estimate(&self, config: &JobConfig) -> Result<u64> {
        let uri = build_connection_uri(config)?;
        self.observer.connecting(uri.redacted());

        let client = self.connector.connect(&uri).await?;
        let collected = self.collect_report(client.as_ref()).await;
        client.close().await;
        let report = collected?;

        let estimate = self.strategy.estimate(&report);
        self.observer.estimate_ready(report.total(), estimate);
        Ok(estimate)
    }

    async fn collect_report(&self, client: &dyn DatabaseClient) -> Result<DatabaseSizeReport> {
        let mut report = DatabaseSizeReport::default();
        for database in client.list_databases().await? {
            let stats = client.stats_for(&database).await?;
            self.observer.database_stats(&database, stats.storage_size);
            report.insert(database, stats.storage_size);
        }
        Ok(report)
    }
}

impl fmt::Debug for SizeEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeEstimator")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
