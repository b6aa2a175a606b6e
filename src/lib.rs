//! mongodump backup job
//!
//! Estimates the size of a MongoDB backup from server storage statistics and
//! runs `mongodump` into a target directory on behalf of a backup orchestrator.

pub mod backup;
pub mod config;
pub mod errors;
pub mod utils;

pub use backup::{BackupJob, Collaborators};
pub use config::{JobConfig, RawJsonConfig};
pub use errors::{BackupError, Result};
