// mongodumptool/src/errors.rs
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot reach database server: {0}")]
    Connection(String),

    #[error("Not authorized to read database statistics: {0}")]
    Authorization(String),

    #[error("Unexpected server response: {0}")]
    InvalidResponse(String),

    #[error("{command} returned {}", describe_exit(.code))]
    Execution { command: String, code: Option<i32> },

    #[error("{command} did not finish within {seconds}s and was terminated")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackupError {
    /// Exit code carried by a failed dump run, if the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BackupError::Execution { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("failure status [{}]", code),
        None => "without an exit status (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
