// mongodumptool/src/backup/database.rs
use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::Client;

use crate::errors::{BackupError, Result};
use crate::utils::connection::ConnectionUri;

/// Server error code for "not authorized on <db> to execute command".
const UNAUTHORIZED: i32 = 13;

/// Storage statistics for one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Server-reported on-disk size in bytes. May include preallocated space.
    pub storage_size: u64,
}

/// Opens client connections to a database server.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, uri: &ConnectionUri) -> Result<Box<dyn DatabaseClient>>;
}

/// An open connection. Callers must `close` it once done, including after a failed query.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Names of every database visible to the connected user.
    async fn list_databases(&self) -> Result<Vec<String>>;

    async fn stats_for(&self, database: &str) -> Result<DatabaseStats>;

    async fn close(&self);
}

/// Connector backed by the official MongoDB driver.
#[derive(Debug, Clone, Default)]
pub struct MongoConnector;

#[async_trait]
impl DatabaseConnector for MongoConnector {
    async fn connect(&self, uri: &ConnectionUri) -> Result<Box<dyn DatabaseClient>> {
        let client = Client::with_uri_str(uri.as_str())
            .await
            .map_err(classify_error)?;
        Ok(Box::new(MongoDatabaseClient { client }))
    }
}

struct MongoDatabaseClient {
    client: Client,
}

#[async_trait]
impl DatabaseClient for MongoDatabaseClient {
    async fn list_databases(&self) -> Result<Vec<String>> {
        self.client
            .list_database_names(None, None)
            .await
            .map_err(classify_error)
    }

    async fn stats_for(&self, database: &str) -> Result<DatabaseStats> {
        let reply = self
            .client
            .database(database)
            .run_command(doc! { "dbStats": 1 }, None)
            .await
            .map_err(classify_error)?;
        storage_size_from(database, &reply).map(|storage_size| DatabaseStats { storage_size })
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

/// Reads `storageSize` out of a `dbStats` reply. Servers report it as an int32,
/// an int64 or a double depending on version and size.
pub fn storage_size_from(database: &str, reply: &Document) -> Result<u64> {
    let size = match reply.get("storageSize") {
        Some(Bson::Int32(v)) if *v >= 0 => *v as u64,
        Some(Bson::Int64(v)) if *v >= 0 => *v as u64,
        Some(Bson::Double(v)) if v.is_finite() && *v >= 0.0 => *v as u64,
        Some(other) => {
            return Err(BackupError::InvalidResponse(format!(
                "dbStats for {} returned an invalid storageSize: {}",
                database, other
            )));
        }
        None => {
            return Err(BackupError::InvalidResponse(format!(
                "dbStats for {} returned no storageSize",
                database
            )));
        }
    };
    Ok(size)
}

fn classify_error(err: MongoError) -> BackupError {
    classify_kind(err.kind.as_ref(), err.to_string())
}

fn classify_kind(kind: &ErrorKind, message: String) -> BackupError {
    match kind {
        ErrorKind::Authentication { .. } => BackupError::Authorization(message),
        ErrorKind::Command(command) if command.code == UNAUTHORIZED => {
            BackupError::Authorization(message)
        }
        ErrorKind::InvalidArgument { .. } => {
            BackupError::Config(format!("invalid connection settings: {}", message))
        }
        _ => BackupError::Connection(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::utils::connection::build_connection_uri;
    use mongodb::error::CommandError;

    fn command_error(code: i32, code_name: &str) -> ErrorKind {
        let error: CommandError = mongodb::bson::from_document(doc! {
            "code": code,
            "codeName": code_name,
            "errmsg": "command failed",
        })
        .unwrap();
        ErrorKind::Command(error)
    }

    #[test]
    fn unauthorized_command_is_an_authorization_error() {
        let err = classify_kind(&command_error(UNAUTHORIZED, "Unauthorized"), "not authorized".into());
        assert!(matches!(err, BackupError::Authorization(_)));
    }

    #[test]
    fn other_command_failures_are_connection_errors() {
        let err = classify_kind(&command_error(11600, "InterruptedAtShutdown"), "shutting down".into());
        assert!(matches!(err, BackupError::Connection(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let config = JobConfig::new("127.0.0.1:1/?serverSelectionTimeoutMS=300");
        let uri = build_connection_uri(&config).unwrap();

        let client = MongoConnector.connect(&uri).await.unwrap();
        let result = client.list_databases().await;
        client.close().await;

        assert!(matches!(result, Err(BackupError::Connection(_))));
    }

    #[test]
    fn storage_size_accepts_every_numeric_type() {
        assert_eq!(storage_size_from("a", &doc! { "storageSize": 100_i32 }).unwrap(), 100);
        assert_eq!(
            storage_size_from("a", &doc! { "storageSize": 5_000_000_000_i64 }).unwrap(),
            5_000_000_000
        );
        assert_eq!(storage_size_from("a", &doc! { "storageSize": 4096.0 }).unwrap(), 4096);
    }

    #[test]
    fn storage_size_rejects_missing_or_bad_values() {
        assert!(matches!(
            storage_size_from("a", &doc! { "dataSize": 1 }),
            Err(BackupError::InvalidResponse(_))
        ));
        assert!(matches!(
            storage_size_from("a", &doc! { "storageSize": "big" }),
            Err(BackupError::InvalidResponse(_))
        ));
        assert!(matches!(
            storage_size_from("a", &doc! { "storageSize": -1_i64 }),
            Err(BackupError::InvalidResponse(_))
        ));
    }
}
