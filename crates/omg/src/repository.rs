//! The local store: batch upserts from sync, filtered reads, and the few
//! single-row lookups unstar needs.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

mod bulk;
mod query;
mod single;

pub use bulk::UpsertOutcome;
pub use query::{QueryBuilder, SQL_CAPACITY};

/// Handle to the local mirror.
///
/// Cloning is cheap; clones share the connection pool and the write lock,
/// so write batches from any clone never interleave.
#[derive(Debug, Clone)]
pub struct Store {
    db: DatabaseConnection,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Connect to `database_url` and bring the schema up to date.
    #[cfg(feature = "migrate")]
    pub async fn open(database_url: &str) -> crate::Result<Self> {
        let db = crate::db::connect_and_migrate(database_url).await?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}
