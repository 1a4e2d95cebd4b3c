//! Record stores: one persisted document per collection.
//!
//! Services receive the stores they need through [`Stores`]; nothing reaches
//! for a global. The JSON backend writes `<data_dir>/<document>`, the SQL
//! backend keeps one `record_document` row per collection, and the memory
//! backend exists for tests.

pub mod record_store;
pub mod json_file_store;
pub mod sql_document_store;
pub mod memory_store;

use std::{path::Path, sync::Arc};

use models::{Files, Invitations, Messages, Tickets, Users};
use sea_orm::DatabaseConnection;
use serde::Serialize;

pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use record_store::{transact, Collection, RecordStore, StoreError, Version, MAX_ATTEMPTS};
pub use sql_document_store::SqlDocumentStore;

/// Collection name and the document it persists to.
pub const USERS: (&str, &str) = ("users", "users.json");
pub const FILES: (&str, &str) = ("files", "file_metadata.json");
pub const INVITATIONS: (&str, &str) = ("invitations", "invitations.json");
pub const TICKETS: (&str, &str) = ("tickets", "tickets.json");
pub const MESSAGES: (&str, &str) = ("messages", "messages.json");

/// The store instance for every collection. Cloning shares the instances.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn RecordStore<Users>>,
    pub files: Arc<dyn RecordStore<Files>>,
    pub invitations: Arc<dyn RecordStore<Invitations>>,
    pub tickets: Arc<dyn RecordStore<Tickets>>,
    pub messages: Arc<dyn RecordStore<Messages>>,
}

impl Stores {
    /// JSON documents under `data_dir`.
    pub async fn json(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = data_dir.as_ref();
        Ok(Self {
            users: JsonFileStore::<Users>::open(USERS.0, dir.join(USERS.1)).await?,
            files: JsonFileStore::<Files>::open(FILES.0, dir.join(FILES.1)).await?,
            invitations: JsonFileStore::<Invitations>::open(INVITATIONS.0, dir.join(INVITATIONS.1)).await?,
            tickets: JsonFileStore::<Tickets>::open(TICKETS.0, dir.join(TICKETS.1)).await?,
            messages: JsonFileStore::<Messages>::open(MESSAGES.0, dir.join(MESSAGES.1)).await?,
        })
    }

    /// Rows of `record_document` on an already migrated connection.
    pub fn sql(db: DatabaseConnection) -> Self {
        Self {
            users: SqlDocumentStore::<Users>::new(db.clone(), USERS.0),
            files: SqlDocumentStore::<Files>::new(db.clone(), FILES.0),
            invitations: SqlDocumentStore::<Invitations>::new(db.clone(), INVITATIONS.0),
            tickets: SqlDocumentStore::<Tickets>::new(db.clone(), TICKETS.0),
            messages: SqlDocumentStore::<Messages>::new(db, MESSAGES.0),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: MemoryStore::<Users>::new(USERS.0),
            files: MemoryStore::<Files>::new(FILES.0),
            invitations: MemoryStore::<Invitations>::new(INVITATIONS.0),
            tickets: MemoryStore::<Tickets>::new(TICKETS.0),
            messages: MemoryStore::<Messages>::new(MESSAGES.0),
        }
    }

    /// Current content of every collection as `(document name, pretty JSON)`.
    pub async fn snapshot(&self) -> Result<Vec<(&'static str, String)>, StoreError> {
        Ok(vec![
            (USERS.1, pretty(USERS.0, &self.users.load().await?)?),
            (FILES.1, pretty(FILES.0, &self.files.load().await?)?),
            (INVITATIONS.1, pretty(INVITATIONS.0, &self.invitations.load().await?)?),
            (TICKETS.1, pretty(TICKETS.0, &self.tickets.load().await?)?),
            (MESSAGES.1, pretty(MESSAGES.0, &self.messages.load().await?)?),
        ])
    }
}

fn pretty<T: Serialize>(name: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|e| StoreError::encode(name, e))
}
