use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use models::record_document;
use sea_orm::DatabaseConnection;

use super::record_store::{decode_or_default, Collection, RecordStore, StoreError, Version};

/// Record store backed by one row of the `record_document` table.
pub struct SqlDocumentStore<C> {
    name: String,
    db: DatabaseConnection,
    _collection: PhantomData<fn() -> C>,
}

impl<C: Collection> SqlDocumentStore<C> {
    pub fn new(db: DatabaseConnection, name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), db, _collection: PhantomData })
    }

    fn encode(&self, collection: &C) -> Result<String, StoreError> {
        serde_json::to_string(collection).map_err(|e| StoreError::encode(&self.name, e))
    }
}

#[async_trait]
impl<C: Collection> RecordStore<C> for SqlDocumentStore<C> {
    fn name(&self) -> &str { &self.name }

    async fn load_versioned(&self) -> Result<(C, Version), StoreError> {
        let row = record_document::find(&self.db, &self.name)
            .await
            .map_err(|e| StoreError::db(&self.name, e))?;
        Ok(match row {
            None => (C::default(), Version::Absent),
            Some(row) => (decode_or_default(&self.name, row.document.as_bytes()), Version::Counter(row.version)),
        })
    }

    async fn save_if(&self, expected: &Version, collection: &C) -> Result<Version, StoreError> {
        let expected = match expected {
            Version::Absent => 0,
            Version::Counter(n) => *n,
            Version::Digest(_) => return Err(StoreError::conflict(&self.name)),
        };
        let document = self.encode(collection)?;
        match record_document::compare_and_swap(&self.db, &self.name, expected, document)
            .await
            .map_err(|e| StoreError::db(&self.name, e))?
        {
            Some(v) => Ok(Version::Counter(v)),
            None => Err(StoreError::conflict(&self.name)),
        }
    }

    async fn save(&self, collection: &C) -> Result<Version, StoreError> {
        let document = self.encode(collection)?;
        let v = record_document::overwrite(&self.db, &self.name, document)
            .await
            .map_err(|e| StoreError::db(&self.name, e))?;
        Ok(Version::Counter(v))
    }
}
