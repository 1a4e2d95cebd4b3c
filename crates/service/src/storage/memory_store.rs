use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::record_store::{decode_or_default, Collection, RecordStore, StoreError, Version};

/// In-process record store. Holds the serialized document, not the live
/// collection, so every load hands out an independent snapshot just like the
/// persistent backends do.
pub struct MemoryStore<C> {
    name: String,
    slot: Mutex<Option<(Vec<u8>, i64)>>,
    _collection: PhantomData<fn() -> C>,
}

impl<C: Collection> MemoryStore<C> {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), slot: Mutex::new(None), _collection: PhantomData })
    }

    /// Replace the raw document, e.g. with garbage to exercise corrupt loads.
    pub async fn put_raw(&self, bytes: impl Into<Vec<u8>>) {
        let mut slot = self.slot.lock().await;
        let next = slot.as_ref().map(|(_, v)| v + 1).unwrap_or(1);
        *slot = Some((bytes.into(), next));
    }
}

#[async_trait]
impl<C: Collection> RecordStore<C> for MemoryStore<C> {
    fn name(&self) -> &str { &self.name }

    async fn load_versioned(&self) -> Result<(C, Version), StoreError> {
        let slot = self.slot.lock().await;
        Ok(match slot.as_ref() {
            None => (C::default(), Version::Absent),
            Some((bytes, v)) => (decode_or_default(&self.name, bytes), Version::Counter(*v)),
        })
    }

    async fn save_if(&self, expected: &Version, collection: &C) -> Result<Version, StoreError> {
        let bytes = serde_json::to_vec(collection).map_err(|e| StoreError::encode(&self.name, e))?;
        let mut slot = self.slot.lock().await;
        let current = slot.as_ref().map(|(_, v)| Version::Counter(*v)).unwrap_or(Version::Absent);
        if &current != expected {
            return Err(StoreError::conflict(&self.name));
        }
        let next = slot.as_ref().map(|(_, v)| v + 1).unwrap_or(1);
        *slot = Some((bytes, next));
        Ok(Version::Counter(next))
    }

    async fn save(&self, collection: &C) -> Result<Version, StoreError> {
        let bytes = serde_json::to_vec(collection).map_err(|e| StoreError::encode(&self.name, e))?;
        let mut slot = self.slot.lock().await;
        let next = slot.as_ref().map(|(_, v)| v + 1).unwrap_or(1);
        *slot = Some((bytes, next));
        Ok(Version::Counter(next))
    }
}
