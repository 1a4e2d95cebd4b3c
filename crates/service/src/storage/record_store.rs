use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Anything a record store can persist as one document.
pub trait Collection: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<T> Collection for T where T: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// Opaque token identifying one persisted version of a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Version {
    /// Nothing has been persisted yet.
    Absent,
    /// SHA-256 of the document bytes (file backend).
    Digest(String),
    /// Row version counter (relational and in-memory backends).
    Counter(i64),
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Absent => f.write_str("absent"),
            Version::Digest(d) => write!(f, "sha256:{}", &d[..d.len().min(12)]),
            Version::Counter(n) => write!(f, "v{n}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}: io error: {message}")]
    Io { collection: String, message: String },
    #[error("{collection}: encode error: {message}")]
    Encode { collection: String, message: String },
    #[error("{collection}: database error: {message}")]
    Db { collection: String, message: String },
    #[error("{collection}: concurrent modification")]
    Conflict { collection: String },
}

impl StoreError {
    pub fn io(collection: &str, e: impl fmt::Display) -> Self {
        Self::Io { collection: collection.to_string(), message: e.to_string() }
    }

    pub fn encode(collection: &str, e: impl fmt::Display) -> Self {
        Self::Encode { collection: collection.to_string(), message: e.to_string() }
    }

    pub fn db(collection: &str, e: impl fmt::Display) -> Self {
        Self::Db { collection: collection.to_string(), message: e.to_string() }
    }

    pub fn conflict(collection: &str) -> Self {
        Self::Conflict { collection: collection.to_string() }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Persists one named collection as a single document.
///
/// `load` never fails on a missing or unreadable document: both yield
/// `C::default()`, and the next save overwrites whatever was there. Only
/// environmental failures (permissions, full disk, lost database) surface as
/// errors.
#[async_trait]
pub trait RecordStore<C: Collection>: Send + Sync {
    /// Collection name, used in logs and errors.
    fn name(&self) -> &str;

    /// Current collection plus the version it was read at.
    async fn load_versioned(&self) -> Result<(C, Version), StoreError>;

    /// Replace the document only if it is still at `expected`.
    async fn save_if(&self, expected: &Version, collection: &C) -> Result<Version, StoreError>;

    /// Replace the document unconditionally (last writer wins).
    async fn save(&self, collection: &C) -> Result<Version, StoreError>;

    async fn load(&self) -> Result<C, StoreError> {
        Ok(self.load_versioned().await?.0)
    }
}

/// Attempts made by [`transact`] before giving up on a contended collection.
pub const MAX_ATTEMPTS: usize = 8;

/// Read-modify-write with compare-and-swap.
///
/// `mutate` runs against a fresh snapshot on every attempt, so it must not
/// have side effects outside the collection. An `Err` from `mutate` aborts
/// without writing.
pub async fn transact<C, T, E, F>(store: &dyn RecordStore<C>, mut mutate: F) -> Result<T, E>
where
    C: Collection,
    F: FnMut(&mut C) -> Result<T, E> + Send,
    T: Send,
    E: From<StoreError> + Send,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let (mut collection, version) = store.load_versioned().await?;
        let out = mutate(&mut collection)?;
        match store.save_if(&version, &collection).await {
            Ok(_) => return Ok(out),
            Err(e) if e.is_conflict() => {
                debug!(collection = store.name(), attempt, %version, "store_conflict_retry");
                tokio::task::yield_now().await;
            }
            Err(e) => return Err(e.into()),
        }
    }
    warn!(collection = store.name(), attempts = MAX_ATTEMPTS, "store_conflict_exhausted");
    Err(StoreError::conflict(store.name()).into())
}

/// Decode a stored document, treating garbage as an empty collection.
pub(crate) fn decode_or_default<C: Collection>(name: &str, bytes: &[u8]) -> C {
    match serde_json::from_slice(bytes) {
        Ok(c) => c,
        Err(e) => {
            warn!(collection = name, error = %e, "corrupt document treated as empty; next save overwrites it");
            C::default()
        }
    }
}
