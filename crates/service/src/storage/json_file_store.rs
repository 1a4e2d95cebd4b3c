use std::{marker::PhantomData, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use super::record_store::{decode_or_default, Collection, RecordStore, StoreError, Version};

/// JSON file-backed record store.
///
/// Every save writes the whole collection to a fresh side file next to the
/// canonical one and renames it into place, so readers only ever observe a
/// complete old or complete new document. The version token is the SHA-256 of
/// the document bytes.
pub struct JsonFileStore<C> {
    name: String,
    file_path: PathBuf,
    // serialises compare-and-rename within this process
    write_lock: Mutex<()>,
    _collection: PhantomData<fn() -> C>,
}

/// A fully written side file that has not been renamed into place yet.
#[derive(Debug)]
pub struct StagedDocument {
    collection: String,
    temp_path: PathBuf,
    target: PathBuf,
    version: Version,
}

impl StagedDocument {
    pub fn temp_path(&self) -> &Path { &self.temp_path }

    /// Atomically make the staged document canonical.
    pub async fn commit(self) -> Result<Version, StoreError> {
        if let Err(e) = fs::rename(&self.temp_path, &self.target).await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(StoreError::io(&self.collection, e));
        }
        Ok(self.version)
    }

    /// Drop the side file without touching the canonical document.
    pub async fn discard(self) {
        let _ = fs::remove_file(&self.temp_path).await;
    }
}

impl<C: Collection> JsonFileStore<C> {
    /// Open the store at `path`. The parent directory is created if missing and
    /// side files left behind by an interrupted save are removed. The document
    /// itself is not created until the first save.
    pub async fn open<P: Into<PathBuf>>(name: &str, path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| StoreError::io(name, e))?;
        }
        let store = Self {
            name: name.to_string(),
            file_path,
            write_lock: Mutex::new(()),
            _collection: PhantomData,
        };
        store.sweep_side_files().await;
        Ok(Arc::new(store))
    }

    pub fn path(&self) -> &Path { &self.file_path }

    fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    fn dir(&self) -> PathBuf {
        match self.file_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn side_prefix(&self) -> String {
        format!(".{}.", self.file_name())
    }

    fn side_path(&self) -> PathBuf {
        self.dir().join(format!("{}{}.tmp", self.side_prefix(), Uuid::new_v4().simple()))
    }

    async fn sweep_side_files(&self) {
        let prefix = self.side_prefix();
        let Ok(mut entries) = fs::read_dir(self.dir()).await else { return };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".tmp") {
                debug!(collection = %self.name, side_file = %name, "removing stale side file");
                let _ = fs::remove_file(entry.path()).await;
            }
        }
    }

    async fn read_bytes(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.file_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.name, e)),
        }
    }

    async fn current_version(&self) -> Result<Version, StoreError> {
        Ok(self.read_bytes().await?.map(|b| digest(&b)).unwrap_or(Version::Absent))
    }

    /// Write `collection` to a side file and flush it, without publishing it.
    pub async fn stage(&self, collection: &C) -> Result<StagedDocument, StoreError> {
        let data = serde_json::to_vec_pretty(collection).map_err(|e| StoreError::encode(&self.name, e))?;
        let temp_path = self.side_path();
        let write = async {
            let mut file = fs::OpenOptions::new().write(true).create_new(true).open(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(&self.name, e));
        }
        Ok(StagedDocument {
            collection: self.name.clone(),
            temp_path,
            target: self.file_path.clone(),
            version: digest(&data),
        })
    }
}

fn digest(bytes: &[u8]) -> Version {
    Version::Digest(hex::encode(Sha256::digest(bytes)))
}

#[async_trait]
impl<C: Collection> RecordStore<C> for JsonFileStore<C> {
    fn name(&self) -> &str { &self.name }

    async fn load_versioned(&self) -> Result<(C, Version), StoreError> {
        match self.read_bytes().await? {
            None => Ok((C::default(), Version::Absent)),
            Some(bytes) => {
                let version = digest(&bytes);
                Ok((decode_or_default(&self.name, &bytes), version))
            }
        }
    }

    async fn save_if(&self, expected: &Version, collection: &C) -> Result<Version, StoreError> {
        let _guard = self.write_lock.lock().await;
        let current = self.current_version().await?;
        if &current != expected {
            return Err(StoreError::conflict(&self.name));
        }
        self.stage(collection).await?.commit().await
    }

    async fn save(&self, collection: &C) -> Result<Version, StoreError> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage(collection).await?;
        let version = staged.commit().await;
        if version.is_err() {
            warn!(collection = %self.name, "save failed; previous document left in place");
        }
        version
    }
}
