use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use models::{
    file_record::{bytes_to_mb, normalize_category, parse_tags, FileRecord},
    Files, Users,
};
use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, instrument, warn};

use super::naming::{is_plain_name, reserve_unique, sanitize_filename};
use crate::access::{ensure_owner_or_admin, Identity};
use crate::errors::ServiceError;
use crate::storage::{transact, RecordStore};

/// Upload as received from the client.
#[derive(Debug, Default)]
pub struct UploadInput {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadOutcome {
    pub filename: String,
    pub original_name: String,
}

/// Filters for the public file listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// File record as listed, with the size in megabytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileView {
    #[serde(flatten)]
    pub record: FileRecord,
    pub size_mb: f64,
}

impl From<FileRecord> for FileView {
    fn from(record: FileRecord) -> Self {
        let size_mb = bytes_to_mb(record.size_bytes);
        Self { record, size_mb }
    }
}

/// A stored blob ready to be served.
#[derive(Debug, Clone)]
pub struct Blob {
    pub filename: String,
    pub path: PathBuf,
}

pub struct FileService {
    files: Arc<dyn RecordStore<Files>>,
    users: Arc<dyn RecordStore<Users>>,
    upload_dir: PathBuf,
    max_upload_bytes: u64,
}

impl FileService {
    pub fn new(
        files: Arc<dyn RecordStore<Files>>,
        users: Arc<dyn RecordStore<Users>>,
        upload_dir: impl Into<PathBuf>,
        max_upload_bytes: u64,
    ) -> Self {
        Self { files, users, upload_dir: upload_dir.into(), max_upload_bytes }
    }

    pub fn max_upload_bytes(&self) -> u64 { self.max_upload_bytes }

    fn blob_path(&self, name: &str) -> PathBuf { self.upload_dir.join(name) }

    /// Store a PDF under a unique name and record its metadata.
    #[instrument(skip(self, identity, input), fields(user_id = %identity.user_id, size = input.bytes.len()))]
    pub async fn upload(&self, identity: &Identity, input: UploadInput) -> Result<UploadOutcome, ServiceError> {
        let raw = input.filename.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(ServiceError::Validation("no file selected".into()));
        }
        let original_name = sanitize_filename(raw).ok_or_else(|| ServiceError::Validation("invalid filename".into()))?;
        if !original_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ServiceError::Validation("only PDF files are allowed".into()));
        }
        if input.bytes.len() as u64 > self.max_upload_bytes {
            return Err(ServiceError::Validation(format!(
                "file size exceeds {}MB limit",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }
        let category = normalize_category(input.category.as_deref().unwrap_or_default()).to_string();
        let description = input.description.as_deref().map(str::trim).unwrap_or_default().to_string();
        let tags = parse_tags(input.tags.as_deref().unwrap_or_default());

        fs::create_dir_all(&self.upload_dir).await.map_err(ServiceError::storage)?;
        let (stored, mut file) = reserve_unique(&self.upload_dir, &original_name)
            .await
            .map_err(ServiceError::storage)?;
        let write = async {
            file.write_all(&input.bytes).await?;
            file.sync_all().await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(self.blob_path(&stored)).await;
            return Err(ServiceError::storage(e));
        }

        let record = FileRecord {
            filename: stored.clone(),
            original_name: original_name.clone(),
            upload_date: Utc::now(),
            size_bytes: input.bytes.len() as u64,
            download_count: 0,
            category,
            description,
            tags,
            uploaded_by: identity.username.clone(),
            owner_id: identity.user_id.clone(),
            is_featured: false,
        };
        let inserted = transact(self.files.as_ref(), |files: &mut Files| {
            files.insert(record.filename.clone(), record.clone());
            Ok::<_, ServiceError>(())
        })
        .await;
        if let Err(e) = inserted {
            let _ = fs::remove_file(self.blob_path(&stored)).await;
            return Err(e);
        }

        transact(self.users.as_ref(), |users: &mut Users| {
            if let Some(u) = users.get_mut(&identity.user_id) {
                u.uploads_count += 1;
            }
            Ok::<_, ServiceError>(())
        })
        .await?;

        info!(filename = %stored, original_name = %original_name, "file_uploaded");
        Ok(UploadOutcome { filename: stored, original_name })
    }

    /// Every recorded file matching `query`, newest first.
    pub async fn list(&self, query: &FileQuery) -> Result<Vec<FileView>, ServiceError> {
        let files = self.files.load().await?;
        let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty() && *c != "all");
        let needle = query.search.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        let mut out: Vec<FileView> = files
            .into_values()
            .filter(|f| category.map_or(true, |c| f.category.eq_ignore_ascii_case(c)))
            .filter(|f| query.featured.map_or(true, |want| f.is_featured == want))
            .filter(|f| match &needle {
                None => true,
                Some(n) => {
                    f.original_name.to_lowercase().contains(n)
                        || f.description.to_lowercase().contains(n)
                        || f.tags.iter().any(|t| t.to_lowercase().contains(n))
                }
            })
            .map(FileView::from)
            .collect();
        out.sort_by(|a, b| b.record.upload_date.cmp(&a.record.upload_date));
        Ok(out)
    }

    /// Count a download against the file and the caller, then hand out the blob.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn download(&self, identity: &Identity, name: &str) -> Result<Blob, ServiceError> {
        let blob = self.existing_blob(name).await?;
        let counted = transact(self.files.as_ref(), |files: &mut Files| {
            let Some(f) = files.get_mut(name) else {
                return Err(ServiceError::not_found("file"));
            };
            f.download_count += 1;
            Ok(f.download_count)
        })
        .await?;
        transact(self.users.as_ref(), |users: &mut Users| {
            if let Some(u) = users.get_mut(&identity.user_id) {
                u.downloads_count += 1;
            }
            Ok::<_, ServiceError>(())
        })
        .await?;
        info!(filename = %name, download_count = counted, "file_downloaded");
        Ok(blob)
    }

    /// The blob for inline viewing; nothing is counted.
    pub async fn preview(&self, name: &str) -> Result<Blob, ServiceError> {
        self.existing_blob(name).await
    }

    async fn existing_blob(&self, name: &str) -> Result<Blob, ServiceError> {
        if !is_plain_name(name) {
            return Err(ServiceError::not_found("file"));
        }
        if !self.files.load().await?.contains_key(name) {
            return Err(ServiceError::not_found("file"));
        }
        let path = self.blob_path(name);
        match fs::metadata(&path).await {
            Ok(m) if m.is_file() => Ok(Blob { filename: name.to_string(), path }),
            Ok(_) => Err(ServiceError::not_found("file")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServiceError::not_found("file")),
            Err(e) => Err(ServiceError::storage(e)),
        }
    }

    /// Remove a file's metadata and blob. Owner or admin only.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn delete(&self, identity: &Identity, name: &str) -> Result<(), ServiceError> {
        if !is_plain_name(name) {
            return Err(ServiceError::not_found("file"));
        }
        let current = self.files.load().await?;
        let record = current.get(name).ok_or_else(|| ServiceError::not_found("file"))?;
        ensure_owner_or_admin(identity, &record.owner_id)?;

        transact(self.files.as_ref(), |files: &mut Files| {
            let record = files.get(name).ok_or_else(|| ServiceError::not_found("file"))?;
            ensure_owner_or_admin(identity, &record.owner_id)?;
            files.remove(name);
            Ok::<_, ServiceError>(())
        })
        .await?;
        self.remove_blob(name).await;
        info!(filename = %name, "file_deleted");
        Ok(())
    }

    /// Flip the featured flag; returns the new value.
    #[instrument(skip(self))]
    pub async fn toggle_featured(&self, name: &str) -> Result<bool, ServiceError> {
        let featured = transact(self.files.as_ref(), |files: &mut Files| {
            let f = files.get_mut(name).ok_or_else(|| ServiceError::not_found("file"))?;
            f.is_featured = !f.is_featured;
            Ok::<_, ServiceError>(f.is_featured)
        })
        .await?;
        info!(filename = %name, featured, "file_featured_toggled");
        Ok(featured)
    }

    /// Drop every file owned by `owner_id`; returns the removed names.
    pub async fn delete_owned_by(&self, owner_id: &str) -> Result<Vec<String>, ServiceError> {
        let removed = transact(self.files.as_ref(), |files: &mut Files| {
            let names: Vec<String> = files
                .values()
                .filter(|f| f.owner_id == owner_id)
                .map(|f| f.filename.clone())
                .collect();
            for n in &names {
                files.remove(n);
            }
            Ok::<_, ServiceError>(names)
        })
        .await?;
        for name in &removed {
            self.remove_blob(name).await;
        }
        Ok(removed)
    }

    async fn remove_blob(&self, name: &str) {
        match fs::remove_file(self.blob_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(filename = %name, error = %e, "blob removal failed; metadata already gone"),
        }
    }
}
