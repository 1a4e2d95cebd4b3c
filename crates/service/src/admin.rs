//! Administrator operations: user management, analytics and backups.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use chrono::Utc;
use models::{file_record::{bytes_to_mb, CATEGORIES}, user::{validate_email, UserSummary}, Users};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument};

use crate::access::Identity;
use crate::errors::ServiceError;
use crate::files::{FileQuery, FileService, FileView};
use crate::storage::{transact, RecordStore, Stores};
use crate::support::SupportService;

/// Partial update of a user; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedUser {
    pub user: UserSummary,
    pub files_removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub total_users: usize,
    pub active_users: usize,
    pub total_files: usize,
    pub total_downloads: u64,
    pub total_size_mb: f64,
    pub open_tickets: usize,
    pub categories: BTreeMap<String, usize>,
    pub recent_uploads: Vec<FileView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    pub path: String,
    pub documents: Vec<String>,
}

const RECENT_UPLOADS: usize = 10;

pub struct AdminService {
    stores: Stores,
    files: Arc<FileService>,
    support: Arc<SupportService>,
    data_dir: PathBuf,
}

impl AdminService {
    pub fn new(stores: Stores, files: Arc<FileService>, support: Arc<SupportService>, data_dir: impl Into<PathBuf>) -> Self {
        Self { stores, files, support, data_dir: data_dir.into() }
    }

    fn users(&self) -> &dyn RecordStore<Users> { self.stores.users.as_ref() }

    /// All users, oldest account first.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let users = self.users().load().await?;
        let mut out: Vec<UserSummary> = users.values().map(UserSummary::from).collect();
        out.sort_by(|a, b| a.join_date.cmp(&b.join_date).then_with(|| a.username.cmp(&b.username)));
        Ok(out)
    }

    #[instrument(skip(self, actor, patch), fields(actor = %actor.user_id))]
    pub async fn update_user(&self, actor: &Identity, id: &str, patch: UserPatch) -> Result<UserSummary, ServiceError> {
        if id == actor.user_id {
            if patch.is_admin == Some(false) {
                return Err(ServiceError::Validation("cannot remove your own admin rights".into()));
            }
            if patch.is_active == Some(false) {
                return Err(ServiceError::Validation("cannot deactivate your own account".into()));
            }
        }
        let email = match patch.email.as_deref().map(str::trim) {
            Some(e) => {
                validate_email(e)?;
                Some(e.to_string())
            }
            None => None,
        };
        let user = transact(self.users(), |users: &mut Users| {
            if let Some(e) = &email {
                if users.values().any(|u| u.id != id && u.email.eq_ignore_ascii_case(e)) {
                    return Err(ServiceError::Validation("email already registered".into()));
                }
            }
            let user = users.get_mut(id).ok_or_else(|| ServiceError::not_found("user"))?;
            if let Some(v) = patch.is_admin {
                user.is_admin = v;
            }
            if let Some(v) = patch.is_active {
                user.is_active = v;
            }
            if let Some(e) = &email {
                user.email = e.clone();
            }
            Ok(UserSummary::from(&*user))
        })
        .await?;
        info!(user_id = %user.id, is_admin = user.is_admin, is_active = user.is_active, "user_updated");
        Ok(user)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn toggle_status(&self, actor: &Identity, id: &str) -> Result<UserSummary, ServiceError> {
        if id == actor.user_id {
            return Err(ServiceError::Validation("cannot deactivate your own account".into()));
        }
        let user = transact(self.users(), |users: &mut Users| {
            let user = users.get_mut(id).ok_or_else(|| ServiceError::not_found("user"))?;
            user.is_active = !user.is_active;
            Ok::<_, ServiceError>(UserSummary::from(&*user))
        })
        .await?;
        info!(user_id = %user.id, is_active = user.is_active, "user_status_toggled");
        Ok(user)
    }

    /// Remove a user together with every file they uploaded.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete_user(&self, actor: &Identity, id: &str) -> Result<DeletedUser, ServiceError> {
        if id == actor.user_id {
            return Err(ServiceError::Validation("cannot delete your own account".into()));
        }
        let user = transact(self.users(), |users: &mut Users| {
            users
                .remove(id)
                .map(|u| UserSummary::from(&u))
                .ok_or_else(|| ServiceError::not_found("user"))
        })
        .await?;
        let removed = self.files.delete_owned_by(id).await?;
        info!(user_id = %user.id, files_removed = removed.len(), "user_deleted");
        Ok(DeletedUser { user, files_removed: removed.len() })
    }

    pub async fn analytics(&self) -> Result<Analytics, ServiceError> {
        let users = self.users().load().await?;
        let files = self.files.list(&FileQuery::default()).await?;
        let open_tickets = self.support.open_count().await?;

        let mut categories: BTreeMap<String, usize> = CATEGORIES.iter().map(|c| (c.to_string(), 0)).collect();
        for f in &files {
            *categories.entry(f.record.category.clone()).or_insert(0) += 1;
        }
        let total_bytes: u64 = files.iter().map(|f| f.record.size_bytes).sum();

        Ok(Analytics {
            total_users: users.len(),
            active_users: users.values().filter(|u| u.is_active).count(),
            total_files: files.len(),
            total_downloads: files.iter().map(|f| f.record.download_count).sum(),
            total_size_mb: bytes_to_mb(total_bytes),
            open_tickets,
            categories,
            recent_uploads: files.into_iter().take(RECENT_UPLOADS).collect(),
        })
    }

    /// Copy every collection to `<data_dir>/backups/<UTC timestamp>/`.
    #[instrument(skip(self))]
    pub async fn backup(&self) -> Result<BackupReport, ServiceError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let dir = self.data_dir.join("backups").join(&stamp);
        fs::create_dir_all(&dir).await.map_err(ServiceError::storage)?;

        let mut documents = Vec::new();
        for (name, body) in self.stores.snapshot().await? {
            fs::write(dir.join(name), body).await.map_err(ServiceError::storage)?;
            documents.push(name.to_string());
        }
        let path = dir.display().to_string();
        info!(path = %path, documents = documents.len(), "backup_written");
        Ok(BackupReport { path, documents })
    }
}
