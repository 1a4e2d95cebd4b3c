//! Friend invitations.

use std::sync::Arc;

use chrono::Utc;
use models::{invitation::Invitation, user::validate_email, Invitations};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access::{ensure_owner_or_admin, Identity};
use crate::errors::ServiceError;
use crate::storage::{transact, RecordStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteInput {
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Delivers an invitation to the invitee.
pub trait InviteNotifier: Send + Sync {
    fn notify(&self, invitation: &Invitation);
}

/// Emits the invitation as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl InviteNotifier for LogNotifier {
    fn notify(&self, invitation: &Invitation) {
        info!(
            to = %invitation.email,
            from = %invitation.invited_by,
            link = %invitation.invite_link,
            message = %invitation.message,
            "invite_email"
        );
    }
}

pub struct InviteService {
    invitations: Arc<dyn RecordStore<Invitations>>,
    notifier: Arc<dyn InviteNotifier>,
    public_base_url: String,
}

impl InviteService {
    pub fn new(
        invitations: Arc<dyn RecordStore<Invitations>>,
        notifier: Arc<dyn InviteNotifier>,
        public_base_url: &str,
    ) -> Self {
        Self { invitations, notifier, public_base_url: public_base_url.trim_end_matches('/').to_string() }
    }

    #[instrument(skip(self, identity, input), fields(user_id = %identity.user_id))]
    pub async fn send(&self, identity: &Identity, input: InviteInput) -> Result<Invitation, ServiceError> {
        let email = input.email.trim().to_string();
        if email.is_empty() {
            return Err(ServiceError::Validation("email is required".into()));
        }
        validate_email(&email)?;
        let message = input.message.trim().to_string();

        let invitation = transact(self.invitations.as_ref(), |invitations: &mut Invitations| {
            let code = loop {
                let code = invite_code(&identity.username, &email);
                if !invitations.contains_key(&code) {
                    break code;
                }
            };
            let invitation = Invitation {
                invite_link: format!("{}/?invite={}&from={}", self.public_base_url, code, identity.username),
                code: code.clone(),
                email: email.clone(),
                invited_by: identity.username.clone(),
                inviter_id: identity.user_id.clone(),
                message: message.clone(),
                created_at: Utc::now(),
                used: false,
            };
            invitations.insert(code, invitation.clone());
            Ok::<_, ServiceError>(invitation)
        })
        .await?;

        self.notifier.notify(&invitation);
        info!(code = %invitation.code, "invite_sent");
        Ok(invitation)
    }

    /// Invitations sent by the caller, newest first.
    pub async fn list_own(&self, identity: &Identity) -> Result<Vec<Invitation>, ServiceError> {
        let mut out: Vec<Invitation> = self
            .invitations
            .load()
            .await?
            .into_values()
            .filter(|i| i.inviter_id == identity.user_id)
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    /// Remove an invitation. Inviter or admin only.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn delete(&self, identity: &Identity, code: &str) -> Result<(), ServiceError> {
        transact(self.invitations.as_ref(), |invitations: &mut Invitations| {
            let inv = invitations.get(code).ok_or_else(|| ServiceError::not_found("invitation"))?;
            ensure_owner_or_admin(identity, &inv.inviter_id)?;
            invitations.remove(code);
            Ok::<_, ServiceError>(())
        })
        .await?;
        info!(code = %code, "invite_deleted");
        Ok(())
    }
}

/// Eight hex characters derived from inviter, invitee and a random nonce.
fn invite_code(username: &str, email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(email.as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}
