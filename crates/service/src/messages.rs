//! Direct messages between users.

use std::sync::Arc;

use chrono::Utc;
use models::{message::Message, Messages, Users};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::access::Identity;
use crate::errors::ServiceError;
use crate::storage::{transact, RecordStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessage {
    pub recipient: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inbox {
    pub messages: Vec<Message>,
    pub unread: usize,
}

pub struct MessageService {
    messages: Arc<dyn RecordStore<Messages>>,
    users: Arc<dyn RecordStore<Users>>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn RecordStore<Messages>>, users: Arc<dyn RecordStore<Users>>) -> Self {
        Self { messages, users }
    }

    #[instrument(skip(self, identity, input), fields(user_id = %identity.user_id, recipient = %input.recipient))]
    pub async fn send(&self, identity: &Identity, input: SendMessage) -> Result<Message, ServiceError> {
        let recipient_name = input.recipient.trim();
        let body = input.body.trim().to_string();
        if recipient_name.is_empty() || body.is_empty() {
            return Err(ServiceError::Validation("recipient and body are required".into()));
        }
        let users = self.users.load().await?;
        let recipient = users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(recipient_name) && u.is_active)
            .ok_or_else(|| ServiceError::not_found("recipient"))?;
        let subject = input.subject.trim().to_string();

        let message = transact(self.messages.as_ref(), |messages: &mut Messages| {
            let id = messages.push_with(|id| Message {
                id,
                sender_id: identity.user_id.clone(),
                sender: identity.username.clone(),
                recipient_id: recipient.id.clone(),
                recipient: recipient.username.clone(),
                subject: subject.clone(),
                body: body.clone(),
                sent_at: Utc::now(),
                read: false,
            });
            messages.get(id).cloned().ok_or_else(|| ServiceError::storage("message vanished after insert"))
        })
        .await?;
        info!(message_id = message.id, recipient_id = %message.recipient_id, "message_sent");
        Ok(message)
    }

    pub async fn inbox(&self, identity: &Identity) -> Result<Inbox, ServiceError> {
        let messages: Vec<Message> = self
            .messages
            .load()
            .await?
            .items
            .into_values()
            .rev()
            .filter(|m| m.recipient_id == identity.user_id)
            .collect();
        let unread = messages.iter().filter(|m| !m.read).count();
        Ok(Inbox { messages, unread })
    }

    pub async fn sent(&self, identity: &Identity) -> Result<Vec<Message>, ServiceError> {
        Ok(self
            .messages
            .load()
            .await?
            .items
            .into_values()
            .rev()
            .filter(|m| m.sender_id == identity.user_id)
            .collect())
    }

    /// Only the recipient can mark a message read.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn mark_read(&self, identity: &Identity, id: u64) -> Result<Message, ServiceError> {
        transact(self.messages.as_ref(), |messages: &mut Messages| {
            let m = messages.get_mut(id).ok_or_else(|| ServiceError::not_found("message"))?;
            if m.recipient_id != identity.user_id {
                return Err(ServiceError::forbidden());
            }
            m.read = true;
            Ok(m.clone())
        })
        .await
    }
}
