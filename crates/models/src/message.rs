use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direct message between two users; never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sender_id: String,
    pub sender: String,
    pub recipient_id: String,
    pub recipient: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}
