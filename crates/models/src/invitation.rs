use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Invitation sent by a user to a friend, keyed by its code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub code: String,
    pub email: String,
    pub invited_by: String,
    pub inviter_id: String,
    #[serde(default)]
    pub message: String,
    pub invite_link: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
}
