//! Support tickets. Tickets are never deleted; ids come from the collection
//! counter.

use std::sync::Arc;

use chrono::Utc;
use models::{
    ticket::{Priority, Ticket, TicketReply, TicketStatus},
    Tickets,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::access::{ensure_owner_or_admin, Identity};
use crate::errors::ServiceError;
use crate::storage::{transact, RecordStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyInput {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResponse {
    pub response: String,
    #[serde(default = "resolved")]
    pub status: TicketStatus,
}

fn resolved() -> TicketStatus { TicketStatus::Resolved }

pub struct SupportService {
    tickets: Arc<dyn RecordStore<Tickets>>,
}

impl SupportService {
    pub fn new(tickets: Arc<dyn RecordStore<Tickets>>) -> Self { Self { tickets } }

    #[instrument(skip(self, identity, input), fields(user_id = %identity.user_id))]
    pub async fn create(&self, identity: &Identity, input: NewTicket) -> Result<Ticket, ServiceError> {
        let title = input.title.trim().to_string();
        let description = input.description.trim().to_string();
        if title.is_empty() || description.is_empty() {
            return Err(ServiceError::Validation("title and description are required".into()));
        }
        let priority = input.priority.unwrap_or_default();

        let ticket = transact(self.tickets.as_ref(), |tickets: &mut Tickets| {
            let id = tickets.push_with(|id| Ticket {
                id,
                owner_id: identity.user_id.clone(),
                user: identity.username.clone(),
                title: title.clone(),
                description: description.clone(),
                priority,
                status: TicketStatus::Open,
                created_date: Utc::now(),
                resolved_date: None,
                admin_response: None,
                replies: Vec::new(),
            });
            tickets.get(id).cloned().ok_or_else(|| ServiceError::storage("ticket vanished after insert"))
        })
        .await?;
        info!(ticket_id = ticket.id, "ticket_created");
        Ok(ticket)
    }

    /// The caller's tickets, or every ticket for an admin. Newest first.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Ticket>, ServiceError> {
        let tickets = self.tickets.load().await?;
        Ok(tickets
            .items
            .into_values()
            .rev()
            .filter(|t| identity.is_admin || t.owner_id == identity.user_id)
            .collect())
    }

    pub async fn get(&self, identity: &Identity, id: u64) -> Result<Ticket, ServiceError> {
        let tickets = self.tickets.load().await?;
        let ticket = tickets.get(id).ok_or_else(|| ServiceError::not_found("ticket"))?;
        ensure_owner_or_admin(identity, &ticket.owner_id)?;
        Ok(ticket.clone())
    }

    /// Append a reply. An owner replying to a resolved ticket reopens it.
    #[instrument(skip(self, identity, input), fields(user_id = %identity.user_id))]
    pub async fn reply(&self, identity: &Identity, id: u64, input: ReplyInput) -> Result<Ticket, ServiceError> {
        let body = input.body.trim().to_string();
        if body.is_empty() {
            return Err(ServiceError::Validation("reply body is required".into()));
        }
        let ticket = transact(self.tickets.as_ref(), |tickets: &mut Tickets| {
            let ticket = tickets.get_mut(id).ok_or_else(|| ServiceError::not_found("ticket"))?;
            ensure_owner_or_admin(identity, &ticket.owner_id)?;
            let from_owner = ticket.owner_id == identity.user_id;
            ticket.replies.push(TicketReply {
                author_id: identity.user_id.clone(),
                author: identity.username.clone(),
                body: body.clone(),
                created_at: Utc::now(),
                from_admin: identity.is_admin && !from_owner,
            });
            if from_owner && ticket.status == TicketStatus::Resolved {
                ticket.status = TicketStatus::Open;
                ticket.resolved_date = None;
            }
            Ok::<_, ServiceError>(ticket.clone())
        })
        .await?;
        info!(ticket_id = id, replies = ticket.replies.len(), "ticket_replied");
        Ok(ticket)
    }

    /// Admin answer; sets the status and stamps the resolution time.
    #[instrument(skip(self, input))]
    pub async fn respond(&self, id: u64, input: AdminResponse) -> Result<Ticket, ServiceError> {
        let response = input.response.trim().to_string();
        if response.is_empty() {
            return Err(ServiceError::Validation("response is required".into()));
        }
        let ticket = transact(self.tickets.as_ref(), |tickets: &mut Tickets| {
            let ticket = tickets.get_mut(id).ok_or_else(|| ServiceError::not_found("ticket"))?;
            ticket.admin_response = Some(response.clone());
            ticket.status = input.status;
            ticket.resolved_date = match input.status {
                TicketStatus::Resolved => Some(Utc::now()),
                _ => None,
            };
            Ok::<_, ServiceError>(ticket.clone())
        })
        .await?;
        info!(ticket_id = id, status = ?ticket.status, "ticket_responded");
        Ok(ticket)
    }

    /// Tickets not yet resolved.
    pub async fn open_count(&self) -> Result<usize, ServiceError> {
        let tickets = self.tickets.load().await?;
        Ok(tickets.items.values().filter(|t| t.status != TicketStatus::Resolved).count())
    }
}
