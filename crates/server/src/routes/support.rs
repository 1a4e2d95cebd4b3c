use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use models::ticket::Ticket;
use serde_json::{json, Value};
use service::{
    access::Identity,
    support::{AdminResponse, NewTicket, ReplyInput},
};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[utoipa::path(post, path = "/support/tickets", tag = "support", request_body = crate::openapi::TicketRequest, responses((status = 200, description = "Ticket created"), (status = 400, description = "Title or description missing")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Json(input), _): ApiJson<NewTicket>,
) -> Result<Json<Ticket>, JsonApiError> {
    Ok(Json(state.support.create(&identity, input).await?))
}

/// Own tickets; admins see every ticket.
#[utoipa::path(get, path = "/support/tickets", tag = "support", responses((status = 200, description = "Tickets, newest first")))]
pub async fn list(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> Result<Json<Value>, JsonApiError> {
    let tickets = state.support.list(&identity).await?;
    Ok(Json(json!({ "tickets": tickets })))
}

#[utoipa::path(get, path = "/support/tickets/{id}", tag = "support", params(("id" = u64, Path, description = "Ticket id")), responses((status = 200, description = "Ticket"), (status = 403, description = "Not yours"), (status = 404, description = "Unknown ticket")))]
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(id), _): ApiPath<u64>,
) -> Result<Json<Ticket>, JsonApiError> {
    Ok(Json(state.support.get(&identity, id).await?))
}

#[utoipa::path(post, path = "/support/tickets/{id}/reply", tag = "support", params(("id" = u64, Path, description = "Ticket id")), request_body = crate::openapi::ReplyRequest, responses((status = 200, description = "Updated ticket")))]
pub async fn reply(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(id), _): ApiPath<u64>,
    WithRejection(Json(input), _): ApiJson<ReplyInput>,
) -> Result<Json<Ticket>, JsonApiError> {
    Ok(Json(state.support.reply(&identity, id, input).await?))
}

#[utoipa::path(post, path = "/admin/tickets/{id}/respond", tag = "admin", params(("id" = u64, Path, description = "Ticket id")), request_body = crate::openapi::RespondRequest, responses((status = 200, description = "Updated ticket")))]
pub async fn respond(
    State(state): State<AppState>,
    WithRejection(Path(id), _): ApiPath<u64>,
    WithRejection(Json(input), _): ApiJson<AdminResponse>,
) -> Result<Json<Ticket>, JsonApiError> {
    Ok(Json(state.support.respond(id, input).await?))
}
