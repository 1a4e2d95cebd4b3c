use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use models::message::Message;
use serde_json::{json, Value};
use service::{access::Identity, messages::{Inbox, SendMessage}};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[utoipa::path(post, path = "/messages/send", tag = "messages", request_body = crate::openapi::MessageRequest, responses((status = 200, description = "Message stored"), (status = 404, description = "Unknown recipient")))]
pub async fn send(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Json(input), _): ApiJson<SendMessage>,
) -> Result<Json<Message>, JsonApiError> {
    Ok(Json(state.messages.send(&identity, input).await?))
}

#[utoipa::path(get, path = "/messages/inbox", tag = "messages", responses((status = 200, description = "Received messages and unread count")))]
pub async fn inbox(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> Result<Json<Inbox>, JsonApiError> {
    Ok(Json(state.messages.inbox(&identity).await?))
}

#[utoipa::path(get, path = "/messages/sent", tag = "messages", responses((status = 200, description = "Sent messages")))]
pub async fn sent(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> Result<Json<Value>, JsonApiError> {
    let messages = state.messages.sent(&identity).await?;
    Ok(Json(json!({ "messages": messages })))
}

#[utoipa::path(post, path = "/messages/{id}/read", tag = "messages", params(("id" = u64, Path, description = "Message id")), responses((status = 200, description = "Marked read"), (status = 403, description = "Not the recipient")))]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(id), _): ApiPath<u64>,
) -> Result<Json<Message>, JsonApiError> {
    Ok(Json(state.messages.mark_read(&identity, id).await?))
}
