use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use service::{access::Identity, invites::InviteInput};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[utoipa::path(post, path = "/send-invite", tag = "invites", request_body = crate::openapi::InviteRequest, responses((status = 200, description = "Invitation recorded"), (status = 400, description = "Email missing or invalid")))]
pub async fn send(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Json(input), _): ApiJson<InviteInput>,
) -> Result<Json<Value>, JsonApiError> {
    let invitation = state.invites.send(&identity, input).await?;
    Ok(Json(json!({
        "message": "invitation sent successfully",
        "invite_link": invitation.invite_link,
        "code": invitation.code,
    })))
}

#[utoipa::path(get, path = "/invites", tag = "invites", responses((status = 200, description = "Invitations sent by the caller")))]
pub async fn list(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> Result<Json<Value>, JsonApiError> {
    let invitations = state.invites.list_own(&identity).await?;
    Ok(Json(json!({ "invitations": invitations })))
}

#[utoipa::path(delete, path = "/invites/{code}", tag = "invites", params(("code" = String, Path, description = "Invite code")), responses((status = 200, description = "Deleted"), (status = 403, description = "Neither inviter nor admin"), (status = 404, description = "Unknown code")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(code), _): ApiPath<String>,
) -> Result<Json<Value>, JsonApiError> {
    state.invites.delete(&identity, &code).await?;
    Ok(Json(json!({ "message": "invitation deleted" })))
}
