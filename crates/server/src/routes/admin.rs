use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use models::user::UserSummary;
use serde_json::{json, Value};
use service::{
    access::Identity,
    admin::{Analytics, BackupReport, DeletedUser, UserPatch},
};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[utoipa::path(get, path = "/admin/users", tag = "admin", responses((status = 200, description = "All users without credentials"), (status = 403, description = "Admin only")))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, JsonApiError> {
    let users = state.admin.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

#[utoipa::path(patch, path = "/admin/user/{id}", tag = "admin", params(("id" = String, Path, description = "User id")), request_body = crate::openapi::UserPatchRequest, responses((status = 200, description = "Updated user"), (status = 400, description = "Self-demotion or invalid email")))]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Identity>,
    WithRejection(Path(id), _): ApiPath<String>,
    WithRejection(Json(patch), _): ApiJson<UserPatch>,
) -> Result<Json<UserSummary>, JsonApiError> {
    Ok(Json(state.admin.update_user(&actor, &id, patch).await?))
}

#[utoipa::path(post, path = "/admin/users/{id}/toggle-status", tag = "admin", params(("id" = String, Path, description = "User id")), responses((status = 200, description = "Updated user")))]
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Identity>,
    WithRejection(Path(id), _): ApiPath<String>,
) -> Result<Json<UserSummary>, JsonApiError> {
    Ok(Json(state.admin.toggle_status(&actor, &id).await?))
}

#[utoipa::path(delete, path = "/admin/users/{id}/delete", tag = "admin", params(("id" = String, Path, description = "User id")), responses((status = 200, description = "User and their files removed")))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Identity>,
    WithRejection(Path(id), _): ApiPath<String>,
) -> Result<Json<DeletedUser>, JsonApiError> {
    Ok(Json(state.admin.delete_user(&actor, &id).await?))
}

#[utoipa::path(get, path = "/analytics", tag = "admin", responses((status = 200, description = "Library totals")))]
pub async fn analytics(State(state): State<AppState>) -> Result<Json<Analytics>, JsonApiError> {
    Ok(Json(state.admin.analytics().await?))
}

#[utoipa::path(post, path = "/admin/backup", tag = "admin", responses((status = 200, description = "Backup written")))]
pub async fn backup(State(state): State<AppState>) -> Result<Json<BackupReport>, JsonApiError> {
    Ok(Json(state.admin.backup().await?))
}
