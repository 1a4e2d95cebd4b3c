use axum::{extract::State, Extension, Json};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use serde_json::{json, Value};
use service::{
    access::{session_gate, Gate, Identity},
    auth::domain::{LoginInput, RegisterInput},
};
use models::user::UserSummary;

use crate::auth::{clear_session, session_cookie, SESSION_COOKIE};
use crate::errors::JsonApiError;
use crate::extract::ApiJson;
use crate::metrics::LOGIN_FAILURES_TOTAL;
use crate::state::AppState;

#[utoipa::path(post, path = "/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Invalid or duplicate")))]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(input), _): ApiJson<RegisterInput>,
) -> Result<Json<Value>, JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok(Json(json!({ "message": "registration successful", "user": user })))
}

#[utoipa::path(post, path = "/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in, session cookie set"), (status = 401, description = "Invalid credentials"), (status = 403, description = "Account deactivated")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(input), _): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<Value>), JsonApiError> {
    let session = match state.auth.login(input).await {
        Ok(s) => s,
        Err(e) => {
            LOGIN_FAILURES_TOTAL.inc();
            return Err(e.into());
        }
    };
    let jar = jar.add(session_cookie(session.token, state.secure_cookie));
    Ok((jar, Json(json!({ "message": "login successful", "user": session.user }))))
}

#[utoipa::path(post, path = "/logout", tag = "auth", responses((status = 200, description = "Session cleared")))]
pub async fn logout(jar: CookieJar, Extension(identity): Extension<Identity>) -> (CookieJar, Json<Value>) {
    tracing::info!(user_id = %identity.user_id, "user_logged_out");
    (clear_session(jar), Json(json!({ "message": "logged out successfully" })))
}

/// Never fails for anonymous callers.
#[utoipa::path(get, path = "/user-info", tag = "auth", responses((status = 200, description = "Login state")))]
pub async fn user_info(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Value>, JsonApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let Gate::Authorized(identity) = session_gate(&state.auth, token.as_deref()).await? else {
        return Ok(Json(json!({ "logged_in": false })));
    };
    match state.auth.find_user(&identity.user_id).await? {
        Some(user) => Ok(Json(json!({ "logged_in": true, "user": UserSummary::from(&user) }))),
        None => Ok(Json(json!({ "logged_in": false }))),
    }
}
