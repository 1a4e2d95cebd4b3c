use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::{require_admin, require_session};
use crate::metrics;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod files;
pub mod invites;
pub mod messages;
pub mod support;

/// Multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public, session and admin groups,
/// docs, metrics and the static frontend as fallback.
pub fn build_router(state: AppState, cors: CorsLayer, frontend_dir: &str) -> Router {
    let index = format!("{}/index.html", frontend_dir.trim_end_matches('/'));
    let static_dir = ServeDir::new(frontend_dir).fallback(ServeFile::new(index));
    let upload_limit = usize::try_from(state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES)).unwrap_or(usize::MAX);

    // No session needed
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/user-info", get(auth::user_info))
        .route("/files", get(files::list))
        .route("/preview/:name", get(files::preview));

    // Any active, logged-in user
    let session = Router::new()
        .route("/logout", post(auth::logout))
        .route("/upload", post(files::upload).layer(DefaultBodyLimit::max(upload_limit)))
        .route("/download/:name", get(files::download))
        .route("/delete/:name", delete(files::delete))
        .route("/send-invite", post(invites::send))
        .route("/invites", get(invites::list))
        .route("/invites/:code", delete(invites::delete))
        .route("/support/tickets", get(support::list).post(support::create))
        .route("/support/tickets/:id", get(support::get))
        .route("/support/tickets/:id/reply", post(support::reply))
        .route("/messages/send", post(messages::send))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route("/messages/:id/read", post(messages::mark_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/user/:id", patch(admin::update_user))
        .route("/admin/users/:id/toggle-status", post(admin::toggle_status))
        .route("/admin/users/:id/delete", delete(admin::delete_user))
        .route("/admin/files/featured/:name", post(files::toggle_featured))
        .route("/admin/tickets/:id/respond", post(support::respond))
        .route("/admin/backup", post(admin::backup))
        .route("/analytics", get(admin::analytics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    public
        .merge(session)
        .merge(admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_dir)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request at INFO, headers left out
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
