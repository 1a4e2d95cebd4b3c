//! OpenAPI document served at `/api-docs/openapi.json`. The request structs
//! here only describe bodies; handlers deserialize the service input types.

use utoipa::{OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub username: String, pub email: String, pub password: String }

/// `login` accepts a username or an email address; `username` is accepted as the key too.
#[derive(ToSchema)]
pub struct LoginRequest { pub login: String, pub password: String }

#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub pdf: Vec<u8>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Comma separated.
    pub tags: Option<String>,
}

#[derive(ToSchema)]
pub struct InviteRequest { pub email: String, pub message: Option<String> }

#[derive(ToSchema)]
pub struct TicketRequest {
    pub title: String,
    pub description: String,
    /// `low`, `medium`, `high` or `urgent`.
    pub priority: Option<String>,
}

#[derive(ToSchema)]
pub struct ReplyRequest { pub body: String }

#[derive(ToSchema)]
pub struct RespondRequest {
    pub response: String,
    /// `open`, `in-progress` or `resolved` (default).
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct MessageRequest { pub recipient: String, pub subject: Option<String>, pub body: String }

#[derive(ToSchema)]
pub struct UserPatchRequest { pub is_admin: Option<bool>, pub is_active: Option<bool>, pub email: Option<String> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::metrics::metrics,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::user_info,
        crate::routes::files::upload,
        crate::routes::files::list,
        crate::routes::files::download,
        crate::routes::files::preview,
        crate::routes::files::delete,
        crate::routes::files::toggle_featured,
        crate::routes::invites::send,
        crate::routes::invites::list,
        crate::routes::invites::delete,
        crate::routes::support::create,
        crate::routes::support::list,
        crate::routes::support::get,
        crate::routes::support::reply,
        crate::routes::support::respond,
        crate::routes::messages::send,
        crate::routes::messages::inbox,
        crate::routes::messages::sent,
        crate::routes::messages::mark_read,
        crate::routes::admin::list_users,
        crate::routes::admin::update_user,
        crate::routes::admin::toggle_status,
        crate::routes::admin::delete_user,
        crate::routes::admin::analytics,
        crate::routes::admin::backup,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            UploadForm,
            InviteRequest,
            TicketRequest,
            ReplyRequest,
            RespondRequest,
            MessageRequest,
            UserPatchRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "files"),
        (name = "invites"),
        (name = "support"),
        (name = "messages"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
