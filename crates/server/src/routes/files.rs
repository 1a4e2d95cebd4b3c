use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use models::file_record::CATEGORIES;
use serde_json::{json, Value};
use service::{
    access::Identity,
    errors::ServiceError,
    files::{Blob, FileQuery, UploadInput},
};
use tokio_util::io::ReaderStream;

use crate::errors::JsonApiError;
use crate::extract::{ApiMultipart, ApiPath, ApiQuery};
use crate::metrics::{DOWNLOADS_TOTAL, UPLOADS_TOTAL};
use crate::state::AppState;

/// Multipart form: `pdf` (file), `category`, `description`, `tags`.
#[utoipa::path(post, path = "/upload", tag = "files", request_body(content = crate::openapi::UploadForm, content_type = "multipart/form-data"), responses((status = 200, description = "Stored"), (status = 400, description = "Missing, not a PDF or too large"), (status = 401, description = "Login required")))]
pub async fn upload(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(mut multipart, _): ApiMultipart,
) -> Result<Json<Value>, JsonApiError> {
    let mut input = UploadInput::default();
    let mut saw_file = false;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => {
                saw_file = true;
                input.filename = field.file_name().map(str::to_string);
                input.bytes = field.bytes().await.map_err(bad_form)?.to_vec();
            }
            "category" => input.category = Some(field.text().await.map_err(bad_form)?),
            "description" => input.description = Some(field.text().await.map_err(bad_form)?),
            "tags" => input.tags = Some(field.text().await.map_err(bad_form)?),
            _ => {}
        }
    }
    if !saw_file {
        return Err(JsonApiError::bad_request("no file provided"));
    }
    let outcome = state.files.upload(&identity, input).await?;
    UPLOADS_TOTAL.inc();
    Ok(Json(json!({
        "message": "upload successful",
        "filename": outcome.filename,
        "original_name": outcome.original_name,
    })))
}

fn bad_form(e: axum::extract::multipart::MultipartError) -> JsonApiError {
    JsonApiError(ServiceError::Validation(format!("malformed upload: {}", e.body_text())))
}

#[utoipa::path(get, path = "/files", tag = "files", params(("category" = Option<String>, Query, description = "Exact category"), ("search" = Option<String>, Query, description = "Matches name, description or tags"), ("featured" = Option<bool>, Query, description = "Featured only")), responses((status = 200, description = "Files, newest first")))]
pub async fn list(State(state): State<AppState>, WithRejection(Query(query), _): ApiQuery<FileQuery>) -> Result<Json<Value>, JsonApiError> {
    let files = state.files.list(&query).await?;
    Ok(Json(json!({ "files": files, "categories": CATEGORIES })))
}

#[utoipa::path(get, path = "/download/{name}", tag = "files", params(("name" = String, Path, description = "Stored filename")), responses((status = 200, description = "PDF attachment"), (status = 404, description = "Unknown file")))]
pub async fn download(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(name), _): ApiPath<String>,
) -> Result<Response, JsonApiError> {
    let blob = state.files.download(&identity, &name).await?;
    DOWNLOADS_TOTAL.inc();
    serve(blob, "attachment").await
}

#[utoipa::path(get, path = "/preview/{name}", tag = "files", params(("name" = String, Path, description = "Stored filename")), responses((status = 200, description = "PDF inline"), (status = 404, description = "Unknown file")))]
pub async fn preview(State(state): State<AppState>, WithRejection(Path(name), _): ApiPath<String>) -> Result<Response, JsonApiError> {
    let blob = state.files.preview(&name).await?;
    serve(blob, "inline").await
}

async fn serve(blob: Blob, disposition: &str) -> Result<Response, JsonApiError> {
    let file = tokio::fs::File::open(&blob.path).await.map_err(ServiceError::storage)?;
    let len = file.metadata().await.map_err(ServiceError::storage)?.len();
    let filename = blob.filename.replace('"', "");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (header::CONTENT_DISPOSITION, format!("{disposition}; filename=\"{filename}\"")),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

#[utoipa::path(delete, path = "/delete/{name}", tag = "files", params(("name" = String, Path, description = "Stored filename")), responses((status = 200, description = "Deleted"), (status = 403, description = "Neither owner nor admin"), (status = 404, description = "Unknown file")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    WithRejection(Path(name), _): ApiPath<String>,
) -> Result<Json<Value>, JsonApiError> {
    state.files.delete(&identity, &name).await?;
    Ok(Json(json!({ "message": "file deleted successfully" })))
}

#[utoipa::path(post, path = "/admin/files/featured/{name}", tag = "admin", params(("name" = String, Path, description = "Stored filename")), responses((status = 200, description = "New featured flag")))]
pub async fn toggle_featured(State(state): State<AppState>, WithRejection(Path(name), _): ApiPath<String>) -> Result<Json<Value>, JsonApiError> {
    let featured = state.files.toggle_featured(&name).await?;
    Ok(Json(json!({ "filename": name, "is_featured": featured })))
}
