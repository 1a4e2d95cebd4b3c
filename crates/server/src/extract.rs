//! Extractors whose rejections render as `{"error": ...}` with status 400,
//! like every other handler failure.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query};
use axum::Json;
use axum_extra::extract::WithRejection;

use crate::errors::JsonApiError;

pub type ApiJson<T> = WithRejection<Json<T>, JsonApiError>;
pub type ApiPath<T> = WithRejection<Path<T>, JsonApiError>;
pub type ApiQuery<T> = WithRejection<Query<T>, JsonApiError>;
pub type ApiMultipart = WithRejection<Multipart, JsonApiError>;

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self { Self::bad_request(format!("invalid request body: {}", r.body_text())) }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self { Self::bad_request(format!("invalid path parameter: {}", r.body_text())) }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self { Self::bad_request(format!("invalid query string: {}", r.body_text())) }
}

impl From<MultipartRejection> for JsonApiError {
    fn from(r: MultipartRejection) -> Self { Self::bad_request(format!("invalid upload: {}", r.body_text())) }
}
