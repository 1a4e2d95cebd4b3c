//! Uploaded PDF documents: blobs in the upload directory, metadata in the
//! files collection.

pub mod naming;
pub mod service;

pub use service::{Blob, FileQuery, FileService, FileView, UploadInput, UploadOutcome};
