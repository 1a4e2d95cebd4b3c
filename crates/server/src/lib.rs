//! HTTP surface of the EduLibrary service: axum router, session middleware,
//! JSON error mapping, metrics and OpenAPI docs.

pub mod auth;
pub mod errors;
pub mod extract;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{build_app, run};
