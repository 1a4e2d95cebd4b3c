//! Auth module: registration, login and session tokens over the users store.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::{AuthConfig, AuthService};
