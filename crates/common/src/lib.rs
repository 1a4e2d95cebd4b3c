//! Shared helpers for the EduLibrary workspace: logging setup, startup checks
//! and small wire types used by more than one crate.

pub mod types;
pub mod utils;
pub mod env;
