//! Service layer for EduLibrary.
//! - Every collection is persisted through a [`storage::RecordStore`] handed in at construction.
//! - Mutations go through [`storage::transact`] (load, mutate, compare-and-swap).
//! - Handlers talk to these services only; none of them knows about HTTP.

pub mod errors;
pub mod storage;
pub mod auth;
pub mod access;
pub mod files;
pub mod invites;
pub mod support;
pub mod messages;
pub mod admin;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
