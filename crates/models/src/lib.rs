//! Canonical records shared by every persistence backend, plus the SeaORM
//! entity backing the relational record store.

pub mod errors;
pub mod db;
pub mod collection;
pub mod user;
pub mod file_record;
pub mod invitation;
pub mod ticket;
pub mod message;
pub mod record_document;

use collection::{Counter, Keyed};

pub type Users = Keyed<user::User>;
pub type Files = Keyed<file_record::FileRecord>;
pub type Invitations = Keyed<invitation::Invitation>;
pub type Tickets = Counter<ticket::Ticket>;
pub type Messages = Counter<message::Message>;

#[cfg(test)]
mod tests;
