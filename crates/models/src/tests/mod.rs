/// Relational document table tests (SQLite in memory)
pub mod record_document_tests;
