//! Create `record_document` table.
//!
//! One row per record collection (users, files, invitations, tickets,
//! messages). `version` increases on every write and guards compare-and-swap.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecordDocument::Table)
                    .if_not_exists()
                    .col(string_len(RecordDocument::Name, 64).primary_key())
                    .col(text(RecordDocument::Document).not_null())
                    .col(big_integer(RecordDocument::Version).not_null())
                    .col(timestamp_with_time_zone(RecordDocument::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecordDocument::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RecordDocument { Table, Name, Document, Version, UpdatedAt }
