//! Create `download` table (public documents offered for download).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Download::Table)
                    .if_not_exists()
                    .col(uuid(Download::Id).primary_key())
                    .col(string_len(Download::Title, 200).not_null())
                    .col(text_null(Download::Description))
                    .col(string_len(Download::FileUrl, 1024).not_null())
                    .col(string_len_null(Download::Category, 64))
                    .col(big_integer_null(Download::FileSizeBytes))
                    .col(big_integer(Download::DownloadCount).not_null())
                    .col(boolean(Download::Active).not_null())
                    .col(timestamp_with_time_zone(Download::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Download::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Download::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Download { Table, Id, Title, Description, FileUrl, Category, FileSizeBytes, DownloadCount, Active, CreatedAt, UpdatedAt }
