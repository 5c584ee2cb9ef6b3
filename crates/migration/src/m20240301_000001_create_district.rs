//! Create `district` table.
//!
//! Regional subdivisions of the association; players and tournaments refer to them.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(District::Table)
                    .if_not_exists()
                    .col(uuid(District::Id).primary_key())
                    .col(string_len(District::Name, 100).unique_key().not_null())
                    .col(string_len(District::Code, 10).unique_key().not_null())
                    .col(text_null(District::Description))
                    .col(string_len_null(District::ContactEmail, 255))
                    .col(timestamp_with_time_zone(District::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(District::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(District::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum District { Table, Id, Name, Code, Description, ContactEmail, CreatedAt, UpdatedAt }
