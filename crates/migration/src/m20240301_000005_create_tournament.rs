//! Create `tournament` table with optional FK to the hosting `district`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tournament::Table)
                    .if_not_exists()
                    .col(uuid(Tournament::Id).primary_key())
                    .col(string_len(Tournament::Name, 200).not_null())
                    .col(text_null(Tournament::Description))
                    .col(string_len_null(Tournament::Venue, 200))
                    .col(uuid_null(Tournament::DistrictId))
                    .col(string_len_null(Tournament::Category, 64))
                    .col(date(Tournament::StartDate).not_null())
                    .col(date(Tournament::EndDate).not_null())
                    .col(date_null(Tournament::RegistrationDeadline))
                    .col(integer_null(Tournament::MaxParticipants))
                    .col(string_len(Tournament::Status, 32).not_null())
                    .col(timestamp_with_time_zone(Tournament::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Tournament::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tournament_district")
                            .from(Tournament::Table, Tournament::DistrictId)
                            .to(District::Table, District::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tournament::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tournament {
    Table,
    Id,
    Name,
    Description,
    Venue,
    DistrictId,
    Category,
    StartDate,
    EndDate,
    RegistrationDeadline,
    MaxParticipants,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum District { Table, Id }
