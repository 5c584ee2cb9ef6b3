//! Create `player` table with optional FK to `district`.
//!
//! Deleting a district keeps its players and clears the reference.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Player::Table)
                    .if_not_exists()
                    .col(uuid(Player::Id).primary_key())
                    .col(string_len(Player::FirstName, 100).not_null())
                    .col(string_len(Player::LastName, 100).not_null())
                    .col(date_null(Player::DateOfBirth))
                    .col(string_len_null(Player::Gender, 16))
                    .col(uuid_null(Player::DistrictId))
                    .col(integer_null(Player::Ranking))
                    .col(integer_null(Player::Rating))
                    .col(text_null(Player::Bio))
                    .col(string_len_null(Player::PhotoUrl, 1024))
                    .col(boolean(Player::Active).not_null())
                    .col(timestamp_with_time_zone(Player::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Player::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_district")
                            .from(Player::Table, Player::DistrictId)
                            .to(District::Table, District::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Player::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Player {
    Table,
    Id,
    FirstName,
    LastName,
    DateOfBirth,
    Gender,
    DistrictId,
    Ranking,
    Rating,
    Bio,
    PhotoUrl,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum District { Table, Id }
