//! Create `achievement` table: FK to `player` (cascade) and optional `tournament`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Achievement::Table)
                    .if_not_exists()
                    .col(uuid(Achievement::Id).primary_key())
                    .col(uuid(Achievement::PlayerId).not_null())
                    .col(uuid_null(Achievement::TournamentId))
                    .col(string_len(Achievement::Title, 200).not_null())
                    .col(text_null(Achievement::Description))
                    .col(date(Achievement::AchievedOn).not_null())
                    .col(timestamp_with_time_zone(Achievement::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Achievement::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_achievement_player")
                            .from(Achievement::Table, Achievement::PlayerId)
                            .to(Player::Table, Player::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_achievement_tournament")
                            .from(Achievement::Table, Achievement::TournamentId)
                            .to(Tournament::Table, Tournament::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Achievement::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Achievement { Table, Id, PlayerId, TournamentId, Title, Description, AchievedOn, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Player { Table, Id }

#[derive(DeriveIden)]
enum Tournament { Table, Id }
