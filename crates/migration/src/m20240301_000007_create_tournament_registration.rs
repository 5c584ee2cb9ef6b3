//! Create `tournament_registration` join table between `tournament` and `player`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TournamentRegistration::Table)
                    .if_not_exists()
                    .col(uuid(TournamentRegistration::Id).primary_key())
                    .col(uuid(TournamentRegistration::TournamentId).not_null())
                    .col(uuid(TournamentRegistration::PlayerId).not_null())
                    .col(integer_null(TournamentRegistration::Seed))
                    .col(timestamp_with_time_zone(TournamentRegistration::RegisteredAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registration_tournament")
                            .from(TournamentRegistration::Table, TournamentRegistration::TournamentId)
                            .to(Tournament::Table, Tournament::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registration_player")
                            .from(TournamentRegistration::Table, TournamentRegistration::PlayerId)
                            .to(Player::Table, Player::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TournamentRegistration::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum TournamentRegistration { Table, Id, TournamentId, PlayerId, Seed, RegisteredAt }

#[derive(DeriveIden)]
enum Tournament { Table, Id }

#[derive(DeriveIden)]
enum Player { Table, Id }
