use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Member: listing filters
        manager
            .create_index(
                Index::create()
                    .name("idx_member_status")
                    .table(Member::Table)
                    .col(Member::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_member_last_name")
                    .table(Member::Table)
                    .col(Member::LastName)
                    .to_owned(),
            )
            .await?;

        // Player: district lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_player_district")
                    .table(Player::Table)
                    .col(Player::DistrictId)
                    .to_owned(),
            )
            .await?;

        // Tournament: calendar ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_tournament_start_date")
                    .table(Tournament::Table)
                    .col(Tournament::StartDate)
                    .to_owned(),
            )
            .await?;

        // A player registers for a tournament at most once
        manager
            .create_index(
                Index::create()
                    .name("uniq_registration_tournament_player")
                    .table(TournamentRegistration::Table)
                    .col(TournamentRegistration::TournamentId)
                    .col(TournamentRegistration::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // A role is granted to a user at most once
        manager
            .create_index(
                Index::create()
                    .name("uniq_user_role")
                    .table(UserRole::Table)
                    .col(UserRole::UserId)
                    .col(UserRole::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // News: scheduled publication scan
        manager
            .create_index(
                Index::create()
                    .name("idx_news_status_publish_at")
                    .table(NewsArticle::Table)
                    .col(NewsArticle::Status)
                    .col(NewsArticle::PublishAt)
                    .to_owned(),
            )
            .await?;

        // AuditLog: time range, actor and resource filters
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_created_at")
                    .table(AuditLog::Table)
                    .col(AuditLog::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_user")
                    .table(AuditLog::Table)
                    .col(AuditLog::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_resource_type")
                    .table(AuditLog::Table)
                    .col(AuditLog::ResourceType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_member_status").table(Member::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_member_last_name").table(Member::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_player_district").table(Player::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_tournament_start_date").table(Tournament::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uniq_registration_tournament_player")
                    .table(TournamentRegistration::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_user_role").table(UserRole::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_news_status_publish_at").table(NewsArticle::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_created_at").table(AuditLog::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_user").table(AuditLog::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_resource_type").table(AuditLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Member { Table, Status, LastName }

#[derive(DeriveIden)]
enum Player { Table, DistrictId }

#[derive(DeriveIden)]
enum Tournament { Table, StartDate }

#[derive(DeriveIden)]
enum TournamentRegistration { Table, TournamentId, PlayerId }

#[derive(DeriveIden)]
enum UserRole { Table, UserId, Role }

#[derive(DeriveIden)]
enum NewsArticle { Table, Status, PublishAt }

#[derive(DeriveIden)]
enum AuditLog { Table, CreatedAt, UserId, ResourceType }
