//! Create `audit_log` table.
//!
//! No FK to `app_user`: audit rows outlive the accounts they describe.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(uuid(AuditLog::Id).primary_key())
                    .col(uuid_null(AuditLog::UserId))
                    .col(string_len_null(AuditLog::Username, 50))
                    .col(string_len(AuditLog::Action, 32).not_null())
                    .col(string_len(AuditLog::ResourceType, 32).not_null())
                    .col(string_len_null(AuditLog::ResourceId, 64))
                    .col(string_len(AuditLog::HttpMethod, 10).not_null())
                    .col(string_len(AuditLog::Path, 512).not_null())
                    .col(integer(AuditLog::StatusCode).not_null())
                    .col(boolean(AuditLog::Success).not_null())
                    .col(big_integer(AuditLog::DurationMs).not_null())
                    .col(string_len_null(AuditLog::ClientIp, 64))
                    .col(string_len_null(AuditLog::UserAgent, 512))
                    .col(text_null(AuditLog::ErrorMessage))
                    .col(timestamp_with_time_zone(AuditLog::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLog {
    Table,
    Id,
    UserId,
    Username,
    Action,
    ResourceType,
    ResourceId,
    HttpMethod,
    Path,
    StatusCode,
    Success,
    DurationMs,
    ClientIp,
    UserAgent,
    ErrorMessage,
    CreatedAt,
}
