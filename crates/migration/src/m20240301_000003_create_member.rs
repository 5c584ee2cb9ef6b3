//! Create `member` table with optional FK to `district`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Member::Table)
                    .if_not_exists()
                    .col(uuid(Member::Id).primary_key())
                    .col(string_len(Member::MembershipNumber, 32).unique_key().not_null())
                    .col(string_len(Member::FirstName, 100).not_null())
                    .col(string_len(Member::LastName, 100).not_null())
                    .col(string_len(Member::Email, 255).unique_key().not_null())
                    .col(string_len_null(Member::Phone, 32))
                    .col(uuid_null(Member::DistrictId))
                    .col(string_len(Member::MembershipType, 16).not_null())
                    .col(string_len(Member::Status, 16).not_null())
                    .col(date(Member::JoinedOn).not_null())
                    .col(date_null(Member::ExpiresOn))
                    .col(text_null(Member::Notes))
                    .col(timestamp_with_time_zone(Member::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Member::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_district")
                            .from(Member::Table, Member::DistrictId)
                            .to(District::Table, District::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Member::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Member {
    Table,
    Id,
    MembershipNumber,
    FirstName,
    LastName,
    Email,
    Phone,
    DistrictId,
    MembershipType,
    Status,
    JoinedOn,
    ExpiresOn,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum District { Table, Id }
