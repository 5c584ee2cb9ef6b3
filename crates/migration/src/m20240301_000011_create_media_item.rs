//! Create `media_item` table (photo/video/document metadata).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MediaItem::Table)
                    .if_not_exists()
                    .col(uuid(MediaItem::Id).primary_key())
                    .col(string_len(MediaItem::Title, 200).not_null())
                    .col(string_len(MediaItem::MediaType, 16).not_null())
                    .col(string_len(MediaItem::Url, 1024).not_null())
                    .col(string_len_null(MediaItem::ThumbnailUrl, 1024))
                    .col(text_null(MediaItem::Description))
                    .col(uuid_null(MediaItem::TournamentId))
                    .col(uuid_null(MediaItem::UploadedBy))
                    .col(timestamp_with_time_zone(MediaItem::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(MediaItem::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_tournament")
                            .from(MediaItem::Table, MediaItem::TournamentId)
                            .to(Tournament::Table, Tournament::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_uploader")
                            .from(MediaItem::Table, MediaItem::UploadedBy)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MediaItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MediaItem { Table, Id, Title, MediaType, Url, ThumbnailUrl, Description, TournamentId, UploadedBy, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Tournament { Table, Id }

#[derive(DeriveIden)]
enum AppUser { Table, Id }
