//! Create `news_article` table.
//!
//! `publish_at` drives scheduled publication; `published_at` records when it happened.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewsArticle::Table)
                    .if_not_exists()
                    .col(uuid(NewsArticle::Id).primary_key())
                    .col(string_len(NewsArticle::Title, 200).not_null())
                    .col(string_len(NewsArticle::Slug, 220).unique_key().not_null())
                    .col(string_len_null(NewsArticle::Summary, 500))
                    .col(text(NewsArticle::Content).not_null())
                    .col(uuid_null(NewsArticle::AuthorId))
                    .col(string_len(NewsArticle::Status, 16).not_null())
                    .col(boolean(NewsArticle::Featured).not_null())
                    .col(timestamp_with_time_zone_null(NewsArticle::PublishAt))
                    .col(timestamp_with_time_zone_null(NewsArticle::PublishedAt))
                    .col(timestamp_with_time_zone(NewsArticle::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(NewsArticle::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_author")
                            .from(NewsArticle::Table, NewsArticle::AuthorId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(NewsArticle::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum NewsArticle {
    Table,
    Id,
    Title,
    Slug,
    Summary,
    Content,
    AuthorId,
    Status,
    Featured,
    PublishAt,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AppUser { Table, Id }
