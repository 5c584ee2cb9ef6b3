//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_district;
mod m20240301_000002_create_app_user;
mod m20240301_000003_create_member;
mod m20240301_000004_create_player;
mod m20240301_000005_create_tournament;
mod m20240301_000006_create_achievement;
mod m20240301_000007_create_tournament_registration;
mod m20240301_000008_create_user_role;
mod m20240301_000009_create_user_credentials;
mod m20240301_000010_create_news_article;
mod m20240301_000011_create_media_item;
mod m20240301_000012_create_download;
mod m20240301_000013_create_audit_log;
mod m20240301_000020_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_district::Migration),
            Box::new(m20240301_000002_create_app_user::Migration),
            Box::new(m20240301_000003_create_member::Migration),
            Box::new(m20240301_000004_create_player::Migration),
            Box::new(m20240301_000005_create_tournament::Migration),
            Box::new(m20240301_000006_create_achievement::Migration),
            Box::new(m20240301_000007_create_tournament_registration::Migration),
            Box::new(m20240301_000008_create_user_role::Migration),
            Box::new(m20240301_000009_create_user_credentials::Migration),
            Box::new(m20240301_000010_create_news_article::Migration),
            Box::new(m20240301_000011_create_media_item::Migration),
            Box::new(m20240301_000012_create_download::Migration),
            Box::new(m20240301_000013_create_audit_log::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000020_add_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectOptions, Database};

    #[tokio::test]
    async fn up_and_down_on_sqlite() -> Result<(), DbErr> {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await?;

        Migrator::up(&db, None).await?;
        let applied = Migrator::get_applied_migrations(&db).await?;
        assert_eq!(applied.len(), Migrator::migrations().len());

        Migrator::down(&db, None).await?;
        let applied = Migrator::get_applied_migrations(&db).await?;
        assert!(applied.is_empty());
        Ok(())
    }
}
