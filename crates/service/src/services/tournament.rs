use chrono::{NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::tournament::{self, TournamentStatus};
use models::{player, tournament_registration};

use crate::cache::{AppCache, REGION_TOURNAMENTS};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::bracket::{self, Bracket, Entrant};
use crate::services::{clean, district};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentInput {
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub district_id: Option<Uuid>,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub registration_deadline: Option<NaiveDate>,
    pub max_participants: Option<i32>,
    /// Defaults to `UPCOMING` on create.
    pub status: Option<TournamentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TournamentFilter {
    pub status: Option<TournamentStatus>,
    pub district_id: Option<Uuid>,
    /// Only tournaments starting today or later.
    pub upcoming: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationInput {
    pub player_id: Uuid,
    pub seed: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationView {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub seed: Option<i32>,
    pub registered_at: chrono::DateTime<Utc>,
}

pub async fn list(db: &DatabaseConnection, filter: TournamentFilter, pagination: Pagination) -> Result<Page<tournament::Model>, ServiceError> {
    let mut select = tournament::Entity::find();
    if let Some(status) = filter.status {
        select = select.filter(tournament::Column::Status.eq(status));
    }
    if let Some(district_id) = filter.district_id {
        select = select.filter(tournament::Column::DistrictId.eq(district_id));
    }
    if filter.upcoming == Some(true) {
        select = select.filter(tournament::Column::StartDate.gte(Utc::now().date_naive()));
    }
    let select = select.order_by_asc(tournament::Column::StartDate).order_by_asc(tournament::Column::Name);
    Ok(fetch_page(db, select, pagination).await?)
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<tournament::Model, ServiceError> {
    tournament::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("tournament", id))
}

pub async fn get(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<tournament::Model, ServiceError> {
    cache
        .get_or_try_insert(REGION_TOURNAMENTS, &id.to_string(), || find(db, id))
        .await
}

#[instrument(skip(db, cache, input), fields(name = %input.name))]
pub async fn create(db: &DatabaseConnection, cache: &AppCache, input: TournamentInput) -> Result<tournament::Model, ServiceError> {
    district::ensure_exists(db, input.district_id).await?;
    let now = Utc::now().into();
    let blank = tournament::Model {
        id: Uuid::new_v4(),
        name: String::new(),
        description: None,
        venue: None,
        district_id: None,
        category: None,
        start_date: input.start_date,
        end_date: input.end_date,
        registration_deadline: None,
        max_participants: None,
        status: TournamentStatus::Upcoming,
        created_at: now,
        updated_at: now,
    };
    let created = tournament::create(db, apply(blank, input)).await?;
    cache.invalidate_region(REGION_TOURNAMENTS);
    info!(tournament_id = %created.id, "tournament_created");
    Ok(created)
}

#[instrument(skip(db, cache, input))]
pub async fn update(db: &DatabaseConnection, cache: &AppCache, id: Uuid, input: TournamentInput) -> Result<tournament::Model, ServiceError> {
    let existing = find(db, id).await?;
    district::ensure_exists(db, input.district_id).await?;
    let updated = tournament::update(db, apply(existing, input)).await?;
    cache.invalidate_region(REGION_TOURNAMENTS);
    Ok(updated)
}

#[instrument(skip(db, cache))]
pub async fn delete(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<(), ServiceError> {
    let res = tournament::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("tournament", id));
    }
    cache.invalidate_region(REGION_TOURNAMENTS);
    info!(tournament_id = %id, "tournament_deleted");
    Ok(())
}

pub async fn list_registrations(db: &DatabaseConnection, tournament_id: Uuid) -> Result<Vec<RegistrationView>, ServiceError> {
    find(db, tournament_id).await?;
    let rows = tournament_registration::Entity::find()
        .filter(tournament_registration::Column::TournamentId.eq(tournament_id))
        .find_also_related(player::Entity)
        .order_by_asc(tournament_registration::Column::RegisteredAt)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(r, p)| RegistrationView {
            id: r.id,
            tournament_id: r.tournament_id,
            player_id: r.player_id,
            player_name: p.map(|p| p.full_name()).unwrap_or_default(),
            seed: r.seed,
            registered_at: r.registered_at.with_timezone(&Utc),
        })
        .collect())
}

/// Registers a player. Duplicates conflict; a closed or full tournament is unprocessable.
///
/// Runs in one transaction holding the tournament row lock, so concurrent registrations
/// cannot both take the last place.
#[instrument(skip(db, input), fields(player_id = %input.player_id))]
pub async fn register(db: &DatabaseConnection, tournament_id: Uuid, input: RegistrationInput) -> Result<tournament_registration::Model, ServiceError> {
    let txn = db.begin().await?;
    let t = tournament::Entity::find_by_id(tournament_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("tournament", tournament_id))?;
    let p = player::Entity::find_by_id(input.player_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("player", input.player_id))?;
    if !p.active {
        return Err(ServiceError::Unprocessable(format!("player {} is inactive", p.id)));
    }
    if !t.accepts_registrations(Utc::now().date_naive()) {
        return Err(ServiceError::Unprocessable("registration is closed".into()));
    }

    let registrations = tournament_registration::Entity::find()
        .filter(tournament_registration::Column::TournamentId.eq(tournament_id));
    let already = registrations
        .clone()
        .filter(tournament_registration::Column::PlayerId.eq(input.player_id))
        .count(&txn)
        .await?;
    if already > 0 {
        return Err(ServiceError::Conflict(format!("player {} is already registered", input.player_id)));
    }
    if let Some(max) = t.max_participants {
        if registrations.count(&txn).await? >= max as u64 {
            return Err(ServiceError::Unprocessable("tournament is full".into()));
        }
    }

    let created = tournament_registration::create(
        &txn,
        tournament_registration::Model {
            id: Uuid::new_v4(),
            tournament_id,
            player_id: input.player_id,
            seed: input.seed,
            registered_at: Utc::now().into(),
        },
    )
    .await?;
    txn.commit().await?;
    info!(tournament_id = %tournament_id, "player_registered");
    Ok(created)
}

pub async fn withdraw(db: &DatabaseConnection, tournament_id: Uuid, player_id: Uuid) -> Result<(), ServiceError> {
    let res = tournament_registration::Entity::delete_many()
        .filter(tournament_registration::Column::TournamentId.eq(tournament_id))
        .filter(tournament_registration::Column::PlayerId.eq(player_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "player {player_id} is not registered for tournament {tournament_id}"
        )));
    }
    Ok(())
}

pub async fn bracket(db: &DatabaseConnection, tournament_id: Uuid) -> Result<Bracket, ServiceError> {
    let entrants = list_registrations(db, tournament_id)
        .await?
        .into_iter()
        .map(|r| Entrant { player_id: r.player_id, name: r.player_name, seed: r.seed, registered_at: r.registered_at })
        .collect();
    Ok(bracket::build(tournament_id, entrants))
}

fn apply(mut m: tournament::Model, input: TournamentInput) -> tournament::Model {
    m.name = input.name.trim().to_string();
    m.description = clean(input.description);
    m.venue = clean(input.venue);
    m.district_id = input.district_id;
    m.category = clean(input.category);
    m.start_date = input.start_date;
    m.end_date = input.end_date;
    m.registration_deadline = input.registration_deadline;
    m.max_participants = input.max_participants;
    if let Some(status) = input.status {
        m.status = status;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::player::{self as players, PlayerInput};
    use crate::test_support::memory_db;
    use chrono::Days;

    fn input(max: Option<i32>) -> TournamentInput {
        let start = Utc::now().date_naive() + Days::new(10);
        TournamentInput {
            name: "Autumn Open".into(),
            description: None,
            venue: Some("Main hall".into()),
            district_id: None,
            category: None,
            start_date: start,
            end_date: start + Days::new(1),
            registration_deadline: None,
            max_participants: max,
            status: Some(TournamentStatus::RegistrationOpen),
        }
    }

    async fn player(db: &DatabaseConnection, name: &str) -> Uuid {
        let p = players::create(
            db,
            &AppCache::disabled(),
            PlayerInput {
                first_name: name.into(),
                last_name: "Test".into(),
                date_of_birth: None,
                gender: None,
                district_id: None,
                ranking: None,
                rating: None,
                bio: None,
                photo_url: None,
                active: None,
            },
        )
        .await
        .unwrap();
        p.id
    }

    #[tokio::test]
    async fn concurrent_registrations_cannot_overfill() -> anyhow::Result<()> {
        let db = memory_db().await;
        let t = create(&db, &AppCache::disabled(), input(Some(2))).await?;
        let (a, b, c) = (player(&db, "A").await, player(&db, "B").await, player(&db, "C").await);
        register(&db, t.id, RegistrationInput { player_id: a, seed: None }).await?;

        let (first, second) = tokio::join!(
            register(&db, t.id, RegistrationInput { player_id: b, seed: None }),
            register(&db, t.id, RegistrationInput { player_id: c, seed: None }),
        );
        let taken = [first.is_ok(), second.is_ok()].into_iter().filter(|ok| *ok).count();
        assert_eq!(taken, 1);
        let rejected = if first.is_err() { first } else { second };
        assert!(matches!(rejected, Err(ServiceError::Unprocessable(ref m)) if m.contains("full")));
        assert_eq!(list_registrations(&db, t.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn register_duplicate_full_and_withdraw() -> anyhow::Result<()> {
        let db = memory_db().await;
        let t = create(&db, &AppCache::disabled(), input(Some(2))).await?;
        let (a, b, c) = (player(&db, "A").await, player(&db, "B").await, player(&db, "C").await);

        register(&db, t.id, RegistrationInput { player_id: a, seed: Some(1) }).await?;
        let dup = register(&db, t.id, RegistrationInput { player_id: a, seed: None }).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        register(&db, t.id, RegistrationInput { player_id: b, seed: None }).await?;
        let full = register(&db, t.id, RegistrationInput { player_id: c, seed: None }).await;
        assert!(matches!(full, Err(ServiceError::Unprocessable(ref m)) if m.contains("full")));

        let regs = list_registrations(&db, t.id).await?;
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[0].player_name, "A Test");

        withdraw(&db, t.id, b).await?;
        assert!(matches!(withdraw(&db, t.id, b).await, Err(ServiceError::NotFound(_))));
        register(&db, t.id, RegistrationInput { player_id: c, seed: None }).await?;
        Ok(())
    }

    #[tokio::test]
    async fn closed_registration_is_unprocessable() -> anyhow::Result<()> {
        let db = memory_db().await;
        let mut i = input(None);
        i.status = Some(TournamentStatus::Completed);
        let t = create(&db, &AppCache::disabled(), i).await?;
        let p = player(&db, "Late").await;
        let r = register(&db, t.id, RegistrationInput { player_id: p, seed: None }).await;
        assert!(matches!(r, Err(ServiceError::Unprocessable(_))));
        Ok(())
    }

    #[tokio::test]
    async fn bracket_from_registrations() -> anyhow::Result<()> {
        let db = memory_db().await;
        let t = create(&db, &AppCache::disabled(), input(None)).await?;
        for name in ["A", "B", "C"] {
            let p = player(&db, name).await;
            register(&db, t.id, RegistrationInput { player_id: p, seed: None }).await?;
        }
        let b = bracket(&db, t.id).await?;
        assert_eq!((b.entrants, b.size), (3, 4));
        assert_eq!(b.rounds.len(), 2);
        assert_eq!(b.rounds[0].matches.iter().filter(|m| m.bye).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn upcoming_filter() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::disabled();
        create(&db, &cache, input(None)).await?;
        let mut past = input(None);
        past.start_date = Utc::now().date_naive() - Days::new(30);
        past.end_date = past.start_date;
        create(&db, &cache, past).await?;
        let upcoming = list(&db, TournamentFilter { upcoming: Some(true), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(upcoming.total_items, 1);
        Ok(())
    }
}
