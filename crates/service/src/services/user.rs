//! Administration of back-office accounts and their roles.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{user, user_credentials, user_role};

use crate::authz::{Principal, Role};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::password;

const GENERATED_PASSWORD_LEN: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub active: bool,
    pub roles: Vec<Role>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    fn new(m: user::Model, roles: Vec<Role>) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            full_name: m.full_name,
            active: m.active,
            roles,
            last_login_at: m.last_login_at.map(Into::into),
            created_at: m.created_at.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// Defaults to `[USER]`.
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordResetInput {
    /// A random password is generated when absent.
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    pub user_id: Uuid,
    /// Only set when the password was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

async fn roles_of<C: sea_orm::ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<Role>, ServiceError> {
    let names = user_role::roles_for(db, user_id).await?;
    let mut roles: Vec<Role> = names
        .iter()
        .filter_map(|n| match n.parse::<Role>() {
            Ok(r) => Some(r),
            Err(_) => {
                warn!(user_id = %user_id, role = %n, "ignoring unknown stored role");
                None
            }
        })
        .collect();
    roles.sort();
    Ok(roles)
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

async fn find(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", id))
}

/// The actor must be able to grant every role the target holds.
fn ensure_can_manage(actor: &Principal, target_roles: &[Role]) -> Result<(), ServiceError> {
    actor.require_grantable(target_roles)?;
    Ok(())
}

pub async fn list(db: &DatabaseConnection, pagination: Pagination) -> Result<Page<UserView>, ServiceError> {
    let page = fetch_page(db, user::Entity::find().order_by_asc(user::Column::Username), pagination).await?;
    let mut items = Vec::with_capacity(page.items.len());
    for m in &page.items {
        items.push(roles_of(db, m.id).await?);
    }
    let mut roles = items.into_iter();
    Ok(page.map(|m| UserView::new(m, roles.next().unwrap_or_default())))
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<UserView, ServiceError> {
    let m = find(db, id).await?;
    let roles = roles_of(db, id).await?;
    Ok(UserView::new(m, roles))
}

/// Creates the account, its credentials and its roles in one transaction.
#[instrument(skip(db, actor, input), fields(actor = %actor.username, username = %input.username))]
pub async fn create(db: &DatabaseConnection, actor: &Principal, input: NewUser) -> Result<UserView, ServiceError> {
    let roles = if input.roles.is_empty() { vec![Role::User] } else { input.roles };
    actor.require_grantable(&roles)?;
    password::check_strength(&input.password)?;
    let hash = password::hash_password(&input.password)?;

    let now = Utc::now().into();
    let model = user::Model {
        id: Uuid::new_v4(),
        username: input.username.trim().to_string(),
        email: input.email.trim().to_lowercase(),
        full_name: input.full_name.trim().to_string(),
        active: input.active,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };

    let txn = db.begin().await?;
    let created = user::create(&txn, model).await?;
    user_credentials::upsert_password(&txn, created.id, hash, password::ALGORITHM).await?;
    user_role::replace_roles(&txn, created.id, &role_names(&roles)).await?;
    txn.commit().await?;

    info!(user_id = %created.id, "user_created");
    let mut roles = roles;
    roles.sort();
    roles.dedup();
    Ok(UserView::new(created, roles))
}

pub(crate) async fn create_unchecked(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    full_name: &str,
    password_plain: &str,
    roles: &[Role],
) -> Result<user::Model, ServiceError> {
    let hash = password::hash_password(password_plain)?;
    let now = Utc::now().into();
    let model = user::Model {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_lowercase(),
        full_name: full_name.to_string(),
        active: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };
    let txn = db.begin().await?;
    let created = user::create(&txn, model).await?;
    user_credentials::upsert_password(&txn, created.id, hash, password::ALGORITHM).await?;
    user_role::replace_roles(&txn, created.id, &role_names(roles)).await?;
    txn.commit().await?;
    Ok(created)
}

#[instrument(skip(db, actor, input), fields(actor = %actor.username))]
pub async fn update(db: &DatabaseConnection, actor: &Principal, id: Uuid, input: UserUpdate) -> Result<UserView, ServiceError> {
    let mut m = find(db, id).await?;
    let roles = roles_of(db, id).await?;
    if actor.user_id != id {
        ensure_can_manage(actor, &roles)?;
    }
    if input.active == Some(false) && actor.user_id == id {
        return Err(ServiceError::Unprocessable("cannot deactivate your own account".into()));
    }
    if let Some(email) = input.email {
        m.email = email.trim().to_lowercase();
    }
    if let Some(full_name) = input.full_name {
        m.full_name = full_name.trim().to_string();
    }
    if let Some(active) = input.active {
        m.active = active;
    }
    let updated = user::update(db, m).await?;
    Ok(UserView::new(updated, roles))
}

#[instrument(skip(db, actor), fields(actor = %actor.username))]
pub async fn delete(db: &DatabaseConnection, actor: &Principal, id: Uuid) -> Result<(), ServiceError> {
    if actor.user_id == id {
        return Err(ServiceError::Unprocessable("cannot delete your own account".into()));
    }
    let roles = roles_of(db, id).await?;
    ensure_can_manage(actor, &roles)?;
    let res = user::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("user", id));
    }
    info!(user_id = %id, "user_deleted");
    Ok(())
}

/// Replaces the full role set. Only a SUPER_ADMIN may grant SUPER_ADMIN.
#[instrument(skip(db, actor), fields(actor = %actor.username))]
pub async fn replace_roles(db: &DatabaseConnection, actor: &Principal, id: Uuid, roles: Vec<Role>) -> Result<UserView, ServiceError> {
    if roles.is_empty() {
        return Err(ServiceError::Validation("at least one role is required".into()));
    }
    let m = find(db, id).await?;
    let current = roles_of(db, id).await?;
    ensure_can_manage(actor, &current)?;
    actor.require_grantable(&roles)?;
    if actor.user_id == id && !roles.iter().any(|r| actor.roles.iter().all(|held| r >= held)) {
        return Err(ServiceError::Unprocessable("cannot lower your own highest role".into()));
    }

    let txn = db.begin().await?;
    user_role::replace_roles(&txn, id, &role_names(&roles)).await?;
    txn.commit().await?;

    let roles = roles_of(db, id).await?;
    info!(user_id = %id, roles = ?roles, "user_roles_replaced");
    Ok(UserView::new(m, roles))
}

#[instrument(skip(db, actor, input), fields(actor = %actor.username))]
pub async fn reset_password(db: &DatabaseConnection, actor: &Principal, id: Uuid, input: PasswordResetInput) -> Result<PasswordReset, ServiceError> {
    find(db, id).await?;
    if actor.user_id != id {
        ensure_can_manage(actor, &roles_of(db, id).await?)?;
    }
    let (plain, generated) = match input.new_password {
        Some(p) => (p, false),
        None => (password::generate_password(GENERATED_PASSWORD_LEN), true),
    };
    password::check_strength(&plain)?;
    let hash = password::hash_password(&plain)?;
    user_credentials::upsert_password(db, id, hash, password::ALGORITHM).await?;
    info!(user_id = %id, generated, "password_reset");
    Ok(PasswordReset { user_id: id, temporary_password: generated.then_some(plain) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;
    use models::errors::ModelError;

    fn actor(role: Role) -> Principal {
        Principal::new(Uuid::new_v4(), "actor", vec![role])
    }

    fn new_user(name: &str, roles: Vec<Role>) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{name}@club.example.org"),
            full_name: name.to_uppercase(),
            password: "Sup3rSecret".into(),
            roles,
            active: true,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_user_role_and_stores_credentials() -> anyhow::Result<()> {
        let db = memory_db().await;
        let admin = actor(Role::Admin);
        let u = create(&db, &admin, new_user("lena", vec![])).await?;
        assert_eq!(u.roles, vec![Role::User]);
        let creds = user_credentials::find_by_user(&db, u.id).await?.expect("credentials");
        assert!(password::verify_password("Sup3rSecret", &creds.password_hash)?);

        let dup = create(&db, &admin, new_user("lena", vec![])).await.unwrap_err();
        assert!(matches!(dup, ServiceError::Model(ModelError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn admins_cannot_grant_their_own_level_or_above() -> anyhow::Result<()> {
        let db = memory_db().await;
        let admin = actor(Role::Admin);
        let err = create(&db, &admin, new_user("boss", vec![Role::SuperAdmin])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(list(&db, Pagination::default()).await?.total_items, 0);

        let root = actor(Role::SuperAdmin);
        let u = create(&db, &root, new_user("ed", vec![Role::Editor])).await?;
        let err = replace_roles(&db, &admin, u.id, vec![Role::Admin]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let updated = replace_roles(&db, &root, u.id, vec![Role::Moderator, Role::Editor]).await?;
        assert_eq!(updated.roles, vec![Role::Moderator, Role::Editor]);
        assert!(matches!(replace_roles(&db, &root, u.id, vec![]).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn self_delete_is_rejected() -> anyhow::Result<()> {
        let db = memory_db().await;
        let root = actor(Role::SuperAdmin);
        let u = create(&db, &root, new_user("solo", vec![Role::SuperAdmin])).await?;
        let me = Principal::new(u.id, "solo", vec![Role::SuperAdmin]);
        assert!(matches!(delete(&db, &me, u.id).await, Err(ServiceError::Unprocessable(_))));
        delete(&db, &root, u.id).await?;
        assert!(matches!(get(&db, u.id).await, Err(ServiceError::NotFound(_))));
        assert!(user_role::roles_for(&db, u.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_generates_when_absent() -> anyhow::Result<()> {
        let db = memory_db().await;
        let admin = actor(Role::Admin);
        let u = create(&db, &admin, new_user("max", vec![Role::Editor])).await?;
        let reset = reset_password(&db, &admin, u.id, PasswordResetInput::default()).await?;
        let temp = reset.temporary_password.expect("generated password");
        assert_eq!(temp.len(), GENERATED_PASSWORD_LEN);
        let creds = user_credentials::find_by_user(&db, u.id).await?.expect("credentials");
        assert!(password::verify_password(&temp, &creds.password_hash)?);

        let short = reset_password(&db, &admin, u.id, PasswordResetInput { new_password: Some("abc".into()) }).await;
        assert!(matches!(short, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_changes_profile_fields() -> anyhow::Result<()> {
        let db = memory_db().await;
        let admin = actor(Role::Admin);
        let u = create(&db, &admin, new_user("tom", vec![])).await?;
        let updated = update(
            &db,
            &admin,
            u.id,
            UserUpdate { email: Some("TOM@Example.org".into()), full_name: None, active: Some(false) },
        )
        .await?;
        assert_eq!(updated.email, "tom@example.org");
        assert!(!updated.active);
        assert_eq!(updated.full_name, "TOM");
        Ok(())
    }
}
