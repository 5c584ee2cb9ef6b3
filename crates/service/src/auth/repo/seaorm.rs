use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use tracing::warn;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::authz::Role;
use models::{user, user_credentials, user_role};

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn to_auth_user(&self, u: user::Model) -> Result<AuthUser, AuthError> {
        let roles = load_roles(&self.db, u.id).await?;
        Ok(AuthUser {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            active: u.active,
            roles,
            last_login_at: u.last_login_at.map(|t| t.with_timezone(&Utc)),
        })
    }
}

/// Stored role names; rows with unknown names are skipped with a warning.
pub async fn load_roles(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<Role>, AuthError> {
    let names = user_role::roles_for(db, user_id).await?;
    let mut roles: Vec<Role> = names
        .iter()
        .filter_map(|name| match name.parse::<Role>() {
            Ok(r) => Some(r),
            Err(_) => {
                warn!(user_id = %user_id, role = %name, "ignoring unknown role");
                None
            }
        })
        .collect();
    roles.sort();
    roles.dedup();
    Ok(roles)
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_login(&self, login: &str) -> Result<Option<AuthUser>, AuthError> {
        match user::find_by_login(&self.db, login).await? {
            Some(u) => Ok(Some(self.to_auth_user(u).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let found = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        match found {
            Some(u) => Ok(Some(self.to_auth_user(u).await?)),
            None => Ok(None),
        }
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }

    async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AuthError> {
        let found = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?
            .ok_or(AuthError::NotFound)?;
        let mut am = found.into_active_model();
        am.last_login_at = Set(Some(Utc::now().into()));
        am.update(&self.db).await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }
}
