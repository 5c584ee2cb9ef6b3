use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Looks a user up by username or email.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;

    async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<Uuid, AuthUser>>,
        creds: Mutex<HashMap<Uuid, Credentials>>,
    }

    impl MockAuthRepository {
        /// Seeds a user together with an already-hashed password.
        pub fn insert_user(&self, user: AuthUser, password_hash: String) {
            self.creds.lock().unwrap().insert(
                user.id,
                Credentials { user_id: user.id, password_hash, password_algorithm: "argon2id".into() },
            );
            self.users.lock().unwrap().insert(user.id, user);
        }

        pub fn set_active(&self, user_id: Uuid, active: bool) {
            if let Some(u) = self.users.lock().unwrap().get_mut(&user_id) {
                u.active = active;
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_login(&self, login: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users
                .values()
                .find(|u| u.username == login || u.email.eq_ignore_ascii_case(login))
                .cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }

        async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AuthError> {
            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(&user_id).ok_or(AuthError::NotFound)?;
            user.last_login_at = Some(Utc::now());
            Ok(())
        }
    }
}
