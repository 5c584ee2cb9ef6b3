use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, LoginInput, UserInfo};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::revocation::RevocationList;
use super::token::{Claims, TokenCodec, TokenType};
use crate::authz::Principal;
use crate::password;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self {
            jwt_secret: c.jwt_secret.clone(),
            issuer: c.issuer.clone(),
            access_ttl_secs: c.access_token_ttl_secs,
            refresh_ttl_secs: c.refresh_token_ttl_secs,
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    codec: TokenCodec,
    revoked: RevocationList,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self {
        let codec = TokenCodec::new(&cfg.jwt_secret, &cfg.issuer, cfg.access_ttl_secs, cfg.refresh_ttl_secs);
        Self { repo, codec, revoked: RevocationList::default() }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn revocations(&self) -> &RevocationList {
        &self.revoked
    }

    /// Verify credentials and issue an access/refresh token pair.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{AuthUser, LoginInput};
    /// use service::authz::Role;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let user = AuthUser { id: uuid::Uuid::new_v4(), username: "eva".into(), email: "eva@club.example.org".into(),
    ///     full_name: "Eva".into(), active: true, roles: vec![Role::Editor], last_login_at: None };
    /// repo.insert_user(user, service::password::hash_password("Passw0rd!").unwrap());
    /// let cfg = AuthConfig { jwt_secret: "0123456789abcdef".into(), issuer: "doc".into(), access_ttl_secs: 60, refresh_ttl_secs: 600 };
    /// let svc = AuthService::new(repo, cfg);
    /// let session = tokio_test::block_on(svc.login(LoginInput { username_or_email: "eva".into(), password: "Passw0rd!".into() })).unwrap();
    /// assert_eq!(session.token_type, "Bearer");
    /// assert!(session.user.permissions.len() > 10);
    /// ```
    #[instrument(skip(self, input), fields(login = %input.username_or_email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_login(&input.username_or_email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !password::verify_password(&input.password, &cred.password_hash)? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::Unauthorized);
        }
        if !user.active {
            warn!(user_id = %user.id, "login attempt on disabled account");
            return Err(AuthError::Inactive);
        }

        self.repo.touch_last_login(user.id).await?;
        info!(user_id = %user.id, username = %user.username, "user_logged_in");
        self.issue_tokens(&user)
    }

    /// Exchange a refresh token for a new pair. The presented token is revoked.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let claims = self.codec.decode(refresh_token, TokenType::Refresh)?;
        if self.revoked.is_revoked(&claims.jti).await {
            warn!(jti = %claims.jti, "revoked refresh token presented");
            return Err(AuthError::Revoked);
        }
        let user = self.repo
            .find_user_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if !user.active {
            return Err(AuthError::Inactive);
        }
        self.revoked.revoke(&claims.jti, claims.exp).await;
        info!(user_id = %user.id, "token_refreshed");
        self.issue_tokens(&user)
    }

    /// Revoke the access token and, when given and valid, the refresh token.
    #[instrument(skip_all, fields(user_id = %access.sub))]
    pub async fn logout(&self, access: &Claims, refresh_token: Option<&str>) {
        self.revoked.revoke(&access.jti, access.exp).await;
        if let Some(token) = refresh_token {
            match self.codec.decode(token, TokenType::Refresh) {
                Ok(c) if c.sub == access.sub => self.revoked.revoke(&c.jti, c.exp).await,
                Ok(_) => warn!("refresh token belongs to another user; not revoked"),
                Err(e) => debug!(error = %e, "ignoring unusable refresh token on logout"),
            }
        }
        info!("user_logged_out");
    }

    /// Validate a bearer access token.
    pub async fn authenticate(&self, token: &str) -> Result<(Principal, Claims), AuthError> {
        let claims = self.codec.decode(token, TokenType::Access)?;
        if self.revoked.is_revoked(&claims.jti).await {
            return Err(AuthError::Revoked);
        }
        let principal = claims.principal()?;
        Ok((principal, claims))
    }

    pub fn issue_tokens(&self, user: &AuthUser) -> Result<AuthSession, AuthError> {
        let (access_token, _) = self.codec.issue(user, TokenType::Access)?;
        let (refresh_token, _) = self.codec.issue(user, TokenType::Refresh)?;
        Ok(AuthSession {
            access_token,
            refresh_token,
            token_type: "Bearer".into(),
            expires_in: self.codec.ttl(TokenType::Access),
            refresh_expires_in: self.codec.ttl(TokenType::Refresh),
            user: UserInfo::from(user),
        })
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<UserInfo, AuthError> {
        let user = self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::NotFound)?;
        Ok(UserInfo::from(&user))
    }

    #[instrument(skip(self, new_password))]
    pub async fn set_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        password::check_strength(new_password)?;
        self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::NotFound)?;
        let hash = password::hash_password(new_password)?;
        self.repo.upsert_password(user_id, hash, password::ALGORITHM.into()).await?;
        info!(user_id = %user_id, "password_changed");
        Ok(())
    }
}
