//! JWT encoding and validation (HS256).

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;
use crate::authz::{Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub roles: Vec<String>,
    pub typ: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken("bad subject".into()))
    }

    /// Roles the token was issued with; names that no longer parse are dropped.
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let roles = self.roles.iter().filter_map(|r| r.parse::<Role>().ok()).collect();
        Ok(Principal::new(self.user_id()?, self.username.clone(), roles))
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenCodec {
    pub fn new(secret: &str, issuer: &str, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn ttl(&self, typ: TokenType) -> u64 {
        match typ {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        }
    }

    pub fn issue(&self, user: &AuthUser, typ: TokenType) -> Result<(String, Claims), AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            roles: user.roles.iter().map(|r| r.as_str().to_string()).collect(),
            typ,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl(typ) as i64,
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok((token, claims))
    }

    /// Verifies signature, issuer, expiry and that the token is of the `expected` type.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            other => AuthError::InvalidToken(format!("{other:?}")),
        })?;
        if data.claims.typ != expected {
            return Err(AuthError::InvalidToken("wrong token type".into()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "eva".into(),
            email: "eva@club.example.org".into(),
            full_name: "Eva".into(),
            active: true,
            roles: vec![Role::Editor],
            last_login_at: None,
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new("0123456789abcdef0123", "test-issuer", 60, 600)
    }

    #[test]
    fn issue_and_decode_access() {
        let u = user();
        let (token, claims) = codec().issue(&u, TokenType::Access).unwrap();
        let decoded = codec().decode(&token, TokenType::Access).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, 60);
        let p = decoded.principal().unwrap();
        assert_eq!(p.user_id, u.id);
        assert_eq!(p.roles, vec![Role::Editor]);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let (token, _) = codec().issue(&user(), TokenType::Refresh).unwrap();
        assert!(matches!(codec().decode(&token, TokenType::Access), Err(AuthError::InvalidToken(_))));
        assert!(codec().decode(&token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn foreign_secret_or_issuer_rejected() {
        let (token, _) = codec().issue(&user(), TokenType::Access).unwrap();
        let other_secret = TokenCodec::new("another-secret-of-length", "test-issuer", 60, 600);
        assert!(other_secret.decode(&token, TokenType::Access).is_err());
        let other_issuer = TokenCodec::new("0123456789abcdef0123", "someone-else", 60, 600);
        assert!(other_issuer.decode(&token, TokenType::Access).is_err());
    }

    #[test]
    fn expired_token_reports_expiry() {
        let c = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "old".into(),
            roles: vec![],
            typ: TokenType::Access,
            jti: "j".into(),
            iat: now - 120,
            exp: now - 60,
            iss: "test-issuer".into(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &c.encoding).unwrap();
        assert!(matches!(c.decode(&token, TokenType::Access), Err(AuthError::TokenExpired)));
    }
}
