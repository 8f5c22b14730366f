use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::Result;

/// Principal name carried by every admin token.
pub const ADMIN_PRINCIPAL: &str = "admin";

/// Lifetime of every issued token.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
}

/// Which signing secret a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    User,
    Admin,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies HS256 tokens. User and admin tokens are signed with
/// different secrets, so neither kind verifies as the other.
pub struct TokenService {
    user: Keys,
    admin: Keys,
    validation: Validation,
}

impl TokenService {
    pub fn new(user_secret: &str, admin_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            user: Keys::from_secret(user_secret),
            admin: Keys::from_secret(admin_secret),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.user_token_secret, &config.admin_token_secret)
    }

    pub fn issue_user_token(&self, username: &str) -> Result<String> {
        self.issue(username, TokenKind::User)
    }

    pub fn issue_admin_token(&self) -> Result<String> {
        self.issue(ADMIN_PRINCIPAL, TokenKind::Admin)
    }

    /// Checks signature, shape and expiry. Every failure is the same
    /// `InvalidToken`; the reason is only logged.
    pub fn verify(&self, token: &str, kind: TokenKind) -> std::result::Result<Claims, AuthError> {
        decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(?kind, error = %e, "Token verification failed");
                AuthError::InvalidToken
            })
    }

    fn issue(&self, username: &str, kind: TokenKind) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            username: username.to_string(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.keys(kind).encoding)?;
        Ok(token)
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::User => &self.user,
            TokenKind::Admin => &self.admin,
        }
    }
}
