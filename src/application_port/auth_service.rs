use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("user already exists")]
    AlreadyExists,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("token generation error: {0}")]
    TokenGeneration(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

#[derive(Clone)]
pub struct RegistrationInput {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistrationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationInput")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    #[serde(rename = "userName")]
    pub username: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone)]
pub struct IssuedTokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Salted adaptive hash; `cost` tunes the work per hash.
    async fn hash_password(&self, password: &str, cost: u32) -> Result<String, AuthError>;
    async fn verify_password(&self, password_hash: &str, password: &str) -> bool;
}

#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_token(
        &self,
        user_id: UserId,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn registration(&self, request: RegistrationInput) -> Result<IssuedTokenPair, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<IssuedTokenPair, AuthError>;
}
