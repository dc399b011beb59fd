use crate::application_port::*;
use crate::domain_model::User;
use crate::domain_port::{UserRepo, UserRepoError};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

// Verified against on unknown-user logins so they cost the same as a mismatch.
const DECOY_PASSWORD: &str = "decoy-password";

/// Process-wide knobs for the auth flows, built once from settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub cost: u32,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: Duration,
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_issuer: Arc<dyn TokenIssuer>,
    cfg: AuthConfig,
    decoy_hash: OnceCell<String>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_issuer: Arc<dyn TokenIssuer>,
        cfg: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_issuer,
            cfg,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Build the decoy hash now instead of on the first unknown-user login.
    pub async fn prepare_decoy(&self) -> Result<(), AuthError> {
        self.decoy().await.map(|_| ())
    }

    async fn decoy(&self) -> Result<&String, AuthError> {
        self.decoy_hash
            .get_or_try_init(|| {
                self.credential_hasher
                    .hash_password(DECOY_PASSWORD, self.cfg.cost)
            })
            .await
    }

    /// Run one verification against a hash made with the configured cost.
    async fn verify_against_decoy(&self, password: &str) {
        match self.decoy().await {
            Ok(hash) => {
                self.credential_hasher.verify_password(hash, password).await;
            }
            Err(e) => error!("prepare decoy hash: {}", e),
        }
    }

    async fn with_store_timeout<T, F>(&self, op: &str, fut: F) -> Result<T, UserRepoError>
    where
        F: Future<Output = Result<T, UserRepoError>> + Send,
    {
        match tokio::time::timeout(self.cfg.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(UserRepoError::Store(format!(
                "{op} timed out after {:?}",
                self.cfg.store_timeout
            ))),
        }
    }

    fn expiry_after(ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
        let ttl =
            chrono::Duration::from_std(ttl).map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
        Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenGeneration("token expiry out of range".to_string()))
    }

    async fn issue_pair(&self, user: &User) -> Result<IssuedTokenPair, AuthError> {
        let access_exp = Self::expiry_after(self.cfg.access_ttl)?;
        let access_token = self
            .token_issuer
            .issue_token(user.id, &user.username, access_exp)
            .await?;

        let refresh_exp = Self::expiry_after(self.cfg.refresh_ttl)?;
        let refresh_token = self
            .token_issuer
            .issue_token(user.id, &user.username, refresh_exp)
            .await?;

        Ok(IssuedTokenPair {
            access_token: AccessToken(access_token),
            refresh_token: RefreshToken(refresh_token),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    #[tracing::instrument(skip_all, fields(username = %request.username))]
    async fn registration(&self, request: RegistrationInput) -> Result<IssuedTokenPair, AuthError> {
        let RegistrationInput { username, password } = request;

        let password_hash = self
            .credential_hasher
            .hash_password(&password, self.cfg.cost)
            .await
            .inspect_err(|e| error!("hash password: {}", e))?;

        let user = self
            .with_store_timeout("create user", self.user_repo.create_user(&username, &password_hash))
            .await
            .map_err(|e| match e {
                UserRepoError::AlreadyExists => AuthError::AlreadyExists,
                UserRepoError::NotFound => {
                    AuthError::Persistence("created user could not be read back".to_string())
                }
                UserRepoError::Store(e) => AuthError::Persistence(e),
            })
            .inspect_err(|e| match e {
                AuthError::AlreadyExists => warn!("username already taken"),
                e => error!("create user: {}", e),
            })?;

        info!(user_id = %user.id, "user registered");

        // The row stays if signing fails; the caller sees a failed registration.
        self.issue_pair(&user)
            .await
            .inspect_err(|e| error!(user_id = %user.id, "issue tokens: {}", e))
    }

    #[tracing::instrument(skip_all, fields(username = %request.username))]
    async fn login(&self, request: LoginInput) -> Result<IssuedTokenPair, AuthError> {
        let LoginInput { username, password } = request;

        let lookup = self
            .with_store_timeout("get user", self.user_repo.get_user_by_name(&username))
            .await;
        let user = match lookup {
            Ok(user) => user,
            Err(UserRepoError::NotFound) => {
                warn!("login for unknown user");
                self.verify_against_decoy(&password).await;
                return Err(AuthError::NotFound);
            }
            Err(UserRepoError::AlreadyExists) => {
                error!("get user: unexpected conflict on lookup");
                return Err(AuthError::Persistence(
                    "unexpected conflict on lookup".to_string(),
                ));
            }
            Err(UserRepoError::Store(e)) => {
                error!("get user: {}", e);
                return Err(AuthError::Persistence(e));
            }
        };

        if !self
            .credential_hasher
            .verify_password(&user.password_hash, &password)
            .await
        {
            warn!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self
            .issue_pair(&user)
            .await
            .inspect_err(|e| error!(user_id = %user.id, "issue tokens: {}", e))?;

        info!(user_id = %user.id, "user logged in");
        Ok(tokens)
    }
}
