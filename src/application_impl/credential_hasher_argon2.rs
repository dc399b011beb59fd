use crate::application_port::{AuthError, CredentialHasher};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use tracing::warn;

/// Argon2id hasher. The cost factor is the iteration count (`t_cost`);
/// memory and lane parameters stay at the crate defaults.
#[derive(Debug, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    fn with_cost(cost: u32) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthError::Hashing(format!("invalid cost factor {cost}: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str, cost: u32) -> Result<String, AuthError> {
        let argon2 = Self::with_cost(cost)?;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::Hashing(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password_hash: &str, password: &str) -> bool {
        let password_hash = password_hash.to_owned();
        let password = password.to_owned();

        // Parameters come from the PHC string, so hashes made with any cost verify.
        let outcome = tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)?;
            Argon2::default().verify_password(password.as_bytes(), &parsed)
        })
        .await;

        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(argon2::password_hash::Error::Password)) => false,
            Ok(Err(e)) => {
                warn!("stored password hash rejected: {}", e);
                false
            }
            Err(e) => {
                warn!("verification task failed: {}", e);
                false
            }
        }
    }
}
