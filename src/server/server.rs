use crate::api::v1::CookiePolicy;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub cookie_policy: CookiePolicy,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let auth_config = settings.auth_config()?;
        let jwt_config = settings.jwt_config()?;

        let (user_repo, pool): (Arc<dyn UserRepo>, Option<MySqlPool>) =
            match settings.store.backend.as_str() {
                "memory" => {
                    warn!("using in-memory user store; accounts are lost on restart");
                    (Arc::new(InMemoryUserRepo::new()), None)
                }
                "mysql" => {
                    let dsn = settings
                        .store
                        .dsn
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("store.dsn is required for mysql"))?;
                    let pool = MySqlPoolOptions::new()
                        .max_connections(settings.store.max_connections)
                        .acquire_timeout(settings.store_timeout()?)
                        .connect(dsn)
                        .await?;
                    (Arc::new(MySqlUserRepo::new(pool.clone())), Some(pool))
                }
                other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
            };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new());
        let token_issuer: Arc<dyn TokenIssuer> = Arc::new(JwtHs256Issuer::new(jwt_config));
        debug!(?auth_config);

        let auth_service = RealAuthService::new(
            user_repo,
            credential_hasher,
            token_issuer,
            auth_config,
        );
        auth_service.prepare_decoy().await?;
        let auth_service: Arc<dyn AuthService> = Arc::new(auth_service);

        info!("server started");

        Ok(Self {
            auth_service,
            cookie_policy: CookiePolicy::new(settings.tokens_secure()),
            pool,
        })
    }

    /// Assemble a server around an existing auth service, without a database.
    pub fn with_services(auth_service: Arc<dyn AuthService>, cookie_policy: CookiePolicy) -> Self {
        Self {
            auth_service,
            cookie_policy,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("database pool closed");
        }
    }
}
