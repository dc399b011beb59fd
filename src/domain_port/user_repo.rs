use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum UserRepoError {
    #[error("username already exists")]
    AlreadyExists,
    #[error("user not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user and return the stored row, generated fields included.
    /// Uniqueness of `username` is enforced atomically by the store.
    async fn create_user(&self, username: &str, password_hash: &str)
    -> Result<User, UserRepoError>;

    async fn get_user_by_name(&self, username: &str) -> Result<User, UserRepoError>;
}
