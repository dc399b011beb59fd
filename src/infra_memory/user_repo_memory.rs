use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};

/// Process-local user store for tests and single-node development runs.
/// Usernames compare byte for byte, like the `utf8mb4_bin` column in MySQL.
#[derive(Debug)]
pub struct InMemoryUserRepo {
    users: DashMap<String, User>,
    next_id: AtomicI64,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        InMemoryUserRepo {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for InMemoryUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, UserRepoError> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(UserRepoError::AlreadyExists),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: UserId(self.next_id.fetch_add(1, Ordering::Relaxed)),
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn get_user_by_name(&self, username: &str) -> Result<User, UserRepoError> {
        self.users
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or(UserRepoError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_assigns_ids_and_timestamps() {
        let repo = InMemoryUserRepo::new();

        let alice = repo.create_user("alice", "hash-a").await.unwrap();
        let bob = repo.create_user("bob", "hash-b").await.unwrap();

        assert_eq!(alice.id, UserId(1));
        assert_eq!(bob.id, UserId(2));
        assert_eq!(alice.created_at, alice.updated_at);

        let fetched = repo.get_user_by_name("bob").await.unwrap();
        assert_eq!(fetched.id, bob.id);
        assert_eq!(fetched.password_hash, "hash-b");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = InMemoryUserRepo::new();
        repo.create_user("alice", "hash-a").await.unwrap();

        let err = repo.create_user("alice", "hash-b").await.unwrap_err();
        assert!(matches!(err, UserRepoError::AlreadyExists));
        assert_eq!(repo.len(), 1);
        assert_eq!(
            repo.get_user_by_name("alice").await.unwrap().password_hash,
            "hash-a"
        );
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let repo = InMemoryUserRepo::new();
        let lower = repo.create_user("alice", "hash-a").await.unwrap();
        let upper = repo.create_user("Alice", "hash-b").await.unwrap();

        assert_ne!(lower.id, upper.id);
        assert!(matches!(
            repo.get_user_by_name("ALICE").await.unwrap_err(),
            UserRepoError::NotFound
        ));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let repo = InMemoryUserRepo::new();
        assert!(repo.is_empty());

        let err = repo.get_user_by_name("ghost").await.unwrap_err();
        assert!(matches!(err, UserRepoError::NotFound));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_admit_exactly_one() {
        let repo = Arc::new(InMemoryUserRepo::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create_user("alice", &format!("hash-{i}")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.len(), 1);
    }
}
