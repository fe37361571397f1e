use async_trait::async_trait;
use tokio::sync::RwLock;
use usermirror_core::{SyncError, UserFilter, UserRecord, UserSource};

/// In-memory user store preserving insertion order.
///
/// Stands in for the primary store in tests and local runs. Writes are only
/// exposed on this type; the [`UserSource`] view is read-only.
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
        }
    }

    /// Create a store pre-populated with users.
    pub fn from_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Insert a user, replacing any existing user with the same id.
    pub async fn save(&self, user: UserRecord) {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }

    /// Remove a user by id, returning it if present.
    pub async fn remove(&self, id: &str) -> Option<UserRecord> {
        let mut users = self.users.write().await;
        let pos = users.iter().position(|u| u.id == id)?;
        Some(users.remove(pos))
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserSource for InMemoryUserStore {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<UserRecord>, SyncError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| filter.matches(u)).cloned())
    }

    async fn find_page(&self, skip: u64, limit: usize) -> Result<Vec<UserRecord>, SyncError> {
        let users = self.users.read().await;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        Ok(users.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn find_all(&self) -> Result<Vec<UserRecord>, SyncError> {
        Ok(self.users.read().await.clone())
    }
}
