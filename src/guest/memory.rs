use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::StoreError;
use super::model::{GuestPatch, GuestUser, NewGuestUser};
use super::ports::GuestStore;

/// 内存存储，用于本地开发和测试。查重与写入在同一把锁内完成
#[derive(Clone, Default)]
pub struct InMemoryGuestStore {
    guests: Arc<Mutex<HashMap<Uuid, GuestUser>>>,
}

impl InMemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.guests.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.guests.lock().await.is_empty()
    }
}

#[async_trait]
impl GuestStore for InMemoryGuestStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<GuestUser>, StoreError> {
        let guests = self.guests.lock().await;
        Ok(guests.values().find(|g| g.username == username).cloned())
    }

    async fn insert(&self, guest: NewGuestUser) -> Result<GuestUser, StoreError> {
        let mut guests = self.guests.lock().await;
        if guests.values().any(|g| g.username == guest.username) {
            return Err(StoreError::DuplicateUsername(guest.username));
        }

        let now = Utc::now();
        let user = GuestUser {
            id: Uuid::new_v4(),
            username: guest.username,
            password_hash: guest.password_hash,
            full_name: guest.full_name,
            email: guest.email,
            phone_number: guest.phone_number,
            expires_at: guest.expires_at,
            is_active: true,
            created_by: guest.created_by,
            created_at: now,
            updated_at: now,
        };
        guests.insert(user.id, user.clone());
        Ok(user)
    }

    async fn toggle_active(&self, id: Uuid, created_by: Uuid) -> Result<Option<GuestUser>, StoreError> {
        let mut guests = self.guests.lock().await;
        let Some(guest) = guests.get_mut(&id).filter(|g| g.created_by == created_by) else {
            return Ok(None);
        };

        guest.is_active = !guest.is_active;
        guest.updated_at = Utc::now();
        Ok(Some(guest.clone()))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        created_by: Uuid,
        patch: &GuestPatch,
    ) -> Result<Option<GuestUser>, StoreError> {
        let mut guests = self.guests.lock().await;
        let Some(guest) = guests.get_mut(&id).filter(|g| g.created_by == created_by) else {
            return Ok(None);
        };

        if let Some(is_active) = patch.is_active {
            guest.is_active = is_active;
        }
        if let Some(expires_at) = patch.expires_at {
            guest.expires_at = expires_at;
        }
        guest.updated_at = Utc::now();

        Ok(Some(guest.clone()))
    }

    async fn delete(&self, id: Uuid, created_by: Uuid) -> Result<bool, StoreError> {
        let mut guests = self.guests.lock().await;
        let owned = guests.get(&id).is_some_and(|g| g.created_by == created_by);
        if owned {
            guests.remove(&id);
        }
        Ok(owned)
    }

    async fn list_by_creator(&self, created_by: Uuid) -> Result<Vec<GuestUser>, StoreError> {
        let guests = self.guests.lock().await;
        let mut owned: Vec<GuestUser> = guests
            .values()
            .filter(|g| g.created_by == created_by)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
