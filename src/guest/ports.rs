use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{NotifyError, StoreError};
use super::model::{GuestPatch, GuestUser, NewGuestUser};

/// 访客账号存储，用户名唯一性必须由实现方在写入时保证
#[async_trait]
pub trait GuestStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<GuestUser>, StoreError>;

    /// 用户名冲突时返回 `StoreError::DuplicateUsername`
    async fn insert(&self, guest: NewGuestUser) -> Result<GuestUser, StoreError>;

    /// 原子地翻转 `is_active`，记录不存在或不属于 `created_by` 时返回 `None`
    async fn toggle_active(&self, id: Uuid, created_by: Uuid) -> Result<Option<GuestUser>, StoreError>;

    /// 记录不存在或不属于 `created_by` 时返回 `None`
    async fn update_fields(
        &self,
        id: Uuid,
        created_by: Uuid,
        patch: &GuestPatch,
    ) -> Result<Option<GuestUser>, StoreError>;

    async fn delete(&self, id: Uuid, created_by: Uuid) -> Result<bool, StoreError>;

    /// 按创建时间倒序
    async fn list_by_creator(&self, created_by: Uuid) -> Result<Vec<GuestUser>, StoreError>;
}

/// 向访客发送登录凭据
#[async_trait]
pub trait CredentialNotifier: Send + Sync {
    async fn send_credentials(
        &self,
        account: &GuestUser,
        plaintext_password: &str,
    ) -> Result<(), NotifyError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
