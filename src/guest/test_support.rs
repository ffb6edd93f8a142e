use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{NotifyError, StoreError};
use super::memory::InMemoryGuestStore;
use super::model::{GuestPatch, GuestUser, NewGuestUser};
use super::ports::{Clock, CredentialNotifier, GuestStore};

// 固定时间，保证过期时间断言可重复
pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub insert: bool,
    pub find: bool,
    pub update: bool,
    pub delete: bool,
    pub list: bool,
}

// 在内存存储外包一层，按标记注入失败
#[derive(Clone)]
pub(crate) struct FailingStore {
    inner: InMemoryGuestStore,
    failures: FailureFlags,
}

impl FailingStore {
    pub(crate) fn new(failures: FailureFlags) -> Self {
        Self {
            inner: InMemoryGuestStore::new(),
            failures,
        }
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Backend(format!("{} failed", op))
}

#[async_trait]
impl GuestStore for FailingStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<GuestUser>, StoreError> {
        if self.failures.find {
            return Err(injected("find"));
        }
        self.inner.find_by_username(username).await
    }

    async fn insert(&self, guest: NewGuestUser) -> Result<GuestUser, StoreError> {
        if self.failures.insert {
            return Err(injected("insert"));
        }
        self.inner.insert(guest).await
    }

    async fn toggle_active(&self, id: Uuid, created_by: Uuid) -> Result<Option<GuestUser>, StoreError> {
        if self.failures.update {
            return Err(injected("update"));
        }
        self.inner.toggle_active(id, created_by).await
    }

    async fn update_fields(
        &self,
        id: Uuid,
        created_by: Uuid,
        patch: &GuestPatch,
    ) -> Result<Option<GuestUser>, StoreError> {
        if self.failures.update {
            return Err(injected("update"));
        }
        self.inner.update_fields(id, created_by, patch).await
    }

    async fn delete(&self, id: Uuid, created_by: Uuid) -> Result<bool, StoreError> {
        if self.failures.delete {
            return Err(injected("delete"));
        }
        self.inner.delete(id, created_by).await
    }

    async fn list_by_creator(&self, created_by: Uuid) -> Result<Vec<GuestUser>, StoreError> {
        if self.failures.list {
            return Err(injected("list"));
        }
        self.inner.list_by_creator(created_by).await
    }
}

// 记录发出的 (用户名, 明文密码)
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl CredentialNotifier for RecordingNotifier {
    async fn send_credentials(
        &self,
        account: &GuestUser,
        plaintext_password: &str,
    ) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("smtp unavailable".to_string()));
        }

        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        guard.push((account.username.clone(), plaintext_password.to_string()));
        Ok(())
    }
}
