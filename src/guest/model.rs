use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::expiration::ExpirationInput;
use super::status::GuestStatus;

/// 发起请求的管理员身份，由认证中间件解析后显式传入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GuestUser {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuestUser {
    pub fn status(&self, now: DateTime<Utc>) -> GuestStatus {
        GuestStatus::derive(self.expires_at, self.is_active, now)
    }
}

/// 待插入的访客记录，`id`/时间戳由存储层生成
#[derive(Debug, Clone)]
pub struct NewGuestUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
    pub created_by: Uuid,
}

/// 部分更新，只有 `Some` 的字段会写入
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestPatch {
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl GuestPatch {
    pub fn is_empty(&self) -> bool {
        self.is_active.is_none() && self.expires_at.is_none()
    }
}

/// 返回给管理员的访客信息，附带当前状态
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestView {
    #[serde(flatten)]
    pub user: GuestUser,
    pub status: GuestStatus,
}

impl GuestView {
    pub fn new(user: GuestUser, now: DateTime<Utc>) -> Self {
        let status = user.status(now);
        Self { user, status }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestRequest {
    #[serde(default)]
    pub base_username: String,
    /// 为空时自动生成
    #[serde(default)]
    pub password: Option<String>,
    pub expiration: Option<ExpirationInput>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGuestRequest {
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expiration: Option<ExpirationInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestResponse {
    pub user: GuestView,
    pub plain_password: String,
    pub email_sent: bool,
    pub email_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStatusResponse {
    pub is_active: bool,
    pub status: GuestStatus,
}
