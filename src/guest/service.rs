use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::utils::{generate_password, hash_password};

use super::error::GuestError;
use super::expiration::{apply_duration, validate_duration};
use super::model::{
    AdminContext, CreateGuestRequest, CreateGuestResponse, GuestPatch, GuestView, NewGuestUser,
    ToggleStatusResponse, UpdateGuestRequest,
};
use super::ports::{Clock, CredentialNotifier, GuestStore};
use super::username::{derive_username, is_valid_email};

/// 访客账号的创建、查询、更新和删除。每个操作都显式接收当前管理员身份
#[derive(Clone)]
pub struct GuestService {
    store: Arc<dyn GuestStore>,
    notifier: Arc<dyn CredentialNotifier>,
    clock: Arc<dyn Clock>,
    hash_cost: u32,
}

impl GuestService {
    pub fn new(
        store: Arc<dyn GuestStore>,
        notifier: Arc<dyn CredentialNotifier>,
        clock: Arc<dyn Clock>,
        hash_cost: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            hash_cost,
        }
    }

    pub async fn create_guest(
        &self,
        admin: &AdminContext,
        req: CreateGuestRequest,
    ) -> Result<CreateGuestResponse, GuestError> {
        require("fullName", &req.full_name)?;
        require("email", &req.email)?;
        require("phoneNumber", &req.phone_number)?;
        if !is_valid_email(&req.email) {
            return Err(GuestError::validation("email", "邮箱格式无效"));
        }
        if req.base_username.is_empty() {
            return Err(GuestError::validation("baseUsername", "用户名不能为空"));
        }

        let expiration = req
            .expiration
            .as_ref()
            .ok_or_else(|| GuestError::validation("expiration", "缺少过期时间"))?;
        let duration = validate_duration(expiration)?;

        let username = derive_username(&admin.email, &req.base_username)?;

        // 提前查重只为返回友好的错误，唯一性由存储层保证
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(GuestError::Conflict { username });
        }

        let now = self.clock.now();
        let expires_at = apply_duration(now, &duration).ok_or_else(out_of_range)?;

        let password = match req.password {
            Some(p) if !p.is_empty() => p,
            _ => generate_password(),
        };
        let password_hash = hash_blocking(password.clone(), self.hash_cost).await?;

        let user = self
            .store
            .insert(NewGuestUser {
                username,
                password_hash,
                full_name: req.full_name,
                email: req.email,
                phone_number: req.phone_number,
                expires_at,
                created_by: admin.id,
            })
            .await?;

        tracing::info!(
            guest_id = %user.id,
            username = %user.username,
            admin_id = %admin.id,
            expires_at = %user.expires_at,
            "Created guest user"
        );

        // 邮件失败不回滚账号，只在响应里说明
        let (email_sent, email_message) =
            match self.notifier.send_credentials(&user, &password).await {
                Ok(()) => (true, "凭据已发送至用户邮箱"),
                Err(e) => {
                    tracing::warn!(guest_id = %user.id, error = %e, "Failed to send guest credentials");
                    (false, "邮件发送失败")
                }
            };

        Ok(CreateGuestResponse {
            user: GuestView::new(user, now),
            plain_password: password,
            email_sent,
            email_message: email_message.to_string(),
        })
    }

    pub async fn list_guests(&self, admin: &AdminContext) -> Result<Vec<GuestView>, GuestError> {
        let now = self.clock.now();
        let guests = self.store.list_by_creator(admin.id).await?;
        Ok(guests.into_iter().map(|g| GuestView::new(g, now)).collect())
    }

    pub async fn update_guest(
        &self,
        admin: &AdminContext,
        id: Uuid,
        req: UpdateGuestRequest,
    ) -> Result<GuestView, GuestError> {
        let now = self.clock.now();
        let patch = resolve_patch(&req, now)?;

        let user = self
            .store
            .update_fields(id, admin.id, &patch)
            .await?
            .ok_or(GuestError::NotFound)?;

        tracing::info!(
            guest_id = %user.id,
            admin_id = %admin.id,
            is_active = ?patch.is_active,
            expires_at = ?patch.expires_at,
            "Updated guest user"
        );

        Ok(GuestView::new(user, now))
    }

    pub async fn toggle_status(
        &self,
        admin: &AdminContext,
        id: Uuid,
    ) -> Result<ToggleStatusResponse, GuestError> {
        let user = self
            .store
            .toggle_active(id, admin.id)
            .await?
            .ok_or(GuestError::NotFound)?;

        let status = user.status(self.clock.now());
        tracing::info!(
            guest_id = %user.id,
            admin_id = %admin.id,
            is_active = user.is_active,
            status = status.as_str(),
            "Toggled guest user status"
        );

        Ok(ToggleStatusResponse {
            is_active: user.is_active,
            status,
        })
    }

    pub async fn delete_guest(&self, admin: &AdminContext, id: Uuid) -> Result<(), GuestError> {
        if !self.store.delete(id, admin.id).await? {
            return Err(GuestError::NotFound);
        }

        tracing::info!(guest_id = %id, admin_id = %admin.id, "Deleted guest user");
        Ok(())
    }
}

/// 把更新请求转换成补丁
///
/// 相对时长优先：存在 `expiration` 时以 `now` 为基准重新计算并整体替换过期时间，
/// 忽略同时提交的 `expiresAt`。两类字段都缺失时视为无效请求。
pub fn resolve_patch(req: &UpdateGuestRequest, now: DateTime<Utc>) -> Result<GuestPatch, GuestError> {
    let expires_at = match (&req.expiration, req.expires_at) {
        (Some(expiration), _) => {
            let duration = validate_duration(expiration)?;
            Some(apply_duration(now, &duration).ok_or_else(out_of_range)?)
        }
        (None, absolute) => absolute,
    };

    let patch = GuestPatch {
        is_active: req.is_active,
        expires_at,
    };
    if patch.is_empty() {
        return Err(GuestError::validation("update", "没有可更新的字段"));
    }

    Ok(patch)
}

fn require(field: &str, value: &str) -> Result<(), GuestError> {
    if value.trim().is_empty() {
        return Err(GuestError::validation(
            field,
            format!("{} 不能为空：姓名、邮箱和手机号为必填项", field),
        ));
    }
    Ok(())
}

fn out_of_range() -> GuestError {
    GuestError::validation("expiration", "过期时间超出可表示范围")
}

// bcrypt 是 CPU 密集操作，放到阻塞线程池
async fn hash_blocking(password: String, cost: u32) -> Result<String, GuestError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| GuestError::Internal(format!("hash task failed: {}", e)))?
        .map_err(|e| GuestError::Internal(format!("failed to hash password: {}", e)))
}
