use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::guest::{GuestPatch, GuestStore, GuestUser, NewGuestUser, StoreError};

const GUEST_COLUMNS: &str = "id, username, password_hash, full_name, email, phone_number, \
     expires_at, is_active, created_by, created_at, updated_at";

/// 访客账号的 PostgreSQL 存储
#[derive(Clone)]
pub struct PgGuestStore {
    pool: PgPool,
}

impl PgGuestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 唯一索引冲突映射为 `DuplicateUsername`，其余错误只保留描述
fn map_insert_error(err: sqlx::Error, username: &str) -> StoreError {
    let unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique {
        tracing::debug!(%username, "Guest username already taken");
        StoreError::DuplicateUsername(username.to_string())
    } else {
        tracing::error!(%username, error = ?err, "Failed to insert guest user");
        backend(err)
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl GuestStore for PgGuestStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<GuestUser>, StoreError> {
        let sql = format!("SELECT {GUEST_COLUMNS} FROM guest_users WHERE username = $1");
        sqlx::query_as::<_, GuestUser>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn insert(&self, guest: NewGuestUser) -> Result<GuestUser, StoreError> {
        let sql = format!(
            "INSERT INTO guest_users \
             (username, password_hash, full_name, email, phone_number, expires_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {GUEST_COLUMNS}"
        );

        sqlx::query_as::<_, GuestUser>(&sql)
            .bind(&guest.username)
            .bind(&guest.password_hash)
            .bind(&guest.full_name)
            .bind(&guest.email)
            .bind(&guest.phone_number)
            .bind(guest.expires_at)
            .bind(guest.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, &guest.username))
    }

    async fn toggle_active(&self, id: Uuid, created_by: Uuid) -> Result<Option<GuestUser>, StoreError> {
        // 单条语句内取反，并发切换各自生效
        let sql = format!(
            "UPDATE guest_users SET is_active = NOT is_active, updated_at = NOW() \
             WHERE id = $1 AND created_by = $2 RETURNING {GUEST_COLUMNS}"
        );
        sqlx::query_as::<_, GuestUser>(&sql)
            .bind(id)
            .bind(created_by)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        created_by: Uuid,
        patch: &GuestPatch,
    ) -> Result<Option<GuestUser>, StoreError> {
        let mut qb = build_update(id, created_by, patch);
        qb.build_query_as::<GuestUser>()
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn delete(&self, id: Uuid, created_by: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM guest_users WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(created_by)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_creator(&self, created_by: Uuid) -> Result<Vec<GuestUser>, StoreError> {
        let sql = format!(
            "SELECT {GUEST_COLUMNS} FROM guest_users WHERE created_by = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, GuestUser>(&sql)
            .bind(created_by)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
    }
}

// 只为补丁中存在的字段生成 SET 子句，值全部走参数绑定
fn build_update(id: Uuid, created_by: Uuid, patch: &GuestPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE guest_users SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(is_active) = patch.is_active {
            set.push("is_active = ");
            set.push_bind_unseparated(is_active);
        }
        if let Some(expires_at) = patch.expires_at {
            set.push("expires_at = ");
            set.push_bind_unseparated(expires_at);
        }
        set.push("updated_at = NOW()");
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" AND created_by = ");
    qb.push_bind(created_by);
    qb.push(" RETURNING ");
    qb.push(GUEST_COLUMNS);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sqlx::error::{DatabaseError, ErrorKind};

    #[derive(Debug, thiserror::Error)]
    #[error("duplicate key value violates unique constraint \"guest_users_username_key\"")]
    struct UniqueViolation;

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_maps_to_duplicate_username() {
        let err = sqlx::Error::Database(Box::new(UniqueViolation));
        assert!(matches!(
            map_insert_error(err, "bob_sub"),
            StoreError::DuplicateUsername(name) if name == "bob_sub"
        ));

        assert!(matches!(
            map_insert_error(sqlx::Error::PoolTimedOut, "bob_sub"),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn update_sql_only_touches_present_fields() {
        let id = Uuid::new_v4();
        let admin = Uuid::new_v4();

        let patch = GuestPatch {
            is_active: Some(false),
            expires_at: None,
        };
        let qb = build_update(id, admin, &patch);
        assert_eq!(
            qb.sql(),
            format!(
                "UPDATE guest_users SET is_active = $1, updated_at = NOW() \
                 WHERE id = $2 AND created_by = $3 RETURNING {GUEST_COLUMNS}"
            )
        );

        let patch = GuestPatch {
            is_active: Some(true),
            expires_at: Some(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()),
        };
        let qb = build_update(id, admin, &patch);
        assert!(qb
            .sql()
            .starts_with("UPDATE guest_users SET is_active = $1, expires_at = $2, updated_at = NOW() WHERE id = $3"));
    }
}
