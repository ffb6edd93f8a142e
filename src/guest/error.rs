use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuestError {
    /// 请求字段不合法，`field` 指出具体字段
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("用户名已存在: {username}")]
    Conflict { username: String },

    /// 账号不存在或不属于当前管理员，两种情况不做区分
    #[error("访客用户不存在")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GuestError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GuestError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate username: {0}")]
    DuplicateUsername(String),

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for GuestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(username) => GuestError::Conflict { username },
            StoreError::Backend(detail) => GuestError::Storage(detail),
        }
    }
}

/// 通知发送错误，只记录日志，不影响创建结果
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("transport error: {0}")]
    Transport(String),
}
