use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::guest::GuestError;
use crate::utils::{error_codes, error_to_api_response, error_to_api_response_with};

/// 校验失败时放在 `resp_data` 中
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
}

impl IntoResponse for GuestError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            GuestError::Validation { field, message } => {
                return (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response_with(
                        error_codes::VALIDATION_ERROR,
                        message,
                        FieldError { field },
                    ),
                )
                    .into_response();
            }
            GuestError::Conflict { .. } => (
                StatusCode::CONFLICT,
                error_codes::USER_EXISTS,
                "用户名已存在".to_string(),
            ),
            GuestError::NotFound => (
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                "访客用户不存在".to_string(),
            ),
            // 内部细节只写日志，不返回给调用方
            GuestError::Storage(detail) => {
                tracing::error!(error = %detail, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "数据库错误".to_string(),
                )
            }
            GuestError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "内部服务器错误".to_string(),
                )
            }
        };

        (status, error_to_api_response::<()>(code, msg)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn storage_detail_is_not_exposed() {
        let resp = GuestError::Storage("relation \"guest_users\" does not exist".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(resp).await;
        assert_eq!(body["code"], error_codes::INTERNAL_ERROR);
        assert!(!body["msg"].as_str().unwrap().contains("guest_users"));
        assert!(body.get("resp_data").is_none());
    }

    #[tokio::test]
    async fn validation_names_the_field() {
        let resp = GuestError::validation("days", "过期时间无效：days 必须是非负整数").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_of(resp).await;
        assert_eq!(body["code"], error_codes::VALIDATION_ERROR);
        assert!(body["msg"].as_str().unwrap().contains("days"));
        assert_eq!(body["resp_data"]["field"], "days");
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let resp = GuestError::Conflict {
            username: "bob_sub".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
