use axum::Json;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::guest::AdminContext;

// 自动生成密码使用的字符集
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
const PASSWORD_LENGTH: usize = 12;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// 管理员令牌声明，由外部认证服务签发
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // 管理员ID
    pub email: String, // 管理员邮箱
    pub exp: i64,      // 过期时间
    pub iat: i64,      // 签发时间
}

impl Claims {
    pub fn admin(&self) -> Option<AdminContext> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        Some(AdminContext {
            id,
            email: self.email.clone(),
        })
    }
}

/// 为管理员签发令牌，本服务不提供登录接口，仅供运维脚本和测试使用
pub fn generate_token(
    admin: &AdminContext,
    config: &Config,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = (now + Duration::seconds(config.jwt_expiration().as_secs() as i64)).timestamp();

    let claims = Claims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        exp: expiration,
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// 通用的API响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0表示成功
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

/// 错误响应附带数据，例如校验失败的字段名
pub fn error_to_api_response_with<T: Serialize>(code: i32, msg: String, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: Some(data),
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_password_uses_charset() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
        assert_ne!(password, generate_password());
    }

    #[test]
    fn token_round_trip_yields_admin() {
        let config = Config::default();
        let admin = AdminContext {
            id: Uuid::new_v4(),
            email: "ops@acme.example.com".to_string(),
        };

        let (token, _) = generate_token(&admin, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.admin(), Some(admin));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = Config::default();
        let mut other = Config::default();
        other.jwt_secret = "another-secret".to_string();
        let admin = AdminContext {
            id: Uuid::new_v4(),
            email: "ops@acme.example.com".to_string(),
        };

        let (token, _) = generate_token(&admin, &other).unwrap();

        assert!(verify_token(&token, &config).is_err());
    }
}
