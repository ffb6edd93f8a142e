use axum::{
    RequestPartsExt,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, verify_token},
};

/// 校验 Bearer 令牌，把管理员身份作为 `AdminContext` 放入请求扩展
pub async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let admin = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => match verify_token(bearer.token(), &state.config) {
            Ok(claims) => claims.admin(),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected admin token");
                None
            }
        },
        Err(_) => None,
    };

    let Some(admin) = admin else {
        return (
            StatusCode::UNAUTHORIZED,
            error_to_api_response::<()>(error_codes::AUTH_FAILED, "未授权访问".to_string()),
        )
            .into_response();
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(admin);
    next.run(req).await
}
