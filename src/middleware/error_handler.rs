use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::error;

// 错误响应体只读取这么多用于日志
const MAX_LOGGED_BODY: usize = 4096;

/// 记录所有 5xx 响应的请求路径和响应体
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!(%method, %uri, status = %parts.status, "Failed to read error response body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        %method,
        %uri,
        status = %parts.status,
        body = %String::from_utf8_lossy(&bytes),
        "Server error occurred"
    );

    // body 已被读出，重新构建响应
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
