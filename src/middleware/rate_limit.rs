use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    config::Config,
    utils::{error_codes, error_to_api_response},
};

const KEY_PREFIX: &str = "guest_access:rate_limit:";

/// 窗口内计数，返回本次请求后的计数值
#[async_trait]
pub trait HitCounter: Send + Sync {
    async fn hit(&self, key: &str, window: Duration) -> redis::RedisResult<i64>;
}

pub struct RedisHitCounter {
    client: redis::Client,
}

impl RedisHitCounter {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HitCounter for RedisHitCounter {
    async fn hit(&self, key: &str, window: Duration) -> redis::RedisResult<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // INCR + EXPIRE 实现计数窗口
        let count: i64 = conn.incr(key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(key, window.as_secs() as i64).await?;
        }
        Ok(count)
    }
}

/// 固定窗口限流，按客户端 IP 计数
#[derive(Clone)]
pub struct RateLimiter {
    counter: Arc<dyn HitCounter>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: &Config) -> Self {
        Self::with_counter(Arc::new(RedisHitCounter::new(redis)), config)
    }

    pub fn with_counter(counter: Arc<dyn HitCounter>, config: &Config) -> Self {
        Self {
            counter,
            window: config.rate_limit_window(),
            max_requests: config.rate_limit_requests,
        }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        let ip = client_ip(req.headers(), remote_ip.as_deref());
        let key = format!("{}{}", KEY_PREFIX, ip);

        let count = self.counter.hit(&key, self.window).await.map_err(|e| {
            tracing::error!(error = %e, "Rate limiter failed to reach Redis");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        if count > i64::from(self.max_requests) {
            tracing::warn!(%ip, count, "Rate limit exceeded");
            return Ok(self.rejection());
        }

        Ok(next.run(req).await)
    }

    fn rejection(&self) -> Response {
        (
            StatusCode::TOO_MANY_REQUESTS,
            error_to_api_response::<()>(
                error_codes::RATE_LIMIT,
                format!("请求过于频繁，请在{}秒后重试", self.window.as_secs()),
            ),
        )
            .into_response()
    }
}

// 优先使用代理头，其次使用连接地址
fn client_ip(headers: &HeaderMap, remote_ip: Option<&str>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip)
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::{Router, body::to_bytes, http::HeaderValue, routing::get};
    use tower::ServiceExt;

    // 不过期的内存计数
    #[derive(Default)]
    struct MemoryHitCounter {
        hits: Mutex<HashMap<String, i64>>,
    }

    #[async_trait]
    impl HitCounter for MemoryHitCounter {
        async fn hit(&self, key: &str, _window: Duration) -> redis::RedisResult<i64> {
            let mut hits = self.hits.lock().unwrap();
            let count = hits.entry(key.to_string()).or_insert(0);
            *count += 1;
            Ok(*count)
        }
    }

    fn limited_router(max_requests: u32) -> Router {
        let mut config = Config::default();
        config.rate_limit_requests = max_requests;
        config.rate_limit_window_secs = 30;
        let limiter = RateLimiter::with_counter(Arc::new(MemoryHitCounter::default()), &config);

        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(Arc::new(limiter), rate_limit))
    }

    async fn hit_from(router: &Router, ip: &'static str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .uri("/")
            .header("x-real-ip", ip)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn request_over_the_limit_is_rejected_per_ip() {
        let router = limited_router(2);

        assert_eq!(hit_from(&router, "198.51.100.4").await.0, StatusCode::OK);
        assert_eq!(hit_from(&router, "198.51.100.4").await.0, StatusCode::OK);

        let (status, body) = hit_from(&router, "198.51.100.4").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], error_codes::RATE_LIMIT);
        assert!(body["msg"].as_str().unwrap().contains("30"));

        // 其他 IP 不受影响
        assert_eq!(hit_from(&router, "203.0.113.7").await.0, StatusCode::OK);
    }

    #[test]
    fn prefers_proxy_headers_over_socket_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some("10.0.0.1")), "10.0.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7, 10.0.0.2"));
        assert_eq!(client_ip(&headers, Some("10.0.0.1")), "203.0.113.7");

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers, Some("10.0.0.1")), "198.51.100.4");
    }
}
