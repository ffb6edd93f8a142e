use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use guest_access::{
    AppState,
    config::Config,
    database::{self, PgGuestStore},
    guest::{GuestService, SystemClock},
    middleware::{RateLimiter, rate_limit},
    notify, routes,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 数据库连接池和迁移
    let pool = database::connect_pool(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    database::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 邮件通知
    let notifier = notify::from_config(&config)
        .await
        .expect("Failed to configure email notifier");

    let guests = GuestService::new(
        Arc::new(PgGuestStore::new(pool)),
        notifier,
        Arc::new(SystemClock),
        config.bcrypt_cost,
    );
    let state = AppState {
        config: config.clone(),
        guests,
    };

    // 限流器
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, &config));

    let router = routes::router(state)
        .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit));

    // 开发模式下允许跨域，方便本地前端调试
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
