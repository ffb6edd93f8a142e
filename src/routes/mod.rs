use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{patch, post, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors},
};

pub mod guest;

/// 组装业务路由，所有访客接口都需要管理员令牌
pub fn router(state: AppState) -> Router {
    let guest_routes = Router::new()
        .route(
            "/guest-users",
            post(guest::create_guest).get(guest::list_guests),
        )
        .route(
            "/guest-users/{id}",
            put(guest::update_guest).delete(guest::delete_guest),
        )
        .route("/guest-users/{id}/toggle-status", patch(guest::toggle_status))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest(&state.config.api_base_uri, guest_routes)
        .layer(from_fn(log_errors))
        .with_state(state)
}
