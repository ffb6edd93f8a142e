use axum::{
    extract::{
        Extension, Json, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    AppState,
    guest::{AdminContext, CreateGuestRequest, GuestError, UpdateGuestRequest},
    utils::success_to_api_response,
};

use super::model::{DeleteGuestResponse, ListGuestsResponse, UpdateGuestResponse};

// 请求体无法解析时按校验错误返回
fn bad_body(e: JsonRejection) -> Response {
    tracing::debug!(error = %e, "Rejected request body");
    GuestError::validation("body", format!("请求体格式无效: {}", e.body_text())).into_response()
}

// 非法的ID不可能存在，与不存在同样处理
fn parse_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, Response> {
    id.map(|Path(id)| id)
        .map_err(|_| GuestError::NotFound.into_response())
}

#[axum::debug_handler]
pub async fn create_guest(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    payload: Result<Json<CreateGuestRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_body(e),
    };

    match state.guests.create_guest(&admin, req).await {
        Ok(resp) => (StatusCode::CREATED, success_to_api_response(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[axum::debug_handler]
pub async fn list_guests(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Response {
    match state.guests.list_guests(&admin).await {
        Ok(users) => (StatusCode::OK, success_to_api_response(ListGuestsResponse { users })).into_response(),
        Err(e) => e.into_response(),
    }
}

#[axum::debug_handler]
pub async fn update_guest(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateGuestRequest>, JsonRejection>,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_body(e),
    };

    match state.guests.update_guest(&admin, id, req).await {
        Ok(user) => (StatusCode::OK, success_to_api_response(UpdateGuestResponse { user })).into_response(),
        Err(e) => e.into_response(),
    }
}

#[axum::debug_handler]
pub async fn delete_guest(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.guests.delete_guest(&admin, id).await {
        Ok(()) => (StatusCode::OK, success_to_api_response(DeleteGuestResponse { id })).into_response(),
        Err(e) => e.into_response(),
    }
}

#[axum::debug_handler]
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.guests.toggle_status(&admin, id).await {
        Ok(resp) => (StatusCode::OK, success_to_api_response(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}
