use serde::Serialize;
use uuid::Uuid;

use crate::guest::GuestView;

#[derive(Debug, Serialize)]
pub struct ListGuestsResponse {
    pub users: Vec<GuestView>,
}

#[derive(Debug, Serialize)]
pub struct UpdateGuestResponse {
    pub user: GuestView,
}

#[derive(Debug, Serialize)]
pub struct DeleteGuestResponse {
    pub id: Uuid,
}
