mod handler;
mod model;

pub use handler::{create_guest, delete_guest, list_guests, toggle_status, update_guest};
pub use model::{DeleteGuestResponse, ListGuestsResponse, UpdateGuestResponse};
