// 访客账号核心逻辑：用户名生成、过期时间计算、状态判断

pub mod error;
pub mod expiration;
pub mod memory;
pub mod model;
pub mod ports;
pub mod service;
pub mod status;
pub mod username;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{GuestError, NotifyError, StoreError};
pub use expiration::{ExpirationDuration, ExpirationInput, apply_duration, validate_duration};
pub use memory::InMemoryGuestStore;
pub use model::{
    AdminContext, CreateGuestRequest, CreateGuestResponse, GuestPatch, GuestUser, GuestView,
    NewGuestUser, ToggleStatusResponse, UpdateGuestRequest,
};
pub use ports::{Clock, CredentialNotifier, GuestStore, SystemClock};
pub use service::{GuestService, resolve_patch};
pub use status::GuestStatus;
pub use username::{derive_username, is_valid_email};
