use config::Config;
use guest::GuestService;

pub mod config;
pub mod database;
pub mod error;
pub mod guest;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub guests: GuestService,
}
