pub mod aggregate;
pub mod app;
pub mod auth;
pub mod chart;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod reference;
pub mod state;
pub mod storage;
pub mod table;
pub mod ui;
pub mod views;

pub use app::router;
pub use config::Config;
pub use state::AppState;
