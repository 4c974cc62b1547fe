use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/export/chart/:chart", get(handlers::export_chart))
        .route("/export/table/:report", get(handlers::export_table))
        .route("/api/session", get(handlers::get_session))
        .route("/api/players", get(handlers::get_players))
        .route("/api/teams", get(handlers::get_teams))
        .with_state(state)
}
