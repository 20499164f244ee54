use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard_page))
        .route("/entry", get(handlers::entry_page))
        .route("/history", get(handlers::history_page))
        .route("/report", get(handlers::report_page))
        .route("/api/definitions", get(handlers::get_definitions))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/targets", get(handlers::get_targets))
        .route("/api/entries", post(handlers::submit_entry))
        .route("/api/entries/recent", get(handlers::get_recent_entries))
        .route(
            "/api/entries/:id",
            put(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/history", get(handlers::get_history))
        .route("/api/history/options", get(handlers::get_history_options))
        .route("/api/report", get(handlers::get_report))
        .route("/api/report.csv", get(handlers::get_report_csv))
        .route("/api/analysis", post(handlers::run_analysis))
        .with_state(state)
}
