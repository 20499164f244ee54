pub mod aggregate;
pub mod analysis;
pub mod app;
pub mod entry;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod period;
pub mod ranking;
pub mod report;
pub mod state;
pub mod store;
pub mod targets;
pub mod ui;

pub use app::router;
pub use state::AppState;
pub use store::{load_data, resolve_data_path};
