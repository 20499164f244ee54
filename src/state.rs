use crate::entry::EntryConfig;
use crate::models::StoreData;
use std::{env, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Shared application state. The store handle is constructed once at startup
/// and injected everywhere; no module talks to a global client.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<StoreData>>,
    pub entry_config: EntryConfig,
    pub http: reqwest::Client,
    pub analysis_url: Option<String>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: StoreData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            entry_config: EntryConfig::from_env(),
            http: reqwest::Client::new(),
            analysis_url: env::var("ANALYSIS_WEBHOOK_URL").ok(),
        }
    }
}
