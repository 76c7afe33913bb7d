//! Shared application state for the storage handlers.

use certis_db::FileStore;
use certis_services::StorageService;
use std::sync::Arc;

pub struct AppState {
    pub storage: Arc<StorageService>,
    pub files: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(storage: Arc<StorageService>, files: Arc<dyn FileStore>) -> Self {
        AppState { storage, files }
    }
}
