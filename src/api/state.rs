use std::sync::Arc;

use crate::query::QueryEngine;
use crate::storage::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub queries: QueryEngine,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            queries: QueryEngine::new(store.clone()),
            store,
        }
    }
}
