//! Shared application state — the single `Coordinator` built once at
//! startup and handed to every request via axum's `State` extractor.
//! Grounded on `sem_os_server::router`'s `Extension<Arc<dyn CoreService>>`
//! state-sharing pattern; `State` is used here instead of `Extension`
//! since there is exactly one shared value and no per-request extension
//! to compose it with.

use std::sync::Arc;

use dedupe_core::Coordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}
