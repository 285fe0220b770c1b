use std::sync::Arc;

use valor_openai::provider::ChatProvider;
use valor_storage::store::SessionStore;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub provider: Arc<dyn ChatProvider>,
    /// System instruction for one-shot requests that bypass the session store.
    pub system_prompt: Arc<str>,
    /// Rendered chat page served at `/`.
    pub page: Arc<str>,
}
