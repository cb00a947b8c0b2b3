// ABOUTME: Shared application state handed to every request handler

use std::sync::Arc;

use tokenvault_auth::AuthorizationCoordinator;
use tokenvault_storage::CredentialStore;

#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub coordinator: Arc<AuthorizationCoordinator>,
}

impl AppState {
    pub fn new(credentials: CredentialStore, coordinator: AuthorizationCoordinator) -> Self {
        Self {
            credentials,
            coordinator: Arc::new(coordinator),
        }
    }
}
