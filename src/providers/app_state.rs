//! Application state provider for dependency injection.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{app_context::AppState, config::Settings, providers::traits::AsyncProvider};

/// Opens the hardware and builds the shared [`AppState`].
pub struct AppStateProvider {
    settings: Settings,
}

impl AppStateProvider {
    pub const fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AsyncProvider<Arc<AppState>> for AppStateProvider {
    async fn provide(&self) -> Result<Arc<AppState>> {
        let settings = self.settings.clone();
        let state = tokio::task::spawn_blocking(move || AppState::open_hardware(settings)).await??;
        Ok(Arc::new(state))
    }
}
