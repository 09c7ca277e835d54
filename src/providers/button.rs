use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::{
    app_context::AppState,
    power_button::{ButtonMonitor, watch_button},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Watches the power button and classifies each press.
pub struct PowerButtonServiceProvider {
    state: Arc<AppState>,
}

impl PowerButtonServiceProvider {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ServiceProvider for PowerButtonServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let edges = self
            .state
            .take_button()
            .await
            .ok_or_else(|| anyhow!("Power button is already being watched"))?;
        let monitor = ButtonMonitor::new(self.state.settings.timing, self.state.power.clone());

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| async move {
                watch_button(edges, &monitor, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "PowerButtonService"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn is_critical(&self) -> bool {
        true
    }
}
