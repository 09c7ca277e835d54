use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    app_context::AppState, fan_controller::FanController, providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Runs the [`FanController`] loop.
pub struct FanControlServiceProvider {
    state: Arc<AppState>,
}

impl FanControlServiceProvider {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ServiceProvider for FanControlServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let controller = FanController::new(
            &self.state.settings,
            self.state.sampler.clone(),
            self.state.bus.clone(),
        );

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| {
                controller.run(cancel_token)
            })
            .await
    }

    fn name(&self) -> &'static str {
        "FanControlService"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_critical(&self) -> bool {
        true
    }
}
