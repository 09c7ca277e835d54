//! Application entry point and builder pattern implementation.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::{app_context::AppState, config::Settings, coordinator::SystemCoordinator};

/// Where the daemon's state comes from.
enum Source {
    /// Open the hardware from these settings.
    Settings(Settings),
    /// Use state that was already built.
    State(Arc<AppState>),
}

/// Runs the daemon from initialization to shutdown.
///
/// # Example
///
/// ```no_run
/// use argononed::{application::Application, config::ConfigManager};
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = ConfigManager::load("/etc/argononed.yml")?.settings()?;
/// Application::builder()
///     .with_settings(settings)
///     .build()?
///     .run()
///     .await
/// # }
/// ```
pub struct Application {
    pub coordinator: SystemCoordinator,
    source: Option<Source>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Initializes, starts both services and runs until shutdown.
    pub async fn run(&mut self) -> Result<()> {
        match self.source.take() {
            Some(Source::Settings(settings)) => self.coordinator.initialize(settings).await?,
            Some(Source::State(state)) => self.coordinator.initialize_with_state(state)?,
            None => return Err(anyhow!("Application has already been run")),
        }

        self.coordinator.start_all_services().await?;
        self.coordinator.run_main_loop().await
    }
}

pub struct ApplicationBuilder {
    source: Option<Source>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self { source: None }
    }

    /// Opens the board's hardware using `settings` at startup.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.source = Some(Source::Settings(settings));
        self
    }

    /// Runs on prepared state instead of real hardware.
    pub fn with_state(mut self, state: Arc<AppState>) -> Self {
        self.source = Some(Source::State(state));
        self
    }

    pub fn build(self) -> Result<Application> {
        let source = self
            .source
            .ok_or_else(|| anyhow!("Settings or application state are required"))?;

        Ok(Application {
            coordinator: SystemCoordinator::new(),
            source: Some(source),
        })
    }
}
