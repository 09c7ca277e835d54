//! System coordinator for managing service lifecycle.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use tokio::signal::unix::{SignalKind, signal};

use crate::{
    app_context::AppState,
    config::Settings,
    providers::{
        AppStateProvider, AsyncProvider, FanControlServiceProvider, PowerButtonServiceProvider,
        ServiceProvider,
    },
    task_manager::TaskManager,
};

/// Starts the fan and button services and supervises them until shutdown.
///
/// Shutdown is triggered by SIGINT, SIGTERM or any service task exiting.
/// Either way both loops are cancelled and awaited, and the first task error
/// is returned.
pub struct SystemCoordinator {
    task_manager: TaskManager,
    shared_state: Option<Arc<AppState>>,
    service_providers: Vec<Box<dyn ServiceProvider>>,
}

impl Default for SystemCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCoordinator {
    pub fn new() -> Self {
        Self {
            task_manager: TaskManager::new(),
            shared_state: None,
            service_providers: Vec::new(),
        }
    }

    /// Opens the hardware and registers the services.
    pub async fn initialize(&mut self, settings: Settings) -> Result<()> {
        info!("Initializing SystemCoordinator...");

        let state = AppStateProvider::new(settings)
            .provide()
            .await
            .context("Failed to initialize application state")?;

        self.initialize_with_state(state)
    }

    /// Registers the services on already-built state.
    pub fn initialize_with_state(&mut self, state: Arc<AppState>) -> Result<()> {
        let mut providers: Vec<Box<dyn ServiceProvider>> = vec![
            Box::new(FanControlServiceProvider::new(state.clone())),
            Box::new(PowerButtonServiceProvider::new(state.clone())),
        ];
        providers.sort_by_key(|b| std::cmp::Reverse(b.priority()));

        self.service_providers = providers;
        self.shared_state = Some(state);

        info!(
            "Registered {} service providers in priority order",
            self.service_providers.len()
        );
        Ok(())
    }

    /// Starts all registered services in priority order.
    pub async fn start_all_services(&mut self) -> Result<()> {
        if self.shared_state.is_none() {
            return Err(anyhow!("System not properly initialized"));
        }

        for provider in &self.service_providers {
            match provider.start(&mut self.task_manager).await {
                Ok(()) => {
                    info!(
                        "Service '{}' started (priority: {}, critical: {})",
                        provider.name(),
                        provider.priority(),
                        provider.is_critical()
                    );
                }
                Err(e) if provider.is_critical() => {
                    // Stop whatever already runs before giving up.
                    if let Err(stop_err) = self.task_manager.shutdown_all().await {
                        warn!("Error while stopping started services: {stop_err:#}");
                    }
                    return Err(e).with_context(|| {
                        format!("Critical service '{}' failed to start", provider.name())
                    });
                }
                Err(e) => {
                    warn!("Non-critical service '{}' failed to start: {e:#}", provider.name());
                }
            }
        }

        info!("All critical services started successfully");
        Ok(())
    }

    /// Waits for a termination signal or a service exit, then shuts down.
    pub async fn run_main_loop(&mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;

        info!("Running until SIGINT or SIGTERM");
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for SIGINT")?;
                info!("Received SIGINT, initiating graceful shutdown...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            () = self.task_manager.stopped() => {
                warn!("A service stopped unexpectedly, shutting down");
            }
        }

        self.shutdown().await
    }

    /// Cancels every service and waits for it to finish.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.task_manager
            .shutdown_all()
            .await
            .context("Services did not stop cleanly")?;
        info!("Shutdown complete");
        Ok(())
    }

    pub fn running_services(&self) -> Vec<&'static str> {
        self.service_providers.iter().map(|p| p.name()).collect()
    }
}
