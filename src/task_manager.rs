//! Task management for the daemon's long-running loops.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a task may take to stop once cancelled.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Manages async tasks with proper lifecycle and error handling.
///
/// Every task gets a child of the global cancellation token. The loops are
/// expected to run until cancelled, so a task finishing on its own (with or
/// without an error) cancels the global token and brings the others down.
pub struct TaskManager {
    tasks: HashMap<String, JoinHandle<Result<()>>>,
    pub global_token: CancellationToken,
}

impl TaskManager {
    /// Creates a new TaskManager.
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            global_token: CancellationToken::new(),
        }
    }

    /// Spawns and registers a task with the given name.
    pub async fn spawn_task<F, Fut>(&mut self, name: String, task_fn: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let task_token = self.global_token.child_token();
        let global_token = self.global_token.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            // Cancels everything on return and on panic.
            let _stop_all = global_token.clone().drop_guard();
            info!("Starting task: {}", task_name);
            let result = task_fn(task_token).await;
            match &result {
                Ok(()) => info!("Task '{}' completed successfully", task_name),
                Err(e) => error!("Task '{}' failed: {:#}", task_name, e),
            }
            if !global_token.is_cancelled() {
                warn!("Task '{}' exited on its own, stopping all tasks", task_name);
            }
            result
        });

        self.tasks.insert(name.clone(), handle);

        info!("Task '{}' spawned", name);
        Ok(())
    }

    /// Resolves once shutdown was requested or any task exited.
    pub async fn stopped(&self) {
        self.global_token.cancelled().await
    }

    /// Shuts down all registered tasks gracefully.
    ///
    /// Waits for all tasks to complete and collects any errors.
    /// Returns the first error encountered, if any.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping all {} tasks", self.tasks.len());

        self.global_token.cancel();

        let mut first_error = None;
        let mut handles: Vec<_> = self.tasks.drain().collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, handle) in handles {
            let outcome = match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(Ok(()))) => None,
                Ok(Ok(Err(e))) => Some(e.context(format!("Task '{name}' failed"))),
                Ok(Err(e)) => Some(anyhow::anyhow!("Task '{name}' panicked: {e}")),
                Err(_) => Some(anyhow::anyhow!("Task '{name}' shutdown timeout exceeded")),
            };

            if let Some(error) = outcome {
                warn!("{:#}", error);
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        if let Some(error) = first_error {
            Err(error).context("One or more tasks failed during shutdown")
        } else {
            info!("All tasks stopped");
            Ok(())
        }
    }

    /// Returns the count of active tasks.
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Checks if a task with the given name is currently running.
    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.get(name).is_some_and(|h| !h.is_finished())
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn cancelled_tasks_stop_cleanly() {
        let mut manager = TaskManager::new();
        for name in ["fan", "button"] {
            manager
                .spawn_task(name.to_string(), |token| async move {
                    token.cancelled().await;
                    Ok(())
                })
                .await
                .unwrap();
        }

        assert_eq!(manager.active_count(), 2);
        assert!(manager.is_running("fan"));
        assert_ok!(manager.shutdown_all().await);
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn failing_task_stops_the_others() {
        let mut manager = TaskManager::new();
        manager
            .spawn_task("steady".to_string(), |token| async move {
                token.cancelled().await;
                Ok(())
            })
            .await
            .unwrap();
        manager
            .spawn_task("broken".to_string(), |_token| async move {
                Err(anyhow!("pin unavailable"))
            })
            .await
            .unwrap();

        manager.stopped().await;
        let err = manager.shutdown_all().await.unwrap_err();

        assert!(format!("{err:#}").contains("pin unavailable"));
        assert!(format!("{err:#}").contains("broken"));
    }

    #[tokio::test]
    #[allow(unreachable_code)]
    async fn panicking_task_is_reported() {
        let mut manager = TaskManager::new();
        manager
            .spawn_task("panics".to_string(), |_token| async move {
                panic!("boom");
                Ok(())
            })
            .await
            .unwrap();

        manager.stopped().await;
        let err = manager.shutdown_all().await.unwrap_err();
        assert!(format!("{err:#}").contains("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_task_times_out() {
        let mut manager = TaskManager::new();
        manager
            .spawn_task("stuck".to_string(), |_token| async move {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await
            .unwrap();

        let err = manager.shutdown_all().await.unwrap_err();
        assert!(format!("{err:#}").contains("timeout"));
    }
}
