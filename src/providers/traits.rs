use anyhow::Result;
use async_trait::async_trait;

use crate::task_manager::TaskManager;

/// Base trait for providers that can create components asynchronously.
///
/// # Example
///
/// ```no_run
/// use argononed::providers::traits::AsyncProvider;
///
/// struct BannerProvider;
///
/// #[async_trait::async_trait]
/// impl AsyncProvider<String> for BannerProvider {
///     async fn provide(&self) -> anyhow::Result<String> {
///         Ok("argononed".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncProvider<T> {
    async fn provide(&self) -> Result<T>;
}

/// Trait for services that can be started through TaskManager.
///
/// Critical services must start for the daemon to run; the others may fail
/// with a warning.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Starts the service in TaskManager.
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()>;

    /// Returns service name for logging and management.
    fn name(&self) -> &'static str;

    /// Returns startup priority (higher numbers start first).
    fn priority(&self) -> i32 {
        0
    }

    /// Indicates if service is critical for system operation.
    fn is_critical(&self) -> bool {
        false
    }
}
