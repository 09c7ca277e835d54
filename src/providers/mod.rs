//! Dependency injection providers for service management.

pub mod app_state;
pub mod button;
pub mod fan;
pub mod traits;

// Re-export core types for convenience
pub use app_state::AppStateProvider;
pub use button::PowerButtonServiceProvider;
pub use fan::FanControlServiceProvider;
pub use traits::{AsyncProvider, ServiceProvider};
