//! # argononed
//!
//! A Linux daemon for the Argon ONE Raspberry Pi case.
//!
//! ## Features
//!
//! - **Fan control**: temperature thresholds mapped to fan speeds, with
//!   speed decreases held back one interval
//! - **Power button**: hold durations classified into reboot and shutdown
//! - **Shutdown hook**: `argononed-poweroff` tells the case to cut power
//!   once the host has halted
//!
//! ## Architecture
//!
//! - [`SystemCoordinator`](coordinator::SystemCoordinator) starts the services
//!   and supervises them until a signal arrives or one of them stops
//! - [`AppState`](app_context::AppState) holds the settings, the shared
//!   [`BusChannel`](drivers::argon_one::BusChannel) and the button input
//! - [`TaskManager`](task_manager::TaskManager) runs each loop with its own
//!   cancellation token
//!
//! ## Example
//!
//! ```no_run
//! use argononed::{application::Application, config::ConfigManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ConfigManager::load("/etc/argononed.yml")?.settings()?;
//!     Application::builder()
//!         .with_settings(settings)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod app_context;
pub mod application;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod drivers;
pub mod fan_controller;
pub mod fan_curve;
pub mod logging;
pub mod power_button;
pub mod power_off;
pub mod providers;
pub mod sensors;
pub mod task_manager;
pub mod temperature_sensors;
