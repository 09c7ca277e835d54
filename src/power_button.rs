//! Power button monitoring.
//!
//! Press/release edges are paired into hold durations, and each hold duration
//! is classified against the configured reboot and shutdown windows.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use log::{debug, error, info};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::PowerTimingRanges;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Pressed,
    Released,
}

/// A debounced button transition and when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub at: Instant,
}

impl Edge {
    pub fn new(kind: EdgeKind, at: Instant) -> Self {
        Self { kind, at }
    }
}

/// Debounced button edges in arrival order.
pub type EdgeStream = BoxStream<'static, Edge>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Reboot,
    Shutdown,
}

/// Maps a hold duration to an action. Window bounds are exclusive.
pub fn classify(held: Duration, timing: &PowerTimingRanges) -> Option<PowerAction> {
    if timing.reboot.contains(held) {
        Some(PowerAction::Reboot)
    } else if timing.shutdown.contains(held) {
        Some(PowerAction::Shutdown)
    } else {
        None
    }
}

/// Pairs press and release edges.
#[derive(Debug, Default)]
pub struct PressTracker {
    pressed_at: Option<Instant>,
}

impl PressTracker {
    /// Returns the hold duration when `edge` completes a press.
    pub fn on_edge(&mut self, edge: Edge) -> Option<Duration> {
        match edge.kind {
            EdgeKind::Pressed => {
                self.pressed_at = Some(edge.at);
                None
            }
            EdgeKind::Released => {
                let Some(start) = self.pressed_at.take() else {
                    debug!("Release without a matching press, ignoring");
                    return None;
                };
                Some(edge.at.saturating_duration_since(start))
            }
        }
    }
}

/// Receives completed button presses.
#[async_trait]
pub trait ButtonListener: Send + Sync {
    /// Called once per release with the time the button was held.
    async fn on_release(&self, held: Duration) -> Option<PowerAction>;
}

/// Operating system power actions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PowerControl: Send + Sync {
    async fn reboot(&self) -> Result<()>;
    async fn shutdown(&self) -> Result<()>;
}

/// Runs the system `reboot` and `shutdown` commands.
#[derive(Debug, Default)]
pub struct SystemPower;

impl SystemPower {
    async fn run(program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program).args(args).status().await?;
        if !status.success() {
            bail!("{program} exited with {status}");
        }
        Ok(())
    }
}

#[async_trait]
impl PowerControl for SystemPower {
    async fn reboot(&self) -> Result<()> {
        Self::run("reboot", &[]).await
    }

    async fn shutdown(&self) -> Result<()> {
        Self::run("shutdown", &["--poweroff", "now"]).await
    }
}

/// Classifies button holds and triggers the matching power action.
pub struct ButtonMonitor {
    timing: PowerTimingRanges,
    power: Arc<dyn PowerControl>,
}

impl ButtonMonitor {
    pub fn new(timing: PowerTimingRanges, power: Arc<dyn PowerControl>) -> Self {
        Self { timing, power }
    }
}

#[async_trait]
impl ButtonListener for ButtonMonitor {
    async fn on_release(&self, held: Duration) -> Option<PowerAction> {
        let action = classify(held, &self.timing);

        let result = match action {
            Some(PowerAction::Reboot) => {
                info!("Power button held for {held:.2?}, rebooting");
                self.power.reboot().await
            }
            Some(PowerAction::Shutdown) => {
                info!("Power button held for {held:.2?}, shutting down");
                self.power.shutdown().await
            }
            None => {
                debug!("Power button held for {held:.2?}, no action");
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Power action {action:?} failed: {e:#}");
        }
        action
    }
}

/// Feeds button edges to `listener` until `cancel` fires.
///
/// The edge stream ending is an error: the input source is gone.
pub async fn watch_button(
    mut edges: EdgeStream,
    listener: &dyn ButtonListener,
    cancel: CancellationToken,
) -> Result<()> {
    let mut tracker = PressTracker::default();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("Power button monitor cancelled");
                return Ok(());
            }
            edge = edges.next() => {
                let Some(edge) = edge else {
                    bail!("Power button edge stream closed");
                };
                if let Some(held) = tracker.on_edge(edge) {
                    listener.on_release(held).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Settings};
    use anyhow::anyhow;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn default_timing() -> PowerTimingRanges {
        Settings::try_from(&Config::default()).unwrap().timing
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn classification_with_default_ranges() {
        let timing = default_timing();
        assert_eq!(classify(secs(2.5), &timing), Some(PowerAction::Shutdown));
        assert_eq!(classify(secs(1.5), &timing), Some(PowerAction::Reboot));
        assert_eq!(classify(secs(0.5), &timing), None);
        assert_eq!(classify(secs(2.0), &timing), None);
    }

    #[test]
    fn classification_bounds_are_exclusive() {
        let timing = default_timing();
        assert_eq!(classify(secs(1.0), &timing), None);
        assert_eq!(classify(secs(10.0), &timing), None);
        assert_eq!(classify(secs(12.0), &timing), None);
        assert_eq!(classify(secs(9.99), &timing), Some(PowerAction::Shutdown));
    }

    #[test]
    fn classification_follows_configured_ranges() {
        let mut config = Config::default();
        config.poweroff.reboot_range = [2.0, 3.0];
        config.poweroff.shutdown_range = [3.0, 5.0];
        let timing = Settings::try_from(&config).unwrap().timing;

        assert_eq!(classify(secs(1.5), &timing), None);
        assert_eq!(classify(secs(2.5), &timing), Some(PowerAction::Reboot));
        assert_eq!(classify(secs(4.0), &timing), Some(PowerAction::Shutdown));
    }

    #[test]
    fn tracker_pairs_press_and_release() {
        let t0 = Instant::now();
        let mut tracker = PressTracker::default();

        assert_eq!(tracker.on_edge(Edge::new(EdgeKind::Pressed, t0)), None);
        assert_eq!(
            tracker.on_edge(Edge::new(EdgeKind::Released, t0 + secs(2.5))),
            Some(secs(2.5))
        );
        assert_eq!(
            tracker.on_edge(Edge::new(EdgeKind::Released, t0 + secs(3.0))),
            None
        );
    }

    #[test]
    fn tracker_ignores_release_without_press() {
        let mut tracker = PressTracker::default();
        assert_eq!(
            tracker.on_edge(Edge::new(EdgeKind::Released, Instant::now())),
            None
        );
    }

    #[test]
    fn tracker_restarts_on_repeated_press() {
        let t0 = Instant::now();
        let mut tracker = PressTracker::default();

        tracker.on_edge(Edge::new(EdgeKind::Pressed, t0));
        tracker.on_edge(Edge::new(EdgeKind::Pressed, t0 + secs(3.0)));
        assert_eq!(
            tracker.on_edge(Edge::new(EdgeKind::Released, t0 + secs(4.5))),
            Some(secs(1.5))
        );
    }

    #[tokio::test]
    async fn monitor_reboots_for_short_hold() {
        let mut power = MockPowerControl::new();
        power.expect_reboot().times(1).returning(|| Ok(()));
        power.expect_shutdown().never();

        let monitor = ButtonMonitor::new(default_timing(), Arc::new(power));
        assert_eq!(monitor.on_release(secs(1.5)).await, Some(PowerAction::Reboot));
    }

    #[tokio::test]
    async fn monitor_shuts_down_for_long_hold() {
        let mut power = MockPowerControl::new();
        power.expect_reboot().never();
        power.expect_shutdown().times(1).returning(|| Ok(()));

        let monitor = ButtonMonitor::new(default_timing(), Arc::new(power));
        assert_eq!(
            monitor.on_release(secs(2.5)).await,
            Some(PowerAction::Shutdown)
        );
    }

    #[tokio::test]
    async fn monitor_ignores_ambiguous_hold() {
        let mut power = MockPowerControl::new();
        power.expect_reboot().never();
        power.expect_shutdown().never();

        let monitor = ButtonMonitor::new(default_timing(), Arc::new(power));
        assert_eq!(monitor.on_release(secs(0.5)).await, None);
        assert_eq!(monitor.on_release(secs(2.0)).await, None);
    }

    #[tokio::test]
    async fn failed_power_action_is_not_fatal() {
        let mut power = MockPowerControl::new();
        power
            .expect_reboot()
            .times(2)
            .returning(|| Err(anyhow!("reboot: not permitted")));

        let monitor = ButtonMonitor::new(default_timing(), Arc::new(power));
        assert_eq!(monitor.on_release(secs(1.5)).await, Some(PowerAction::Reboot));
        assert_eq!(monitor.on_release(secs(1.5)).await, Some(PowerAction::Reboot));
    }

    #[derive(Default)]
    struct RecordingListener {
        holds: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl ButtonListener for RecordingListener {
        async fn on_release(&self, held: Duration) -> Option<PowerAction> {
            self.holds.lock().unwrap().push(held);
            None
        }
    }

    #[tokio::test]
    async fn watch_button_reports_each_release() {
        let t0 = Instant::now();
        let edges = stream::iter(vec![
            Edge::new(EdgeKind::Released, t0),
            Edge::new(EdgeKind::Pressed, t0 + secs(1.0)),
            Edge::new(EdgeKind::Released, t0 + secs(2.5)),
            Edge::new(EdgeKind::Pressed, t0 + secs(5.0)),
            Edge::new(EdgeKind::Released, t0 + secs(8.0)),
        ])
        .chain(stream::pending())
        .boxed();

        let listener = Arc::new(RecordingListener::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let listener = listener.clone();
            let cancel = cancel.clone();
            async move { watch_button(edges, listener.as_ref(), cancel).await }
        });

        while listener.holds.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        assert!(task.await.unwrap().is_ok());
        assert_eq!(*listener.holds.lock().unwrap(), vec![secs(1.5), secs(3.0)]);
    }

    #[tokio::test]
    async fn watch_button_fails_when_edges_end() {
        let listener = RecordingListener::default();
        let result = watch_button(
            stream::empty().boxed(),
            &listener,
            CancellationToken::new(),
        )
        .await;
        assert!(result.is_err());
    }
}
