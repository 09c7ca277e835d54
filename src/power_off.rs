//! Final handshake with the case when the system goes down.
//!
//! The case keeps the board powered until it sees the power-off sentinel, so
//! the sentinel is only sent when the machine is not coming back up.

use clap::ValueEnum;
use log::{error, info};

use crate::drivers::argon_one::{BusChannel, protocol::Command};

/// Kind of system shutdown in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PowerOffKind {
    #[default]
    Poweroff,
    Halt,
    Reboot,
    Kexec,
}

impl PowerOffKind {
    /// Whether the case should cut power once the host is down.
    pub fn cuts_power(self) -> bool {
        matches!(self, PowerOffKind::Poweroff | PowerOffKind::Halt)
    }
}

/// Stops the fan and, for a power-off or halt, sends the sentinel.
///
/// Failures are logged only: the host is already going down.
pub async fn signal_power_off(bus: &BusChannel, kind: PowerOffKind) {
    info!("Signalling {kind:?} to the case");

    if let Err(e) = bus.send(Command::FanSpeed(0)).await {
        error!("Could not stop the fan: {e:#}");
    }

    if kind.cuts_power() {
        if let Err(e) = bus.send(Command::PowerOff).await {
            error!("Could not send the power-off sentinel: {e:#}");
        }
    }
}
