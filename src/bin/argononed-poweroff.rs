//! Shutdown hook: tells the case the host is going down.
//!
//! Always exits successfully so it never holds up the shutdown sequence.

use argononed::{
    cli::PowerOffCli, drivers::argon_one::BusChannel, logging::init_log,
    power_off::signal_power_off,
};
use clap::Parser;
use log::{LevelFilter, error};

fn main() {
    let cli = PowerOffCli::parse();

    if let Err(e) = init_log("argononed-poweroff", LevelFilter::Info) {
        eprintln!("Syslog unavailable: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {e}");
            return;
        }
    };

    runtime.block_on(async {
        match BusChannel::open_for_board() {
            Ok(bus) => signal_power_off(&bus, cli.kind).await,
            Err(e) => error!("Cannot reach the case, skipping power-off signal: {e:#}"),
        }
    });
}
