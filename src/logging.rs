//! Syslog-backed logger shared by both binaries.

use anyhow::{Result, anyhow};
use log::LevelFilter;
use syslog::{BasicLogger, Facility, Formatter3164};

/// Routes the `log` facade to the local syslog daemon.
pub fn init_log(process: &str, level: LevelFilter) -> Result<()> {
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: process.into(),
        pid: std::process::id(),
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(level))
            .map_err(|e| anyhow!("{e}"))
    })
}
