use std::fs::File;

use anyhow::{Context, Result, anyhow};
use argononed::{
    application::Application,
    cli::{Cli, Commands},
    config::{self, ConfigManager},
    logging::init_log,
};
use clap::Parser;
use daemonize::Daemonize;
use log::{LevelFilter, info};

const DAEMON_OUTPUT: &str = "/var/tmp/argononed.log";

fn into_daemon() -> Result<()> {
    File::create(DAEMON_OUTPUT)
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::WriteConfig { output } => config::write_default(&output),
        Commands::Run {
            config,
            daemonize,
            verbose,
        } => {
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            if let Err(e) = init_log("argononed", level) {
                eprintln!("Syslog unavailable, continuing without logging: {e}");
            }

            // Fork before the runtime starts its worker threads.
            if daemonize {
                into_daemon()?;
            }

            let settings = ConfigManager::load(&config)?.settings()?;
            info!("Starting argononed {}", env!("CARGO_PKG_VERSION"));

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?
                .block_on(async {
                    Application::builder()
                        .with_settings(settings)
                        .build()?
                        .run()
                        .await
                })
        }
    }
}
