use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    config::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH},
    power_off::PowerOffKind,
};

/// Fan and power button daemon for the Argon ONE case
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the built-in default configuration to a file
    #[command(name = "writeconfig")]
    WriteConfig {
        /// Destination file
        output: PathBuf,
    },

    /// Run the fan and power button daemon
    Run {
        /// YAML config file path
        #[arg(short = 'c', long = "config", env = CONFIG_ENV_VAR, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Detach from the terminal and run in the background
        #[arg(short = 'd', long = "daemonize", default_value = "false")]
        daemonize: bool,

        /// Log debug messages
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

/// Signals the Argon ONE case during system shutdown
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PowerOffCli {
    /// Shutdown in progress
    #[arg(value_enum, ignore_case = true, default_value_t = PowerOffKind::Poweroff)]
    pub kind: PowerOffKind,
}
