//! Command-line surface: argument parsing and table rendering for the
//! `rbzk` binary. Not part of the protocol core — a thin collaborator
//! over [`crate::zk`].

pub mod output;

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::zk::client::Options;

/// Client and CLI for ZKTeco attendance-terminal devices.
#[derive(Debug, Parser)]
#[command(name = "rbzk", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Global connection flags; each overrides the persisted config for this
/// invocation only, without writing it back.
#[derive(Debug, Parser, Default)]
pub struct GlobalOverrides {
    #[arg(long, global = true)]
    pub ip: Option<String>,
    #[arg(long, global = true)]
    pub port: Option<u16>,
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
    #[arg(long, global = true)]
    pub password: Option<u32>,
    #[arg(long, global = true)]
    pub force_udp: bool,
    #[arg(long, global = true)]
    pub no_ping: bool,
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

impl GlobalOverrides {
    /// Layer these flags on top of a loaded config to produce connection
    /// options for this invocation.
    pub fn apply(&self, config: &CliConfig) -> Options {
        Options {
            ip: self.ip.clone().unwrap_or_else(|| config.ip.clone()),
            port: self.port.unwrap_or(config.port),
            timeout: Duration::from_secs(self.timeout.unwrap_or(config.timeout)),
            password: self.password.unwrap_or(config.password),
            force_udp: self.force_udp || config.force_udp,
            omit_ping: self.no_ping || config.no_ping,
            verbose: self.verbose || config.verbose,
            encoding: config.encoding.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print device firmware/serial/capacity information.
    Info,
    /// Ask the device to reload its internal caches.
    Refresh,
    /// List enrolled users as a table.
    Users,
    /// List attendance punches, optionally filtered by date range.
    Logs {
        #[arg(long)]
        today: bool,
        #[arg(long)]
        yesterday: bool,
        #[arg(long)]
        week: bool,
        #[arg(long)]
        month: bool,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List every attendance punch on the device, unfiltered.
    LogsAll,
    /// Clear all attendance punches from the device.
    ClearLogs,
    /// Unlock the door.
    Unlock {
        #[arg(long, default_value_t = 30)]
        time: u32,
    },
    /// Print whether the door is open or closed.
    DoorState,
    /// Write a line of text to the device LCD.
    WriteLcd { line: u16, text: String },
    /// Clear the device LCD.
    ClearLcd,
    /// Enroll or update a user.
    AddUser {
        #[arg(long, default_value_t = 0)]
        uid: u16,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        privilege: u8,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long, default_value = "")]
        group_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value_t = 0)]
        card: u32,
    },
    /// Delete a user by device-assigned uid.
    DeleteUser {
        #[arg(long)]
        uid: u16,
    },
    /// List every enrolled fingerprint template.
    GetTemplates,
    /// Fetch one fingerprint template.
    GetUserTemplate {
        #[arg(long)]
        uid: u16,
        #[arg(long)]
        finger_id: u8,
    },
    /// Play a device voice prompt by index.
    TestVoice {
        #[arg(long, default_value_t = 0)]
        index: u32,
    },
    /// Re-enable the "accepting input" flag.
    EnableDevice,
    /// Disable the "accepting input" flag.
    DisableDevice,
    /// Restart the device.
    Restart,
    /// Power off the device.
    Poweroff,
    /// Print the resolved config path and contents.
    Config,
    /// Set one config key and persist it.
    ConfigSet { key: String, value: String },
    /// Restore default config values and persist them.
    ConfigReset,
}
