//! CLI argument definitions for Lookout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::dispatch::ProtocolPolicy;

/// Lookout - a terminal live view for a paused Python debuggee.
///
/// Connects to the debug bridge over a WebSocket and mirrors its threads,
/// call stack, variables and object graph.
#[derive(Parser, Debug)]
#[command(name = "lookout")]
#[command(author, version, about = "Terminal live view for a paused Python debuggee", long_about = None)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("LOOKOUT_GIT_COMMIT"),
    " ",
    env!("LOOKOUT_BUILD_TIMESTAMP"),
    ")"
))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Debug bridge host
    #[arg(long, global = true, env = "LOOKOUT_HOST")]
    pub host: Option<String>,

    /// Debug bridge port
    #[arg(long, global = true, env = "LOOKOUT_PORT")]
    pub port: Option<u16>,

    /// Connect with wss:// instead of ws://
    #[arg(long, global = true)]
    pub secure: bool,

    /// Outbound wire format
    #[arg(long, value_enum, global = true)]
    pub protocol: Option<ProtocolPolicy>,

    /// Config file to read instead of ~/.config/lookout/config.kdl
    #[arg(long = "config", global = true, env = "LOOKOUT_CONFIG")]
    pub config_path: Option<PathBuf>,

    /// Log file for the terminal UI
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Flags that take precedence over the config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            secure: self.secure,
            protocol: self.protocol,
            log_file: self.log_file.clone(),
            config_path: self.config_path.clone(),
        }
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive live view (default)
    Tui,

    /// Print every snapshot pushed by the bridge, one per line
    ///
    /// Connects, requests the baseline, and prints each applied snapshot as
    /// a structured envelope. Reconnects like the live view does.
    Watch {
        /// Exit after this many snapshots
        #[arg(long, short = 'n')]
        count: Option<u64>,
    },

    /// Send one action to the bridge and exit
    Send {
        #[command(subcommand)]
        action: SendCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Actions accepted by `lookout send`
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SendCommands {
    /// Resume execution
    Resume,
    /// Pause execution
    Pause,
    /// Step over the current line
    StepOver,
    /// Step into the call on the current line
    StepInto,
    /// Step out of the current frame
    StepOut,
    /// Select a thread by name
    ThreadSelected {
        /// Thread name, e.g. MainThread
        name: String,
    },
    /// Send a line to the debuggee's stdin
    ConsoleInput {
        /// Text to send
        text: String,
    },
    /// Request a resource snapshot
    Get {
        /// threads, callstack, variables, object_cards, class_diagram or console
        resource: String,
    },
    /// Open the external step visualizer
    Navigate,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,

    /// Print the config file location
    Path,
}
