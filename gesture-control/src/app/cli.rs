//! Command-Line Interface

use crate::gesture::rules::Profile;
use crate::mode::Mode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gesture Control - drive scroll, volume and tab switching with hand poses
#[derive(Parser, Debug)]
#[command(name = "gesture-ctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mode controller; gesture control starts on a click burst or
    /// a remote "Gesture Mode ON"
    Run {
        /// JSON-lines landmark stream ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        landmarks: String,

        /// Log actions instead of injecting input
        #[arg(long)]
        dry_run: bool,

        /// Mode to start in (overrides mode.start_mode)
        #[arg(long, value_enum)]
        start_in: Option<Mode>,

        /// Gesture profile (overrides gesture.profile)
        #[arg(short, long, value_enum)]
        profile: Option<Profile>,

        /// Do not listen for pointer click bursts
        #[arg(long)]
        no_pointer: bool,

        /// Remote trigger address host:port (enables the remote trigger)
        #[arg(long)]
        remote: Option<String>,
    },

    /// Run the gesture machine over a recorded landmark stream and print the
    /// actions it emits
    Replay {
        /// JSON-lines landmark file ("-" for stdin)
        input: String,

        /// Gesture profile (overrides gesture.profile)
        #[arg(short, long, value_enum)]
        profile: Option<Profile>,

        /// Print one JSON object per action
        #[arg(long)]
        json: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "gesture.profile", "mode.click_threshold_ms")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Directory holding the config file
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".gesture_control"))
            .unwrap_or_else(|| PathBuf::from(".gesture_control"))
    }
}
