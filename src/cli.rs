//! CLI definitions for GestureCall.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// GestureCall CLI.
#[derive(Parser)]
#[command(name = "gesturecall")]
#[command(about = "Hand gestures that click and navigate a browser tab")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Drive the tabs of a running browser (default)
    Run {
        /// DevTools endpoint, overrides `browser.debug_url`
        #[arg(long)]
        debug_url: Option<String>,

        /// Only attach to tabs whose URL contains this string
        #[arg(long)]
        tab_filter: Option<String>,
    },

    /// Serve the standalone gesture page
    Serve {
        /// Server host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the gestures found in a recorded detection result
    Classify {
        /// JSON file holding a detection result or a list of hands
        fixture: PathBuf,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Settings management commands
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Show the stored settings
    Show {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Update one or more settings
    Set {
        /// Page to open on an open-hand gesture
        #[arg(long)]
        target_url: Option<String>,

        /// Element clicked on open hand (on target) and index finger
        #[arg(long)]
        click_selector: Option<String>,

        /// Element clicked on thumb up
        #[arg(long)]
        stop_selector: Option<String>,

        /// Show the privacy cover over the camera preview
        #[arg(long)]
        cover_visible: Option<bool>,
    },

    /// Remove settings by key (targetUrl, clickSelector, ...)
    Unset {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}
