//! Tab control for `gesturecall run`.
//!
//! One command per line on stdin, routed to the page contexts through the
//! tab registry:
//!
//! ```text
//!   tabs                   list attached tabs
//!   start <tab>            start the camera in a tab
//!   stop <tab>             stop the camera in a tab
//!   cover <tab> [on|off]   show, hide or toggle the privacy cover
//! ```
//!
//! `<tab>` is a tab id or any unique prefix of one.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use gesturecall_protocols::{RelayError, RelayMessage, RelayResponse, TabId, TabMessenger};

#[derive(Debug, Error)]
pub(crate) enum ControlError {
    #[error("{0}")]
    Usage(String),

    #[error("No tab matches '{0}'")]
    UnknownTab(String),

    #[error("'{prefix}' matches several tabs: {}", .matches.join(", "))]
    AmbiguousTab { prefix: String, matches: Vec<TabId> },

    #[error(transparent)]
    Relay(#[from] RelayError),
}

#[derive(Parser, Debug)]
#[command(name = "control", no_binary_name = true, disable_version_flag = true)]
struct ControlLine {
    #[command(subcommand)]
    command: TabCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum TabCommand {
    /// List attached tabs
    Tabs,

    /// Start the camera in a tab
    Start { tab: String },

    /// Stop the camera in a tab
    Stop { tab: String },

    /// Show, hide or toggle the privacy cover
    Cover {
        tab: String,

        #[arg(value_enum)]
        state: Option<CoverState>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoverState {
    On,
    Off,
}

impl TabCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub(crate) fn parse(line: &str) -> Result<Option<Self>, ControlError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }
        ControlLine::try_parse_from(words)
            .map(|parsed| Some(parsed.command))
            .map_err(|e| ControlError::Usage(e.render().to_string().trim_end().to_string()))
    }

    fn tab(&self) -> Option<&str> {
        match self {
            TabCommand::Tabs => None,
            TabCommand::Start { tab } | TabCommand::Stop { tab } | TabCommand::Cover { tab, .. } => Some(tab),
        }
    }

    fn message(&self) -> Option<RelayMessage> {
        match self {
            TabCommand::Tabs => None,
            TabCommand::Start { .. } => Some(RelayMessage::StartCamera),
            TabCommand::Stop { .. } => Some(RelayMessage::StopCamera),
            TabCommand::Cover { state, .. } => Some(RelayMessage::ToggleCover {
                visible: state.map(|s| s == CoverState::On),
            }),
        }
    }
}

/// Resolve a tab id or unique id prefix against the registered tabs.
pub(crate) async fn resolve_tab(tabs: &dyn TabMessenger, wanted: &str) -> Result<TabId, ControlError> {
    let ids: Vec<TabId> = tabs.query_tabs().await.into_iter().map(|t| t.id).collect();
    if ids.iter().any(|id| id == wanted) {
        return Ok(wanted.to_string());
    }
    let mut matches: Vec<TabId> = ids.into_iter().filter(|id| id.starts_with(wanted)).collect();
    match matches.len() {
        0 => Err(ControlError::UnknownTab(wanted.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(ControlError::AmbiguousTab {
            prefix: wanted.to_string(),
            matches,
        }),
    }
}

/// Run one command and render its outcome for the terminal.
pub(crate) async fn execute(tabs: &dyn TabMessenger, command: &TabCommand) -> Result<String, ControlError> {
    let (Some(wanted), Some(message)) = (command.tab(), command.message()) else {
        let listing: Vec<String> = tabs
            .query_tabs()
            .await
            .into_iter()
            .map(|t| format!("{:<34} {}", t.id, t.url.unwrap_or_default()))
            .collect();
        if listing.is_empty() {
            return Ok("No tabs attached".to_string());
        }
        return Ok(listing.join("\n"));
    };

    let tab = resolve_tab(tabs, wanted).await?;
    debug!(tab = %tab, action = message.action(), "Routing control command");
    let response = tabs.send_to_tab(&tab, message).await?;
    Ok(render(&tab, &response))
}

fn render(tab: &str, response: &RelayResponse) -> String {
    if !response.success {
        let error = response.error.as_deref().unwrap_or("failed");
        return format!("{}: {}", tab, error);
    }
    match &response.data {
        Some(Value::Object(fields)) if fields.contains_key("coverVisible") => {
            let visible = fields.get("coverVisible").and_then(Value::as_bool).unwrap_or(false);
            format!("{}: cover {}", tab, if visible { "on" } else { "off" })
        }
        Some(Value::String(text)) => format!("{}: {}", tab, text),
        _ => format!("{}: ok", tab),
    }
}

/// Forward stdin lines until EOF.
pub(crate) fn spawn_stdin_reader(capacity: usize) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(capacity);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Control input closed");
                    break;
                }
                Err(e) => {
                    debug!("Control input failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
