//! Stdio transport to the tracker process.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use gesturecall_protocols::TrackerError;

use crate::wire::{TrackerReply, TrackerRequest};

struct Pipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// One request in flight at a time; replies are matched by order.
pub struct StdioTransport {
    child: Mutex<Option<Child>>,
    pipes: Mutex<Option<Pipes>>,
    timeout: Duration,
}

impl StdioTransport {
    pub fn spawn(command: &str, args: &[String], timeout: Duration) -> Result<Self, TrackerError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TrackerError::LaunchFailed(format!("{}: {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TrackerError::LaunchFailed("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrackerError::LaunchFailed("Failed to capture stdout".to_string()))?;

        debug!(command, pid = ?child.id(), "Tracker process started");
        Ok(Self {
            child: Mutex::new(Some(child)),
            pipes: Mutex::new(Some(Pipes {
                stdin,
                stdout: BufReader::new(stdout),
            })),
            timeout,
        })
    }

    pub async fn send(&self, request: &TrackerRequest) -> Result<TrackerReply, TrackerError> {
        let line = request.to_line()?;
        let mut guard = self.pipes.lock().await;
        let pipes = guard.as_mut().ok_or(TrackerError::Closed)?;

        let exchange = async {
            pipes.stdin.write_all(line.as_bytes()).await?;
            pipes.stdin.flush().await?;
            let mut reply = String::new();
            pipes.stdout.read_line(&mut reply).await?;
            Ok::<_, TrackerError>(reply)
        };

        let outcome = tokio::time::timeout(self.timeout, exchange).await;
        match outcome {
            Ok(Ok(reply)) => {
                let parsed = TrackerReply::parse(&reply);
                if matches!(parsed, Err(TrackerError::Closed)) {
                    *guard = None;
                }
                parsed
            }
            Ok(Err(e)) => {
                *guard = None;
                Err(e)
            }
            Err(_) => {
                // A late reply would desynchronize the stream; drop the pipes.
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Tracker request timed out");
                *guard = None;
                Err(TrackerError::Inference("tracker timed out".to_string()))
            }
        }
    }

    pub async fn close(&self) -> Result<(), TrackerError> {
        if let Some(mut pipes) = self.pipes.lock().await.take() {
            if let Ok(line) = TrackerRequest::Shutdown(true).to_line() {
                let _ = pipes.stdin.write_all(line.as_bytes()).await;
            }
        }
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                debug!("Tracker process already gone: {}", e);
            }
        }
        Ok(())
    }
}
