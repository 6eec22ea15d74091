//! In-process relay transport.
//!
//! Every context owns a bounded mpsc mailbox and runs as one tokio task.
//! Requests carry a oneshot reply sender, the same pending-reply pattern the
//! CDP client uses for command ids. Handler futures are polled inside the
//! context task, so a context interleaves its requests at await points but
//! never runs two handlers in parallel.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use gesturecall_protocols::{RelayEndpoint, RelayError, RelayMessage, RelayResponse};

/// Default mailbox depth.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// A request waiting in a mailbox.
pub struct Envelope {
    pub message: RelayMessage,
    reply: oneshot::Sender<RelayResponse>,
}

impl Envelope {
    pub fn respond(self, response: RelayResponse) {
        // The requester may have given up; nothing to do then.
        let _ = self.reply.send(response);
    }
}

/// Request handler run by a context task.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: RelayMessage) -> RelayResponse;
}

/// Sending half of a context mailbox.
#[derive(Clone)]
pub struct Mailbox {
    name: Arc<str>,
    tx: mpsc::Sender<Envelope>,
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox").field("name", &self.name).finish()
    }
}

impl Mailbox {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl RelayEndpoint for Mailbox {
    async fn request(&self, message: RelayMessage) -> Result<RelayResponse, RelayError> {
        let action = message.action();
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { message, reply })
            .await
            .map_err(|_| RelayError::Transport(format!("{} mailbox closed", self.name)))?;
        trace!(context = %self.name, action, "Request queued");

        rx.await
            .map_err(|_| RelayError::Transport(format!("{} dropped reply to {}", self.name, action)))
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a context mailbox.
pub struct MailboxReceiver {
    name: Arc<str>,
    rx: mpsc::Receiver<Envelope>,
}

/// Create a mailbox without starting its context yet.
///
/// Useful when the handler needs the sender of its own mailbox, or of a
/// context that is wired up later.
pub fn mailbox(name: &str, capacity: usize) -> (Mailbox, MailboxReceiver) {
    let name: Arc<str> = Arc::from(name);
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Mailbox {
            name: name.clone(),
            tx,
        },
        MailboxReceiver { name, rx },
    )
}

/// A running context task.
pub struct ContextHandle {
    mailbox: Mailbox,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ContextHandle {
    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    pub fn name(&self) -> &str {
        self.mailbox.name()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the context. Pending requests see a transport failure.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Run `handler` on `receiver` in a new task.
pub fn serve<H: MessageHandler>(mailbox: Mailbox, receiver: MailboxReceiver, handler: Arc<H>) -> ContextHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_context(receiver, handler, cancel.clone()));
    ContextHandle {
        mailbox,
        cancel,
        task,
    }
}

/// Create a mailbox and serve it in one step.
pub fn spawn_context<H: MessageHandler>(name: &str, capacity: usize, handler: Arc<H>) -> ContextHandle {
    let (tx, rx) = mailbox(name, capacity);
    serve(tx, rx, handler)
}

async fn run_context<H: MessageHandler>(mut receiver: MailboxReceiver, handler: Arc<H>, cancel: CancellationToken) {
    let name = receiver.name.clone();
    let mut in_flight: FuturesUnordered<BoxFuture<'static, ()>> = FuturesUnordered::new();
    debug!(context = %name, "Context started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            envelope = receiver.rx.recv() => match envelope {
                Some(envelope) => {
                    let handler = handler.clone();
                    in_flight.push(
                        async move {
                            let response = handler.handle(envelope.message.clone()).await;
                            envelope.respond(response);
                        }
                        .boxed(),
                    );
                }
                None => {
                    // Every sender is gone; finish what was accepted.
                    while in_flight.next().await.is_some() {}
                    break;
                }
            },
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
        }
    }

    debug!(context = %name, pending = in_flight.len(), "Context stopped");
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
