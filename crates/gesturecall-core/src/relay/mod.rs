//! Cross-context relay.
//!
//! ```text
//!  page (tab 1) ─┐                       ┌─> inference context
//!  page (tab 2) ─┼─> coordinator (hub) ──┤
//!  page (tab n) ─┘         ^             └── results ──┐
//!                          └───────────────────────────┘
//! ```
//!
//! Pages never reach the inference context directly, and the inference
//! context only answers the coordinator.

pub mod bus;
mod coordinator;
mod inference;
mod tabs;

pub use bus::{ContextHandle, Envelope, Mailbox, MailboxReceiver, MessageHandler, mailbox, serve, spawn_context};
pub use coordinator::{BroadcastReport, Coordinator};
pub use inference::{InferenceContext, LocalInferenceHost};
pub use tabs::TabRegistry;
