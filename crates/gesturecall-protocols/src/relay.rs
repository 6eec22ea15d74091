//! Relay protocol definitions.
//!
//! The relay routes requests between the page, coordinator and inference
//! contexts. Each hop is a request/response exchange over an async transport;
//! the transport itself lives in `gesturecall-core`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::message::{RelayMessage, RelayResponse, TabId, TabInfo};

/// An endpoint that answers relay requests.
///
/// Returning `Err` means the request never reached a handler; a handler that
/// ran and failed answers `Ok` with `success: false`.
#[async_trait]
pub trait RelayEndpoint: Send + Sync {
    async fn request(&self, message: RelayMessage) -> Result<RelayResponse, RelayError>;

    /// Whether the endpoint can no longer accept requests.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Coordinator view of the open tabs.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    /// Snapshot of the currently open tabs.
    async fn query_tabs(&self) -> Vec<TabInfo>;

    /// Deliver a message to the page living in `tab`.
    async fn send_to_tab(&self, tab: &TabId, message: RelayMessage)
    -> Result<RelayResponse, RelayError>;
}

/// Creates and closes the single inference context.
#[async_trait]
pub trait InferenceHost: Send + Sync {
    /// Bring up a new inference context.
    async fn create(&self) -> Result<Arc<dyn RelayEndpoint>, RelayError>;

    /// Close whatever context `create` produced.
    async fn close(&self);
}
