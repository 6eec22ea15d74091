//! Chrome DevTools Protocol page adapter.
//!
//! Drives a real browser tab as the page of the extension variant: clicks and
//! navigation go through `Runtime.evaluate` / `Page.navigate`, the camera
//! overlay is injected DOM, and URL changes come from `Page` domain events.
//!
//! ## Usage
//!
//! 1. Start Chrome with remote debugging:
//!    ```bash
//!    chrome --remote-debugging-port=9222
//!    ```
//!
//! 2. Attach to a tab:
//!    ```rust,ignore
//!    let client = CdpClient::connect("http://localhost:9222", Duration::from_secs(10)).await?;
//!    let tab = client.list_pages().await?.remove(0);
//!    let page = client.attach_page(&tab.id).await?;
//!    page.navigate("https://chatgpt.com/").await?;
//!    ```

mod client;
mod error;
pub mod overlay;
mod page;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use page::CdpPage;
pub use protocol::*;
pub use session::{CdpSession, PageEvent};
