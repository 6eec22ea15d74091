//! Session attached to one tab.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::Transport;
use crate::error::CdpError;
use crate::protocol::CdpResponse;

/// `Page` domain events the gesture page cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A frame committed a new document.
    FrameNavigated {
        frame_id: String,
        main_frame: bool,
        url: String,
    },
    /// History API or fragment change inside a frame.
    NavigatedWithinDocument { frame_id: String, url: String },
    /// The main document finished parsing.
    DomContentLoaded,
    /// The tab went away.
    Detached,
}

impl PageEvent {
    pub fn parse(event: &CdpResponse) -> Option<Self> {
        let params = event.params.as_ref();
        match event.method.as_deref()? {
            "Page.frameNavigated" => {
                let frame = &params?["frame"];
                let mut url = frame["url"].as_str()?.to_string();
                if let Some(fragment) = frame["urlFragment"].as_str() {
                    url.push_str(fragment);
                }
                Some(Self::FrameNavigated {
                    frame_id: frame["id"].as_str().unwrap_or_default().to_string(),
                    main_frame: frame.get("parentId").is_none_or(Value::is_null),
                    url,
                })
            }
            "Page.navigatedWithinDocument" => {
                let params = params?;
                Some(Self::NavigatedWithinDocument {
                    frame_id: params["frameId"].as_str().unwrap_or_default().to_string(),
                    url: params["url"].as_str()?.to_string(),
                })
            }
            "Page.domContentEventFired" => Some(Self::DomContentLoaded),
            "Target.detachedFromTarget" | "Inspector.detached" => Some(Self::Detached),
            _ => None,
        }
    }
}

/// A flattened CDP session on one target.
pub struct CdpSession {
    target_id: String,
    session_id: String,
    transport: Arc<Transport>,
}

impl CdpSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, Some(&self.session_id)).await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Id of the top-level frame.
    pub async fn main_frame_id(&self) -> Result<String, CdpError> {
        let tree = self.call("Page.getFrameTree", None).await?;
        tree["frameTree"]["frame"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing frame id".to_string()))
    }

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Start loading `url` in the top-level frame. Does not wait for load.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self.call("Page.navigate", Some(json!({ "url": url }))).await?;
        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }
        debug!("Navigation to {} started", url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> CdpResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_main_frame_navigation() {
        let parsed = PageEvent::parse(&event(
            r##"{"method":"Page.frameNavigated","params":{"frame":{"id":"F1","url":"https://chatgpt.com/","urlFragment":"#top"}}}"##,
        ));
        assert_eq!(
            parsed,
            Some(PageEvent::FrameNavigated {
                frame_id: "F1".into(),
                main_frame: true,
                url: "https://chatgpt.com/#top".into(),
            })
        );
    }

    #[test]
    fn test_parse_subframe_navigation() {
        let parsed = PageEvent::parse(&event(
            r#"{"method":"Page.frameNavigated","params":{"frame":{"id":"F2","parentId":"F1","url":"https://ads.test/"}}}"#,
        ));
        assert!(matches!(parsed, Some(PageEvent::FrameNavigated { main_frame: false, .. })));
    }

    #[test]
    fn test_parse_same_document_navigation() {
        let parsed = PageEvent::parse(&event(
            r#"{"method":"Page.navigatedWithinDocument","params":{"frameId":"F1","url":"https://chatgpt.com/c/42"}}"#,
        ));
        assert_eq!(
            parsed,
            Some(PageEvent::NavigatedWithinDocument {
                frame_id: "F1".into(),
                url: "https://chatgpt.com/c/42".into(),
            })
        );
    }

    #[test]
    fn test_parse_lifecycle_events() {
        assert_eq!(
            PageEvent::parse(&event(r#"{"method":"Page.domContentEventFired","params":{"timestamp":1.0}}"#)),
            Some(PageEvent::DomContentLoaded)
        );
        assert_eq!(
            PageEvent::parse(&event(r#"{"method":"Target.detachedFromTarget","params":{"sessionId":"S"}}"#)),
            Some(PageEvent::Detached)
        );
        assert_eq!(
            PageEvent::parse(&event(r#"{"method":"Network.requestWillBeSent","params":{}}"#)),
            None
        );
    }
}
