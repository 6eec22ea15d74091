//! Line protocol messages.

use serde::{Deserialize, Serialize};

use gesturecall_protocols::{HandObservation, TrackerError, TrackerOptions};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerRequest {
    Configure(TrackerOptions),
    Image(String),
    Shutdown(bool),
}

impl TrackerRequest {
    pub fn to_line(&self) -> Result<String, TrackerError> {
        let mut line = serde_json::to_string(self).map_err(|e| TrackerError::Protocol(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackerReply {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub hands: Option<Vec<HandObservation>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TrackerReply {
    pub fn parse(line: &str) -> Result<Self, TrackerError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(TrackerError::Closed);
        }
        serde_json::from_str(line).map_err(|e| TrackerError::Protocol(format!("{}: {}", e, truncate(line))))
    }

    /// Reply to `configure`.
    pub fn into_ack(self) -> Result<(), TrackerError> {
        if let Some(error) = self.error {
            return Err(TrackerError::Inference(error));
        }
        match self.ok {
            Some(true) => Ok(()),
            Some(false) => Err(TrackerError::Inference("tracker refused configuration".to_string())),
            None => Err(TrackerError::Protocol("missing \"ok\" in configure reply".to_string())),
        }
    }

    /// Reply to `image`.
    pub fn into_hands(self) -> Result<Vec<HandObservation>, TrackerError> {
        if let Some(error) = self.error {
            return Err(TrackerError::Inference(error));
        }
        self.hands
            .ok_or_else(|| TrackerError::Protocol("missing \"hands\" in detection reply".to_string()))
    }
}

fn truncate(line: &str) -> &str {
    match line.char_indices().nth(120) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesturecall_protocols::Handedness;

    fn hand_json(handedness: &str) -> String {
        let points: Vec<String> = (0..21)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, i as f32 / 21.0))
            .collect();
        format!(
            r#"{{"landmarks":[{}],"handedness":"{}","score":0.9}}"#,
            points.join(","),
            handedness
        )
    }

    #[test]
    fn test_request_lines() {
        let configure = TrackerRequest::Configure(TrackerOptions::default()).to_line().unwrap();
        assert!(configure.starts_with(r#"{"configure":{"maxNumHands":2"#));
        assert!(configure.ends_with('\n'));

        let image = TrackerRequest::Image("data:image/jpeg;base64,AA".to_string()).to_line().unwrap();
        assert_eq!(image, "{\"image\":\"data:image/jpeg;base64,AA\"}\n");
    }

    #[test]
    fn test_parse_hands() {
        let line = format!(r#"{{"hands":[{},{}]}}"#, hand_json("Left"), hand_json("Right"));
        let hands = TrackerReply::parse(&line).unwrap().into_hands().unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].handedness, Handedness::Left);
        assert_eq!(hands[1].handedness, Handedness::Right);
        assert_eq!(hands[0].landmarks[0].x, 0.0);
    }

    #[test]
    fn test_empty_hands_is_no_detection() {
        let hands = TrackerReply::parse(r#"{"hands":[]}"#).unwrap().into_hands().unwrap();
        assert!(hands.is_empty());
    }

    #[test]
    fn test_error_reply() {
        let err = TrackerReply::parse(r#"{"error":"bad frame"}"#).unwrap().into_hands().unwrap_err();
        assert!(matches!(err, TrackerError::Inference(msg) if msg == "bad frame"));
    }

    #[test]
    fn test_short_landmark_list_is_protocol_error() {
        let err = TrackerReply::parse(r#"{"hands":[{"landmarks":[{"x":0,"y":0}]}]}"#).unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(_)));
    }

    #[test]
    fn test_blank_line_means_closed() {
        assert!(matches!(TrackerReply::parse("\n"), Err(TrackerError::Closed)));
    }

    #[test]
    fn test_ack() {
        assert!(TrackerReply::parse(r#"{"ok":true}"#).unwrap().into_ack().is_ok());
        assert!(TrackerReply::parse(r#"{"ok":false}"#).unwrap().into_ack().is_err());
        assert!(matches!(
            TrackerReply::parse("{}").unwrap().into_ack(),
            Err(TrackerError::Protocol(_))
        ));
    }
}
