use super::*;
use gesturecall_core::testing::{fist, index_pointing, open_palm, thumb_up};
use serde_json::Value;

#[test]
fn test_parse_frame_message() {
    let msg: ClientMessage = serde_json::from_str(
        r#"{"type":"frame","imageData":"data:image/jpeg;base64,AA","width":1280,"height":720}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ClientMessage::Frame {
            image_data: "data:image/jpeg;base64,AA".to_string(),
            width: 1280,
            height: 720,
        }
    );
}

#[test]
fn test_parse_landmarks_message() {
    let hand = serde_json::to_value(open_palm(Handedness::Left)).unwrap();
    let raw = serde_json::json!({ "type": "landmarks", "hands": [hand] }).to_string();
    match serde_json::from_str::<ClientMessage>(&raw).unwrap() {
        ClientMessage::Landmarks { hands } => {
            assert_eq!(hands.len(), 1);
            assert_eq!(hands[0].handedness, Handedness::Left);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unknown_type_rejected() {
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"selfDestruct"}"#).is_err());
}

#[test]
fn test_results_status_follows_last_gesture() {
    let hands = [thumb_up(Handedness::Right), index_pointing(Handedness::Left)];
    let msg = ServerMessage::results(&hands, 42);
    let ServerMessage::Results {
        hands,
        status,
        highlight,
        timestamp,
    } = msg
    else {
        panic!("expected results");
    };
    assert_eq!(hands[0].gesture, Some(Gesture::ThumbUp));
    assert_eq!(hands[1].label, Some("Index finger raised"));
    assert_eq!(status.as_deref(), Some("Left hand: Index finger raised"));
    assert!(highlight);
    assert_eq!(timestamp, 42);
}

#[test]
fn test_results_without_hands_reads_detecting() {
    let msg = ServerMessage::results(&[], 0);
    let json: Value = serde_json::from_str(&msg.to_json()).unwrap();
    assert_eq!(json["type"], "results");
    assert_eq!(json["status"], DETECTING_STATUS);
    assert_eq!(json["highlight"], false);
    assert_eq!(json["hands"].as_array().unwrap().len(), 0);
}

#[test]
fn test_unrecognized_hand_keeps_status() {
    let msg = ServerMessage::results(&[fist(Handedness::Right)], 0);
    let json: Value = serde_json::from_str(&msg.to_json()).unwrap();
    assert!(json["status"].is_null());
    assert!(json["hands"][0]["gesture"].is_null());
    assert_eq!(json["hands"][0]["landmarks"].as_array().unwrap().len(), 21);
}

#[test]
fn test_open_palm_report_wire_shape() {
    let msg = ServerMessage::results(&[open_palm(Handedness::Unknown)], 0);
    let json: Value = serde_json::from_str(&msg.to_json()).unwrap();
    assert_eq!(json["hands"][0]["gesture"], "open_palm");
    assert_eq!(json["hands"][0]["label"], "Hand raised");
    // Unknown handedness reads as the right hand.
    assert_eq!(json["status"], "Right hand: Hand raised");
}
